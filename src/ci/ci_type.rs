//! Types in the compiler's type universe.

use crate::{jvm::references::ClassRef, types::field_type::PrimitiveType};

/// A handle to a type interned in a [`CompilationSession`](super::CompilationSession).
///
/// Two handles from the same session are equal if and only if they denote the same type.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, derive_more::Display)]
#[display("#{_0}")]
pub struct TypeId(pub(super) u32);

impl TypeId {
    pub(super) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a class loader known to a class resolver.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, derive_more::Display)]
#[display("loader#{_0}")]
pub struct LoaderId(pub u32);

impl LoaderId {
    /// The bootstrap class loader, which defines primitive array types.
    pub const BOOTSTRAP: Self = Self(0);
}

/// A type as seen by the compiler.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum CiType {
    /// A primitive type.
    Primitive(PrimitiveType),
    /// The `void` type, only valid as a return type.
    Void,
    /// A loaded class, identified by its name and defining loader.
    Instance {
        /// The class.
        class: ClassRef,
        /// The loader that defined the class.
        loader: LoaderId,
    },
    /// A loaded array type.
    Array {
        /// The type of the elements, which is always loaded.
        component: TypeId,
    },
    /// A class that is not loaded yet, as seen from a loader.
    Unloaded {
        /// The class, or the array descriptor for arrays of unloaded classes.
        class: ClassRef,
        /// The loader through which the class was requested.
        loader: LoaderId,
    },
}

impl CiType {
    /// Checks if the type is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        !matches!(self, Self::Unloaded { .. })
    }

    /// Checks if the type is a primitive type.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// The number of slots a value of this type occupies in the argument list.
    #[must_use]
    pub const fn size(&self) -> u32 {
        match self {
            Self::Primitive(p) => p.slot_width(),
            Self::Void => 0,
            Self::Instance { .. } | Self::Array { .. } | Self::Unloaded { .. } => 1,
        }
    }
}
