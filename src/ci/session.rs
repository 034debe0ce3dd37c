//! The per-compilation arena holding types and descriptor symbols.

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
    sync::Arc,
};

use super::ci_type::{CiType, LoaderId, TypeId};
use crate::{
    jvm::references::ClassRef,
    types::{
        field_type::PrimitiveType,
        symbol::{DescriptorSymbol, InvalidDescriptor},
    },
};

const VOID_INDEX: u32 = PrimitiveType::ALL.len() as u32;

/// Owns every type and symbol used while compiling one unit.
///
/// Types are interned: asking twice for the same type yields the same [`TypeId`].
/// Primitive types and `void` are interned on creation at fixed indices.
/// Nothing is freed until the session is dropped.
#[derive(Debug)]
pub struct CompilationSession {
    types: Vec<Arc<CiType>>,
    index: HashMap<Arc<CiType>, TypeId>,
    symbols: HashSet<DescriptorSymbol>,
}

impl Default for CompilationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilationSession {
    /// Creates a session with only the primitive types and `void`.
    #[must_use]
    pub fn new() -> Self {
        let mut session = Self {
            types: Vec::new(),
            index: HashMap::new(),
            symbols: HashSet::new(),
        };
        for p in PrimitiveType::ALL {
            session.intern(CiType::Primitive(p));
        }
        let void = session.intern(CiType::Void);
        debug_assert_eq!(void, TypeId(VOID_INDEX));
        session
    }

    /// Returns the type denoted by `id`.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this session.
    #[must_use]
    pub fn get(&self, id: TypeId) -> &CiType {
        &self.types[id.index()]
    }

    /// Interns a type.
    pub fn intern(&mut self, ty: CiType) -> TypeId {
        if let Some(id) = self.index.get(&ty) {
            return *id;
        }
        let id = TypeId(
            u32::try_from(self.types.len()).unwrap_or_else(|_| panic!("Type arena is full")),
        );
        let ty = Arc::new(ty);
        self.types.push(Arc::clone(&ty));
        self.index.insert(ty, id);
        id
    }

    /// The shared singleton for a primitive type.
    #[must_use]
    pub fn primitive(&self, primitive: PrimitiveType) -> TypeId {
        let position = PrimitiveType::ALL
            .iter()
            .position(|it| *it == primitive)
            .unwrap_or_else(|| unreachable!("Every primitive type is listed"));
        TypeId(position as u32)
    }

    /// The shared singleton for `void`.
    #[must_use]
    pub const fn void(&self) -> TypeId {
        TypeId(VOID_INDEX)
    }

    /// Interns a loaded class defined by `loader`.
    pub fn instance(&mut self, class: ClassRef, loader: LoaderId) -> TypeId {
        self.intern(CiType::Instance { class, loader })
    }

    /// Interns an array type with `dimensions` dimensions over `element`.
    ///
    /// # Panics
    /// Panics if `element` is not loaded, or is `void`.
    pub fn array_of(&mut self, element: TypeId, dimensions: usize) -> TypeId {
        let element_type = self.get(element);
        assert!(
            element_type.is_loaded() && *element_type != CiType::Void,
            "Array elements must be loaded non-void types"
        );
        (0..dimensions).fold(element, |component, _| {
            self.intern(CiType::Array { component })
        })
    }

    /// Interns a placeholder for a class that `loader` has not loaded.
    pub fn unloaded(&mut self, class: ClassRef, loader: LoaderId) -> TypeId {
        self.intern(CiType::Unloaded { class, loader })
    }

    /// The loader that defines the type, if the type is a loaded class or array.
    /// Arrays of primitives are defined by the bootstrap loader.
    #[must_use]
    pub fn defining_loader(&self, id: TypeId) -> Option<LoaderId> {
        match self.get(id) {
            CiType::Instance { loader, .. } => Some(*loader),
            CiType::Array { component } => match self.get(*component) {
                CiType::Primitive(_) => Some(LoaderId::BOOTSTRAP),
                _ => self.defining_loader(*component),
            },
            CiType::Primitive(_) | CiType::Void | CiType::Unloaded { .. } => None,
        }
    }

    /// Returns the descriptor of a type, e.g., `I`, `Ljava/lang/String;`, or `[[J`.
    #[must_use]
    pub fn descriptor_of(&self, id: TypeId) -> String {
        match self.get(id) {
            CiType::Primitive(p) => p.descriptor_char().to_string(),
            CiType::Void => "V".to_owned(),
            CiType::Instance { class, .. } | CiType::Unloaded { class, .. } if class.is_array() => {
                class.binary_name.clone()
            }
            CiType::Instance { class, .. } | CiType::Unloaded { class, .. } => {
                format!("L{class};")
            }
            CiType::Array { component } => format!("[{}", self.descriptor_of(*component)),
        }
    }

    /// Validates and interns a method descriptor.
    ///
    /// # Errors
    /// Returns [`InvalidDescriptor`] if `text` is not a well-formed method descriptor.
    pub fn symbol(&mut self, text: &str) -> Result<DescriptorSymbol, InvalidDescriptor> {
        if let Some(symbol) = self.symbols.get(text) {
            return Ok(symbol.clone());
        }
        let symbol = DescriptorSymbol::from_str(text)?;
        self.symbols.insert(symbol.clone());
        Ok(symbol)
    }

    /// The number of interned types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
