//! References to JVM classes.

use crate::macros::see_jvm_spec;

/// A reference to a class by its binary name, e.g., `java/lang/String` or `[I`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, derive_more::Display)]
#[display("{binary_name}")]
pub struct ClassRef {
    /// The binary name of the class.
    pub binary_name: String,
}

impl ClassRef {
    /// Creates a new [`ClassRef`] from a binary name.
    pub fn new<S: Into<String>>(binary_name: S) -> Self {
        ClassRef {
            binary_name: binary_name.into(),
        }
    }

    /// Checks if the reference names an array class.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.binary_name.starts_with('[')
    }

    /// Checks if `name` is a valid binary name of a class or interface, i.e., one or more
    /// non-empty identifiers separated by `/`, none containing `.`, `;`, or `[`.
    #[doc = see_jvm_spec!(4, 2, 1)]
    #[must_use]
    pub fn is_valid_binary_name(name: &str) -> bool {
        name.split('/')
            .all(|identifier| !identifier.is_empty() && !identifier.contains(['.', ';', '[']))
    }
}
