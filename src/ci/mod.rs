//! The compiler's view of method signatures.
//!
//! A [`Signature`] is built from a [`DescriptorSymbol`](crate::types::symbol::DescriptorSymbol)
//! on behalf of an accessing class. Every element is resolved into the type arena of a
//! [`CompilationSession`]; classes that the accessing class cannot see yet become
//! [`CiType::Unloaded`] placeholders instead of errors.

mod ci_type;
mod resolver;
mod session;
mod signature;
mod stream;

pub use ci_type::{CiType, LoaderId, TypeId};
pub use resolver::{
    ClassResolver, LoaderResolver, LookupHandle, Resolution, ResolutionError, ResolvedReferences,
};
pub use session::CompilationSession;
pub use signature::Signature;
pub use stream::{DescriptorStream, SignatureStream, StreamElement};
