#![warn(
    clippy::pedantic,
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms
)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

//! Resolved method signatures for a JIT compiler interface.
//!
//! Method descriptors are resolved against an accessing class into a per-compilation type
//! arena. References to classes that are not loaded yet resolve to placeholders, so signatures
//! can be reasoned about before linkage.
//! ## Features
#![doc = document_features::document_features!()]

pub mod ci;
pub mod jvm;
pub(crate) mod macros;
pub mod types;

/// Test utilities
#[cfg(test)]
pub(crate) mod tests;
