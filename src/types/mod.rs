//! Module containing the APIs for the JVM type system.
pub mod field_type;
pub mod symbol;
