//! JVM elements consumed by the compiler interface.
pub mod class_loader;
pub mod references;
