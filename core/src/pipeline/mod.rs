// storefront/core/src/pipeline/mod.rs

//! `Pipeline<T, E>`: construction, handler registration and execution.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Pipeline;
