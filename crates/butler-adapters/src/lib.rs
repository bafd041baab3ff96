//! Infrastructure adapters for Butler.
//!
//! This crate implements the ports defined in `butler-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod filesystem;
pub mod renderer;
pub mod template_source;

// Re-export commonly used adapters
pub use filesystem::{FsOp, LocalFilesystem, MemoryFilesystem};
pub use renderer::MarkerEngine;
pub use template_source::LocalTemplateSource;
