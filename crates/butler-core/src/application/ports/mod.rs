//! Application ports (traits) for external dependencies.
//!
//! Ports define what the application needs from the outside world. Adapters
//! in `butler-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: tree walking and file operations
//!   - `ExpressionEngine`: marker evaluation
//!   - `TemplateSource`: template acquisition
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    ExpressionEngine, ExpressionError, Filesystem, FsEntry, TemplateSource, WalkControl,
    WalkError,
};

#[cfg(test)]
pub use output::MockExpressionEngine;
