//! Application layer for Butler.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ScaffoldService, TemplateService)
//! - **Engine pieces**: Renderer, JobQueue and TreeWalker, wired together by
//!   the scaffold service into the two-phase run
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! Business rules (what to skip, rename ordering, reporting) live in
//! `crate::domain`.

pub mod error;
pub mod ports;
pub mod queue;
pub mod renderer;
pub mod services;
pub mod walker;

pub use services::{ScaffoldOptions, ScaffoldService, TemplateService};

pub use ports::{ExpressionEngine, Filesystem, TemplateSource};

pub use error::ApplicationError;
pub use queue::JobQueue;
pub use renderer::Renderer;
pub use walker::TreeWalker;
