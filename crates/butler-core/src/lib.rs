//! Butler Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Butler
//! project scaffolder: the rules for what gets skipped, the two-phase
//! rename/render walk, the bounded worker pool that runs jobs in parallel and
//! the failure-isolation policy that lets one bad file fail on its own.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            butler-cli (CLI)             │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   (ScaffoldService, TemplateService)    │
//! │  Renderer · JobQueue · TreeWalker       │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Application Ports (Traits)       │
//! │ Filesystem · ExpressionEngine · Source  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     butler-adapters (Infrastructure)    │
//! │ LocalFilesystem · MarkerEngine · ...    │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ Context · PathFilter · RunReport · ...  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use butler_core::prelude::*;
//!
//! let context = Context::builder("demo").path("./demo").build()?;
//! let service = ScaffoldService::new(filesystem, engine, ScaffoldOptions::default());
//! let report = service.render_tree(context)?;
//! println!("{} succeeded, {} failed", report.succeeded, report.failed());
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        JobQueue, Renderer, ScaffoldOptions, ScaffoldService, TemplateService, TreeWalker,
        ports::{ExpressionEngine, ExpressionError, Filesystem, TemplateSource},
    };
    pub use crate::domain::{
        Context, Delimiters, EntryKind, FilterDecision, FunctionTable, JobError, JobFailure,
        PathFilter, Phase, RunReport, TemplateEntry,
    };
    pub use crate::error::{ButlerError, ButlerResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
