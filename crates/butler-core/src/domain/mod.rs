// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Butler.
//!
//! Pure data and rules: what a render context holds, which entries are
//! skipped, what a job is, how its outcome is reported and in which order
//! directory renames are applied. No filesystem access happens here; all
//! I/O goes through the ports in `crate::application::ports`.
//!
//! - **No async**: domain logic is synchronous
//! - **No I/O**: no filesystem, network, or external calls
//! - **Immutable once built**: `Context` and `PathFilter` are shared across
//!   worker threads without locks

pub mod case;
pub mod context;
pub mod delimiters;
pub mod error;
pub mod filter;
pub mod functions;
pub mod job;
pub mod rename;
pub mod template;

pub use context::{Context, ContextBuilder, ProjectData, parse_assignment};
pub use delimiters::Delimiters;
pub use error::{DomainError, ErrorCategory};
pub use filter::{EntryKind, FilterDecision, PathFilter};
pub use functions::{Capability, FunctionError, FunctionTable, display_value};
pub use job::{
    JobError, JobFailure, JobOutcome, Phase, RenderError, RenderJob, RenderPhase, RunReport,
};
pub use rename::{RenameCollector, RenamePlan, RenameRecord};
pub use template::TemplateEntry;
