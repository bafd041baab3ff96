//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "render this tree" or "scaffold a project".

pub mod jobs;
pub mod scaffold_service;
pub mod template_service;

pub use scaffold_service::{ScaffoldOptions, ScaffoldService};
pub use template_service::TemplateService;
