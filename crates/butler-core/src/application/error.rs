//! Application layer errors.
//!
//! These are run-level (setup) faults: they stop a run before any job is
//! submitted, or report that the worker pool itself broke. Faults scoped to a
//! single entry are `JobError`s and never surface here.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// The destination tree to render does not exist.
    #[error("Destination does not exist: {path}")]
    DestinationMissing { path: PathBuf },

    /// The destination exists but is not a directory.
    #[error("Destination is not a directory: {path}")]
    DestinationNotDirectory { path: PathBuf },

    /// Project already exists at target location.
    #[error("Project already exists at {path}")]
    ProjectExists { path: PathBuf },

    /// Filesystem operation failed outside any job.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Template acquisition failed.
    #[error("Could not fetch template '{template}': {reason}")]
    AcquisitionFailed { template: String, reason: String },

    /// The template location uses a scheme no source adapter handles.
    #[error("Unsupported template location: {location}")]
    UnsupportedSource { location: String },

    /// Port/Adapter not configured.
    #[error("Required adapter not configured: {name}")]
    AdapterNotConfigured { name: &'static str },

    /// Every worker is gone; submission cannot continue.
    #[error("Worker pool failed: {reason}")]
    WorkerPoolFailed { reason: String },

    /// Validation failed (application-level, not domain).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::DestinationMissing { path } => vec![
                format!("Nothing to render at: {}", path.display()),
                "Check the path, or fetch a template first with: butler new".into(),
            ],
            Self::DestinationNotDirectory { path } => vec![
                format!("'{}' is a file", path.display()),
                "Point butler at the project directory".into(),
            ],
            Self::ProjectExists { path } => vec![
                format!("Directory already exists: {}", path.display()),
                format!("Remove '{}' or choose another destination", path.display()),
                "Use --force to replace it (destructive)".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::AcquisitionFailed { template, .. } => vec![
                format!("Check the url configured for template '{}'", template),
                "Try: butler list".into(),
            ],
            Self::UnsupportedSource { location } => vec![
                format!("'{}' is not a local path", location),
                "Clone the repository yourself, then point the template url at it".into(),
            ],
            Self::AdapterNotConfigured { name } => vec![
                format!("Required component not configured: {}", name),
                "This is likely a configuration error".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DestinationMissing { .. } => ErrorCategory::NotFound,
            Self::DestinationNotDirectory { .. }
            | Self::ProjectExists { .. }
            | Self::ValidationFailed(_) => ErrorCategory::Validation,
            Self::UnsupportedSource { .. } | Self::AdapterNotConfigured { .. } => {
                ErrorCategory::Configuration
            }
            Self::FilesystemError { .. }
            | Self::AcquisitionFailed { .. }
            | Self::WorkerPoolFailed { .. } => ErrorCategory::Internal,
        }
    }
}
