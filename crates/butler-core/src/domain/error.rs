// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (collected into run reports and retried by callers)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },

    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("Invalid marker delimiters '{start}' / '{end}': {reason}")]
    InvalidDelimiters {
        start: String,
        end: String,
        reason: &'static str,
    },

    #[error("Invalid exclusion entry '{entry}': {reason}")]
    InvalidExclusion { entry: String, reason: &'static str },

    #[error("Invalid variable assignment '{0}': expected KEY=VALUE")]
    InvalidVariable(String),

    // ========================================================================
    // Not Found Errors
    // ========================================================================
    #[error("Template '{0}' could not be found")]
    TemplateNotFound(String),

    #[error("Template catalog has two entries named '{0}'")]
    DuplicateTemplate(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingRequiredField { field } => vec![
                format!("Provide a value for '{}'", field),
                "Use --help for usage information".into(),
            ],
            Self::InvalidProjectName { name, reason } => vec![
                format!("'{}' cannot be used: {}", name, reason),
                "Use letters, digits, '-' and '_'".into(),
            ],
            Self::InvalidDelimiters { .. } => vec![
                "Markers need a non-empty start and end delimiter".into(),
                "Example: start_delimiter = \"butler{\", end_delimiter = \"}\"".into(),
            ],
            Self::InvalidVariable(_) => vec![
                "Variables are passed as --var KEY=VALUE".into(),
                "Example: --var author=jane".into(),
            ],
            Self::TemplateNotFound(name) => vec![
                format!("No template named '{}' is configured", name),
                "Try: butler list".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound(_) => ErrorCategory::NotFound,
            Self::DuplicateTemplate(_) | Self::InvalidExclusion { .. } => {
                ErrorCategory::Configuration
            }
            _ => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Configuration,
}
