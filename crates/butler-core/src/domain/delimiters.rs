use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Default start marker. Deliberately not `{{` so that scaffolded sources
/// which are themselves templates pass through untouched.
pub const DEFAULT_START: &str = "butler{";
pub const DEFAULT_END: &str = "}";

/// Start/end pair that encloses a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    start: String,
    end: String,
}

impl Delimiters {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self, DomainError> {
        let (start, end) = (start.into(), end.into());
        let reason = if start.is_empty() || end.is_empty() {
            Some("delimiters cannot be empty")
        } else if start == end {
            Some("start and end must differ")
        } else if start.chars().any(char::is_whitespace) || end.chars().any(char::is_whitespace) {
            Some("delimiters cannot contain whitespace")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(DomainError::InvalidDelimiters { start, end, reason }),
            None => Ok(Self { start, end }),
        }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    /// Cheap check used to skip sources that carry no marker at all.
    pub fn appears_in(&self, source: &str) -> bool {
        source.contains(self.start.as_str())
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
        }
    }
}

impl fmt::Display for Delimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ... {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pair_is_butler_brace() {
        let d = Delimiters::default();
        assert_eq!(d.start(), "butler{");
        assert_eq!(d.end(), "}");
        assert!(d.appears_in("package butler{.Project.Name}"));
        assert!(!d.appears_in("fn main() { {{ x }} }"));
    }

    #[test]
    fn rejects_bad_pairs() {
        assert!(Delimiters::new("", "}").is_err());
        assert!(Delimiters::new("%%", "%%").is_err());
        assert!(Delimiters::new("<< ", ">>").is_err());
        assert!(Delimiters::new("[[", "]]").is_ok());
    }
}
