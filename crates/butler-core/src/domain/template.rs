//! Template catalog entries.
//!
//! A template is just a named location; what lives there is opaque until a
//! [`TemplateSource`](crate::application::ports::TemplateSource) materializes
//! it into the destination directory.

use serde::{Deserialize, Serialize};

/// One configured template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Name used on the command line (`--template <name>`).
    pub name: String,
    /// Where the template lives: a local path or a `file://` URL.
    pub url: String,
    #[serde(default)]
    pub description: String,
}

impl TemplateEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
