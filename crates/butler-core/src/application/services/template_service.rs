//! Template Service - catalog lookups.
//!
//! The catalog is the configured list of named templates. It is read-only
//! for the lifetime of the process.

use std::collections::BTreeMap;

use crate::{
    domain::{DomainError, TemplateEntry},
    error::ButlerResult,
};

/// Service for template catalog queries.
#[derive(Debug, Clone, Default)]
pub struct TemplateService {
    templates: BTreeMap<String, TemplateEntry>,
}

impl TemplateService {
    /// Build the catalog. Names must be unique and non-empty.
    pub fn new(entries: impl IntoIterator<Item = TemplateEntry>) -> ButlerResult<Self> {
        let mut templates = BTreeMap::new();
        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(DomainError::MissingRequiredField {
                    field: "template name",
                }
                .into());
            }
            if entry.url.trim().is_empty() {
                return Err(DomainError::MissingRequiredField {
                    field: "template url",
                }
                .into());
            }
            if templates.contains_key(&entry.name) {
                return Err(DomainError::DuplicateTemplate(entry.name).into());
            }
            templates.insert(entry.name.clone(), entry);
        }
        Ok(Self { templates })
    }

    /// Get a template by name.
    pub fn get_by_name(&self, name: &str) -> ButlerResult<&TemplateEntry> {
        self.templates
            .get(name)
            .ok_or_else(|| DomainError::TemplateNotFound(name.to_string()).into())
    }

    /// Template names, sorted.
    pub fn options(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// All templates, sorted by name.
    pub fn list(&self) -> impl Iterator<Item = &TemplateEntry> {
        self.templates.values()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ButlerError;

    fn catalog() -> TemplateService {
        TemplateService::new([
            TemplateEntry::new("go-cli", "/tpl/go-cli"),
            TemplateEntry::new("api", "file:///tpl/api").with_description("HTTP API"),
        ])
        .unwrap()
    }

    #[test]
    fn options_are_sorted() {
        assert_eq!(catalog().options(), vec!["api", "go-cli"]);
    }

    #[test]
    fn lookup_by_name() {
        let catalog = catalog();
        assert_eq!(catalog.get_by_name("api").unwrap().description, "HTTP API");
        let err = catalog.get_by_name("rails").unwrap_err();
        assert!(matches!(
            err,
            ButlerError::Domain(DomainError::TemplateNotFound(ref n)) if n == "rails"
        ));
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = TemplateService::new([
            TemplateEntry::new("a", "/x"),
            TemplateEntry::new("a", "/y"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ButlerError::Domain(DomainError::DuplicateTemplate(_))
        ));
    }

    #[test]
    fn empty_url_is_rejected() {
        assert!(TemplateService::new([TemplateEntry::new("a", " ")]).is_err());
    }
}
