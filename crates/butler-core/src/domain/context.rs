//! The immutable variable bindings shared by every render in a run.
//!
//! A [`Context`] is assembled once, before the walk starts, from three
//! sources:
//!
//! ```text
//! ProjectData  ──┐
//! variables    ──┼──► Context ──► data tree  (.Project.Name, .Vars.key, ...)
//! answers      ──┘            └─► answers    (getSurveyResult "key")
//! ```
//!
//! Nothing mutates a context after [`ContextBuilder::build`]; workers share
//! it behind an `Arc` without synchronization.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, FixedOffset, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainError;

/// Project metadata collected before the run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectData {
    pub name: String,
    pub path: PathBuf,
    pub template: String,
    pub description: String,
}

/// Read-only render context.
#[derive(Debug, Clone)]
pub struct Context {
    project: ProjectData,
    variables: BTreeMap<String, String>,
    answers: BTreeMap<String, Value>,
    /// Pre-built lookup tree so field access never allocates per render.
    data: Value,
}

impl Context {
    /// Start building a context for the given project name.
    pub fn builder(project_name: impl Into<String>) -> ContextBuilder {
        ContextBuilder::new(project_name)
    }

    pub fn project(&self) -> &ProjectData {
        &self.project
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Look up a free-form answer by key.
    pub fn answer(&self, key: &str) -> Option<&Value> {
        self.answers.get(key)
    }

    /// Resolve a field chain such as `["Project", "Name"]`.
    ///
    /// An empty chain resolves to the root of the data tree.
    pub fn field<S: AsRef<str>>(&self, chain: &[S]) -> Option<&Value> {
        chain
            .iter()
            .try_fold(&self.data, |value, key| value.get(key.as_ref()))
    }
}

/// Builder for [`Context`].
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    project: ProjectData,
    generated_at: Option<DateTime<FixedOffset>>,
    variables: BTreeMap<String, String>,
    answers: BTreeMap<String, Value>,
}

impl ContextBuilder {
    fn new(project_name: impl Into<String>) -> Self {
        Self {
            project: ProjectData {
                name: project_name.into(),
                ..ProjectData::default()
            },
            generated_at: None,
            variables: BTreeMap::new(),
            answers: BTreeMap::new(),
        }
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.project.path = path.as_ref().to_path_buf();
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.project.template = template.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.project.description = description.into();
        self
    }

    /// Pin the creation timestamp (defaults to now).
    pub fn generated_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Merge a whole variable map; later entries win.
    pub fn variables<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.variables
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn answer(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.answers.insert(key.into(), value.into());
        self
    }

    pub fn answers<I, K>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.answers
            .extend(answers.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Validate and freeze the context.
    pub fn build(self) -> Result<Context, DomainError> {
        let name = self.project.name.trim();
        if name.is_empty() {
            return Err(DomainError::MissingRequiredField {
                field: "project name",
            });
        }
        if name.contains('/') || name.contains('\\') {
            return Err(DomainError::InvalidProjectName {
                name: self.project.name.clone(),
                reason: "name cannot contain path separators".into(),
            });
        }

        let generated_at = self
            .generated_at
            .unwrap_or_else(|| Local::now().fixed_offset());

        let data = build_data(&self.project, generated_at, &self.variables);

        Ok(Context {
            project: self.project,
            variables: self.variables,
            answers: self.answers,
            data,
        })
    }
}

fn build_data(
    project: &ProjectData,
    generated_at: DateTime<FixedOffset>,
    variables: &BTreeMap<String, String>,
) -> Value {
    let mut project_map = Map::new();
    project_map.insert("Name".into(), Value::String(project.name.clone()));
    project_map.insert(
        "Path".into(),
        Value::String(project.path.display().to_string()),
    );
    project_map.insert("Template".into(), Value::String(project.template.clone()));
    project_map.insert(
        "Description".into(),
        Value::String(project.description.clone()),
    );

    let vars: Map<String, Value> = variables
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let mut root = Map::new();
    root.insert("Project".into(), Value::Object(project_map));
    root.insert(
        "Date".into(),
        Value::String(generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    root.insert("Year".into(), Value::from(generated_at.year()));
    root.insert("Vars".into(), Value::Object(vars));
    Value::Object(root)
}

/// Parse a `KEY=VALUE` assignment as given on the command line.
pub fn parse_assignment(raw: &str) -> Result<(String, String), DomainError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(DomainError::InvalidVariable(raw.to_string())),
    }
}
