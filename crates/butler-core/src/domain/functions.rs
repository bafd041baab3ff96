//! Capability table: the named functions markers may call.
//!
//! The table is assembled before the run and never changes while jobs
//! execute. Engines receive it by reference and must reject calls to names
//! that are not in it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::domain::{Context, case};

/// Failure raised by a capability function.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FunctionError {
    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("{function}: argument {position} must be {expected}")]
    Type {
        function: String,
        position: usize,
        expected: &'static str,
    },

    #[error("map access with key '{key}' failed")]
    MissingAnswer { key: String },
}

/// A callable exposed to markers.
pub type Capability = Arc<dyn Fn(&Context, &[Value]) -> Result<Value, FunctionError> + Send + Sync>;

/// Named functions available to the expression language.
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: BTreeMap<String, Capability>,
}

impl FunctionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in functions every template may rely on.
    ///
    /// | Name              | Call                      |
    /// |-------------------|---------------------------|
    /// | `toCamelCase`     | `toCamelCase .Project.Name` |
    /// | `toPascalCase`    | `toPascalCase "my app"`   |
    /// | `toSnakeCase`     | `toSnakeCase .Vars.x`     |
    /// | `toKebabCase`     | `toKebabCase .Vars.x`     |
    /// | `join`            | `join list ", "`          |
    /// | `getSurveyResult` | `getSurveyResult "db"`    |
    pub fn standard() -> Self {
        Self::new()
            .with("toCamelCase", case_fn("toCamelCase", case::to_camel_case))
            .with("toPascalCase", case_fn("toPascalCase", case::to_pascal_case))
            .with("toSnakeCase", case_fn("toSnakeCase", case::to_snake_case))
            .with("toKebabCase", case_fn("toKebabCase", case::to_kebab_case))
            .with("join", join)
            .with("getSurveyResult", survey_result)
    }

    /// Add or replace a function.
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context, &[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

/// Text form of a value as it appears in rendered output.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "<no value>".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(display_value).collect();
            format!("[{}]", parts.join(" "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}:{}", k, display_value(v)))
                .collect();
            format!("map[{}]", parts.join(" "))
        }
    }
}

fn check_arity(function: &str, args: &[Value], expected: usize) -> Result<(), FunctionError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(FunctionError::Arity {
            function: function.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn string_arg<'a>(function: &str, args: &'a [Value], position: usize) -> Result<&'a str, FunctionError> {
    args[position].as_str().ok_or_else(|| FunctionError::Type {
        function: function.to_string(),
        position: position + 1,
        expected: "a string",
    })
}

fn case_fn(
    name: &'static str,
    convert: fn(&str) -> String,
) -> impl Fn(&Context, &[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static {
    move |_ctx, args| {
        check_arity(name, args, 1)?;
        Ok(Value::String(convert(string_arg(name, args, 0)?)))
    }
}

fn join(_ctx: &Context, args: &[Value]) -> Result<Value, FunctionError> {
    check_arity("join", args, 2)?;
    let items = args[0].as_array().ok_or_else(|| FunctionError::Type {
        function: "join".into(),
        position: 1,
        expected: "a list",
    })?;
    let separator = string_arg("join", args, 1)?;
    let parts: Vec<String> = items.iter().map(display_value).collect();
    Ok(Value::String(parts.join(separator)))
}

fn survey_result(ctx: &Context, args: &[Value]) -> Result<Value, FunctionError> {
    check_arity("getSurveyResult", args, 1)?;
    let key = string_arg("getSurveyResult", args, 0)?;
    ctx.answer(key)
        .cloned()
        .ok_or_else(|| FunctionError::MissingAnswer {
            key: key.to_string(),
        })
}
