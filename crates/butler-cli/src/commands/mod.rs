//! Command handlers and the wiring they share.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use butler_adapters::{LocalFilesystem, LocalTemplateSource, MarkerEngine};
use butler_core::{
    application::{ScaffoldService, ports::Filesystem},
    domain::{Context, RunReport},
};

use crate::{
    cli::ContextArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

pub mod completions;
pub mod config;
pub mod init;
pub mod list;
pub mod new;
pub mod render;

/// Service over the local disk, able to fetch local templates.
pub(crate) fn scaffold_service(config: &AppConfig, workers: Option<usize>) -> CliResult<ScaffoldService> {
    let options = config.scaffold_options(workers)?;
    let filesystem: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    let source = LocalTemplateSource::new(Arc::clone(&filesystem));

    Ok(
        ScaffoldService::new(filesystem, Arc::new(MarkerEngine::new()), options)
            .with_source(Box::new(source)),
    )
}

/// Assemble the render context from config defaults and command-line values.
pub(crate) fn build_context(
    name: &str,
    path: &Path,
    template: Option<&str>,
    args: &ContextArgs,
    config: &AppConfig,
) -> CliResult<Context> {
    let mut builder = Context::builder(name)
        .path(path)
        .variables(config.variables.clone())
        .variables(args.vars.iter().cloned());

    if let Some(template) = template {
        builder = builder.template(template);
    }
    if let Some(description) = &args.description {
        builder = builder.description(description.as_str());
    }
    if let Some(file) = &args.answers {
        let answers = read_answers(file)?;
        debug!(count = answers.len(), file = %file.display(), "Loaded survey answers");
        builder = builder.answers(answers);
    }

    builder
        .build()
        .map_err(|e| CliError::Core(e.into()))
}

/// Read a JSON object of survey answers.
fn read_answers(file: &Path) -> CliResult<serde_json::Map<String, Value>> {
    let text = fs::read_to_string(file)
        .with_cli_context(|| format!("Failed to read answers from '{}'", file.display()))?;

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::InvalidInput {
            message: format!("'{}' must contain a JSON object", file.display()),
            source: None,
        }),
        Err(e) => Err(CliError::InvalidInput {
            message: format!("'{}' is not valid JSON", file.display()),
            source: Some(Box::new(e)),
        }),
    }
}

/// Print the report and turn job failures into an error exit.
pub(crate) fn finish(report: &RunReport, output: &OutputManager) -> CliResult<()> {
    output.report(report)?;
    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::RunFailed {
            failed: report.failed(),
            total: report.total(),
        })
    }
}
