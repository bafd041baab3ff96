//! `butler render` renders an already materialized tree in place.

use std::path::Path;

use tracing::{info, instrument};

use crate::{
    cli::RenderArgs,
    commands::{build_context, finish, scaffold_service},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

#[instrument(skip_all, fields(dir = %args.dir.display()))]
pub fn execute(args: RenderArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    if !args.dir.is_dir() {
        return Err(CliError::DirectoryNotFound { path: args.dir });
    }

    let root = args
        .dir
        .canonicalize()
        .with_cli_context(|| format!("Failed to resolve '{}'", args.dir.display()))?;
    let name = match &args.name {
        Some(name) => name.clone(),
        None => default_name(&root)?,
    };

    let context = build_context(
        &name,
        &root,
        args.template.as_deref(),
        &args.context,
        &config,
    )?;
    let service = scaffold_service(&config, args.context.workers)?;

    output.header(&format!("Rendering {}...", root.display()))?;
    info!(project = %name, "Render started");

    let spinner = output.spinner("Rendering");
    let result = service.render_tree(context);
    spinner.finish_and_clear();

    finish(&result?, &output)
}

/// The directory's own name, used when `--name` is absent.
fn default_name(root: &Path) -> CliResult<String> {
    root.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| CliError::InvalidProjectName {
            name: root.display().to_string(),
            reason: "cannot derive a project name from this path; pass --name".into(),
        })
}
