//! Implementation of the `butler new` command.
//!
//! Responsibility: resolve the template and destination, build the context,
//! call the core scaffold service and display the report.

use tracing::{info, instrument};

use butler_core::application::TemplateService;

use crate::{
    cli::{GlobalArgs, NewArgs},
    commands::{build_context, finish, scaffold_service},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `butler new` command.
///
/// 1. Validate the project name
/// 2. Look the template up in the configured catalog
/// 3. Copy it to `<dest>/<name>` and render it in place
/// 4. Print the report and next steps
#[instrument(skip_all, fields(project = %args.name, template = %args.template))]
pub fn execute(
    args: NewArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    validate_project_name(&args.name)?;

    let catalog = TemplateService::new(config.templates.clone())?;
    let template = catalog.get_by_name(&args.template)?;

    let project_path = args.dest.join(&args.name);
    let context = build_context(
        &args.name,
        &project_path,
        Some(&template.name),
        &args.context,
        &config,
    )?;
    let service = scaffold_service(&config, args.context.workers)?;

    output.header(&format!("Creating '{}' from {}...", args.name, template.name))?;
    info!(path = %project_path.display(), url = %template.url, "Scaffold started");

    let spinner = output.spinner("Rendering");
    let result = service.scaffold(template, context, args.force);
    spinner.finish_and_clear();
    let report = result?;

    finish(&report, &output)?;

    output.success(&format!("Project '{}' created!", args.name))?;
    if !global.quiet {
        output.print("")?;
        output.print("Next steps:")?;
        output.print(&format!("  cd {}", project_path.display()))?;
    }
    Ok(())
}

fn validate_project_name(name: &str) -> CliResult<()> {
    let reason = if name.trim().is_empty() {
        Some("name cannot be empty")
    } else if name.starts_with('.') {
        Some("name cannot start with '.'")
    } else if name.contains('/') || name.contains('\\') {
        Some("name cannot contain path separators")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: reason.into(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_invalid() {
        assert!(matches!(
            validate_project_name(""),
            Err(CliError::InvalidProjectName { .. })
        ));
    }

    #[test]
    fn dotfile_name_is_invalid() {
        assert!(matches!(
            validate_project_name(".hidden"),
            Err(CliError::InvalidProjectName { .. })
        ));
    }

    #[test]
    fn path_separator_in_name_is_invalid() {
        assert!(validate_project_name("a/b").is_err());
        assert!(validate_project_name("a\\b").is_err());
    }

    #[test]
    fn valid_names_pass() {
        for name in &["my-project", "my_app", "project123", "MyApp", "butler"] {
            assert!(validate_project_name(name).is_ok(), "failed for: {name}");
        }
    }
}
