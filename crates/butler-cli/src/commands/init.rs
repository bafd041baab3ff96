//! `butler init` creates a default configuration file.

use std::path::PathBuf;

use crate::{
    cli::InitArgs,
    config::{AppConfig, LOCAL_CONFIG_FILE},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Write the built-in defaults as TOML.
pub fn execute(args: InitArgs, output: OutputManager) -> CliResult<()> {
    output.info("Initialising configuration...")?;

    let config_path = target_path(&args);

    if config_path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {}  (use --force to overwrite)",
            config_path.display(),
        ))?;
        return Ok(());
    }

    let toml = toml::to_string_pretty(&AppConfig::default()).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise default config: {e}"),
        source: Some(Box::new(e)),
    })?;

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_cli_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }

    std::fs::write(&config_path, &toml)
        .with_cli_context(|| format!("Failed to write config to '{}'", config_path.display()))?;

    output.success(&format!(
        "Configuration created at {}",
        config_path.display(),
    ))?;
    Ok(())
}

fn target_path(args: &InitArgs) -> PathBuf {
    match (args.global, args.local) {
        (false, true) => PathBuf::from(LOCAL_CONFIG_FILE),
        _ => AppConfig::config_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_flag_targets_cwd_file() {
        let args = InitArgs {
            global: false,
            local: true,
            force: false,
        };
        assert_eq!(target_path(&args), PathBuf::from(".butler.toml"));
    }

    #[test]
    fn global_is_the_default() {
        let args = InitArgs {
            global: false,
            local: false,
            force: false,
        };
        assert_eq!(target_path(&args), AppConfig::config_path());
    }
}
