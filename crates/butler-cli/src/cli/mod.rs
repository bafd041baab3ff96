//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums. No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use butler_core::domain::parse_assignment;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "butler",
    bin_name = "butler",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Render project templates in place",
    long_about = "Butler copies a project template and renders the butler{...} \
                  markers in its directory names, file names and file contents.",
    after_help = "EXAMPLES:\n\
        \x20 butler new my-service --template go-api --var owner=platform\n\
        \x20 butler render ./checkout --name shop --var port=8080\n\
        \x20 butler list --format json\n\
        \x20 butler completions bash > /usr/share/bash-completion/completions/butler",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new project from a configured template.
    #[command(
        visible_alias = "n",
        about = "Create a new project from a template",
        after_help = "EXAMPLES:\n\
            \x20 butler new my-app --template go-cli\n\
            \x20 butler new my-app --template go-cli --dest ~/src --var license=MIT\n\
            \x20 butler new my-app --template go-cli --answers answers.json --force"
    )]
    New(NewArgs),

    /// Render an existing directory in place.
    #[command(
        visible_alias = "r",
        about = "Render markers in an existing directory",
        after_help = "EXAMPLES:\n\
            \x20 butler render ./my-app\n\
            \x20 butler render ./checkout --name shop --template go-api --workers 4"
    )]
    Render(RenderArgs),

    /// List configured templates.
    #[command(
        visible_alias = "ls",
        about = "List configured templates",
        after_help = "EXAMPLES:\n\
            \x20 butler list\n\
            \x20 butler list --format csv"
    )]
    List(ListArgs),

    /// Initialise a Butler configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 butler init           # default location\n\
            \x20 butler init --global  # global config\n\
            \x20 butler init --local   # .butler.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 butler completions bash > ~/.local/share/bash-completion/completions/butler\n\
            \x20 butler completions zsh  > ~/.zfunc/_butler\n\
            \x20 butler completions fish > ~/.config/fish/completions/butler.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Butler configuration.
    #[command(
        about = "Configuration inspection",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 butler config get render.workers\n\
            \x20 butler config list\n\
            \x20 butler config path"
    )]
    Config(ConfigCommands),
}

// ── shared render inputs ──────────────────────────────────────────────────────

/// Values that end up in the render context.
#[derive(Debug, Clone, Default, Args)]
pub struct ContextArgs {
    /// Free-form project description (`.Project.Description`).
    #[arg(short = 'D', long = "description", value_name = "TEXT")]
    pub description: Option<String>,

    /// Template variable, repeatable (`.Vars.KEY`).
    #[arg(
        long = "var",
        value_name = "KEY=VALUE",
        value_parser = parse_var,
        help = "Set a template variable (repeatable)"
    )]
    pub vars: Vec<(String, String)>,

    /// JSON object of survey answers (read with `getSurveyResult`).
    #[arg(long = "answers", value_name = "FILE")]
    pub answers: Option<PathBuf>,

    /// Worker threads; 0 uses every available core.
    #[arg(short = 'j', long = "workers", value_name = "N")]
    pub workers: Option<usize>,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    parse_assignment(raw).map_err(|e| e.to_string())
}

// ── new ───────────────────────────────────────────────────────────────────────

/// Arguments for `butler new`.
#[derive(Debug, Args)]
pub struct NewArgs {
    /// Project name; also the directory created under `--dest`.
    #[arg(value_name = "NAME", help = "Project name")]
    pub name: String,

    /// Name of a configured template.
    #[arg(
        short = 't',
        long = "template",
        value_name = "NAME",
        help = "Template to use (see `butler list`)"
    )]
    pub template: String,

    /// Parent directory of the new project.
    #[arg(
        short = 'd',
        long = "dest",
        value_name = "DIR",
        default_value = ".",
        help = "Directory to create the project in"
    )]
    pub dest: PathBuf,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Remove an existing project directory first (destructive).
    #[arg(long = "force", help = "Replace an existing project directory")]
    pub force: bool,
}

// ── render ────────────────────────────────────────────────────────────────────

/// Arguments for `butler render`.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Directory to render in place.
    #[arg(value_name = "DIR", help = "Directory to render")]
    pub dir: PathBuf,

    /// Project name; defaults to the directory's own name.
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Template label exposed as `.Project.Template`.
    #[arg(short = 't', long = "template", value_name = "NAME")]
    pub template: Option<String>,

    #[command(flatten)]
    pub context: ContextArgs,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `butler list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
    /// CSV rows.
    Csv,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `butler init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to the global config location.
    #[arg(long = "global", conflicts_with = "local", help = "Create global configuration")]
    pub global: bool,

    /// Write to `.butler.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `butler completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `butler config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `render.workers`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
