//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The
//! CLI layer owns config; the core crate only ever sees the
//! [`ScaffoldOptions`] and catalog built from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables, `BUTLER__SECTION__KEY`
//! 3. Config file (`--config`, else `.butler.toml`, else the platform config dir)
//! 4. Built-in defaults (always present)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use butler_core::{
    application::ScaffoldOptions,
    domain::{
        Delimiters, FunctionTable, PathFilter, TemplateEntry,
        delimiters::{DEFAULT_END, DEFAULT_START},
        filter::{DEFAULT_BINARY_EXTENSIONS, DEFAULT_EXCLUDED_DIRS},
    },
    error::ButlerResult,
};

/// File name of a project-local configuration.
pub const LOCAL_CONFIG_FILE: &str = ".butler.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Worker pool and marker syntax.
    pub render: RenderConfig,
    /// Entries the walk never touches.
    pub filter: FilterConfig,
    /// Output settings.
    pub output: OutputConfig,
    /// Variables added to every context (`.Vars`); `--var` wins.
    pub variables: BTreeMap<String, String>,
    /// Template catalog.
    pub templates: Vec<TemplateEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// 0 = one worker per available core.
    pub workers: usize,
    /// Jobs buffered between the walker and the workers; 0 = hand-off.
    pub queue_capacity: usize,
    pub start_delimiter: String,
    pub end_delimiter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub excluded_dirs: Vec<String>,
    pub binary_extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_capacity: 64,
            start_delimiter: DEFAULT_START.into(),
            end_delimiter: DEFAULT_END.into(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            binary_extensions: DEFAULT_BINARY_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "human".into(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            filter: FilterConfig::default(),
            output: OutputConfig::default(),
            variables: BTreeMap::new(),
            templates: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the config file, then environment.
    ///
    /// An explicit `config_file` must exist; the implicit locations are
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("serialising built-in defaults")?;
        let mut builder = Config::builder().add_source(defaults);

        match config_file {
            Some(path) => {
                builder = builder.add_source(File::from(path.as_path()).required(true));
            }
            None => {
                let path = Self::active_path();
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("BUTLER")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("filter.excluded_dirs")
                .with_list_parse_key("filter.binary_extensions"),
        );

        let config = builder
            .build()
            .context("reading configuration sources")?
            .try_deserialize::<Self>()
            .context("invalid configuration")?;
        Ok(config)
    }

    /// Path to the global configuration file.
    ///
    /// Uses `directories::ProjectDirs`, falling back to `.butler.toml` in the
    /// current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "butler", "butler")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// The file `load` reads when `--config` is not given: a local
    /// `.butler.toml` if present, else the global file.
    pub fn active_path() -> PathBuf {
        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.is_file() {
            local.to_path_buf()
        } else {
            Self::config_path()
        }
    }

    /// Build the renderer options, validating delimiters and exclusions.
    pub fn scaffold_options(&self, workers: Option<usize>) -> ButlerResult<ScaffoldOptions> {
        let delimiters = Delimiters::new(
            self.render.start_delimiter.clone(),
            self.render.end_delimiter.clone(),
        )?;
        let filter = PathFilter::new(
            self.filter.excluded_dirs.iter().cloned(),
            self.filter.binary_extensions.iter().cloned(),
        )?;

        Ok(ScaffoldOptions {
            workers: workers.unwrap_or(self.render.workers),
            queue_capacity: self.render.queue_capacity,
            filter,
            delimiters,
            functions: FunctionTable::standard(),
        })
    }

    /// Value at a dotted key path such as `render.workers`.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let root = serde_json::to_value(self).ok()?;
        key.split('.')
            .try_fold(&root, |node, part| match node {
                serde_json::Value::Object(map) => map.get(part),
                serde_json::Value::Array(items) => {
                    part.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                _ => None,
            })
            .cloned()
    }
}
