//! Layered runtime configuration.
//!
//! # Responsibility
//! - Merge built-in defaults, an optional TOML file and `ORGDIR__*`
//!   environment overrides into one typed value.
//!
//! # Invariants
//! - Missing sections fall back to defaults.
//! - Nested keys use `__` in environment names, e.g.
//!   `ORGDIR__HIERARCHY__DEFAULT_MAX_DEPTH=5`.

use crate::policy::depth_policy::DEFAULT_MAX_DEPTH;
use config::{Config, Environment, File, FileFormat};
use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "ORGDIR";
const ENV_SEPARATOR: &str = "__";

/// Errors from configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// Source could not be read or deserialized.
    Load(config::ConfigError),
    /// Values parsed but are not usable.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "failed to load config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(value: config::ConfigError) -> Self {
        Self::Load(value)
    }
}

/// Top-level catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub hierarchy: HierarchyConfig,
}

/// Storage location. `None` selects an in-memory database.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

/// File logging. Logging stays off unless `dir` is set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Initial value of the shared depth policy.
    pub default_max_depth: u32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            default_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Loads configuration from `path` (TOML, must exist when given) and the
/// process environment.
///
/// # Errors
/// - `Load` when the file is missing or a value has the wrong type.
/// - `Invalid` when the logging level is not recognized.
pub fn load_config(path: Option<&Path>) -> Result<CatalogConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?.try_deserialize::<CatalogConfig>()?;
    crate::logging::normalize_level(&config.logging.level)
        .map_err(|err| ConfigError::Invalid(err.to_string()))?;

    info!(
        "event=config_load module=config status=ok file={} max_depth={}",
        path.is_some(),
        config.hierarchy.default_max_depth
    );
    Ok(config)
}
