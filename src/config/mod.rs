//! Configuration management for `issue_tracker`.
//!
//! Configuration is layered, lowest to highest precedence:
//! - Built-in defaults
//! - YAML file (`--config <path>`, else `issue-tracker.yaml` in the working directory)
//! - Environment variables (`ISSUES_BIND`, `PORT`, `ISSUES_BACKEND`, `ISSUES_DATA`,
//!   `ISSUES_LOG_JSON`)
//! - Command-line flags

use std::env;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use issue_lib::{InMemoryStore, IssueCollection};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::storage::SqliteStore;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "issue-tracker.yaml";

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where issues are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Volatile, process-local.
    #[default]
    Memory,
    /// In memory, rewritten to a JSONL file after every mutation.
    Jsonl,
    /// SQLite database file.
    Sqlite,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Jsonl => "jsonl",
            Self::Sqlite => "sqlite",
        }
    }

    /// Data file used when none is configured.
    #[must_use]
    pub fn default_data_path(self) -> Option<PathBuf> {
        match self {
            Self::Memory => None,
            Self::Jsonl => Some(PathBuf::from("issues.jsonl")),
            Self::Sqlite => Some(PathBuf::from("issues.db")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "jsonl" => Ok(Self::Jsonl),
            "sqlite" | "db" => Ok(Self::Sqlite),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

/// One layer of optional settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub bind: Option<String>,
    pub backend: Option<Backend>,
    pub data: Option<PathBuf>,
    pub log_json: Option<bool>,
}

impl ConfigLayer {
    /// Overlay every value `other` sets.
    pub fn merge_from(&mut self, other: &Self) {
        if other.bind.is_some() {
            self.bind.clone_from(&other.bind);
        }
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.data.is_some() {
            self.data.clone_from(&other.data);
        }
        if other.log_json.is_some() {
            self.log_json = other.log_json;
        }
    }

    /// Merge layers in order; later layers win.
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Load a layer from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `Read` if the file cannot be read or `Parse` if it is not a
    /// valid config document.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a layer from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for an unparseable backend, port or flag.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load a layer from an arbitrary variable lookup.
    ///
    /// `ISSUES_BIND` takes precedence over `PORT`, which binds all interfaces.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for an unparseable backend, port or flag.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut layer = Self::default();

        if let Some(bind) = lookup("ISSUES_BIND") {
            layer.bind = Some(bind);
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("PORT", &port, e))?;
            layer.bind = Some(format!("0.0.0.0:{port}"));
        }

        if let Some(value) = lookup("ISSUES_BACKEND") {
            layer.backend = Some(
                value
                    .parse()
                    .map_err(|e: String| ConfigError::invalid("ISSUES_BACKEND", &value, e))?,
            );
        }

        if let Some(value) = lookup("ISSUES_DATA").filter(|v| !v.is_empty()) {
            layer.data = Some(PathBuf::from(value));
        }

        if let Some(value) = lookup("ISSUES_LOG_JSON") {
            layer.log_json = Some(parse_flag(&value).ok_or_else(|| {
                ConfigError::invalid("ISSUES_LOG_JSON", &value, "expected true or false")
            })?);
        }

        Ok(layer)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Fully resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub backend: Backend,
    pub data_path: Option<PathBuf>,
    pub log_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            backend: Backend::Memory,
            data_path: None,
            log_json: false,
        }
    }
}

impl ServiceConfig {
    /// Resolve a merged layer, filling gaps with defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if `bind` is not a socket address.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let bind_text = layer.bind.as_deref().unwrap_or(DEFAULT_BIND);
        let bind = bind_text
            .parse()
            .map_err(|e| ConfigError::invalid("bind", bind_text, e))?;
        let backend = layer.backend.unwrap_or_default();
        let data_path = match backend {
            Backend::Memory => None,
            _ => layer.data.clone().or_else(|| backend.default_data_path()),
        };

        Ok(Self {
            bind,
            backend,
            data_path,
            log_json: layer.log_json.unwrap_or(false),
        })
    }
}

/// Load configuration from file, environment and CLI overrides.
///
/// # Errors
///
/// Returns an error if the config file or any value is invalid.
pub fn load_config(config_path: Option<&Path>, overrides: &ConfigLayer) -> Result<ServiceConfig> {
    let file_layer = match config_path {
        Some(path) => ConfigLayer::from_yaml(path)?,
        None => {
            let local = Path::new(DEFAULT_CONFIG_FILE);
            if local.is_file() {
                ConfigLayer::from_yaml(local)?
            } else {
                ConfigLayer::default()
            }
        }
    };
    let env_layer = ConfigLayer::from_env()?;

    let merged = ConfigLayer::merge_layers(&[file_layer, env_layer, overrides.clone()]);
    debug!(?merged, "Merged configuration layers");
    ServiceConfig::from_layer(&merged)
}

/// Open the issue collection the configuration names.
///
/// # Errors
///
/// Returns an error if the data file cannot be opened or loaded.
pub fn open_collection(
    config: &ServiceConfig,
) -> issue_lib::Result<Box<dyn IssueCollection + Send>> {
    let collection: Box<dyn IssueCollection + Send> = match (config.backend, &config.data_path) {
        (Backend::Jsonl, Some(path)) => Box::new(InMemoryStore::open(path)?),
        (Backend::Sqlite, Some(path)) => Box::new(SqliteStore::open(path)?),
        (Backend::Sqlite, None) => Box::new(SqliteStore::open_memory()?),
        (Backend::Memory | Backend::Jsonl, _) => Box::new(InMemoryStore::new()),
    };
    Ok(collection)
}
