//! Configuration management with layered hierarchy

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entities::IdentifierSteps;
use crate::parser::{CorrelationMode, ParserSettings, DEFAULT_PREFIX_MARKER};

/// Default store file, relative to the working directory
pub const DEFAULT_DATABASE: &str = "plp.db";

/// Extensions taken when walking directories
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["log", "txt", "json", "gz"];

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    #[diagnostic(code(plp::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    #[diagnostic(
        code(plp::config::parse),
        help("expected YAML with keys database, prefix_marker, identifier_steps, correlation, extensions, log_level")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

/// PLP configuration with layered hierarchy
///
/// Every key is optional; unset keys fall back to built-in defaults through
/// the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite store file
    pub database: Option<PathBuf>,

    /// Marker that ends the banner of a log line
    pub prefix_marker: Option<String>,

    /// Step names whose measured value is the unit's PCBA number
    pub identifier_steps: Option<Vec<String>>,

    /// How step batches are matched to final stations
    pub correlation: Option<CorrelationMode>,

    /// File extensions taken when walking directories
    pub extensions: Option<Vec<String>>,

    /// Default log level
    pub log_level: Option<String>,
}

/// Fully resolved configuration, as shown by `plp config show`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveConfig {
    pub database: PathBuf,
    pub prefix_marker: String,
    pub identifier_steps: Vec<String>,
    pub correlation: CorrelationMode,
    pub extensions: Vec<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// An unreadable or malformed global config is ignored; an explicit
    /// config file must load.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Built-in defaults (accessors)

        // 2. Global user config (~/.config/plp/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(global) = Self::from_file(&global_path) {
                    config.merge(global);
                }
            }
        }

        // 3. Explicit --config file
        if let Some(path) = explicit {
            config.merge(Self::from_file(path)?);
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Parse one YAML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yml::from_str(contents)
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "plp")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Override from `PLP_*` environment variables
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup("PLP_DATABASE").filter(|v| !v.is_empty()) {
            self.database = Some(PathBuf::from(database));
        }
        if let Some(level) = lookup("PLP_LOG_LEVEL").filter(|v| !v.is_empty()) {
            self.log_level = Some(level);
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.prefix_marker.is_some() {
            self.prefix_marker = other.prefix_marker;
        }
        if other.identifier_steps.is_some() {
            self.identifier_steps = other.identifier_steps;
        }
        if other.correlation.is_some() {
            self.correlation = other.correlation;
        }
        if other.extensions.is_some() {
            self.extensions = other.extensions;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
    }

    pub fn database(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    pub fn extensions(&self) -> Vec<String> {
        self.extensions
            .clone()
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Settings for the parsing stages
    pub fn parser_settings(&self) -> ParserSettings {
        ParserSettings {
            prefix_marker: self
                .prefix_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_PREFIX_MARKER.to_string()),
            identifier_steps: self
                .identifier_steps
                .as_ref()
                .map(|names| IdentifierSteps::new(names.iter().cloned()))
                .unwrap_or_default(),
            correlation: self.correlation.unwrap_or_default(),
        }
    }

    pub fn effective(&self) -> EffectiveConfig {
        let settings = self.parser_settings();
        EffectiveConfig {
            database: self.database(),
            prefix_marker: settings.prefix_marker,
            identifier_steps: settings.identifier_steps.names().to_vec(),
            correlation: settings.correlation,
            extensions: self.extensions(),
            log_level: self.log_level().to_string(),
        }
    }
}
