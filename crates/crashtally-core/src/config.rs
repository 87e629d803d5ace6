//! crashtally Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with defaults matching the yearly crash-data exports.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Category, Result, Vocabulary};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Input file locations
    pub input: InputConfig,

    /// Output locations and formatting
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Extra or overriding vocabularies
    pub vocabularies: Vec<VocabularyConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("CRASHTALLY_DATA_DIR") {
            config.input.data_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = std::env::var("CRASHTALLY_OUTPUT_DIR") {
            config.output.output_dir = PathBuf::from(dir);
        }
        if let Ok(pretty) = std::env::var("CRASHTALLY_PRETTY") {
            config.output.pretty = parse_bool("CRASHTALLY_PRETTY", &pretty)?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            config.logging.json_format = parse_bool("LOG_JSON", &json)?;
        }

        Ok(config)
    }

    /// Load from an optional TOML file with env overrides, or from env alone
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?.with_env_override()?,
            None => Self::from_env()?,
        };
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> std::result::Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError { path, message },
            other => other,
        })
    }

    /// Parse from TOML text
    pub fn from_toml(content: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> std::result::Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        if env_config.input.data_dir.is_some() {
            self.input.data_dir = env_config.input.data_dir;
        }
        if env_config.output.output_dir != defaults.output.output_dir {
            self.output.output_dir = env_config.output.output_dir;
        }
        if env_config.output.pretty != defaults.output.pretty {
            self.output.pretty = env_config.output.pretty;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }
        if env_config.logging.json_format != defaults.logging.json_format {
            self.logging.json_format = env_config.logging.json_format;
        }

        Ok(self)
    }

    /// Resolve the configured input files against `data_dir`
    pub fn input_paths(&self) -> Vec<PathBuf> {
        self.input
            .files
            .iter()
            .map(|file| match &self.input.data_dir {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file.clone(),
            })
            .collect()
    }

    /// Build every configured vocabulary
    pub fn build_vocabularies(&self) -> Result<Vec<Vocabulary>> {
        self.vocabularies
            .iter()
            .map(VocabularyConfig::build)
            .collect()
    }
}

fn parse_bool(key: &str, value: &str) -> std::result::Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Input file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory relative file names are resolved against
    pub data_dir: Option<PathBuf>,

    /// Files processed when none are given on the command line
    pub files: Vec<PathBuf>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            files: [
                "processed_crash_data_2019.csv",
                "processed_crash_data_2020.csv",
                "processed_crash_data_2021.csv",
                "processed_crash_data_2022.csv",
                "processed_crash_data_2023.csv",
                "processed_crash_data_2024.csv",
                "processed_crash_data_22024.csv",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for generated JSON documents
    pub output_dir: PathBuf,

    /// Pretty-print JSON
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            pretty: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// A vocabulary declared in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Vocabulary name; replaces a built-in with the same name
    pub name: String,

    /// Row field to read
    pub field: String,

    /// Catch-all code for unmatched values
    #[serde(default)]
    pub fallback: Option<String>,

    /// Categories in output order
    pub categories: Vec<Category>,
}

impl VocabularyConfig {
    /// Validate into a [`Vocabulary`]
    pub fn build(&self) -> Result<Vocabulary> {
        let mut builder = Vocabulary::builder(&self.name)
            .field(&self.field)
            .categories(self.categories.iter().cloned());
        if let Some(code) = &self.fallback {
            builder = builder.fallback(code);
        }
        builder.build()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
