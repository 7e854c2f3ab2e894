//! Analysis Configuration - operator-tunable TOML values
//!
//! Every struct implements `Default` with the values in `defaults`, so a
//! missing config file (or a missing section) changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the analysis pipeline and CLI.
///
/// Load with `AnalysisConfig::load()` which searches:
/// 1. `$MOTOR_SENTINEL_CONFIG` env var
/// 2. `./motor_sentinel.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl AnalysisConfig {
    /// Load configuration using the standard search order. The first
    /// candidate file that parses and validates wins; otherwise defaults.
    pub fn load() -> Self {
        Self::load_first(&ConfigSource::candidates())
    }

    fn load_first(candidates: &[(ConfigSource, PathBuf)]) -> Self {
        for (source, path) in candidates {
            if !path.is_file() {
                if *source == ConfigSource::EnvVar {
                    warn!(%source, path = %path.display(), "Config file not found, trying next source");
                }
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => {
                    info!(%source, path = %path.display(), "Analysis config loaded");
                    return config;
                }
                Err(e) => warn!(%source, error = %e, "Ignoring unusable config file"),
            }
        }

        info!("No usable config file, running with built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate for internal consistency, collecting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.output.max_data_points == 0 {
            errors.push("output.max_data_points must be at least 1".to_string());
        }
        if self.input.coolant_canonical.trim().is_empty() {
            errors.push("input.coolant_canonical must not be empty".to_string());
        }
        if self.input.temperature_keywords.iter().all(|k| k.trim().is_empty()) {
            errors.push("input.temperature_keywords must contain at least one keyword".to_string());
        }
        if self.model.path.as_os_str().is_empty() {
            errors.push("model.path must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Where a candidate config file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    EnvVar,
    WorkingDir,
}

impl ConfigSource {
    /// Candidate files, highest priority first.
    fn candidates() -> Vec<(Self, PathBuf)> {
        let mut out = Vec::with_capacity(2);
        if let Some(path) = std::env::var_os(defaults::CONFIG_ENV_VAR) {
            out.push((Self::EnvVar, PathBuf::from(path)));
        }
        out.push((Self::WorkingDir, PathBuf::from(defaults::LOCAL_CONFIG_FILE)));
        out
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar => write!(f, "${}", defaults::CONFIG_ENV_VAR),
            Self::WorkingDir => f.write_str("working directory"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid TOML in {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config rejected: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the JSON model artifact
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(defaults::MODEL_PATH),
        }
    }
}

/// Input schema handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// File analysed when no path or table is given
    pub default_data_path: PathBuf,
    /// Columns dropped before analysis when present
    pub excluded_columns: Vec<String>,
    /// Column used for plot time labels
    pub time_column: String,
    /// Legacy coolant column name
    pub coolant_alias: String,
    /// Name the legacy coolant column is renamed to
    pub coolant_canonical: String,
    /// Case-insensitive substrings identifying temperature columns
    pub temperature_keywords: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_data_path: PathBuf::from(defaults::DEFAULT_DATA_PATH),
            excluded_columns: defaults::EXCLUDED_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            time_column: defaults::TIME_COLUMN.to_string(),
            coolant_alias: defaults::COOLANT_ALIAS.to_string(),
            coolant_canonical: defaults::COOLANT_CANONICAL.to_string(),
            temperature_keywords: defaults::TEMPERATURE_KEYWORDS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Maximum plotted points per series
    pub max_data_points: usize,
    /// Number of anomalous rows echoed in the result
    pub sample_anomaly_limit: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_data_points: defaults::MAX_DATA_POINTS,
            sample_anomaly_limit: defaults::SAMPLE_ANOMALY_LIMIT,
        }
    }
}
