//! Analysis Configuration Module
//!
//! Configuration loaded from TOML files, replacing hardcoded schema names and
//! output limits with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `MOTOR_SENTINEL_CONFIG` environment variable (path to TOML file)
//! 2. `motor_sentinel.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! The config is a plain value: load it once and pass it (or the
//! `AnalysisOptions` built from it) to the analysis.
//!
//! ```ignore
//! let config = AnalysisConfig::load();
//! let options = AnalysisOptions::from_config(&config);
//! ```

mod analysis_config;
pub mod defaults;

pub use analysis_config::*;
