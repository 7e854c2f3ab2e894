//! Motor anomaly analysis pipeline
//!
//! Batch analysis of one in-memory table per call:
//!
//! ```text
//! RawTable -> schema (ColumnAvailability) -> preparer (FeatureMatrix)
//!          -> scorer (errors, flags, out-of-range counts)
//!          -> summary + downsampler -> analyzer (AnalysisRecord)
//! ```
//!
//! ## Architecture
//! - `schema`: reconcile input columns with the model's fitted columns
//! - `preparer`: numeric coercion, gap filling, feature matrix in fitted order
//! - `scorer`: scaling, reconstruction error, threshold classification
//! - `downsampler`: stride decimation shared by every plotted series
//! - `summary`: temperature statistics, anomaly counts, sample rows
//! - `analyzer`: entry point and result assembly
//!
//! The public entry points never return `Err`: every failure becomes an
//! `AnalysisRecord::Error` carrying a message.

pub mod analyzer;
pub mod downsampler;
pub mod preparer;
pub mod schema;
pub mod scorer;
pub mod summary;

pub use analyzer::MotorAnalyzer;
pub use downsampler::DecimationPlan;
pub use preparer::{fill_gaps, FeaturePreparer, PreparedData};
pub use schema::ColumnAvailability;
pub use scorer::{AnomalyScorer, ScoreOutput};

use std::path::PathBuf;
use thiserror::Error;

use crate::config::AnalysisConfig;
use crate::ingest::IngestError;
use crate::model::ModelError;
use crate::types::RawTable;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to load model: {0}")]
    ModelLoad(ModelError),

    #[error("Failed to load data: {0}")]
    DataLoad(#[from] IngestError),

    #[error("Invalid input data: {0}")]
    Data(String),

    #[error("Error during anomaly detection: {0}")]
    Scoring(String),
}

// ============================================================================
// Options
// ============================================================================

/// Per-call analysis knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Upper bound on plotted points per series (at least 1)
    pub max_data_points: usize,
    pub sample_anomaly_limit: usize,
    pub excluded_columns: Vec<String>,
    pub time_column: String,
    pub coolant_alias: String,
    pub coolant_canonical: String,
    pub temperature_keywords: Vec<String>,
    /// Used when neither a table nor a path is supplied
    pub default_data_path: PathBuf,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl AnalysisOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            max_data_points: config.output.max_data_points.max(1),
            sample_anomaly_limit: config.output.sample_anomaly_limit,
            excluded_columns: config.input.excluded_columns.clone(),
            time_column: config.input.time_column.clone(),
            coolant_alias: config.input.coolant_alias.clone(),
            coolant_canonical: config.input.coolant_canonical.clone(),
            temperature_keywords: config
                .input
                .temperature_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            default_data_path: config.input.default_data_path.clone(),
        }
    }

    /// Override the plotted point budget. Zero is clamped to 1.
    #[must_use]
    pub fn with_max_data_points(mut self, max_data_points: usize) -> Self {
        self.max_data_points = max_data_points.max(1);
        self
    }
}

// ============================================================================
// Input
// ============================================================================

/// Where the rows to analyse come from.
#[derive(Debug, Clone, Default)]
pub enum InputSource {
    Table(RawTable),
    Path(PathBuf),
    /// The configured default sample file
    #[default]
    Sample,
}

impl InputSource {
    /// Resolve caller arguments. A table wins over a path; neither means
    /// the default sample file.
    pub fn from_parts(path: Option<PathBuf>, table: Option<RawTable>) -> Self {
        match (table, path) {
            (Some(table), _) => Self::Table(table),
            (None, Some(path)) => Self::Path(path),
            (None, None) => Self::Sample,
        }
    }

    /// Materialize the table.
    pub fn load(self, options: &AnalysisOptions) -> Result<RawTable, AnalysisError> {
        match self {
            Self::Table(table) => Ok(table),
            Self::Path(path) => Ok(crate::ingest::read_csv_file(&path)?),
            Self::Sample => Ok(crate::ingest::read_csv_file(&options.default_data_path)?),
        }
    }
}
