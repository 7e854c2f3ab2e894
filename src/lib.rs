//! Motor Sentinel: electric motor anomaly detection
//!
//! Batch analysis of motor telemetry against a pre-trained reconstruction
//! model. Rows whose reconstruction error exceeds the model threshold are
//! flagged; per-column training ranges give parameter-level tallies.
//!
//! ## Architecture
//!
//! - **Model**: artifact loading, feature scaler, MLP reconstructor
//! - **Ingest**: CSV input into a raw table
//! - **Analysis**: schema reconciliation, feature preparation, scoring,
//!   summaries, downsampling, result assembly
//! - **Config**: TOML configuration with compiled-in defaults

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod model;
pub mod types;

// Re-export configuration
pub use config::{AnalysisConfig, ConfigError};

// Re-export the analysis entry point
pub use analysis::{AnalysisError, AnalysisOptions, InputSource, MotorAnalyzer};

// Re-export model components
pub use model::{ModelArtifact, ModelError};

// Re-export commonly used types
pub use types::{
    AnalysisRecord, AnalysisReport, AnomalySummary, CellValue, ColumnBounds, DataQualityNotes,
    FeatureMatrix, PlotData, RawTable, TemperatureStats, TimeLabel,
};
