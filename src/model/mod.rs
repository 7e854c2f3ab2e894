//! Trained reconstruction model
//!
//! The analysis only consumes a model; it never trains one. A model is an
//! immutable [`ModelArtifact`] holding two seams:
//!
//! - [`Scaler`]: raw features -> standardized features (training statistics)
//! - [`Reconstructor`]: standardized features -> reconstruction of the same shape
//!
//! plus the error threshold, the fitted column order, per-column normal
//! ranges and the temperature column list.

pub mod artifact;
pub mod reconstructor;
pub mod scaler;

pub use artifact::{ArtifactBundle, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use reconstructor::{Activation, DenseLayer, MlpAutoencoder, Reconstructor};
pub use scaler::{Scaler, ScalerParams, StandardScaler};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error reading {}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),

    #[error("malformed artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid artifact: {0}")]
    Invalid(String),

    #[error("artifact format version mismatch: file has v{0}, expected v{1}")]
    VersionMismatch(u32, u32),

    #[error("feature count mismatch: model expects {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("feature '{0}' was not part of the fitted model")]
    UnknownFeature(String),
}
