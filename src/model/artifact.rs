//! Trained model artifact: the immutable bundle the analysis consumes.
//!
//! On disk the artifact is a single JSON document:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "error_threshold": 0.42,
//!   "expected_columns": ["ambient", "coolant_temperature", "..."],
//!   "column_stats": { "ambient": { "min_normal": -5.0, "max_normal": 35.0 } },
//!   "temperature_columns": ["ambient", "coolant_temperature"],
//!   "scaler": { "mean": [...], "scale": [...] },
//!   "reconstructor": { "activation": "relu", "layers": [{ "weights": [[...]], "biases": [...] }] }
//! }
//! ```
//!
//! `expected_columns` order is the order the scaler and network were fitted
//! in. Loading validates that every width agrees with it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::info;

use super::reconstructor::{MlpAutoencoder, Reconstructor};
use super::scaler::{Scaler, ScalerParams, StandardScaler};
use super::ModelError;
use crate::types::ColumnBounds;

/// Current on-disk format version.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const fn default_format_version() -> u32 {
    ARTIFACT_FORMAT_VERSION
}

/// Serialized form of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    pub reconstructor: MlpAutoencoder,
    pub scaler: ScalerParams,
    pub error_threshold: f64,
    pub expected_columns: Vec<String>,
    #[serde(default)]
    pub column_stats: BTreeMap<String, ColumnBounds>,
    #[serde(default)]
    pub temperature_columns: Vec<String>,
}

/// Loaded, validated model. Never mutated after construction, so one
/// instance can be shared across concurrent analyses (e.g. behind an `Arc`).
pub struct ModelArtifact {
    reconstructor: Box<dyn Reconstructor>,
    scaler: Box<dyn Scaler>,
    error_threshold: f64,
    expected_columns: Vec<String>,
    column_stats: BTreeMap<String, ColumnBounds>,
    temperature_columns: Vec<String>,
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("error_threshold", &self.error_threshold)
            .field("expected_columns", &self.expected_columns)
            .field("column_stats", &self.column_stats)
            .field("temperature_columns", &self.temperature_columns)
            .field("input_width", &self.reconstructor.input_width())
            .finish_non_exhaustive()
    }
}

impl ModelArtifact {
    /// Assemble an artifact from its parts.
    ///
    /// Rejects a non-finite threshold, duplicate expected columns, a scaler
    /// fitted on different columns, and inverted or non-finite bounds.
    pub fn new(
        reconstructor: Box<dyn Reconstructor>,
        scaler: Box<dyn Scaler>,
        error_threshold: f64,
        expected_columns: Vec<String>,
        column_stats: BTreeMap<String, ColumnBounds>,
        temperature_columns: Vec<String>,
    ) -> Result<Self, ModelError> {
        if !error_threshold.is_finite() {
            return Err(ModelError::Invalid(format!(
                "error_threshold is not finite: {error_threshold}"
            )));
        }
        if expected_columns.is_empty() {
            return Err(ModelError::Invalid("expected_columns is empty".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = expected_columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(ModelError::Invalid(format!(
                "expected_columns contains duplicate '{dup}'"
            )));
        }

        if scaler.fitted_columns() != expected_columns.as_slice() {
            return Err(ModelError::Invalid(
                "scaler was fitted on a different column order than expected_columns".to_string(),
            ));
        }

        if let Some(width) = reconstructor.input_width() {
            if width != expected_columns.len() {
                return Err(ModelError::ShapeMismatch {
                    expected: expected_columns.len(),
                    actual: width,
                });
            }
        }

        for (name, bounds) in &column_stats {
            let ordered = bounds.min_normal <= bounds.max_normal;
            if !bounds.min_normal.is_finite() || !bounds.max_normal.is_finite() || !ordered {
                return Err(ModelError::Invalid(format!(
                    "column_stats for '{name}' are not a finite [min, max] range"
                )));
            }
        }

        Ok(Self {
            reconstructor,
            scaler,
            error_threshold,
            expected_columns,
            column_stats,
            temperature_columns,
        })
    }

    /// Build from a deserialized bundle.
    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self, ModelError> {
        if bundle.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::VersionMismatch(
                bundle.format_version,
                ARTIFACT_FORMAT_VERSION,
            ));
        }
        bundle.reconstructor.validate()?;
        let scaler = StandardScaler::new(bundle.expected_columns.clone(), bundle.scaler)?;

        Self::new(
            Box::new(bundle.reconstructor),
            Box::new(scaler),
            bundle.error_threshold,
            bundle.expected_columns,
            bundle.column_stats,
            bundle.temperature_columns,
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let bundle: ArtifactBundle = serde_json::from_str(json)?;
        Self::from_bundle(bundle)
    }

    /// Load and validate an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let json =
            std::fs::read_to_string(path).map_err(|e| ModelError::Io(path.to_path_buf(), e))?;
        let artifact = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            features = artifact.expected_columns.len(),
            threshold = artifact.error_threshold,
            "Loaded model artifact"
        );
        Ok(artifact)
    }

    pub fn scaler(&self) -> &dyn Scaler {
        self.scaler.as_ref()
    }

    pub fn reconstructor(&self) -> &dyn Reconstructor {
        self.reconstructor.as_ref()
    }

    pub fn error_threshold(&self) -> f64 {
        self.error_threshold
    }

    pub fn expected_columns(&self) -> &[String] {
        &self.expected_columns
    }

    pub fn column_stats(&self) -> &BTreeMap<String, ColumnBounds> {
        &self.column_stats
    }

    /// Bounds for a column, unbounded when the artifact has none.
    pub fn bounds_for(&self, column: &str) -> ColumnBounds {
        self.column_stats
            .get(column)
            .copied()
            .unwrap_or(ColumnBounds::UNBOUNDED)
    }

    pub fn temperature_columns(&self) -> &[String] {
        &self.temperature_columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::reconstructor::DenseLayer;

    fn bundle() -> ArtifactBundle {
        ArtifactBundle {
            format_version: ARTIFACT_FORMAT_VERSION,
            reconstructor: MlpAutoencoder {
                layers: vec![DenseLayer {
                    weights: vec![vec![0.0, 0.0], vec![0.0, 0.0]],
                    biases: vec![0.0, 0.0],
                }],
                activation: Default::default(),
            },
            scaler: ScalerParams {
                mean: vec![0.0, 0.0],
                scale: vec![1.0, 1.0],
            },
            error_threshold: 0.5,
            expected_columns: vec!["stator_winding".into(), "coolant_temperature".into()],
            column_stats: BTreeMap::from([(
                "stator_winding".to_string(),
                ColumnBounds {
                    min_normal: 20.0,
                    max_normal: 120.0,
                },
            )]),
            temperature_columns: vec!["coolant_temperature".into()],
        }
    }

    #[test]
    fn test_from_bundle_valid() {
        let artifact = ModelArtifact::from_bundle(bundle()).expect("valid");
        assert_eq!(artifact.expected_columns().len(), 2);
        assert_eq!(artifact.error_threshold(), 0.5);
        assert_eq!(artifact.reconstructor().input_width(), Some(2));
        assert_eq!(
            artifact.bounds_for("coolant_temperature"),
            ColumnBounds::UNBOUNDED
        );
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let mut b = bundle();
        b.expected_columns = vec!["x".into(), "x".into()];
        let err = ModelArtifact::from_bundle(b).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_network_width_must_match_columns() {
        let mut b = bundle();
        b.expected_columns.push("third".into());
        b.scaler.mean.push(0.0);
        b.scaler.scale.push(1.0);
        assert!(ModelArtifact::from_bundle(b).is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut b = bundle();
        b.column_stats.insert(
            "coolant_temperature".into(),
            ColumnBounds {
                min_normal: 10.0,
                max_normal: 5.0,
            },
        );
        assert!(ModelArtifact::from_bundle(b).is_err());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut b = bundle();
        b.format_version = 99;
        assert!(matches!(
            ModelArtifact::from_bundle(b),
            Err(ModelError::VersionMismatch(99, ARTIFACT_FORMAT_VERSION))
        ));
    }

    #[test]
    fn test_disk_load() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("model.json");
        std::fs::write(&path, serde_json::to_vec(&bundle()).expect("serialize")).expect("write");

        let artifact = ModelArtifact::load(&path).expect("load");
        assert_eq!(artifact.temperature_columns(), &["coolant_temperature".to_string()]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ModelArtifact::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io(_, _)));
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "reconstructor": { "layers": [{ "weights": [[1.0]], "biases": [0.0] }] },
            "scaler": { "mean": [0.0], "scale": [1.0] },
            "error_threshold": 1.0,
            "expected_columns": ["pm"]
        }"#;
        let artifact = ModelArtifact::from_json_str(json).expect("parse");
        assert!(artifact.column_stats().is_empty());
        assert!(artifact.temperature_columns().is_empty());
    }
}
