//! Anomaly Scorer
//!
//! Scales the feature matrix, reconstructs it, and scores each row by its
//! mean squared reconstruction error (mean across columns). A row is
//! anomalous when its error is strictly above the model threshold.
//!
//! Independently of the network, every column with training bounds is
//! checked for values outside `[min_normal, max_normal]`.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::AnalysisError;
use crate::model::ModelArtifact;
use crate::types::{ColumnBounds, FeatureMatrix};

/// Full-resolution scoring output. `errors` and `anomalies` are indexed
/// like the feature matrix rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutput {
    pub errors: Vec<f64>,
    pub anomalies: Vec<bool>,
    /// Column -> out-of-range row count (only columns with violations)
    pub parameter_anomalies: BTreeMap<String, usize>,
}

impl ScoreOutput {
    /// Row indices flagged anomalous, ascending.
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.anomalies
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| a.then_some(i))
            .collect()
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies.iter().filter(|&&a| a).count()
    }
}

/// Scoring stage
pub struct AnomalyScorer;

impl AnomalyScorer {
    /// Score every row of `matrix` against `artifact`.
    ///
    /// # Errors
    /// `AnalysisError::Scoring` on any shape disagreement between the matrix,
    /// the scaler and the reconstructor, or on a non-finite error value.
    pub fn score(
        matrix: &FeatureMatrix,
        artifact: &ModelArtifact,
    ) -> Result<ScoreOutput, AnalysisError> {
        if let Some(width) = artifact.reconstructor().input_width() {
            if width != matrix.width() {
                return Err(AnalysisError::Scoring(format!(
                    "feature count mismatch: model expects {width} features, input provides {} ({})",
                    matrix.width(),
                    matrix.columns().join(", ")
                )));
            }
        }

        let scaled = artifact
            .scaler()
            .transform(matrix)
            .map_err(|e| AnalysisError::Scoring(e.to_string()))?;
        let reconstructed = artifact
            .reconstructor()
            .reconstruct(&scaled)
            .map_err(|e| AnalysisError::Scoring(e.to_string()))?;

        let errors = reconstruction_errors(&scaled, &reconstructed)?;
        let anomalies = classify(&errors, artifact.error_threshold());
        let parameter_anomalies = parameter_anomalies(matrix, artifact.column_stats());

        let unbounded: Vec<&str> = matrix
            .columns()
            .iter()
            .filter(|c| !artifact.column_stats().contains_key(*c))
            .map(String::as_str)
            .collect();
        if !unbounded.is_empty() {
            warn!(columns = ?unbounded, "No normal range for columns, skipping range checks");
        }

        debug!(
            rows = errors.len(),
            anomalies = anomalies.iter().filter(|&&a| a).count(),
            out_of_range_columns = parameter_anomalies.len(),
            "Scored feature matrix"
        );

        Ok(ScoreOutput {
            errors,
            anomalies,
            parameter_anomalies,
        })
    }
}

/// Per-row mean of squared differences across columns.
pub fn reconstruction_errors(
    scaled: &FeatureMatrix,
    reconstructed: &FeatureMatrix,
) -> Result<Vec<f64>, AnalysisError> {
    if scaled.rows() != reconstructed.rows() || scaled.width() != reconstructed.width() {
        return Err(AnalysisError::Scoring(format!(
            "reconstruction shape {}x{} does not match input {}x{}",
            reconstructed.rows(),
            reconstructed.width(),
            scaled.rows(),
            scaled.width()
        )));
    }
    if scaled.width() == 0 {
        return Err(AnalysisError::Scoring("feature matrix has no columns".to_string()));
    }

    let width = scaled.width() as f64;
    (0..scaled.rows())
        .map(|i| {
            let sse: f64 = scaled
                .row(i)
                .iter()
                .zip(reconstructed.row(i))
                .map(|(x, r)| (x - r).powi(2))
                .sum();
            let mse = sse / width;
            if mse.is_finite() {
                Ok(mse)
            } else {
                Err(AnalysisError::Scoring(format!(
                    "non-finite reconstruction error at row {i}"
                )))
            }
        })
        .collect()
}

/// Strictly-greater-than threshold classification.
pub fn classify(errors: &[f64], threshold: f64) -> Vec<bool> {
    errors.iter().map(|&e| e > threshold).collect()
}

/// Count out-of-range rows for every matrix column that has bounds.
pub fn parameter_anomalies(
    matrix: &FeatureMatrix,
    column_stats: &BTreeMap<String, ColumnBounds>,
) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for (j, name) in matrix.columns().iter().enumerate() {
        let Some(bounds) = column_stats.get(name) else {
            continue;
        };
        let count = (0..matrix.rows())
            .filter(|&i| bounds.is_out_of_range(matrix.row(i)[j]))
            .count();
        if count > 0 {
            out.insert(name.clone(), count);
        }
    }
    out
}
