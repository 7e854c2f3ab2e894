//! Feature standardization with statistics fixed at training time.
//!
//! Each fitted column keeps its own mean and scale, looked up by name, so a
//! feature matrix that carries only some of the fitted columns is still
//! scaled with the right statistics for every column it does carry.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::types::FeatureMatrix;

/// Maps a raw feature matrix to a standardized one of the same shape.
pub trait Scaler: Send + Sync {
    /// Names of the columns this scaler was fitted on, in fitted order.
    fn fitted_columns(&self) -> &[String];

    fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, ModelError>;
}

/// Serialized scaler parameters, aligned with the artifact's expected columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Zero-mean, unit-variance scaler.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    columns: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build from fitted parameters. A zero scale (constant training column)
    /// is treated as 1.0 so constant features map to `x - mean`.
    pub fn new(columns: Vec<String>, params: ScalerParams) -> Result<Self, ModelError> {
        if params.mean.len() != columns.len() || params.scale.len() != columns.len() {
            return Err(ModelError::Invalid(format!(
                "scaler fitted on {} means / {} scales but {} expected columns",
                params.mean.len(),
                params.scale.len(),
                columns.len()
            )));
        }
        if let Some(bad) = params
            .mean
            .iter()
            .chain(params.scale.iter())
            .find(|v| !v.is_finite())
        {
            return Err(ModelError::Invalid(format!(
                "scaler parameter is not finite: {bad}"
            )));
        }

        let scale = params
            .scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self {
            columns,
            mean: params.mean,
            scale,
        })
    }

    fn fitted_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

impl Scaler for StandardScaler {
    fn fitted_columns(&self) -> &[String] {
        &self.columns
    }

    fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, ModelError> {
        let stats: Vec<(f64, f64)> = matrix
            .columns()
            .iter()
            .map(|name| {
                self.fitted_index(name)
                    .map(|k| (self.mean[k], self.scale[k]))
                    .ok_or_else(|| ModelError::UnknownFeature(name.clone()))
            })
            .collect::<Result<_, _>>()?;

        let width = matrix.width();
        let scaled: Vec<f64> = matrix
            .as_slice()
            .iter()
            .enumerate()
            .map(|(idx, x)| {
                let (mean, scale) = stats[idx % width];
                (x - mean) / scale
            })
            .collect();

        FeatureMatrix::from_row_major(matrix.columns().to_vec(), matrix.rows(), scaled).ok_or(
            ModelError::ShapeMismatch {
                expected: width,
                actual: matrix.as_slice().len(),
            },
        )
    }
}
