//! Reconstruction network.
//!
//! The trained autoencoder is a plain multilayer perceptron fitted to map its
//! input back onto itself:
//!
//! ```text
//! h_0 = x
//! h_k = act(h_{k-1} · W_k + b_k)      hidden layers
//! y   = h_{L-1} · W_L + b_L           output layer (identity)
//! ```
//!
//! `W_k` is stored as `[n_in][n_out]`.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::types::FeatureMatrix;

/// Maps a scaled feature matrix to a reconstruction of identical shape.
pub trait Reconstructor: Send + Sync {
    /// Fixed input width, if the reconstructor has one.
    fn input_width(&self) -> Option<usize>;

    fn reconstruct(&self, scaled: &FeatureMatrix) -> Result<FeatureMatrix, ModelError>;
}

/// Hidden-layer activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Logistic,
    Identity,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Relu => x.max(0.0),
            Self::Tanh => x.tanh(),
            Self::Logistic => 1.0 / (1.0 + (-x).exp()),
            Self::Identity => x,
        }
    }
}

/// One fully connected layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    /// `[n_in][n_out]`
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl DenseLayer {
    fn n_in(&self) -> usize {
        self.weights.len()
    }

    fn n_out(&self) -> usize {
        self.biases.len()
    }

    fn forward(&self, input: &[f64], out: &mut Vec<f64>) {
        out.clear();
        out.extend_from_slice(&self.biases);
        for (x, row) in input.iter().zip(&self.weights) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
    }
}

/// Dense autoencoder loaded from the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpAutoencoder {
    pub layers: Vec<DenseLayer>,
    #[serde(default)]
    pub activation: Activation,
}

impl MlpAutoencoder {
    /// Check that layer shapes chain and that output width equals input width.
    pub fn validate(&self) -> Result<(), ModelError> {
        let first = self
            .layers
            .first()
            .ok_or_else(|| ModelError::Invalid("reconstructor has no layers".to_string()))?;

        let mut width = first.n_in();
        for (k, layer) in self.layers.iter().enumerate() {
            if layer.n_in() != width {
                return Err(ModelError::Invalid(format!(
                    "layer {k} expects {} inputs but previous layer produces {width}",
                    layer.n_in()
                )));
            }
            if let Some(r) = layer.weights.iter().position(|row| row.len() != layer.n_out()) {
                return Err(ModelError::Invalid(format!(
                    "layer {k} weight row {r} has wrong length (expected {})",
                    layer.n_out()
                )));
            }
            let non_finite = layer
                .weights
                .iter()
                .flatten()
                .chain(&layer.biases)
                .any(|v| !v.is_finite());
            if non_finite {
                return Err(ModelError::Invalid(format!(
                    "layer {k} contains non-finite parameters"
                )));
            }
            width = layer.n_out();
        }

        if width != first.n_in() {
            return Err(ModelError::Invalid(format!(
                "reconstructor maps {} features to {width}",
                first.n_in()
            )));
        }
        Ok(())
    }

    fn forward_row(&self, row: &[f64], a: &mut Vec<f64>, b: &mut Vec<f64>) {
        a.clear();
        a.extend_from_slice(row);
        let last = self.layers.len() - 1;
        for (k, layer) in self.layers.iter().enumerate() {
            layer.forward(a, b);
            if k < last {
                for v in b.iter_mut() {
                    *v = self.activation.apply(*v);
                }
            }
            std::mem::swap(a, b);
        }
    }
}

impl Reconstructor for MlpAutoencoder {
    fn input_width(&self) -> Option<usize> {
        self.layers.first().map(DenseLayer::n_in)
    }

    fn reconstruct(&self, scaled: &FeatureMatrix) -> Result<FeatureMatrix, ModelError> {
        let expected = self
            .input_width()
            .ok_or_else(|| ModelError::Invalid("reconstructor has no layers".to_string()))?;
        if scaled.width() != expected {
            return Err(ModelError::ShapeMismatch {
                expected,
                actual: scaled.width(),
            });
        }

        let mut out = Vec::with_capacity(scaled.as_slice().len());
        let mut a = Vec::with_capacity(expected);
        let mut b = Vec::with_capacity(expected);
        for i in 0..scaled.rows() {
            self.forward_row(scaled.row(i), &mut a, &mut b);
            out.extend_from_slice(&a);
        }

        FeatureMatrix::from_row_major(scaled.columns().to_vec(), scaled.rows(), out).ok_or(
            ModelError::ShapeMismatch {
                expected,
                actual: scaled.width(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_layer(n: usize) -> DenseLayer {
        DenseLayer {
            weights: (0..n)
                .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
                .collect(),
            biases: vec![0.0; n],
        }
    }

    fn matrix(rows: &[[f64; 2]]) -> FeatureMatrix {
        let data = rows.iter().flatten().copied().collect();
        FeatureMatrix::from_row_major(vec!["a".into(), "b".into()], rows.len(), data)
            .expect("matrix")
    }

    #[test]
    fn test_identity_network_reproduces_input_through_relu() {
        let net = MlpAutoencoder {
            layers: vec![identity_layer(2), identity_layer(2)],
            activation: Activation::Relu,
        };
        net.validate().expect("valid");

        let out = net.reconstruct(&matrix(&[[1.0, -2.0]])).expect("reconstruct");
        // hidden relu clips the negative input, output layer is linear
        assert_eq!(out.row(0), &[1.0, 0.0]);
    }

    #[test]
    fn test_bottleneck_forward() {
        // 2 -> 1 -> 2
        let net = MlpAutoencoder {
            layers: vec![
                DenseLayer {
                    weights: vec![vec![0.5], vec![0.5]],
                    biases: vec![0.0],
                },
                DenseLayer {
                    weights: vec![vec![1.0, 2.0]],
                    biases: vec![0.1, 0.0],
                },
            ],
            activation: Activation::Identity,
        };
        net.validate().expect("valid");

        let out = net.reconstruct(&matrix(&[[2.0, 4.0]])).expect("reconstruct");
        assert!((out.row(0)[0] - 3.1).abs() < 1e-12);
        assert!((out.row(0)[1] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_width_mismatch_is_reported() {
        let net = MlpAutoencoder {
            layers: vec![identity_layer(3)],
            activation: Activation::Relu,
        };
        let err = net.reconstruct(&matrix(&[[1.0, 2.0]])).unwrap_err();
        assert!(matches!(
            err,
            ModelError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_validate_rejects_broken_chain() {
        let net = MlpAutoencoder {
            layers: vec![
                DenseLayer {
                    weights: vec![vec![1.0], vec![1.0]],
                    biases: vec![0.0],
                },
                identity_layer(2),
            ],
            activation: Activation::Relu,
        };
        assert!(net.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_width_change() {
        let net = MlpAutoencoder {
            layers: vec![DenseLayer {
                weights: vec![vec![1.0], vec![1.0]],
                biases: vec![0.0],
            }],
            activation: Activation::Relu,
        };
        assert!(net.validate().is_err());
    }

    #[test]
    fn test_activation_parses_lowercase() {
        let a: Activation = serde_json::from_str("\"logistic\"").expect("parse");
        assert_eq!(a, Activation::Logistic);
        assert!((Activation::Logistic.apply(0.0) - 0.5).abs() < 1e-12);
    }
}
