pub mod artifact;
pub mod linear;

use crate::domain::FeatureVector;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

pub use artifact::ModelArtifact;
pub use linear::LinearModel;

/// A fitted regression model mapping a feature vector to a closing price.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> anyhow::Result<f64>;
}

/// Hold-out accuracy recorded at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub rmse: f64,
    pub mae: f64,
}

impl Metrics {
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> anyhow::Result<Self> {
        ensure!(!actual.is_empty(), "cannot evaluate on an empty set");
        ensure!(
            actual.len() == predicted.len(),
            "length mismatch: {} actual vs {} predicted",
            actual.len(),
            predicted.len()
        );

        let n = actual.len() as f64;
        let (sq, abs) = actual
            .iter()
            .zip(predicted)
            .fold((0.0, 0.0), |(sq, abs), (a, p)| {
                let err = a - p;
                (sq + err * err, abs + err.abs())
            });

        Ok(Self {
            rmse: (sq / n).sqrt(),
            mae: abs / n,
        })
    }
}
