//! Ridge-regularized least squares over standardized features.

use crate::domain::{FeatureVector, FEATURE_COUNT};
use crate::features::stats::{mean, population_std};
use crate::model::Regressor;
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

const N: usize = FEATURE_COUNT;
const PIVOT_EPSILON: f64 = 1e-12;

pub const DEFAULT_RIDGE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    intercept: f64,
    /// Weights on standardized inputs, in `FEATURE_NAMES` order.
    coefficients: [f64; N],
    feature_means: [f64; N],
    feature_scales: [f64; N],
    ridge: f64,
}

impl LinearModel {
    pub fn fit(features: &[FeatureVector], targets: &[f64], ridge: f64) -> Result<Self> {
        ensure!(!features.is_empty(), "cannot fit on an empty training set");
        ensure!(
            features.len() == targets.len(),
            "length mismatch: {} feature rows vs {} targets",
            features.len(),
            targets.len()
        );
        ensure!(
            ridge.is_finite() && ridge >= 0.0,
            "ridge must be finite and non-negative (got {ridge})"
        );

        let rows: Vec<[f64; N]> = features.iter().map(FeatureVector::to_array).collect();
        ensure!(
            rows.iter().flatten().all(|v| v.is_finite()) && targets.iter().all(|v| v.is_finite()),
            "training data contains non-finite values"
        );

        let mut feature_means = [0.0; N];
        let mut feature_scales = [1.0; N];
        for j in 0..N {
            let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
            feature_means[j] = mean(&column);
            let std = population_std(&column);
            // Constant columns stay at zero after centering.
            if std > 0.0 {
                feature_scales[j] = std;
            }
        }

        let target_mean = mean(targets);

        // Normal equations: (ZᵀZ + λI) β = Zᵀ(y - ȳ).
        let mut gram = [[0.0; N]; N];
        let mut rhs = [0.0; N];
        for (row, &y) in rows.iter().zip(targets) {
            let z = standardize(row, &feature_means, &feature_scales);
            let centered = y - target_mean;
            for i in 0..N {
                rhs[i] += z[i] * centered;
                for k in 0..N {
                    gram[i][k] += z[i] * z[k];
                }
            }
        }
        for (i, row) in gram.iter_mut().enumerate() {
            row[i] += ridge;
        }

        let coefficients = solve(gram, rhs).context("normal equations are singular")?;

        Ok(Self {
            intercept: target_mean,
            coefficients,
            feature_means,
            feature_scales,
            ridge,
        })
    }

    fn predict_raw(&self, features: &FeatureVector) -> f64 {
        let z = standardize(&features.to_array(), &self.feature_means, &self.feature_scales);
        self.intercept
            + z.iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }
}

impl Regressor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        ensure!(features.is_finite(), "feature vector contains non-finite values");
        let y = self.predict_raw(features);
        if !y.is_finite() {
            bail!("model produced a non-finite prediction ({y})");
        }
        Ok(y)
    }
}

fn standardize(row: &[f64; N], means: &[f64; N], scales: &[f64; N]) -> [f64; N] {
    let mut z = [0.0; N];
    for j in 0..N {
        z[j] = (row[j] - means[j]) / scales[j];
    }
    z
}

/// Gaussian elimination with partial pivoting. `None` if singular.
fn solve(mut a: [[f64; N]; N], mut b: [f64; N]) -> Option<[f64; N]> {
    for col in 0..N {
        let pivot = (col..N).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
        if a[pivot][col].abs() < PIVOT_EPSILON {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..N {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..N {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; N];
    for row in (0..N).rev() {
        let tail: f64 = (row + 1..N).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(n: usize) -> (Vec<FeatureVector>, Vec<f64>) {
        let features: Vec<FeatureVector> = (0..n)
            .map(|i| {
                let mut v = [0.0; N];
                for (j, slot) in v.iter_mut().enumerate() {
                    let t = i as f64 * (0.31 + 0.17 * j as f64) + j as f64;
                    *slot = t.sin() * (10.0 * (j + 1) as f64) + 100.0 * j as f64;
                }
                FeatureVector::from_array(v)
            })
            .collect();
        let targets = features
            .iter()
            .map(|f| 5.0 + 2.0 * f.open - 0.5 * f.ma7 + 3.0 * f.volatility)
            .collect();
        (features, targets)
    }

    #[test]
    fn recovers_exact_linear_relationship() {
        let (features, targets) = synthetic(300);
        let model = LinearModel::fit(&features, &targets, 0.0).unwrap();

        for (f, y) in features.iter().zip(&targets).take(20) {
            let p = model.predict(f).unwrap();
            assert!((p - y).abs() < 1e-6, "predicted {p}, expected {y}");
        }
    }

    #[test]
    fn ridge_handles_constant_columns() {
        let (mut features, targets) = synthetic(100);
        for f in &mut features {
            f.market_cap = 42.0;
        }
        let model = LinearModel::fit(&features, &targets, DEFAULT_RIDGE).unwrap();
        assert_eq!(model.coefficients[4], 0.0);
        assert!(model.predict(&features[0]).unwrap().is_finite());
    }

    #[test]
    fn rejects_bad_training_input() {
        let (features, targets) = synthetic(10);
        assert!(LinearModel::fit(&[], &[], 1.0).is_err());
        assert!(LinearModel::fit(&features, &targets[..5], 1.0).is_err());
        assert!(LinearModel::fit(&features, &targets, -1.0).is_err());

        let mut bad = targets.clone();
        bad[3] = f64::NAN;
        assert!(LinearModel::fit(&features, &bad, 1.0).is_err());
    }

    #[test]
    fn unregularized_constant_column_is_singular() {
        let (mut features, targets) = synthetic(50);
        for f in &mut features {
            f.volume = 7.0;
        }
        assert!(LinearModel::fit(&features, &targets, 0.0).is_err());
    }

    #[test]
    fn rejects_non_finite_input_at_predict_time() {
        let (features, targets) = synthetic(50);
        let model = LinearModel::fit(&features, &targets, 1.0).unwrap();
        let mut f = features[0];
        f.ma30 = f64::INFINITY;
        assert!(model.predict(&f).is_err());
    }
}
