use crate::dataset::HistoricalSeries;
use crate::error::PredictionError;
use crate::features;
use crate::model::{Metrics, ModelArtifact, Regressor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub predicted_price: f64,
    pub selected_date: String,
    pub rmse: f64,
    pub mae: f64,
}

/// Answers "what close does the model expect for this date?" against a
/// series and model loaded once at startup. Cheap to clone; holds no
/// per-request state.
#[derive(Clone)]
pub struct PredictionService {
    series: Arc<HistoricalSeries>,
    model: Arc<dyn Regressor>,
    metrics: Metrics,
}

impl PredictionService {
    pub fn new(series: Arc<HistoricalSeries>, model: Arc<dyn Regressor>, metrics: Metrics) -> Self {
        Self {
            series,
            model,
            metrics,
        }
    }

    pub fn from_artifact(series: Arc<HistoricalSeries>, artifact: ModelArtifact) -> Self {
        Self::new(series, Arc::new(artifact.model), artifact.metrics)
    }

    pub fn series(&self) -> &HistoricalSeries {
        &self.series
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn predict(&self, query_date: Option<&str>) -> Result<PredictionResult, PredictionError> {
        let query_date = query_date
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(PredictionError::MissingInput)?;

        let derived = features::derive(query_date, &self.series)?;

        let raw = self
            .model
            .predict(&derived.features)
            .map_err(|e| PredictionError::PredictionFailed(format!("{e:#}")))?;
        if !raw.is_finite() {
            return Err(PredictionError::PredictionFailed(format!(
                "model returned a non-finite value ({raw})"
            )));
        }

        tracing::debug!(
            query_date,
            selected_date = %derived.selected_date,
            prediction = raw,
            "prediction computed"
        );

        Ok(PredictionResult {
            predicted_price: round_to_cents(raw),
            selected_date: derived.selected_date,
            rmse: self.metrics.rmse,
            mae: self.metrics.mae,
        })
    }
}

impl fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionService")
            .field("records", &self.series.len())
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
