use crate::error::ApiError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pricecast_core::domain::HistoricalRecord;
use pricecast_core::model::{Metrics, ModelArtifact};
use pricecast_core::service::{PredictionResult, PredictionService};
use pricecast_core::time::parse_query_date;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub model_info: Arc<ModelInfo>,
}

impl AppState {
    pub fn new(service: PredictionService, model_info: ModelInfo) -> Self {
        Self {
            service,
            model_info: Arc::new(model_info),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub feature_names: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelSummary {
    #[serde(flatten)]
    info: ModelInfo,
    rmse: f64,
    mae: f64,
}

impl From<&ModelArtifact> for ModelInfo {
    fn from(artifact: &ModelArtifact) -> Self {
        Self {
            model_id: artifact.model_id,
            trained_at: artifact.trained_at,
            training_rows: artifact.training_rows,
            feature_names: artifact.feature_names.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    // The dashboard is served from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/predict", post(predict))
        .route("/history", get(history))
        .route("/model", get(model))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    date: Option<String>,
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::info!(error = %rejection, "malformed predict request");
        ApiError::BadRequest(rejection.body_text())
    })?;

    tracing::debug!(date = ?req.date, "received predict request");

    let result = state.service.predict(req.date.as_deref())?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    start: Option<String>,
    end: Option<String>,
}

async fn history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Vec<HistoricalRecord>>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::info!(error = %rejection, "malformed history query");
        ApiError::BadRequest(rejection.body_text())
    })?;
    let start = parse_bound(params.start.as_deref())?;
    let end = parse_bound(params.end.as_deref())?;

    let records = state.service.series().range(start, end).to_vec();
    Ok(Json(records))
}

fn parse_bound(value: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_query_date(s)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid date '{s}'"))),
    }
}

async fn model(State(state): State<AppState>) -> Json<ModelSummary> {
    let Metrics { rmse, mae } = state.service.metrics();
    Json(ModelSummary {
        info: state.model_info.as_ref().clone(),
        rmse,
        mae,
    })
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(%detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": format!("Prediction failed: {detail}") })),
    )
        .into_response()
}
