use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pricecast_core::error::PredictionError;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    /// 400: the request cannot be answered as posed.
    BadRequest(String),
    /// 500: message is returned as-is.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        if err.is_client_error() {
            tracing::info!(error = %err, "prediction request rejected");
            return ApiError::BadRequest(err.to_string());
        }

        let err = anyhow::Error::new(err);
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "prediction failed");
        ApiError::Internal(err.to_string())
    }
}
