use thiserror::Error;

/// Why a feature vector could not be derived for a query date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    #[error("No historical data available before {0} to compute features.")]
    NoHistoricalData(String),

    #[error(
        "Insufficient historical data (minimum {required} days required) for rolling feature calculation."
    )]
    InsufficientHistory { required: usize, available: usize },
}

/// Request-level failures of the prediction service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    #[error("Date is required")]
    MissingInput,

    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    #[error("No historical data available before {0} to compute features.")]
    NoHistoricalData(String),

    #[error(
        "Insufficient historical data (minimum {required} days required) for rolling feature calculation."
    )]
    InsufficientHistory { required: usize, available: usize },

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}

impl PredictionError {
    /// True for failures caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PredictionError::PredictionFailed(_))
    }
}

impl From<FeatureError> for PredictionError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::InvalidDate(s) => PredictionError::InvalidDate(s),
            FeatureError::NoHistoricalData(s) => PredictionError::NoHistoricalData(s),
            FeatureError::InsufficientHistory {
                required,
                available,
            } => PredictionError::InsufficientHistory {
                required,
                available,
            },
        }
    }
}
