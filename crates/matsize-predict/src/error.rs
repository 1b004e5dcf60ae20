//! Prediction error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while talking to the remote predictor.
///
/// None of these reach API callers: the prediction service answers every
/// remote failure with a locally synthesized result.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid remote url: {0}")]
    InvalidUrl(String),

    #[error("tls setup failed: {0}")]
    TlsConfig(String),

    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http request could not be built: {0}")]
    Request(#[from] http::Error),

    #[error("http exchange failed: {0}")]
    Http(#[from] hyper::Error),

    #[error("remote predictor returned status {0}")]
    Status(u16),

    #[error("malformed remote response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("remote predictor timed out after {0:?}")]
    Timeout(Duration),
}

impl PredictError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PredictError::Connect { .. } | PredictError::Http(_) => true,
            PredictError::Status(code) => *code >= 500,
            _ => false,
        }
    }
}

pub type PredictResult<T> = Result<T, PredictError>;
