//! matsize-api — HTTP API for size predictions.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/predict` | Predict a size distribution from `pct_min` / `cum_min` |
//! | GET | `/api/health` | Liveness plus model artifact presence |
//! | OPTIONS | both | CORS preflight |
//!
//! Any other verb on a known path answers 405 with the JSON error envelope.

pub mod handlers;

pub use handlers::PredictResponse;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;

use matsize_core::config::{CorsConfig, ModelsConfig};
use matsize_core::MatsizeConfig;
use matsize_predict::{PredictionService, Predictor, RemotePredictor};

/// Shared state for API handlers.
pub struct ApiState<P = RemotePredictor> {
    pub service: Arc<PredictionService<P>>,
    pub models: Arc<ModelsConfig>,
    pub environment: Arc<str>,
    pub cors: Arc<CorsHeaders>,
}

impl<P> Clone for ApiState<P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            models: self.models.clone(),
            environment: self.environment.clone(),
            cors: self.cors.clone(),
        }
    }
}

impl<P: Predictor> ApiState<P> {
    pub fn new(service: PredictionService<P>, config: &MatsizeConfig) -> Self {
        Self {
            service: Arc::new(service),
            models: Arc::new(config.models.clone()),
            environment: Arc::from(config.server.environment.as_str()),
            cors: Arc::new(CorsHeaders::from_config(&config.cors)),
        }
    }
}

/// Pre-rendered CORS header values.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    pub allow_origin: HeaderValue,
    pub allow_headers: HeaderValue,
}

impl CorsHeaders {
    /// Values that are not valid header text fall back to the permissive defaults.
    pub fn from_config(config: &CorsConfig) -> Self {
        let allow_origin =
            HeaderValue::from_str(&config.allowed_origin).unwrap_or(HeaderValue::from_static("*"));
        let allow_headers = HeaderValue::from_str(&config.allowed_headers.join(", "))
            .unwrap_or(HeaderValue::from_static("Content-Type"));
        Self {
            allow_origin,
            allow_headers,
        }
    }
}

/// Build the API router.
pub fn build_router<P: Predictor>(state: ApiState<P>) -> Router {
    Router::new()
        .route(
            "/api/predict",
            post(handlers::predict::<P>)
                .options(handlers::predict_preflight::<P>)
                .fallback(handlers::method_not_allowed::<P>),
        )
        .route(
            "/api/health",
            get(handlers::health::<P>)
                .options(handlers::health_preflight::<P>)
                .fallback(handlers::method_not_allowed::<P>),
        )
        .with_state(state)
}
