//! API handlers.
//!
//! Every JSON response carries `Access-Control-Allow-Origin`; preflight
//! responses also advertise the route's methods and allowed headers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use matsize_core::ResultSummary;
use matsize_predict::{Prediction, PredictionSource, Predictor};

use crate::ApiState;

const FALLBACK_NOTE: &str =
    "Using mock prediction logic as fallback. Remote prediction API may be unavailable.";

/// Response envelope for a successful prediction.
#[derive(Serialize)]
pub struct PredictResponse<'a> {
    success: bool,
    result: &'a ResultSummary,
    #[serde(flatten)]
    source: &'a PredictionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
}

impl<'a> PredictResponse<'a> {
    pub fn new(prediction: &'a Prediction) -> Self {
        Self {
            success: true,
            result: &prediction.result,
            source: &prediction.source,
            note: prediction.is_fallback().then_some(FALLBACK_NOTE),
        }
    }
}

/// Error envelope shared by every route.
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'static str,
    models_loaded: bool,
    timestamp: String,
    environment: &'a str,
}

/// Predict request body. Measurements may arrive as numbers or numeric strings.
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub pct_min: Option<Measurement>,
    #[serde(default)]
    pub cum_min: Option<Measurement>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    Number(f64),
    Text(String),
}

impl Measurement {
    /// Unparseable text becomes NaN so validation reports it as non-finite.
    pub fn value(&self) -> f64 {
        match self {
            Measurement::Number(v) => *v,
            Measurement::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }
}

fn json_response<T: Serialize>(
    status: StatusCode,
    allow_origin: &HeaderValue,
    body: &T,
) -> Response {
    (
        status,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin.clone())],
        Json(body),
    )
        .into_response()
}

fn error_response(
    msg: impl Into<String>,
    status: StatusCode,
    allow_origin: &HeaderValue,
) -> Response {
    json_response(
        status,
        allow_origin,
        &ErrorResponse {
            success: false,
            error: msg.into(),
        },
    )
}

fn preflight<P>(state: &ApiState<P>, methods: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, state.cors.allow_origin.clone()),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(methods),
            ),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, state.cors.allow_headers.clone()),
        ],
    )
        .into_response()
}

// ── Predict ────────────────────────────────────────────────────

/// POST /api/predict
pub async fn predict<P: Predictor>(State(state): State<ApiState<P>>, body: Bytes) -> Response {
    let origin = &state.cors.allow_origin;

    let req: PredictRequest = if body.iter().all(u8::is_ascii_whitespace) {
        PredictRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(req) => req,
            Err(e) => {
                debug!(error = %e, "rejecting malformed predict body");
                return error_response(
                    format!("Invalid JSON body: {e}"),
                    StatusCode::BAD_REQUEST,
                    origin,
                );
            }
        }
    };

    let pct_min = req.pct_min.as_ref().map(Measurement::value);
    let cum_min = req.cum_min.as_ref().map(Measurement::value);

    match state.service.predict(pct_min, cum_min).await {
        Ok(prediction) => json_response(StatusCode::OK, origin, &PredictResponse::new(&prediction)),
        Err(e) => {
            debug!(error = %e, ?pct_min, ?cum_min, "rejecting predict input");
            error_response(e.to_string(), StatusCode::BAD_REQUEST, origin)
        }
    }
}

/// OPTIONS /api/predict
pub async fn predict_preflight<P: Predictor>(State(state): State<ApiState<P>>) -> Response {
    preflight(&state, "POST, OPTIONS")
}

// ── Health ─────────────────────────────────────────────────────

/// GET /api/health
pub async fn health<P: Predictor>(State(state): State<ApiState<P>>) -> Response {
    let models_loaded = state.models.all_present();
    if !models_loaded {
        debug!(artifacts = ?state.models.artifacts, "model artifacts missing");
    }

    json_response(
        StatusCode::OK,
        &state.cors.allow_origin,
        &HealthResponse {
            status: "healthy",
            models_loaded,
            timestamp: chrono::Utc::now().to_rfc3339(),
            environment: &state.environment,
        },
    )
}

/// OPTIONS /api/health
pub async fn health_preflight<P: Predictor>(State(state): State<ApiState<P>>) -> Response {
    preflight(&state, "GET, OPTIONS")
}

// ── Fallback ───────────────────────────────────────────────────

/// Any verb a route does not serve.
pub async fn method_not_allowed<P: Predictor>(State(state): State<ApiState<P>>) -> Response {
    warn!("method not allowed");
    error_response(
        "Method not allowed",
        StatusCode::METHOD_NOT_ALLOWED,
        &state.cors.allow_origin,
    )
}
