//! matsize-predict — size predictions with a deterministic fallback.
//!
//! A remote, model-backed predictor is tried first. Any failure (refused
//! connection, timeout, non-2xx, malformed body) is logged and answered
//! with a locally synthesized result instead, so callers always get a
//! prediction for valid input.
//!
//! # Architecture
//!
//! ```text
//! PredictionService
//!   ├── InputBounds::validate()  → ValidationError (caller's fault)
//!   ├── Predictor (RemotePredictor: hyper + rustls, timeout, retries)
//!   │   └── PredictError         → logged, never surfaced
//!   └── matsize_core::synthesize_fallback()
//! ```

use std::future::Future;

use matsize_core::{InputPair, ResultSummary};

pub mod error;
pub mod remote;
pub mod service;

pub use error::{PredictError, PredictResult};
pub use remote::RemotePredictor;
pub use service::{Prediction, PredictionService, PredictionSource};

/// A source of size predictions that may be unavailable.
pub trait Predictor: Send + Sync + 'static {
    /// URL (or other identifier) reported alongside results.
    fn endpoint(&self) -> &str;

    fn predict(
        &self,
        input: InputPair,
    ) -> impl Future<Output = PredictResult<ResultSummary>> + Send;
}
