//! Remote-first prediction with deterministic fallback.

use serde::Serialize;
use tracing::{debug, info, warn};

use matsize_core::{InputBounds, InputPair, MatsizeConfig, ResultSummary, ValidationError};

use crate::error::PredictResult;
use crate::remote::RemotePredictor;
use crate::Predictor;

/// Where a prediction came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PredictionSource {
    /// Answered by the model-backed remote predictor.
    RemoteApi { api_url: String },
    /// Synthesized locally; `remote_api_url` names the predictor that was
    /// skipped or failed, if one is configured.
    MockFallback { remote_api_url: Option<String> },
}

/// A validated prediction ready to hand back to a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub result: ResultSummary,
    pub source: PredictionSource,
}

impl Prediction {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, PredictionSource::MockFallback { .. })
    }
}

/// Validates measurements, asks the remote predictor, and synthesizes a
/// result locally whenever the remote is disabled or fails.
pub struct PredictionService<P = RemotePredictor> {
    remote: Option<P>,
    bounds: InputBounds,
}

impl PredictionService<RemotePredictor> {
    /// Build from config. The remote predictor is only constructed when
    /// `prediction.remote_enabled` is set.
    pub fn from_config(config: &MatsizeConfig) -> PredictResult<Self> {
        let remote = if config.prediction.remote_enabled {
            let remote = RemotePredictor::from_config(&config.remote)?;
            info!(
                endpoint = remote.endpoint(),
                timeout = ?remote.timeout(),
                retries = config.remote.retries,
                "remote predictor configured"
            );
            Some(remote)
        } else {
            info!("remote predictor disabled, serving fallback predictions only");
            None
        };
        Ok(Self::new(remote, config.prediction.bounds))
    }

    /// A service that never leaves the process.
    pub fn fallback_only(bounds: InputBounds) -> Self {
        Self::new(None, bounds)
    }
}

impl<P: Predictor> PredictionService<P> {
    pub fn new(remote: Option<P>, bounds: InputBounds) -> Self {
        Self { remote, bounds }
    }

    pub fn remote_endpoint(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.endpoint())
    }

    /// Validate a possibly incomplete measurement pair, then predict.
    pub async fn predict(
        &self,
        pct_min: Option<f64>,
        cum_min: Option<f64>,
    ) -> Result<Prediction, ValidationError> {
        let input = self.bounds.validate(pct_min, cum_min)?;
        Ok(self.predict_validated(input).await)
    }

    /// Predict for a pair that already passed validation. Never fails.
    pub async fn predict_validated(&self, input: InputPair) -> Prediction {
        if let Some(remote) = &self.remote {
            match remote.predict(input).await {
                Ok(result) => {
                    debug!(endpoint = remote.endpoint(), "remote prediction succeeded");
                    return Prediction {
                        result,
                        source: PredictionSource::RemoteApi {
                            api_url: remote.endpoint().to_string(),
                        },
                    };
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        endpoint = remote.endpoint(),
                        "remote predictor unavailable, falling back to synthesized prediction"
                    );
                }
            }
        }

        let result = matsize_core::synthesize_fallback(input.pct_min, input.cum_min);
        debug!(
            pct_min = input.pct_min,
            cum_min = input.cum_min,
            final_equivalent_size = result.final_equivalent_size,
            "synthesized fallback prediction"
        );
        Prediction {
            result,
            source: PredictionSource::MockFallback {
                remote_api_url: self.remote_endpoint().map(str::to_string),
            },
        }
    }
}
