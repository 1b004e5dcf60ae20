//! Process bounds for the two input measurements.
//!
//! The synthesis core trusts its inputs; everything that accepts
//! measurements from outside runs them through [`InputBounds::validate`]
//! first.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::InputPair;

/// Display name of `pct_min` in operator-facing messages.
pub const PCT_MIN_LABEL: &str = "PCT_MIN_0.25MM_60MSH";
/// Display name of `cum_min` in operator-facing messages.
pub const CUM_MIN_LABEL: &str = "CUM_MIN_3.15MM";

/// Reasons a measurement pair is refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required parameters: pct_min and cum_min")]
    Missing,

    #[error("{name} must be a finite number")]
    NotFinite { name: &'static str },

    #[error("{name} must be between {min} and {max}")]
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
}

/// Inclusive range for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRange {
    pub min: f64,
    pub max: f64,
}

impl MeasurementRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn check(&self, name: &'static str, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { name });
        }
        if value < self.min || value > self.max {
            return Err(ValidationError::OutOfRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }
}

/// Accepted ranges for both measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputBounds {
    pub pct_min: MeasurementRange,
    pub cum_min: MeasurementRange,
}

impl Default for InputBounds {
    fn default() -> Self {
        Self {
            pct_min: MeasurementRange::new(20.0, 50.0),
            cum_min: MeasurementRange::new(80.0, 90.0),
        }
    }
}

impl InputBounds {
    /// Check a possibly incomplete pair. `pct_min` is checked before `cum_min`.
    pub fn validate(
        &self,
        pct_min: Option<f64>,
        cum_min: Option<f64>,
    ) -> Result<InputPair, ValidationError> {
        let (Some(pct_min), Some(cum_min)) = (pct_min, cum_min) else {
            return Err(ValidationError::Missing);
        };
        Ok(InputPair {
            pct_min: self.pct_min.check(PCT_MIN_LABEL, pct_min)?,
            cum_min: self.cum_min.check(CUM_MIN_LABEL, cum_min)?,
        })
    }
}
