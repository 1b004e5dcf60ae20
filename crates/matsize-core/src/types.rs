//! Shared types used across matsize crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of slots in every synthesized size sequence.
pub const SEQUENCE_LEN: usize = 24;

/// The three priority symbols a sequence may contain, lowest first.
pub const PRIORITY_SYMBOLS: [u8; 3] = [3, 4, 5];

/// The two process measurements a prediction is made from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputPair {
    /// Percentage passing the 0.25 mm / 60 mesh screen.
    pub pct_min: f64,
    /// Cumulative percentage at 3.15 mm.
    pub cum_min: f64,
}

impl InputPair {
    pub fn new(pct_min: f64, cum_min: f64) -> Self {
        Self { pct_min, cum_min }
    }
}

/// Output of the scalar reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquivalentSize {
    pub mean_size: f64,
    pub equivalent_product_size: f64,
}

/// Why a sequence was rejected when built from untrusted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("expected 24 sizes, got {0}")]
    Length(usize),

    #[error("size {value} at position {index} is not a priority symbol (3, 4 or 5)")]
    Symbol { index: usize, value: u8 },
}

/// Exactly [`SEQUENCE_LEN`] priority symbols.
///
/// Serializes as a plain JSON array. Deserialization rejects any other
/// length and any value outside {3, 4, 5}, so a remote result that passes
/// through this type upholds the same invariants as a synthesized one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct PrioritySequence([u8; SEQUENCE_LEN]);

impl PrioritySequence {
    pub(crate) fn from_array(sizes: [u8; SEQUENCE_LEN]) -> Self {
        Self(sizes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn sum(&self) -> u32 {
        self.0.iter().map(|&s| u32::from(s)).sum()
    }

    /// Per-symbol counts, recomputed on every call.
    pub fn distribution(&self) -> PriorityDistribution {
        let count = |symbol: u8| self.0.iter().filter(|&&s| s == symbol).count();
        PriorityDistribution {
            priority_3: count(3),
            priority_4: count(4),
            priority_5: count(5),
        }
    }
}

impl TryFrom<Vec<u8>> for PrioritySequence {
    type Error = SequenceError;

    fn try_from(sizes: Vec<u8>) -> Result<Self, Self::Error> {
        if let Some((index, &value)) = sizes
            .iter()
            .enumerate()
            .find(|&(_, s)| !PRIORITY_SYMBOLS.contains(s))
        {
            return Err(SequenceError::Symbol { index, value });
        }
        let len = sizes.len();
        let array: [u8; SEQUENCE_LEN] = sizes
            .try_into()
            .map_err(|_| SequenceError::Length(len))?;
        Ok(Self(array))
    }
}

impl From<PrioritySequence> for Vec<u8> {
    fn from(seq: PrioritySequence) -> Self {
        seq.0.to_vec()
    }
}

/// How many times each priority symbol occurs in a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityDistribution {
    #[serde(rename = "Priority 3")]
    pub priority_3: usize,
    #[serde(rename = "Priority 4")]
    pub priority_4: usize,
    #[serde(rename = "Priority 5")]
    pub priority_5: usize,
}

impl PriorityDistribution {
    pub fn total(&self) -> usize {
        self.priority_3 + self.priority_4 + self.priority_5
    }
}

/// A complete size prediction, either synthesized locally or returned by
/// the remote predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub mean_size: f64,
    pub equivalent_product_size: f64,
    pub sizes: PrioritySequence,
    pub final_equivalent_size: f64,
    pub priority_distribution: PriorityDistribution,
}

/// Round to four decimal places, halves away from zero.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
