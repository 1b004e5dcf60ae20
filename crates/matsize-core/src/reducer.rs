//! Scalar reducer: two process measurements to one equivalent size.

use crate::types::EquivalentSize;

/// Blend weight of the fine-fraction measurement.
pub const PCT_WEIGHT: f64 = 0.3;
/// Blend weight of the coarse cumulative measurement.
pub const CUM_WEIGHT: f64 = 0.7;
/// Measurements arrive as percentages.
pub const PERCENT_SCALE: f64 = 100.0;
/// Mean size to equivalent product size.
pub const PRODUCT_FACTOR: f64 = 3.0;

/// Blend `pct_min` and `cum_min` into a mean size and equivalent product size.
///
/// Pure arithmetic with no bounds checking; callers that need the process
/// bounds enforced validate before calling.
pub fn reduce(pct_min: f64, cum_min: f64) -> EquivalentSize {
    let mean_size = (pct_min * PCT_WEIGHT + cum_min * CUM_WEIGHT) / PERCENT_SCALE;
    EquivalentSize {
        mean_size,
        equivalent_product_size: mean_size * PRODUCT_FACTOR,
    }
}
