//! Deterministic size-sequence synthesis.
//!
//! Expands an equivalent product size into [`SEQUENCE_LEN`] priority
//! symbols whose mean tracks the equivalent size. Runs in four stages over
//! one owned buffer:
//!
//! ```text
//! fill      9×3 | 8×4 | 7×5          (fixed proportions)
//! adjust    promote 3→4, 4→5  or  demote 5→4, 4→3, block by block
//! shuffle   i = 23..1: swap(i, (seed + i) mod (i + 1))
//! summary   sum, mean, per-symbol counts
//! ```
//!
//! The output is a pure function of the equivalent size: the shuffle seed
//! is derived from it, so equal inputs always produce equal sequences.

use std::ops::Range;

use crate::reducer::reduce;
use crate::types::{round4, EquivalentSize, PrioritySequence, ResultSummary, SEQUENCE_LEN};

/// Share of the sequence initially filled with 3s.
pub const SHARE_THREE: f64 = 0.4;
/// Share of the sequence initially filled with 4s.
pub const SHARE_FOUR: f64 = 0.35;

pub const THREES: usize = (SEQUENCE_LEN as f64 * SHARE_THREE) as usize;
pub const FOURS: usize = (SEQUENCE_LEN as f64 * SHARE_FOUR) as usize;
pub const FIVES: usize = SEQUENCE_LEN - THREES - FOURS;

/// Sum of the unadjusted fill.
pub const BASE_SUM: u32 = (THREES * 3 + FOURS * 4 + FIVES * 5) as u32;

/// Adjustments at or below this magnitude leave the fill untouched.
pub const ADJUSTMENT_TOLERANCE: f64 = 0.1;

/// Equivalent size to shuffle seed.
pub const SEED_SCALE: f64 = 1000.0;

const THREE_BLOCK: Range<usize> = 0..THREES;
const FOUR_BLOCK: Range<usize> = THREES..THREES + FOURS;
const FIVE_BLOCK: Range<usize> = THREES + FOURS..SEQUENCE_LEN;

/// Reduce both measurements and synthesize a result from them.
///
/// Total over finite inputs; performs no bounds checking.
pub fn synthesize_fallback(pct_min: f64, cum_min: f64) -> ResultSummary {
    synthesize(reduce(pct_min, cum_min))
}

/// Synthesize a result summary for an already-reduced equivalent size.
pub fn synthesize(equivalent: EquivalentSize) -> ResultSummary {
    let eps = equivalent.equivalent_product_size;
    let target_sum = eps * SEQUENCE_LEN as f64;

    let mut sizes = initial_fill();
    adjust(&mut sizes, target_sum - f64::from(BASE_SUM));
    shuffle(&mut sizes, seed_for(eps));

    let sizes = PrioritySequence::from_array(sizes);
    ResultSummary {
        mean_size: round4(equivalent.mean_size),
        equivalent_product_size: round4(eps),
        final_equivalent_size: round4(f64::from(sizes.sum()) / SEQUENCE_LEN as f64),
        priority_distribution: sizes.distribution(),
        sizes,
    }
}

/// The pre-adjustment layout: all 3s, then all 4s, then all 5s.
pub fn initial_fill() -> [u8; SEQUENCE_LEN] {
    let mut sizes = [0u8; SEQUENCE_LEN];
    sizes[THREE_BLOCK].fill(3);
    sizes[FOUR_BLOCK].fill(4);
    sizes[FIVE_BLOCK].fill(5);
    sizes
}

/// Nudge the fill towards `base_sum + adjustment` in place.
///
/// Raising promotes the 3 block first, then the 4 block. Before each slot
/// the walk re-checks its position against `floor(remaining)`, and since
/// `remaining` drops by one per promotion a walk stops after roughly half
/// of what it was asked for. Raises never overshoot. Lowering demotes
/// the 5 block first, then the 4 block, one slot per whole or partial unit,
/// so lowers may overshoot by less than one. Whatever a block cannot absorb
/// is left unmet.
pub fn adjust(sizes: &mut [u8; SEQUENCE_LEN], adjustment: f64) {
    if adjustment.abs() <= ADJUSTMENT_TOLERANCE {
        return;
    }

    if adjustment > 0.0 {
        let remaining = promote(&mut sizes[THREE_BLOCK], adjustment, 4);
        if remaining > 0.0 {
            promote(&mut sizes[FOUR_BLOCK], remaining, 5);
        }
    } else {
        let remaining = demote(&mut sizes[FIVE_BLOCK], adjustment.abs(), 4);
        if remaining > 0.0 {
            demote(&mut sizes[FOUR_BLOCK], remaining, 3);
        }
    }
}

fn promote(block: &mut [u8], mut remaining: f64, to: u8) -> f64 {
    let len = block.len();
    for (k, slot) in block.iter_mut().enumerate() {
        // The cap shrinks with `remaining`; float-to-int casts saturate.
        if k >= (remaining.floor() as usize).min(len) {
            break;
        }
        *slot = to;
        remaining -= 1.0;
        if remaining <= 0.0 {
            break;
        }
    }
    remaining
}

fn demote(block: &mut [u8], mut remaining: f64, to: u8) -> f64 {
    for slot in block.iter_mut() {
        if remaining <= 0.0 {
            break;
        }
        *slot = to;
        remaining -= 1.0;
    }
    remaining
}

/// Shuffle seed for an equivalent size: `floor(eps * 1000)`.
///
/// Saturates at the `i64` range; NaN maps to 0.
pub fn seed_for(equivalent_product_size: f64) -> i64 {
    (equivalent_product_size * SEED_SCALE).floor() as i64
}

/// Fisher–Yates walk with a fixed index generator.
///
/// `j = (seed + i) mod (i + 1)` with Euclidean modulo, so `j` stays in
/// `0..=i` for negative seeds too. Widened to `i128` so no seed overflows.
pub fn shuffle(sizes: &mut [u8; SEQUENCE_LEN], seed: i64) {
    for i in (1..SEQUENCE_LEN).rev() {
        let j = (i128::from(seed) + i as i128).rem_euclid(i as i128 + 1) as usize;
        sizes.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(sizes: &[u8]) -> Vec<u8> {
        let mut v = sizes.to_vec();
        v.sort_unstable();
        v
    }

    fn adjusted(adjustment: f64) -> [u8; SEQUENCE_LEN] {
        let mut sizes = initial_fill();
        adjust(&mut sizes, adjustment);
        sizes
    }

    fn equivalent(eps: f64) -> EquivalentSize {
        EquivalentSize {
            mean_size: eps / 3.0,
            equivalent_product_size: eps,
        }
    }

    #[test]
    fn fixed_proportions() {
        assert_eq!((THREES, FOURS, FIVES), (9, 8, 7));
        assert_eq!(BASE_SUM, 94);
    }

    #[test]
    fn initial_fill_is_blocked() {
        let sizes = initial_fill();
        assert!(sizes[..9].iter().all(|&s| s == 3));
        assert!(sizes[9..17].iter().all(|&s| s == 4));
        assert!(sizes[17..].iter().all(|&s| s == 5));
    }

    #[test]
    fn adjust_within_tolerance_is_noop() {
        assert_eq!(adjusted(0.1), initial_fill());
        assert_eq!(adjusted(-0.05), initial_fill());
    }

    #[test]
    fn adjust_raise_promotes_threes_first() {
        // +2: one promotion drops the cap to floor(1) = 1, so the walk stops.
        let sizes = adjusted(2.0);
        assert_eq!(sizes[0], 4);
        assert!(sizes[1..9].iter().all(|&s| s == 3));
        assert_eq!(sizes[9], 5);
        assert!(sizes[10..17].iter().all(|&s| s == 4));
        assert_eq!(sizes.iter().map(|&s| u32::from(s)).sum::<u32>(), 96);
    }

    #[test]
    fn adjust_raise_cap_shrinks_each_step() {
        let sizes = adjusted(3.0);
        assert_eq!(
            sizes,
            [4u8, 4, 3, 3, 3, 3, 3, 3, 3, 5, 4, 4, 4, 4, 4, 4, 4, 5, 5, 5, 5, 5, 5, 5]
        );
        assert_eq!(sizes.iter().map(|&s| u32::from(s)).sum::<u32>(), 97);
    }

    #[test]
    fn adjust_raise_spills_into_four_block() {
        let sizes = adjusted(12.0);
        assert!(sizes[..6].iter().all(|&s| s == 4));
        assert!(sizes[6..9].iter().all(|&s| s == 3));
        assert_eq!(&sizes[9..12], &[5, 5, 5]);
        assert!(sizes[12..17].iter().all(|&s| s == 4));
        assert_eq!(sizes.iter().map(|&s| u32::from(s)).sum::<u32>(), 103);
    }

    #[test]
    fn adjust_raise_fraction_below_one_changes_nothing() {
        // floor(0.5) caps the walk at zero slots.
        assert_eq!(adjusted(0.5), initial_fill());
    }

    #[test]
    fn adjust_raise_undershoots_fractional_target() {
        // 5.7 promotes three slots, then 1.7 leaves room for one more.
        let sizes = adjusted(5.7);
        assert_eq!(sizes.iter().map(|&s| u32::from(s)).sum::<u32>(), 98);
        assert!(sizes[..3].iter().all(|&s| s == 4));
        assert!(sizes[3..9].iter().all(|&s| s == 3));
        assert_eq!(sizes[9], 5);
    }

    #[test]
    fn adjust_lower_demotes_fives_first() {
        let sizes = adjusted(-2.0);
        assert_eq!(&sizes[17..19], &[4, 4]);
        assert!(sizes[19..].iter().all(|&s| s == 5));
        assert!(sizes[9..17].iter().all(|&s| s == 4));
    }

    #[test]
    fn adjust_lower_overshoots_fractional_target() {
        // A partial unit still demotes a whole slot.
        let sizes = adjusted(-0.5);
        assert_eq!(sizes[17], 4);
        assert_eq!(sizes.iter().map(|&s| u32::from(s)).sum::<u32>(), 93);
    }

    #[test]
    fn adjust_lower_spills_into_four_block() {
        let sizes = adjusted(-10.0);
        assert!(sizes[17..].iter().all(|&s| s == 4));
        assert_eq!(&sizes[9..12], &[3, 3, 3]);
        assert!(sizes[12..17].iter().all(|&s| s == 4));
        assert_eq!(sizes.iter().map(|&s| u32::from(s)).sum::<u32>(), 84);
    }

    #[test]
    fn adjust_saturates_both_ways() {
        let low = adjusted(-1_000.0);
        assert_eq!(low.iter().map(|&s| u32::from(s)).sum::<u32>(), 79);
        assert_eq!(sorted(&low), [vec![3; 17], vec![4; 7]].concat());

        let high = adjusted(1_000.0);
        assert_eq!(high.iter().map(|&s| u32::from(s)).sum::<u32>(), 111);
        assert_eq!(sorted(&high), [vec![4; 9], vec![5; 15]].concat());

        let huge = adjusted(f64::MAX);
        assert_eq!(huge, high);
    }

    #[test]
    fn seed_floors_towards_negative_infinity() {
        assert_eq!(seed_for(2.5), 2500);
        assert_eq!(seed_for(-0.0015), -2);
        assert_eq!(seed_for(f64::NAN), 0);
        assert_eq!(seed_for(f64::INFINITY), i64::MAX);
    }

    #[test]
    fn shuffle_seed_zero_known_permutation() {
        let mut sizes: [u8; SEQUENCE_LEN] = std::array::from_fn(|i| i as u8);
        shuffle(&mut sizes, 0);
        // j = i mod (i + 1) = i: every swap is a no-op.
        let identity: [u8; SEQUENCE_LEN] = std::array::from_fn(|i| i as u8);
        assert_eq!(sizes, identity);
    }

    #[test]
    fn shuffle_seed_one_rotates_left() {
        // j = (1 + i) mod (i + 1) = 0 for every i.
        let mut sizes: [u8; SEQUENCE_LEN] = std::array::from_fn(|i| i as u8);
        shuffle(&mut sizes, 1);
        let expected: [u8; SEQUENCE_LEN] = std::array::from_fn(|i| ((i + 1) % SEQUENCE_LEN) as u8);
        assert_eq!(sizes, expected);
    }

    #[test]
    fn shuffle_negative_and_extreme_seeds_stay_in_range() {
        for seed in [-1, -2099, -1_000_000_007, i64::MIN, i64::MAX] {
            let mut sizes = initial_fill();
            shuffle(&mut sizes, seed);
            assert_eq!(sorted(&sizes), sorted(&initial_fill()));
        }
    }

    #[test]
    fn shuffle_negative_seed_uses_euclidean_modulo() {
        // With seed -30 every step has a negative dividend; a truncating
        // modulo would produce negative indices here.
        let mut sizes: [u8; SEQUENCE_LEN] = std::array::from_fn(|i| i as u8);
        shuffle(&mut sizes, -30);
        assert_eq!(
            sizes,
            [0u8, 16, 10, 18, 6, 12, 4, 22, 21, 19, 2, 23, 8, 20, 14, 1, 3, 5, 7, 9, 11, 13, 15, 17]
        );
    }

    #[test]
    fn shuffle_seed_minus_one_rotates_right() {
        let mut sizes: [u8; SEQUENCE_LEN] = std::array::from_fn(|i| i as u8);
        shuffle(&mut sizes, -1);
        let expected: [u8; SEQUENCE_LEN] =
            std::array::from_fn(|i| ((i + SEQUENCE_LEN - 1) % SEQUENCE_LEN) as u8);
        assert_eq!(sizes, expected);
    }

    #[test]
    fn no_adjustment_point_keeps_base_counts() {
        let summary = synthesize(equivalent(f64::from(BASE_SUM) / SEQUENCE_LEN as f64));
        let dist = summary.priority_distribution;
        assert_eq!((dist.priority_3, dist.priority_4, dist.priority_5), (9, 8, 7));
        assert_eq!(summary.sizes.sum(), BASE_SUM);
    }

    #[test]
    fn lowers_overshoot_by_less_than_one() {
        for eps in [3.5, 3.7, 3.8] {
            let summary = synthesize(equivalent(eps));
            let target = eps * SEQUENCE_LEN as f64;
            let achieved = f64::from(summary.sizes.sum());
            assert!(
                achieved <= target + 1e-9 && target - achieved < 1.0,
                "eps {eps}: achieved {achieved}, target {target}"
            );
        }
    }

    #[test]
    fn raises_undershoot_by_about_half() {
        for (eps, expected) in [(3.95, 94), (4.1, 97), (4.3, 101), (4.6, 106)] {
            let summary = synthesize(equivalent(eps));
            let target = eps * SEQUENCE_LEN as f64;
            let asked = target - f64::from(BASE_SUM);
            let gained = f64::from(summary.sizes.sum()) - f64::from(BASE_SUM);
            assert_eq!(summary.sizes.sum(), expected, "eps {eps}");
            assert!(gained <= asked, "eps {eps}: gained {gained}, asked {asked}");
            assert!(gained >= asked / 2.0 - 1.0, "eps {eps}: gained {gained}, asked {asked}");
        }
    }

    #[test]
    fn out_of_range_targets_saturate() {
        assert_eq!(synthesize(equivalent(2.1)).sizes.sum(), 79);
        assert_eq!(synthesize(equivalent(-7.0)).sizes.sum(), 79);
        assert_eq!(synthesize(equivalent(9.0)).sizes.sum(), 111);
    }

    #[test]
    fn concrete_scenario() {
        let summary = synthesize_fallback(35.0, 85.0);
        assert_eq!(summary.mean_size, 0.7);
        assert_eq!(summary.equivalent_product_size, 2.1);
        assert_eq!(summary.final_equivalent_size, 3.2917);
        let dist = summary.priority_distribution;
        assert_eq!((dist.priority_3, dist.priority_4, dist.priority_5), (17, 7, 0));
        assert_eq!(
            summary.sizes.as_slice(),
            &[3u8, 3, 3, 3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 3, 3, 3, 3, 4, 4, 4, 4, 3, 3, 3]
        );
    }

    #[test]
    fn raised_sequence_regression() {
        let summary = synthesize(equivalent(4.2));
        assert_eq!(
            summary.sizes.as_slice(),
            &[4u8, 4, 4, 3, 3, 5, 3, 4, 5, 5, 3, 4, 4, 5, 4, 3, 5, 3, 4, 5, 5, 5, 4, 5]
        );
        assert_eq!(summary.sizes.sum(), 99);
        assert_eq!(summary.final_equivalent_size, 4.125);
    }

    #[test]
    fn boundary_inputs_produce_valid_sequences() {
        for (pct, cum) in [(20.0, 80.0), (50.0, 90.0)] {
            let summary = synthesize_fallback(pct, cum);
            assert_eq!(summary.sizes.as_slice().len(), SEQUENCE_LEN);
            assert!(summary.sizes.as_slice().iter().all(|s| (3..=5).contains(s)));
            assert_eq!(summary.priority_distribution.total(), SEQUENCE_LEN);
        }
    }

    #[test]
    fn distribution_matches_sizes() {
        for eps in [-3.0, 0.0, 1.86, 2.34, 3.9, 4.2, 5.0, 12.0] {
            let summary = synthesize(equivalent(eps));
            assert_eq!(summary.sizes.distribution(), summary.priority_distribution);
        }
    }

    #[test]
    fn deterministic_across_calls() {
        for (pct, cum) in [(20.0, 80.0), (33.3, 87.1), (50.0, 90.0)] {
            assert_eq!(synthesize_fallback(pct, cum), synthesize_fallback(pct, cum));
        }
    }

    #[test]
    fn shuffle_reorders_without_changing_counts() {
        let summary = synthesize(equivalent(4.2));
        let mut unshuffled = initial_fill();
        adjust(&mut unshuffled, 4.2 * SEQUENCE_LEN as f64 - f64::from(BASE_SUM));
        assert_eq!(sorted(summary.sizes.as_slice()), sorted(&unshuffled));
    }
}
