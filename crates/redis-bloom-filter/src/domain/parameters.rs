//! Bloom filter parameter estimation
//!
//! Formulas:
//! - m = ceil(n * ln(p) / ln(1 / 2^ln(2)))   -- total bits
//! - k = round(ln(2) * m / n)                 -- hash iterations
//! - p(count) = (1 - e^(-k * count / m))^k    -- rate after `count` insertions
//!
//! The rounding is part of the contract: m uses `ceil`, k uses `+ 0.5`
//! truncation. Other implementations of the same scheme size their planes
//! with exactly these expressions, so a filter key shared between them must
//! agree on (m, k) bit for bit.
//!
//! None of the free functions validate their input. `n == 0` or `p <= 0`
//! yields meaningless output; callers validate upstream (see
//! [`FilterConfig::validate`](super::config::FilterConfig::validate)).

use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

/// Estimate the total bit count `m` and hash iteration count `k` for `n`
/// expected items at false positive rate `p`.
pub fn estimate_parameters(n: usize, p: f64) -> (usize, usize) {
    let m = total_bits(n, p);
    let k = hash_iterations(m, n);
    (m as usize, k as usize)
}

/// Expected false positive rate of an `m`-bit, `k`-iteration filter holding
/// `count` items.
///
/// Formula: p = (1 - e^(-k * count / m))^k
pub fn estimate_false_positive_rate(m: usize, k: usize, count: usize) -> f64 {
    let k = k as f64;
    (1.0 - (-k / (m as f64 / count as f64)).exp()).powf(k)
}

/// Number of insertions after which a filter sized for `(n, p)` reaches
/// `target_p`.
///
/// Formula: count = -(m / k) * ln(1 - target_p^(1 / k)), with the k the
/// filter runs with (at least 1).
pub fn estimate_capacity(n: usize, p: f64, target_p: f64) -> usize {
    let params = FilterParams::estimate(n, p);
    capacity_from(params.size_bits, params.hash_count, target_p)
}

fn capacity_from(m: usize, k: usize, target_p: f64) -> usize {
    let (m, k) = (m as f64, k as f64);
    (-(m / k) * (1.0 - target_p.powf(1.0 / k)).ln()) as usize
}

fn total_bits(n: usize, p: f64) -> f64 {
    (n as f64 * p.ln() / (1.0 / 2.0_f64.powf(LN_2)).ln()).ceil()
}

fn hash_iterations(m: f64, n: usize) -> f64 {
    // +0.5 then truncate: round-half-up
    (LN_2 * m / n as f64 + 0.5).trunc()
}

/// Sizing of one filter: the inputs and everything derived from them.
///
/// `size_bits` and `hash_count` are always recomputed together through
/// [`FilterParams::estimate`]; there is no way to set one independently.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Expected number of items (n)
    pub expected_items: usize,
    /// Target false positive rate (p)
    pub target_fpr: f64,
    /// Total number of bits across all planes (m)
    pub size_bits: usize,
    /// Number of hash iterations, which is also the number of planes (k)
    pub hash_count: usize,
    /// Bits per plane: ceil(m / k)
    pub partition_size: usize,
}

impl FilterParams {
    /// Derive the full filter geometry for `n` items at rate `p`.
    ///
    /// `hash_count` is floored at 1 so that a very loose `p` (where the
    /// optimal k rounds to zero) still yields one plane.
    pub fn estimate(expected_items: usize, target_fpr: f64) -> Self {
        let (size_bits, hash_count) = estimate_parameters(expected_items, target_fpr);
        let hash_count = hash_count.max(1);
        let partition_size = (size_bits as f64 / hash_count as f64).ceil() as usize;

        Self {
            expected_items,
            target_fpr,
            size_bits,
            hash_count,
            partition_size,
        }
    }

    /// False positive rate once `count` items have been inserted.
    pub fn false_positive_rate_at(&self, count: usize) -> f64 {
        estimate_false_positive_rate(self.size_bits, self.hash_count, count)
    }

    /// Insertions this filter absorbs before its rate reaches `target_fpr`.
    pub fn capacity_at(&self, target_fpr: f64) -> usize {
        capacity_from(self.size_bits, self.hash_count, target_fpr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parameters_n100000_fpr001() {
        let (m, k) = estimate_parameters(100_000, 0.01);
        assert_eq!(m, 958_506, "m must match the reference sizing");
        assert_eq!(k, 7, "k must match the reference sizing");
    }

    #[test]
    fn test_partition_size_is_ceiling_of_m_over_k() {
        let params = FilterParams::estimate(100_000, 0.01);
        assert_eq!(params.partition_size, 136_930);
        assert!(params.partition_size * params.hash_count >= params.size_bits);
    }

    #[test]
    fn test_parameters_n10000_fpr001() {
        let (m, k) = estimate_parameters(10_000, 0.01);
        assert_eq!(m, 95_851);
        assert_eq!(k, 7);
    }

    #[test]
    fn test_lower_fpr_needs_more_bits_and_iterations() {
        let (m1, k1) = estimate_parameters(1_000, 0.1);
        let (m2, k2) = estimate_parameters(1_000, 0.001);
        assert!(m2 > m1, "Lower FPR should need more bits");
        assert!(k2 > k1, "Lower FPR should need more iterations");
    }

    #[test]
    fn test_loose_fpr_keeps_one_plane() {
        let (_, k) = estimate_parameters(1_000, 0.9);
        assert_eq!(k, 0, "raw estimate rounds to zero for p=0.9");

        let params = FilterParams::estimate(1_000, 0.9);
        assert_eq!(params.hash_count, 1);
        assert_eq!(params.partition_size, params.size_bits);
    }

    #[test]
    fn test_fpr_grows_with_count() {
        let params = FilterParams::estimate(10_000, 0.01);
        let half = params.false_positive_rate_at(5_000);
        let full = params.false_positive_rate_at(10_000);
        let double = params.false_positive_rate_at(20_000);
        assert!(half < full && full < double);
        assert!((full - 0.01).abs() < 0.001, "Expected FPR≈0.01 at n, got {}", full);
    }

    #[test]
    fn test_capacity_at_looser_target_exceeds_n() {
        let params = FilterParams::estimate(10_000, 0.01);
        assert_eq!(params.capacity_at(0.01), estimate_capacity(10_000, 0.01, 0.01));
        assert!(params.capacity_at(0.05) > 10_000);
        assert!(params.capacity_at(0.001) < 10_000);
    }

    #[test]
    fn test_capacity_with_single_plane() {
        // Raw k rounds to 0 here; the filter runs with one plane
        let params = FilterParams::estimate(10_000, 0.9);
        assert_eq!(params.size_bits, 2_193);
        assert_eq!(params.hash_count, 1);

        let capacity = params.capacity_at(0.9);
        assert!(
            (5_040..=5_060).contains(&capacity),
            "Expected about 5049 items, got {}",
            capacity
        );
        assert_eq!(estimate_capacity(10_000, 0.9, 0.9), capacity);

        let rate = params.false_positive_rate_at(capacity);
        assert!((rate - 0.9).abs() < 0.001, "rate={}", rate);
    }

    proptest! {
        #[test]
        fn prop_capacity_round_trips_through_rate(
            n in 1_000usize..2_000_000,
            p in 0.0005f64..0.3,
        ) {
            let (m, k) = estimate_parameters(n, p);
            let count = estimate_capacity(n, p, p);
            let rate = estimate_false_positive_rate(m, k, count);
            prop_assert!(((rate - p) / p).abs() < 0.02, "n={} p={} rate={}", n, p, rate);
        }

        #[test]
        fn prop_geometry_is_consistent(n in 1usize..10_000_000, p in 0.0001f64..0.5) {
            let params = FilterParams::estimate(n, p);
            prop_assert!(params.hash_count >= 1);
            prop_assert!(params.partition_size * params.hash_count >= params.size_bits);
            prop_assert!(
                params.partition_size * params.hash_count < params.size_bits + params.hash_count
            );
        }
    }
}
