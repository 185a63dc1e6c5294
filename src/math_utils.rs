//! Mathematical primitives shared across the verification statistics.
//!
//! Provides the bad-data sentinel convention, normal distribution CDF and
//! quantile functions backed by `statrs`, linear-interpolation percentiles,
//! and the rank transform used by the rank correlation statistics.

use once_cell::sync::Lazy;
use statrs::distribution::{ContinuousCDF, Normal};

/// Reserved sentinel marking a missing or not-computable value.
///
/// Every numeric field in this crate may carry the sentinel. Consumers must
/// test with [`is_bad_data`] rather than comparing against the literal.
pub const BAD_DATA: f64 = -9999.0;

/// Tolerance used when testing a value against the bad-data sentinel.
const BAD_DATA_TOL: f64 = 1e-5;

/// Tolerance for general floating-point equality tests.
const FLOAT_TOL: f64 = 1e-10;

/// Epsilon used to keep quantile arguments strictly inside (0, 1).
pub(crate) const QUANTILE_EPSILON: f64 = 1e-6;

// Cached standard normal, constructed once per process.
static STANDARD_NORMAL: Lazy<Normal> =
    Lazy::new(|| Normal::new(0.0, 1.0).expect("standard normal is always constructible"));

/// Returns true when `v` carries the bad-data sentinel (or is not finite).
#[inline]
pub fn is_bad_data(v: f64) -> bool {
    !v.is_finite() || (v - BAD_DATA).abs() < BAD_DATA_TOL
}

/// Tolerant floating-point equality.
#[inline]
pub fn is_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < FLOAT_TOL
}

/// Cumulative distribution function of the normal distribution.
///
/// Returns P(X <= x) for X ~ N(mean, sd²).
pub fn normal_cdf(x: f64, mean: f64, sd: f64) -> f64 {
    debug_assert!(sd > 0.0, "normal_cdf requires a positive standard deviation");
    STANDARD_NORMAL.cdf((x - mean) / sd)
}

/// Quantile function (inverse CDF) of the normal distribution.
///
/// Defined for p strictly inside (0, 1); arguments at or beyond the boundary
/// are clamped an epsilon away from it, so callers that can produce exact
/// 0 or 1 proportions must decide the clamping policy themselves first.
pub fn normal_cdf_inv(p: f64, mean: f64, sd: f64) -> f64 {
    debug_assert!(sd > 0.0, "normal_cdf_inv requires a positive standard deviation");
    debug_assert!(p > 0.0 && p < 1.0, "normal_cdf_inv requires p in (0, 1)");
    let p = p.clamp(QUANTILE_EPSILON, 1.0 - QUANTILE_EPSILON);
    mean + sd * STANDARD_NORMAL.inverse_cdf(p)
}

/// Safe comparison for floating-point values, pushing NaN to the end.
pub fn float_total_cmp(a: &f64, b: &f64) -> std::cmp::Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap(),
    }
}

/// Sorts a slice of replicate values ascending in place.
pub fn sort_values(values: &mut [f64]) {
    values.sort_unstable_by(float_total_cmp);
}

/// Calculate the percentile of already-sorted data using linear interpolation.
///
/// Interpolates at the 0-indexed rank `p * (n - 1)`, the convention used by
/// most statistical packages. The input must be sorted ascending; callers
/// sort once before repeated percentile queries.
///
/// # Arguments
/// * `sorted_data` - Values sorted ascending
/// * `p` - Target probability in [0, 1]
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return BAD_DATA;
    }
    if p <= 0.0 {
        return sorted_data[0];
    }
    if p >= 1.0 {
        return sorted_data[sorted_data.len() - 1];
    }

    let n = sorted_data.len();
    let index = p * (n - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

/// Mean of a sample, or the bad-data sentinel for an empty one.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return BAD_DATA;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation from the count, sum and sum of squares.
///
/// Uses the n-1 denominator. Returns the sentinel for n <= 1 and clamps the
/// occasional tiny negative variance from cancellation to zero.
pub fn stdev_from_sums(n: usize, sum: f64, sum_sq: f64) -> f64 {
    if n <= 1 {
        return BAD_DATA;
    }
    let var = (sum_sq - sum * sum / n as f64) / (n - 1) as f64;
    if var < 0.0 {
        0.0
    } else {
        var.sqrt()
    }
}

/// Assigns fractional ranks (1-based) to a sample, averaging ties.
///
/// Used by the Spearman rank correlation. NaN values must be filtered by the
/// caller beforehand.
pub fn rank_values(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by(|&a, &b| float_total_cmp(&values[a], &values[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        // Find the run of tied values and assign each the average rank.
        let mut j = i + 1;
        while j < n && is_eq(values[order[j]], values[order[i]]) {
            j += 1;
        }
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg_rank;
        }
        i = j;
    }
    ranks
}
