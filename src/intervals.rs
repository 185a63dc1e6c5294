//! Confidence interval estimators.
//!
//! Two resampling-based estimators (bias-corrected-and-accelerated and plain
//! percentile) operate on replicate buffers, and four closed-form
//! large-sample intervals (Wald, Wilson, Woolf, Hanssen-Kuipers) operate
//! directly on proportions or contingency counts. All of them fail closed:
//! degenerate input yields the bad-data sentinel in both bounds, never a
//! panic or an error.

use log::warn;

use crate::math_utils::{
    is_bad_data, mean, normal_cdf, normal_cdf_inv, percentile, sort_values, BAD_DATA,
    QUANTILE_EPSILON,
};

/// A point statistic with its normal-approximation and bootstrap bounds.
///
/// The four bound vectors run parallel to the configured alpha list:
/// `v_ncl[i]`/`v_ncu[i]` are the closed-form normal bounds and
/// `v_bcl[i]`/`v_bcu[i]` the bootstrap bounds for the i-th alpha. Bounds a
/// family does not fill stay at the bad-data sentinel.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CiInfo {
    /// Point estimate
    pub v: f64,
    /// Normal-approximation lower bounds, one per alpha
    pub v_ncl: Vec<f64>,
    /// Normal-approximation upper bounds, one per alpha
    pub v_ncu: Vec<f64>,
    /// Bootstrap lower bounds, one per alpha
    pub v_bcl: Vec<f64>,
    /// Bootstrap upper bounds, one per alpha
    pub v_bcu: Vec<f64>,
}

impl CiInfo {
    /// Creates a record for `n_alpha` confidence levels, all values bad.
    pub fn new(n_alpha: usize) -> Self {
        Self {
            v: BAD_DATA,
            v_ncl: vec![BAD_DATA; n_alpha],
            v_ncu: vec![BAD_DATA; n_alpha],
            v_bcl: vec![BAD_DATA; n_alpha],
            v_bcu: vec![BAD_DATA; n_alpha],
        }
    }

    /// Number of tracked confidence levels.
    pub fn n_alpha(&self) -> usize {
        self.v_ncl.len()
    }

    /// Resets the point value and every bound to the bad-data sentinel.
    pub fn set_all_bad(&mut self) {
        self.v = BAD_DATA;
        for b in [
            &mut self.v_ncl,
            &mut self.v_ncu,
            &mut self.v_bcl,
            &mut self.v_bcu,
        ] {
            b.fill(BAD_DATA);
        }
    }
}

/// Computes a bias-corrected and accelerated bootstrap interval.
///
/// `v` is the full-sample point estimate, `si` the jackknife replicates and
/// `sr` the bootstrap replicates for the same statistic.
///
/// The bias correction comes from the fraction of bootstrap replicates below
/// the point estimate, and the acceleration from the skewness of the
/// jackknife deviations. A zero jackknife variance makes the acceleration
/// undefined, so the interval degenerates to `(BAD_DATA, BAD_DATA)`, as does
/// any empty replicate buffer.
///
/// # Returns
///
/// The `(lower, upper)` bounds for the given two-sided alpha.
pub fn compute_bca_interval(v: f64, si: &[f64], sr: &[f64], alpha: f64) -> (f64, f64) {
    if is_bad_data(v) || si.is_empty() || sr.is_empty() {
        return (BAD_DATA, BAD_DATA);
    }

    // Bias correction from the replicate distribution
    let below = sr.iter().filter(|&&x| x < v).count();
    let mut p = below as f64 / sr.len() as f64;
    if p < QUANTILE_EPSILON || p > 1.0 - QUANTILE_EPSILON {
        warn!(
            "BCa bias-correction fraction {p:.3e} clamped to the open unit interval; \
             replicates are concentrated on one side of the point estimate"
        );
        p = p.clamp(QUANTILE_EPSILON, 1.0 - QUANTILE_EPSILON);
    }
    let z_hat = normal_cdf_inv(p, 0.0, 1.0);

    // Acceleration from the jackknife deviations
    let si_bar = mean(si);
    let mut sum_d2 = 0.0;
    let mut sum_d3 = 0.0;
    for &x in si {
        let d = si_bar - x;
        sum_d2 += d * d;
        sum_d3 += d * d * d;
    }
    let denom = 6.0 * sum_d2.powf(1.5);
    if denom == 0.0 {
        return (BAD_DATA, BAD_DATA);
    }
    let a_hat = sum_d3 / denom;

    let cv_l = normal_cdf_inv(alpha / 2.0, 0.0, 1.0);
    let cv_u = normal_cdf_inv(1.0 - alpha / 2.0, 0.0, 1.0);

    let a1 = normal_cdf(
        z_hat + (z_hat + cv_l) / (1.0 - a_hat * (z_hat + cv_l)),
        0.0,
        1.0,
    );
    let a2 = normal_cdf(
        z_hat + (z_hat + cv_u) / (1.0 - a_hat * (z_hat + cv_u)),
        0.0,
        1.0,
    );

    let mut sorted = sr.to_vec();
    sort_values(&mut sorted);
    (percentile(&sorted, a1), percentile(&sorted, a2))
}

/// Computes a plain percentile bootstrap interval from the replicates.
///
/// Returns the alpha/2 and 1-alpha/2 empirical percentiles of `sr`, or
/// `(BAD_DATA, BAD_DATA)` when no replicates are available.
pub fn compute_perc_interval(sr: &[f64], alpha: f64) -> (f64, f64) {
    if sr.is_empty() {
        return (BAD_DATA, BAD_DATA);
    }
    let mut sorted = sr.to_vec();
    sort_values(&mut sorted);
    (
        percentile(&sorted, alpha / 2.0),
        percentile(&sorted, 1.0 - alpha / 2.0),
    )
}

/// Computes the Wald large-sample interval for a proportion.
pub fn compute_wald_ci(p: f64, alpha: f64, n: usize) -> (f64, f64) {
    if is_bad_data(p) || n == 0 {
        return (BAD_DATA, BAD_DATA);
    }
    let z = normal_cdf_inv(1.0 - alpha / 2.0, 0.0, 1.0);
    let v = z * (p * (1.0 - p) / n as f64).sqrt();
    (p - v, p + v)
}

/// Computes the Wilson score interval for a proportion.
///
/// Applies the quadratic correction to the variance plus the z^2/(4n^2)
/// term, giving better coverage than Wald at small n and extreme p. This is
/// the default proportion interval used by the statistic families.
pub fn compute_wilson_ci(p: f64, alpha: f64, n: usize) -> (f64, f64) {
    if is_bad_data(p) || n == 0 {
        return (BAD_DATA, BAD_DATA);
    }
    let nf = n as f64;
    let z = normal_cdf_inv(1.0 - alpha / 2.0, 0.0, 1.0);
    let z2 = z * z;
    let denom = 1.0 + z2 / nf;
    let center = (p + z2 / (2.0 * nf)) / denom;
    let half = z * (p * (1.0 - p) / nf + z2 / (4.0 * nf * nf)).sqrt() / denom;
    (center - half, center + half)
}

/// Computes the default interval for a proportion-valued statistic.
pub fn compute_proportion_ci(p: f64, alpha: f64, n: usize) -> (f64, f64) {
    compute_wilson_ci(p, alpha, n)
}

/// Computes Woolf's interval for the 2x2 odds ratio.
///
/// Undefined when any cell count is zero; the bounds degenerate to the
/// bad-data sentinel in that case.
pub fn compute_woolf_ci(
    odds: f64,
    alpha: f64,
    fy_oy: u64,
    fy_on: u64,
    fn_oy: u64,
    fn_on: u64,
) -> (f64, f64) {
    if is_bad_data(odds) || fy_oy == 0 || fy_on == 0 || fn_oy == 0 || fn_on == 0 {
        return (BAD_DATA, BAD_DATA);
    }
    let s = (1.0 / fy_oy as f64
        + 1.0 / fy_on as f64
        + 1.0 / fn_oy as f64
        + 1.0 / fn_on as f64)
        .sqrt();
    let cv_l = normal_cdf_inv(alpha / 2.0, 0.0, 1.0);
    let cv_u = normal_cdf_inv(1.0 - alpha / 2.0, 0.0, 1.0);
    (odds * (cv_l * s).exp(), odds * (cv_u * s).exp())
}

/// Computes the closed-form interval for the Hanssen-Kuipers discriminant.
///
/// Derives Wilson-style standard errors for the hit rate and the false
/// alarm rate separately and combines them in quadrature (Wilks, Statistical
/// Methods in the Atmospheric Sciences, 2nd ed., p. 328).
///
/// Each rate feeds its own variance term here. MET computes the false-alarm
/// term from the hit rate instead, so bounds from this function differ
/// slightly from MET output whenever the two rates differ.
pub fn compute_hk_ci(
    hk: f64,
    alpha: f64,
    fy_oy: u64,
    fy_on: u64,
    fn_oy: u64,
    fn_on: u64,
) -> (f64, f64) {
    let h_n = (fy_oy + fn_oy) as f64;
    let f_n = (fy_on + fn_on) as f64;
    if is_bad_data(hk) || h_n == 0.0 || f_n == 0.0 {
        return (BAD_DATA, BAD_DATA);
    }

    // cv is the lower-tail critical value and is negative for alpha < 1
    let cv = normal_cdf_inv(alpha / 2.0, 0.0, 1.0);
    let cv2 = cv * cv;

    let h = fy_oy as f64 / h_n;
    let f = fy_on as f64 / f_n;

    let h_var = (h * (1.0 - h) / h_n + cv2 / (4.0 * h_n * h_n)).sqrt() / (1.0 + cv2 / h_n);
    let f_var = (f * (1.0 - f) / f_n + cv2 / (4.0 * f_n * f_n)).sqrt() / (1.0 + cv2 / f_n);

    let stdev = (h_var * h_var + f_var * f_var).sqrt();
    (hk + cv * stdev, hk - cv * stdev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_bca_empty_replicates() {
        assert_eq!(
            compute_bca_interval(1.0, &[], &[1.0, 2.0], 0.05),
            (BAD_DATA, BAD_DATA)
        );
        assert_eq!(
            compute_bca_interval(1.0, &[1.0, 2.0], &[], 0.05),
            (BAD_DATA, BAD_DATA)
        );
    }

    #[test]
    fn test_bca_zero_variance_jackknife() {
        let si = [2.0; 10];
        let sr = [1.0, 2.0, 3.0, 2.0, 2.5];
        assert_eq!(compute_bca_interval(2.0, &si, &sr, 0.05), (BAD_DATA, BAD_DATA));
    }

    #[test]
    fn test_bca_symmetric_replicates_bracket_estimate() {
        // Replicates uniform around the point estimate
        let sr: Vec<f64> = (0..1000).map(|i| 4.0 + 2.0 * (i as f64 / 999.0)).collect();
        let si: Vec<f64> = (0..20).map(|i| 4.9 + 0.01 * i as f64).collect();
        let (cl, cu) = compute_bca_interval(5.0, &si, &sr, 0.05);
        assert!(cl < 5.0 && cu > 5.0);
        assert!(cl >= 4.0 && cu <= 6.0);
        assert!(cl <= cu);
    }

    #[test]
    fn test_perc_interval_quantiles() {
        let sr: Vec<f64> = (0..=100).map(f64::from).collect();
        let (cl, cu) = compute_perc_interval(&sr, 0.10);
        assert_approx_eq!(cl, 5.0, 1e-9);
        assert_approx_eq!(cu, 95.0, 1e-9);
    }

    #[test]
    fn test_perc_interval_empty() {
        assert_eq!(compute_perc_interval(&[], 0.05), (BAD_DATA, BAD_DATA));
    }

    #[test]
    fn test_wald_ci_known_value() {
        // p=0.5, n=100, z=1.96 -> half width 0.098
        let (cl, cu) = compute_wald_ci(0.5, 0.05, 100);
        assert_approx_eq!(cl, 0.402, 1e-3);
        assert_approx_eq!(cu, 0.598, 1e-3);
    }

    #[test]
    fn test_wilson_tighter_than_wald_near_extreme() {
        let (wald_cl, wald_cu) = compute_wald_ci(0.95, 0.05, 20);
        let (wil_cl, wil_cu) = compute_wilson_ci(0.95, 0.05, 20);
        // Wilson stays inside the unit interval where Wald overshoots
        assert!(wald_cu > 1.0);
        assert!(wil_cu <= 1.0);
        assert!(wil_cl > wald_cl);
    }

    #[test]
    fn test_wilson_degenerate() {
        assert_eq!(compute_wilson_ci(BAD_DATA, 0.05, 10), (BAD_DATA, BAD_DATA));
        assert_eq!(compute_wilson_ci(0.5, 0.05, 0), (BAD_DATA, BAD_DATA));
    }

    #[test]
    fn test_woolf_zero_cell() {
        assert_eq!(
            compute_woolf_ci(4.0, 0.05, 40, 0, 10, 40),
            (BAD_DATA, BAD_DATA)
        );
    }

    #[test]
    fn test_woolf_brackets_odds() {
        let odds = (40.0 * 40.0) / (10.0 * 10.0);
        let (cl, cu) = compute_woolf_ci(odds, 0.05, 40, 10, 10, 40);
        assert!(cl < odds && cu > odds);
        assert!(cl > 0.0);
    }

    #[test]
    fn test_hk_ci_brackets_and_orders() {
        // H = 0.8, F = 0.2, HK = 0.6
        let (cl, cu) = compute_hk_ci(0.6, 0.05, 40, 10, 10, 40);
        assert!(cl < 0.6 && cu > 0.6);
        assert!(cl <= cu);
    }

    #[test]
    fn test_hk_ci_degenerate_counts() {
        assert_eq!(compute_hk_ci(0.5, 0.05, 0, 10, 0, 40), (BAD_DATA, BAD_DATA));
    }

    #[test]
    fn test_ci_info_bad_defaults() {
        let ci = CiInfo::new(2);
        assert!(is_bad_data(ci.v));
        assert_eq!(ci.n_alpha(), 2);
        assert!(ci.v_bcl.iter().all(|&x| is_bad_data(x)));
    }
}
