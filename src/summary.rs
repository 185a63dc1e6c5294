//! Mean and standard deviation of a single value series, with intervals.
//!
//! The closed-form bounds use the Student-t distribution for the mean and
//! the chi-square distribution for the standard deviation; bootstrap bounds
//! come from the shared resampling machinery. Missing values are excluded
//! before any moment is taken.

use log::debug;
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

use crate::config::{CiMethod, ResampleConfig};
use crate::errors::VerifResult;
use crate::intervals::{compute_bca_interval, compute_perc_interval, CiInfo};
use crate::math_utils::{is_bad_data, BAD_DATA};
use crate::resample::{bootstrap, jackknife, ReplicateScratch};
use crate::rng::BootRng;

/// Number of summary sub-statistics.
pub const N_SUMMARY_STATS: usize = 2;

/// Mean and standard deviation with their bounds.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryInfo {
    /// Confidence levels the bound arrays are indexed by
    pub alpha: Vec<f64>,
    /// Values that entered the moments after missing-data screening
    pub n: usize,
    pub mean: CiInfo,
    pub stdev: CiInfo,
}

impl SummaryInfo {
    /// Creates an empty record for the alpha list.
    pub fn new(alpha: Vec<f64>) -> Self {
        let n_alpha = alpha.len();
        Self {
            alpha,
            n: 0,
            mean: CiInfo::new(n_alpha),
            stdev: CiInfo::new(n_alpha),
        }
    }
}

fn mean_stdev(values: &[f64], index: &[usize]) -> (f64, f64, usize) {
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &i in index {
        let v = values[i];
        if is_bad_data(v) {
            continue;
        }
        n += 1;
        sum += v;
        sum_sq += v * v;
    }
    if n == 0 {
        return (BAD_DATA, BAD_DATA, 0);
    }
    let mean = sum / n as f64;
    let stdev = crate::math_utils::stdev_from_sums(n, sum, sum_sq);
    (mean, stdev, n)
}

/// Computes the mean and standard deviation with closed-form bounds.
///
/// The mean interval is `mean +/- t · stdev/sqrt(n)` with n-1 degrees of
/// freedom; the standard deviation interval comes from the chi-square
/// pivots of the sample variance. Fewer than two usable values leave every
/// bound at the sentinel.
pub fn compute_mean_stdev(values: &[f64], alpha: &[f64]) -> SummaryInfo {
    let mut info = SummaryInfo::new(alpha.to_vec());
    let index: Vec<usize> = (0..values.len()).collect();
    let (mean, stdev, n) = mean_stdev(values, &index);
    info.n = n;
    info.mean.v = mean;
    info.stdev.v = stdev;
    if n <= 1 || is_bad_data(stdev) {
        return info;
    }

    let df = (n - 1) as f64;
    let nf = n as f64;
    // distribution construction only fails for non-positive df
    let student = match StudentsT::new(0.0, 1.0, df) {
        Ok(d) => d,
        Err(_) => return info,
    };
    let chi_sq = match ChiSquared::new(df) {
        Ok(d) => d,
        Err(_) => return info,
    };

    for (i, &a) in alpha.iter().enumerate() {
        let t = student.inverse_cdf(1.0 - a / 2.0);
        let half = t * stdev / nf.sqrt();
        info.mean.v_ncl[i] = mean - half;
        info.mean.v_ncu[i] = mean + half;

        let chi_lo = chi_sq.inverse_cdf(a / 2.0);
        let chi_hi = chi_sq.inverse_cdf(1.0 - a / 2.0);
        if chi_lo > 0.0 && chi_hi > 0.0 {
            info.stdev.v_ncl[i] = stdev * (df / chi_hi).sqrt();
            info.stdev.v_ncu[i] = stdev * (df / chi_lo).sqrt();
        }
    }
    info
}

/// Computes the mean and standard deviation with bootstrap bounds as well.
///
/// Runs the family template over the value series: closed-form bounds
/// first, then jackknife and bootstrap replicates of both moments, then a
/// BCa or percentile interval per alpha. Short-circuits to the closed-form
/// record when n <= 1 or the replicate count is zero.
pub fn compute_mean_stdev_ci(
    values: &[f64],
    config: &ResampleConfig,
    rng: &mut BootRng,
) -> VerifResult<SummaryInfo> {
    config.validate()?;
    let mut info = compute_mean_stdev(values, &config.alpha);

    let n = values.len();
    if n <= 1 || config.n_boot < 1 {
        debug!("skipping summary resampling: n={n}, n_boot={}", config.n_boot);
        return Ok(info);
    }

    let mut scratch = ReplicateScratch::new(N_SUMMARY_STATS);
    // Only BCa consumes the jackknife replicates
    if config.ci_method == CiMethod::Bca {
        jackknife(n, &mut scratch, |index, scratch| {
            let (mean, stdev, _) = mean_stdev(values, index);
            scratch.push_jack(0, mean);
            scratch.push_jack(1, stdev);
        });
    }

    let m = match config.ci_method {
        CiMethod::Bca => n,
        CiMethod::Percentile => config.resample_size(n),
    };
    bootstrap(rng, n, m, config.n_boot, &mut scratch, |index, scratch| {
        let (mean, stdev, _) = mean_stdev(values, index);
        scratch.push_boot(0, mean);
        scratch.push_boot(1, stdev);
    });

    let alpha = config.alpha.clone();
    for (stat, ci) in [&mut info.mean, &mut info.stdev].into_iter().enumerate() {
        if is_bad_data(ci.v) {
            ci.set_all_bad();
            continue;
        }
        for (i, &a) in alpha.iter().enumerate() {
            let (cl, cu) = match config.ci_method {
                CiMethod::Bca => {
                    compute_bca_interval(ci.v, scratch.jack(stat), scratch.boot(stat), a)
                }
                CiMethod::Percentile => compute_perc_interval(scratch.boot(stat), a),
            };
            ci.v_bcl[i] = cl;
            ci.v_bcu[i] = cu;
        }
    }
    Ok(info)
}
