//! Neighborhood statistics over fractional-coverage pairs.
//!
//! Neighborhood methods compare fractional event coverage rather than raw
//! values: each pair holds the fraction of neighborhood points exceeding a
//! raw threshold on the forecast and observation side. Categorical
//! statistics come from dichotomizing the coverage fractions with a coverage
//! threshold; the continuous branch carries the fractions brier score and
//! fractions skill score.

use log::debug;

use crate::categorical::{ContingencyTable, CtsInfo, N_CTS_STATS};
use crate::config::{CiMethod, ResampleConfig};
use crate::errors::{validate_equal_length, VerifResult};
use crate::intervals::{compute_bca_interval, compute_perc_interval, CiInfo};
use crate::math_utils::{is_bad_data, BAD_DATA};
use crate::resample::{bootstrap, jackknife, ReplicateScratch};
use crate::rng::BootRng;
use crate::sample::{identity_index, PairedSample};
use crate::thresh::Threshold;

/// Number of neighborhood continuous sub-statistics.
pub const N_NBRCNT_STATS: usize = 2;

/// Categorical statistics over dichotomized coverage fractions.
///
/// The raw threshold pair records how the coverage fields were derived; the
/// coverage threshold performs the dichotomization on both sides.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NbrCtsInfo {
    /// Raw-field threshold that produced the forecast coverage fractions
    pub fthresh: Threshold,
    /// Raw-field threshold that produced the observation coverage fractions
    pub othresh: Threshold,
    /// Coverage threshold applied to both fraction fields
    pub cthresh: Threshold,
    /// The thirteen categorical statistics with their bounds
    pub cts_info: CtsInfo,
}

/// Fractions brier score and fractions skill score with bounds.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NbrCntInfo {
    /// Confidence levels the bound arrays are indexed by
    pub alpha: Vec<f64>,
    /// Raw-field threshold that produced the coverage fractions
    pub fthresh: Threshold,
    pub othresh: Threshold,
    /// Fractions brier score
    pub fbs: CiInfo,
    /// Fractions skill score
    pub fss: CiInfo,
}

impl NbrCntInfo {
    /// Creates an empty record for the thresholds and alpha list.
    pub fn new(fthresh: Threshold, othresh: Threshold, alpha: Vec<f64>) -> Self {
        let n_alpha = alpha.len();
        Self {
            alpha,
            fthresh,
            othresh,
            fbs: CiInfo::new(n_alpha),
            fss: CiInfo::new(n_alpha),
        }
    }
}

/// Computes fbs and fss for the indexed subset of coverage pairs.
///
/// fbs is the mean squared coverage difference. fss compares it against the
/// no-skill reference `mean(f^2) + mean(o^2)`; a zero reference leaves fss
/// undefined.
fn nbrcnt_stat_values(sample: &PairedSample, index: &[usize]) -> [f64; N_NBRCNT_STATS] {
    let mut n = 0.0;
    let mut sum_sq_diff = 0.0;
    let mut sum_sq = 0.0;
    for &i in index {
        if sample.is_pair_bad(i) {
            continue;
        }
        let f = sample.fcst[i];
        let o = sample.obs[i];
        n += 1.0;
        sum_sq_diff += (f - o) * (f - o);
        sum_sq += f * f + o * o;
    }
    if n == 0.0 {
        return [BAD_DATA; N_NBRCNT_STATS];
    }
    let fbs = sum_sq_diff / n;
    let fbs_ref = sum_sq / n;
    let fss = if fbs_ref == 0.0 {
        BAD_DATA
    } else {
        1.0 - fbs / fbs_ref
    };
    [fbs, fss]
}

/// Computes neighborhood categorical statistics with bootstrap intervals.
///
/// `sample` holds fractional coverage pairs; `cthresh` dichotomizes both
/// sides. Identical to the plain categorical orchestrator otherwise.
pub fn compute_nbrcts_stats_ci(
    sample: &PairedSample,
    fthresh: Threshold,
    othresh: Threshold,
    cthresh: Threshold,
    config: &ResampleConfig,
    rng: &mut BootRng,
) -> VerifResult<NbrCtsInfo> {
    validate_equal_length(&sample.fcst, &sample.obs)?;
    config.validate()?;

    let n = sample.len();
    let mut cts_info = CtsInfo::new(cthresh, cthresh, config.alpha.clone());
    cts_info.cts = ContingencyTable::from_pairs(sample, &identity_index(n), cthresh, cthresh);
    cts_info.compute_stats();
    cts_info.compute_normal_ci();

    if n > 1 && config.n_boot >= 1 {
        let mut scratch = ReplicateScratch::new(N_CTS_STATS);
        let recompute = |index: &[usize]| {
            ContingencyTable::from_pairs(sample, index, cthresh, cthresh).all_stats()
        };

        // Only BCa consumes the jackknife replicates
        if config.ci_method == CiMethod::Bca {
            jackknife(n, &mut scratch, |index, scratch| {
                for (i, v) in recompute(index).into_iter().enumerate() {
                    scratch.push_jack(i, v);
                }
            });
        }

        let m = match config.ci_method {
            CiMethod::Bca => n,
            CiMethod::Percentile => config.resample_size(n),
        };
        bootstrap(rng, n, m, config.n_boot, &mut scratch, |index, scratch| {
            for (i, v) in recompute(index).into_iter().enumerate() {
                scratch.push_boot(i, v);
            }
        });

        cts_info.fill_boot_ci(&scratch, config);
    }

    Ok(NbrCtsInfo {
        fthresh,
        othresh,
        cthresh,
        cts_info,
    })
}

/// Computes the fractions scores with bootstrap confidence intervals.
pub fn compute_nbrcnt_stats_ci(
    sample: &PairedSample,
    fthresh: Threshold,
    othresh: Threshold,
    config: &ResampleConfig,
    rng: &mut BootRng,
) -> VerifResult<NbrCntInfo> {
    validate_equal_length(&sample.fcst, &sample.obs)?;
    config.validate()?;

    let n = sample.len();
    let mut info = NbrCntInfo::new(fthresh, othresh, config.alpha.clone());
    let values = nbrcnt_stat_values(sample, &identity_index(n));
    info.fbs.v = values[0];
    info.fss.v = values[1];

    if n <= 1 || config.n_boot < 1 {
        debug!("skipping fractions-score resampling: n={n}, n_boot={}", config.n_boot);
        return Ok(info);
    }

    let mut scratch = ReplicateScratch::new(N_NBRCNT_STATS);
    // Only BCa consumes the jackknife replicates
    if config.ci_method == CiMethod::Bca {
        jackknife(n, &mut scratch, |index, scratch| {
            for (i, v) in nbrcnt_stat_values(sample, index).into_iter().enumerate() {
                scratch.push_jack(i, v);
            }
        });
    }

    let m = match config.ci_method {
        CiMethod::Bca => n,
        CiMethod::Percentile => config.resample_size(n),
    };
    bootstrap(rng, n, m, config.n_boot, &mut scratch, |index, scratch| {
        for (i, v) in nbrcnt_stat_values(sample, index).into_iter().enumerate() {
            scratch.push_boot(i, v);
        }
    });

    let alpha = config.alpha.clone();
    for (stat, ci) in [&mut info.fbs, &mut info.fss].into_iter().enumerate() {
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
