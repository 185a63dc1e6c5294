//! Dichotomous (2x2) contingency statistics with confidence intervals.
//!
//! Forecast and observation pairs are dichotomized by a threshold on each
//! side, counted into a 2x2 table, and summarized by thirteen categorical
//! statistics. Closed-form normal bounds cover the proportion-valued
//! statistics plus the odds ratio and Hanssen-Kuipers discriminant;
//! bootstrap bounds cover all thirteen.

use log::debug;

use crate::config::{CiMethod, ResampleConfig};
use crate::errors::{validate_equal_length, VerifResult};
use crate::intervals::{
    compute_bca_interval, compute_hk_ci, compute_perc_interval, compute_proportion_ci,
    compute_woolf_ci, CiInfo,
};
use crate::math_utils::{is_bad_data, BAD_DATA};
use crate::resample::{bootstrap, jackknife, ReplicateScratch};
use crate::rng::BootRng;
use crate::sample::{identity_index, PairedSample};
use crate::thresh::Threshold;

/// Number of categorical sub-statistics tracked per table.
pub const N_CTS_STATS: usize = 13;

/// A 2x2 forecast/observation contingency table.
///
/// Cell naming follows the forecast-yes/observation-yes convention:
/// `fy_oy` hits, `fy_on` false alarms, `fn_oy` misses, `fn_on` correct
/// rejections. Counts are unweighted; every counted pair contributes one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContingencyTable {
    pub fy_oy: u64,
    pub fy_on: u64,
    pub fn_oy: u64,
    pub fn_on: u64,
}

impl ContingencyTable {
    /// Counts the indexed pairs of `sample` into a table, dichotomizing with
    /// the two thresholds. Pairs with a missing value on either side are
    /// skipped.
    pub fn from_pairs(
        sample: &PairedSample,
        index: &[usize],
        fthresh: Threshold,
        othresh: Threshold,
    ) -> Self {
        let mut table = Self::default();
        for &i in index {
            if sample.is_pair_bad(i) {
                continue;
            }
            let fy = fthresh.check(sample.fcst[i]);
            let oy = othresh.check(sample.obs[i]);
            match (fy, oy) {
                (true, true) => table.fy_oy += 1,
                (true, false) => table.fy_on += 1,
                (false, true) => table.fn_oy += 1,
                (false, false) => table.fn_on += 1,
            }
        }
        table
    }

    /// Total pair count.
    pub fn n(&self) -> u64 {
        self.fy_oy + self.fy_on + self.fn_oy + self.fn_on
    }

    fn ratio(num: f64, den: f64) -> f64 {
        if den == 0.0 {
            BAD_DATA
        } else {
            num / den
        }
    }

    /// Base rate: observed-yes fraction.
    pub fn baser(&self) -> f64 {
        Self::ratio((self.fy_oy + self.fn_oy) as f64, self.n() as f64)
    }

    /// Forecast mean: forecast-yes fraction.
    pub fn fmean(&self) -> f64 {
        Self::ratio((self.fy_oy + self.fy_on) as f64, self.n() as f64)
    }

    /// Accuracy: fraction of correct forecasts.
    pub fn acc(&self) -> f64 {
        Self::ratio((self.fy_oy + self.fn_on) as f64, self.n() as f64)
    }

    /// Frequency bias: forecast-yes over observed-yes.
    pub fn fbias(&self) -> f64 {
        Self::ratio(
            (self.fy_oy + self.fy_on) as f64,
            (self.fy_oy + self.fn_oy) as f64,
        )
    }

    /// Probability of detection (hit rate).
    pub fn pody(&self) -> f64 {
        Self::ratio(self.fy_oy as f64, (self.fy_oy + self.fn_oy) as f64)
    }

    /// Probability of detecting the observed-no category.
    pub fn podn(&self) -> f64 {
        Self::ratio(self.fn_on as f64, (self.fy_on + self.fn_on) as f64)
    }

    /// Probability of false detection (false alarm rate).
    pub fn pofd(&self) -> f64 {
        Self::ratio(self.fy_on as f64, (self.fy_on + self.fn_on) as f64)
    }

    /// False alarm ratio.
    pub fn far(&self) -> f64 {
        Self::ratio(self.fy_on as f64, (self.fy_oy + self.fy_on) as f64)
    }

    /// Critical success index (threat score).
    pub fn csi(&self) -> f64 {
        Self::ratio(
            self.fy_oy as f64,
            (self.fy_oy + self.fy_on + self.fn_oy) as f64,
        )
    }

    /// Gilbert skill score: threat score corrected for random hits.
    pub fn gss(&self) -> f64 {
        let n = self.n() as f64;
        if n == 0.0 {
            return BAD_DATA;
        }
        let chance = (self.fy_oy + self.fy_on) as f64 * (self.fy_oy + self.fn_oy) as f64 / n;
        Self::ratio(
            self.fy_oy as f64 - chance,
            (self.fy_oy + self.fy_on + self.fn_oy) as f64 - chance,
        )
    }

    /// Hanssen-Kuipers discriminant: hit rate minus false alarm rate.
    pub fn hk(&self) -> f64 {
        let pody = self.pody();
        let pofd = self.pofd();
        if is_bad_data(pody) || is_bad_data(pofd) {
            BAD_DATA
        } else {
            pody - pofd
        }
    }

    /// Heidke skill score: accuracy corrected for random agreement.
    pub fn hss(&self) -> f64 {
        let n = self.n() as f64;
        if n == 0.0 {
            return BAD_DATA;
        }
        let chance = ((self.fy_oy + self.fy_on) as f64 * (self.fy_oy + self.fn_oy) as f64
            + (self.fn_oy + self.fn_on) as f64 * (self.fy_on + self.fn_on) as f64)
            / n;
        Self::ratio((self.fy_oy + self.fn_on) as f64 - chance, n - chance)
    }

    /// Odds ratio of hits and correct rejections against the error cells.
    pub fn odds(&self) -> f64 {
        Self::ratio(
            (self.fy_oy * self.fn_on) as f64,
            (self.fy_on * self.fn_oy) as f64,
        )
    }

    /// All thirteen statistics in their fixed tracking order.
    pub fn all_stats(&self) -> [f64; N_CTS_STATS] {
        [
            self.baser(),
            self.fmean(),
            self.acc(),
            self.fbias(),
            self.pody(),
            self.podn(),
            self.pofd(),
            self.far(),
            self.csi(),
            self.gss(),
            self.hk(),
            self.hss(),
            self.odds(),
        ]
    }
}

/// Categorical statistics for one threshold pair, with all bounds.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CtsInfo {
    /// Forecast dichotomizing threshold
    pub fthresh: Threshold,
    /// Observation dichotomizing threshold
    pub othresh: Threshold,
    /// Confidence levels the bound arrays are indexed by
    pub alpha: Vec<f64>,
    /// Full-sample contingency table
    pub cts: ContingencyTable,
    pub baser: CiInfo,
    pub fmean: CiInfo,
    pub acc: CiInfo,
    pub fbias: CiInfo,
    pub pody: CiInfo,
    pub podn: CiInfo,
    pub pofd: CiInfo,
    pub far: CiInfo,
    pub csi: CiInfo,
    pub gss: CiInfo,
    pub hk: CiInfo,
    pub hss: CiInfo,
    pub odds: CiInfo,
}

impl CtsInfo {
    /// Creates an empty record for the given thresholds and alpha list.
    pub fn new(fthresh: Threshold, othresh: Threshold, alpha: Vec<f64>) -> Self {
        let n_alpha = alpha.len();
        Self {
            fthresh,
            othresh,
            alpha,
            cts: ContingencyTable::default(),
            baser: CiInfo::new(n_alpha),
            fmean: CiInfo::new(n_alpha),
            acc: CiInfo::new(n_alpha),
            fbias: CiInfo::new(n_alpha),
            pody: CiInfo::new(n_alpha),
            podn: CiInfo::new(n_alpha),
            pofd: CiInfo::new(n_alpha),
            far: CiInfo::new(n_alpha),
            csi: CiInfo::new(n_alpha),
            gss: CiInfo::new(n_alpha),
            hk: CiInfo::new(n_alpha),
            hss: CiInfo::new(n_alpha),
            odds: CiInfo::new(n_alpha),
        }
    }

    fn ci_mut(&mut self, i: usize) -> &mut CiInfo {
        match i {
            0 => &mut self.baser,
            1 => &mut self.fmean,
            2 => &mut self.acc,
            3 => &mut self.fbias,
            4 => &mut self.pody,
            5 => &mut self.podn,
            6 => &mut self.pofd,
            7 => &mut self.far,
            8 => &mut self.csi,
            9 => &mut self.gss,
            10 => &mut self.hk,
            11 => &mut self.hss,
            12 => &mut self.odds,
            _ => unreachable!("cts stat index out of range"),
        }
    }

    fn ci(&self, i: usize) -> &CiInfo {
        match i {
            0 => &self.baser,
            1 => &self.fmean,
            2 => &self.acc,
            3 => &self.fbias,
            4 => &self.pody,
            5 => &self.podn,
            6 => &self.pofd,
            7 => &self.far,
            8 => &self.csi,
            9 => &self.gss,
            10 => &self.hk,
            11 => &self.hss,
            12 => &self.odds,
            _ => unreachable!("cts stat index out of range"),
        }
    }

    /// Fills every point statistic from the stored table.
    pub fn compute_stats(&mut self) {
        let values = self.cts.all_stats();
        for (i, v) in values.into_iter().enumerate() {
            self.ci_mut(i).v = v;
        }
    }

    /// Fills the closed-form normal bounds for every alpha.
    ///
    /// Proportion-valued statistics use the Wilson interval, the odds ratio
    /// Woolf's method and the Hanssen-Kuipers discriminant its dedicated
    /// variance formula. Skill scores and frequency bias have no closed form
    /// and keep sentinel normal bounds.
    pub fn compute_normal_ci(&mut self) {
        let t = self.cts;
        let n = t.n() as usize;
        for (i, &alpha) in self.alpha.clone().iter().enumerate() {
            for stat in [0usize, 1, 2, 4, 5, 6, 7, 8] {
                let p = self.ci(stat).v;
                let (cl, cu) = compute_proportion_ci(p, alpha, n);
                let ci = self.ci_mut(stat);
                ci.v_ncl[i] = cl;
                ci.v_ncu[i] = cu;
            }
            let (cl, cu) =
                compute_hk_ci(self.hk.v, alpha, t.fy_oy, t.fy_on, t.fn_oy, t.fn_on);
            self.hk.v_ncl[i] = cl;
            self.hk.v_ncu[i] = cu;
            let (cl, cu) =
                compute_woolf_ci(self.odds.v, alpha, t.fy_oy, t.fy_on, t.fn_oy, t.fn_on);
            self.odds.v_ncl[i] = cl;
            self.odds.v_ncu[i] = cu;
        }
    }
}

/// Computes the full-sample categorical statistics and normal bounds.
pub fn compute_ctsinfo(sample: &PairedSample, index: &[usize], info: &mut CtsInfo) {
    info.cts = ContingencyTable::from_pairs(sample, index, info.fthresh, info.othresh);
    info.compute_stats();
    info.compute_normal_ci();
}

/// Computes categorical statistics with bootstrap confidence intervals.
///
/// Runs the family template: point statistics and normal bounds first, then
/// leave-one-out jackknife and `n_boot` bootstrap replicates, then a BCa or
/// percentile interval per statistic per alpha as configured. With n <= 1 or
/// a zero replicate count only the point statistics and normal bounds are
/// returned.
pub fn compute_cts_stats_ci(
    sample: &PairedSample,
    fthresh: Threshold,
    othresh: Threshold,
    config: &ResampleConfig,
    rng: &mut BootRng,
) -> VerifResult<CtsInfo> {
    validate_equal_length(&sample.fcst, &sample.obs)?;
    config.validate()?;

    let n = sample.len();
    let mut info = CtsInfo::new(fthresh, othresh, config.alpha.clone());
    compute_ctsinfo(sample, &identity_index(n), &mut info);

    if n <= 1 || config.n_boot < 1 {
        debug!("skipping categorical resampling: n={n}, n_boot={}", config.n_boot);
        return Ok(info);
    }

    let mut scratch = ReplicateScratch::new(N_CTS_STATS);
    let recompute = |index: &[usize]| {
        ContingencyTable::from_pairs(sample, index, fthresh, othresh).all_stats()
    };

    // Only BCa consumes the jackknife replicates
    if config.ci_method == CiMethod::Bca {
        jackknife(n, &mut scratch, |index, scratch| {
            for (i, v) in recompute(index).into_iter().enumerate() {
                scratch.push_jack(i, v);
            }
        });
    }

    // BCa resamples at full size; the percentile method honors m_prop
    let m = match config.ci_method {
        CiMethod::Bca => n,
        CiMethod::Percentile => config.resample_size(n),
    };
    bootstrap(rng, n, m, config.n_boot, &mut scratch, |index, scratch| {
        for (i, v) in recompute(index).into_iter().enumerate() {
            scratch.push_boot(i, v);
        }
    });

    info.fill_boot_ci(&scratch, config);
    Ok(info)
}

/// Computes categorical statistics for a list of threshold pairs.
///
/// The generator is shared across thresholds, so the draw order and hence
/// the exact bounds depend on the threshold order. One output record per
/// threshold pair, in input order.
pub fn compute_cts_stats_ci_multi(
    sample: &PairedSample,
    thresholds: &[(Threshold, Threshold)],
    config: &ResampleConfig,
    rng: &mut BootRng,
) -> VerifResult<Vec<CtsInfo>> {
    thresholds
        .iter()
        .map(|&(fthresh, othresh)| compute_cts_stats_ci(sample, fthresh, othresh, config, rng))
        .collect()
}

impl CtsInfo {
    /// Fills the bootstrap bounds for every statistic and alpha from the
    /// collected replicates, honoring the configured interval method.
    pub(crate) fn fill_boot_ci(&mut self, scratch: &ReplicateScratch, config: &ResampleConfig) {
        let alpha = self.alpha.clone();
        for stat in 0..N_CTS_STATS {
            let v = self.ci(stat).v;
            if is_bad_data(v) {
                self.ci_mut(stat).set_all_bad();
                continue;
            }
            for (i, &a) in alpha.iter().enumerate() {
                let (cl, cu) = match config.ci_method {
                    CiMethod::Bca => {
                        compute_bca_interval(v, scratch.jack(stat), scratch.boot(stat), a)
                    }
                    CiMethod::Percentile => compute_perc_interval(scratch.boot(stat), a),
                };
                let ci = self.ci_mut(stat);
                ci.v_bcl[i] = cl;
                ci.v_bcu[i] = cu;
            }
        }
    }
}
