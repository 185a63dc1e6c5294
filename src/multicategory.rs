//! Multi-category (NxN) contingency statistics with confidence intervals.
//!
//! Pairs carry category indices rather than raw values; they are counted
//! into an NxN table (forecast category by observed category) and summarized
//! by accuracy, the Hanssen-Kuipers discriminant, the Heidke skill score and
//! the Gerrity skill score. All four receive bootstrap bounds; none has a
//! closed-form normal interval.

use log::debug;

use crate::config::{CiMethod, ResampleConfig};
use crate::errors::{validate_equal_length, VerifError, VerifResult};
use crate::intervals::{compute_bca_interval, compute_perc_interval, CiInfo};
use crate::math_utils::{is_bad_data, BAD_DATA};
use crate::resample::{bootstrap, jackknife, ReplicateScratch};
use crate::rng::BootRng;
use crate::sample::{identity_index, PairedSample};

/// Number of multi-category sub-statistics tracked per table.
pub const N_MCTS_STATS: usize = 4;

/// An NxN forecast/observation contingency table.
///
/// Counts are stored row-major with the forecast category selecting the row
/// and the observed category the column.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MctsTable {
    n_cat: usize,
    count: Vec<u64>,
}

impl MctsTable {
    /// Creates an empty table with `n_cat` categories per side.
    pub fn new(n_cat: usize) -> Self {
        Self {
            n_cat,
            count: vec![0; n_cat * n_cat],
        }
    }

    /// Counts the indexed pairs into a table. Pair values are category
    /// indices; values that are missing, non-integral after rounding
    /// tolerance, or outside 0..n_cat are skipped.
    pub fn from_pairs(sample: &PairedSample, index: &[usize], n_cat: usize) -> Self {
        let mut table = Self::new(n_cat);
        for &i in index {
            if sample.is_pair_bad(i) {
                continue;
            }
            let f = sample.fcst[i].round();
            let o = sample.obs[i].round();
            if f < 0.0 || o < 0.0 {
                continue;
            }
            let (f, o) = (f as usize, o as usize);
            if f >= n_cat || o >= n_cat {
                continue;
            }
            table.count[f * n_cat + o] += 1;
        }
        table
    }

    /// Number of categories per side.
    pub fn n_cat(&self) -> usize {
        self.n_cat
    }

    /// Count in forecast category `f`, observed category `o`.
    pub fn entry(&self, f: usize, o: usize) -> u64 {
        self.count[f * self.n_cat + o]
    }

    /// Total pair count.
    pub fn n(&self) -> u64 {
        self.count.iter().sum()
    }

    fn row_sum(&self, f: usize) -> u64 {
        (0..self.n_cat).map(|o| self.entry(f, o)).sum()
    }

    fn col_sum(&self, o: usize) -> u64 {
        (0..self.n_cat).map(|f| self.entry(f, o)).sum()
    }

    /// Accuracy: fraction of pairs on the diagonal.
    pub fn acc(&self) -> f64 {
        let n = self.n();
        if n == 0 {
            return BAD_DATA;
        }
        let diag: u64 = (0..self.n_cat).map(|i| self.entry(i, i)).sum();
        diag as f64 / n as f64
    }

    /// Hanssen-Kuipers discriminant generalized to N categories.
    pub fn hk(&self) -> f64 {
        let n = self.n() as f64;
        if n == 0.0 {
            return BAD_DATA;
        }
        let mut diag = 0.0;
        let mut marg = 0.0;
        let mut obs2 = 0.0;
        for i in 0..self.n_cat {
            diag += self.entry(i, i) as f64 / n;
            let pf = self.row_sum(i) as f64 / n;
            let po = self.col_sum(i) as f64 / n;
            marg += pf * po;
            obs2 += po * po;
        }
        let den = 1.0 - obs2;
        if den == 0.0 {
            BAD_DATA
        } else {
            (diag - marg) / den
        }
    }

    /// Heidke skill score generalized to N categories.
    pub fn hss(&self) -> f64 {
        let n = self.n() as f64;
        if n == 0.0 {
            return BAD_DATA;
        }
        let mut diag = 0.0;
        let mut marg = 0.0;
        for i in 0..self.n_cat {
            diag += self.entry(i, i) as f64 / n;
            marg += (self.row_sum(i) as f64 / n) * (self.col_sum(i) as f64 / n);
        }
        let den = 1.0 - marg;
        if den == 0.0 {
            BAD_DATA
        } else {
            (diag - marg) / den
        }
    }

    /// Gerrity skill score.
    ///
    /// The scoring matrix is built from the observed marginal distribution:
    /// each cumulative observed probability yields an odds ratio, diagonal
    /// rewards sum the ratios and their reciprocals, and off-diagonal
    /// penalties subtract one per category of separation. Undefined when any
    /// cumulative observed probability is 0 or 1, or with fewer than two
    /// categories.
    pub fn gerrity(&self) -> f64 {
        let k = self.n_cat;
        let n = self.n() as f64;
        if k < 2 || n == 0.0 {
            return BAD_DATA;
        }

        // Odds ratios of the cumulative observed marginals
        let mut a = Vec::with_capacity(k - 1);
        let mut cum = 0.0;
        for r in 0..k - 1 {
            cum += self.col_sum(r) as f64 / n;
            if cum <= 0.0 || cum >= 1.0 {
                return BAD_DATA;
            }
            a.push((1.0 - cum) / cum);
        }

        let b = 1.0 / (k as f64 - 1.0);
        let mut score = 0.0;
        for i in 0..k {
            for j in 0..k {
                let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
                let recip: f64 = a[..lo].iter().map(|x| 1.0 / x).sum();
                let tail: f64 = a[hi..].iter().sum();
                let s = b * (recip - (hi - lo) as f64 + tail);
                score += (self.entry(i, j) as f64 / n) * s;
            }
        }
        score
    }

    /// All four statistics in their fixed tracking order.
    pub fn all_stats(&self) -> [f64; N_MCTS_STATS] {
        [self.acc(), self.hk(), self.hss(), self.gerrity()]
    }
}

/// Multi-category statistics for one category count, with all bounds.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MctsInfo {
    /// Confidence levels the bound arrays are indexed by
    pub alpha: Vec<f64>,
    /// Full-sample contingency table
    pub cts: MctsTable,
    pub acc: CiInfo,
    pub hk: CiInfo,
    pub hss: CiInfo,
    pub ger: CiInfo,
}

impl MctsInfo {
    /// Creates an empty record for `n_cat` categories and the alpha list.
    pub fn new(n_cat: usize, alpha: Vec<f64>) -> Self {
        let n_alpha = alpha.len();
        Self {
            alpha,
            cts: MctsTable::new(n_cat),
            acc: CiInfo::new(n_alpha),
            hk: CiInfo::new(n_alpha),
            hss: CiInfo::new(n_alpha),
            ger: CiInfo::new(n_alpha),
        }
    }

    fn ci_mut(&mut self, i: usize) -> &mut CiInfo {
        match i {
            0 => &mut self.acc,
            1 => &mut self.hk,
            2 => &mut self.hss,
            3 => &mut self.ger,
            _ => unreachable!("mcts stat index out of range"),
        }
    }

    fn ci(&self, i: usize) -> &CiInfo {
        match i {
            0 => &self.acc,
            1 => &self.hk,
            2 => &self.hss,
            3 => &self.ger,
            _ => unreachable!("mcts stat index out of range"),
        }
    }

    /// Fills every point statistic from the stored table.
    pub fn compute_stats(&mut self) {
        let values = self.cts.all_stats();
        for (i, v) in values.into_iter().enumerate() {
            self.ci_mut(i).v = v;
        }
    }
}

/// Computes multi-category statistics with bootstrap confidence intervals.
///
/// Follows the family template: point statistics, then jackknife and
/// bootstrap replicates, then BCa or percentile bounds per statistic per
/// alpha. Short-circuits to point values when n <= 1 or the replicate count
/// is zero.
pub fn compute_mcts_stats_ci(
    sample: &PairedSample,
    n_cat: usize,
    config: &ResampleConfig,
    rng: &mut BootRng,
) -> VerifResult<MctsInfo> {
    validate_equal_length(&sample.fcst, &sample.obs)?;
    config.validate()?;
    if n_cat < 2 {
        return Err(VerifError::InvalidParameter {
            parameter: "n_cat".to_string(),
            value: n_cat as f64,
            constraint: "must be at least 2".to_string(),
        });
    }

    let n = sample.len();
    let mut info = MctsInfo::new(n_cat, config.alpha.clone());
    info.cts = MctsTable::from_pairs(sample, &identity_index(n), n_cat);
    info.compute_stats();

    if n <= 1 || config.n_boot < 1 {
        debug!("skipping multi-category resampling: n={n}, n_boot={}", config.n_boot);
        return Ok(info);
    }

    let mut scratch = ReplicateScratch::new(N_MCTS_STATS);
    let recompute =
        |index: &[usize]| MctsTable::from_pairs(sample, index, n_cat).all_stats();

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

    let alpha = config.alpha.clone();
    for stat in 0..N_MCTS_STATS {
        let v = info.ci(stat).v;
        for (i, &a) in alpha.iter().enumerate() {
            let (cl, cu) = match config.ci_method {
                CiMethod::Bca => {
                    compute_bca_interval(v, scratch.jack(stat), scratch.boot(stat), a)
                }
                CiMethod::Percentile => compute_perc_interval(scratch.boot(stat), a),
            };
            let ci = info.ci_mut(stat);
            ci.v_bcl[i] = cl;
            ci.v_bcu[i] = cu;
        }
    }

    // Bad point values carry through to every bound
    for stat in 0..N_MCTS_STATS {
        if is_bad_data(info.ci(stat).v) {
            info.ci_mut(stat).set_all_bad();
        }
    }

    Ok(info)
}
