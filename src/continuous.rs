//! Continuous statistics with confidence intervals.
//!
//! Nineteen statistics summarize raw forecast/observation pairs: means and
//! standard deviations of each side, three correlation measures, the error
//! moments and five error percentiles. Optional per-pair weights enter the
//! partial sums; the rank correlations ignore weights and are point-only,
//! so their bootstrap bounds stay at the bad-data sentinel.

use log::debug;
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

use crate::config::{CiMethod, ResampleConfig};
use crate::errors::{validate_equal_length, VerifResult};
use crate::intervals::{compute_bca_interval, compute_perc_interval, CiInfo};
use crate::math_utils::{
    is_bad_data, normal_cdf_inv, percentile, rank_values, sort_values, BAD_DATA,
};
use crate::resample::{bootstrap, jackknife, ReplicateScratch};
use crate::rng::BootRng;
use crate::sample::{identity_index, PairedSample};

/// Number of continuous sub-statistics tracked per sample.
pub const N_CNT_STATS: usize = 19;

// Rank correlations are recomputed for the full sample only
const SP_CORR_IDX: usize = 5;
const KT_CORR_IDX: usize = 6;

/// Continuous statistics for one sample, with all bounds.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CntInfo {
    /// Confidence levels the bound arrays are indexed by
    pub alpha: Vec<f64>,
    /// Number of pairs that entered the sums
    pub n_pair: usize,
    pub fbar: CiInfo,
    pub fstdev: CiInfo,
    pub obar: CiInfo,
    pub ostdev: CiInfo,
    pub pr_corr: CiInfo,
    pub sp_corr: CiInfo,
    pub kt_corr: CiInfo,
    pub me: CiInfo,
    pub estdev: CiInfo,
    pub mbias: CiInfo,
    pub mae: CiInfo,
    pub mse: CiInfo,
    pub bcmse: CiInfo,
    pub rmse: CiInfo,
    pub e10: CiInfo,
    pub e25: CiInfo,
    pub e50: CiInfo,
    pub e75: CiInfo,
    pub e90: CiInfo,
}

impl CntInfo {
    /// Creates an empty record for the given alpha list.
    pub fn new(alpha: Vec<f64>) -> Self {
        let n_alpha = alpha.len();
        let ci = || CiInfo::new(n_alpha);
        Self {
            alpha,
            n_pair: 0,
            fbar: ci(),
            fstdev: ci(),
            obar: ci(),
            ostdev: ci(),
            pr_corr: ci(),
            sp_corr: ci(),
            kt_corr: ci(),
            me: ci(),
            estdev: ci(),
            mbias: ci(),
            mae: ci(),
            mse: ci(),
            bcmse: ci(),
            rmse: ci(),
            e10: ci(),
            e25: ci(),
            e50: ci(),
            e75: ci(),
            e90: ci(),
        }
    }

    fn ci_mut(&mut self, i: usize) -> &mut CiInfo {
        match i {
            0 => &mut self.fbar,
            1 => &mut self.fstdev,
            2 => &mut self.obar,
            3 => &mut self.ostdev,
            4 => &mut self.pr_corr,
            5 => &mut self.sp_corr,
            6 => &mut self.kt_corr,
            7 => &mut self.me,
            8 => &mut self.estdev,
            9 => &mut self.mbias,
            10 => &mut self.mae,
            11 => &mut self.mse,
            12 => &mut self.bcmse,
            13 => &mut self.rmse,
            14 => &mut self.e10,
            15 => &mut self.e25,
            16 => &mut self.e50,
            17 => &mut self.e75,
            18 => &mut self.e90,
            _ => unreachable!("cnt stat index out of range"),
        }
    }

    fn ci(&self, i: usize) -> &CiInfo {
        match i {
            0 => &self.fbar,
            1 => &self.fstdev,
            2 => &self.obar,
            3 => &self.ostdev,
            4 => &self.pr_corr,
            5 => &self.sp_corr,
            6 => &self.kt_corr,
            7 => &self.me,
            8 => &self.estdev,
            9 => &self.mbias,
            10 => &self.mae,
            11 => &self.mse,
            12 => &self.bcmse,
            13 => &self.rmse,
            14 => &self.e10,
            15 => &self.e25,
            16 => &self.e50,
            17 => &self.e75,
            18 => &self.e90,
            _ => unreachable!("cnt stat index out of range"),
        }
    }
}

fn weighted_stdev(w: f64, sum: f64, sum_sq: f64) -> f64 {
    if w <= 1.0 {
        return BAD_DATA;
    }
    let var = (w * sum_sq - sum * sum) / (w * (w - 1.0));
    if var < 0.0 {
        0.0
    } else {
        var.sqrt()
    }
}

fn pearson_from_sums(w: f64, sf: f64, so: f64, sff: f64, soo: f64, sfo: f64) -> f64 {
    if w <= 1.0 {
        return BAD_DATA;
    }
    let num = w * sfo - sf * so;
    let den = ((w * sff - sf * sf) * (w * soo - so * so)).sqrt();
    if den == 0.0 || !den.is_finite() {
        return BAD_DATA;
    }
    (num / den).clamp(-1.0, 1.0)
}

fn spearman_corr(fcst: &[f64], obs: &[f64]) -> f64 {
    let n = fcst.len();
    if n < 2 {
        return BAD_DATA;
    }
    let fr = rank_values(fcst);
    let or = rank_values(obs);
    let nf = n as f64;
    let (mut sf, mut so, mut sff, mut soo, mut sfo) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for i in 0..n {
        sf += fr[i];
        so += or[i];
        sff += fr[i] * fr[i];
        soo += or[i] * or[i];
        sfo += fr[i] * or[i];
    }
    pearson_from_sums(nf, sf, so, sff, soo, sfo)
}

fn kendall_corr(fcst: &[f64], obs: &[f64]) -> f64 {
    let n = fcst.len();
    if n < 2 {
        return BAD_DATA;
    }
    let mut concordant = 0i64;
    let mut discordant = 0i64;
    let mut ties_f = 0i64;
    let mut ties_o = 0i64;
    for i in 0..n {
        for j in i + 1..n {
            let df = fcst[i] - fcst[j];
            let dobs = obs[i] - obs[j];
            if df == 0.0 && dobs == 0.0 {
                continue;
            } else if df == 0.0 {
                ties_f += 1;
            } else if dobs == 0.0 {
                ties_o += 1;
            } else if (df > 0.0) == (dobs > 0.0) {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }
    let d1 = (concordant + discordant + ties_f) as f64;
    let d2 = (concordant + discordant + ties_o) as f64;
    let den = (d1 * d2).sqrt();
    if den == 0.0 {
        return BAD_DATA;
    }
    (((concordant - discordant) as f64) / den).clamp(-1.0, 1.0)
}

/// Computes all nineteen statistics for the indexed subset of a sample.
///
/// Rank correlations are computed only when `rank_flag` is set; otherwise
/// their slots carry the bad-data sentinel.
fn cnt_stat_values(
    sample: &PairedSample,
    index: &[usize],
    rank_flag: bool,
) -> ([f64; N_CNT_STATS], usize) {
    let mut w_sum = 0.0;
    let (mut sf, mut so, mut sff, mut soo, mut sfo) = (0.0, 0.0, 0.0, 0.0, 0.0);
    let (mut se, mut see, mut sae) = (0.0, 0.0, 0.0);
    let mut err = Vec::new();
    let mut fcst = Vec::new();
    let mut obs = Vec::new();
    let mut n_pair = 0usize;

    for &i in index {
        if sample.is_pair_bad(i) {
            continue;
        }
        let w = sample.weight_at(i);
        let f = sample.fcst[i];
        let o = sample.obs[i];
        let e = f - o;
        w_sum += w;
        sf += w * f;
        so += w * o;
        sff += w * f * f;
        soo += w * o * o;
        sfo += w * f * o;
        se += w * e;
        see += w * e * e;
        sae += w * e.abs();
        err.push(e);
        if rank_flag {
            fcst.push(f);
            obs.push(o);
        }
        n_pair += 1;
    }

    let mut out = [BAD_DATA; N_CNT_STATS];
    if w_sum == 0.0 {
        return (out, 0);
    }

    let fbar = sf / w_sum;
    let obar = so / w_sum;
    let me = se / w_sum;
    let mse = see / w_sum;

    out[0] = fbar;
    out[1] = weighted_stdev(w_sum, sf, sff);
    out[2] = obar;
    out[3] = weighted_stdev(w_sum, so, soo);
    out[4] = pearson_from_sums(w_sum, sf, so, sff, soo, sfo);
    if rank_flag {
        out[SP_CORR_IDX] = spearman_corr(&fcst, &obs);
        out[KT_CORR_IDX] = kendall_corr(&fcst, &obs);
    }
    out[7] = me;
    out[8] = weighted_stdev(w_sum, se, see);
    out[9] = if obar == 0.0 { BAD_DATA } else { fbar / obar };
    out[10] = sae / w_sum;
    out[11] = mse;
    out[12] = (mse - me * me).max(0.0);
    out[13] = mse.sqrt();

    sort_values(&mut err);
    out[14] = percentile(&err, 0.10);
    out[15] = percentile(&err, 0.25);
    out[16] = percentile(&err, 0.50);
    out[17] = percentile(&err, 0.75);
    out[18] = percentile(&err, 0.90);

    (out, n_pair)
}

/// Fisher-z interval for a correlation coefficient.
///
/// Transforms r to atanh(r), applies a normal interval with standard error
/// `1/sqrt(n-3)` and maps back through tanh. Undefined for n <= 3 or |r| = 1.
fn fisher_z_ci(r: f64, alpha: f64, n: usize) -> (f64, f64) {
    if is_bad_data(r) || n <= 3 || r.abs() >= 1.0 {
        return (BAD_DATA, BAD_DATA);
    }
    let z = r.atanh();
    let se = 1.0 / ((n - 3) as f64).sqrt();
    let cv = normal_cdf_inv(1.0 - alpha / 2.0, 0.0, 1.0);
    ((z - cv * se).tanh(), (z + cv * se).tanh())
}

/// Chi-square pivot interval for a standard deviation with n-1 degrees of
/// freedom.
fn stdev_chi_sq_ci(stdev: f64, alpha: f64, n: usize) -> (f64, f64) {
    if is_bad_data(stdev) || n <= 1 {
        return (BAD_DATA, BAD_DATA);
    }
    let df = (n - 1) as f64;
    let chi_sq = match ChiSquared::new(df) {
        Ok(d) => d,
        Err(_) => return (BAD_DATA, BAD_DATA),
    };
    let chi_lo = chi_sq.inverse_cdf(alpha / 2.0);
    let chi_hi = chi_sq.inverse_cdf(1.0 - alpha / 2.0);
    if chi_lo <= 0.0 || chi_hi <= 0.0 {
        return (BAD_DATA, BAD_DATA);
    }
    (stdev * (df / chi_hi).sqrt(), stdev * (df / chi_lo).sqrt())
}

/// Student-t pivot interval for a mean whose sample standard deviation is
/// `stdev`, with n-1 degrees of freedom.
fn mean_t_ci(mean: f64, stdev: f64, alpha: f64, n: usize) -> (f64, f64) {
    if is_bad_data(mean) || is_bad_data(stdev) || n <= 1 {
        return (BAD_DATA, BAD_DATA);
    }
    let df = (n - 1) as f64;
    let student = match StudentsT::new(0.0, 1.0, df) {
        Ok(d) => d,
        Err(_) => return (BAD_DATA, BAD_DATA),
    };
    let half = student.inverse_cdf(1.0 - alpha / 2.0) * stdev / (n as f64).sqrt();
    (mean - half, mean + half)
}

// The three standard deviations carrying chi-square normal bounds
const STDEV_STAT_IDX: [usize; 3] = [1, 3, 8];

// Each mean paired with the standard deviation feeding its t pivot
const MEAN_STAT_IDX: [(usize, usize); 3] = [(0, 1), (2, 3), (7, 8)];

fn fill_normal_ci(info: &mut CntInfo) {
    let n = info.n_pair;
    let alpha = info.alpha.clone();
    for (i, &a) in alpha.iter().enumerate() {
        let (cl, cu) = fisher_z_ci(info.pr_corr.v, a, n);
        info.pr_corr.v_ncl[i] = cl;
        info.pr_corr.v_ncu[i] = cu;
        for stat in STDEV_STAT_IDX {
            let (cl, cu) = stdev_chi_sq_ci(info.ci(stat).v, a, n);
            let ci = info.ci_mut(stat);
            ci.v_ncl[i] = cl;
            ci.v_ncu[i] = cu;
        }
        for (mean_stat, stdev_stat) in MEAN_STAT_IDX {
            let (cl, cu) = mean_t_ci(info.ci(mean_stat).v, info.ci(stdev_stat).v, a, n);
            let ci = info.ci_mut(mean_stat);
            ci.v_ncl[i] = cl;
            ci.v_ncu[i] = cu;
        }
    }
}

/// Computes continuous statistics with bootstrap confidence intervals.
///
/// Follows the family template: point statistics first, then jackknife and
/// bootstrap replicates and a BCa or percentile interval per statistic per
/// alpha. The rank correlations never enter the resampling loop, so their
/// bootstrap bounds stay at the sentinel. Short-circuits to point values
/// when n <= 1 or the replicate count is zero.
pub fn compute_cnt_stats_ci(
    sample: &PairedSample,
    rank_flag: bool,
    config: &ResampleConfig,
    rng: &mut BootRng,
) -> VerifResult<CntInfo> {
    validate_equal_length(&sample.fcst, &sample.obs)?;
    config.validate()?;

    let n = sample.len();
    let mut info = CntInfo::new(config.alpha.clone());
    let (values, n_pair) = cnt_stat_values(sample, &identity_index(n), rank_flag);
    info.n_pair = n_pair;
    for (i, v) in values.into_iter().enumerate() {
        info.ci_mut(i).v = v;
    }
    fill_normal_ci(&mut info);

    if n <= 1 || config.n_boot < 1 {
        debug!("skipping continuous resampling: n={n}, n_boot={}", config.n_boot);
        return Ok(info);
    }

    let mut scratch = ReplicateScratch::new(N_CNT_STATS);
    let push_all = |values: [f64; N_CNT_STATS],
                    scratch: &mut ReplicateScratch,
                    jack: bool| {
        for (i, v) in values.into_iter().enumerate() {
            if i == SP_CORR_IDX || i == KT_CORR_IDX {
                continue;
            }
            if jack {
                scratch.push_jack(i, v);
            } else {
                scratch.push_boot(i, v);
            }
        }
    };

    // Only BCa consumes the jackknife replicates
    if config.ci_method == CiMethod::Bca {
        jackknife(n, &mut scratch, |index, scratch| {
            let (values, _) = cnt_stat_values(sample, index, false);
            push_all(values, scratch, true);
        });
    }

    let m = match config.ci_method {
        CiMethod::Bca => n,
        CiMethod::Percentile => config.resample_size(n),
    };
    bootstrap(rng, n, m, config.n_boot, &mut scratch, |index, scratch| {
        let (values, _) = cnt_stat_values(sample, index, false);
        push_all(values, scratch, false);
    });

    let alpha = config.alpha.clone();
    for stat in 0..N_CNT_STATS {
        if stat == SP_CORR_IDX || stat == KT_CORR_IDX {
            continue;
        }
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

    for stat in 0..N_CNT_STATS {
        if is_bad_data(info.ci(stat).v) {
            info.ci_mut(stat).set_all_bad();
        }
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn linear_sample() -> PairedSample {
        let obs: Vec<f64> = (1..=20).map(f64::from).collect();
        let fcst: Vec<f64> = obs.iter().map(|o| o + 1.0).collect();
        PairedSample::new(fcst, obs).unwrap()
    }

    #[test]
    fn test_point_stats_constant_offset() {
        let sample = linear_sample();
        let (v, n_pair) = cnt_stat_values(&sample, &identity_index(20), true);
        assert_eq!(n_pair, 20);
        assert_approx_eq!(v[0], 11.5, 1e-12); // fbar
        assert_approx_eq!(v[2], 10.5, 1e-12); // obar
        assert_approx_eq!(v[4], 1.0, 1e-12); // pr_corr
        assert_approx_eq!(v[5], 1.0, 1e-12); // sp_corr
        assert_approx_eq!(v[6], 1.0, 1e-12); // kt_corr
        assert_approx_eq!(v[7], 1.0, 1e-12); // me
        assert_approx_eq!(v[8], 0.0, 1e-9); // estdev
        assert_approx_eq!(v[10], 1.0, 1e-12); // mae
        assert_approx_eq!(v[11], 1.0, 1e-12); // mse
        assert_approx_eq!(v[12], 0.0, 1e-9); // bcmse
        assert_approx_eq!(v[13], 1.0, 1e-12); // rmse
        assert_approx_eq!(v[16], 1.0, 1e-12); // median error
    }

    #[test]
    fn test_anticorrelated_pairs() {
        let obs: Vec<f64> = (1..=10).map(f64::from).collect();
        let fcst: Vec<f64> = obs.iter().map(|o| 11.0 - o).collect();
        let sample = PairedSample::new(fcst, obs).unwrap();
        let (v, _) = cnt_stat_values(&sample, &identity_index(10), true);
        assert_approx_eq!(v[4], -1.0, 1e-12);
        assert_approx_eq!(v[5], -1.0, 1e-12);
        assert_approx_eq!(v[6], -1.0, 1e-12);
    }

    #[test]
    fn test_bad_pairs_excluded_from_sums() {
        let sample = PairedSample::new(
            vec![2.0, BAD_DATA, 4.0],
            vec![1.0, 5.0, 3.0],
        )
        .unwrap();
        let (v, n_pair) = cnt_stat_values(&sample, &identity_index(3), false);
        assert_eq!(n_pair, 2);
        assert_approx_eq!(v[0], 3.0, 1e-12);
        assert_approx_eq!(v[7], 1.0, 1e-12);
    }

    #[test]
    fn test_all_bad_sample() {
        let sample = PairedSample::new(vec![BAD_DATA; 3], vec![1.0, 2.0, 3.0]).unwrap();
        let (v, n_pair) = cnt_stat_values(&sample, &identity_index(3), true);
        assert_eq!(n_pair, 0);
        assert!(v.iter().all(|&x| is_bad_data(x)));
    }

    #[test]
    fn test_weights_shift_means() {
        let sample = PairedSample::new(vec![0.0, 10.0], vec![0.0, 10.0])
            .unwrap()
            .with_weights(vec![3.0, 1.0])
            .unwrap();
        let (v, _) = cnt_stat_values(&sample, &identity_index(2), false);
        assert_approx_eq!(v[0], 2.5, 1e-12);
        assert_approx_eq!(v[2], 2.5, 1e-12);
    }

    #[test]
    fn test_rank_stats_never_bootstrapped() {
        let obs: Vec<f64> = (0..30).map(|i| (i as f64 * 0.7).sin()).collect();
        let fcst: Vec<f64> = obs.iter().map(|o| o * 0.9 + 0.1).collect();
        let sample = PairedSample::new(fcst, obs).unwrap();
        let config = ResampleConfig {
            n_boot: 100,
            ..ResampleConfig::default()
        };
        let mut rng = BootRng::with_seed(5);
        let info = compute_cnt_stats_ci(&sample, true, &config, &mut rng).unwrap();
        assert!(!is_bad_data(info.sp_corr.v));
        assert!(!is_bad_data(info.kt_corr.v));
        assert!(is_bad_data(info.sp_corr.v_bcl[0]));
        assert!(is_bad_data(info.kt_corr.v_bcu[0]));
        // Bootstrapped stats carry ordered bounds
        assert!(!is_bad_data(info.me.v_bcl[0]));
        assert!(info.me.v_bcl[0] <= info.me.v_bcu[0]);
    }

    #[test]
    fn test_fisher_z_bounds_bracket_correlation() {
        assert_eq!(fisher_z_ci(1.0, 0.05, 50), (BAD_DATA, BAD_DATA));
        assert_eq!(fisher_z_ci(0.5, 0.05, 3), (BAD_DATA, BAD_DATA));
        let (cl, cu) = fisher_z_ci(0.6, 0.05, 50);
        assert!(cl < 0.6 && cu > 0.6);
        assert!(cl > -1.0 && cu < 1.0);
    }

    #[test]
    fn test_closed_form_bounds_filled_for_imperfect_forecast() {
        let obs: Vec<f64> = (0..40).map(|i| (i as f64 * 0.37).sin() * 3.0).collect();
        let fcst: Vec<f64> = obs
            .iter()
            .enumerate()
            .map(|(i, o)| o * 0.8 + ((i * 7) % 5) as f64 * 0.3)
            .collect();
        let sample = PairedSample::new(fcst, obs).unwrap();
        let config = ResampleConfig {
            n_boot: 0,
            ..ResampleConfig::default()
        };
        let mut rng = BootRng::with_seed(2);
        let info = compute_cnt_stats_ci(&sample, false, &config, &mut rng).unwrap();
        assert!(!is_bad_data(info.pr_corr.v_ncl[0]));
        assert!(info.pr_corr.v_ncl[0] < info.pr_corr.v);
        assert!(info.pr_corr.v_ncu[0] > info.pr_corr.v);
        assert!(info.fstdev.v_ncl[0] < info.fstdev.v);
        assert!(info.fstdev.v_ncu[0] > info.fstdev.v);
        assert!(!is_bad_data(info.estdev.v_ncl[0]));
    }

    #[test]
    fn test_mean_bounds_use_t_pivot() {
        let obs: Vec<f64> = (1..=25).map(f64::from).collect();
        let fcst: Vec<f64> = obs.iter().map(|o| o * 1.1 + 0.5).collect();
        let sample = PairedSample::new(fcst, obs).unwrap();
        let config = ResampleConfig {
            n_boot: 0,
            ..ResampleConfig::default()
        };
        let mut rng = BootRng::with_seed(3);
        let info = compute_cnt_stats_ci(&sample, false, &config, &mut rng).unwrap();

        let student = StudentsT::new(0.0, 1.0, 24.0).unwrap();
        let half = student.inverse_cdf(0.975) * info.fstdev.v / 25f64.sqrt();
        assert_approx_eq!(info.fbar.v_ncl[0], info.fbar.v - half, 1e-10);
        assert_approx_eq!(info.fbar.v_ncu[0], info.fbar.v + half, 1e-10);
        assert!(info.obar.v_ncl[0] < info.obar.v && info.obar.v_ncu[0] > info.obar.v);
        assert!(info.me.v_ncl[0] < info.me.v && info.me.v_ncu[0] > info.me.v);
    }

    #[test]
    fn test_short_circuit_single_pair() {
        let sample = PairedSample::new(vec![1.0], vec![2.0]).unwrap();
        let mut rng = BootRng::with_seed(1);
        let info =
            compute_cnt_stats_ci(&sample, false, &ResampleConfig::default(), &mut rng).unwrap();
        assert_approx_eq!(info.me.v, -1.0, 1e-12);
        assert!(is_bad_data(info.me.v_bcl[0]));
        assert!(is_bad_data(info.fstdev.v));
    }
}
