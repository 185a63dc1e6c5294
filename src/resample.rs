//! Index resampling and replicate storage.
//!
//! The resampling drivers never materialize resampled data arrays. They draw
//! index sets and hand them to a recompute closure, so every statistic family
//! reuses its ordinary aggregation path for jackknife and bootstrap
//! replicates alike. Replicate values accumulate in memory, one growable
//! buffer per tracked sub-statistic.

use crate::math_utils::is_bad_data;
use crate::rng::BootRng;

/// Per-statistic replicate buffers for one resampling pass.
///
/// Holds one buffer for the jackknife estimates and one for the bootstrap
/// estimates of each tracked sub-statistic. Values carrying the bad-data
/// sentinel are dropped on append, so interval routines see only usable
/// replicates and judge sufficiency by the buffer lengths.
#[derive(Debug, Clone)]
pub struct ReplicateScratch {
    jack: Vec<Vec<f64>>,
    boot: Vec<Vec<f64>>,
}

impl ReplicateScratch {
    /// Creates scratch space for `n_stat` sub-statistics.
    pub fn new(n_stat: usize) -> Self {
        Self {
            jack: vec![Vec::new(); n_stat],
            boot: vec![Vec::new(); n_stat],
        }
    }

    /// Appends a jackknife replicate for statistic `i`, skipping bad values.
    #[inline]
    pub fn push_jack(&mut self, i: usize, v: f64) {
        if !is_bad_data(v) {
            self.jack[i].push(v);
        }
    }

    /// Appends a bootstrap replicate for statistic `i`, skipping bad values.
    #[inline]
    pub fn push_boot(&mut self, i: usize, v: f64) {
        if !is_bad_data(v) {
            self.boot[i].push(v);
        }
    }

    /// Jackknife replicates collected for statistic `i`.
    pub fn jack(&self, i: usize) -> &[f64] {
        &self.jack[i]
    }

    /// Bootstrap replicates collected for statistic `i`.
    pub fn boot(&self, i: usize) -> &[f64] {
        &self.boot[i]
    }

    /// Number of tracked sub-statistics.
    pub fn n_stat(&self) -> usize {
        self.jack.len()
    }
}

/// Fills `index` with `m` indices drawn uniformly with replacement from 0..n.
///
/// The buffer is cleared and refilled in place so a single allocation serves
/// the whole bootstrap loop.
pub fn resample_indices(rng: &mut BootRng, n: usize, m: usize, index: &mut Vec<usize>) {
    index.clear();
    index.reserve(m);
    for _ in 0..m {
        index.push(rng.index(n));
    }
}

/// Runs the n leave-one-out jackknife iterations.
///
/// For each omitted position the closure receives the n-1 surviving indices
/// and appends its replicate values to the scratch buffers.
pub fn jackknife<F>(n: usize, scratch: &mut ReplicateScratch, mut recompute: F)
where
    F: FnMut(&[usize], &mut ReplicateScratch),
{
    let mut index = Vec::with_capacity(n.saturating_sub(1));
    for omit in 0..n {
        index.clear();
        index.extend((0..n).filter(|&i| i != omit));
        recompute(&index, scratch);
    }
}

/// Runs `n_boot` bootstrap iterations drawing `m` indices with replacement.
pub fn bootstrap<F>(
    rng: &mut BootRng,
    n: usize,
    m: usize,
    n_boot: usize,
    scratch: &mut ReplicateScratch,
    mut recompute: F,
) where
    F: FnMut(&[usize], &mut ReplicateScratch),
{
    let mut index = Vec::with_capacity(m);
    for _ in 0..n_boot {
        resample_indices(rng, n, m, &mut index);
        recompute(&index, scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math_utils::BAD_DATA;

    #[test]
    fn test_scratch_drops_bad_values() {
        let mut s = ReplicateScratch::new(2);
        s.push_jack(0, 1.0);
        s.push_jack(0, BAD_DATA);
        s.push_boot(1, f64::NAN);
        s.push_boot(1, 2.0);
        assert_eq!(s.jack(0), &[1.0]);
        assert!(s.jack(1).is_empty());
        assert_eq!(s.boot(1), &[2.0]);
    }

    #[test]
    fn test_resample_indices_in_range() {
        let mut rng = BootRng::with_seed(7);
        let mut index = Vec::new();
        resample_indices(&mut rng, 5, 12, &mut index);
        assert_eq!(index.len(), 12);
        assert!(index.iter().all(|&i| i < 5));
    }

    #[test]
    fn test_jackknife_visits_each_omission_once() {
        let mut s = ReplicateScratch::new(1);
        let mut seen = Vec::new();
        jackknife(4, &mut s, |idx, scratch| {
            assert_eq!(idx.len(), 3);
            let omitted: usize = (0..4).sum::<usize>() - idx.iter().sum::<usize>();
            seen.push(omitted);
            scratch.push_jack(0, omitted as f64);
        });
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(s.jack(0).len(), 4);
    }

    #[test]
    fn test_bootstrap_iteration_count() {
        let mut rng = BootRng::with_seed(11);
        let mut s = ReplicateScratch::new(1);
        let mut calls = 0;
        bootstrap(&mut rng, 6, 6, 25, &mut s, |idx, scratch| {
            assert_eq!(idx.len(), 6);
            calls += 1;
            scratch.push_boot(0, idx[0] as f64);
        });
        assert_eq!(calls, 25);
        assert_eq!(s.boot(0).len(), 25);
    }

    #[test]
    fn test_bootstrap_reproducible_by_seed() {
        let run = |seed| {
            let mut rng = BootRng::with_seed(seed);
            let mut out = Vec::new();
            let mut s = ReplicateScratch::new(1);
            bootstrap(&mut rng, 8, 8, 10, &mut s, |idx, _| out.extend_from_slice(idx));
            out
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }
}
