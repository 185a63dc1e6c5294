//! Paired forecast/observation samples.

use crate::errors::{VerifError, VerifResult};
use crate::math_utils::is_bad_data;

/// One matched set of forecast and observation values.
///
/// All sequences share the same length n. Values carrying the bad-data
/// sentinel are excluded from every aggregation. The sample is read-only to
/// the statistics engine; aggregates are recomputed from it in full for every
/// jackknife and bootstrap iteration.
#[derive(Debug, Clone, Default)]
pub struct PairedSample {
    /// Forecast values
    pub fcst: Vec<f64>,
    /// Observation values
    pub obs: Vec<f64>,
    /// Optional per-pair weights. Equal weighting when absent. Consumed by
    /// the continuous partial sums; categorical counts stay unweighted.
    pub weight: Option<Vec<f64>>,
}

impl PairedSample {
    /// Builds a sample from paired forecast and observation arrays.
    pub fn new(fcst: Vec<f64>, obs: Vec<f64>) -> VerifResult<Self> {
        if fcst.len() != obs.len() {
            return Err(VerifError::LengthMismatch {
                fcst: fcst.len(),
                obs: obs.len(),
            });
        }
        Ok(Self {
            fcst,
            obs,
            weight: None,
        })
    }

    /// Attaches per-pair weights, which must match the pair count.
    pub fn with_weights(mut self, weight: Vec<f64>) -> VerifResult<Self> {
        if weight.len() != self.fcst.len() {
            return Err(VerifError::LengthMismatch {
                fcst: self.fcst.len(),
                obs: weight.len(),
            });
        }
        self.weight = Some(weight);
        Ok(self)
    }

    /// Number of pairs, including pairs with missing values.
    pub fn len(&self) -> usize {
        self.fcst.len()
    }

    /// True when the sample holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.fcst.is_empty()
    }

    /// Weight of the i-th pair (1.0 when no weights are attached).
    #[inline]
    pub fn weight_at(&self, i: usize) -> f64 {
        match &self.weight {
            Some(w) => w[i],
            None => 1.0,
        }
    }

    /// True when either side of the i-th pair is missing.
    #[inline]
    pub fn is_pair_bad(&self, i: usize) -> bool {
        is_bad_data(self.fcst[i]) || is_bad_data(self.obs[i])
    }
}

/// The identity index set 0..n-1 selecting a full sample.
pub fn identity_index(n: usize) -> Vec<usize> {
    (0..n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math_utils::BAD_DATA;

    #[test]
    fn test_new_checks_lengths() {
        assert!(PairedSample::new(vec![1.0, 2.0], vec![1.0]).is_err());
        let s = PairedSample::new(vec![1.0, 2.0], vec![3.0, 4.0]).unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_weights_default_to_one() {
        let s = PairedSample::new(vec![1.0], vec![2.0]).unwrap();
        assert_eq!(s.weight_at(0), 1.0);
        let s = s.with_weights(vec![0.5]).unwrap();
        assert_eq!(s.weight_at(0), 0.5);
    }

    #[test]
    fn test_bad_pair_detection() {
        let s = PairedSample::new(vec![1.0, BAD_DATA, 3.0], vec![1.0, 2.0, BAD_DATA]).unwrap();
        assert!(!s.is_pair_bad(0));
        assert!(s.is_pair_bad(1));
        assert!(s.is_pair_bad(2));
    }

    #[test]
    fn test_identity_index() {
        assert_eq!(identity_index(4), vec![0, 1, 2, 3]);
        assert!(identity_index(0).is_empty());
    }
}
