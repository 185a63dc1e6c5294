//! Resampling configuration shared by all statistic families.

use crate::errors::{validate_alpha, validate_parameter, VerifError, VerifResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Method used to turn bootstrap replicates into interval bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CiMethod {
    /// Bias-corrected and accelerated bootstrap. Always resamples at the
    /// full sample size n.
    Bca,
    /// Plain percentile bootstrap. Honors the configured subsample
    /// proportion `m_prop`.
    Percentile,
}

/// Configuration scalars for one verification run.
///
/// The random generator is deliberately not part of the configuration; it is
/// a long-lived handle passed separately through every orchestrator call so
/// that its state advances across the whole run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResampleConfig {
    /// Number of bootstrap replicates B. Zero disables resampling and the
    /// orchestrators return point statistics only.
    pub n_boot: usize,
    /// Resample size as a proportion of n, in (0, 1]. Applies to the
    /// percentile method; BCa always resamples at full size.
    pub m_prop: f64,
    /// Interval construction method.
    pub ci_method: CiMethod,
    /// Alpha levels, each strictly inside (0, 1). Every bound array in the
    /// output records is indexed in parallel with this list.
    pub alpha: Vec<f64>,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            n_boot: 1000,
            m_prop: 1.0,
            ci_method: CiMethod::Bca,
            alpha: vec![0.05],
        }
    }
}

impl ResampleConfig {
    /// Validates the configuration scalars.
    pub fn validate(&self) -> VerifResult<()> {
        validate_parameter(self.m_prop, f64::MIN_POSITIVE, 1.0, "m_prop")?;
        if self.alpha.is_empty() {
            return Err(VerifError::InvalidParameter {
                parameter: "alpha".to_string(),
                value: 0.0,
                constraint: "at least one alpha level".to_string(),
            });
        }
        for &a in &self.alpha {
            validate_alpha(a)?;
        }
        Ok(())
    }

    /// Resample size m for a sample of size n under the percentile method.
    pub fn resample_size(&self, n: usize) -> usize {
        ((self.m_prop * n as f64).round() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ResampleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_m_prop() {
        let cfg = ResampleConfig {
            m_prop: 1.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = ResampleConfig {
            m_prop: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_or_bad_alpha() {
        let cfg = ResampleConfig {
            alpha: vec![],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = ResampleConfig {
            alpha: vec![0.05, 1.0],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_resample_size_rounds() {
        let cfg = ResampleConfig {
            m_prop: 0.8,
            ..Default::default()
        };
        assert_eq!(cfg.resample_size(100), 80);
        assert_eq!(cfg.resample_size(99), 79);
        // Never zero, even for tiny samples
        let cfg = ResampleConfig {
            m_prop: 0.1,
            ..Default::default()
        };
        assert_eq!(cfg.resample_size(3), 1);
    }
}
