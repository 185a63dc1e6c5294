//! Error types and validation functions for verification computations.
//!
//! Fatal contract violations (mismatched pair arrays, malformed configuration)
//! surface as `VerifError`. Degenerate statistical input never errors: the
//! affected statistic is set to the bad-data sentinel and computation
//! continues for everything else.

use thiserror::Error;

/// Errors raised by the verification statistics engine.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum VerifError {
    /// Forecast and observation arrays must be paired element for element.
    #[error("forecast/observation length mismatch: {fcst} forecast values vs {obs} observations")]
    LengthMismatch {
        /// Number of forecast values
        fcst: usize,
        /// Number of observation values
        obs: usize,
    },

    /// Invalid parameter value in a configuration or call argument.
    #[error("invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Not enough data for the requested computation.
    #[error("insufficient data: need at least {required} values, got {actual}")]
    InsufficientData {
        /// Minimum required values
        required: usize,
        /// Actual number of values provided
        actual: usize,
    },

    /// Numerical computation failed in a way that cannot be expressed as
    /// bad data (for example a distribution that could not be constructed).
    #[error("numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for the failure
        reason: String,
    },
}

/// Result type for all verification operations.
pub type VerifResult<T> = Result<T, VerifError>;

/// Validates that forecast and observation arrays are the same length.
///
/// A mismatch is a programmer error on the caller's side and is therefore
/// fatal for the call, never silently truncated.
pub fn validate_equal_length(fcst: &[f64], obs: &[f64]) -> VerifResult<()> {
    if fcst.len() != obs.len() {
        Err(VerifError::LengthMismatch {
            fcst: fcst.len(),
            obs: obs.len(),
        })
    } else {
        Ok(())
    }
}

/// Validates that a parameter lies within `[min, max]`.
///
/// # Arguments
/// * `value` - Parameter value to validate
/// * `min` - Minimum acceptable value (inclusive)
/// * `max` - Maximum acceptable value (inclusive)
/// * `name` - Parameter name for error reporting
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> VerifResult<()> {
    if value.is_nan() {
        return Err(VerifError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if value < min || value > max {
        Err(VerifError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("must be in [{}, {}]", min, max),
        })
    } else {
        Ok(())
    }
}

/// Validates a confidence alpha level, which must lie strictly inside (0, 1).
pub fn validate_alpha(alpha: f64) -> VerifResult<()> {
    if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
        Err(VerifError::InvalidParameter {
            parameter: "alpha".to_string(),
            value: alpha,
            constraint: "must be in (0, 1)".to_string(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch() {
        let f = vec![1.0, 2.0, 3.0];
        let o = vec![1.0, 2.0];
        let err = validate_equal_length(&f, &o).unwrap_err();
        assert_eq!(err, VerifError::LengthMismatch { fcst: 3, obs: 2 });
        assert!(validate_equal_length(&f, &f).is_ok());
    }

    #[test]
    fn test_validate_parameter_bounds() {
        assert!(validate_parameter(0.5, 0.0, 1.0, "m_prop").is_ok());
        assert!(validate_parameter(0.0, 0.0, 1.0, "m_prop").is_ok());
        assert!(matches!(
            validate_parameter(-0.1, 0.0, 1.0, "m_prop"),
            Err(VerifError::InvalidParameter { .. })
        ));
        assert!(matches!(
            validate_parameter(f64::NAN, 0.0, 1.0, "m_prop"),
            Err(VerifError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_alpha_open_interval() {
        assert!(validate_alpha(0.05).is_ok());
        assert!(validate_alpha(0.0).is_err());
        assert!(validate_alpha(1.0).is_err());
        assert!(validate_alpha(f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = VerifError::LengthMismatch { fcst: 10, obs: 8 };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains("8"));
    }
}
