//! Threshold tests used to dichotomize continuous pairs.

use std::fmt;

use crate::errors::{VerifError, VerifResult};
use crate::math_utils::{is_bad_data, is_eq};

/// Comparison operator applied against a threshold value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThreshOp {
    /// Strictly less than
    Lt,
    /// Less than or equal
    Le,
    /// Equal within floating-point tolerance
    Eq,
    /// Not equal within floating-point tolerance
    Ne,
    /// Greater than or equal
    Ge,
    /// Strictly greater than
    Gt,
}

impl fmt::Display for ThreshOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreshOp::Lt => "<",
            ThreshOp::Le => "<=",
            ThreshOp::Eq => "==",
            ThreshOp::Ne => "!=",
            ThreshOp::Ge => ">=",
            ThreshOp::Gt => ">",
        };
        f.write_str(s)
    }
}

/// A threshold, pairing an operator with the value to compare against.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Threshold {
    pub op: ThreshOp,
    pub value: f64,
}

impl Threshold {
    /// Builds a threshold, rejecting non-finite comparison values.
    pub fn new(op: ThreshOp, value: f64) -> VerifResult<Self> {
        if !value.is_finite() {
            return Err(VerifError::InvalidParameter {
                parameter: "threshold value".to_string(),
                value,
                constraint: "must be finite".to_string(),
            });
        }
        Ok(Self { op, value })
    }

    /// Tests `x` against the threshold. Missing values never satisfy it.
    #[inline]
    pub fn check(&self, x: f64) -> bool {
        if is_bad_data(x) {
            return false;
        }
        match self.op {
            ThreshOp::Lt => x < self.value,
            ThreshOp::Le => x <= self.value,
            ThreshOp::Eq => is_eq(x, self.value),
            ThreshOp::Ne => !is_eq(x, self.value),
            ThreshOp::Ge => x >= self.value,
            ThreshOp::Gt => x > self.value,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math_utils::BAD_DATA;

    #[test]
    fn test_operators() {
        let ge = Threshold::new(ThreshOp::Ge, 1.0).unwrap();
        assert!(ge.check(1.0));
        assert!(ge.check(2.0));
        assert!(!ge.check(0.5));

        let lt = Threshold::new(ThreshOp::Lt, 0.0).unwrap();
        assert!(lt.check(-0.1));
        assert!(!lt.check(0.0));

        let eq = Threshold::new(ThreshOp::Eq, 2.0).unwrap();
        assert!(eq.check(2.0 + 1e-12));
        assert!(!eq.check(2.1));

        let ne = Threshold::new(ThreshOp::Ne, 2.0).unwrap();
        assert!(ne.check(2.1));
        assert!(!ne.check(2.0));
    }

    #[test]
    fn test_bad_data_never_matches() {
        let ge = Threshold::new(ThreshOp::Ge, -1e9).unwrap();
        assert!(!ge.check(BAD_DATA));
        assert!(!ge.check(f64::NAN));
    }

    #[test]
    fn test_rejects_non_finite_value() {
        assert!(Threshold::new(ThreshOp::Gt, f64::INFINITY).is_err());
        assert!(Threshold::new(ThreshOp::Gt, f64::NAN).is_err());
    }

    #[test]
    fn test_display() {
        let t = Threshold::new(ThreshOp::Ge, 5.0).unwrap();
        assert_eq!(t.to_string(), ">=5");
    }
}
