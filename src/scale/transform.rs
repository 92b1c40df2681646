//! Numeric coordinate transforms with analytic inverses.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A monotonic transform applied to continuous values before drawing.
///
/// Values outside a transform's domain (e.g. non-positive values under
/// `Log`) map to NaN rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Transform {
    /// No transformation.
    #[default]
    Identity,
    /// Logarithm with the given base.
    Log {
        /// Logarithm base (positive, not 1).
        base: f64,
    },
    /// Square root.
    Sqrt,
}

impl Transform {
    /// Create a logarithm transform.
    ///
    /// # Errors
    ///
    /// Returns an error if the base is not positive or equals 1.
    pub fn log(base: f64) -> Result<Self> {
        if !base.is_finite() || base <= 0.0 || (base - 1.0).abs() < f64::EPSILON {
            return Err(Error::ScaleDomain("Log scale base must be positive and not 1".to_string()));
        }
        Ok(Transform::Log { base })
    }

    /// Transform a data value.
    #[must_use]
    pub fn forward(&self, value: f64) -> f64 {
        match self {
            Transform::Identity => value,
            Transform::Log { base } if value > 0.0 => value.log(*base),
            Transform::Sqrt if value >= 0.0 => value.sqrt(),
            Transform::Log { .. } | Transform::Sqrt => f64::NAN,
        }
    }

    /// Invert a transformed value back to data space.
    #[must_use]
    pub fn inverse(&self, value: f64) -> f64 {
        match self {
            Transform::Identity => value,
            Transform::Log { base } => base.powf(value),
            Transform::Sqrt => value * value,
        }
    }

    /// True if this transform is the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }
}

impl FromStr for Transform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "identity" | "linear" => Ok(Transform::Identity),
            "log" | "log10" => Ok(Transform::Log { base: 10.0 }),
            "log2" => Ok(Transform::Log { base: 2.0 }),
            "ln" => Ok(Transform::Log { base: std::f64::consts::E }),
            "sqrt" => Ok(Transform::Sqrt),
            other => match other.strip_prefix("log").map(str::parse::<f64>) {
                Some(Ok(base)) => Transform::log(base),
                _ => Err(Error::config(format!("unknown scale transform `{other}`"))),
            },
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Identity => f.write_str("identity"),
            Transform::Log { base } if (*base - 10.0).abs() < 1e-10 => f.write_str("log10"),
            Transform::Log { base } if (*base - 2.0).abs() < 1e-10 => f.write_str("log2"),
            Transform::Log { base } if (*base - std::f64::consts::E).abs() < 1e-10 => {
                f.write_str("ln")
            }
            Transform::Log { base } => write!(f, "log{base}"),
            Transform::Sqrt => f.write_str("sqrt"),
        }
    }
}
