//! User-facing scale declarations.

use std::str::FromStr;

use super::{Scale, Transform};
use crate::error::{Error, Result};
use crate::grammar::data::{categorical_order, DataValue};
use crate::grammar::properties::Property;

/// A scale as declared on a plot, before it has seen any data.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleSpec {
    /// Discrete levels, optionally in an explicit order.
    Nominal {
        /// Level order; derived from the data when `None`.
        order: Option<Vec<DataValue>>,
    },
    /// Numeric values through a transform.
    Continuous {
        /// Transform applied before mapping.
        transform: Transform,
    },
    /// Use data values directly as property values.
    Identity,
}

impl ScaleSpec {
    /// Nominal scale with levels taken from the data.
    #[must_use]
    pub fn nominal() -> Self {
        ScaleSpec::Nominal { order: None }
    }

    /// Nominal scale with an explicit level order.
    pub fn nominal_order<I, V>(order: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DataValue>,
    {
        ScaleSpec::Nominal { order: Some(order.into_iter().map(Into::into).collect()) }
    }

    /// Untransformed continuous scale.
    #[must_use]
    pub fn continuous() -> Self {
        ScaleSpec::Continuous { transform: Transform::Identity }
    }

    /// Continuous scale with the given transform.
    #[must_use]
    pub fn transformed(transform: Transform) -> Self {
        ScaleSpec::Continuous { transform }
    }

    /// Identity scale.
    #[must_use]
    pub fn identity() -> Self {
        ScaleSpec::Identity
    }

    /// Fit this declaration to the values it will map.
    ///
    /// # Errors
    ///
    /// Fails when a continuous scale is given non-numeric data.
    pub fn setup(&self, values: &[DataValue], property: Property) -> Result<Scale> {
        match self {
            ScaleSpec::Nominal { order } => {
                Ok(Scale::nominal(property, categorical_order(values, order.as_deref())))
            }
            ScaleSpec::Continuous { transform } => Scale::continuous(property, *transform, values),
            ScaleSpec::Identity => Ok(Scale::identity(property)),
        }
    }
}

impl FromStr for ScaleSpec {
    type Err = Error;

    /// Parse `"nominal"`, `"continuous"`, `"identity"` or a transform name.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nominal" | "categorical" => Ok(Self::nominal()),
            "continuous" => Ok(Self::continuous()),
            "identity" => Ok(Self::identity()),
            other => other.parse().map(Self::transformed),
        }
    }
}

impl From<Transform> for ScaleSpec {
    fn from(transform: Transform) -> Self {
        Self::transformed(transform)
    }
}
