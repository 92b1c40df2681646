//! Scales: data-to-visual mappings.
//!
//! [`ScaleSpec`] is what a user declares; [`Scale`] is the resolved mapping
//! fitted to the data a plot actually shows. [`LinearScale`] places axis
//! coordinates on a panel and [`gradient`] interpolates continuous colors.

pub mod spec;
pub mod transform;

pub use spec::ScaleSpec;
pub use transform::Transform;

use std::collections::BTreeMap;

use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::grammar::data::DataValue;
use crate::grammar::properties::{Mapped, Property};

// ============================================================================
// Resolved scales
// ============================================================================

/// Resolved scales keyed by variable name.
pub type Scales = BTreeMap<String, Scale>;

/// How a resolved scale interprets its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    /// Discrete levels in a fixed order.
    Nominal,
    /// Numeric values, optionally transformed.
    Continuous,
    /// Values are used as-is.
    Identity,
}

/// Legend contents of a scale: raw values and their display labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    /// Data values shown in the legend.
    pub values: Vec<DataValue>,
    /// Label for each value.
    pub labels: Vec<String>,
}

/// A scale fitted to data.
#[derive(Debug, Clone)]
pub struct Scale {
    kind: ScaleKind,
    property: Property,
    transform: Transform,
    levels: Vec<DataValue>,
    mapped: Vec<Mapped>,
    domain: Option<(f64, f64)>,
    legend: Option<Legend>,
}

impl Scale {
    /// Scale that passes values through unchanged.
    #[must_use]
    pub fn identity(property: Property) -> Self {
        Self {
            kind: ScaleKind::Identity,
            property,
            transform: Transform::Identity,
            levels: Vec::new(),
            mapped: Vec::new(),
            domain: None,
            legend: None,
        }
    }

    /// Nominal scale over the given levels.
    #[must_use]
    pub fn nominal(property: Property, levels: Vec<DataValue>) -> Self {
        let mapped = property.nominal_values(levels.len());
        let legend = property.legend().then(|| Legend {
            labels: levels.iter().map(ToString::to_string).collect(),
            values: levels.clone(),
        });
        Self {
            kind: ScaleKind::Nominal,
            property,
            transform: Transform::Identity,
            levels,
            mapped,
            domain: None,
            legend,
        }
    }

    /// Continuous scale fitted to the numeric `values`.
    ///
    /// # Errors
    ///
    /// Fails if any non-missing value is not a number.
    pub fn continuous(property: Property, transform: Transform, values: &[DataValue]) -> Result<Self> {
        if let Some(text) = values.iter().find(|v| !v.is_null() && !v.is_number()) {
            return Err(Error::ScaleDomain(format!(
                "continuous scale for {property:?} cannot map non-numeric value `{text}`"
            )));
        }

        let (lo, hi) = values
            .iter()
            .filter_map(DataValue::as_f64)
            .map(|v| transform.forward(v))
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let domain = (lo <= hi).then_some((lo, hi));

        let legend = match domain {
            Some((lo, hi)) if property.legend() => Some(continuous_legend(transform, lo, hi)),
            _ => None,
        };

        Ok(Self {
            kind: ScaleKind::Continuous,
            property,
            transform,
            levels: Vec::new(),
            mapped: Vec::new(),
            domain,
            legend,
        })
    }

    /// Scale kind.
    #[must_use]
    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    /// Property this scale maps onto.
    #[must_use]
    pub fn property(&self) -> Property {
        self.property
    }

    /// Transform applied before mapping (identity for non-continuous scales).
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Ordered levels of a nominal scale.
    #[must_use]
    pub fn order(&self) -> Option<&[DataValue]> {
        (self.kind == ScaleKind::Nominal).then_some(self.levels.as_slice())
    }

    /// Level at nominal position `index`.
    #[must_use]
    pub fn level(&self, index: usize) -> Option<&DataValue> {
        self.order().and_then(|levels| levels.get(index))
    }

    /// Extent of the data in transformed space.
    #[must_use]
    pub fn domain(&self) -> Option<(f64, f64)> {
        self.domain
    }

    /// Legend contents, if this scale shows one.
    #[must_use]
    pub fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }

    /// Map a value to its numeric position; NaN when it cannot be mapped.
    ///
    /// Nominal levels map to their index; continuous values go through the
    /// transform.
    #[must_use]
    pub fn forward(&self, value: &DataValue) -> f64 {
        match self.kind {
            ScaleKind::Nominal => {
                self.levels.iter().position(|l| l == value).map_or(f64::NAN, |i| i as f64)
            }
            ScaleKind::Continuous => value.as_f64().map_or(f64::NAN, |v| self.transform.forward(v)),
            ScaleKind::Identity => value.as_f64().unwrap_or(f64::NAN),
        }
    }

    /// Map a column to numeric positions; unmappable values become `Null`.
    #[must_use]
    pub fn forward_column(&self, values: &[DataValue]) -> Vec<DataValue> {
        values
            .iter()
            .map(|v| {
                let x = self.forward(v);
                if x.is_finite() { DataValue::Number(x) } else { DataValue::Null }
            })
            .collect()
    }

    /// Invert a numeric position back to data space.
    #[must_use]
    pub fn inverse(&self, value: f64) -> f64 {
        match self.kind {
            ScaleKind::Continuous => self.transform.inverse(value),
            ScaleKind::Nominal | ScaleKind::Identity => value,
        }
    }

    /// Smallest gap between distinct positions, used to size bars.
    ///
    /// Nominal scales are spaced at 1; continuous scales with fewer than
    /// two distinct values fall back to 1.
    #[must_use]
    pub fn spacing(&self, positions: &[DataValue]) -> f64 {
        if self.kind == ScaleKind::Nominal {
            return 1.0;
        }
        let mut xs: Vec<f64> =
            positions.iter().filter_map(DataValue::as_f64).filter(|v| v.is_finite()).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        xs.windows(2).map(|w| w[1] - w[0]).reduce(f64::min).unwrap_or(1.0)
    }

    /// Map a value to its visual property value.
    #[must_use]
    pub fn map(&self, value: &DataValue) -> Mapped {
        match self.kind {
            ScaleKind::Nominal => self
                .levels
                .iter()
                .position(|l| l == value)
                .and_then(|i| self.mapped.get(i).copied())
                .unwrap_or(Mapped::Missing),
            ScaleKind::Continuous => {
                let x = self.forward(value);
                if !x.is_finite() {
                    return Mapped::Missing;
                }
                match (self.property, self.domain) {
                    (Property::Coordinate(_) | Property::Other, _) => Mapped::Number(x),
                    (prop, Some((lo, hi))) if hi > lo => prop.continuous_value((x - lo) / (hi - lo)),
                    (prop, _) => prop.continuous_value(0.5),
                }
            }
            ScaleKind::Identity => self.property.identity_value(value),
        }
    }
}

/// Legend for a continuous scale: nice breaks inside the data extent.
fn continuous_legend(transform: Transform, lo: f64, hi: f64) -> Legend {
    let breaks: Vec<f64> = if hi > lo {
        pretty_breaks(lo, hi, 5).into_iter().filter(|b| *b >= lo - 1e-9 && *b <= hi + 1e-9).collect()
    } else {
        vec![lo]
    };
    let values: Vec<DataValue> =
        breaks.iter().map(|&b| DataValue::Number(round_to_precision(transform.inverse(b)))).collect();
    Legend { labels: values.iter().map(ToString::to_string).collect(), values }
}

fn round_to_precision(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(12 - value.abs().log10().ceil() as i32);
    (value * scale).round() / scale
}

/// "Nice" tick positions (multiples of 1, 2 or 5 times a power of ten)
/// covering `[min, max]` with roughly `n` intervals.
#[must_use]
pub fn pretty_breaks(min: f64, max: f64, n: usize) -> Vec<f64> {
    if n == 0 || !min.is_finite() || !max.is_finite() || min >= max {
        return vec![];
    }

    let rough_step = (max - min) / (n as f64);
    let magnitude = 10f64.powf(rough_step.log10().floor());
    let residual = rough_step / magnitude;

    let nice_step = if residual <= 1.0 {
        magnitude
    } else if residual <= 2.0 {
        2.0 * magnitude
    } else if residual <= 5.0 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    };

    let first = (min / nice_step).floor() as i64;
    let last = (max / nice_step).ceil() as i64;
    (first..=last).map(|i| round_to_precision(i as f64 * nice_step)).collect()
}

// ============================================================================
// Numeric interpolation
// ============================================================================

/// Affine map from an axis interval onto a pixel interval.
#[derive(Debug, Clone, Copy)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    /// Map `domain` onto `range`; either may be reversed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScaleDomain`] for an empty or non-finite domain.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Result<Self> {
        let span = domain.1 - domain.0;
        if !span.is_finite() || span.abs() < f64::EPSILON {
            return Err(Error::ScaleDomain(format!("degenerate domain {domain:?}")));
        }
        Ok(Self { domain, range })
    }

    /// Position of `value` in the range.
    #[must_use]
    pub fn map(&self, value: f64) -> f64 {
        let t = (value - self.domain.0) / (self.domain.1 - self.domain.0);
        self.range.0 + t * (self.range.1 - self.range.0)
    }
}

/// Stops of the viridis colormap, used for continuous color mappings.
pub const VIRIDIS: [Rgba; 5] = [
    Rgba::rgb(68, 1, 84),
    Rgba::rgb(59, 82, 139),
    Rgba::rgb(33, 145, 140),
    Rgba::rgb(94, 201, 98),
    Rgba::rgb(253, 231, 37),
];

/// Color at `t` along evenly spaced `stops`, `t` clamped to `[0, 1]`.
///
/// Returns `None` for an empty gradient.
#[must_use]
pub fn gradient(stops: &[Rgba], t: f64) -> Option<Rgba> {
    let (&first, rest) = stops.split_first()?;
    if rest.is_empty() {
        return Some(first);
    }
    let pos = t.clamp(0.0, 1.0) * rest.len() as f64;
    let segment = (pos.floor() as usize).min(rest.len() - 1);
    Some(stops[segment].lerp(stops[segment + 1], (pos - segment as f64) as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::properties::Axis;
    use approx::assert_relative_eq;

    fn nums(values: &[f64]) -> Vec<DataValue> {
        values.iter().copied().map(DataValue::from).collect()
    }

    #[test]
    fn test_linear_scale_flips_range() {
        let scale = LinearScale::new((0.0, 100.0), (200.0, 0.0)).unwrap();
        assert_relative_eq!(scale.map(0.0), 200.0);
        assert_relative_eq!(scale.map(25.0), 150.0);
        assert!(LinearScale::new((3.0, 3.0), (0.0, 1.0)).is_err());
        assert!(LinearScale::new((0.0, f64::INFINITY), (0.0, 1.0)).is_err());
    }

    #[test]
    fn test_gradient() {
        assert_eq!(gradient(&[Rgba::BLACK, Rgba::WHITE], 0.5), Some(Rgba::rgb(128, 128, 128)));
        assert_eq!(gradient(&VIRIDIS, -1.0), Some(VIRIDIS[0]));
        assert_eq!(gradient(&VIRIDIS, 1.0), Some(VIRIDIS[4]));
        assert_eq!(gradient(&VIRIDIS, 0.25), Some(VIRIDIS[1]));
        assert_eq!(gradient(&[Rgba::RED], 0.7), Some(Rgba::RED));
        assert_eq!(gradient(&[], 0.7), None);
    }

    #[test]
    fn test_nominal_forward_uses_level_index() {
        let scale = Scale::nominal(Property::Coordinate(Axis::X), nums(&[3.0, 1.0]));
        assert_eq!(scale.forward(&DataValue::from(1.0)), 1.0);
        assert!(scale.forward(&DataValue::from(2.0)).is_nan());
        assert_eq!(scale.spacing(&nums(&[0.0, 0.5])), 1.0);
        assert!(scale.legend().is_none());
    }

    #[test]
    fn test_nominal_color_legend() {
        let scale = Scale::nominal(Property::Color, vec![DataValue::from("b"), DataValue::from("a")]);
        let legend = scale.legend().unwrap();
        assert_eq!(legend.labels, vec!["b", "a"]);
        assert_eq!(scale.map(&DataValue::from("a")), Mapped::Color(crate::color::DEEP[1]));
        assert_eq!(scale.map(&DataValue::from("z")), Mapped::Missing);
    }

    #[test]
    fn test_continuous_log_domain_and_inverse() {
        let scale =
            Scale::continuous(Property::Coordinate(Axis::Y), Transform::Log { base: 10.0 }, &nums(&[1.0, 100.0]))
                .unwrap();
        assert_eq!(scale.domain(), Some((0.0, 2.0)));
        assert_relative_eq!(scale.inverse(scale.forward(&DataValue::from(40.0))), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_continuous_rejects_text() {
        let err = Scale::continuous(Property::Color, Transform::Identity, &[DataValue::from("a")]).unwrap_err();
        assert!(matches!(err, Error::ScaleDomain(_)));
    }

    #[test]
    fn test_continuous_spacing() {
        let scale = Scale::continuous(Property::Coordinate(Axis::X), Transform::Identity, &nums(&[0.0, 4.0])).unwrap();
        assert_eq!(scale.spacing(&nums(&[0.0, 2.0, 2.0, 5.0])), 2.0);
        assert_eq!(scale.spacing(&nums(&[7.0])), 1.0);
    }

    #[test]
    fn test_continuous_legend_breaks_in_range() {
        let scale = Scale::continuous(Property::PointSize, Transform::Identity, &nums(&[0.5, 9.5])).unwrap();
        let legend = scale.legend().unwrap();
        assert_eq!(legend.labels, vec!["2", "4", "6", "8"]);
    }

    #[test]
    fn test_continuous_map_normalizes() {
        let scale = Scale::continuous(Property::Alpha, Transform::Identity, &nums(&[0.0, 10.0])).unwrap();
        assert_eq!(scale.map(&DataValue::from(0.0)), Mapped::Number(0.3));
        assert_eq!(scale.map(&DataValue::Null), Mapped::Missing);
    }

    #[test]
    fn test_identity_scale() {
        let scale = Scale::identity(Property::Color);
        assert_eq!(scale.map(&DataValue::from("#0000ff")), Mapped::Color(Rgba::BLUE));
        assert_eq!(scale.forward(&DataValue::from(2.5)), 2.5);
    }

    #[test]
    fn test_pretty_breaks() {
        assert_eq!(pretty_breaks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(pretty_breaks(0.0, 100.0, 4), vec![0.0, 50.0, 100.0]);
        assert!(pretty_breaks(1.0, 1.0, 5).is_empty());
    }
}
