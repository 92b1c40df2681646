//! Semantic properties that variables can be mapped onto.
//!
//! A property decides how a scale turns data into visual values: which
//! scale kind it defaults to, what its nominal levels look like, how a
//! normalized continuous value is rendered, and whether it gets a legend.

use std::fmt;
use std::str::FromStr;

use super::data::DataValue;
use super::geom::PointShape;
use crate::color::{palette, Rgba};
use crate::error::{Error, Result};
use crate::scale::{gradient, ScaleSpec, VIRIDIS};

/// Semantic properties, excluding coordinates, in resolution order.
pub const SEMANTIC_PROPERTIES: [&str; 6] = ["color", "fill", "alpha", "pointsize", "linewidth", "marker"];

/// Numeric data with at most this many distinct values defaults to a
/// nominal scale on semantic properties.
pub const NOMINAL_MAX_LEVELS: usize = 2;

/// Structural variables that split the data without a visual mapping.
pub const STRUCTURAL_VARIABLES: [&str; 3] = ["col", "row", "group"];

const MARKERS: [PointShape; 6] = [
    PointShape::Circle,
    PointShape::X,
    PointShape::Square,
    PointShape::Cross,
    PointShape::Diamond,
    PointShape::Triangle,
];

/// A coordinate axis, also used as a mark orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
}

impl Axis {
    /// Both axes in order.
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];

    /// Variable name of the axis.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }

    /// The other axis.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Grid dimension a paired axis spreads along (`x` → `col`, `y` → `row`).
    #[must_use]
    pub const fn grid_dim(self) -> &'static str {
        match self {
            Axis::X => "col",
            Axis::Y => "row",
        }
    }

    /// Split a coordinate variable into its axis and prefix.
    ///
    /// `"x"`, `"x1"`, `"xmin"` and `"y0max"` are coordinate variables; the
    /// prefix is the axis letter plus any digits (`"x1"` for `"x1min"`).
    #[must_use]
    pub fn parse_coordinate(var: &str) -> Option<(Axis, &str)> {
        let axis = match var.as_bytes().first() {
            Some(b'x') => Axis::X,
            Some(b'y') => Axis::Y,
            _ => return None,
        };
        let digits = var[1..].bytes().take_while(u8::is_ascii_digit).count();
        Some((axis, &var[..=digits]))
    }

    /// True for exact base coordinate variables (`x`, `y`, `x0`, `y12`, ...).
    #[must_use]
    pub fn is_base_coordinate(var: &str) -> bool {
        matches!(Self::parse_coordinate(var), Some((_, prefix)) if prefix.len() == var.len())
    }
}

impl FromStr for Axis {
    type Err = Error;

    /// Parse an orientation, accepting `"v"` for `x` and `"h"` for `y`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x" | "v" => Ok(Axis::X),
            "y" | "h" => Ok(Axis::Y),
            other => Err(Error::config(format!("orientation must be `x` or `y`, not `{other}`"))),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value produced by a scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mapped {
    /// Numeric value (coordinates, sizes, widths, alpha).
    Number(f64),
    /// Color value.
    Color(Rgba),
    /// Boolean value (fill).
    Bool(bool),
    /// Marker shape.
    Marker(PointShape),
    /// The input could not be mapped.
    Missing,
}

impl Mapped {
    /// Numeric value, if any.
    #[must_use]
    pub fn as_number(self) -> Option<f64> {
        match self {
            Mapped::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Color value, if any.
    #[must_use]
    pub fn as_color(self) -> Option<Rgba> {
        match self {
            Mapped::Color(c) => Some(c),
            _ => None,
        }
    }

    /// Boolean value, if any.
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Mapped::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Marker value, if any.
    #[must_use]
    pub fn as_marker(self) -> Option<PointShape> {
        match self {
            Mapped::Marker(m) => Some(m),
            _ => None,
        }
    }
}

/// What a variable's values are mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// A position along an axis.
    Coordinate(Axis),
    /// Mark color.
    Color,
    /// Whether marks are filled.
    Fill,
    /// Mark opacity.
    Alpha,
    /// Point size.
    PointSize,
    /// Line width.
    LineWidth,
    /// Point marker shape.
    Marker,
    /// Any other variable (facets, groups, stat outputs).
    Other,
}

impl Property {
    /// Property for a variable name; coordinate variants map to their axis.
    #[must_use]
    pub fn for_variable(var: &str) -> Self {
        if let Some((axis, _)) = Axis::parse_coordinate(var) {
            return Property::Coordinate(axis);
        }
        match var {
            "color" => Property::Color,
            "fill" => Property::Fill,
            "alpha" => Property::Alpha,
            "pointsize" => Property::PointSize,
            "linewidth" => Property::LineWidth,
            "marker" => Property::Marker,
            _ => Property::Other,
        }
    }

    /// Whether scales for this property produce legend entries.
    #[must_use]
    pub fn legend(self) -> bool {
        !matches!(self, Property::Coordinate(_) | Property::Other)
    }

    /// Infer a scale from the data: numbers are continuous, anything else nominal.
    ///
    /// Semantic properties also treat numbers with at most
    /// [`NOMINAL_MAX_LEVELS`] distinct values as nominal, so a 0/1 flag gets
    /// two palette colors rather than the ends of a gradient. Coordinates
    /// stay continuous.
    #[must_use]
    pub fn default_scale(self, values: &[DataValue]) -> ScaleSpec {
        let present: Vec<f64> = values.iter().filter(|v| !v.is_null()).filter_map(DataValue::as_f64).collect();
        let numeric = !present.is_empty() && values.iter().filter(|v| !v.is_null()).all(DataValue::is_number);
        match self {
            Property::Fill | Property::Marker => ScaleSpec::nominal(),
            _ if !numeric => ScaleSpec::nominal(),
            Property::Color | Property::Alpha | Property::PointSize | Property::LineWidth
                if distinct_count(&present) <= NOMINAL_MAX_LEVELS =>
            {
                ScaleSpec::nominal()
            }
            _ => ScaleSpec::continuous(),
        }
    }

    /// Values for `n` nominal levels.
    #[must_use]
    pub fn nominal_values(self, n: usize) -> Vec<Mapped> {
        match self {
            Property::Coordinate(_) | Property::Other => {
                (0..n).map(|i| Mapped::Number(i as f64)).collect()
            }
            Property::Color => palette(n).into_iter().map(Mapped::Color).collect(),
            Property::Fill => (0..n).map(|i| Mapped::Bool(i % 2 == 0)).collect(),
            Property::Marker => (0..n).map(|i| Mapped::Marker(MARKERS[i % MARKERS.len()])).collect(),
            Property::Alpha | Property::PointSize | Property::LineWidth => {
                let (lo, hi) = self.interval();
                linspace(hi, lo, n).into_iter().map(Mapped::Number).collect()
            }
        }
    }

    /// Value for a continuous position `t` in `[0, 1]`.
    #[must_use]
    pub fn continuous_value(self, t: f64) -> Mapped {
        let t = t.clamp(0.0, 1.0);
        match self {
            Property::Coordinate(_) | Property::Other => Mapped::Number(t),
            Property::Color => gradient(&VIRIDIS, t).map_or(Mapped::Missing, Mapped::Color),
            Property::Fill => Mapped::Bool(t >= 0.5),
            Property::Marker => Mapped::Marker(PointShape::Circle),
            Property::Alpha | Property::PointSize | Property::LineWidth => {
                let (lo, hi) = self.interval();
                Mapped::Number(lo + t * (hi - lo))
            }
        }
    }

    /// Pass a raw value through without scaling.
    #[must_use]
    pub fn identity_value(self, value: &DataValue) -> Mapped {
        match (self, value) {
            (Property::Color, DataValue::Text(hex)) => {
                Rgba::from_hex(hex).map_or(Mapped::Missing, Mapped::Color)
            }
            (_, DataValue::Number(n)) if n.is_finite() => Mapped::Number(*n),
            _ => Mapped::Missing,
        }
    }

    fn interval(self) -> (f64, f64) {
        match self {
            Property::Alpha => (0.3, 0.95),
            Property::PointSize => (2.0, 8.0),
            Property::LineWidth => (0.75, 3.0),
            _ => (0.0, 1.0),
        }
    }
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n).map(|i| start + (end - start) * i as f64 / (n - 1) as f64).collect(),
    }
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(Axis::parse_coordinate("x"), Some((Axis::X, "x")));
        assert_eq!(Axis::parse_coordinate("y12"), Some((Axis::Y, "y12")));
        assert_eq!(Axis::parse_coordinate("xmin"), Some((Axis::X, "x")));
        assert_eq!(Axis::parse_coordinate("x1max"), Some((Axis::X, "x1")));
        assert_eq!(Axis::parse_coordinate("color"), None);
    }

    #[test]
    fn test_is_base_coordinate() {
        assert!(Axis::is_base_coordinate("x"));
        assert!(Axis::is_base_coordinate("y3"));
        assert!(!Axis::is_base_coordinate("xmax"));
        assert!(!Axis::is_base_coordinate("width"));
    }

    #[test]
    fn test_orientation_aliases() {
        assert_eq!("v".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!("h".parse::<Axis>().unwrap(), Axis::Y);
        assert!("z".parse::<Axis>().is_err());
    }

    #[test]
    fn test_property_for_variable() {
        assert_eq!(Property::for_variable("x0"), Property::Coordinate(Axis::X));
        assert_eq!(Property::for_variable("color"), Property::Color);
        assert_eq!(Property::for_variable("group"), Property::Other);
        assert!(!Property::for_variable("col").legend());
        assert!(Property::Color.legend());
    }

    #[test]
    fn test_default_scale_inference() {
        let numbers = vec![DataValue::from(1.0), DataValue::Null, DataValue::from(2.5), DataValue::from(4.0)];
        let text = vec![DataValue::from("a")];
        assert_eq!(Property::Color.default_scale(&numbers), ScaleSpec::continuous());
        assert_eq!(Property::Color.default_scale(&text), ScaleSpec::nominal());
        assert_eq!(Property::Marker.default_scale(&numbers), ScaleSpec::nominal());
        assert_eq!(Property::Color.default_scale(&[DataValue::Null]), ScaleSpec::nominal());

        let flags: Vec<DataValue> = [0.0, 1.0, 1.0, 0.0, 1.0].into_iter().map(DataValue::from).collect();
        assert_eq!(Property::Color.default_scale(&flags), ScaleSpec::nominal());
        assert_eq!(Property::PointSize.default_scale(&flags), ScaleSpec::nominal());
        assert_eq!(Property::Alpha.default_scale(&flags[..1]), ScaleSpec::nominal());
        assert_eq!(Property::Coordinate(Axis::X).default_scale(&flags), ScaleSpec::continuous());
        assert_eq!(Property::Coordinate(Axis::Y).default_scale(&flags), ScaleSpec::continuous());
    }

    #[test]
    fn test_nominal_sizes_descend() {
        let sizes: Vec<f64> =
            Property::PointSize.nominal_values(3).into_iter().filter_map(Mapped::as_number).collect();
        assert_eq!(sizes, vec![8.0, 5.0, 2.0]);
    }

    #[test]
    fn test_nominal_markers_cycle() {
        let markers = Property::Marker.nominal_values(7);
        assert_eq!(markers[0], markers[6]);
    }

    #[test]
    fn test_identity_color_from_hex() {
        let mapped = Property::Color.identity_value(&DataValue::from("#ff0000"));
        assert_eq!(mapped, Mapped::Color(Rgba::RED));
        assert_eq!(Property::Color.identity_value(&DataValue::from("red")), Mapped::Missing);
    }
}
