//! The mark contract: how a layer's data becomes artists.
//!
//! The plotter hands a mark one [`Split`] per subplot and group. Marks look
//! up their visual properties through the resolved scales, falling back to
//! their own defaults for unmapped properties.

use std::fmt;

use super::data::{DataFrame, DataValue};
use super::geom::PointShape;
use super::properties::{Axis, Mapped, Property, SEMANTIC_PROPERTIES};
use crate::color::Rgba;
use crate::error::Result;
use crate::render::{Artist, AxesId, Figure};
use crate::scale::{ScaleKind, Scales};

/// One unit of drawing work: a group of rows bound for one subplot.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Grouping and facet key values of the rows.
    pub keys: Vec<(String, DataValue)>,
    /// The rows, with coordinates back in data space.
    pub data: DataFrame,
    /// Target surface.
    pub axes: AxesId,
}

/// Visual properties resolved for one row or legend entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    /// Base color.
    pub color: Rgba,
    /// Whether the mark is filled.
    pub fill: bool,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
    /// Point size in points.
    pub pointsize: f64,
    /// Line width in points.
    pub linewidth: f64,
    /// Marker shape.
    pub marker: PointShape,
}

impl Visual {
    /// Color with the resolved opacity applied.
    #[must_use]
    pub fn rgba(&self) -> Rgba {
        let alpha = (f64::from(self.color.a) * self.alpha.clamp(0.0, 1.0)).round() as u8;
        self.color.with_alpha(alpha)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Mapped) -> Self {
        let number = |var: &str, default: f64| lookup(var).as_number().unwrap_or(default);
        Self {
            color: lookup("color").as_color().unwrap_or(crate::color::DEEP[0]),
            fill: lookup("fill").as_bool().unwrap_or(true),
            alpha: number("alpha", 1.0),
            pointsize: number("pointsize", 6.0),
            linewidth: number("linewidth", 1.5),
            marker: lookup("marker").as_marker().unwrap_or_default(),
        }
    }
}

/// A visual representation of data.
pub trait Mark: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Semantic variables that split the data into separately drawn groups.
    fn grouping_vars(&self) -> &'static [&'static str] {
        &SEMANTIC_PROPERTIES
    }

    /// Width as a fraction of the orientation axis spacing, for marks that
    /// have one.
    fn width(&self) -> Option<f64> {
        None
    }

    /// Value-axis origin for marks drawn from a baseline.
    fn baseline(&self) -> Option<f64> {
        None
    }

    /// Orientation when the layer does not set one.
    fn infer_orient(&self, scales: &Scales) -> Axis {
        infer_orient(scales)
    }

    /// Value of `property` when no variable maps it.
    fn default_value(&self, property: Property) -> Mapped;

    /// Resolve the value of `var` for one row of `data`.
    fn resolve(&self, data: &DataFrame, row: usize, var: &str, scales: &Scales) -> Mapped {
        let property = Property::for_variable(var);
        let mapped = match (data.value(var, row), scales.get(var)) {
            (Some(value), Some(scale)) => scale.map(value),
            (Some(value), None) => property.identity_value(value),
            (None, _) => Mapped::Missing,
        };
        match mapped {
            Mapped::Missing => self.default_value(property),
            found => found,
        }
    }

    /// Resolve every semantic property for one row.
    fn visual(&self, data: &DataFrame, row: usize, scales: &Scales) -> Visual {
        Visual::from_lookup(|var| self.resolve(data, row, var, scales))
    }

    /// Resolve the properties of a legend entry: `variables` take `value`,
    /// everything else keeps the mark default.
    fn legend_visual(&self, variables: &[String], value: &DataValue, scales: &Scales) -> Visual {
        Visual::from_lookup(|var| {
            let property = Property::for_variable(var);
            let mapped = if variables.iter().any(|v| v == var) {
                scales.get(var).map_or(Mapped::Missing, |scale| scale.map(value))
            } else {
                Mapped::Missing
            };
            match mapped {
                Mapped::Missing => self.default_value(property),
                found => found,
            }
        })
    }

    /// Draw every split onto its surface.
    ///
    /// # Errors
    ///
    /// Fails if a split targets a surface the figure does not have.
    fn plot(
        &self,
        splits: &mut dyn Iterator<Item = Split>,
        scales: &Scales,
        orient: Axis,
        figure: &mut Figure,
    ) -> Result<()>;

    /// Swatch for a legend entry.
    fn legend_artist(&self, variables: &[String], value: &DataValue, scales: &Scales) -> Artist;
}

/// Default orientation rule, from the kinds of the `x` and `y` scales.
///
/// A missing axis orients along the other one; otherwise the mark is
/// oriented along the nominal axis, or along the non-continuous one.
#[must_use]
pub fn infer_orient(scales: &Scales) -> Axis {
    let kind = |axis: &str| scales.get(axis).map(crate::scale::Scale::kind);
    let (Some(x), Some(y)) = (kind("x"), kind("y")) else {
        return if scales.contains_key("x") { Axis::X } else { Axis::Y };
    };
    if x != ScaleKind::Nominal && y == ScaleKind::Nominal {
        Axis::Y
    } else if x != ScaleKind::Continuous && y == ScaleKind::Continuous {
        Axis::X
    } else if x == ScaleKind::Continuous && y != ScaleKind::Continuous {
        Axis::Y
    } else {
        Axis::X
    }
}
