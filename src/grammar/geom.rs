//! Built-in marks.
//!
//! Defines visual representations of data: [`Dot`] draws one marker per
//! row, [`Bar`] one rectangle per row and [`Line`] one path per group.

use super::data::{DataFrame, DataValue};
use super::mark::{Mark, Split, Visual};
use super::properties::{Axis, Mapped, Property};
use crate::color::{Rgba, DEEP};
use crate::error::{Error, Result};
use crate::render::{Artist, Axes, AxesId, Figure};
use crate::scale::Scales;

/// Shape types for point geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointShape {
    /// Filled circle.
    #[default]
    Circle,
    /// Filled square.
    Square,
    /// Filled triangle.
    Triangle,
    /// Diamond shape.
    Diamond,
    /// Cross (+).
    Cross,
    /// X shape.
    X,
}

fn axes_mut(figure: &mut Figure, id: AxesId) -> Result<&mut Axes> {
    figure.get_mut(id).ok_or_else(|| Error::Rendering(format!("figure has no axes #{}", id.index())))
}

fn number(data: &DataFrame, var: &str, row: usize) -> Option<f64> {
    data.value(var, row).and_then(DataValue::as_f64).filter(|v| v.is_finite())
}

// ============================================================================
// Dot
// ============================================================================

/// A marker per observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Dot {
    color: Rgba,
    pointsize: f64,
    marker: PointShape,
    alpha: f64,
}

impl Default for Dot {
    fn default() -> Self {
        Self { color: DEEP[0], pointsize: 6.0, marker: PointShape::Circle, alpha: 1.0 }
    }
}

impl Dot {
    /// Dot with default properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unmapped color.
    #[must_use]
    pub fn color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// Set the unmapped point size.
    #[must_use]
    pub fn pointsize(mut self, size: f64) -> Self {
        self.pointsize = size;
        self
    }

    /// Set the unmapped marker.
    #[must_use]
    pub fn marker(mut self, marker: PointShape) -> Self {
        self.marker = marker;
        self
    }

    /// Set the unmapped opacity.
    #[must_use]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

impl Mark for Dot {
    fn name(&self) -> &'static str {
        "dot"
    }

    fn default_value(&self, property: Property) -> Mapped {
        match property {
            Property::Color => Mapped::Color(self.color),
            Property::Fill => Mapped::Bool(true),
            Property::Alpha => Mapped::Number(self.alpha),
            Property::PointSize => Mapped::Number(self.pointsize),
            Property::LineWidth => Mapped::Number(0.75),
            Property::Marker => Mapped::Marker(self.marker),
            Property::Coordinate(_) | Property::Other => Mapped::Missing,
        }
    }

    fn plot(
        &self,
        splits: &mut dyn Iterator<Item = Split>,
        scales: &Scales,
        _orient: Axis,
        figure: &mut Figure,
    ) -> Result<()> {
        for split in splits {
            let axes = axes_mut(figure, split.axes)?;
            for row in 0..split.data.nrow() {
                let (Some(x), Some(y)) = (number(&split.data, "x", row), number(&split.data, "y", row)) else {
                    continue;
                };
                let visual = self.visual(&split.data, row, scales);
                axes.add_artist(point_artist(x, y, &visual));
            }
        }
        Ok(())
    }

    fn legend_artist(&self, variables: &[String], value: &DataValue, scales: &Scales) -> Artist {
        point_artist(0.0, 0.0, &self.legend_visual(variables, value, scales))
    }
}

fn point_artist(x: f64, y: f64, visual: &Visual) -> Artist {
    Artist::Point {
        x,
        y,
        size: visual.pointsize,
        color: visual.rgba(),
        marker: visual.marker,
        filled: visual.fill,
    }
}

// ============================================================================
// Bar
// ============================================================================

/// A rectangle per observation, from a baseline to the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    color: Rgba,
    alpha: f64,
    width: f64,
    baseline: f64,
}

impl Default for Bar {
    fn default() -> Self {
        Self { color: DEEP[0], alpha: 0.7, width: 0.8, baseline: 0.0 }
    }
}

impl Bar {
    /// Bar with default properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unmapped color.
    #[must_use]
    pub fn color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// Set the unmapped opacity.
    #[must_use]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Bar width as a fraction of the spacing between positions.
    #[must_use]
    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Value bars start from when the data has no `baseline` column.
    #[must_use]
    pub fn baseline(mut self, baseline: f64) -> Self {
        self.baseline = baseline;
        self
    }
}

impl Mark for Bar {
    fn name(&self) -> &'static str {
        "bar"
    }

    fn width(&self) -> Option<f64> {
        Some(self.width)
    }

    fn baseline(&self) -> Option<f64> {
        Some(self.baseline)
    }

    fn default_value(&self, property: Property) -> Mapped {
        match property {
            Property::Color => Mapped::Color(self.color),
            Property::Fill => Mapped::Bool(true),
            Property::Alpha => Mapped::Number(self.alpha),
            Property::PointSize => Mapped::Number(6.0),
            Property::LineWidth => Mapped::Number(1.0),
            Property::Marker => Mapped::Marker(PointShape::Square),
            Property::Coordinate(_) | Property::Other => Mapped::Missing,
        }
    }

    fn plot(
        &self,
        splits: &mut dyn Iterator<Item = Split>,
        scales: &Scales,
        orient: Axis,
        figure: &mut Figure,
    ) -> Result<()> {
        let value_axis = orient.other();
        for split in splits {
            let axes = axes_mut(figure, split.axes)?;
            let data = &split.data;
            for row in 0..data.nrow() {
                let (Some(center), Some(value)) =
                    (number(data, orient.as_str(), row), number(data, value_axis.as_str(), row))
                else {
                    continue;
                };
                let width = number(data, "width", row).unwrap_or(self.width);
                let baseline = number(data, "baseline", row).unwrap_or(self.baseline);
                let visual = self.visual(data, row, scales);
                let (lo, hi) = (center - width / 2.0, center + width / 2.0);
                let (x0, x1, y0, y1) = match orient {
                    Axis::X => (lo, hi, baseline, value),
                    Axis::Y => (baseline, value, lo, hi),
                };
                axes.add_artist(bar_artist(x0, x1, y0, y1, &visual));
            }
        }
        Ok(())
    }

    fn legend_artist(&self, variables: &[String], value: &DataValue, scales: &Scales) -> Artist {
        bar_artist(0.0, 1.0, 0.0, 1.0, &self.legend_visual(variables, value, scales))
    }
}

fn bar_artist(x0: f64, x1: f64, y0: f64, y1: f64, visual: &Visual) -> Artist {
    let face = if visual.fill { visual.rgba() } else { Rgba::TRANSPARENT };
    Artist::Bar { x0, x1, y0, y1, color: face, edge: visual.color }
}

// ============================================================================
// Line
// ============================================================================

/// A path through each group's observations, sorted along the orientation axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    color: Rgba,
    linewidth: f64,
    alpha: f64,
}

impl Default for Line {
    fn default() -> Self {
        Self { color: DEEP[0], linewidth: 1.5, alpha: 1.0 }
    }
}

impl Line {
    /// Line with default properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unmapped color.
    #[must_use]
    pub fn color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// Set the unmapped line width.
    #[must_use]
    pub fn linewidth(mut self, width: f64) -> Self {
        self.linewidth = width;
        self
    }
}

impl Mark for Line {
    fn name(&self) -> &'static str {
        "line"
    }

    fn grouping_vars(&self) -> &'static [&'static str] {
        &["color", "alpha", "linewidth", "marker"]
    }

    fn default_value(&self, property: Property) -> Mapped {
        match property {
            Property::Color => Mapped::Color(self.color),
            Property::Fill => Mapped::Bool(true),
            Property::Alpha => Mapped::Number(self.alpha),
            Property::PointSize => Mapped::Number(0.0),
            Property::LineWidth => Mapped::Number(self.linewidth),
            Property::Marker => Mapped::Marker(PointShape::Circle),
            Property::Coordinate(_) | Property::Other => Mapped::Missing,
        }
    }

    fn plot(
        &self,
        splits: &mut dyn Iterator<Item = Split>,
        scales: &Scales,
        orient: Axis,
        figure: &mut Figure,
    ) -> Result<()> {
        for split in splits {
            let data = &split.data;
            let mut points: Vec<(f64, f64)> = (0..data.nrow())
                .filter_map(|row| Some((number(data, "x", row)?, number(data, "y", row)?)))
                .collect();
            if points.len() < 2 {
                continue;
            }
            match orient {
                Axis::X => points.sort_by(|a, b| a.0.total_cmp(&b.0)),
                Axis::Y => points.sort_by(|a, b| a.1.total_cmp(&b.1)),
            }
            let visual = self.visual(data, 0, scales);
            axes_mut(figure, split.axes)?.add_artist(Artist::Path {
                points,
                color: visual.rgba(),
                width: visual.linewidth,
            });
        }
        Ok(())
    }

    fn legend_artist(&self, variables: &[String], value: &DataValue, scales: &Scales) -> Artist {
        let visual = self.legend_visual(variables, value, scales);
        Artist::Path { points: vec![(0.0, 0.0), (1.0, 0.0)], color: visual.rgba(), width: visual.linewidth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::subplots::Share;
    use crate::scale::Scale;

    fn figure() -> Figure {
        let mut fig = Figure::new((4.0, 3.0));
        fig.build_grid(1, 1, &[(0, 0)], Share::All, Share::All).unwrap();
        fig
    }

    fn split(data: DataFrame) -> Split {
        Split { keys: Vec::new(), data, axes: AxesId(0) }
    }

    #[test]
    fn test_dot_draws_point_per_row() {
        let data = DataFrame::new()
            .with_column("x", [1.0, 2.0, f64::NAN])
            .unwrap()
            .with_column("y", [3.0, 4.0, 5.0])
            .unwrap();
        let mut fig = figure();
        Dot::new().plot(&mut std::iter::once(split(data)), &Scales::new(), Axis::X, &mut fig).unwrap();
        assert_eq!(fig.axes()[0].artists().len(), 2);
    }

    #[test]
    fn test_dot_uses_color_scale() {
        let data = DataFrame::new()
            .with_column("x", [1.0])
            .unwrap()
            .with_column("y", [1.0])
            .unwrap()
            .with_column("color", ["b"])
            .unwrap();
        let mut scales = Scales::new();
        scales.insert("color".into(), Scale::nominal(Property::Color, vec!["a".into(), "b".into()]));
        let mut fig = figure();
        Dot::new().plot(&mut std::iter::once(split(data)), &scales, Axis::X, &mut fig).unwrap();
        assert_eq!(fig.axes()[0].artists()[0].color(), Some(DEEP[1]));
    }

    #[test]
    fn test_bar_spans_width_from_baseline() {
        let data = DataFrame::new()
            .with_column("x", [1.0])
            .unwrap()
            .with_column("y", [5.0])
            .unwrap()
            .with_column("width", [0.5])
            .unwrap();
        let mut fig = figure();
        Bar::new().plot(&mut std::iter::once(split(data)), &Scales::new(), Axis::X, &mut fig).unwrap();
        match &fig.axes()[0].artists()[0] {
            Artist::Bar { x0, x1, y0, y1, .. } => assert_eq!((*x0, *x1, *y0, *y1), (0.75, 1.25, 0.0, 5.0)),
            other => panic!("expected bar, got {other:?}"),
        }
    }

    #[test]
    fn test_horizontal_bar_uses_baseline_column() {
        let data = DataFrame::new()
            .with_column("x", [4.0])
            .unwrap()
            .with_column("y", [0.0])
            .unwrap()
            .with_column("baseline", [1.0])
            .unwrap();
        let mut fig = figure();
        Bar::new().plot(&mut std::iter::once(split(data)), &Scales::new(), Axis::Y, &mut fig).unwrap();
        match &fig.axes()[0].artists()[0] {
            Artist::Bar { x0, x1, y0, y1, .. } => assert_eq!((*x0, *x1, *y0, *y1), (1.0, 4.0, -0.4, 0.4)),
            other => panic!("expected bar, got {other:?}"),
        }
    }

    #[test]
    fn test_line_sorts_along_orient() {
        let data = DataFrame::new()
            .with_column("x", [3.0, 1.0, 2.0])
            .unwrap()
            .with_column("y", [30.0, 10.0, 20.0])
            .unwrap();
        let mut fig = figure();
        Line::new().plot(&mut std::iter::once(split(data)), &Scales::new(), Axis::X, &mut fig).unwrap();
        match &fig.axes()[0].artists()[0] {
            Artist::Path { points, .. } => assert_eq!(points[0], (1.0, 10.0)),
            other => panic!("expected path, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_axes_is_an_error() {
        let data = DataFrame::new().with_column("x", [1.0]).unwrap().with_column("y", [1.0]).unwrap();
        let mut fig = Figure::new((1.0, 1.0));
        let mut splits = std::iter::once(split(data));
        assert!(Dot::new().plot(&mut splits, &Scales::new(), Axis::X, &mut fig).is_err());
    }

    #[test]
    fn test_legend_artist_takes_mapped_value() {
        let mut scales = Scales::new();
        scales.insert("color".into(), Scale::nominal(Property::Color, vec!["a".into(), "b".into()]));
        let artist = Bar::new().legend_artist(&["color".to_string()], &DataValue::from("b"), &scales);
        assert!(matches!(artist, Artist::Bar { edge, .. } if edge == DEEP[1]));
    }
}
