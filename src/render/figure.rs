//! Figures: a grid of axes holding artists, plus legend blocks.
//!
//! This is the drawing surface the plot pipeline targets. Artists are kept
//! in data coordinates; each axis carries the transform of the scale that
//! governs it, and [`Figure::render`] maps everything to pixels. Text
//! (axis labels, titles, tick labels, legend labels) is kept as metadata
//! and not rasterized.

use super::primitives::{fill_circle, fill_rect, stroke_circle, stroke_rect, Drawable};
use crate::color::Rgba;
use crate::config::{Palette, StyleConfig};
use crate::error::{Error, Result};
use crate::framebuffer::Framebuffer;
use crate::geometry::{Line, Point, Rect};
use crate::grammar::data::DataValue;
use crate::grammar::geom::PointShape;
use crate::grammar::properties::Axis;
use crate::grammar::subplots::Share;
use crate::scale::{pretty_breaks, LinearScale, Transform};

/// Fraction of the data range added on each side when autoscaling.
const MARGIN: f64 = 0.05;

/// Handle to one axes of a [`Figure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxesId(pub(crate) usize);

impl AxesId {
    /// Position of the axes in [`Figure::axes`].
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

// ============================================================================
// Artists
// ============================================================================

/// A drawn element, in data coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Artist {
    /// A marker.
    Point {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
        /// Marker size in points.
        size: f64,
        /// Marker color.
        color: Rgba,
        /// Marker shape.
        marker: PointShape,
        /// Whether the marker is filled.
        filled: bool,
    },
    /// An axis-aligned rectangle.
    Bar {
        /// Left edge.
        x0: f64,
        /// Right edge.
        x1: f64,
        /// Lower edge.
        y0: f64,
        /// Upper edge.
        y1: f64,
        /// Fill color.
        color: Rgba,
        /// Edge color.
        edge: Rgba,
    },
    /// A polyline.
    Path {
        /// Vertices in drawing order.
        points: Vec<(f64, f64)>,
        /// Line color.
        color: Rgba,
        /// Line width in points.
        width: f64,
    },
    /// Several artists overlaid (legend entries shared by layers).
    Composite(Vec<Artist>),
}

impl Artist {
    /// The artist's main color.
    #[must_use]
    pub fn color(&self) -> Option<Rgba> {
        match self {
            Artist::Point { color, .. } | Artist::Bar { color, .. } | Artist::Path { color, .. } => Some(*color),
            Artist::Composite(parts) => parts.iter().find_map(Artist::color),
        }
    }

    /// Overlay another artist on this one.
    #[must_use]
    pub fn overlay(self, other: Artist) -> Artist {
        match self {
            Artist::Composite(mut parts) => {
                parts.push(other);
                Artist::Composite(parts)
            }
            single => Artist::Composite(vec![single, other]),
        }
    }

    fn visit_points(&self, f: &mut dyn FnMut(f64, f64)) {
        match self {
            Artist::Point { x, y, .. } => f(*x, *y),
            Artist::Bar { x0, x1, y0, y1, .. } => {
                f(*x0, *y0);
                f(*x1, *y1);
            }
            Artist::Path { points, .. } => points.iter().for_each(|&(x, y)| f(x, y)),
            Artist::Composite(parts) => parts.iter().for_each(|p| p.visit_points(f)),
        }
    }

    fn opaque(&self) -> Artist {
        let mut out = self.clone();
        match &mut out {
            Artist::Point { color, .. } | Artist::Path { color, .. } => *color = color.with_alpha(255),
            Artist::Bar { color, edge, .. } => {
                *color = color.with_alpha(255);
                *edge = edge.with_alpha(255);
            }
            Artist::Composite(parts) => *parts = parts.iter().map(Artist::opaque).collect(),
        }
        out
    }
}

// ============================================================================
// Axes
// ============================================================================

/// State of one axis (x or y) of an axes.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisState {
    transform: Transform,
    categories: Vec<String>,
    label: Option<String>,
    label_visible: bool,
    tick_labels_visible: bool,
    limits: Option<(f64, f64)>,
}

impl Default for AxisState {
    fn default() -> Self {
        Self {
            transform: Transform::Identity,
            categories: Vec::new(),
            label: None,
            label_visible: true,
            tick_labels_visible: true,
            limits: None,
        }
    }
}

impl AxisState {
    /// Transform from data to axis coordinates.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Install the transform of the governing scale.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Category labels of a nominal axis, in position order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Install category tick labels.
    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.categories = categories;
    }

    /// Axis label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Set the axis label.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Whether the label is shown.
    #[must_use]
    pub fn label_visible(&self) -> bool {
        self.label_visible
    }

    /// Show or hide the label.
    pub fn set_label_visible(&mut self, visible: bool) {
        self.label_visible = visible;
    }

    /// Whether tick labels are shown.
    #[must_use]
    pub fn tick_labels_visible(&self) -> bool {
        self.tick_labels_visible
    }

    /// Show or hide tick labels.
    pub fn set_tick_labels_visible(&mut self, visible: bool) {
        self.tick_labels_visible = visible;
    }

    /// View limits in axis coordinates, once autoscaled.
    #[must_use]
    pub fn limits(&self) -> Option<(f64, f64)> {
        self.limits
    }

    /// Tick positions (axis coordinates) with their labels.
    #[must_use]
    pub fn ticks(&self) -> Vec<(f64, String)> {
        if !self.categories.is_empty() {
            return self.categories.iter().enumerate().map(|(i, c)| (i as f64, c.clone())).collect();
        }
        let Some((lo, hi)) = self.limits else {
            return Vec::new();
        };
        pretty_breaks(lo, hi, 5)
            .into_iter()
            .filter(|t| *t >= lo && *t <= hi)
            .map(|t| {
                let value = self.transform.inverse(t);
                (t, DataValue::Number(value).to_string())
            })
            .collect()
    }
}

/// One drawable cell of a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    grid_pos: (usize, usize),
    x: AxisState,
    y: AxisState,
    title: Option<String>,
    title_visible: bool,
    artists: Vec<Artist>,
}

impl Axes {
    fn new(row: usize, col: usize) -> Self {
        Self {
            grid_pos: (row, col),
            x: AxisState::default(),
            y: AxisState::default(),
            title: None,
            title_visible: true,
            artists: Vec::new(),
        }
    }

    /// `(row, col)` of the cell in the figure grid.
    #[must_use]
    pub fn grid_position(&self) -> (usize, usize) {
        self.grid_pos
    }

    /// State of one axis.
    #[must_use]
    pub fn axis(&self, axis: Axis) -> &AxisState {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Mutable state of one axis.
    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisState {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    /// Title text.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the title text.
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    /// Whether the title is shown.
    #[must_use]
    pub fn title_visible(&self) -> bool {
        self.title_visible
    }

    /// Show or hide the title.
    pub fn set_title_visible(&mut self, visible: bool) {
        self.title_visible = visible;
    }

    /// Add an artist.
    pub fn add_artist(&mut self, artist: Artist) {
        self.artists.push(artist);
    }

    /// Artists in drawing order.
    #[must_use]
    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    /// Extent of the artists along `axis`, in axis coordinates.
    #[must_use]
    pub fn data_limits(&self, axis: Axis) -> Option<(f64, f64)> {
        let transform = self.axis(axis).transform;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for artist in &self.artists {
            artist.visit_points(&mut |x, y| {
                let v = transform.forward(if axis == Axis::X { x } else { y });
                if v.is_finite() {
                    lo = lo.min(v);
                    hi = hi.max(v);
                }
            });
        }
        (lo <= hi).then_some((lo, hi))
    }
}

// ============================================================================
// Figure
// ============================================================================

/// A titled group of legend entries.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendBlock {
    /// Block title (the variable's display name).
    pub title: Option<String>,
    /// Swatch artist and label per entry.
    pub entries: Vec<(Artist, String)>,
}

/// A grid of axes plus legends.
#[derive(Debug, Clone)]
pub struct Figure {
    size: (f64, f64),
    nrows: usize,
    ncols: usize,
    axes: Vec<Axes>,
    sharex: Share,
    sharey: Share,
    legends: Vec<LegendBlock>,
    style: StyleConfig,
    premade: bool,
}

impl Figure {
    /// Empty figure of the given size in inches.
    #[must_use]
    pub fn new(size: (f64, f64)) -> Self {
        Self {
            size,
            nrows: 0,
            ncols: 0,
            axes: Vec::new(),
            sharex: Share::All,
            sharey: Share::All,
            legends: Vec::new(),
            style: StyleConfig::default(),
            premade: false,
        }
    }

    /// Figure holding one pre-made axes; it can only host single-cell plots.
    #[must_use]
    pub fn with_single_axes(size: (f64, f64)) -> Self {
        let mut fig = Self::new(size);
        fig.axes.push(Axes::new(0, 0));
        fig.nrows = 1;
        fig.ncols = 1;
        fig.premade = true;
        fig
    }

    /// Figure size in inches.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    /// Change the figure size.
    pub fn set_size(&mut self, size: (f64, f64)) {
        self.size = size;
    }

    /// Drawing style.
    #[must_use]
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Replace the drawing style.
    pub fn set_style(&mut self, style: StyleConfig) {
        self.style = style;
    }

    /// Grid shape `(nrows, ncols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// All axes, in creation order.
    #[must_use]
    pub fn axes(&self) -> &[Axes] {
        &self.axes
    }

    /// One axes.
    #[must_use]
    pub fn get(&self, id: AxesId) -> Option<&Axes> {
        self.axes.get(id.0)
    }

    /// One axes, mutably.
    pub fn get_mut(&mut self, id: AxesId) -> Option<&mut Axes> {
        self.axes.get_mut(id.0)
    }

    /// Whether this figure was created around a single pre-made axes.
    #[must_use]
    pub fn has_premade_axes(&self) -> bool {
        self.premade
    }

    /// Attached legend blocks, in attachment order.
    #[must_use]
    pub fn legends(&self) -> &[LegendBlock] {
        &self.legends
    }

    /// Attach a legend block.
    pub fn add_legend(&mut self, block: LegendBlock) {
        self.legends.push(block);
    }

    /// Create one axes per `(row, col)` cell of an `nrows` x `ncols` grid.
    ///
    /// Cells not listed stay empty. A figure with a pre-made axes reuses
    /// it for a single cell.
    ///
    /// # Errors
    ///
    /// Fails if a pre-made axes is asked to host several cells, or the
    /// figure already holds a grid.
    pub fn build_grid(
        &mut self,
        nrows: usize,
        ncols: usize,
        cells: &[(usize, usize)],
        sharex: Share,
        sharey: Share,
    ) -> Result<Vec<AxesId>> {
        if self.premade {
            if cells.len() != 1 {
                return Err(Error::config(format!(
                    "cannot create a {nrows}x{ncols} grid on a figure with a single pre-made axes"
                )));
            }
            self.sharex = sharex;
            self.sharey = sharey;
            return Ok(vec![AxesId(0)]);
        }
        if !self.axes.is_empty() {
            return Err(Error::config("target figure already holds subplots"));
        }

        self.nrows = nrows;
        self.ncols = ncols;
        self.sharex = sharex;
        self.sharey = sharey;
        self.axes = cells.iter().map(|&(r, c)| Axes::new(r, c)).collect();
        Ok((0..self.axes.len()).map(AxesId).collect())
    }

    /// Fit the view limits of `id`, and of every axes sharing with it, to
    /// their artists.
    ///
    /// Nominal axes span their categories; other axes get a small margin
    /// around the data.
    pub fn autoscale(&mut self, id: AxesId) {
        if id.0 >= self.axes.len() {
            return;
        }
        for axis in Axis::BOTH {
            let group = self.share_group(id, axis);
            let limits = self.group_limits(&group, axis);
            for i in group {
                self.axes[i].axis_mut(axis).limits = limits;
            }
        }
    }

    fn share_group(&self, id: AxesId, axis: Axis) -> Vec<usize> {
        let share = match axis {
            Axis::X => self.sharex,
            Axis::Y => self.sharey,
        };
        let (row, col) = self.axes[id.0].grid_pos;
        (0..self.axes.len())
            .filter(|&i| match share {
                Share::All => true,
                Share::None => i == id.0,
                Share::Row => self.axes[i].grid_pos.0 == row,
                Share::Col => self.axes[i].grid_pos.1 == col,
            })
            .collect()
    }

    fn group_limits(&self, group: &[usize], axis: Axis) -> Option<(f64, f64)> {
        let n_categories = group.iter().map(|&i| self.axes[i].axis(axis).categories.len()).max().unwrap_or(0);
        if n_categories > 0 {
            return Some((-0.5, n_categories as f64 - 0.5));
        }
        let (lo, hi) = group
            .iter()
            .filter_map(|&i| self.axes[i].data_limits(axis))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)));
        if lo > hi {
            return None;
        }
        let pad = if hi > lo { (hi - lo) * MARGIN } else { 0.5 };
        Some((lo - pad, hi + pad))
    }

    /// Rasterize the figure at `dpi` pixels per inch.
    ///
    /// # Errors
    ///
    /// Fails for a figure size that rounds to zero pixels or a malformed
    /// style colour.
    pub fn render(&self, dpi: f64) -> Result<Framebuffer> {
        let width = (self.size.0 * dpi).round().max(0.0) as u32;
        let height = (self.size.1 * dpi).round().max(0.0) as u32;
        let mut fb = Framebuffer::new(width, height)?;
        let palette = self.style.palette()?;
        fb.clear(palette.background);

        let px_per_pt = (dpi / 72.0) as f32;
        let (w, h) = (width as f32, height as f32);
        let margin = (self.style.margin as f32) * w.min(h);
        let legend_w = if self.legends.is_empty() { 0.0 } else { (self.style.legend_width as f32) * w };
        let area = Rect::new(margin, margin, (w - legend_w - 2.0 * margin).max(1.0), (h - 2.0 * margin).max(1.0));

        for axes in &self.axes {
            let panel = self.panel_rect(area, axes.grid_pos);
            self.render_axes(&mut fb, axes, panel, &palette, px_per_pt)?;
        }

        if !self.legends.is_empty() {
            let origin = Point::new(w - legend_w + margin / 2.0, margin);
            self.render_legends(&mut fb, origin, px_per_pt);
        }

        Ok(fb)
    }

    fn panel_rect(&self, area: Rect, (row, col): (usize, usize)) -> Rect {
        let cell_w = area.width / self.ncols.max(1) as f32;
        let cell_h = area.height / self.nrows.max(1) as f32;
        let pad_x = cell_w * 0.1;
        let pad_y = cell_h * 0.1;
        Rect::new(
            area.x + col as f32 * cell_w + pad_x,
            area.y + row as f32 * cell_h + pad_y / 2.0,
            cell_w - 1.5 * pad_x,
            cell_h - 1.5 * pad_y,
        )
    }

    fn render_axes(
        &self,
        fb: &mut Framebuffer,
        axes: &Axes,
        panel: Rect,
        palette: &Palette,
        px_per_pt: f32,
    ) -> Result<()> {
        fill_rect(fb, panel, palette.panel_background);

        let (x_lo, x_hi) = axes.x.limits.unwrap_or((0.0, 1.0));
        let (y_lo, y_hi) = axes.y.limits.unwrap_or((0.0, 1.0));
        let map = PanelMap {
            x: LinearScale::new((x_lo, x_hi), (f64::from(panel.x), f64::from(panel.right())))?,
            y: LinearScale::new((y_lo, y_hi), (f64::from(panel.bottom()), f64::from(panel.y)))?,
            xt: axes.x.transform,
            yt: axes.y.transform,
        };

        if self.style.show_grid {
            for (t, _) in axes.x.ticks() {
                let px = map.x.map(t) as f32;
                Line::from_coords(px, panel.y, px, panel.bottom()).draw(fb, palette.grid);
            }
            for (t, _) in axes.y.ticks() {
                let py = map.y.map(t) as f32;
                Line::from_coords(panel.x, py, panel.right(), py).draw(fb, palette.grid);
            }
        }

        let alpha_of = |a: &Artist| a.color().map_or(255, |c| c.a);
        let artists = axes.artists();
        let mut start = 0;
        while start < artists.len() {
            let alpha = alpha_of(&artists[start]);
            let end = artists[start..].iter().position(|a| alpha_of(a) != alpha).map_or(artists.len(), |n| start + n);
            if alpha == 255 {
                for artist in &artists[start..end] {
                    draw_artist(fb, artist, &map, px_per_pt);
                }
            } else {
                let mut layer = fb.clone();
                for artist in &artists[start..end] {
                    draw_artist(&mut layer, &artist.opaque(), &map, px_per_pt);
                }
                fb.blend_over(&layer, f32::from(alpha) / 255.0)?;
            }
            start = end;
        }

        let bottom = panel.bottom();
        Line::from_coords(panel.x, bottom, panel.right(), bottom).draw(fb, palette.axis);
        Line::from_coords(panel.x, panel.y, panel.x, bottom).draw(fb, palette.axis);
        if axes.x.tick_labels_visible {
            for (t, _) in axes.x.ticks() {
                let px = map.x.map(t) as f32;
                Line::from_coords(px, bottom, px, bottom + 3.0 * px_per_pt).draw(fb, palette.axis);
            }
        }
        if axes.y.tick_labels_visible {
            for (t, _) in axes.y.ticks() {
                let py = map.y.map(t) as f32;
                Line::from_coords(panel.x - 3.0 * px_per_pt, py, panel.x, py).draw(fb, palette.axis);
            }
        }
        Ok(())
    }

    fn render_legends(&self, fb: &mut Framebuffer, origin: Point, px_per_pt: f32) {
        let row_h = 12.0 * px_per_pt;
        let mut y = origin.y;
        for block in &self.legends {
            y += row_h;
            for (artist, _) in &block.entries {
                draw_swatch(fb, artist, Point::new(origin.x + row_h / 2.0, y + row_h / 2.0), px_per_pt);
                y += row_h;
            }
        }
    }
}

/// Data to pixel mapping for one panel.
struct PanelMap {
    x: LinearScale,
    y: LinearScale,
    xt: Transform,
    yt: Transform,
}

impl PanelMap {
    fn to_px(&self, x: f64, y: f64) -> Option<Point> {
        let tx = self.xt.forward(x);
        let ty = self.yt.forward(y);
        (tx.is_finite() && ty.is_finite()).then(|| Point::new(self.x.map(tx) as f32, self.y.map(ty) as f32))
    }
}

fn draw_artist(fb: &mut Framebuffer, artist: &Artist, map: &PanelMap, px_per_pt: f32) {
    match artist {
        Artist::Point { x, y, size, color, marker, filled } => {
            if let Some(center) = map.to_px(*x, *y) {
                draw_marker(fb, center, (*size as f32) * px_per_pt, *marker, *filled, *color);
            }
        }
        Artist::Bar { x0, x1, y0, y1, color, edge } => {
            if let (Some(a), Some(b)) = (map.to_px(*x0, *y0), map.to_px(*x1, *y1)) {
                let rect = Rect::spanning(a, b);
                rect.draw(fb, *color);
                stroke_rect(fb, rect, *edge, 1);
            }
        }
        Artist::Path { points, color, width } => {
            let pixels: Vec<Option<Point>> = points.iter().map(|&(x, y)| map.to_px(x, y)).collect();
            for pair in pixels.windows(2) {
                if let (Some(a), Some(b)) = (pair[0], pair[1]) {
                    draw_thick_line(fb, Line::new(a, b), (*width as f32) * px_per_pt, *color);
                }
            }
        }
        Artist::Composite(parts) => parts.iter().for_each(|p| draw_artist(fb, p, map, px_per_pt)),
    }
}

fn draw_swatch(fb: &mut Framebuffer, artist: &Artist, center: Point, px_per_pt: f32) {
    match artist {
        Artist::Point { size, color, marker, filled, .. } => {
            draw_marker(fb, center, (*size as f32) * px_per_pt, *marker, *filled, *color);
        }
        Artist::Bar { color, edge, .. } => {
            let rect = Rect::square(center, 4.0 * px_per_pt);
            rect.draw(fb, *color);
            stroke_rect(fb, rect, *edge, 1);
        }
        Artist::Path { color, width, .. } => {
            let half = 6.0 * px_per_pt;
            let stroke = Line::new(center.offset(-half, 0.0), center.offset(half, 0.0));
            draw_thick_line(fb, stroke, (*width as f32) * px_per_pt, *color);
        }
        Artist::Composite(parts) => parts.iter().for_each(|p| draw_swatch(fb, p, center, px_per_pt)),
    }
}

fn draw_marker(fb: &mut Framebuffer, c: Point, diameter: f32, marker: PointShape, filled: bool, color: Rgba) {
    let r = (diameter / 2.0).max(1.0);
    let segments: &[(f32, f32, f32, f32)] = match marker {
        PointShape::Circle => {
            if filled {
                fill_circle(fb, c, r, color);
            } else {
                stroke_circle(fb, c, r, color);
            }
            return;
        }
        PointShape::Square => {
            if filled {
                fill_rect(fb, Rect::square(c, r), color);
            } else {
                stroke_rect(fb, Rect::square(c, r), color, 1);
            }
            return;
        }
        PointShape::Cross => &[(-1.0, 0.0, 1.0, 0.0), (0.0, -1.0, 0.0, 1.0)],
        PointShape::X => &[(-0.7, -0.7, 0.7, 0.7), (-0.7, 0.7, 0.7, -0.7)],
        PointShape::Diamond => &[(0.0, -1.0, 1.0, 0.0), (1.0, 0.0, 0.0, 1.0), (0.0, 1.0, -1.0, 0.0), (-1.0, 0.0, 0.0, -1.0)],
        PointShape::Triangle => &[(0.0, -1.0, 0.87, 0.5), (0.87, 0.5, -0.87, 0.5), (-0.87, 0.5, 0.0, -1.0)],
    };
    for &(x0, y0, x1, y1) in segments {
        Line::from_coords(c.x + x0 * r, c.y + y0 * r, c.x + x1 * r, c.y + y1 * r).draw_aa(fb, color);
    }
}

/// Parallel anti-aliased strokes, offset across the segment's minor axis.
fn draw_thick_line(fb: &mut Framebuffer, line: Line, width: f32, color: Rgba) {
    let strokes = width.round().max(1.0) as i32;
    let shallow = line.is_shallow();
    for k in 0..strokes {
        let off = k as f32 - (strokes - 1) as f32 / 2.0;
        let (dx, dy) = if shallow { (0.0, off) } else { (off, 0.0) };
        line.offset(dx, dy).draw_aa(fb, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> Artist {
        Artist::Point { x, y, size: 6.0, color: Rgba::BLUE, marker: PointShape::Circle, filled: true }
    }

    fn grid(sharex: Share) -> Figure {
        let mut fig = Figure::new((4.0, 3.0));
        fig.build_grid(1, 2, &[(0, 0), (0, 1)], sharex, Share::None).unwrap();
        fig
    }

    #[test]
    fn test_build_grid_positions() {
        let fig = grid(Share::All);
        assert_eq!(fig.shape(), (1, 2));
        assert_eq!(fig.axes()[1].grid_position(), (0, 1));
    }

    #[test]
    fn test_premade_axes_rejects_grid() {
        let mut fig = Figure::with_single_axes((4.0, 3.0));
        assert!(fig.build_grid(1, 2, &[(0, 0), (0, 1)], Share::All, Share::All).is_err());
        assert_eq!(fig.build_grid(1, 1, &[(0, 0)], Share::All, Share::All).unwrap(), vec![AxesId(0)]);
    }

    #[test]
    fn test_build_grid_twice_fails() {
        let mut fig = grid(Share::All);
        assert!(fig.build_grid(1, 1, &[(0, 0)], Share::All, Share::All).is_err());
    }

    #[test]
    fn test_autoscale_adds_margin() {
        let mut fig = grid(Share::None);
        fig.get_mut(AxesId(0)).unwrap().add_artist(point(0.0, 0.0));
        fig.get_mut(AxesId(0)).unwrap().add_artist(point(10.0, 20.0));
        fig.autoscale(AxesId(0));
        assert_eq!(fig.axes()[0].axis(Axis::X).limits(), Some((-0.5, 10.5)));
        assert_eq!(fig.axes()[0].axis(Axis::Y).limits(), Some((-1.0, 21.0)));
        assert_eq!(fig.axes()[1].axis(Axis::X).limits(), None);
    }

    #[test]
    fn test_autoscale_shared_axes() {
        let mut fig = grid(Share::All);
        fig.get_mut(AxesId(0)).unwrap().add_artist(point(0.0, 0.0));
        fig.get_mut(AxesId(1)).unwrap().add_artist(point(10.0, 1.0));
        fig.autoscale(AxesId(0));
        assert_eq!(fig.axes()[0].axis(Axis::X).limits(), fig.axes()[1].axis(Axis::X).limits());
        assert_ne!(fig.axes()[0].axis(Axis::Y).limits(), fig.axes()[1].axis(Axis::Y).limits());
    }

    #[test]
    fn test_autoscale_nominal_axis() {
        let mut fig = grid(Share::None);
        let axes = fig.get_mut(AxesId(0)).unwrap();
        axes.axis_mut(Axis::X).set_categories(vec!["a".into(), "b".into(), "c".into()]);
        axes.add_artist(point(1.0, 1.0));
        fig.autoscale(AxesId(0));
        assert_eq!(fig.axes()[0].axis(Axis::X).limits(), Some((-0.5, 2.5)));
        let ticks = fig.axes()[0].axis(Axis::X).ticks();
        assert_eq!(ticks[2], (2.0, "c".to_string()));
    }

    #[test]
    fn test_log_axis_limits_in_transformed_space() {
        let mut fig = grid(Share::None);
        let axes = fig.get_mut(AxesId(0)).unwrap();
        axes.axis_mut(Axis::Y).set_transform(Transform::Log { base: 10.0 });
        axes.add_artist(point(0.0, 1.0));
        axes.add_artist(point(1.0, 100.0));
        assert_eq!(axes.data_limits(Axis::Y), Some((0.0, 2.0)));
    }

    #[test]
    fn test_render_draws_artists() {
        let mut fig = grid(Share::None);
        fig.get_mut(AxesId(0)).unwrap().add_artist(point(0.0, 0.0));
        fig.get_mut(AxesId(0)).unwrap().add_artist(point(1.0, 1.0));
        fig.autoscale(AxesId(0));
        let fb = fig.render(50.0).unwrap();
        assert_eq!((fb.width(), fb.height()), (200, 150));
        let (min, _, _) = fb.luminance_stats();
        assert!(min < 100.0, "expected dark marker pixels, min luminance {min}");
    }

    #[test]
    fn test_render_translucent_artists_blend() {
        let mut fig = Figure::new((1.0, 1.0));
        fig.build_grid(1, 1, &[(0, 0)], Share::All, Share::All).unwrap();
        let bar = Artist::Bar {
            x0: 0.0,
            x1: 1.0,
            y0: 0.0,
            y1: 1.0,
            color: Rgba::new(0, 0, 0, 128),
            edge: Rgba::new(0, 0, 0, 128),
        };
        fig.get_mut(AxesId(0)).unwrap().add_artist(bar);
        fig.autoscale(AxesId(0));
        let fb = fig.render(100.0).unwrap();
        let center = fb.get_pixel(50, 50).unwrap();
        assert!(center.r > 60 && center.r < 200, "half-transparent bar should blend, got {center:?}");
    }

    #[test]
    fn test_render_zero_size_fails() {
        assert!(Figure::new((0.0, 1.0)).render(96.0).is_err());
    }

    #[test]
    fn test_overlay_builds_composite() {
        let combined = point(0.0, 0.0).overlay(point(1.0, 1.0)).overlay(point(2.0, 2.0));
        assert!(matches!(combined, Artist::Composite(ref parts) if parts.len() == 3));
        assert_eq!(combined.color(), Some(Rgba::BLUE));
    }
}
