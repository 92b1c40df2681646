//! Pixel-space geometry for laying out panels and marks.
//!
//! Coordinates are `f32` pixels with the origin at the top-left corner of
//! the canvas and `y` growing downwards.

/// A position on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate, downwards.
    pub y: f32,
}

impl Point {
    /// Point at `(x, y)`.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// This point moved by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// A straight segment between two canvas positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// First endpoint.
    pub start: Point,
    /// Second endpoint.
    pub end: Point,
}

impl Line {
    /// Segment from `start` to `end`.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Segment from `(x0, y0)` to `(x1, y1)`.
    #[must_use]
    pub const fn from_coords(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    /// The segment translated by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.start.offset(dx, dy), self.end.offset(dx, dy))
    }

    /// True when the segment runs closer to horizontal than vertical.
    #[must_use]
    pub fn is_shallow(&self) -> bool {
        (self.end.x - self.start.x).abs() >= (self.end.y - self.start.y).abs()
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Rect {
    /// Rectangle with top-left corner `(x, y)`.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest rectangle with `a` and `b` as opposite corners, in any order.
    ///
    /// Bars map their data corners through scales that may flip an axis, so
    /// either corner can end up top-left.
    #[must_use]
    pub fn spanning(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Square of half-side `half` around `center`.
    #[must_use]
    pub fn square(center: Point, half: f32) -> Self {
        Self::new(center.x - half, center.y - half, 2.0 * half, 2.0 * half)
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Midpoint of the rectangle.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Integer pixel bounds `(x0, y0, x1, y1)`, half-open and clamped at zero.
    ///
    /// Returns `None` when the rectangle lies entirely above or left of the
    /// canvas or has no area.
    #[must_use]
    pub fn pixel_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.round().max(0.0);
        let y0 = self.y.round().max(0.0);
        let x1 = self.right().round();
        let y1 = self.bottom().round();
        (x1 > x0 && y1 > y0).then(|| (x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}
