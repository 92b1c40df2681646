//! Rasterization of the shapes figures are made of.
//!
//! Everything clips against the canvas; shapes partly or wholly outside it
//! are drawn as far as they overlap and never panic.

use crate::color::Rgba;
use crate::framebuffer::Framebuffer;
use crate::geometry::{Line, Point, Rect};

/// A shape that can rasterize itself.
pub trait Drawable {
    /// Draw with hard pixel edges.
    fn draw(&self, fb: &mut Framebuffer, color: Rgba);

    /// Draw with anti-aliased edges where the shape supports it.
    fn draw_aa(&self, fb: &mut Framebuffer, color: Rgba) {
        self.draw(fb, color);
    }
}

// ============================================================================
// Lines
// ============================================================================

/// Bresenham line between integer endpoints.
pub fn draw_line(fb: &mut Framebuffer, from: (i32, i32), to: (i32, i32), color: Rgba) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let step_x = (to.0 - x).signum();
    let step_y = (to.1 - y).signum();
    let mut err = dx + dy;

    loop {
        put(fb, x, y, color);
        if (x, y) == to {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += step_x;
        }
        if doubled <= dx {
            err += dx;
            y += step_y;
        }
    }
}

/// Xiaolin Wu's anti-aliased line.
///
/// Each step along the major axis covers the two pixels straddling the
/// ideal line, weighted by distance.
pub fn draw_line_aa(fb: &mut Framebuffer, from: Point, to: Point, color: Rgba) {
    let steep = (to.y - from.y).abs() > (to.x - from.x).abs();
    // Work along x; transpose back when plotting steep lines.
    let (mut a, mut b) = if steep {
        (Point::new(from.y, from.x), Point::new(to.y, to.x))
    } else {
        (from, to)
    };
    if a.x > b.x {
        std::mem::swap(&mut a, &mut b);
    }
    let mut plot = |major: i32, minor: i32, coverage: f32| {
        let (x, y) = if steep { (minor, major) } else { (major, minor) };
        blend(fb, x, y, color, coverage);
    };

    let run = b.x - a.x;
    let gradient = if run.abs() < f32::EPSILON { 1.0 } else { (b.y - a.y) / run };

    let mut endpoint = |p: Point, gap: f32| -> (i32, f32) {
        let major = p.x.round();
        let minor = p.y + gradient * (major - p.x);
        let base = minor.floor() as i32;
        plot(major as i32, base, (1.0 - fract(minor)) * gap);
        plot(major as i32, base + 1, fract(minor) * gap);
        (major as i32, minor)
    };
    let (first, minor_start) = endpoint(a, 1.0 - fract(a.x + 0.5));
    let (last, _) = endpoint(b, fract(b.x + 0.5));

    let mut minor = minor_start + gradient;
    for major in first + 1..last {
        let base = minor.floor() as i32;
        plot(major, base, 1.0 - fract(minor));
        plot(major, base + 1, fract(minor));
        minor += gradient;
    }
}

fn fract(v: f32) -> f32 {
    v - v.floor()
}

fn put(fb: &mut Framebuffer, x: i32, y: i32, color: Rgba) {
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
        fb.set_pixel(x, y, color);
    }
}

fn blend(fb: &mut Framebuffer, x: i32, y: i32, color: Rgba, coverage: f32) {
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
        let alpha = (f32::from(color.a) * coverage.clamp(0.0, 1.0)) as u8;
        fb.blend_pixel(x, y, color.with_alpha(alpha));
    }
}

impl Drawable for Line {
    fn draw(&self, fb: &mut Framebuffer, color: Rgba) {
        let px = |p: Point| (p.x.round() as i32, p.y.round() as i32);
        draw_line(fb, px(self.start), px(self.end), color);
    }

    fn draw_aa(&self, fb: &mut Framebuffer, color: Rgba) {
        draw_line_aa(fb, self.start, self.end, color);
    }
}

// ============================================================================
// Rectangles
// ============================================================================

/// Fill `rect`.
pub fn fill_rect(fb: &mut Framebuffer, rect: Rect, color: Rgba) {
    if let Some((x0, y0, x1, y1)) = rect.pixel_bounds() {
        fb.fill_rect(x0, y0, x1 - x0, y1 - y0, color);
    }
}

/// Stroke the inside border of `rect` with bands `thickness` pixels wide.
pub fn stroke_rect(fb: &mut Framebuffer, rect: Rect, color: Rgba, thickness: u32) {
    let Some((x0, y0, x1, y1)) = rect.pixel_bounds() else {
        return;
    };
    let (w, h) = (x1 - x0, y1 - y0);
    let t = thickness.max(1).min(w).min(h);
    fb.fill_rect(x0, y0, w, t, color);
    fb.fill_rect(x0, y1 - t, w, t, color);
    fb.fill_rect(x0, y0, t, h, color);
    fb.fill_rect(x1 - t, y0, t, h, color);
}

impl Drawable for Rect {
    fn draw(&self, fb: &mut Framebuffer, color: Rgba) {
        fill_rect(fb, *self, color);
    }
}

// ============================================================================
// Circles
// ============================================================================

/// Visit the midpoint-circle octant offsets `(x, y)` with `x >= y`.
fn midpoint_octant(radius: i32, mut visit: impl FnMut(i32, i32)) {
    let (mut x, mut y) = (radius, 0);
    let mut err = 1 - radius;
    while x >= y {
        visit(x, y);
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Filled disc of `radius` pixels around `center`.
pub fn fill_circle(fb: &mut Framebuffer, center: Point, radius: f32, color: Rgba) {
    let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
    let radius = radius.round() as i32;
    if radius <= 0 {
        put(fb, cx, cy, color);
        return;
    }
    let mut span = |y: i32, half: i32| {
        let row = Rect::new((cx - half) as f32, y as f32, (2 * half + 1) as f32, 1.0);
        fill_rect(fb, row, color);
    };
    midpoint_octant(radius, |x, y| {
        span(cy + y, x);
        span(cy - y, x);
        span(cy + x, y);
        span(cy - x, y);
    });
}

/// One-pixel circle of `radius` pixels around `center`.
pub fn stroke_circle(fb: &mut Framebuffer, center: Point, radius: f32, color: Rgba) {
    let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
    let radius = radius.round() as i32;
    if radius <= 0 {
        put(fb, cx, cy, color);
        return;
    }
    midpoint_octant(radius, |x, y| {
        for (dx, dy) in [(x, y), (y, x)] {
            put(fb, cx + dx, cy + dy, color);
            put(fb, cx - dx, cy + dy, color);
            put(fb, cx + dx, cy - dy, color);
            put(fb, cx - dx, cy - dy, color);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Framebuffer {
        let mut fb = Framebuffer::new(40, 40).unwrap();
        fb.clear(Rgba::WHITE);
        fb
    }

    #[test]
    fn test_line_covers_both_endpoints() {
        let mut fb = canvas();
        draw_line(&mut fb, (2, 3), (30, 17), Rgba::BLACK);
        assert_eq!(fb.get_pixel(2, 3), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(30, 17), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(30, 3), Some(Rgba::WHITE));
    }

    #[test]
    fn test_line_clips_off_canvas() {
        let mut fb = canvas();
        draw_line(&mut fb, (-10, 5), (60, 5), Rgba::RED);
        assert_eq!(fb.get_pixel(0, 5), Some(Rgba::RED));
        assert_eq!(fb.get_pixel(39, 5), Some(Rgba::RED));
    }

    #[test]
    fn test_aa_line_partial_coverage() {
        let mut fb = canvas();
        Line::from_coords(0.0, 10.0, 39.0, 20.5).draw_aa(&mut fb, Rgba::BLACK);
        let mid = fb.get_pixel(20, 15).unwrap();
        assert!(mid.r < 255, "line should darken pixels on its path");
        assert_eq!(fb.get_pixel(20, 35), Some(Rgba::WHITE));
    }

    #[test]
    fn test_fill_rect_from_negative_origin() {
        let mut fb = canvas();
        Rect::new(-5.0, -5.0, 10.0, 10.0).draw(&mut fb, Rgba::BLUE);
        assert_eq!(fb.get_pixel(0, 0), Some(Rgba::BLUE));
        assert_eq!(fb.get_pixel(4, 4), Some(Rgba::BLUE));
        assert_eq!(fb.get_pixel(5, 5), Some(Rgba::WHITE));
    }

    #[test]
    fn test_stroke_rect_leaves_interior() {
        let mut fb = canvas();
        stroke_rect(&mut fb, Rect::new(5.0, 5.0, 20.0, 10.0), Rgba::BLACK, 2);
        assert_eq!(fb.get_pixel(5, 5), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(24, 14), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(6, 6), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(15, 10), Some(Rgba::WHITE));
    }

    #[test]
    fn test_circles() {
        let mut fb = canvas();
        let center = Point::new(20.0, 20.0);
        fill_circle(&mut fb, center, 5.0, Rgba::RED);
        assert_eq!(fb.get_pixel(20, 20), Some(Rgba::RED));
        assert_eq!(fb.get_pixel(25, 20), Some(Rgba::RED));
        assert_eq!(fb.get_pixel(27, 20), Some(Rgba::WHITE));

        let mut fb = canvas();
        stroke_circle(&mut fb, center, 5.0, Rgba::RED);
        assert_eq!(fb.get_pixel(25, 20), Some(Rgba::RED));
        assert_eq!(fb.get_pixel(20, 20), Some(Rgba::WHITE));
    }

    #[test]
    fn test_degenerate_circle_is_single_pixel() {
        let mut fb = canvas();
        fill_circle(&mut fb, Point::new(3.0, 3.0), 0.2, Rgba::GREEN);
        assert_eq!(fb.get_pixel(3, 3), Some(Rgba::GREEN));
        assert_eq!(fb.get_pixel(4, 3), Some(Rgba::WHITE));
        stroke_circle(&mut fb, Point::new(-3.0, 3.0), 2.0, Rgba::GREEN);
    }
}
