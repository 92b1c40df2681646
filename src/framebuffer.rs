//! Raster canvas that figures are drawn into.
//!
//! Rows are padded to a 64-byte stride so whole-canvas compositing runs
//! over aligned rows; trueno vectors do the arithmetic for compositing and
//! luminance statistics.

use crate::color::Rgba;
use crate::error::{Error, Result};
use trueno::Vector;

/// Row alignment in bytes (one AVX-512 register).
const ROW_ALIGNMENT: usize = 64;

/// RGBA8 pixel buffer with aligned rows.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    /// Bytes per row, including padding.
    stride: usize,
    pixels: Vec<u8>,
}

impl Framebuffer {
    /// Transparent canvas of `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either side is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use trueno_plot::framebuffer::Framebuffer;
    ///
    /// let fb = Framebuffer::new(640, 480).unwrap();
    /// assert_eq!((fb.width(), fb.height()), (640, 480));
    /// ```
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let stride = (width as usize * 4).next_multiple_of(ROW_ALIGNMENT);
        Ok(Self { width, height, stride, pixels: vec![0; stride * height as usize] })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.stride + x as usize * 4)
    }

    fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        let used = self.width as usize * 4;
        self.pixels.chunks_exact_mut(self.stride).map(move |row| &mut row[..used])
    }

    fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let used = self.width as usize * 4;
        self.pixels.chunks_exact(self.stride).map(move |row| &row[..used])
    }

    /// Paint every pixel with `color`.
    pub fn clear(&mut self, color: Rgba) {
        let rgba = color.to_array();
        for row in self.rows_mut() {
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
    }

    /// Paint a rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba) {
        let (x0, x1) = (x.min(self.width), x.saturating_add(w).min(self.width));
        let (y0, y1) = (y.min(self.height), y.saturating_add(h).min(self.height));
        let rgba = color.to_array();
        for row in self.rows_mut().skip(y0 as usize).take(y1.saturating_sub(y0) as usize) {
            for px in row[x0 as usize * 4..x1 as usize * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
    }

    /// Color at `(x, y)`, or `None` outside the canvas.
    #[must_use]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let i = self.offset(x, y)?;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[i..i + 4]);
        Some(Rgba::from_array(rgba))
    }

    /// Overwrite `(x, y)`; ignored outside the canvas.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i..i + 4].copy_from_slice(&color.to_array());
        }
    }

    /// Composite `color` over `(x, y)` with the "over" operator.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        let Some(i) = self.offset(x, y) else {
            return;
        };
        let src_a = f32::from(color.a) / 255.0;
        let dst_a = f32::from(self.pixels[i + 3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        for (channel, src) in [color.r, color.g, color.b].into_iter().enumerate() {
            let dst = f32::from(self.pixels[i + channel]);
            let out = (f32::from(src) * src_a + dst * dst_a * (1.0 - src_a)) / out_a;
            self.pixels[i + channel] = out.round().clamp(0.0, 255.0) as u8;
        }
        self.pixels[i + 3] = (out_a * 255.0).round() as u8;
    }

    /// Mix `layer` into this canvas at constant opacity `alpha`.
    ///
    /// Translucent artists are drawn opaque on a copy of the canvas and
    /// mixed back with this, so overlapping parts of one artist do not
    /// darken each other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the canvases differ in size.
    pub fn blend_over(&mut self, layer: &Framebuffer, alpha: f32) -> Result<()> {
        if (self.width, self.height) != (layer.width, layer.height) {
            return Err(Error::InvalidDimensions { width: layer.width, height: layer.height });
        }
        let alpha = alpha.clamp(0.0, 1.0);
        let n = self.width as usize * 4;
        let keep = Vector::from_vec(vec![1.0 - alpha; n]);
        let take = Vector::from_vec(vec![alpha; n]);

        let stride = self.stride;
        for (y, row) in self.rows_mut().enumerate() {
            let start = y * stride;
            let src = &layer.pixels[start..start + n];
            if src == &*row {
                continue;
            }
            let dst = Vector::from_vec(row.iter().map(|&b| f32::from(b)).collect());
            let src = Vector::from_vec(src.iter().map(|&b| f32::from(b)).collect());
            let mixed = dst.mul(&keep).and_then(|d| src.mul(&take).and_then(|s| d.add(&s)));
            let mixed = mixed.map_err(|e| Error::Rendering(format!("compositing failed: {e:?}")))?;
            for (out, v) in row.iter_mut().zip(mixed.as_slice()) {
                *out = v.round().clamp(0.0, 255.0) as u8;
            }
        }
        Ok(())
    }

    /// `(min, max, mean)` BT.709 luminance over all pixels.
    #[must_use]
    pub fn luminance_stats(&self) -> (f32, f32, f32) {
        let lum: Vec<f32> = self
            .rows()
            .flat_map(|row| row.chunks_exact(4))
            .map(|px| 0.2126 * f32::from(px[0]) + 0.7152 * f32::from(px[1]) + 0.0722 * f32::from(px[2]))
            .collect();
        let v = Vector::from_vec(lum);
        (v.min().unwrap_or(0.0), v.max().unwrap_or(0.0), v.mean().unwrap_or(0.0))
    }

    /// Tightly packed RGBA8 rows, as image encoders expect.
    #[must_use]
    pub fn to_compact_pixels(&self) -> Vec<u8> {
        self.rows().flatten().copied().collect()
    }
}
