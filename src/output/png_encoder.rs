//! PNG output encoder.
//!
//! Pure Rust PNG encoding using the `png` crate. The resolution a figure
//! was rasterized at is recorded as the physical pixel density (`pHYs`).

use crate::error::Result;
use crate::framebuffer::Framebuffer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const METERS_PER_INCH: f64 = 0.0254;

/// PNG encoder for framebuffer output.
pub struct PngEncoder;

impl PngEncoder {
    /// Write a framebuffer to a PNG file, tagged with `dpi`.
    ///
    /// # Errors
    ///
    /// Returns an error if file creation or PNG encoding fails.
    pub fn write_to_file<P: AsRef<Path>>(fb: &Framebuffer, path: P, dpi: f64) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::encode(fb, &mut writer, Some(dpi))?;
        writer.flush()?;
        Ok(())
    }

    /// Encode a framebuffer to PNG bytes, optionally tagged with `dpi`.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn to_bytes(fb: &Framebuffer, dpi: Option<f64>) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        Self::encode(fb, &mut buffer, dpi)?;
        Ok(buffer)
    }

    fn encode<W: Write>(fb: &Framebuffer, out: W, dpi: Option<f64>) -> Result<()> {
        let mut encoder = png::Encoder::new(out, fb.width(), fb.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if let Some(dpi) = dpi.filter(|d| d.is_finite() && *d > 0.0) {
            let ppm = (dpi / METERS_PER_INCH).round() as u32;
            encoder.set_pixel_dims(Some(png::PixelDimensions { xppu: ppm, yppu: ppm, unit: png::Unit::Meter }));
        }

        let mut writer = encoder.write_header()?;
        // Use compact pixels to handle stride padding
        writer.write_image_data(&fb.to_compact_pixels())?;
        writer.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    /// `png::PixelDimensions` lacks `PartialEq`; compare field-wise.
    #[derive(Debug)]
    struct Dims(png::PixelDimensions);

    impl PartialEq for Dims {
        fn eq(&self, other: &Self) -> bool {
            self.0.xppu == other.0.xppu && self.0.yppu == other.0.yppu && self.0.unit == other.0.unit
        }
    }

    impl std::ops::Deref for Dims {
        type Target = png::PixelDimensions;
        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }

    fn decode_dims(bytes: &[u8]) -> (u32, u32, Option<Dims>) {
        let decoder = png::Decoder::new(bytes);
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        (info.width, info.height, info.pixel_dims.map(Dims))
    }

    #[test]
    fn test_png_to_bytes() {
        let mut fb = Framebuffer::new(10, 10).unwrap();
        fb.clear(Rgba::RED);

        let bytes = PngEncoder::to_bytes(&fb, None).unwrap();
        // PNG magic bytes
        assert_eq!(&bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        assert_eq!(decode_dims(&bytes), (10, 10, None));
    }

    #[test]
    fn test_png_records_pixel_density() {
        let fb = Framebuffer::new(4, 3).unwrap();
        let bytes = PngEncoder::to_bytes(&fb, Some(96.0)).unwrap();
        let (w, h, dims) = decode_dims(&bytes);
        assert_eq!((w, h), (4, 3));
        let dims = dims.unwrap();
        assert_eq!(dims.xppu, 3780);
        assert_eq!(dims.unit, png::Unit::Meter);
    }

    #[test]
    fn test_png_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let fb = Framebuffer::new(5, 5).unwrap();
        PngEncoder::write_to_file(&fb, &path, 72.0).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(decode_dims(&bytes).0, 5);
    }
}
