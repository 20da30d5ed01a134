//! CPU color buffers.

use std::path::Path;

/// Linear RGBA color, one `f32` per channel.
pub type Rgba = [f32; 4];

/// A width x height buffer of linear colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Frame {
    /// A frame filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0.0; 4])
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn fill(&mut self, color: Rgba) {
        self.pixels.iter_mut().for_each(|p| *p = color);
    }

    /// Copy another frame of the same size into this one.
    pub fn copy_from(&mut self, other: &Frame) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        self.pixels.copy_from_slice(&other.pixels);
    }

    /// `self = current * (1 - ratio) + history * ratio`, channel by channel.
    ///
    /// Written as `c + (h - c) * ratio`, which returns `c` unchanged when the
    /// two inputs agree.
    pub fn mix_into(&mut self, current: &Frame, history: &Frame, ratio: f32) {
        debug_assert_eq!(self.pixels.len(), current.pixels.len());
        debug_assert_eq!(self.pixels.len(), history.pixels.len());
        for ((out, c), h) in self
            .pixels
            .iter_mut()
            .zip(current.pixels.iter())
            .zip(history.pixels.iter())
        {
            *out = std::array::from_fn(|ch| c[ch] + (h[ch] - c[ch]) * ratio);
        }
    }

    /// Quantize to 8-bit RGBA, clamping out-of-range values.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    /// Write the frame as a PNG.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        save_rgba8_png(path, self.width, self.height, self.to_rgba8())
    }
}

/// Write tightly packed RGBA8 pixels as a PNG.
pub fn save_rgba8_png(
    path: &Path,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
) -> Result<(), image::ImageError> {
    let image = image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        image::ImageError::Parameter(image::error::ParameterError::from_kind(
            image::error::ParameterErrorKind::DimensionMismatch,
        ))
    })?;
    image.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_weights() {
        let current = Frame::filled(2, 2, [1.0, 0.0, 0.0, 1.0]);
        let history = Frame::filled(2, 2, [0.0, 0.0, 1.0, 1.0]);
        let mut out = Frame::new(2, 2);
        out.mix_into(&current, &history, 0.25);

        let p = out.pixel(1, 1);
        assert!((p[0] - 0.75).abs() < 1e-6);
        assert!((p[2] - 0.25).abs() < 1e-6);
        assert_eq!(p[3], 1.0);
    }

    #[test]
    fn test_mix_of_equal_inputs_is_exact() {
        let color = [0.123, 0.456, 0.789, 1.0];
        let frame = Frame::filled(3, 1, color);
        let mut out = Frame::new(3, 1);
        out.mix_into(&frame, &frame, 0.725);
        assert_eq!(out, frame);
    }

    #[test]
    fn test_to_rgba8_clamps() {
        let frame = Frame::filled(1, 1, [2.0, -1.0, 0.5, 1.0]);
        assert_eq!(frame.to_rgba8(), vec![255, 0, 128, 255]);
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        Frame::filled(4, 4, [0.2, 0.4, 0.6, 1.0])
            .save_png(&path)
            .unwrap();
        assert!(path.exists());
    }
}
