//! In-memory frames.
//!
//! A `Frame` is a height x width x 3 grid of 8-bit channel values stored
//! row-major. Captured frames use BGR channel order.
//!
//! Frames only live for one event iteration on the camera path, or for the
//! whole process on the emulated path (read-only after construction).

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Number of 8-bit channels per pixel.
pub const CHANNELS: usize = 3;

/// Row-major, three channel, 8-bit image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Wrap an existing pixel buffer. The buffer length must equal `width * height * 3`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// All-zero (black) frame.
    pub fn zeroed(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * CHANNELS;
        Self {
            data: vec![0u8; len],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Channel values of the pixel at (`x`, `y`), or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let offset = self.offset(x, y)?;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    /// Overwrite one pixel. Coordinates outside the frame are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: [u8; 3]) {
        if let Some(offset) = self.offset(x, y) {
            self.data[offset..offset + CHANNELS].copy_from_slice(&value);
        }
    }

    /// Row-major copy of the pixel data, `height * width * 3` bytes long.
    pub fn flatten(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Consume the frame and return its row-major pixel data.
    pub fn into_flat(self) -> Vec<u8> {
        self.data
    }

    /// Resample to exactly `width` x `height`.
    ///
    /// Uses a triangle (bilinear) filter. Returns the frame unchanged when the
    /// dimensions already match.
    pub fn resized(self, width: u32, height: u32) -> Result<Frame> {
        if width == 0 || height == 0 {
            return Err(anyhow!("cannot resize frame to {}x{}", width, height));
        }
        if self.width == width && self.height == height {
            return Ok(self);
        }

        // Channel order is irrelevant to resampling; `Rgb` is only the container.
        let (src_w, src_h) = (self.width, self.height);
        let image = RgbImage::from_raw(src_w, src_h, self.data)
            .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", src_w, src_h))?;
        let resized = imageops::resize(&image, width, height, FilterType::Triangle);
        Frame::new(width, height, resized.into_raw())
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * CHANNELS)
    }
}

/// Byte length of a `width` x `height` frame, with overflow checks.
pub fn byte_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or_else(|| anyhow!("frame dimensions overflow: {}x{}", width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_length() {
        let err = Frame::new(2, 2, vec![0u8; 11]).unwrap_err();
        assert!(err.to_string().contains("expected 12, got 11"));
    }

    #[test]
    fn flatten_is_row_major() -> Result<()> {
        let mut frame = Frame::zeroed(3, 2);
        frame.set_pixel(1, 0, [1, 2, 3]);
        frame.set_pixel(0, 1, [4, 5, 6]);

        let flat = frame.flatten();
        assert_eq!(flat.len(), 3 * 2 * 3);
        assert_eq!(&flat[3..6], &[1, 2, 3]);
        assert_eq!(&flat[9..12], &[4, 5, 6]);
        assert_eq!(flat, frame.into_flat());
        Ok(())
    }

    #[test]
    fn pixel_outside_frame_is_none() {
        let frame = Frame::zeroed(4, 4);
        assert_eq!(frame.pixel(4, 0), None);
        assert_eq!(frame.pixel(0, 4), None);
        assert_eq!(frame.pixel(3, 3), Some([0, 0, 0]));
    }

    #[test]
    fn resize_changes_dimensions() -> Result<()> {
        let frame = Frame::new(640, 480, vec![200u8; 640 * 480 * 3])?;
        let resized = frame.resized(320, 240)?;

        assert_eq!(resized.width(), 320);
        assert_eq!(resized.height(), 240);
        assert_eq!(resized.as_bytes().len(), 320 * 240 * 3);
        // A uniform image stays uniform under bilinear resampling.
        assert!(resized.as_bytes().iter().all(|&v| v == 200));
        Ok(())
    }

    #[test]
    fn resize_to_same_size_is_identity() -> Result<()> {
        let data: Vec<u8> = (0..(4 * 3 * 3)).map(|v| v as u8).collect();
        let frame = Frame::new(4, 3, data.clone())?;
        let resized = frame.resized(4, 3)?;
        assert_eq!(resized.into_flat(), data);
        Ok(())
    }

    #[test]
    fn resize_to_zero_is_rejected() {
        assert!(Frame::zeroed(4, 4).resized(0, 4).is_err());
    }
}
