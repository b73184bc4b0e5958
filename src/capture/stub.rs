use anyhow::Result;

use crate::capture::CaptureDevice;
use crate::frame::{Frame, CHANNELS};

/// Synthetic capture device for tests and hosts without a camera.
///
/// Always connected. Produces a diagonal gradient that shifts by one step per
/// frame, at whatever resolution was last requested.
pub struct SyntheticDevice {
    name: String,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl SyntheticDevice {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        let name = name.into();
        log::info!("SyntheticDevice: connected to stub://{}", name);
        Self {
            name,
            width,
            height,
            frame_count: 0,
        }
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    fn generate_pixels(&self) -> Vec<u8> {
        let row_len = self.width as usize * CHANNELS;
        let mut pixels = vec![0u8; row_len * self.height as usize];
        for (y, row) in pixels.chunks_exact_mut(row_len.max(1)).enumerate() {
            for (i, value) in row.iter_mut().enumerate() {
                *value = ((i / CHANNELS + y + self.frame_count as usize) % 256) as u8;
            }
        }
        pixels
    }
}

impl CaptureDevice for SyntheticDevice {
    fn describe(&self) -> String {
        format!("stub://{}", self.name)
    }

    fn set_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        Ok(Some(Frame::new(self.width, self.height, pixels)?))
    }
}
