//! V4L2 capture device.
//!
//! Opens a local device node (e.g. /dev/video0), negotiates a capture format
//! and streams frames through memory-mapped buffers. Buffers are converted to
//! BGR frames in-memory and never retained past the read that produced them.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::normalize::{normalize_to_bgr, unpad_rows, PixelFormat};
use crate::capture::CaptureDevice;
use crate::frame::Frame;

const STREAM_BUFFERS: u32 = 4;

/// Requested first; MJPEG-only cameras answer with MJPG instead.
const PREFERRED_FOURCC: &[u8; 4] = b"RGB3";

pub struct V4l2Device {
    path: String,
    device: Option<v4l::Device>,
    state: Option<StreamState>,
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: u32,
    frame_count: u64,
}

#[self_referencing]
struct StreamState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this>,
}

impl V4l2Device {
    /// Open `path` and settle on a pixel format this crate can convert.
    ///
    /// Fails when the device offers none of RGB3, BGR3, YUYV, NV12 or MJPG.
    pub fn open(path: &str) -> Result<Self> {
        use v4l::video::Capture;

        let device =
            v4l::Device::with_path(path).with_context(|| format!("open v4l2 device {}", path))?;
        let current = device.format().context("read v4l2 format")?;

        let mut source = Self {
            path: path.to_string(),
            device: Some(device),
            state: None,
            format: PixelFormat::Bgr24,
            width: current.width,
            height: current.height,
            stride: current.stride,
            frame_count: 0,
        };
        match PixelFormat::from_fourcc(&current.fourcc.repr) {
            Some(format) => source.format = format,
            None => source.negotiate(current.width, current.height)?,
        }

        log::info!(
            "V4l2Device: opened {} ({}x{} {:?})",
            path,
            source.width,
            source.height,
            source.format
        );
        Ok(source)
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    /// Request `width` x `height` in the preferred format and adopt whatever
    /// the driver settles on, provided it can be converted.
    fn negotiate(&mut self, width: u32, height: u32) -> Result<()> {
        use v4l::video::Capture;

        let device = self
            .device
            .as_ref()
            .ok_or_else(|| anyhow!("cannot change format of {} while streaming", self.path))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = width;
        format.height = height;
        format.fourcc = v4l::FourCC::new(PREFERRED_FOURCC);

        let applied = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Device: failed to set format on {}: {}",
                    self.path,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        let pixel_format = PixelFormat::from_fourcc(&applied.fourcc.repr).ok_or_else(|| {
            anyhow!(
                "v4l2 device {} uses unsupported pixel format {}",
                self.path,
                applied.fourcc
            )
        })?;
        self.format = pixel_format;
        self.width = applied.width;
        self.height = applied.height;
        self.stride = applied.stride;
        Ok(())
    }

    fn start_stream(&mut self) -> Result<()> {
        use v4l::buffer::Type;

        let device = self
            .device
            .take()
            .ok_or_else(|| anyhow!("v4l2 device {} is not open", self.path))?;
        let state = StreamStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, STREAM_BUFFERS)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);
        Ok(())
    }
}

impl CaptureDevice for V4l2Device {
    fn describe(&self) -> String {
        self.path.clone()
    }

    fn set_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        self.negotiate(width, height)
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        if self.state.is_none() {
            self.start_stream()?;
        }
        let state = self.state.as_mut().context("v4l2 stream not started")?;

        let (format, width, height, stride) = (self.format, self.width, self.height, self.stride);
        let frame = state.with_mut(|fields| -> Result<Frame> {
            let (buf, meta) = fields.stream.next().context("capture v4l2 frame")?;
            let used = match meta.bytesused as usize {
                0 => buf.len(),
                used => used.min(buf.len()),
            };
            let pixels = unpad_rows(&buf[..used], width, height, stride, format)?;
            normalize_to_bgr(&pixels, width, height, format)
        })?;

        self.frame_count += 1;
        Ok(Some(frame))
    }
}
