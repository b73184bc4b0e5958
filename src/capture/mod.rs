//! Capture devices.
//!
//! A capture device hands out one frame per blocking `read`. Two backends exist:
//! - Synthetic devices (`stub://<name>`) for tests and camera-less hosts
//! - V4L2 devices (feature: ingest-v4l2)
//!
//! Devices are addressed the way the camera node is configured: an integer
//! index (`0` -> `/dev/video0`), a `stub://` URL, or a device path.

use anyhow::{anyhow, Result};

use crate::frame::Frame;

pub mod normalize;
pub mod stub;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

pub use stub::SyntheticDevice;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Device;

/// Device used when none is configured.
pub const DEFAULT_DEVICE: &str = "0";

/// A source of frames.
///
/// `read` blocks until the device produces a frame or fails. `Ok(None)` means
/// no frame was available for this read.
pub trait CaptureDevice {
    /// Human-readable device identifier, for logs.
    fn describe(&self) -> String;

    /// Request a capture resolution. Devices may ignore the request.
    fn set_resolution(&mut self, width: u32, height: u32) -> Result<()>;

    /// Read one frame.
    fn read(&mut self) -> Result<Option<Frame>>;
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for Box<D> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn set_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        (**self).set_resolution(width, height)
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        (**self).read()
    }
}

/// Where to capture from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceSpec {
    Synthetic(String),
    Path(String),
}

impl DeviceSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(anyhow!("capture device must not be empty"));
        }
        if let Some(name) = spec.strip_prefix("stub://") {
            return Ok(Self::Synthetic(name.to_string()));
        }
        if let Ok(index) = spec.parse::<u32>() {
            return Ok(Self::Path(format!("/dev/video{}", index)));
        }
        Ok(Self::Path(spec.to_string()))
    }
}

/// Capture device and requested resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            width: 320,
            height: 240,
        }
    }
}

/// Open the configured device.
///
/// Fails when the device cannot be opened. The requested resolution is
/// applied later by the camera node, best-effort.
pub fn open_device(settings: &CaptureSettings) -> Result<Box<dyn CaptureDevice>> {
    match DeviceSpec::parse(&settings.device)? {
        DeviceSpec::Synthetic(name) => Ok(Box::new(SyntheticDevice::new(
            name,
            settings.width,
            settings.height,
        ))),
        DeviceSpec::Path(path) => open_path(&path),
    }
}

#[cfg(feature = "ingest-v4l2")]
fn open_path(path: &str) -> Result<Box<dyn CaptureDevice>> {
    Ok(Box::new(V4l2Device::open(path)?))
}

#[cfg(not(feature = "ingest-v4l2"))]
fn open_path(path: &str) -> Result<Box<dyn CaptureDevice>> {
    Err(anyhow!(
        "capture from {} requires the ingest-v4l2 feature",
        path
    ))
}
