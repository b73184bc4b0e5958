//! Conversion of device buffers to BGR frames.

use anyhow::{anyhow, Context, Result};
use image::ImageFormat;
use std::borrow::Cow;

use crate::frame::{byte_len, Frame};

/// Pixel layouts a capture device may hand back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb24,
    Bgr24,
    /// Packed 4:2:2, `Y0 U Y1 V` per pixel pair.
    Yuyv,
    /// Planar Y followed by interleaved UV at quarter resolution.
    Nv12,
    /// One JPEG image per buffer.
    Mjpeg,
}

impl PixelFormat {
    /// Map a V4L2 fourcc code to a supported format.
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"RGB3" => Some(Self::Rgb24),
            b"BGR3" => Some(Self::Bgr24),
            b"YUYV" => Some(Self::Yuyv),
            b"NV12" => Some(Self::Nv12),
            b"MJPG" | b"JPEG" => Some(Self::Mjpeg),
            _ => None,
        }
    }

    /// Packed bytes per row and number of rows, or `None` for compressed formats.
    fn row_layout(self, width: u32, height: u32) -> Option<(usize, usize)> {
        let (w, h) = (width as usize, height as usize);
        match self {
            Self::Rgb24 | Self::Bgr24 => Some((w * 3, h)),
            Self::Yuyv => Some((w * 2, h)),
            Self::Nv12 => Some((w, h + h / 2)),
            Self::Mjpeg => None,
        }
    }
}

/// Strip per-row padding from a device buffer.
///
/// `stride` is the device's bytes per line; 0 means rows are tightly packed.
/// Compressed formats are returned as-is.
pub fn unpad_rows(
    buf: &[u8],
    width: u32,
    height: u32,
    stride: u32,
    format: PixelFormat,
) -> Result<Cow<'_, [u8]>> {
    let Some((row_len, rows)) = format.row_layout(width, height) else {
        return Ok(Cow::Borrowed(buf));
    };
    let stride = if stride == 0 { row_len } else { stride as usize };
    if stride < row_len {
        return Err(anyhow!(
            "stride {} is shorter than a {}-byte row",
            stride,
            row_len
        ));
    }
    let needed = match rows {
        0 => 0,
        rows => stride * (rows - 1) + row_len,
    };
    if buf.len() < needed {
        return Err(anyhow!(
            "device buffer too short: need {} bytes, got {}",
            needed,
            buf.len()
        ));
    }
    if stride == row_len {
        return Ok(Cow::Borrowed(&buf[..row_len * rows]));
    }
    let mut packed = Vec::with_capacity(row_len * rows);
    for row in buf.chunks(stride).take(rows) {
        packed.extend_from_slice(&row[..row_len]);
    }
    Ok(Cow::Owned(packed))
}

/// Convert a raw device buffer into a BGR frame.
///
/// MJPEG frames take their dimensions from the JPEG stream itself.
pub fn normalize_to_bgr(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Frame> {
    let data = match format {
        PixelFormat::Bgr24 => {
            expect_len(pixels, byte_len(width, height)?, "BGR")?;
            pixels.to_vec()
        }
        PixelFormat::Rgb24 => {
            expect_len(pixels, byte_len(width, height)?, "RGB")?;
            let mut bgr = pixels.to_vec();
            swap_red_blue(&mut bgr);
            bgr
        }
        PixelFormat::Yuyv => yuyv_to_bgr(pixels, width, height)?,
        PixelFormat::Nv12 => nv12_to_bgr(pixels, width, height)?,
        PixelFormat::Mjpeg => return jpeg_to_bgr(pixels),
    };
    Frame::new(width, height, data)
}

fn jpeg_to_bgr(pixels: &[u8]) -> Result<Frame> {
    let image = image::load_from_memory_with_format(pixels, ImageFormat::Jpeg)
        .context("decode MJPEG frame")?
        .into_rgb8();
    let (width, height) = image.dimensions();
    let mut bgr = image.into_raw();
    swap_red_blue(&mut bgr);
    Frame::new(width, height, bgr)
}

fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}

fn expect_len(pixels: &[u8], expected: usize, label: &str) -> Result<()> {
    if pixels.len() != expected {
        return Err(anyhow!(
            "{} frame length mismatch: expected {}, got {}",
            label,
            expected,
            pixels.len()
        ));
    }
    Ok(())
}

fn yuyv_to_bgr(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    if width % 2 != 0 {
        return Err(anyhow!("YUYV frame width must be even, got {}", width));
    }
    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| anyhow!("YUYV frame dimensions overflow"))?;
    expect_len(pixels, pixel_count * 2, "YUYV")?;

    let mut bgr = Vec::with_capacity(pixel_count * 3);
    for chunk in pixels.chunks_exact(4) {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        for y in [chunk[0], chunk[2]] {
            bgr.extend_from_slice(&yuv_to_bgr(y as f32, u, v));
        }
    }
    Ok(bgr)
}

fn nv12_to_bgr(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let w = width as usize;
    let h = height as usize;
    let y_plane = w
        .checked_mul(h)
        .ok_or_else(|| anyhow!("NV12 frame dimensions overflow"))?;
    let expected = y_plane
        .checked_add(y_plane / 2)
        .ok_or_else(|| anyhow!("NV12 frame dimensions overflow"))?;
    expect_len(pixels, expected, "NV12")?;

    let mut bgr = vec![0u8; y_plane * 3];
    for j in 0..h {
        for i in 0..w {
            let y = pixels[j * w + i] as f32;
            let uv_index = y_plane + (j / 2) * w + (i / 2) * 2;
            let u = pixels[uv_index] as f32 - 128.0;
            let v = pixels[uv_index + 1] as f32 - 128.0;

            let offset = (j * w + i) * 3;
            bgr[offset..offset + 3].copy_from_slice(&yuv_to_bgr(y, u, v));
        }
    }

    Ok(bgr)
}

fn yuv_to_bgr(y: f32, u: f32, v: f32) -> [u8; 3] {
    let r = y + 1.402_f32 * v;
    let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
    let b = y + 1.772_f32 * u;
    [clamp_to_u8(b), clamp_to_u8(g), clamp_to_u8(r)]
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
