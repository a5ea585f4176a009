//! Debug Captures
//!
//! Optional, orthogonal instrumentation: any combination of capture points
//! can be enabled to snapshot intermediate device buffers (primary depth
//! and normals, per-path throughput, emissive samples, the running
//! accumulator, the final framebuffer) to PNG files without changing
//! render results. Captures only ever add a readback-and-encode side
//! effect; the device call sequence that produces pixels is identical with
//! every capture enabled or none.
//!
//! A capture failure aborts the block like any stage failure, but the
//! kernel call feeding the capture is checked first, so an encode error
//! can never mask the device error that preceded it.

use std::path::{Path, PathBuf};

use bitflags::bitflags;
use image::RgbaImage;

use crate::errors::{HeliosError, Result};
use crate::tracer::TracerContext;

bitflags! {
    /// The closed set of capture points.
    ///
    /// Bit values are assigned explicitly; nothing outside this module may
    /// rely on them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CaptureSet: u16 {
        /// Primary-ray intersection depth.
        const PRIMARY_DEPTH = 1 << 0;
        /// Primary-ray intersection normals.
        const PRIMARY_NORMALS = 1 << 1;
        /// Every emissive sample, per bounce.
        const ALL_EMISSIVE_SAMPLES = 1 << 2;
        /// Unoccluded emissive samples, per bounce.
        const VISIBLE_EMISSIVE_SAMPLES = 1 << 3;
        /// Occluded emissive samples, per bounce.
        const OCCLUDED_EMISSIVE_SAMPLES = 1 << 4;
        /// Per-path throughput, per bounce.
        const THROUGHPUT = 1 << 5;
        /// The running accumulator, per bounce.
        const ACCUMULATOR = 1 << 6;
        /// The tone-mapped framebuffer, per block.
        const FRAMEBUFFER = 1 << 7;
    }
}

/// How the debug buffer's texels are turned into image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEncoding {
    /// RGBA32F linear radiance: Reinhard tone-map and gamma-encode on the
    /// host before writing 8-bit pixels.
    TonemapLinear,
    /// RGBA8 categorical data (depth ramps, normal maps, masks): written
    /// out unchanged.
    PassThrough,
}

/// Capture configuration: which points are enabled and where the images go.
#[derive(Debug, Clone, Default)]
pub struct CaptureConfig {
    /// Enabled capture points.
    pub points: CaptureSet,
    /// Directory receiving the PNG files. Relative stems are joined onto
    /// this path; the directory must exist.
    pub output_dir: PathBuf,
}

impl CaptureConfig {
    /// A configuration with no capture points enabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Enables `points`, writing images into `output_dir`.
    #[must_use]
    pub fn new(points: CaptureSet, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            points,
            output_dir: output_dir.into(),
        }
    }

    /// Membership test for a capture point.
    #[inline]
    #[must_use]
    pub fn wants(&self, point: CaptureSet) -> bool {
        self.points.contains(point)
    }

    /// Full path for a capture file stem.
    #[must_use]
    pub fn image_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.png"))
    }
}

/// Reads the debug buffer and persists it as `<output_dir>/<stem>.png`.
///
/// The caller must already have propagated the debug kernel's own error;
/// this function only handles readback and encoding.
pub(crate) fn write_capture(
    tr: &mut TracerContext,
    cfg: &CaptureConfig,
    frame_w: u32,
    frame_h: u32,
    stem: &str,
    encoding: CaptureEncoding,
) -> Result<()> {
    let path = cfg.image_path(stem);
    let bytes = tr.read_debug_buffer_staged()?;
    let image = match encoding {
        CaptureEncoding::TonemapLinear => tonemap_rgba32f(bytes, frame_w, frame_h)?,
        CaptureEncoding::PassThrough => passthrough_rgba8(bytes, frame_w, frame_h)?,
    };
    save_png(&image, &path)?;
    log::debug!("capture `{stem}` written to {}", path.display());
    Ok(())
}

/// Persists the tone-mapped framebuffer bytes as a PNG.
pub(crate) fn write_framebuffer(
    bytes: &[u8],
    frame_w: u32,
    frame_h: u32,
    path: &Path,
) -> Result<()> {
    let image = passthrough_rgba8(bytes, frame_w, frame_h)?;
    save_png(&image, path)
}

fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image.save(path)?;
    Ok(())
}

/// Tone-maps RGBA32F linear radiance texels to 8-bit pixels.
///
/// Per channel: Reinhard `c / (c + 1)`, then gamma 1/2.2, scaled to 8-bit
/// and clamped. Alpha is forced opaque: capture images are diagnostics,
/// not compositing sources.
fn tonemap_rgba32f(bytes: &[u8], frame_w: u32, frame_h: u32) -> Result<RgbaImage> {
    let expected = frame_w as usize * frame_h as usize * 4 * std::mem::size_of::<f32>();
    if bytes.len() != expected {
        return Err(HeliosError::BufferSizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    let texels: &[f32] = bytemuck::cast_slice(bytes);
    let mut pixels = Vec::with_capacity(frame_w as usize * frame_h as usize * 4);
    for texel in texels.chunks_exact(4) {
        pixels.push(tonemap_channel(texel[0]));
        pixels.push(tonemap_channel(texel[1]));
        pixels.push(tonemap_channel(texel[2]));
        pixels.push(u8::MAX);
    }

    RgbaImage::from_raw(frame_w, frame_h, pixels)
        .ok_or_else(|| HeliosError::ImageEncodeError("capture dimensions overflow".to_string()))
}

fn passthrough_rgba8(bytes: &[u8], frame_w: u32, frame_h: u32) -> Result<RgbaImage> {
    let expected = frame_w as usize * frame_h as usize * 4;
    if bytes.len() != expected {
        return Err(HeliosError::BufferSizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    RgbaImage::from_raw(frame_w, frame_h, bytes.to_vec())
        .ok_or_else(|| HeliosError::ImageEncodeError("capture dimensions overflow".to_string()))
}

fn tonemap_channel(c: f32) -> u8 {
    let c = c.max(0.0);
    let mapped = c / (c + 1.0);
    (mapped.powf(1.0 / 2.2) * 255.0).clamp(0.0, 255.0) as u8
}
