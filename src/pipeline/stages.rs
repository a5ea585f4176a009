//! Built-in Pipeline Stages
//!
//! The stage structs wired up by [`Pipeline::standard`], plus the
//! framebuffer dump stage used for debugging. Each is a thin adapter from
//! the stage contract onto one gateway operation; anything with actual
//! control flow lives in the integrator.
//!
//! [`Pipeline::standard`]: crate::pipeline::Pipeline::standard

use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::PipelineStage;
use crate::debug;
use crate::errors::Result;
use crate::tracer::{BlockRequest, TracerContext};

/// Clears the frame accumulation buffer for the block.
pub struct ClearAccumulator;

impl PipelineStage for ClearAccumulator {
    fn name(&self) -> &str {
        "clear accumulator"
    }

    fn run(&self, tr: &mut TracerContext, req: &BlockRequest) -> Result<Duration> {
        tr.resources.clear_accumulator(req)
    }
}

/// Generates primary rays from the attached perspective camera.
///
/// Swapping this slot is how alternative projections plug in: an
/// orthographic stage would call a different gateway operation without
/// the pipeline noticing.
pub struct PerspectiveCamera;

impl PipelineStage for PerspectiveCamera {
    fn name(&self) -> &str {
        "perspective camera rays"
    }

    fn run(&self, tr: &mut TracerContext, req: &BlockRequest) -> Result<Duration> {
        let eye = tr.camera.eye;
        let frustum = tr.camera.corners;
        tr.resources.generate_primary_rays(req, eye, &frustum)
    }
}

/// Applies simple Reinhard tone-mapping to the accumulator, producing the
/// 8-bit framebuffer.
pub struct TonemapSimpleReinhard;

impl PipelineStage for TonemapSimpleReinhard {
    fn name(&self) -> &str {
        "tonemap (simple reinhard)"
    }

    fn run(&self, tr: &mut TracerContext, req: &BlockRequest) -> Result<Duration> {
        tr.resources.tonemap_simple_reinhard(req)
    }
}

/// Copies the device framebuffer into the shared host-side target bound
/// at `attach`.
///
/// Uses the context's staging buffer for the readback, so repeated blocks
/// at a stable frame size allocate nothing.
pub struct CopyFramebuffer;

impl PipelineStage for CopyFramebuffer {
    fn name(&self) -> &str {
        "framebuffer copy-out"
    }

    fn run(&self, tr: &mut TracerContext, _req: &BlockRequest) -> Result<Duration> {
        let start = Instant::now();
        let target = tr.target.clone();
        let staged = tr.read_framebuffer_staged()?;

        let mut out = target.lock();
        if out.len() != staged.len() {
            out.resize(staged.len(), 0);
        }
        out.copy_from_slice(staged);
        Ok(start.elapsed())
    }
}

/// Saves the framebuffer to a PNG file.
pub struct SaveFramebuffer {
    path: PathBuf,
}

impl SaveFramebuffer {
    /// Creates a dump stage writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PipelineStage for SaveFramebuffer {
    fn name(&self) -> &str {
        "framebuffer dump"
    }

    fn run(&self, tr: &mut TracerContext, req: &BlockRequest) -> Result<Duration> {
        let start = Instant::now();
        let staged = tr.read_framebuffer_staged()?;
        debug::write_framebuffer(staged, req.frame_w, req.frame_h, &self.path)?;
        Ok(start.elapsed())
    }
}
