//! Monte Carlo Integrator
//!
//! The integrator stage drives the multi-bounce kernel sequence for one
//! block request. Primary rays already sit in [`RayBuffer::Path0`] when it
//! runs (the ray generation stage put them there); the integrator
//! intersects them, then iterates bounces (miss shading, hit shading with
//! Russian roulette, occlusion resolution, emissive accumulation), leaving
//! the block's radiance in the device accumulation buffer.
//!
//! # Ping-Pong Discipline
//!
//! Hit shading at bounce `b` writes bounce `b + 1`'s indirect rays into
//! the inactive path buffer while the active one is still being read.
//! The buffers swap at each bounce boundary, and only when another bounce
//! follows; the active index never flips after the final bounce.
//! Occlusion rays use the dedicated third buffer and never participate in
//! the swap.
//!
//! # Error Discipline
//!
//! The first failed kernel aborts the whole stage. Debug captures check
//! the preceding kernel's result before reading anything back, so a
//! capture encode problem cannot mask the device error that caused it.

use std::time::Duration;

use rand::RngExt;

use super::PipelineStage;
use crate::debug::{self, CaptureConfig, CaptureEncoding, CaptureSet};
use crate::device::{DeviceClass, EmissiveSampleFilter, RayBuffer};
use crate::errors::Result;
use crate::tracer::{BlockRequest, TracerContext};

/// The Monte Carlo path tracing integrator stage.
///
/// Holds only capture configuration; all per-request state (the active
/// buffer index, bounce counter) is local to [`run`](PipelineStage::run),
/// which is what lets one integrator value serve every request a pipeline
/// ever sees.
pub struct MonteCarloIntegrator {
    captures: CaptureConfig,
}

impl MonteCarloIntegrator {
    /// Creates an integrator with the given capture configuration.
    #[must_use]
    pub fn new(captures: CaptureConfig) -> Self {
        Self { captures }
    }

    /// Creates an integrator with captures disabled.
    #[must_use]
    pub fn production() -> Self {
        Self::new(CaptureConfig::disabled())
    }

    fn capture_linear(&self, tr: &mut TracerContext, req: &BlockRequest, stem: &str) -> Result<()> {
        debug::write_capture(
            tr,
            &self.captures,
            req.frame_w,
            req.frame_h,
            stem,
            CaptureEncoding::TonemapLinear,
        )
    }

    fn capture_raw(&self, tr: &mut TracerContext, req: &BlockRequest, stem: &str) -> Result<()> {
        debug::write_capture(
            tr,
            &self.captures,
            req.frame_w,
            req.frame_h,
            stem,
            CaptureEncoding::PassThrough,
        )
    }
}

impl PipelineStage for MonteCarloIntegrator {
    fn name(&self) -> &str {
        "monte carlo integrator"
    }

    fn run(&self, tr: &mut TracerContext, req: &BlockRequest) -> Result<Duration> {
        let mut elapsed = Duration::ZERO;
        let num_pixels = req.pixel_count();
        let num_emissives = tr.scene.emissive_count;
        let mut active = RayBuffer::Path0;

        // Primary intersection, outside the bounce loop. Wide devices use
        // the packet query; narrow ones the per-ray query. Same results.
        elapsed += match tr.device_class {
            DeviceClass::Gpu => tr
                .resources
                .ray_packet_intersection_query(active, num_pixels)?,
            DeviceClass::Cpu => tr.resources.ray_intersection_query(active, num_pixels)?,
        };

        if self.captures.wants(CaptureSet::PRIMARY_DEPTH) {
            tr.resources.debug_ray_intersection_depth(req, active)?;
            self.capture_raw(tr, req, "primary-depth")?;
        }
        if self.captures.wants(CaptureSet::PRIMARY_NORMALS) {
            tr.resources.debug_ray_intersection_normals(req, active)?;
            self.capture_raw(tr, req, "primary-normals")?;
        }

        for bounce in 0..req.num_bounces {
            // Miss shading. Skipped entirely when the scene has no
            // uniform background material.
            if let Some(material) = tr.scene.background_material {
                elapsed += if bounce == 0 {
                    tr.resources
                        .shade_primary_ray_misses(material, active, num_pixels)?
                } else {
                    tr.resources
                        .shade_indirect_ray_misses(material, active, num_pixels)?
                };
            }

            // Hit shading: BSDF sampling, throughput update, Russian
            // roulette past the configured bounce, occlusion rays toward
            // sampled emissives. Needs a fresh seed each bounce.
            let seed = rand::rng().random::<u32>();
            elapsed += tr.resources.shade_hits(
                bounce,
                req.min_bounces_for_rr,
                seed,
                num_emissives,
                active,
                num_pixels,
            )?;

            if self.captures.wants(CaptureSet::THROUGHPUT) {
                tr.resources.debug_throughput(req)?;
                self.capture_linear(tr, req, &format!("throughput-{bounce:03}"))?;
            }

            // Resolve the occlusion rays emitted during hit shading and
            // accumulate emissive light for the unoccluded ones.
            elapsed += tr
                .resources
                .ray_intersection_test(RayBuffer::Occlusion, num_pixels)?;
            elapsed += tr
                .resources
                .accumulate_emissive_samples(RayBuffer::Occlusion, num_pixels)?;

            if self.captures.wants(CaptureSet::ALL_EMISSIVE_SAMPLES) {
                tr.resources
                    .debug_emissive_samples(req, EmissiveSampleFilter::All)?;
                self.capture_linear(tr, req, &format!("emissive-all-{bounce:03}"))?;
            }
            if self.captures.wants(CaptureSet::VISIBLE_EMISSIVE_SAMPLES) {
                tr.resources
                    .debug_emissive_samples(req, EmissiveSampleFilter::VisibleOnly)?;
                self.capture_linear(tr, req, &format!("emissive-vis-{bounce:03}"))?;
            }
            if self.captures.wants(CaptureSet::OCCLUDED_EMISSIVE_SAMPLES) {
                tr.resources
                    .debug_emissive_samples(req, EmissiveSampleFilter::OccludedOnly)?;
                self.capture_linear(tr, req, &format!("emissive-occ-{bounce:03}"))?;
            }
            if self.captures.wants(CaptureSet::ACCUMULATOR) {
                tr.resources.debug_accumulator(req)?;
                self.capture_linear(tr, req, &format!("accumulator-{bounce:03}"))?;
            }

            // Swap and intersect the indirect rays, but only when another
            // bounce will consume the results.
            if bounce + 1 < req.num_bounces {
                active = active.flipped();
                elapsed += tr.resources.ray_intersection_query(active, num_pixels)?;
            }
        }

        Ok(elapsed)
    }
}
