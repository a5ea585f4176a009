//! Device Resource Gateway
//!
//! The tracing core never touches a compute API directly. Every kernel
//! launch, buffer clear, and readback goes through the [`DeviceResources`]
//! trait, a capability interface over the named operations a path tracing
//! backend must provide. Pipeline stages stay backend-agnostic; a backend
//! crate (or the mock used by the test suite) supplies the implementation.
//!
//! Each kernel operation returns the elapsed device time on success so the
//! pipeline runner can account per-stage cost without instrumenting the
//! backend itself.
//!
//! # Design Principles
//! - Operations are atomic: a returned error means device state for the
//!   current block is inconsistent and the request must be failed, never
//!   resumed.
//! - Buffer identity is explicit: kernels address ray storage through
//!   [`RayBuffer`], not raw indices, so the ping-pong discipline is visible
//!   in every call site.

mod probe;

pub use probe::{DeviceInfo, enumerate_devices};

use std::time::Duration;

use glam::{Vec3, Vec4};

use crate::errors::Result;
use crate::tracer::BlockRequest;

/// Identifies one of the device-resident ray buffers.
///
/// Path state ping-pongs between [`Path0`](RayBuffer::Path0) and
/// [`Path1`](RayBuffer::Path1): while one buffer's rays are being
/// intersected and shaded, hit shading writes the next bounce's indirect
/// rays into the other. Occlusion (shadow) rays always live in the
/// dedicated [`Occlusion`](RayBuffer::Occlusion) buffer so they never
/// collide with in-flight path state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RayBuffer {
    /// First ping-pong path-state buffer. Primary rays start here.
    Path0,
    /// Second ping-pong path-state buffer.
    Path1,
    /// Dedicated occlusion-ray buffer.
    Occlusion,
}

impl RayBuffer {
    /// Returns the other ping-pong buffer.
    ///
    /// The occlusion buffer has no counterpart and flips to itself.
    #[inline]
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Path0 => Self::Path1,
            Self::Path1 => Self::Path0,
            Self::Occlusion => Self::Occlusion,
        }
    }
}

/// Coarse device classification used for kernel selection and work
/// balancing.
///
/// Wide SIMT devices run the packet variant of the primary intersection
/// query; narrow devices run the per-ray variant. The two are required to
/// produce identical results; the split is purely a dispatch-shape
/// optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Massively parallel device (discrete, integrated or virtual GPU).
    Gpu,
    /// Narrow-parallelism device (CPU or software adapter).
    Cpu,
}

impl DeviceClass {
    /// Classifies a wgpu adapter type.
    #[must_use]
    pub fn from_adapter_type(ty: wgpu::DeviceType) -> Self {
        match ty {
            wgpu::DeviceType::DiscreteGpu
            | wgpu::DeviceType::IntegratedGpu
            | wgpu::DeviceType::VirtualGpu => Self::Gpu,
            _ => Self::Cpu,
        }
    }
}

/// Selects which emissive samples a debug capture visualizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmissiveSampleFilter {
    /// Every emissive sample generated during hit shading.
    All,
    /// Only samples whose occlusion ray found the light unobstructed.
    VisibleOnly,
    /// Only samples whose occlusion ray was blocked.
    OccludedOnly,
}

/// Named GPU operations a path tracing backend must provide.
///
/// Kernel operations return the elapsed device time; readbacks return the
/// requested data. Implementations own all device-side buffers (the two
/// path-state buffers, the occlusion buffer, accumulator, framebuffer,
/// debug output and ray counters) and are exclusively owned by one tracer
/// worker; nothing in this trait is expected to be thread-safe beyond
/// [`Send`].
pub trait DeviceResources: Send {
    // ------------------------------------------------------------------
    // Frame setup
    // ------------------------------------------------------------------

    /// Clears the accumulation buffer for the request's block.
    fn clear_accumulator(&mut self, req: &BlockRequest) -> Result<Duration>;

    /// Generates primary rays for the request's block into
    /// [`RayBuffer::Path0`], interpolating the frustum-corner directions
    /// per pixel.
    fn generate_primary_rays(
        &mut self,
        req: &BlockRequest,
        eye: Vec3,
        frustum: &[Vec4; 4],
    ) -> Result<Duration>;

    // ------------------------------------------------------------------
    // Intersection
    // ------------------------------------------------------------------

    /// Intersects `count` rays from `buffer` against the scene, one ray
    /// per work item.
    fn ray_intersection_query(&mut self, buffer: RayBuffer, count: u32) -> Result<Duration>;

    /// Packet variant of [`ray_intersection_query`]: intersects rays in
    /// SIMT-friendly packets. Results must be identical to the per-ray
    /// variant.
    ///
    /// [`ray_intersection_query`]: DeviceResources::ray_intersection_query
    fn ray_packet_intersection_query(
        &mut self,
        buffer: RayBuffer,
        count: u32,
    ) -> Result<Duration>;

    /// Boolean occlusion test for `count` rays from `buffer`: any hit
    /// terminates the ray without computing surface details.
    fn ray_intersection_test(&mut self, buffer: RayBuffer, count: u32) -> Result<Duration>;

    // ------------------------------------------------------------------
    // Shading
    // ------------------------------------------------------------------

    /// Shades primary rays that missed all geometry with the scene
    /// background material.
    fn shade_primary_ray_misses(
        &mut self,
        material: u32,
        buffer: RayBuffer,
        count: u32,
    ) -> Result<Duration>;

    /// Shades indirect rays that missed all geometry, folding background
    /// radiance into the surviving path throughput.
    fn shade_indirect_ray_misses(
        &mut self,
        material: u32,
        buffer: RayBuffer,
        count: u32,
    ) -> Result<Duration>;

    /// Shades rays that hit geometry: samples the surface BSDF, updates
    /// path throughput, applies Russian roulette once
    /// `bounce >= min_bounces_for_rr`, emits occlusion rays toward sampled
    /// emissives into [`RayBuffer::Occlusion`] and the next bounce's
    /// indirect rays into the inactive path buffer.
    ///
    /// `seed` must be fresh per call; reusing a seed across bounces
    /// correlates the bounce decisions and biases the estimate.
    fn shade_hits(
        &mut self,
        bounce: u32,
        min_bounces_for_rr: u32,
        seed: u32,
        num_emissives: u32,
        buffer: RayBuffer,
        count: u32,
    ) -> Result<Duration>;

    /// Adds the emissive contribution of every unoccluded sample in
    /// `buffer` to the accumulation buffer.
    fn accumulate_emissive_samples(&mut self, buffer: RayBuffer, count: u32) -> Result<Duration>;

    // ------------------------------------------------------------------
    // Post-processing
    // ------------------------------------------------------------------

    /// Tone-maps the accumulator into the 8-bit framebuffer using simple
    /// Reinhard and the request's exposure.
    fn tonemap_simple_reinhard(&mut self, req: &BlockRequest) -> Result<Duration>;

    // ------------------------------------------------------------------
    // Debug kernels
    //
    // Each writes a full-frame visualization into the debug output buffer
    // without touching path state; enabling them never changes render
    // results.
    // ------------------------------------------------------------------

    /// Visualizes primary intersection depth into the debug buffer.
    fn debug_ray_intersection_depth(
        &mut self,
        req: &BlockRequest,
        buffer: RayBuffer,
    ) -> Result<Duration>;

    /// Visualizes primary intersection normals into the debug buffer.
    fn debug_ray_intersection_normals(
        &mut self,
        req: &BlockRequest,
        buffer: RayBuffer,
    ) -> Result<Duration>;

    /// Snapshots per-path throughput into the debug buffer.
    fn debug_throughput(&mut self, req: &BlockRequest) -> Result<Duration>;

    /// Snapshots emissive samples, filtered by occlusion outcome, into the
    /// debug buffer.
    fn debug_emissive_samples(
        &mut self,
        req: &BlockRequest,
        filter: EmissiveSampleFilter,
    ) -> Result<Duration>;

    /// Snapshots the running accumulator into the debug buffer.
    fn debug_accumulator(&mut self, req: &BlockRequest) -> Result<Duration>;

    // ------------------------------------------------------------------
    // Readback
    // ------------------------------------------------------------------

    /// Size of the framebuffer in bytes (RGBA8, full frame).
    fn framebuffer_len(&self) -> usize;

    /// Copies the framebuffer into `out`. `out.len()` must equal
    /// [`framebuffer_len`](DeviceResources::framebuffer_len).
    fn read_framebuffer(&mut self, out: &mut [u8]) -> Result<()>;

    /// Size of the debug output buffer in bytes after the most recent
    /// debug kernel ran. Linear-radiance visualizations are RGBA32F;
    /// categorical ones are RGBA8.
    fn debug_buffer_len(&self) -> usize;

    /// Copies the debug output buffer into `out`. `out.len()` must equal
    /// [`debug_buffer_len`](DeviceResources::debug_buffer_len).
    fn read_debug_buffer(&mut self, out: &mut [u8]) -> Result<()>;

    /// Reads one of the device ray counters.
    fn read_ray_counter(&mut self, counter: u32) -> Result<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_is_an_involution_on_path_buffers() {
        assert_eq!(RayBuffer::Path0.flipped(), RayBuffer::Path1);
        assert_eq!(RayBuffer::Path1.flipped(), RayBuffer::Path0);
        assert_eq!(RayBuffer::Path0.flipped().flipped(), RayBuffer::Path0);
    }

    #[test]
    fn occlusion_buffer_has_no_counterpart() {
        assert_eq!(RayBuffer::Occlusion.flipped(), RayBuffer::Occlusion);
    }

    #[test]
    fn adapter_types_classify_by_parallelism() {
        assert_eq!(
            DeviceClass::from_adapter_type(wgpu::DeviceType::DiscreteGpu),
            DeviceClass::Gpu
        );
        assert_eq!(
            DeviceClass::from_adapter_type(wgpu::DeviceType::IntegratedGpu),
            DeviceClass::Gpu
        );
        assert_eq!(
            DeviceClass::from_adapter_type(wgpu::DeviceType::Cpu),
            DeviceClass::Cpu
        );
        assert_eq!(
            DeviceClass::from_adapter_type(wgpu::DeviceType::Other),
            DeviceClass::Cpu
        );
    }
}
