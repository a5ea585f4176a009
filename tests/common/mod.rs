//! Shared test support: a scriptable mock device gateway.
//!
//! `MockDevice` implements the full gateway contract against host memory:
//! every operation succeeds in a fixed simulated duration and records
//! itself into a shared call log the test inspects afterwards. Failure
//! injection knobs cover the abort-path tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use glam::{Vec3, Vec4};
use parking_lot::Mutex;

use helios::errors::Result;
use helios::{BlockRequest, DeviceResources, EmissiveSampleFilter, HeliosError, RayBuffer};

/// One recorded gateway call.
///
/// The `shade_hits` seed is deliberately not recorded: it is random by
/// contract, and call sequences must compare equal across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    ClearAccumulator { block_y: u32 },
    GeneratePrimaryRays { block_y: u32 },
    IntersectionQuery { buffer: RayBuffer, count: u32 },
    PacketIntersectionQuery { buffer: RayBuffer, count: u32 },
    IntersectionTest { buffer: RayBuffer, count: u32 },
    ShadePrimaryMisses { material: u32, buffer: RayBuffer },
    ShadeIndirectMisses { material: u32, buffer: RayBuffer },
    ShadeHits { bounce: u32, min_rr: u32, emissives: u32, buffer: RayBuffer },
    AccumulateEmissive { buffer: RayBuffer, count: u32 },
    Tonemap { block_y: u32 },
    DebugDepth,
    DebugNormals,
    DebugThroughput,
    DebugEmissive(EmissiveSampleFilter),
    DebugAccumulator,
    ReadFramebuffer,
    ReadDebugBuffer,
    ReadCounter(u32),
}

impl Call {
    /// `true` for the kernel calls that produce pixels, the sequence that
    /// must be identical with and without debug captures.
    pub fn is_render_kernel(&self) -> bool {
        !matches!(
            self,
            Call::DebugDepth
                | Call::DebugNormals
                | Call::DebugThroughput
                | Call::DebugEmissive(_)
                | Call::DebugAccumulator
                | Call::ReadFramebuffer
                | Call::ReadDebugBuffer
                | Call::ReadCounter(_)
        )
    }
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// Format of the most recent debug kernel's output, which decides the
/// debug buffer size the mock reports.
#[derive(Clone, Copy)]
enum DebugFormat {
    Rgba8,
    Rgba32F,
}

pub struct MockDevice {
    pub log: CallLog,
    frame_w: u32,
    frame_h: u32,
    last_debug: DebugFormat,

    /// Fail `shade_hits` at this bounce index.
    pub fail_shade_hits_at_bounce: Option<u32>,
    /// Fail the tonemap operation.
    pub fail_tonemap: bool,
}

impl MockDevice {
    pub fn new(frame_w: u32, frame_h: u32) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            frame_w,
            frame_h,
            last_debug: DebugFormat::Rgba8,
            fail_shade_hits_at_bounce: None,
            fail_tonemap: false,
        }
    }

    /// Clone of the shared call log handle, for inspection after the mock
    /// moved into a tracer.
    pub fn log_handle(&self) -> CallLog {
        self.log.clone()
    }

    fn record(&self, call: Call) -> Result<Duration> {
        self.log.lock().push(call);
        Ok(Duration::from_micros(10))
    }
}

impl DeviceResources for MockDevice {
    fn clear_accumulator(&mut self, req: &BlockRequest) -> Result<Duration> {
        self.record(Call::ClearAccumulator {
            block_y: req.block_y,
        })
    }

    fn generate_primary_rays(
        &mut self,
        req: &BlockRequest,
        _eye: Vec3,
        _frustum: &[Vec4; 4],
    ) -> Result<Duration> {
        self.record(Call::GeneratePrimaryRays {
            block_y: req.block_y,
        })
    }

    fn ray_intersection_query(&mut self, buffer: RayBuffer, count: u32) -> Result<Duration> {
        self.record(Call::IntersectionQuery { buffer, count })
    }

    fn ray_packet_intersection_query(
        &mut self,
        buffer: RayBuffer,
        count: u32,
    ) -> Result<Duration> {
        self.record(Call::PacketIntersectionQuery { buffer, count })
    }

    fn ray_intersection_test(&mut self, buffer: RayBuffer, count: u32) -> Result<Duration> {
        self.record(Call::IntersectionTest { buffer, count })
    }

    fn shade_primary_ray_misses(
        &mut self,
        material: u32,
        buffer: RayBuffer,
        _count: u32,
    ) -> Result<Duration> {
        self.record(Call::ShadePrimaryMisses { material, buffer })
    }

    fn shade_indirect_ray_misses(
        &mut self,
        material: u32,
        buffer: RayBuffer,
        _count: u32,
    ) -> Result<Duration> {
        self.record(Call::ShadeIndirectMisses { material, buffer })
    }

    fn shade_hits(
        &mut self,
        bounce: u32,
        min_bounces_for_rr: u32,
        _seed: u32,
        num_emissives: u32,
        buffer: RayBuffer,
        _count: u32,
    ) -> Result<Duration> {
        if self.fail_shade_hits_at_bounce == Some(bounce) {
            return Err(HeliosError::DeviceOp {
                op: "shade_hits",
                reason: format!("injected failure at bounce {bounce}"),
            });
        }
        self.record(Call::ShadeHits {
            bounce,
            min_rr: min_bounces_for_rr,
            emissives: num_emissives,
            buffer,
        })
    }

    fn accumulate_emissive_samples(&mut self, buffer: RayBuffer, count: u32) -> Result<Duration> {
        self.record(Call::AccumulateEmissive { buffer, count })
    }

    fn tonemap_simple_reinhard(&mut self, req: &BlockRequest) -> Result<Duration> {
        if self.fail_tonemap {
            return Err(HeliosError::DeviceOp {
                op: "tonemap_simple_reinhard",
                reason: "injected failure".to_string(),
            });
        }
        self.record(Call::Tonemap {
            block_y: req.block_y,
        })
    }

    fn debug_ray_intersection_depth(
        &mut self,
        _req: &BlockRequest,
        _buffer: RayBuffer,
    ) -> Result<Duration> {
        self.last_debug = DebugFormat::Rgba8;
        self.record(Call::DebugDepth)
    }

    fn debug_ray_intersection_normals(
        &mut self,
        _req: &BlockRequest,
        _buffer: RayBuffer,
    ) -> Result<Duration> {
        self.last_debug = DebugFormat::Rgba8;
        self.record(Call::DebugNormals)
    }

    fn debug_throughput(&mut self, _req: &BlockRequest) -> Result<Duration> {
        self.last_debug = DebugFormat::Rgba32F;
        self.record(Call::DebugThroughput)
    }

    fn debug_emissive_samples(
        &mut self,
        _req: &BlockRequest,
        filter: EmissiveSampleFilter,
    ) -> Result<Duration> {
        self.last_debug = DebugFormat::Rgba32F;
        self.record(Call::DebugEmissive(filter))
    }

    fn debug_accumulator(&mut self, _req: &BlockRequest) -> Result<Duration> {
        self.last_debug = DebugFormat::Rgba32F;
        self.record(Call::DebugAccumulator)
    }

    fn framebuffer_len(&self) -> usize {
        self.frame_w as usize * self.frame_h as usize * 4
    }

    fn read_framebuffer(&mut self, out: &mut [u8]) -> Result<()> {
        self.log.lock().push(Call::ReadFramebuffer);
        out.fill(0x40);
        Ok(())
    }

    fn debug_buffer_len(&self) -> usize {
        let texel = match self.last_debug {
            DebugFormat::Rgba8 => 4,
            DebugFormat::Rgba32F => 16,
        };
        self.frame_w as usize * self.frame_h as usize * texel
    }

    fn read_debug_buffer(&mut self, out: &mut [u8]) -> Result<()> {
        self.log.lock().push(Call::ReadDebugBuffer);
        out.fill(0);
        Ok(())
    }

    fn read_ray_counter(&mut self, counter: u32) -> Result<u32> {
        self.log.lock().push(Call::ReadCounter(counter));
        Ok(0)
    }
}

/// Initializes test logging once; safe to call from every test.
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}
