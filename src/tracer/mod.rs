//! Tracer Contract & Worker
//!
//! A [`Tracer`] is one rendering endpoint: a device, its pipeline, and a
//! queue of block requests processed strictly in enqueue order. Frame
//! schedulers talk to tracers through this trait only: identify, estimate
//! relative speed, attach to a scene, enqueue work, close.
//!
//! Within one tracer, requests never overlap: ray buffers and the
//! accumulator are device-wide shared mutable state, so concurrent blocks
//! on the same device would corrupt each other. Parallelism comes from
//! running independent tracers, each owning its own device, over disjoint
//! row ranges.

mod block;
mod context;
mod worker;

pub use block::{BlockDesc, BlockReceiver, BlockRequest};
pub use context::{SharedFramebuffer, TracerContext};
pub use worker::DeviceTracer;

use crate::errors::Result;
use crate::scene::{CameraRays, SceneView};

/// A rendering endpoint consumed by the frame scheduler.
pub trait Tracer {
    /// Stable identifier for logs and scheduler bookkeeping.
    fn id(&self) -> &str;

    /// Advisory throughput estimate relative to a CPU baseline.
    ///
    /// Only monotonic comparability across tracers matters; the scheduler
    /// uses it to split the frame proportionally across devices.
    fn speed_estimate(&self) -> f32;

    /// Binds a scene, camera and output target and starts processing
    /// block requests.
    ///
    /// Must be called exactly once before the first
    /// [`enqueue`](Tracer::enqueue).
    fn attach(
        &mut self,
        scene: SceneView,
        camera: CameraRays,
        target: SharedFramebuffer,
    ) -> Result<()>;

    /// Accepts a block request for asynchronous processing.
    ///
    /// Never blocks: the request's outcome arrives later on its own
    /// [`BlockReceiver`]. Misuse (enqueue before attach, or after close)
    /// fires the request's error signal rather than failing the caller, so
    /// the exactly-one-signal guarantee holds on every path.
    fn enqueue(&self, req: BlockRequest);

    /// Shuts the tracer down, releasing its worker and device resources.
    ///
    /// Safe to call at any time and any number of times, including after
    /// failed requests.
    fn close(&mut self);
}
