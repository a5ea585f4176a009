//! Helios: block-scheduled Monte Carlo path tracing core.
//!
//! Helios owns the orchestration layer of a GPU path tracer: it decomposes
//! frames into block requests, drives the multi-stage, multi-bounce kernel
//! pipeline with ping-pong ray buffers, and coordinates optional debug
//! captures, all over an abstract device gateway, so any compute backend
//! that can run the kernels can sit underneath.
//!
//! # Architecture
//!
//! - [`device::DeviceResources`]: the capability interface to the compute
//!   backend (kernel launches, readbacks).
//! - [`pipeline::Pipeline`]: an ordered, data-driven composition of
//!   [`pipeline::PipelineStage`] values: reset, primary ray generation,
//!   the [`pipeline::MonteCarloIntegrator`], post-processing.
//! - [`tracer::Tracer`]: the scheduler-facing contract. Attach a scene,
//!   enqueue [`tracer::BlockRequest`]s, receive one-shot completion
//!   signals.
//! - [`debug::CaptureSet`]: orthogonal snapshots of intermediate buffers
//!   that never change render results.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use helios::{BlockDesc, BlockRequest, CaptureConfig, DeviceTracer, Pipeline, Tracer};
//!
//! let pipeline = Arc::new(Pipeline::standard(CaptureConfig::disabled()));
//! let mut tracer = DeviceTracer::for_device(&device_info, backend, pipeline);
//! tracer.attach(scene_view, camera_rays, target)?;
//!
//! let (req, done) = BlockRequest::new(BlockDesc {
//!     block_y: 0,
//!     block_h: 64,
//!     frame_w: 256,
//!     frame_h: 256,
//!     ..BlockDesc::default()
//! })?;
//! tracer.enqueue(req);
//! let rows = done.wait()?;
//! ```

pub mod debug;
pub mod device;
pub mod errors;
pub mod pipeline;
pub mod scene;
pub mod tracer;

pub use debug::{CaptureConfig, CaptureEncoding, CaptureSet};
pub use device::{
    DeviceClass, DeviceInfo, DeviceResources, EmissiveSampleFilter, RayBuffer, enumerate_devices,
};
pub use errors::{HeliosError, Result};
pub use pipeline::{MonteCarloIntegrator, Pipeline, PipelineStage};
pub use scene::{CameraRays, SceneView};
pub use tracer::{
    BlockDesc, BlockReceiver, BlockRequest, DeviceTracer, SharedFramebuffer, Tracer, TracerContext,
};
