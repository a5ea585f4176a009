//! Worker-Backed Tracer
//!
//! [`DeviceTracer`] binds one device gateway to one worker thread. The
//! worker drains block requests from a channel in enqueue order, runs the
//! shared pipeline for each, and fires the request's one-shot signal with
//! the outcome. `enqueue` is the only caller-visible suspension point and
//! it never blocks.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::device::{DeviceClass, DeviceInfo, DeviceResources};
use crate::errors::{HeliosError, Result};
use crate::pipeline::Pipeline;
use crate::scene::{CameraRays, SceneView};

use super::context::{SharedFramebuffer, TracerContext};
use super::{BlockRequest, Tracer};

enum State {
    /// Constructed, not yet attached: the gateway waits here for the
    /// worker to take ownership of it.
    Idle(Box<dyn DeviceResources>),
    /// Attached: the worker owns the gateway and drains the queue.
    Running {
        queue: flume::Sender<BlockRequest>,
        worker: JoinHandle<()>,
    },
    Closed,
}

/// A tracer running its pipeline on a dedicated worker thread.
pub struct DeviceTracer {
    id: String,
    device_class: DeviceClass,
    speed: f32,
    pipeline: Arc<Pipeline>,
    state: State,
}

impl DeviceTracer {
    /// Creates a tracer over an explicit device classification and speed
    /// score.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        device_class: DeviceClass,
        speed: f32,
        resources: Box<dyn DeviceResources>,
        pipeline: Arc<Pipeline>,
    ) -> Self {
        Self {
            id: id.into(),
            device_class,
            speed,
            pipeline,
            state: State::Idle(resources),
        }
    }

    /// Creates a tracer for a discovered adapter, taking its name, class
    /// and speed score from the probe result.
    #[must_use]
    pub fn for_device(
        info: &DeviceInfo,
        resources: Box<dyn DeviceResources>,
        pipeline: Arc<Pipeline>,
    ) -> Self {
        Self::new(
            info.name.clone(),
            info.class,
            info.speed_estimate(),
            resources,
            pipeline,
        )
    }
}

impl Tracer for DeviceTracer {
    fn id(&self) -> &str {
        &self.id
    }

    fn speed_estimate(&self) -> f32 {
        self.speed
    }

    fn attach(
        &mut self,
        scene: SceneView,
        camera: CameraRays,
        target: SharedFramebuffer,
    ) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Idle(resources) => {
                let ctx = TracerContext::new(resources, scene, camera, self.device_class, target);
                let (tx, rx) = flume::unbounded();
                let pipeline = Arc::clone(&self.pipeline);
                let id = self.id.clone();

                let worker = std::thread::Builder::new()
                    .name(format!("helios-tracer-{id}"))
                    .spawn(move || run_worker(&id, &rx, &pipeline, ctx))?;

                self.state = State::Running { queue: tx, worker };
                Ok(())
            }
            state @ State::Running { .. } => {
                self.state = state;
                Err(HeliosError::AlreadyAttached)
            }
            State::Closed => Err(HeliosError::Closed),
        }
    }

    fn enqueue(&self, req: BlockRequest) {
        match &self.state {
            State::Running { queue, .. } => {
                // A dead worker surfaces as a send error; the request's
                // own signal still fires exactly once.
                if let Err(send_err) = queue.send(req) {
                    send_err.into_inner().fail(HeliosError::Closed);
                }
            }
            State::Idle(_) => req.fail(HeliosError::NotAttached),
            State::Closed => req.fail(HeliosError::Closed),
        }
    }

    fn close(&mut self) {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Running { queue, worker } => {
                // Dropping the sender lets the worker finish queued
                // requests and exit its receive loop.
                drop(queue);
                if worker.join().is_err() {
                    log::warn!("tracer {}: worker panicked during shutdown", self.id);
                }
            }
            State::Idle(resources) => drop(resources),
            State::Closed => {}
        }
    }
}

impl Drop for DeviceTracer {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_worker(
    id: &str,
    queue: &flume::Receiver<BlockRequest>,
    pipeline: &Pipeline,
    mut ctx: TracerContext,
) {
    log::info!("tracer {id}: worker started");

    for req in queue.iter() {
        let rows = req.block_h;
        match pipeline.run_block(&mut ctx, &req) {
            Ok(elapsed) => {
                log::debug!(
                    "tracer {id}: rows {}..{} done in {elapsed:?}",
                    req.block_y,
                    req.block_y + rows
                );
                req.complete(rows);
            }
            Err(err) => {
                log::warn!(
                    "tracer {id}: rows {}..{} failed: {err}",
                    req.block_y,
                    req.block_y + rows
                );
                req.fail(err);
            }
        }
    }

    log::info!("tracer {id}: worker stopped");
}
