//! Tracer Context
//!
//! [`TracerContext`] is the per-worker mutable state threaded through
//! pipeline stages: the device gateway, the attached scene and camera
//! views, the shared render target, and a reusable host-side staging
//! buffer for readbacks.
//!
//! One context exists per tracer worker and never crosses threads, so no
//! field needs interior mutability; all device mutation is routed through
//! the gateway.

use std::sync::Arc;

use crate::device::{DeviceClass, DeviceResources};
use crate::errors::Result;
use crate::scene::{CameraRays, SceneView};

/// Shared handle to the host-side copy of the framebuffer.
///
/// Bound at `attach`; the framebuffer copy-out stage refreshes it after
/// each block and presentation code on other threads reads it at will.
pub type SharedFramebuffer = Arc<parking_lot::Mutex<Vec<u8>>>;

/// Mutable per-worker state passed to every pipeline stage.
pub struct TracerContext {
    /// The device gateway executing all kernels and readbacks.
    pub resources: Box<dyn DeviceResources>,
    /// Scene facts consumed by the integrator.
    pub scene: SceneView,
    /// Precomputed camera rays for primary ray generation.
    pub camera: CameraRays,
    /// Dispatch-shape classification of the underlying device.
    pub device_class: DeviceClass,
    /// Host-side framebuffer copy shared with the presenter.
    pub target: SharedFramebuffer,

    // Reused across blocks; resized only when the device buffer size
    // changes. Not safe for concurrent use, which is fine: stages for one
    // tracer run strictly sequentially.
    staging: Vec<u8>,
}

impl TracerContext {
    /// Creates a context for a freshly attached tracer.
    #[must_use]
    pub fn new(
        resources: Box<dyn DeviceResources>,
        scene: SceneView,
        camera: CameraRays,
        device_class: DeviceClass,
        target: SharedFramebuffer,
    ) -> Self {
        Self {
            resources,
            scene,
            camera,
            device_class,
            target,
            staging: Vec::new(),
        }
    }

    /// Reads the device framebuffer into the staging buffer and returns it.
    pub fn read_framebuffer_staged(&mut self) -> Result<&[u8]> {
        let len = self.resources.framebuffer_len();
        if self.staging.len() != len {
            self.staging.resize(len, 0);
        }
        self.resources.read_framebuffer(&mut self.staging)?;
        Ok(&self.staging)
    }

    /// Reads the device debug output buffer into the staging buffer and
    /// returns it.
    pub fn read_debug_buffer_staged(&mut self) -> Result<&[u8]> {
        let len = self.resources.debug_buffer_len();
        if self.staging.len() != len {
            self.staging.resize(len, 0);
        }
        self.resources.read_debug_buffer(&mut self.staging)?;
        Ok(&self.staging)
    }
}
