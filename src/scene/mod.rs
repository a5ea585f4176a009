//! Scene View & Camera Shape
//!
//! The tracing core does not load or lay out scene data; it consumes two
//! small read-only views of state that lives elsewhere:
//!
//! - [`SceneView`]: the scene facts the integrator needs to schedule kernels
//!   (emissive primitive count, optional uniform background material).
//! - [`CameraRays`]: the precomputed eye position and frustum-corner ray
//!   directions that the primary ray generation kernel interpolates
//!   per pixel.
//!
//! Camera matrix math (view/projection, corner derivation) stays with the
//! camera owner; this module only defines the consumed data shape.

use glam::{Vec3, Vec4};

/// Read-only scene facts consumed by the integrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneView {
    /// Number of emissive primitives available for next-event estimation.
    ///
    /// A scene with no emissives is valid: hit shading emits no occlusion
    /// rays and the accumulation stage runs over zero work.
    pub emissive_count: u32,

    /// Material index of the uniform scene background, if the scene
    /// defines one.
    ///
    /// `None` disables miss shading entirely: rays that leave the scene
    /// contribute nothing.
    pub background_material: Option<u32>,
}

impl SceneView {
    /// Creates a scene view.
    #[must_use]
    pub fn new(emissive_count: u32, background_material: Option<u32>) -> Self {
        Self {
            emissive_count,
            background_material,
        }
    }
}

/// Eye position and frustum-corner ray directions for primary ray
/// generation.
///
/// The four corner directions (top-left, top-right, bottom-left,
/// bottom-right) span the frame; the ray generation kernel derives each
/// pixel's primary ray by bilinear interpolation between them. The `w`
/// component of each corner is unused by this crate and passed through to
/// the kernel unchanged.
#[derive(Debug, Clone, Copy)]
pub struct CameraRays {
    /// World-space eye position.
    pub eye: Vec3,
    /// Frustum-corner ray directions, one per frame corner.
    pub corners: [Vec4; 4],
}

impl CameraRays {
    /// Creates a camera ray bundle from a precomputed eye and frustum.
    #[must_use]
    pub fn new(eye: Vec3, corners: [Vec4; 4]) -> Self {
        Self { eye, corners }
    }
}

impl Default for CameraRays {
    fn default() -> Self {
        // Unit frustum looking down -Z; real callers overwrite this with
        // their camera's derived corners.
        Self {
            eye: Vec3::ZERO,
            corners: [
                Vec4::new(-1.0, 1.0, -1.0, 0.0),
                Vec4::new(1.0, 1.0, -1.0, 0.0),
                Vec4::new(-1.0, -1.0, -1.0, 0.0),
                Vec4::new(1.0, -1.0, -1.0, 0.0),
            ],
        }
    }
}
