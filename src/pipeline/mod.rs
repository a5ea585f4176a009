//! Render Pipeline
//!
//! A [`Pipeline`] is the recipe for rendering one block request: an
//! ordered composition of [`PipelineStage`] values. Stages are data, not
//! an inheritance hierarchy: any slot accepts anything implementing the
//! stage contract, including plain closures, so integrators and
//! post-processing chains can be swapped without touching execution logic.
//!
//! # Stage Contract
//!
//! A stage maps `(tracer context, block request)` to elapsed device time
//! or an error. Stages hold no cross-call mutable state (the one declared
//! exception is the context's lazily-sized staging buffer) and route all
//! mutation through the device gateway, which is what makes a constructed
//! pipeline safe to share read-only across requests.
//!
//! # Failure Semantics
//!
//! The runner executes stages in order and aborts on the first error; the
//! partial elapsed time of a failed run is discarded. The runner owns
//! cumulative timing; stages only report their own cost.

mod integrator;
mod stages;

pub use integrator::MonteCarloIntegrator;
pub use stages::{
    ClearAccumulator, CopyFramebuffer, PerspectiveCamera, SaveFramebuffer, TonemapSimpleReinhard,
};

use std::time::Duration;

use crate::debug::{CaptureConfig, CaptureSet};
use crate::errors::Result;
use crate::tracer::{BlockRequest, TracerContext};

/// One named, swappable unit of pipeline work.
pub trait PipelineStage: Send + Sync {
    /// Stage name for logs and timing output.
    fn name(&self) -> &str;

    /// Executes the stage for one block request, returning elapsed device
    /// time.
    fn run(&self, tr: &mut TracerContext, req: &BlockRequest) -> Result<Duration>;
}

/// Any matching closure is a stage.
impl<F> PipelineStage for F
where
    F: Fn(&mut TracerContext, &BlockRequest) -> Result<Duration> + Send + Sync,
{
    fn name(&self) -> &str {
        "custom stage"
    }

    fn run(&self, tr: &mut TracerContext, req: &BlockRequest) -> Result<Duration> {
        self(tr, req)
    }
}

/// An ordered composition of stages rendering one block request.
///
/// Constructed once at startup (or reconfigured for a debug session) and
/// shared read-only across requests.
pub struct Pipeline {
    /// Resets tracer state for the block. Runs whenever the camera moved
    /// or the sample counter was reset.
    pub reset: Box<dyn PipelineStage>,

    /// Generates a fresh set of primary rays. Depending on the samples
    /// per pixel this stage may be invoked more than once per frame by
    /// the scheduler.
    pub primary_ray_generator: Box<dyn PipelineStage>,

    /// The integrator tracing the primary rays and adding their
    /// contribution to the accumulation buffer.
    pub integrator: Box<dyn PipelineStage>,

    /// Post-processing stages executed in order before the block is
    /// reported complete.
    pub post_process: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    /// Creates a pipeline with empty post-processing.
    #[must_use]
    pub fn new(
        reset: Box<dyn PipelineStage>,
        primary_ray_generator: Box<dyn PipelineStage>,
        integrator: Box<dyn PipelineStage>,
    ) -> Self {
        Self {
            reset,
            primary_ray_generator,
            integrator,
            post_process: Vec::new(),
        }
    }

    /// Appends a post-processing stage (chainable).
    #[must_use]
    pub fn with_post_stage(mut self, stage: Box<dyn PipelineStage>) -> Self {
        self.post_process.push(stage);
        self
    }

    /// The standard configuration: clear the accumulator, generate
    /// perspective-camera primary rays, run the Monte Carlo integrator,
    /// tone-map, and copy the framebuffer out to the shared target.
    ///
    /// When the [`FRAMEBUFFER`](CaptureSet::FRAMEBUFFER) capture point is
    /// enabled, a framebuffer dump stage is appended after the copy.
    #[must_use]
    pub fn standard(captures: CaptureConfig) -> Self {
        let dump = captures
            .wants(CaptureSet::FRAMEBUFFER)
            .then(|| captures.image_path("framebuffer"));

        let mut pipeline = Self::new(
            Box::new(ClearAccumulator),
            Box::new(PerspectiveCamera),
            Box::new(MonteCarloIntegrator::new(captures)),
        )
        .with_post_stage(Box::new(TonemapSimpleReinhard))
        .with_post_stage(Box::new(CopyFramebuffer));

        if let Some(path) = dump {
            pipeline = pipeline.with_post_stage(Box::new(SaveFramebuffer::new(path)));
        }
        pipeline
    }

    /// Runs every stage in order for one block request.
    ///
    /// Returns cumulative elapsed device time; the first stage error
    /// aborts the remaining stages and discards partial timing.
    pub fn run_block(&self, tr: &mut TracerContext, req: &BlockRequest) -> Result<Duration> {
        let mut total = Duration::ZERO;
        for stage in self.stages() {
            let elapsed = stage.run(tr, req)?;
            log::debug!("stage `{}` took {elapsed:?}", stage.name());
            total += elapsed;
        }
        Ok(total)
    }

    fn stages(&self) -> impl Iterator<Item = &dyn PipelineStage> {
        [
            &*self.reset,
            &*self.primary_ray_generator,
            &*self.integrator,
        ]
        .into_iter()
        .chain(self.post_process.iter().map(|stage| &**stage))
    }
}
