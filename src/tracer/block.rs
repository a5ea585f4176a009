//! Block Requests
//!
//! A [`BlockRequest`] is the unit of work a tracer processes: a horizontal
//! slab of the output frame plus the sampling parameters for rendering it.
//! Each request carries its own one-shot completion signal, so the
//! scheduler that produced it is decoupled from pipeline execution
//! latency: `enqueue` returns immediately and the outcome arrives later
//! on the paired [`BlockReceiver`].
//!
//! Exactly one of {completion, error} fires per request, exactly once.
//! At-most-once delivery is enforced by ownership: firing the signal
//! consumes the request.

use crate::errors::{HeliosError, Result};

/// Parameters for constructing a [`BlockRequest`].
///
/// The geometry fields default to zero and must be filled in by the
/// scheduler; the sampling fields default to a reasonable progressive
/// preview configuration.
#[derive(Debug, Clone, Copy)]
pub struct BlockDesc {
    /// First row of the slab within the frame.
    pub block_y: u32,
    /// Height of the slab in rows. Must be at least 1.
    pub block_h: u32,
    /// Full frame width in pixels.
    pub frame_w: u32,
    /// Full frame height in pixels. Must cover `block_y + block_h`.
    pub frame_h: u32,
    /// Independent path samples accumulated per pixel. Must be at least 1.
    pub samples_per_pixel: u32,
    /// Maximum path length in bounces.
    pub num_bounces: u32,
    /// Bounce index at which Russian roulette termination may begin.
    /// Must not exceed `num_bounces`.
    pub min_bounces_for_rr: u32,
    /// Exposure applied by the tone-mapping stage.
    pub exposure: f32,
}

impl Default for BlockDesc {
    fn default() -> Self {
        Self {
            block_y: 0,
            block_h: 0,
            frame_w: 0,
            frame_h: 0,
            samples_per_pixel: 1,
            num_bounces: 5,
            min_bounces_for_rr: 3,
            exposure: 1.2,
        }
    }
}

/// A unit of work processed by a tracer: one horizontal slab of the frame.
///
/// Immutable after construction. The embedded signal is private; the
/// pipeline worker fires it exactly once through
/// [`complete`](BlockRequest::complete) or [`fail`](BlockRequest::fail),
/// both of which consume the request.
#[derive(Debug)]
pub struct BlockRequest {
    /// First row of the slab within the frame.
    pub block_y: u32,
    /// Height of the slab in rows.
    pub block_h: u32,
    /// Full frame width in pixels.
    pub frame_w: u32,
    /// Full frame height in pixels.
    pub frame_h: u32,
    /// Independent path samples accumulated per pixel.
    pub samples_per_pixel: u32,
    /// Maximum path length in bounces.
    pub num_bounces: u32,
    /// Bounce index at which Russian roulette termination may begin.
    pub min_bounces_for_rr: u32,
    /// Exposure applied by the tone-mapping stage.
    pub exposure: f32,

    signal: flume::Sender<Result<u32>>,
}

impl BlockRequest {
    /// Creates a validated request and the receiver for its outcome.
    ///
    /// Constraint violations surface here, at construction time, rather
    /// than mid-render:
    /// - `block_h >= 1`
    /// - `block_y + block_h <= frame_h`
    /// - `samples_per_pixel >= 1`
    /// - `min_bounces_for_rr <= num_bounces`
    pub fn new(desc: BlockDesc) -> Result<(Self, BlockReceiver)> {
        if desc.block_h == 0 {
            return Err(HeliosError::InvalidRequest(
                "block height must be at least 1 row".to_string(),
            ));
        }
        if desc.block_y + desc.block_h > desc.frame_h {
            return Err(HeliosError::InvalidRequest(format!(
                "block rows {}..{} exceed frame height {}",
                desc.block_y,
                desc.block_y + desc.block_h,
                desc.frame_h
            )));
        }
        if desc.samples_per_pixel == 0 {
            return Err(HeliosError::InvalidRequest(
                "samples per pixel must be at least 1".to_string(),
            ));
        }
        if desc.min_bounces_for_rr > desc.num_bounces {
            return Err(HeliosError::InvalidRequest(format!(
                "russian roulette start {} exceeds bounce budget {}",
                desc.min_bounces_for_rr, desc.num_bounces
            )));
        }

        let (tx, rx) = flume::bounded(1);
        let req = Self {
            block_y: desc.block_y,
            block_h: desc.block_h,
            frame_w: desc.frame_w,
            frame_h: desc.frame_h,
            samples_per_pixel: desc.samples_per_pixel,
            num_bounces: desc.num_bounces,
            min_bounces_for_rr: desc.min_bounces_for_rr,
            exposure: desc.exposure,
            signal: tx,
        };
        Ok((req, BlockReceiver { rx }))
    }

    /// Number of pixels in the slab.
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> u32 {
        self.frame_w * self.block_h
    }

    /// Fires the completion signal with the number of rendered rows.
    pub(crate) fn complete(self, rows: u32) {
        // The receiver may have been dropped by an uninterested scheduler;
        // that is not an error on this side.
        let _ = self.signal.send(Ok(rows));
    }

    /// Fires the error signal.
    pub(crate) fn fail(self, err: HeliosError) {
        let _ = self.signal.send(Err(err));
    }
}

/// Receiving half of a block request's one-shot outcome signal.
pub struct BlockReceiver {
    rx: flume::Receiver<Result<u32>>,
}

impl BlockReceiver {
    /// Blocks until the request's signal fires.
    ///
    /// On completion returns the number of rendered rows. Returns
    /// [`HeliosError::SignalLost`] if the worker died without firing the
    /// signal.
    pub fn wait(&self) -> Result<u32> {
        self.rx.recv().unwrap_or(Err(HeliosError::SignalLost))
    }

    /// Returns the outcome if the signal already fired, without blocking.
    #[must_use]
    pub fn try_wait(&self) -> Option<Result<u32>> {
        self.rx.try_recv().ok()
    }
}
