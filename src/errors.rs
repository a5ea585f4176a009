//! Error Types
//!
//! This module defines the error types used throughout the tracing core.
//!
//! # Overview
//!
//! The main error type [`HeliosError`] covers all failure modes including:
//! - Device kernel and readback failures
//! - Block request validation errors
//! - Tracer lifecycle misuse
//! - Debug capture I/O and encoding errors
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, HeliosError>`.
//!
//! A device-operation error is always fatal to the block request that
//! triggered it: a partially executed bounce leaves the device-side ray and
//! accumulation buffers in an inconsistent state, so nothing in this crate
//! retries a failed kernel. Retry policy, if any, belongs to the scheduler
//! that re-enqueues a fresh request.

use thiserror::Error;

/// The main error type for the Helios tracing core.
///
/// Each variant provides specific context about what went wrong. Variants
/// are grouped by the subsystem that produces them.
#[derive(Error, Debug)]
pub enum HeliosError {
    // ========================================================================
    // Device & Kernel Errors
    // ========================================================================
    /// A named device operation (kernel launch or compute) failed.
    #[error("device operation `{op}` failed: {reason}")]
    DeviceOp {
        /// The gateway operation that failed
        op: &'static str,
        /// Backend-specific failure description
        reason: String,
    },

    /// A host/device buffer transfer was attempted with mismatched sizes.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        /// Size the host expected, in bytes
        expected: usize,
        /// Size the device reported, in bytes
        actual: usize,
    },

    // ========================================================================
    // Block Request Errors
    // ========================================================================
    /// A block request violated one of its construction-time constraints.
    #[error("invalid block request: {0}")]
    InvalidRequest(String),

    // ========================================================================
    // Tracer Lifecycle Errors
    // ========================================================================
    /// A block request was enqueued before `attach` bound a scene.
    #[error("tracer is not attached to a scene")]
    NotAttached,

    /// `attach` was called on a tracer that already has a scene bound.
    #[error("tracer is already attached to a scene")]
    AlreadyAttached,

    /// A block request was enqueued after the tracer was closed.
    #[error("tracer is closed")]
    Closed,

    /// The worker went away without firing the request's signal.
    ///
    /// This is only observable through [`BlockReceiver`] when the worker
    /// thread dies abnormally; a healthy tracer fires exactly one signal
    /// per request.
    ///
    /// [`BlockReceiver`]: crate::tracer::BlockReceiver
    #[error("completion signal was lost")]
    SignalLost,

    // ========================================================================
    // Capture & I/O Errors
    // ========================================================================
    /// File I/O error while persisting a debug capture.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image encoding error while persisting a debug capture.
    #[error("image encode error: {0}")]
    ImageEncodeError(String),
}

impl From<image::ImageError> for HeliosError {
    fn from(err: image::ImageError) -> Self {
        HeliosError::ImageEncodeError(err.to_string())
    }
}

/// Alias for `Result<T, HeliosError>`.
pub type Result<T> = std::result::Result<T, HeliosError>;
