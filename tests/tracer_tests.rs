//! Tracer Lifecycle Tests
//!
//! Tests for:
//! - Attach/enqueue/close lifecycle and misuse handling
//! - Exactly-one-signal delivery per block request
//! - Strict enqueue-order processing within one tracer
//! - Shared framebuffer target refresh after completion
//! - Idempotent close

mod common;

use std::sync::Arc;

use parking_lot::Mutex;

use common::{Call, MockDevice, init_logs};
use helios::{
    BlockDesc, BlockRequest, BlockReceiver, CameraRays, CaptureConfig, DeviceClass, DeviceTracer,
    HeliosError, Pipeline, SceneView, SharedFramebuffer, Tracer,
};

const FRAME_W: u32 = 128;
const FRAME_H: u32 = 128;

fn tracer_with_mock(mock: MockDevice) -> DeviceTracer {
    init_logs();
    let pipeline = Arc::new(Pipeline::standard(CaptureConfig::disabled()));
    DeviceTracer::new("test-device", DeviceClass::Gpu, 8.0, Box::new(mock), pipeline)
}

fn attach(tracer: &mut DeviceTracer) -> SharedFramebuffer {
    let target: SharedFramebuffer = Arc::new(Mutex::new(Vec::new()));
    tracer
        .attach(
            SceneView::new(1, Some(0)),
            CameraRays::default(),
            target.clone(),
        )
        .unwrap();
    target
}

fn block_at(block_y: u32) -> (BlockRequest, BlockReceiver) {
    BlockRequest::new(BlockDesc {
        block_y,
        block_h: 32,
        frame_w: FRAME_W,
        frame_h: FRAME_H,
        samples_per_pixel: 1,
        num_bounces: 2,
        min_bounces_for_rr: 1,
        exposure: 1.0,
    })
    .unwrap()
}

// ============================================================================
// Identification
// ============================================================================

#[test]
fn tracer_reports_its_id_and_speed() {
    let tracer = tracer_with_mock(MockDevice::new(FRAME_W, FRAME_H));
    assert_eq!(tracer.id(), "test-device");
    assert!((tracer.speed_estimate() - 8.0).abs() < f32::EPSILON);
}

// ============================================================================
// Signal Delivery
// ============================================================================

#[test]
fn completed_block_signals_its_row_count_exactly_once() {
    let mut tracer = tracer_with_mock(MockDevice::new(FRAME_W, FRAME_H));
    attach(&mut tracer);

    let (req, done) = block_at(0);
    tracer.enqueue(req);

    assert_eq!(done.wait().unwrap(), 32);
    // The one-shot signal cannot fire again.
    assert!(matches!(done.wait(), Err(HeliosError::SignalLost)));
}

#[test]
fn failed_block_signals_the_device_error() {
    let mut mock = MockDevice::new(FRAME_W, FRAME_H);
    mock.fail_shade_hits_at_bounce = Some(0);
    let mut tracer = tracer_with_mock(mock);
    attach(&mut tracer);

    let (req, done) = block_at(0);
    tracer.enqueue(req);

    assert!(matches!(
        done.wait(),
        Err(HeliosError::DeviceOp {
            op: "shade_hits",
            ..
        })
    ));
}

#[test]
fn failure_on_one_block_does_not_poison_the_next() {
    let mut mock = MockDevice::new(FRAME_W, FRAME_H);
    mock.fail_tonemap = true;
    let log = mock.log_handle();
    let mut tracer = tracer_with_mock(mock);
    attach(&mut tracer);

    let (first, first_done) = block_at(0);
    tracer.enqueue(first);
    assert!(first_done.wait().is_err());

    // The tracer keeps draining its queue after a failed request; only the
    // failed block's rows are lost.
    let (second, second_done) = block_at(32);
    tracer.enqueue(second);
    assert!(second_done.wait().is_err());

    let calls = log.lock().clone();
    let clears: Vec<u32> = calls
        .iter()
        .filter_map(|c| match c {
            Call::ClearAccumulator { block_y } => Some(*block_y),
            _ => None,
        })
        .collect();
    assert_eq!(clears, vec![0, 32]);
}

// ============================================================================
// Lifecycle Misuse
// ============================================================================

#[test]
fn enqueue_before_attach_fires_the_error_signal() {
    let tracer = tracer_with_mock(MockDevice::new(FRAME_W, FRAME_H));

    let (req, done) = block_at(0);
    tracer.enqueue(req);
    assert!(matches!(done.wait(), Err(HeliosError::NotAttached)));
}

#[test]
fn enqueue_after_close_fires_the_error_signal() {
    let mut tracer = tracer_with_mock(MockDevice::new(FRAME_W, FRAME_H));
    attach(&mut tracer);
    tracer.close();

    let (req, done) = block_at(0);
    tracer.enqueue(req);
    assert!(matches!(done.wait(), Err(HeliosError::Closed)));
}

#[test]
fn attaching_twice_is_a_configuration_error() {
    let mut tracer = tracer_with_mock(MockDevice::new(FRAME_W, FRAME_H));
    attach(&mut tracer);

    let target: SharedFramebuffer = Arc::new(Mutex::new(Vec::new()));
    let second = tracer.attach(SceneView::default(), CameraRays::default(), target);
    assert!(matches!(second, Err(HeliosError::AlreadyAttached)));
}

#[test]
fn close_is_idempotent_and_waits_for_queued_work() {
    let mock = MockDevice::new(FRAME_W, FRAME_H);
    let log = mock.log_handle();
    let mut tracer = tracer_with_mock(mock);
    attach(&mut tracer);

    let (req, done) = block_at(0);
    tracer.enqueue(req);
    tracer.close();
    tracer.close();

    // The queued block finished before close returned.
    assert_eq!(done.wait().unwrap(), 32);
    assert!(log.lock().iter().any(|c| matches!(c, Call::Tonemap { .. })));
}

// ============================================================================
// Ordering & Output
// ============================================================================

#[test]
fn blocks_are_processed_in_enqueue_order() {
    let mock = MockDevice::new(FRAME_W, FRAME_H);
    let log = mock.log_handle();
    let mut tracer = tracer_with_mock(mock);
    attach(&mut tracer);

    let mut receivers = Vec::new();
    for block_y in [96, 0, 64, 32] {
        let (req, done) = block_at(block_y);
        tracer.enqueue(req);
        receivers.push(done);
    }
    for done in &receivers {
        assert_eq!(done.wait().unwrap(), 32);
    }

    let calls = log.lock().clone();
    let clears: Vec<u32> = calls
        .iter()
        .filter_map(|c| match c {
            Call::ClearAccumulator { block_y } => Some(*block_y),
            _ => None,
        })
        .collect();
    assert_eq!(clears, vec![96, 0, 64, 32]);
}

#[test]
fn completion_refreshes_the_shared_framebuffer_target() {
    let mut tracer = tracer_with_mock(MockDevice::new(FRAME_W, FRAME_H));
    let target = attach(&mut tracer);

    let (req, done) = block_at(0);
    tracer.enqueue(req);
    done.wait().unwrap();

    let out = target.lock();
    assert_eq!(out.len(), FRAME_W as usize * FRAME_H as usize * 4);
    assert!(out.iter().all(|&b| b == 0x40));
}
