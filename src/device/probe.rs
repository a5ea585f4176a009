//! Device Discovery
//!
//! Enumerates the compute adapters visible to wgpu and classifies them for
//! the scheduler: which kernel dispatch shape to use and a rough relative
//! throughput score for balancing block requests across heterogeneous
//! devices.

use std::future::Future;
use std::pin::pin;
use std::task::{Context, Poll, Waker};

use super::DeviceClass;

/// Drives a future to completion on the current thread.
///
/// `wgpu`'s `enumerate_adapters` returns a future that, on native backends,
/// is already resolved when created, so a single poll suffices; the loop
/// only guards against a backend that reports `Pending` once.
fn block_on<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    let waker = Waker::noop();
    let mut cx = Context::from_waker(waker);
    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(value) => return value,
            Poll::Pending => std::hint::spin_loop(),
        }
    }
}

/// A discovered compute adapter.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Adapter name as reported by the driver.
    pub name: String,
    /// wgpu backend serving the adapter.
    pub backend: wgpu::Backend,
    /// Raw adapter type.
    pub device_type: wgpu::DeviceType,
    /// Coarse classification used for kernel selection.
    pub class: DeviceClass,
}

impl DeviceInfo {
    /// Advisory throughput estimate relative to a CPU baseline of `1.0`.
    ///
    /// The value has no correctness requirement; schedulers only need it
    /// to be monotonically comparable across devices, so a discrete GPU
    /// receives more rows than the integrated one next to it.
    #[must_use]
    pub fn speed_estimate(&self) -> f32 {
        match self.device_type {
            wgpu::DeviceType::DiscreteGpu => 8.0,
            wgpu::DeviceType::IntegratedGpu => 4.0,
            wgpu::DeviceType::VirtualGpu => 2.0,
            _ => 1.0,
        }
    }
}

/// Enumerates all adapters visible through wgpu.
///
/// Returns an empty list on systems without a usable backend; callers
/// that require a device should treat that as a configuration error at
/// startup rather than mid-render.
#[must_use]
pub fn enumerate_devices() -> Vec<DeviceInfo> {
    let instance = wgpu::Instance::default();

    block_on(instance.enumerate_adapters(wgpu::Backends::all()))
        .into_iter()
        .map(|adapter| {
            let info = adapter.get_info();
            log::debug!(
                "found adapter `{}` ({:?} / {:?})",
                info.name,
                info.device_type,
                info.backend
            );
            DeviceInfo {
                class: DeviceClass::from_adapter_type(info.device_type),
                name: info.name,
                backend: info.backend,
                device_type: info.device_type,
            }
        })
        .collect()
}
