use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{SketchError, SketchResult};

use super::GpuInit;

/// Shared handle to the logical device, its queue, and the command recorder.
///
/// Every GPU operation issued by the engine (clears, shape draws, resize
/// copies, readbacks) is recorded into one shared encoder, so commands execute
/// in the order user code issued them regardless of which object issued them.
/// [`submit`](Self::submit) flushes the encoder.
///
/// The handle is `!Send`: the device is only ever driven from the loop thread.
#[derive(Clone)]
pub struct GpuDevice {
    inner: Rc<Shared>,
}

struct Shared {
    device: wgpu::Device,
    queue: wgpu::Queue,
    encoder: RefCell<Option<wgpu::CommandEncoder>>,
    submissions: Cell<u64>,
}

impl GpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            inner: Rc::new(Shared {
                device,
                queue,
                encoder: RefCell::new(None),
                submissions: Cell::new(0),
            }),
        }
    }

    /// Creates a device with no surface, for offline rendering and tests.
    pub fn headless(init: &GpuInit) -> SketchResult<Self> {
        let instance = new_instance();
        let (adapter, device) = pollster::block_on(request(&instance, None, init))?;
        log::info!("headless GPU: {}", adapter.get_info().name);
        Ok(device)
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.inner.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.inner.queue
    }

    /// Largest texture side the device accepts.
    pub fn max_texture_dimension(&self) -> u32 {
        self.inner.device.limits().max_texture_dimension_2d
    }

    /// Records commands into the shared encoder, creating it if needed.
    pub fn record<R>(&self, f: impl FnOnce(&mut wgpu::CommandEncoder) -> R) -> R {
        let mut slot = self.inner.encoder.borrow_mut();
        let encoder = slot.get_or_insert_with(|| {
            self.inner
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("easel command encoder"),
                })
        });
        f(encoder)
    }

    /// Submits everything recorded so far. No-op when nothing is pending.
    pub fn submit(&self) {
        let Some(encoder) = self.inner.encoder.borrow_mut().take() else {
            return;
        };
        self.inner.queue.submit(std::iter::once(encoder.finish()));
        self.inner.submissions.set(self.inner.submissions.get() + 1);
    }

    /// Number of submissions so far.
    ///
    /// Per-draw uniform slots written with `Queue::write_buffer` are only safe
    /// to reuse once the draws reading them were submitted; renderers compare
    /// this counter to know when that happened.
    #[inline]
    pub fn submission_epoch(&self) -> u64 {
        self.inner.submissions.get()
    }

    /// Runs `f` inside a validation error scope and reports what it raised.
    pub(crate) fn validated<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
        let device = &self.inner.device;
        // The scope lives until the guard is popped; dropping it early discards the errors.
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(device);
        match pollster::block_on(scope.pop()) {
            None => Ok(value),
            Some(err) => Err(err.to_string()),
        }
    }

    /// Blocks until the device has finished all submitted work.
    pub(crate) fn wait_idle(&self) -> SketchResult<()> {
        self.inner
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| SketchError::Readback(format!("device poll failed: {e}")))
    }

    /// Whether two handles drive the same device.
    pub fn same_device(&self, other: &GpuDevice) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for GpuDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuDevice")
            .field("submissions", &self.inner.submissions.get())
            .finish_non_exhaustive()
    }
}

pub(crate) fn new_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Picks an adapter able to drive `surface` (any adapter when `None`) and
/// opens a device on it.
pub(crate) async fn request(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
    init: &GpuInit,
) -> SketchResult<(wgpu::Adapter, GpuDevice)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| SketchError::Initialization(format!("no suitable GPU adapter: {e}")))?;

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("easel device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(|e| SketchError::Initialization(format!("failed to open device: {e}")))?;

    Ok((adapter, GpuDevice::new(device, queue)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> Option<GpuDevice> {
        match GpuDevice::headless(&GpuInit::default()) {
            Ok(d) => Some(d),
            Err(SketchError::Initialization(msg)) => {
                eprintln!("skipping: no GPU adapter ({msg})");
                None
            }
            Err(e) => panic!("unexpected error opening device: {e}"),
        }
    }

    fn buffer(d: &wgpu::Device, usage: wgpu::BufferUsages) -> wgpu::Buffer {
        d.create_buffer(&wgpu::BufferDescriptor {
            label: Some("validated test buffer"),
            size: 16,
            usage,
            mapped_at_creation: false,
        })
    }

    /// Mapping a buffer both ways is rejected by validation.
    fn read_and_write() -> wgpu::BufferUsages {
        wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::MAP_WRITE
    }

    // ── error scopes ──────────────────────────────────────────────────────

    #[test]
    fn validation_errors_are_captured() {
        let Some(gpu) = device() else { return };
        let result = gpu.validated(|d| buffer(d, read_and_write()));
        assert!(result.is_err());
    }

    #[test]
    fn valid_work_passes_and_scope_is_closed() {
        let Some(gpu) = device() else { return };
        assert!(gpu.validated(|d| buffer(d, wgpu::BufferUsages::UNIFORM)).is_ok());

        // A failing scope must not leak into the next one.
        let _ = gpu.validated(|d| buffer(d, read_and_write()));
        assert!(gpu.validated(|d| buffer(d, wgpu::BufferUsages::VERTEX)).is_ok());
    }
}
