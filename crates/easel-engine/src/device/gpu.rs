use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::{SketchError, SketchResult};

use super::handle::{new_instance, request};
use super::{GpuDevice, GpuInit};

/// The window's swapchain plus the device that renders into it.
///
/// Sketch drawing never touches the surface: it goes to the offscreen window
/// target, and the runtime blits that target into the frame acquired here.
pub struct Gpu<'w> {
    _instance: wgpu::Instance,
    /// Borrows the window; the window must outlive this value.
    surface: wgpu::Surface<'w>,
    adapter: wgpu::Adapter,
    device: GpuDevice,
    config: wgpu::SurfaceConfiguration,
    /// Last size reported by the window. May be 0x0 while minimized, in
    /// which case `config` keeps the previous drawable size.
    size: PhysicalSize<u32>,
}

/// An acquired swapchain image. Present it with [`Gpu::submit`] before
/// acquiring the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

/// What the runtime should do after `get_current_texture` failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was configured again; try next frame.
    Reconfigured,
    SkipFrame,
    /// Out of memory. Stop the loop.
    Fatal,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> SketchResult<Self> {
        let size = window.inner_size();
        let instance = new_instance();

        let surface = instance
            .create_surface(window)
            .map_err(|e| SketchError::Initialization(format!("failed to create surface: {e}")))?;

        let (adapter, device) = request(&instance, Some(&surface), &init).await?;
        let config = surface_config(&surface.get_capabilities(&adapter), &init, size)?;

        if size.width > 0 && size.height > 0 {
            surface.configure(device.device(), &config);
        }

        let info = adapter.get_info();
        log::info!(
            "GPU: {} ({:?}), surface {:?}, {:?}",
            info.name,
            info.backend,
            config.format,
            config.present_mode
        );

        Ok(Gpu {
            _instance: instance,
            surface,
            adapter,
            device,
            config,
            size,
        })
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Drawable size in physical pixels.
    #[inline]
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// `false` while the window has no area (minimized).
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.size.width > 0 && self.size.height > 0
    }

    #[inline]
    pub fn device(&self) -> &GpuDevice {
        &self.device
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Reconfigures the swapchain. A zero size is remembered but not applied.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if !self.is_drawable() {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(self.device.device(), &self.config);
    }

    pub fn begin_frame(&self) -> Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(GpuFrame {
            surface_texture,
            view,
        })
    }

    /// Flushes the shared encoder, then presents `frame`.
    pub fn submit(&self, frame: GpuFrame) {
        self.device.submit();
        let GpuFrame {
            surface_texture,
            view,
        } = frame;
        drop(view);
        surface_texture.present();
    }

    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                if self.is_drawable() {
                    self.surface.configure(self.device.device(), &self.config);
                }
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout | SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

fn surface_config(
    caps: &wgpu::SurfaceCapabilities,
    init: &GpuInit,
    size: PhysicalSize<u32>,
) -> SketchResult<wgpu::SurfaceConfiguration> {
    let format = choose_surface_format(&caps.formats, init.prefer_srgb).ok_or_else(|| {
        SketchError::Initialization("surface reports no supported formats".to_string())
    })?;

    let alpha_mode = init
        .alpha_mode
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

    let present_mode = if caps.present_modes.contains(&init.present_mode) {
        init.present_mode
    } else {
        log::warn!("present mode {:?} unsupported, using Fifo", init.present_mode);
        wgpu::PresentMode::Fifo
    };

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    })
}

/// Linear 8-bit formats unless sRGB is asked for; otherwise the first one offered.
fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat as F;

    let preferred: [F; 2] = if prefer_srgb {
        [F::Bgra8UnormSrgb, F::Rgba8UnormSrgb]
    } else {
        [F::Bgra8Unorm, F::Rgba8Unorm]
    };
    preferred
        .into_iter()
        .find(|f| formats.contains(f))
        .or_else(|| formats.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_linear_formats_by_default() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8Unorm,
        ];
        assert_eq!(
            choose_surface_format(&formats, false),
            Some(wgpu::TextureFormat::Rgba8Unorm)
        );
        assert_eq!(
            choose_surface_format(&formats, true),
            Some(wgpu::TextureFormat::Bgra8UnormSrgb)
        );
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [wgpu::TextureFormat::Rgb10a2Unorm];
        assert_eq!(
            choose_surface_format(&formats, false),
            Some(wgpu::TextureFormat::Rgb10a2Unorm)
        );
        assert_eq!(choose_surface_format(&[], false), None);
    }
}
