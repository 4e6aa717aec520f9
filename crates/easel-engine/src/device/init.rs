/// Options for opening the GPU device and configuring the window surface.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Ask for an sRGB swapchain.
    ///
    /// Off by default: sketch colors reach the screen as written, the way
    /// they are stored in canvases and exported PNGs.
    pub prefer_srgb: bool,

    /// Swap behavior. `Fifo` waits for vsync and is always supported; any
    /// other mode falls back to it when the surface lacks it.
    pub present_mode: wgpu::PresentMode,

    /// Compositor alpha mode. `None`, or an unsupported value, picks the
    /// surface's first supported mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Frames queued ahead of the display. A hint; backends may ignore it.
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// Defaults, with vsync on (`Fifo`) or off (`AutoNoVsync`).
    pub fn with_vsync(vsync: bool) -> Self {
        let present_mode = if vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        Self {
            present_mode,
            ..Self::default()
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
