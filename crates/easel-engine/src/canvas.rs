use crate::coords::{ImageSize, SketchSpace};
use crate::core::Context;
use crate::device::GpuDevice;
use crate::error::SketchResult;
use crate::render::RenderTarget;
use crate::texture::{Texture, TextureLayout};

/// An offscreen image that can be drawn into and sampled.
///
/// Make it the active target with [`Context::render_to_canvas`] or
/// [`Context::with_canvas`]; draw it with [`Context::image`]. Geometry drawn
/// into a canvas uses the canvas's own sketch space.
///
/// Dropping the canvas releases its texture. If it was the active target,
/// the next draw reports an error and falls back to the window.
#[derive(Debug)]
pub struct Canvas {
    target: RenderTarget,
}

impl Canvas {
    /// A canvas with half-float RGBA storage.
    pub fn new(ctx: &Context, size: ImageSize) -> SketchResult<Self> {
        Self::with_layout(ctx, size, TextureLayout::CANVAS)
    }

    pub fn with_layout(ctx: &Context, size: ImageSize, layout: TextureLayout) -> SketchResult<Self> {
        Self::with_device(ctx.gpu(), size, layout)
    }

    pub fn with_device(device: &GpuDevice, size: ImageSize, layout: TextureLayout) -> SketchResult<Self> {
        let target = RenderTarget::new(device, size, layout)?;
        log::debug!("created canvas {size} ({:?})", layout.wgpu_format());
        Ok(Self { target })
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        self.target.size()
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.size().aspect_ratio()
    }

    pub fn sketch_space(&self) -> SketchSpace {
        SketchSpace::new(self.size())
    }

    /// The canvas texture. The handle stays valid across resizes.
    #[inline]
    pub fn texture(&self) -> &Texture {
        self.target.texture()
    }

    /// Resizes, keeping the pixels of the overlapping top-left region.
    ///
    /// On failure the canvas keeps its previous size and content.
    pub fn resize(&self, size: ImageSize) -> SketchResult<()> {
        self.target.conservative_resize(size)
    }

    /// Resizes, discarding the content. The new storage is zeroed.
    pub fn destructive_resize(&self, size: ImageSize) -> SketchResult<()> {
        self.target.resize(size)
    }
}
