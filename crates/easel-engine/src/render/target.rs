use crate::coords::{ImageSize, SketchSpace};
use crate::device::GpuDevice;
use crate::error::{SketchError, SketchResult};
use crate::paint::Color;
use crate::texture::{self, Texture, TextureLayout};

use super::DrawTarget;

/// An offscreen color texture that can be drawn into.
///
/// The texture handle returned by [`texture`](Self::texture) is stable: both
/// resize operations swap the storage behind it, so clones taken earlier keep
/// working and report the new size.
pub struct RenderTarget {
    texture: Texture,
}

impl RenderTarget {
    /// Allocates a zeroed target.
    ///
    /// Fails with `IncompleteFramebuffer` if `layout` cannot be rendered into.
    pub fn new(device: &GpuDevice, size: ImageSize, layout: TextureLayout) -> SketchResult<Self> {
        if !texture::is_renderable(device, layout) {
            return Err(SketchError::IncompleteFramebuffer(format!(
                "{:?} cannot be used as a render target",
                layout.wgpu_format()
            )));
        }
        let texture = Texture::new(device, size, layout)?;
        Ok(Self { texture })
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        self.texture.size()
    }

    #[inline]
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Reallocates at `new_size`, keeping the overlapping region.
    ///
    /// The intersection of the old and new sizes, anchored at the top-left
    /// corner, is copied over. On failure the target is left untouched.
    pub fn conservative_resize(&self, new_size: ImageSize) -> SketchResult<()> {
        let old_size = self.size();
        if new_size == old_size {
            return Ok(());
        }

        let device = self.texture.device();
        let old = self.texture.raw();
        let new = texture::allocate(&device, new_size, self.texture.layout(), "easel render target")?;

        let overlap = old_size.intersection(new_size);
        device.record(|encoder| {
            encoder.copy_texture_to_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &old,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::TexelCopyTextureInfo {
                    texture: &new,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                overlap.extent(),
            );
        });

        self.texture.replace_storage(new, new_size);
        log::debug!("render target resized {old_size} -> {new_size} (kept {overlap})");
        Ok(())
    }

    /// Reallocates at `new_size`, discarding the content. The new storage is zeroed.
    pub fn resize(&self, new_size: ImageSize) -> SketchResult<()> {
        let old_size = self.size();
        if new_size == old_size {
            return Ok(());
        }

        let device = self.texture.device();
        let new = texture::allocate(&device, new_size, self.texture.layout(), "easel render target")?;
        self.texture.replace_storage(new, new_size);
        log::debug!("render target reallocated {old_size} -> {new_size}");
        Ok(())
    }
}

impl std::fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTarget")
            .field("texture", &self.texture)
            .finish()
    }
}

/// Describes `texture` as a draw destination.
pub(crate) fn draw_target(texture: &Texture) -> DrawTarget {
    DrawTarget {
        view: texture.view(),
        format: texture.format(),
        blendable: texture.is_blendable(),
        space: SketchSpace::new(texture.size()),
    }
}

/// Overwrites every texel of `texture` with `color`, without blending.
pub(crate) fn clear(texture: &Texture, color: Color) {
    let view = texture.view();
    texture.device().record(|encoder| {
        let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("easel clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    });
}
