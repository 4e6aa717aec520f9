use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};

use half::f16;

use crate::coords::ImageSize;
use crate::device::GpuDevice;
use crate::error::{SketchError, SketchResult};

use super::layout::{InternalFormat, TexelType, TextureLayout};
use super::readback;

/// A 2D color texture living on the GPU.
///
/// `Texture` is a cheap, clonable handle. The storage behind it can be
/// replaced (render target resizes do this), and every clone observes the new
/// storage: a handle taken before a resize stays valid and reports the new size.
#[derive(Clone)]
pub struct Texture {
    slot: Rc<RefCell<TextureSlot>>,
}

/// Non-owning reference to a [`Texture`].
#[derive(Clone)]
pub struct WeakTexture {
    slot: Weak<RefCell<TextureSlot>>,
}

struct TextureSlot {
    device: GpuDevice,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: ImageSize,
    layout: TextureLayout,
}

impl Texture {
    /// Allocates a zeroed texture.
    pub fn new(device: &GpuDevice, size: ImageSize, layout: TextureLayout) -> SketchResult<Self> {
        let texture = allocate(device, size, layout, "easel texture")?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            slot: Rc::new(RefCell::new(TextureSlot {
                device: device.clone(),
                texture,
                view,
                size,
                layout,
            })),
        })
    }

    /// Decodes a PNG file into an RGBA8 texture.
    pub fn load_png(device: &GpuDevice, path: impl AsRef<Path>) -> SketchResult<Self> {
        let path = path.as_ref();
        let image = image::ImageReader::open(path)
            .map_err(|e| SketchError::invalid(format!("cannot open {}: {e}", path.display())))?
            .decode()
            .map_err(|e| SketchError::invalid(format!("cannot decode {}: {e}", path.display())))?
            .to_rgba8();

        let size = ImageSize::new(image.width(), image.height())?;
        let texture = Self::new(device, size, TextureLayout::RGBA8)?;
        texture.write_texels(image.as_raw())?;
        log::debug!("loaded {} ({size})", path.display());
        Ok(texture)
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        self.slot.borrow().size
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.size().aspect_ratio()
    }

    #[inline]
    pub fn layout(&self) -> TextureLayout {
        self.slot.borrow().layout
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.slot.borrow().layout.wgpu_format()
    }

    pub fn device(&self) -> GpuDevice {
        self.slot.borrow().device.clone()
    }

    /// Uploads texels laid out as the texture's `texel_type`, row by row from
    /// the top-left corner, without padding.
    ///
    /// Draws recorded earlier are submitted first, so they still see the old content.
    pub fn write_texels(&self, data: &[u8]) -> SketchResult<()> {
        let slot = self.slot.borrow();
        let expected = slot.size.pixel_count() * slot.layout.upload_texel_size();
        if data.len() != expected {
            return Err(SketchError::invalid(format!(
                "expected {expected} bytes of texel data for {}, got {}",
                slot.size,
                data.len()
            )));
        }

        let storage = encode_texels(slot.layout, data);
        let bytes_per_row = storage.len() as u32 / slot.size.height();

        slot.device.submit();
        slot.device.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &slot.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &storage,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(slot.size.height()),
            },
            slot.size.extent(),
        );
        Ok(())
    }

    /// Reads the texture back as straight RGBA8, top-left origin.
    pub fn read_rgba8(&self) -> SketchResult<Vec<u8>> {
        let (device, texture, size) = {
            let slot = self.slot.borrow();
            (slot.device.clone(), slot.texture.clone(), slot.size)
        };
        readback::read_rgba8(&device, &texture, size)
    }

    /// Writes the texture to a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> SketchResult<()> {
        let path = path.as_ref();
        let size = self.size();
        let pixels = self.read_rgba8()?;
        let image = image::RgbaImage::from_raw(size.width(), size.height(), pixels)
            .ok_or_else(|| SketchError::Export("pixel buffer does not match size".into()))?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| SketchError::Export(format!("{}: {e}", path.display())))?;
        log::info!("saved {} ({size})", path.display());
        Ok(())
    }

    pub fn downgrade(&self) -> WeakTexture {
        WeakTexture {
            slot: Rc::downgrade(&self.slot),
        }
    }

    /// Whether both handles refer to the same texture.
    pub fn ptr_eq(&self, other: &Texture) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }

    pub(crate) fn view(&self) -> wgpu::TextureView {
        self.slot.borrow().view.clone()
    }

    pub(crate) fn raw(&self) -> wgpu::Texture {
        self.slot.borrow().texture.clone()
    }

    /// Whether shapes may blend into this texture.
    pub(crate) fn is_blendable(&self) -> bool {
        format_flags(&self.device(), self.format())
            .contains(wgpu::TextureFormatFeatureFlags::BLENDABLE)
    }

    /// Whether this texture may be sampled with linear filtering.
    pub(crate) fn is_filterable(&self) -> bool {
        format_flags(&self.device(), self.format())
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
    }

    /// Swaps in new storage. Every handle observes the new size.
    pub(crate) fn replace_storage(&self, texture: wgpu::Texture, size: ImageSize) {
        let mut slot = self.slot.borrow_mut();
        slot.view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        slot.texture = texture;
        slot.size = size;
    }
}

impl WeakTexture {
    pub fn upgrade(&self) -> Option<Texture> {
        self.slot.upgrade().map(|slot| Texture { slot })
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("Texture")
            .field("size", &slot.size)
            .field("layout", &slot.layout)
            .finish()
    }
}

/// Usages every engine texture is created with, limited to what the format allows.
fn usages_for(device: &GpuDevice, format: wgpu::TextureFormat) -> wgpu::TextureUsages {
    let wanted = wgpu::TextureUsages::RENDER_ATTACHMENT
        | wgpu::TextureUsages::TEXTURE_BINDING
        | wgpu::TextureUsages::COPY_SRC
        | wgpu::TextureUsages::COPY_DST;
    wanted & format.guaranteed_format_features(device.device().features()).allowed_usages
}

fn format_flags(device: &GpuDevice, format: wgpu::TextureFormat) -> wgpu::TextureFormatFeatureFlags {
    format.guaranteed_format_features(device.device().features()).flags
}

/// Creates the wgpu storage for a texture of `size` and `layout`.
pub(crate) fn allocate(
    device: &GpuDevice,
    size: ImageSize,
    layout: TextureLayout,
    label: &str,
) -> SketchResult<wgpu::Texture> {
    let max = device.max_texture_dimension();
    if size.width() > max || size.height() > max {
        return Err(SketchError::ResourceAllocation(format!(
            "{size} exceeds the device texture limit of {max}"
        )));
    }

    let format = layout.wgpu_format();
    let usage = usages_for(device, format);

    device
        .validated(|d| {
            d.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: size.extent(),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        })
        .map_err(|msg| SketchError::ResourceAllocation(format!("{label} {size}: {msg}")))
}

/// Whether textures of `layout` can be used as a color attachment.
pub(crate) fn is_renderable(device: &GpuDevice, layout: TextureLayout) -> bool {
    usages_for(device, layout.wgpu_format()).contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
}

/// Converts uploaded texels to the byte layout of the storage format.
fn encode_texels(layout: TextureLayout, data: &[u8]) -> Vec<u8> {
    use InternalFormat::*;

    match (layout.internal_format(), layout.texel_type()) {
        (R8 | RG8 | RGBA8, _) => data.to_vec(),

        (R16 | RG16 | RGBA16, TexelType::U8) => data
            .iter()
            .flat_map(|&v| f16::from_f32(v as f32 / 255.0).to_le_bytes())
            .collect(),
        (R16 | RG16 | RGBA16, TexelType::U16) => data
            .chunks_exact(2)
            .flat_map(|b| {
                let v = u16::from_le_bytes([b[0], b[1]]);
                f16::from_f32(v as f32 / 65535.0).to_le_bytes()
            })
            .collect(),
        (R16 | RG16 | RGBA16, _) => data.to_vec(),

        (R32F | RG32F | RGBA32F, TexelType::F16) => data
            .chunks_exact(2)
            .flat_map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32().to_le_bytes())
            .collect(),
        (R32F | RG32F | RGBA32F, _) => data.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::layout::Channels;

    #[test]
    fn bytes_to_half_float_storage() {
        let out = encode_texels(TextureLayout::CANVAS, &[0, 255, 51, 255]);
        let halves: Vec<f32> = out
            .chunks_exact(2)
            .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect();
        assert_eq!(halves[0], 0.0);
        assert_eq!(halves[1], 1.0);
        assert!((halves[2] - 0.2).abs() < 1e-3);
    }

    #[test]
    fn u16_uploads_are_normalized() {
        let layout =
            TextureLayout::new(InternalFormat::R16, Channels::R, TexelType::U16).unwrap();
        let out = encode_texels(layout, &u16::MAX.to_le_bytes());
        assert_eq!(f16::from_le_bytes([out[0], out[1]]).to_f32(), 1.0);
    }

    #[test]
    fn half_uploads_widen_to_f32_storage() {
        let layout =
            TextureLayout::new(InternalFormat::R32F, Channels::R, TexelType::F16).unwrap();
        let out = encode_texels(layout, &f16::from_f32(0.5).to_le_bytes());
        assert_eq!(out, 0.5f32.to_le_bytes());
    }

    #[test]
    fn eight_bit_storage_is_copied() {
        assert_eq!(encode_texels(TextureLayout::RGBA8, &[1, 2, 3, 4]), vec![1, 2, 3, 4]);
    }
}
