use crate::device::GpuDevice;
use crate::error::SketchResult;
use crate::render::DrawTarget;
use crate::texture::Texture;

use super::common::{ShapeProgram, ShapeRenderer, ShapeUniform};

/// Draws a texture stretched over a rectangle.
///
/// Float32 textures cannot be filtered without an optional feature, so there
/// is one variant with a linear sampler and one with a nearest sampler.
#[derive(Default)]
pub(crate) struct ImageRenderer {
    filtered: Option<ImageVariant>,
    unfiltered: Option<ImageVariant>,
}

struct ImageVariant {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    program: ShapeProgram,
}

impl ImageVariant {
    fn new(device: &GpuDevice, filterable: bool) -> SketchResult<Self> {
        let d = device.device();
        let layout = d.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("easel image bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(if filterable {
                        wgpu::SamplerBindingType::Filtering
                    } else {
                        wgpu::SamplerBindingType::NonFiltering
                    }),
                    count: None,
                },
            ],
        });

        let filter = if filterable {
            wgpu::FilterMode::Linear
        } else {
            wgpu::FilterMode::Nearest
        };
        let sampler = d.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("easel image sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });

        let program = ShapeProgram::new(
            device,
            if filterable { "image" } else { "image (nearest)" },
            include_str!("../shaders/image.wgsl"),
            Some(layout.clone()),
        )?;

        Ok(Self {
            layout,
            sampler,
            program,
        })
    }
}

impl ImageRenderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a draw of `texture` into `target`. The caller guarantees
    /// `texture` is not the target itself.
    pub(crate) fn draw(
        &mut self,
        device: &GpuDevice,
        shapes: &mut ShapeRenderer,
        target: &DrawTarget,
        uniform: &ShapeUniform,
        texture: &Texture,
    ) -> SketchResult<()> {
        let filterable = texture.is_filterable();
        let slot = if filterable {
            &mut self.filtered
        } else {
            &mut self.unfiltered
        };
        let variant = match slot.take() {
            Some(variant) => variant,
            None => ImageVariant::new(device, filterable)?,
        };
        let variant = slot.insert(variant);

        let view = texture.view();
        let bind_group = device.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel image bind group"),
            layout: &variant.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&variant.sampler),
                },
            ],
        });

        shapes.draw(device, &mut variant.program, target, uniform, Some(&bind_group))
    }
}
