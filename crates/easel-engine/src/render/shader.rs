use std::cell::RefCell;

use crate::coords::ImageSize;
use crate::core::Context;
use crate::device::GpuDevice;
use crate::error::{SketchError, SketchResult};
use crate::texture::{Texture, TextureLayout};

use super::shapes::{ShapeProgram, ShapeRenderer, ShapeUniform};
use super::DrawTarget;

const USER_PRELUDE_WGSL: &str = include_str!("shaders/user_prelude.wgsl");

/// Number of `vec4` parameters a user shader can read.
pub const SHADER_PARAM_COUNT: usize = 8;

/// A user fragment shader drawn over a rectangle.
///
/// The source must define `fn fragment(in: FragmentInput) -> vec4<f32>`. It can
/// read the shape uniforms through `shape`, its parameters through
/// `param(i)`, and the bound texture through `sample_user_texture(uv)`:
///
/// ```wgsl
/// fn fragment(in: FragmentInput) -> vec4<f32> {
///     let t = param(0).x;
///     return vec4<f32>(in._uv, 0.5 + 0.5 * sin(t), 1.0);
/// }
/// ```
pub struct Shader {
    inner: RefCell<ShaderState>,
}

struct ShaderState {
    device: GpuDevice,
    program: ShapeProgram,
    /// Group 1 layout: params, texture and sampler.
    layout: wgpu::BindGroupLayout,
    params: [[f32; 4]; SHADER_PARAM_COUNT],
    params_ubo: wgpu::Buffer,
    sampler: wgpu::Sampler,
    texture: Texture,
    /// Params changed since the last upload.
    dirty: bool,
    /// Submission epoch of the last draw that read `params_ubo`.
    last_draw_epoch: Option<u64>,
}

impl Shader {
    /// Compiles `fragment_src`. Errors in the source are reported as `ShaderCompile`.
    pub fn new(ctx: &Context, fragment_src: &str) -> SketchResult<Self> {
        Self::with_device(ctx.gpu(), fragment_src)
    }

    pub fn with_device(device: &GpuDevice, fragment_src: &str) -> SketchResult<Self> {
        let d = device.device();
        let layout = d.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("easel user shader bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(params_size()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let source = format!("{USER_PRELUDE_WGSL}\n{fragment_src}");
        let program = ShapeProgram::new(device, "user shader", &source, Some(layout.clone()))?;

        let params_ubo = d.create_buffer(&wgpu::BufferDescriptor {
            label: Some("easel user shader params"),
            size: params_size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = d.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("easel user shader sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Zeroed 1x1 texture until the sketch binds one.
        let texture = Texture::new(device, ImageSize::clamped(1, 1), TextureLayout::RGBA8)?;

        log::debug!("compiled user shader ({} bytes)", fragment_src.len());

        Ok(Self {
            inner: RefCell::new(ShaderState {
                device: device.clone(),
                program,
                layout,
                params: [[0.0; 4]; SHADER_PARAM_COUNT],
                params_ubo,
                sampler,
                texture,
                dirty: true,
                last_draw_epoch: None,
            }),
        })
    }

    /// Sets `param(index)`. Indices past the last parameter are rejected.
    pub fn set_param(&self, index: usize, value: impl Into<[f32; 4]>) -> SketchResult<()> {
        if index >= SHADER_PARAM_COUNT {
            return Err(SketchError::invalid(format!(
                "shader param index {index} out of range (0..{SHADER_PARAM_COUNT})"
            )));
        }
        let mut state = self.inner.borrow_mut();
        state.params[index] = value.into();
        state.dirty = true;
        Ok(())
    }

    /// Convenience for a scalar parameter, stored in `param(index).x`.
    pub fn set_param_f32(&self, index: usize, value: f32) -> SketchResult<()> {
        self.set_param(index, [value, 0.0, 0.0, 0.0])
    }

    pub fn param(&self, index: usize) -> Option<[f32; 4]> {
        self.inner.borrow().params.get(index).copied()
    }

    /// Binds the texture read by `sample_user_texture`.
    ///
    /// The texture must support linear filtering (8-bit and 16-bit layouts do).
    pub fn set_texture(&self, texture: &Texture) -> SketchResult<()> {
        if !texture.is_filterable() {
            return Err(SketchError::invalid(format!(
                "{:?} textures cannot be sampled by user shaders",
                texture.format()
            )));
        }
        self.inner.borrow_mut().texture = texture.clone();
        Ok(())
    }

    /// Whether `texture` is the texture bound to this shader.
    pub(crate) fn samples(&self, texture: &Texture) -> bool {
        self.inner.borrow().texture.ptr_eq(texture)
    }

    pub(crate) fn draw(
        &self,
        shapes: &mut ShapeRenderer,
        target: &DrawTarget,
        uniform: &ShapeUniform,
    ) -> SketchResult<()> {
        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        let device = state.device.clone();

        if state.dirty {
            // A pending draw still reads the old values: flush it first.
            if state.last_draw_epoch == Some(device.submission_epoch()) {
                device.submit();
            }
            device
                .queue()
                .write_buffer(&state.params_ubo, 0, bytemuck::cast_slice(&state.params));
            state.dirty = false;
        }

        let view = state.texture.view();
        let bind_group = device.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel user shader bind group"),
            layout: &state.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: state.params_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&state.sampler),
                },
            ],
        });

        shapes.draw(&device, &mut state.program, target, uniform, Some(&bind_group))?;
        state.last_draw_epoch = Some(device.submission_epoch());
        Ok(())
    }
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("label", &self.inner.borrow().program.label())
            .finish_non_exhaustive()
    }
}

fn params_size() -> u64 {
    (std::mem::size_of::<[f32; 4]>() * SHADER_PARAM_COUNT) as u64
}
