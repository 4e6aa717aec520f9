//! Shared GPU types and utilities used by all shape renderers.

use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::device::GpuDevice;
use crate::error::{SketchError, SketchResult};
use crate::render::DrawTarget;

const SHAPE_COMMON_WGSL: &str = include_str!("../shaders/shape_common.wgsl");

/// Draws recorded per uniform buffer before a forced submit.
const UNIFORM_RING_SLOTS: u32 = 256;

// ── blend ─────────────────────────────────────────────────────────────────

/// Straight-alpha "over". Formats that cannot blend are overwritten instead.
fn blend_for(blendable: bool) -> Option<wgpu::BlendState> {
    blendable.then_some(wgpu::BlendState::ALPHA_BLENDING)
}

// ── shape uniform ─────────────────────────────────────────────────────────

/// Per-draw parameters, laid out as `ShapeUniform` in `shape_common.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ShapeUniform {
    pub fill_color: [f32; 4],
    pub stroke_color: [f32; 4],
    pub center: [f32; 2],
    /// Half-extents in sketch units.
    pub rect_size: [f32; 2],
    /// Sketch-space extent of the target along each axis.
    pub axis_extent: [f32; 2],
    pub rotation: f32,
    pub stroke_weight: f32,
}

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── uniform ring ──────────────────────────────────────────────────────────

/// Dynamic-offset uniform buffer holding one `ShapeUniform` per draw.
///
/// Slots are written with `Queue::write_buffer`, which lands at the next
/// submit. A slot is reused only after the draw reading it was submitted:
/// the ring rewinds when the device's submission epoch changes, and forces a
/// submit when it runs out of slots.
struct UniformRing {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u32,
    next: u32,
    epoch: u64,
}

impl UniformRing {
    fn new(device: &GpuDevice, layout: &wgpu::BindGroupLayout) -> Self {
        let size = std::mem::size_of::<ShapeUniform>() as u32;
        let align = device.device().limits().min_uniform_buffer_offset_alignment;
        let stride = size.div_ceil(align) * align;

        let buffer = device.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("easel shape uniform ring"),
            size: stride as u64 * UNIFORM_RING_SLOTS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel shape uniform bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size as u64),
                }),
            }],
        });

        Self {
            buffer,
            bind_group,
            stride,
            next: 0,
            epoch: device.submission_epoch(),
        }
    }

    /// Writes `uniform` into a free slot and returns its dynamic offset.
    fn push(&mut self, device: &GpuDevice, uniform: &ShapeUniform) -> u32 {
        if device.submission_epoch() != self.epoch {
            self.next = 0;
            self.epoch = device.submission_epoch();
        }
        if self.next == UNIFORM_RING_SLOTS {
            device.submit();
            self.next = 0;
            self.epoch = device.submission_epoch();
        }

        let offset = self.next * self.stride;
        device
            .queue()
            .write_buffer(&self.buffer, offset as u64, bytemuck::bytes_of(uniform));
        self.next += 1;
        offset
    }
}

// ── shape program ─────────────────────────────────────────────────────────

/// One fragment program over the shared quad, with one pipeline per target
/// format built on first use.
pub(crate) struct ShapeProgram {
    label: Cow<'static, str>,
    /// Layout of bind group 1, if the fragment stage reads one.
    extra_layout: Option<wgpu::BindGroupLayout>,

    module: wgpu::ShaderModule,
    pipelines: HashMap<(wgpu::TextureFormat, bool), wgpu::RenderPipeline>,
}

impl ShapeProgram {
    /// Compiles the shader module. Compile errors become `ShaderCompile`.
    pub(crate) fn new(
        device: &GpuDevice,
        label: impl Into<Cow<'static, str>>,
        fragment_src: &str,
        extra_layout: Option<wgpu::BindGroupLayout>,
    ) -> SketchResult<Self> {
        let label = label.into();
        let source = format!("{SHAPE_COMMON_WGSL}\n{fragment_src}");
        let module_label = format!("easel {label} shader");
        let module = device
            .validated(|d| {
                d.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&module_label),
                    source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
                })
            })
            .map_err(|message| SketchError::ShaderCompile {
                label: label.to_string(),
                message,
            })?;

        Ok(Self {
            label,
            extra_layout,
            module,
            pipelines: HashMap::new(),
        })
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    /// The pipeline for `format`, built the first time it is asked for.
    fn pipeline(
        &mut self,
        device: &GpuDevice,
        uniform_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        blendable: bool,
    ) -> SketchResult<&wgpu::RenderPipeline> {
        let slot = match self.pipelines.entry((format, blendable)) {
            Entry::Occupied(slot) => return Ok(slot.into_mut()),
            Entry::Vacant(slot) => slot,
        };

        let mut bind_group_layouts = vec![uniform_layout];
        if let Some(extra) = self.extra_layout.as_ref() {
            bind_group_layouts.push(extra);
        }

        let module = &self.module;
        let label = format!("easel {} pipeline ({format:?})", self.label);
        let pipeline = device
            .validated(|d| {
                let pipeline_layout = d.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(&label),
                    bind_group_layouts: &bind_group_layouts,
                    immediate_size: 0,
                });

                d.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(&label),
                    layout: Some(&pipeline_layout),

                    vertex: wgpu::VertexState {
                        module,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &[QuadVertex::layout()],
                    },

                    fragment: Some(wgpu::FragmentState {
                        module,
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format,
                            blend: blend_for(blendable),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),

                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },

                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                })
            })
            .map_err(|message| SketchError::ShaderCompile {
                label: self.label.to_string(),
                message,
            })?;

        log::debug!("built {label}");
        Ok(slot.insert(pipeline))
    }
}

// ── shape renderer ────────────────────────────────────────────────────────

/// Resources shared by every shape draw: the unit quad, the uniform bind
/// group layout and the uniform ring.
pub(crate) struct ShapeRenderer {
    uniform_layout: wgpu::BindGroupLayout,
    ring: UniformRing,

    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,
}

impl ShapeRenderer {
    pub(crate) fn new(device: &GpuDevice) -> Self {
        let d = device.device();

        let uniform_layout = d.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("easel shape uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ShapeUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let ring = UniformRing::new(device, &uniform_layout);

        let quad_vbo = d.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("easel quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_ibo = d.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("easel quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            uniform_layout,
            ring,
            quad_vbo,
            quad_ibo,
        }
    }

    /// Records one quad draw of `program` into `target`.
    ///
    /// `extra` is bound at group 1 and must match the program's extra layout.
    pub(crate) fn draw(
        &mut self,
        device: &GpuDevice,
        program: &mut ShapeProgram,
        target: &DrawTarget,
        uniform: &ShapeUniform,
        extra: Option<&wgpu::BindGroup>,
    ) -> SketchResult<()> {
        let pipeline =
            program.pipeline(device, &self.uniform_layout, target.format, target.blendable)?;
        let offset = self.ring.push(device, uniform);

        let bind_group = &self.ring.bind_group;
        let quad_vbo = &self.quad_vbo;
        let quad_ibo = &self.quad_ibo;

        device.record(|encoder| {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("easel shape pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, bind_group, &[offset]);
            if let Some(extra) = extra {
                rpass.set_bind_group(1, extra, &[]);
            }
            rpass.set_vertex_buffer(0, quad_vbo.slice(..));
            rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_uniform_matches_wgsl_layout() {
        // vec4 + vec4 + vec2 * 3 + f32 * 2, no trailing padding.
        assert_eq!(std::mem::size_of::<ShapeUniform>(), 64);
    }

    #[test]
    fn quad_indices_cover_two_triangles() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }

    #[test]
    fn non_blendable_targets_overwrite() {
        assert!(blend_for(false).is_none());
        assert_eq!(blend_for(true), Some(wgpu::BlendState::ALPHA_BLENDING));
    }
}
