//! GPU rendering subsystem.
//!
//! Every draw is recorded into the shared command encoder of the
//! [`GpuDevice`](crate::device::GpuDevice), one render pass per draw with
//! `LoadOp::Load`, so draws, clears and target resizes execute in call order.
//!
//! Convention:
//! - geometry is in sketch space (centered, +Y up, shorter axis in `[-1, 1]`).
//! - the quad vertex shader divides by the target's sketch extent to reach clip space.

mod present;
mod shader;
pub mod shapes;
mod target;

pub use shader::{Shader, SHADER_PARAM_COUNT};
pub use target::RenderTarget;

pub(crate) use present::PresentRenderer;
pub(crate) use target::{clear, draw_target};

use crate::coords::SketchSpace;

/// Where a draw lands: a view of the active target plus what the pipeline
/// needs to know about it.
pub(crate) struct DrawTarget {
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub blendable: bool,
    pub space: SketchSpace,
}
