use crate::device::GpuDevice;
use crate::error::SketchResult;

use super::common::ShapeProgram;

/// Ellipse inscribed in the rectangle described by its `RectangleParams`.
///
/// The stroke is measured inward from the outline, like the rectangle's.
pub(crate) fn ellipse_program(device: &GpuDevice) -> SketchResult<ShapeProgram> {
    ShapeProgram::new(device, "ellipse", include_str!("../shaders/ellipse.wgsl"), None)
}
