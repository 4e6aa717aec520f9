//! Coordinate and geometry types.
//!
//! Two spaces exist:
//! - window pixels: origin top-left, +X right, +Y down (what the OS reports)
//! - sketch space: origin at the center of the active target, +Y up, shorter
//!   axis spanning `[-1, +1]` (what user code sees)
//!
//! [`SketchSpace`] converts between them; the rectangle vertex shader applies
//! the same projection on the GPU.

mod image_size;
mod sketch_space;
mod vec2;

pub use image_size::ImageSize;
pub use sketch_space::SketchSpace;
pub use vec2::Vec2;
