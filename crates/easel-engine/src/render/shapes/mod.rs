//! Shape renderers.
//!
//! Every shape is the shared unit quad placed by a [`RectangleParams`] and
//! shaded by its own fragment program.

mod common;
mod ellipse;
mod image;
mod rect;

pub use rect::{Anchor, RectangleParams};

pub(crate) use common::{ShapeProgram, ShapeRenderer, ShapeUniform};
pub(crate) use ellipse::ellipse_program;
pub(crate) use image::ImageRenderer;
pub(crate) use rect::rect_program;
