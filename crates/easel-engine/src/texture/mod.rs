//! GPU textures: layouts, stable handles, readback and PNG export.

mod layout;
mod readback;
#[allow(clippy::module_inception)]
mod texture;

pub use layout::{Channels, InternalFormat, TexelType, TextureLayout};
pub use texture::{Texture, WeakTexture};

pub(crate) use texture::{allocate, is_renderable};
