//! Easel engine crate.
//!
//! A small creative-coding runtime: one window, a frame loop driven by a
//! realtime or fixed-step clock, input callbacks in a centered sketch space,
//! and a GPU drawing layer (rectangles, ellipses, images, user fragment
//! shaders, offscreen canvases).
//!
//! A program implements [`Sketch`] and hands it to [`window::run`]:
//!
//! ```no_run
//! use easel_engine::{Color, Context, RectangleParams, Sketch, WindowCreationParams};
//!
//! struct Demo;
//!
//! impl Sketch for Demo {
//!     fn update(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
//!         ctx.background(Color::rgb(0.1, 0.1, 0.1));
//!         ctx.fill = Color::rgb(1.0, 0.3, 0.2);
//!         ctx.rectangle(RectangleParams::square(ctx.mouse(), 0.3));
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     easel_engine::window::run(WindowCreationParams::new("demo", 800, 600), Demo)
//! }
//! ```

pub mod canvas;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod texture;
pub mod time;
pub mod window;

pub use canvas::Canvas;
pub use coords::{ImageSize, SketchSpace, Vec2};
pub use core::{Context, Sketch};
pub use error::{SketchError, SketchResult};
pub use paint::Color;
pub use render::shapes::{Anchor, RectangleParams};
pub use render::{RenderTarget, Shader};
pub use texture::{Texture, TextureLayout};
pub use window::{run, WindowCreationParams};
