//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the GPU layer and
//! the sketch [`Context`](crate::core::Context).

mod params;
mod runtime;

pub use params::WindowCreationParams;
pub use runtime::run;
