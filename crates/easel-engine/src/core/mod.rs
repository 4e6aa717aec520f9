//! Core sketch-facing contracts.
//!
//! [`Sketch`] is what user code implements; [`Context`] is what it receives.
//! The same `Context` drives both the windowed runtime and headless use.

mod context;
mod frame;
mod sketch;

pub use context::{Context, DEFAULT_FILL, DEFAULT_STROKE, DEFAULT_STROKE_WEIGHT};
pub use frame::DEFAULT_FRAMERATE;
pub use sketch::Sketch;

pub(crate) use context::WindowCommand;
