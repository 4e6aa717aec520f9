//! Paint model: straight-alpha colors.

pub mod color;

pub use color::Color;
