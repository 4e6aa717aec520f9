use crate::coords::ImageSize;

/// How the sketch window is created.
#[derive(Debug, Clone)]
pub struct WindowCreationParams {
    pub title: String,
    /// Inner size in physical pixels.
    pub size: ImageSize,
    /// Borderless fullscreen on the current monitor.
    pub fullscreen: bool,
    /// Wait for the display refresh when presenting.
    pub vsync: bool,
    pub resizable: bool,
}

impl WindowCreationParams {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            size: ImageSize::clamped(width, height),
            ..Self::default()
        }
    }
}

impl Default for WindowCreationParams {
    fn default() -> Self {
        Self {
            title: "easel".to_string(),
            size: ImageSize::clamped(1280, 720),
            fullscreen: false,
            vsync: true,
            resizable: true,
        }
    }
}
