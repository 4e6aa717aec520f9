use thiserror::Error;

/// Failures raised by the engine.
///
/// Drawing calls never return these directly: they record the error, skip the
/// operation, and the runtime hands the error to [`Sketch::on_error`] once the
/// current callback returns.
///
/// [`Sketch::on_error`]: crate::core::Sketch::on_error
#[derive(Debug, Error)]
pub enum SketchError {
    /// The window or the GPU context could not be created.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// A built-in or user-supplied shader was rejected by the GPU layer.
    #[error("shader `{label}` failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    /// A texture or buffer could not be allocated.
    #[error("resource allocation failed: {0}")]
    ResourceAllocation(String),

    /// An argument was out of range (zero size, NaN geometry, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A render target cannot be rendered into with its current format.
    #[error("incomplete framebuffer: {0}")]
    IncompleteFramebuffer(String),

    /// Copying pixels back from the GPU failed.
    #[error("pixel readback failed: {0}")]
    Readback(String),

    /// Encoding or writing an exported image failed.
    #[error("image export failed: {0}")]
    Export(String),
}

impl SketchError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SketchError::InvalidArgument(msg.into())
    }
}

pub type SketchResult<T> = std::result::Result<T, SketchError>;
