//! GPU device layer: the shared device handle, window surface and init options.

mod gpu;
mod handle;
mod init;

pub use gpu::{Gpu, GpuFrame, SurfaceErrorAction};
pub use handle::GpuDevice;
pub use init::GpuInit;
