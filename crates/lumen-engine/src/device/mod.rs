//! GPU device + surface management.
//!
//! - windowed: `Gpu` owns Instance/Adapter/Device/Queue plus the window
//!   Surface, and hands out one `GpuFrame` per tick
//! - headless: `HeadlessGpu` + `OffscreenSurface` for tests and PNG export

mod gpu;
mod headless;
mod init;
mod surface;

pub use gpu::{Gpu, GpuFrame};
pub use headless::{HeadlessGpu, OffscreenSurface};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
