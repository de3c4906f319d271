//! GPU rendering subsystem.
//!
//! Every draw in the engine is a textured quad drawn with one of the compiled
//! programs. Effect passes draw a full-screen quad into an off-screen target;
//! the compositor draws each item's final texture at its placement on the
//! primary surface.
//!
//! Convention:
//! - Geometry is given directly in NDC (x right, y up), no transform.
//! - Texture coordinate `(0, 0)` is the first row of image data.

mod chain;
mod compositor;
mod ctx;
pub(crate) mod params;
pub(crate) mod quad;

pub use chain::{plan_chain, PassPlan, TextureRef};
pub use compositor::FrameReport;
pub use ctx::{RenderCtx, RenderTarget};
pub use params::EffectParams;
pub use quad::QuadLayouts;

pub(crate) use compositor::{Compositor, FrameInputs};

/// Entry point every vertex module must export.
pub(crate) const VERTEX_ENTRY: &str = "vs_main";
/// Entry point every fragment module must export.
pub(crate) const FRAGMENT_ENTRY: &str = "fs_main";
