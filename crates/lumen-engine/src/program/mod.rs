//! Shader programs and the effect registry.
//!
//! Every program pairs the shared quad vertex stage with a fragment stage.
//! Sources are WGSL; both stages are parsed and validated by naga, linked
//! against the quad geometry and pipeline layout, then turned into a render
//! pipeline.

mod effect;
mod interface;
mod registry;
mod shader;
pub mod shaders;

pub use effect::EffectKind;
pub use interface::{ShaderInterface, UniformSlot};
pub use registry::{EffectId, ProgramRegistry};
pub use shader::ShaderProgram;
