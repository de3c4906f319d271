//! Built-in WGSL sources.

/// Shared vertex stage of every program.
pub const QUAD_VERTEX: &str = include_str!("shaders/quad.vert.wgsl");

pub const PASSTHROUGH: &str = include_str!("shaders/passthrough.frag.wgsl");
pub const GRAYSCALE: &str = include_str!("shaders/grayscale.frag.wgsl");
pub const INVERT: &str = include_str!("shaders/invert.frag.wgsl");
pub const DIRECTIONAL_BLUR: &str = include_str!("shaders/directional_blur.frag.wgsl");
