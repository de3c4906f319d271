//! Engine error taxonomy.
//!
//! Startup and configuration failures (shader programs, unknown effects,
//! render targets) are fatal and surface before the first frame. Texture load
//! failures are recoverable: they are logged and the resource keeps its
//! placeholder.

use std::fmt;

/// Shader stage of a program, used in compile diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// A texture fetch or decode failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to load texture `{url}`: {cause}")]
pub struct TextureLoadError {
    pub url: String,
    pub cause: String,
}

impl TextureLoadError {
    pub fn new(url: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            url: url.into(),
            cause: cause.to_string(),
        }
    }
}

/// Errors produced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{stage} stage of shader program `{program}` failed to compile:\n{log}")]
    ShaderCompile {
        program: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("shader program `{program}` failed to link: {log}")]
    ShaderLink { program: String, log: String },

    #[error("unknown effect `{name}`")]
    UnknownEffect { name: String },

    #[error("effect `{name}` is already registered")]
    DuplicateEffect { name: String },

    #[error("unknown texture {id}")]
    UnknownTexture { id: u32 },

    #[error(transparent)]
    TextureLoad(#[from] TextureLoadError),

    #[error("render target is incomplete: {reason}")]
    IncompleteTarget { reason: String },

    #[error("texture readback failed: {0}")]
    Readback(String),

    #[error("GPU device unavailable: {0}")]
    Device(String),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
