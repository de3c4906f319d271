//! Lumen engine crate.
//!
//! Multi-pass textured-quad compositor on wgpu. A [`Scene`] of textured
//! rectangles is drawn onto a surface; each item's texture can first be
//! routed through a linear chain of shader effects using two alternating
//! off-screen targets.
//!
//! Layers, leaf to root: `texture` (async-loaded GPU images), `program`
//! (WGSL programs + effect registry), `target` (ping-pong pair), `render`
//! (chain executor + compositor), and [`Renderer`], which owns all of it.
//! `device`, `window` and `core` provide the windowed and headless hosts.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod error;

pub mod texture;
pub mod program;
pub mod target;
pub mod render;
pub mod scene;
pub mod readback;

mod renderer;

pub use error::{EngineError, Result};
pub use renderer::{Renderer, RendererConfig};
pub use scene::{DrawItem, Scene};
