//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, wires it to the GPU
//! layer, and calls the application once per tick.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
