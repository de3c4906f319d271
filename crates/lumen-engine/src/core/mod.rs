//! Core engine-facing contracts.
//!
//! Defines the interface between the windowed runtime and the application
//! that owns the render tick, plus the per-tick context handed to it.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
