//! Color model shared by the compositor, texture store, and applications.
//!
//! Blending is disabled throughout the pipeline, so colors are plain straight
//! RGBA; there is no premultiplication step.

pub mod color;

pub use color::Color;
