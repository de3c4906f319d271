//! Scene description: textured rectangles in paint order.
//!
//! A [`Scene`] is a plain value handed to `Renderer::render_frame`; nothing
//! about it is global and it can be rendered any number of times.

mod builder;
mod item;

pub use builder::SceneBuilder;
pub use item::{DrawItem, Scene};
