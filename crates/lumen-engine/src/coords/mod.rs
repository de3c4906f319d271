//! Coordinate and geometry types shared by the compositor and scenes.
//!
//! Canonical spaces:
//! - Placement corners live in normalized device coordinates
//!   (x right, y up, both in `[-1, 1]` for the visible surface).
//! - Viewport sizes are physical pixels of the primary surface.

mod placement;
mod vec2;
mod viewport;

pub use placement::Placement;
pub use vec2::Vec2;
pub use viewport::Viewport;
