//! Texture resources and asynchronous image loading.
//!
//! `TextureStore::load` hands out a [`TextureId`] at once, backed by a 1x1
//! opaque-blue placeholder. The fetch runs on a tokio blocking thread; the
//! render thread picks up the result with `TextureStore::poll` and swaps the
//! GPU texture behind the same id.

mod loader;
mod origin;
mod source;
mod store;

pub use loader::{LoadOutcome, TextureLoader};
pub use origin::{is_cross_origin, Origin};
pub use source::{FetchRequest, ImageData, NetworkSource, TextureSource, PLACEHOLDER_RGBA};
pub use store::{TextureId, TextureResource, TextureState, TextureStore};
