use crate::coords::Placement;
use crate::error::Result;
use crate::program::ProgramRegistry;
use crate::texture::TextureId;

use super::item::{DrawItem, Scene};

/// Builds a [`Scene`] from effect names, resolving them up front.
///
/// Unknown names fail here so they can never fail mid-frame.
pub struct SceneBuilder<'r> {
    registry: &'r ProgramRegistry,
    scene: Scene,
}

impl<'r> SceneBuilder<'r> {
    pub fn new(registry: &'r ProgramRegistry) -> Self {
        Self {
            registry,
            scene: Scene::new(),
        }
    }

    /// Appends an item whose effects run in the order named.
    pub fn item<S: AsRef<str>>(
        &mut self,
        texture: TextureId,
        placement: Placement,
        effects: &[S],
    ) -> Result<&mut Self> {
        let effects = effects
            .iter()
            .map(|name| self.registry.lookup(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        self.scene
            .push(DrawItem::new(texture, placement).with_effects(effects));
        Ok(self)
    }

    pub fn push(&mut self, item: DrawItem) -> &mut Self {
        self.scene.push(item);
        self
    }

    pub fn build(self) -> Scene {
        self.scene
    }
}
