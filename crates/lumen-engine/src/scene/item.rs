use crate::coords::Placement;
use crate::program::EffectId;
use crate::texture::TextureId;

/// One textured rectangle and the effects applied to its texture.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    texture: TextureId,
    placement: Placement,
    effects: Vec<EffectId>,
}

impl DrawItem {
    pub fn new(texture: TextureId, placement: Placement) -> Self {
        Self {
            texture,
            placement,
            effects: Vec::new(),
        }
    }

    /// Appends effects, run in iteration order.
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = EffectId>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn with_effect(mut self, effect: EffectId) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn effects(&self) -> &[EffectId] {
        &self.effects
    }
}

/// Ordered draw items. Insertion order is paint order: later items
/// overwrite earlier ones where they overlap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    items: Vec<DrawItem>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DrawItem) {
        self.items.push(item);
    }

    pub fn with(mut self, item: DrawItem) -> Self {
        self.push(item);
        self
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Effect passes a frame of this scene runs if every item draws.
    pub fn effect_pass_count(&self) -> usize {
        self.items.iter().map(|i| i.effects.len()).sum()
    }
}

impl FromIterator<DrawItem> for Scene {
    fn from_iter<I: IntoIterator<Item = DrawItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    #[test]
    fn preserves_insertion_order_and_counts_passes() {
        let blur = EffectId::new(0, 2, Vec2::new(0.0, 0.5));
        let scene = Scene::new()
            .with(DrawItem::new(TextureId::from_raw(1), Placement::FULL_SCREEN).with_effect(blur))
            .with(DrawItem::new(TextureId::from_raw(0), Placement::UNIT))
            .with(
                DrawItem::new(TextureId::from_raw(2), Placement::UNIT)
                    .with_effects([blur, blur.with_direction(Vec2::new(0.5, 0.0))]),
            );

        let order: Vec<u32> = scene.items().iter().map(|i| i.texture().raw()).collect();
        assert_eq!(order, [1, 0, 2]);
        assert_eq!(scene.effect_pass_count(), 3);
        assert_eq!(scene.items()[2].effects()[1].direction(), Vec2::new(0.5, 0.0));
    }
}
