use crate::coords::Vec2;

use super::shaders;

/// Built-in post-processing effects.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EffectKind {
    /// Averages channels with equal 0.5 weights; alpha is kept.
    Grayscale,
    /// `1 - rgb`, output fully opaque.
    Invert,
    /// 9-tap Gaussian along `direction` (scaled by the source resolution).
    DirectionalBlur { direction: Vec2 },
}

impl EffectKind {
    /// Vertical blur, matching the `directional-blur` name lookup.
    pub const DEFAULT_BLUR_DIRECTION: Vec2 = Vec2::new(0.0, 0.5);

    pub const ALL: [EffectKind; 3] = [
        EffectKind::Grayscale,
        EffectKind::Invert,
        EffectKind::DirectionalBlur {
            direction: Self::DEFAULT_BLUR_DIRECTION,
        },
    ];

    /// Resolves a canonical name or alias.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "grayscale" | "greyscale" => Some(EffectKind::Grayscale),
            "invert" => Some(EffectKind::Invert),
            "directional-blur" | "blur-pass" => Some(EffectKind::DirectionalBlur {
                direction: Self::DEFAULT_BLUR_DIRECTION,
            }),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Grayscale => "grayscale",
            EffectKind::Invert => "invert",
            EffectKind::DirectionalBlur { .. } => "directional-blur",
        }
    }

    pub(crate) fn aliases(&self) -> &'static [&'static str] {
        match self {
            EffectKind::Grayscale => &["greyscale"],
            EffectKind::Invert => &[],
            EffectKind::DirectionalBlur { .. } => &["blur-pass"],
        }
    }

    /// Value of the `direction` uniform; zero for effects that ignore it.
    pub fn direction(&self) -> Vec2 {
        match self {
            EffectKind::DirectionalBlur { direction } => *direction,
            _ => Vec2::zero(),
        }
    }

    pub(crate) fn fragment_source(&self) -> &'static str {
        match self {
            EffectKind::Grayscale => shaders::GRAYSCALE,
            EffectKind::Invert => shaders::INVERT,
            EffectKind::DirectionalBlur { .. } => shaders::DIRECTIONAL_BLUR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_kinds() {
        assert_eq!(EffectKind::from_name("greyscale"), Some(EffectKind::Grayscale));
        assert_eq!(
            EffectKind::from_name("blur-pass").map(|k| k.name()),
            Some("directional-blur")
        );
        assert_eq!(EffectKind::from_name("sepia"), None);
    }

    #[test]
    fn names_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn blur_defaults_to_vertical() {
        let blur = EffectKind::from_name("directional-blur").unwrap();
        assert_eq!(blur.direction(), Vec2::new(0.0, 0.5));
        assert_eq!(EffectKind::Invert.direction(), Vec2::zero());
    }
}
