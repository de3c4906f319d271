use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use lumen_engine::coords::{Placement, Vec2};
use lumen_engine::paint::Color;
use lumen_engine::texture::Origin;
use serde::Deserialize;

const DEMO_BASE: &str = "https://webglfundamentals.org/webgl/resources";

/// Scene file: window, clear color, textures, custom effects, and items.
///
/// Every section is optional; missing ones take the demo scene's values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    pub window: WindowConfig,
    /// Straight RGBA, 0..1.
    pub clear_color: [f32; 4],
    /// Origin of the "page" the textures are loaded for.
    pub page_origin: Option<String>,
    pub schedule: ScheduleConfig,
    pub textures: Vec<TextureConfig>,
    pub effects: Vec<EffectConfig>,
    pub items: Vec<ItemConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "lumen".into(),
            width: 600,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Delay before the first frame.
    pub initial_delay_ms: u64,
    /// Render every tick after the delay instead of once.
    pub repeat: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 2000,
            repeat: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextureConfig {
    pub name: String,
    /// `http(s)://` URL, `file://` URL, or a path relative to the scene file.
    pub url: String,
}

/// A data-driven effect: fragment WGSL, inline or from a file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectConfig {
    pub name: String,
    #[serde(default)]
    pub fragment: Option<String>,
    #[serde(default)]
    pub fragment_path: Option<PathBuf>,
    #[serde(default)]
    pub direction: [f32; 2],
}

impl EffectConfig {
    pub fn direction(&self) -> Vec2 {
        Vec2::from(self.direction)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemConfig {
    pub texture: String,
    /// NDC corner receiving the first image row's first pixel.
    pub from: [f32; 2],
    pub to: [f32; 2],
    #[serde(default)]
    pub effects: Vec<String>,
}

impl ItemConfig {
    pub fn placement(&self) -> Placement {
        Placement::new(Vec2::from(self.from), Vec2::from(self.to))
    }
}

impl Default for StudioConfig {
    /// Three remote images, one item per built-in effect plus a plain one.
    fn default() -> Self {
        let texture = |name: &str, file: &str| TextureConfig {
            name: name.into(),
            url: format!("{DEMO_BASE}/{file}"),
        };
        let item = |texture: &str, from: [f32; 2], to: [f32; 2], effects: &[&str]| ItemConfig {
            texture: texture.into(),
            from,
            to,
            effects: effects.iter().map(|e| (*e).to_owned()).collect(),
        };

        Self {
            window: WindowConfig::default(),
            clear_color: Color::CYAN.to_array(),
            page_origin: None,
            schedule: ScheduleConfig::default(),
            textures: vec![
                texture("star", "star.jpg"),
                texture("leaves", "leaves.jpg"),
                texture("keyboard", "keyboard.jpg"),
            ],
            effects: Vec::new(),
            items: vec![
                item("leaves", [-1.0, 1.0], [0.0, 0.0], &["grayscale"]),
                item("star", [1.0, 0.0], [0.0, 1.0], &["invert"]),
                item("star", [-1.0, -1.0], [0.0, 0.0], &["directional-blur"]),
                item("keyboard", [0.0, 0.0], [1.0, -1.0], &[]),
            ],
        }
    }
}

impl StudioConfig {
    /// Reads, resolves relative paths against the file's directory, and
    /// validates.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene file {}", path.display()))?;
        let mut config = Self::parse(&text)
            .with_context(|| format!("invalid scene file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base)?;
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn clear_color(&self) -> Color {
        Color::from(self.clear_color)
    }

    pub fn page_origin(&self) -> Result<Option<Origin>> {
        self.page_origin
            .as_deref()
            .map(|s| Origin::parse(s).with_context(|| format!("page_origin `{s}` is not an http(s) origin")))
            .transpose()
    }

    fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            bail!("window size must be non-zero, got {}x{}", self.window.width, self.window.height);
        }
        if !self.clear_color().is_finite() {
            bail!("clear_color must be finite");
        }
        self.page_origin()?;

        let mut names = HashSet::new();
        for t in &self.textures {
            if !names.insert(t.name.as_str()) {
                bail!("texture `{}` is defined twice", t.name);
            }
        }

        for e in &self.effects {
            match (&e.fragment, &e.fragment_path) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => bail!("effect `{}` needs exactly one of `fragment` or `fragment_path`", e.name),
            }
        }

        for (n, item) in self.items.iter().enumerate() {
            if !names.contains(item.texture.as_str()) {
                bail!("item {n} references unknown texture `{}`", item.texture);
            }
            if !item.placement().is_finite() {
                bail!("item {n} has a non-finite placement");
            }
        }
        Ok(())
    }

    /// Loads `fragment_path` sources and anchors relative texture paths.
    fn resolve_paths(&mut self, base: &Path) -> Result<()> {
        for e in &mut self.effects {
            if let Some(rel) = e.fragment_path.take() {
                let path = base.join(rel);
                let source = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read effect `{}` from {}", e.name, path.display()))?;
                e.fragment = Some(source);
            }
        }

        for t in &mut self.textures {
            if !t.url.contains("://") && Path::new(&t.url).is_relative() {
                t.url = base.join(&t.url).to_string_lossy().into_owned();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_demo_scene() {
        let config = StudioConfig::default();
        config.validate().unwrap();

        assert_eq!((config.window.width, config.window.height), (600, 600));
        assert_eq!(config.schedule.initial_delay_ms, 2000);
        assert!(!config.schedule.repeat);
        assert_eq!(config.clear_color, [0.0, 1.0, 1.0, 1.0]);

        let effects: Vec<_> = config.items.iter().map(|i| i.effects.join(",")).collect();
        assert_eq!(effects, ["grayscale", "invert", "directional-blur", ""]);
        assert!(config.textures[0].url.ends_with("/star.jpg"));
    }

    #[test]
    fn empty_file_takes_defaults() {
        assert_eq!(StudioConfig::parse("").unwrap(), StudioConfig::default());
    }

    #[test]
    fn parses_full_scene() {
        let config = StudioConfig::parse(
            r#"
clear_color = [0.0, 0.0, 0.0, 1.0]
page_origin = "https://example.com"

[window]
title = "test"
width = 320
height = 200

[schedule]
initial_delay_ms = 0
repeat = true

[[textures]]
name = "a"
url = "a.png"

[[effects]]
name = "tint"
fragment = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }"
direction = [1.0, 0.0]

[[items]]
texture = "a"
from = [-1.0, 1.0]
to = [1.0, -1.0]
effects = ["tint", "invert"]
"#,
        )
        .unwrap();

        assert_eq!(config.window.title, "test");
        assert!(config.schedule.repeat);
        assert_eq!(config.page_origin().unwrap().unwrap().host(), "example.com");
        assert_eq!(config.effects[0].direction(), Vec2::new(1.0, 0.0));
        assert_eq!(config.items[0].placement(), Placement::FULL_SCREEN);
    }

    #[test]
    fn rejects_unknown_texture_reference() {
        let err = StudioConfig::parse(
            r#"
[[items]]
texture = "missing"
from = [0.0, 0.0]
to = [1.0, 1.0]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing"), "{err:#}");
    }

    #[test]
    fn rejects_bad_origin_and_zero_window() {
        assert!(StudioConfig::parse(r#"page_origin = "not a url""#).is_err());
        assert!(StudioConfig::parse("[window]\nwidth = 0").is_err());
    }

    #[test]
    fn effect_needs_one_fragment_source() {
        let err = StudioConfig::parse("[[effects]]\nname = \"x\"").unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn relative_paths_anchor_to_scene_dir() {
        let mut config = StudioConfig::parse(
            r#"
[[textures]]
name = "local"
url = "images/a.png"

[[textures]]
name = "remote"
url = "https://example.com/b.png"
"#,
        )
        .unwrap();
        config.resolve_paths(Path::new("/scenes")).unwrap();

        assert_eq!(
            Path::new(&config.textures[0].url),
            Path::new("/scenes/images/a.png")
        );
        assert_eq!(config.textures[1].url, "https://example.com/b.png");
    }
}
