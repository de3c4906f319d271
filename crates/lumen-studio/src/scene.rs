use std::collections::HashMap;

use anyhow::{Context, Result};
use lumen_engine::render::RenderCtx;
use lumen_engine::texture::TextureId;
use lumen_engine::{Renderer, RendererConfig, Scene};

use crate::config::StudioConfig;

/// A renderer with the configured textures requested and effects compiled,
/// plus the scene that draws them.
pub struct LoadedScene {
    pub renderer: Renderer,
    pub scene: Scene,
}

impl LoadedScene {
    /// Registers custom effects, starts every texture load, and resolves the
    /// items. Textures show the placeholder until their loads finish.
    pub fn build(ctx: &RenderCtx<'_>, config: &StudioConfig, runtime: tokio::runtime::Handle) -> Result<Self> {
        let renderer_config = RendererConfig {
            clear_color: config.clear_color(),
            page_origin: config.page_origin()?,
        };
        let mut renderer = Renderer::with_network_source(ctx, renderer_config, runtime)
            .context("failed to create renderer")?;

        for effect in &config.effects {
            let Some(fragment) = effect.fragment.as_deref() else {
                anyhow::bail!("effect `{}` has no fragment source", effect.name);
            };
            renderer
                .register_effect(ctx, &effect.name, fragment, effect.direction())
                .with_context(|| format!("failed to register effect `{}`", effect.name))?;
        }

        let textures: HashMap<&str, TextureId> = config
            .textures
            .iter()
            .map(|t| (t.name.as_str(), renderer.load_texture(ctx, &t.url)))
            .collect();

        let mut builder = renderer.scene_builder();
        for (n, item) in config.items.iter().enumerate() {
            let texture = textures
                .get(item.texture.as_str())
                .copied()
                .with_context(|| format!("item {n} references unknown texture `{}`", item.texture))?;
            builder
                .item(texture, item.placement(), &item.effects)
                .with_context(|| format!("item {n}"))?;
        }
        let scene = builder.build();

        log::info!(
            "scene built: {} items, {} effect passes per frame",
            scene.len(),
            scene.effect_pass_count()
        );
        Ok(Self { renderer, scene })
    }
}
