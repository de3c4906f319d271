use std::path::Path;

use anyhow::{Context, Result};
use lumen_engine::coords::Viewport;
use lumen_engine::device::{GpuInit, HeadlessGpu, OffscreenSurface};
use lumen_engine::readback::read_texture;

use crate::config::StudioConfig;
use crate::scene::LoadedScene;

/// Renders one frame of the scene off-screen, after every texture load has
/// settled, and writes it to `out` as PNG.
pub fn render_png(config: &StudioConfig, runtime: tokio::runtime::Handle, out: &Path) -> Result<()> {
    let gpu = pollster::block_on(HeadlessGpu::new(GpuInit::default()))?;
    let viewport = Viewport::new(config.window.width, config.window.height);
    let surface = OffscreenSurface::new(gpu.device(), viewport, wgpu::TextureFormat::Rgba8Unorm);

    let ctx = gpu.render_ctx(&surface);
    let mut loaded = LoadedScene::build(&ctx, config, runtime)?;
    let settled = loaded.renderer.wait_for_textures(&ctx);
    log::info!("{settled} textures settled");

    let LoadedScene { renderer, scene } = &mut loaded;
    let report = gpu.render_to(&surface, |ctx, target| renderer.render_frame(ctx, target, scene))?;
    log::info!(
        "rendered {} items ({} skipped, {} effect passes)",
        report.items_drawn,
        report.items_skipped,
        report.effect_passes
    );

    let image = read_texture(gpu.device(), gpu.queue(), surface.texture())?;
    image::save_buffer(
        out,
        image.rgba(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )
    .with_context(|| format!("failed to write {}", out.display()))?;

    log::info!("wrote {}x{} frame to {}", image.width(), image.height(), out.display());
    Ok(())
}
