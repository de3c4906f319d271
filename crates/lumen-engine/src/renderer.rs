use std::sync::Arc;

use crate::coords::Vec2;
use crate::error::{EngineError, Result};
use crate::paint::Color;
use crate::program::{EffectId, EffectKind, ProgramRegistry, ShaderProgram};
use crate::readback;
use crate::render::{Compositor, FrameInputs, FrameReport, QuadLayouts, RenderCtx, RenderTarget, TextureRef};
use crate::scene::{Scene, SceneBuilder};
use crate::target::RenderTargetPair;
use crate::texture::{
    ImageData, NetworkSource, Origin, TextureId, TextureLoader, TextureResource, TextureSource, TextureStore,
};

/// Renderer-wide settings.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Color the primary surface is cleared to at the start of each frame.
    pub clear_color: Color,
    /// Origin of the page textures are loaded for. URLs with another origin
    /// are fetched as cross-origin requests.
    pub page_origin: Option<Origin>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::CYAN,
            page_origin: None,
        }
    }
}

/// Owns every GPU resource of the compositor: layouts, programs, textures,
/// the ping-pong targets, and per-frame buffers.
///
/// Lives on the render thread. Texture fetches run on the given tokio runtime
/// and are applied by [`Renderer::poll_textures`].
pub struct Renderer {
    config: RendererConfig,
    layouts: QuadLayouts,
    registry: ProgramRegistry,
    textures: TextureStore,
    targets: RenderTargetPair,
    compositor: Compositor,
}

impl Renderer {
    /// Compiles every built-in program and acquires targets sized to
    /// `ctx.viewport`. Fails before any frame if either step fails.
    pub fn new(
        ctx: &RenderCtx<'_>,
        config: RendererConfig,
        source: Arc<dyn TextureSource>,
        runtime: tokio::runtime::Handle,
    ) -> Result<Self> {
        let layouts = QuadLayouts::new(ctx.device);
        let registry = ProgramRegistry::new(ctx.device, &layouts)?;
        let targets = RenderTargetPair::acquire(ctx.device, &layouts, ctx.viewport.width, ctx.viewport.height)?;
        let compositor = Compositor::new(ctx, &layouts)?;
        let textures = TextureStore::new(TextureLoader::new(source, runtime), config.page_origin.clone());

        log::info!(
            "renderer ready: {} effects, targets {}x{}, surface {:?}",
            registry.len(),
            ctx.viewport.width,
            ctx.viewport.height,
            ctx.surface_format
        );

        Ok(Self {
            config,
            layouts,
            registry,
            textures,
            targets,
            compositor,
        })
    }

    /// [`Renderer::new`] with textures fetched over HTTP or from disk.
    pub fn with_network_source(
        ctx: &RenderCtx<'_>,
        config: RendererConfig,
        runtime: tokio::runtime::Handle,
    ) -> Result<Self> {
        let source = Arc::new(NetworkSource::new(config.page_origin.clone()));
        Self::new(ctx, config, source, runtime)
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.config.clear_color = color;
    }

    pub fn layouts(&self) -> &QuadLayouts {
        &self.layouts
    }

    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn targets(&self) -> &RenderTargetPair {
        &self.targets
    }

    /// Program drawing final textures onto the primary surface, compiled for
    /// the surface format of the last frame.
    pub fn passthrough_program(&self) -> &ShaderProgram {
        self.compositor.passthrough()
    }

    // ---- textures ----

    /// Starts loading `url`; the returned id shows the placeholder until the
    /// image arrives.
    pub fn load_texture(&mut self, ctx: &RenderCtx<'_>, url: &str) -> TextureId {
        self.textures.load(ctx, &self.layouts, url)
    }

    pub fn insert_texture(&mut self, ctx: &RenderCtx<'_>, image: &ImageData) -> TextureId {
        self.textures.insert(ctx, &self.layouts, image)
    }

    /// Applies finished loads without blocking. Call once per tick.
    pub fn poll_textures(&mut self, ctx: &RenderCtx<'_>) -> usize {
        self.textures.poll(ctx, &self.layouts)
    }

    /// Blocks until every pending load has finished or failed.
    pub fn wait_for_textures(&mut self, ctx: &RenderCtx<'_>) -> usize {
        self.textures.wait_pending(ctx, &self.layouts)
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureResource> {
        self.textures.get(id)
    }

    // ---- effects ----

    pub fn builtin_effect(&self, kind: EffectKind) -> EffectId {
        self.registry.builtin(kind)
    }

    pub fn lookup_effect(&self, name: &str) -> Result<EffectId> {
        self.registry.lookup(name)
    }

    /// Registers a data-driven effect from fragment WGSL. Startup only.
    pub fn register_effect(
        &mut self,
        ctx: &RenderCtx<'_>,
        name: &str,
        fragment_source: &str,
        direction: Vec2,
    ) -> Result<EffectId> {
        self.registry
            .register_custom(ctx.device, &self.layouts, name, fragment_source, direction)
    }

    /// Builder resolving effect names against this renderer's registry.
    pub fn scene_builder(&self) -> SceneBuilder<'_> {
        SceneBuilder::new(&self.registry)
    }

    // ---- rendering ----

    /// Re-acquires the target pair if `ctx.viewport` changed size.
    pub fn resize(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        let size = (ctx.viewport.width, ctx.viewport.height);
        if self.targets.size() == size {
            return Ok(());
        }
        self.targets = RenderTargetPair::acquire(ctx.device, &self.layouts, size.0, size.1)?;
        Ok(())
    }

    /// Clears `target` and draws `scene` into it.
    ///
    /// Idempotent: the same scene and textures produce the same frame. The
    /// caller submits the encoder before the next call.
    pub fn render_frame(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        scene: &Scene,
    ) -> Result<FrameReport> {
        self.resize(ctx)?;

        let inputs = FrameInputs {
            layouts: &self.layouts,
            registry: &self.registry,
            textures: &self.textures,
            targets: &self.targets,
        };
        self.compositor
            .render(ctx, target, &inputs, scene, self.config.clear_color)
    }

    /// Records just the effect chain for `source` and returns where its
    /// output lives. The caller submits `encoder`.
    pub fn apply_effects(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        source: TextureId,
        effects: &[EffectId],
    ) -> Result<TextureRef> {
        self.resize(ctx)?;

        let inputs = FrameInputs {
            layouts: &self.layouts,
            registry: &self.registry,
            textures: &self.textures,
            targets: &self.targets,
        };
        self.compositor
            .run_chain(ctx, encoder, &inputs, source, effects)
    }

    /// Copies a store texture or a ping-pong target back to the host.
    pub fn read_texture(&self, ctx: &RenderCtx<'_>, texture: TextureRef) -> Result<ImageData> {
        let gpu_texture = match texture {
            TextureRef::Source(id) => self
                .textures
                .get(id)
                .ok_or(EngineError::UnknownTexture { id: id.raw() })?
                .texture(),
            TextureRef::Target(slot) => self.targets.target(slot).texture(),
        };
        readback::read_texture(ctx.device, ctx.queue, gpu_texture)
    }
}
