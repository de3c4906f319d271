//! Scene compositor: clears the primary surface and draws every item's final
//! texture at its placement, in paint order.

use crate::error::{EngineError, Result};
use crate::paint::Color;
use crate::program::{EffectId, ProgramRegistry, ShaderProgram};
use crate::scene::Scene;
use crate::target::RenderTargetPair;
use crate::texture::{TextureId, TextureStore};

use super::chain::{EffectChain, TextureRef};
use super::ctx::{RenderCtx, RenderTarget};
use super::params::{EffectParams, FrameBuffers, ParamSlots};
use super::quad::{begin_pass, QuadBuffers, QuadDraw, QuadLayouts, QUAD_STREAM_BYTES};

/// What a frame did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameReport {
    pub items_drawn: usize,
    pub items_skipped: usize,
    pub effect_passes: usize,
}

/// GPU resources the compositor borrows each frame.
pub(crate) struct FrameInputs<'a> {
    pub layouts: &'a QuadLayouts,
    pub registry: &'a ProgramRegistry,
    pub textures: &'a TextureStore,
    pub targets: &'a RenderTargetPair,
}

pub(crate) struct Compositor {
    quads: QuadBuffers,
    frame: FrameBuffers,
    slots: ParamSlots,
    positions: Vec<[[f32; 2]; 6]>,

    /// Rebuilt when the primary surface format changes.
    passthrough: ShaderProgram,
}

impl Compositor {
    pub(crate) fn new(ctx: &RenderCtx<'_>, layouts: &QuadLayouts) -> Result<Self> {
        let alignment = ctx.device.limits().min_uniform_buffer_offset_alignment;
        Ok(Self {
            quads: QuadBuffers::new(ctx.device),
            frame: FrameBuffers::default(),
            slots: ParamSlots::new(alignment),
            positions: Vec::new(),
            passthrough: ShaderProgram::passthrough(ctx.device, layouts, ctx.surface_format)?,
        })
    }

    pub(crate) fn passthrough(&self) -> &ShaderProgram {
        &self.passthrough
    }

    fn ensure_passthrough(&mut self, ctx: &RenderCtx<'_>, layouts: &QuadLayouts) -> Result<()> {
        if self.passthrough.format() == ctx.surface_format {
            return Ok(());
        }
        log::debug!(
            "surface format changed {:?} -> {:?}; rebuilding passthrough",
            self.passthrough.format(),
            ctx.surface_format
        );
        self.passthrough = ShaderProgram::passthrough(ctx.device, layouts, ctx.surface_format)?;
        Ok(())
    }

    /// Records one full frame of `scene` into `target`.
    ///
    /// The surface is cleared once, then items draw in insertion order with
    /// blending off. Items with an unknown texture or effect are skipped.
    /// Uniform and position data is queued on `ctx.queue`, so the encoder
    /// must be submitted before the next call.
    pub(crate) fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        inputs: &FrameInputs<'_>,
        scene: &Scene,
        clear: Color,
    ) -> Result<FrameReport> {
        self.ensure_passthrough(ctx, inputs.layouts)?;

        self.positions.clear();
        self.slots.clear();
        // One shared zeroed slot for the passthrough draws.
        let passthrough_offset = self.slots.push(EffectParams::default());

        self.frame.reserve(
            ctx,
            inputs.layouts,
            scene.len(),
            1 + scene.effect_pass_count(),
            self.slots.stride(),
        );
        let (Some(position_buffer), Some(params)) =
            (self.frame.positions(), self.frame.params_bind_group())
        else {
            return Err(EngineError::Device("per-frame buffers were not allocated".into()));
        };

        drop(begin_pass(
            target.encoder,
            target.color_view,
            Some(clear.to_wgpu()),
            "lumen clear",
        ));

        let chain = EffectChain {
            registry: inputs.registry,
            targets: inputs.targets,
            quads: &self.quads,
            params,
        };

        let mut report = FrameReport::default();
        for (n, item) in scene.items().iter().enumerate() {
            let Some(resource) = inputs.textures.get(item.texture()) else {
                log::warn!("item {n}: unknown texture {:?}; skipped", item.texture());
                report.items_skipped += 1;
                continue;
            };
            if !item.placement().is_finite() {
                log::warn!("item {n}: non-finite placement {:?}; skipped", item.placement());
                report.items_skipped += 1;
                continue;
            }

            let Some(output) = chain.run(
                target.encoder,
                item.texture(),
                resource,
                item.effects(),
                &mut self.slots,
            ) else {
                log::warn!("item {n}: effect not in this renderer's registry; skipped");
                report.items_skipped += 1;
                continue;
            };
            report.effect_passes += item.effects().len();

            let texture = match output {
                TextureRef::Source(_) => resource.bind_group(),
                TextureRef::Target(slot) => inputs.targets.target(slot).bind_group(),
            };

            let start = self.positions.len() as u64 * QUAD_STREAM_BYTES;
            self.positions.push(item.placement().vertices());

            let mut rpass = begin_pass(target.encoder, target.color_view, None, "lumen composite");
            rpass.set_viewport(
                0.0,
                0.0,
                ctx.viewport.width as f32,
                ctx.viewport.height as f32,
                0.0,
                1.0,
            );
            QuadDraw {
                pipeline: self.passthrough.pipeline(),
                texture,
                params,
                params_offset: passthrough_offset,
                positions: position_buffer.slice(start..start + QUAD_STREAM_BYTES),
                texcoords: self.quads.texcoords.slice(..),
            }
            .record(&mut rpass);

            report.items_drawn += 1;
        }

        self.frame.upload(ctx, &self.positions, &self.slots);

        log::debug!(
            "frame: {} drawn, {} skipped, {} effect passes, {} uniform slots",
            report.items_drawn,
            report.items_skipped,
            report.effect_passes,
            self.slots.len()
        );
        Ok(report)
    }

    /// Records only the effect chain for `source`, outside of any frame.
    pub(crate) fn run_chain(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        inputs: &FrameInputs<'_>,
        source: TextureId,
        effects: &[EffectId],
    ) -> Result<TextureRef> {
        let resource = inputs
            .textures
            .get(source)
            .ok_or(EngineError::UnknownTexture { id: source.raw() })?;

        self.slots.clear();
        self.frame
            .reserve(ctx, inputs.layouts, 0, effects.len().max(1), self.slots.stride());
        let Some(params) = self.frame.params_bind_group() else {
            return Err(EngineError::Device("per-frame buffers were not allocated".into()));
        };

        let chain = EffectChain {
            registry: inputs.registry,
            targets: inputs.targets,
            quads: &self.quads,
            params,
        };
        let output = chain
            .run(encoder, source, resource, effects, &mut self.slots)
            .ok_or_else(|| EngineError::UnknownEffect {
                name: "<effect from another registry>".into(),
            })?;

        self.frame.upload(ctx, &[], &self.slots);
        Ok(output)
    }
}
