//! Effect chain planning and execution.

use crate::program::{EffectId, ProgramRegistry, ShaderProgram};
use crate::target::{target_slot, RenderTargetPair};
use crate::texture::{TextureId, TextureResource};

use super::params::{EffectParams, ParamSlots};
use super::quad::{begin_pass, QuadBuffers, QuadDraw};

/// Where a texture lives: a store texture or one of the ping-pong targets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureRef {
    Source(TextureId),
    /// Slot in the render target pair (0 or 1).
    Target(usize),
}

/// One full-screen effect pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PassPlan {
    /// Position in the chain.
    pub index: usize,
    pub effect: EffectId,
    /// Sampled by the pass: the source for pass 0, the previous target after.
    pub input: TextureRef,
    /// Target slot drawn into: `index % 2`.
    pub target: usize,
}

/// Routes `effects` through the target pair, in list order.
///
/// An empty list plans no passes.
pub fn plan_chain(source: TextureId, effects: &[EffectId]) -> Vec<PassPlan> {
    let mut input = TextureRef::Source(source);
    effects
        .iter()
        .enumerate()
        .map(|(index, &effect)| {
            let target = target_slot(index);
            let plan = PassPlan {
                index,
                effect,
                input,
                target,
            };
            input = TextureRef::Target(target);
            plan
        })
        .collect()
}

/// Final output of a planned chain.
pub(crate) fn chain_output(source: TextureId, plan: &[PassPlan]) -> TextureRef {
    plan.last()
        .map_or(TextureRef::Source(source), |p| TextureRef::Target(p.target))
}

/// Records effect passes into the target pair.
pub(crate) struct EffectChain<'a> {
    pub registry: &'a ProgramRegistry,
    pub targets: &'a RenderTargetPair,
    pub quads: &'a QuadBuffers,
    pub params: &'a wgpu::BindGroup,
}

impl EffectChain<'_> {
    /// Records one pass per effect and returns where the result lives.
    ///
    /// The empty chain records nothing and returns the source. `None` (and
    /// nothing recorded) if an effect id doesn't belong to the registry.
    pub(crate) fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        source_id: TextureId,
        source: &TextureResource,
        effects: &[EffectId],
        slots: &mut ParamSlots,
    ) -> Option<TextureRef> {
        let programs: Vec<&ShaderProgram> = effects
            .iter()
            .map(|&e| self.registry.program(e))
            .collect::<Option<_>>()?;

        let plan = plan_chain(source_id, effects);
        // Every pass samples with the source's size, not the target's.
        let resolution = [source.width() as f32, source.height() as f32];

        for (pass, program) in plan.iter().zip(programs) {
            let offset = slots.push(EffectParams {
                resolution,
                direction: pass.effect.direction().to_array(),
            });

            let input = match pass.input {
                TextureRef::Source(_) => source.bind_group(),
                TextureRef::Target(slot) => self.targets.target(slot).bind_group(),
            };
            let dst = self.targets.target(pass.target);

            log::trace!(
                "effect pass {} `{}`: {:?} -> target {}",
                pass.index,
                program.id(),
                pass.input,
                pass.target
            );

            let mut rpass = begin_pass(encoder, dst.view(), Some(wgpu::Color::TRANSPARENT), "lumen effect pass");
            QuadDraw {
                pipeline: program.pipeline(),
                texture: input,
                params: self.params,
                params_offset: offset,
                positions: self.quads.full_screen.slice(..),
                texcoords: self.quads.texcoords.slice(..),
            }
            .record(&mut rpass);
        }

        Some(chain_output(source_id, &plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    fn effects(n: usize) -> Vec<EffectId> {
        (0..n).map(|i| EffectId::new(0, i % 3, Vec2::zero())).collect()
    }

    #[test]
    fn empty_chain_returns_source() {
        let src = TextureId::from_raw(4);
        let plan = plan_chain(src, &[]);
        assert!(plan.is_empty());
        assert_eq!(chain_output(src, &plan), TextureRef::Source(src));
    }

    #[test]
    fn passes_alternate_targets() {
        let src = TextureId::from_raw(0);
        let plan = plan_chain(src, &effects(5));

        let targets: Vec<usize> = plan.iter().map(|p| p.target).collect();
        assert_eq!(targets, [0, 1, 0, 1, 0]);
        for p in &plan {
            assert_eq!(p.target, p.index % 2);
        }
    }

    #[test]
    fn each_pass_reads_previous_output() {
        let src = TextureId::from_raw(2);
        let plan = plan_chain(src, &effects(3));

        assert_eq!(plan[0].input, TextureRef::Source(src));
        assert_eq!(plan[1].input, TextureRef::Target(0));
        assert_eq!(plan[2].input, TextureRef::Target(1));
        // Never sample the target being drawn.
        for p in &plan {
            assert_ne!(p.input, TextureRef::Target(p.target));
        }
        assert_eq!(chain_output(src, &plan), TextureRef::Target(0));
    }

    #[test]
    fn effects_keep_list_order() {
        let list = vec![
            EffectId::new(0, 1, Vec2::zero()),
            EffectId::new(0, 2, Vec2::new(0.0, 0.5)),
            EffectId::new(0, 0, Vec2::zero()),
        ];
        let plan = plan_chain(TextureId::from_raw(0), &list);
        let planned: Vec<EffectId> = plan.iter().map(|p| p.effect).collect();
        assert_eq!(planned, list);
    }
}
