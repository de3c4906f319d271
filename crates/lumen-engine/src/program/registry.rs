use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::coords::Vec2;
use crate::error::{EngineError, Result};
use crate::render::QuadLayouts;
use crate::target::RENDER_TARGET_FORMAT;

use super::effect::EffectKind;
use super::shader::ShaderProgram;
use super::shaders;

/// Tags each registry so ids from another one never resolve.
static NEXT_REGISTRY: AtomicU32 = AtomicU32::new(1);

/// A resolved effect: which program runs and the `direction` it is fed.
///
/// Only a [`ProgramRegistry`] hands these out, and only that registry
/// resolves them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EffectId {
    registry: u32,
    index: usize,
    direction: Vec2,
}

impl EffectId {
    pub(crate) const fn new(registry: u32, index: usize, direction: Vec2) -> Self {
        Self {
            registry,
            index,
            direction,
        }
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Same program, different `direction` uniform.
    pub fn with_direction(self, direction: Vec2) -> Self {
        Self { direction, ..self }
    }
}

struct RegisteredEffect {
    program: ShaderProgram,
    direction: Vec2,
}

/// Effect name to compiled program, populated at startup.
///
/// Effect programs render into off-screen targets, so all of them are built
/// for [`RENDER_TARGET_FORMAT`].
pub struct ProgramRegistry {
    tag: u32,
    effects: Vec<RegisteredEffect>,
    names: HashMap<String, usize>,
}

impl ProgramRegistry {
    /// Compiles every built-in effect. Any failure is fatal.
    pub fn new(device: &wgpu::Device, layouts: &QuadLayouts) -> Result<Self> {
        let mut registry = Self {
            tag: NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed),
            effects: Vec::with_capacity(EffectKind::ALL.len()),
            names: HashMap::new(),
        };

        for kind in EffectKind::ALL {
            let program = ShaderProgram::compile(
                device,
                layouts,
                RENDER_TARGET_FORMAT,
                kind.name(),
                shaders::QUAD_VERTEX,
                kind.fragment_source(),
            )?;
            let index = registry.push(program, kind.direction());
            registry.claim(kind.name(), index)?;
            for alias in kind.aliases() {
                registry.claim(alias, index)?;
            }
        }

        log::info!("registered {} built-in effects", registry.effects.len());
        Ok(registry)
    }

    /// Built-in effects are compiled up front, so this cannot fail.
    pub fn builtin(&self, kind: EffectKind) -> EffectId {
        let index = match kind {
            EffectKind::Grayscale => 0,
            EffectKind::Invert => 1,
            EffectKind::DirectionalBlur { .. } => 2,
        };
        EffectId::new(self.tag, index, kind.direction())
    }

    /// O(1) lookup by canonical name or alias.
    pub fn lookup(&self, name: &str) -> Result<EffectId> {
        self.names
            .get(name)
            .map(|&index| EffectId::new(self.tag, index, self.effects[index].direction))
            .ok_or_else(|| EngineError::UnknownEffect {
                name: name.to_owned(),
            })
    }

    /// Compiles a data-driven effect from fragment WGSL and registers it.
    ///
    /// The fragment stage is linked against the shared quad vertex stage and
    /// pipeline layout like every built-in.
    pub fn register_custom(
        &mut self,
        device: &wgpu::Device,
        layouts: &QuadLayouts,
        name: &str,
        fragment_source: &str,
        direction: Vec2,
    ) -> Result<EffectId> {
        if self.names.contains_key(name) {
            return Err(EngineError::DuplicateEffect {
                name: name.to_owned(),
            });
        }

        let program = ShaderProgram::compile(
            device,
            layouts,
            RENDER_TARGET_FORMAT,
            name,
            shaders::QUAD_VERTEX,
            fragment_source,
        )?;
        let index = self.push(program, direction);
        self.claim(name, index)?;

        log::info!("registered custom effect `{name}`");
        Ok(EffectId::new(self.tag, index, direction))
    }

    /// `None` for ids handed out by another registry.
    pub fn program(&self, id: EffectId) -> Option<&ShaderProgram> {
        if id.registry != self.tag {
            return None;
        }
        self.effects.get(id.index).map(|e| &e.program)
    }

    /// Canonical name of `id`.
    pub fn name(&self, id: EffectId) -> Option<&str> {
        self.program(id).map(ShaderProgram::id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of registered programs (aliases not counted).
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    fn push(&mut self, program: ShaderProgram, direction: Vec2) -> usize {
        self.effects.push(RegisteredEffect { program, direction });
        self.effects.len() - 1
    }

    fn claim(&mut self, name: &str, index: usize) -> Result<()> {
        if self.names.insert(name.to_owned(), index).is_some() {
            return Err(EngineError::DuplicateEffect {
                name: name.to_owned(),
            });
        }
        Ok(())
    }
}
