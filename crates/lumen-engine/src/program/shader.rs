use std::borrow::Cow;

use crate::error::{EngineError, Result};
use crate::render::QuadLayouts;

use super::interface::{link, ShaderInterface, UniformSlot};
use super::shaders;

/// A linked vertex + fragment pair and its render pipeline.
///
/// Immutable once built. A program that fails to compile or link is never
/// constructed, so it can never be selected for a draw.
pub struct ShaderProgram {
    id: String,
    vertex_source: String,
    fragment_source: String,
    format: wgpu::TextureFormat,
    interface: ShaderInterface,
    pipeline: wgpu::RenderPipeline,
}

impl ShaderProgram {
    /// Compiles both stages, links them against the quad layout and builds a
    /// pipeline writing `format`.
    pub fn compile(
        device: &wgpu::Device,
        layouts: &QuadLayouts,
        format: wgpu::TextureFormat,
        id: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self> {
        let linked = link(id, vertex_source, fragment_source)?;

        // Anything naga reflection missed surfaces here as a link error
        // instead of reaching the uncaptured-error handler.
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("lumen {id} vertex")),
            source: wgpu::ShaderSource::Naga(Cow::Owned(linked.vertex)),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("lumen {id} fragment")),
            source: wgpu::ShaderSource::Naga(Cow::Owned(linked.fragment)),
        });

        let pipeline =
            layouts.create_pipeline(device, &format!("lumen {id} pipeline"), &vertex, &fragment, format);
        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(EngineError::ShaderLink {
                program: id.to_owned(),
                log: err.to_string(),
            });
        }

        log::debug!("compiled shader program `{id}` for {format:?}");

        Ok(Self {
            id: id.to_owned(),
            vertex_source: vertex_source.to_owned(),
            fragment_source: fragment_source.to_owned(),
            format,
            interface: linked.interface,
            pipeline,
        })
    }

    /// The plain texture copy used to put final textures on screen.
    pub fn passthrough(
        device: &wgpu::Device,
        layouts: &QuadLayouts,
        format: wgpu::TextureFormat,
    ) -> Result<Self> {
        Self::compile(
            device,
            layouts,
            format,
            "passthrough",
            shaders::QUAD_VERTEX,
            shaders::PASSTHROUGH,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Color format the pipeline writes.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn interface(&self) -> &ShaderInterface {
        &self.interface
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.interface.attribute(name)
    }

    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.interface.uniform(name)
    }

    pub(crate) fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}
