//! Shared quad geometry, bind group layouts, and the per-draw binding bundle.
//!
//! Every program in the engine (effects and passthrough) uses the same
//! pipeline layout:
//! - group 0: input texture (binding 0) + sampler (binding 1)
//! - group 1: `EffectParams` uniform with a dynamic offset (binding 0)
//!
//! and the same two vertex streams:
//! - slot 0: `position` (location 0), NDC
//! - slot 1: `texcoord` (location 1)

use wgpu::util::DeviceExt;

use crate::coords::Placement;

use super::params::EffectParams;

pub(crate) const TEXTURE_GROUP: u32 = 0;
pub(crate) const TEXTURE_BINDING: u32 = 0;
pub(crate) const SAMPLER_BINDING: u32 = 1;
pub(crate) const PARAMS_GROUP: u32 = 1;
pub(crate) const PARAMS_BINDING: u32 = 0;

pub(crate) const POSITION_LOCATION: u32 = 0;
pub(crate) const TEXCOORD_LOCATION: u32 = 1;

/// 2 triangles per quad.
pub(crate) const QUAD_VERTEX_COUNT: u32 = 6;

/// Byte size of one quad's position (or texcoord) stream.
pub(crate) const QUAD_STREAM_BYTES: u64 = (QUAD_VERTEX_COUNT as u64) * 8;

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![POSITION_LOCATION => Float32x2];
const TEXCOORD_ATTRS: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![TEXCOORD_LOCATION => Float32x2];

pub(crate) fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [
        wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEXCOORD_ATTRS,
        },
    ]
}

/// Bind group layouts, pipeline layout, and sampler shared by all programs.
pub struct QuadLayouts {
    pub(crate) texture: wgpu::BindGroupLayout,
    pub(crate) params: wgpu::BindGroupLayout,
    pub(crate) pipeline: wgpu::PipelineLayout,
    pub(crate) sampler: wgpu::Sampler,
}

impl QuadLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: TEXTURE_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: SAMPLER_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let params = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen effect params bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: PARAMS_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(EffectParams::binding_size()),
                },
                count: None,
            }],
        });

        let pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen quad pipeline layout"),
            bind_group_layouts: &[&texture, &params],
            immediate_size: 0,
        });

        // Clamp + linear, no mipmaps: a 1x1 placeholder stretches uniformly.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen quad sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            params,
            pipeline,
            sampler,
        }
    }

    /// Creates the group-0 bind group sampling `view`.
    pub(crate) fn texture_bind_group(
        &self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Creates a render pipeline for a vertex/fragment module pair.
    ///
    /// Blending is disabled: fragments overwrite destination pixels.
    pub(crate) fn create_pipeline(
        &self,
        device: &wgpu::Device,
        label: &str,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&self.pipeline),

            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some(super::VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &vertex_layouts(),
            },

            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some(super::FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

/// Static vertex streams: unit texcoords and the full-screen quad.
pub(crate) struct QuadBuffers {
    pub(crate) texcoords: wgpu::Buffer,
    pub(crate) full_screen: wgpu::Buffer,
}

impl QuadBuffers {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let texcoords = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen quad texcoords"),
            contents: bytemuck::cast_slice(&Placement::UNIT.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let full_screen = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen full-screen quad"),
            contents: bytemuck::cast_slice(&Placement::FULL_SCREEN.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            texcoords,
            full_screen,
        }
    }
}

/// Everything one quad draw needs, bound immediately before the draw call.
///
/// Nothing is inherited from a previous draw in the same pass.
pub(crate) struct QuadDraw<'a> {
    pub pipeline: &'a wgpu::RenderPipeline,
    pub texture: &'a wgpu::BindGroup,
    pub params: &'a wgpu::BindGroup,
    pub params_offset: u32,
    pub positions: wgpu::BufferSlice<'a>,
    pub texcoords: wgpu::BufferSlice<'a>,
}

impl QuadDraw<'_> {
    pub(crate) fn record(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_pipeline(self.pipeline);
        rpass.set_bind_group(TEXTURE_GROUP, self.texture, &[]);
        rpass.set_bind_group(PARAMS_GROUP, self.params, &[self.params_offset]);
        rpass.set_vertex_buffer(0, self.positions);
        rpass.set_vertex_buffer(1, self.texcoords);
        rpass.draw(0..QUAD_VERTEX_COUNT, 0..1);
    }
}

/// Begins a render pass drawing into `view`.
///
/// `clear = None` keeps existing contents (`LoadOp::Load`).
pub(crate) fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    view: &'e wgpu::TextureView,
    clear: Option<wgpu::Color>,
    label: &str,
) -> wgpu::RenderPass<'e> {
    let load = match clear {
        Some(c) => wgpu::LoadOp::Clear(c),
        None => wgpu::LoadOp::Load,
    };

    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}
