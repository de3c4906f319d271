//! Per-pass uniform data and the per-frame GPU buffers that carry it.
//!
//! All uniform writes for a frame land in the queue before the frame's command
//! buffer is submitted, so every pass needs its own slot: rewriting a single
//! buffer region would leave every pass seeing the last value written.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::render::RenderCtx;

use super::quad::{QuadLayouts, PARAMS_BINDING, QUAD_STREAM_BYTES};

/// Uniform block shared by every effect shader (`struct EffectParams` in WGSL).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct EffectParams {
    /// Source texture size in pixels.
    pub resolution: [f32; 2],
    /// Blur direction; zero for effects that ignore it.
    pub direction: [f32; 2],
}

impl EffectParams {
    pub(crate) const SIZE: u64 = std::mem::size_of::<EffectParams>() as u64;

    pub(crate) fn binding_size() -> NonZeroU64 {
        NonZeroU64::new(Self::SIZE).unwrap_or(NonZeroU64::MIN)
    }
}

/// CPU staging for per-pass uniform slots, one aligned slot per push.
#[derive(Debug)]
pub(crate) struct ParamSlots {
    stride: u32,
    bytes: Vec<u8>,
}

impl ParamSlots {
    /// `alignment` is the device's `min_uniform_buffer_offset_alignment`.
    pub(crate) fn new(alignment: u32) -> Self {
        Self {
            stride: slot_stride(alignment),
            bytes: Vec::new(),
        }
    }

    pub(crate) fn stride(&self) -> u32 {
        self.stride
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len() / self.stride as usize
    }

    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Appends `params` and returns its dynamic offset.
    pub(crate) fn push(&mut self, params: EffectParams) -> u32 {
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(bytemuck::bytes_of(&params));
        self.bytes.resize((offset + self.stride) as usize, 0);
        offset
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn slot_stride(alignment: u32) -> u32 {
    let size = EffectParams::SIZE as u32;
    let align = alignment.max(1);
    size.div_ceil(align) * align
}

/// Growable per-frame GPU buffers: item positions and uniform slots.
///
/// Capacity only grows; buffers are reused across frames.
#[derive(Default)]
pub(crate) struct FrameBuffers {
    positions: Option<wgpu::Buffer>,
    position_capacity: usize,

    params: Option<wgpu::Buffer>,
    params_bind_group: Option<wgpu::BindGroup>,
    params_capacity: usize,
}

impl FrameBuffers {
    /// Ensures room for `quads` position streams and `slots` uniform slots.
    ///
    /// Must run before any pass of the frame is recorded: growing recreates the
    /// uniform bind group.
    pub(crate) fn reserve(
        &mut self,
        ctx: &RenderCtx<'_>,
        layouts: &QuadLayouts,
        quads: usize,
        slots: usize,
        stride: u32,
    ) {
        if quads > self.position_capacity || self.positions.is_none() {
            let cap = quads.next_power_of_two().max(16);
            self.positions = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("lumen item positions"),
                size: cap as u64 * QUAD_STREAM_BYTES,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.position_capacity = cap;
        }

        if slots > self.params_capacity || self.params.is_none() {
            let cap = slots.next_power_of_two().max(16);
            let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("lumen effect params"),
                size: cap as u64 * stride as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lumen effect params bind group"),
                layout: &layouts.params,
                entries: &[wgpu::BindGroupEntry {
                    binding: PARAMS_BINDING,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        size: Some(EffectParams::binding_size()),
                    }),
                }],
            });

            self.params = Some(buffer);
            self.params_bind_group = Some(bind_group);
            self.params_capacity = cap;
        }
    }

    pub(crate) fn positions(&self) -> Option<&wgpu::Buffer> {
        self.positions.as_ref()
    }

    pub(crate) fn params_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.params_bind_group.as_ref()
    }

    /// Queues the frame's staged data. Runs before the frame is submitted.
    pub(crate) fn upload(&self, ctx: &RenderCtx<'_>, positions: &[[[f32; 2]; 6]], slots: &ParamSlots) {
        if let Some(buffer) = self.positions.as_ref() {
            if !positions.is_empty() {
                ctx.queue.write_buffer(buffer, 0, bytemuck::cast_slice(positions));
            }
        }
        if let Some(buffer) = self.params.as_ref() {
            if !slots.as_bytes().is_empty() {
                ctx.queue.write_buffer(buffer, 0, slots.as_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_block_is_sixteen_bytes() {
        assert_eq!(EffectParams::SIZE, 16);
    }

    #[test]
    fn stride_rounds_up_to_alignment() {
        assert_eq!(slot_stride(256), 256);
        assert_eq!(slot_stride(4), 16);
        assert_eq!(slot_stride(0), 16);
    }

    #[test]
    fn pushes_land_on_aligned_offsets() {
        let mut slots = ParamSlots::new(256);
        let a = slots.push(EffectParams::default());
        let b = slots.push(EffectParams {
            resolution: [4.0, 2.0],
            direction: [0.0, 0.5],
        });
        assert_eq!((a, b), (0, 256));
        assert_eq!(slots.len(), 2);

        let second: EffectParams = bytemuck::pod_read_unaligned(&slots.as_bytes()[256..272]);
        assert_eq!(second.resolution, [4.0, 2.0]);
        assert_eq!(second.direction, [0.0, 0.5]);
    }
}
