//! Ping-pong render targets for effect chains.
//!
//! Two targets are enough for a chain of any length: pass `i` draws into
//! target `i % 2` while sampling the other one (or the source texture).

use crate::error::{EngineError, Result};
use crate::render::QuadLayouts;

/// Color format of every off-screen target and of every effect pipeline.
pub const RENDER_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// One off-screen color target plus the bind group that samples it.
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    fn new(device: &wgpu::Device, layouts: &QuadLayouts, width: u32, height: u32, slot: usize) -> Self {
        let label = format!("lumen ping-pong target {slot}");
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: RENDER_TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = layouts.texture_bind_group(device, &view, &label);

        Self {
            texture,
            view,
            bind_group,
            width,
            height,
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Exactly two off-screen targets sized to the primary surface.
pub struct RenderTargetPair {
    targets: [OffscreenTarget; 2],
}

impl RenderTargetPair {
    /// Creates both targets after checking they can be complete on `device`.
    pub fn acquire(device: &wgpu::Device, layouts: &QuadLayouts, width: u32, height: u32) -> Result<Self> {
        validate_size(width, height, device.limits().max_texture_dimension_2d)?;

        log::debug!("acquiring ping-pong targets {width}x{height}");
        Ok(Self {
            targets: [
                OffscreenTarget::new(device, layouts, width, height, 0),
                OffscreenTarget::new(device, layouts, width, height, 1),
            ],
        })
    }

    /// Target `i mod 2`.
    pub fn target(&self, i: usize) -> &OffscreenTarget {
        &self.targets[target_slot(i)]
    }

    pub fn size(&self) -> (u32, u32) {
        (self.targets[0].width, self.targets[0].height)
    }
}

#[inline]
pub(crate) fn target_slot(i: usize) -> usize {
    i % 2
}

fn validate_size(width: u32, height: u32, max_dimension: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EngineError::IncompleteTarget {
            reason: format!("zero-sized attachment {width}x{height}"),
        });
    }
    if width > max_dimension || height > max_dimension {
        return Err(EngineError::IncompleteTarget {
            reason: format!("attachment {width}x{height} exceeds device limit {max_dimension}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_alternate() {
        let slots: Vec<usize> = (0..5).map(target_slot).collect();
        assert_eq!(slots, [0, 1, 0, 1, 0]);
    }

    #[test]
    fn zero_size_is_incomplete() {
        assert!(matches!(
            validate_size(0, 600, 8192),
            Err(EngineError::IncompleteTarget { .. })
        ));
        assert!(matches!(
            validate_size(600, 0, 8192),
            Err(EngineError::IncompleteTarget { .. })
        ));
    }

    #[test]
    fn oversize_is_incomplete() {
        let err = validate_size(9000, 10, 8192).unwrap_err();
        assert!(err.to_string().contains("8192"));
        assert!(validate_size(8192, 8192, 8192).is_ok());
    }
}
