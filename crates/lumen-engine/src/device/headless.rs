use anyhow::{Context, Result};

use super::init::{create_instance, request_adapter, request_device};
use super::GpuInit;
use crate::coords::Viewport;
use crate::render::{RenderCtx, RenderTarget};

/// GPU device without a window.
///
/// Used for off-screen rendering (PNG export) and GPU integration tests.
pub struct HeadlessGpu {
    _instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    /// Acquires an adapter and device with no surface attached.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let instance = create_instance();

        let adapter = request_adapter(&instance, None, &init)
            .await
            .context("headless rendering needs a GPU adapter")?;
        let (device, queue) = request_device(&adapter, &init).await?;

        log::info!(
            "headless gpu ready: {} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        Ok(Self {
            _instance: instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Builds a renderer-facing context targeting `surface`.
    pub fn render_ctx(&self, surface: &OffscreenSurface) -> RenderCtx<'_> {
        RenderCtx::new(&self.device, &self.queue, surface.format(), surface.viewport())
    }

    /// Records into a fresh encoder targeting `surface`, then submits.
    pub fn render_to<R, F>(&self, surface: &OffscreenSurface, draw: F) -> R
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>) -> R,
    {
        let ctx = self.render_ctx(surface);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen offscreen encoder"),
            });

        let out = {
            let mut target = RenderTarget::new(&mut encoder, surface.view());
            draw(&ctx, &mut target)
        };

        self.queue.submit(std::iter::once(encoder.finish()));
        out
    }
}

/// Off-screen primary surface: a texture the compositor can draw into and
/// that can be read back.
pub struct OffscreenSurface {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    viewport: Viewport,
}

impl OffscreenSurface {
    pub fn new(device: &wgpu::Device, viewport: Viewport, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen offscreen surface"),
            size: wgpu::Extent3d {
                width: viewport.width.max(1),
                height: viewport.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            format,
            viewport,
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}
