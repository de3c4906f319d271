use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::init::{create_instance, request_adapter, request_device};
use super::surface::{self, SurfaceErrorAction};
use super::GpuInit;
use crate::coords::Viewport;
use crate::render::RenderCtx;

/// The swapchain image being drawn this tick, with its view and encoder.
///
/// Hand it back through [`Gpu::submit`] before acquiring the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// Device, queue and swapchain for one window.
///
/// The surface borrows the window for `'w`; the runtime keeps both in one
/// self-referencing entry so the window is dropped last.
pub struct Gpu<'w> {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'w>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    /// Physical pixels; may be 0x0 while minimized.
    size: PhysicalSize<u32>,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(
            size.width > 0 && size.height > 0,
            "cannot create a swapchain for a {}x{} window",
            size.width,
            size.height
        );

        let instance = create_instance();
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;
        let adapter = request_adapter(&instance, Some(&surface), &init).await?;
        let (device, queue) = request_device(&adapter, &init).await?;

        let config = surface::surface_configuration(&surface.get_capabilities(&adapter), &init, size)
            .context("surface reports no supported formats")?;
        surface.configure(&device, &config);

        log::info!(
            "gpu ready: {} ({:?}), swapchain {:?} {}x{} {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.format,
            size.width,
            size.height,
            config.present_mode
        );

        Ok(Self {
            _instance: instance,
            surface,
            adapter,
            device,
            queue,
            config,
            size,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Size the compositor draws at; invalid while minimized.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.size.width, self.size.height)
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

    pub fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(&self.device, &self.queue, self.config.format, self.viewport())
    }

    /// Reconfigures the swapchain; a zero size is recorded but not applied.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        log::trace!("surface resize {}x{}", new_size.width, new_size.height);
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the frame's commands, then presents the swapchain image.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }

    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        let reason = err.to_string();
        let action = surface::map_surface_error(&self.surface, &self.device, &self.config, self.size, err);
        if action != SurfaceErrorAction::SkipFrame {
            log::warn!("surface error: {reason}; {action:?}");
        }
        action
    }
}
