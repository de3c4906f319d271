use anyhow::{Context, Result};

/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: textures are uploaded as raw `Rgba8Unorm` bytes and the
    /// compositor must put them on screen unchanged.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    ///
    /// Texture dimensions are always raised to what the adapter supports, so
    /// large images are not capped by the downlevel defaults.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,

    /// Accept a software adapter when no hardware adapter is available.
    pub allow_fallback_adapter: bool,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
            allow_fallback_adapter: true,
        }
    }
}

pub(crate) fn create_instance() -> wgpu::Instance {
    // All backends so wgpu can select the optimal platform backend.
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Picks a hardware adapter able to present to `surface` (if any), falling
/// back to a software adapter when `init` allows it.
pub(crate) async fn request_adapter(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
    init: &GpuInit,
) -> Result<wgpu::Adapter> {
    let hardware = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await;

    match hardware {
        Ok(adapter) => Ok(adapter),
        Err(err) if init.allow_fallback_adapter => {
            log::debug!("no hardware adapter ({err}); trying fallback adapter");
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::LowPower,
                    compatible_surface: surface,
                    force_fallback_adapter: true,
                })
                .await
                .context("no GPU adapter, hardware or fallback")
        }
        Err(err) => Err(err).context("no suitable GPU adapter"),
    }
}

pub(crate) async fn request_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("lumen-engine device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone().using_resolution(adapter.limits()),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}
