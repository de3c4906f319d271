use winit::dpi::PhysicalSize;

use super::GpuInit;

/// What the caller should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next tick.
    Reconfigured,
    /// Transient; skip this tick.
    SkipFrame,
    /// Out of memory. Stop rendering.
    Fatal,
}

/// Picks the surface format.
///
/// Non-sRGB is preferred by default: texture bytes are uploaded as
/// `Rgba8Unorm` and must reach the screen without a transfer-function change.

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    let preferred: &[wgpu::TextureFormat] = if prefer_srgb {
        &[
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        &[wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8Unorm]
    };

    preferred
        .iter()
        .copied()
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.first().copied())
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Full swapchain configuration for a `size` drawable, or `None` when the
/// surface reports no formats.
pub(crate) fn surface_configuration(
    caps: &wgpu::SurfaceCapabilities,
    init: &GpuInit,
    size: PhysicalSize<u32>,
) -> Option<wgpu::SurfaceConfiguration> {
    Some(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: choose_surface_format(caps, init.prefer_srgb)?,
        width: size.width,
        height: size.height,
        present_mode: init.present_mode,
        alpha_mode: choose_alpha_mode(caps, init.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    })
}

pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;

    // wgpu rejects 0x0 configurations; defer until the window is visible again.
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;

    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: &[wgpu::TextureFormat], alpha: &[wgpu::CompositeAlphaMode]) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats: formats.to_vec(),
            present_modes: vec![wgpu::PresentMode::Fifo],
            alpha_modes: alpha.to_vec(),
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    #[test]
    fn prefers_linear_formats_unless_asked() {
        use wgpu::TextureFormat::*;
        let c = caps(&[Bgra8UnormSrgb, Bgra8Unorm], &[]);
        assert_eq!(choose_surface_format(&c, false), Some(Bgra8Unorm));
        assert_eq!(choose_surface_format(&c, true), Some(Bgra8UnormSrgb));

        let only_srgb = caps(&[Rgba8UnormSrgb], &[]);
        assert_eq!(choose_surface_format(&only_srgb, false), Some(Rgba8UnormSrgb));
        assert_eq!(choose_surface_format(&caps(&[], &[]), false), None);
    }

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        use wgpu::CompositeAlphaMode::*;
        let c = caps(&[], &[Opaque, PreMultiplied]);
        assert_eq!(choose_alpha_mode(&c, Some(PreMultiplied)), PreMultiplied);
        assert_eq!(choose_alpha_mode(&c, Some(PostMultiplied)), Opaque);
        assert_eq!(choose_alpha_mode(&caps(&[], &[]), None), Auto);
    }

    #[test]
    fn configuration_uses_chosen_format_and_size() {
        use wgpu::TextureFormat::*;
        let c = caps(&[Bgra8UnormSrgb, Rgba8Unorm], &[wgpu::CompositeAlphaMode::Opaque]);
        let config = surface_configuration(&c, &GpuInit::default(), PhysicalSize::new(600, 400)).unwrap();
        assert_eq!(config.format, Rgba8Unorm);
        assert_eq!((config.width, config.height), (600, 400));
        assert_eq!(config.alpha_mode, wgpu::CompositeAlphaMode::Opaque);

        assert!(surface_configuration(&caps(&[], &[]), &GpuInit::default(), PhysicalSize::new(1, 1)).is_none());
    }
}
