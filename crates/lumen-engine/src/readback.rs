//! Copies GPU textures back to host memory.
//!
//! Blocking; meant for tests and PNG export, never for the render loop.

use std::sync::mpsc;

use crate::error::{EngineError, Result};
use crate::texture::ImageData;

const BYTES_PER_PIXEL: u32 = 4;

/// Reads the first mip level of `texture` as tightly packed RGBA8.
///
/// Supports 8-bit RGBA and BGRA formats; BGRA is swizzled to RGBA.
pub fn read_texture(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Result<ImageData> {
    let swizzle = match texture.format() {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        other => {
            return Err(EngineError::Readback(format!("unsupported format {other:?}")));
        }
    };

    let (width, height) = (texture.width(), texture.height());
    let padded_row = padded_bytes_per_row(width);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lumen readback buffer"),
        size: u64::from(padded_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("lumen readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| EngineError::Readback(e.to_string()))?;

    rx.recv()
        .map_err(|e| EngineError::Readback(e.to_string()))?
        .map_err(|e| EngineError::Readback(e.to_string()))?;

    let rgba = {
        let mapped = slice.get_mapped_range();
        let mut rgba = strip_row_padding(&mapped, width, height, padded_row);
        if swizzle {
            for px in rgba.chunks_exact_mut(BYTES_PER_PIXEL as usize) {
                px.swap(0, 2);
            }
        }
        rgba
    };
    buffer.unmap();

    ImageData::new(width, height, rgba)
        .ok_or_else(|| EngineError::Readback(format!("empty texture {width}x{height}")))
}

/// Row pitch rounded up to wgpu's copy alignment.
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

fn strip_row_padding(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row = (width * BYTES_PER_PIXEL) as usize;
    let mut out = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(padded_row as usize).take(height as usize) {
        out.extend_from_slice(&chunk[..row]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pad_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(600), 2560);
    }

    #[test]
    fn padding_is_dropped_per_row() {
        let padded = 8;
        let data = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0];
        assert_eq!(strip_row_padding(&data, 1, 2, padded), [1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
