use std::sync::mpsc;

use half::f16;

use crate::coords::ImageSize;
use crate::device::GpuDevice;
use crate::error::{SketchError, SketchResult};

/// Copies `texture` into a mappable buffer, waits for the GPU, and returns
/// straight RGBA8 bytes with a top-left origin and tightly packed rows.
///
/// Pending commands are submitted first so the copy observes every draw
/// recorded before the call.
pub(crate) fn read_rgba8(
    device: &GpuDevice,
    texture: &wgpu::Texture,
    size: ImageSize,
) -> SketchResult<Vec<u8>> {
    let format = texture.format();
    let texel_size = format
        .block_copy_size(None)
        .ok_or_else(|| SketchError::Readback(format!("{format:?} cannot be copied")))?;

    let unpadded_row = size.width() * texel_size;
    let padded_row = unpadded_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("easel readback buffer"),
        size: padded_row as u64 * size.height() as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    device.record(|encoder| {
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
                    rows_per_image: Some(size.height()),
                },
            },
            size.extent(),
        );
    });
    device.submit();

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.wait_idle()?;
    rx.recv()
        .map_err(|_| SketchError::Readback("map callback was dropped".into()))?
        .map_err(|e| SketchError::Readback(format!("buffer map failed: {e}")))?;

    let mut out = Vec::with_capacity(size.pixel_count() * 4);
    {
        let data = slice.get_mapped_range();
        for row in data.chunks_exact(padded_row as usize) {
            let row = &row[..unpadded_row as usize];
            for texel in row.chunks_exact(texel_size as usize) {
                out.extend_from_slice(&texel_to_rgba8(format, texel)?);
            }
        }
    }
    buffer.unmap();

    Ok(out)
}

/// Decodes one texel of `format` to straight RGBA8.
///
/// Missing channels read as `0`, missing alpha as `1`.
pub(crate) fn texel_to_rgba8(format: wgpu::TextureFormat, texel: &[u8]) -> SketchResult<[u8; 4]> {
    use wgpu::TextureFormat as F;

    let rgba = |c: &[f32]| -> [u8; 4] {
        let get = |i: usize, default: f32| c.get(i).copied().unwrap_or(default);
        [
            quantize(get(0, 0.0)),
            quantize(get(1, 0.0)),
            quantize(get(2, 0.0)),
            quantize(get(3, 1.0)),
        ]
    };

    let px = match format {
        F::Rgba8Unorm | F::Rgba8UnormSrgb => [texel[0], texel[1], texel[2], texel[3]],
        F::Bgra8Unorm | F::Bgra8UnormSrgb => [texel[2], texel[1], texel[0], texel[3]],
        F::Rg8Unorm => [texel[0], texel[1], 0, 255],
        F::R8Unorm => [texel[0], 0, 0, 255],
        F::R16Float | F::Rg16Float | F::Rgba16Float => {
            let c: Vec<f32> = texel
                .chunks_exact(2)
                .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
                .collect();
            rgba(&c)
        }
        F::R32Float | F::Rg32Float | F::Rgba32Float => {
            let c: Vec<f32> = texel
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            rgba(&c)
        }
        other => {
            return Err(SketchError::Readback(format!(
                "readback of {other:?} is not supported"
            )));
        }
    };
    Ok(px)
}

#[inline]
fn quantize(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn rgba8_passes_through() {
        assert_eq!(texel_to_rgba8(F::Rgba8Unorm, &[1, 2, 3, 4]).unwrap(), [1, 2, 3, 4]);
    }

    #[test]
    fn bgra_is_swizzled() {
        assert_eq!(texel_to_rgba8(F::Bgra8Unorm, &[1, 2, 3, 4]).unwrap(), [3, 2, 1, 4]);
    }

    #[test]
    fn half_floats_are_quantized() {
        let mut texel = Vec::new();
        for v in [0.2f32, 0.4, 0.8, 1.0] {
            texel.extend_from_slice(&f16::from_f32(v).to_le_bytes());
        }
        let px = texel_to_rgba8(F::Rgba16Float, &texel).unwrap();
        assert_eq!(px, [51, 102, 204, 255]);
    }

    #[test]
    fn single_channel_fills_missing_components() {
        let texel = 0.5f32.to_le_bytes();
        assert_eq!(texel_to_rgba8(F::R32Float, &texel).unwrap(), [128, 0, 0, 255]);
        assert_eq!(texel_to_rgba8(F::Rg8Unorm, &[9, 7]).unwrap(), [9, 7, 0, 255]);
    }

    #[test]
    fn out_of_range_values_clamp() {
        let mut texel = Vec::new();
        for v in [-1.0f32, 2.0, f32::NAN, 0.0] {
            texel.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(texel_to_rgba8(F::Rgba32Float, &texel).unwrap(), [0, 255, 0, 0]);
    }
}
