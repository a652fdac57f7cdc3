use std::sync::mpsc;

use crate::error::Error;
use crate::renderer::shadow::ShadowTarget;
use crate::renderer::shadow_math::linearize_depth;

/// Copies the shadow map back to the CPU and converts it to a grayscale
/// image. Stored perspective depth is heavily front-loaded, so values are
/// linearized against the light frustum before the 8-bit quantize; without
/// that the whole map renders as near-white.
pub fn capture_depth(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    shadow: &ShadowTarget,
    near: f32,
    far: f32,
) -> Result<image::GrayImage, Error> {
    let (width, height) = shadow.size();
    let row_bytes = width as u64 * 4;
    let padded_row_bytes =
        row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("DepthReadback"),
        size: padded_row_bytes * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("DepthReadbackEncoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: shadow.texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::DepthOnly,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row_bytes as u32),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|err| Error::Draw(format!("poll failed during depth readback: {err:?}")))?;
    rx.recv()
        .map_err(|_| Error::Draw("depth readback callback dropped".into()))?
        .map_err(|err| Error::Draw(format!("depth readback map failed: {err:?}")))?;

    let data = slice.get_mapped_range();
    let mut image = image::GrayImage::new(width, height);
    for y in 0..height {
        let row_start = (y as u64 * padded_row_bytes) as usize;
        let row = &data[row_start..row_start + row_bytes as usize];
        for x in 0..width {
            let offset = x as usize * 4;
            let depth = f32::from_le_bytes([
                row[offset],
                row[offset + 1],
                row[offset + 2],
                row[offset + 3],
            ]);
            let linear = linearize_depth(depth, near, far);
            image.put_pixel(x, y, image::Luma([(linear * 255.0) as u8]));
        }
    }
    drop(data);
    buffer.unmap();

    Ok(image)
}
