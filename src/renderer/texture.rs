use std::path::Path;

/// A sampled color texture. Loading never fails hard: a broken or missing
/// image yields a loud placeholder so the frame loop keeps running.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Decode an image file. On any failure this logs and substitutes the
    /// magenta/black checkerboard placeholder.
    pub fn open(device: &wgpu::Device, queue: &wgpu::Queue, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match image::open(path) {
            Ok(img) => {
                log::info!("Loaded texture {:?}", path);
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                Self::from_bytes(device, queue, &rgba, width, height, path.to_str())
            }
            Err(err) => {
                log::warn!("Failed to load texture {:?} ({}); using placeholder", path, err);
                Self::placeholder(device, queue)
            }
        }
    }

    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label,
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Procedural checkerboard.
    pub fn checkerboard(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: u32,
        checker_size: u32,
        color1: [u8; 4],
        color2: [u8; 4],
        label: Option<&str>,
    ) -> Self {
        let mut pixels = vec![0u8; (size * size * 4) as usize];
        for y in 0..size {
            for x in 0..size {
                let odd = ((x / checker_size) + (y / checker_size)) % 2 == 1;
                let color = if odd { color2 } else { color1 };
                let idx = ((y * size + x) * 4) as usize;
                pixels[idx..idx + 4].copy_from_slice(&color);
            }
        }
        Self::from_bytes(device, queue, &pixels, size, size, label)
    }

    /// The visibly-broken substitute for assets that failed to load.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::checkerboard(
            device,
            queue,
            64,
            8,
            [255, 0, 255, 255],
            [0, 0, 0, 255],
            Some("MissingTexture"),
        )
    }

    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_bytes(device, queue, &[255, 255, 255, 255], 1, 1, Some("White"))
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn checker_pattern_alternates() {
        // The pattern logic, without a device: cell parity decides color.
        let odd = |x: u32, y: u32, cell: u32| ((x / cell) + (y / cell)) % 2 == 1;
        assert!(!odd(0, 0, 8));
        assert!(odd(8, 0, 8));
        assert!(odd(0, 8, 8));
        assert!(!odd(8, 8, 8));
    }
}
