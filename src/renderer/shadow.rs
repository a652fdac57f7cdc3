use std::mem;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::asset::Assets;
use crate::error::Error;
use crate::renderer::mesh::check_index_range;
use crate::renderer::Vertex;
use crate::scene::Drawable;

pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform-buffer slots are dynamic-offset indexed; 256 is the guaranteed
/// minimum offset alignment.
pub(crate) const DRAW_UNIFORM_STRIDE: u64 = 256;
pub(crate) const MAX_DRAWS: u64 = 64;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DepthDrawUniform {
    /// `lightSpaceMatrix * model` for one drawable.
    mvp: [[f32; 4]; 4],
}

/// The offscreen depth-only render target the depth pass writes and the
/// scene pass samples. No color attachment exists anywhere near it.
pub struct ShadowTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl ShadowTarget {
    /// Allocates the depth texture. The resolution is fixed for the process
    /// lifetime; callers pass the *physical* framebuffer size (or the
    /// configured override), never the logical window size.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, Error> {
        check_target_size(width, height)?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ShadowMap"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::info!("Created {width}x{height} shadow map");

        Ok(Self {
            _texture: texture,
            view,
            width,
            height,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self._texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// The size invariant [`ShadowTarget::new`] enforces before allocating:
/// a zero-extent map is a configuration error, not a silent degenerate
/// texture.
pub fn check_target_size(width: u32, height: u32) -> Result<(), Error> {
    if width == 0 || height == 0 {
        return Err(Error::Config(format!(
            "shadow map size must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Renders shadow casters into the [`ShadowTarget`] from the light's point
/// of view. Position-only vertex fetch, no fragment stage at all: the
/// pipeline is structurally incapable of writing color.
pub struct DepthPass {
    pipeline: wgpu::RenderPipeline,
    draw_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl DepthPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("DepthDrawLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(mem::size_of::<DepthDrawUniform>() as u64),
                },
                count: None,
            }],
        });

        let draw_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DepthDrawBuffer"),
            size: DRAW_UNIFORM_STRIDE * MAX_DRAWS,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("DepthDrawBindGroup"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_buffer,
                    offset: 0,
                    size: NonZeroU64::new(mem::size_of::<DepthDrawUniform>() as u64),
                }),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("DepthShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/depth.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("DepthPipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("DepthPipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::position_only_layout()],
                compilation_options: Default::default(),
            },
            // No fragment stage, no color attachments: depth writes only.
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: SHADOW_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            draw_buffer,
            bind_group,
        }
    }

    /// Records the depth pass: one indexed draw per shadow caster, each with
    /// its own `lightSpaceMatrix * model` slot in the draw buffer. Returns
    /// the number of draws submitted; bad drawables are skipped with a
    /// warning, an empty index range is a silent no-op.
    pub fn record(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &ShadowTarget,
        assets: &Assets,
        drawables: &[Drawable],
        light_view_proj: Mat4,
    ) -> u32 {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("DepthPass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);

        let mut submitted = 0u32;
        for drawable in drawables.iter().filter(|d| d.casts_shadow) {
            if submitted as u64 >= MAX_DRAWS {
                log::warn!("Depth pass draw budget exhausted; skipping remaining casters");
                break;
            }
            if drawable.index_count == 0 {
                continue;
            }
            let Some(mesh) = assets.meshes.get(drawable.mesh) else {
                log::warn!("Skipping shadow caster {:?}: invalid mesh handle", drawable.name);
                continue;
            };
            if let Err(err) =
                check_index_range(mesh.index_count(), drawable.first_index, drawable.index_count)
            {
                log::warn!("Skipping shadow caster {:?}: {err}", drawable.name);
                continue;
            }

            let uniform = DepthDrawUniform {
                mvp: (light_view_proj * drawable.model).to_cols_array_2d(),
            };
            let offset = submitted as u64 * DRAW_UNIFORM_STRIDE;
            queue.write_buffer(&self.draw_buffer, offset, bytemuck::bytes_of(&uniform));

            pass.set_bind_group(0, &self.bind_group, &[offset as u32]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
            pass.set_index_buffer(mesh.index_buffer().slice(..), mesh.index_format());
            pass.draw_indexed(
                drawable.first_index..drawable.first_index + drawable.index_count,
                0,
                0..1,
            );
            submitted += 1;
        }

        submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_uniform_fits_its_stride() {
        assert!(mem::size_of::<DepthDrawUniform>() as u64 <= DRAW_UNIFORM_STRIDE);
        assert_eq!(mem::size_of::<DepthDrawUniform>(), 64);
    }

    #[test]
    fn zero_extent_target_is_a_config_error() {
        assert!(matches!(check_target_size(0, 768), Err(Error::Config(_))));
        assert!(matches!(check_target_size(1024, 0), Err(Error::Config(_))));
        assert!(check_target_size(1024, 768).is_ok());
    }
}
