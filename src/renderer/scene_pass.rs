use std::mem;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::asset::Assets;
use crate::renderer::mesh::check_index_range;
use crate::renderer::shadow::{ShadowTarget, DRAW_UNIFORM_STRIDE, MAX_DRAWS};
use crate::renderer::{GpuContext, Vertex};
use crate::scene::Drawable;

/// Per-frame constants shared by every draw in the scene pass.
///
/// `shadow_params.x` carries the depth comparison bias; the remaining lanes
/// are padding kept for alignment.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FrameUniforms {
    light_space_matrix: [[f32; 4]; 4],
    light_position: [f32; 4],
    light_intensity: [f32; 4],
    shadow_params: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ObjectUniforms {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
}

/// The lit forward pass. Samples the shadow map produced by the depth pass
/// and shades with a single positional light.
pub struct ScenePass {
    pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    materials: Vec<wgpu::BindGroup>,
    shadow_bind_group: wgpu::BindGroup,
}

impl ScenePass {
    pub fn new(gpu: &GpuContext, shadow: &ShadowTarget) -> Self {
        let device = &gpu.device;

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FrameUniformLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(mem::size_of::<FrameUniforms>() as u64),
                },
                count: None,
            }],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ObjectUniformLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(mem::size_of::<ObjectUniforms>() as u64),
                },
                count: None,
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("MaterialLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // Depth32Float is not filterable, so the shadow map gets a
        // non-filtering sampler and the shader does the comparison itself.
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ShadowLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FrameUniformBuffer"),
            size: mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("FrameUniformBindGroup"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let object_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ObjectUniformBuffer"),
            size: DRAW_UNIFORM_STRIDE * MAX_DRAWS,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ObjectUniformBindGroup"),
            layout: &object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &object_buffer,
                    offset: 0,
                    size: NonZeroU64::new(mem::size_of::<ObjectUniforms>() as u64),
                }),
            }],
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ShadowSampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ShadowBindGroup"),
            layout: &shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(shadow.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("SceneShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/scene.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ScenePipelineLayout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &material_layout, &shadow_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ScenePipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Backdrop walls are viewed from inside the box.
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: gpu.depth_format(),
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
            frame_buffer,
            frame_bind_group,
            object_buffer,
            object_bind_group,
            material_layout,
            materials: Vec::new(),
            shadow_bind_group,
        }
    }

    /// Creates material bind groups for textures loaded since the last call.
    /// The asset store is append-only so existing groups stay valid.
    pub fn sync_materials(&mut self, device: &wgpu::Device, assets: &Assets) {
        while let Some(texture) = assets.textures.get_by_index(self.materials.len()) {
            self.materials
                .push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("MaterialBindGroup"),
                    layout: &self.material_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                }));
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        assets: &Assets,
        drawables: &[Drawable],
        camera_view_proj: Mat4,
        light_view_proj: Mat4,
        light_position: Vec3,
        light_intensity: Vec3,
        shadow_bias: f32,
    ) -> u32 {
        let frame = FrameUniforms {
            light_space_matrix: light_view_proj.to_cols_array_2d(),
            light_position: light_position.extend(1.0).to_array(),
            light_intensity: light_intensity.extend(0.0).to_array(),
            shadow_params: [shadow_bias, 0.0, 0.0, 0.0],
        };
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ScenePass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.0,
                        g: 0.0,
                        b: 0.0,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
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
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        pass.set_bind_group(3, &self.shadow_bind_group, &[]);

        let mut submitted = 0u32;
        for drawable in drawables {
            if submitted as u64 >= MAX_DRAWS {
                log::warn!("Scene pass draw budget exhausted; skipping remaining drawables");
                break;
            }
            if drawable.index_count == 0 {
                continue;
            }
            let Some(mesh) = assets.meshes.get(drawable.mesh) else {
                log::warn!("Skipping {:?}: invalid mesh handle", drawable.name);
                continue;
            };
            let Some(material) = self.materials.get(drawable.texture.index()) else {
                log::warn!("Skipping {:?}: invalid texture handle", drawable.name);
                continue;
            };
            if let Err(err) =
                check_index_range(mesh.index_count(), drawable.first_index, drawable.index_count)
            {
                log::warn!("Skipping {:?}: {err}", drawable.name);
                continue;
            }

            let object = ObjectUniforms {
                mvp: (camera_view_proj * drawable.model).to_cols_array_2d(),
                model: drawable.model.to_cols_array_2d(),
            };
            let offset = submitted as u64 * DRAW_UNIFORM_STRIDE;
            queue.write_buffer(&self.object_buffer, offset, bytemuck::bytes_of(&object));

            pass.set_bind_group(1, &self.object_bind_group, &[offset as u32]);
            pass.set_bind_group(2, material, &[]);
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
    use crate::error::Error;

    #[test]
    fn uniform_blocks_are_tightly_packed() {
        assert_eq!(mem::size_of::<FrameUniforms>(), 112);
        assert_eq!(mem::size_of::<ObjectUniforms>(), 128);
        assert!(mem::size_of::<ObjectUniforms>() as u64 <= DRAW_UNIFORM_STRIDE);
    }

    // Per-draw failures are skips, never frame aborts; the range check is
    // the only error source the pass consults.
    #[test]
    fn index_range_failure_is_a_draw_error() {
        let err = check_index_range(96, 90, 12).unwrap_err();
        assert!(matches!(err, Error::Draw(_)));
    }
}
