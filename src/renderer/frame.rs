use winit::window::Window;

use crate::error::Error;
use crate::renderer::readback;
use crate::renderer::scene_pass::ScenePass;
use crate::renderer::shadow::{DepthPass, ShadowTarget};
use crate::renderer::GpuContext;
use crate::scene::Scene;
use crate::settings::RenderSettings;

/// One step of a rendered frame, in submission order. Kept as data so the
/// ordering contract is testable without a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePass {
    Depth,
    Scene,
    Capture,
}

/// What a call to [`Renderer::render_frame`] actually did.
#[derive(Debug, Default)]
pub struct FrameTrace {
    pub passes: Vec<FramePass>,
    pub depth_draws: u32,
    pub scene_draws: u32,
    pub capture: Option<image::GrayImage>,
}

impl FrameTrace {
    fn skipped() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> bool {
        !self.passes.is_empty()
    }
}

/// Pass schedule for one frame; [`Renderer::render_frame`] executes exactly
/// this sequence. The depth pass always runs before the scene pass; a
/// capture, when requested, reads the shadow map the frame just wrote, so
/// it comes last.
pub fn plan_frame(capture: bool) -> Vec<FramePass> {
    let mut passes = vec![FramePass::Depth, FramePass::Scene];
    if capture {
        passes.push(FramePass::Capture);
    }
    passes
}

pub struct Renderer {
    pub gpu: GpuContext,
    shadow: ShadowTarget,
    depth_pass: DepthPass,
    scene_pass: ScenePass,
    settings: RenderSettings,
}

impl Renderer {
    pub async fn new(window: &Window, settings: RenderSettings) -> Result<Self, Error> {
        let gpu = GpuContext::new(window).await?;

        let (shadow_w, shadow_h) = if settings.shadow_map_size == 0 {
            (gpu.config.width, gpu.config.height)
        } else {
            (settings.shadow_map_size, settings.shadow_map_size)
        };
        let shadow = ShadowTarget::new(&gpu.device, shadow_w, shadow_h)?;

        let depth_pass = DepthPass::new(&gpu.device);
        let scene_pass = ScenePass::new(&gpu, &shadow);

        Ok(Self {
            gpu,
            shadow,
            depth_pass,
            scene_pass,
            settings,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.gpu.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.gpu.queue
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        // The shadow target keeps its creation-time resolution.
        self.gpu.resize(new_size);
    }

    /// Renders one frame: depth pass into the shadow map, then the lit scene
    /// pass into the surface, then an optional depth capture. Transient
    /// surface losses skip the frame; only device loss is fatal.
    pub fn render_frame(&mut self, scene: &Scene, capture: bool) -> Result<FrameTrace, Error> {
        let surface_texture = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                let size = winit::dpi::PhysicalSize::new(self.gpu.config.width, self.gpu.config.height);
                self.gpu.resize(size);
                return Ok(FrameTrace::skipped());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                return Ok(FrameTrace::skipped());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(Error::Init("surface out of memory".into()));
            }
            Err(err) => {
                log::warn!("Surface error: {err}, skipping frame");
                return Ok(FrameTrace::skipped());
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.scene_pass.sync_materials(&self.gpu.device, &scene.assets);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("FrameEncoder"),
            });

        let plan = plan_frame(capture);
        let mut trace = FrameTrace::default();
        let (shadow_w, shadow_h) = self.shadow.size();
        let light_view_proj = scene.light.view_proj(shadow_w as f32 / shadow_h as f32);

        // Both render passes record into one encoder; the capture reads the
        // shadow map back through its own submission, so it runs after the
        // encoder below is flushed.
        for pass in &plan {
            match pass {
                FramePass::Depth => {
                    trace.depth_draws = self.depth_pass.record(
                        &self.gpu.queue,
                        &mut encoder,
                        &self.shadow,
                        &scene.assets,
                        &scene.drawables,
                        light_view_proj,
                    );
                    trace.passes.push(FramePass::Depth);
                }
                FramePass::Scene => {
                    trace.scene_draws = self.scene_pass.record(
                        &self.gpu.queue,
                        &mut encoder,
                        &surface_view,
                        &self.gpu.depth.view,
                        &scene.assets,
                        &scene.drawables,
                        scene.camera.view_proj(self.gpu.aspect_ratio()),
                        light_view_proj,
                        scene.light.position,
                        crate::scene::Light::intensity(),
                        self.settings.shadow_bias,
                    );
                    trace.passes.push(FramePass::Scene);
                }
                FramePass::Capture => {}
            }
        }

        self.gpu.queue.submit(Some(encoder.finish()));

        if plan.contains(&FramePass::Capture) {
            match readback::capture_depth(
                &self.gpu.device,
                &self.gpu.queue,
                &self.shadow,
                scene.light.near,
                scene.light.far,
            ) {
                Ok(img) => {
                    trace.capture = Some(img);
                    trace.passes.push(FramePass::Capture);
                }
                Err(err) => log::warn!("Depth capture failed: {err}"),
            }
        }

        surface_texture.present();
        Ok(trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_pass_precedes_scene_pass() {
        assert_eq!(plan_frame(false), vec![FramePass::Depth, FramePass::Scene]);
    }

    #[test]
    fn capture_follows_both_passes() {
        assert_eq!(
            plan_frame(true),
            vec![FramePass::Depth, FramePass::Scene, FramePass::Capture]
        );
    }

    #[test]
    fn skipped_frame_presents_nothing() {
        assert!(!FrameTrace::skipped().presented());
    }
}
