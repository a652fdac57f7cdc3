use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey, PhysicalKey},
    window::{Window, WindowId},
};

use crate::input::InputState;
use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::settings::RenderSettings;

const DEPTH_DUMP_PATH: &str = "depth_light.png";

pub struct App {
    settings: RenderSettings,
    renderer: Option<Renderer>,
    window: Option<Window>,
    window_id: Option<WindowId>,
    scene: Option<Scene>,
    input: InputState,
    last_frame: Instant,
}

impl App {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            renderer: None,
            window: None,
            window_id: None,
            scene: None,
            input: InputState::default(),
            last_frame: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let size = winit::dpi::PhysicalSize::new(
            self.settings.resolution.width,
            self.settings.resolution.height,
        );
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("wgpu city")
                .with_inner_size(size),
        ) {
            Ok(window) => window,
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };
        let id = window.id();

        // Setup failures here are fatal: nothing has been presented yet and
        // the frame loop cannot run without a device.
        let renderer = match pollster::block_on(Renderer::new(&window, self.settings.clone())) {
            Ok(renderer) => renderer,
            Err(err) => {
                log::error!("Failed to initialize renderer: {err}");
                event_loop.exit();
                return;
            }
        };
        let scene = match Scene::new(renderer.device(), renderer.queue(), &self.settings) {
            Ok(scene) => scene,
            Err(err) => {
                log::error!("Failed to build scene: {err}");
                event_loop.exit();
                return;
            }
        };

        self.window = Some(window);
        self.window_id = Some(id);
        self.renderer = Some(renderer);
        self.scene = Some(scene);
        self.last_frame = Instant::now();

        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.mouse_moved(dx as f32, dy as f32);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }

        let (Some(renderer), Some(scene)) = (self.renderer.as_mut(), self.scene.as_mut()) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                renderer.resize(size);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(w) = &self.window {
                    renderer.resize(w.inner_size());
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                self.input.key(code, state);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32();
                self.last_frame = now;

                let frame_input = self.input.take_frame();
                let capture = frame_input.capture_depth;
                scene.update(&frame_input, dt);

                match renderer.render_frame(scene, capture) {
                    Ok(trace) => {
                        if let Some(img) = trace.capture {
                            match img.save(DEPTH_DUMP_PATH) {
                                Ok(()) => log::info!("Saved shadow map to {DEPTH_DUMP_PATH}"),
                                Err(err) => log::warn!("Failed to save depth dump: {err}"),
                            }
                        }
                    }
                    Err(err) if err.is_fatal() => {
                        log::error!("Rendering failed: {err}");
                        event_loop.exit();
                    }
                    Err(err) => {
                        log::warn!("Frame abandoned: {err}");
                    }
                }

                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }
            _ => {}
        }
    }
}
