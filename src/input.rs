//! Keyboard/mouse accumulation and the per-frame input snapshot.
//!
//! Window callbacks only mutate [`InputState`]; once per frame the render
//! loop takes an immutable [`FrameInput`] snapshot and hands it to the
//! scene. Nothing downstream reads live input state mid-frame.

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

use crate::scene::Camera;

const MOUSE_SENSITIVITY: f32 = 0.1;
const MOVE_SPEED: f32 = 1500.0;
const PITCH_LIMIT_DEG: f32 = 89.0;

#[derive(Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    look_delta: Vec2,
    reset_requested: bool,
    capture_requested: bool,
}

/// Immutable snapshot consumed exactly once per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    /// Forward/backward (+1 forward) and strafe (+1 right) axes.
    pub move_axis: Vec2,
    /// Accumulated mouse movement since the previous frame, in pixels.
    pub look_delta: Vec2,
    pub reset: bool,
    pub capture_depth: bool,
}

impl InputState {
    pub fn key(&mut self, code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if code == KeyCode::KeyR {
                    self.reset_requested = true;
                }
                if code == KeyCode::Space {
                    self.capture_requested = true;
                }
                self.held.insert(code);
            }
            ElementState::Released => {
                self.held.remove(&code);
            }
        }
    }

    pub fn mouse_moved(&mut self, dx: f32, dy: f32) {
        self.look_delta += Vec2::new(dx, dy);
    }

    fn axis(&self, pos: &[KeyCode], neg: &[KeyCode]) -> f32 {
        let held = |codes: &[KeyCode]| codes.iter().any(|c| self.held.contains(c));
        (held(pos) as i32 - held(neg) as i32) as f32
    }

    /// Drains the one-shot state (mouse delta, key taps) into a snapshot.
    pub fn take_frame(&mut self) -> FrameInput {
        let frame = FrameInput {
            move_axis: Vec2::new(
                self.axis(
                    &[KeyCode::KeyW, KeyCode::ArrowUp],
                    &[KeyCode::KeyS, KeyCode::ArrowDown],
                ),
                self.axis(
                    &[KeyCode::KeyD, KeyCode::ArrowRight],
                    &[KeyCode::KeyA, KeyCode::ArrowLeft],
                ),
            ),
            look_delta: self.look_delta,
            reset: self.reset_requested,
            capture_depth: self.capture_requested,
        };
        self.look_delta = Vec2::ZERO;
        self.reset_requested = false;
        self.capture_requested = false;
        frame
    }
}

/// First-person camera driver: yaw/pitch from the mouse, planar WASD
/// movement (height stays fixed while walking).
pub struct CameraController {
    yaw_deg: f32,
    pitch_deg: f32,
}

impl CameraController {
    pub fn new() -> Self {
        // Facing -Z, matching the default camera.
        Self {
            yaw_deg: -90.0,
            pitch_deg: 0.0,
        }
    }

    pub fn apply(&mut self, input: &FrameInput, dt: f32, camera: &mut Camera) {
        if input.reset {
            *camera = Camera::default();
            self.yaw_deg = -90.0;
            self.pitch_deg = 0.0;
            return;
        }

        self.yaw_deg += input.look_delta.x * MOUSE_SENSITIVITY;
        self.pitch_deg = (self.pitch_deg - input.look_delta.y * MOUSE_SENSITIVITY)
            .clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);

        let (yaw, pitch) = (self.yaw_deg.to_radians(), self.pitch_deg.to_radians());
        let front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();

        let planar_front = Vec3::new(front.x, 0.0, front.z).normalize_or_zero();
        let right = planar_front.cross(Vec3::Y).normalize_or_zero();
        let step = (planar_front * input.move_axis.x + right * input.move_axis.y)
            * MOVE_SPEED
            * dt;

        camera.eye += step;
        camera.target = camera.eye + front;
    }

    #[cfg(test)]
    fn pitch(&self) -> f32 {
        self.pitch_deg
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}
