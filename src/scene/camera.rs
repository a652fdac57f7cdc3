use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }
}

impl Default for Camera {
    fn default() -> Self {
        // Street-level start between the two buildings, looking down -Z.
        Self {
            eye: Vec3::new(-278.0, 350.0, 800.0),
            target: Vec3::new(-278.0, 350.0, 0.0),
            up: Vec3::Y,
            fov_y_radians: 65f32.to_radians(),
            near: 10.0,
            far: 10_500.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_proj_round_trips_a_world_point() {
        let cam = Camera::default();
        let vp = cam.view_proj(16.0 / 9.0);
        let world = Vec3::new(-278.0, 350.0, -500.0);
        let clip = vp * world.extend(1.0);
        let recovered = vp.inverse() * clip;
        let recovered = recovered.truncate() / recovered.w;
        // World units; the scene spans thousands of them.
        assert!(recovered.abs_diff_eq(world, 0.1), "{recovered:?}");
    }

    #[test]
    fn default_frustum_is_non_degenerate() {
        let cam = Camera::default();
        assert!(cam.near > 0.0 && cam.near < cam.far);
    }
}
