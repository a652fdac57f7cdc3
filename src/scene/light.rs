use glam::{Mat4, Vec3};

/// The single shadow-casting light. Positioned like a street lamp high over
/// the scene, its frustum is what the shadow map covers.
#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Light {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
    }

    /// The light-space matrix: identical for the depth pass and for the
    /// scene pass's reprojection of fragments.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }

    /// Radiometric RGB intensity from a fixed spectral mixture of three
    /// wavelength bands. An implementation constant, not runtime state.
    pub fn intensity() -> Vec3 {
        const WAVE_500: Vec3 = Vec3::new(0.0, 255.0, 146.0);
        const WAVE_600: Vec3 = Vec3::new(255.0, 190.0, 0.0);
        const WAVE_700: Vec3 = Vec3::new(205.0, 0.0, 0.0);
        12_000.0 * (8.0 * WAVE_500 + 15.6 * WAVE_600 + 18.4 * WAVE_700)
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(-1000.0, 1800.0, -275.0),
            target: Vec3::new(-1000.0, 0.0, -275.0),
            // The light looks straight down, so Y is unusable as up.
            up: Vec3::Z,
            fov_y_radians: 100f32.to_radians(),
            near: 10.0,
            far: 7500.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_mixture_matches_the_band_weights() {
        let i = Light::intensity();
        assert_eq!(i.x, 12_000.0 * (15.6 * 255.0 + 18.4 * 205.0));
        assert_eq!(i.y, 12_000.0 * (8.0 * 255.0 + 15.6 * 190.0));
        assert_eq!(i.z, 12_000.0 * 8.0 * 146.0);
    }

    #[test]
    fn straight_down_light_has_valid_view() {
        let light = Light::default();
        let vp = light.view_proj(1.0);
        // The look target must land at the center of the map.
        let clip = vp * light.target.extend(1.0);
        assert!(clip.w > 0.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }
}
