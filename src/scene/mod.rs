mod camera;
mod city;
mod drawable;
mod light;

pub use camera::Camera;
pub use city::{city_mesh, prop_mesh, CityMesh, IndexRange};
pub use drawable::Drawable;
pub use light::Light;

use glam::Mat4;

use crate::asset::Assets;
use crate::error::Error;
use crate::input::{CameraController, FrameInput};
use crate::renderer::{Mesh, Texture};
use crate::settings::RenderSettings;

/// Degrees per second; matches a quarter turn every fifty seconds, slow
/// enough that the moving shadow reads as drift rather than spin.
const PROP_SPIN_DEG_PER_SEC: f32 = 7.2;

/// Everything the renderer draws plus the state that advances it: the
/// static city, the one animated prop, the camera and its controller, and
/// the light. Built once at startup.
pub struct Scene {
    pub assets: Assets,
    pub drawables: Vec<Drawable>,
    pub camera: Camera,
    pub light: Light,
    controller: CameraController,
    prop_index: usize,
    prop_angle_deg: f32,
}

impl Scene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        settings: &RenderSettings,
    ) -> Result<Self, Error> {
        let mut assets = Assets::new();

        let city = city_mesh();
        let city_handle =
            assets
                .meshes
                .insert(Mesh::new(device, "City", &city.vertices, &city.indices)?);
        let (prop_vertices, prop_indices) = prop_mesh();
        let prop_handle =
            assets
                .meshes
                .insert(Mesh::new(device, "Prop", &prop_vertices, &prop_indices)?);

        // Missing files fall back to a placeholder checkerboard inside
        // `open`, so a bad working directory degrades instead of aborting.
        let road = assets.textures.insert(Texture::open(device, queue, "texture/road.png"));
        let star = assets.textures.insert(Texture::open(device, queue, "texture/star.png"));
        let building1 =
            assets.textures.insert(Texture::open(device, queue, "texture/building1.png"));
        let building2 =
            assets.textures.insert(Texture::open(device, queue, "texture/building2.png"));
        let saucer = assets.textures.insert(Texture::open(device, queue, "texture/ufo.png"));

        let drawables = vec![
            Drawable::new("ground", city_handle, road, city.ground.first, city.ground.count),
            Drawable::new(
                "backdrop",
                city_handle,
                star,
                city.backdrop.first,
                city.backdrop.count,
            ),
            Drawable::new(
                "building_a",
                city_handle,
                building1,
                city.building_a.first,
                city.building_a.count,
            ),
            Drawable::new(
                "building_b",
                city_handle,
                building2,
                city.building_b.first,
                city.building_b.count,
            ),
            Drawable::new("prop", prop_handle, saucer, 0, prop_indices.len() as u32),
        ];
        let prop_index = drawables.len() - 1;

        let light = Light {
            fov_y_radians: settings.light_fov_deg.to_radians(),
            near: settings.light_near,
            far: settings.light_far,
            ..Light::default()
        };

        Ok(Self {
            assets,
            drawables,
            camera: Camera::default(),
            light,
            controller: CameraController::new(),
            prop_index,
            prop_angle_deg: 0.0,
        })
    }

    /// Advances one frame: camera from input, prop rotation from time.
    pub fn update(&mut self, input: &FrameInput, dt: f32) {
        self.controller.apply(input, dt, &mut self.camera);

        self.prop_angle_deg += PROP_SPIN_DEG_PER_SEC * dt;
        if self.prop_angle_deg >= 360.0 {
            self.prop_angle_deg -= 360.0;
        }
        self.drawables[self.prop_index].model =
            Mat4::from_rotation_y(self.prop_angle_deg.to_radians());
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    // Device-free model of the prop animation in `Scene::update`.
    fn advance(angle: f32, dt: f32) -> f32 {
        let mut next = angle + PROP_SPIN_DEG_PER_SEC * dt;
        if next >= 360.0 {
            next -= 360.0;
        }
        next
    }

    #[test]
    fn prop_rotation_wraps_at_a_full_turn() {
        let mut angle = 0.0;
        // 51 simulated seconds at 10 Hz passes one full revolution.
        for _ in 0..510 {
            angle = advance(angle, 0.1);
            assert!((0.0..360.0).contains(&angle), "{angle}");
        }
    }

    #[test]
    fn prop_spin_modifies_only_rotation() {
        let model = Mat4::from_rotation_y(45f32.to_radians());
        // A pure Y rotation never moves points off their horizontal plane.
        let p = model.transform_point3(glam::Vec3::new(2200.0, 1600.0, 0.0));
        assert!((p.y - 1600.0).abs() < 1e-3);
    }
}
