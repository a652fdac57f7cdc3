use glam::Mat4;

use crate::asset::Handle;
use crate::renderer::{Mesh, Texture};

/// One renderable object: a mesh (or a sub-range of a composite mesh), a
/// model transform, and the diffuse texture the scene pass samples.
///
/// Both passes consume drawables; the depth pass ignores the texture and
/// only casts those flagged `casts_shadow`.
pub struct Drawable {
    pub name: &'static str,
    pub mesh: Handle<Mesh>,
    pub texture: Handle<Texture>,
    pub model: Mat4,
    /// `first_index..first_index + index_count` into the mesh's index
    /// buffer; lets one composite mesh draw with per-face-group textures.
    pub first_index: u32,
    pub index_count: u32,
    pub casts_shadow: bool,
}

impl Drawable {
    pub fn new(
        name: &'static str,
        mesh: Handle<Mesh>,
        texture: Handle<Texture>,
        first_index: u32,
        index_count: u32,
    ) -> Self {
        Self {
            name,
            mesh,
            texture,
            model: Mat4::IDENTITY,
            first_index,
            index_count,
            casts_shadow: true,
        }
    }

    pub fn with_model(mut self, model: Mat4) -> Self {
        self.model = model;
        self
    }
}
