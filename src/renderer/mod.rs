mod context;
mod frame;
mod mesh;
pub mod readback;
mod scene_pass;
mod shadow;
pub mod shadow_math;
mod texture;
mod vertex;

pub use context::{Depth, GpuContext};
pub use frame::{plan_frame, FramePass, FrameTrace, Renderer};
pub use mesh::Mesh;
pub use shadow::{DepthPass, ShadowTarget, SHADOW_FORMAT};
pub use texture::Texture;
pub use vertex::{v, Vertex};
