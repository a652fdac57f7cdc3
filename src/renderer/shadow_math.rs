//! CPU model of the fragment-stage shadow test.
//!
//! `shader/scene.wgsl` performs the same steps on the GPU; keeping a pure
//! copy here lets the projective comparison be tested without a device.

use glam::{Mat4, Vec3};

/// Transforms a world-space point into shadow-map texture space.
///
/// Returns `(u, v, depth)` with u/v in [0,1] over the map and depth in [0,1]
/// between the light's near and far planes. Points at or behind the light's
/// eye plane (clip w <= 0) have no meaningful projection and yield `None`.
pub fn shadow_uvz(light_view_proj: Mat4, world: Vec3) -> Option<Vec3> {
    let clip = light_view_proj * world.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    // NDC y points up, texture v points down.
    Some(Vec3::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5, ndc.z))
}

/// A fragment is only eligible for shadowing while its projection lands on
/// the map; everything outside the light frustum defaults to lit.
pub fn in_coverage(uvz: Vec3) -> bool {
    (0.0..=1.0).contains(&uvz.x) && (0.0..=1.0).contains(&uvz.y) && (0.0..=1.0).contains(&uvz.z)
}

/// The biased depth comparison: shadowed iff the map records something
/// strictly closer to the light than this fragment, beyond the acne bias.
pub fn is_shadowed(stored_depth: f32, fragment_depth: f32, bias: f32) -> bool {
    stored_depth < fragment_depth - bias
}

/// Full per-fragment classification against a depth map sampled through
/// `sample(u, v)`. Mirrors the WGSL in `scene.wgsl` line for line.
pub fn classify<F>(light_view_proj: Mat4, world: Vec3, bias: f32, sample: F) -> bool
where
    F: Fn(f32, f32) -> f32,
{
    let Some(uvz) = shadow_uvz(light_view_proj, world) else {
        return false;
    };
    if !in_coverage(uvz) {
        return false;
    }
    is_shadowed(sample(uvz.x, uvz.y), uvz.z, bias)
}

/// Converts a stored (nonlinear) perspective depth back to the normalized
/// linear distance (d - near) / (far - near). Used by the readback dump and
/// by tests that reason about distances instead of raw depth values.
pub fn linearize_depth(depth: f32, near: f32, far: f32) -> f32 {
    let view_distance = far * near / (far - depth * (far - near));
    (view_distance - near) / (far - near)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn down_light(height: f32, near: f32, far: f32) -> Mat4 {
        let view = Mat4::look_at_rh(Vec3::new(0.0, height, 0.0), Vec3::ZERO, Vec3::Z);
        let proj = Mat4::perspective_rh(90f32.to_radians(), 1.0, near, far);
        proj * view
    }

    #[test]
    fn point_under_the_light_projects_to_map_center() {
        let vp = down_light(100.0, 1.0, 500.0);
        let uvz = shadow_uvz(vp, Vec3::ZERO).unwrap();
        assert!((uvz.x - 0.5).abs() < EPSILON);
        assert!((uvz.y - 0.5).abs() < EPSILON);
        assert!(in_coverage(uvz));
    }

    #[test]
    fn point_behind_the_light_has_no_projection() {
        let vp = down_light(100.0, 1.0, 500.0);
        assert!(shadow_uvz(vp, Vec3::new(0.0, 200.0, 0.0)).is_none());
    }

    #[test]
    fn stored_depth_linearizes_to_normalized_distance() {
        let near = 10.0;
        let far = 7500.0;
        let distance = 1800.0f32;
        // Nonlinear depth a perspective projection stores for that distance.
        let stored = far * (distance - near) / (distance * (far - near));
        let linear = linearize_depth(stored, near, far);
        let expected = (distance - near) / (far - near);
        // Inverting the nonlinear mapping amplifies f32 roundoff, so the
        // tolerance is loose relative to EPSILON.
        assert!((linear - expected).abs() < 5e-3, "{linear} != {expected}");
    }

    #[test]
    fn bias_decides_the_equal_depth_case() {
        // A fragment comparing against its own stored depth sits exactly on
        // the boundary; the bias must push it to lit.
        assert!(!is_shadowed(0.5, 0.5, 0.005));
        assert!(!is_shadowed(0.5, 0.5049, 0.005));
        assert!(is_shadowed(0.5, 0.5051, 0.005));
    }

    #[test]
    fn classification_outside_coverage_is_lit() {
        let vp = down_light(100.0, 1.0, 500.0);
        // Far outside the frustum footprint; sampler would return garbage,
        // so it must not even be consulted.
        let shadowed = classify(vp, Vec3::new(1e6, 0.0, 0.0), 0.005, |_, _| {
            panic!("sampled outside coverage")
        });
        assert!(!shadowed);
    }
}
