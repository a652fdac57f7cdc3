use glam::Vec3;

use wgpu_city::renderer::shadow_math::{classify, linearize_depth, shadow_uvz};
use wgpu_city::scene::Light;

const EPSILON: f32 = 1e-4;
const BIAS: f32 = 5e-4;

fn down_light(position: Vec3, fov_deg: f32, near: f32, far: f32) -> Light {
    Light {
        position,
        target: Vec3::new(position.x, 0.0, position.z),
        up: Vec3::Z,
        fov_y_radians: fov_deg.to_radians(),
        near,
        far,
    }
}

/// Nonlinear depth value a perspective projection stores for a point at the
/// given view-space distance.
fn stored_depth_at(distance: f32, near: f32, far: f32) -> f32 {
    far * (distance - near) / (distance * (far - near))
}

#[test]
fn depth_pass_and_scene_pass_agree_on_light_space() {
    // The depth pass rasterizes with lightSpaceMatrix * model; the scene
    // pass reprojects world positions through the same lightSpaceMatrix.
    // The two must land on identical texel coordinates.
    let light = Light::default();
    let vp = light.view_proj(1.0);

    // All sample points sit below the light's eye plane at y = 1800;
    // anything above it has no rasterizable projection at all.
    let points = [
        Vec3::new(-1000.0, 0.0, -275.0),
        Vec3::new(-500.0, 300.0, 100.0),
        Vec3::new(-1550.0, 1700.0, -350.0),
    ];
    for world in points {
        // The rasterizer's view of the vertex: clip position, perspective
        // divide, viewport remap (v flipped, z already [0,1]).
        let clip = vp * world.extend(1.0);
        assert!(clip.w > 0.0);
        let ndc = clip.truncate() / clip.w;
        let rasterized = Vec3::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5, ndc.z);

        let reprojected = shadow_uvz(vp, world).expect("point in front of light");
        assert!(
            rasterized.abs_diff_eq(reprojected, EPSILON),
            "{rasterized:?} != {reprojected:?}"
        );
    }

    // Above the eye plane both passes agree there is nothing to agree on.
    assert!(shadow_uvz(vp, Vec3::new(-1550.0, 1900.0, -350.0)).is_none());
}

#[test]
fn fragments_outside_the_light_frustum_default_to_lit() {
    let light = Light::default();
    let vp = light.view_proj(1.0);

    // Far outside the footprint: projection is off-map, sampler untouched.
    let far_away = Vec3::new(1e6, 0.0, 1e6);
    assert!(!classify(vp, far_away, BIAS, |_, _| panic!(
        "sampled outside coverage"
    )));

    // Behind the light entirely: no projection at all.
    let behind = Vec3::new(-1000.0, 3000.0, -275.0);
    assert!(shadow_uvz(vp, behind).is_none());
    assert!(!classify(vp, behind, BIAS, |_, _| panic!("sampled behind light")));
}

#[test]
fn flat_ground_under_a_vertical_light_shows_no_acne() {
    // An unoccluded plane comparing against its own stored depth must come
    // out fully lit once the bias is applied, at every sampled point.
    let light = down_light(Vec3::new(0.0, 1800.0, 0.0), 100.0, 10.0, 7500.0);
    let vp = light.view_proj(1.0);

    // The map stores the ground's own depth: reproject the sample position.
    let ground_depth_at = |x: f32, z: f32| {
        shadow_uvz(vp, Vec3::new(x, 0.0, z))
            .expect("ground in front of light")
            .z
    };

    let mut checked = 0;
    for ix in -10..=10 {
        for iz in -10..=10 {
            let world = Vec3::new(ix as f32 * 100.0, 0.0, iz as f32 * 100.0);
            let Some(uvz) = shadow_uvz(vp, world) else { continue };
            if !(0.0..=1.0).contains(&uvz.x) || !(0.0..=1.0).contains(&uvz.y) {
                continue;
            }
            let shadowed = classify(vp, world, BIAS, |_, _| ground_depth_at(world.x, world.z));
            assert!(!shadowed, "acne at {world:?}");
            checked += 1;
        }
    }
    assert!(checked > 100, "grid mostly outside coverage, test is vacuous");
}

#[test]
fn quad_footprint_stores_the_light_distance() {
    // A quad at y = 0 lit from straight above: the stored depth under the
    // footprint linearizes to (distance - near) / (far - near).
    let near = 10.0;
    let far = 7500.0;
    let height = 1800.0;
    let light = down_light(Vec3::new(0.0, height, 0.0), 100.0, near, far);
    let vp = light.view_proj(1.0);

    let directly_below = shadow_uvz(vp, Vec3::ZERO).expect("below the light");
    let linear = linearize_depth(directly_below.z, near, far);
    let expected = (height - near) / (far - near);
    // Linearization amplifies f32 roundoff near the far plane, hence the
    // loose tolerance.
    assert!(
        (linear - expected).abs() < 5e-3,
        "linearized {linear}, expected {expected}"
    );

    // And the quad itself is unshadowed against its own depth.
    assert!(!classify(vp, Vec3::ZERO, BIAS, |_, _| directly_below.z));
}

#[test]
fn box_between_light_and_ground_shadows_exactly_its_footprint() {
    let near = 10.0;
    let far = 7500.0;
    let light_pos = Vec3::new(-1000.0, 1800.0, -275.0);
    let light = down_light(light_pos, 100.0, near, far);
    let vp = light.view_proj(1.0);

    // Opaque box top at y = 600, centered under the light. Looking straight
    // down, every point on a horizontal plane shares one view distance, so
    // the map over the footprint holds one value and the ground another.
    let box_min = Vec3::new(-1200.0, 600.0, -475.0);
    let box_max = Vec3::new(-800.0, 600.0, -75.0);
    let box_depth = stored_depth_at(light_pos.y - box_min.y, near, far);
    let ground_depth = stored_depth_at(light_pos.y, near, far);

    // The box top's uv footprint, from its corners.
    let corners = [
        Vec3::new(box_min.x, 600.0, box_min.z),
        Vec3::new(box_min.x, 600.0, box_max.z),
        Vec3::new(box_max.x, 600.0, box_min.z),
        Vec3::new(box_max.x, 600.0, box_max.z),
    ];
    let uvs: Vec<_> = corners
        .iter()
        .map(|c| shadow_uvz(vp, *c).expect("corner in frustum"))
        .collect();
    let (u_min, u_max) = uvs
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
    let (v_min, v_max) = uvs
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));

    let sample = |u: f32, v: f32| {
        if (u_min..=u_max).contains(&u) && (v_min..=v_max).contains(&v) {
            box_depth
        } else {
            ground_depth
        }
    };

    // Ground directly under the box center: shadowed.
    let under = Vec3::new(-1000.0, 0.0, -275.0);
    assert!(classify(vp, under, BIAS, sample));

    // Ground well inside the footprint edges: shadowed.
    assert!(classify(vp, Vec3::new(-1150.0, 0.0, -125.0), BIAS, sample));

    // Ground outside the footprint: lit. The perspective light widens the
    // box's occlusion cone below it, so step well clear of the projection.
    assert!(!classify(vp, Vec3::new(-2200.0, 0.0, -275.0), BIAS, sample));
    assert!(!classify(vp, Vec3::new(-1000.0, 0.0, 900.0), BIAS, sample));
}
