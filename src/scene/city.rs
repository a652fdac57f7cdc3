//! Procedural geometry for the static city scene: a ground plane inside a
//! panorama backdrop box, two buildings, and the rotating prop.
//!
//! Everything lands in world units; only the prop carries a non-identity
//! model matrix (its per-frame Y rotation).

use crate::renderer::{v, Vertex};

const ROOM_HALF: f32 = 3500.0;
const ROOM_HEIGHT: f32 = 7000.0;
const GROUND_UV_TILES: f32 = 8.0;

/// A face-group slice of a composite mesh's index buffer.
#[derive(Clone, Copy, Debug)]
pub struct IndexRange {
    pub first: u32,
    pub count: u32,
}

/// The static composite mesh: one vertex/index buffer, four textured
/// face groups drawn separately.
pub struct CityMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub ground: IndexRange,
    pub backdrop: IndexRange,
    pub building_a: IndexRange,
    pub building_b: IndexRange,
}

struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn push_quad(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3], uvs: [[f32; 2]; 4]) {
        let base = self.vertices.len() as u32;
        for (pos, uv) in corners.into_iter().zip(uvs) {
            self.vertices.push(v(pos, normal, uv));
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn mark(&self) -> u32 {
        self.indices.len() as u32
    }

    fn range_since(&self, first: u32) -> IndexRange {
        IndexRange {
            first,
            count: self.indices.len() as u32 - first,
        }
    }
}

fn rect_uv(u0: f32, v0: f32, u1: f32, v1: f32) -> [[f32; 2]; 4] {
    [[u0, v1], [u1, v1], [u1, v0], [u0, v0]]
}

/// A vertical wall from `bottom[0..1]` on the ground up to `height`, facing
/// `normal`, with its UV window into the panorama texture.
fn push_wall(
    b: &mut MeshBuilder,
    bottom: [[f32; 3]; 2],
    height: f32,
    normal: [f32; 3],
    uv: [[f32; 2]; 4],
) {
    let [p0, p1] = bottom;
    let corners = [
        p0,
        p1,
        [p1[0], height, p1[2]],
        [p0[0], height, p0[2]],
    ];
    b.push_quad(corners, normal, uv);
}

/// An axis-aligned building: flat roof plus four walls (no floor face, it
/// sits on the ground). Side UVs tile `side_tiles` times vertically.
fn push_building(
    b: &mut MeshBuilder,
    min: [f32; 2],
    max: [f32; 2],
    height: f32,
    side_tiles: f32,
) {
    let (x0, z0) = (min[0], min[1]);
    let (x1, z1) = (max[0], max[1]);

    // Roof
    b.push_quad(
        [
            [x0, height, z0],
            [x0, height, z1],
            [x1, height, z1],
            [x1, height, z0],
        ],
        [0.0, 1.0, 0.0],
        rect_uv(0.0, 0.0, 0.1, 0.1),
    );

    let side_uv = rect_uv(0.0, 0.0, 1.0, side_tiles);
    push_wall(b, [[x0, 0.0, z1], [x1, 0.0, z1]], height, [0.0, 0.0, 1.0], side_uv);
    push_wall(b, [[x1, 0.0, z0], [x0, 0.0, z0]], height, [0.0, 0.0, -1.0], side_uv);
    push_wall(b, [[x0, 0.0, z0], [x0, 0.0, z1]], height, [-1.0, 0.0, 0.0], side_uv);
    push_wall(b, [[x1, 0.0, z1], [x1, 0.0, z0]], height, [1.0, 0.0, 0.0], side_uv);
}

pub fn city_mesh() -> CityMesh {
    let mut b = MeshBuilder::new();
    let s = ROOM_HALF;
    let h = ROOM_HEIGHT;

    let ground_start = b.mark();
    b.push_quad(
        [[-s, 0.0, -s], [s, 0.0, -s], [s, 0.0, s], [-s, 0.0, s]],
        [0.0, 1.0, 0.0],
        rect_uv(0.0, 0.0, GROUND_UV_TILES, GROUND_UV_TILES),
    );
    let ground = b.range_since(ground_start);

    // Backdrop: ceiling plus four inward-facing walls, each wall a quarter
    // of the panorama texture.
    let backdrop_start = b.mark();
    b.push_quad(
        [[-s, h, -s], [s, h, -s], [s, h, s], [-s, h, s]],
        [0.0, -1.0, 0.0],
        rect_uv(0.25, 0.0, 0.5, 0.333),
    );
    let band = |u0: f32, u1: f32| rect_uv(u0, 0.333, u1, 0.666);
    push_wall(&mut b, [[-s, 0.0, s], [s, 0.0, s]], h, [0.0, 0.0, -1.0], band(0.0, 0.25));
    push_wall(&mut b, [[s, 0.0, s], [s, 0.0, -s]], h, [-1.0, 0.0, 0.0], band(0.25, 0.5));
    push_wall(&mut b, [[s, 0.0, -s], [-s, 0.0, -s]], h, [0.0, 0.0, 1.0], band(0.5, 0.75));
    push_wall(&mut b, [[-s, 0.0, -s], [-s, 0.0, s]], h, [1.0, 0.0, 0.0], band(0.75, 1.0));
    let backdrop = b.range_since(backdrop_start);

    let a_start = b.mark();
    push_building(&mut b, [-200.0, -500.0], [800.0, 500.0], 1600.0, 3.0);
    let building_a = b.range_since(a_start);

    let b_start = b.mark();
    push_building(&mut b, [-1550.0, -350.0], [-850.0, 350.0], 1900.0, 2.0);
    let building_b = b.range_since(b_start);

    CityMesh {
        vertices: b.vertices,
        indices: b.indices,
        ground,
        backdrop,
        building_a,
        building_b,
    }
}

/// The rotating prop: a box hovering off-center so the per-frame Y rotation
/// makes it orbit the scene center.
pub fn prop_mesh() -> (Vec<Vertex>, Vec<u32>) {
    let mut b = MeshBuilder::new();
    let (x0, x1) = (2000.0, 2400.0);
    let (y0, y1) = (1400.0, 1800.0);
    let (z0, z1) = (-200.0, 200.0);
    let side = rect_uv(0.0, 0.0, 1.0, 1.0);
    let cap = rect_uv(0.0, 0.0, 0.1, 0.1);

    b.push_quad(
        [[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]],
        [0.0, 0.0, 1.0],
        side,
    );
    b.push_quad(
        [[x1, y0, z0], [x0, y0, z0], [x0, y1, z0], [x1, y1, z0]],
        [0.0, 0.0, -1.0],
        side,
    );
    b.push_quad(
        [[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]],
        [-1.0, 0.0, 0.0],
        side,
    );
    b.push_quad(
        [[x1, y0, z1], [x1, y0, z0], [x1, y1, z0], [x1, y1, z1]],
        [1.0, 0.0, 0.0],
        side,
    );
    b.push_quad(
        [[x0, y1, z1], [x1, y1, z1], [x1, y1, z0], [x0, y1, z0]],
        [0.0, 1.0, 0.0],
        cap,
    );
    b.push_quad(
        [[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]],
        [0.0, -1.0, 0.0],
        cap,
    );

    (b.vertices, b.indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(vertices: &[Vertex], indices: &[u32]) {
        assert_eq!(indices.len() % 3, 0);
        for &i in indices {
            assert!((i as usize) < vertices.len(), "index {i} out of range");
        }
    }

    #[test]
    fn city_mesh_is_a_valid_triangle_list() {
        let city = city_mesh();
        assert_valid(&city.vertices, &city.indices);
    }

    #[test]
    fn face_groups_partition_the_index_buffer() {
        let city = city_mesh();
        assert_eq!(city.ground.first, 0);
        assert_eq!(city.backdrop.first, city.ground.count);
        assert_eq!(
            city.building_a.first,
            city.backdrop.first + city.backdrop.count
        );
        assert_eq!(
            city.building_b.first,
            city.building_a.first + city.building_a.count
        );
        assert_eq!(
            (city.building_b.first + city.building_b.count) as usize,
            city.indices.len()
        );
        // 16 quads total: ground, ceiling + 4 walls, 2 * (roof + 4 walls).
        assert_eq!(city.indices.len(), 96);
    }

    #[test]
    fn prop_is_a_closed_box() {
        let (vertices, indices) = prop_mesh();
        assert_valid(&vertices, &indices);
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
    }
}
