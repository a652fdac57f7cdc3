use wgpu::util::DeviceExt;

use crate::error::Error;
use crate::renderer::Vertex;

/// An immutable GPU mesh: vertex + index buffers, uploaded once at startup.
pub struct Mesh {
    vbuf: wgpu::Buffer,
    ibuf: wgpu::Buffer,
    index_count: u32,
}

impl Mesh {
    /// Uploads the mesh after checking the triangle-list invariants: every
    /// index must address a real vertex and the index count must be a
    /// multiple of 3. An empty index list is legal and draws as a no-op.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<Self, Error> {
        validate_triangle_list(label, vertices.len(), indices)?;

        let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}.VertexBuffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}.IndexBuffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            vbuf,
            ibuf,
            index_count: indices.len() as u32,
        })
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vbuf
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.ibuf
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn index_format(&self) -> wgpu::IndexFormat {
        wgpu::IndexFormat::Uint32
    }
}

/// The triangle-list invariants `Mesh::new` enforces before touching the
/// device: every index must address a real vertex and the index count must
/// be a multiple of 3.
pub fn validate_triangle_list(
    label: &str,
    vertex_count: usize,
    indices: &[u32],
) -> Result<(), Error> {
    if indices.len() % 3 != 0 {
        return Err(Error::Draw(format!(
            "mesh {label:?}: index count {} is not a multiple of 3",
            indices.len()
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::Draw(format!(
            "mesh {label:?}: index {bad} out of range for {vertex_count} vertices"
        )));
    }
    Ok(())
}

/// Validates a sub-range of a mesh's index buffer before drawing it.
///
/// Drawables may cover a slice of a composite mesh (the city mesh draws its
/// face groups with different textures), so the range check lives here
/// rather than in `Mesh::new`.
pub fn check_index_range(index_count: u32, start: u32, count: u32) -> Result<(), Error> {
    let end = start.checked_add(count).ok_or_else(|| {
        Error::Draw(format!("index range {start}+{count} overflows"))
    })?;
    if end > index_count {
        return Err(Error::Draw(format!(
            "index range {start}..{end} exceeds mesh index count {index_count}"
        )));
    }
    if count % 3 != 0 {
        return Err(Error::Draw(format!(
            "index range length {count} is not a multiple of 3"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_index_is_rejected() {
        let err = validate_triangle_list("bad", 4, &[0, 1, 4]).unwrap_err();
        assert!(matches!(err, Error::Draw(_)));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn non_triangle_index_count_is_rejected() {
        let err = validate_triangle_list("bad", 8, &[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::Draw(_)));
    }

    #[test]
    fn empty_index_list_is_a_legal_no_op() {
        assert!(validate_triangle_list("empty", 0, &[]).is_ok());
    }

    #[test]
    fn valid_subrange_is_accepted() {
        assert!(check_index_range(96, 6, 30).is_ok());
        assert!(check_index_range(96, 0, 96).is_ok());
        assert!(check_index_range(0, 0, 0).is_ok());
    }

    #[test]
    fn subrange_past_the_end_is_rejected() {
        assert!(check_index_range(96, 90, 9).is_err());
        assert!(check_index_range(6, 0, 7).is_err());
    }

    #[test]
    fn non_triangle_subrange_is_rejected() {
        assert!(check_index_range(96, 0, 4).is_err());
    }
}
