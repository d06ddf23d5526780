//! Cube geometry and push constant layout.

use bytemuck::{Pod, Zeroable};
use vks_rhi::vertex::Vertex;

/// Push constant block consumed by the cube vertex shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PushConstants {
    /// Combined model-view-projection matrix, column major.
    pub mvp: [[f32; 4]; 4],
}

/// 24 vertices, one quad per face, each face a solid color.
pub const CUBE_VERTICES: [Vertex; 24] = [
    // +Z (front, red)
    Vertex::new([-0.5, -0.5, 0.5], [0.9, 0.2, 0.2]),
    Vertex::new([0.5, -0.5, 0.5], [0.9, 0.2, 0.2]),
    Vertex::new([0.5, 0.5, 0.5], [0.9, 0.2, 0.2]),
    Vertex::new([-0.5, 0.5, 0.5], [0.9, 0.2, 0.2]),
    // -Z (back, green)
    Vertex::new([0.5, -0.5, -0.5], [0.2, 0.8, 0.3]),
    Vertex::new([-0.5, -0.5, -0.5], [0.2, 0.8, 0.3]),
    Vertex::new([-0.5, 0.5, -0.5], [0.2, 0.8, 0.3]),
    Vertex::new([0.5, 0.5, -0.5], [0.2, 0.8, 0.3]),
    // +X (right, blue)
    Vertex::new([0.5, -0.5, 0.5], [0.2, 0.3, 0.9]),
    Vertex::new([0.5, -0.5, -0.5], [0.2, 0.3, 0.9]),
    Vertex::new([0.5, 0.5, -0.5], [0.2, 0.3, 0.9]),
    Vertex::new([0.5, 0.5, 0.5], [0.2, 0.3, 0.9]),
    // -X (left, yellow)
    Vertex::new([-0.5, -0.5, -0.5], [0.9, 0.8, 0.2]),
    Vertex::new([-0.5, -0.5, 0.5], [0.9, 0.8, 0.2]),
    Vertex::new([-0.5, 0.5, 0.5], [0.9, 0.8, 0.2]),
    Vertex::new([-0.5, 0.5, -0.5], [0.9, 0.8, 0.2]),
    // +Y (top, cyan)
    Vertex::new([-0.5, 0.5, 0.5], [0.2, 0.8, 0.8]),
    Vertex::new([0.5, 0.5, 0.5], [0.2, 0.8, 0.8]),
    Vertex::new([0.5, 0.5, -0.5], [0.2, 0.8, 0.8]),
    Vertex::new([-0.5, 0.5, -0.5], [0.2, 0.8, 0.8]),
    // -Y (bottom, magenta)
    Vertex::new([-0.5, -0.5, -0.5], [0.8, 0.2, 0.8]),
    Vertex::new([0.5, -0.5, -0.5], [0.8, 0.2, 0.8]),
    Vertex::new([0.5, -0.5, 0.5], [0.8, 0.2, 0.8]),
    Vertex::new([-0.5, -0.5, 0.5], [0.8, 0.2, 0.8]),
];

/// Two counter-clockwise triangles per face.
pub const CUBE_INDICES: [u32; 36] = [
    0, 1, 2, 2, 3, 0, // front
    4, 5, 6, 6, 7, 4, // back
    8, 9, 10, 10, 11, 8, // right
    12, 13, 14, 14, 15, 12, // left
    16, 17, 18, 18, 19, 16, // top
    20, 21, 22, 22, 23, 20, // bottom
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_constants_fit_a_single_mat4() {
        assert_eq!(std::mem::size_of::<PushConstants>(), 64);
    }

    #[test]
    fn indices_cover_exactly_the_cube_vertices() {
        assert_eq!(CUBE_VERTICES.len(), 24);
        assert_eq!(CUBE_INDICES.len(), 36);
        assert!(CUBE_INDICES.iter().all(|&i| (i as usize) < CUBE_VERTICES.len()));
        // Every vertex is referenced by some triangle.
        for v in 0..CUBE_VERTICES.len() as u32 {
            assert!(CUBE_INDICES.contains(&v), "vertex {} unused", v);
        }
    }
}
