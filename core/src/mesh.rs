//! Icosphere geometry.
//!
//! Each of the icosahedron's 20 faces is split into a triangular grid of
//! `(detail + 1)^2` triangles whose vertices are pushed onto the sphere.
//! Faces keep their own vertices, so seams are duplicated; normals are the
//! normalized positions.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Vertex layout consumed by the mesh shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Icosphere parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub radius: f32,
    /// Subdivisions per icosahedron edge.
    pub detail: u32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            detail: 200,
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn icosahedron_corners() -> [Vec3; 12] {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
}

/// Build a subdivided icosphere.
pub fn icosphere(config: &MeshConfig) -> Geometry {
    let corners = icosahedron_corners();
    let cols = config.detail as usize + 1;
    let per_face_vertices = (cols + 1) * (cols + 2) / 2;

    let mut vertices = Vec::with_capacity(20 * per_face_vertices);
    let mut indices = Vec::with_capacity(20 * cols * cols * 3);
    // row_start[i] = index of the first vertex of row i within the face
    let row_start: Vec<usize> = (0..=cols)
        .scan(0, |acc, i| {
            let start = *acc;
            *acc += cols - i + 1;
            Some(start)
        })
        .collect();

    for face in ICOSAHEDRON_FACES {
        let [a, b, c] = face.map(|i| corners[i]);
        let base = vertices.len();

        for i in 0..=cols {
            let t = i as f32 / cols as f32;
            let aj = a.lerp(c, t);
            let bj = b.lerp(c, t);
            let rows = cols - i;
            for j in 0..=rows {
                let p = if rows == 0 {
                    aj
                } else {
                    aj.lerp(bj, j as f32 / rows as f32)
                };
                let n = p.normalize();
                vertices.push(Vertex {
                    position: (n * config.radius).to_array(),
                    normal: n.to_array(),
                });
            }
        }

        let at = |i: usize, j: usize| (base + row_start[i] + j) as u32;
        for i in 0..cols {
            for j in 0..(2 * (cols - i) - 1) {
                let k = j / 2;
                if j % 2 == 0 {
                    indices.extend_from_slice(&[at(i, k + 1), at(i + 1, k), at(i, k)]);
                } else {
                    indices.extend_from_slice(&[at(i, k + 1), at(i + 1, k + 1), at(i + 1, k)]);
                }
            }
        }
    }

    Geometry { vertices, indices }
}
