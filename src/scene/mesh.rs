use crate::core::geometry::{TangentFrame, Vertex};
use nalgebra::{Point3, Vector2, Vector3};
use thiserror::Error;

const DEGENERATE_EPSILON: f32 = 1e-12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// A collection of vertices and indices representing a 3D object.
///
/// Indices form a triangle list with counter-clockwise front faces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// List of vertices.
    pub vertices: Vec<Vertex>,
    /// List of indices defining triangles (3 indices per triangle).
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Appends a vertex and returns its index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Iterates over the index triples of the triangle list.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Checks that the index buffer describes whole triangles over existing vertices.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(self.indices.len()));
        }
        let vertex_count = self.vertices.len();
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                position,
                index,
                vertex_count,
            });
        }
        Ok(())
    }

    /// Derives a tangent/bitangent pair for every vertex.
    ///
    /// Each triangle computes one frame against the normal of its first corner and
    /// writes it to all three corners, so a vertex shared by several triangles keeps
    /// the frame of the last triangle that references it. Vertices not referenced by
    /// any triangle get an arbitrary frame orthogonal to their own normal.
    ///
    /// The mesh must be valid (see [`Mesh::validate`]).
    pub fn tangent_frames(&self) -> Vec<TangentFrame> {
        let mut frames: Vec<TangentFrame> = self
            .vertices
            .iter()
            .map(|v| frame_from_normal(&v.normal))
            .collect();

        for [i0, i1, i2] in self.triangles() {
            let v0 = &self.vertices[i0 as usize];
            let v1 = &self.vertices[i1 as usize];
            let v2 = &self.vertices[i2 as usize];

            let frame = triangle_tangent_frame(
                [v0.position, v1.position, v2.position],
                [v0.texcoord, v1.texcoord, v2.texcoord],
                &v0.normal,
            );

            frames[i0 as usize] = frame;
            frames[i1 as usize] = frame;
            frames[i2 as usize] = frame;
        }

        frames
    }
}

/// Computes the tangent frame of a single triangle relative to `normal`.
///
/// The position edge is `p1 - p0`, or `p2 - p0` when the first two corners
/// coincide (collapsed pole triangles). The edge is divided by the length of the
/// matching UV edge unless that length is zero. The result is orthogonalized
/// against `normal` and never contains non-finite values.
pub fn triangle_tangent_frame(
    positions: [Point3<f32>; 3],
    uvs: [Vector2<f32>; 3],
    normal: &Vector3<f32>,
) -> TangentFrame {
    let [p0, p1, p2] = positions;
    let delta_pos = if p0 == p1 { p2 - p0 } else { p1 - p0 };

    let uv_span = (uvs[1] - uvs[0]).norm();
    let raw_tangent = if uv_span == 0.0 {
        delta_pos
    } else {
        delta_pos / uv_span
    };

    let normal = normalize_or(normal, &Vector3::zeros());
    let fallback = frame_from_normal(&normal);

    // Gram-Schmidt against the normal
    let tangent = normalize_or(
        &(raw_tangent - normal * normal.dot(&raw_tangent)),
        &fallback.tangent,
    );
    let bitangent = normalize_or(&normal.cross(&tangent), &fallback.bitangent);

    TangentFrame { tangent, bitangent }
}

/// Builds an arbitrary orthonormal tangent/bitangent pair for `normal`.
fn frame_from_normal(normal: &Vector3<f32>) -> TangentFrame {
    if normal.norm_squared() <= DEGENERATE_EPSILON {
        return TangentFrame::default();
    }
    let n = normal.normalize();
    let reference = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let tangent = (reference - n * n.dot(&reference)).normalize();
    let bitangent = n.cross(&tangent).normalize();
    TangentFrame { tangent, bitangent }
}

fn normalize_or(v: &Vector3<f32>, fallback: &Vector3<f32>) -> Vector3<f32> {
    let len_sq = v.norm_squared();
    if len_sq > DEGENERATE_EPSILON && len_sq.is_finite() {
        v / len_sq.sqrt()
    } else {
        *fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn vertex(x: f32, y: f32, u: f32, v: f32) -> Vertex {
        Vertex::new(
            Point3::new(x, y, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector2::new(u, v),
        )
    }

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                vertex(0.0, 0.0, 0.0, 0.0),
                vertex(1.0, 0.0, 1.0, 0.0),
                vertex(1.0, 1.0, 1.0, 1.0),
                vertex(0.0, 1.0, 0.0, 1.0),
            ],
            vec![0, 1, 2, 2, 3, 0],
        )
    }

    #[test]
    fn validate_accepts_well_formed_mesh() {
        assert_eq!(quad().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_partial_triangle() {
        let mut mesh = quad();
        mesh.indices.pop();
        assert_eq!(mesh.validate(), Err(MeshError::PartialTriangle(5)));
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mut mesh = quad();
        mesh.indices[4] = 9;
        assert_eq!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange {
                position: 4,
                index: 9,
                vertex_count: 4
            })
        );
    }

    #[test]
    fn quad_frames_are_orthonormal_to_normal() {
        let frames = quad().tangent_frames();
        assert_eq!(frames.len(), 4);
        for frame in &frames {
            assert!(frame.tangent.dot(&Vector3::z()).abs() < EPS);
            assert!(frame.bitangent.dot(&Vector3::z()).abs() < EPS);
            assert!((frame.tangent.norm() - 1.0).abs() < EPS);
            assert!((frame.bitangent.norm() - 1.0).abs() < EPS);
        }
        // Vertex 1 is only used by the first triangle, whose first edge runs along +X.
        assert!((frames[1].tangent - Vector3::x()).norm() < EPS);
        assert!((frames[1].bitangent - Vector3::y()).norm() < EPS);
    }

    #[test]
    fn later_triangle_overwrites_shared_vertices() {
        // Second triangle has U running along +Y, so the shared corners 0 and 2
        // take its frame instead of the first triangle's.
        let mesh = Mesh::new(
            vec![
                vertex(0.0, 0.0, 0.0, 0.0),
                vertex(1.0, 0.0, 1.0, 0.0),
                vertex(1.0, 1.0, 1.0, 1.0),
                vertex(0.0, 1.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 0, 3, 2],
        );
        let frames = mesh.tangent_frames();
        assert!((frames[1].tangent - Vector3::x()).norm() < EPS);
        assert!((frames[0].tangent - Vector3::y()).norm() < EPS);
        assert!((frames[2].tangent - Vector3::y()).norm() < EPS);
    }

    #[test]
    fn zero_uv_span_falls_back_to_position_edge() {
        let frame = triangle_tangent_frame(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            [Vector2::zeros(); 3],
            &Vector3::z(),
        );
        assert!((frame.tangent - Vector3::y()).norm() < EPS);
        assert!(frame.bitangent.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn edge_along_normal_still_yields_orthonormal_frame() {
        let normal = Vector3::z();
        let frame = triangle_tangent_frame(
            [
                Point3::origin(),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            [
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(0.0, 1.0),
            ],
            &normal,
        );
        assert!(frame.tangent.dot(&normal).abs() < EPS);
        assert!(frame.bitangent.dot(&normal).abs() < EPS);
        assert!((frame.tangent.norm() - 1.0).abs() < EPS);
        assert!((frame.bitangent.norm() - 1.0).abs() < EPS);
    }

    #[test]
    fn unreferenced_vertex_gets_orthogonal_frame() {
        let mut mesh = quad();
        mesh.add_vertex(Vertex::new(
            Point3::new(5.0, 5.0, 5.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector2::zeros(),
        ));
        let frames = mesh.tangent_frames();
        let lonely = frames[4];
        assert!(lonely.tangent.dot(&Vector3::x()).abs() < EPS);
        assert!(lonely.bitangent.dot(&Vector3::x()).abs() < EPS);
    }
}
