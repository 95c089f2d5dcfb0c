//! Procedural mesh builders.
//!
//! Every builder is deterministic and clamps degenerate parameters to a safe
//! minimum (logging a warning) instead of producing an empty or invalid buffer.

use crate::core::geometry::Vertex;
use crate::scene::mesh::Mesh;
use log::warn;
use nalgebra::{Point3, Vector2, Vector3};
use serde::Deserialize;
use std::f32::consts::{PI, TAU};

/// Smallest length accepted for widths, heights and radii.
pub const MIN_LENGTH: f32 = 0.001;
/// Upper bound for any subdivision/segment count.
pub const MAX_SEGMENTS: u32 = 1024;
pub const MIN_PLANE_SUBDIVISIONS: u32 = 1;
pub const MIN_RADIAL_SEGMENTS: u32 = 3;

/// Shape parameters for the primitive families.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeParams {
    Plane {
        width: f32,
        height: f32,
        subdivisions: u32,
    },
    Cylinder {
        height: f32,
        radius: f32,
        segments: u32,
    },
    Sphere {
        radius: f32,
        segments: u32,
    },
    Torus {
        inner_radius: f32,
        outer_radius: f32,
        inner_segments: u32,
        outer_segments: u32,
    },
}

impl ShapeParams {
    pub fn build(&self) -> Mesh {
        match *self {
            ShapeParams::Plane {
                width,
                height,
                subdivisions,
            } => create_plane(width, height, subdivisions),
            ShapeParams::Cylinder {
                height,
                radius,
                segments,
            } => create_cylinder(height, radius, segments),
            ShapeParams::Sphere { radius, segments } => create_sphere(radius, segments),
            ShapeParams::Torus {
                inner_radius,
                outer_radius,
                inner_segments,
                outer_segments,
            } => create_torus(inner_radius, outer_radius, inner_segments, outer_segments),
        }
    }

    /// Same parameters with every length and count clamped the way the
    /// builders clamp them. Non-finite lengths become `MIN_LENGTH`, so the
    /// result always compares equal to itself.
    pub fn sanitized(&self) -> ShapeParams {
        match *self {
            ShapeParams::Plane {
                width,
                height,
                subdivisions,
            } => ShapeParams::Plane {
                width: clamp_length("plane", "width", width),
                height: clamp_length("plane", "height", height),
                subdivisions: clamp_count("plane", "subdivisions", subdivisions, MIN_PLANE_SUBDIVISIONS),
            },
            ShapeParams::Cylinder {
                height,
                radius,
                segments,
            } => ShapeParams::Cylinder {
                height: clamp_length("cylinder", "height", height),
                radius: clamp_length("cylinder", "radius", radius),
                segments: clamp_count("cylinder", "segments", segments, MIN_RADIAL_SEGMENTS),
            },
            ShapeParams::Sphere { radius, segments } => ShapeParams::Sphere {
                radius: clamp_length("sphere", "radius", radius),
                segments: clamp_count("sphere", "segments", segments, MIN_RADIAL_SEGMENTS),
            },
            ShapeParams::Torus {
                inner_radius,
                outer_radius,
                inner_segments,
                outer_segments,
            } => {
                let (inner_radius, outer_radius) = clamp_torus_radii(inner_radius, outer_radius);
                ShapeParams::Torus {
                    inner_radius,
                    outer_radius,
                    inner_segments: clamp_count("torus", "inner segments", inner_segments, MIN_RADIAL_SEGMENTS),
                    outer_segments: clamp_count("torus", "outer segments", outer_segments, MIN_RADIAL_SEGMENTS),
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeParams::Plane { .. } => "plane",
            ShapeParams::Cylinder { .. } => "cylinder",
            ShapeParams::Sphere { .. } => "sphere",
            ShapeParams::Torus { .. } => "torus",
        }
    }
}

fn clamp_count(shape: &str, what: &str, value: u32, min: u32) -> u32 {
    if value < min {
        warn!("{shape}: {what} must be >= {min} (got {value}), clamping");
    } else if value > MAX_SEGMENTS {
        warn!("{shape}: {what} must be <= {MAX_SEGMENTS} (got {value}), clamping");
    }
    value.clamp(min, MAX_SEGMENTS)
}

fn clamp_length(shape: &str, what: &str, value: f32) -> f32 {
    if value.is_finite() && value >= MIN_LENGTH {
        value
    } else {
        warn!("{shape}: {what} must be >= {MIN_LENGTH} (got {value}), clamping");
        MIN_LENGTH
    }
}

fn clamp_torus_radii(inner_radius: f32, outer_radius: f32) -> (f32, f32) {
    let inner_radius = clamp_length("torus", "inner radius", inner_radius);
    let outer_radius = clamp_length("torus", "outer radius", outer_radius);
    if outer_radius - inner_radius < 2.0 * MIN_LENGTH {
        warn!(
            "torus: outer radius ({outer_radius}) must exceed inner radius ({inner_radius}), clamping"
        );
        return (inner_radius, inner_radius + 2.0 * MIN_LENGTH);
    }
    (inner_radius, outer_radius)
}

/// Builds a `width` x `height` grid in the XY plane starting at the origin.
///
/// Produces `(subdivisions + 1)^2` vertices and `6 * subdivisions^2` indices.
/// All normals are (0, 0, -1) and the triangles are wound so their front face
/// agrees with it. UVs scale with the plane size, so the far corner maps to
/// `(width, height)`.
pub fn create_plane(width: f32, height: f32, subdivisions: u32) -> Mesh {
    let width = clamp_length("plane", "width", width);
    let height = clamp_length("plane", "height", height);
    let subdivisions = clamp_count("plane", "subdivisions", subdivisions, MIN_PLANE_SUBDIVISIONS);

    let columns = subdivisions + 1;
    let mut mesh = Mesh::with_capacity(
        (columns * columns) as usize,
        (6 * subdivisions * subdivisions) as usize,
    );
    let normal = Vector3::new(0.0, 0.0, -1.0);

    for row in 0..=subdivisions {
        let v = row as f32 / subdivisions as f32;
        for col in 0..=subdivisions {
            let u = col as f32 / subdivisions as f32;
            mesh.add_vertex(Vertex::new(
                Point3::new(width * u, height * v, 0.0),
                normal,
                Vector2::new(width * u, height * v),
            ));
        }
    }

    for row in 0..subdivisions {
        for col in 0..subdivisions {
            let start = row * columns + col;
            let right = start + 1;
            let above = start + columns;
            let above_right = above + 1;

            mesh.add_triangle(start, above_right, right);
            mesh.add_triangle(start, above, above_right);
        }
    }

    mesh
}

/// Builds a Y-aligned capped cylinder centered on the origin.
///
/// Vertex layout: top center, top ring (`segments + 1` vertices, the last one
/// duplicating the first so the U seam is representable), bottom center, bottom
/// ring. Index layout: top cap fan, bottom cap fan, then the side wall.
pub fn create_cylinder(height: f32, radius: f32, segments: u32) -> Mesh {
    let height = clamp_length("cylinder", "height", height);
    let radius = clamp_length("cylinder", "radius", radius);
    let segments = clamp_count("cylinder", "segments", segments, MIN_RADIAL_SEGMENTS);

    let mut mesh = Mesh::with_capacity(2 * (segments as usize + 1) + 2, 12 * segments as usize);
    let half_height = height / 2.0;
    let step = TAU / segments as f32;

    let add_ring = |mesh: &mut Mesh, y: f32, v: f32| {
        let cap_normal = Vector3::new(0.0, y.signum(), 0.0);
        let center = mesh.add_vertex(Vertex::new(
            Point3::new(0.0, y, 0.0),
            cap_normal,
            Vector2::new(0.5, v),
        ));
        for i in 0..=segments {
            let (sin, cos) = (i as f32 * step).sin_cos();
            mesh.add_vertex(Vertex::new(
                Point3::new(cos * radius, y, sin * radius),
                Vector3::new(cos, 0.0, sin),
                Vector2::new(i as f32 / segments as f32, v),
            ));
        }
        center
    };

    let top_center = add_ring(&mut mesh, half_height, 1.0);
    let bottom_center = add_ring(&mut mesh, -half_height, 0.0);
    let top_ring = top_center + 1;
    let bottom_ring = bottom_center + 1;

    for i in 0..segments {
        mesh.add_triangle(top_center, top_ring + i + 1, top_ring + i);
    }
    for i in 0..segments {
        mesh.add_triangle(bottom_center, bottom_ring + i, bottom_ring + i + 1);
    }
    for i in 0..segments {
        let top = top_ring + i;
        let bottom = bottom_ring + i;
        mesh.add_triangle(top, top + 1, bottom);
        mesh.add_triangle(top + 1, bottom + 1, bottom);
    }

    mesh
}

/// Builds a UV sphere centered on the origin.
///
/// `segments` is used for both the latitude bands and the longitude slices.
/// Like the cylinder, each ring duplicates its seam vertex (`segments + 1`
/// vertices per ring) and each pole is a full ring of coincident vertices so
/// every slice gets its own pole UV. Pole bands emit one triangle per slice.
pub fn create_sphere(radius: f32, segments: u32) -> Mesh {
    let radius = clamp_length("sphere", "radius", radius);
    let segments = clamp_count("sphere", "segments", segments, MIN_RADIAL_SEGMENTS);

    let columns = segments + 1;
    let mut mesh = Mesh::with_capacity(
        (columns * columns) as usize,
        (6 * segments * (segments - 1)) as usize,
    );

    for row in 0..=segments {
        let v = row as f32 / segments as f32;
        let (sin_phi, cos_phi) = (v * PI).sin_cos();
        for col in 0..=segments {
            let u = col as f32 / segments as f32;
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let normal = Vector3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            mesh.add_vertex(Vertex::new(
                Point3::from(normal * radius),
                normal,
                Vector2::new(u, 1.0 - v),
            ));
        }
    }

    for row in 0..segments {
        for col in 0..segments {
            let a = row * columns + col;
            let b = a + 1;
            let c = a + columns;
            let d = c + 1;

            // a/b collapse onto the north pole, c/d onto the south pole
            if row != 0 {
                mesh.add_triangle(a, b, c);
            }
            if row != segments - 1 {
                mesh.add_triangle(b, d, c);
            }
        }
    }

    mesh
}

/// Builds a torus around the Y axis.
///
/// The tube has radius `(outer_radius - inner_radius) / 2` and its center circle
/// sits at `(outer_radius + inner_radius) / 2`. `outer_segments` steps go around
/// the Y axis, `inner_segments` around the tube. The grid is fully periodic:
/// no seam vertex is duplicated, the last step in each direction connects back
/// to the first.
pub fn create_torus(
    inner_radius: f32,
    outer_radius: f32,
    inner_segments: u32,
    outer_segments: u32,
) -> Mesh {
    let (inner_radius, outer_radius) = clamp_torus_radii(inner_radius, outer_radius);
    let inner_segments = clamp_count("torus", "inner segments", inner_segments, MIN_RADIAL_SEGMENTS);
    let outer_segments = clamp_count("torus", "outer segments", outer_segments, MIN_RADIAL_SEGMENTS);

    let tube_radius = (outer_radius - inner_radius) / 2.0;
    let ring_radius = (outer_radius + inner_radius) / 2.0;

    let quads = (inner_segments * outer_segments) as usize;
    let mut mesh = Mesh::with_capacity(quads, 6 * quads);

    for i in 0..outer_segments {
        let u = i as f32 / outer_segments as f32;
        let (sin_theta, cos_theta) = (u * TAU).sin_cos();
        for j in 0..inner_segments {
            let v = j as f32 / inner_segments as f32;
            let (sin_phi, cos_phi) = (v * TAU).sin_cos();

            let distance = ring_radius + tube_radius * cos_phi;
            mesh.add_vertex(Vertex::new(
                Point3::new(distance * cos_theta, tube_radius * sin_phi, distance * sin_theta),
                Vector3::new(cos_phi * cos_theta, sin_phi, cos_phi * sin_theta),
                Vector2::new(u, v),
            ));
        }
    }

    for i in 0..outer_segments {
        let next_i = (i + 1) % outer_segments;
        for j in 0..inner_segments {
            let next_j = (j + 1) % inner_segments;

            let a = i * inner_segments + j;
            let b = next_i * inner_segments + j;
            let c = i * inner_segments + next_j;
            let d = next_i * inner_segments + next_j;

            mesh.add_triangle(a, c, b);
            mesh.add_triangle(b, c, d);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn face_normal(mesh: &Mesh, [a, b, c]: [u32; 3]) -> Vector3<f32> {
        let p0 = mesh.vertices[a as usize].position;
        let p1 = mesh.vertices[b as usize].position;
        let p2 = mesh.vertices[c as usize].position;
        (p1 - p0).cross(&(p2 - p0))
    }

    /// Every non-degenerate triangle must face the same way as its corner normals.
    fn assert_front_faces_outward(mesh: &Mesh) {
        for tri in mesh.triangles() {
            let n = face_normal(mesh, tri);
            if n.norm() < 1e-6 {
                continue;
            }
            let avg: Vector3<f32> = tri
                .iter()
                .map(|&i| mesh.vertices[i as usize].normal)
                .sum();
            assert!(n.dot(&avg) > 0.0, "triangle {tri:?} is wound inward");
        }
    }

    #[test]
    fn unit_plane_is_two_triangles() {
        let mesh = create_plane(1.0, 1.0, 1);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.triangle_count(), 2);

        let area: f32 = mesh.triangles().map(|t| face_normal(&mesh, t).norm() / 2.0).sum();
        assert!((area - 1.0).abs() < EPS);
    }

    #[test]
    fn plane_counts_and_corner_uvs() {
        for n in [1, 2, 5, 10] {
            let (w, h) = (2.5, 1.5);
            let mesh = create_plane(w, h, n);
            assert_eq!(mesh.vertices.len(), ((n + 1) * (n + 1)) as usize);
            assert_eq!(mesh.indices.len(), (6 * n * n) as usize);
            assert_eq!(mesh.validate(), Ok(()));

            let last_row = (n * (n + 1)) as usize;
            let corners = [0, n as usize, last_row, last_row + n as usize];
            let expected = [
                Vector2::new(0.0, 0.0),
                Vector2::new(w, 0.0),
                Vector2::new(0.0, h),
                Vector2::new(w, h),
            ];
            for (index, uv) in corners.into_iter().zip(expected) {
                assert!((mesh.vertices[index].texcoord - uv).norm() < EPS);
            }
        }
    }

    #[test]
    fn plane_winding_matches_normal() {
        let mesh = create_plane(3.0, 2.0, 4);
        assert!(mesh.vertices.iter().all(|v| v.normal == Vector3::new(0.0, 0.0, -1.0)));
        assert_front_faces_outward(&mesh);
    }

    #[test]
    fn zero_subdivisions_clamps_to_one() {
        let mesh = create_plane(1.0, 1.0, 0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
    }

    #[test]
    fn cylinder_ring_layout() {
        for segments in [3, 8, 17] {
            let (h, r) = (2.0, 0.75);
            let mesh = create_cylinder(h, r, segments);
            let ring = segments as usize + 1;
            assert_eq!(mesh.vertices.len(), 2 * ring + 2);
            assert_eq!(mesh.indices.len(), 12 * segments as usize);
            assert_eq!(mesh.validate(), Ok(()));

            let top_center = 0;
            let bottom_center = ring + 1;
            assert_eq!(mesh.vertices[top_center].position, Point3::new(0.0, h / 2.0, 0.0));
            assert_eq!(mesh.vertices[bottom_center].position, Point3::new(0.0, -h / 2.0, 0.0));

            for (k, v) in mesh.vertices.iter().enumerate() {
                if k == top_center || k == bottom_center {
                    continue;
                }
                let axis_distance = Vector2::new(v.position.x, v.position.z).norm();
                assert!((axis_distance - r).abs() < EPS);
                let expected_y = if k < bottom_center { h / 2.0 } else { -h / 2.0 };
                assert!((v.position.y - expected_y).abs() < EPS);
            }
        }
    }

    #[test]
    fn cylinder_seam_vertex_is_duplicated() {
        let segments = 6;
        let mesh = create_cylinder(1.0, 1.0, segments);
        let first = mesh.vertices[1];
        let last = mesh.vertices[1 + segments as usize];
        assert!((first.position - last.position).norm() < EPS);
        assert_eq!(first.texcoord.x, 0.0);
        assert_eq!(last.texcoord.x, 1.0);
    }

    #[test]
    fn cylinder_index_ranges_stay_in_their_section() {
        let segments = 5u32;
        let mesh = create_cylinder(1.0, 1.0, segments);
        let ring = segments + 1;
        let top = 0..=ring;
        let bottom = ring + 1..=2 * ring + 1;

        let cap_len = 3 * segments as usize;
        assert!(mesh.indices[..cap_len].iter().all(|i| top.contains(i)));
        assert!(mesh.indices[cap_len..2 * cap_len].iter().all(|i| bottom.contains(i)));
        // The side wall never touches the cap centers.
        assert!(
            mesh.indices[2 * cap_len..]
                .iter()
                .all(|&i| i != 0 && i != ring + 1)
        );
    }

    #[test]
    fn cylinder_faces_outward() {
        assert_front_faces_outward(&create_cylinder(2.0, 1.0, 12));
    }

    #[test]
    fn sphere_is_not_empty_and_radial() {
        let (radius, segments) = (1.5, 8);
        let mesh = create_sphere(radius, segments);
        let columns = segments as usize + 1;
        assert_eq!(mesh.vertices.len(), columns * columns);
        assert_eq!(
            mesh.indices.len(),
            6 * segments as usize * (segments as usize - 1)
        );
        assert_eq!(mesh.validate(), Ok(()));

        for v in &mesh.vertices {
            assert!((v.position.coords.norm() - radius).abs() < EPS);
            assert!((v.normal - v.position.coords / radius).norm() < EPS);
            assert!((0.0..=1.0).contains(&v.texcoord.x));
            assert!((0.0..=1.0).contains(&v.texcoord.y));
        }
    }

    #[test]
    fn sphere_has_no_degenerate_triangles() {
        let mesh = create_sphere(1.0, 6);
        for tri in mesh.triangles() {
            assert!(face_normal(&mesh, tri).norm() > 1e-6);
        }
        assert_front_faces_outward(&mesh);
    }

    #[test]
    fn torus_vertices_lie_on_tube() {
        let (ri, ro) = (0.3, 2.0);
        let mesh = create_torus(ri, ro, 7, 11);
        assert_eq!(mesh.vertices.len(), 7 * 11);
        assert_eq!(mesh.indices.len(), 6 * 7 * 11);
        assert_eq!(mesh.validate(), Ok(()));

        let tube = (ro - ri) / 2.0;
        let center = (ro + ri) / 2.0;
        for v in &mesh.vertices {
            let radial = Vector2::new(v.position.x, v.position.z).norm() - center;
            let distance = (radial * radial + v.position.y * v.position.y).sqrt();
            assert!((distance - tube).abs() < EPS);
        }
    }

    #[test]
    fn torus_is_seamless() {
        let mesh = create_torus(0.5, 1.5, 5, 9);

        // No duplicated seam: every vertex position is unique.
        for (i, a) in mesh.vertices.iter().enumerate() {
            for b in &mesh.vertices[i + 1..] {
                assert!((a.position - b.position).norm() > 1e-4);
            }
        }

        // In a closed quad grid every vertex belongs to exactly six triangles.
        let mut uses = vec![0usize; mesh.vertices.len()];
        for &i in &mesh.indices {
            uses[i as usize] += 1;
        }
        assert!(uses.iter().all(|&n| n == 6));
        assert_front_faces_outward(&mesh);
    }

    #[test]
    fn torus_with_swapped_radii_is_clamped() {
        let mesh = create_torus(2.0, 1.0, 4, 4);
        assert_eq!(mesh.validate(), Ok(()));
        assert!(mesh.vertices.iter().all(|v| v.position.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn degenerate_parameters_never_produce_empty_meshes() {
        let shapes = [
            ShapeParams::Plane {
                width: 0.0,
                height: f32::NAN,
                subdivisions: 0,
            },
            ShapeParams::Cylinder {
                height: -1.0,
                radius: 0.0,
                segments: 0,
            },
            ShapeParams::Sphere {
                radius: 0.0,
                segments: 1,
            },
            ShapeParams::Torus {
                inner_radius: 0.0,
                outer_radius: 0.0,
                inner_segments: 0,
                outer_segments: 2,
            },
        ];
        for shape in shapes {
            let mesh = shape.build();
            assert!(!mesh.is_empty(), "{} built an empty mesh", shape.name());
            assert_eq!(mesh.validate(), Ok(()));
        }
    }

    #[test]
    fn sanitized_params_are_stable_and_build_the_same_mesh() {
        let raw = ShapeParams::Plane {
            width: f32::NAN,
            height: 2.0,
            subdivisions: 0,
        };
        assert_ne!(raw, raw);

        let clean = raw.sanitized();
        assert_eq!(clean, clean);
        assert_eq!(clean.sanitized(), clean);
        assert_eq!(
            clean,
            ShapeParams::Plane {
                width: MIN_LENGTH,
                height: 2.0,
                subdivisions: 1,
            }
        );
        assert_eq!(clean.build(), raw.build());

        let torus = ShapeParams::Torus {
            inner_radius: 2.0,
            outer_radius: 1.0,
            inner_segments: 4,
            outer_segments: 4000,
        }
        .sanitized();
        let ShapeParams::Torus {
            inner_radius,
            outer_radius,
            outer_segments,
            ..
        } = torus
        else {
            panic!("kind changed");
        };
        assert_eq!(inner_radius, 2.0);
        assert!(outer_radius > inner_radius);
        assert_eq!(outer_segments, MAX_SEGMENTS);
    }

    #[test]
    fn plane_tangents_are_orthonormal() {
        let mesh = create_plane(2.0, 3.0, 4);
        let frames = mesh.tangent_frames();
        let normal = Vector3::new(0.0, 0.0, -1.0);
        for frame in frames {
            assert!(frame.tangent.dot(&normal).abs() < EPS);
            assert!(frame.bitangent.dot(&normal).abs() < EPS);
            assert!((frame.tangent.norm() - 1.0).abs() < EPS);
            assert!((frame.bitangent.norm() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn triangle_frames_are_orthonormal_on_curved_shapes() {
        use crate::scene::mesh::triangle_tangent_frame;

        for mesh in [
            create_sphere(1.0, 12),
            create_cylinder(1.0, 0.5, 9),
            create_torus(0.4, 1.2, 8, 10),
        ] {
            for [a, b, c] in mesh.triangles() {
                let [v0, v1, v2] = [a, b, c].map(|i| mesh.vertices[i as usize]);
                let frame = triangle_tangent_frame(
                    [v0.position, v1.position, v2.position],
                    [v0.texcoord, v1.texcoord, v2.texcoord],
                    &v0.normal,
                );
                let n = v0.normal.normalize();
                assert!(frame.tangent.dot(&n).abs() < EPS);
                assert!(frame.bitangent.dot(&n).abs() < EPS);
                assert!((frame.tangent.norm() - 1.0).abs() < EPS);
                assert!((frame.bitangent.norm() - 1.0).abs() < EPS);
            }
        }
    }
}
