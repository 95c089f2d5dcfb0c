use crate::core::geometry::{TangentFrame, Vertex, VertexLayout};
use crate::core::math::transform::{apply_perspective_division, ndc_to_screen};
use crate::pipeline::sink::{BufferSink, MODEL, MeshHandle, UniformSink, UniformValue, VIEW_PROJECTION};
use egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};
use log::{debug, warn};
use nalgebra::{Matrix4, Point3, Vector3, Vector4};
use std::collections::{BTreeSet, HashMap};

/// How uploaded meshes are painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub color: Color32,
    pub stroke_width: f32,
    /// Draw only the vertices instead of the edges.
    pub draw_as_points: bool,
    /// Skip triangles whose screen-space winding is clockwise.
    pub cull_back_faces: bool,
    /// Also paint each vertex's tangent (red) and bitangent (green).
    pub show_tangents: bool,
}

/// World-space length of the tangent preview lines.
pub const TANGENT_PREVIEW_LENGTH: f32 = 0.15;

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            color: Color32::from_rgb(230, 230, 230),
            stroke_width: 1.0,
            draw_as_points: false,
            cull_back_faces: false,
            show_tangents: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct EdgeMesh {
    positions: Vec<Point3<f32>>,
    triangles: Vec<[u32; 3]>,
    /// Unique undirected edges, smaller index first.
    edges: Vec<[u32; 2]>,
    tangents: Vec<TangentFrame>,
}

impl EdgeMesh {
    fn new(vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_count = vertices.len();
        let triangles: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .filter(|t| t.iter().all(|&i| (i as usize) < vertex_count))
            .collect();
        if triangles.len() * 3 != indices.len() {
            warn!(
                "Dropped {} malformed index entries on upload",
                indices.len() - triangles.len() * 3
            );
        }

        let mut edges = BTreeSet::new();
        for &[a, b, c] in &triangles {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                edges.insert([u.min(v), u.max(v)]);
            }
        }

        Self {
            positions: vertices.iter().map(|v| v.position).collect(),
            triangles,
            edges: edges.into_iter().collect(),
            tangents: Vec::new(),
        }
    }
}

/// Clips a clip-space segment against the near plane (`z >= -w`).
fn clip_segment(a: Vector4<f32>, b: Vector4<f32>) -> Option<(Vector4<f32>, Vector4<f32>)> {
    let da = a.z + a.w;
    let db = b.z + b.w;
    match (da >= 0.0, db >= 0.0) {
        (true, true) => Some((a, b)),
        (false, false) => None,
        (true, false) => Some((a, a + (b - a) * (da / (da - db)))),
        (false, true) => Some((a + (b - a) * (da / (da - db)), b)),
    }
}

fn clip_to_screen(clip: &Vector4<f32>, size: Vec2) -> Pos2 {
    let ndc = apply_perspective_division(clip);
    let screen = ndc_to_screen(ndc.x, ndc.y, size.x, size.y);
    Pos2::new(screen.x, screen.y)
}

/// Line-drawing stand-in for a GPU backend.
///
/// Implements both collaborator seams: uploads become edge lists, uniforms are
/// remembered until the next draw. Only `_ViewProjection` affects drawing.
#[derive(Debug, Default)]
pub struct WireframeRenderer {
    meshes: HashMap<MeshHandle, EdgeMesh>,
    uniforms: HashMap<String, UniformValue>,
    next_id: u32,
}

impl BufferSink for WireframeRenderer {
    fn upload(&mut self, vertices: &[Vertex], layout: &VertexLayout, indices: &[u32]) -> MeshHandle {
        let handle = MeshHandle(self.next_id);
        self.next_id += 1;
        let mesh = EdgeMesh::new(vertices, indices);
        debug!(
            "Uploaded mesh {}: {} vertices (stride {}), {} triangles, {} edges",
            handle.0,
            vertices.len(),
            layout.stride,
            mesh.triangles.len(),
            mesh.edges.len()
        );
        self.meshes.insert(handle, mesh);
        handle
    }

    fn upload_tangents(&mut self, handle: MeshHandle, frames: &[TangentFrame], layout: &VertexLayout) {
        let Some(mesh) = self.meshes.get_mut(&handle) else {
            warn!("Tangents for unknown mesh {} ignored", handle.0);
            return;
        };
        if frames.len() != mesh.positions.len() {
            warn!(
                "Mesh {} has {} vertices but got {} tangent frames, ignoring",
                handle.0,
                mesh.positions.len(),
                frames.len()
            );
            return;
        }
        debug!(
            "Uploaded {} tangent frames (stride {}) for mesh {}",
            frames.len(),
            layout.stride,
            handle.0
        );
        mesh.tangents = frames.to_vec();
    }

    fn release(&mut self, handle: MeshHandle) {
        if self.meshes.remove(&handle).is_some() {
            debug!("Released mesh {}", handle.0);
        }
    }
}

impl UniformSink for WireframeRenderer {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_string(), value);
    }
}

impl WireframeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn edge_count(&self, handle: MeshHandle) -> Option<usize> {
        self.meshes.get(&handle).map(|m| m.edges.len())
    }

    pub fn tangent_count(&self, handle: MeshHandle) -> Option<usize> {
        self.meshes.get(&handle).map(|m| m.tangents.len())
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    fn matrix_uniform(&self, name: &str) -> Matrix4<f32> {
        match self.uniforms.get(name) {
            Some(UniformValue::Mat4(m)) => *m,
            _ => Matrix4::identity(),
        }
    }

    fn view_projection(&self) -> Matrix4<f32> {
        self.matrix_uniform(VIEW_PROJECTION)
    }

    /// Projects a world-space point into a viewport of `size`, or `None` if it
    /// lies behind the near plane.
    pub fn project_point(&self, point: &Point3<f32>, size: Vec2) -> Option<Pos2> {
        let clip = self.view_projection() * point.to_homogeneous();
        (clip.z + clip.w >= 0.0).then(|| clip_to_screen(&clip, size))
    }

    /// Screen positions of every visible vertex of `handle`.
    pub fn project_vertices(&self, handle: MeshHandle, model: &Matrix4<f32>, size: Vec2) -> Vec<Pos2> {
        let Some(mesh) = self.meshes.get(&handle) else {
            return Vec::new();
        };
        let mvp = self.view_projection() * model;
        mesh.positions
            .iter()
            .map(|p| mvp * p.to_homogeneous())
            .filter(|c| c.z + c.w >= 0.0)
            .map(|c| clip_to_screen(&c, size))
            .collect()
    }

    /// Screen-space tangent and bitangent lines of `handle`, `length` long in
    /// object space. Empty until tangents were uploaded.
    pub fn project_tangents(
        &self,
        handle: MeshHandle,
        model: &Matrix4<f32>,
        size: Vec2,
        length: f32,
    ) -> (Vec<[Pos2; 2]>, Vec<[Pos2; 2]>) {
        let Some(mesh) = self.meshes.get(&handle) else {
            return (Vec::new(), Vec::new());
        };
        let mvp = self.view_projection() * model;
        let line = |from: &Point3<f32>, dir: &Vector3<f32>| {
            let a = mvp * from.to_homogeneous();
            let b = mvp * (from + dir * length).to_homogeneous();
            clip_segment(a, b).map(|(a, b)| [clip_to_screen(&a, size), clip_to_screen(&b, size)])
        };

        let mut tangents = Vec::with_capacity(mesh.tangents.len());
        let mut bitangents = Vec::with_capacity(mesh.tangents.len());
        for (p, frame) in mesh.positions.iter().zip(&mesh.tangents) {
            tangents.extend(line(p, &frame.tangent));
            bitangents.extend(line(p, &frame.bitangent));
        }
        (tangents, bitangents)
    }

    /// Screen-space line segments for `handle`, clipped at the near plane.
    pub fn project_edges(
        &self,
        handle: MeshHandle,
        model: &Matrix4<f32>,
        size: Vec2,
        cull_back_faces: bool,
    ) -> Vec<[Pos2; 2]> {
        let Some(mesh) = self.meshes.get(&handle) else {
            return Vec::new();
        };
        let mvp = self.view_projection() * model;
        let clip: Vec<Vector4<f32>> = mesh.positions.iter().map(|p| mvp * p.to_homogeneous()).collect();
        let segment = |a: usize, b: usize| {
            clip_segment(clip[a], clip[b])
                .map(|(a, b)| [clip_to_screen(&a, size), clip_to_screen(&b, size)])
        };

        if !cull_back_faces {
            return mesh
                .edges
                .iter()
                .filter_map(|&[a, b]| segment(a as usize, b as usize))
                .collect();
        }

        let mut segments = Vec::new();
        for &tri in &mesh.triangles {
            let [a, b, c] = tri.map(|i| i as usize);
            let corners = [clip[a], clip[b], clip[c]];
            // Facing is undefined once a corner is behind the eye.
            if corners.iter().any(|v| v.w <= 1e-6) {
                continue;
            }
            let ndc = corners.map(|v| v.xy() / v.w);
            let area = (ndc[1] - ndc[0]).perp(&(ndc[2] - ndc[0]));
            if area <= 0.0 {
                continue;
            }
            segments.extend([segment(a, b), segment(b, c), segment(c, a)].into_iter().flatten());
        }
        segments
    }

    /// Paints `handle` into `rect` using the bound `_Model` matrix. Returns the
    /// number of primitives (segments or points) painted.
    pub fn draw(&self, handle: MeshHandle, style: &DrawStyle, painter: &Painter, rect: Rect) -> usize {
        let origin = rect.min.to_vec2();
        let model = &self.matrix_uniform(MODEL);

        if style.show_tangents {
            let (tangents, bitangents) =
                self.project_tangents(handle, model, rect.size(), TANGENT_PREVIEW_LENGTH);
            for (lines, color) in [(tangents, Color32::RED), (bitangents, Color32::GREEN)] {
                for [a, b] in lines {
                    painter.line_segment([a + origin, b + origin], Stroke::new(1.0, color));
                }
            }
        }

        if style.draw_as_points {
            let points = self.project_vertices(handle, model, rect.size());
            for p in &points {
                painter.circle_filled(*p + origin, style.stroke_width + 1.0, style.color);
            }
            return points.len();
        }

        let segments = self.project_edges(handle, model, rect.size(), style.cull_back_faces);
        let stroke = Stroke::new(style.stroke_width, style.color);
        for [a, b] in &segments {
            painter.line_segment([*a + origin, *b + origin], stroke);
        }
        segments.len()
    }
}
