use crate::core::geometry::{TangentFrame, Vertex, VertexLayout};
use crate::scene::camera::Camera;
use crate::scene::light::LightRig;
use crate::scene::material::{MaterialSettings, ParallaxSettings};
use crate::scene::mesh::Mesh;
use nalgebra::{Matrix4, Vector3};

/// Opaque id of a mesh living in a `BufferSink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Receives interleaved vertex data plus triangle indices.
///
/// A GPU backend would create a vertex/index buffer pair here; the
/// wireframe viewer keeps an edge list instead.
pub trait BufferSink {
    fn upload(&mut self, vertices: &[Vertex], layout: &VertexLayout, indices: &[u32]) -> MeshHandle;

    /// Attaches one tangent frame per vertex to an uploaded mesh, replacing
    /// any earlier frames.
    fn upload_tangents(&mut self, handle: MeshHandle, frames: &[TangentFrame], layout: &VertexLayout);

    /// Frees a previous upload. Unknown handles are ignored.
    fn release(&mut self, handle: MeshHandle);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vector3<f32>),
    Mat4(Matrix4<f32>),
}

/// Receives named shader uniforms.
pub trait UniformSink {
    fn set_uniform(&mut self, name: &str, value: UniformValue);
}

pub const VIEW_PROJECTION: &str = "_ViewProjection";
pub const CAMERA_POSITION: &str = "_cameraPosition";
pub const ACTIVE_LIGHTS: &str = "_activeLights";
pub const MODEL: &str = "_Model";

pub const AMBIENT_K: &str = "_material.ambientK";
pub const DIFFUSE_K: &str = "_material.diffuseK";
pub const SPECULAR_K: &str = "_material.specularK";
pub const SHININESS: &str = "_material.shininess";
pub const AMBIENT_COLOR: &str = "_ambientColor";

pub const PARALLAX_METHOD: &str = "_parallaxMethod";
pub const DISCARD_OUT_OF_BOUNDS: &str = "_discardOutOfBoundFrags";
pub const HEIGHT_SCALE: &str = "_heightScale";
pub const MIN_LAYERS: &str = "_minLayers";
pub const MAX_LAYERS: &str = "_maxLayers";

pub fn light_position_name(index: usize) -> String {
    format!("_lights[{index}].position")
}

pub fn light_color_name(index: usize) -> String {
    format!("_lights[{index}].color")
}

/// Uploads a mesh with the standard `Vertex` layout.
pub fn upload_mesh<S: BufferSink + ?Sized>(sink: &mut S, mesh: &Mesh) -> MeshHandle {
    sink.upload(&mesh.vertices, &Vertex::layout(), &mesh.indices)
}

/// Uploads a mesh followed by its tangent frames.
pub fn upload_mesh_with_tangents<S: BufferSink + ?Sized>(
    sink: &mut S,
    mesh: &Mesh,
    frames: &[TangentFrame],
) -> MeshHandle {
    let handle = upload_mesh(sink, mesh);
    sink.upload_tangents(handle, frames, &TangentFrame::layout());
    handle
}

/// Pushes the per-frame camera and light uniforms.
pub fn upload_frame_uniforms<S: UniformSink + ?Sized>(sink: &mut S, camera: &Camera, rig: &LightRig) {
    sink.set_uniform(VIEW_PROJECTION, UniformValue::Mat4(camera.view_projection()));
    sink.set_uniform(CAMERA_POSITION, UniformValue::Vec3(camera.position.coords));

    let lights = rig.active_lights();
    sink.set_uniform(ACTIVE_LIGHTS, UniformValue::Int(lights.len() as i32));
    for (i, light) in lights.iter().enumerate() {
        sink.set_uniform(&light_position_name(i), UniformValue::Vec3(light.position.coords));
        sink.set_uniform(&light_color_name(i), UniformValue::Vec3(light.color));
    }
}

/// Pushes the shading coefficients. Layer counts go out as floats.
pub fn upload_material_uniforms<S: UniformSink + ?Sized>(
    sink: &mut S,
    material: &MaterialSettings,
    parallax: &ParallaxSettings,
) {
    sink.set_uniform(AMBIENT_K, UniformValue::Float(material.ambient_k));
    sink.set_uniform(AMBIENT_COLOR, UniformValue::Vec3(material.ambient_color));
    sink.set_uniform(DIFFUSE_K, UniformValue::Float(material.diffuse_k));
    sink.set_uniform(SPECULAR_K, UniformValue::Float(material.specular_k));
    sink.set_uniform(SHININESS, UniformValue::Float(material.shininess));

    sink.set_uniform(PARALLAX_METHOD, UniformValue::Int(parallax.method.index()));
    sink.set_uniform(
        DISCARD_OUT_OF_BOUNDS,
        UniformValue::Int(parallax.discard_out_of_bounds as i32),
    );
    sink.set_uniform(HEIGHT_SCALE, UniformValue::Float(parallax.height_scale));
    sink.set_uniform(MIN_LAYERS, UniformValue::Float(parallax.min_layers as f32));
    sink.set_uniform(MAX_LAYERS, UniformValue::Float(parallax.max_layers as f32));
}

/// Sets the per-draw model matrix.
pub fn upload_model<S: UniformSink + ?Sized>(sink: &mut S, model: &Matrix4<f32>) {
    sink.set_uniform(MODEL, UniformValue::Mat4(*model));
}
