use nalgebra::{Point3, Vector2, Vector3};
use std::mem::{offset_of, size_of};

/// Represents a single vertex in 3D space.
///
/// The struct is `repr(C)` so its byte layout can be described to a GPU
/// buffer sink through [`VertexLayout`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector for lighting calculations.
    pub normal: Vector3<f32>,
    /// Texture coordinates (UV).
    pub texcoord: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }

    /// Attribute layout matching the in-memory representation of `Vertex`.
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: size_of::<Vertex>(),
            attributes: vec![
                VertexAttribute {
                    location: 0,
                    name: "vPos",
                    components: 3,
                    offset: offset_of!(Vertex, position),
                },
                VertexAttribute {
                    location: 1,
                    name: "vNormal",
                    components: 3,
                    offset: offset_of!(Vertex, normal),
                },
                VertexAttribute {
                    location: 2,
                    name: "vUV",
                    components: 2,
                    offset: offset_of!(Vertex, texcoord),
                },
            ],
        }
    }
}

/// Per-vertex tangent space basis used for normal/parallax mapping.
///
/// Uploaded as a second buffer next to the `Vertex` data, one frame per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentFrame {
    pub tangent: Vector3<f32>,
    pub bitangent: Vector3<f32>,
}

impl TangentFrame {
    /// Attribute layout of a tangent buffer, continuing after the `Vertex` locations.
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: size_of::<TangentFrame>(),
            attributes: vec![
                VertexAttribute {
                    location: 3,
                    name: "vTangent",
                    components: 3,
                    offset: offset_of!(TangentFrame, tangent),
                },
                VertexAttribute {
                    location: 4,
                    name: "vBitangent",
                    components: 3,
                    offset: offset_of!(TangentFrame, bitangent),
                },
            ],
        }
    }
}

impl Default for TangentFrame {
    fn default() -> Self {
        Self {
            tangent: Vector3::x(),
            bitangent: Vector3::y(),
        }
    }
}

/// One float attribute inside an interleaved vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader attribute location.
    pub location: u32,
    pub name: &'static str,
    /// Number of `f32` components.
    pub components: usize,
    /// Byte offset from the start of the vertex.
    pub offset: usize,
}

/// Describes how an interleaved vertex buffer is laid out in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Size of one vertex in bytes.
    pub stride: usize,
    pub attributes: Vec<VertexAttribute>,
}
