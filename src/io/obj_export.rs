use crate::scene::mesh::{Mesh, MeshError};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("refusing to export invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),
    #[error("failed to write OBJ: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes `mesh` as a Wavefront OBJ object named `name`.
///
/// Every vertex carries its own position, texcoord and normal, so faces use the
/// same 1-based index for all three streams.
pub fn write_obj<W: Write>(mesh: &Mesh, name: &str, writer: &mut W) -> Result<(), ExportError> {
    mesh.validate()?;

    writeln!(writer, "# {} vertices, {} triangles", mesh.vertices.len(), mesh.triangle_count())?;
    writeln!(writer, "o {name}")?;
    for v in &mesh.vertices {
        writeln!(writer, "v {} {} {}", v.position.x, v.position.y, v.position.z)?;
    }
    for v in &mesh.vertices {
        writeln!(writer, "vt {} {}", v.texcoord.x, v.texcoord.y)?;
    }
    for v in &mesh.vertices {
        writeln!(writer, "vn {} {} {}", v.normal.x, v.normal.y, v.normal.z)?;
    }
    for [a, b, c] in mesh.triangles() {
        let (a, b, c) = (a + 1, b + 1, c + 1);
        writeln!(writer, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
    }
    Ok(())
}

pub fn export_obj<P: AsRef<Path>>(mesh: &Mesh, name: &str, path: P) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_obj(mesh, name, &mut writer)?;
    writer.flush()?;
    info!("Exported '{}' to {}", name, path.display());
    Ok(())
}
