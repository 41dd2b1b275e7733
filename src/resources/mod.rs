use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{data_structures::model::Mesh, error::RenderError};

/**
 * This module contains all logic for loading meshes and textures from
 * external files, plus the procedural stand-ins the demo scene uses.
 */
pub mod mesh;
pub mod primitives;
pub mod texture;

pub use texture::{load_image, load_texture};

/// Load an OBJ file into a single triangulated mesh.
///
/// Materials are ignored; every instance is textured by the scene.
pub async fn load_mesh(path: &Path) -> Result<Mesh, RenderError> {
    let obj_text = texture::load_string(path).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, _materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| async move { Ok(Default::default()) },
    )
    .await
    .map_err(|e| RenderError::asset(path, e))?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mesh".to_string());
    let mesh = mesh::merge_models(&models, &name);
    mesh::validate(&mesh).map_err(|reason| RenderError::asset(path, reason))?;
    log::info!(
        "Loaded {:?}: {} vertices, {} triangles",
        path,
        mesh.vertices.len(),
        mesh.primitive_count()
    );
    Ok(mesh)
}
