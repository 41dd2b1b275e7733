use crate::data_structures::model::{Mesh, ModelVertex};

/**
 * Flattens every model of an OBJ file into one indexed mesh. Files without
 * normals get face normals averaged per vertex.
 */
pub fn merge_models(models: &[tobj::Model], name: &str) -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for m in models {
        let base = vertices.len() as u32;
        vertices.extend((0..m.mesh.positions.len() / 3).map(|i| ModelVertex {
            position: [
                m.mesh.positions[i * 3],
                m.mesh.positions[i * 3 + 1],
                m.mesh.positions[i * 3 + 2],
            ],
            tex_coords: [
                m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        }));
        indices.extend(m.mesh.indices.iter().map(|i| base + i));
    }

    let mut mesh = Mesh::new(name, vertices, indices);
    mesh.compute_flat_normals_if_missing();
    mesh
}

/// Rejects meshes the draw path cannot handle.
pub fn validate(mesh: &Mesh) -> Result<(), String> {
    if mesh.is_empty() {
        return Err("file contains no triangles".to_string());
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(format!("{} indices do not form triangles", mesh.indices.len()));
    }
    let count = mesh.vertices.len() as u32;
    if let Some(bad) = mesh.indices.iter().find(|&&i| i >= count) {
        return Err(format!("index {bad} out of range for {count} vertices"));
    }
    Ok(())
}
