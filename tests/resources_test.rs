use std::path::PathBuf;

use futures::executor::block_on;
use umbra::{RenderError, resources};

const TRIANGLE_OBJ: &str = "\
o tri
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
f 1/1 2/2 3/3
";

const QUAD_OBJ: &str = "\
v -1.0 0.0 -1.0
v -1.0 0.0 1.0
v 1.0 0.0 1.0
v 1.0 0.0 -1.0
f 1 2 3 4
";

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("umbra-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn obj_without_normals_gets_face_normals() {
    let path = write_temp("tri.obj", TRIANGLE_OBJ);
    let mesh = block_on(resources::load_mesh(&path)).unwrap();

    assert_eq!(mesh.primitive_count(), 1);
    for vertex in &mesh.vertices {
        assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
    }
    // Texture v runs top-down on the GPU
    assert_eq!(mesh.vertices[2].tex_coords, [0.0, 0.0]);
    assert_eq!(mesh.vertices[0].tex_coords, [0.0, 1.0]);
    std::fs::remove_file(path).ok();
}

#[test]
fn polygons_are_triangulated() {
    let path = write_temp("quad.obj", QUAD_OBJ);
    let mesh = block_on(resources::load_mesh(&path)).unwrap();
    assert_eq!(mesh.primitive_count(), 2);
    std::fs::remove_file(path).ok();
}

#[test]
fn missing_mesh_is_an_asset_error() {
    let path = PathBuf::from("does/not/exist.obj");
    let result = block_on(resources::load_mesh(&path));
    match result {
        Err(RenderError::AssetLoad { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected an asset error, got {other:?}"),
    }
}

#[test]
fn empty_obj_is_rejected() {
    let path = write_temp("empty.obj", "# nothing here\n");
    let result = block_on(resources::load_mesh(&path));
    assert!(matches!(result, Err(RenderError::AssetLoad { .. })));
    std::fs::remove_file(path).ok();
}

#[test]
fn undecodable_texture_is_an_asset_error() {
    let path = write_temp("broken.png", "not a png");
    let result = resources::load_image(&path);
    assert!(matches!(result, Err(RenderError::AssetLoad { .. })));
    std::fs::remove_file(path).ok();
}

#[test]
fn procedural_meshes_are_valid() {
    use resources::{mesh::validate, primitives};

    for mesh in [
        primitives::ground(),
        primitives::cube(0.5),
        primitives::sphere(0.75, 12, 16),
        primitives::screen_quad(),
    ] {
        assert!(validate(&mesh).is_ok(), "{}", mesh.name);
    }
    assert_eq!(primitives::cube(0.5).primitive_count(), 12);
}
