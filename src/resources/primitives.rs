//! Procedural geometry and textures.
//!
//! All meshes are indexed triangle lists, counter-clockwise when seen from
//! outside, with unit-length normals.

use std::f32::consts::PI;

use cgmath::Vector3;

use crate::data_structures::model::{Mesh, ModelVertex};

/// Square ground plane facing +Y at height `y`, texture repeated `uv_repeat`
/// times across it.
pub fn plane(half_extent: f32, y: f32, uv_repeat: f32) -> Mesh {
    let s = half_extent;
    let n = [0.0, 1.0, 0.0];
    let vertices = vec![
        ModelVertex::new([-s, y, -s], n, [0.0, 0.0]),
        ModelVertex::new([-s, y, s], n, [0.0, uv_repeat]),
        ModelVertex::new([s, y, s], n, [uv_repeat, uv_repeat]),
        ModelVertex::new([s, y, -s], n, [uv_repeat, 0.0]),
    ];
    Mesh::new("plane", vertices, vec![0, 1, 2, 0, 2, 3])
}

/// The ground plane of the demo scene.
pub fn ground() -> Mesh {
    plane(25.0, -0.5, 25.0)
}

/// Axis-aligned cube centred on the origin.
pub fn cube(half_extent: f32) -> Mesh {
    // (normal, u, v) with u x v == normal
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let n = Vector3::from(normal);
        let u = Vector3::from(u);
        let v = Vector3::from(v);
        let base = vertices.len() as u32;
        for (su, sv) in corners {
            let p = (n + u * su + v * sv) * half_extent;
            vertices.push(ModelVertex::new(
                p.into(),
                normal,
                [(su + 1.0) * 0.5, (1.0 - sv) * 0.5],
            ));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Mesh::new("cube", vertices, indices)
}

/// UV sphere centred on the origin.
pub fn sphere(radius: f32, stacks: u32, slices: u32) -> Mesh {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
    for i in 0..=stacks {
        let phi = PI * i as f32 / stacks as f32;
        for j in 0..=slices {
            let theta = 2.0 * PI * j as f32 / slices as f32;
            let n = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
            vertices.push(ModelVertex::new(
                [n[0] * radius, n[1] * radius, n[2] * radius],
                n,
                [j as f32 / slices as f32, i as f32 / stacks as f32],
            ));
        }
    }

    let row = slices + 1;
    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + row;
            let c = b + 1;
            let d = a + 1;
            indices.extend_from_slice(&[a, d, b, d, c, b]);
        }
    }
    Mesh::new("sphere", vertices, indices)
}

/// Two triangles covering clip space, for full-screen passes.
pub fn screen_quad() -> Mesh {
    let n = [0.0, 0.0, 1.0];
    let vertices = vec![
        ModelVertex::new([-1.0, -1.0, 0.0], n, [0.0, 1.0]),
        ModelVertex::new([1.0, -1.0, 0.0], n, [1.0, 1.0]),
        ModelVertex::new([1.0, 1.0, 0.0], n, [1.0, 0.0]),
        ModelVertex::new([-1.0, 1.0, 0.0], n, [0.0, 0.0]),
    ];
    Mesh::new("screen quad", vertices, vec![0, 1, 2, 0, 2, 3])
}

/// Two-tone checkerboard used when no diffuse texture is given.
pub fn checker(size: u32, cells: u32) -> image::DynamicImage {
    let cell = (size / cells.max(1)).max(1);
    let img = image::RgbaImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            image::Rgba([200, 200, 200, 255])
        } else {
            image::Rgba([120, 120, 130, 255])
        }
    });
    image::DynamicImage::ImageRgba8(img)
}
