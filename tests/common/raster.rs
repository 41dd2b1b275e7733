//! Software depth rasterizer for the recorded shadow pass.
//!
//! Replays every depth-program draw into a [`DepthMap`] the same way the GPU
//! fills the shadow map: ortho projection, pixel-centre sampling, `Less` test.

use umbra::{
    cgmath::Vector4,
    device::{Program, Target, recording::RecordingDevice},
    shadow::DepthMap,
};

fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

/// Rasterize the recorded shadow-pass draws at `resolution`.
pub fn rasterize_depth(device: &RecordingDevice, resolution: u32) -> DepthMap {
    let mut map = DepthMap::cleared(resolution, 1.0);
    let res = resolution as f32;

    for call in device.draw_calls() {
        if call.program != Some(Program::Depth) || !matches!(call.target, Target::DepthMap(_)) {
            continue;
        }
        let light_space = call.light_space.expect("depth draws follow a light-space upload");
        let mesh = device.mesh(call.geometry).expect("draw of a known geometry");
        let mvp = light_space * call.model;

        for triangle in mesh.triangles() {
            let screen = triangle.map(|p| {
                let clip = mvp * Vector4::new(p.x, p.y, p.z, 1.0);
                let ndc = clip.truncate() / clip.w;
                ((ndc.x * 0.5 + 0.5) * res, (-ndc.y * 0.5 + 0.5) * res, ndc.z)
            });
            let [a, b, c] = screen;
            let area = edge((a.0, a.1), (b.0, b.1), (c.0, c.1));
            if area.abs() < f32::EPSILON {
                continue;
            }

            let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as u32;
            let max_x = (a.0.max(b.0).max(c.0).ceil().max(0.0) as u32).min(resolution);
            let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as u32;
            let max_y = (a.1.max(b.1).max(c.1).ceil().max(0.0) as u32).min(resolution);

            for y in min_y..max_y {
                for x in min_x..max_x {
                    let p = (x as f32 + 0.5, y as f32 + 0.5);
                    let w0 = edge((b.0, b.1), (c.0, c.1), p) / area;
                    let w1 = edge((c.0, c.1), (a.0, a.1), p) / area;
                    let w2 = edge((a.0, a.1), (b.0, b.1), p) / area;
                    if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                        continue;
                    }
                    let depth = w0 * a.2 + w1 * b.2 + w2 * c.2;
                    if (0.0..=1.0).contains(&depth) {
                        map.write_nearest(x, y, depth);
                    }
                }
            }
        }
    }
    map
}
