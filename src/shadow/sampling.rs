//! CPU side of the shadow test.
//!
//! Mirrors what the shading program does per fragment, so the classification
//! rules can be checked without a GPU: project into light space, remap x/y
//! from clip space to texture space (y flipped, texture origin is top left),
//! compare the fragment's light depth minus the bias with the stored depth.

use cgmath::Point3;

use crate::shadow::LightSpaceMatrix;

/// A fragment's position in shadow-map texture space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCoord {
    pub u: f32,
    pub v: f32,
    /// Depth in the light's 0..1 range.
    pub depth: f32,
}

impl ShadowCoord {
    pub fn from_world(light_space: &LightSpaceMatrix, world: Point3<f32>) -> Self {
        let ndc = light_space.project(world);
        Self {
            u: ndc.x * 0.5 + 0.5,
            v: -ndc.y * 0.5 + 0.5,
            depth: ndc.z,
        }
    }

    /// Inside the light frustum: the map has an opinion about this fragment.
    pub fn in_coverage(&self) -> bool {
        (0.0..=1.0).contains(&self.u)
            && (0.0..=1.0).contains(&self.v)
            && (0.0..=1.0).contains(&self.depth)
    }
}

/// Result of the per-fragment shadow test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowTest {
    Lit,
    Shadowed,
    /// Outside the light's frustum; treated as lit.
    OutsideCoverage,
}

impl ShadowTest {
    pub fn is_shadowed(&self) -> bool {
        matches!(self, ShadowTest::Shadowed)
    }
}

/// Anything the shadow test can read stored depths from.
pub trait DepthSampler {
    /// Nearest stored depth at texture coordinates in 0..1.
    fn sample(&self, u: f32, v: f32) -> f32;
}

/// A depth map held in memory, row-major from the top-left texel.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    resolution: u32,
    texels: Vec<f32>,
}

impl DepthMap {
    /// A freshly cleared map (every texel at the far plane).
    pub fn cleared(resolution: u32, depth: f32) -> Self {
        Self {
            resolution,
            texels: vec![depth; (resolution as usize) * (resolution as usize)],
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn texel(&self, x: u32, y: u32) -> f32 {
        self.texels[(y * self.resolution + x) as usize]
    }

    /// Depth test with `Less` and write, as the depth program does.
    pub fn write_nearest(&mut self, x: u32, y: u32, depth: f32) {
        let idx = (y * self.resolution + x) as usize;
        if depth < self.texels[idx] {
            self.texels[idx] = depth;
        }
    }

    /// Texel containing texture coordinate `t` along one axis.
    pub fn texel_index(&self, t: f32) -> u32 {
        let max = self.resolution.saturating_sub(1);
        ((t * self.resolution as f32).floor().max(0.0) as u32).min(max)
    }
}

impl DepthSampler for DepthMap {
    fn sample(&self, u: f32, v: f32) -> f32 {
        // An empty map occludes nothing.
        if self.texels.is_empty() {
            return 1.0;
        }
        self.texel(self.texel_index(u), self.texel_index(v))
    }
}

/// Compare a fragment against the stored depth.
pub fn classify<S: DepthSampler + ?Sized>(map: &S, coord: ShadowCoord, bias: f32) -> ShadowTest {
    if !coord.in_coverage() {
        return ShadowTest::OutsideCoverage;
    }
    let stored = map.sample(coord.u, coord.v);
    if coord.depth - bias > stored {
        ShadowTest::Shadowed
    } else {
        ShadowTest::Lit
    }
}

/// Full per-fragment test from a world position.
pub fn shadow_test<S: DepthSampler + ?Sized>(
    map: &S,
    light_space: &LightSpaceMatrix,
    world: Point3<f32>,
    bias: f32,
) -> ShadowTest {
    classify(map, ShadowCoord::from_world(light_space, world), bias)
}
