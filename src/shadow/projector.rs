use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};

use crate::{camera::OPENGL_TO_WGPU_MATRIX, config::ShadowSettings};

/// Projection × view of the light, in wgpu clip space (depth 0..1).
///
/// Computed once per frame and handed unchanged to both passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpaceMatrix(pub Matrix4<f32>);

impl LightSpaceMatrix {
    pub fn matrix(&self) -> Matrix4<f32> {
        self.0
    }

    /// Clip-space position after the perspective divide.
    pub fn project(&self, world: Point3<f32>) -> Vector3<f32> {
        let clip = self.0 * Vector4::new(world.x, world.y, world.z, 1.0);
        clip.truncate() / clip.w
    }

    pub fn inverse(&self) -> Option<Matrix4<f32>> {
        self.0.invert()
    }
}

impl From<LightSpaceMatrix> for Matrix4<f32> {
    fn from(value: LightSpaceMatrix) -> Self {
        value.0
    }
}

/// Orthographic projection over `±half_extent` with the given depth range,
/// looking from `light_position` at the origin with +Y up.
///
/// A light straight above or below the origin is colinear with the up axis
/// and has no defined view; see [`LightProjector::accepts`].
pub fn compute_light_space_matrix(
    light_position: Point3<f32>,
    half_extent: f32,
    near: f32,
    far: f32,
) -> LightSpaceMatrix {
    let projection = OPENGL_TO_WGPU_MATRIX
        * cgmath::ortho(-half_extent, half_extent, -half_extent, half_extent, near, far);
    let view = Matrix4::look_at_rh(light_position, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());
    LightSpaceMatrix(projection * view)
}

/// Builds the light-space transform from the startup shadow settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightProjector {
    half_extent: f32,
    near: f32,
    far: f32,
}

impl LightProjector {
    const MIN_HORIZONTAL_DISTANCE: f32 = 1e-3;

    pub fn new(settings: &ShadowSettings) -> Self {
        Self {
            half_extent: settings.half_extent,
            near: settings.near,
            far: settings.far,
        }
    }

    pub fn compute_light_space_matrix(&self, light_position: Point3<f32>) -> LightSpaceMatrix {
        compute_light_space_matrix(light_position, self.half_extent, self.near, self.far)
    }

    /// Whether a look-at from `light_position` to the origin is well defined.
    pub fn accepts(light_position: Point3<f32>) -> bool {
        let offset = light_position - Point3::new(0.0, 0.0, 0.0);
        let horizontal = Vector3::new(offset.x, 0.0, offset.z);
        offset.magnitude2() > 0.0 && horizontal.magnitude() > Self::MIN_HORIZONTAL_DISTANCE
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    pub fn depth_range(&self) -> (f32, f32) {
        (self.near, self.far)
    }
}
