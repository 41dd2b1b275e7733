use crate::{
    device::{Clear, GraphicsDevice, Program, Target, Uniform, Viewport},
    scene::{AnimationState, RenderableInstance},
    shadow::{DepthTarget, LightSpaceMatrix},
};

/// Draw counts of one pass, mostly for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub draws: usize,
}

/// Renders shadow casters from the light into the depth target.
///
/// Only depth is written. Lighting, textures and blending are never touched,
/// and the viewport follows the shadow-map resolution, not the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowPass {
    clear_depth: f32,
}

impl Default for ShadowPass {
    fn default() -> Self {
        Self { clear_depth: 1.0 }
    }
}

impl ShadowPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves the default target bound on return.
    pub fn render<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        target: &DepthTarget,
        light_space: LightSpaceMatrix,
        instances: &[RenderableInstance],
        animation: &AnimationState,
    ) -> PassStats {
        device.bind_target(Target::DepthMap(target.texture()));
        device.set_viewport(Viewport::square(target.resolution()));
        device.clear(Clear::depth_only(self.clear_depth));

        device.use_program(Program::Depth);
        device.upload(Uniform::LightSpace(light_space.matrix()));

        let mut stats = PassStats::default();
        for instance in instances.iter().filter(|i| i.casts_shadow) {
            device.upload(Uniform::Model(instance.model_matrix(animation)));
            device.draw(instance.geometry);
            stats.draws += 1;
        }

        device.bind_target(Target::Default);
        stats
    }
}
