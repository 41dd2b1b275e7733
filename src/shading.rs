//! Camera pass: lights the scene and attenuates it with the shadow map.

use cgmath::{Matrix4, Point3, Vector3};

use crate::{
    config::{Attenuation, ShadowSettings},
    data_structures::instance::normal_matrix,
    device::{Clear, GeometryHandle, GraphicsDevice, Program, SamplerUnit, TextureHandle, Uniform, Viewport},
    resources::primitives,
    scene::{AnimationState, RenderableInstance},
    shadow::{LightSpaceMatrix, PassStats},
};

/// Everything the shading pass reads besides the instances.
#[derive(Debug, Clone, Copy)]
pub struct ShadingInputs<'a> {
    pub viewport: Viewport,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub camera_position: Point3<f32>,
    pub light_position: Point3<f32>,
    pub light_color: Vector3<f32>,
    /// Must be the matrix the shadow pass of the same frame rendered with.
    pub light_space: LightSpaceMatrix,
    pub shadow_map: TextureHandle,
    pub clear_color: wgpu::Color,
    pub shadow: &'a ShadowSettings,
    pub attenuation: Attenuation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShadingPass;

impl ShadingPass {
    pub fn new() -> Self {
        Self
    }

    /// Expects the default target to be bound.
    pub fn render<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        inputs: &ShadingInputs<'_>,
        instances: &[RenderableInstance],
        animation: &AnimationState,
    ) -> PassStats {
        device.set_viewport(inputs.viewport);
        device.clear(Clear::color_and_depth(inputs.clear_color, 1.0));

        device.use_program(Program::Shading);
        device.upload(Uniform::View(inputs.view));
        device.upload(Uniform::Projection(inputs.projection));
        device.upload(Uniform::ViewPosition(inputs.camera_position));
        device.upload(Uniform::LightPosition(inputs.light_position));
        device.upload(Uniform::LightColor(inputs.light_color));
        device.upload(Uniform::ShadowParams {
            bias_min: inputs.shadow.bias_min,
            bias_slope: inputs.shadow.bias_slope,
            ambient: inputs.shadow.ambient,
        });
        device.upload(Uniform::Attenuation(inputs.attenuation));
        device.upload(Uniform::LightSpace(inputs.light_space.matrix()));
        device.bind_texture(SamplerUnit::ShadowMap, inputs.shadow_map);

        let mut stats = PassStats::default();
        let mut bound_diffuse = None;
        for instance in instances {
            if bound_diffuse != Some(instance.diffuse) {
                device.bind_texture(SamplerUnit::Diffuse, instance.diffuse);
                bound_diffuse = Some(instance.diffuse);
            }
            let model = instance.model_matrix(animation);
            device.upload(Uniform::Model(model));
            device.upload(Uniform::NormalMatrix(normal_matrix(&inputs.view, &model)));
            device.draw(instance.geometry);
            stats.draws += 1;
        }
        stats
    }
}

/// Shows the raw depth map on a full-screen quad instead of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugDepthPass {
    quad: GeometryHandle,
}

impl DebugDepthPass {
    pub fn new<D: GraphicsDevice + ?Sized>(device: &mut D) -> Self {
        Self {
            quad: device.create_geometry(&primitives::screen_quad()),
        }
    }

    pub fn render<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        viewport: Viewport,
        shadow_map: TextureHandle,
    ) -> PassStats {
        device.set_viewport(viewport);
        device.clear(Clear::color_and_depth(wgpu::Color::BLACK, 1.0));
        device.use_program(Program::DebugDepth);
        device.bind_texture(SamplerUnit::ShadowMap, shadow_map);
        device.draw(self.quad);
        PassStats { draws: 1 }
    }
}
