//! Scene contents and the controls that act on them.
//!
//! A [`Scene`] owns every [`RenderableInstance`]; the passes only borrow it.
//! Transforms are never stored: each frame an instance's [`TransformPolicy`]
//! turns the shared [`AnimationState`] into a model matrix.

use cgmath::{Deg, Matrix4, Rotation3, Vector3};

use crate::{
    data_structures::instance::Instance,
    device::{GeometryHandle, TextureHandle},
};

/// How the animation state drives an instance's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformPolicy {
    /// Never rotated or scaled (the ground plane).
    Fixed,
    /// Rotated around +Y by the animation angle.
    Spin,
    /// Rotated around +Y and uniformly scaled by the animation scale.
    SpinScaled,
}

/// Animation inputs shared by every instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub angle: Deg<f32>,
    /// Offset added to a unit scale, so zero means "original size".
    pub scale: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            angle: Deg(0.0),
            scale: 0.0,
        }
    }
}

impl AnimationState {
    /// Smallest effective scale factor, keeps normal matrices invertible.
    pub const MIN_SCALE: f32 = 0.1;

    pub fn scale_factor(&self) -> f32 {
        (1.0 + self.scale).max(Self::MIN_SCALE)
    }

    pub fn spin(&mut self, degrees: f32) {
        self.angle = Deg((self.angle.0 + degrees) % 360.0);
    }

    pub fn grow(&mut self, amount: f32) {
        self.scale = (self.scale + amount).max(Self::MIN_SCALE - 1.0);
    }
}

/// One drawable object in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableInstance {
    pub name: String,
    pub geometry: GeometryHandle,
    pub diffuse: TextureHandle,
    pub position: Vector3<f32>,
    pub policy: TransformPolicy,
    pub casts_shadow: bool,
}

impl RenderableInstance {
    pub fn new(
        name: impl Into<String>,
        geometry: GeometryHandle,
        diffuse: TextureHandle,
        position: Vector3<f32>,
    ) -> Self {
        Self {
            name: name.into(),
            geometry,
            diffuse,
            position,
            policy: TransformPolicy::Spin,
            casts_shadow: true,
        }
    }

    pub fn with_policy(mut self, policy: TransformPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_shadow(mut self, casts_shadow: bool) -> Self {
        self.casts_shadow = casts_shadow;
        self
    }

    pub fn transform(&self, animation: &AnimationState) -> Instance {
        let mut instance = Instance::from(self.position);
        match self.policy {
            TransformPolicy::Fixed => {}
            TransformPolicy::Spin => {
                instance.rotation = cgmath::Quaternion::from_angle_y(animation.angle);
            }
            TransformPolicy::SpinScaled => {
                let s = animation.scale_factor();
                instance.rotation = cgmath::Quaternion::from_angle_y(animation.angle);
                instance.scale = Vector3::new(s, s, s);
            }
        }
        instance
    }

    pub fn model_matrix(&self, animation: &AnimationState) -> Matrix4<f32> {
        self.transform(animation).to_matrix()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    instances: Vec<RenderableInstance>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instance: RenderableInstance) {
        self.instances.push(instance);
    }

    pub fn with(mut self, instance: RenderableInstance) -> Self {
        self.push(instance);
        self
    }

    pub fn instances(&self) -> &[RenderableInstance] {
        &self.instances
    }

    /// Instances rendered into the depth map.
    pub fn casters(&self) -> impl Iterator<Item = &RenderableInstance> {
        self.instances.iter().filter(|i| i.casts_shadow)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Which lighting program the shading pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SceneConfiguration {
    /// Diffuse texture only, no lighting and no shadows.
    SolidShading,
    /// Directional light from the light position towards the origin.
    #[default]
    DirectionalLight,
    /// Attenuated point light at the light position.
    PointLight,
}

impl SceneConfiguration {
    pub const ALL: [SceneConfiguration; 3] = [
        SceneConfiguration::SolidShading,
        SceneConfiguration::DirectionalLight,
        SceneConfiguration::PointLight,
    ];

    pub fn clear_color(&self) -> wgpu::Color {
        match self {
            SceneConfiguration::PointLight => wgpu::Color::BLACK,
            SceneConfiguration::SolidShading | SceneConfiguration::DirectionalLight => {
                wgpu::Color {
                    r: 0.7,
                    g: 0.7,
                    b: 0.7,
                    a: 1.0,
                }
            }
        }
    }

    /// Fragment entry point in the shading source.
    pub fn entry_point(&self) -> &'static str {
        match self {
            SceneConfiguration::SolidShading => "fs_solid",
            SceneConfiguration::DirectionalLight => "fs_directional",
            SceneConfiguration::PointLight => "fs_point",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SceneConfiguration::SolidShading => "solid shading",
            SceneConfiguration::DirectionalLight => "directional light",
            SceneConfiguration::PointLight => "point light",
        }
    }
}

/// What the frame loop shows in place of the shaded scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Scene,
    ShadowMapDebug,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Scene => ViewMode::ShadowMapDebug,
            ViewMode::ShadowMapDebug => ViewMode::Scene,
        }
    }
}

/// Discrete control actions, decoupled from the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    SelectConfiguration(SceneConfiguration),
    /// Rebuild the active shading program from its sources.
    ReloadShaders,
    ToggleDepthView,
    ToggleLightOrbit,
    Exit,
}
