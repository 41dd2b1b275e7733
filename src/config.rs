//! Startup configuration.
//!
//! Everything here is read once when the renderer starts. The shadow-map
//! resolution in particular is never touched again after the depth target is
//! created; resizing the window only affects the camera projection.

use std::path::PathBuf;

use cgmath::{Deg, Point3, Vector3};

use crate::scene::SceneConfiguration;

/// Configuration for the light-space depth map and the shadow test.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowSettings {
    /// Width and height of the square depth target in texels.
    pub resolution: u32,
    /// Half extent of the symmetric orthographic box around the light axis.
    pub half_extent: f32,
    /// Near plane of the light projection.
    pub near: f32,
    /// Far plane of the light projection.
    pub far: f32,
    /// Lower bound of the slope-scaled depth bias.
    pub bias_min: f32,
    /// Bias applied when the surface is perpendicular to the light.
    pub bias_slope: f32,
    /// Ambient term kept by shadowed fragments.
    pub ambient: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 1024,
            half_extent: 10.0,
            near: 1.1,
            far: 50.0,
            bias_min: 0.005,
            bias_slope: 0.05,
            ambient: 0.3,
        }
    }
}

impl ShadowSettings {
    /// Set the shadow map resolution.
    pub fn resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the half extent of the light's orthographic box.
    pub fn half_extent(mut self, half_extent: f32) -> Self {
        self.half_extent = half_extent;
        self
    }

    /// Set the light projection's depth range.
    pub fn depth_range(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Set both bias terms.
    pub fn bias(mut self, min: f32, slope: f32) -> Self {
        self.bias_min = min;
        self.bias_slope = slope;
        self
    }

    /// Bias for a surface whose normal makes `n_dot_l` with the light direction.
    pub fn bias_for(&self, n_dot_l: f32) -> f32 {
        (self.bias_slope * (1.0 - n_dot_l)).max(self.bias_min)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Units per second.
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Point3::new(-2.0, 8.0, -1.0),
            target: Point3::new(0.0, 0.0, 0.0),
            fovy: Deg(45.0),
            znear: 0.1,
            zfar: 40.0,
            speed: 5.0,
            sensitivity: 0.4,
        }
    }
}

/// Point-light falloff: `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.22,
            quadratic: 0.20,
        }
    }
}

impl Attenuation {
    pub fn at(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightSettings {
    pub position: Point3<f32>,
    pub color: Vector3<f32>,
    /// Degrees per second around the Y axis while orbiting is enabled.
    pub orbit_speed: f32,
    pub orbit_enabled: bool,
    pub attenuation: Attenuation,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: Point3::new(-10.0, 14.0, -1.0),
            color: Vector3::new(1.0, 1.0, 1.0),
            orbit_speed: 20.0,
            orbit_enabled: false,
            attenuation: Attenuation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "umbra".to_string(),
            width: 1024,
            height: 768,
        }
    }
}

/// Animation rates driven by keyboard input.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSettings {
    /// Degrees per second while Q/E are held.
    pub spin_speed: f32,
    /// Scale units per second while O/P are held.
    pub scale_speed: f32,
    /// Length of the intro fly-out in seconds, zero disables it.
    pub intro_seconds: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            spin_speed: 50.0,
            scale_speed: 0.5,
            intro_seconds: 4.0,
        }
    }
}

/// Top-level renderer configuration.
#[derive(Debug, Clone, Default)]
pub struct RendererConfig {
    pub window: WindowSettings,
    pub camera: CameraSettings,
    pub light: LightSettings,
    pub shadow: ShadowSettings,
    pub animation: AnimationSettings,
    pub initial_configuration: SceneConfiguration,
    /// Directory with `depth.wgsl`, `shading.wgsl` and `debug_depth.wgsl`
    /// overrides. Missing files fall back to the built-in sources.
    pub shader_dir: Option<PathBuf>,
    /// `env_logger` filter, `RUST_LOG` wins when unset.
    pub log_filter: Option<String>,
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shadow(mut self, shadow: ShadowSettings) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn light_position(mut self, position: Point3<f32>) -> Self {
        self.light.position = position;
        self
    }

    pub fn shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    pub fn initial_configuration(mut self, configuration: SceneConfiguration) -> Self {
        self.initial_configuration = configuration;
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bias_never_drops_below_minimum() {
        let shadow = ShadowSettings::default();
        assert_eq!(shadow.bias_for(1.0), shadow.bias_min);
        assert!((shadow.bias_for(0.0) - shadow.bias_slope).abs() < f32::EPSILON);
    }

    #[test]
    fn attenuation_is_one_at_the_light() {
        assert_eq!(Attenuation::default().at(0.0), 1.0);
        assert!(Attenuation::default().at(5.0) < 0.2);
    }
}
