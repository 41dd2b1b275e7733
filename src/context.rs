//! GPU context and per-frame CPU state.
//!
//! [`Context`] owns the wgpu objects tied to the window. [`FrameContext`] owns
//! everything the frame loop mutates between frames: camera, light, animation,
//! the active scene configuration and the last light-space matrix. Both are
//! owned by the application driver and passed down explicitly.

use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use cgmath::{Deg, Point3, Rotation, Rotation3, Vector3};
use instant::Duration;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraController, Projection},
    config::{AnimationSettings, Attenuation, RendererConfig, ShadowSettings},
    data_structures::texture,
    device::Viewport,
    scene::{AnimationState, SceneConfiguration, ViewMode},
    shadow::{LightProjector, LightSpaceMatrix},
};

/// Errors reported by wgpu outside of an error scope, drained once a frame.
pub type ErrorSink = Arc<Mutex<Vec<String>>>;

#[derive(Debug)]
pub struct Context {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub(crate) depth_texture: texture::Texture,
    pub(crate) errors: ErrorSink,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter found")?;
        log::info!("Using adapter {:?}", adapter.get_info());

        // Border colours are optional; without them the sampler falls back to
        // clamp-to-edge and the shader's coverage check does the work.
        let required_features =
            adapter.features() & wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("umbra device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Cannot open the GPU device")?;

        let errors: ErrorSink = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        device.on_uncaptured_error(Arc::new(move |e: wgpu::Error| {
            log::debug!("WGPU uncaptured error: {e:?}");
            if let Ok(mut errors) = sink.lock() {
                errors.push(e.to_string());
            }
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders write linear colour, an sRGB surface does the encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        Ok(Self {
            window,
            surface,
            adapter,
            device,
            queue,
            config,
            depth_texture,
            errors,
        })
    }

    pub fn supports_border_clamp(&self) -> bool {
        self.device
            .features()
            .contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = texture::Texture::create_depth_texture(
                &self.device,
                [width, height],
                "depth_texture",
            );
        }
    }

    /// Re-apply the current configuration after the surface was lost.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Point light (also used as the directional light's origin).
#[derive(Debug, Clone, PartialEq)]
pub struct LightState {
    position: Point3<f32>,
    pub color: Vector3<f32>,
    pub attenuation: Attenuation,
    pub orbit_speed: f32,
    pub orbiting: bool,
}

impl LightState {
    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    /// Move the light. Positions on the vertical axis through the origin are
    /// refused because the light's look-at would be undefined.
    pub fn set_position(&mut self, position: Point3<f32>) -> bool {
        if LightProjector::accepts(position) {
            self.position = position;
            true
        } else {
            log::warn!("Ignoring light position {position:?}: colinear with the up axis");
            false
        }
    }

    fn orbit(&mut self, dt: f32) {
        let rotation = cgmath::Quaternion::from_angle_y(Deg(self.orbit_speed * dt));
        let rotated = rotation.rotate_point(self.position);
        self.set_position(rotated);
    }
}

/// Held-key state for the continuous animation controls.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationInput {
    /// -1, 0 or 1.
    pub spin: f32,
    /// -1, 0 or 1.
    pub grow: f32,
}

/// CPU-side state threaded through every frame.
#[derive(Debug)]
pub struct FrameContext {
    pub camera: Camera,
    pub controller: CameraController,
    pub projection: Projection,
    pub light: LightState,
    pub animation: AnimationState,
    pub input: AnimationInput,
    pub configuration: SceneConfiguration,
    pub view_mode: ViewMode,
    shadow: ShadowSettings,
    animation_settings: AnimationSettings,
    camera_speed: f32,
    intro_remaining: f32,
    window_size: (u32, u32),
    light_space: Option<LightSpaceMatrix>,
}

impl FrameContext {
    pub fn new(config: &RendererConfig, width: u32, height: u32) -> Self {
        let camera = Camera::looking_at(config.camera.position, config.camera.target);
        let projection = Projection::new(
            width,
            height,
            config.camera.fovy,
            config.camera.znear,
            config.camera.zfar,
        );
        let mut light = LightState {
            position: Point3::new(-10.0, 14.0, -1.0),
            color: config.light.color,
            attenuation: config.light.attenuation,
            orbit_speed: config.light.orbit_speed,
            orbiting: config.light.orbit_enabled,
        };
        light.set_position(config.light.position);
        Self {
            camera,
            controller: CameraController::new(config.camera.speed, config.camera.sensitivity),
            projection,
            light,
            animation: AnimationState::default(),
            input: AnimationInput::default(),
            configuration: config.initial_configuration,
            view_mode: ViewMode::default(),
            shadow: config.shadow.clone(),
            animation_settings: config.animation.clone(),
            camera_speed: config.camera.speed,
            intro_remaining: config.animation.intro_seconds.max(0.0),
            window_size: (width.max(1), height.max(1)),
            light_space: None,
        }
    }

    /// Only the camera projection follows the window. The shadow map keeps
    /// its startup resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.window_size = (width, height);
            self.projection.resize(width, height);
        }
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.window_size.0, self.window_size.1)
    }

    pub fn shadow_settings(&self) -> &ShadowSettings {
        &self.shadow
    }

    pub fn intro_running(&self) -> bool {
        self.intro_remaining > 0.0
    }

    /// Skip the intro fly-out, e.g. once the user takes control.
    pub fn end_intro(&mut self) {
        self.intro_remaining = 0.0;
    }

    /// The matrix of the most recent frame, `None` before the first frame.
    pub fn light_space(&self) -> Option<LightSpaceMatrix> {
        self.light_space
    }

    pub(crate) fn set_light_space(&mut self, light_space: LightSpaceMatrix) {
        self.light_space = Some(light_space);
    }

    /// Advance camera, animation and light by `dt`.
    pub fn update(&mut self, dt: Duration) {
        let secs = dt.as_secs_f32();
        if self.intro_running() {
            let step = self.camera_speed * secs;
            let back = -self.camera.forward();
            let right = self.camera.right();
            self.camera.position += (back + right) * step;
            self.animation.spin(-self.animation_settings.spin_speed * secs);
            self.intro_remaining -= secs;
        } else {
            self.controller.update(&mut self.camera, dt);
        }

        if self.input.spin != 0.0 {
            self.animation
                .spin(self.input.spin * self.animation_settings.spin_speed * secs);
        }
        if self.input.grow != 0.0 {
            self.animation
                .grow(self.input.grow * self.animation_settings.scale_speed * secs);
        }
        if self.light.orbiting {
            self.light.orbit(secs);
        }
    }
}
