#![allow(dead_code)]

pub mod raster;

use umbra::{
    FrameOrchestrator, GraphicsDevice, RenderableInstance, RendererConfig, Scene, TextureHandle, TransformPolicy,
    cgmath::Vector3,
    context::FrameContext,
    device::recording::RecordingDevice,
    resources::primitives,
};

pub const WIDTH: u32 = 1024;
pub const HEIGHT: u32 = 768;

/// Default configuration without the intro fly-out, so frames are
/// deterministic from the start.
pub fn config() -> RendererConfig {
    let mut config = RendererConfig::new();
    config.animation.intro_seconds = 0.0;
    config
}

pub struct Fixture {
    pub device: RecordingDevice,
    pub orchestrator: FrameOrchestrator,
    pub frame: FrameContext,
    pub scene: Scene,
}

impl Fixture {
    pub fn new(
        config: &RendererConfig,
        build: impl FnOnce(&mut RecordingDevice, TextureHandle) -> Scene,
    ) -> Self {
        let mut device = RecordingDevice::new(WIDTH, HEIGHT);
        let orchestrator = FrameOrchestrator::new(&mut device, config)
            .expect("recording device accepts the default setup");
        let diffuse = device.create_texture(&primitives::checker(8, 2), "checker");
        let scene = build(&mut device, diffuse);
        let frame = FrameContext::new(config, WIDTH, HEIGHT);
        // Setup commands are not part of any frame
        device.take_commands();
        Self {
            device,
            orchestrator,
            frame,
            scene,
        }
    }

    pub fn demo(config: &RendererConfig) -> Self {
        Self::new(config, demo_scene)
    }
}

fn ground(device: &mut RecordingDevice, diffuse: TextureHandle) -> RenderableInstance {
    let geometry = device.create_geometry(&primitives::ground());
    RenderableInstance::new("ground", geometry, diffuse, Vector3::new(0.0, 0.0, 0.0))
        .with_policy(TransformPolicy::Fixed)
        .with_shadow(false)
}

/// Ground plane, cube and sphere placed as in the demo.
pub fn demo_scene(device: &mut RecordingDevice, diffuse: TextureHandle) -> Scene {
    let cube = device.create_geometry(&primitives::cube(0.5));
    let sphere = device.create_geometry(&primitives::sphere(0.75, 12, 16));
    Scene::new()
        .with(ground(device, diffuse))
        .with(RenderableInstance::new("cube", cube, diffuse, Vector3::new(3.0, 1.0, 0.0)))
        .with(RenderableInstance::new("sphere", sphere, diffuse, Vector3::new(-3.0, 1.0, 2.0)))
}

/// A unit cube hovering at (0, 2, 0) over the ground plane.
pub fn raised_cube_scene(device: &mut RecordingDevice, diffuse: TextureHandle) -> Scene {
    let cube = device.create_geometry(&primitives::cube(0.5));
    Scene::new().with(ground(device, diffuse)).with(
        RenderableInstance::new("cube", cube, diffuse, Vector3::new(0.0, 2.0, 0.0))
            .with_policy(TransformPolicy::Fixed),
    )
}

/// Only the ground plane, casting shadows onto itself.
pub fn plane_scene(device: &mut RecordingDevice, diffuse: TextureHandle) -> Scene {
    Scene::new().with(ground(device, diffuse).with_shadow(true))
}
