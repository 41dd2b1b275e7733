//! Application event loop.
//!
//! [`run`] opens a window, builds the GPU device and the frame orchestrator,
//! lets the caller populate the [`Scene`] and then drives one frame per
//! redraw. Window and device events are mapped to camera movement, animation
//! input and discrete [`ControlEvent`]s.
//!
//! # Controls
//!
//! - `W`/`A`/`S`/`D`, `Space`, `Shift`: move the camera; right mouse button + drag looks around
//! - `Q`/`E`: spin the instances, `O`/`P`: shrink/grow the scaled instances
//! - `B`/`N`/`M`: solid, directional-light and point-light shading
//! - `R`: rebuild the active shading program from the shader directory
//! - `V`: show the shadow map instead of the scene
//! - `L`: orbit the light around the vertical axis
//! - `Esc`: quit

use std::sync::{Arc, Once};

use anyhow::Context as _;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    config::RendererConfig,
    context::{Context, FrameContext},
    device::{GraphicsDevice, gpu::WgpuDevice},
    error::RenderError,
    frame::{ControlFlow, FrameOrchestrator},
    scene::{ControlEvent, Scene, SceneConfiguration},
};

/// Mouse deltas are scaled before they reach the camera controller.
const MOUSE_LOOK_FACTOR: f64 = 5.0;

static LOGGER: Once = Once::new();

/// Install `env_logger` once. An explicit filter wins over `RUST_LOG`.
pub fn init_logging(filter: Option<&str>) {
    LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(log::LevelFilter::Info)
            .filter_module("wgpu_core", log::LevelFilter::Warn)
            .filter_module("wgpu_hal", log::LevelFilter::Warn)
            .filter_module("naga", log::LevelFilter::Warn);
        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        }
        if let Err(e) = builder.try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        }
    });
}

/// Translate a key press into a discrete control, if it is one.
pub fn control_for_key(key: KeyCode) -> Option<ControlEvent> {
    Some(match key {
        KeyCode::KeyB => ControlEvent::SelectConfiguration(SceneConfiguration::SolidShading),
        KeyCode::KeyN => ControlEvent::SelectConfiguration(SceneConfiguration::DirectionalLight),
        KeyCode::KeyM => ControlEvent::SelectConfiguration(SceneConfiguration::PointLight),
        KeyCode::KeyR => ControlEvent::ReloadShaders,
        KeyCode::KeyV => ControlEvent::ToggleDepthView,
        KeyCode::KeyL => ControlEvent::ToggleLightOrbit,
        KeyCode::Escape => ControlEvent::Exit,
        _ => return None,
    })
}

/// Everything that exists once a window and GPU are available.
struct AppState {
    device: WgpuDevice,
    orchestrator: FrameOrchestrator,
    frame: FrameContext,
    scene: Scene,
    look_around: bool,
}

impl AppState {
    fn new<F>(
        runtime: &tokio::runtime::Runtime,
        window: Arc<Window>,
        config: &RendererConfig,
        build_scene: F,
    ) -> anyhow::Result<Self>
    where
        F: FnOnce(&mut dyn GraphicsDevice) -> Result<Scene, RenderError>,
    {
        let size = window.inner_size();
        let ctx = runtime.block_on(Context::new(window))?;
        let mut device = WgpuDevice::new(ctx, config).context("Cannot build the depth programs")?;
        let orchestrator = FrameOrchestrator::new(&mut device, config)
            .context("Cannot set up the shadow pipeline")?;
        let scene = build_scene(&mut device).context("Cannot build the scene")?;
        log::info!("Scene ready with {} instances", scene.len());
        let frame = FrameContext::new(config, size.width, size.height);

        Ok(Self {
            device,
            orchestrator,
            frame,
            scene,
            look_around: false,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.orchestrator
            .resize(&mut self.device, &mut self.frame, size.width, size.height);
    }

    /// Returns `false` when the application should stop.
    fn render(&mut self) -> bool {
        match self
            .orchestrator
            .run_frame(&mut self.device, &mut self.frame, &self.scene)
        {
            Ok(_) => true,
            // Reconfigure the surface if it's lost or outdated
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                let size = self.device.window().inner_size();
                self.resize(size);
                self.device.reconfigure();
                true
            }
            Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Surface timeout, frame skipped");
                true
            }
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("Out of memory while acquiring a frame");
                false
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
                true
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState, repeat: bool) -> ControlFlow {
        if self.frame.controller.handle_key(key, state) {
            self.frame.end_intro();
            return ControlFlow::Continue;
        }

        let held = if state.is_pressed() { 1.0 } else { 0.0 };
        match key {
            KeyCode::KeyQ => self.frame.input.spin = -held,
            KeyCode::KeyE => self.frame.input.spin = held,
            KeyCode::KeyO => self.frame.input.grow = -held,
            KeyCode::KeyP => self.frame.input.grow = held,
            _ => {
                if state.is_pressed() && !repeat {
                    if let Some(control) = control_for_key(key) {
                        return self.orchestrator.handle_control(
                            &mut self.device,
                            &mut self.frame,
                            control,
                        );
                    }
                }
            }
        }
        ControlFlow::Continue
    }
}

struct App<F> {
    async_runtime: tokio::runtime::Runtime,
    config: RendererConfig,
    state: Option<AppState>,
    // Taken once the window exists.
    build_scene: Option<F>,
    failure: Option<anyhow::Error>,
    last_time: Instant,
}

impl<F> App<F>
where
    F: FnOnce(&mut dyn GraphicsDevice) -> Result<Scene, RenderError>,
{
    fn new(config: RendererConfig, build_scene: F) -> anyhow::Result<Self> {
        let async_runtime =
            tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
        Ok(Self {
            async_runtime,
            config,
            state: None,
            build_scene: Some(build_scene),
            failure: None,
            last_time: Instant::now(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }
}

impl<F> ApplicationHandler for App<F>
where
    F: FnOnce(&mut dyn GraphicsDevice) -> Result<Scene, RenderError>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(build_scene) = self.build_scene.take() else {
            return;
        };

        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow::Error::new(e)),
        };

        match AppState::new(&self.async_runtime, window, &self.config, build_scene) {
            Ok(state) => {
                state.device.window().request_redraw();
                self.state = Some(state);
                self.last_time = Instant::now();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if state.look_around {
                state
                    .frame
                    .controller
                    .handle_mouse(dx * MOUSE_LOOK_FACTOR, dy * MOUSE_LOOK_FACTOR);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if state.handle_key(key, key_state, repeat) == ControlFlow::Exit {
                    event_loop.exit();
                }
            }
            WindowEvent::MouseWheel { .. } => {
                state.frame.controller.handle_window_events(&event);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Right,
                ..
            } => {
                state.look_around = button_state.is_pressed();
                if state.look_around {
                    state.frame.end_intro();
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                state.frame.update(dt);
                if !state.render() {
                    event_loop.exit();
                    return;
                }
                state.device.window().request_redraw();
            }
            _ => {}
        }
    }
}

/// Open a window and render `build_scene`'s scene until the window closes.
///
/// `build_scene` runs once the GPU device exists and uploads its meshes and
/// textures through it.
pub fn run<F>(config: RendererConfig, build_scene: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut dyn GraphicsDevice) -> Result<Scene, RenderError>,
{
    init_logging(config.log_filter.as_deref());

    let event_loop = EventLoop::new().context("Cannot create the event loop")?;
    let mut app = App::new(config, build_scene)?;
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_keys_map_to_configurations() {
        assert_eq!(
            control_for_key(KeyCode::KeyB),
            Some(ControlEvent::SelectConfiguration(SceneConfiguration::SolidShading))
        );
        assert_eq!(
            control_for_key(KeyCode::KeyM),
            Some(ControlEvent::SelectConfiguration(SceneConfiguration::PointLight))
        );
        assert_eq!(control_for_key(KeyCode::KeyW), None);
    }
}
