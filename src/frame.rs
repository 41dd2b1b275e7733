//! Per-frame sequencing of the two passes.
//!
//! ```text
//! Idle -> UpdateLightSpaceMatrix -> ShadowPassExecuting -> RestoreDefaultTarget
//!      -> ShadingPassExecuting -> Present -> Idle
//! ```
//!
//! The light-space matrix computed in the first stage is carried unchanged to
//! the shading stage, and shading never starts before the shadow pass has
//! finished and the default target and viewport are back in place.

use crate::{
    config::RendererConfig,
    context::FrameContext,
    device::GraphicsDevice,
    error::RenderError,
    scene::{ControlEvent, Scene, SceneConfiguration, ViewMode},
    shading::{DebugDepthPass, ShadingInputs, ShadingPass},
    shadow::{DepthTarget, LightProjector, LightSpaceMatrix, ShadowPass},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    Idle,
    UpdateLightSpaceMatrix,
    ShadowPassExecuting,
    RestoreDefaultTarget,
    ShadingPassExecuting,
    Present,
}

impl FrameStage {
    pub fn next(self) -> Self {
        match self {
            FrameStage::Idle => FrameStage::UpdateLightSpaceMatrix,
            FrameStage::UpdateLightSpaceMatrix => FrameStage::ShadowPassExecuting,
            FrameStage::ShadowPassExecuting => FrameStage::RestoreDefaultTarget,
            FrameStage::RestoreDefaultTarget => FrameStage::ShadingPassExecuting,
            FrameStage::ShadingPassExecuting => FrameStage::Present,
            FrameStage::Present => FrameStage::Idle,
        }
    }
}

/// What happened during one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub light_space: LightSpaceMatrix,
    pub shadow_draws: usize,
    pub shading_draws: usize,
    /// Graphics API errors drained after the frame. Already logged.
    pub api_errors: Vec<String>,
}

/// Whether the application should keep running after a control event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Exit,
}

#[derive(Debug)]
pub struct FrameOrchestrator {
    projector: LightProjector,
    depth_target: DepthTarget,
    shadow_pass: ShadowPass,
    shading_pass: ShadingPass,
    debug_pass: DebugDepthPass,
    stage: FrameStage,
    stages_run: Vec<FrameStage>,
}

impl FrameOrchestrator {
    /// Allocates the depth target and builds the initial shading program.
    /// Either failing aborts startup.
    pub fn new<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        config: &RendererConfig,
    ) -> Result<Self, RenderError> {
        let depth_target = DepthTarget::create(device, config.shadow.resolution)?;
        device.compile_shading(config.initial_configuration)?;
        log::info!(
            "Shading with the {} program",
            config.initial_configuration.label()
        );
        Ok(Self {
            projector: LightProjector::new(&config.shadow),
            depth_target,
            shadow_pass: ShadowPass::new(),
            shading_pass: ShadingPass::new(),
            debug_pass: DebugDepthPass::new(device),
            stage: FrameStage::Idle,
            stages_run: Vec::new(),
        })
    }

    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Stages entered during the last frame, in order.
    pub fn stages_run(&self) -> &[FrameStage] {
        &self.stages_run
    }

    pub fn depth_target(&self) -> &DepthTarget {
        &self.depth_target
    }

    pub fn projector(&self) -> &LightProjector {
        &self.projector
    }

    fn enter(&mut self, stage: FrameStage) {
        if self.stage.next() != stage {
            log::error!("Frame stage {:?} cannot follow {:?}", stage, self.stage);
        }
        debug_assert_eq!(
            self.stage.next(),
            stage,
            "frame stage {:?} cannot follow {:?}",
            stage,
            self.stage
        );
        self.stage = stage;
        self.stages_run.push(stage);
    }

    /// Render one frame: depth map from the light, then the camera view.
    ///
    /// Only surface failures are returned. Graphics API errors are drained,
    /// logged and reported in the [`FrameReport`].
    pub fn run_frame<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        frame: &mut FrameContext,
        scene: &Scene,
    ) -> Result<FrameReport, RenderError> {
        self.stages_run.clear();

        self.enter(FrameStage::UpdateLightSpaceMatrix);
        let light_space = self
            .projector
            .compute_light_space_matrix(frame.light.position());
        frame.set_light_space(light_space);

        self.enter(FrameStage::ShadowPassExecuting);
        let shadow = self.shadow_pass.render(
            device,
            &self.depth_target,
            light_space,
            scene.instances(),
            &frame.animation,
        );

        self.enter(FrameStage::RestoreDefaultTarget);
        device.set_viewport(frame.viewport());

        self.enter(FrameStage::ShadingPassExecuting);
        let shading = match frame.view_mode {
            ViewMode::Scene => {
                let inputs = ShadingInputs {
                    viewport: frame.viewport(),
                    view: frame.camera.view_matrix(),
                    projection: frame.projection.calc_matrix(),
                    camera_position: frame.camera.position(),
                    light_position: frame.light.position(),
                    light_color: frame.light.color,
                    light_space,
                    shadow_map: self.depth_target.texture(),
                    clear_color: frame.configuration.clear_color(),
                    shadow: frame.shadow_settings(),
                    attenuation: frame.light.attenuation,
                };
                self.shading_pass
                    .render(device, &inputs, scene.instances(), &frame.animation)
            }
            ViewMode::ShadowMapDebug => {
                self.debug_pass
                    .render(device, frame.viewport(), self.depth_target.texture())
            }
        };

        self.enter(FrameStage::Present);
        let presented = device.present();
        self.enter(FrameStage::Idle);

        let api_errors: Vec<String> = device
            .take_errors()
            .into_iter()
            .map(|e| {
                log::error!("{e}");
                e.to_string()
            })
            .collect();

        presented?;
        Ok(FrameReport {
            light_space,
            shadow_draws: shadow.draws,
            shading_draws: shading.draws,
            api_errors,
        })
    }

    /// Switch the shading program. On failure the previous configuration
    /// stays active and the error is returned for logging.
    pub fn select_configuration<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        frame: &mut FrameContext,
        configuration: SceneConfiguration,
    ) -> Result<(), RenderError> {
        match device.compile_shading(configuration) {
            Ok(()) => {
                log::info!("Switched to the {} program", configuration.label());
                frame.configuration = configuration;
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "Keeping the {} program, {} failed: {e}",
                    frame.configuration.label(),
                    configuration.label()
                );
                Err(e)
            }
        }
    }

    /// Apply a discrete control. Recoverable failures are logged only.
    pub fn handle_control<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        frame: &mut FrameContext,
        event: ControlEvent,
    ) -> ControlFlow {
        match event {
            ControlEvent::SelectConfiguration(configuration) => {
                let _ = self.select_configuration(device, frame, configuration);
            }
            ControlEvent::ReloadShaders => {
                let active = frame.configuration;
                let _ = self.select_configuration(device, frame, active);
            }
            ControlEvent::ToggleDepthView => {
                frame.view_mode = frame.view_mode.toggled();
                log::info!("View mode: {:?}", frame.view_mode);
            }
            ControlEvent::ToggleLightOrbit => {
                frame.light.orbiting = !frame.light.orbiting;
            }
            ControlEvent::Exit => return ControlFlow::Exit,
        }
        ControlFlow::Continue
    }

    /// Window resize. Only the surface and camera projection change.
    pub fn resize<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        frame: &mut FrameContext,
        width: u32,
        height: u32,
    ) {
        device.resize(width, height);
        frame.resize(width, height);
    }
}
