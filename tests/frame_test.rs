use umbra::{
    FrameStage, RenderError, SceneConfiguration,
    cgmath::{Matrix4, Point3},
    device::{
        Clear, Program, Target, Uniform, Viewport,
        recording::{Command, RecordingDevice},
    },
    frame::ControlFlow,
    scene::{ControlEvent, ViewMode},
};

mod common;
use common::{Fixture, HEIGHT, WIDTH};

fn light_space_uploads(device: &RecordingDevice, program: Program) -> Vec<Matrix4<f32>> {
    device
        .uploads_in(program)
        .into_iter()
        .filter_map(|u| match u {
            Uniform::LightSpace(m) => Some(m),
            _ => None,
        })
        .collect()
}

#[test]
fn frame_walks_every_stage_in_order() {
    let mut f = Fixture::demo(&common::config());
    assert_eq!(f.orchestrator.stage(), FrameStage::Idle);

    f.orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();

    assert_eq!(
        f.orchestrator.stages_run(),
        &[
            FrameStage::UpdateLightSpaceMatrix,
            FrameStage::ShadowPassExecuting,
            FrameStage::RestoreDefaultTarget,
            FrameStage::ShadingPassExecuting,
            FrameStage::Present,
            FrameStage::Idle,
        ]
    );
    assert_eq!(f.orchestrator.stage(), FrameStage::Idle);
    assert_eq!(f.device.presented(), 1);
}

#[test]
fn both_passes_see_the_same_light_space_matrix() {
    let mut f = Fixture::demo(&common::config());
    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();

    let depth = light_space_uploads(&f.device, Program::Depth);
    let shading = light_space_uploads(&f.device, Program::Shading);
    assert_eq!(depth.len(), 1);
    assert_eq!(shading.len(), 1);
    // Exact equality: the value is computed once and copied
    assert_eq!(depth[0], shading[0]);
    assert_eq!(depth[0], report.light_space.matrix());
    assert_eq!(f.frame.light_space(), Some(report.light_space));
}

#[test]
fn shadow_pass_finishes_before_shading_starts() {
    let mut f = Fixture::demo(&common::config());
    f.orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();

    let commands = f.device.commands();
    let depth_target = f.orchestrator.depth_target().texture();
    let bind_depth = commands
        .iter()
        .position(|c| *c == Command::BindTarget(Target::DepthMap(depth_target)))
        .expect("shadow pass binds the depth target");
    let bind_default = commands
        .iter()
        .position(|c| *c == Command::BindTarget(Target::Default))
        .expect("shadow pass restores the default target");
    let use_shading = commands
        .iter()
        .position(|c| *c == Command::UseProgram(Program::Shading))
        .expect("shading program is used");
    let present = commands
        .iter()
        .position(|c| *c == Command::Present)
        .expect("frame is presented");

    assert!(bind_depth < bind_default);
    assert!(bind_default < use_shading);
    assert!(use_shading < present);
    assert_eq!(commands[bind_depth + 2], Command::Clear(Clear::depth_only(1.0)));

    let draws = f.device.draw_calls();
    let first_shading = draws
        .iter()
        .position(|d| d.program == Some(Program::Shading))
        .unwrap();
    assert!(draws[..first_shading]
        .iter()
        .all(|d| d.program == Some(Program::Depth)));
    assert!(draws[first_shading..]
        .iter()
        .all(|d| d.program == Some(Program::Shading) && d.target == Target::Default));
}

#[test]
fn viewports_follow_the_map_then_the_window() {
    let mut f = Fixture::demo(&common::config());
    f.orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();

    for draw in f.device.draw_calls() {
        match draw.program {
            Some(Program::Depth) => assert_eq!(draw.viewport, Some(Viewport::square(1024))),
            Some(Program::Shading) => {
                assert_eq!(draw.viewport, Some(Viewport::new(WIDTH, HEIGHT)))
            }
            other => panic!("unexpected program {other:?}"),
        }
    }
}

#[test]
fn only_shadow_casters_reach_the_depth_pass() {
    let mut f = Fixture::demo(&common::config());
    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();

    assert_eq!(report.shadow_draws, f.scene.casters().count());
    assert_eq!(report.shadow_draws, 2);
    assert_eq!(report.shading_draws, f.scene.len());
}

#[test]
fn shading_samples_the_frame_depth_map() {
    let mut f = Fixture::demo(&common::config());
    f.orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();

    let depth_target = f.orchestrator.depth_target().texture();
    for draw in f
        .device
        .draw_calls()
        .into_iter()
        .filter(|d| d.program == Some(Program::Shading))
    {
        assert_eq!(draw.shadow_map, Some(depth_target));
        assert!(draw.diffuse.is_some());
    }
}

#[test]
fn resize_keeps_the_shadow_map_resolution() {
    let mut f = Fixture::demo(&common::config());
    f.orchestrator.resize(&mut f.device, &mut f.frame, 640, 480);
    f.orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();

    let depth_target = *f.orchestrator.depth_target();
    assert_eq!(depth_target.resolution(), 1024);
    let info = f.device.texture(depth_target.texture()).unwrap();
    assert_eq!((info.width, info.height), (1024, 1024));
    assert_eq!(f.device.size(), (640, 480));

    let draws = f.device.draw_calls();
    assert!(draws
        .iter()
        .filter(|d| d.program == Some(Program::Depth))
        .all(|d| d.viewport == Some(Viewport::square(1024))));
    assert!(draws
        .iter()
        .filter(|d| d.program == Some(Program::Shading))
        .all(|d| d.viewport == Some(Viewport::new(640, 480))));
}

#[test]
fn zero_sized_resize_is_ignored() {
    let mut f = Fixture::demo(&common::config());
    f.orchestrator.resize(&mut f.device, &mut f.frame, 0, 0);
    assert_eq!(f.frame.window_size(), (WIDTH, HEIGHT));
    assert_eq!(f.device.size(), (WIDTH, HEIGHT));
}

#[test]
fn failed_configuration_swap_keeps_the_previous_program() {
    let mut f = Fixture::demo(&common::config());
    f.device.fail_compilation(SceneConfiguration::PointLight);

    let result = f.orchestrator.select_configuration(
        &mut f.device,
        &mut f.frame,
        SceneConfiguration::PointLight,
    );
    assert!(matches!(result, Err(RenderError::ShaderCompile { .. })));
    assert_eq!(f.frame.configuration, SceneConfiguration::DirectionalLight);
    assert_eq!(
        f.device.active_configuration(),
        Some(SceneConfiguration::DirectionalLight)
    );

    // The frame loop carries on with the old program
    f.orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    let grey = SceneConfiguration::DirectionalLight.clear_color();
    assert!(f
        .device
        .commands()
        .contains(&Command::Clear(Clear::color_and_depth(grey, 1.0))));
}

#[test]
fn configuration_keys_switch_program_and_clear_colour() {
    let mut f = Fixture::demo(&common::config());
    let flow = f.orchestrator.handle_control(
        &mut f.device,
        &mut f.frame,
        ControlEvent::SelectConfiguration(SceneConfiguration::PointLight),
    );
    assert_eq!(flow, ControlFlow::Continue);
    assert_eq!(f.frame.configuration, SceneConfiguration::PointLight);
    assert_eq!(
        f.device.active_configuration(),
        Some(SceneConfiguration::PointLight)
    );

    f.orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    assert!(f.device.commands().contains(&Command::Clear(Clear::color_and_depth(
        wgpu::Color::BLACK,
        1.0
    ))));
}

#[test]
fn api_errors_are_reported_without_stopping_the_loop() {
    let mut f = Fixture::demo(&common::config());
    f.device.inject_error("invalid operation");

    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    assert_eq!(report.api_errors.len(), 1);
    assert!(report.api_errors[0].contains("invalid operation"));

    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    assert!(report.api_errors.is_empty());
    assert_eq!(f.device.presented(), 2);
}

#[test]
fn surface_errors_surface_and_the_next_frame_recovers() {
    let mut f = Fixture::demo(&common::config());
    f.device.fail_next_present(wgpu::SurfaceError::Lost);

    let result = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene);
    assert!(matches!(
        result,
        Err(RenderError::Surface(wgpu::SurfaceError::Lost))
    ));
    assert_eq!(f.orchestrator.stage(), FrameStage::Idle);

    f.orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    assert_eq!(f.device.presented(), 1);
}

#[test]
fn depth_view_replaces_the_shading_pass() {
    let mut f = Fixture::demo(&common::config());
    f.orchestrator
        .handle_control(&mut f.device, &mut f.frame, ControlEvent::ToggleDepthView);
    assert_eq!(f.frame.view_mode, ViewMode::ShadowMapDebug);

    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    assert_eq!(report.shading_draws, 1);

    let depth_target = f.orchestrator.depth_target().texture();
    let draws = f.device.draw_calls();
    let debug: Vec<_> = draws
        .iter()
        .filter(|d| d.program == Some(Program::DebugDepth))
        .collect();
    assert_eq!(debug.len(), 1);
    assert_eq!(debug[0].shadow_map, Some(depth_target));
    assert_eq!(debug[0].diffuse, None);
    assert_eq!(debug[0].target, Target::Default);
    assert!(f.device.uploads_in(Program::Shading).is_empty());
}

#[test]
fn escape_requests_exit() {
    let mut f = Fixture::demo(&common::config());
    let flow = f
        .orchestrator
        .handle_control(&mut f.device, &mut f.frame, ControlEvent::Exit);
    assert_eq!(flow, ControlFlow::Exit);
}

#[test]
fn orbiting_light_moves_the_next_frame_matrix() {
    let mut f = Fixture::demo(&common::config());
    let first = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap()
        .light_space;

    f.orchestrator
        .handle_control(&mut f.device, &mut f.frame, ControlEvent::ToggleLightOrbit);
    assert!(f.frame.light.orbiting);
    f.frame.update(instant::Duration::from_secs(1));

    let position = f.frame.light.position();
    assert!((position.y - 14.0).abs() < 1e-4);
    assert_ne!(position, Point3::new(-10.0, 14.0, -1.0));

    let second = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap()
        .light_space;
    assert_ne!(first, second);
}

#[test]
fn startup_fails_when_the_initial_program_does_not_compile() {
    let mut device = RecordingDevice::default();
    device.fail_compilation(SceneConfiguration::DirectionalLight);
    let result = umbra::FrameOrchestrator::new(&mut device, &common::config());
    assert!(matches!(result, Err(RenderError::ShaderCompile { .. })));
}

#[test]
fn every_frame_walks_the_stages_from_idle() {
    let mut f = Fixture::demo(&common::config());
    for _ in 0..3 {
        f.orchestrator
            .run_frame(&mut f.device, &mut f.frame, &f.scene)
            .unwrap();
        let stages = f.orchestrator.stages_run();
        assert_eq!(stages.len(), 6);
        assert_eq!(stages.first(), Some(&FrameStage::UpdateLightSpaceMatrix));
        assert_eq!(stages.last(), Some(&FrameStage::Idle));
        assert!(stages.windows(2).all(|w| w[0].next() == w[1]));
    }
    assert_eq!(f.device.presented(), 3);
}
