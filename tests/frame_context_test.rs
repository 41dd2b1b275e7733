use instant::Duration;
use umbra::{
    RendererConfig,
    cgmath::{InnerSpace, Point3},
    context::FrameContext,
};

mod common;

#[test]
fn intro_flies_the_camera_out_then_hands_over() {
    let config = RendererConfig::new();
    let mut frame = FrameContext::new(&config, 800, 600);
    assert!(frame.intro_running());

    let start = frame.camera.position();
    let start_distance = (start - Point3::new(0.0, 0.0, 0.0)).magnitude();
    frame.update(Duration::from_secs(1));
    let moved = frame.camera.position();
    assert!((moved - Point3::new(0.0, 0.0, 0.0)).magnitude() > start_distance);
    assert_ne!(frame.animation.angle.0, 0.0);

    frame.update(Duration::from_secs(4));
    assert!(!frame.intro_running());
}

#[test]
fn held_spin_and_grow_keys_animate() {
    let mut frame = FrameContext::new(&common::config(), 800, 600);
    frame.input.spin = 1.0;
    frame.input.grow = 1.0;
    frame.update(Duration::from_secs(1));

    assert!((frame.animation.angle.0 - 50.0).abs() < 1e-3);
    assert!((frame.animation.scale - 0.5).abs() < 1e-5);
}

#[test]
fn light_refuses_positions_above_the_origin() {
    let mut frame = FrameContext::new(&common::config(), 800, 600);
    let before = frame.light.position();
    assert!(!frame.light.set_position(Point3::new(0.0, 12.0, 0.0)));
    assert_eq!(frame.light.position(), before);
    assert!(frame.light.set_position(Point3::new(-2.0, 10.0, -1.0)));
}

#[test]
fn resize_updates_the_viewport_only_for_real_sizes() {
    let mut frame = FrameContext::new(&common::config(), 800, 600);
    frame.resize(1280, 720);
    assert_eq!(frame.window_size(), (1280, 720));
    assert!((frame.projection.aspect() - 1280.0 / 720.0).abs() < 1e-6);

    frame.resize(0, 720);
    assert_eq!(frame.window_size(), (1280, 720));
}

#[test]
fn no_light_space_before_the_first_frame() {
    let frame = FrameContext::new(&common::config(), 800, 600);
    assert!(frame.light_space().is_none());
}
