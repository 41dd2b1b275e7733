use umbra::{
    RenderError,
    config::ShadowSettings,
    device::recording::RecordingDevice,
    shadow::DepthTarget,
};

mod common;

#[test]
fn zero_resolution_is_an_incomplete_framebuffer() {
    let mut device = RecordingDevice::default();
    let result = DepthTarget::create(&mut device, 0);
    assert!(matches!(result, Err(RenderError::FramebufferIncomplete(_))));
}

#[test]
fn resolution_above_the_device_limit_is_rejected() {
    let mut device = RecordingDevice::default().with_max_dimension(2048);
    let result = DepthTarget::create(&mut device, 4096);
    assert!(matches!(result, Err(RenderError::FramebufferIncomplete(_))));

    let target = DepthTarget::create(&mut device, 2048).unwrap();
    assert_eq!(target.resolution(), 2048);
}

#[test]
fn depth_target_is_a_square_depth_texture() {
    let mut device = RecordingDevice::default();
    let target = DepthTarget::create(&mut device, 512).unwrap();
    let info = device.texture(target.texture()).unwrap();
    assert!(info.depth);
    assert_eq!((info.width, info.height), (512, 512));
}

#[test]
fn startup_aborts_on_an_incomplete_depth_target() {
    let mut device = RecordingDevice::default();
    let config = common::config().shadow(ShadowSettings::default().resolution(0));
    let result = umbra::FrameOrchestrator::new(&mut device, &config);
    let error = result.unwrap_err();
    assert!(error.is_fatal());
    assert!(matches!(error, RenderError::FramebufferIncomplete(_)));
}

#[test]
fn incomplete_framebuffer_is_fatal_but_api_errors_are_not() {
    assert!(RenderError::FramebufferIncomplete("x".into()).is_fatal());
    assert!(!RenderError::GraphicsApi("x".into()).is_fatal());
}
