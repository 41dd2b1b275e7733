use umbra::{
    RendererConfig,
    cgmath::{InnerSpace, Point3, Vector3},
    config::ShadowSettings,
    shadow::{DepthMap, DepthSampler, ShadowCoord, ShadowTest, sampling::shadow_test},
};

mod common;
use common::{Fixture, raster::rasterize_depth};

const RESOLUTION: u32 = 256;

fn config_with_light(light: Point3<f32>) -> RendererConfig {
    common::config()
        .light_position(light)
        .shadow(ShadowSettings::default().resolution(RESOLUTION))
}

fn bias(settings: &ShadowSettings, light: Point3<f32>, normal: Vector3<f32>) -> f32 {
    let to_light = (light - Point3::new(0.0, 0.0, 0.0)).normalize();
    settings.bias_for(normal.dot(to_light).max(0.0))
}

#[test]
fn ground_under_a_raised_cube_is_shadowed() {
    let light = Point3::new(0.5, 10.0, 0.3);
    let config = config_with_light(light);
    let mut f = Fixture::new(&config, common::raised_cube_scene);
    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    let map = rasterize_depth(&f.device, RESOLUTION);

    let up = Vector3::unit_y();
    let b = bias(&config.shadow, light, up);
    // The cube centre projected along the light direction onto y = -0.5
    let under = Point3::new(-0.125, -0.5, -0.075);
    assert_eq!(
        shadow_test(&map, &report.light_space, under, b),
        ShadowTest::Shadowed
    );

    let open_ground = Point3::new(5.0, -0.5, 5.0);
    assert_eq!(
        shadow_test(&map, &report.light_space, open_ground, b),
        ShadowTest::Lit
    );
}

#[test]
fn surfaces_facing_the_light_do_not_shadow_themselves() {
    let light = Point3::new(0.5, 10.0, 0.3);
    let config = config_with_light(light);
    let mut f = Fixture::new(&config, common::raised_cube_scene);
    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    let map = rasterize_depth(&f.device, RESOLUTION);

    let b = bias(&config.shadow, light, Vector3::unit_y());
    for x in [-0.4, -0.2, 0.0, 0.2, 0.4] {
        for z in [-0.4, -0.2, 0.0, 0.2, 0.4] {
            let top = Point3::new(x, 2.5, z);
            assert_eq!(
                shadow_test(&map, &report.light_space, top, b),
                ShadowTest::Lit,
                "top face point {top:?}"
            );
        }
    }
}

#[test]
fn plane_only_scene_is_never_shadowed() {
    let config = config_with_light(Point3::new(-10.0, 14.0, -1.0));
    let mut f = Fixture::new(&config, common::plane_scene);
    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    assert_eq!(report.shadow_draws, 1);
    let map = rasterize_depth(&f.device, RESOLUTION);

    let b = bias(&config.shadow, f.frame.light.position(), Vector3::unit_y());
    for i in -12..=12 {
        for j in -12..=12 {
            let p = Point3::new(i as f32 * 2.0 + 0.37, -0.5, j as f32 * 2.0 - 0.21);
            assert!(
                !shadow_test(&map, &report.light_space, p, b).is_shadowed(),
                "ground point {p:?}"
            );
        }
    }
}

#[test]
fn fragment_at_the_light_is_not_shadowed() {
    let light = Point3::new(0.5, 10.0, 0.3);
    let config = config_with_light(light);
    let mut f = Fixture::new(&config, common::raised_cube_scene);
    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    let map = rasterize_depth(&f.device, RESOLUTION);

    let result = shadow_test(&map, &report.light_space, light, config.shadow.bias_min);
    assert!(!result.is_shadowed());
    assert_eq!(result, ShadowTest::OutsideCoverage);
}

#[test]
fn ground_outside_the_light_frustum_counts_as_lit() {
    let light = Point3::new(0.5, 10.0, 0.3);
    let config = config_with_light(light);
    let mut f = Fixture::new(&config, common::raised_cube_scene);
    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    let map = rasterize_depth(&f.device, RESOLUTION);

    let corner = Point3::new(24.0, -0.5, 24.0);
    assert_eq!(
        shadow_test(&map, &report.light_space, corner, config.shadow.bias_min),
        ShadowTest::OutsideCoverage
    );
}

#[test]
fn stored_depth_matches_the_light_depth_of_lit_surfaces() {
    let light = Point3::new(0.5, 10.0, 0.3);
    let config = config_with_light(light);
    let mut f = Fixture::new(&config, common::raised_cube_scene);
    let report = f
        .orchestrator
        .run_frame(&mut f.device, &mut f.frame, &f.scene)
        .unwrap();
    let map = rasterize_depth(&f.device, RESOLUTION);

    let b = bias(&config.shadow, light, Vector3::unit_y());
    for top in [
        Point3::new(0.1, 2.5, 0.1),
        Point3::new(-0.3, 2.5, 0.2),
        Point3::new(0.25, 2.5, -0.35),
    ] {
        let coord = ShadowCoord::from_world(&report.light_space, top);
        assert!(coord.in_coverage());
        let stored = map.sample(coord.u, coord.v);
        assert!(
            (coord.depth - stored).abs() <= b,
            "{top:?}: light depth {} stored {}",
            coord.depth,
            stored
        );
    }
}

#[test]
fn empty_depth_map_occludes_nothing() {
    let map = DepthMap::cleared(0, 1.0);
    assert_eq!(map.sample(0.5, 0.5), 1.0);

    let light_space = umbra::shadow::compute_light_space_matrix(
        Point3::new(0.5, 10.0, 0.3),
        10.0,
        1.1,
        50.0,
    );
    let ground = Point3::new(0.0, -0.5, 0.0);
    assert_eq!(shadow_test(&map, &light_space, ground, 0.005), ShadowTest::Lit);
}
