use approx::assert_relative_eq;
use umbra::{
    LightProjector, ShadowSettings,
    cgmath::{EuclideanSpace, InnerSpace, Point3, SquareMatrix, Vector4},
    shadow::{ShadowCoord, compute_light_space_matrix},
};

#[test]
fn inverse_maps_projected_points_back_to_world() {
    let light_space = compute_light_space_matrix(Point3::new(-10.0, 14.0, -1.0), 10.0, 1.1, 50.0);
    let inverse = light_space.inverse().expect("light-space matrix is invertible");

    for world in [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(3.0, 1.0, 0.0),
        Point3::new(-3.0, 1.0, 2.0),
        Point3::new(4.5, -0.5, -6.0),
    ] {
        let clip = light_space.matrix() * Vector4::new(world.x, world.y, world.z, 1.0);
        let back = inverse * clip;
        assert_relative_eq!(back.truncate() / back.w, world.to_homogeneous().truncate(), epsilon = 1e-4);
    }
}

#[test]
fn inverse_recovers_the_light_position() {
    let light = Point3::new(-10.0, 14.0, -1.0);
    let light_space = compute_light_space_matrix(light, 10.0, 1.1, 50.0);
    let inverse = light_space.inverse().expect("light-space matrix is invertible");

    let clip = light_space.matrix() * light.to_homogeneous();
    let back = inverse * clip;
    assert_relative_eq!(back.truncate() / back.w, light.to_vec(), epsilon = 1e-4);
}

#[test]
fn origin_lands_in_the_middle_of_the_map() {
    let light = Point3::new(-10.0, 14.0, -1.0);
    let light_space = compute_light_space_matrix(light, 10.0, 1.1, 50.0);
    let coord = ShadowCoord::from_world(&light_space, Point3::new(0.0, 0.0, 0.0));

    assert_relative_eq!(coord.u, 0.5, epsilon = 1e-5);
    assert_relative_eq!(coord.v, 0.5, epsilon = 1e-5);
    // Distance to the light, mapped from [near, far] to [0, 1]
    let distance = (light - Point3::origin()).magnitude();
    assert_relative_eq!(coord.depth, (distance - 1.1) / (50.0 - 1.1), epsilon = 1e-5);
    assert!(coord.in_coverage());
}

#[test]
fn points_beyond_the_half_extent_are_outside_coverage() {
    let light_space = compute_light_space_matrix(Point3::new(0.5, 10.0, 0.3), 10.0, 1.1, 50.0);
    let far_away = ShadowCoord::from_world(&light_space, Point3::new(24.0, -0.5, 24.0));
    assert!(!far_away.in_coverage());
}

#[test]
fn projector_uses_the_configured_frustum() {
    let settings = ShadowSettings::default().half_extent(5.0).depth_range(0.5, 20.0);
    let projector = LightProjector::new(&settings);
    let light = Point3::new(-2.0, 10.0, -1.0);

    assert_eq!(projector.half_extent(), 5.0);
    assert_eq!(projector.depth_range(), (0.5, 20.0));
    assert_eq!(
        projector.compute_light_space_matrix(light),
        compute_light_space_matrix(light, 5.0, 0.5, 20.0)
    );
}

#[test]
fn light_above_the_origin_is_rejected() {
    assert!(!LightProjector::accepts(Point3::new(0.0, 10.0, 0.0)));
    assert!(!LightProjector::accepts(Point3::new(0.0, 0.0, 0.0)));
    assert!(LightProjector::accepts(Point3::new(0.5, 10.0, 0.3)));
    assert!(LightProjector::accepts(Point3::new(-10.0, 14.0, -1.0)));
}

#[test]
fn light_space_matrix_is_never_singular_for_accepted_lights() {
    let light_space = compute_light_space_matrix(Point3::new(0.01, 10.0, 0.0), 10.0, 1.1, 50.0);
    assert!(light_space.matrix().is_invertible());
}
