use std::f64::consts::{FRAC_PI_2, PI};

use float_cmp::{ApproxEq, F64Margin};
use nalgebra::Vector3;

use super::*;

fn assert_vector_eq(expected: Vector3<f64>, actual: Vector3<f64>) {
    let margin = F64Margin {
        epsilon: 1e-12,
        ulps: 4,
    };
    for i in 0..3 {
        assert!(
            expected[i].approx_eq(actual[i], margin),
            "Expected {:?} but got {:?}",
            expected,
            actual
        );
    }
}

#[test]
fn when_rotating_around_y_by_a_quarter_turn_z_should_map_to_x() {
    let rotation = rotate(Axis::Y, FRAC_PI_2);
    assert_vector_eq(Vector3::x(), rotation * Vector3::z());
}

#[test]
fn when_rotating_around_x_by_minus_a_quarter_turn_z_should_map_to_y() {
    let rotation = rotate(Axis::X, -FRAC_PI_2);
    assert_vector_eq(Vector3::y(), rotation * Vector3::z());
}

#[test]
fn when_rotating_around_z_the_z_axis_should_not_change() {
    let rotation = rotate(Axis::Z, PI / 3.0);
    assert_vector_eq(Vector3::z(), rotation * Vector3::z());
}

#[test]
fn when_creating_a_placement_from_rpy_should_apply_yaw_around_z() {
    let placement = placement_from_xyz_rpy(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, FRAC_PI_2));

    assert_vector_eq(Vector3::new(1.0, 2.0, 3.0), placement.translation.vector);
    assert_vector_eq(Vector3::y(), placement.rotation * Vector3::x());
}

#[test]
fn when_creating_a_translation_should_have_identity_rotation() {
    let placement = translation(0.3, 0.0, 0.15);

    assert_vector_eq(Vector3::new(0.3, 0.0, 0.15), placement.translation.vector);
    assert_vector_eq(Vector3::x(), placement.rotation * Vector3::x());
}

#[test]
fn when_getting_the_unit_vector_of_an_axis_should_match() {
    assert_eq!(Vector3::x(), Axis::X.unit_vector());
    assert_eq!(Vector3::y(), Axis::Y.unit_vector());
    assert_eq!(Vector3::z(), Axis::Z.unit_vector());
}
