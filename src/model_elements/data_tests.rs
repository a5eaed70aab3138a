use std::f64::consts::FRAC_PI_2;

use float_cmp::{ApproxEq, F64Margin};
use nalgebra::{Isometry3, Vector3};

use super::*;
use crate::model_elements::frame_elements::{Frame, FrameType, JointType};

const MARGIN: F64Margin = F64Margin {
    epsilon: 1e-12,
    ulps: 4,
};

fn assert_vector_eq(expected: Vector3<f64>, actual: Vector3<f64>) {
    for i in 0..3 {
        assert!(
            expected[i].approx_eq(actual[i], MARGIN),
            "Expected {:?} but got {:?}",
            expected,
            actual
        );
    }
}

/// A planar base with an arm joint 0.5 m above it that rotates around Z, and a tool frame
/// 1 m along the X-axis of the arm.
fn create_model() -> (Model, JointID, JointID, FrameID) {
    let mut model = Model::new("arm".to_string());
    let root = model
        .add_joint(
            "root_joint".to_string(),
            JointType::Planar,
            JointID::universe(),
            Isometry3::identity(),
            &[-1.0; 4],
            &[1.0; 4],
        )
        .unwrap();
    let arm = model
        .add_joint(
            "arm_joint".to_string(),
            JointType::Revolute {
                axis: Vector3::z_axis(),
            },
            root,
            Isometry3::translation(0.0, 0.0, 0.5),
            &[-3.0],
            &[3.0],
        )
        .unwrap();
    let tool = model
        .add_frame(Frame::new(
            "tool".to_string(),
            arm,
            FrameID::universe(),
            Isometry3::translation(1.0, 0.0, 0.0),
            FrameType::OperationalFrame,
        ))
        .unwrap();

    (model, root, arm, tool)
}

#[test]
fn when_creating_data_should_start_at_the_identity() {
    let (model, _, arm, tool) = create_model();
    let data = Data::new(&model);

    assert_eq!(3, data.njoints());
    assert_eq!(2, data.nframes());
    assert_eq!(&Isometry3::identity(), data.joint_placement(arm).unwrap());
    assert_eq!(&Isometry3::identity(), data.frame_placement(tool).unwrap());
}

#[test]
fn when_computing_forward_kinematics_should_chain_the_joint_placements() {
    let (model, root, arm, _) = create_model();
    let mut data = model.create_data();
    let q = DVector::from_vec(vec![0.5, 0.25, FRAC_PI_2.cos(), FRAC_PI_2.sin(), 0.0]);

    forward_kinematics(&model, &mut data, &q).unwrap();

    let root_placement = data.joint_placement(root).unwrap();
    assert_vector_eq(Vector3::new(0.5, 0.25, 0.0), root_placement.translation.vector);

    let arm_placement = data.joint_placement(arm).unwrap();
    assert_vector_eq(Vector3::new(0.5, 0.25, 0.5), arm_placement.translation.vector);
    assert_vector_eq(Vector3::y(), arm_placement.rotation * Vector3::x());

    let local = data.local_joint_placement(arm).unwrap();
    assert_vector_eq(Vector3::new(0.0, 0.0, 0.5), local.translation.vector);
    assert_eq!(&q, data.configuration());
}

#[test]
fn when_updating_frame_placements_should_follow_the_parent_joint() {
    let (model, _, _, tool) = create_model();
    let mut data = model.create_data();
    let q = DVector::from_vec(vec![0.0, 0.0, 1.0, 0.0, FRAC_PI_2]);

    frames_forward_kinematics(&model, &mut data, &q).unwrap();

    // The arm turns the tool from the X-axis onto the Y-axis.
    let tool_placement = data.frame_placement(tool).unwrap();
    assert_vector_eq(Vector3::new(0.0, 1.0, 0.5), tool_placement.translation.vector);
}

#[test]
fn when_computing_forward_kinematics_with_the_wrong_size_should_error() {
    let (model, _, _, _) = create_model();
    let mut data = model.create_data();

    assert_eq!(
        Err(Error::ConfigurationSize {
            expected: 5,
            actual: 4
        }),
        forward_kinematics(&model, &mut data, &DVector::zeros(4))
    );
}

#[test]
fn when_adding_a_frame_after_creating_data_should_reject_the_stale_data() {
    let (mut model, _, arm, _) = create_model();
    let mut data = model.create_data();

    model
        .add_frame(Frame::new(
            "marker".to_string(),
            arm,
            FrameID::universe(),
            Isometry3::identity(),
            FrameType::OperationalFrame,
        ))
        .unwrap();

    assert_eq!(
        Err(Error::StaleData {
            buffer: "frame".to_string(),
            created_for: 2,
            current: 3
        }),
        frames_forward_kinematics(&model, &mut data, &model.neutral())
    );
    assert!(update_frame_placements(&model, &mut data).is_err());

    let mut data = model.create_data();
    assert!(frames_forward_kinematics(&model, &mut data, &model.neutral()).is_ok());
}

#[test]
fn when_adding_a_joint_after_creating_data_should_reject_the_stale_data() {
    let (mut model, _, arm, _) = create_model();
    let data = model.create_data();

    model
        .add_joint(
            "wrist_joint".to_string(),
            JointType::Revolute {
                axis: Vector3::x_axis(),
            },
            arm,
            Isometry3::identity(),
            &[-1.0],
            &[1.0],
        )
        .unwrap();

    assert_eq!(
        Err(Error::StaleData {
            buffer: "joint".to_string(),
            created_for: 3,
            current: 4
        }),
        check_data(&model, &data)
    );
}

#[test]
fn when_getting_placements_for_unknown_ids_should_error() {
    let (model, _, _, _) = create_model();
    let data = model.create_data();

    assert_eq!(
        Err(Error::InvalidFrameID {
            id: FrameID::new(9)
        }),
        data.frame_placement(FrameID::new(9))
    );
    assert_eq!(
        Err(Error::InvalidJointID {
            id: JointID::new(9)
        }),
        data.joint_placement(JointID::new(9))
    );
}
