//! Adds axis markers to the Tiago model.
//!
//! An axis marker is an operational frame with three thin cylinders that show the direction of
//! its X-axis (red), Y-axis (green) and Z-axis (blue). The markers are only visual, they don't
//! change the kinematics of the robot.

extern crate nalgebra as na;

use std::f64::consts::FRAC_PI_2;

use na::{DVector, UnitQuaternion, Vector3, Vector4};
use tracing::info;

use crate::{
    geometry::{
        geometry_elements::{blue, green, red, GeometryObject, GeometryShape},
        geometry_model::GeometryModel,
    },
    loader::{LoaderConfig, RobotLoader},
    model_elements::{
        frame_elements::{Frame, FrameID, FrameType},
        model::Model,
    },
    model_path::ModelPathResolver,
    robot::Robot,
    spatial::{placement, rotate, translation, Axis},
    Error,
};

#[cfg(test)]
#[path = "markers_tests.rs"]
mod markers_tests;

/// The ratio between the length and the radius of the marker cylinders.
const LENGTH_TO_RADIUS_RATIO: f64 = 30.0;

/// Describes an axis marker and where it is attached to the model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisMarker {
    /// The name of the frame the marker is attached to.
    pub anchor: &'static str,

    /// The name of the operational frame that is created for the marker.
    pub frame_name: &'static str,

    /// The prefix of the geometry names, the full names are `<prefix>_x`, `<prefix>_y` and
    /// `<prefix>_z`.
    pub geometry_prefix: &'static str,

    /// The position of the marker relative to the anchor frame.
    pub offset: [f64; 3],

    /// The length of the cylinders.
    pub length: f64,
}

/// The marker at the tool of the arm.
pub const TOOL_MARKER: AxisMarker = AxisMarker {
    anchor: "wrist_ft_tool_link",
    frame_name: "frametool",
    geometry_prefix: "axis",
    offset: [0.0, 0.0, 0.08],
    length: 0.3,
};

/// The marker in front of the mobile base.
pub const BASIS_MARKER: AxisMarker = AxisMarker {
    anchor: "base_link",
    frame_name: "framebasis",
    geometry_prefix: "axis2",
    offset: [0.3, 0.0, 0.15],
    length: 0.3,
};

/// The marker in front of the head camera.
pub const GAZE_MARKER: AxisMarker = AxisMarker {
    anchor: "xtion_joint",
    frame_name: "framegaze",
    geometry_prefix: "axisgaze",
    offset: [0.4, 0.0, 0.0],
    length: 0.05,
};

impl AxisMarker {
    /// Returns the radius of the cylinders.
    pub fn radius(&self) -> f64 {
        self.length / LENGTH_TO_RADIUS_RATIO
    }
}

/// Returns the rotation that turns the Z-axis of a cylinder onto the given axis and the color
/// used to draw that axis.
fn axis_appearance(axis: Axis) -> (&'static str, UnitQuaternion<f64>, Vector4<f64>) {
    match axis {
        Axis::X => ("x", rotate(Axis::Y, FRAC_PI_2), red()),
        Axis::Y => ("y", rotate(Axis::X, -FRAC_PI_2), green()),
        Axis::Z => ("z", UnitQuaternion::identity(), blue()),
    }
}

/// Adds an axis marker to the model and its visual geometry.
///
/// The marker frame is an operational frame on the joint of the anchor frame. The offset is
/// expressed in the anchor frame, not in the frame of the joint, so for an anchor that sits
/// away from its joint the marker lands at `anchor placement * offset`. Each cylinder starts at the origin of the marker frame and points
/// along one of its axes.
///
/// ## Parameters
///
/// * 'model' - The kinematic model
/// * 'visual_model' - The visual geometry of the model
/// * 'marker' - The marker that should be added
///
/// ## Errors
///
/// * [Error::FrameNotFound] - Returned when the model has no frame with the anchor name.
/// * [Error::FrameAlreadyExists] - Returned when the marker frame already exists.
/// * [Error::GeometryAlreadyExists] - Returned when one of the cylinders already exists.
pub fn add_axis_marker(
    model: &mut Model,
    visual_model: &mut GeometryModel,
    marker: &AxisMarker,
) -> Result<FrameID, Error> {
    let anchor_id = model.get_frame_id(marker.anchor)?;
    let anchor = model.frame(anchor_id)?.clone();

    let [x, y, z] = marker.offset;
    let frame_placement = anchor.placement() * translation(x, y, z);
    let frame_id = model.add_frame(Frame::new(
        marker.frame_name.to_string(),
        anchor.parent_joint(),
        anchor_id,
        frame_placement,
        FrameType::OperationalFrame,
    ))?;

    let half_length = Vector3::new(0.0, 0.0, marker.length / 2.0);
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let (suffix, rotation, color) = axis_appearance(axis);
        let object = GeometryObject::new(
            format!("{}_{}", marker.geometry_prefix, suffix),
            frame_id,
            anchor.parent_joint(),
            GeometryShape::Cylinder {
                radius: marker.radius(),
                length: marker.length,
            },
            frame_placement * placement(rotation, rotation * half_length),
        )
        .with_mesh_color(color);

        visual_model.add_geometry_object(object)?;
    }

    info!(
        frame = marker.frame_name,
        anchor = marker.anchor,
        joint = anchor.parent_joint().index(),
        "Added axis marker"
    );
    Ok(frame_id)
}

/// Returns the default configuration of the decorated robot: the root joint at x = 1, y = 1
/// with cos = 1, sin = 0 and every other coordinate at zero.
pub fn default_configuration(nq: usize) -> DVector<f64> {
    DVector::from_fn(nq, |i, _| if i < 3 { 1.0 } else { 0.0 })
}

/// Adds the axis markers to a loaded robot.
///
/// The tool and basis markers are always added, the gaze marker only when requested.
/// Afterwards the default configuration is replaced by [default_configuration()] and the
/// computation buffers are regenerated.
///
/// ## Parameters
///
/// * 'robot' - The loaded robot
/// * 'add_gaze_frame' - Indicates if the gaze marker should be added
///
/// ## Errors
///
/// * [Error::FrameNotFound] - Returned when the model has no frame with one of the anchor names.
/// * Any error returned by [add_axis_marker()].
pub fn decorate(mut robot: Robot, add_gaze_frame: bool) -> Result<Robot, Error> {
    let mut markers = vec![TOOL_MARKER, BASIS_MARKER];
    if add_gaze_frame {
        markers.push(GAZE_MARKER);
    }

    {
        let (model, visual_model) = robot.models_mut();
        for marker in &markers {
            add_axis_marker(model, visual_model, marker)?;
        }
    }

    let q0 = default_configuration(robot.model().nq());
    robot.set_q0(q0)?;
    robot.regenerate_data();

    Ok(robot)
}

/// Loads the Tiago robot with a planar root joint and adds the axis markers.
///
/// ## Parameters
///
/// * 'add_gaze_frame' - Indicates if the gaze marker should be added
/// * 'resolver' - Provides the model directories that contain the `tiago_description` package
///
/// ## Errors
///
/// * Any error returned by [RobotLoader::load()] or [decorate()].
pub fn load_tiago(add_gaze_frame: bool, resolver: &ModelPathResolver) -> Result<Robot, Error> {
    let loaded = RobotLoader::new(LoaderConfig::default()).load(resolver)?;
    decorate(loaded.into_robot(), add_gaze_frame)
}
