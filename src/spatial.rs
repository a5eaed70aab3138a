//! Helper functions to create rotations and placements.

extern crate nalgebra as na;

use na::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};

#[cfg(test)]
#[path = "spatial_tests.rs"]
mod spatial_tests;

/// Defines the coordinate axes of a frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Axis {
    /// The X-axis.
    X,
    /// The Y-axis.
    Y,
    /// The Z-axis.
    Z,
}

impl Axis {
    /// Returns the unit vector along the axis.
    pub fn unit_vector(&self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

/// Returns the placement with the given rotation and translation.
pub fn placement(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Isometry3<f64> {
    Isometry3::from_parts(Translation3::from(translation), rotation)
}

/// Returns the placement described by a position and roll-pitch-yaw angles.
///
/// The angles are applied about the fixed X, Y and Z axes in that order.
pub fn placement_from_xyz_rpy(xyz: Vector3<f64>, rpy: Vector3<f64>) -> Isometry3<f64> {
    placement(
        UnitQuaternion::from_euler_angles(rpy.x, rpy.y, rpy.z),
        xyz,
    )
}

/// Returns the rotation of the given angle, in radians, around one of the coordinate axes.
///
/// ## Example
///
/// ```
/// use std::f64::consts::FRAC_PI_2;
/// use nalgebra::Vector3;
/// use tiago_descriptors::spatial::{rotate, Axis};
///
/// // Rotating the Z-axis a quarter turn around the Y-axis aligns it with the X-axis.
/// let rotated = rotate(Axis::Y, FRAC_PI_2) * Vector3::z();
/// assert!((rotated - Vector3::x()).norm() < 1e-12);
/// ```
pub fn rotate(axis: Axis, angle: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Unit::new_unchecked(axis.unit_vector()), angle)
}

/// Returns the placement that only translates.
pub fn translation(x: f64, y: f64, z: f64) -> Isometry3<f64> {
    Isometry3::translation(x, y, z)
}
