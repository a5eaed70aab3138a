//! Defines the different frame elements that are used to create a robot model

extern crate nalgebra as na;

use std::fmt::Display;

use na::{Isometry3, Quaternion, Translation3, Unit, UnitQuaternion, Vector3};

#[cfg(test)]
#[path = "frame_elements_tests.rs"]
mod frame_elements_tests;

/// Defines the index of a [Frame] in a model.
///
/// Frames are never removed from a model so the index of a frame stays valid for the
/// life time of the model. The frame at index 0 is the 'universe' frame.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FrameID {
    /// The position of the frame in the frame collection of the model.
    id: usize,
}

impl FrameID {
    /// Returns the position of the frame in the frame collection of the model.
    pub fn index(&self) -> usize {
        self.id
    }

    /// Creates a new ID for the frame stored at the given position.
    pub fn new(index: usize) -> Self {
        Self { id: index }
    }

    /// Returns the ID of the 'universe' frame.
    pub fn universe() -> Self {
        Self { id: 0 }
    }
}

impl Display for FrameID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameID [{}]", self.id)
    }
}

impl AsRef<FrameID> for FrameID {
    fn as_ref(&self) -> &FrameID {
        self
    }
}

/// Defines the index of a [Joint] in a model.
///
/// The joint at index 0 is the 'universe' joint which has no degrees of freedom. Joints are
/// always stored after their parent joint.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct JointID {
    /// The position of the joint in the joint collection of the model.
    id: usize,
}

impl JointID {
    /// Returns the position of the joint in the joint collection of the model.
    pub fn index(&self) -> usize {
        self.id
    }

    /// Creates a new ID for the joint stored at the given position.
    pub fn new(index: usize) -> Self {
        Self { id: index }
    }

    /// Returns the ID of the 'universe' joint.
    pub fn universe() -> Self {
        Self { id: 0 }
    }
}

impl Display for JointID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JointID [{}]", self.id)
    }
}

/// Defines the role of a [Frame] in the model.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameType {
    /// A frame added by the user as an attachment point, e.g. for a tool or a marker.
    OperationalFrame,
    /// The frame of a joint with at least one degree of freedom.
    Joint,
    /// The frame of a joint without degrees of freedom. These joints are merged into
    /// their parent joint.
    FixedJoint,
    /// The frame of a link.
    Body,
    /// The frame of a sensor.
    Sensor,
}

/// Defines a named reference frame in a robot model.
///
/// The frame is rigidly attached to a joint. Its placement is expressed relative to that
/// joint.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// The human readable name for the frame.
    name: String,

    /// The joint the frame is attached to.
    parent_joint: JointID,

    /// The frame that precedes this frame in the kinematic chain.
    parent_frame: FrameID,

    /// The placement of the frame relative to the parent joint.
    placement: Isometry3<f64>,

    /// The role of the frame.
    frame_type: FrameType,
}

impl Frame {
    /// Returns the role of the frame.
    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// Returns the name of the frame.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Creates a new Frame.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the frame
    /// * 'parent_joint' - The joint the frame is attached to
    /// * 'parent_frame' - The frame that precedes the new frame in the kinematic chain
    /// * 'placement' - The placement of the frame relative to the parent joint
    /// * 'frame_type' - The role of the frame
    pub fn new(
        name: String,
        parent_joint: JointID,
        parent_frame: FrameID,
        placement: Isometry3<f64>,
        frame_type: FrameType,
    ) -> Self {
        Self {
            name,
            parent_joint,
            parent_frame,
            placement,
            frame_type,
        }
    }

    /// Returns the frame that precedes this frame in the kinematic chain.
    pub fn parent_frame(&self) -> FrameID {
        self.parent_frame
    }

    /// Returns the joint the frame is attached to.
    pub fn parent_joint(&self) -> JointID {
        self.parent_joint
    }

    /// Returns the placement of the frame relative to the parent joint.
    pub fn placement(&self) -> &Isometry3<f64> {
        &self.placement
    }
}

/// Defines the degree-of-freedom of a joint relative to its parent joint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JointType {
    /// The root of the model. Has no degrees of freedom.
    Universe,
    /// Two translations in the XY-plane and a rotation around the Z-axis. The configuration
    /// is stored as (x, y, cos θ, sin θ).
    Planar,
    /// Three translations and three rotations. The configuration is stored as
    /// (x, y, z, qx, qy, qz, qw).
    FreeFlyer,
    /// A rotation around the given axis. The configuration is the angle.
    Revolute {
        /// The axis of rotation in the joint frame.
        axis: Unit<Vector3<f64>>,
    },
    /// A rotation around the given axis without limits. The configuration is stored as
    /// (cos θ, sin θ).
    RevoluteUnbounded {
        /// The axis of rotation in the joint frame.
        axis: Unit<Vector3<f64>>,
    },
    /// A translation along the given axis. The configuration is the displacement.
    Prismatic {
        /// The axis of translation in the joint frame.
        axis: Unit<Vector3<f64>>,
    },
}

impl JointType {
    /// Returns the name of the joint type.
    pub fn short_name(&self) -> &'static str {
        match self {
            JointType::Universe => "universe",
            JointType::Planar => "planar",
            JointType::FreeFlyer => "free_flyer",
            JointType::Revolute { .. } => "revolute",
            JointType::RevoluteUnbounded { .. } => "revolute_unbounded",
            JointType::Prismatic { .. } => "prismatic",
        }
    }

    /// Returns the number of configuration coordinates of the joint.
    pub fn nq(&self) -> usize {
        match self {
            JointType::Universe => 0,
            JointType::Planar => 4,
            JointType::FreeFlyer => 7,
            JointType::Revolute { .. } => 1,
            JointType::RevoluteUnbounded { .. } => 2,
            JointType::Prismatic { .. } => 1,
        }
    }

    /// Returns the number of velocity coordinates of the joint.
    pub fn nv(&self) -> usize {
        match self {
            JointType::Universe => 0,
            JointType::Planar => 3,
            JointType::FreeFlyer => 6,
            JointType::Revolute { .. } => 1,
            JointType::RevoluteUnbounded { .. } => 1,
            JointType::Prismatic { .. } => 1,
        }
    }

    /// Returns the neutral configuration of the joint, i.e. the configuration in which the
    /// joint transform is the identity.
    pub fn neutral(&self) -> Vec<f64> {
        match self {
            JointType::Universe => vec![],
            JointType::Planar => vec![0.0, 0.0, 1.0, 0.0],
            JointType::FreeFlyer => vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            JointType::Revolute { .. } => vec![0.0],
            JointType::RevoluteUnbounded { .. } => vec![1.0, 0.0],
            JointType::Prismatic { .. } => vec![0.0],
        }
    }

    /// Returns the transform caused by the motion of the joint.
    ///
    /// ## Parameters
    ///
    /// * 'q' - The configuration coordinates of the joint. Must have [JointType::nq()] entries.
    pub fn transform(&self, q: &[f64]) -> Isometry3<f64> {
        match self {
            JointType::Universe => Isometry3::identity(),
            JointType::Planar => Isometry3::from_parts(
                Translation3::new(q[0], q[1], 0.0),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), q[3].atan2(q[2])),
            ),
            JointType::FreeFlyer => Isometry3::from_parts(
                Translation3::new(q[0], q[1], q[2]),
                UnitQuaternion::from_quaternion(Quaternion::new(q[6], q[3], q[4], q[5])),
            ),
            JointType::Revolute { axis } => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(axis, q[0]),
            ),
            JointType::RevoluteUnbounded { axis } => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(axis, q[1].atan2(q[0])),
            ),
            JointType::Prismatic { axis } => Isometry3::from_parts(
                Translation3::from(axis.into_inner() * q[0]),
                UnitQuaternion::identity(),
            ),
        }
    }
}

/// Defines a joint in a robot model.
///
/// A joint connects the body that follows it to the body of its parent joint. The placement
/// of the joint is expressed relative to the parent joint when the joint is in its neutral
/// configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    /// The human readable name for the joint.
    name: String,

    /// The degree-of-freedom of the joint.
    joint_type: JointType,

    /// The parent joint.
    parent: JointID,

    /// The placement of the joint relative to the parent joint.
    placement: Isometry3<f64>,

    /// The index of the first configuration coordinate of the joint.
    idx_q: usize,

    /// The index of the first velocity coordinate of the joint.
    idx_v: usize,
}

impl Joint {
    /// Returns the index of the first configuration coordinate of the joint.
    pub fn idx_q(&self) -> usize {
        self.idx_q
    }

    /// Returns the index of the first velocity coordinate of the joint.
    pub fn idx_v(&self) -> usize {
        self.idx_v
    }

    /// Returns the degree-of-freedom of the joint.
    pub fn joint_type(&self) -> JointType {
        self.joint_type
    }

    /// Returns the name of the joint.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Creates a new Joint.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the joint
    /// * 'joint_type' - The degree-of-freedom of the joint
    /// * 'parent' - The parent joint
    /// * 'placement' - The placement of the joint relative to the parent joint
    /// * 'idx_q' - The index of the first configuration coordinate
    /// * 'idx_v' - The index of the first velocity coordinate
    pub fn new(
        name: String,
        joint_type: JointType,
        parent: JointID,
        placement: Isometry3<f64>,
        idx_q: usize,
        idx_v: usize,
    ) -> Self {
        Self {
            name,
            joint_type,
            parent,
            placement,
            idx_q,
            idx_v,
        }
    }

    /// Returns the number of configuration coordinates of the joint.
    pub fn nq(&self) -> usize {
        self.joint_type.nq()
    }

    /// Returns the number of velocity coordinates of the joint.
    pub fn nv(&self) -> usize {
        self.joint_type.nv()
    }

    /// Returns the parent joint.
    pub fn parent(&self) -> JointID {
        self.parent
    }

    /// Returns the placement of the joint relative to the parent joint.
    pub fn placement(&self) -> &Isometry3<f64> {
        &self.placement
    }
}
