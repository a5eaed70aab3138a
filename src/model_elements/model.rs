extern crate nalgebra as na;

use std::collections::BTreeMap;

use float_cmp::{ApproxEq, F64Margin};
use na::{DVector, Isometry3};
use tracing::debug;

use crate::Error;

use super::{
    data::Data,
    frame_elements::{Frame, FrameID, FrameType, Joint, JointID, JointType},
};

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;

/// The name of the joint and the frame at the root of every model.
pub const UNIVERSE_NAME: &str = "universe";

/// The margin used when checking that the rotational parts of a configuration are normalized.
const NORMALIZATION_MARGIN: F64Margin = F64Margin {
    epsilon: 1e-8,
    ulps: 4,
};

/// A kinematic model of a robot.
///
/// The model is a tree of [Joint] elements rooted at the 'universe' joint. Each joint
/// contributes [JointType::nq()] configuration coordinates and [JointType::nv()] velocity
/// coordinates. Named [Frame] elements are attached to the joints and mark the links, the
/// joints themselves and any user defined points of interest.
///
/// Joints and frames are only ever added to the model. After adding elements the
/// computation buffers created by [Model::create_data()] no longer match the model and
/// have to be created again.
#[derive(Clone, Debug)]
pub struct Model {
    /// The name of the robot.
    name: String,

    /// The joints of the model. A joint is always stored after its parent.
    joints: Vec<Joint>,

    /// The frames of the model.
    frames: Vec<Frame>,

    /// The total number of configuration coordinates.
    nq: usize,

    /// The total number of velocity coordinates.
    nv: usize,

    /// The lower limit for each configuration coordinate.
    lower_position_limit: DVector<f64>,

    /// The upper limit for each configuration coordinate.
    upper_position_limit: DVector<f64>,

    /// The rotor inertia for each velocity coordinate.
    rotor_inertia: DVector<f64>,

    /// The rotor gear ratio for each velocity coordinate.
    rotor_gear_ratio: DVector<f64>,

    /// The armature for each velocity coordinate.
    armature: DVector<f64>,

    /// The named postures of the robot.
    reference_configurations: BTreeMap<String, DVector<f64>>,
}

impl Model {
    /// Adds a new frame to the model.
    ///
    /// ## Parameters
    ///
    /// * 'frame' - The frame that should be added
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidJointID] - Returned when the parent joint of the frame is not part of the model.
    /// * [Error::InvalidFrameID] - Returned when the parent frame of the frame is not part of the model.
    /// * [Error::FrameAlreadyExists] - Returned when the model already has a frame with the same
    ///   name and the same type.
    pub fn add_frame(&mut self, frame: Frame) -> Result<FrameID, Error> {
        self.joint(frame.parent_joint())?;
        self.frame(frame.parent_frame())?;

        if self.exists_frame_of_type(frame.name(), frame.frame_type()) {
            return Err(Error::FrameAlreadyExists {
                name: frame.name().to_string(),
            });
        }

        let id = FrameID::new(self.frames.len());
        debug!(
            name = frame.name(),
            frame_type = ?frame.frame_type(),
            parent_joint = frame.parent_joint().index(),
            "Adding frame"
        );
        self.frames.push(frame);

        Ok(id)
    }

    /// Adds a new joint to the model.
    ///
    /// The joint is appended at the end of the configuration and velocity vectors.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the joint
    /// * 'joint_type' - The degree-of-freedom of the joint
    /// * 'parent' - The parent joint
    /// * 'placement' - The placement of the joint relative to the parent joint
    /// * 'lower_limit' - The lower limit for each configuration coordinate of the joint
    /// * 'upper_limit' - The upper limit for each configuration coordinate of the joint
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidJointID] - Returned when the parent joint is not part of the model.
    /// * [Error::InvalidDescription] - Returned when trying to add a second universe joint.
    /// * [Error::ConfigurationSize] - Returned when the limits do not have one entry per
    ///   configuration coordinate of the joint.
    pub fn add_joint(
        &mut self,
        name: String,
        joint_type: JointType,
        parent: JointID,
        placement: Isometry3<f64>,
        lower_limit: &[f64],
        upper_limit: &[f64],
    ) -> Result<JointID, Error> {
        self.joint(parent)?;

        if joint_type == JointType::Universe {
            return Err(Error::InvalidDescription {
                reason: format!("Joint {} cannot be a second universe joint.", name),
            });
        }

        for limit in [lower_limit, upper_limit] {
            if limit.len() != joint_type.nq() {
                return Err(Error::ConfigurationSize {
                    expected: joint_type.nq(),
                    actual: limit.len(),
                });
            }
        }

        let id = JointID::new(self.joints.len());
        debug!(
            name = name.as_str(),
            joint_type = joint_type.short_name(),
            parent = parent.index(),
            idx_q = self.nq,
            "Adding joint"
        );

        self.joints.push(Joint::new(
            name, joint_type, parent, placement, self.nq, self.nv,
        ));

        self.lower_position_limit = extend(&self.lower_position_limit, lower_limit);
        self.upper_position_limit = extend(&self.upper_position_limit, upper_limit);

        let zeros = vec![0.0; joint_type.nv()];
        self.rotor_inertia = extend(&self.rotor_inertia, &zeros);
        self.rotor_gear_ratio = extend(&self.rotor_gear_ratio, &zeros);
        self.armature = extend(&self.armature, &zeros);

        self.nq += joint_type.nq();
        self.nv += joint_type.nv();

        Ok(id)
    }

    /// Stores a named configuration of the robot.
    ///
    /// ## Errors
    ///
    /// * [Error::ConfigurationSize] - Returned when the configuration does not have [Model::nq()]
    ///   entries.
    pub fn add_reference_configuration(
        &mut self,
        name: String,
        configuration: DVector<f64>,
    ) -> Result<(), Error> {
        self.check_configuration_size(&configuration)?;
        self.reference_configurations.insert(name, configuration);
        Ok(())
    }

    /// Returns the armature for each velocity coordinate.
    pub fn armature(&self) -> &DVector<f64> {
        &self.armature
    }

    fn check_configuration_size(&self, configuration: &DVector<f64>) -> Result<(), Error> {
        if configuration.len() != self.nq {
            return Err(Error::ConfigurationSize {
                expected: self.nq,
                actual: configuration.len(),
            });
        }

        Ok(())
    }

    /// Creates the computation buffers for the current structure of the model.
    pub fn create_data(&self) -> Data {
        Data::new(self)
    }

    /// Returns a value indicating whether the model contains a frame with the given name.
    pub fn exists_frame(&self, name: &str) -> bool {
        self.frames.iter().any(|f| f.name() == name)
    }

    fn exists_frame_of_type(&self, name: &str, frame_type: FrameType) -> bool {
        self.frames
            .iter()
            .any(|f| f.name() == name && f.frame_type() == frame_type)
    }

    /// Returns the frame with the given ID.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidFrameID] - Returned when there is no frame with the given ID.
    pub fn frame(&self, id: FrameID) -> Result<&Frame, Error> {
        self.frames
            .get(id.index())
            .ok_or(Error::InvalidFrameID { id })
    }

    /// Returns an iterator over all the frames in the order in which they were added.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Returns the ID of the first frame with the given name.
    ///
    /// ## Errors
    ///
    /// * [Error::FrameNotFound] - Returned when there is no frame with the given name.
    pub fn get_frame_id(&self, name: &str) -> Result<FrameID, Error> {
        self.frames
            .iter()
            .position(|f| f.name() == name)
            .map(FrameID::new)
            .ok_or_else(|| Error::FrameNotFound {
                name: name.to_string(),
            })
    }

    /// Returns the ID of the first frame with the given name and role.
    ///
    /// ## Errors
    ///
    /// * [Error::FrameNotFound] - Returned when there is no frame with the given name and role.
    pub fn get_frame_id_of_type(&self, name: &str, frame_type: FrameType) -> Result<FrameID, Error> {
        self.frames
            .iter()
            .position(|f| f.name() == name && f.frame_type() == frame_type)
            .map(FrameID::new)
            .ok_or_else(|| Error::FrameNotFound {
                name: name.to_string(),
            })
    }

    /// Returns the ID of the joint with the given name.
    ///
    /// ## Errors
    ///
    /// * [Error::UnknownJoint] - Returned when there is no joint with the given name.
    pub fn get_joint_id(&self, name: &str) -> Result<JointID, Error> {
        self.joints
            .iter()
            .position(|j| j.name() == name)
            .map(JointID::new)
            .ok_or_else(|| Error::UnknownJoint {
                name: name.to_string(),
            })
    }

    /// Returns a value indicating whether all rotational coordinates of the configuration
    /// are normalized, i.e. the (cos, sin) pairs and the quaternions have unit length.
    ///
    /// ## Errors
    ///
    /// * [Error::ConfigurationSize] - Returned when the configuration does not have [Model::nq()]
    ///   entries.
    pub fn is_normalized(&self, configuration: &DVector<f64>) -> Result<bool, Error> {
        self.check_configuration_size(configuration)?;

        let normalized = self.joints.iter().all(|joint| {
            let q = &configuration.as_slice()[joint.idx_q()..joint.idx_q() + joint.nq()];
            let norm = match joint.joint_type() {
                JointType::Planar => Some((q[2] * q[2] + q[3] * q[3]).sqrt()),
                JointType::RevoluteUnbounded { .. } => Some((q[0] * q[0] + q[1] * q[1]).sqrt()),
                JointType::FreeFlyer => Some(
                    (q[3] * q[3] + q[4] * q[4] + q[5] * q[5] + q[6] * q[6]).sqrt(),
                ),
                _ => None,
            };

            match norm {
                Some(n) => n.approx_eq(1.0, NORMALIZATION_MARGIN),
                None => true,
            }
        });

        Ok(normalized)
    }

    /// Returns a value indicating whether every coordinate of the configuration lies within
    /// the position limits of the model.
    ///
    /// ## Errors
    ///
    /// * [Error::ConfigurationSize] - Returned when the configuration does not have [Model::nq()]
    ///   entries.
    pub fn is_within_position_limits(&self, configuration: &DVector<f64>) -> Result<bool, Error> {
        self.check_configuration_size(configuration)?;

        Ok(configuration
            .iter()
            .zip(self.lower_position_limit.iter())
            .zip(self.upper_position_limit.iter())
            .all(|((q, lower), upper)| q >= lower && q <= upper))
    }

    /// Returns the joint with the given ID.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidJointID] - Returned when there is no joint with the given ID.
    pub fn joint(&self, id: JointID) -> Result<&Joint, Error> {
        self.joints
            .get(id.index())
            .ok_or(Error::InvalidJointID { id })
    }

    /// Returns an iterator over all the joints, starting with the universe joint.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.iter()
    }

    /// Returns the lower limit for each configuration coordinate.
    pub fn lower_position_limit(&self) -> &DVector<f64> {
        &self.lower_position_limit
    }

    /// Returns the name of the robot.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Returns the neutral configuration of the model.
    pub fn neutral(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.nq,
            self.joints.iter().flat_map(|j| j.joint_type().neutral()),
        )
    }

    /// Creates a new model that only contains the universe joint and the universe frame.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the robot
    pub fn new(name: String) -> Self {
        Self {
            name,
            joints: vec![Joint::new(
                UNIVERSE_NAME.to_string(),
                JointType::Universe,
                JointID::universe(),
                Isometry3::identity(),
                0,
                0,
            )],
            frames: vec![Frame::new(
                UNIVERSE_NAME.to_string(),
                JointID::universe(),
                FrameID::universe(),
                Isometry3::identity(),
                FrameType::FixedJoint,
            )],
            nq: 0,
            nv: 0,
            lower_position_limit: DVector::zeros(0),
            upper_position_limit: DVector::zeros(0),
            rotor_inertia: DVector::zeros(0),
            rotor_gear_ratio: DVector::zeros(0),
            armature: DVector::zeros(0),
            reference_configurations: BTreeMap::new(),
        }
    }

    /// Returns the number of frames in the model.
    pub fn nframes(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of joints in the model, including the universe joint.
    pub fn njoints(&self) -> usize {
        self.joints.len()
    }

    /// Returns the total number of configuration coordinates.
    pub fn nq(&self) -> usize {
        self.nq
    }

    /// Returns the total number of velocity coordinates.
    pub fn nv(&self) -> usize {
        self.nv
    }

    /// Returns the named configuration.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingReferenceConfiguration] - Returned when there is no configuration with
    ///   the given name.
    pub fn reference_configuration(&self, name: &str) -> Result<&DVector<f64>, Error> {
        self.reference_configurations
            .get(name)
            .ok_or_else(|| Error::MissingReferenceConfiguration {
                name: name.to_string(),
            })
    }

    /// Returns the names of the stored configurations.
    pub fn reference_configuration_names(&self) -> impl Iterator<Item = &str> {
        self.reference_configurations.keys().map(|k| k.as_str())
    }

    /// Returns the rotor gear ratio for each velocity coordinate.
    pub fn rotor_gear_ratio(&self) -> &DVector<f64> {
        &self.rotor_gear_ratio
    }

    /// Returns the rotor inertia for each velocity coordinate.
    pub fn rotor_inertia(&self) -> &DVector<f64> {
        &self.rotor_inertia
    }

    /// Overwrites the position limits of all configuration coordinates of a joint.
    ///
    /// ## Parameters
    ///
    /// * 'id' - The joint for which the limits should be changed
    /// * 'lower' - The new lower limit
    /// * 'upper' - The new upper limit
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidJointID] - Returned when there is no joint with the given ID.
    pub fn set_joint_position_limits(
        &mut self,
        id: JointID,
        lower: f64,
        upper: f64,
    ) -> Result<(), Error> {
        let joint = self.joint(id)?;
        let range = joint.idx_q()..joint.idx_q() + joint.nq();
        for i in range {
            self.lower_position_limit[i] = lower;
            self.upper_position_limit[i] = upper;
        }

        Ok(())
    }

    /// Replaces the position limits of the model.
    ///
    /// ## Errors
    ///
    /// * [Error::ConfigurationSize] - Returned when either vector does not have [Model::nq()]
    ///   entries.
    pub fn set_position_limits(
        &mut self,
        lower: DVector<f64>,
        upper: DVector<f64>,
    ) -> Result<(), Error> {
        self.check_configuration_size(&lower)?;
        self.check_configuration_size(&upper)?;

        self.lower_position_limit = lower;
        self.upper_position_limit = upper;
        Ok(())
    }

    /// Sets the rotor parameters for a joint with a single velocity coordinate and updates
    /// the armature to `inertia * gear_ratio^2`.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidJointID] - Returned when there is no joint with the given ID.
    /// * [Error::InvalidDescription] - Returned when the joint does not have exactly one velocity
    ///   coordinate.
    pub fn set_rotor_parameters(
        &mut self,
        id: JointID,
        inertia: f64,
        gear_ratio: f64,
    ) -> Result<(), Error> {
        let joint = self.joint(id)?;
        if joint.nv() != 1 {
            return Err(Error::InvalidDescription {
                reason: format!(
                    "Rotor parameters can only be set on joints with one degree of freedom. Joint {} has {}.",
                    joint.name(),
                    joint.nv()
                ),
            });
        }

        let idx_v = joint.idx_v();
        self.rotor_inertia[idx_v] = inertia;
        self.rotor_gear_ratio[idx_v] = gear_ratio;
        self.armature[idx_v] = inertia * gear_ratio * gear_ratio;
        Ok(())
    }

    /// Returns the upper limit for each configuration coordinate.
    pub fn upper_position_limit(&self) -> &DVector<f64> {
        &self.upper_position_limit
    }
}

fn extend(vector: &DVector<f64>, values: &[f64]) -> DVector<f64> {
    DVector::from_iterator(
        vector.len() + values.len(),
        vector.iter().copied().chain(values.iter().copied()),
    )
}
