extern crate nalgebra as na;

use na::{DVector, Isometry3};

use crate::Error;

use super::{
    frame_elements::{FrameID, JointID},
    model::Model,
};

#[cfg(test)]
#[path = "data_tests.rs"]
mod data_tests;

/// Stores the computation buffers for a [Model].
///
/// The size of the buffers depends on the number of joints and frames of the model that
/// created them. Once joints or frames are added to the model the buffers are stale and
/// all kinematics functions reject them. Create new buffers with [Model::create_data()].
#[derive(Clone, Debug)]
pub struct Data {
    /// The placement of each joint relative to its parent joint for the last configuration.
    local_joint_placements: Vec<Isometry3<f64>>,

    /// The placement of each joint relative to the universe for the last configuration.
    joint_placements: Vec<Isometry3<f64>>,

    /// The placement of each frame relative to the universe.
    frame_placements: Vec<Isometry3<f64>>,

    /// The configuration that was used for the last forward kinematics pass.
    configuration: DVector<f64>,
}

impl Data {
    /// Returns the configuration used for the last forward kinematics pass.
    pub fn configuration(&self) -> &DVector<f64> {
        &self.configuration
    }

    /// Returns the placement of the frame relative to the universe.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidFrameID] - Returned when the buffers have no entry for the frame.
    pub fn frame_placement(&self, id: FrameID) -> Result<&Isometry3<f64>, Error> {
        self.frame_placements
            .get(id.index())
            .ok_or(Error::InvalidFrameID { id })
    }

    /// Returns the placement of the joint relative to the universe.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidJointID] - Returned when the buffers have no entry for the joint.
    pub fn joint_placement(&self, id: JointID) -> Result<&Isometry3<f64>, Error> {
        self.joint_placements
            .get(id.index())
            .ok_or(Error::InvalidJointID { id })
    }

    /// Returns the placement of the joint relative to its parent joint.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidJointID] - Returned when the buffers have no entry for the joint.
    pub fn local_joint_placement(&self, id: JointID) -> Result<&Isometry3<f64>, Error> {
        self.local_joint_placements
            .get(id.index())
            .ok_or(Error::InvalidJointID { id })
    }

    /// Creates buffers sized for the given model. All placements start at the identity and
    /// the stored configuration is the neutral configuration of the model.
    pub fn new(model: &Model) -> Self {
        Self {
            local_joint_placements: vec![Isometry3::identity(); model.njoints()],
            joint_placements: vec![Isometry3::identity(); model.njoints()],
            frame_placements: vec![Isometry3::identity(); model.nframes()],
            configuration: model.neutral(),
        }
    }

    /// Returns the number of frames the buffers were created for.
    pub fn nframes(&self) -> usize {
        self.frame_placements.len()
    }

    /// Returns the number of joints the buffers were created for.
    pub fn njoints(&self) -> usize {
        self.joint_placements.len()
    }
}

/// Checks that the buffers were created for the current structure of the model.
///
/// ## Errors
///
/// * [Error::StaleData] - Returned when the number of joints or frames differs between the
///   buffers and the model.
pub fn check_data(model: &Model, data: &Data) -> Result<(), Error> {
    if data.njoints() != model.njoints() {
        return Err(Error::StaleData {
            buffer: "joint".to_string(),
            created_for: data.njoints(),
            current: model.njoints(),
        });
    }

    if data.nframes() != model.nframes() {
        return Err(Error::StaleData {
            buffer: "frame".to_string(),
            created_for: data.nframes(),
            current: model.nframes(),
        });
    }

    Ok(())
}

/// Computes the placement of every joint for the given configuration.
///
/// ## Parameters
///
/// * 'model' - The model
/// * 'data' - The buffers created for the model
/// * 'configuration' - The configuration, with [Model::nq()] entries
///
/// ## Errors
///
/// * [Error::StaleData] - Returned when the buffers do not match the model.
/// * [Error::ConfigurationSize] - Returned when the configuration has the wrong size.
pub fn forward_kinematics(
    model: &Model,
    data: &mut Data,
    configuration: &DVector<f64>,
) -> Result<(), Error> {
    check_data(model, data)?;
    if configuration.len() != model.nq() {
        return Err(Error::ConfigurationSize {
            expected: model.nq(),
            actual: configuration.len(),
        });
    }

    let q = configuration.as_slice();
    for (index, joint) in model.joints().enumerate().skip(1) {
        let segment = &q[joint.idx_q()..joint.idx_q() + joint.nq()];
        let local = joint.placement() * joint.joint_type().transform(segment);

        // Parents are always stored before their children.
        let parent_placement = data.joint_placements[joint.parent().index()];
        data.local_joint_placements[index] = local;
        data.joint_placements[index] = parent_placement * local;
    }

    data.configuration = configuration.clone();
    Ok(())
}

/// Computes the placement of every frame from the joint placements stored in the buffers.
///
/// [forward_kinematics()] should be called first.
///
/// ## Errors
///
/// * [Error::StaleData] - Returned when the buffers do not match the model.
pub fn update_frame_placements(model: &Model, data: &mut Data) -> Result<(), Error> {
    check_data(model, data)?;

    for (index, frame) in model.frames().enumerate() {
        data.frame_placements[index] =
            data.joint_placements[frame.parent_joint().index()] * frame.placement();
    }

    Ok(())
}

/// Computes the placement of every joint and every frame for the given configuration.
///
/// ## Errors
///
/// * [Error::StaleData] - Returned when the buffers do not match the model.
/// * [Error::ConfigurationSize] - Returned when the configuration has the wrong size.
pub fn frames_forward_kinematics(
    model: &Model,
    data: &mut Data,
    configuration: &DVector<f64>,
) -> Result<(), Error> {
    forward_kinematics(model, data, configuration)?;
    update_frame_placements(model, data)
}
