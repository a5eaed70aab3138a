extern crate nalgebra as na;

use na::DVector;

use crate::{
    geometry::geometry_model::{update_geometry_placements, GeometryData, GeometryModel},
    model_elements::{
        data::{frames_forward_kinematics, Data},
        model::Model,
    },
    Error,
};

#[cfg(test)]
#[path = "robot_tests.rs"]
mod robot_tests;

/// Bundles the kinematic model of a robot, its visual geometry and the computation buffers
/// for both.
///
/// The buffers are created for the structure of the models at the time the robot is created
/// or at the last call to [Robot::regenerate_data()]. Adding frames, joints or geometry
/// objects through [Robot::models_mut()] leaves the buffers stale until they are regenerated.
#[derive(Clone, Debug)]
pub struct Robot {
    /// The kinematic model.
    model: Model,

    /// The computation buffers for the kinematic model.
    data: Data,

    /// The visual geometry attached to the frames of the model.
    visual_model: GeometryModel,

    /// The computation buffers for the visual geometry.
    visual_data: GeometryData,

    /// The default configuration, if one is known.
    q0: Option<DVector<f64>>,
}

impl Robot {
    /// Returns the computation buffers for the kinematic model.
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Returns the kinematic model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns mutable references to the kinematic model and the visual geometry.
    ///
    /// Structural changes made through these references make the current buffers stale.
    /// Call [Robot::regenerate_data()] once all changes are made.
    pub fn models_mut(&mut self) -> (&mut Model, &mut GeometryModel) {
        (&mut self.model, &mut self.visual_model)
    }

    /// Creates a new robot and the computation buffers for its models.
    ///
    /// ## Parameters
    ///
    /// * 'model' - The kinematic model
    /// * 'visual_model' - The visual geometry attached to the frames of the model
    /// * 'q0' - The default configuration, if one is known
    pub fn new(model: Model, visual_model: GeometryModel, q0: Option<DVector<f64>>) -> Self {
        let data = model.create_data();
        let visual_data = visual_model.create_data();

        Self {
            model,
            data,
            visual_model,
            visual_data,
            q0,
        }
    }

    /// Returns the default configuration, if one is known.
    pub fn q0(&self) -> Option<&DVector<f64>> {
        self.q0.as_ref()
    }

    /// Creates new computation buffers that match the current structure of the models.
    pub fn regenerate_data(&mut self) {
        self.data = self.model.create_data();
        self.visual_data = self.visual_model.create_data();
    }

    /// Sets the default configuration.
    ///
    /// ## Errors
    ///
    /// * [Error::ConfigurationSize] - Returned when the configuration does not have
    ///   [Model::nq()] entries.
    pub fn set_q0(&mut self, q0: DVector<f64>) -> Result<(), Error> {
        if q0.len() != self.model.nq() {
            return Err(Error::ConfigurationSize {
                expected: self.model.nq(),
                actual: q0.len(),
            });
        }

        self.q0 = Some(q0);
        Ok(())
    }

    /// Computes the placement of every joint, frame and geometry object for the given
    /// configuration.
    ///
    /// ## Errors
    ///
    /// * [Error::StaleData] - Returned when the buffers no longer match the models.
    /// * [Error::ConfigurationSize] - Returned when the configuration has the wrong size.
    pub fn update_placements(&mut self, configuration: &DVector<f64>) -> Result<(), Error> {
        frames_forward_kinematics(&self.model, &mut self.data, configuration)?;
        update_geometry_placements(
            &self.model,
            &self.data,
            &self.visual_model,
            &mut self.visual_data,
        )
    }

    /// Returns the computation buffers for the visual geometry.
    pub fn visual_data(&self) -> &GeometryData {
        &self.visual_data
    }

    /// Returns the visual geometry.
    pub fn visual_model(&self) -> &GeometryModel {
        &self.visual_model
    }
}
