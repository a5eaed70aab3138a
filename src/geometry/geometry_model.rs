extern crate nalgebra as na;

use na::Isometry3;
use tracing::debug;

use crate::{
    model_elements::{
        data::{check_data, Data},
        model::Model,
    },
    Error,
};

use super::geometry_elements::GeometryObject;

#[cfg(test)]
#[path = "geometry_model_tests.rs"]
mod geometry_model_tests;

/// Stores the ordered collection of [GeometryObject] instances of a model, e.g. the
/// visual representation of a robot.
#[derive(Clone, Debug, Default)]
pub struct GeometryModel {
    /// The geometry objects in the order in which they were added.
    geometry_objects: Vec<GeometryObject>,
}

impl GeometryModel {
    /// Adds a geometry object to the collection and returns its index.
    ///
    /// ## Errors
    ///
    /// * [Error::GeometryAlreadyExists] - Returned when an object with the same name is
    ///   already stored.
    pub fn add_geometry_object(&mut self, object: GeometryObject) -> Result<usize, Error> {
        if self.exists_geometry_object(object.name()) {
            return Err(Error::GeometryAlreadyExists {
                name: object.name().to_string(),
            });
        }

        debug!(
            name = object.name(),
            parent_frame = object.parent_frame().index(),
            "Adding geometry object"
        );
        self.geometry_objects.push(object);
        Ok(self.geometry_objects.len() - 1)
    }

    /// Creates the computation buffers for the current collection.
    pub fn create_data(&self) -> GeometryData {
        GeometryData::new(self)
    }

    /// Returns a value indicating whether an object with the given name is stored.
    pub fn exists_geometry_object(&self, name: &str) -> bool {
        self.geometry_objects.iter().any(|g| g.name() == name)
    }

    /// Returns the object at the given index.
    pub fn geometry_object(&self, index: usize) -> Option<&GeometryObject> {
        self.geometry_objects.get(index)
    }

    /// Returns an iterator over the objects in the order in which they were added.
    pub fn geometry_objects(&self) -> impl Iterator<Item = &GeometryObject> {
        self.geometry_objects.iter()
    }

    /// Returns the index of the object with the given name, if it exists.
    pub fn get_geometry_id(&self, name: &str) -> Option<usize> {
        self.geometry_objects.iter().position(|g| g.name() == name)
    }

    /// Returns the number of objects in the collection.
    pub fn ngeoms(&self) -> usize {
        self.geometry_objects.len()
    }

    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            geometry_objects: vec![],
        }
    }
}

/// Stores the computation buffers for a [GeometryModel].
#[derive(Clone, Debug)]
pub struct GeometryData {
    /// The placement of each geometry object relative to the universe.
    geometry_placements: Vec<Isometry3<f64>>,
}

impl GeometryData {
    /// Returns the placement of the geometry object relative to the universe, if the
    /// buffers have an entry for it.
    pub fn geometry_placement(&self, index: usize) -> Option<&Isometry3<f64>> {
        self.geometry_placements.get(index)
    }

    /// Creates buffers sized for the given collection.
    pub fn new(geometry_model: &GeometryModel) -> Self {
        Self {
            geometry_placements: vec![Isometry3::identity(); geometry_model.ngeoms()],
        }
    }

    /// Returns the number of geometry objects the buffers were created for.
    pub fn ngeoms(&self) -> usize {
        self.geometry_placements.len()
    }
}

/// Computes the placement of every geometry object from the joint placements in the
/// model buffers.
///
/// The joint placements are taken from the last forward kinematics pass on 'data'.
///
/// ## Errors
///
/// * [Error::StaleData] - Returned when either set of buffers does not match its model.
/// * [Error::InvalidJointID] - Returned when an object is attached to a joint that is not
///   part of the model.
pub fn update_geometry_placements(
    model: &Model,
    data: &Data,
    geometry_model: &GeometryModel,
    geometry_data: &mut GeometryData,
) -> Result<(), Error> {
    check_data(model, data)?;
    if geometry_data.ngeoms() != geometry_model.ngeoms() {
        return Err(Error::StaleData {
            buffer: "geometry".to_string(),
            created_for: geometry_data.ngeoms(),
            current: geometry_model.ngeoms(),
        });
    }

    for (index, object) in geometry_model.geometry_objects().enumerate() {
        let joint_placement = data.joint_placement(object.parent_joint())?;
        geometry_data.geometry_placements[index] = joint_placement * object.placement();
    }

    Ok(())
}
