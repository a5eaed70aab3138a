#![warn(missing_docs)]

//! Kinematic model loader for the Tiago mobile manipulator.
//!
//! Loads the Tiago description with a planar root joint so that the mobile base can move
//! in the ground plane, clamps the limits of that root joint and decorates the model with
//! axis markers for debugging and visualization.

use std::path::PathBuf;

use thiserror::Error;

use model_elements::frame_elements::{FrameID, JointID};

/// Defines the frames, joints and kinematic model of a robot.
pub mod model_elements;

/// Defines the visual geometry that is attached to the frames of a model.
pub mod geometry;

/// Provides helper functions for rotations and placements.
pub mod spatial;

/// Provides the lookup of robot description files in the model directories.
pub mod model_path;

/// Reads robot descriptions in the URDF format.
pub mod urdf;

/// Reads the semantic robot descriptions (SRDF) that provide postures and rotor parameters.
pub mod srdf;

/// Bundles a model, its geometry and the computation buffers for both.
pub mod robot;

/// Loads a robot from its description files.
pub mod loader;

/// Adds axis markers to the Tiago model.
pub mod markers;

/// Defines the different errors for the Tiago descriptors crate.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Returned when a configuration vector does not have the size the model expects.
    #[error("The configuration has {actual} entries but the model expects {expected}.")]
    ConfigurationSize {
        /// The number of entries the model expects.
        expected: usize,
        /// The number of entries that were provided.
        actual: usize,
    },

    /// Returned when a frame with the given name already exists in the model.
    #[error("A frame with the name {name} already exists.")]
    FrameAlreadyExists {
        /// The name of the frame.
        name: String,
    },

    /// Returned when there is no frame with the given name.
    #[error("There is no frame with the name {name}.")]
    FrameNotFound {
        /// The name of the frame.
        name: String,
    },

    /// Returned when a geometry object with the given name already exists.
    #[error("A geometry object with the name {name} already exists.")]
    GeometryAlreadyExists {
        /// The name of the geometry object.
        name: String,
    },

    /// Returned when an attribute in a description file cannot be interpreted.
    #[error("The attribute {attribute} with value '{value}' is not valid: {reason}")]
    InvalidAttribute {
        /// The name of the attribute.
        attribute: String,
        /// The value of the attribute.
        value: String,
        /// The reason the value was rejected.
        reason: String,
    },

    /// Returned when a loader configuration cannot be read.
    #[error("The loader configuration is not valid: {message}")]
    InvalidConfiguration {
        /// The message of the underlying parser error.
        message: String,
    },

    /// Returned when the structure of a robot description is not valid.
    #[error("The robot description is not valid: {reason}")]
    InvalidDescription {
        /// The reason the description was rejected.
        reason: String,
    },

    /// Returned when the frame ID does not point to a frame in the model.
    #[error("The frame ID {id} is not valid.")]
    InvalidFrameID {
        /// The invalid ID.
        id: FrameID,
    },

    /// Returned when the joint ID does not point to a joint in the model.
    #[error("The joint ID {id} is not valid.")]
    InvalidJointID {
        /// The invalid ID.
        id: JointID,
    },

    /// Returned when reading a file fails.
    #[error("Failed to read {path}: {message}")]
    Io {
        /// The path of the file.
        path: PathBuf,
        /// The message of the underlying IO error.
        message: String,
    },

    /// Returned when a mesh referenced by a description cannot be found.
    #[error("The mesh {filename} could not be found in any of the package directories.")]
    MeshNotFound {
        /// The file name as written in the description.
        filename: String,
    },

    /// Returned when a named reference configuration is not stored in the model.
    #[error("There is no reference configuration with the name {name}.")]
    MissingReferenceConfiguration {
        /// The name of the reference configuration.
        name: String,
    },

    /// Returned when a description file cannot be found in any of the model directories.
    #[error("{subpath} was not found in any of the model directories: {searched:?}")]
    ModelPathNotFound {
        /// The relative path that was looked up.
        subpath: PathBuf,
        /// The directories that were searched.
        searched: Vec<PathBuf>,
    },

    /// Returned when computation buffers do not match the structure of the model
    /// they are used with.
    #[error("The {buffer} buffers were created for {created_for} elements but the model has {current} elements.")]
    StaleData {
        /// The kind of buffer that is stale.
        buffer: String,
        /// The number of elements the buffers were created for.
        created_for: usize,
        /// The number of elements in the current model.
        current: usize,
    },

    /// Returned when a description refers to a joint that does not exist in the model.
    #[error("There is no joint with the name {name}.")]
    UnknownJoint {
        /// The name of the joint.
        name: String,
    },

    /// Returned when an XML document cannot be parsed.
    #[error("Failed to parse the XML document: {message}")]
    XmlParse {
        /// The message of the underlying parser error.
        message: String,
    },
}
