//! Loads a robot from its description files.
//!
//! A [LoaderConfig] names the package that contains the description, the location of the URDF
//! file in that package and, optionally, the SRDF file that provides the default posture.
//! The [RobotLoader] finds the package through a [ModelPathResolver], builds the kinematic
//! model and its visual geometry and, when the robot has a mobile base, clamps the limits of
//! the root joint.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    model_elements::{
        frame_elements::{JointID, JointType},
        model::Model,
    },
    model_path::ModelPathResolver,
    robot::Robot,
    srdf::read_params_from_srdf,
    urdf::{build_geometry_model, build_model, parse_urdf_file},
    Error,
};

#[cfg(test)]
#[path = "loader_tests.rs"]
mod loader_tests;

/// The limit applied to every configuration coordinate of the root joint.
pub const ROOT_JOINT_LIMIT: f64 = 1.0;

/// Describes where the description of a robot is stored and how it should be loaded.
///
/// The default values describe the Tiago robot without a hand. Any field can be overridden
/// from a TOML document, fields that are left out keep their default value.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// The name of the package that contains the description.
    pub path: String,

    /// The file name of the URDF description.
    pub urdf_filename: String,

    /// The directory of the URDF description inside the package.
    pub urdf_subpath: String,

    /// The file name of the SRDF description. No SRDF file is read when `None`.
    pub srdf_filename: Option<String>,

    /// The directory of the SRDF description inside the package.
    pub srdf_subpath: String,

    /// The name of the SRDF posture that becomes the default configuration.
    pub ref_posture: String,

    /// Indicates if the rotor parameters should be read from the SRDF description.
    pub has_rotor_parameters: bool,

    /// Indicates if the robot is attached to the universe with a planar root joint.
    pub free_flyer: bool,

    /// Indicates if the chosen model directory should be reported at the info level.
    pub verbose: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            path: "tiago_description".to_string(),
            urdf_filename: "tiago_no_hand.urdf".to_string(),
            urdf_subpath: "robots".to_string(),
            srdf_filename: None,
            srdf_subpath: "srdf".to_string(),
            ref_posture: "half_sitting".to_string(),
            has_rotor_parameters: false,
            free_flyer: true,
            verbose: false,
        }
    }
}

impl LoaderConfig {
    /// Reads a configuration from a TOML file.
    ///
    /// ## Errors
    ///
    /// * [Error::Io] - Returned when the file cannot be read.
    /// * [Error::InvalidConfiguration] - Returned when the file is not a valid configuration.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_toml_str(&content)
    }

    /// Reads a configuration from a TOML document.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidConfiguration] - Returned when the document is not a valid configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    /// Returns the location of the URDF description relative to the model directory.
    pub fn urdf_relative_path(&self) -> PathBuf {
        Path::new(&self.path)
            .join(&self.urdf_subpath)
            .join(&self.urdf_filename)
    }
}

/// The result of loading a robot, together with the locations the robot was loaded from.
#[derive(Clone, Debug)]
pub struct LoadedRobot {
    robot: Robot,
    model_path: PathBuf,
    urdf_path: PathBuf,
    srdf_path: Option<PathBuf>,
}

impl LoadedRobot {
    /// Returns the loaded robot and drops the locations.
    pub fn into_robot(self) -> Robot {
        self.robot
    }

    /// Returns the model directory that contains the description package.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the loaded robot.
    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// Returns the location of the SRDF description, if one was read.
    pub fn srdf_path(&self) -> Option<&Path> {
        self.srdf_path.as_deref()
    }

    /// Returns the location of the URDF description.
    pub fn urdf_path(&self) -> &Path {
        &self.urdf_path
    }
}

/// Loads robots as described by a [LoaderConfig].
#[derive(Clone, Debug, Default)]
pub struct RobotLoader {
    config: LoaderConfig,
}

impl RobotLoader {
    /// Returns the configuration of the loader.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads the robot.
    ///
    /// The description is looked up as `<path>/<urdf_subpath>/<urdf_filename>` in the model
    /// directories of the resolver. Mesh files with a `package://` name are searched for in
    /// the model directory and in the directory two levels above it.
    ///
    /// ## Parameters
    ///
    /// * 'resolver' - Provides the model directories
    ///
    /// ## Errors
    ///
    /// * [Error::ModelPathNotFound] - Returned when the description is not in any model directory.
    /// * [Error::Io] - Returned when a description file cannot be read.
    /// * [Error::XmlParse] - Returned when a description file is not valid XML.
    /// * [Error::InvalidAttribute] - Returned when a value in a description cannot be read.
    /// * [Error::InvalidDescription] - Returned when the URDF links don't form a single tree.
    /// * [Error::MeshNotFound] - Returned when a mesh file cannot be found.
    /// * [Error::UnknownJoint] - Returned when the SRDF refers to a joint that is not in the model.
    /// * [Error::MissingReferenceConfiguration] - Returned when the SRDF doesn't have the
    ///   requested posture.
    pub fn load(&self, resolver: &ModelPathResolver) -> Result<LoadedRobot, Error> {
        let urdf_relative = self.config.urdf_relative_path();
        let resolver = if self.config.verbose {
            resolver.clone().with_verbose(true)
        } else {
            resolver.clone()
        };

        let model_path = resolver.find(&urdf_relative)?;
        let urdf_path = model_path.join(&urdf_relative);
        debug!(path = %urdf_path.display(), "Reading URDF description");

        let description = parse_urdf_file(&urdf_path)?;
        let root_joint = if self.config.free_flyer {
            Some(JointType::Planar)
        } else {
            None
        };
        let mut model = build_model(&description, root_joint)?;

        let package_dirs = vec![model_path.clone(), model_path.join("..").join("..")];
        let visual_model = build_geometry_model(
            &description,
            &model,
            &package_dirs,
            urdf_path.parent(),
        )?;

        let (srdf_path, q0) = match &self.config.srdf_filename {
            Some(srdf_filename) => {
                let srdf_path = model_path
                    .join(&self.config.path)
                    .join(&self.config.srdf_subpath)
                    .join(srdf_filename);
                let q0 = read_params_from_srdf(
                    &mut model,
                    &srdf_path,
                    self.config.has_rotor_parameters,
                    &self.config.ref_posture,
                )?;
                (Some(srdf_path), Some(q0))
            }
            None => (None, None),
        };

        if self.config.free_flyer {
            add_free_flyer_joint_limits(&mut model)?;
        }

        info!(
            robot = model.name(),
            nq = model.nq(),
            nv = model.nv(),
            ngeoms = visual_model.ngeoms(),
            "Loaded robot"
        );

        Ok(LoadedRobot {
            robot: Robot::new(model, visual_model, q0),
            model_path,
            urdf_path,
            srdf_path,
        })
    }

    /// Creates a new loader.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }
}

/// Limits every configuration coordinate of the root joint to [-1, 1].
///
/// The root joint is the first joint after the universe joint. For a planar root joint this
/// bounds both the position in the ground plane and the (cos, sin) pair.
///
/// ## Errors
///
/// * [Error::InvalidJointID] - Returned when the model only has the universe joint.
pub fn add_free_flyer_joint_limits(model: &mut Model) -> Result<(), Error> {
    model.set_joint_position_limits(JointID::new(1), -ROOT_JOINT_LIMIT, ROOT_JOINT_LIMIT)
}
