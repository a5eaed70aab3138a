//! Looks up robot description files in a list of model directories.
//!
//! Robot descriptions are distributed as packages, e.g. `tiago_description`, that live in one
//! of several model directories. The [ModelPathResolver] searches these directories in order
//! and returns the first one that contains the requested file.

use std::{
    env,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::Error;

#[cfg(test)]
#[path = "model_path_tests.rs"]
mod model_path_tests;

/// The environment variable that points to the directory with the example robot models.
pub const MODEL_DIR_VARIABLE: &str = "EXAMPLE_ROBOT_DATA_MODEL_DIR";

/// The environment variable with the ROS package directories.
pub const ROS_PACKAGE_PATH_VARIABLE: &str = "ROS_PACKAGE_PATH";

/// Searches a list of directories for robot description files.
#[derive(Clone, Debug, Default)]
pub struct ModelPathResolver {
    /// The directories to search, in order of preference.
    directories: Vec<PathBuf>,

    /// Indicates if the chosen directory should be reported at the info level.
    verbose: bool,
}

impl ModelPathResolver {
    /// Returns the directories that are searched, in order of preference.
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Returns the first directory `d` for which `d/subpath` exists.
    ///
    /// ## Parameters
    ///
    /// * 'subpath' - The path of the file relative to the model directory, e.g.
    ///   `tiago_description/robots/tiago_no_hand.urdf`
    ///
    /// ## Errors
    ///
    /// * [Error::ModelPathNotFound] - Returned when none of the directories contains the file.
    pub fn find(&self, subpath: &Path) -> Result<PathBuf, Error> {
        let relative = subpath.strip_prefix("/").unwrap_or(subpath);

        for directory in &self.directories {
            debug!(directory = %directory.display(), "Searching for model");
            if directory.join(relative).exists() {
                if self.verbose {
                    info!(directory = %directory.display(), "Using model path");
                } else {
                    debug!(directory = %directory.display(), "Using model path");
                }

                return Ok(directory.clone());
            }
        }

        Err(Error::ModelPathNotFound {
            subpath: relative.to_path_buf(),
            searched: self.directories.clone(),
        })
    }

    /// Creates a resolver from the [MODEL_DIR_VARIABLE] and [ROS_PACKAGE_PATH_VARIABLE]
    /// environment variables. Directories from the former are searched first.
    #[cfg_attr(test, mutants::skip)] // The result depends on the environment of the test process
    pub fn from_environment() -> Self {
        let mut resolver = Self::new();

        for variable in [MODEL_DIR_VARIABLE, ROS_PACKAGE_PATH_VARIABLE] {
            if let Some(value) = env::var_os(variable) {
                for directory in env::split_paths(&value) {
                    if !directory.as_os_str().is_empty() {
                        resolver.directories.push(directory);
                    }
                }
            }
        }

        resolver
    }

    /// Creates a resolver without any directories.
    pub fn new() -> Self {
        Self {
            directories: vec![],
            verbose: false,
        }
    }

    /// Returns the resolver with the given directory appended to the search list.
    pub fn with_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.directories.push(directory.into());
        self
    }

    /// Returns the resolver with the reporting level for the chosen directory set.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
