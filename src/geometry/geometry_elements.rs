//! Defines the geometry objects that can be attached to the frames of a model.

extern crate nalgebra as na;

use std::path::PathBuf;

use na::{Isometry3, Vector3, Vector4};

use crate::model_elements::frame_elements::{FrameID, JointID};

/// The color used for geometry objects that don't specify one.
pub const DEFAULT_MESH_COLOR: [f64; 4] = [0.9, 0.9, 0.9, 1.0];

/// Returns the opaque red color.
pub fn red() -> Vector4<f64> {
    Vector4::new(1.0, 0.0, 0.0, 1.0)
}

/// Returns the opaque green color.
pub fn green() -> Vector4<f64> {
    Vector4::new(0.0, 1.0, 0.0, 1.0)
}

/// Returns the opaque blue color.
pub fn blue() -> Vector4<f64> {
    Vector4::new(0.0, 0.0, 1.0, 1.0)
}

/// Defines the shape of a geometry object. All dimensions are in meters.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryShape {
    /// A box centered on the origin.
    Box {
        /// The length of the box along the X, Y and Z axes.
        size: Vector3<f64>,
    },
    /// A cylinder centered on the origin with its axis along the local Z-axis.
    Cylinder {
        /// The radius of the cylinder.
        radius: f64,
        /// The length of the cylinder along its axis.
        length: f64,
    },
    /// A sphere centered on the origin.
    Sphere {
        /// The radius of the sphere.
        radius: f64,
    },
    /// A mesh stored in a file.
    Mesh {
        /// The resolved location of the mesh file.
        path: PathBuf,
        /// The scale factor along the X, Y and Z axes.
        scale: Vector3<f64>,
    },
}

/// Defines a geometric primitive attached to a frame of a model.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryObject {
    /// The human readable name of the object.
    name: String,

    /// The frame the object belongs to.
    parent_frame: FrameID,

    /// The joint the object moves with.
    parent_joint: JointID,

    /// The shape of the object.
    shape: GeometryShape,

    /// The placement of the object relative to the parent joint.
    placement: Isometry3<f64>,

    /// The color of the object as RGBA.
    mesh_color: Vector4<f64>,
}

impl GeometryObject {
    /// Returns the color of the object as RGBA.
    pub fn mesh_color(&self) -> &Vector4<f64> {
        &self.mesh_color
    }

    /// Returns the name of the object.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Creates a new GeometryObject with the default color.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the object
    /// * 'parent_frame' - The frame the object belongs to
    /// * 'parent_joint' - The joint the object moves with
    /// * 'shape' - The shape of the object
    /// * 'placement' - The placement of the object relative to the parent joint
    pub fn new(
        name: String,
        parent_frame: FrameID,
        parent_joint: JointID,
        shape: GeometryShape,
        placement: Isometry3<f64>,
    ) -> Self {
        Self {
            name,
            parent_frame,
            parent_joint,
            shape,
            placement,
            mesh_color: Vector4::from(DEFAULT_MESH_COLOR),
        }
    }

    /// Returns the frame the object belongs to.
    pub fn parent_frame(&self) -> FrameID {
        self.parent_frame
    }

    /// Returns the joint the object moves with.
    pub fn parent_joint(&self) -> JointID {
        self.parent_joint
    }

    /// Returns the placement of the object relative to the parent joint.
    pub fn placement(&self) -> &Isometry3<f64> {
        &self.placement
    }

    /// Returns the shape of the object.
    pub fn shape(&self) -> &GeometryShape {
        &self.shape
    }

    /// Returns the object with the given color.
    pub fn with_mesh_color(mut self, mesh_color: Vector4<f64>) -> Self {
        self.mesh_color = mesh_color;
        self
    }
}
