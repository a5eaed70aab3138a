//! Reads robot descriptions in the URDF (Unified Robot Description Format) format.
//!
//! The description is first deserialized into the `Urdf*` types which closely mirror the XML
//! schema. [build_model()] then turns the links and joints into a [Model] and
//! [build_geometry_model()] turns the `<visual>` elements into a [GeometryModel].
//!
//! Fixed joints don't add degrees of freedom. They are merged into their parent joint and
//! only leave a [FrameType::FixedJoint] frame behind.

extern crate nalgebra as na;

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
};

use na::{Isometry3, Unit, Vector3, Vector4};
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    geometry::{
        geometry_elements::{GeometryObject, GeometryShape},
        geometry_model::GeometryModel,
    },
    model_elements::{
        frame_elements::{Frame, FrameID, FrameType, JointID, JointType},
        model::Model,
    },
    spatial::placement_from_xyz_rpy,
    Error,
};

#[cfg(test)]
#[path = "urdf_tests.rs"]
mod urdf_tests;

/// The name of the joint that connects the robot to the universe when a root joint is used.
pub const ROOT_JOINT_NAME: &str = "root_joint";

/// The prefix of mesh file names that are relative to a package directory.
const PACKAGE_PREFIX: &str = "package://";

/// The prefix of mesh file names that are absolute paths.
const FILE_PREFIX: &str = "file://";

/// The limit used for the (cos, sin) coordinates of joints without bounds.
const UNIT_CIRCLE_LIMIT: f64 = 1.01;

/// The `<robot>` element of a URDF document.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UrdfRobot {
    /// The name of the robot.
    #[serde(rename = "@name", default)]
    pub name: String,

    /// The links of the robot.
    #[serde(rename = "link", default)]
    pub links: Vec<UrdfLink>,

    /// The joints of the robot.
    #[serde(rename = "joint", default)]
    pub joints: Vec<UrdfJoint>,

    /// The named materials that can be referenced by the visual elements.
    #[serde(rename = "material", default)]
    pub materials: Vec<UrdfMaterial>,
}

/// A `<link>` element.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UrdfLink {
    /// The name of the link.
    #[serde(rename = "@name")]
    pub name: String,

    /// The visual elements of the link.
    #[serde(rename = "visual", default)]
    pub visuals: Vec<UrdfVisual>,
}

/// A `<visual>` element.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfVisual {
    /// The optional name of the visual element. Geometry objects are named after their link.
    #[serde(rename = "@name", default)]
    pub name: Option<String>,

    /// The placement of the geometry relative to the link.
    #[serde(default)]
    pub origin: Option<UrdfOrigin>,

    /// The shape of the visual element.
    pub geometry: UrdfGeometry,

    /// The material of the visual element.
    #[serde(default)]
    pub material: Option<UrdfMaterial>,
}

/// An `<origin>` element.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UrdfOrigin {
    /// The position as "x y z".
    #[serde(rename = "@xyz", default)]
    pub xyz: Option<String>,

    /// The orientation as "roll pitch yaw".
    #[serde(rename = "@rpy", default)]
    pub rpy: Option<String>,
}

impl UrdfOrigin {
    /// Returns the placement described by the origin.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidAttribute] - Returned when either attribute is not a list of three numbers.
    pub fn placement(&self) -> Result<Isometry3<f64>, Error> {
        let xyz = match &self.xyz {
            Some(v) => parse_vector3("xyz", v)?,
            None => Vector3::zeros(),
        };
        let rpy = match &self.rpy {
            Some(v) => parse_vector3("rpy", v)?,
            None => Vector3::zeros(),
        };

        Ok(placement_from_xyz_rpy(xyz, rpy))
    }
}

/// A `<geometry>` element. Exactly one of the shapes is expected to be present.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UrdfGeometry {
    /// A box shape.
    #[serde(rename = "box", default)]
    pub box_shape: Option<UrdfBox>,

    /// A cylinder shape.
    #[serde(default)]
    pub cylinder: Option<UrdfCylinder>,

    /// A sphere shape.
    #[serde(default)]
    pub sphere: Option<UrdfSphere>,

    /// A mesh shape.
    #[serde(default)]
    pub mesh: Option<UrdfMesh>,
}

/// A `<box>` element.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfBox {
    /// The size as "x y z".
    #[serde(rename = "@size")]
    pub size: String,
}

/// A `<cylinder>` element.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfCylinder {
    /// The radius of the cylinder.
    #[serde(rename = "@radius")]
    pub radius: String,

    /// The length of the cylinder.
    #[serde(rename = "@length")]
    pub length: String,
}

/// A `<sphere>` element.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfSphere {
    /// The radius of the sphere.
    #[serde(rename = "@radius")]
    pub radius: String,
}

/// A `<mesh>` element.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfMesh {
    /// The file name of the mesh, e.g. `package://tiago_description/meshes/base.stl`.
    #[serde(rename = "@filename")]
    pub filename: String,

    /// The scale as "x y z".
    #[serde(rename = "@scale", default)]
    pub scale: Option<String>,
}

/// A `<material>` element.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UrdfMaterial {
    /// The name of the material.
    #[serde(rename = "@name", default)]
    pub name: Option<String>,

    /// The color of the material.
    #[serde(default)]
    pub color: Option<UrdfColor>,
}

/// A `<color>` element.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfColor {
    /// The color as "r g b a".
    #[serde(rename = "@rgba")]
    pub rgba: String,
}

/// A `<joint>` element.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfJoint {
    /// The name of the joint.
    #[serde(rename = "@name")]
    pub name: String,

    /// The type of the joint, e.g. `revolute` or `fixed`.
    #[serde(rename = "@type")]
    pub joint_type: String,

    /// The parent link.
    pub parent: UrdfLinkRef,

    /// The child link.
    pub child: UrdfLinkRef,

    /// The placement of the joint relative to the parent link.
    #[serde(default)]
    pub origin: Option<UrdfOrigin>,

    /// The axis of the joint.
    #[serde(default)]
    pub axis: Option<UrdfAxis>,

    /// The limits of the joint.
    #[serde(default)]
    pub limit: Option<UrdfLimit>,
}

/// A reference to a link by name, used by `<parent>` and `<child>`.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfLinkRef {
    /// The name of the link.
    #[serde(rename = "@link")]
    pub link: String,
}

/// An `<axis>` element.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfAxis {
    /// The axis as "x y z".
    #[serde(rename = "@xyz")]
    pub xyz: String,
}

/// A `<limit>` element.
#[derive(Clone, Debug, Deserialize)]
pub struct UrdfLimit {
    /// The lower position limit.
    #[serde(rename = "@lower", default)]
    pub lower: Option<String>,

    /// The upper position limit.
    #[serde(rename = "@upper", default)]
    pub upper: Option<String>,
}

/// Parses a URDF document.
///
/// ## Errors
///
/// * [Error::XmlParse] - Returned when the document is not a valid URDF document.
pub fn parse_urdf_str(xml: &str) -> Result<UrdfRobot, Error> {
    from_str(xml).map_err(|e| Error::XmlParse {
        message: e.to_string(),
    })
}

/// Reads and parses a URDF file.
///
/// ## Errors
///
/// * [Error::Io] - Returned when the file cannot be read.
/// * [Error::XmlParse] - Returned when the file is not a valid URDF document.
pub fn parse_urdf_file(path: &Path) -> Result<UrdfRobot, Error> {
    let content = fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parse_urdf_str(&content)
}

/// Builds the kinematic model of the robot.
///
/// ## Parameters
///
/// * 'robot' - The parsed description
/// * 'root_joint' - The joint that connects the root link to the universe, e.g.
///   [JointType::Planar] for a mobile base. When `None` the root link is fixed to the universe.
///
/// ## Errors
///
/// * [Error::InvalidDescription] - Returned when the links don't form a single tree.
/// * [Error::InvalidAttribute] - Returned when a joint has an unknown type, or an origin, axis
///   or limit that cannot be read.
pub fn build_model(robot: &UrdfRobot, root_joint: Option<JointType>) -> Result<Model, Error> {
    let root_link = find_root_link(robot)?;
    let mut model = Model::new(robot.name.clone());

    let (root_joint_id, root_parent_frame) = match root_joint {
        Some(joint_type) => {
            let (lower, upper) = default_limits(joint_type);
            let id = model.add_joint(
                ROOT_JOINT_NAME.to_string(),
                joint_type,
                JointID::universe(),
                Isometry3::identity(),
                &lower,
                &upper,
            )?;
            let frame = model.add_frame(Frame::new(
                ROOT_JOINT_NAME.to_string(),
                id,
                FrameID::universe(),
                Isometry3::identity(),
                FrameType::Joint,
            ))?;
            (id, frame)
        }
        None => (JointID::universe(), FrameID::universe()),
    };

    let root_body = model.add_frame(Frame::new(
        root_link.to_string(),
        root_joint_id,
        root_parent_frame,
        Isometry3::identity(),
        FrameType::Body,
    ))?;

    let mut children_of: HashMap<&str, Vec<&UrdfJoint>> = HashMap::new();
    for joint in &robot.joints {
        children_of
            .entry(joint.parent.link.as_str())
            .or_default()
            .push(joint);
    }

    add_children(&mut model, &children_of, root_link, root_body)?;

    let unreached: Vec<&str> = robot
        .links
        .iter()
        .map(|l| l.name.as_str())
        .filter(|n| model.get_frame_id_of_type(n, FrameType::Body).is_err())
        .collect();
    if !unreached.is_empty() {
        return Err(Error::InvalidDescription {
            reason: format!("Links {:?} are not connected to the root link.", unreached),
        });
    }

    info!(
        robot = robot.name.as_str(),
        njoints = model.njoints(),
        nframes = model.nframes(),
        nq = model.nq(),
        nv = model.nv(),
        "Built model from URDF"
    );

    Ok(model)
}

fn add_children(
    model: &mut Model,
    children_of: &HashMap<&str, Vec<&UrdfJoint>>,
    link: &str,
    link_frame: FrameID,
) -> Result<(), Error> {
    let children = match children_of.get(link) {
        Some(c) => c,
        None => return Ok(()),
    };

    for joint in children {
        let parent_frame = model.frame(link_frame)?.clone();
        let origin = match &joint.origin {
            Some(o) => o.placement()?,
            None => Isometry3::identity(),
        };
        let placement = parent_frame.placement() * origin;

        let child_frame = match to_joint_type(joint)? {
            None => {
                let fixed = model.add_frame(Frame::new(
                    joint.name.clone(),
                    parent_frame.parent_joint(),
                    link_frame,
                    placement,
                    FrameType::FixedJoint,
                ))?;
                model.add_frame(Frame::new(
                    joint.child.link.clone(),
                    parent_frame.parent_joint(),
                    fixed,
                    placement,
                    FrameType::Body,
                ))?
            }
            Some(joint_type) => {
                let (lower, upper) = joint_limits(joint, joint_type)?;
                let joint_id = model.add_joint(
                    joint.name.clone(),
                    joint_type,
                    parent_frame.parent_joint(),
                    placement,
                    &lower,
                    &upper,
                )?;
                let joint_frame = model.add_frame(Frame::new(
                    joint.name.clone(),
                    joint_id,
                    link_frame,
                    Isometry3::identity(),
                    FrameType::Joint,
                ))?;
                model.add_frame(Frame::new(
                    joint.child.link.clone(),
                    joint_id,
                    joint_frame,
                    Isometry3::identity(),
                    FrameType::Body,
                ))?
            }
        };

        add_children(model, children_of, &joint.child.link, child_frame)?;
    }

    Ok(())
}

/// Returns the axis of the joint, defaulting to the X-axis when none is given.
fn joint_axis(joint: &UrdfJoint) -> Result<Unit<Vector3<f64>>, Error> {
    let axis = match &joint.axis {
        Some(a) => parse_vector3("axis", &a.xyz)?,
        None => Vector3::x(),
    };

    Unit::try_new(axis, 1e-10).ok_or_else(|| Error::InvalidAttribute {
        attribute: "axis".to_string(),
        value: format!("{} {} {}", axis.x, axis.y, axis.z),
        reason: format!("The axis of joint {} has zero length.", joint.name),
    })
}

fn joint_limits(joint: &UrdfJoint, joint_type: JointType) -> Result<(Vec<f64>, Vec<f64>), Error> {
    match joint_type {
        JointType::Revolute { .. } | JointType::Prismatic { .. } => {
            let mut lower = -f64::MAX;
            let mut upper = f64::MAX;
            if let Some(limit) = &joint.limit {
                if let Some(l) = &limit.lower {
                    lower = parse_f64("lower", l)?;
                }
                if let Some(u) = &limit.upper {
                    upper = parse_f64("upper", u)?;
                }
            }

            Ok((vec![lower], vec![upper]))
        }
        _ => Ok(default_limits(joint_type)),
    }
}

/// Returns the limits for joints that don't read their limits from the description.
fn default_limits(joint_type: JointType) -> (Vec<f64>, Vec<f64>) {
    let upper: Vec<f64> = match joint_type {
        JointType::Universe => vec![],
        JointType::Planar => vec![f64::MAX, f64::MAX, UNIT_CIRCLE_LIMIT, UNIT_CIRCLE_LIMIT],
        JointType::FreeFlyer => vec![
            f64::MAX,
            f64::MAX,
            f64::MAX,
            UNIT_CIRCLE_LIMIT,
            UNIT_CIRCLE_LIMIT,
            UNIT_CIRCLE_LIMIT,
            UNIT_CIRCLE_LIMIT,
        ],
        JointType::RevoluteUnbounded { .. } => vec![UNIT_CIRCLE_LIMIT, UNIT_CIRCLE_LIMIT],
        JointType::Revolute { .. } | JointType::Prismatic { .. } => vec![f64::MAX],
    };
    let lower = upper.iter().map(|u| -u).collect();

    (lower, upper)
}

/// Returns the joint type for the URDF joint, or `None` for a fixed joint.
fn to_joint_type(joint: &UrdfJoint) -> Result<Option<JointType>, Error> {
    let joint_type = match joint.joint_type.as_str() {
        "fixed" => None,
        "revolute" => Some(JointType::Revolute {
            axis: joint_axis(joint)?,
        }),
        "continuous" => Some(JointType::RevoluteUnbounded {
            axis: joint_axis(joint)?,
        }),
        "prismatic" => Some(JointType::Prismatic {
            axis: joint_axis(joint)?,
        }),
        "floating" => Some(JointType::FreeFlyer),
        "planar" => Some(JointType::Planar),
        other => {
            return Err(Error::InvalidAttribute {
                attribute: "type".to_string(),
                value: other.to_string(),
                reason: format!("Joint {} has an unknown type.", joint.name),
            })
        }
    };

    Ok(joint_type)
}

fn find_root_link(robot: &UrdfRobot) -> Result<&str, Error> {
    let links: BTreeSet<&str> = robot.links.iter().map(|l| l.name.as_str()).collect();

    let mut children = BTreeSet::new();
    for joint in &robot.joints {
        for link in [&joint.parent.link, &joint.child.link] {
            if !links.contains(link.as_str()) {
                return Err(Error::InvalidDescription {
                    reason: format!("Joint {} refers to the unknown link {}.", joint.name, link),
                });
            }
        }

        if !children.insert(joint.child.link.as_str()) {
            return Err(Error::InvalidDescription {
                reason: format!("Link {} has more than one parent.", joint.child.link),
            });
        }
    }

    let roots: Vec<&str> = robot
        .links
        .iter()
        .map(|l| l.name.as_str())
        .filter(|n| !children.contains(n))
        .collect();

    match roots.as_slice() {
        [root] => Ok(*root),
        [] => Err(Error::InvalidDescription {
            reason: "The description has no root link.".to_string(),
        }),
        _ => Err(Error::InvalidDescription {
            reason: format!("The description has more than one root link: {:?}", roots),
        }),
    }
}

/// Builds the visual geometry of the robot from the `<visual>` elements of the links.
///
/// ## Parameters
///
/// * 'robot' - The parsed description
/// * 'model' - The model built from the same description
/// * 'package_dirs' - The directories that are searched for `package://` mesh files
/// * 'description_dir' - The directory of the description, used for relative mesh files
///
/// ## Errors
///
/// * [Error::FrameNotFound] - Returned when a link has no body frame in the model.
/// * [Error::MeshNotFound] - Returned when a mesh file cannot be found.
/// * [Error::InvalidAttribute] - Returned when a shape or a color cannot be read.
pub fn build_geometry_model(
    robot: &UrdfRobot,
    model: &Model,
    package_dirs: &[PathBuf],
    description_dir: Option<&Path>,
) -> Result<GeometryModel, Error> {
    let named_colors: HashMap<&str, &UrdfColor> = robot
        .materials
        .iter()
        .filter_map(|m| match (&m.name, &m.color) {
            (Some(name), Some(color)) => Some((name.as_str(), color)),
            _ => None,
        })
        .collect();

    let mut geometry_model = GeometryModel::new();
    for link in &robot.links {
        if link.visuals.is_empty() {
            continue;
        }

        let frame_id = model.get_frame_id_of_type(&link.name, FrameType::Body)?;
        let frame = model.frame(frame_id)?;

        for (index, visual) in link.visuals.iter().enumerate() {
            let name = format!("{}_{}", link.name, index);
            let origin = match &visual.origin {
                Some(o) => o.placement()?,
                None => Isometry3::identity(),
            };
            let shape = to_shape(&visual.geometry, package_dirs, description_dir)?;

            let mut object = GeometryObject::new(
                name,
                frame_id,
                frame.parent_joint(),
                shape,
                frame.placement() * origin,
            );

            let color = visual.material.as_ref().and_then(|m| {
                m.color
                    .as_ref()
                    .or_else(|| m.name.as_deref().and_then(|n| named_colors.get(n).copied()))
            });
            if let Some(color) = color {
                object = object.with_mesh_color(parse_rgba(&color.rgba)?);
            }

            geometry_model.add_geometry_object(object)?;
        }
    }

    debug!(ngeoms = geometry_model.ngeoms(), "Built visual geometry from URDF");
    Ok(geometry_model)
}

fn to_shape(
    geometry: &UrdfGeometry,
    package_dirs: &[PathBuf],
    description_dir: Option<&Path>,
) -> Result<GeometryShape, Error> {
    if let Some(b) = &geometry.box_shape {
        return Ok(GeometryShape::Box {
            size: parse_vector3("size", &b.size)?,
        });
    }

    if let Some(c) = &geometry.cylinder {
        return Ok(GeometryShape::Cylinder {
            radius: parse_f64("radius", &c.radius)?,
            length: parse_f64("length", &c.length)?,
        });
    }

    if let Some(s) = &geometry.sphere {
        return Ok(GeometryShape::Sphere {
            radius: parse_f64("radius", &s.radius)?,
        });
    }

    if let Some(m) = &geometry.mesh {
        let scale = match &m.scale {
            Some(s) => parse_vector3("scale", s)?,
            None => Vector3::new(1.0, 1.0, 1.0),
        };

        return Ok(GeometryShape::Mesh {
            path: resolve_mesh_path(&m.filename, package_dirs, description_dir)?,
            scale,
        });
    }

    Err(Error::InvalidDescription {
        reason: "A geometry element has no box, cylinder, sphere or mesh.".to_string(),
    })
}

/// Returns the location of a mesh file.
///
/// `package://<package>/<path>` names are looked up as `<dir>/<package>/<path>` in each of the
/// package directories. Other names are taken as absolute paths or as paths relative to the
/// directory of the description.
///
/// ## Errors
///
/// * [Error::MeshNotFound] - Returned when the file does not exist.
pub fn resolve_mesh_path(
    filename: &str,
    package_dirs: &[PathBuf],
    description_dir: Option<&Path>,
) -> Result<PathBuf, Error> {
    let not_found = || Error::MeshNotFound {
        filename: filename.to_string(),
    };

    if let Some(relative) = filename.strip_prefix(PACKAGE_PREFIX) {
        return package_dirs
            .iter()
            .map(|d| d.join(relative))
            .find(|p| p.exists())
            .ok_or_else(not_found);
    }

    let path = PathBuf::from(filename.strip_prefix(FILE_PREFIX).unwrap_or(filename));
    let candidate = match description_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    };

    if candidate.exists() {
        Ok(candidate)
    } else {
        Err(not_found())
    }
}

/// Parses a single number.
pub(crate) fn parse_f64(attribute: &str, value: &str) -> Result<f64, Error> {
    value.trim().parse::<f64>().map_err(|e| Error::InvalidAttribute {
        attribute: attribute.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_numbers(attribute: &str, value: &str, count: usize) -> Result<Vec<f64>, Error> {
    let numbers = value
        .split_whitespace()
        .map(|v| parse_f64(attribute, v))
        .collect::<Result<Vec<f64>, Error>>()?;

    if numbers.len() != count {
        return Err(Error::InvalidAttribute {
            attribute: attribute.to_string(),
            value: value.to_string(),
            reason: format!("Expected {} numbers but found {}.", count, numbers.len()),
        });
    }

    Ok(numbers)
}

fn parse_rgba(value: &str) -> Result<Vector4<f64>, Error> {
    let n = parse_numbers("rgba", value, 4)?;
    Ok(Vector4::new(n[0], n[1], n[2], n[3]))
}

fn parse_vector3(attribute: &str, value: &str) -> Result<Vector3<f64>, Error> {
    let n = parse_numbers(attribute, value, 3)?;
    Ok(Vector3::new(n[0], n[1], n[2]))
}
