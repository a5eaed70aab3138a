//! Reads the semantic robot description (SRDF) that accompanies a URDF description.
//!
//! Only the parts that affect the kinematic model are read: the named postures stored in
//! `<group_state>` elements and the rotor parameters stored in `<rotor_params>`.

extern crate nalgebra as na;

use std::{fs, path::Path};

use na::DVector;
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    model_elements::{frame_elements::JointType, model::Model},
    urdf::parse_f64,
    Error,
};

#[cfg(test)]
#[path = "srdf_tests.rs"]
mod srdf_tests;

/// The `<robot>` element of an SRDF document.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SrdfRobot {
    /// The name of the robot.
    #[serde(rename = "@name", default)]
    pub name: String,

    /// The named postures.
    #[serde(rename = "group_state", default)]
    pub group_states: Vec<SrdfGroupState>,

    /// The rotor parameters of the actuated joints.
    #[serde(default)]
    pub rotor_params: Option<SrdfRotorParams>,
}

/// A `<group_state>` element, i.e. a named posture.
#[derive(Clone, Debug, Deserialize)]
pub struct SrdfGroupState {
    /// The name of the posture.
    #[serde(rename = "@name")]
    pub name: String,

    /// The group the posture applies to.
    #[serde(rename = "@group", default)]
    pub group: Option<String>,

    /// The joint values of the posture.
    #[serde(rename = "joint", default)]
    pub joints: Vec<SrdfJointValue>,
}

/// A `<joint>` element in a `<group_state>`.
#[derive(Clone, Debug, Deserialize)]
pub struct SrdfJointValue {
    /// The name of the joint.
    #[serde(rename = "@name")]
    pub name: String,

    /// The value of the joint as one or more numbers.
    #[serde(rename = "@value")]
    pub value: String,
}

/// A `<rotor_params>` element.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SrdfRotorParams {
    /// The rotor parameters per joint.
    #[serde(rename = "joint", default)]
    pub joints: Vec<SrdfRotorJoint>,
}

/// A `<joint>` element in `<rotor_params>`.
#[derive(Clone, Debug, Deserialize)]
pub struct SrdfRotorJoint {
    /// The name of the joint.
    #[serde(rename = "@name")]
    pub name: String,

    /// The rotor inertia.
    #[serde(rename = "@mass")]
    pub mass: String,

    /// The gear ratio between rotor and joint.
    #[serde(rename = "@gear_ratio")]
    pub gear_ratio: String,
}

/// Parses an SRDF document.
///
/// ## Errors
///
/// * [Error::XmlParse] - Returned when the document is not a valid SRDF document.
pub fn parse_srdf_str(xml: &str) -> Result<SrdfRobot, Error> {
    from_str(xml).map_err(|e| Error::XmlParse {
        message: e.to_string(),
    })
}

/// Reads and parses an SRDF file.
///
/// ## Errors
///
/// * [Error::Io] - Returned when the file cannot be read.
/// * [Error::XmlParse] - Returned when the file is not a valid SRDF document.
pub fn parse_srdf_file(path: &Path) -> Result<SrdfRobot, Error> {
    let content = fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parse_srdf_str(&content)
}

/// Stores every posture of the description as a reference configuration of the model.
///
/// Each posture starts from the neutral configuration. Joints of the posture overwrite their
/// coordinates. A single value for a joint without bounds is an angle and is stored as
/// (cos, sin).
///
/// ## Errors
///
/// * [Error::UnknownJoint] - Returned when a posture refers to a joint that is not in the model.
/// * [Error::InvalidAttribute] - Returned when a value cannot be read or doesn't fit the joint.
pub fn load_reference_configurations(model: &mut Model, srdf: &SrdfRobot) -> Result<(), Error> {
    for state in &srdf.group_states {
        let mut configuration = model.neutral();

        for joint_value in &state.joints {
            let joint = model.joint(model.get_joint_id(&joint_value.name)?)?;
            let values = joint_value
                .value
                .split_whitespace()
                .map(|v| parse_f64("value", v))
                .collect::<Result<Vec<f64>, Error>>()?;

            let coordinates = match (joint.joint_type(), values.as_slice()) {
                (JointType::RevoluteUnbounded { .. }, [angle]) => vec![angle.cos(), angle.sin()],
                (_, v) if v.len() == joint.nq() => v.to_vec(),
                _ => {
                    return Err(Error::InvalidAttribute {
                        attribute: "value".to_string(),
                        value: joint_value.value.clone(),
                        reason: format!(
                            "Joint {} needs {} values.",
                            joint_value.name,
                            joint.nq()
                        ),
                    })
                }
            };

            for (offset, c) in coordinates.into_iter().enumerate() {
                configuration[joint.idx_q() + offset] = c;
            }
        }

        debug!(posture = state.name.as_str(), "Read reference configuration");
        model.add_reference_configuration(state.name.clone(), configuration)?;
    }

    Ok(())
}

/// Sets the rotor inertia and gear ratio of the joints listed in the description.
///
/// ## Errors
///
/// * [Error::UnknownJoint] - Returned when a joint is not in the model.
/// * [Error::InvalidAttribute] - Returned when a value cannot be read.
pub fn load_rotor_parameters(model: &mut Model, srdf: &SrdfRobot) -> Result<(), Error> {
    let rotor_params = match &srdf.rotor_params {
        Some(r) => r,
        None => return Ok(()),
    };

    for rotor in &rotor_params.joints {
        let id = model.get_joint_id(&rotor.name)?;
        model.set_rotor_parameters(
            id,
            parse_f64("mass", &rotor.mass)?,
            parse_f64("gear_ratio", &rotor.gear_ratio)?,
        )?;
    }

    Ok(())
}

/// Reads the parameters from an SRDF file into the model and returns the requested posture.
///
/// ## Parameters
///
/// * 'model' - The model that receives the reference configurations and rotor parameters
/// * 'path' - The location of the SRDF file
/// * 'has_rotor_parameters' - Indicates if the rotor parameters should be read
/// * 'posture' - The name of the posture that should be returned
///
/// ## Errors
///
/// * [Error::MissingReferenceConfiguration] - Returned when the posture is not in the file.
/// * Any error returned by [parse_srdf_file()], [load_rotor_parameters()] or
///   [load_reference_configurations()].
pub fn read_params_from_srdf(
    model: &mut Model,
    path: &Path,
    has_rotor_parameters: bool,
    posture: &str,
) -> Result<DVector<f64>, Error> {
    let srdf = parse_srdf_file(path)?;

    if has_rotor_parameters {
        load_rotor_parameters(model, &srdf)?;
    }

    load_reference_configurations(model, &srdf)?;
    let configuration = model.reference_configuration(posture)?.clone();

    info!(
        path = %path.display(),
        posture,
        "Read parameters from SRDF"
    );
    Ok(configuration)
}
