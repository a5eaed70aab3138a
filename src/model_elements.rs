/// Defines the frames and joints that are used to create a robot model
pub mod frame_elements;

/// Defines the kinematic model of the robot.
pub mod model;

/// Defines the computation buffers for a model and the kinematics that fill them.
pub mod data;
