/// Defines the geometry objects and their shapes
pub mod geometry_elements;

/// Defines the collection of geometry objects of a model and its computation buffers.
pub mod geometry_model;
