//! Morphology tree model for neuron reconstructions.
//!
//! A reconstruction is a rooted tree of typed, spatially located points
//! (soma, axon, dendrites). This crate validates raw records into a
//! [`MorphologyTree`] and provides the geometry primitives feature code
//! works with.
//!
//! Zero I/O: reading reconstruction files is left to the caller.

pub mod constants;
pub mod error;
pub mod geometry;
pub mod node;
pub mod tree;

pub use constants::{EPSILON, MAX_COORDINATE, RELATIVE_SOMA_DEPTH, ROOT_PARENT};
pub use error::{MorphologyError, Result};
pub use geometry::{
    Axis, Point3, lateral_offset, lerp, sphere_exit_fraction, sphere_surface,
};
pub use node::{DENDRITE_TYPES, Node, NodeId, NodeType, RawNode, SpatialRecord};
pub use tree::{Ancestors, DepthFirst, MorphologyTree};
