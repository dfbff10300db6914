use std::fmt;

use crate::node::NodeId;

/// Structural defects that make a record list unusable as a morphology.
#[derive(Debug, Clone, PartialEq)]
pub enum MorphologyError {
    Empty,
    DuplicateId(NodeId),
    DanglingParent { id: NodeId, parent_id: NodeId },
    NoRoot,
    MultipleRoots(Vec<NodeId>),
    /// Nodes that never reach the root by following parent links.
    Cycle(Vec<NodeId>),
    InvalidRadius { id: NodeId, radius: f64 },
    InvalidPosition(NodeId),
    UnknownNode(NodeId),
}

impl fmt::Display for MorphologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MorphologyError::Empty => write!(f, "morphology has no nodes"),
            MorphologyError::DuplicateId(id) => write!(f, "duplicate node id {id}"),
            MorphologyError::DanglingParent { id, parent_id } => {
                write!(f, "node {id} references missing parent {parent_id}")
            }
            MorphologyError::NoRoot => write!(f, "morphology has no root node"),
            MorphologyError::MultipleRoots(ids) => {
                write!(f, "morphology has {} root nodes: {ids:?}", ids.len())
            }
            MorphologyError::Cycle(ids) => {
                write!(f, "cycle detected: nodes {ids:?} do not reach the root")
            }
            MorphologyError::InvalidRadius { id, radius } => {
                write!(f, "node {id} has invalid radius {radius}")
            }
            MorphologyError::InvalidPosition(id) => {
                write!(f, "node {id} has a non-finite or out-of-range position")
            }
            MorphologyError::UnknownNode(id) => write!(f, "no node with id {id}"),
        }
    }
}

impl std::error::Error for MorphologyError {}

pub type Result<T> = std::result::Result<T, MorphologyError>;
