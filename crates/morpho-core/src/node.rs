use serde::{Deserialize, Serialize};

use crate::constants::ROOT_PARENT;
use crate::geometry::Point3;

/// Record identifier, unique within one morphology.
pub type NodeId = i64;

/// Compartment classification using the standard reconstruction type codes.
///
/// The taxonomy is open: codes without a named variant survive as `Custom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum NodeType {
    Soma,
    Axon,
    BasalDendrite,
    ApicalDendrite,
    Custom(u16),
}

impl NodeType {
    pub fn code(self) -> u16 {
        match self {
            Self::Soma => 1,
            Self::Axon => 2,
            Self::BasalDendrite => 3,
            Self::ApicalDendrite => 4,
            Self::Custom(code) => code,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soma => "soma",
            Self::Axon => "axon",
            Self::BasalDendrite => "basal_dendrite",
            Self::ApicalDendrite => "apical_dendrite",
            Self::Custom(_) => "custom",
        }
    }
}

impl From<u16> for NodeType {
    fn from(code: u16) -> Self {
        match code {
            1 => Self::Soma,
            2 => Self::Axon,
            3 => Self::BasalDendrite,
            4 => Self::ApicalDendrite,
            other => Self::Custom(other),
        }
    }
}

impl From<NodeType> for u16 {
    fn from(t: NodeType) -> Self {
        t.code()
    }
}

/// Both dendrite kinds.
pub const DENDRITE_TYPES: [NodeType; 2] = [NodeType::BasalDendrite, NodeType::ApicalDendrite];

/// The spatial payload a record must expose. Identity and parentage come from
/// caller-supplied projections instead, so the record shape stays free.
pub trait SpatialRecord {
    fn node_type(&self) -> NodeType;
    fn position(&self) -> Point3;
    fn radius(&self) -> f64;
}

/// One validated reconstruction point, as seen through the tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// `ROOT_PARENT` for the root.
    pub parent_id: NodeId,
    pub node_type: NodeType,
    pub position: Point3,
    pub radius: f64,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT
    }
}

impl SpatialRecord for Node {
    fn node_type(&self) -> NodeType {
        self.node_type
    }

    fn position(&self) -> Point3 {
        self.position
    }

    fn radius(&self) -> f64 {
        self.radius
    }
}

/// Flat record shape as produced by reconstruction readers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: NodeId,
    pub parent_id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
}

impl RawNode {
    pub fn new(
        id: NodeId,
        parent_id: NodeId,
        node_type: NodeType,
        position: [f64; 3],
        radius: f64,
    ) -> Self {
        Self {
            id,
            parent_id,
            node_type,
            x: position[0],
            y: position[1],
            z: position[2],
            radius,
        }
    }
}

impl SpatialRecord for RawNode {
    fn node_type(&self) -> NodeType {
        self.node_type
    }

    fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    fn radius(&self) -> f64 {
        self.radius
    }
}
