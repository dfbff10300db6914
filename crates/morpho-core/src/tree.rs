use std::collections::{BTreeMap, HashMap};

use crate::constants::{MAX_COORDINATE, ROOT_PARENT};
use crate::error::{MorphologyError, Result};
use crate::node::{Node, NodeId, NodeType, SpatialRecord};

/// Validated, immutable reconstruction tree.
///
/// Nodes live in an arena in record order; parent and child links are arena
/// slots, never references. Every invariant (single root, unique ids, no
/// dangling parents, no cycles) is checked once in [`MorphologyTree::build`],
/// so every read afterwards is infallible.
#[derive(Clone, Debug)]
pub struct MorphologyTree {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    root: usize,
    type_counts: BTreeMap<NodeType, usize>,
}

impl MorphologyTree {
    /// Build a tree from arbitrary records.
    ///
    /// `id_of` and `parent_of` project identity and parentage out of each
    /// record; `parent_of` must return `ROOT_PARENT` for the root.
    pub fn build<R, I, P>(records: &[R], id_of: I, parent_of: P) -> Result<Self>
    where
        R: SpatialRecord,
        I: Fn(&R) -> NodeId,
        P: Fn(&R) -> NodeId,
    {
        if records.is_empty() {
            return Err(MorphologyError::Empty);
        }

        let mut nodes = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for record in records {
            let id = id_of(record);
            if index.insert(id, nodes.len()).is_some() {
                return Err(MorphologyError::DuplicateId(id));
            }
            let radius = record.radius();
            if !radius.is_finite() || radius < 0.0 {
                return Err(MorphologyError::InvalidRadius { id, radius });
            }
            let position = record.position();
            if !position.is_finite() || position.max_abs() > MAX_COORDINATE {
                return Err(MorphologyError::InvalidPosition(id));
            }
            nodes.push(Node {
                id,
                parent_id: parent_of(record),
                node_type: record.node_type(),
                position,
                radius,
            });
        }

        let roots: Vec<usize> = (0..nodes.len())
            .filter(|&i| nodes[i].parent_id == ROOT_PARENT)
            .collect();
        let root = match roots.as_slice() {
            [] => return Err(MorphologyError::NoRoot),
            [only] => *only,
            many => {
                return Err(MorphologyError::MultipleRoots(
                    many.iter().map(|&i| nodes[i].id).collect(),
                ));
            }
        };

        let mut parents = vec![None; nodes.len()];
        let mut children = vec![Vec::new(); nodes.len()];
        for (slot, node) in nodes.iter().enumerate() {
            if slot == root {
                continue;
            }
            let parent = *index
                .get(&node.parent_id)
                .ok_or(MorphologyError::DanglingParent {
                    id: node.id,
                    parent_id: node.parent_id,
                })?;
            parents[slot] = Some(parent);
            children[parent].push(slot);
        }

        // Every non-root node has a parent, so anything the root cannot reach
        // sits on a parent cycle.
        let mut reached = vec![false; nodes.len()];
        let mut stack = vec![root];
        while let Some(slot) = stack.pop() {
            reached[slot] = true;
            stack.extend(children[slot].iter().copied());
        }
        let stranded: Vec<NodeId> = (0..nodes.len())
            .filter(|&i| !reached[i])
            .map(|i| nodes[i].id)
            .collect();
        if !stranded.is_empty() {
            return Err(MorphologyError::Cycle(stranded));
        }

        let mut type_counts = BTreeMap::new();
        for node in &nodes {
            *type_counts.entry(node.node_type).or_insert(0) += 1;
        }

        if nodes[root].node_type != NodeType::Soma {
            tracing::warn!(
                "root node {} has type {}, expected soma",
                nodes[root].id,
                nodes[root].node_type.as_str()
            );
        }
        tracing::debug!(
            nodes = nodes.len(),
            stems = children[root].len(),
            "built morphology tree"
        );

        Ok(Self {
            nodes,
            index,
            parents,
            children,
            root,
            type_counts,
        })
    }

    /// Build from records that already are [`Node`]s.
    pub fn from_nodes(nodes: &[Node]) -> Result<Self> {
        Self::build(nodes, |n| n.id, |n| n.parent_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a built tree; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The unique node whose parent is `ROOT_PARENT`; the soma by convention.
    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&slot| &self.nodes[slot])
    }

    /// Like [`node`](Self::node), but an unknown id is an error.
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(MorphologyError::UnknownNode(id))
    }

    /// All nodes in record order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn parent(&self, id: NodeId) -> Option<&Node> {
        let slot = *self.index.get(&id)?;
        self.parents[slot].map(|p| &self.nodes[p])
    }

    /// Direct children in record order. Empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        let slots: &[usize] = match self.index.get(&id) {
            Some(&slot) => &self.children[slot],
            None => &[],
        };
        slots.iter().map(move |&c| &self.nodes[c])
    }

    /// Preorder walk of the whole tree. Each call starts a fresh walk.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Preorder walk of the subtree under `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> DepthFirst<'_> {
        let stack = match self.index.get(&id) {
            Some(&slot) => self.children[slot].iter().rev().copied().collect(),
            None => Vec::new(),
        };
        DepthFirst { tree: self, stack }
    }

    /// Parent, grandparent, ... up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        let next = self.index.get(&id).and_then(|&slot| self.parents[slot]);
        Ancestors { tree: self, next }
    }

    /// Nodes whose type is in `types`, in preorder.
    pub fn nodes_of_type<'a>(
        &'a self,
        types: &'a [NodeType],
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.depth_first()
            .filter(move |n| types.contains(&n.node_type))
    }

    /// Number of nodes whose type is in `types`.
    pub fn count_of_type(&self, types: &[NodeType]) -> usize {
        types
            .iter()
            .map(|t| self.type_counts.get(t).copied().unwrap_or(0))
            .sum()
    }

    /// Direct children of the root: the first node of every branch family.
    pub fn stems(&self) -> impl Iterator<Item = &Node> + '_ {
        self.children[self.root].iter().map(move |&c| &self.nodes[c])
    }

    pub fn stems_of_type<'a>(
        &'a self,
        types: &'a [NodeType],
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.stems().filter(move |n| types.contains(&n.node_type))
    }
}

/// Lazy preorder traversal. Parents are always yielded before their children,
/// siblings in record order.
pub struct DepthFirst<'a> {
    tree: &'a MorphologyTree,
    stack: Vec<usize>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let slot = self.stack.pop()?;
        self.stack
            .extend(self.tree.children[slot].iter().rev().copied());
        Some(&self.tree.nodes[slot])
    }
}

/// Lazy walk towards the root.
pub struct Ancestors<'a> {
    tree: &'a MorphologyTree,
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let slot = self.next?;
        self.next = self.tree.parents[slot];
        Some(&self.tree.nodes[slot])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::RawNode;

    /// S -10-> A -10-> A, and S -3-> AD -3-> AD.
    fn basic_nodes() -> Vec<RawNode> {
        vec![
            RawNode::new(0, -1, NodeType::Soma, [0.0, 0.0, 100.0], 5.0),
            RawNode::new(1, 0, NodeType::Axon, [0.0, 0.0, 110.0], 1.0),
            RawNode::new(2, 1, NodeType::Axon, [0.0, 0.0, 120.0], 1.0),
            RawNode::new(3, 0, NodeType::ApicalDendrite, [0.0, 3.0, 100.0], 1.0),
            RawNode::new(4, 3, NodeType::ApicalDendrite, [0.0, 6.0, 100.0], 1.0),
        ]
    }

    fn build(records: &[RawNode]) -> Result<MorphologyTree> {
        MorphologyTree::build(records, |r| r.id, |r| r.parent_id)
    }

    fn ids<'a>(nodes: impl Iterator<Item = &'a Node>) -> Vec<NodeId> {
        nodes.map(|n| n.id).collect()
    }

    #[test]
    fn test_root_and_children() {
        let tree = build(&basic_nodes()).unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.root().id, 0);
        assert!(tree.root().is_root());
        assert_eq!(ids(tree.children(0)), vec![1, 3]);
        assert_eq!(ids(tree.children(1)), vec![2]);
        assert!(tree.children(4).next().is_none());
        assert!(tree.children(99).next().is_none());
    }

    #[test]
    fn test_depth_first_preorder() {
        let tree = build(&basic_nodes()).unwrap();
        assert_eq!(ids(tree.depth_first()), vec![0, 1, 2, 3, 4]);
        // restartable
        assert_eq!(ids(tree.depth_first()), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_preorder_independent_of_record_order() {
        let mut records = basic_nodes();
        records.reverse();
        let tree = build(&records).unwrap();
        // children keep record order, so the apical branch comes first now
        assert_eq!(ids(tree.depth_first()), vec![0, 3, 4, 1, 2]);
    }

    #[test]
    fn test_nodes_and_stems_of_type() {
        let tree = build(&basic_nodes()).unwrap();
        assert_eq!(ids(tree.nodes_of_type(&[NodeType::Axon])), vec![1, 2]);
        assert_eq!(
            ids(tree.nodes_of_type(&[NodeType::ApicalDendrite, NodeType::Soma])),
            vec![0, 3, 4]
        );
        assert_eq!(ids(tree.stems_of_type(&[NodeType::ApicalDendrite])), vec![3]);
        assert!(tree.stems_of_type(&[NodeType::BasalDendrite]).next().is_none());
        assert_eq!(ids(tree.stems()), vec![1, 3]);
    }

    #[test]
    fn test_count_of_type() {
        let tree = build(&basic_nodes()).unwrap();
        assert_eq!(tree.count_of_type(&[NodeType::Axon]), 2);
        assert_eq!(
            tree.count_of_type(&[NodeType::Axon, NodeType::ApicalDendrite]),
            4
        );
        assert_eq!(tree.count_of_type(&[NodeType::BasalDendrite]), 0);
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let tree = build(&basic_nodes()).unwrap();
        assert_eq!(ids(tree.ancestors(2)), vec![1, 0]);
        assert!(tree.ancestors(0).next().is_none());
        assert_eq!(ids(tree.descendants(0)), vec![1, 2, 3, 4]);
        assert_eq!(ids(tree.descendants(3)), vec![4]);
        assert_eq!(tree.parent(4).map(|n| n.id), Some(3));
        assert!(tree.parent(0).is_none());
    }

    #[test]
    fn test_custom_projections() {
        // ids offset by 100 through the projections only
        let tree = MorphologyTree::build(
            &basic_nodes(),
            |r| r.id + 100,
            |r| if r.parent_id == ROOT_PARENT { ROOT_PARENT } else { r.parent_id + 100 },
        )
        .unwrap();
        assert_eq!(tree.root().id, 100);
        assert_eq!(ids(tree.children(100)), vec![101, 103]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(build(&[]).unwrap_err(), MorphologyError::Empty);
    }

    #[test]
    fn test_duplicate_id() {
        let mut records = basic_nodes();
        records[4].id = 2;
        assert_eq!(build(&records).unwrap_err(), MorphologyError::DuplicateId(2));
    }

    #[test]
    fn test_dangling_parent() {
        let mut records = basic_nodes();
        records[2].parent_id = 42;
        assert_eq!(
            build(&records).unwrap_err(),
            MorphologyError::DanglingParent {
                id: 2,
                parent_id: 42
            }
        );
    }

    #[test]
    fn test_multiple_roots() {
        let mut records = basic_nodes();
        records[3].parent_id = ROOT_PARENT;
        assert_eq!(
            build(&records).unwrap_err(),
            MorphologyError::MultipleRoots(vec![0, 3])
        );
    }

    #[test]
    fn test_no_root() {
        let mut records = basic_nodes();
        records[0].parent_id = 4;
        assert_eq!(build(&records).unwrap_err(), MorphologyError::NoRoot);
    }

    #[test]
    fn test_cycle() {
        let mut records = basic_nodes();
        // 3 -> 4 -> 3
        records[3].parent_id = 4;
        assert_eq!(
            build(&records).unwrap_err(),
            MorphologyError::Cycle(vec![3, 4])
        );
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let mut records = basic_nodes();
        records[2].parent_id = 2;
        assert_eq!(build(&records).unwrap_err(), MorphologyError::Cycle(vec![2]));
    }

    #[test]
    fn test_invalid_radius() {
        let mut records = basic_nodes();
        records[1].radius = -1.0;
        assert!(matches!(
            build(&records).unwrap_err(),
            MorphologyError::InvalidRadius { id: 1, .. }
        ));
        records[1].radius = f64::NAN;
        assert!(matches!(
            build(&records).unwrap_err(),
            MorphologyError::InvalidRadius { id: 1, .. }
        ));
    }

    #[test]
    fn test_invalid_position() {
        let mut records = basic_nodes();
        records[4].y = f64::INFINITY;
        assert_eq!(
            build(&records).unwrap_err(),
            MorphologyError::InvalidPosition(4)
        );
    }

    #[test]
    fn test_extreme_position_rejected() {
        let mut records = basic_nodes();
        records[1].z = 1e308;
        assert_eq!(
            build(&records).unwrap_err(),
            MorphologyError::InvalidPosition(1)
        );
        records[1].z = MAX_COORDINATE;
        assert!(build(&records).is_ok());
    }

    #[test]
    fn test_non_soma_root_accepted() {
        let mut records = basic_nodes();
        records[0].node_type = NodeType::Custom(7);
        let tree = build(&records).unwrap();
        assert_eq!(tree.root().node_type, NodeType::Custom(7));
    }

    #[test]
    fn test_get_unknown() {
        let tree = build(&basic_nodes()).unwrap();
        assert_eq!(tree.get(9).unwrap_err(), MorphologyError::UnknownNode(9));
        assert_eq!(tree.get(2).unwrap().node_type, NodeType::Axon);
    }
}
