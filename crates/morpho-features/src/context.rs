use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use morpho_core::{MorphologyTree, Node, RELATIVE_SOMA_DEPTH};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one analysis run; the memo-cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

/// Everything a feature function may read: the tree plus auxiliary values
/// precomputed upstream (e.g. `relative_soma_depth`).
///
/// Immutable once shared. Cloning keeps the identity, so a clone hits the
/// same cache entries as the original. An engine's cache for this identity
/// lives no longer than the last clone.
#[derive(Clone, Debug)]
pub struct FeatureContext {
    id: ContextId,
    alive: Arc<()>,
    tree: Arc<MorphologyTree>,
    aux: BTreeMap<String, f64>,
}

impl FeatureContext {
    pub fn new(tree: impl Into<Arc<MorphologyTree>>, aux: BTreeMap<String, f64>) -> Self {
        Self {
            id: ContextId::new(),
            alive: Arc::new(()),
            tree: tree.into(),
            aux,
        }
    }

    /// Add an auxiliary value. Consumes the context, so values can only be
    /// attached before it is handed out; the result gets a fresh identity.
    pub fn with_aux(mut self, name: &str, value: f64) -> Self {
        self.aux.insert(name.to_string(), value);
        self.id = ContextId::new();
        self.alive = Arc::new(());
        self
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Dead once every clone sharing this identity is dropped.
    pub(crate) fn liveness(&self) -> Weak<()> {
        Arc::downgrade(&self.alive)
    }

    pub fn tree(&self) -> &MorphologyTree {
        &self.tree
    }

    /// The soma, i.e. the tree root.
    pub fn soma(&self) -> &Node {
        self.tree.root()
    }

    pub fn aux(&self, name: &str) -> Option<f64> {
        self.aux.get(name).copied()
    }

    pub fn aux_values(&self) -> &BTreeMap<String, f64> {
        &self.aux
    }

    pub fn relative_soma_depth(&self) -> Option<f64> {
        self.aux(RELATIVE_SOMA_DEPTH)
    }
}
