use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use morpho_core::{MorphologyTree, NodeType};

use crate::context::FeatureContext;
use crate::error::{FeatureError, Result};
use crate::value::FeatureValue;

/// Node-type precondition. Satisfied when the tree holds at least one node of
/// any of the listed types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mark {
    name: String,
    types: Vec<NodeType>,
}

impl Mark {
    pub fn of(node_type: NodeType) -> Self {
        let name = match node_type {
            NodeType::Custom(code) => format!("type_{code}"),
            named => named.as_str().to_string(),
        };
        Self {
            name,
            types: vec![node_type],
        }
    }

    pub fn any_of(name: &str, types: &[NodeType]) -> Self {
        Self {
            name: name.to_string(),
            types: types.to_vec(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[NodeType] {
        &self.types
    }

    pub fn is_satisfied(&self, tree: &MorphologyTree) -> bool {
        tree.count_of_type(&self.types) > 0
    }
}

/// Values of a feature's declared dependencies, as handed to its function.
/// Only computed values appear; a not-applicable dependency short-circuits
/// the dependent before its function is called.
#[derive(Debug, Default)]
pub struct Dependencies<'a> {
    values: BTreeMap<&'a str, &'a FeatureValue>,
}

impl<'a> Dependencies<'a> {
    pub(crate) fn insert(&mut self, name: &'a str, value: &'a FeatureValue) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&'a FeatureValue> {
        self.values.get(name).copied()
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FeatureValue::as_scalar)
    }

    pub fn pair(&self, name: &str) -> Option<(f64, f64)> {
        self.get(name).and_then(FeatureValue::as_pair)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A feature computation. Must be pure: same context and dependencies, same
/// answer. `None` means the specimen has nothing to measure.
pub type FeatureFn =
    Arc<dyn Fn(&FeatureContext, &Dependencies<'_>) -> Option<FeatureValue> + Send + Sync>;

/// Registry entry: name, marks, dependencies and the computation.
#[derive(Clone)]
pub struct FeatureDescriptor {
    name: String,
    marks: Vec<Mark>,
    dependencies: Vec<String>,
    compute: FeatureFn,
}

impl FeatureDescriptor {
    pub fn new<F>(name: &str, compute: F) -> Self
    where
        F: Fn(&FeatureContext, &Dependencies<'_>) -> Option<FeatureValue> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            marks: Vec::new(),
            dependencies: Vec::new(),
            compute: Arc::new(compute),
        }
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        if !self.marks.contains(&mark) {
            self.marks.push(mark);
        }
        self
    }

    pub fn depends_on(mut self, name: &str) -> Self {
        if !self.dependencies.iter().any(|d| d == name) {
            self.dependencies.push(name.to_string());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub(crate) fn compute(
        &self,
        ctx: &FeatureContext,
        deps: &Dependencies<'_>,
    ) -> Option<FeatureValue> {
        (self.compute)(ctx, deps)
    }
}

impl fmt::Debug for FeatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureDescriptor")
            .field("name", &self.name)
            .field("marks", &self.marks)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Resolved evaluation order for one request.
///
/// `order` is a topological order of the request's dependency closure with
/// ties broken by declaration order. `levels[i]` is the length of the
/// longest dependency chain below `order[i]`; features sharing a level never
/// depend on each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionPlan {
    order: Vec<String>,
    slots: Vec<usize>,
    levels: Vec<usize>,
}

impl ExecutionPlan {
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    /// Groups of mutually independent features, lowest level first. Each
    /// group keeps plan order.
    pub fn waves(&self) -> Vec<Vec<&str>> {
        self.slot_waves()
            .into_iter()
            .map(|wave| wave.into_iter().map(|(_, name)| name).collect())
            .collect()
    }

    pub(crate) fn slots(&self) -> &[usize] {
        &self.slots
    }

    pub(crate) fn slot_waves(&self) -> Vec<Vec<(usize, &str)>> {
        let depth = self.levels.iter().max().map_or(0, |m| m + 1);
        let mut waves = vec![Vec::new(); depth];
        for (i, &level) in self.levels.iter().enumerate() {
            waves[level].push((self.slots[i], self.order[i].as_str()));
        }
        waves
    }
}

/// Table of declared features, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct FeatureRegistry {
    descriptors: Vec<FeatureDescriptor>,
    index: HashMap<String, usize>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature. Dependencies may name features registered later; they
    /// are checked when a request is resolved.
    pub fn register(&mut self, descriptor: FeatureDescriptor) -> Result<()> {
        if self.index.contains_key(descriptor.name()) {
            return Err(FeatureError::DuplicateName(descriptor.name().to_string()));
        }
        self.index
            .insert(descriptor.name().to_string(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FeatureDescriptor> {
        self.index.get(name).map(|&slot| &self.descriptors[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Feature names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.descriptors.iter().map(|d| d.name())
    }

    pub(crate) fn descriptor(&self, slot: usize) -> &FeatureDescriptor {
        &self.descriptors[slot]
    }

    pub(crate) fn slot_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn lookup(&self, name: &str) -> Result<usize> {
        self.slot_of(name)
            .ok_or_else(|| FeatureError::UnknownFeature(name.to_string()))
    }

    /// Resolve `requested` and everything it depends on into an
    /// [`ExecutionPlan`].
    pub fn plan<S: AsRef<str>>(&self, requested: &[S]) -> Result<ExecutionPlan> {
        // Dependency closure
        let mut closure = BTreeSet::new();
        let mut stack = Vec::new();
        for name in requested {
            stack.push(self.lookup(name.as_ref())?);
        }
        while let Some(slot) = stack.pop() {
            if !closure.insert(slot) {
                continue;
            }
            for dep in self.descriptors[slot].dependencies() {
                stack.push(self.lookup(dep)?);
            }
        }

        // Kahn's algorithm; the ready set is ordered by declaration slot.
        let mut pending: HashMap<usize, usize> = HashMap::new();
        let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();
        for &slot in &closure {
            let deps = self.descriptors[slot].dependencies();
            pending.insert(slot, deps.len());
            for dep in deps {
                dependents.entry(self.lookup(dep)?).or_default().push(slot);
            }
        }

        let mut ready: BTreeSet<usize> = pending
            .iter()
            .filter(|&(_, &n)| n == 0)
            .map(|(&slot, _)| slot)
            .collect();
        let mut level: HashMap<usize, usize> = HashMap::new();
        let mut slots = Vec::with_capacity(closure.len());

        while let Some(slot) = ready.pop_first() {
            let own = self.descriptors[slot]
                .dependencies()
                .iter()
                .filter_map(|d| self.slot_of(d))
                .filter_map(|d| level.get(&d))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level.insert(slot, own);
            slots.push(slot);

            for &dependent in dependents.get(&slot).map_or(&[][..], Vec::as_slice) {
                if let Some(n) = pending.get_mut(&dependent) {
                    *n -= 1;
                    if *n == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if slots.len() < closure.len() {
            return Err(FeatureError::Cycle(self.cycle_members(&closure, &level)));
        }

        tracing::debug!(
            requested = requested.len(),
            resolved = slots.len(),
            "resolved feature plan"
        );

        Ok(ExecutionPlan {
            order: slots
                .iter()
                .map(|&s| self.descriptors[s].name().to_string())
                .collect(),
            levels: slots.iter().map(|s| level[s]).collect(),
            slots,
        })
    }

    /// Unordered features, minus those merely downstream of a cycle.
    fn cycle_members(&self, closure: &BTreeSet<usize>, ordered: &HashMap<usize, usize>) -> Vec<String> {
        let mut stuck: BTreeSet<usize> = closure
            .iter()
            .copied()
            .filter(|s| !ordered.contains_key(s))
            .collect();
        loop {
            let needed: BTreeSet<usize> = stuck
                .iter()
                .flat_map(|&s| self.descriptors[s].dependencies())
                .filter_map(|d| self.slot_of(d))
                .collect();
            let before = stuck.len();
            stuck.retain(|s| needed.contains(s));
            if stuck.len() == before {
                break;
            }
        }
        stuck
            .into_iter()
            .map(|s| self.descriptors[s].name().to_string())
            .collect()
    }
}
