use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use rayon::prelude::*;

use crate::config::FeatureConfig;
use crate::context::{ContextId, FeatureContext};
use crate::error::{FeatureError, Result};
use crate::registry::{Dependencies, ExecutionPlan, FeatureDescriptor, FeatureRegistry};
use crate::value::{FeatureResult, NotApplicable};

/// Per-context memo table. Each slot is initialized at most once, even under
/// concurrent requests for the same feature.
#[derive(Debug)]
pub struct FeatureCache {
    context: ContextId,
    slots: DashMap<String, Arc<OnceLock<FeatureResult>>>,
}

impl FeatureCache {
    /// An empty cache bound to `ctx`.
    pub fn for_context(ctx: &FeatureContext) -> Self {
        Self {
            context: ctx.id(),
            slots: DashMap::new(),
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn get(&self, name: &str) -> Option<FeatureResult> {
        self.slots
            .get(name)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// Number of features with a settled result.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_or_compute(
        &self,
        name: &str,
        compute: impl FnOnce() -> FeatureResult,
    ) -> FeatureResult {
        // Clone the slot out so the map shard is unlocked while computing.
        let slot = Arc::clone(self.slots.entry(name.to_string()).or_default().value());
        slot.get_or_init(compute).clone()
    }
}

struct CacheEntry {
    owner: Weak<()>,
    cache: Arc<FeatureCache>,
}

/// Registry plus memoized, dependency-ordered execution.
///
/// Caches are scoped to this engine and keyed by context identity. An entry
/// is released once every clone of its context is dropped, or earlier via
/// [`forget`](Self::forget) or [`clear_cache`](Self::clear_cache).
pub struct FeatureEngine {
    registry: FeatureRegistry,
    config: FeatureConfig,
    caches: DashMap<ContextId, CacheEntry>,
}

impl FeatureEngine {
    pub fn new(config: FeatureConfig) -> Self {
        Self::with_registry(FeatureRegistry::new(), config)
    }

    pub fn with_registry(registry: FeatureRegistry, config: FeatureConfig) -> Self {
        Self {
            registry,
            config,
            caches: DashMap::new(),
        }
    }

    /// Engine preloaded with every built-in feature.
    pub fn with_default_features(config: FeatureConfig) -> Result<Self> {
        let registry = crate::catalog::default_registry(&config)?;
        Ok(Self::with_registry(registry, config))
    }

    pub fn register(&mut self, descriptor: FeatureDescriptor) -> Result<()> {
        self.registry.register(descriptor)
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn plan<S: AsRef<str>>(&self, requested: &[S]) -> Result<ExecutionPlan> {
        self.registry.plan(requested)
    }

    /// Evaluate `requested` and their dependencies against `ctx`.
    ///
    /// The returned map holds every feature of the resolved plan. Results are
    /// memoized per context, so repeated calls never recompute.
    pub fn run<S: AsRef<str>>(
        &self,
        ctx: &FeatureContext,
        requested: &[S],
    ) -> Result<BTreeMap<String, FeatureResult>> {
        let cache = self.cache_for(ctx);
        self.run_with_cache(ctx, &cache, requested)
    }

    /// Like [`run`](Self::run), with a caller-owned cache. Fails with
    /// [`FeatureError::ContextMismatch`] if `cache` was built for another
    /// context.
    pub fn run_with_cache<S: AsRef<str>>(
        &self,
        ctx: &FeatureContext,
        cache: &FeatureCache,
        requested: &[S],
    ) -> Result<BTreeMap<String, FeatureResult>> {
        if cache.context() != ctx.id() {
            return Err(FeatureError::ContextMismatch {
                cache: cache.context(),
                context: ctx.id(),
            });
        }
        let plan = self.registry.plan(requested)?;
        let mut done: HashMap<usize, FeatureResult> = HashMap::with_capacity(plan.len());

        if self.config.parallel {
            for wave in plan.slot_waves() {
                let settled: Vec<(usize, FeatureResult)> = wave
                    .par_iter()
                    .map(|&(slot, _)| (slot, self.evaluate(slot, ctx, cache, &done)))
                    .collect();
                done.extend(settled);
            }
        } else {
            for &slot in plan.slots() {
                let result = self.evaluate(slot, ctx, cache, &done);
                done.insert(slot, result);
            }
        }

        Ok(done
            .into_iter()
            .map(|(slot, result)| (self.registry.descriptor(slot).name().to_string(), result))
            .collect())
    }

    /// The cache for `ctx`, created on first use. Entries of dropped contexts
    /// are evicted here.
    pub fn cache_for(&self, ctx: &FeatureContext) -> Arc<FeatureCache> {
        self.caches.retain(|_, entry| entry.owner.strong_count() > 0);
        let entry = self.caches.entry(ctx.id()).or_insert_with(|| CacheEntry {
            owner: ctx.liveness(),
            cache: Arc::new(FeatureCache::for_context(ctx)),
        });
        Arc::clone(&entry.value().cache)
    }

    /// Number of contexts currently holding an engine-owned cache.
    pub fn cached_contexts(&self) -> usize {
        self.caches.len()
    }

    /// Drop the cache for `ctx`. Returns whether one existed.
    pub fn forget(&self, ctx: &FeatureContext) -> bool {
        self.caches.remove(&ctx.id()).is_some()
    }

    pub fn clear_cache(&self) {
        self.caches.clear();
    }

    fn evaluate(
        &self,
        slot: usize,
        ctx: &FeatureContext,
        cache: &FeatureCache,
        done: &HashMap<usize, FeatureResult>,
    ) -> FeatureResult {
        let descriptor = self.registry.descriptor(slot);
        cache.get_or_compute(descriptor.name(), || {
            let result = self.compute(descriptor, ctx, done);
            if let FeatureResult::NotApplicable(reason) = &result {
                tracing::debug!(feature = descriptor.name(), "not applicable: {reason}");
            }
            result
        })
    }

    fn compute(
        &self,
        descriptor: &FeatureDescriptor,
        ctx: &FeatureContext,
        done: &HashMap<usize, FeatureResult>,
    ) -> FeatureResult {
        if let Some(mark) = descriptor
            .marks()
            .iter()
            .find(|m| !m.is_satisfied(ctx.tree()))
        {
            return FeatureResult::NotApplicable(NotApplicable::MissingMark(
                mark.name().to_string(),
            ));
        }

        let mut deps = Dependencies::default();
        for name in descriptor.dependencies() {
            let value = self
                .registry
                .slot_of(name)
                .and_then(|slot| done.get(&slot))
                .and_then(FeatureResult::value);
            match value {
                Some(v) => deps.insert(name, v),
                None => {
                    return FeatureResult::NotApplicable(NotApplicable::Dependency(name.clone()));
                }
            }
        }

        tracing::debug!(feature = descriptor.name(), "computing feature");
        FeatureResult::from(descriptor.compute(ctx, &deps))
    }
}
