//! Feature extraction over morphology trees.
//!
//! Features are declared in a [`FeatureRegistry`] with the node types they
//! need ("marks") and the features they build on. A [`FeatureEngine`]
//! resolves a request into a dependency-ordered plan, evaluates it against a
//! [`FeatureContext`] and memoizes every result per context. Missing data is
//! a value ([`FeatureResult::NotApplicable`]), never an error.

pub mod catalog;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod registry;
pub mod soma;
pub mod value;

pub use catalog::{FAMILIES, StemFamily, default_registry};
pub use config::FeatureConfig;
pub use context::{ContextId, FeatureContext};
pub use engine::{FeatureCache, FeatureEngine};
pub use error::{FeatureError, Result};
pub use registry::{Dependencies, ExecutionPlan, FeatureDescriptor, FeatureFn, FeatureRegistry, Mark};
pub use value::{FeatureResult, FeatureValue, NotApplicable};
