use std::path::Path;

use morpho_core::Axis;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Engine and feature tuning, loadable from TOML.
///
/// ```toml
/// principal_axis = "z"
/// parallel = false
/// degenerate_tolerance = 0.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureConfig {
    /// Vertical axis of the soma; lateral distances are measured orthogonal
    /// to it.
    pub principal_axis: Axis,
    /// Evaluate mutually independent features on the rayon pool.
    pub parallel: bool,
    /// Soma-to-stem segments at or below this length count as zero-length.
    /// Only exact zero by default.
    pub degenerate_tolerance: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            principal_axis: Axis::Z,
            parallel: false,
            degenerate_tolerance: 0.0,
        }
    }
}

impl FeatureConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("loaded feature config from {}", path.display());
        Ok(config)
    }
}
