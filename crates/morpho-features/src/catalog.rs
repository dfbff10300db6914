//! Built-in features and their names.

use morpho_core::{DENDRITE_TYPES, NodeType};

use crate::config::FeatureConfig;
use crate::error::Result;
use crate::registry::{FeatureDescriptor, FeatureRegistry, Mark};
use crate::soma;
use crate::value::FeatureValue;

pub const SOMA_SURFACE: &str = "soma_surface";
pub const SOMA_RADIUS: &str = "soma_radius";
pub const RELATIVE_SOMA_DEPTH: &str = "relative_soma_depth";
pub const NUMBER_OF_STEMS: &str = "number_of_stems";

pub const STEM_EXIT_AND_DISTANCE: &str = "stem_exit_and_distance";
pub const STEM_EXIT: &str = "stem_exit";
pub const STEM_DISTANCE: &str = "stem_distance";

/// A named node-type set that stem features are computed per.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StemFamily {
    pub name: &'static str,
    pub types: &'static [NodeType],
}

impl StemFamily {
    /// Full feature name, e.g. `axon.stem_exit_and_distance`.
    pub fn feature(&self, suffix: &str) -> String {
        format!("{}.{suffix}", self.name)
    }

    pub fn mark(&self) -> Mark {
        Mark::any_of(self.name, self.types)
    }
}

pub const AXON: StemFamily = StemFamily {
    name: "axon",
    types: &[NodeType::Axon],
};
pub const BASAL_DENDRITE: StemFamily = StemFamily {
    name: "basal_dendrite",
    types: &[NodeType::BasalDendrite],
};
pub const APICAL_DENDRITE: StemFamily = StemFamily {
    name: "apical_dendrite",
    types: &[NodeType::ApicalDendrite],
};
pub const DENDRITE: StemFamily = StemFamily {
    name: "dendrite",
    types: &DENDRITE_TYPES,
};

pub const FAMILIES: [StemFamily; 4] = [AXON, BASAL_DENDRITE, APICAL_DENDRITE, DENDRITE];

/// Registry holding every built-in feature. Stem geometry is computed with
/// the axis and tolerance of `config`.
pub fn default_registry(config: &FeatureConfig) -> Result<FeatureRegistry> {
    let mut registry = FeatureRegistry::new();

    registry.register(
        FeatureDescriptor::new(SOMA_SURFACE, |ctx, _| {
            Some(FeatureValue::Scalar(soma::soma_surface(ctx)))
        })
        .with_mark(Mark::of(NodeType::Soma)),
    )?;
    registry.register(
        FeatureDescriptor::new(SOMA_RADIUS, |ctx, _| {
            Some(FeatureValue::Scalar(soma::soma_radius(ctx)))
        })
        .with_mark(Mark::of(NodeType::Soma)),
    )?;
    registry.register(FeatureDescriptor::new(RELATIVE_SOMA_DEPTH, |ctx, _| {
        soma::relative_soma_depth(ctx).map(FeatureValue::Scalar)
    }))?;
    registry.register(FeatureDescriptor::new(NUMBER_OF_STEMS, |ctx, _| {
        Some(FeatureValue::Scalar(soma::number_of_stems(ctx) as f64))
    }))?;

    for family in FAMILIES {
        registry.register(FeatureDescriptor::new(
            &family.feature(NUMBER_OF_STEMS),
            move |ctx, _| {
                let n = soma::number_of_stems_of_type(ctx, family.types);
                Some(FeatureValue::Scalar(n as f64))
            },
        ))?;

        let stem_config = config.clone();
        let pair_name = family.feature(STEM_EXIT_AND_DISTANCE);
        registry.register(
            FeatureDescriptor::new(&pair_name, move |ctx, _| {
                soma::stem_exit_and_distance(ctx, family.types, &stem_config)
                    .map(FeatureValue::from)
            })
            .with_mark(family.mark()),
        )?;

        let dep = pair_name.clone();
        registry.register(
            FeatureDescriptor::new(&family.feature(STEM_EXIT), move |_, deps| {
                deps.pair(&dep).map(|(t, _)| FeatureValue::Scalar(t))
            })
            .depends_on(&pair_name),
        )?;

        let dep = pair_name.clone();
        registry.register(
            FeatureDescriptor::new(&family.feature(STEM_DISTANCE), move |_, deps| {
                deps.pair(&dep).map(|(_, d)| FeatureValue::Scalar(d))
            })
            .depends_on(&pair_name),
        )?;
    }

    tracing::debug!(features = registry.len(), "registered built-in features");
    Ok(registry)
}
