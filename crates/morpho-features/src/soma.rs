//! Soma-centred features. The soma is the tree root, modelled as a sphere of
//! the root's radius.

use morpho_core::{NodeType, lateral_offset, lerp, sphere_exit_fraction, sphere_surface};

use crate::config::FeatureConfig;
use crate::context::FeatureContext;

/// Surface area of the soma sphere: 4πr².
pub fn soma_surface(ctx: &FeatureContext) -> f64 {
    sphere_surface(ctx.soma().radius)
}

pub fn soma_radius(ctx: &FeatureContext) -> f64 {
    ctx.soma().radius
}

/// The precomputed relative depth, passed through unchanged.
pub fn relative_soma_depth(ctx: &FeatureContext) -> Option<f64> {
    ctx.relative_soma_depth()
}

/// Number of branches leaving the soma.
pub fn number_of_stems(ctx: &FeatureContext) -> usize {
    ctx.tree().stems().count()
}

pub fn number_of_stems_of_type(ctx: &FeatureContext, types: &[NodeType]) -> usize {
    ctx.tree().stems_of_type(types).count()
}

/// Where the first stem of `types` leaves the soma sphere.
///
/// Returns `(t, lateral)`: `t` is the exit fraction along soma centre -> stem
/// node, `lateral` the distance of the exit point from the line through the
/// soma centre along the principal axis. When several stems qualify, the
/// first in traversal order is used. `None` when no stem qualifies.
pub fn stem_exit_and_distance(
    ctx: &FeatureContext,
    types: &[NodeType],
    config: &FeatureConfig,
) -> Option<(f64, f64)> {
    let stem = ctx.tree().stems_of_type(types).next()?;
    let soma = ctx.soma();

    let t = sphere_exit_fraction(
        soma.position,
        soma.radius,
        stem.position,
        config.degenerate_tolerance,
    );
    let exit = lerp(soma.position, stem.position, t);
    let lateral = lateral_offset(exit - soma.position, config.principal_axis);
    Some((t, lateral))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;
    use morpho_core::{Axis, MorphologyTree, RELATIVE_SOMA_DEPTH, RawNode};

    fn context(records: Vec<RawNode>) -> FeatureContext {
        let tree = MorphologyTree::build(&records, |r| r.id, |r| r.parent_id).unwrap();
        FeatureContext::new(tree, BTreeMap::new())
    }

    fn soma() -> RawNode {
        RawNode::new(0, -1, NodeType::Soma, [0.0, 0.0, 100.0], 5.0)
    }

    #[test]
    fn test_soma_surface() {
        let ctx = context(vec![soma()]);
        assert_relative_eq!(soma_surface(&ctx), 100.0 * std::f64::consts::PI);
        assert_eq!(soma_radius(&ctx), 5.0);
    }

    #[test]
    fn test_relative_soma_depth_absent() {
        let ctx = context(vec![soma()]);
        assert_eq!(relative_soma_depth(&ctx), None);
        let ctx = ctx.with_aux(RELATIVE_SOMA_DEPTH, 0.4);
        assert_eq!(relative_soma_depth(&ctx), Some(0.4));
    }

    #[test]
    fn test_stem_on_axis() {
        let ctx = context(vec![
            soma(),
            RawNode::new(1, 0, NodeType::Axon, [0.0, 0.0, 110.0], 1.0),
        ]);
        let got = stem_exit_and_distance(&ctx, &[NodeType::Axon], &FeatureConfig::default());
        assert_eq!(got, Some((0.5, 0.0)));
    }

    #[test]
    fn test_stem_off_axis() {
        // stem 20 away laterally along x: exits at 5 from centre
        let ctx = context(vec![
            soma(),
            RawNode::new(1, 0, NodeType::BasalDendrite, [20.0, 0.0, 100.0], 1.0),
        ]);
        let (t, lateral) =
            stem_exit_and_distance(&ctx, &[NodeType::BasalDendrite], &FeatureConfig::default())
                .unwrap();
        assert_relative_eq!(t, 0.25);
        assert_relative_eq!(lateral, 5.0);

        // measured against x instead, the exit point is on the axis
        let config = FeatureConfig {
            principal_axis: Axis::X,
            ..FeatureConfig::default()
        };
        let (_, lateral) =
            stem_exit_and_distance(&ctx, &[NodeType::BasalDendrite], &config).unwrap();
        assert_relative_eq!(lateral, 0.0);
    }

    #[test]
    fn test_stem_inside_soma() {
        let ctx = context(vec![
            soma(),
            RawNode::new(1, 0, NodeType::Axon, [3.0, 0.0, 100.0], 1.0),
        ]);
        let (t, lateral) =
            stem_exit_and_distance(&ctx, &[NodeType::Axon], &FeatureConfig::default()).unwrap();
        assert_eq!(t, 1.0);
        assert_relative_eq!(lateral, 3.0);
    }

    #[test]
    fn test_zero_length_stem() {
        let ctx = context(vec![
            soma(),
            RawNode::new(1, 0, NodeType::Axon, [0.0, 0.0, 100.0], 1.0),
        ]);
        assert_eq!(
            stem_exit_and_distance(&ctx, &[NodeType::Axon], &FeatureConfig::default()),
            Some((0.0, 0.0))
        );
    }

    #[test]
    fn test_tiny_nonzero_stem() {
        let ctx = context(vec![
            soma(),
            RawNode::new(1, 0, NodeType::Axon, [0.0, 0.0, 100.0 + 1e-11], 1.0),
        ]);
        assert_eq!(
            stem_exit_and_distance(&ctx, &[NodeType::Axon], &FeatureConfig::default()),
            Some((1.0, 0.0))
        );

        let config = FeatureConfig {
            degenerate_tolerance: 1e-10,
            ..FeatureConfig::default()
        };
        assert_eq!(
            stem_exit_and_distance(&ctx, &[NodeType::Axon], &config),
            Some((0.0, 0.0))
        );
    }

    #[test]
    fn test_first_stem_wins() {
        let ctx = context(vec![
            soma(),
            RawNode::new(1, 0, NodeType::Axon, [0.0, 10.0, 100.0], 1.0),
            RawNode::new(2, 0, NodeType::Axon, [0.0, 0.0, 110.0], 1.0),
        ]);
        let (t, lateral) =
            stem_exit_and_distance(&ctx, &[NodeType::Axon], &FeatureConfig::default()).unwrap();
        assert_relative_eq!(t, 0.5);
        assert_relative_eq!(lateral, 5.0);
    }

    #[test]
    fn test_no_matching_stem() {
        // axon nodes exist, but none leaves the soma directly
        let ctx = context(vec![
            soma(),
            RawNode::new(1, 0, NodeType::BasalDendrite, [0.0, 10.0, 100.0], 1.0),
            RawNode::new(2, 1, NodeType::Axon, [0.0, 20.0, 100.0], 1.0),
        ]);
        assert_eq!(
            stem_exit_and_distance(&ctx, &[NodeType::Axon], &FeatureConfig::default()),
            None
        );
        assert_eq!(number_of_stems(&ctx), 1);
        assert_eq!(number_of_stems_of_type(&ctx, &[NodeType::Axon]), 0);
    }
}
