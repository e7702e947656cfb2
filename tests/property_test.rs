//! Property tests for compilation invariants.
//!
//! 1. Timeframe strings round-trip through their canonical form
//! 2. Manager order equals source order and every id is indexed
//! 3. A resolved timeframe is never finer than any resolved producer
//! 4. Merging is all-or-nothing

use proptest::prelude::*;
use transform_graph::registry::MetadataRegistry;
use transform_graph::{
    AlgorithmNode, CompiledSource, TimeFrame, TransformConfiguration, TransformManager, TransformManagerOptions,
};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_timeframe() -> impl Strategy<Value = TimeFrame> {
    let n = 1u32..60;
    prop_oneof![
        n.clone().prop_map(TimeFrame::minutes),
        n.clone().prop_map(TimeFrame::hours),
        n.clone().prop_map(TimeFrame::days),
        n.clone().prop_map(|n| TimeFrame::weeks(n, None)),
        n.clone().prop_map(TimeFrame::month_end),
        n.clone().prop_map(TimeFrame::quarter_start),
        n.prop_map(TimeFrame::year_end),
    ]
}

/// A topologically ordered tree of `sma` nodes over one data source. Each
/// node reads from an earlier node and may carry an explicit timeframe.
fn arb_graph() -> impl Strategy<Value = Vec<AlgorithmNode>> {
    (1usize..24)
        .prop_flat_map(|len| {
            (
                proptest::collection::vec((any::<prop::sample::Index>(), proptest::option::of(arb_timeframe())), len),
                arb_timeframe(),
            )
        })
        .prop_map(|(specs, source_tf)| {
            let mut nodes = vec![AlgorithmNode::new("n0", "market_data_source").with_timeframe(source_tf)];
            for (i, (pick, timeframe)) in specs.into_iter().enumerate() {
                let id = format!("n{}", i + 1);
                let upstream = pick.index(nodes.len());
                let handle = if upstream == 0 {
                    "n0#c".to_string()
                } else {
                    format!("n{upstream}#result")
                };
                let mut node = AlgorithmNode::new(id, "sma").with_input("SLOT", handle);
                if let Some(timeframe) = timeframe {
                    node = node.with_timeframe(timeframe);
                }
                nodes.push(node);
            }
            nodes
        })
}

fn build(nodes: Vec<AlgorithmNode>) -> TransformManager {
    let options = TransformManagerOptions::new(CompiledSource::new(nodes)).validate(true);
    TransformManager::new(options, &MetadataRegistry::with_builtins()).unwrap()
}

// ── 1. Timeframe parsing ─────────────────────────────────────────────

proptest! {
    #[test]
    fn timeframe_display_parses_back(timeframe in arb_timeframe()) {
        let parsed: TimeFrame = timeframe.to_string().parse().unwrap();
        prop_assert_eq!(parsed, timeframe);
    }

    #[test]
    fn timeframe_order_follows_unit_then_interval(a in arb_timeframe(), b in arb_timeframe()) {
        let expected = a.unit().cmp(&b.unit()).then(a.interval().cmp(&b.interval()));
        prop_assert_eq!(a.cmp(&b), expected);
    }
}

// ── 2. Order and indexing ────────────────────────────────────────────

proptest! {
    #[test]
    fn manager_preserves_source_order(nodes in arb_graph()) {
        let expected: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let manager = build(nodes);

        let ids: Vec<&str> = manager.iter().map(TransformConfiguration::id).collect();
        prop_assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
        for id in &expected {
            prop_assert_eq!(manager.get_by_id(id).unwrap().id(), id.as_str());
        }
    }
}

// ── 3. Coarsest producer wins ────────────────────────────────────────

proptest! {
    #[test]
    fn inferred_timeframe_is_coarsest_producer(nodes in arb_graph()) {
        let explicit: Vec<bool> = nodes.iter().map(|n| n.timeframe.is_some()).collect();
        let manager = build(nodes);

        for (config, explicit) in manager.iter().zip(explicit) {
            let timeframe = config.timeframe().unwrap();
            if explicit {
                continue;
            }
            let coarsest = config
                .input_handles()
                .filter_map(|handle| manager.resolve_handle(handle).ok())
                .filter_map(|(producer, _)| producer.timeframe())
                .max()
                .unwrap();
            prop_assert_eq!(timeframe, coarsest);
        }
    }
}

// ── 4. Atomic merge ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn failed_merge_leaves_manager_untouched(nodes in arb_graph()) {
        let mut manager = build(nodes.clone());
        let before = manager.transforms().to_vec();

        let other = build(nodes);
        prop_assert!(manager.merge(&other).is_err());
        prop_assert_eq!(manager.transforms(), before.as_slice());
    }
}
