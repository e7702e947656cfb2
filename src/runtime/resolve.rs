use std::collections::HashMap;

use tracing::debug;

use crate::ir::{producer_id, AlgorithmNode};
use crate::timeframe::TimeFrame;

/// Memo of resolved timeframes, scoped to one manager construction.
///
/// A node without an explicit timeframe runs at the coarsest timeframe among
/// its already-resolved producers, or at the base timeframe when none of its
/// producers are known. Producers that have not been resolved yet are
/// skipped, so callers must feed nodes in topological order.
#[derive(Debug, Clone, Default)]
pub struct TimeframeResolutionCache {
    node_timeframes: HashMap<String, Option<TimeFrame>>,
}

impl TimeframeResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<S: AsRef<str>>(
        &mut self,
        node_id: &str,
        input_handles: &[S],
        base_timeframe: Option<&TimeFrame>,
    ) -> Option<TimeFrame> {
        if let Some(cached) = self.node_timeframes.get(node_id) {
            return cached.clone();
        }

        let coarsest = input_handles
            .iter()
            .filter_map(|handle| self.get(producer_id(handle.as_ref())))
            .max()
            .cloned();

        let resolved = coarsest.or_else(|| base_timeframe.cloned());
        debug!(
            node = node_id,
            timeframe = ?resolved.as_ref().map(ToString::to_string),
            "resolved timeframe"
        );
        self.node_timeframes.insert(node_id.to_string(), resolved.clone());
        resolved
    }

    /// Resolves a compiled node; an explicit timeframe is cached as-is.
    pub fn resolve_node(&mut self, node: &AlgorithmNode, base_timeframe: Option<&TimeFrame>) -> Option<TimeFrame> {
        if let Some(explicit) = &node.timeframe {
            self.node_timeframes.insert(node.id.clone(), Some(explicit.clone()));
            return Some(explicit.clone());
        }
        let handles = node.input_handles();
        self.resolve(&node.id, handles.as_slice(), base_timeframe)
    }

    /// Cached timeframe of `node_id`, if it resolved to a concrete value.
    pub fn get(&self, node_id: &str) -> Option<&TimeFrame> {
        self.node_timeframes.get(node_id).and_then(Option::as_ref)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node_timeframes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.node_timeframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_timeframes.is_empty()
    }
}
