use std::collections::HashMap;
use std::time::Instant;

use super::model::{Metric, NodeId};

/// Per-node alerting state. Created lazily on first event from a node and
/// kept for the process lifetime. Cooldown timestamps are keyed per metric so
/// distinct rule kinds never share a window.
#[derive(Debug, Default, Clone)]
pub struct NodeState {
    pub last_metric: HashMap<Metric, f64>,
    pub last_alert: HashMap<Metric, Instant>,
    pub last_response: Option<Instant>,
}

/// Keyed mutable store of node states. Holds no alerting logic and is owned
/// exclusively by the alert engine. Unbounded by design: one entry per
/// distinct node ever seen.
#[derive(Debug, Default)]
pub struct NodeStateStore {
    nodes: HashMap<NodeId, NodeState>,
}

impl NodeStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&NodeState> {
        self.nodes.get(id)
    }

    /// Fetches the state for a node, creating a default entry on first access.
    pub fn entry(&mut self, id: &str) -> &mut NodeState {
        self.nodes.entry(id.to_string()).or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creates_lazily() {
        let mut store = NodeStateStore::new();
        assert!(store.get("!a").is_none());
        assert!(store.is_empty());

        store.entry("!a").last_response = Some(Instant::now());
        assert_eq!(store.len(), 1);
        assert!(store.get("!a").unwrap().last_response.is_some());

        // Same node, same entry.
        store.entry("!a");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_metrics_tracked_independently() {
        let mut store = NodeStateStore::new();
        let now = Instant::now();

        let state = store.entry("!a");
        state.last_alert.insert(Metric::Battery, now);
        state.last_metric.insert(Metric::Battery, 15.0);

        let state = store.get("!a").unwrap();
        assert!(state.last_alert.get(&Metric::Temperature).is_none());
        assert_eq!(state.last_metric.get(&Metric::Battery), Some(&15.0));
    }
}
