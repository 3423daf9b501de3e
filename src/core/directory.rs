use std::collections::HashMap;

use crate::core::model::NodeId;

/// Maps node ids to human-readable names. Seeded from settings and updated
/// from NodeInfo packets; unknown nodes resolve to their raw id.
#[derive(Debug, Default)]
pub struct NodeDirectory {
    names: HashMap<NodeId, String>,
}

impl NodeDirectory {
    pub fn new(seed: HashMap<NodeId, String>) -> Self {
        Self { names: seed }
    }

    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map_or(id, String::as_str)
    }

    pub fn insert(&mut self, id: &str, name: &str) {
        if name.is_empty() {
            return;
        }
        self.names.insert(id.to_string(), name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_id() {
        let mut directory = NodeDirectory::default();
        assert_eq!(directory.resolve("!a1b2"), "!a1b2");

        directory.insert("!a1b2", "Base Camp");
        assert_eq!(directory.resolve("!a1b2"), "Base Camp");

        // Empty names never shadow the id.
        directory.insert("!a1b2", "");
        assert_eq!(directory.resolve("!a1b2"), "Base Camp");
    }
}
