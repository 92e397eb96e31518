//! Forest builder: reconstructs parent/child links from flat records.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{Forest, NodeData};
use crate::domain::entities::{NodeKey, TreeRecord};

/// Counters describing the last build, for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Nodes whose parent reference did not resolve (with their subtrees)
    pub dropped: usize,
    /// Repeated records of an internal position folded into the first one
    pub folded: usize,
}

/// Constructs a forest from the records of one group.
///
/// Parents are looked up by `(parent-node-id, level - 1)`; since a parent
/// always lives exactly one level up, parent links cannot form a cycle.
pub struct ForestBuilder {
    index: HashMap<NodeKey, Index>,
    parent_keys: HashSet<NodeKey>,
    stats: BuildStats,
}

impl Default for ForestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ForestBuilder {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            parent_keys: HashSet::new(),
            stats: BuildStats::default(),
        }
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Build the forest for one group of records.
    ///
    /// Records may arrive in any order. A record whose parent cannot be
    /// found is left out of the forest together with everything below it.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build(&mut self, records: &[TreeRecord]) -> Forest {
        // Reset state for a fresh build
        self.index.clear();
        self.parent_keys = records.iter().filter_map(TreeRecord::parent_key).collect();
        self.stats = BuildStats::default();

        let mut forest = Forest::new();
        let mut pending = Vec::with_capacity(records.len());

        for record in records {
            let key = record.node_key();
            if self.parent_keys.contains(&key) && self.index.contains_key(&key) {
                // Internal rows repeat per column; their payload is never used.
                self.stats.folded += 1;
                continue;
            }
            let idx = forest.insert_detached(NodeData {
                key,
                item_id: record.item_id.clone(),
                value: record.value,
                column: record.column.trim().to_string(),
            });
            self.index.entry(key).or_insert(idx);
            pending.push((idx, key, record.parent_key()));
        }

        for (idx, key, parent_key) in pending {
            match parent_key {
                None => forest.attach(idx, None),
                Some(parent_key) => match self.index.get(&parent_key) {
                    Some(&parent_idx) => forest.attach(idx, Some(parent_idx)),
                    None => debug!("dangling parent {} for node {}", parent_key, key),
                },
            }
        }

        self.stats.dropped = forest.retain_reachable();
        if self.stats.dropped > 0 {
            warn!(
                "{} node(s) dropped: parent reference did not resolve",
                self.stats.dropped
            );
        }
        debug!(
            "built forest: roots={}, nodes={}, depth={}, folded={}",
            forest.roots().len(),
            forest.len(),
            forest.depth(),
            self.stats.folded
        );
        forest
    }
}

/// Build a forest with a throwaway builder.
pub fn build_forest(records: &[TreeRecord]) -> Forest {
    ForestBuilder::new().build(records)
}
