//! Column pruning aggregator.
//!
//! For one column-label, a purge keeps only the leaves recorded for that
//! column with a nonzero value, and replaces every internal value with the
//! sum of its surviving children. Branches without survivors disappear.

use std::collections::BTreeMap;

use generational_arena::Index;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::Forest;
use crate::domain::entities::NodeKey;

/// What to do with an internal node whose surviving children sum to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroTotals {
    /// A zero total is treated like missing data and pruned.
    #[default]
    Prune,
    /// Keep the node as long as at least one child survived.
    Retain,
}

/// A node of a purged tree. Values are recomputed; nothing points back
/// into the source forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurgedNode {
    pub key: NodeKey,
    pub item_id: String,
    pub value: f64,
    pub children: Vec<PurgedNode>,
}

impl PurgedNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn level(&self) -> u32 {
        self.key.level
    }
}

/// Purge a forest for one column-label.
///
/// Returns the surviving roots in forest order; an empty vector means the
/// column carries no data in this forest.
#[instrument(level = "debug", skip(forest))]
pub fn purge(forest: &Forest, column: &str, policy: ZeroTotals) -> Vec<PurgedNode> {
    let column = column.trim();
    let roots: Vec<PurgedNode> = forest
        .roots()
        .iter()
        .filter_map(|&root| purge_node(forest, root, column, policy))
        .collect();
    debug!("column {:?}: {} root(s) survive", column, roots.len());
    roots
}

fn purge_node(forest: &Forest, idx: Index, column: &str, policy: ZeroTotals) -> Option<PurgedNode> {
    let node = forest.get_node(idx)?;

    if node.is_leaf() {
        if node.data.column != column || node.data.value == 0.0 {
            return None;
        }
        return Some(PurgedNode {
            key: node.data.key,
            item_id: node.data.item_id.clone(),
            value: node.data.value,
            children: Vec::new(),
        });
    }

    let children: Vec<PurgedNode> = node
        .children
        .iter()
        .filter_map(|&child| purge_node(forest, child, column, policy))
        .collect();
    if children.is_empty() {
        return None;
    }

    // The stored value of an internal row is never trusted.
    let value: f64 = children.iter().map(|child| child.value).sum();
    if value == 0.0 && policy == ZeroTotals::Prune {
        return None;
    }

    Some(PurgedNode {
        key: node.data.key,
        item_id: node.data.item_id.clone(),
        value,
        children,
    })
}

/// Purge a forest once per column-label observed on its leaves.
///
/// Columns are independent, read-only traversals of the same forest and run
/// in parallel when `parallel` is set.
#[instrument(level = "debug", skip(forest))]
pub fn purge_all(
    forest: &Forest,
    policy: ZeroTotals,
    parallel: bool,
) -> BTreeMap<String, Vec<PurgedNode>> {
    let columns: Vec<String> = forest.leaf_columns().into_iter().collect();
    if parallel {
        columns
            .into_par_iter()
            .map(|column| {
                let roots = purge(forest, &column, policy);
                (column, roots)
            })
            .collect()
    } else {
        columns
            .into_iter()
            .map(|column| {
                let roots = purge(forest, &column, policy);
                (column, roots)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::build_forest;
    use crate::domain::entities::TreeRecord;

    fn rec(level: u32, node: i64, parent: i64, column: &str, value: f64) -> TreeRecord {
        TreeRecord {
            company: "SP".into(),
            project: "1".into(),
            row: "R".into(),
            column: column.into(),
            level,
            node,
            parent,
            item_id: format!("I{level}{node}"),
            value,
        }
    }

    #[test]
    fn given_two_columns_when_purging_one_then_other_leaf_absent() {
        let forest = build_forest(&[
            rec(1, 1, 0, "X", 999.0),
            rec(2, 1, 1, "X", 100.0),
            rec(2, 2, 1, "Y", 50.0),
        ]);

        let roots = purge(&forest, "X", ZeroTotals::Prune);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].value, 100.0);
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].key, NodeKey::new(2, 1));
    }

    #[test]
    fn given_offsetting_leaves_when_purging_then_policy_decides() {
        let forest = build_forest(&[
            rec(1, 1, 0, "X", 0.0),
            rec(2, 1, 1, "X", 30.0),
            rec(2, 2, 1, "X", -30.0),
        ]);

        assert!(purge(&forest, "X", ZeroTotals::Prune).is_empty());

        let kept = purge(&forest, "X", ZeroTotals::Retain);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].value, 0.0);
        assert_eq!(kept[0].children.len(), 2);
    }

    #[test]
    fn given_forest_when_purging_all_then_one_slice_per_leaf_column() {
        let forest = build_forest(&[
            rec(1, 1, 0, "INTERNAL", 0.0),
            rec(2, 1, 1, "X", 1.0),
            rec(2, 2, 1, "Y", 2.0),
        ]);

        let sequential = purge_all(&forest, ZeroTotals::Prune, false);
        let parallel = purge_all(&forest, ZeroTotals::Prune, true);
        assert_eq!(sequential.keys().collect::<Vec<_>>(), vec!["X", "Y"]);
        assert_eq!(sequential, parallel);
    }
}
