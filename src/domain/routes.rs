//! Root-to-leaf routes through purged trees.

use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::domain::entities::NodeKey;
use crate::domain::purge::PurgedNode;

/// One node on a route, with the total accumulated at that node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub key: NodeKey,
    pub item_id: String,
    pub total: f64,
}

/// Path from a root down to one surviving leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafRoute {
    pub steps: Vec<RouteStep>,
    pub column: String,
    pub value: f64,
}

impl fmt::Display for LeafRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps = self
            .steps
            .iter()
            .map(|s| format!("[{},{},{}:{}]", s.key.level, s.key.node, s.item_id, s.total))
            .join("");
        write!(f, "{} leaf({},{})", steps, self.value, self.column)
    }
}

/// Every root-to-leaf route of a purged forest, left to right.
///
/// Totals come from the purge, so each step carries the sum of all leaves
/// below it for `column`.
pub fn leaf_routes(roots: &[PurgedNode], column: &str) -> Vec<LeafRoute> {
    let mut routes = Vec::new();
    let mut path = Vec::new();
    for root in roots {
        walk(root, column, &mut path, &mut routes);
    }
    routes
}

fn walk(node: &PurgedNode, column: &str, path: &mut Vec<RouteStep>, routes: &mut Vec<LeafRoute>) {
    path.push(RouteStep {
        key: node.key,
        item_id: node.item_id.clone(),
        total: node.value,
    });
    if node.is_leaf() {
        routes.push(LeafRoute {
            steps: path.clone(),
            column: column.to_string(),
            value: node.value,
        });
    } else {
        for child in &node.children {
            walk(child, column, path, routes);
        }
    }
    path.pop();
}

/// Flatten a tree into one row per branch: the levels along the branch,
/// padded with `None` up to `max_levels`.
///
/// Branches deeper than `max_levels` are returned unpadded.
pub fn flatten_branches(node: &PurgedNode, max_levels: usize) -> Vec<Vec<Option<u32>>> {
    fn go(
        node: &PurgedNode,
        prefix: &[Option<u32>],
        max_levels: usize,
        rows: &mut Vec<Vec<Option<u32>>>,
    ) {
        let mut row = prefix.to_vec();
        row.push(Some(node.level()));
        if node.is_leaf() {
            if row.len() < max_levels {
                row.resize(max_levels, None);
            }
            rows.push(row);
        } else {
            for child in &node.children {
                go(child, &row, max_levels, rows);
            }
        }
    }

    let mut rows = Vec::new();
    go(node, &[], max_levels, &mut rows);
    rows
}
