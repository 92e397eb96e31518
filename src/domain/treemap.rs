//! Treemap projection: the minimal shape handed to chart renderers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use termtree::Tree;

use crate::domain::entities::NodeKey;
use crate::domain::error::DomainError;
use crate::domain::purge::PurgedNode;

/// Externally exposed node: composite id, value, children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreemapNode {
    pub id: String,
    pub value: f64,
    pub children: Vec<TreemapNode>,
}

impl TreemapNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Parse this node's composite identifier.
    pub fn composite_id(&self) -> Result<CompositeId, DomainError> {
        self.id.parse()
    }
}

/// Re-label a purged tree as `{level}-{node-id}-{item-identifier}` nodes.
pub fn project(node: &PurgedNode) -> TreemapNode {
    TreemapNode {
        id: CompositeId::format(node.key, &node.item_id),
        value: node.value,
        children: node.children.iter().map(project).collect(),
    }
}

pub fn project_all(roots: &[PurgedNode]) -> Vec<TreemapNode> {
    roots.iter().map(project).collect()
}

/// Parsed form of `"{level}-{node-id}-{item-identifier}"`.
///
/// Everything after the second hyphen is the item identifier, so item
/// identifiers may themselves contain hyphens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeId {
    pub key: NodeKey,
    pub item_id: String,
}

impl CompositeId {
    pub fn format(key: NodeKey, item_id: &str) -> String {
        format!("{}-{}-{}", key.level, key.node, item_id)
    }
}

impl FromStr for CompositeId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let (Some(level), Some(node), Some(item_id)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(DomainError::MalformedIdentifier(s.to_string()));
        };
        let level = level
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidLevel(s.to_string()))?;
        let node = node
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidNodeId(s.to_string()))?;
        Ok(Self {
            key: NodeKey::new(level, node),
            item_id: item_id.to_string(),
        })
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::format(self.key, &self.item_id))
    }
}

/// Parallel-array form of a treemap forest.
///
/// `parents[i]` is the id of the parent of `ids[i]`, empty for roots. Values
/// are totals, i.e. a parent's value includes its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreemapTable {
    pub ids: Vec<String>,
    pub parents: Vec<String>,
    pub values: Vec<f64>,
}

impl TreemapTable {
    pub fn from_roots(roots: &[TreemapNode]) -> Self {
        let mut table = Self::default();
        for root in roots {
            table.push(root, "");
        }
        table
    }

    fn push(&mut self, node: &TreemapNode, parent: &str) {
        self.ids.push(node.id.clone());
        self.parents.push(parent.to_string());
        self.values.push(node.value);
        for child in &node.children {
            self.push(child, &node.id);
        }
    }
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for TreemapNode {
    fn to_tree_string(&self) -> Tree<String> {
        let leaves: Vec<_> = self.children.iter().map(|c| c.to_tree_string()).collect();
        Tree::new(format!("{} [{}]", self.id, self.value)).with_leaves(leaves)
    }
}
