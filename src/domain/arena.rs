use std::collections::{BTreeSet, HashSet};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::NodeKey;

/// Payload of one forest node, taken from a single input record.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Level and node id
    pub key: NodeKey,
    /// Item identifier, possibly with a `(TYPE)` suffix
    pub item_id: String,
    /// Stored value; only trusted on leaves
    pub value: f64,
    /// Column-label of the record; only meaningful on leaves
    pub column: String,
}

/// Node in the arena-based forest.
#[derive(Debug)]
pub struct ForestNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for roots
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in input order
    pub children: Vec<Index>,
}

impl ForestNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-based forest for one group of records.
///
/// Every node lives in the arena and is owned by exactly one parent's
/// `children` list or by `roots`. The forest is read-only once built, so it
/// can be traversed from several threads at once.
#[derive(Debug)]
pub struct Forest {
    arena: Arena<ForestNode>,
    roots: Vec<Index>,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

impl Forest {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    /// Insert a node without linking it; see [`Forest::attach`].
    pub(crate) fn insert_detached(&mut self, data: NodeData) -> Index {
        self.arena.insert(ForestNode {
            data,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Link a detached node below `parent`, or as a root if `parent` is None.
    pub(crate) fn attach(&mut self, node_idx: Index, parent: Option<Index>) {
        match parent {
            Some(parent_idx) => {
                if let Some(parent) = self.arena.get_mut(parent_idx) {
                    parent.children.push(node_idx);
                }
                if let Some(node) = self.arena.get_mut(node_idx) {
                    node.parent = Some(parent_idx);
                }
            }
            None => self.roots.push(node_idx),
        }
    }

    /// Drop every node that cannot be reached from a root.
    pub(crate) fn retain_reachable(&mut self) -> usize {
        let reachable: HashSet<Index> = self.iter().map(|(idx, _)| idx).collect();
        let before = self.arena.len();
        self.arena.retain(|idx, _| reachable.contains(&idx));
        before - self.arena.len()
    }

    pub fn get_node(&self, idx: Index) -> Option<&ForestNode> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// All leaf nodes, left to right.
    pub fn leaves(&self) -> impl Iterator<Item = &ForestNode> {
        self.iter().map(|(_, node)| node).filter(|node| node.is_leaf())
    }

    /// Distinct column-labels carried by leaf nodes.
    ///
    /// Columns that only appear on internal rows never produce a slice.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_columns(&self) -> BTreeSet<String> {
        self.leaves().map(|node| node.data.column.clone()).collect()
    }
}

/// Pre-order traversal over all trees of a forest.
pub struct ForestIterator<'a> {
    forest: &'a Forest,
    stack: Vec<Index>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a Forest) -> Self {
        let stack = forest.roots.iter().rev().copied().collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (Index, &'a ForestNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
