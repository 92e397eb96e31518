//! Leaf identifiers and the detail rows they select.

use std::collections::BTreeSet;

use tracing::{trace, warn};

use crate::domain::entities::{normalize, DetailRecord, GroupKey};
use crate::domain::treemap::TreemapNode;

/// Item identifiers of the leaves of a projected tree.
pub type LeafSet = BTreeSet<String>;

/// Strip a trailing `(TYPE)` suffix: `ITEMID(TYPE)` becomes `ITEMID`.
pub fn strip_type_suffix(item_id: &str) -> &str {
    let trimmed = item_id.trim();
    match trimmed.strip_suffix(')').and_then(|rest| rest.rfind('(')) {
        Some(open) => trimmed[..open].trim_end(),
        None => trimmed,
    }
}

/// Collect the bare item identifiers of every leaf below `node`.
pub fn leaf_item_ids(node: &TreemapNode) -> LeafSet {
    let mut leaves = LeafSet::new();
    collect_leaves(node, &mut leaves);
    leaves
}

/// Same as [`leaf_item_ids`] over several roots.
pub fn leaf_item_ids_all(roots: &[TreemapNode]) -> LeafSet {
    let mut leaves = LeafSet::new();
    for root in roots {
        collect_leaves(root, &mut leaves);
    }
    leaves
}

fn collect_leaves(node: &TreemapNode, leaves: &mut LeafSet) {
    if !node.is_leaf() {
        for child in &node.children {
            collect_leaves(child, leaves);
        }
        return;
    }
    match node.composite_id() {
        Ok(id) => {
            let item = strip_type_suffix(&id.item_id);
            trace!("leaf {} -> {}", node.id, item);
            leaves.insert(item.to_string());
        }
        Err(e) => warn!("skipping leaf: {}", e),
    }
}

/// Detail rows whose item identifier is in `leaves`, in input order.
pub fn filter_details<'a>(details: &'a [DetailRecord], leaves: &LeafSet) -> Vec<&'a DetailRecord> {
    details
        .iter()
        .filter(|detail| leaves.contains(&normalize(&detail.item_id)))
        .collect()
}

/// Like [`filter_details`], restricted to the company and project of `key`.
pub fn filter_details_for<'a>(
    details: &'a [DetailRecord],
    key: &GroupKey,
    leaves: &LeafSet,
) -> Vec<&'a DetailRecord> {
    filter_details(details, leaves)
        .into_iter()
        .filter(|detail| {
            normalize(&detail.company) == key.company && normalize(&detail.project) == key.project
        })
        .collect()
}
