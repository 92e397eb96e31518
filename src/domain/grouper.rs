//! Record grouper: partitions flat records into independent forests.

use std::collections::BTreeMap;

use tracing::instrument;

use crate::domain::entities::{GroupKey, TreeRecord};

/// Records sharing one `GroupKey`, in input order.
pub type RecordGroups = BTreeMap<GroupKey, Vec<TreeRecord>>;

/// Partition records by (company, project, row-label).
///
/// No filtering or validation happens here: every record lands in exactly one
/// group, and relative input order is preserved within each group.
#[instrument(level = "debug", skip(records), fields(records = records.len()))]
pub fn group_records(records: &[TreeRecord]) -> RecordGroups {
    let mut groups = RecordGroups::new();
    for record in records {
        groups
            .entry(record.group_key())
            .or_default()
            .push(record.clone());
    }
    groups
}
