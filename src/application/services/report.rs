//! Cost tree report service
//!
//! Runs the whole pipeline: group records, build one forest per group, purge
//! it per leaf column, project the result and derive the leaf sets used to
//! select detail rows.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::error_ext::{IoResultExt, JsonResultExt};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{
    filter_details_for, group_records, leaf_item_ids_all, leaf_routes, project_all, purge_all,
    DetailRecord, ForestBuilder, GroupKey, LeafRoute, LeafSet, PurgedNode, TreeRecord,
    TreemapNode, ZeroTotals,
};
use crate::infrastructure::traits::FileSystem;

/// Knobs for one report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub zero_totals: ZeroTotals,
    pub parallel: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            zero_totals: ZeroTotals::Prune,
            parallel: true,
        }
    }
}

impl From<&Settings> for ReportOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            zero_totals: settings.zero_totals,
            parallel: settings.parallel,
        }
    }
}

/// One purged tree: a group seen through one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSlice {
    pub key: GroupKey,
    pub column: String,
    pub total: f64,
    pub treemap: Vec<TreemapNode>,
    pub leaves: LeafSet,
    #[serde(skip)]
    pub roots: Vec<PurgedNode>,
}

impl CostSlice {
    fn new(key: GroupKey, column: String, roots: Vec<PurgedNode>) -> Self {
        let treemap = project_all(&roots);
        let leaves = leaf_item_ids_all(&treemap);
        let total = roots.iter().map(|root| root.value).sum();
        Self {
            key,
            column,
            total,
            treemap,
            leaves,
            roots,
        }
    }

    pub fn routes(&self) -> Vec<LeafRoute> {
        leaf_routes(&self.roots, &self.column)
    }

    /// Detail rows of this slice's company and project whose item is a leaf here.
    pub fn details<'a>(&self, details: &'a [DetailRecord]) -> Vec<&'a DetailRecord> {
        filter_details_for(details, &self.key, &self.leaves)
    }
}

/// Selection of slices by group components and column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceFilter {
    pub company: Option<String>,
    pub project: Option<String>,
    pub row: Option<String>,
    pub column: Option<String>,
}

impl SliceFilter {
    pub fn matches(&self, slice: &CostSlice) -> bool {
        slice.key.matches(
            self.company.as_deref(),
            self.project.as_deref(),
            self.row.as_deref(),
        ) && self
            .column
            .as_deref()
            .map_or(true, |c| c.trim() == slice.column)
    }
}

/// All non-empty slices, ordered by group key then column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostReport {
    pub slices: Vec<CostSlice>,
}

impl CostReport {
    pub fn select<'a>(&'a self, filter: &'a SliceFilter) -> impl Iterator<Item = &'a CostSlice> {
        self.slices.iter().filter(move |slice| filter.matches(slice))
    }
}

/// Service turning flat cost records into per-column cost trees.
pub struct CostTreeService {
    fs: Arc<dyn FileSystem>,
    options: ReportOptions,
}

impl CostTreeService {
    /// Create a new cost tree service.
    pub fn new(fs: Arc<dyn FileSystem>, options: ReportOptions) -> Self {
        Self { fs, options }
    }

    /// Load tree records from a JSON array.
    #[instrument(level = "debug", skip(self))]
    pub fn load_records(&self, path: &Path) -> ApplicationResult<Vec<TreeRecord>> {
        let content = self.fs.read_to_string(path).with_path_context("read records", path)?;
        let records: Vec<TreeRecord> = serde_json::from_str(&content).with_parse_context(path)?;
        debug!("loaded {} record(s) from {}", records.len(), path.display());
        Ok(records)
    }

    /// Load detail rows from a JSON array.
    #[instrument(level = "debug", skip(self))]
    pub fn load_details(&self, path: &Path) -> ApplicationResult<Vec<DetailRecord>> {
        let content = self.fs.read_to_string(path).with_path_context("read details", path)?;
        let details: Vec<DetailRecord> = serde_json::from_str(&content).with_parse_context(path)?;
        debug!("loaded {} detail row(s) from {}", details.len(), path.display());
        Ok(details)
    }

    /// Leaf columns observed per group.
    pub fn columns(&self, records: &[TreeRecord]) -> BTreeMap<GroupKey, BTreeSet<String>> {
        group_records(records)
            .into_iter()
            .map(|(key, group)| {
                let forest = ForestBuilder::new().build(&group);
                (key, forest.leaf_columns())
            })
            .collect()
    }

    /// Build every non-empty slice of every group.
    ///
    /// Groups are independent and processed in parallel when enabled; the
    /// output order does not depend on scheduling.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build_report(&self, records: &[TreeRecord]) -> CostReport {
        let groups: Vec<(GroupKey, Vec<TreeRecord>)> = group_records(records).into_iter().collect();
        let options = self.options;

        let per_group: Vec<Vec<CostSlice>> = if options.parallel {
            groups
                .into_par_iter()
                .map(|(key, group)| build_group(key, &group, options))
                .collect()
        } else {
            groups
                .into_iter()
                .map(|(key, group)| build_group(key, &group, options))
                .collect()
        };

        let slices: Vec<CostSlice> = per_group.into_iter().flatten().collect();
        info!("report: {} slice(s)", slices.len());
        CostReport { slices }
    }
}

fn build_group(key: GroupKey, records: &[TreeRecord], options: ReportOptions) -> Vec<CostSlice> {
    let forest = ForestBuilder::new().build(records);
    purge_all(&forest, options.zero_totals, options.parallel)
        .into_iter()
        .filter(|(column, roots)| {
            if roots.is_empty() {
                debug!("{}: no data for column {:?}", key, column);
            }
            !roots.is_empty()
        })
        .map(|(column, roots)| CostSlice::new(key.clone(), column, roots))
        .collect()
}
