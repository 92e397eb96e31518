//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// One flat row of a cost breakdown, as delivered by the spreadsheet extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    #[serde(alias = "CIA", deserialize_with = "string_or_number")]
    pub company: String,
    #[serde(alias = "PRJID", deserialize_with = "string_or_number")]
    pub project: String,
    #[serde(alias = "ROW", deserialize_with = "string_or_number")]
    pub row: String,
    #[serde(alias = "COLUMN", deserialize_with = "string_or_number")]
    pub column: String,
    /// 1 = root level
    #[serde(alias = "LEVEL")]
    pub level: u32,
    /// Unique only within a level
    #[serde(alias = "NODE")]
    pub node: i64,
    /// 0 marks a root
    #[serde(alias = "NODEP")]
    pub parent: i64,
    /// Item identifier, may carry a `(TYPE)` suffix
    #[serde(alias = "ITMID", deserialize_with = "string_or_number")]
    pub item_id: String,
    #[serde(alias = "VALUE")]
    pub value: f64,
}

impl TreeRecord {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(&self.company, &self.project, &self.row)
    }

    pub fn node_key(&self) -> NodeKey {
        NodeKey::new(self.level, self.node)
    }

    /// Key of the parent node, `None` for roots.
    ///
    /// Parents live exactly one level up, which rules out cycles.
    pub fn parent_key(&self) -> Option<NodeKey> {
        if self.parent == 0 {
            None
        } else {
            Some(NodeKey::new(self.level.saturating_sub(1), self.parent))
        }
    }
}

/// Identifies one independent forest: (company, project, row-label).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub company: String,
    pub project: String,
    pub row: String,
}

impl GroupKey {
    /// Surrounding whitespace is not significant for grouping.
    pub fn new(company: &str, project: &str, row: &str) -> Self {
        Self {
            company: normalize(company),
            project: normalize(project),
            row: normalize(row),
        }
    }

    /// True if every given filter equals the corresponding component.
    pub fn matches(
        &self,
        company: Option<&str>,
        project: Option<&str>,
        row: Option<&str>,
    ) -> bool {
        company.map_or(true, |c| normalize(c) == self.company)
            && project.map_or(true, |p| normalize(p) == self.project)
            && row.map_or(true, |r| normalize(r) == self.row)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.company, self.project, self.row)
    }
}

/// Structural position of a node: node ids repeat across levels, so the
/// level is part of the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub level: u32,
    pub node: i64,
}

impl NodeKey {
    pub fn new(level: u32, node: i64) -> Self {
        Self { level, node }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.level, self.node)
    }
}

/// A row of the external item detail table.
///
/// Only the keys are interpreted; every other column is carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(alias = "CIA", deserialize_with = "string_or_number")]
    pub company: String,
    #[serde(alias = "PRJID", deserialize_with = "string_or_number")]
    pub project: String,
    #[serde(alias = "itm_id", alias = "ITMID", deserialize_with = "string_or_number")]
    pub item_id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Key columns arrive as text or as bare numbers; both compare as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!(
            "invalid key {other}, expected a string or number"
        ))),
    }
}

/// Trim surrounding whitespace from a key component.
pub fn normalize(value: &str) -> String {
    value.trim().to_string()
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
