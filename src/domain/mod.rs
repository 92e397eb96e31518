//! Domain layer: entities and the cost tree engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).
//!
//! Pipeline: records → [`group_records`] → [`ForestBuilder`] → [`purge`] →
//! [`project`] → [`leaf_item_ids`] → [`filter_details`].

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod grouper;
pub mod leaves;
pub mod purge;
pub mod routes;
pub mod treemap;

pub use arena::{Forest, ForestNode, NodeData};
pub use builder::{build_forest, BuildStats, ForestBuilder};
pub use entities::*;
pub use error::DomainError;
pub use grouper::{group_records, RecordGroups};
pub use leaves::{
    filter_details, filter_details_for, leaf_item_ids, leaf_item_ids_all, strip_type_suffix,
    LeafSet,
};
pub use purge::{purge, purge_all, PurgedNode, ZeroTotals};
pub use routes::{flatten_branches, leaf_routes, LeafRoute, RouteStep};
pub use treemap::{project, project_all, CompositeId, TreeNodeConvert, TreemapNode, TreemapTable};
