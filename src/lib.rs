//! costtree: hierarchical cost trees from flat spreadsheet rows
//!
//! Layers:
//! - [`domain`]: grouping, forest reconstruction, purge/aggregation, treemap projection
//! - [`application`]: report orchestration and input loading
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: argument parsing and output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
