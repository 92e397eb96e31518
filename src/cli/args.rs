//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::application::services::SliceFilter;
use crate::config::OutputFormat;

/// Rebuild hierarchical cost forests from flat rows, then prune and aggregate them per column
#[derive(Parser, Debug)]
#[command(name = "costtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Directory holding a local .costtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List groups and the columns observed on their leaves
    Columns {
        /// Tree records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        records: PathBuf,
    },

    /// Show purged cost trees
    Tree {
        /// Tree records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        records: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output format (default from settings)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List leaf item identifiers per slice
    Leaves {
        /// Tree records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        records: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show detail rows for the leaves of each slice
    Details {
        /// Tree records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        records: PathBuf,
        /// Item detail table (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        details: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Print a commented template
    Template,
    /// Show config file locations
    Path,
}

/// Slice selection shared by the reporting commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Company
    #[arg(long)]
    pub company: Option<String>,
    /// Project
    #[arg(long)]
    pub project: Option<String>,
    /// Row label
    #[arg(long)]
    pub row: Option<String>,
    /// Column label
    #[arg(long)]
    pub column: Option<String>,
}

impl From<&FilterArgs> for SliceFilter {
    fn from(args: &FilterArgs) -> Self {
        Self {
            company: args.company.clone(),
            project: args.project.clone(),
            row: args.row.clone(),
            column: args.column.clone(),
        }
    }
}
