//! Command dispatch and handlers

use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::{CostReport, CostSlice, SliceFilter};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, FilterArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, OutputFormat, Settings};
use crate::domain::{flatten_branches, TreeNodeConvert, TreeRecord, TreemapTable};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute the CLI command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config_dir.as_deref())?;
    debug!("settings: {:?}", settings);
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Some(Commands::Columns { records }) => cmd_columns(&container, records),
        Some(Commands::Tree {
            records,
            filter,
            format,
        }) => {
            let format = format.unwrap_or(container.settings.format);
            cmd_tree(&container, records, filter, format)
        }
        Some(Commands::Leaves { records, filter }) => cmd_leaves(&container, records, filter),
        Some(Commands::Details {
            records,
            details,
            filter,
        }) => cmd_details(&container, records, details, filter),
        Some(Commands::Config { command }) => cmd_config(&container, command, cli),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "costtree", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `costtree --help`".to_string(),
        )),
    }
}

fn load_records(container: &ServiceContainer, path: &Path) -> CliResult<Vec<TreeRecord>> {
    let path = container.settings.resolve_input(path);
    Ok(container.reports.load_records(&path)?)
}

fn load_report(container: &ServiceContainer, path: &Path) -> CliResult<CostReport> {
    let records = load_records(container, path)?;
    Ok(container.reports.build_report(&records))
}

/// Slices matching the filter; an empty selection is reported, not an error.
fn selected<'a>(report: &'a CostReport, filter: &'a SliceFilter) -> Vec<&'a CostSlice> {
    let slices: Vec<&CostSlice> = report.select(filter).collect();
    if slices.is_empty() {
        output::warning("no slice matches the given filter");
    }
    slices
}

fn slice_header(slice: &CostSlice) {
    output::header(&format!(
        "{} :: {}  (total {})",
        slice.key, slice.column, slice.total
    ));
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        ApplicationError::OperationFailed {
            context: "serialize output".to_string(),
            source: Box::new(e),
        }
    })?;
    let mut out = io::stdout().lock();
    writeln!(out, "{json}").map_err(|e| InfraError::io("write output", e))?;
    Ok(())
}

// ============================================================
// Report commands
// ============================================================

#[instrument(skip(container))]
fn cmd_columns(container: &ServiceContainer, records: &Path) -> CliResult<()> {
    let records = load_records(container, records)?;
    for (key, columns) in container.reports.columns(&records) {
        output::action(&key.to_string(), &columns.iter().join(", "));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(
    container: &ServiceContainer,
    records: &Path,
    filter: &FilterArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let report = load_report(container, records)?;
    let filter = SliceFilter::from(filter);
    let slices = selected(&report, &filter);

    let render: fn(&CostSlice, usize) = match format {
        OutputFormat::Json => return write_json(&slices),
        OutputFormat::Tree => render_tree,
        OutputFormat::Routes => render_routes,
        OutputFormat::Flat => render_flat,
        OutputFormat::Table => render_table,
    };

    for slice in slices {
        slice_header(slice);
        render(slice, container.settings.max_levels);
    }
    Ok(())
}

fn render_tree(slice: &CostSlice, _max_levels: usize) {
    for root in &slice.treemap {
        output::info(&root.to_tree_string());
    }
}

fn render_routes(slice: &CostSlice, _max_levels: usize) {
    for route in slice.routes() {
        output::detail(&route);
    }
}

fn render_flat(slice: &CostSlice, max_levels: usize) {
    for root in &slice.roots {
        for row in flatten_branches(root, max_levels) {
            let cells = row
                .iter()
                .map(|level| level.map_or_else(|| "-".to_string(), |l| l.to_string()))
                .join("\t");
            output::detail(&cells);
        }
    }
}

fn render_table(slice: &CostSlice, _max_levels: usize) {
    let table = TreemapTable::from_roots(&slice.treemap);
    for ((id, parent), value) in table.ids.iter().zip(&table.parents).zip(&table.values) {
        output::detail(&format!("{id}\t{parent}\t{value}"));
    }
}

#[instrument(skip(container))]
fn cmd_leaves(container: &ServiceContainer, records: &Path, filter: &FilterArgs) -> CliResult<()> {
    let report = load_report(container, records)?;
    let filter = SliceFilter::from(filter);
    for slice in selected(&report, &filter) {
        slice_header(slice);
        for item in &slice.leaves {
            output::detail(item);
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_details(
    container: &ServiceContainer,
    records: &Path,
    details: &Path,
    filter: &FilterArgs,
) -> CliResult<()> {
    let report = load_report(container, records)?;
    let details_path = container.settings.resolve_input(details);
    let details = container.reports.load_details(&details_path)?;
    let filter = SliceFilter::from(filter);

    #[derive(Serialize)]
    struct SliceDetails<'a> {
        company: &'a str,
        project: &'a str,
        row: &'a str,
        column: &'a str,
        rows: Vec<&'a crate::domain::DetailRecord>,
    }

    let out: Vec<SliceDetails> = selected(&report, &filter)
        .into_iter()
        .map(|slice| SliceDetails {
            company: &slice.key.company,
            project: &slice.key.project,
            row: &slice.key.row,
            column: &slice.column,
            rows: slice.details(&details),
        })
        .collect();
    write_json(&out)
}

// ============================================================
// Config commands
// ============================================================

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands, cli: &Cli) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::action("global", "(no home directory)"),
            }
            let local_dir = match &cli.config_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?,
            };
            output::action("local", &local_config_path(&local_dir).display());
        }
    }
    Ok(())
}
