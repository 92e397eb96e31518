//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/costtree/costtree.toml`
//! 3. Local config: `<dir>/.costtree.toml` (working directory by default)
//! 4. Environment variables: `COSTTREE_*` prefix

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{expand_env_vars, ZeroTotals};

/// How slices are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented tree with values
    #[default]
    Tree,
    /// Treemap nodes as JSON
    Json,
    /// Root-to-leaf routes with accumulated totals
    Routes,
    /// One row of levels per branch
    Flat,
    /// Parallel id/parent/value columns
    Table,
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub zero_totals: Option<ZeroTotals>,
    pub parallel: Option<bool>,
    pub format: Option<OutputFormat>,
    pub data_dir: Option<PathBuf>,
    pub max_levels: Option<usize>,
}

/// Unified configuration for costtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Whether internal nodes whose children cancel out are pruned
    pub zero_totals: ZeroTotals,
    /// Process groups and columns on the rayon pool
    pub parallel: bool,
    /// Default output format
    pub format: OutputFormat,
    /// Directory against which relative input paths are resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Row width for the flat branch format
    pub max_levels: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zero_totals: ZeroTotals::Prune,
            parallel: true,
            format: OutputFormat::Tree,
            data_dir: None,
            max_levels: 10,
        }
    }
}

/// Get the XDG config directory for costtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "costtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("costtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".costtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Resolve an input path: expand `~`/`$VAR`, then join relative paths
    /// onto `data_dir` when one is configured.
    pub fn resolve_input(&self, path: &Path) -> PathBuf {
        let expanded = PathBuf::from(expand_env_vars(path.to_string_lossy().as_ref()));
        match &self.data_dir {
            Some(dir) if expanded.is_relative() => dir.join(expanded),
            _ => expanded,
        }
    }

    fn expand_paths(&mut self) {
        if let Some(dir) = &self.data_dir {
            self.data_dir = Some(PathBuf::from(expand_env_vars(dir.to_string_lossy().as_ref())));
        }
    }

    /// Overlay wins field by field where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            zero_totals: overlay.zero_totals.unwrap_or(self.zero_totals),
            parallel: overlay.parallel.unwrap_or(self.parallel),
            format: overlay.format.unwrap_or(self.format),
            data_dir: overlay.data_dir.clone().or_else(|| self.data_dir.clone()),
            max_levels: overlay.max_levels.unwrap_or(self.max_levels),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory holding `.costtree.toml`; the working
    ///   directory when `None`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        let local_dir = match local_dir {
            Some(dir) => Some(dir.to_path_buf()),
            None => std::env::current_dir().ok(),
        };
        if let Some(dir) = local_dir {
            let local_path = local_config_path(&dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply COSTTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("COSTTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        let raw = RawSettings {
            zero_totals: config.get::<ZeroTotals>("zero_totals").ok(),
            parallel: config.get_bool("parallel").ok(),
            format: config.get::<OutputFormat>("format").ok(),
            data_dir: config.get_string("data_dir").ok().map(PathBuf::from),
            max_levels: config
                .get_int("max_levels")
                .ok()
                .and_then(|n| usize::try_from(n).ok()),
        };
        Ok(settings.merge_with(&raw))
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# costtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/costtree/costtree.toml
#   Local:  ./.costtree.toml
#   Env:    COSTTREE_* environment variables

# Internal nodes whose children cancel out to 0: "prune" or "retain"
# zero_totals = "prune"

# Build groups and columns in parallel
# parallel = true

# Default output: "tree", "json", "routes", "flat" or "table"
# format = "tree"

# Resolve relative input files against this directory
# data_dir = "~/reports"

# Row width of the flat format
# max_levels = 10
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_prune_zero_totals() {
        let settings = Settings::default();
        assert_eq!(settings.zero_totals, ZeroTotals::Prune);
        assert!(settings.parallel);
        assert_eq!(settings.max_levels, 10);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_only_given_fields_change() {
        let overlay = RawSettings {
            zero_totals: Some(ZeroTotals::Retain),
            ..RawSettings::default()
        };
        let merged = Settings::default().merge_with(&overlay);
        assert_eq!(merged.zero_totals, ZeroTotals::Retain);
        assert_eq!(merged.format, OutputFormat::Tree);
    }

    #[test]
    fn given_data_dir_when_resolving_relative_input_then_joined() {
        let settings = Settings {
            data_dir: Some(PathBuf::from("/data")),
            ..Settings::default()
        };
        assert_eq!(
            settings.resolve_input(Path::new("tree.json")),
            PathBuf::from("/data/tree.json")
        );
        assert_eq!(
            settings.resolve_input(Path::new("/abs/tree.json")),
            PathBuf::from("/abs/tree.json")
        );
    }

    #[test]
    fn given_template_when_parsed_then_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("parse template");
        assert!(raw.zero_totals.is_none());
    }
}
