//! Planner Configuration - data sources, dataset schema, model and unit tuning
//!
//! Every section implements `Default` so the planner runs with no config file
//! against the bundled `data/` directory.

use crate::forecast::normalizer::default_unit_table;
use crate::forecast::{ForestParams, UnitSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SAVE_SERVE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "save_serve.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `ServeConfig::load()` which searches:
/// 1. `$SAVE_SERVE_CONFIG` env var
/// 2. `./save_serve.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Input file locations
    #[serde(default)]
    pub data: DataConfig,

    /// Food log schema
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Per-item forest hyperparameters
    #[serde(default)]
    pub forest: ForestParams,

    /// Display unit per item; unlisted items are shown in kg
    #[serde(default = "default_unit_table")]
    pub units: HashMap<String, UnitSpec>,

    /// HTTP API
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            dataset: DatasetConfig::default(),
            forest: ForestParams::default(),
            units: default_unit_table(),
            server: ServerConfig::default(),
        }
    }
}

impl ServeConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SAVE_SERVE_CONFIG` environment variable
    /// 2. `./save_serve.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that exists but fails to parse or validate is an error; only a
    /// missing file falls through to the next source.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                let config = Self::load_from_file(&p)?;
                info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV_VAR);
                return Ok(config);
            }
            warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            let config = Self::load_from_file(&local)?;
            info!("Loaded config from ./{}", LOCAL_CONFIG_FILE);
            return Ok(config);
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings with a suggestion, never rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check every section, collecting all violations before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let f = &self.forest;
        if f.n_trees == 0 {
            errors.push("forest.n_trees must be > 0".to_string());
        }
        if f.min_samples_split < 2 {
            errors.push(format!(
                "forest.min_samples_split ({}) must be >= 2",
                f.min_samples_split
            ));
        }
        if f.min_samples_leaf == 0 {
            errors.push("forest.min_samples_leaf must be >= 1".to_string());
        }
        if f.max_depth == Some(0) {
            errors.push("forest.max_depth must be >= 1 when set".to_string());
        }

        let d = &self.dataset;
        if d.day_column.trim().is_empty() {
            errors.push("dataset.day_column must not be empty".to_string());
        }
        if d.slot_column.trim().is_empty() {
            errors.push("dataset.slot_column must not be empty".to_string());
        }
        if d.day_column == d.slot_column {
            errors.push(format!(
                "dataset.day_column and dataset.slot_column are both '{}'",
                d.day_column
            ));
        }
        for item in &d.items {
            if item == &d.day_column || item == &d.slot_column {
                errors.push(format!("dataset.items lists context column '{item}'"));
            }
        }

        let mut unit_items: Vec<&String> = self.units.keys().collect();
        unit_items.sort();
        for item in unit_items {
            let spec = &self.units[item];
            if spec.unit.trim().is_empty() {
                errors.push(format!("units.{item}.unit must not be empty"));
            }
            if !spec.scale.is_finite() || spec.scale <= 0.0 {
                errors.push(format!(
                    "units.{item}.scale ({}) must be a positive number",
                    spec.scale
                ));
            }
        }

        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr '{}' is not a valid HOST:PORT socket address",
                self.server.addr
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Data Sources
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Historical food log: one row per (day, slot) observation
    #[serde(default = "default_food_logs")]
    pub food_logs: PathBuf,

    /// Donation centers: name, accepted foods, contact, capacity
    #[serde(default = "default_centers")]
    pub centers: PathBuf,

    /// Restaurant to center distances
    #[serde(default = "default_distances")]
    pub distances: PathBuf,
}

fn default_food_logs() -> PathBuf {
    PathBuf::from("data/food_logs.csv")
}
fn default_centers() -> PathBuf {
    PathBuf::from("data/donation_centers.csv")
}
fn default_distances() -> PathBuf {
    PathBuf::from("data/restaurant_center_distances.csv")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            food_logs: default_food_logs(),
            centers: default_centers(),
            distances: default_distances(),
        }
    }
}

// ============================================================================
// Dataset Schema
// ============================================================================

/// How food log columns map onto the model.
///
/// With `items` empty every non-context column is a food item. With `items`
/// listed the item set is frozen to exactly those columns and any other
/// column is rejected (or skipped with a warning when
/// `ignore_unexpected_columns` is set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_day_column")]
    pub day_column: String,

    #[serde(default = "default_slot_column")]
    pub slot_column: String,

    #[serde(default)]
    pub items: Vec<String>,

    #[serde(default)]
    pub ignore_unexpected_columns: bool,
}

fn default_day_column() -> String {
    "Day".to_string()
}

fn default_slot_column() -> String {
    "TimeSlot".to_string()
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            day_column: default_day_column(),
            slot_column: default_slot_column(),
            items: Vec::new(),
            ignore_unexpected_columns: false,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}
