//! Planner Configuration Module
//!
//! Data source paths, food log schema, forest hyperparameters, display units
//! and server address, loaded from a TOML file.
//!
//! ## Loading Order
//!
//! 1. `SAVE_SERVE_CONFIG` environment variable (path to TOML file)
//! 2. `save_serve.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! let config = ServeConfig::load()?;
//! let planner = DonationPlanner::from_config(&config)?;
//! ```
//!
//! The config is read once in `main` and handed to whatever needs it.

mod serve_config;
pub mod validation;

pub use serve_config::*;
