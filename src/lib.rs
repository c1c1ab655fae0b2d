//! Save & Serve: restaurant surplus forecasting and donation routing
//!
//! Predicts how much of each food item a restaurant will have left over for a
//! given day and time slot, then splits that surplus across nearby donation
//! centers that accept the item, nearest first.
//!
//! ## Architecture
//!
//! - **Forecast**: per-item random-forest regressors over (day, slot) codes,
//!   plus unit normalization for display
//! - **Donation**: center directory, acceptance matching, greedy allocation
//! - **Planner**: one request end to end, shared by the CLI and the HTTP API
//! - **API**: axum JSON endpoints over the planner

pub mod api;
pub mod config;
pub mod dataset;
pub mod donation;
pub mod forecast;
pub mod planner;
pub mod tabular;

// Re-export configuration
pub use config::{ConfigError, ServeConfig};

// Re-export forecasting components
pub use forecast::{Forecast, ForecastError, ForestParams, PredictorBank, QuantityNormalizer};

// Re-export donation routing
pub use donation::{allocate, AllocationPlan, CenterDirectory, EligibleCenter, PlanWarning};

// Re-export the planner
pub use planner::{DonationPlanner, PlanError, PlanReport, PlanRequest};
