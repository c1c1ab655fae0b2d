//! Donation Planner
//!
//! Ties the pieces together for one request:
//!
//! ```text
//! (day, slot) labels --encode--> codes --forest--> raw forecast
//!     --normalize--> display quantity --allocate over eligible centers--> plan
//! ```
//!
//! The planner is built once at startup and is read-only afterwards, so the
//! CLI and every API handler share one instance behind an `Arc`.

use crate::config::ServeConfig;
use crate::dataset::{DatasetError, ObservationTable};
use crate::donation::{
    allocate, AcceptanceMatcher, AllocationPlan, CenterDirectory, DirectoryError, PlanWarning,
    WordBoundaryMatcher,
};
use crate::forecast::{Forecast, ForecastError, PredictorBank, QuantityNormalizer, UnitSpec};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

// ============================================================================
// Error Types
// ============================================================================

/// Failures while building the planner at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Food log: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Donation centers: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Training: {0}")]
    Forecast(#[from] ForecastError),
}

/// Failures of a single planning request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("Unknown restaurant: {0}")]
    UnknownRestaurant(String),

    #[error("Select at least one food item")]
    NoItemsSelected,
}

// ============================================================================
// Request / Report Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub restaurant: String,
    pub day: String,
    pub slot: String,
    pub items: Vec<String>,
}

/// Forecast and allocation for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub item: String,
    /// Raw model output in the dataset's base unit
    pub forecast: Forecast,
    /// Display quantity in `unit`
    pub quantity: u64,
    pub unit: String,
    pub plan: AllocationPlan,
    pub warning: Option<PlanWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    pub restaurant: String,
    pub day: String,
    pub slot: String,
    pub items: Vec<ItemReport>,
}

impl PlanReport {
    pub fn warnings(&self) -> impl Iterator<Item = (&str, PlanWarning)> {
        self.items
            .iter()
            .filter_map(|r| r.warning.map(|w| (r.item.as_str(), w)))
    }
}

/// Everything a front end needs to build its selection widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerOptions {
    pub restaurants: Vec<String>,
    pub days: Vec<String>,
    pub slots: Vec<String>,
    pub items: Vec<String>,
}

// ============================================================================
// Planner
// ============================================================================

pub struct DonationPlanner {
    bank: PredictorBank,
    normalizer: QuantityNormalizer,
    directory: CenterDirectory,
    matcher: Box<dyn AcceptanceMatcher>,
}

impl DonationPlanner {
    pub fn new(
        bank: PredictorBank,
        units: HashMap<String, UnitSpec>,
        directory: CenterDirectory,
        matcher: Box<dyn AcceptanceMatcher>,
    ) -> Self {
        let normalizer = QuantityNormalizer::new(units, bank.items());
        Self {
            bank,
            normalizer,
            directory,
            matcher,
        }
    }

    /// Load the food log and center tables named in `config`, then train.
    pub fn from_config(config: &ServeConfig) -> Result<Self, LoadError> {
        let log = ObservationTable::load(&config.data.food_logs, &config.dataset)?;
        let bank = PredictorBank::train(&log, &config.forest)?;
        let directory = CenterDirectory::load(&config.data.centers, &config.data.distances)?;
        Ok(Self::new(
            bank,
            config.units.clone(),
            directory,
            Box::new(WordBoundaryMatcher),
        ))
    }

    pub fn bank(&self) -> &PredictorBank {
        &self.bank
    }

    pub fn directory(&self) -> &CenterDirectory {
        &self.directory
    }

    pub fn options(&self) -> PlannerOptions {
        PlannerOptions {
            restaurants: self
                .directory
                .restaurants()
                .into_iter()
                .map(str::to_string)
                .collect(),
            days: self.bank.day_classes().to_vec(),
            slots: self.bank.slot_classes().to_vec(),
            items: self.bank.items().map(str::to_string).collect(),
        }
    }

    /// Run one request end to end.
    ///
    /// Repeated items are planned once. Any unknown label, item or restaurant
    /// fails the whole request; capacity shortfalls are reported per item.
    pub fn plan(&self, request: &PlanRequest) -> Result<PlanReport, PlanError> {
        let mut seen = HashSet::new();
        let items: Vec<&str> = request
            .items
            .iter()
            .map(|i| i.trim())
            .filter(|i| !i.is_empty() && seen.insert(*i))
            .collect();
        if items.is_empty() {
            return Err(PlanError::NoItemsSelected);
        }
        if !self.directory.has_restaurant(&request.restaurant) {
            return Err(PlanError::UnknownRestaurant(request.restaurant.clone()));
        }

        let day_code = self.bank.encode_day(&request.day)?;
        let slot_code = self.bank.encode_slot(&request.slot)?;

        info!(
            restaurant = %request.restaurant,
            day = %request.day,
            slot = %request.slot,
            items = items.len(),
            "Planning surplus donations"
        );

        let reports = items
            .into_iter()
            .map(|item| self.plan_item(&request.restaurant, day_code, slot_code, item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PlanReport {
            restaurant: request.restaurant.clone(),
            day: request.day.clone(),
            slot: request.slot.clone(),
            items: reports,
        })
    }

    /// Forecast, normalize and allocate a single item.
    pub fn plan_item(
        &self,
        restaurant: &str,
        day_code: usize,
        slot_code: usize,
        item: &str,
    ) -> Result<ItemReport, PlanError> {
        let forecast = self.bank.forecast(item, day_code, slot_code)?;
        let normalized = self.normalizer.normalize(item, forecast.quantity)?;
        let eligible = self
            .directory
            .eligible_centers(restaurant, item, self.matcher.as_ref());
        let plan = allocate(normalized.quantity, &eligible);
        let warning = plan.warning();

        debug!(
            item = %item,
            raw = forecast.quantity,
            quantity = normalized.quantity,
            unit = %normalized.unit,
            eligible = eligible.len(),
            sent = plan.total_sent(),
            leftover = plan.leftover,
            "Item planned"
        );
        if let Some(w) = warning {
            info!(item = %item, "{}", w);
        }

        Ok(ItemReport {
            item: item.to_string(),
            forecast,
            quantity: normalized.quantity,
            unit: normalized.unit,
            plan,
            warning,
        })
    }
}
