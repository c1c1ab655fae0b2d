//! Surplus Forecast Engine
//!
//! Predicts how much of each food item a restaurant will have left over for a
//! given (day, time slot) context.
//!
//! ## Architecture
//! - `encoder`: Categorical label <-> dense integer code mapping
//! - `tree`: CART regression tree (variance-reduction splits)
//! - `forest`: Bootstrap-aggregated ensemble of regression trees
//! - `bank`: One forest per food item, plus the day/slot encoders
//! - `normalizer`: Raw prediction -> display quantity in the item's unit
//!
//! Everything in here is fitted once at startup and read-only afterwards.

pub mod bank;
pub mod encoder;
pub mod forest;
pub mod normalizer;
pub mod tree;

pub use bank::{Forecast, PredictorBank};
pub use encoder::LabelEncoder;
pub use forest::{ForestParams, RandomForest};
pub use normalizer::{NormalizedQuantity, QuantityNormalizer, UnitSpec};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForecastError {
    #[error("Unknown label '{label}' for {vocabulary} (known: {known})")]
    UnknownLabel {
        vocabulary: String,
        label: String,
        known: String,
    },

    #[error("Code {code} is outside the {vocabulary} vocabulary (size {size})")]
    UnknownCode {
        vocabulary: String,
        code: usize,
        size: usize,
    },

    #[error("Unknown food item: {0}")]
    UnknownItem(String),

    #[error("Cannot train on an empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Dataset has no food item columns")]
    NoFoodItems,
}
