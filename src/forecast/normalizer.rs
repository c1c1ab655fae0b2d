//! Display quantity normalization.
//!
//! Forecasts come out of the model in the dataset's base unit. Countable items
//! (chapati, papad, bowls of curd, ...) are shown in their serving unit by
//! multiplying with a per-item scale, then rounding to a whole number.
//!
//! Rounding policy: negative and NaN raw values clamp to zero first, then the
//! scaled value is rounded half away from zero (`2.5 -> 3`).

use super::ForecastError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Unit used for items that have no entry in the unit table.
pub const DEFAULT_UNIT: &str = "kg";
pub const DEFAULT_SCALE: f64 = 1.0;

/// Display unit and scale factor for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub unit: String,
    pub scale: f64,
}

impl UnitSpec {
    pub fn new(unit: &str, scale: f64) -> Self {
        Self {
            unit: unit.to_string(),
            scale,
        }
    }
}

impl Default for UnitSpec {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT, DEFAULT_SCALE)
    }
}

/// Built-in unit table for the common countable dishes.
pub fn default_unit_table() -> HashMap<String, UnitSpec> {
    [
        ("Papad", UnitSpec::new("pcs", 30.0)),
        ("Chapati", UnitSpec::new("pcs", 50.0)),
        ("Raita", UnitSpec::new("bowls", 20.0)),
        ("Curd", UnitSpec::new("bowls", 15.0)),
        ("Salad", UnitSpec::new("plates", 20.0)),
        ("Pickle", UnitSpec::new("pcs", 25.0)),
    ]
    .into_iter()
    .map(|(item, spec)| (item.to_string(), spec))
    .collect()
}

/// A forecast expressed in the item's display unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedQuantity {
    pub quantity: u64,
    pub unit: String,
}

/// Converts raw forecasts into display quantities for a frozen item set.
#[derive(Debug, Clone)]
pub struct QuantityNormalizer {
    units: HashMap<String, UnitSpec>,
    known_items: BTreeSet<String>,
}

impl QuantityNormalizer {
    pub fn new<I, S>(units: HashMap<String, UnitSpec>, known_items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            units,
            known_items: known_items.into_iter().map(Into::into).collect(),
        }
    }

    /// Unit spec for `item`, falling back to kg x1.
    pub fn unit_for(&self, item: &str) -> Result<UnitSpec, ForecastError> {
        if !self.known_items.contains(item) {
            return Err(ForecastError::UnknownItem(item.to_string()));
        }
        Ok(self.units.get(item).cloned().unwrap_or_default())
    }

    pub fn normalize(
        &self,
        item: &str,
        raw_quantity: f64,
    ) -> Result<NormalizedQuantity, ForecastError> {
        let spec = self.unit_for(item)?;
        Ok(NormalizedQuantity {
            quantity: scale_and_round(raw_quantity, spec.scale),
            unit: spec.unit,
        })
    }
}

/// Clamp to non-negative, scale, round half away from zero.
pub fn scale_and_round(raw_quantity: f64, scale: f64) -> u64 {
    let clamped = if raw_quantity.is_nan() || raw_quantity < 0.0 {
        0.0
    } else {
        raw_quantity
    };
    let scaled = (clamped * scale).round();
    if scaled > 0.0 {
        // Float-to-int `as` saturates at u64::MAX
        scaled as u64
    } else {
        0
    }
}
