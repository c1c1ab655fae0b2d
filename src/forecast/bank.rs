//! Predictor Bank
//!
//! One random forest per food item, all sharing the day and slot encoders
//! fitted over the same food log. Built once with [`PredictorBank::train`],
//! then only read.

use super::encoder::LabelEncoder;
use super::forest::{ForestParams, RandomForest};
use super::tree::FeatureRow;
use super::ForecastError;
use crate::dataset::ObservationTable;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

/// Raw model output for one item in one (day, slot) context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    /// Mean of the per-tree predictions, in the dataset's base unit
    pub quantity: f64,
    /// Standard deviation across trees
    pub spread: f64,
}

#[derive(Debug, Clone)]
pub struct PredictorBank {
    day_encoder: LabelEncoder,
    slot_encoder: LabelEncoder,
    /// Item name -> forest; BTreeMap keeps item listings sorted
    models: BTreeMap<String, RandomForest>,
    training_rows: usize,
}

impl PredictorBank {
    /// Fit encoders and one forest per item column of `dataset`.
    pub fn train(dataset: &ObservationTable, params: &ForestParams) -> Result<Self, ForecastError> {
        if dataset.is_empty() {
            return Err(ForecastError::EmptyDataset(
                "food log has no observation rows".to_string(),
            ));
        }
        if dataset.items().is_empty() {
            return Err(ForecastError::NoFoodItems);
        }

        let started = Instant::now();
        let day_encoder = LabelEncoder::fit("day", dataset.day_labels())?;
        let slot_encoder = LabelEncoder::fit("time slot", dataset.slot_labels())?;

        let features: Vec<FeatureRow> = dataset
            .rows()
            .iter()
            .map(|row| {
                Ok([
                    day_encoder.encode(&row.day)? as f64,
                    slot_encoder.encode(&row.slot)? as f64,
                ])
            })
            .collect::<Result<_, ForecastError>>()?;

        let mut models = BTreeMap::new();
        for (idx, item) in dataset.items().iter().enumerate() {
            let target = dataset.quantities(idx);
            let forest = RandomForest::fit(&features, &target, params)?;
            debug!(
                item = %item,
                trees = forest.tree_count(),
                max_depth = forest.max_depth(),
                "Fitted item forest"
            );
            models.insert(item.clone(), forest);
        }

        info!(
            items = models.len(),
            rows = dataset.len(),
            days = day_encoder.len(),
            slots = slot_encoder.len(),
            trees_per_item = params.n_trees,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Predictor bank trained"
        );

        Ok(Self {
            day_encoder,
            slot_encoder,
            models,
            training_rows: dataset.len(),
        })
    }

    fn model(&self, item: &str) -> Result<&RandomForest, ForecastError> {
        self.models
            .get(item)
            .ok_or_else(|| ForecastError::UnknownItem(item.to_string()))
    }

    fn features(&self, day_code: usize, slot_code: usize) -> Result<FeatureRow, ForecastError> {
        // Validate both codes so callers cannot query outside the vocabulary
        self.day_encoder.decode(day_code)?;
        self.slot_encoder.decode(slot_code)?;
        Ok([day_code as f64, slot_code as f64])
    }

    /// Mean predicted quantity for `item`.
    pub fn predict(
        &self,
        item: &str,
        day_code: usize,
        slot_code: usize,
    ) -> Result<f64, ForecastError> {
        let model = self.model(item)?;
        Ok(model.predict(&self.features(day_code, slot_code)?))
    }

    /// Prediction together with the spread across trees.
    pub fn forecast(
        &self,
        item: &str,
        day_code: usize,
        slot_code: usize,
    ) -> Result<Forecast, ForecastError> {
        let model = self.model(item)?;
        let row = self.features(day_code, slot_code)?;
        Ok(Forecast {
            quantity: model.predict(&row),
            spread: model.spread(&row),
        })
    }

    pub fn encode_day(&self, label: &str) -> Result<usize, ForecastError> {
        self.day_encoder.encode(label)
    }

    pub fn encode_slot(&self, label: &str) -> Result<usize, ForecastError> {
        self.slot_encoder.encode(label)
    }

    pub fn day_encoder(&self) -> &LabelEncoder {
        &self.day_encoder
    }

    pub fn slot_encoder(&self) -> &LabelEncoder {
        &self.slot_encoder
    }

    /// Day labels in code order.
    pub fn day_classes(&self) -> &[String] {
        self.day_encoder.classes()
    }

    /// Slot labels in code order.
    pub fn slot_classes(&self) -> &[String] {
        self.slot_encoder.classes()
    }

    /// Trained item names, sorted.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn contains_item(&self, item: &str) -> bool {
        self.models.contains_key(item)
    }

    pub fn item_count(&self) -> usize {
        self.models.len()
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> ObservationTable {
        let mut table = ObservationTable::new(["Rice", "Chapati"]);
        for day in ["Monday", "Tuesday", "Wednesday"] {
            for slot in ["Lunch", "Dinner"] {
                for _ in 0..3 {
                    table.push(day, slot, vec![4.0, 2.0]).unwrap();
                }
            }
        }
        table
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 20,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_monday_lunch_scenario() {
        let bank = PredictorBank::train(&log(), &small_params()).unwrap();
        let day = bank.encode_day("Monday").unwrap();
        let slot = bank.encode_slot("Lunch").unwrap();
        assert_eq!(bank.predict("Rice", day, slot).unwrap(), 4.0);
        assert_eq!(bank.predict("Chapati", day, slot).unwrap(), 2.0);
    }

    #[test]
    fn test_item_set_frozen_from_dataset() {
        let bank = PredictorBank::train(&log(), &small_params()).unwrap();
        assert_eq!(bank.items().collect::<Vec<_>>(), vec!["Chapati", "Rice"]);
        assert!(bank.contains_item("Rice"));
        assert!(!bank.contains_item("Dal"));
        assert_eq!(bank.training_rows(), 18);
    }

    #[test]
    fn test_classes_in_code_order() {
        let bank = PredictorBank::train(&log(), &small_params()).unwrap();
        assert_eq!(bank.day_classes(), &["Monday", "Tuesday", "Wednesday"]);
        assert_eq!(bank.slot_classes(), &["Dinner", "Lunch"]);
    }

    #[test]
    fn test_unknown_item() {
        let bank = PredictorBank::train(&log(), &small_params()).unwrap();
        assert_eq!(
            bank.predict("Dal", 0, 0),
            Err(ForecastError::UnknownItem("Dal".to_string()))
        );
    }

    #[test]
    fn test_unknown_label() {
        let bank = PredictorBank::train(&log(), &small_params()).unwrap();
        assert!(matches!(
            bank.encode_day("Sunday"),
            Err(ForecastError::UnknownLabel { .. })
        ));
    }

    #[test]
    fn test_out_of_range_code() {
        let bank = PredictorBank::train(&log(), &small_params()).unwrap();
        assert!(matches!(
            bank.predict("Rice", 0, 2),
            Err(ForecastError::UnknownCode { code: 2, size: 2, .. })
        ));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let empty = ObservationTable::new(["Rice"]);
        assert!(matches!(
            PredictorBank::train(&empty, &small_params()),
            Err(ForecastError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_no_items_rejected() {
        let mut table = ObservationTable::new(Vec::<String>::new());
        table.push("Monday", "Lunch", vec![]).unwrap();
        assert_eq!(
            PredictorBank::train(&table, &small_params()).unwrap_err(),
            ForecastError::NoFoodItems
        );
    }

    #[test]
    fn test_retraining_with_same_seed_is_reproducible() {
        let mut table = ObservationTable::new(["Dal"]);
        for (i, day) in ["Friday", "Monday", "Sunday"].iter().enumerate() {
            for (j, slot) in ["Dinner", "Lunch"].iter().enumerate() {
                for k in 0..4 {
                    let q = 1.0 + i as f64 + 2.0 * j as f64 + 0.1 * k as f64;
                    table.push(day, slot, vec![q]).unwrap();
                }
            }
        }
        let a = PredictorBank::train(&table, &small_params()).unwrap();
        let b = PredictorBank::train(&table, &small_params()).unwrap();
        for d in 0..3 {
            for s in 0..2 {
                assert_eq!(a.forecast("Dal", d, s).unwrap(), b.forecast("Dal", d, s).unwrap());
            }
        }
    }
}
