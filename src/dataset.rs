//! Historical Food Log
//!
//! One observation per row: the day label, the time-slot label and the
//! surplus quantity observed for every food item. The item set is resolved
//! once from the header against the configured schema and frozen.

use crate::config::DatasetConfig;
use crate::tabular::{CsvError, CsvTable};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error("Column '{0}' appears more than once in the header")]
    DuplicateColumn(String),

    #[error("Unexpected column '{0}' (not in dataset.items)")]
    UnexpectedColumn(String),

    #[error("Column {0} has an empty name")]
    BlankColumnName(usize),

    #[error("Line {line}, column '{column}': invalid quantity '{value}' (expected a non-negative number)")]
    InvalidQuantity {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Line {line}: empty {column} label")]
    BlankLabel { line: usize, column: String },

    #[error("Observation has {found} quantities but the table has {expected} items")]
    QuantityCountMismatch { expected: usize, found: usize },
}

/// One historical (day, slot) observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub day: String,
    pub slot: String,
    /// One entry per item, in [`ObservationTable::items`] order
    pub quantities: Vec<f64>,
}

/// Validated food log ready for training.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    items: Vec<String>,
    rows: Vec<Observation>,
}

impl ObservationTable {
    /// Empty table with a fixed item set.
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append an observation; quantities must be finite and non-negative.
    pub fn push(
        &mut self,
        day: &str,
        slot: &str,
        quantities: Vec<f64>,
    ) -> Result<(), DatasetError> {
        if quantities.len() != self.items.len() {
            return Err(DatasetError::QuantityCountMismatch {
                expected: self.items.len(),
                found: quantities.len(),
            });
        }
        if let Some((idx, q)) = quantities
            .iter()
            .enumerate()
            .find(|(_, q)| !q.is_finite() || **q < 0.0)
        {
            return Err(DatasetError::InvalidQuantity {
                line: self.rows.len() + 1,
                column: self.items[idx].clone(),
                value: q.to_string(),
            });
        }
        self.rows.push(Observation {
            day: day.to_string(),
            slot: slot.to_string(),
            quantities,
        });
        Ok(())
    }

    /// Read and validate a food log CSV.
    pub fn load(path: &Path, schema: &DatasetConfig) -> Result<Self, DatasetError> {
        let table = CsvTable::read(path)?;
        let parsed = Self::from_csv(&table, schema)?;
        info!(
            path = %path.display(),
            rows = parsed.len(),
            items = parsed.items.len(),
            "Loaded food log"
        );
        Ok(parsed)
    }

    /// Resolve the schema against `table`'s header and parse every row.
    pub fn from_csv(table: &CsvTable, schema: &DatasetConfig) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for (i, h) in table.headers.iter().enumerate() {
            if h.is_empty() {
                return Err(DatasetError::BlankColumnName(i + 1));
            }
            if !seen.insert(h.as_str()) {
                return Err(DatasetError::DuplicateColumn(h.clone()));
            }
        }

        let day_idx = table.require_column(&schema.day_column)?;
        let slot_idx = table.require_column(&schema.slot_column)?;
        let item_columns = resolve_item_columns(table, schema, day_idx, slot_idx)?;

        let mut parsed = Self::new(item_columns.iter().map(|&i| table.headers[i].clone()));

        for row in &table.rows {
            let day = row.get(day_idx);
            let slot = row.get(slot_idx);
            for (label, column) in [(day, &schema.day_column), (slot, &schema.slot_column)] {
                if label.is_empty() {
                    return Err(DatasetError::BlankLabel {
                        line: row.line,
                        column: column.clone(),
                    });
                }
            }

            let mut quantities = Vec::with_capacity(item_columns.len());
            for &col in &item_columns {
                let raw = row.get(col);
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| DatasetError::InvalidQuantity {
                        line: row.line,
                        column: table.headers[col].clone(),
                        value: raw.to_string(),
                    })?;
                quantities.push(value);
            }

            parsed.rows.push(Observation {
                day: day.to_string(),
                slot: slot.to_string(),
                quantities,
            });
        }

        Ok(parsed)
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn day_labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.day.as_str())
    }

    pub fn slot_labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.slot.as_str())
    }

    /// Target column for one item.
    pub fn quantities(&self, item_idx: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r.quantities[item_idx]).collect()
    }
}

/// Column indices holding food item quantities, in header order.
fn resolve_item_columns(
    table: &CsvTable,
    schema: &DatasetConfig,
    day_idx: usize,
    slot_idx: usize,
) -> Result<Vec<usize>, DatasetError> {
    // Encoded copies of the context columns left behind by earlier tooling
    let reserved = [
        format!("{}_enc", schema.day_column),
        format!("{}_enc", schema.slot_column),
    ];

    if !schema.items.is_empty() {
        for item in &schema.items {
            table.require_column(item)?;
        }
    }

    let mut columns = Vec::new();
    for (idx, name) in table.headers.iter().enumerate() {
        if idx == day_idx || idx == slot_idx {
            continue;
        }
        if reserved.contains(name) {
            debug!(column = %name, "Skipping encoded context column");
            continue;
        }
        if schema.items.is_empty() || schema.items.contains(name) {
            columns.push(idx);
        } else if schema.ignore_unexpected_columns {
            warn!(column = %name, "Ignoring column not listed in dataset.items");
        } else {
            return Err(DatasetError::UnexpectedColumn(name.clone()));
        }
    }

    if schema.items.is_empty() {
        let names: Vec<&str> = columns.iter().map(|&i| table.headers[i].as_str()).collect();
        info!(
            items = %names.join(", "),
            "Discovered food item columns"
        );
    }

    Ok(columns)
}
