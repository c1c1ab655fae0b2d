//! Categorical label encoder.
//!
//! Codes are positions in the sorted set of distinct labels seen at fit time,
//! so the same training data always yields the same codes.

use super::ForecastError;
use std::collections::{BTreeSet, HashMap};

/// Bijective mapping between a fixed label vocabulary and `0..len()`.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    /// Vocabulary name used in error messages ("day", "time slot", ...)
    name: String,
    /// Labels in code order
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Build the vocabulary from every label in `labels`.
    ///
    /// Duplicates collapse; order is lexicographic on the label bytes.
    pub fn fit<I, S>(name: &str, labels: I) -> Result<Self, ForecastError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();

        if distinct.is_empty() {
            return Err(ForecastError::EmptyDataset(format!(
                "no {name} labels to fit"
            )));
        }

        let classes: Vec<String> = distinct.into_iter().collect();
        let index = Self::build_index(&classes);

        Ok(Self {
            name: name.to_string(),
            classes,
            index,
        })
    }

    fn build_index(classes: &[String]) -> HashMap<String, usize> {
        classes
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code))
            .collect()
    }

    pub fn encode(&self, label: &str) -> Result<usize, ForecastError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| ForecastError::UnknownLabel {
                vocabulary: self.name.clone(),
                label: label.to_string(),
                known: self.classes.join(", "),
            })
    }

    pub fn decode(&self, code: usize) -> Result<&str, ForecastError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| ForecastError::UnknownCode {
                vocabulary: self.name.clone(),
                code,
                size: self.classes.len(),
            })
    }

    /// Vocabulary in code order (index i = label with code i).
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
