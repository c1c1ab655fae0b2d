//! Bootstrap-aggregated regression forest.
//!
//! Each tree draws its bootstrap sample from its own `StdRng` seeded with
//! `seed + tree_index`, so a forest is reproducible for a fixed seed no matter
//! how rayon schedules the tree fits.

use super::tree::{FeatureRow, RegressionTree, TreeParams};
use super::ForecastError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Forest hyperparameters (the `[forest]` config section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in each item's forest
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Maximum tree depth (omit for unlimited)
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Minimum samples a node needs before it may split
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    /// Minimum samples on each side of a split
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    /// Draw a bootstrap sample per tree (false = every tree sees all rows)
    #[serde(default = "default_bootstrap")]
    pub bootstrap: bool,

    /// Base RNG seed; tree `i` uses `seed + i`
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_n_trees() -> usize {
    100
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_bootstrap() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            bootstrap: default_bootstrap(),
            seed: default_seed(),
        }
    }
}

impl ForestParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

/// Ensemble of regression trees; prediction is the mean over trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn fit(x: &[FeatureRow], y: &[f64], params: &ForestParams) -> Result<Self, ForecastError> {
        if x.is_empty() {
            return Err(ForecastError::EmptyDataset("no rows to fit".to_string()));
        }
        if x.len() != y.len() {
            return Err(ForecastError::EmptyDataset(format!(
                "{} feature rows but {} targets",
                x.len(),
                y.len()
            )));
        }

        let n = x.len();
        let tree_params = params.tree_params();
        let n_trees = params.n_trees.max(1);

        let trees: Vec<RegressionTree> = (0..n_trees)
            .into_par_iter()
            .map(|t| {
                let sample: Vec<usize> = if params.bootstrap {
                    let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(x, y, &sample, &tree_params)
            })
            .collect();

        Ok(Self { trees })
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    /// Standard deviation of the individual tree predictions.
    ///
    /// Zero for single-tree forests.
    pub fn spread(&self, row: &FeatureRow) -> f64 {
        if self.trees.len() < 2 {
            return 0.0;
        }
        let per_tree: Vec<f64> = self.trees.iter().map(|t| t.predict(row)).collect();
        let sd = per_tree.iter().std_dev();
        if sd.is_finite() { sd } else { 0.0 }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Deepest tree in the forest.
    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(RegressionTree::depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> (Vec<FeatureRow>, Vec<f64>) {
        // 3 days x 2 slots, 4 observations each with mild noise
        let mut x = Vec::new();
        let mut y = Vec::new();
        for day in 0..3 {
            for slot in 0..2 {
                let base = 2.0 + day as f64 * 3.0 + slot as f64 * 10.0;
                for k in 0..4 {
                    x.push([day as f64, slot as f64]);
                    y.push(base + (k as f64 - 1.5) * 0.2);
                }
            }
        }
        (x, y)
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (x, y) = grid();
        let params = ForestParams {
            n_trees: 25,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&x, &y, &params).unwrap();
        let b = RandomForest::fit(&x, &y, &params).unwrap();
        for day in 0..3 {
            for slot in 0..2 {
                let row = [day as f64, slot as f64];
                assert_eq!(a.predict(&row), b.predict(&row));
                assert_eq!(a.spread(&row), b.spread(&row));
            }
        }
    }

    #[test]
    fn test_repeated_predict_is_stable() {
        let (x, y) = grid();
        let forest = RandomForest::fit(&x, &y, &ForestParams::default()).unwrap();
        let first = forest.predict(&[1.0, 1.0]);
        for _ in 0..10 {
            assert_eq!(forest.predict(&[1.0, 1.0]), first);
        }
    }

    #[test]
    fn test_forest_tracks_cell_means() {
        let (x, y) = grid();
        let forest = RandomForest::fit(&x, &y, &ForestParams::default()).unwrap();
        // Cell (2, 1) mean is 2 + 6 + 10 = 18
        let p = forest.predict(&[2.0, 1.0]);
        assert!((p - 18.0).abs() < 1.5, "expected ~18, got {p}");
    }

    #[test]
    fn test_without_bootstrap_trees_are_exact() {
        let (x, y) = grid();
        let params = ForestParams {
            n_trees: 3,
            bootstrap: false,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &y, &params).unwrap();
        assert!((forest.predict(&[0.0, 0.0]) - 2.0).abs() < 1e-9);
        assert!(forest.spread(&[0.0, 0.0]).abs() < 1e-9);
    }

    #[test]
    fn test_constant_target_predicts_exact_value() {
        let (x, _) = grid();
        let y = vec![4.0; x.len()];
        let forest = RandomForest::fit(&x, &y, &ForestParams::default()).unwrap();
        assert_eq!(forest.predict(&[1.0, 0.0]), 4.0);
        assert_eq!(forest.spread(&[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_non_negative_targets_give_non_negative_predictions() {
        let (x, mut y) = grid();
        y.iter_mut().step_by(3).for_each(|v| *v = 0.0);
        let forest = RandomForest::fit(&x, &y, &ForestParams::default()).unwrap();
        for day in 0..3 {
            for slot in 0..2 {
                assert!(forest.predict(&[day as f64, slot as f64]) >= 0.0);
            }
        }
    }

    #[test]
    fn test_empty_rows_rejected() {
        let result = RandomForest::fit(&[], &[], &ForestParams::default());
        assert!(matches!(result, Err(ForecastError::EmptyDataset(_))));
    }

    #[test]
    fn test_tree_count_matches_params() {
        let (x, y) = grid();
        let params = ForestParams {
            n_trees: 7,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &y, &params).unwrap();
        assert_eq!(forest.tree_count(), 7);
        assert!(forest.max_depth() >= 1);
    }
}
