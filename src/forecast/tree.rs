//! CART regression tree.
//!
//! Splits minimise the summed squared error of the two children (variance
//! reduction). Every feature is considered at every node; candidate
//! thresholds are midpoints between consecutive distinct feature values.
//! Leaves predict the mean target of the samples that reached them.

/// Number of model input features.
pub const NUM_FEATURES: usize = 2;

/// One model input: `[day_code, slot_code]` as floats.
pub type FeatureRow = [f64; NUM_FEATURES];

/// Minimum SSE improvement for a split to be worth keeping.
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Best split found for one node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// SSE(left) + SSE(right)
    child_sse: f64,
}

/// Fitted regression tree stored as a flat node arena (root at index 0).
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    depth: usize,
}

impl RegressionTree {
    /// Fit a tree on the rows of `x`/`y` listed in `sample`.
    ///
    /// `sample` may contain repeated indices (bootstrap draws); each
    /// repetition counts as one observation. An empty sample yields a single
    /// leaf predicting 0.
    pub fn fit(x: &[FeatureRow], y: &[f64], sample: &[usize], params: &TreeParams) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            depth: 0,
        };
        let mut indices = sample.to_vec();
        tree.grow(x, y, &mut indices, 0, params);
        tree
    }

    /// Grow the subtree for `indices`, returning its node id.
    fn grow(
        &mut self,
        x: &[FeatureRow],
        y: &[f64],
        indices: &mut [usize],
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        self.depth = self.depth.max(depth);
        let id = self.nodes.len();
        let value = mean_of(y, indices);
        self.nodes.push(Node::Leaf { value });

        let depth_exhausted = params.max_depth.is_some_and(|max| depth >= max);
        if depth_exhausted || indices.len() < params.min_samples_split {
            return id;
        }

        let parent_sse = sse_of(y, indices);
        if parent_sse <= MIN_IMPURITY_DECREASE {
            return id;
        }

        let Some(split) = best_split(x, y, indices, params.min_samples_leaf) else {
            return id;
        };
        if parent_sse - split.child_sse <= MIN_IMPURITY_DECREASE {
            return id;
        }

        // Partition in place: left = feature <= threshold
        let mut boundary = 0;
        for i in 0..indices.len() {
            if x[indices[i]][split.feature] <= split.threshold {
                indices.swap(i, boundary);
                boundary += 1;
            }
        }
        let (left_idx, right_idx) = indices.split_at_mut(boundary);

        let left = self.grow(x, y, left_idx, depth + 1, params);
        let right = self.grow(x, y, right_idx, depth + 1, params);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

fn mean_of(y: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn sse_of(y: &[f64], indices: &[usize]) -> f64 {
    let mean = mean_of(y, indices);
    indices.iter().map(|&i| (y[i] - mean).powi(2)).sum()
}

/// Scan every feature for the split with the lowest child SSE.
///
/// Ties keep the first candidate found (lower feature index, then lower
/// threshold), which keeps fitting deterministic.
fn best_split(
    x: &[FeatureRow],
    y: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    if n < 2 {
        return None;
    }
    let min_leaf = min_samples_leaf.max(1);
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();

    let mut best: Option<SplitCandidate> = None;
    let mut order: Vec<usize> = indices.to_vec();

    for feature in 0..NUM_FEATURES {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for pos in 0..n - 1 {
            let yi = y[order[pos]];
            left_sum += yi;
            left_sq += yi * yi;

            let here = x[order[pos]][feature];
            let next = x[order[pos + 1]][feature];
            if here == next {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let child_sse = (left_sq - left_sum * left_sum / n_left as f64)
                + (right_sq - right_sum * right_sum / n_right as f64);

            if best.as_ref().map_or(true, |b| child_sse < b.child_sse) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: here + (next - here) / 2.0,
                    child_sse,
                });
            }
        }
    }

    best
}
