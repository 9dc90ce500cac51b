//! Least-absolute-deviation gradient boosting over regression trees
//!
//! Friedman's LAD-TreeBoost: start from the median target, then each round
//! fits a depth-limited tree to the sign of the residuals and sets every leaf
//! to the median residual of its samples, shrunk by the learning rate.
//! Minimizes mean absolute error, so a few wild synthetic prices do not drag
//! the fit around.
//!
//! Inputs are dense numeric rows; categorical columns must already be encoded.

use tracing::debug;

/// Boosting hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct BoostingParams {
    pub iterations: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            iterations: 300,
            learning_rate: 0.05,
            max_depth: 6,
            min_samples_leaf: 2,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let x = row.get(*feature).copied().unwrap_or(0.0);
                if x <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

/// Median of a slice; 0.0 when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Candidate split found for one node
struct SplitChoice {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Fits one tree per round
struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    gradient: &'a [f64],
    residual: &'a [f64],
    params: &'a BoostingParams,
    n_features: usize,
}

impl TreeBuilder<'_> {
    fn grow(&self, samples: &[usize], depth: usize) -> Node {
        if depth >= self.params.max_depth || samples.len() < 2 * self.params.min_samples_leaf {
            return self.leaf(samples);
        }
        let Some(choice) = self.best_split(samples) else {
            return self.leaf(samples);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .copied()
            .partition(|&i| self.x[i][choice.feature] <= choice.threshold);
        if left.is_empty() || right.is_empty() {
            return self.leaf(samples);
        }

        Node::Split {
            feature: choice.feature,
            threshold: choice.threshold,
            left: Box::new(self.grow(&left, depth + 1)),
            right: Box::new(self.grow(&right, depth + 1)),
        }
    }

    fn leaf(&self, samples: &[usize]) -> Node {
        let residuals: Vec<f64> = samples.iter().map(|&i| self.residual[i]).collect();
        Node::Leaf(median(&residuals) * self.params.learning_rate)
    }

    /// Squared-error split on the pseudo-residuals using sorted prefix sums
    fn best_split(&self, samples: &[usize]) -> Option<SplitChoice> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total: f64 = samples.iter().map(|&i| self.gradient[i]).sum();
        let parent_score = total * total / n as f64;

        let mut best: Option<SplitChoice> = None;
        let mut order = samples.to_vec();

        for feature in 0..self.n_features {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += self.gradient[order[k - 1]];
                if k < min_leaf || n - k < min_leaf {
                    continue;
                }
                let lo = self.x[order[k - 1]][feature];
                let hi = self.x[order[k]][feature];
                if lo >= hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / k as f64
                    + right_sum * right_sum / (n - k) as f64
                    - parent_score;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitChoice {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

/// Fitted ensemble
#[derive(Debug, Clone)]
pub struct GradientBoostedRegressor {
    base: f64,
    trees: Vec<Node>,
}

impl GradientBoostedRegressor {
    /// Fit on row-major `x` against `y`; both must have the same length
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &BoostingParams) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let base = median(y);
        let mut fitted = vec![base; y.len()];
        let mut trees = Vec::with_capacity(params.iterations);
        let all: Vec<usize> = (0..y.len().min(x.len())).collect();

        for round in 0..params.iterations {
            let residual: Vec<f64> = y.iter().zip(&fitted).map(|(t, f)| t - f).collect();
            let gradient: Vec<f64> = residual.iter().map(|r| sign(*r)).collect();
            if gradient.iter().all(|g| *g == 0.0) {
                debug!(round, "Residuals vanished, stopping early");
                break;
            }

            let builder = TreeBuilder {
                x,
                gradient: &gradient,
                residual: &residual,
                params,
                n_features,
            };
            let tree = builder.grow(&all, 0);
            for &i in &all {
                fitted[i] += tree.predict(&x[i]);
            }
            trees.push(tree);
        }

        Self { base, trees }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.base + self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
