//! CART regression tree with variance-reduction splits.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Growth limits for a single regression tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth; the root is depth 0.
    pub max_depth: usize,
    /// Minimum rows a node needs before it may be split.
    pub min_samples_split: usize,
    /// Minimum rows each child of a split must keep.
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 12,
            min_samples_split: 10,
            min_samples_leaf: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

/// A fitted regression tree stored as a flat node array.
///
/// Rows with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Fits a tree on the rows listed in `sample`.
    ///
    /// `sample` may contain repeated indices (bootstrap samples).
    ///
    /// # Panics
    ///
    /// Panics if `sample` references a row outside `features`.
    #[must_use]
    pub fn fit<'a>(
        features: ArrayView2<'a, f64>,
        targets: ArrayView1<'a, f64>,
        sample: &[usize],
        config: &'a TreeConfig,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        if sample.is_empty() {
            tree.nodes.push(Node::Leaf { value: 0.0 });
            return tree;
        }

        let builder = Builder {
            features,
            targets,
            config,
        };
        builder.grow(&mut tree.nodes, sample.to_vec(), 0);
        tree
    }

    /// Predicts the target for one feature row.
    #[must_use]
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    index = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Returns the number of nodes, leaves included.
    #[cfg(test)]
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the length of the longest root-to-leaf path.
    #[cfg(test)]
    fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

struct Builder<'a> {
    features: ArrayView2<'a, f64>,
    targets: ArrayView1<'a, f64>,
    config: &'a TreeConfig,
}

impl Builder<'_> {
    /// Grows the subtree for `rows` and returns the index of its root.
    fn grow(&self, nodes: &mut Vec<Node>, rows: Vec<usize>, depth: usize) -> usize {
        let count = rows.len();
        let total: f64 = rows.iter().map(|&i| self.targets[i]).sum();
        #[expect(clippy::cast_precision_loss, reason = "row counts fit in f64")]
        let mean = total / count as f64;

        let node = nodes.len();
        nodes.push(Node::Leaf { value: mean });

        if depth >= self.config.max_depth
            || count < self.config.min_samples_split
            || count < 2 * self.config.min_samples_leaf.max(1)
        {
            return node;
        }

        let Some(split) = self.best_split(&rows, total) else {
            return node;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| self.features[[i, split.feature]] <= split.threshold);

        let left = self.grow(nodes, left_rows, depth + 1);
        let right = self.grow(nodes, right_rows, depth + 1);

        nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node
    }

    /// Finds the split that most reduces the squared error of `rows`.
    ///
    /// Minimizing the children's summed squared error is equivalent to
    /// maximizing `sum_l^2 / n_l + sum_r^2 / n_r`.
    #[expect(clippy::cast_precision_loss, reason = "row counts fit in f64")]
    fn best_split(&self, rows: &[usize], total: f64) -> Option<Split> {
        let count = rows.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_score = total * total / count as f64;
        let mut best: Option<Split> = None;
        let mut order = rows.to_vec();

        for feature in 0..self.features.ncols() {
            order.sort_unstable_by(|&a, &b| {
                self.features[[a, feature]].total_cmp(&self.features[[b, feature]])
            });

            let mut left_sum = 0.0;
            for pos in 0..count - 1 {
                let row = order[pos];
                left_sum += self.targets[row];

                let left_count = pos + 1;
                let right_count = count - left_count;
                if left_count < min_leaf {
                    continue;
                }
                if right_count < min_leaf {
                    break;
                }

                let current = self.features[[row, feature]];
                let next = self.features[[order[pos + 1], feature]];
                if current >= next {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / left_count as f64
                    + right_sum * right_sum / right_count as f64;

                if best.is_none_or(|b| score > b.score) {
                    let mut threshold = current + (next - current) / 2.0;
                    if threshold >= next || !threshold.is_finite() {
                        threshold = current;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        best.filter(|split| split.score > parent_score + parent_score.abs() * 1e-12)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2};

    use super::*;

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        // y depends only on feature 2 crossing 10.
        let rows = 40;
        let mut x = Array2::zeros((rows, 6));
        let mut y = Array1::zeros(rows);
        for i in 0..rows {
            let v = f64::from(u32::try_from(i).expect("small"));
            x[[i, 0]] = (v * 7.0) % 13.0;
            x[[i, 2]] = v / 2.0;
            y[i] = if v / 2.0 <= 10.0 { 100.0 } else { 300.0 };
        }
        (x, y)
    }

    #[test]
    fn test_learns_step_function() {
        let (x, y) = step_data();
        let sample: Vec<usize> = (0..y.len()).collect();
        let tree = RegressionTree::fit(x.view(), y.view(), &sample, &TreeConfig::default());

        let mut low = [0.0; 6];
        low[2] = 3.0;
        let mut high = [0.0; 6];
        high[2] = 18.0;

        assert!((tree.predict_one(&low) - 100.0).abs() < 1e-9);
        assert!((tree.predict_one(&high) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_respects_max_depth() {
        let (x, y) = step_data();
        let sample: Vec<usize> = (0..y.len()).collect();
        let config = TreeConfig {
            max_depth: 0,
            ..TreeConfig::default()
        };
        let stump = RegressionTree::fit(x.view(), y.view(), &sample, &config);

        assert_eq!(stump.node_count(), 1);
        assert_eq!(stump.depth(), 0);
        let mean = y.mean().expect("non-empty");
        assert!((stump.predict_one(&[0.0; 6]) - mean).abs() < 1e-9);
    }

    #[test]
    fn test_min_samples_leaf_blocks_small_children() {
        // A single outlier cannot be isolated when leaves need 5 rows.
        let mut x = Array2::zeros((10, 6));
        let mut y = Array1::from_elem(10, 1.0);
        for i in 0..10 {
            x[[i, 0]] = f64::from(u8::try_from(i).expect("small"));
        }
        y[9] = 1000.0;

        let sample: Vec<usize> = (0..10).collect();
        let config = TreeConfig {
            max_depth: 12,
            min_samples_split: 2,
            min_samples_leaf: 5,
        };
        let tree = RegressionTree::fit(x.view(), y.view(), &sample, &config);

        let mut outlier = [0.0; 6];
        outlier[0] = 9.0;
        assert!(tree.predict_one(&outlier) < 1000.0);
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let (x, _) = step_data();
        let y = Array1::from_elem(x.nrows(), 42.0);
        let sample: Vec<usize> = (0..x.nrows()).collect();
        let tree = RegressionTree::fit(x.view(), y.view(), &sample, &TreeConfig::default());

        assert_eq!(tree.node_count(), 1);
        assert!((tree.predict_one(&[1.0; 6]) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_sample_predicts_zero() {
        let (x, y) = step_data();
        let tree = RegressionTree::fit(x.view(), y.view(), &[], &TreeConfig::default());
        assert_eq!(tree.predict_one(&[0.0; 6]), 0.0);
    }
}
