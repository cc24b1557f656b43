//! Tree traversal strategies for prediction.

use sorrel_pattern::{PatternDistance, Record, Shapelet};

use crate::node::TreeNode;

/// Prediction policy over a fitted tree. Strategies are interchangeable:
/// they traverse the same tree structure with different fallback behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum PredictStrategy {
    /// Hard routing. Patterns longer than the record fall back to a
    /// distance-ratio match against the per-class mean-distance table;
    /// undefined distances descend into the missing child when grown,
    /// otherwise default right.
    #[default]
    Standard,
    /// As `Standard`, except that when a pattern is longer than the record
    /// both children are visited and their results blended by child weight.
    WeightedBlend,
}

fn resolve_series<'a>(record: &'a Record, shapelet: &Shapelet) -> Option<&'a [f64]> {
    match shapelet.channel() {
        Some(channel) => record.channel(channel),
        None => record.as_series(),
    }
}

/// Per-class affinity used by the longer-pattern fallback to decide which
/// child better represents the matched class.
fn class_affinity(node: &TreeNode, class: usize) -> f64 {
    match node {
        TreeNode::Leaf { probabilities, .. } => probabilities[class],
        TreeNode::Branch {
            class_distribution, ..
        } => class_distribution[class],
    }
}

pub(crate) fn visit(
    node: &TreeNode,
    record: &Record,
    distance: PatternDistance,
    strategy: PredictStrategy,
) -> Vec<f64> {
    match strategy {
        PredictStrategy::Standard => visit_standard(node, record, distance),
        PredictStrategy::WeightedBlend => visit_weighted(node, record, distance, 1.0),
    }
}

fn visit_standard(node: &TreeNode, record: &Record, distance: PatternDistance) -> Vec<f64> {
    match node {
        TreeNode::Leaf { probabilities, .. } => probabilities.clone(),
        TreeNode::Branch {
            left,
            right,
            missing,
            threshold,
            ..
        } => {
            let shapelet = &threshold.shapelet;
            let Some(series) = resolve_series(record, shapelet) else {
                let next = missing.as_deref().unwrap_or(right);
                return visit_standard(next, record, distance);
            };

            if shapelet.len() > series.len() {
                // Pattern does not fit inside the record: compare a
                // length-corrected distance against the mean distance each
                // class showed at training time and follow the child that
                // favors the nearest class.
                let d = distance.compute(series, shapelet);
                let ratio =
                    (d * d * series.len() as f64 / shapelet.len() as f64).sqrt();
                let nearest = threshold
                    .class_distances
                    .iter()
                    .enumerate()
                    .filter(|(_, mcd)| mcd.is_finite())
                    .min_by(|(_, a), (_, b)| {
                        (ratio - **a).abs().total_cmp(&(ratio - **b).abs())
                    })
                    .map(|(class, _)| class);
                return match nearest {
                    Some(class) => {
                        if class_affinity(left, class) > class_affinity(right, class) {
                            visit_standard(left, record, distance)
                        } else {
                            visit_standard(right, record, distance)
                        }
                    }
                    None if d < threshold.distance => visit_standard(left, record, distance),
                    None => visit_standard(right, record, distance),
                };
            }

            let d = distance.compute(series, shapelet);
            if d.is_nan() {
                let next = missing.as_deref().unwrap_or(right);
                visit_standard(next, record, distance)
            } else if d < threshold.distance {
                visit_standard(left, record, distance)
            } else {
                visit_standard(right, record, distance)
            }
        }
    }
}

fn node_weight(node: &TreeNode) -> f64 {
    match node {
        TreeNode::Leaf { weight, .. } | TreeNode::Branch { weight, .. } => *weight,
    }
}

fn visit_weighted(
    node: &TreeNode,
    record: &Record,
    distance: PatternDistance,
    weight: f64,
) -> Vec<f64> {
    match node {
        TreeNode::Leaf { probabilities, .. } => {
            probabilities.iter().map(|p| p * weight).collect()
        }
        TreeNode::Branch {
            left,
            right,
            missing,
            threshold,
            ..
        } => {
            let shapelet = &threshold.shapelet;
            let Some(series) = resolve_series(record, shapelet) else {
                let next = missing.as_deref().unwrap_or(right);
                return visit_weighted(next, record, distance, weight);
            };

            if shapelet.len() > series.len() {
                let left_probs = visit_weighted(left, record, distance, node_weight(left));
                let right_probs =
                    visit_weighted(right, record, distance, node_weight(right));
                return left_probs
                    .iter()
                    .zip(&right_probs)
                    .map(|(l, r)| l + r)
                    .collect();
            }

            let d = distance.compute(series, shapelet);
            if d.is_nan() {
                let next = missing.as_deref().unwrap_or(right);
                visit_weighted(next, record, distance, weight)
            } else if d < threshold.distance {
                visit_weighted(left, record, distance, weight)
            } else {
                visit_weighted(right, record, distance, weight)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sorrel_pattern::Shapelet;

    use super::*;
    use crate::node::Threshold;

    fn leaf(probabilities: Vec<f64>, weight: f64) -> TreeNode {
        TreeNode::Leaf {
            probabilities,
            weight,
        }
    }

    fn branch_over(series: &[f64]) -> TreeNode {
        let shapelet = Shapelet::normalized(0, 3, series).unwrap();
        TreeNode::Branch {
            left: Box::new(leaf(vec![1.0, 0.0], 0.5)),
            right: Box::new(leaf(vec![0.0, 1.0], 0.5)),
            missing: None,
            threshold: Threshold {
                shapelet,
                distance: 1.0,
                class_distances: vec![0.0, 2.0],
            },
            class_distribution: vec![3.0, 3.0],
            weight: 1.0,
        }
    }

    #[test]
    fn standard_routes_by_threshold() {
        let node = branch_over(&[0.0, 1.0, 2.0]);
        let rising = Record::series(vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let probs = visit(&node, &rising, PatternDistance::SlidingEuclidean, PredictStrategy::Standard);
        // The rising record contains the rising pattern: distance 0 < 1.
        assert_eq!(probs, vec![1.0, 0.0]);

        let falling = Record::series(vec![3.0, 2.0, 1.0, 0.0]).unwrap();
        let probs = visit(&node, &falling, PatternDistance::SlidingEuclidean, PredictStrategy::Standard);
        assert_eq!(probs, vec![0.0, 1.0]);
    }

    #[test]
    fn missing_channel_defaults_right() {
        let series = [0.0, 1.0, 2.0];
        let shapelet = Shapelet::normalized(0, 3, &series).unwrap().with_channel(1);
        let node = TreeNode::Branch {
            left: Box::new(leaf(vec![1.0, 0.0], 0.5)),
            right: Box::new(leaf(vec![0.0, 1.0], 0.5)),
            missing: None,
            threshold: Threshold {
                shapelet,
                distance: 1.0,
                class_distances: vec![f64::NAN, f64::NAN],
            },
            class_distribution: vec![1.0, 1.0],
            weight: 1.0,
        };
        let record =
            Record::multichannel(vec![Some(vec![0.0, 1.0, 2.0]), None]).unwrap();
        let probs = visit(&node, &record, PatternDistance::SlidingEuclidean, PredictStrategy::Standard);
        assert_eq!(probs, vec![0.0, 1.0]);
    }

    #[test]
    fn missing_channel_uses_missing_child_when_grown() {
        let series = [0.0, 1.0, 2.0];
        let shapelet = Shapelet::normalized(0, 3, &series).unwrap().with_channel(1);
        let node = TreeNode::Branch {
            left: Box::new(leaf(vec![1.0, 0.0], 0.4)),
            right: Box::new(leaf(vec![0.0, 1.0], 0.4)),
            missing: Some(Box::new(leaf(vec![0.5, 0.5], 0.2))),
            threshold: Threshold {
                shapelet,
                distance: 1.0,
                class_distances: vec![f64::NAN, f64::NAN],
            },
            class_distribution: vec![1.0, 1.0],
            weight: 1.0,
        };
        let record =
            Record::multichannel(vec![Some(vec![0.0, 1.0, 2.0]), None]).unwrap();
        let probs = visit(&node, &record, PatternDistance::SlidingEuclidean, PredictStrategy::Standard);
        assert_eq!(probs, vec![0.5, 0.5]);
    }

    #[test]
    fn longer_pattern_follows_nearest_class() {
        let node = branch_over(&[0.0, 1.0, 2.0]);
        // Record shorter than the pattern: ratio matching picks class 0
        // (mean distance 0) when the record matches the pattern shape.
        let record = Record::series(vec![0.0, 1.0]).unwrap();
        let probs = visit(&node, &record, PatternDistance::SlidingEuclidean, PredictStrategy::Standard);
        assert_eq!(probs.len(), 2);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_blend_combines_children_for_longer_pattern() {
        let node = branch_over(&[0.0, 1.0, 2.0]);
        let record = Record::series(vec![0.0, 1.0]).unwrap();
        let probs = visit(&node, &record, PatternDistance::SlidingEuclidean, PredictStrategy::WeightedBlend);
        // Both children contribute, scaled by their 0.5 weights.
        assert_eq!(probs, vec![0.5, 0.5]);
    }
}
