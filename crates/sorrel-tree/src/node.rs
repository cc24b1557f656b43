//! Fitted tree nodes.

use sorrel_pattern::Shapelet;

use crate::class_set::ClassSet;

/// Decision payload of a branch node: the winning pattern, the distance
/// cutoff, and the per-class mean distance observed when the split was made
/// (used by the longer-pattern prediction fallback).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Threshold {
    pub(crate) shapelet: Shapelet,
    pub(crate) distance: f64,
    pub(crate) class_distances: Vec<f64>,
}

impl Threshold {
    /// The winning pattern.
    #[must_use]
    pub fn shapelet(&self) -> &Shapelet {
        &self.shapelet
    }

    /// The distance cutoff: examples at or below go left.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Mean training distance per class id (NaN for classes with no finite
    /// distance at this node).
    #[must_use]
    pub fn class_distances(&self) -> &[f64] {
        &self.class_distances
    }
}

/// A node of a fitted pattern tree. Ownership is strictly hierarchical:
/// every child is owned by exactly one parent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum TreeNode {
    /// A terminal node.
    Leaf {
        /// Class probability distribution over the full domain, summing to 1.
        probabilities: Vec<f64>,
        /// Fraction of the root weight that reached this leaf.
        weight: f64,
    },
    /// An interior decision node.
    Branch {
        /// Child for distances at or below the threshold.
        left: Box<TreeNode>,
        /// Child for distances above the threshold.
        right: Box<TreeNode>,
        /// Child for records whose distance is undefined, when grown.
        missing: Option<Box<TreeNode>>,
        /// The decision payload.
        threshold: Threshold,
        /// Per-class training weight at this node (full domain, zeros for
        /// absent classes).
        class_distribution: Vec<f64>,
        /// Fraction of the root weight that reached this node.
        weight: f64,
    },
}

impl TreeNode {
    /// Build a leaf from the weighted class distribution of `class_set`.
    pub(crate) fn leaf(class_set: &ClassSet, weight: f64) -> TreeNode {
        let total = class_set.total_weight();
        let mut probabilities = vec![0.0; class_set.domain()];
        if total > 0.0 {
            for sample in class_set.samples() {
                probabilities[sample.target()] = sample.weight() / total;
            }
        }
        TreeNode::Leaf {
            probabilities,
            weight,
        }
    }

    /// Per-class training weights of `class_set` over the full domain.
    pub(crate) fn class_distribution(class_set: &ClassSet) -> Vec<f64> {
        let mut distribution = vec![0.0; class_set.domain()];
        for sample in class_set.samples() {
            distribution[sample.target()] = sample.weight();
        }
        distribution
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    /// Maximum depth below this node; a lone leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Branch {
                left,
                right,
                missing,
                ..
            } => {
                let mut d = left.depth().max(right.depth());
                if let Some(missing) = missing {
                    d = d.max(missing.depth());
                }
                d + 1
            }
        }
    }

    /// Total number of nodes in this subtree.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Branch {
                left,
                right,
                missing,
                ..
            } => {
                1 + left.count()
                    + right.count()
                    + missing.as_ref().map_or(0, |m| m.count())
            }
        }
    }
}
