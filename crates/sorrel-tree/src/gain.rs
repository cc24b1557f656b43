//! Impurity and split-quality measures.

use crate::class_set::ClassSet;

/// Criterion used to rank candidate patterns at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Assessment {
    /// Weighted information gain with margin-gap tie-breaking.
    #[default]
    InfoGain,
    /// One-way ANOVA F statistic over the raw pattern distances.
    FStat,
}

/// Shannon entropy of a relative-frequency distribution (natural log).
pub(crate) fn entropy(freq: &[f64]) -> f64 {
    -freq
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.ln())
        .sum::<f64>()
}

/// Weighted impurity of a two-way split from the side weights and their
/// relative-frequency distributions. Lower is better.
pub(crate) fn weighted_impurity(
    left_weight: f64,
    left_freq: &[f64],
    right_weight: f64,
    right_freq: &[f64],
) -> f64 {
    let total = left_weight + right_weight;
    (left_weight / total) * entropy(left_freq) + (right_weight / total) * entropy(right_freq)
}

/// Entropy of a class set's weighted class distribution.
pub(crate) fn class_set_impurity(class_set: &ClassSet) -> f64 {
    let total = class_set.total_weight();
    if total <= 0.0 {
        return 0.0;
    }
    let freq: Vec<f64> = class_set.samples().map(|s| s.weight() / total).collect();
    entropy(&freq)
}

/// One-way ANOVA F statistic over per-example `(distance, class)` pairs.
///
/// Computed directly from per-class sums, sums of squares, and counts; no
/// threshold search is needed to rank a pattern this way. A degenerate
/// variance (NaN) maps to 0 so such patterns are never preferred.
pub(crate) fn f_statistic(distances: &[(f64, usize)], domain: usize) -> f64 {
    let n = distances.len();
    let mut sums = vec![0.0f64; domain];
    let mut sum_of_squares = vec![0.0f64; domain];
    let mut sizes = vec![0usize; domain];
    for &(distance, target) in distances {
        sums[target] += distance;
        sum_of_squares[target] += distance * distance;
        sizes[target] += 1;
    }

    let present: Vec<usize> = (0..domain).filter(|&c| sizes[c] > 0).collect();
    let mut part1 = 0.0;
    let mut part2 = 0.0;
    for &c in &present {
        part1 += sum_of_squares[c];
        part2 += sums[c];
    }
    let ss_total = part1 - part2 * part2 / n as f64;

    let mut part1 = 0.0;
    let mut part2 = 0.0;
    for &c in &present {
        part1 += sums[c] * sums[c] / sizes[c] as f64;
        part2 += sums[c];
    }
    let ss_among = part1 - part2 * part2 / n as f64;
    let ss_within = ss_total - ss_among;

    let df_among = present.len() as f64 - 1.0;
    let df_within = n as f64 - present.len() as f64;
    let f = (ss_among / df_among) / (ss_within / df_within);
    if f.is_nan() { 0.0 } else { f }
}
