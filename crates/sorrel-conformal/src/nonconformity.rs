//! Nonconformity scorers.

use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use sorrel_pattern::{PatternDistance, Record};
use sorrel_tree::Classifier;

use crate::cost::ProbabilityCostFunction;
use crate::error::ConformalError;

/// Nonconformity from a fitted probabilistic classifier: the chosen cost
/// function applied to the classifier's probability estimate.
#[derive(Debug)]
pub struct ProbabilityNonconformity<C> {
    classifier: C,
    cost: ProbabilityCostFunction,
}

impl<C: Classifier> ProbabilityNonconformity<C> {
    /// Wrap a fitted classifier.
    #[must_use]
    pub fn new(classifier: C, cost: ProbabilityCostFunction) -> Self {
        Self { classifier, cost }
    }

    /// The wrapped classifier.
    #[must_use]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Nonconformity of `(record, label)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConformalError::UnknownLabel`] when `label` is outside the
    /// classifier's domain.
    pub fn score(&self, record: &Record, label: usize) -> Result<f64, ConformalError> {
        let n_classes = self.classifier.n_classes();
        if label >= n_classes {
            return Err(ConformalError::UnknownLabel { label, n_classes });
        }
        Ok(self.cost.apply(&self.classifier.estimate(record), label))
    }

    /// Score a batch of `(record, label)` pairs in parallel.
    ///
    /// # Errors
    ///
    /// [`ConformalError::LabelCountMismatch`] on length mismatch, or the
    /// first [`ConformalError::UnknownLabel`] encountered.
    pub fn score_batch(&self, x: &[Record], y: &[usize]) -> Result<Vec<f64>, ConformalError> {
        if x.len() != y.len() {
            return Err(ConformalError::LabelCountMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        x.par_iter()
            .zip(y.par_iter())
            .map(|(record, &label)| self.score(record, label))
            .collect()
    }
}

/// Channel-wise distance between two records; NaN when the records share no
/// present channel.
fn record_distance(distance: PatternDistance, a: &Record, b: &Record) -> f64 {
    let channels = a.len().max(b.len());
    let mut sum = 0.0;
    let mut shared = 0usize;
    for c in 0..channels {
        if let (Some(x), Some(y)) = (a.channel(c), b.channel(c)) {
            sum += distance.between(x, y);
            shared += 1;
        }
    }
    if shared == 0 { f64::NAN } else { sum }
}

/// k-NN distance-ratio nonconformity: the summed distance to the `k` nearest
/// same-label neighbors over the summed distance to the `k` nearest
/// other-label neighbors.
#[derive(Debug)]
pub struct DistanceNonconformity {
    records: Vec<Record>,
    labels: Vec<usize>,
    n_classes: usize,
    k: usize,
    distance: PatternDistance,
}

impl DistanceNonconformity {
    /// Fit on the training set with Euclidean record distance.
    ///
    /// # Errors
    ///
    /// See [`DistanceNonconformity::fit_with_distance`].
    pub fn fit(x: &[Record], y: &[usize], k: usize) -> Result<Self, ConformalError> {
        Self::fit_with_distance(x, y, k, PatternDistance::Euclidean)
    }

    /// Fit on the training set with an explicit distance function.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ConformalError::EmptyTrainingSet`] | `x` is empty |
    /// | [`ConformalError::LabelCountMismatch`] | `x`/`y` lengths differ |
    /// | [`ConformalError::InvalidNeighborCount`] | `k` is zero |
    pub fn fit_with_distance(
        x: &[Record],
        y: &[usize],
        k: usize,
        distance: PatternDistance,
    ) -> Result<Self, ConformalError> {
        if x.is_empty() {
            return Err(ConformalError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ConformalError::LabelCountMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        if k == 0 {
            return Err(ConformalError::InvalidNeighborCount);
        }
        Ok(Self {
            records: x.to_vec(),
            labels: y.to_vec(),
            n_classes: y.iter().max().copied().unwrap_or(0) + 1,
            k,
            distance,
        })
    }

    /// Number of classes in the training labels.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Nonconformity of `(record, label)`.
    ///
    /// `0` when the other-label distance sum is zero; `+∞`/`-∞` when one
    /// side's distance is undefined.
    ///
    /// # Errors
    ///
    /// Returns [`ConformalError::UnknownLabel`] when `label` is outside the
    /// training label domain.
    pub fn score(&self, record: &Record, label: usize) -> Result<f64, ConformalError> {
        if label >= self.n_classes {
            return Err(ConformalError::UnknownLabel {
                label,
                n_classes: self.n_classes,
            });
        }

        let distances: Vec<f64> = self
            .records
            .iter()
            .map(|r| record_distance(self.distance, record, r))
            .collect();
        let mut order: Vec<usize> = (0..distances.len()).collect();
        order.sort_unstable_by(|&a, &b| distances[a].total_cmp(&distances[b]));

        let mut same_dist = 0.0;
        let mut other_dist = 0.0;
        let mut same_seen = 0usize;
        let mut other_seen = 0usize;
        for &o in &order {
            if same_seen >= self.k && other_seen >= self.k {
                break;
            }
            if self.labels[o] == label {
                if same_seen < self.k {
                    same_dist += distances[o];
                    same_seen += 1;
                }
            } else if other_seen < self.k {
                other_dist += distances[o];
                other_seen += 1;
            }
        }

        if same_dist.is_nan() {
            return Ok(f64::INFINITY);
        }
        if other_dist.is_nan() {
            return Ok(f64::NEG_INFINITY);
        }
        Ok(if other_dist == 0.0 {
            0.0
        } else {
            same_dist / other_dist
        })
    }

    /// Score a batch of `(record, label)` pairs in parallel.
    ///
    /// # Errors
    ///
    /// [`ConformalError::LabelCountMismatch`] on length mismatch, or the
    /// first [`ConformalError::UnknownLabel`] encountered.
    pub fn score_batch(&self, x: &[Record], y: &[usize]) -> Result<Vec<f64>, ConformalError> {
        if x.len() != y.len() {
            return Err(ConformalError::LabelCountMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        x.par_iter()
            .zip(y.par_iter())
            .map(|(record, &label)| self.score(record, label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use sorrel_pattern::records_from_matrix;

    use super::*;

    fn small_dataset() -> (Vec<Record>, Vec<usize>) {
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 5.1],
        ];
        (records_from_matrix(&rows).unwrap(), vec![0, 0, 1, 1])
    }

    #[test]
    fn self_neighbor_scores_zero_with_k1() {
        // Every training example's nearest same-class neighbor is itself at
        // distance 0, so its true-label score is 0.
        let (x, y) = small_dataset();
        let ncm = DistanceNonconformity::fit(&x, &y, 1).unwrap();
        for (record, &label) in x.iter().zip(&y) {
            let score = ncm.score(record, label).unwrap();
            assert_eq!(score, 0.0);
        }
    }

    #[test]
    fn wrong_label_scores_higher() {
        let (x, y) = small_dataset();
        let ncm = DistanceNonconformity::fit(&x, &y, 1).unwrap();
        let right = ncm.score(&x[0], y[0]).unwrap();
        let wrong = ncm.score(&x[0], 1).unwrap();
        assert!(wrong > right, "wrong = {wrong}, right = {right}");
    }

    #[test]
    fn unknown_label_is_an_error() {
        let (x, y) = small_dataset();
        let ncm = DistanceNonconformity::fit(&x, &y, 1).unwrap();
        let err = ncm.score(&x[0], 7).unwrap_err();
        assert!(matches!(
            err,
            ConformalError::UnknownLabel { label: 7, n_classes: 2 }
        ));
    }

    #[test]
    fn zero_k_is_an_error() {
        let (x, y) = small_dataset();
        assert!(matches!(
            DistanceNonconformity::fit(&x, &y, 0),
            Err(ConformalError::InvalidNeighborCount)
        ));
    }

    #[test]
    fn disjoint_channels_score_infinite() {
        // Probe shares no present channel with any same-class training
        // record: the same-label distance is undefined, score +inf.
        let train = vec![
            Record::multichannel(vec![Some(vec![1.0, 2.0]), None]).unwrap(),
            Record::multichannel(vec![None, Some(vec![1.0, 2.0])]).unwrap(),
        ];
        let labels = vec![0, 1];
        let ncm = DistanceNonconformity::fit(&train, &labels, 1).unwrap();
        let probe = Record::multichannel(vec![None, Some(vec![1.0, 2.0])]).unwrap();
        let score = ncm.score(&probe, 0).unwrap();
        assert!(score.is_infinite() && score > 0.0, "score = {score}");
    }
}
