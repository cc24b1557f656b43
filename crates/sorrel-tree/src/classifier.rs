//! The probabilistic classifier contract consumed by layers above.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use sorrel_pattern::Record;

/// A fitted model that estimates class probabilities for a record.
///
/// The returned vector always has `n_classes()` entries, sums to 1, and uses
/// the dense class ids the model was trained with.
pub trait Classifier: Sync {
    /// Number of classes in the label domain.
    fn n_classes(&self) -> usize;

    /// Class probability distribution for one record.
    fn estimate(&self, record: &Record) -> Vec<f64>;

    /// Probability distributions for a batch of records, in parallel.
    fn estimate_batch(&self, records: &[Record]) -> Vec<Vec<f64>> {
        records.par_iter().map(|r| self.estimate(r)).collect()
    }

    /// Predicted class id: the argmax of [`Classifier::estimate`].
    fn predict(&self, record: &Record) -> usize {
        self.estimate(record)
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(class, _)| class)
            .unwrap_or(0)
    }
}
