//! Bootstrap conformal classification from out-of-bag estimates.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, instrument};

use sorrel_pattern::Record;
use sorrel_tree::{Classifier, PatternForest, PatternForestConfig};

use crate::cost::ProbabilityCostFunction;
use crate::error::ConformalError;
use crate::icp::p_value;

/// A conformal classifier whose calibration scores come from the forest's
/// out-of-bag probability estimates: no separate calibration set is needed,
/// every training record with at least one out-of-bag tree contributes one
/// score.
#[derive(Debug)]
pub struct BootstrapConformalClassifier {
    forest: PatternForest,
    cost: ProbabilityCostFunction,
    calibration: Vec<f64>,
}

impl BootstrapConformalClassifier {
    /// Fit the underlying forest and derive the calibration scores from its
    /// out-of-bag estimates.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ConformalError::Tree`] | forest training failed |
    /// | [`ConformalError::EmptyCalibrationSet`] | no record had an out-of-bag tree |
    #[instrument(skip_all, fields(size = config.size(), n_records = x.len()))]
    pub fn fit(
        config: &PatternForestConfig,
        cost: ProbabilityCostFunction,
        x: &[Record],
        y: &[usize],
    ) -> Result<Self, ConformalError> {
        let forest = config.fit(x, y)?;

        let mut calibration: Vec<f64> = x
            .iter()
            .enumerate()
            .filter_map(|(i, record)| {
                forest
                    .oob_estimate(i, record)
                    .map(|probabilities| cost.apply(&probabilities, y[i]))
            })
            .collect();
        if calibration.is_empty() {
            return Err(ConformalError::EmptyCalibrationSet);
        }
        calibration.sort_unstable_by(f64::total_cmp);
        debug!(n_scores = calibration.len(), "out-of-bag calibration complete");

        Ok(Self {
            forest,
            cost,
            calibration,
        })
    }

    /// The fitted forest.
    #[must_use]
    pub fn forest(&self) -> &PatternForest {
        &self.forest
    }

    /// Number of out-of-bag calibration scores.
    #[must_use]
    pub fn calibration_size(&self) -> usize {
        self.calibration.len()
    }

    /// Per-label conformal p-values for one record.
    #[must_use]
    pub fn estimate(&self, record: &Record) -> Vec<f64> {
        let probabilities = self.forest.estimate(record);
        (0..self.forest.n_classes())
            .map(|label| p_value(&self.calibration, self.cost.apply(&probabilities, label)))
            .collect()
    }

    /// Per-label p-values for a batch of records, in parallel.
    #[must_use]
    pub fn estimate_batch(&self, x: &[Record]) -> Vec<Vec<f64>> {
        x.par_iter().map(|record| self.estimate(record)).collect()
    }

    /// The prediction region at `significance`: all labels whose p-value
    /// exceeds it.
    #[must_use]
    pub fn predict_region(&self, record: &Record, significance: f64) -> Vec<usize> {
        self.estimate(record)
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > significance)
            .map(|(label, _)| label)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use sorrel_pattern::records_from_matrix;
    use sorrel_tree::PatternForestConfig;

    use super::*;

    fn separable() -> (Vec<Record>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..15 {
            let offset = i as f64 * 0.003;
            rows.push((0..10).map(|j| 0.05 * j as f64 + offset).collect());
            labels.push(0);
            rows.push((0..10).map(|j| 0.7 - 0.05 * j as f64 - offset).collect());
            labels.push(1);
        }
        (records_from_matrix(&rows).unwrap(), labels)
    }

    #[test]
    fn fit_derives_oob_calibration() {
        let (x, y) = separable();
        let config = PatternForestConfig::new(15).unwrap().with_seed(42);
        let cc =
            BootstrapConformalClassifier::fit(&config, ProbabilityCostFunction::Margin, &x, &y)
                .unwrap();
        assert!(cc.calibration_size() > 0);
        assert!(cc.calibration_size() <= x.len());
    }

    #[test]
    fn true_label_p_value_dominates() {
        let (x, y) = separable();
        let config = PatternForestConfig::new(15).unwrap().with_seed(42);
        let cc =
            BootstrapConformalClassifier::fit(&config, ProbabilityCostFunction::Margin, &x, &y)
                .unwrap();

        let mut correct = 0usize;
        for (record, &label) in x.iter().zip(&y) {
            let p = cc.estimate(record);
            let argmax = if p[0] >= p[1] { 0 } else { 1 };
            if argmax == label {
                correct += 1;
            }
        }
        assert!(correct as f64 / x.len() as f64 > 0.9);
    }

    #[test]
    fn region_at_high_significance_shrinks() {
        let (x, y) = separable();
        let config = PatternForestConfig::new(15).unwrap().with_seed(42);
        let cc =
            BootstrapConformalClassifier::fit(&config, ProbabilityCostFunction::Margin, &x, &y)
                .unwrap();

        let loose: usize = x.iter().map(|r| cc.predict_region(r, 0.01).len()).sum();
        let tight: usize = x.iter().map(|r| cc.predict_region(r, 0.5).len()).sum();
        assert!(tight <= loose, "tight = {tight}, loose = {loose}");
    }
}
