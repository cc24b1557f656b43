//! Inductive conformal classification.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, instrument};

use sorrel_pattern::Record;
use sorrel_tree::Classifier;

use crate::cost::ProbabilityCostFunction;
use crate::error::ConformalError;
use crate::nonconformity::ProbabilityNonconformity;

/// Conformal p-value of `score` against an ascending-sorted calibration set:
/// `(#{calibration >= score} + 1) / (n + 1)`. The +1 correction keeps
/// p-values strictly positive.
pub(crate) fn p_value(calibration: &[f64], score: f64) -> f64 {
    let below = calibration.partition_point(|&c| c < score);
    let at_least = calibration.len() - below;
    (at_least + 1) as f64 / (calibration.len() + 1) as f64
}

/// Confidence and credibility of a p-value vector: credibility is the
/// largest p-value, confidence is one minus the second largest.
#[must_use]
pub fn confidence_credibility(p_values: &[f64]) -> (f64, f64) {
    let mut first = f64::NEG_INFINITY;
    let mut second = f64::NEG_INFINITY;
    for &p in p_values {
        if p > first {
            second = first;
            first = p;
        } else if p > second {
            second = p;
        }
    }
    let credibility = first.max(0.0);
    let confidence = if second.is_finite() { 1.0 - second } else { 1.0 };
    (confidence, credibility)
}

/// An inductive conformal classifier over a fitted probabilistic base model.
///
/// Two-phase: construct around a fitted classifier, then [`calibrate`]
/// exactly once on held-out data before any [`estimate`] call is trusted.
/// Calibration is the only mutation; afterwards the classifier is safe to
/// share across threads for concurrent estimation.
///
/// [`calibrate`]: InductiveConformalClassifier::calibrate
/// [`estimate`]: InductiveConformalClassifier::estimate
#[derive(Debug)]
pub struct InductiveConformalClassifier<C> {
    nonconformity: ProbabilityNonconformity<C>,
    calibration: Option<Vec<f64>>,
}

impl<C: Classifier> InductiveConformalClassifier<C> {
    /// Wrap a fitted classifier with the given cost function.
    #[must_use]
    pub fn new(classifier: C, cost: ProbabilityCostFunction) -> Self {
        Self {
            nonconformity: ProbabilityNonconformity::new(classifier, cost),
            calibration: None,
        }
    }

    /// The wrapped base classifier.
    #[must_use]
    pub fn classifier(&self) -> &C {
        self.nonconformity.classifier()
    }

    /// `true` once [`InductiveConformalClassifier::calibrate`] has run.
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// Compute and store the calibration nonconformity scores. Must be
    /// called exactly once, after fitting the base model and before
    /// estimation.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ConformalError::AlreadyCalibrated`] | called a second time |
    /// | [`ConformalError::EmptyCalibrationSet`] | `x` is empty |
    /// | [`ConformalError::LabelCountMismatch`] | `x`/`y` lengths differ |
    /// | [`ConformalError::UnknownLabel`] | a label outside the domain |
    #[instrument(skip_all, fields(n_calibration = x.len()))]
    pub fn calibrate(&mut self, x: &[Record], y: &[usize]) -> Result<(), ConformalError> {
        if self.calibration.is_some() {
            return Err(ConformalError::AlreadyCalibrated);
        }
        if x.is_empty() {
            return Err(ConformalError::EmptyCalibrationSet);
        }
        let mut scores = self.nonconformity.score_batch(x, y)?;
        scores.sort_unstable_by(f64::total_cmp);
        debug!(n_scores = scores.len(), "calibration complete");
        self.calibration = Some(scores);
        Ok(())
    }

    /// Per-label conformal p-values for one record.
    ///
    /// # Errors
    ///
    /// Returns [`ConformalError::NotCalibrated`] before calibration.
    pub fn estimate(&self, record: &Record) -> Result<Vec<f64>, ConformalError> {
        let calibration = self
            .calibration
            .as_ref()
            .ok_or(ConformalError::NotCalibrated)?;
        (0..self.classifier().n_classes())
            .map(|label| {
                self.nonconformity
                    .score(record, label)
                    .map(|score| p_value(calibration, score))
            })
            .collect()
    }

    /// Per-label p-values for a batch of records, in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ConformalError::NotCalibrated`] before calibration.
    pub fn estimate_batch(&self, x: &[Record]) -> Result<Vec<Vec<f64>>, ConformalError> {
        if self.calibration.is_none() {
            return Err(ConformalError::NotCalibrated);
        }
        x.par_iter().map(|record| self.estimate(record)).collect()
    }

    /// The prediction region at `significance`: all labels whose p-value
    /// exceeds it.
    ///
    /// # Errors
    ///
    /// Returns [`ConformalError::NotCalibrated`] before calibration.
    pub fn predict_region(
        &self,
        record: &Record,
        significance: f64,
    ) -> Result<Vec<usize>, ConformalError> {
        Ok(self
            .estimate(record)?
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > significance)
            .map(|(label, _)| label)
            .collect())
    }
}
