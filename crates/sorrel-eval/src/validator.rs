//! Fit/evaluate drivers over train/validation partitions.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use sorrel_conformal::{
    InductiveConformalClassifier, ProbabilityCostFunction, confidence_credibility,
};
use sorrel_pattern::Record;
use sorrel_tree::{
    Classifier, PatternForest, PatternForestConfig, PatternTree, PatternTreeConfig, TreeError,
};

use crate::error::EvalError;
use crate::measure::MeasureCollection;
use crate::partition::Partition;

/// A configured learner the validators can drive.
///
/// Implemented by the tree and forest configurations; `reseed` lets a
/// validator vary the randomness per fold the way a fresh config would.
pub trait Learner: Clone {
    /// The fitted model type.
    type Model: Classifier;

    /// Fit a model on the given training data.
    ///
    /// # Errors
    ///
    /// Propagates the configuration and training errors of the underlying
    /// learner.
    fn fit(&self, x: &[Record], y: &[usize]) -> Result<Self::Model, TreeError>;

    /// The configured random seed.
    fn seed(&self) -> u64;

    /// This learner with a different random seed.
    #[must_use]
    fn reseed(self, seed: u64) -> Self;
}

impl Learner for PatternTreeConfig {
    type Model = PatternTree;

    fn fit(&self, x: &[Record], y: &[usize]) -> Result<PatternTree, TreeError> {
        PatternTreeConfig::fit(self, x, y)
    }

    fn seed(&self) -> u64 {
        PatternTreeConfig::seed(self)
    }

    fn reseed(self, seed: u64) -> Self {
        self.with_seed(seed)
    }
}

impl Learner for PatternForestConfig {
    type Model = PatternForest;

    fn fit(&self, x: &[Record], y: &[usize]) -> Result<PatternForest, TreeError> {
        PatternForestConfig::fit(self, x, y)
    }

    fn seed(&self) -> u64 {
        PatternForestConfig::seed(self)
    }

    fn reseed(self, seed: u64) -> Self {
        self.with_seed(seed)
    }
}

fn select(x: &[Record], y: &[usize], indices: &[usize]) -> (Vec<Record>, Vec<usize>) {
    let records = indices.iter().map(|&i| x[i].clone()).collect();
    let labels = indices.iter().map(|&i| y[i]).collect();
    (records, labels)
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Results of a plain fit/evaluate run.
#[derive(Debug)]
pub struct ValidationResult {
    /// Per-partition measure series: `accuracy` and `error`, one value per
    /// partition in order.
    pub measures: MeasureCollection,
    /// Number of partitions evaluated.
    pub n_partitions: usize,
}

impl ValidationResult {
    /// Mean accuracy across partitions.
    #[must_use]
    pub fn mean_accuracy(&self) -> f64 {
        self.measures.mean("accuracy").unwrap_or(0.0)
    }
}

/// Drives fit + estimate cycles over a set of partitions, recording accuracy
/// and error per partition.
#[derive(Debug, Clone)]
pub struct ClassifierValidator {
    partitions: Vec<Partition>,
}

impl ClassifierValidator {
    /// Create a validator over pre-built partitions (k-fold, leave-one-out,
    /// or hold-out splits).
    #[must_use]
    pub fn new(partitions: Vec<Partition>) -> Self {
        Self { partitions }
    }

    /// Fit the learner on each partition's training side and score it on the
    /// validation side. Each partition trains with a seed bumped from the
    /// learner's own, so folds draw independent randomness yet remain
    /// reproducible.
    ///
    /// # Errors
    ///
    /// Propagates the underlying learner's configuration and training errors.
    #[instrument(skip_all, fields(n_partitions = self.partitions.len()))]
    pub fn evaluate<L: Learner>(
        &self,
        learner: &L,
        x: &[Record],
        y: &[usize],
    ) -> Result<ValidationResult, EvalError> {
        let mut measures = MeasureCollection::new();

        for (fold, partition) in self.partitions.iter().enumerate() {
            let (x_train, y_train) = select(x, y, &partition.train);
            let (x_validation, y_validation) = select(x, y, &partition.validation);

            let fold_learner = learner
                .clone()
                .reseed(learner.seed().wrapping_add(fold as u64));
            let model = fold_learner.fit(&x_train, &y_train)?;

            let estimates = model.estimate_batch(&x_validation);
            let correct = estimates
                .iter()
                .zip(&y_validation)
                .filter(|&(row, &label)| argmax(row) == label)
                .count();
            let accuracy = correct as f64 / y_validation.len() as f64;

            measures.add("accuracy", accuracy);
            measures.add("error", 1.0 - accuracy);
            info!(fold, accuracy, "fold completed");
        }

        Ok(ValidationResult {
            measures,
            n_partitions: self.partitions.len(),
        })
    }
}

/// Measures of a conformal classifier at one significance level, pooled over
/// every validation record of every partition.
#[derive(Debug, Clone, Copy)]
pub struct SignificanceMeasures {
    /// The significance level these measures were taken at.
    pub significance: f64,
    /// Fraction of validation records whose true label fell outside the
    /// prediction region.
    pub error: f64,
    /// Fraction of validation records whose true label had the largest
    /// p-value.
    pub accuracy: f64,
    /// Mean prediction-region size, in labels.
    pub mean_region_size: f64,
    /// Fraction of validation records with a single-label region.
    pub singleton_fraction: f64,
}

/// Results of a conformal validation sweep.
#[derive(Debug)]
pub struct ConformalValidationResult {
    /// One row per evaluated significance level, in ascending order.
    pub levels: Vec<SignificanceMeasures>,
    /// Mean confidence (one minus the second-largest p-value) over all
    /// validation records.
    pub mean_confidence: f64,
    /// Mean credibility (the largest p-value) over all validation records.
    pub mean_credibility: f64,
    /// Number of partitions evaluated.
    pub n_partitions: usize,
}

/// Drives inductive conformal classification over a set of partitions.
///
/// Per partition the training side is split once more into a proper training
/// set and a calibration set; the learner is fitted on the former, the
/// conformal layer is calibrated on the latter, and the validation side is
/// scored at every configured significance level.
#[derive(Debug, Clone)]
pub struct ConformalClassifierValidator {
    partitions: Vec<Partition>,
    calibration_fraction: f64,
    cost: ProbabilityCostFunction,
    significances: Vec<f64>,
}

impl ConformalClassifierValidator {
    /// Create a validator over pre-built partitions, carving off the given
    /// fraction of each partition's training side for calibration.
    ///
    /// Defaults to the margin cost function and significance levels
    /// `0.01..=0.10` in steps of `0.01`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidSplitFraction`] unless
    /// `0 < calibration_fraction < 1`.
    pub fn new(
        partitions: Vec<Partition>,
        calibration_fraction: f64,
    ) -> Result<Self, EvalError> {
        if !(calibration_fraction > 0.0 && calibration_fraction < 1.0) {
            return Err(EvalError::InvalidSplitFraction {
                fraction: calibration_fraction,
            });
        }
        Ok(Self {
            partitions,
            calibration_fraction,
            cost: ProbabilityCostFunction::default(),
            significances: (1..=10).map(|i| f64::from(i) / 100.0).collect(),
        })
    }

    /// Set the cost function turning probability estimates into
    /// nonconformity scores.
    #[must_use]
    pub fn with_cost(mut self, cost: ProbabilityCostFunction) -> Self {
        self.cost = cost;
        self
    }

    /// Set the significance levels to sweep.
    #[must_use]
    pub fn with_significances(mut self, significances: Vec<f64>) -> Self {
        self.significances = significances;
        self
    }

    /// Run the sweep.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::TooFewRecords`] | a partition's training side is too small to split |
    /// | [`EvalError::Tree`] | base-model training failed |
    /// | [`EvalError::Conformal`] | calibration or estimation failed |
    #[instrument(skip_all, fields(n_partitions = self.partitions.len()))]
    pub fn evaluate<L: Learner>(
        &self,
        learner: &L,
        x: &[Record],
        y: &[usize],
    ) -> Result<ConformalValidationResult, EvalError> {
        let n_levels = self.significances.len();
        let mut errors = vec![0usize; n_levels];
        let mut region_sizes = vec![0usize; n_levels];
        let mut singletons = vec![0usize; n_levels];
        let mut correct = 0usize;
        let mut confidence_sum = 0.0;
        let mut credibility_sum = 0.0;
        let mut n_validated = 0usize;

        for (fold, partition) in self.partitions.iter().enumerate() {
            let seed = learner.seed().wrapping_add(fold as u64);
            let (proper, calibration) = self.split_calibration(&partition.train, seed)?;

            let (x_proper, y_proper) = select(x, y, &proper);
            let (x_calibration, y_calibration) = select(x, y, &calibration);
            let (x_validation, y_validation) = select(x, y, &partition.validation);

            let model = learner.clone().reseed(seed).fit(&x_proper, &y_proper)?;
            let mut conformal = InductiveConformalClassifier::new(model, self.cost);
            conformal.calibrate(&x_calibration, &y_calibration)?;

            let p_matrix = conformal.estimate_batch(&x_validation)?;
            for (p_values, &label) in p_matrix.iter().zip(&y_validation) {
                let (confidence, credibility) = confidence_credibility(p_values);
                confidence_sum += confidence;
                credibility_sum += credibility;
                if argmax(p_values) == label {
                    correct += 1;
                }
                for (level, &significance) in self.significances.iter().enumerate() {
                    let size = p_values.iter().filter(|&&p| p > significance).count();
                    region_sizes[level] += size;
                    if size == 1 {
                        singletons[level] += 1;
                    }
                    if p_values[label] <= significance {
                        errors[level] += 1;
                    }
                }
            }
            n_validated += y_validation.len();
            info!(fold, n_validation = y_validation.len(), "fold completed");
        }

        let n = n_validated as f64;
        let accuracy = correct as f64 / n;
        let levels = self
            .significances
            .iter()
            .enumerate()
            .map(|(level, &significance)| SignificanceMeasures {
                significance,
                error: errors[level] as f64 / n,
                accuracy,
                mean_region_size: region_sizes[level] as f64 / n,
                singleton_fraction: singletons[level] as f64 / n,
            })
            .collect();

        Ok(ConformalValidationResult {
            levels,
            mean_confidence: confidence_sum / n,
            mean_credibility: credibility_sum / n,
            n_partitions: self.partitions.len(),
        })
    }

    /// Shuffle a partition's training indices and carve off the calibration
    /// slice, keeping both sides non-empty.
    fn split_calibration(
        &self,
        train: &[usize],
        seed: u64,
    ) -> Result<(Vec<usize>, Vec<usize>), EvalError> {
        if train.len() < 2 {
            return Err(EvalError::TooFewRecords {
                rows: train.len(),
                n_folds: 2,
            });
        }
        let mut indices = train.to_vec();
        indices.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        let n_calibration = ((train.len() as f64 * self.calibration_fraction).round()
            as usize)
            .clamp(1, train.len() - 1);
        let proper = indices[n_calibration..].to_vec();
        let calibration = indices[..n_calibration].to_vec();
        Ok((proper, calibration))
    }
}

#[cfg(test)]
mod tests {
    use sorrel_pattern::records_from_matrix;

    use super::*;
    use crate::partition::{fold_partitions, leave_one_out};

    /// Two-class rising/falling series, linearly separable by shape.
    fn separable(n_per_class: usize) -> (Vec<Record>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_per_class {
            let offset = i as f64 * 0.003;
            rows.push((0..10).map(|j| 0.05 * j as f64 + offset).collect());
            labels.push(0);
            rows.push((0..10).map(|j| 0.7 - 0.05 * j as f64 - offset).collect());
            labels.push(1);
        }
        (records_from_matrix(&rows).unwrap(), labels)
    }

    #[test]
    fn cross_validated_tree_accuracy() {
        let (x, y) = separable(20);
        let partitions = fold_partitions(x.len(), 4, 42).unwrap();
        let validator = ClassifierValidator::new(partitions);
        let learner = PatternTreeConfig::new()
            .with_inspected_patterns(Some(16))
            .with_seed(42);

        let result = validator.evaluate(&learner, &x, &y).unwrap();
        assert_eq!(result.n_partitions, 4);
        assert_eq!(result.measures.values("accuracy").unwrap().len(), 4);
        assert!(
            result.mean_accuracy() > 0.9,
            "mean accuracy = {}",
            result.mean_accuracy()
        );
    }

    #[test]
    fn leave_one_out_validates_every_record_once() {
        let (x, y) = separable(6);
        let validator = ClassifierValidator::new(leave_one_out(x.len()));
        let learner = PatternTreeConfig::new()
            .with_inspected_patterns(Some(8))
            .with_seed(42);

        let result = validator.evaluate(&learner, &x, &y).unwrap();
        assert_eq!(result.n_partitions, x.len());
        // Singleton validation sets make per-fold accuracy 0 or 1.
        for &a in result.measures.values("accuracy").unwrap() {
            assert!(a == 0.0 || a == 1.0);
        }
    }

    #[test]
    fn conformal_sweep_measures() {
        let (x, y) = separable(24);
        let partitions = fold_partitions(x.len(), 3, 42).unwrap();
        let validator = ConformalClassifierValidator::new(partitions, 0.25).unwrap();
        let learner = PatternForestConfig::new(10).unwrap().with_seed(42);

        let result = validator.evaluate(&learner, &x, &y).unwrap();
        assert_eq!(result.levels.len(), 10);
        assert!((result.levels[0].significance - 0.01).abs() < 1e-12);
        assert!((result.levels[9].significance - 0.10).abs() < 1e-12);

        for row in &result.levels {
            assert!((0.0..=1.0).contains(&row.error));
            assert!((0.0..=1.0).contains(&row.singleton_fraction));
            assert!(row.mean_region_size <= 2.0);
        }
        // Regions can only shrink as significance rises.
        for pair in result.levels.windows(2) {
            assert!(pair[1].mean_region_size <= pair[0].mean_region_size + 1e-12);
        }
        assert!(result.mean_credibility > 0.0 && result.mean_credibility <= 1.0);
        assert!(result.mean_confidence > 0.0 && result.mean_confidence <= 1.0);
    }

    #[test]
    fn conformal_validator_rejects_bad_fraction() {
        let partitions = leave_one_out(4);
        assert!(matches!(
            ConformalClassifierValidator::new(partitions.clone(), 0.0),
            Err(EvalError::InvalidSplitFraction { .. })
        ));
        assert!(matches!(
            ConformalClassifierValidator::new(partitions, 1.0),
            Err(EvalError::InvalidSplitFraction { .. })
        ));
    }

    #[test]
    fn conformal_validator_rejects_tiny_training_side() {
        let (x, y) = separable(2);
        let partitions = vec![Partition {
            train: vec![0],
            validation: vec![1, 2, 3],
        }];
        let validator = ConformalClassifierValidator::new(partitions, 0.25).unwrap();
        let learner = PatternTreeConfig::new().with_seed(42);
        assert!(matches!(
            validator.evaluate(&learner, &x, &y),
            Err(EvalError::TooFewRecords { rows: 1, .. })
        ));
    }
}
