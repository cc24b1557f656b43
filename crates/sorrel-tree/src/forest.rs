//! Bootstrap-bagged pattern forests with parallel training.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use sorrel_pattern::Record;

use crate::class_set::ClassSet;
use crate::classifier::Classifier;
use crate::error::TreeError;
use crate::tree::{PatternTree, PatternTreeConfig, validate_fit};

/// Out-of-bag indicator matrix, `records × trees`.
///
/// Stored as one column per tree so each training task writes exclusively to
/// its own column and columns never contend.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OobMatrix {
    columns: Vec<Vec<bool>>,
}

impl OobMatrix {
    pub(crate) fn from_columns(columns: Vec<Vec<bool>>) -> Self {
        Self { columns }
    }

    /// Number of trees (columns).
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.columns.len()
    }

    /// Number of training records (rows).
    #[must_use]
    pub fn n_records(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// `true` when `record` was out of bag for `tree`.
    #[must_use]
    pub fn is_out_of_bag(&self, record: usize, tree: usize) -> bool {
        self.columns[tree][record]
    }

    /// The indicator column of one tree.
    #[must_use]
    pub fn column(&self, tree: usize) -> &[bool] {
        &self.columns[tree]
    }
}

/// Configuration for a pattern forest.
///
/// Construct via [`PatternForestConfig::new`], then chain `with_*` methods.
/// Per-tree randomness is derived from the forest seed; the tree config's
/// own seed is ignored.
#[derive(Debug, Clone)]
pub struct PatternForestConfig {
    size: usize,
    tree: PatternTreeConfig,
    seed: u64,
}

impl PatternForestConfig {
    /// Create a new config with the given ensemble size.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidTreeCount`] if `size` is zero.
    pub fn new(size: usize) -> Result<Self, TreeError> {
        if size == 0 {
            return Err(TreeError::InvalidTreeCount { n_trees: size });
        }
        Ok(Self {
            size,
            tree: PatternTreeConfig::new(),
            seed: 42,
        })
    }

    /// Set the member tree configuration.
    #[must_use]
    pub fn with_tree(mut self, tree: PatternTreeConfig) -> Self {
        self.tree = tree;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the ensemble size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Return the member tree configuration.
    #[must_use]
    pub fn tree(&self) -> &PatternTreeConfig {
        &self.tree
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fit the forest: one bootstrap resample and one tree per member, in
    /// parallel.
    ///
    /// Any member failure aborts the whole fit and surfaces the underlying
    /// error; a partial forest is never returned.
    ///
    /// # Errors
    ///
    /// Propagates the validation errors of [`PatternTreeConfig::fit`], plus
    /// [`TreeError::InvalidTreeCount`] from construction time.
    #[instrument(skip_all, fields(size = self.size, n_records = x.len()))]
    pub fn fit(&self, x: &[Record], y: &[usize]) -> Result<PatternForest, TreeError> {
        let (domain, width) = validate_fit(x, y, &self.tree)?;
        let n_records = x.len();
        let class_set = ClassSet::from_labels(y, domain);

        info!(
            size = self.size,
            n_records,
            domain,
            width,
            "training pattern forest"
        );

        let mut master_rng = ChaCha8Rng::seed_from_u64(self.seed);
        let member_seeds: Vec<u64> = (0..self.size).map(|_| master_rng.r#gen()).collect();

        let members: Vec<(PatternTree, Vec<bool>)> = member_seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let (in_bag, oob_column) = class_set.bootstrap(n_records, &mut rng);
                let tree = self
                    .tree
                    .fit_with_class_set(x, y, in_bag, domain, width, rng.r#gen())?;
                Ok((tree, oob_column))
            })
            .collect::<Result<_, TreeError>>()?;

        let mut trees = Vec::with_capacity(self.size);
        let mut oob_columns = Vec::with_capacity(self.size);
        for (tree, oob_column) in members {
            trees.push(tree);
            oob_columns.push(oob_column);
        }

        // Average member importances.
        let mut length_importance = vec![0.0; width + 1];
        let mut position_importance = vec![0.0; width];
        for tree in &trees {
            for (total, v) in length_importance.iter_mut().zip(tree.length_importance()) {
                *total += v;
            }
            for (total, v) in position_importance.iter_mut().zip(tree.position_importance()) {
                *total += v;
            }
        }
        let size = self.size as f64;
        length_importance.iter_mut().for_each(|v| *v /= size);
        position_importance.iter_mut().for_each(|v| *v /= size);

        // Class priors from the global label counts.
        let mut priors = vec![0.0; domain];
        for &label in y {
            priors[label] += 1.0;
        }
        priors.iter_mut().for_each(|p| *p /= y.len() as f64);

        debug!(n_trees = trees.len(), "forest training complete");

        Ok(PatternForest {
            trees,
            oob: OobMatrix::from_columns(oob_columns),
            priors,
            n_classes: domain,
            length_importance,
            position_importance,
        })
    }
}

/// A fitted bootstrap ensemble of pattern trees.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PatternForest {
    pub(crate) trees: Vec<PatternTree>,
    pub(crate) oob: OobMatrix,
    pub(crate) priors: Vec<f64>,
    pub(crate) n_classes: usize,
    pub(crate) length_importance: Vec<f64>,
    pub(crate) position_importance: Vec<f64>,
}

impl PatternForest {
    /// The fitted member trees.
    #[must_use]
    pub fn trees(&self) -> &[PatternTree] {
        &self.trees
    }

    /// Number of member trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// The out-of-bag indicator matrix recorded during fitting.
    #[must_use]
    pub fn oob(&self) -> &OobMatrix {
        &self.oob
    }

    /// Class priors from the global training label counts.
    #[must_use]
    pub fn priors(&self) -> &[f64] {
        &self.priors
    }

    /// Per-pattern-length importance, averaged across members.
    #[must_use]
    pub fn length_importance(&self) -> &[f64] {
        &self.length_importance
    }

    /// Per-position importance, averaged across members.
    #[must_use]
    pub fn position_importance(&self) -> &[f64] {
        &self.position_importance
    }

    /// Mean depth of the member trees.
    #[must_use]
    pub fn average_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.depth() as f64).sum::<f64>() / self.trees.len() as f64
    }

    /// Probability estimate for training record `index` using only the trees
    /// for which it was out of bag.
    ///
    /// Returns `None` when every member trained on the record.
    #[must_use]
    pub fn oob_estimate(&self, index: usize, record: &Record) -> Option<Vec<f64>> {
        let mut sum = vec![0.0; self.n_classes];
        let mut n_oob = 0usize;
        for (tree_index, tree) in self.trees.iter().enumerate() {
            if self.oob.is_out_of_bag(index, tree_index) {
                for (s, p) in sum.iter_mut().zip(tree.estimate(record)) {
                    *s += p;
                }
                n_oob += 1;
            }
        }
        if n_oob == 0 {
            return None;
        }
        sum.iter_mut().for_each(|s| *s /= n_oob as f64);
        Some(sum)
    }
}

impl Classifier for PatternForest {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn estimate(&self, record: &Record) -> Vec<f64> {
        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (s, p) in sum.iter_mut().zip(tree.estimate(record)) {
                *s += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.iter_mut().for_each(|s| *s /= n);
        sum
    }
}
