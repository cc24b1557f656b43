use sorrel_conformal::ConformalError;
use sorrel_tree::TreeError;

/// Errors from partitioning and validation runs.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Returned when n_folds is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid n_folds value provided.
        n_folds: usize,
    },

    /// Returned when there are fewer records than folds.
    #[error("cannot split {rows} records into {n_folds} folds")]
    TooFewRecords {
        /// Number of records available.
        rows: usize,
        /// The requested number of folds.
        n_folds: usize,
    },

    /// Returned when a hold-out fraction is not strictly between 0 and 1.
    #[error("validation fraction must be in (0, 1), got {fraction}")]
    InvalidSplitFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Wraps an underlying tree/forest training error.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Wraps an underlying conformal classification error.
    #[error(transparent)]
    Conformal(#[from] ConformalError),
}
