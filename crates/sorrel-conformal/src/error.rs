use sorrel_tree::TreeError;

/// Errors from nonconformity scoring and conformal classification.
#[derive(Debug, thiserror::Error)]
pub enum ConformalError {
    /// Returned when a label outside the classifier's domain is scored.
    #[error("unknown label {label}, classifier has {n_classes} classes")]
    UnknownLabel {
        /// The offending label.
        label: usize,
        /// The classifier's class count.
        n_classes: usize,
    },

    /// Returned when the number of records and labels differ.
    #[error("got {rows} records but {labels} labels")]
    LabelCountMismatch {
        /// Number of records provided.
        rows: usize,
        /// Number of labels provided.
        labels: usize,
    },

    /// Returned when `estimate` is called before `calibrate`.
    #[error("conformal classifier is not calibrated; call calibrate() first")]
    NotCalibrated,

    /// Returned when `calibrate` is called a second time.
    #[error("conformal classifier is already calibrated")]
    AlreadyCalibrated,

    /// Returned when the calibration set is empty, or when no training
    /// record produced an out-of-bag estimate.
    #[error("calibration produced no nonconformity scores")]
    EmptyCalibrationSet,

    /// Returned when a k-NN nonconformity is requested with k = 0.
    #[error("neighbor count k must be at least 1")]
    InvalidNeighborCount,

    /// Returned when a nonconformity scorer is fitted on an empty dataset.
    #[error("training dataset has zero records")]
    EmptyTrainingSet,

    /// Wraps an underlying tree/forest training error.
    #[error(transparent)]
    Tree(#[from] TreeError),
}
