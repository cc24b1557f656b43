use std::path::PathBuf;

/// Errors from pattern-tree and forest operations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when the training dataset has zero records.
    #[error("training dataset has zero records")]
    EmptyDataset,

    /// Returned when the number of records and labels differ.
    #[error("dataset has {rows} records but {labels} labels")]
    LabelCountMismatch {
        /// Number of input records.
        rows: usize,
        /// Number of labels provided.
        labels: usize,
    },

    /// Returned when fewer than two distinct classes are present.
    #[error("need at least 2 distinct classes, got {n_classes}")]
    TooFewClasses {
        /// Number of distinct classes found in the labels.
        n_classes: usize,
    },

    /// Returned when the shapelet length fractions are out of order or range.
    #[error("length fractions must satisfy 0 <= lower <= upper <= 1, got [{lower}, {upper}]")]
    InvalidLengthBounds {
        /// The lower length fraction provided.
        lower: f64,
        /// The upper length fraction provided.
        upper: f64,
    },

    /// Returned when min_split_size is not positive.
    #[error("min_split_size must be positive, got {min_split_size}")]
    InvalidMinSplitSize {
        /// The invalid min_split_size value provided.
        min_split_size: f64,
    },

    /// Returned when the inspected pattern count is zero.
    #[error("inspected_patterns must be at least 1")]
    InvalidPatternCount,

    /// Returned when the down-sampling aggregate fraction is out of range.
    #[error("aggregate_fraction must be in [0.1, 1.0], got {fraction}")]
    InvalidAggregateFraction {
        /// The invalid aggregate_fraction value provided.
        fraction: f64,
    },

    /// Returned when the ensemble size is zero.
    #[error("forest size must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid size value provided.
        n_trees: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
