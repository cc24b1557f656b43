//! Evaluation harnesses for pattern-tree and conformal classifiers.
//!
//! Provides train/validation partitioners (shuffled k-fold, leave-one-out,
//! hold-out split), a named measure collection with mean/std aggregation, and
//! validators that drive fit + evaluate cycles: a plain classifier validator
//! recording accuracy per partition, and a conformal validator that carves a
//! calibration split per partition and sweeps significance levels.

mod error;
mod measure;
mod partition;
mod validator;

pub use error::EvalError;
pub use measure::MeasureCollection;
pub use partition::{Partition, fold_partitions, leave_one_out, split_partition};
pub use validator::{
    ClassifierValidator, ConformalClassifierValidator, ConformalValidationResult, Learner,
    SignificanceMeasures, ValidationResult,
};
