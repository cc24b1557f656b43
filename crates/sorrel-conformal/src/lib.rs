//! Conformal prediction over fitted probabilistic classifiers.
//!
//! Wraps any [`sorrel_tree::Classifier`] to produce nonconformity scores and
//! per-label p-values with guaranteed error-rate bounds: inductive conformal
//! classifiers with an explicit one-time calibration step, and bootstrap
//! conformal classifiers that calibrate from out-of-bag estimates.

mod bootstrap;
mod cost;
mod error;
mod icp;
mod nonconformity;

pub use bootstrap::BootstrapConformalClassifier;
pub use cost::ProbabilityCostFunction;
pub use error::ConformalError;
pub use icp::{InductiveConformalClassifier, confidence_credibility};
pub use nonconformity::{DistanceNonconformity, ProbabilityNonconformity};
