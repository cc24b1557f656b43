//! Randomized pattern/shapelet decision trees and bootstrap forests.
//!
//! Provides the weighted class-set sampling structure, information-gain and
//! F-statistic split assessment, the recursive shapelet tree learner with
//! interchangeable prediction strategies, parallel bootstrap-bagged forests
//! with out-of-bag tracking, and model serialization.

mod class_set;
mod classifier;
mod error;
mod forest;
mod gain;
mod node;
mod predict;
mod sampler;
mod serialize;
mod tree;

pub use class_set::{ClassSet, Example, Sample};
pub use classifier::Classifier;
pub use error::TreeError;
pub use forest::{OobMatrix, PatternForest, PatternForestConfig};
pub use gain::Assessment;
pub use node::{Threshold, TreeNode};
pub use predict::PredictStrategy;
pub use sampler::SampleMode;
pub use tree::{PatternTree, PatternTreeConfig};
