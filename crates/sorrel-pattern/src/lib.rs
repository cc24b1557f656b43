//! Records, shapelets, and sequence distance primitives.
//!
//! Pure math library — zero I/O. Provides the univariate/multichannel record
//! abstraction, immutable shapelet (sub-sequence) views with normalizing and
//! derivative decorators, the distance strategies used to compare a record
//! against a shapelet (Euclidean, Manhattan, DTW, early-abandon sliding), and
//! piecewise aggregate approximation for down-sampled search.

mod distance;
mod error;
mod paa;
mod record;
mod shapelet;

pub use distance::PatternDistance;
pub use error::PatternError;
pub use paa::paa;
pub use record::{Record, records_from_matrix};
pub use shapelet::Shapelet;
