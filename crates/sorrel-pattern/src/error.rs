//! Error types for record validation and approximation.

/// Errors from record construction and sequence preprocessing.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// Returned when an empty value sequence is provided as a series.
    #[error("series must be non-empty")]
    EmptySeries,

    /// Returned when a series contains NaN, infinity, or negative infinity.
    #[error("series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a multichannel record has zero channels.
    #[error("multichannel record must have at least one channel")]
    NoChannels,

    /// Returned when a present channel is empty or contains non-finite values.
    #[error("invalid channel {channel}: {source}")]
    InvalidChannel {
        /// Index of the offending channel.
        channel: usize,
        /// The underlying series validation error.
        source: Box<PatternError>,
    },

    /// Returned when PAA is requested with zero segments.
    #[error("segment count must be at least 1")]
    ZeroSegments,
}
