//! Training/prediction record types with validation guarantees.

use crate::error::PatternError;

fn validate_series(values: &[f64]) -> Result<(), PatternError> {
    if values.is_empty() {
        return Err(PatternError::EmptySeries);
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(PatternError::NonFiniteValue { index });
    }
    Ok(())
}

/// One input record: a single numeric sequence, or several per-channel
/// sequences where individual channels may be missing.
///
/// Validated on construction: present sequences are non-empty and all finite.
/// Missing data is expressed as a `None` channel, never as NaN values inside
/// a series.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Record {
    /// A univariate sequence.
    Series(Vec<f64>),
    /// A multichannel sequence; `None` marks a missing channel.
    Multichannel(Vec<Option<Vec<f64>>>),
}

impl Record {
    /// Create a univariate record.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PatternError::EmptySeries`] | `values` is empty |
    /// | [`PatternError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn series(values: Vec<f64>) -> Result<Self, PatternError> {
        validate_series(&values)?;
        Ok(Record::Series(values))
    }

    /// Create a multichannel record; `None` entries are missing channels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PatternError::NoChannels`] | `channels` is empty |
    /// | [`PatternError::InvalidChannel`] | A present channel is empty or non-finite |
    pub fn multichannel(channels: Vec<Option<Vec<f64>>>) -> Result<Self, PatternError> {
        if channels.is_empty() {
            return Err(PatternError::NoChannels);
        }
        for (channel, values) in channels.iter().enumerate() {
            if let Some(values) = values {
                validate_series(values).map_err(|source| PatternError::InvalidChannel {
                    channel,
                    source: Box::new(source),
                })?;
            }
        }
        Ok(Record::Multichannel(channels))
    }

    /// Return `true` for multichannel records.
    #[must_use]
    pub fn is_multichannel(&self) -> bool {
        matches!(self, Record::Multichannel(_))
    }

    /// Return the series length (univariate) or the channel count.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Record::Series(values) => values.len(),
            Record::Multichannel(channels) => channels.len(),
        }
    }

    /// Return `true` if the record holds no values.
    ///
    /// Records constructed via [`Record::series`] or [`Record::multichannel`]
    /// are never empty; provided to satisfy the `len_without_is_empty`
    /// convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return channel `index`, or `None` when missing or out of range.
    ///
    /// For univariate records only channel 0 exists (the series itself).
    #[must_use]
    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        match self {
            Record::Series(values) => (index == 0).then_some(values.as_slice()),
            Record::Multichannel(channels) => {
                channels.get(index).and_then(|c| c.as_deref())
            }
        }
    }

    /// Return the underlying series of a univariate record.
    #[must_use]
    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            Record::Series(values) => Some(values.as_slice()),
            Record::Multichannel(_) => None,
        }
    }

    /// Length of the longest numeric sequence in this record.
    ///
    /// Used to size position/length importance accumulators.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Record::Series(values) => values.len(),
            Record::Multichannel(channels) => channels
                .iter()
                .filter_map(|c| c.as_ref().map(Vec::len))
                .max()
                .unwrap_or(0),
        }
    }
}

/// Wrap a row-major numeric matrix into univariate records.
///
/// Satisfies the 2-D container contract of the tree/forest public APIs:
/// `rows[i][j]` is feature `j` of record `i`.
///
/// # Errors
///
/// Returns the first row validation error encountered.
pub fn records_from_matrix(rows: &[Vec<f64>]) -> Result<Vec<Record>, PatternError> {
    rows.iter().map(|row| Record::series(row.clone())).collect()
}
