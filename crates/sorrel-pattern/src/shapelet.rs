//! Immutable sub-sequence patterns used as tree split criteria.

use crate::error::PatternError;

/// A labeled sub-sequence of a source series, optionally z-normalized,
/// index-sorted for early abandoning, or bound to one channel of a
/// multichannel record.
///
/// Shapelets are created transiently while a tree node searches for a split
/// and are retained only inside the fitted tree's thresholds, so they own
/// their extracted values rather than borrowing from the source record.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shapelet {
    start: usize,
    values: Vec<f64>,
    /// Visit order for early abandoning: positions sorted by descending
    /// absolute value, so large contributions are accumulated first.
    order: Option<Vec<usize>>,
    channel: Option<usize>,
    normalized: bool,
}

fn z_normalize(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sq_mean = values.iter().map(|v| v * v).sum::<f64>() / n;
    let sigma = if values.len() == 1 {
        0.0
    } else {
        (sq_mean - mean * mean).max(0.0).sqrt()
    };
    if sigma == 0.0 {
        // Zero variance normalizes to the all-zero pattern.
        vec![0.0; values.len()]
    } else {
        values.iter().map(|v| (v - mean) / sigma).collect()
    }
}

impl Shapelet {
    /// Extract a raw (unnormalized) sub-sequence `[start, start + length)`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::EmptySeries`] when the requested window is
    /// empty or extends past the end of `series`.
    pub fn raw(start: usize, length: usize, series: &[f64]) -> Result<Self, PatternError> {
        if length == 0 || start + length > series.len() {
            return Err(PatternError::EmptySeries);
        }
        Ok(Self {
            start,
            values: series[start..start + length].to_vec(),
            order: None,
            channel: None,
            normalized: false,
        })
    }

    /// Extract a z-normalized sub-sequence.
    ///
    /// A window with zero variance (including length-1 windows) normalizes
    /// to all zeros rather than dividing by zero.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::EmptySeries`] for an empty or out-of-range window.
    pub fn normalized(
        start: usize,
        length: usize,
        series: &[f64],
    ) -> Result<Self, PatternError> {
        let mut shapelet = Self::raw(start, length, series)?;
        shapelet.values = z_normalize(&shapelet.values);
        shapelet.normalized = true;
        Ok(shapelet)
    }

    /// Extract a z-normalized sub-sequence with an early-abandon visit order.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::EmptySeries`] for an empty or out-of-range window.
    pub fn index_sorted(
        start: usize,
        length: usize,
        series: &[f64],
    ) -> Result<Self, PatternError> {
        let mut shapelet = Self::normalized(start, length, series)?;
        let mut order: Vec<usize> = (0..shapelet.values.len()).collect();
        order.sort_unstable_by(|&a, &b| {
            shapelet.values[b].abs().total_cmp(&shapelet.values[a].abs())
        });
        shapelet.order = Some(order);
        Ok(shapelet)
    }

    /// Extract a raw sub-sequence of the first-difference transform of
    /// `series` (`d[0] = 0`, `d[j] = x[j] - x[j-1]`).
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::EmptySeries`] for an empty or out-of-range window.
    pub fn derivative(
        start: usize,
        length: usize,
        series: &[f64],
    ) -> Result<Self, PatternError> {
        let mut diff = Vec::with_capacity(series.len());
        diff.push(0.0);
        for j in 1..series.len() {
            diff.push(series[j] - series[j - 1]);
        }
        Self::raw(start, length, &diff)
    }

    /// Bind this shapelet to one channel of a multichannel record.
    #[must_use]
    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Start offset in the source series.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of values in the pattern.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false` for constructed shapelets; see [`Shapelet::raw`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The pattern values (z-normalized when built with
    /// [`Shapelet::normalized`] or [`Shapelet::index_sorted`]).
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Early-abandon visit order, when built with [`Shapelet::index_sorted`].
    #[must_use]
    pub fn order(&self) -> Option<&[usize]> {
        self.order.as_deref()
    }

    /// Channel this shapelet is bound to, for multichannel records.
    #[must_use]
    pub fn channel(&self) -> Option<usize> {
        self.channel
    }

    /// `true` when the stored values are z-normalized.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_extracts_window() {
        let s = Shapelet::raw(1, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.values(), &[2.0, 3.0]);
        assert_eq!(s.start(), 1);
    }

    #[test]
    fn raw_rejects_out_of_range() {
        assert!(Shapelet::raw(2, 3, &[1.0, 2.0, 3.0]).is_err());
        assert!(Shapelet::raw(0, 0, &[1.0]).is_err());
    }

    #[test]
    fn normalized_zero_mean_unit_variance() {
        let s = Shapelet::normalized(0, 4, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mean: f64 = s.values().iter().sum::<f64>() / 4.0;
        let var: f64 = s.values().iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-10, "mean = {mean}");
        assert!((var - 1.0).abs() < 1e-10, "var = {var}");
    }

    #[test]
    fn constant_window_normalizes_to_zero() {
        let s = Shapelet::normalized(0, 3, &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(s.values(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn length_one_window_normalizes_to_zero() {
        let s = Shapelet::normalized(2, 1, &[1.0, 2.0, 7.0]).unwrap();
        assert_eq!(s.values(), &[0.0]);
    }

    #[test]
    fn index_sorted_order_by_magnitude() {
        let s = Shapelet::index_sorted(0, 3, &[0.0, 10.0, 0.0]).unwrap();
        let order = s.order().unwrap();
        // The spike dominates after normalization, so it is visited first.
        assert_eq!(order[0], 1);
    }

    #[test]
    fn derivative_first_difference() {
        let s = Shapelet::derivative(0, 4, &[1.0, 3.0, 6.0, 10.0]).unwrap();
        assert_eq!(s.values(), &[0.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn channel_binding() {
        let s = Shapelet::raw(0, 2, &[1.0, 2.0]).unwrap().with_channel(3);
        assert_eq!(s.channel(), Some(3));
    }
}
