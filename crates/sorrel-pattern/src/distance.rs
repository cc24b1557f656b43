//! Sequence distance strategies.

use crate::shapelet::Shapelet;

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
        vec![0.0; values.len()]
    } else {
        values.iter().map(|v| (v - mean) / sigma).collect()
    }
}

#[inline]
fn normalize(value: f64, mean: f64, sigma: f64) -> f64 {
    if sigma == 0.0 { 0.0 } else { (value - mean) / sigma }
}

/// Distance strategy for comparing a numeric sequence against a pattern.
///
/// A closed set selected at configuration time. Length mismatches are never
/// an error: the shorter operand is treated as the pattern and the longer as
/// the sequence it is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub enum PatternDistance {
    /// Pointwise Euclidean distance over the common prefix.
    Euclidean,
    /// Pointwise absolute-difference distance over the common prefix.
    Manhattan,
    /// Dynamic time warping with an optional Sakoe-Chiba band.
    ///
    /// `band < 0` means unconstrained; otherwise the warping window for row
    /// `i` is limited to columns within `max(band, |n - m|)` of `i`.
    Dtw {
        /// Band width; negative disables the constraint.
        band: i32,
    },
    /// Z-normalized sliding-window Euclidean distance with early abandoning.
    ///
    /// The default for shapelet search: the pattern slides along the longer
    /// sequence, each window is z-normalized incrementally, and the inner
    /// accumulation aborts once it exceeds the best window seen so far.
    #[default]
    SlidingEuclidean,
}

impl PatternDistance {
    /// Distance from a record sequence to a shapelet.
    ///
    /// For [`PatternDistance::SlidingEuclidean`] the shapelet's stored
    /// (z-normalized) values and early-abandon order are used directly when
    /// the shapelet is the shorter operand.
    #[must_use]
    pub fn compute(&self, series: &[f64], shapelet: &Shapelet) -> f64 {
        match self {
            PatternDistance::SlidingEuclidean => {
                if shapelet.len() <= series.len() {
                    let normalized;
                    let pattern = if shapelet.is_normalized() {
                        shapelet.values()
                    } else {
                        normalized = z_normalize(shapelet.values());
                        &normalized
                    };
                    sliding(pattern, shapelet.order(), series)
                } else {
                    // The record is shorter: it becomes the sliding pattern.
                    sliding(&z_normalize(series), None, shapelet.values())
                }
            }
            _ => self.between(series, shapelet.values()),
        }
    }

    /// Distance between two raw sequences.
    #[must_use]
    pub fn between(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            PatternDistance::Euclidean => {
                let n = a.len().min(b.len());
                let sum: f64 = (0..n).map(|i| (a[i] - b[i]).powi(2)).sum();
                sum.sqrt()
            }
            PatternDistance::Manhattan => {
                let n = a.len().min(b.len());
                (0..n).map(|i| (a[i] - b[i]).abs()).sum()
            }
            PatternDistance::Dtw { band } => dtw(a, b, *band),
            PatternDistance::SlidingEuclidean => {
                if a.len() <= b.len() {
                    sliding(&z_normalize(a), None, b)
                } else {
                    sliding(&z_normalize(b), None, a)
                }
            }
        }
    }
}

/// Dynamic time warping over the full cost matrix.
///
/// The matrix is seeded with +∞ except `dtw[0][0] = 0`; the pointwise cost is
/// the squared difference and the result is the accumulated cost at
/// `dtw[n-1][m-1]`.
fn dtw(a: &[f64], b: &[f64], band: i32) -> f64 {
    let n = a.len();
    let m = b.len();
    if n == 0 || m == 0 {
        return f64::INFINITY;
    }

    let mut cost = vec![f64::INFINITY; n * m];
    cost[0] = 0.0;

    let width = (band.max(0) as usize).max(n.abs_diff(m));
    for i in 1..n {
        let (start, end) = if band < 0 {
            (1, m)
        } else {
            (i.saturating_sub(width).max(1), (i + width).min(m))
        };
        for j in start..end {
            let d = a[i] - b[j];
            let step = cost[(i - 1) * m + j]
                .min(cost[i * m + j - 1])
                .min(cost[(i - 1) * m + j - 1]);
            cost[i * m + j] = d * d + step;
        }
    }

    cost[n * m - 1]
}

/// Slide a z-normalized pattern along `series`, z-normalizing each window
/// incrementally from running sum/sum-of-squares, and return
/// `sqrt(min_window_sum / pattern_len)`.
///
/// A circular buffer of twice the pattern length keeps every window
/// contiguous; the inner accumulation visits positions in `order` (largest
/// normalized magnitude first) and abandons once the partial sum exceeds the
/// best complete window so far.
fn sliding(pattern: &[f64], order: Option<&[usize]>, series: &[f64]) -> f64 {
    let m = pattern.len();
    debug_assert!(m <= series.len());

    let mut buf = vec![0.0; 2 * m];
    let mut ex = 0.0;
    let mut ex2 = 0.0;
    let mut best = f64::INFINITY;

    for (i, &d) in series.iter().enumerate() {
        ex += d;
        ex2 += d * d;
        buf[i % m] = d;
        buf[i % m + m] = d;

        if i >= m - 1 {
            let j = (i + 1) % m;
            let mean = ex / m as f64;
            let sigma = (ex2 / m as f64 - mean * mean).max(0.0).sqrt();

            let mut sum = 0.0;
            for k in 0..m {
                if sum >= best {
                    break;
                }
                let p = order.map_or(k, |o| o[k]);
                let x = normalize(buf[p + j], mean, sigma) - pattern[p];
                sum += x * x;
            }
            if sum < best {
                best = sum;
            }

            ex -= buf[j];
            ex2 -= buf[j] * buf[j];
        }
    }

    (best / m as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_prefix() {
        let d = PatternDistance::Euclidean.between(&[0.0, 3.0], &[4.0, 3.0, 9.0]);
        assert!((d - 4.0).abs() < 1e-12);
    }

    #[test]
    fn manhattan_prefix() {
        let d = PatternDistance::Manhattan.between(&[1.0, -1.0], &[2.0, 1.0]);
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn dtw_identical_series_is_zero() {
        let s = [1.0, 2.0, 3.0, 2.0, 1.0];
        let d = PatternDistance::Dtw { band: -1 }.between(&s, &s);
        assert!(d.abs() < 1e-12, "dtw(s, s) = {d}");
    }

    #[test]
    fn dtw_banded_identical_series_is_zero() {
        let s = [0.5, 1.5, 0.5, 1.5, 0.5, 1.5];
        let d = PatternDistance::Dtw { band: 1 }.between(&s, &s);
        assert!(d.abs() < 1e-12);
    }

    #[test]
    fn dtw_warps_shifted_step() {
        // A step function and its one-step-delayed copy align with zero cost
        // along the warped path.
        let a = [0.0, 0.0, 1.0, 1.0, 1.0];
        let b = [0.0, 0.0, 0.0, 1.0, 1.0];
        let d = PatternDistance::Dtw { band: -1 }.between(&a, &b);
        assert!(d.abs() < 1e-12, "warped distance = {d}");
    }

    #[test]
    fn sliding_contained_window_is_zero() {
        let series = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let shapelet = Shapelet::index_sorted(2, 4, &series).unwrap();
        let d = PatternDistance::SlidingEuclidean.compute(&series, &shapelet);
        assert!(d.abs() < 1e-9, "contained window distance = {d}");
    }

    #[test]
    fn sliding_whole_series_is_zero() {
        let series = [1.0, 2.0, 4.0, 8.0];
        let shapelet = Shapelet::normalized(0, 4, &series).unwrap();
        let d = PatternDistance::SlidingEuclidean.compute(&series, &shapelet);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn sliding_order_matches_unordered() {
        let series: Vec<f64> = (0..32).map(|i| ((i * 7) % 13) as f64).collect();
        let with_order = Shapelet::index_sorted(3, 6, &series).unwrap();
        let without = Shapelet::normalized(3, 6, &series).unwrap();
        let probe: Vec<f64> = (0..32).map(|i| ((i * 5) % 11) as f64).collect();
        let a = PatternDistance::SlidingEuclidean.compute(&probe, &with_order);
        let b = PatternDistance::SlidingEuclidean.compute(&probe, &without);
        assert!((a - b).abs() < 1e-9, "{a} vs {b}");
    }

    #[test]
    fn sliding_swaps_when_pattern_longer() {
        let shapelet = Shapelet::normalized(0, 6, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let d = PatternDistance::SlidingEuclidean.compute(&[1.0, 2.0, 3.0], &shapelet);
        assert!(d.is_finite());
    }

    #[test]
    fn sliding_flat_window_uses_zero_normalization() {
        let shapelet = Shapelet::normalized(0, 2, &[1.0, 2.0]).unwrap();
        let d = PatternDistance::SlidingEuclidean.compute(&[5.0, 5.0, 5.0], &shapelet);
        assert!(d.is_finite());
    }
}
