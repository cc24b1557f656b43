//! Piecewise aggregate approximation.

use crate::error::PatternError;

/// Reduce `series` to `segments` values by averaging equal-width frames.
///
/// When `segments >= series.len()` the series is returned unchanged. Frame
/// boundaries are computed proportionally so all input values contribute to
/// exactly one frame.
///
/// # Errors
///
/// Returns [`PatternError::ZeroSegments`] when `segments` is zero.
pub fn paa(series: &[f64], segments: usize) -> Result<Vec<f64>, PatternError> {
    if segments == 0 {
        return Err(PatternError::ZeroSegments);
    }
    let n = series.len();
    if segments >= n {
        return Ok(series.to_vec());
    }

    let mut out = Vec::with_capacity(segments);
    for s in 0..segments {
        let start = s * n / segments;
        let end = (s + 1) * n / segments;
        let frame = &series[start..end];
        out.push(frame.iter().sum::<f64>() / frame.len() as f64);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_into_frame_means() {
        let out = paa(&[1.0, 3.0, 5.0, 7.0], 2).unwrap();
        assert_eq!(out, vec![2.0, 6.0]);
    }

    #[test]
    fn more_segments_than_values_is_identity() {
        let out = paa(&[1.0, 2.0], 5).unwrap();
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn uneven_frames_cover_all_values() {
        let out = paa(&[1.0, 2.0, 3.0, 4.0, 5.0], 2).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0] - 1.5).abs() < 1e-12);
        assert!((out[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_segments_error() {
        assert!(matches!(paa(&[1.0], 0), Err(PatternError::ZeroSegments)));
    }
}
