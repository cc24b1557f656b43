//! Candidate pattern sampling policies.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use sorrel_pattern::{Record, Shapelet};

use crate::class_set::ClassSet;

/// How candidate patterns are drawn at each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum SampleMode {
    /// Z-normalized index-sorted sub-sequences of randomly drawn examples.
    #[default]
    Normal,
    /// As `Normal`, but with 50% probability the window is taken from the
    /// first-difference transform of the example instead.
    Derivative,
    /// The window is averaged over ten class-balanced example draws at the
    /// same position before normalization.
    Randomize,
    /// Search runs on a piecewise-aggregate-approximated copy of the data;
    /// the winning pattern is refined against the original resolution.
    DownSample,
}

/// A sampled candidate: the pattern plus the example it was cut from (needed
/// to refine down-sampled winners against the original data).
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) shapelet: Shapelet,
    pub(crate) example: usize,
}

/// Random window bounds: length uniform in the clamped fraction range,
/// start uniform over the remaining room. `None` when the series is too
/// short to honor the minimum length of 2.
fn random_window(
    len: usize,
    lower: f64,
    upper: f64,
    rng: &mut ChaCha8Rng,
) -> Option<(usize, usize)> {
    let lo = ((len as f64 * lower).round() as usize).max(2);
    let hi = ((len as f64 * upper).round() as usize).min(len);
    if lo > hi {
        return None;
    }
    let length = rng.gen_range(lo..=hi);
    let start = rng.gen_range(0..=(len - length));
    Some((start, length))
}

fn sample_series(
    series: &[f64],
    x: &[Record],
    class_set: &ClassSet,
    channel: Option<usize>,
    mode: SampleMode,
    lower: f64,
    upper: f64,
    rng: &mut ChaCha8Rng,
) -> Option<Shapelet> {
    let (start, length) = random_window(series.len(), lower, upper, rng)?;
    match mode {
        SampleMode::Normal | SampleMode::DownSample => {
            Shapelet::index_sorted(start, length, series).ok()
        }
        SampleMode::Derivative => {
            if rng.gen_bool(0.5) {
                Shapelet::derivative(start, length, series).ok()
            } else {
                Shapelet::index_sorted(start, length, series).ok()
            }
        }
        SampleMode::Randomize => {
            // Mean of several class-balanced draws at the same window.
            let mut mean = vec![0.0; length];
            let mut contributors = 0usize;
            for _ in 0..10 {
                let example = class_set.random_sample(rng)?.random_example(rng);
                let record = &x[example.index()];
                let drawn = match channel {
                    Some(c) => record.channel(c),
                    None => record.as_series(),
                };
                if let Some(drawn) = drawn
                    && start + length <= drawn.len()
                {
                    for (m, &v) in mean.iter_mut().zip(&drawn[start..start + length]) {
                        *m += v;
                    }
                    contributors += 1;
                }
            }
            if contributors == 0 {
                return None;
            }
            for m in &mut mean {
                *m /= contributors as f64;
            }
            Shapelet::index_sorted(0, length, &mean).ok()
        }
    }
}

/// Draw one candidate pattern: a random example via the class-uniform draw,
/// a random channel for multichannel records, then a random window per the
/// active sampling mode. Returns `None` when no valid pattern can be cut
/// (record too short, all channels missing).
pub(crate) fn sample_candidate(
    x: &[Record],
    class_set: &ClassSet,
    mode: SampleMode,
    lower: f64,
    upper: f64,
    rng: &mut ChaCha8Rng,
) -> Option<Candidate> {
    let example = class_set.random_sample(rng)?.random_example(rng);
    let record = &x[example.index()];

    if record.is_multichannel() {
        let present: Vec<usize> = (0..record.len())
            .filter(|&c| record.channel(c).is_some())
            .collect();
        if present.is_empty() {
            return None;
        }
        let channel = present[rng.gen_range(0..present.len())];
        let series = record.channel(channel)?;
        let shapelet =
            sample_series(series, x, class_set, Some(channel), mode, lower, upper, rng)?
                .with_channel(channel);
        Some(Candidate {
            shapelet,
            example: example.index(),
        })
    } else {
        let series = record.as_series()?;
        let shapelet = sample_series(series, x, class_set, None, mode, lower, upper, rng)?;
        Some(Candidate {
            shapelet,
            example: example.index(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn records(rows: &[Vec<f64>]) -> Vec<Record> {
        rows.iter()
            .map(|r| Record::series(r.clone()).unwrap())
            .collect()
    }

    #[test]
    fn window_respects_minimum_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            let (start, length) = random_window(10, 0.01, 1.0, &mut rng).unwrap();
            assert!(length >= 2);
            assert!(start + length <= 10);
        }
    }

    #[test]
    fn window_on_short_series() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        // A length-4 series still yields windows of length 2..=4.
        for _ in 0..100 {
            let (start, length) = random_window(4, 0.01, 1.0, &mut rng).unwrap();
            assert!((2..=4).contains(&length));
            assert!(start + length <= 4);
        }
    }

    #[test]
    fn window_too_short_returns_none() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(random_window(1, 0.01, 1.0, &mut rng).is_none());
    }

    #[test]
    fn normal_mode_samples_normalized_patterns() {
        let x = records(&[vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![5.0, 4.0, 3.0, 2.0, 1.0]]);
        let set = ClassSet::from_labels(&[0, 1], 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let candidate =
            sample_candidate(&x, &set, SampleMode::Normal, 0.01, 1.0, &mut rng).unwrap();
        assert!(candidate.shapelet.is_normalized());
        assert!(candidate.shapelet.order().is_some());
        assert!(candidate.example < 2);
    }

    #[test]
    fn multichannel_candidates_are_channel_bound() {
        let record = Record::multichannel(vec![
            Some(vec![1.0, 2.0, 3.0, 4.0]),
            None,
            Some(vec![4.0, 3.0, 2.0, 1.0]),
        ])
        .unwrap();
        let x = vec![record.clone(), record];
        let set = ClassSet::from_labels(&[0, 1], 2);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            let candidate =
                sample_candidate(&x, &set, SampleMode::Normal, 0.01, 1.0, &mut rng).unwrap();
            let channel = candidate.shapelet.channel().unwrap();
            assert!(channel == 0 || channel == 2, "missing channel was drawn");
        }
    }

    #[test]
    fn all_channels_missing_yields_none() {
        // Multichannel records must carry at least one channel slot; a record
        // whose only channel is missing cannot produce a candidate.
        let record = Record::multichannel(vec![None, Some(vec![1.0])]).unwrap();
        let x = vec![record];
        let set = ClassSet::from_labels(&[0], 1);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        // Channel 1 is present but length 1 is below the minimum window.
        assert!(sample_candidate(&x, &set, SampleMode::Normal, 0.01, 1.0, &mut rng).is_none());
    }

    #[test]
    fn randomize_mode_produces_candidates() {
        let x = records(&[
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![1.1, 2.1, 3.1, 4.1, 5.1, 6.1],
            vec![6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        ]);
        let set = ClassSet::from_labels(&[0, 0, 1], 2);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let candidate =
            sample_candidate(&x, &set, SampleMode::Randomize, 0.01, 1.0, &mut rng).unwrap();
        assert!(candidate.shapelet.is_normalized());
        assert_eq!(candidate.shapelet.start(), 0);
    }
}
