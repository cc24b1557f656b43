//! Train/validation index partitioners.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::EvalError;

/// One train/validation split, as dataset row indices.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Training row indices.
    pub train: Vec<usize>,
    /// Validation row indices.
    pub validation: Vec<usize>,
}

/// Shuffled k-fold partitions: each fold is the validation set exactly once.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`EvalError::InvalidFoldCount`] | `folds < 2` |
/// | [`EvalError::TooFewRecords`] | `folds > n_records` |
pub fn fold_partitions(
    n_records: usize,
    folds: usize,
    seed: u64,
) -> Result<Vec<Partition>, EvalError> {
    if folds < 2 {
        return Err(EvalError::InvalidFoldCount { n_folds: folds });
    }
    if folds > n_records {
        return Err(EvalError::TooFewRecords {
            rows: n_records,
            n_folds: folds,
        });
    }

    let mut indices: Vec<usize> = (0..n_records).collect();
    indices.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let mut partitions = Vec::with_capacity(folds);
    for fold in 0..folds {
        let start = fold * n_records / folds;
        let end = (fold + 1) * n_records / folds;
        let validation = indices[start..end].to_vec();
        let train = indices[..start]
            .iter()
            .chain(&indices[end..])
            .copied()
            .collect();
        partitions.push(Partition { train, validation });
    }
    Ok(partitions)
}

/// Leave-one-out partitions: `n_records` splits, each validating on a single
/// record, every record validated exactly once.
#[must_use]
pub fn leave_one_out(n_records: usize) -> Vec<Partition> {
    (0..n_records)
        .map(|held_out| Partition {
            train: (0..n_records).filter(|&i| i != held_out).collect(),
            validation: vec![held_out],
        })
        .collect()
}

/// One shuffled hold-out split with the given validation fraction.
///
/// The validation side always gets at least one record and never all of them.
///
/// # Errors
///
/// Returns [`EvalError::InvalidSplitFraction`] unless `0 < fraction < 1`, and
/// [`EvalError::TooFewRecords`] when fewer than two records are available.
pub fn split_partition(
    n_records: usize,
    fraction: f64,
    seed: u64,
) -> Result<Partition, EvalError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(EvalError::InvalidSplitFraction { fraction });
    }
    if n_records < 2 {
        return Err(EvalError::TooFewRecords {
            rows: n_records,
            n_folds: 2,
        });
    }

    let mut indices: Vec<usize> = (0..n_records).collect();
    indices.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let n_validation =
        ((n_records as f64 * fraction).round() as usize).clamp(1, n_records - 1);
    Ok(Partition {
        validation: indices[..n_validation].to_vec(),
        train: indices[n_validation..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_cover_every_index_once() {
        let partitions = fold_partitions(23, 5, 42).unwrap();
        assert_eq!(partitions.len(), 5);
        let mut seen = vec![0usize; 23];
        for p in &partitions {
            assert_eq!(p.train.len() + p.validation.len(), 23);
            for &i in &p.validation {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn fold_count_validation() {
        assert!(matches!(
            fold_partitions(10, 1, 42),
            Err(EvalError::InvalidFoldCount { n_folds: 1 })
        ));
        assert!(matches!(
            fold_partitions(3, 5, 42),
            Err(EvalError::TooFewRecords { rows: 3, n_folds: 5 })
        ));
    }

    #[test]
    fn folds_reproducible_with_seed() {
        let a = fold_partitions(20, 4, 9).unwrap();
        let b = fold_partitions(20, 4, 9).unwrap();
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa.validation, pb.validation);
        }
    }

    #[test]
    fn leave_one_out_counts() {
        let n = 17;
        let partitions = leave_one_out(n);
        assert_eq!(partitions.len(), n);
        let mut seen = vec![0usize; n];
        for p in &partitions {
            assert_eq!(p.train.len(), n - 1);
            assert_eq!(p.validation.len(), 1);
            seen[p.validation[0]] += 1;
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn split_respects_fraction() {
        let p = split_partition(100, 0.25, 42).unwrap();
        assert_eq!(p.validation.len(), 25);
        assert_eq!(p.train.len(), 75);
    }

    #[test]
    fn split_fraction_validation() {
        assert!(matches!(
            split_partition(10, 0.0, 42),
            Err(EvalError::InvalidSplitFraction { .. })
        ));
        assert!(matches!(
            split_partition(10, 1.0, 42),
            Err(EvalError::InvalidSplitFraction { .. })
        ));
    }

    #[test]
    fn split_always_keeps_both_sides_non_empty() {
        let p = split_partition(3, 0.01, 42).unwrap();
        assert_eq!(p.validation.len(), 1);
        assert_eq!(p.train.len(), 2);
    }
}
