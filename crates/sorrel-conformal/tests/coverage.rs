//! Conformal coverage regression tests: inductive and bootstrap classifiers
//! on deterministic synthetic series.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sorrel_conformal::{
    BootstrapConformalClassifier, InductiveConformalClassifier, ProbabilityCostFunction,
};
use sorrel_pattern::{Record, records_from_matrix};
use sorrel_tree::PatternForestConfig;

/// Generate `2 * n_per_class` noisy length-20 series: class 0 rises, class 1
/// falls.
fn make_slopes(n_per_class: usize, seed: u64) -> (Vec<Record>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let len = 20usize;
    let mut rows = Vec::with_capacity(2 * n_per_class);
    let mut labels = Vec::with_capacity(2 * n_per_class);
    for i in 0..(2 * n_per_class) {
        let class = i % 2;
        let row: Vec<f64> = (0..len)
            .map(|j| {
                let trend = if class == 0 {
                    0.05 * j as f64
                } else {
                    1.0 - 0.05 * j as f64
                };
                trend + rng.r#gen::<f64>() * 0.15
            })
            .collect();
        rows.push(row);
        labels.push(class);
    }
    (records_from_matrix(&rows).unwrap(), labels)
}

/// An inductive conformal classifier calibrated on held-out data must cover
/// the true label at significance 0.1 on nearly every test record.
///
/// Reference: observed coverage 1.0 with seed=42, 12 trees.
#[test]
fn inductive_coverage_at_ten_percent() {
    let (x, y) = make_slopes(40, 42);
    let (x_test, y_test) = make_slopes(20, 1337);

    // Proper training on the first two thirds, calibration on the rest.
    let split = 2 * x.len() / 3;
    let forest = PatternForestConfig::new(12)
        .unwrap()
        .with_seed(42)
        .fit(&x[..split], &y[..split])
        .unwrap();
    let mut icp = InductiveConformalClassifier::new(forest, ProbabilityCostFunction::Margin);
    icp.calibrate(&x[split..], &y[split..]).unwrap();

    let mut covered = 0usize;
    for (record, &label) in x_test.iter().zip(&y_test) {
        if icp.predict_region(record, 0.1).unwrap().contains(&label) {
            covered += 1;
        }
    }
    let coverage = covered as f64 / x_test.len() as f64;
    assert!(coverage >= 0.85, "coverage {coverage} < 0.85");
}

/// The bootstrap variant calibrates from out-of-bag estimates and must reach
/// comparable coverage without a held-out calibration set.
#[test]
fn bootstrap_coverage_at_ten_percent() {
    let (x, y) = make_slopes(40, 42);
    let (x_test, y_test) = make_slopes(20, 1337);

    let config = PatternForestConfig::new(20).unwrap().with_seed(42);
    let cc = BootstrapConformalClassifier::fit(&config, ProbabilityCostFunction::Margin, &x, &y)
        .unwrap();
    assert!(cc.calibration_size() > 0);

    let mut covered = 0usize;
    for (record, &label) in x_test.iter().zip(&y_test) {
        if cc.predict_region(record, 0.1).contains(&label) {
            covered += 1;
        }
    }
    let coverage = covered as f64 / x_test.len() as f64;
    assert!(coverage >= 0.85, "coverage {coverage} < 0.85");
}

/// P-values from batch estimation agree with single-record estimation.
#[test]
fn batch_estimates_match_single() {
    let (x, y) = make_slopes(20, 42);
    let split = x.len() / 2;
    let forest = PatternForestConfig::new(8)
        .unwrap()
        .with_seed(42)
        .fit(&x[..split], &y[..split])
        .unwrap();
    let mut icp = InductiveConformalClassifier::new(forest, ProbabilityCostFunction::Margin);
    icp.calibrate(&x[split..], &y[split..]).unwrap();

    let batch = icp.estimate_batch(&x).unwrap();
    for (record, row) in x.iter().zip(&batch) {
        assert_eq!(&icp.estimate(record).unwrap(), row);
    }
}
