//! Cost functions turning probability estimates into nonconformity scores.

/// How a probability vector is converted into a nonconformity score for a
/// candidate label. Higher scores mean the pair conforms less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbabilityCostFunction {
    /// `max_{k != label} p_k - p_label`: negative when the candidate label
    /// dominates, positive when some other label does.
    #[default]
    Margin,
    /// `1 - p_label`.
    InverseProbability,
}

impl ProbabilityCostFunction {
    /// Apply the cost function to a probability vector for `label`.
    ///
    /// The label is assumed in range; callers validate against the
    /// classifier domain.
    #[must_use]
    pub fn apply(&self, probabilities: &[f64], label: usize) -> f64 {
        match self {
            ProbabilityCostFunction::Margin => {
                let other_max = probabilities
                    .iter()
                    .enumerate()
                    .filter(|&(k, _)| k != label)
                    .map(|(_, &p)| p)
                    .fold(f64::NEG_INFINITY, f64::max);
                if other_max.is_finite() {
                    other_max - probabilities[label]
                } else {
                    -probabilities[label]
                }
            }
            ProbabilityCostFunction::InverseProbability => 1.0 - probabilities[label],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_fully_conforming() {
        // All mass on the candidate label: score -1.
        let score = ProbabilityCostFunction::Margin.apply(&[0.0, 1.0, 0.0], 1);
        assert!((score - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn margin_near_tie() {
        let score = ProbabilityCostFunction::Margin.apply(&[0.33, 0.33, 0.34], 0);
        assert!((score - 0.01).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn margin_wrong_label_is_positive() {
        let score = ProbabilityCostFunction::Margin.apply(&[0.9, 0.1], 1);
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn inverse_probability() {
        let score = ProbabilityCostFunction::InverseProbability.apply(&[0.25, 0.75], 1);
        assert!((score - 0.25).abs() < 1e-12);
    }
}
