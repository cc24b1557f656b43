//! Named measure aggregation across validation runs.

use std::collections::BTreeMap;

/// A collection of named measure series, one value appended per partition
/// (or per record, for pooled measures), with mean/std aggregation.
#[derive(Debug, Clone, Default)]
pub struct MeasureCollection {
    measures: BTreeMap<String, Vec<f64>>,
}

impl MeasureCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to the named measure series.
    pub fn add(&mut self, name: &str, value: f64) {
        self.measures.entry(name.to_string()).or_default().push(value);
    }

    /// The recorded values of a measure, in insertion order.
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[f64]> {
        self.measures.get(name).map(Vec::as_slice)
    }

    /// Mean of a measure series; `None` for unknown names.
    #[must_use]
    pub fn mean(&self, name: &str) -> Option<f64> {
        let values = self.measures.get(name)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Population standard deviation of a measure series.
    #[must_use]
    pub fn std(&self, name: &str) -> Option<f64> {
        let values = self.measures.get(name)?;
        let mean = self.mean(name)?;
        let variance =
            values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        Some(variance.sqrt())
    }

    /// Iterate the measure names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.measures.keys().map(String::as_str)
    }

    /// Number of distinct measures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.measures.len()
    }

    /// `true` when no measure has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std() {
        let mut measures = MeasureCollection::new();
        measures.add("accuracy", 0.8);
        measures.add("accuracy", 1.0);
        assert!((measures.mean("accuracy").unwrap() - 0.9).abs() < 1e-12);
        assert!((measures.std("accuracy").unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn unknown_measure_is_none() {
        let measures = MeasureCollection::new();
        assert!(measures.mean("accuracy").is_none());
        assert!(measures.std("accuracy").is_none());
        assert!(measures.values("accuracy").is_none());
    }

    #[test]
    fn names_are_sorted() {
        let mut measures = MeasureCollection::new();
        measures.add("error", 0.1);
        measures.add("accuracy", 0.9);
        let names: Vec<&str> = measures.names().collect();
        assert_eq!(names, vec!["accuracy", "error"]);
        assert_eq!(measures.len(), 2);
    }

    #[test]
    fn values_keep_insertion_order() {
        let mut measures = MeasureCollection::new();
        measures.add("error", 0.3);
        measures.add("error", 0.1);
        assert_eq!(measures.values("error").unwrap(), &[0.3, 0.1]);
    }
}
