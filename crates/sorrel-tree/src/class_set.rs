//! Partition-aware weighted multiset of training examples grouped by class.

use rand::Rng;

/// One training record reference: its dataset row index and current
/// multiplicity (from bootstrap resampling).
///
/// Immutable; [`Example::with_weight`] creates an updated copy.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Example {
    index: usize,
    weight: f64,
}

impl Example {
    /// Create a new example reference.
    #[must_use]
    pub fn new(index: usize, weight: f64) -> Self {
        Self { index, weight }
    }

    /// The dataset row index.
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }

    /// The current weight (multiplicity).
    #[must_use]
    pub fn weight(self) -> f64 {
        self.weight
    }

    /// Return a copy of this example with a new weight.
    #[must_use]
    pub fn with_weight(self, weight: f64) -> Self {
        Self {
            index: self.index,
            weight,
        }
    }
}

/// An ordered multiset of examples sharing one class label.
#[derive(Debug, Clone)]
pub struct Sample {
    target: usize,
    examples: Vec<Example>,
    weight: f64,
}

impl Sample {
    /// Create an empty sample for the given class label.
    #[must_use]
    pub fn new(target: usize) -> Self {
        Self {
            target,
            examples: Vec::new(),
            weight: 0.0,
        }
    }

    /// Append an example, accumulating its weight.
    pub fn add(&mut self, example: Example) {
        self.weight += example.weight();
        self.examples.push(example);
    }

    /// The class label all examples in this sample share.
    #[must_use]
    pub fn target(&self) -> usize {
        self.target
    }

    /// Total weight of all examples in this sample.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Number of examples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// `true` when the sample holds no examples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// The examples in insertion order.
    #[must_use]
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Draw one example uniformly at random.
    ///
    /// # Panics
    ///
    /// Panics when the sample is empty; [`ClassSet`] never stores empty samples.
    #[must_use]
    pub fn random_example(&self, rng: &mut impl Rng) -> Example {
        self.examples[rng.gen_range(0..self.examples.len())]
    }
}

/// Weighted examples partitioned by class label.
///
/// The domain (number of class ids, `0..domain`) is fixed at construction and
/// survives filtering, so descendant sets produced by a split can still
/// reference absent classes with zero weight.
#[derive(Debug, Clone)]
pub struct ClassSet {
    samples: Vec<Option<Sample>>,
    total_weight: f64,
}

impl ClassSet {
    /// Create an empty class set over `domain` class ids.
    #[must_use]
    pub fn new(domain: usize) -> Self {
        Self {
            samples: (0..domain).map(|_| None).collect(),
            total_weight: 0.0,
        }
    }

    /// Build the root class set from a label sequence, one unit-weight
    /// example per record.
    #[must_use]
    pub fn from_labels(labels: &[usize], domain: usize) -> Self {
        let mut set = Self::new(domain);
        let mut samples: Vec<Option<Sample>> = (0..domain).map(|_| None).collect();
        for (index, &target) in labels.iter().enumerate() {
            samples[target]
                .get_or_insert_with(|| Sample::new(target))
                .add(Example::new(index, 1.0));
        }
        for sample in samples.into_iter().flatten() {
            set.add(sample);
        }
        set
    }

    /// Insert a non-empty per-class sample.
    pub fn add(&mut self, sample: Sample) {
        self.total_weight += sample.weight();
        let target = sample.target();
        self.samples[target] = Some(sample);
    }

    /// The sample for `target`, if present.
    #[must_use]
    pub fn get(&self, target: usize) -> Option<&Sample> {
        self.samples.get(target).and_then(Option::as_ref)
    }

    /// Iterate all non-empty per-class samples.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().flatten()
    }

    /// Iterate every example across all classes.
    pub fn examples(&self) -> impl Iterator<Item = Example> + '_ {
        self.samples().flat_map(|s| s.examples().iter().copied())
    }

    /// Class labels currently present.
    #[must_use]
    pub fn targets(&self) -> Vec<usize> {
        self.samples().map(Sample::target).collect()
    }

    /// The full label universe (number of class ids).
    #[must_use]
    pub fn domain(&self) -> usize {
        self.samples.len()
    }

    /// Sum of all example weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Number of classes with at least one example.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.samples().count()
    }

    /// Number of examples across all classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples().map(Sample::len).sum()
    }

    /// `true` when no class has any example.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples().next().is_none()
    }

    /// Draw one non-empty class uniformly at random.
    ///
    /// Combined with [`Sample::random_example`], this yields the
    /// class-uniform-then-example-uniform draw used for shapelet sampling:
    /// deliberately NOT uniform over examples, so overrepresented classes do
    /// not dominate the candidate pool.
    #[must_use]
    pub fn random_sample(&self, rng: &mut impl Rng) -> Option<&Sample> {
        let count = self.target_count();
        if count == 0 {
            return None;
        }
        self.samples().nth(rng.gen_range(0..count))
    }

    /// Bootstrap-resample this set.
    ///
    /// Draws `n_records` indices uniformly with replacement from
    /// `[0, n_records)` and tallies them. Examples drawn zero times become
    /// out-of-bag (marked in the returned indicator column); the rest are
    /// inserted into the in-bag set with `weight * count`.
    #[must_use]
    pub fn bootstrap(&self, n_records: usize, rng: &mut impl Rng) -> (ClassSet, Vec<bool>) {
        let mut counts = vec![0usize; n_records];
        for _ in 0..n_records {
            counts[rng.gen_range(0..n_records)] += 1;
        }

        let mut in_bag = ClassSet::new(self.domain());
        let mut oob = vec![false; n_records];
        for sample in self.samples() {
            let mut in_sample = Sample::new(sample.target());
            for &example in sample.examples() {
                let count = counts[example.index()];
                if count > 0 {
                    in_sample.add(example.with_weight(example.weight() * count as f64));
                } else {
                    oob[example.index()] = true;
                }
            }
            if !in_sample.is_empty() {
                in_bag.add(in_sample);
            }
        }
        (in_bag, oob)
    }
}
