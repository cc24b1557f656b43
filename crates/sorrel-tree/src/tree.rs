//! The randomized pattern/shapelet decision tree learner.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use sorrel_pattern::{PatternDistance, Record, Shapelet, paa};

use crate::class_set::{ClassSet, Example, Sample};
use crate::classifier::Classifier;
use crate::error::TreeError;
use crate::gain::{Assessment, class_set_impurity, f_statistic, weighted_impurity};
use crate::node::{Threshold, TreeNode};
use crate::predict::{PredictStrategy, visit};
use crate::sampler::{Candidate, SampleMode, sample_candidate};

/// Configuration for a single pattern tree.
///
/// Construct via [`PatternTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default                                  |
/// |----------------------|------------------------------------------|
/// | `distance`           | `SlidingEuclidean`                       |
/// | `assessment`         | `InfoGain`                               |
/// | `sample_mode`        | `Normal`                                 |
/// | `strategy`           | `Standard`                               |
/// | `inspected_patterns` | `None` (≈ `sqrt(w·(w+1)/2)` for width w) |
/// | `lower_length`       | 0.01                                     |
/// | `upper_length`       | 1.0                                      |
/// | `min_split_size`     | 1.0                                      |
/// | `aggregate_fraction` | 1.0                                      |
/// | `missing_branch`     | `false` (undefined distances go right)   |
/// | `seed`               | 42                                       |
#[derive(Debug, Clone)]
pub struct PatternTreeConfig {
    pub(crate) distance: PatternDistance,
    pub(crate) assessment: Assessment,
    pub(crate) sample_mode: SampleMode,
    pub(crate) strategy: PredictStrategy,
    pub(crate) inspected_patterns: Option<usize>,
    pub(crate) lower_length: f64,
    pub(crate) upper_length: f64,
    pub(crate) min_split_size: f64,
    pub(crate) aggregate_fraction: f64,
    pub(crate) missing_branch: bool,
    pub(crate) seed: u64,
}

impl PatternTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            distance: PatternDistance::SlidingEuclidean,
            assessment: Assessment::InfoGain,
            sample_mode: SampleMode::Normal,
            strategy: PredictStrategy::Standard,
            inspected_patterns: None,
            lower_length: 0.01,
            upper_length: 1.0,
            min_split_size: 1.0,
            aggregate_fraction: 1.0,
            missing_branch: false,
            seed: 42,
        }
    }

    /// Set the pattern distance function.
    #[must_use]
    pub fn with_distance(mut self, distance: PatternDistance) -> Self {
        self.distance = distance;
        self
    }

    /// Set the split-quality assessment.
    #[must_use]
    pub fn with_assessment(mut self, assessment: Assessment) -> Self {
        self.assessment = assessment;
        self
    }

    /// Set the candidate sampling mode.
    #[must_use]
    pub fn with_sample_mode(mut self, sample_mode: SampleMode) -> Self {
        self.sample_mode = sample_mode;
        self
    }

    /// Set the prediction strategy stored in the fitted tree.
    #[must_use]
    pub fn with_strategy(mut self, strategy: PredictStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the number of candidate patterns inspected per node.
    ///
    /// `None` derives the count from the dataset width.
    #[must_use]
    pub fn with_inspected_patterns(mut self, inspected_patterns: Option<usize>) -> Self {
        self.inspected_patterns = inspected_patterns;
        self
    }

    /// Set the sub-sequence length bounds as fractions of the series length.
    #[must_use]
    pub fn with_length_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_length = lower;
        self.upper_length = upper;
        self
    }

    /// Set the minimum total weight required to attempt a split.
    #[must_use]
    pub fn with_min_split_size(mut self, min_split_size: f64) -> Self {
        self.min_split_size = min_split_size;
        self
    }

    /// Set the PAA reduction fraction used by [`SampleMode::DownSample`].
    #[must_use]
    pub fn with_aggregate_fraction(mut self, aggregate_fraction: f64) -> Self {
        self.aggregate_fraction = aggregate_fraction;
        self
    }

    /// Grow a dedicated child for examples with undefined distances instead
    /// of defaulting them right.
    #[must_use]
    pub fn with_missing_branch(mut self, missing_branch: bool) -> Self {
        self.missing_branch = missing_branch;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the pattern distance function.
    #[must_use]
    pub fn distance(&self) -> PatternDistance {
        self.distance
    }

    /// Return the split-quality assessment.
    #[must_use]
    pub fn assessment(&self) -> Assessment {
        self.assessment
    }

    /// Return the candidate sampling mode.
    #[must_use]
    pub fn sample_mode(&self) -> SampleMode {
        self.sample_mode
    }

    /// Return the prediction strategy.
    #[must_use]
    pub fn strategy(&self) -> PredictStrategy {
        self.strategy
    }

    /// Return the configured candidate count, if fixed.
    #[must_use]
    pub fn inspected_patterns(&self) -> Option<usize> {
        self.inspected_patterns
    }

    /// Return the `(lower, upper)` length fractions.
    #[must_use]
    pub fn length_bounds(&self) -> (f64, f64) {
        (self.lower_length, self.upper_length)
    }

    /// Return the minimum split weight.
    #[must_use]
    pub fn min_split_size(&self) -> f64 {
        self.min_split_size
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fit a pattern tree.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | `x` is empty |
    /// | [`TreeError::LabelCountMismatch`] | `x` and `y` lengths differ |
    /// | [`TreeError::TooFewClasses`] | fewer than 2 distinct labels |
    /// | [`TreeError::InvalidLengthBounds`] | length fractions out of range |
    /// | [`TreeError::InvalidMinSplitSize`] | non-positive split weight |
    /// | [`TreeError::InvalidPatternCount`] | `inspected_patterns == Some(0)` |
    /// | [`TreeError::InvalidAggregateFraction`] | down-sampling fraction out of range |
    #[instrument(skip_all, fields(n_records = x.len()))]
    pub fn fit(&self, x: &[Record], y: &[usize]) -> Result<PatternTree, TreeError> {
        let (domain, width) = validate_fit(x, y, self)?;
        let class_set = ClassSet::from_labels(y, domain);
        self.fit_with_class_set(x, y, class_set, domain, width, self.seed)
    }

    /// Fit on a pre-built (possibly bootstrapped) class set. Inputs are
    /// assumed validated by the caller.
    pub(crate) fn fit_with_class_set(
        &self,
        x: &[Record],
        y: &[usize],
        class_set: ClassSet,
        domain: usize,
        width: usize,
        seed: u64,
    ) -> Result<PatternTree, TreeError> {
        let paa_data = if self.sample_mode == SampleMode::DownSample {
            Some(downsample_records(x, self.aggregate_fraction))
        } else {
            None
        };

        let inspected = self
            .inspected_patterns
            .unwrap_or_else(|| auto_pattern_count(width));

        let mut ctx = BuildContext {
            x: paa_data.as_deref().unwrap_or(x),
            original: x,
            y,
            root_weight: class_set.total_weight(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            inspected,
            length_importance: vec![0.0; width + 1],
            position_importance: vec![0.0; width],
        };

        debug!(domain, width, inspected, "building pattern tree");
        let root = build(self, class_set, &mut ctx);
        let depth = root.depth();
        debug!(depth, n_nodes = root.count(), "pattern tree built");

        Ok(PatternTree {
            root,
            n_classes: domain,
            distance: self.distance,
            strategy: self.strategy,
            length_importance: ctx.length_importance,
            position_importance: ctx.position_importance,
            depth,
        })
    }
}

impl Default for PatternTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Default candidate count derived from the dataset width:
/// `round(sqrt(w * (w + 1) / 2))`.
fn auto_pattern_count(width: usize) -> usize {
    let pairs = (width * (width + 1) / 2) as f64;
    (pairs.sqrt().round() as usize).max(1)
}

/// Validate fit inputs and config; returns `(domain, width)`.
pub(crate) fn validate_fit(
    x: &[Record],
    y: &[usize],
    config: &PatternTreeConfig,
) -> Result<(usize, usize), TreeError> {
    if x.is_empty() {
        return Err(TreeError::EmptyDataset);
    }
    if x.len() != y.len() {
        return Err(TreeError::LabelCountMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }

    let domain = y.iter().max().copied().unwrap_or(0) + 1;
    let mut present = vec![false; domain];
    for &label in y {
        present[label] = true;
    }
    let n_classes = present.iter().filter(|&&p| p).count();
    if n_classes < 2 {
        return Err(TreeError::TooFewClasses { n_classes });
    }

    if !(0.0..=1.0).contains(&config.lower_length)
        || !(0.0..=1.0).contains(&config.upper_length)
        || config.lower_length > config.upper_length
    {
        return Err(TreeError::InvalidLengthBounds {
            lower: config.lower_length,
            upper: config.upper_length,
        });
    }
    if !(config.min_split_size > 0.0) {
        return Err(TreeError::InvalidMinSplitSize {
            min_split_size: config.min_split_size,
        });
    }
    if config.inspected_patterns == Some(0) {
        return Err(TreeError::InvalidPatternCount);
    }
    if config.sample_mode == SampleMode::DownSample
        && !(0.1..=1.0).contains(&config.aggregate_fraction)
    {
        return Err(TreeError::InvalidAggregateFraction {
            fraction: config.aggregate_fraction,
        });
    }

    let width = x.iter().map(Record::width).max().unwrap_or(0);
    Ok((domain, width))
}

fn downsample_series(series: &[f64], fraction: f64) -> Vec<f64> {
    let segments = ((series.len() as f64 * fraction).round() as usize).max(1);
    // Fraction is validated to [0.1, 1.0] before fitting starts.
    paa(series, segments).expect("segment count is at least 1")
}

fn downsample_records(x: &[Record], fraction: f64) -> Vec<Record> {
    x.iter()
        .map(|record| match record {
            Record::Series(values) => Record::Series(downsample_series(values, fraction)),
            Record::Multichannel(channels) => Record::Multichannel(
                channels
                    .iter()
                    .map(|c| c.as_ref().map(|values| downsample_series(values, fraction)))
                    .collect(),
            ),
        })
        .collect()
}

/// Per-build mutable state threaded through the recursion. Owned by a single
/// fit call; ensemble members each get their own.
struct BuildContext<'a> {
    /// Search-space records (a PAA copy under `DownSample`).
    x: &'a [Record],
    /// Original-resolution records.
    original: &'a [Record],
    y: &'a [usize],
    root_weight: f64,
    rng: ChaCha8Rng,
    inspected: usize,
    length_importance: Vec<f64>,
    position_importance: Vec<f64>,
}

struct ThresholdScore {
    threshold: f64,
    impurity: f64,
    gap: f64,
}

struct ScoredCandidate {
    candidate: Candidate,
    score: ThresholdScore,
    /// Distance per dataset row index (NaN where undefined or absent).
    distance_map: Vec<f64>,
}

struct FoundSplit {
    left: ClassSet,
    right: ClassSet,
    missing: ClassSet,
    threshold: Threshold,
    impurity: f64,
}

fn shapelet_distance(distance: PatternDistance, record: &Record, shapelet: &Shapelet) -> f64 {
    let series = match shapelet.channel() {
        Some(channel) => record.channel(channel),
        None => record.as_series(),
    };
    match series {
        Some(series) => distance.compute(series, shapelet),
        None => f64::NAN,
    }
}

/// Compute every example's distance to `shapelet`: a dense per-row map plus
/// the ascending `(distance, example)` list with undefined distances
/// truncated off the tail, and the finite distance sum.
fn candidate_distances(
    data: &[Record],
    class_set: &ClassSet,
    distance: PatternDistance,
    shapelet: &Shapelet,
) -> (Vec<f64>, Vec<(f64, Example)>, f64) {
    let mut map = vec![f64::NAN; data.len()];
    let mut list = Vec::with_capacity(class_set.len());
    let mut sum = 0.0;
    for sample in class_set.samples() {
        for &example in sample.examples() {
            let d = shapelet_distance(distance, &data[example.index()], shapelet);
            map[example.index()] = d;
            list.push((d, example));
            if d.is_finite() {
                sum += d;
            }
        }
    }
    // NaN sorts last under total_cmp, so undefined distances form a tail
    // that the threshold scan must not cross.
    list.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
    if let Some(first_nan) = list.iter().position(|(d, _)| d.is_nan()) {
        list.truncate(first_nan);
    }
    (map, list, sum)
}

/// Scan the sorted distances for the best cut point.
///
/// A cut is only evaluated at the first transition, or where the distance
/// value changes AND the class label changes from the previous position:
/// cutting between examples with identical pattern distance would be an
/// arbitrary, irreproducible choice. The threshold is the midpoint of the
/// two distances bordering the winning cut; ties on impurity are broken by
/// the larger margin gap.
fn find_best_threshold(
    distances: &[(f64, Example)],
    class_set: &ClassSet,
    y: &[usize],
    distance_sum: f64,
) -> ThresholdScore {
    let present = class_set.targets();
    let domain = class_set.domain();
    let mut lt = vec![0.0; domain];
    let mut gt = vec![0.0; domain];
    let mut lt_freq = vec![0.0; present.len()];
    let mut gt_freq = vec![0.0; present.len()];

    let mut lt_weight = 0.0;
    let mut gt_weight = 0.0;
    // All weight starts on the right of the initial threshold.
    for sample in class_set.samples() {
        gt[sample.target()] = sample.weight();
        gt_weight += sample.weight();
    }

    let (first_distance, first) = distances[0];
    let mut prev_target = y[first.index()];
    gt[prev_target] -= first.weight();
    lt[prev_target] += first.weight();
    gt_weight -= first.weight();
    lt_weight += first.weight();

    let mut prev_distance = first_distance;
    let mut lowest_impurity = f64::INFINITY;
    let mut largest_gap = f64::NEG_INFINITY;
    let mut threshold = if first_distance.is_finite() {
        first_distance / 2.0
    } else {
        0.0
    };
    let mut lt_gap = 0.0;
    let mut gt_gap = distance_sum;

    for i in 1..distances.len() {
        let (dist, example) = distances[i];
        let target = y[example.index()];

        if i == 1 || (dist != prev_distance && target != prev_target) {
            for (j, &t) in present.iter().enumerate() {
                lt_freq[j] = if lt_weight != 0.0 { lt[t] / lt_weight } else { 0.0 };
                gt_freq[j] = if gt_weight != 0.0 { gt[t] / gt_weight } else { 0.0 };
            }
            let impurity = weighted_impurity(lt_weight, &lt_freq, gt_weight, &gt_freq);
            let gap = (1.0 / lt_weight) * lt_gap - (1.0 / gt_weight) * gt_gap;
            if impurity < lowest_impurity
                || (impurity == lowest_impurity && gap > largest_gap)
            {
                lowest_impurity = impurity;
                largest_gap = gap;
                threshold = if dist.is_finite() {
                    (dist + prev_distance) / 2.0
                } else {
                    prev_distance
                };
            }
        }

        let weight = example.weight();
        lt_weight += weight;
        gt_weight -= weight;
        lt[target] += weight;
        gt[target] -= weight;
        if dist.is_finite() {
            lt_gap += dist;
            gt_gap -= dist;
            prev_distance = dist;
        }
        prev_target = target;
    }

    ThresholdScore {
        threshold,
        impurity: lowest_impurity,
        gap: largest_gap,
    }
}

fn score_candidate(
    data: &[Record],
    class_set: &ClassSet,
    y: &[usize],
    distance: PatternDistance,
    candidate: Candidate,
) -> Option<ScoredCandidate> {
    let (map, list, sum) = candidate_distances(data, class_set, distance, &candidate.shapelet);
    if list.is_empty() {
        return None;
    }
    let score = find_best_threshold(&list, class_set, y, sum);
    Some(ScoredCandidate {
        candidate,
        score,
        distance_map: map,
    })
}

fn best_by_gain(
    data: &[Record],
    class_set: &ClassSet,
    y: &[usize],
    distance: PatternDistance,
    candidates: Vec<Candidate>,
) -> Option<ScoredCandidate> {
    let mut best: Option<ScoredCandidate> = None;
    for candidate in candidates {
        let Some(scored) = score_candidate(data, class_set, y, distance, candidate) else {
            continue;
        };
        let better = match &best {
            None => scored.score.impurity < f64::INFINITY,
            Some(current) => {
                scored.score.impurity < current.score.impurity
                    || (scored.score.impurity == current.score.impurity
                        && scored.score.gap > current.score.gap)
            }
        };
        if better {
            best = Some(scored);
        }
    }
    best
}

fn best_by_fstat(
    data: &[Record],
    class_set: &ClassSet,
    y: &[usize],
    distance: PatternDistance,
    candidates: Vec<Candidate>,
) -> Option<ScoredCandidate> {
    let domain = class_set.domain();
    let mut best: Option<(f64, Candidate)> = None;
    for candidate in candidates {
        let (_, list, _) = candidate_distances(data, class_set, distance, &candidate.shapelet);
        if list.is_empty() {
            continue;
        }
        let pairs: Vec<(f64, usize)> = list
            .iter()
            .map(|&(d, example)| (d, y[example.index()]))
            .collect();
        let stat = f_statistic(&pairs, domain);
        if best.as_ref().is_none_or(|(current, _)| stat > *current) {
            best = Some((stat, candidate));
        }
    }
    // The midpoint threshold rule runs once, for the winning pattern only.
    let (_, candidate) = best?;
    score_candidate(data, class_set, y, distance, candidate)
}

/// Map a winning PAA-space pattern back to the original resolution and
/// re-score it against the full-resolution data.
fn refine_downsampled(
    config: &PatternTreeConfig,
    class_set: &ClassSet,
    ctx: &BuildContext<'_>,
    best: ScoredCandidate,
) -> Option<ScoredCandidate> {
    let fraction = config.aggregate_fraction;
    let shapelet = &best.candidate.shapelet;
    let record = &ctx.original[best.candidate.example];
    let series = match shapelet.channel() {
        Some(channel) => record.channel(channel)?,
        None => record.as_series()?,
    };

    let length = ((shapelet.len() as f64 / fraction).round() as usize)
        .clamp(2, series.len());
    let start =
        ((shapelet.start() as f64 / fraction).round() as usize).min(series.len() - length);

    let mut refined = Shapelet::index_sorted(start, length, series).ok()?;
    if let Some(channel) = shapelet.channel() {
        refined = refined.with_channel(channel);
    }
    score_candidate(
        ctx.original,
        class_set,
        ctx.y,
        config.distance,
        Candidate {
            shapelet: refined,
            example: best.candidate.example,
        },
    )
}

fn mean_class_distances(distance_map: &[f64], class_set: &ClassSet) -> Vec<f64> {
    let domain = class_set.domain();
    let mut sums = vec![0.0; domain];
    let mut counts = vec![0usize; domain];
    for sample in class_set.samples() {
        for &example in sample.examples() {
            let d = distance_map[example.index()];
            if d.is_finite() {
                sums[sample.target()] += d;
                counts[sample.target()] += 1;
            }
        }
    }
    (0..domain)
        .map(|c| {
            if counts[c] > 0 {
                sums[c] / counts[c] as f64
            } else {
                f64::NAN
            }
        })
        .collect()
}

fn partition(
    distance_map: &[f64],
    class_set: &ClassSet,
    threshold: f64,
    missing_branch: bool,
) -> (ClassSet, ClassSet, ClassSet) {
    let domain = class_set.domain();
    let mut left = ClassSet::new(domain);
    let mut right = ClassSet::new(domain);
    let mut missing = ClassSet::new(domain);

    for sample in class_set.samples() {
        let mut left_sample = Sample::new(sample.target());
        let mut right_sample = Sample::new(sample.target());
        let mut missing_sample = Sample::new(sample.target());

        for &example in sample.examples() {
            let d = distance_map[example.index()];
            if d.is_nan() {
                if missing_branch {
                    missing_sample.add(example);
                } else {
                    right_sample.add(example);
                }
            } else if d <= threshold {
                left_sample.add(example);
            } else {
                right_sample.add(example);
            }
        }

        if !left_sample.is_empty() {
            left.add(left_sample);
        }
        if !right_sample.is_empty() {
            right.add(right_sample);
        }
        if !missing_sample.is_empty() {
            missing.add(missing_sample);
        }
    }

    (left, right, missing)
}

fn find_split(
    config: &PatternTreeConfig,
    class_set: &ClassSet,
    ctx: &mut BuildContext<'_>,
) -> Option<FoundSplit> {
    let mut candidates = Vec::with_capacity(ctx.inspected);
    for _ in 0..ctx.inspected {
        if let Some(candidate) = sample_candidate(
            ctx.x,
            class_set,
            config.sample_mode,
            config.lower_length,
            config.upper_length,
            &mut ctx.rng,
        ) {
            candidates.push(candidate);
        }
    }
    if candidates.is_empty() {
        return None;
    }

    let best = match config.assessment {
        Assessment::InfoGain => {
            best_by_gain(ctx.x, class_set, ctx.y, config.distance, candidates)
        }
        Assessment::FStat => {
            best_by_fstat(ctx.x, class_set, ctx.y, config.distance, candidates)
        }
    }?;

    let best = if config.sample_mode == SampleMode::DownSample {
        refine_downsampled(config, class_set, ctx, best)?
    } else {
        best
    };

    let (left, right, missing) = partition(
        &best.distance_map,
        class_set,
        best.score.threshold,
        config.missing_branch,
    );
    let class_distances = mean_class_distances(&best.distance_map, class_set);

    Some(FoundSplit {
        left,
        right,
        missing,
        threshold: Threshold {
            shapelet: best.candidate.shapelet,
            distance: best.score.threshold,
            class_distances,
        },
        impurity: best.score.impurity,
    })
}

fn build(
    config: &PatternTreeConfig,
    class_set: ClassSet,
    ctx: &mut BuildContext<'_>,
) -> TreeNode {
    let weight = class_set.total_weight() / ctx.root_weight;
    if class_set.total_weight() <= config.min_split_size || class_set.target_count() == 1 {
        return TreeNode::leaf(&class_set, weight);
    }

    let Some(split) = find_split(config, &class_set, ctx) else {
        // No sampling attempt produced a usable pattern: degrade to a leaf.
        return TreeNode::leaf(&class_set, weight);
    };

    // A degenerate cut sends everything one way; collapse instead of
    // creating an empty branch.
    if split.left.is_empty() {
        return TreeNode::leaf(&split.right, split.right.total_weight() / ctx.root_weight);
    }
    if split.right.is_empty() {
        return TreeNode::leaf(&split.left, split.left.total_weight() / ctx.root_weight);
    }

    let impurity_before = class_set_impurity(&class_set);
    let gain_weight = weight * (impurity_before - split.impurity);
    let shapelet = &split.threshold.shapelet;
    if let Some(slot) = ctx.length_importance.get_mut(shapelet.len()) {
        *slot += gain_weight;
    }
    match shapelet.channel() {
        Some(channel) => {
            if let Some(slot) = ctx.position_importance.get_mut(channel) {
                *slot += gain_weight;
            }
        }
        None => {
            let span = shapelet.len() as f64;
            let end = (shapelet.start() + shapelet.len()).min(ctx.position_importance.len());
            for i in shapelet.start()..end {
                ctx.position_importance[i] += gain_weight / span;
            }
        }
    }

    let class_distribution = TreeNode::class_distribution(&class_set);
    let left = build(config, split.left, ctx);
    let right = build(config, split.right, ctx);
    let missing = if split.missing.is_empty() {
        None
    } else {
        Some(Box::new(build(config, split.missing, ctx)))
    };

    TreeNode::Branch {
        left: Box::new(left),
        right: Box::new(right),
        missing,
        threshold: split.threshold,
        class_distribution,
        weight,
    }
}

/// A fitted pattern tree.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PatternTree {
    root: TreeNode,
    n_classes: usize,
    distance: PatternDistance,
    strategy: PredictStrategy,
    length_importance: Vec<f64>,
    position_importance: Vec<f64>,
    depth: usize,
}

impl PatternTree {
    /// The root node.
    #[must_use]
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Maximum depth of the tree (a lone root leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Impurity-reduction mass accumulated per pattern length.
    #[must_use]
    pub fn length_importance(&self) -> &[f64] {
        &self.length_importance
    }

    /// Impurity-reduction mass accumulated per position along the input axis
    /// (per channel for multichannel patterns).
    #[must_use]
    pub fn position_importance(&self) -> &[f64] {
        &self.position_importance
    }
}

impl Classifier for PatternTree {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn estimate(&self, record: &Record) -> Vec<f64> {
        let mut probabilities = visit(&self.root, record, self.distance, self.strategy);
        let sum: f64 = probabilities.iter().sum();
        if sum > 0.0 {
            for p in &mut probabilities {
                *p /= sum;
            }
        }
        probabilities
    }
}
