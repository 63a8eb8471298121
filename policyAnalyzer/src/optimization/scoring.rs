// Scoring module - collapses a metric vector into a single 0-100 composite score
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::metrics::{MetricName, MetricVector};
use crate::config::analysis_config::{default_weights, NormalizationRanges};
use crate::config::constants::MAX_SCORE;
use crate::error::{AnalysisError, AnalysisResult};
use crate::utils::logging::{self, OperationCategory, OptimizationType};

/// Per-metric weights for the composite score.
///
/// Weights are not renormalized: the score is the weighted sum of normalized metrics, so it
/// only stays within 0-100 when the caller's weights sum to 1. Metrics without a weight
/// contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreWeights(pub BTreeMap<MetricName, f64>);

impl Default for ScoreWeights {
    fn default() -> Self {
        Self(default_weights())
    }
}

impl ScoreWeights {
    pub fn new(weights: BTreeMap<MetricName, f64>) -> Self {
        Self(weights)
    }

    /// Builds weights from free-form metric names; names that match no metric are skipped.
    pub fn from_named<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut weights = BTreeMap::new();
        for (name, weight) in entries {
            match name.parse::<MetricName>() {
                Ok(metric) => {
                    weights.insert(metric, weight);
                }
                Err(_) => debug!(name, "ignoring weight for unknown metric"),
            }
        }
        Self(weights)
    }

    pub fn get(&self, metric: MetricName) -> f64 {
        self.0.get(&metric).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

/// Maps a metric onto 0-100 against its reference range, saturating outside `[0, max]`.
pub fn normalize(metric: MetricName, value: f64, range_max: f64) -> f64 {
    let clamped = value.clamp(0.0, range_max);
    if metric.higher_is_better() {
        clamped / range_max * MAX_SCORE
    } else {
        (range_max - clamped) / range_max * MAX_SCORE
    }
}

/// Composite score using the default normalization ranges.
pub fn score(metrics: &MetricVector, weights: &ScoreWeights) -> f64 {
    weighted_sum(metrics, weights, &NormalizationRanges::default())
}

/// Composite score against caller-supplied ranges. Every range bound must be finite and positive.
pub fn score_with_ranges(
    metrics: &MetricVector,
    weights: &ScoreWeights,
    ranges: &NormalizationRanges,
) -> AnalysisResult<f64> {
    validate_ranges(ranges)?;
    Ok(weighted_sum(metrics, weights, ranges))
}

fn validate_ranges(ranges: &NormalizationRanges) -> AnalysisResult<()> {
    for metric in MetricName::ALL {
        let max = ranges.max_for(metric);
        if !(max.is_finite() && max > 0.0) {
            return Err(AnalysisError::InvalidParameter { name: "normalization_range_max", value: max });
        }
    }
    Ok(())
}

/// Weights together with the ranges they normalize against. Ranges are checked once on
/// construction, so scoring itself cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScorer {
    weights: ScoreWeights,
    ranges: NormalizationRanges,
}

impl CompositeScorer {
    pub fn new(weights: ScoreWeights, ranges: NormalizationRanges) -> AnalysisResult<Self> {
        validate_ranges(&ranges)?;
        Ok(Self { weights, ranges })
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn ranges(&self) -> &NormalizationRanges {
        &self.ranges
    }

    pub fn score(&self, metrics: &MetricVector) -> f64 {
        weighted_sum(metrics, &self.weights, &self.ranges)
    }
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self { weights: ScoreWeights::default(), ranges: NormalizationRanges::default() }
    }
}

fn weighted_sum(metrics: &MetricVector, weights: &ScoreWeights, ranges: &NormalizationRanges) -> f64 {
    let _timing = logging::start_timing("composite_score",
        OperationCategory::Optimization { subcategory: OptimizationType::Scoring });

    weights
        .0
        .iter()
        .map(|(&metric, &weight)| normalize(metric, metrics.get(metric), ranges.max_for(metric)) * weight)
        .sum()
}

/// True when the composite can be read as a 0-100 percentage.
pub fn is_bounded(weights: &ScoreWeights) -> bool {
    let total = weights.total();
    weights.0.values().all(|w| *w >= 0.0) && (total - 1.0).abs() < 1e-9
}
