// Comparison module - policy vs baseline deltas and best-policy selection
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::metrics::{MetricName, MetricVector};
use crate::models::policy::PolicyId;
use crate::optimization::scoring::CompositeScorer;
use crate::statistics::sensitivity::percent_change;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub baseline: f64,
    pub policy: f64,
    pub absolute_change: f64,
    pub percent_change: Option<f64>,
    pub is_improvement: bool,
}

/// Per-metric change of `policy` against `baseline`. Improvement follows metric direction:
/// lower delay, emissions and travel time, higher throughput and speed.
pub fn compare_to_baseline(baseline: &MetricVector, policy: &MetricVector) -> BTreeMap<MetricName, MetricComparison> {
    MetricName::ALL
        .iter()
        .map(|&metric| {
            let before = baseline.get(metric);
            let after = policy.get(metric);
            let is_improvement = if metric.higher_is_better() { after > before } else { after < before };
            (metric, MetricComparison {
                baseline: before,
                policy: after,
                absolute_change: after - before,
                percent_change: percent_change(before, after),
                is_improvement,
            })
        })
        .collect()
}

/// What "best" means when picking a single policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    /// Highest composite score under the given weights and normalization ranges.
    Composite(CompositeScorer),
    /// Best value of one metric in its own direction.
    Metric(MetricName),
}

/// Best policy for `objective`; the earliest policy wins ties. `None` for no policies.
pub fn identify_best_policy<'a>(
    policies: &'a [(PolicyId, MetricVector)],
    objective: &Objective,
) -> Option<&'a PolicyId> {
    let key = |metrics: &MetricVector| -> f64 {
        match objective {
            Objective::Composite(scorer) => scorer.score(metrics),
            Objective::Metric(metric) if metric.higher_is_better() => metrics.get(*metric),
            Objective::Metric(metric) => -metrics.get(*metric),
        }
    };

    let mut best: Option<(&PolicyId, f64)> = None;
    for (policy, metrics) in policies {
        let value = key(metrics);
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((policy, value)),
        }
    }

    if let Some((policy, value)) = best {
        debug!(%policy, value, "identified best policy");
    }
    best.map(|(policy, _)| policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::analysis_config::NormalizationRanges;
    use crate::optimization::scoring::ScoreWeights;

    #[test]
    fn improvement_respects_metric_direction() {
        let baseline = MetricVector::new(60.0, 1000.0, 400.0, 30.0, 0.0);
        let policy = MetricVector::new(45.0, 1100.0, 420.0, 30.0, 5.0);
        let cmp = compare_to_baseline(&baseline, &policy);

        let delay = &cmp[&MetricName::AverageDelay];
        assert!(delay.is_improvement);
        assert_eq!(delay.absolute_change, -15.0);
        assert_eq!(delay.percent_change, Some(-25.0));

        assert!(cmp[&MetricName::Throughput].is_improvement);
        assert!(!cmp[&MetricName::Co2Emissions].is_improvement);
        assert!(!cmp[&MetricName::AverageSpeed].is_improvement);
        assert_eq!(cmp[&MetricName::TotalTravelTime].percent_change, None);
    }

    #[test]
    fn best_by_metric_and_composite() {
        let policies = vec![
            (PolicyId::new("fixed"), MetricVector::new(80.0, 1000.0, 450.0, 28.0, 0.0)),
            (PolicyId::new("adaptive"), MetricVector::new(50.0, 1300.0, 380.0, 36.0, 0.0)),
            (PolicyId::new("green-wave"), MetricVector::new(55.0, 1250.0, 300.0, 38.0, 0.0)),
        ];

        let best_delay = identify_best_policy(&policies, &Objective::Metric(MetricName::AverageDelay));
        assert_eq!(best_delay.map(|p| p.as_str()), Some("adaptive"));

        let best_speed = identify_best_policy(&policies, &Objective::Metric(MetricName::AverageSpeed));
        assert_eq!(best_speed.map(|p| p.as_str()), Some("green-wave"));

        let best = identify_best_policy(&policies, &Objective::Composite(CompositeScorer::default()));
        assert_eq!(best.map(|p| p.as_str()), Some("green-wave"));
    }

    #[test]
    fn normalization_ranges_can_change_the_winner() {
        let policies = vec![
            (PolicyId::new("fast"), MetricVector::new(60.0, 1000.0, 500.0, 60.0, 0.0)),
            (PolicyId::new("low-delay"), MetricVector::new(0.0, 1000.0, 500.0, 30.0, 0.0)),
        ];
        // default ranges: fast 70.0, low-delay 62.5
        let best = identify_best_policy(&policies, &Objective::Composite(CompositeScorer::default()));
        assert_eq!(best.map(|p| p.as_str()), Some("fast"));

        // a 30 km/h speed range saturates both speeds: fast 70.0, low-delay 75.0
        let ranges = NormalizationRanges { speed_max: 30.0, ..NormalizationRanges::default() };
        let scorer = CompositeScorer::new(ScoreWeights::default(), ranges).unwrap();
        let best = identify_best_policy(&policies, &Objective::Composite(scorer));
        assert_eq!(best.map(|p| p.as_str()), Some("low-delay"));
    }

    #[test]
    fn ties_go_to_first_policy() {
        let m = MetricVector::new(50.0, 1300.0, 380.0, 36.0, 0.0);
        let policies = vec![(PolicyId::new("first"), m), (PolicyId::new("second"), m)];
        let best = identify_best_policy(&policies, &Objective::Composite(CompositeScorer::default()));
        assert_eq!(best.map(|p| p.as_str()), Some("first"));
        assert!(identify_best_policy(&[], &Objective::Metric(MetricName::Throughput)).is_none());
    }
}
