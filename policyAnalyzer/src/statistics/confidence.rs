// Student-t confidence intervals per (policy, metric)
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::descriptive::{mean, sample_std};
use super::distributions::t_critical;
use crate::analysis::metrics::MetricName;
use crate::analysis::result_matrix::ResultMatrix;
use crate::config::constants::MIN_SAMPLES_PER_GROUP;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::policy::PolicyId;
use crate::utils::logging::{self, OperationCategory, StatisticsType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiResult {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub margin_of_error: f64,
    pub std_error: f64,
    pub degrees_of_freedom: usize,
}

impl CiResult {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

pub type PolicyIntervals = Vec<(PolicyId, BTreeMap<MetricName, CiResult>)>;

/// Interval for the mean of `samples`. Fewer than two samples have no defined interval.
pub fn interval(samples: &[f64], confidence: f64) -> AnalysisResult<Option<CiResult>> {
    if samples.len() < MIN_SAMPLES_PER_GROUP {
        return Ok(None);
    }
    let n = samples.len();
    let df = n - 1;
    let center = mean(samples);
    let std_error = sample_std(samples) / (n as f64).sqrt();
    let margin_of_error = t_critical(confidence, df as f64)? * std_error;

    Ok(Some(CiResult {
        mean: center,
        lower: center - margin_of_error,
        upper: center + margin_of_error,
        margin_of_error,
        std_error,
        degrees_of_freedom: df,
    }))
}

/// Confidence intervals for every policy and metric across that policy's scenarios,
/// in policy insertion order.
#[instrument(skip(matrix), fields(policies = matrix.len()))]
pub fn confidence_intervals(matrix: &ResultMatrix, confidence: f64) -> AnalysisResult<PolicyIntervals> {
    let _timing = logging::start_timing("confidence_intervals",
        OperationCategory::Statistics { subcategory: StatisticsType::ConfidenceInterval });

    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(AnalysisError::InvalidParameter { name: "confidence", value: confidence });
    }
    matrix.ensure_complete()?;

    let mut intervals = Vec::with_capacity(matrix.len());
    for row in matrix.rows() {
        let mut per_metric = BTreeMap::new();
        for metric in MetricName::ALL {
            let samples = row.samples(metric);
            if let Some(bad) = samples.iter().find(|v| !v.is_finite()) {
                return Err(AnalysisError::IncompleteMetrics {
                    policy: row.policy.clone(),
                    detail: format!("{} is not finite ({})", metric, bad),
                });
            }
            let ci = interval(&samples, confidence)?.ok_or_else(|| AnalysisError::InsufficientSamples {
                policy: row.policy.clone(),
                metric,
                found: samples.len(),
            })?;
            per_metric.insert(metric, ci);
        }
        debug!(policy = %row.policy, "computed confidence intervals");
        intervals.push((row.policy.clone(), per_metric));
    }

    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::MetricVector;

    fn matrix(samples: &[(&str, &[f64])]) -> ResultMatrix {
        let mut builder = ResultMatrix::builder();
        for (policy, delays) in samples {
            for (i, d) in delays.iter().enumerate() {
                builder.insert((*policy).into(), format!("s{i}").into(), MetricVector::new(*d, 1000.0 + *d, 200.0, 30.0, 50.0));
            }
        }
        builder.build()
    }

    #[test]
    fn bounds_bracket_the_mean() {
        let m = matrix(&[("a", &[40.0, 44.0, 47.0, 52.0]), ("b", &[60.0, 61.0, 59.0, 63.0])]);
        for (_, per_metric) in confidence_intervals(&m, 0.95).unwrap() {
            for ci in per_metric.values() {
                assert!(ci.lower <= ci.mean && ci.mean <= ci.upper);
            }
        }
    }

    #[test]
    fn hand_computed_interval() {
        // mean 5, s = sqrt(4/3) = 1.1547, se = s / 2, t(0.975, 3) = 3.182
        let ci = interval(&[4.0, 4.0, 6.0, 6.0], 0.95).unwrap().unwrap();
        assert_eq!(ci.mean, 5.0);
        assert!((ci.std_error - 1.1547 / 2.0).abs() < 1e-3);
        assert_eq!(ci.degrees_of_freedom, 3);
        assert!((ci.margin_of_error - 3.182 * ci.std_error).abs() < 1e-2);
    }

    #[test]
    fn width_shrinks_with_more_samples() {
        let small = interval(&[1.0, 3.0, 1.0, 3.0], 0.95).unwrap().unwrap();
        let large = interval(&[1.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0, 3.0], 0.95)
            .unwrap()
            .unwrap();
        assert!(large.width() < small.width());
    }

    #[test]
    fn constant_samples_give_zero_width() {
        let ci = interval(&[7.0, 7.0, 7.0], 0.95).unwrap().unwrap();
        assert_eq!(ci.width(), 0.0);
        assert!(ci.contains(7.0));
    }

    #[test]
    fn single_observation_is_insufficient() {
        let m = matrix(&[("a", &[40.0])]);
        assert!(matches!(
            confidence_intervals(&m, 0.95),
            Err(AnalysisError::InsufficientSamples { found: 1, .. })
        ));
    }

    #[test]
    fn uneven_scenario_coverage_is_rejected() {
        let m = matrix(&[("a", &[40.0, 44.0, 47.0]), ("b", &[60.0, 61.0])]);
        assert!(matches!(
            confidence_intervals(&m, 0.95),
            Err(AnalysisError::IncompleteMetrics { ref policy, ref detail })
                if policy.as_str() == "b" && detail.contains("s2")
        ));
    }

    #[test]
    fn higher_confidence_widens_interval() {
        let samples = [10.0, 12.0, 15.0, 11.0];
        let narrow = interval(&samples, 0.90).unwrap().unwrap();
        let wide = interval(&samples, 0.99).unwrap().unwrap();
        assert!(wide.width() > narrow.width());
    }

    #[test]
    fn rejects_confidence_outside_unit_interval() {
        let m = matrix(&[("a", &[40.0, 41.0])]);
        assert!(matches!(
            confidence_intervals(&m, 1.5),
            Err(AnalysisError::InvalidParameter { name: "confidence", .. })
        ));
    }
}
