// One-way ANOVA per metric, one group per policy
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::descriptive::{max_abs, mean, rounding_floor, sum_of_squares};
use super::distributions::f_survival;
use crate::analysis::metrics::MetricName;
use crate::analysis::result_matrix::ResultMatrix;
use crate::config::constants::{
    HIGHLY_SIGNIFICANT_P, MIN_GROUPS, MIN_SAMPLES_PER_GROUP, SIGNIFICANCE_THRESHOLD, SIGNIFICANT_P,
    VERY_SIGNIFICANT_P,
};
use crate::error::{AnalysisError, AnalysisResult};
use crate::utils::logging::{self, OperationCategory, StatisticsType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub significant: bool,
    pub interpretation: String,
    pub df_between: usize,
    pub df_within: usize,
}

/// Significance band of a p-value.
pub fn interpret(p_value: f64) -> &'static str {
    if p_value < HIGHLY_SIGNIFICANT_P {
        "highly significant"
    } else if p_value < VERY_SIGNIFICANT_P {
        "very significant"
    } else if p_value < SIGNIFICANT_P {
        "significant"
    } else {
        "not significant"
    }
}

/// ANOVA for every metric at the default 0.05 significance threshold.
pub fn anova(matrix: &ResultMatrix) -> AnalysisResult<BTreeMap<MetricName, AnovaResult>> {
    anova_with_threshold(matrix, SIGNIFICANCE_THRESHOLD)
}

/// ANOVA for every metric; each policy's scenario values form one group.
#[instrument(skip(matrix), fields(policies = matrix.len()))]
pub fn anova_with_threshold(
    matrix: &ResultMatrix,
    significance_threshold: f64,
) -> AnalysisResult<BTreeMap<MetricName, AnovaResult>> {
    let _timing = logging::start_timing("anova",
        OperationCategory::Statistics { subcategory: StatisticsType::Anova });

    if !(significance_threshold > 0.0 && significance_threshold < 1.0) {
        return Err(AnalysisError::InvalidParameter {
            name: "significance_threshold",
            value: significance_threshold,
        });
    }
    if matrix.len() < MIN_GROUPS {
        return Err(AnalysisError::InsufficientGroups { found: matrix.len() });
    }
    matrix.ensure_complete()?;
    for row in matrix.rows() {
        for (_, metrics) in &row.cells {
            metrics.validate(&row.policy)?;
        }
    }

    let mut results = BTreeMap::new();
    for metric in MetricName::ALL {
        let mut groups = Vec::with_capacity(matrix.len());
        for row in matrix.rows() {
            let samples = row.samples(metric);
            if samples.len() < MIN_SAMPLES_PER_GROUP {
                return Err(AnalysisError::InsufficientSamples {
                    policy: row.policy.clone(),
                    metric,
                    found: samples.len(),
                });
            }
            groups.push(samples);
        }

        let result = one_way(&groups, significance_threshold)?;
        debug!(%metric, f = result.f_statistic, p = result.p_value, "anova");
        results.insert(metric, result);
    }

    Ok(results)
}

/// One-way ANOVA over groups already known to hold at least two values each.
pub fn one_way(groups: &[Vec<f64>], significance_threshold: f64) -> AnalysisResult<AnovaResult> {
    let all: Vec<f64> = groups.iter().flatten().copied().collect();
    let grand_mean = mean(&all);
    let noise = rounding_floor(all.len(), max_abs(&all));

    let mut ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand_mean).powi(2))
        .sum();
    let mut ss_within: f64 = groups.iter().map(|g| sum_of_squares(g)).sum();
    if ss_between <= noise {
        ss_between = 0.0;
    }
    if ss_within <= noise {
        ss_within = 0.0;
    }

    let df_between = groups.len() - 1;
    let df_within = all.len() - groups.len();

    let (f_statistic, p_value) = if ss_between == 0.0 {
        (0.0, 1.0)
    } else if ss_within == 0.0 {
        (f64::INFINITY, 0.0)
    } else {
        let f = (ss_between / df_between as f64) / (ss_within / df_within as f64);
        (f, f_survival(f, df_between as f64, df_within as f64)?)
    };

    Ok(AnovaResult {
        f_statistic,
        p_value,
        significant: p_value < significance_threshold,
        interpretation: interpret(p_value).to_string(),
        df_between,
        df_within,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::MetricVector;
    use crate::models::policy::PolicyId;

    fn matrix_with_delays(groups: &[(&str, &[f64])]) -> ResultMatrix {
        let mut builder = ResultMatrix::builder();
        for (policy, delays) in groups {
            for (i, delay) in delays.iter().enumerate() {
                builder.insert(
                    PolicyId::new(*policy),
                    format!("scenario-{i}").into(),
                    MetricVector::new(*delay, 1200.0 + i as f64, 300.0 + *delay, 35.0, 80.0),
                );
            }
        }
        builder.build()
    }

    #[test]
    fn identical_groups_are_not_significant() {
        let matrix = matrix_with_delays(&[
            ("a", &[40.0, 40.0, 40.0]),
            ("b", &[40.0, 40.0, 40.0]),
            ("c", &[40.0, 40.0, 40.0]),
        ]);
        let result = &anova(&matrix).unwrap()[&MetricName::AverageDelay];
        assert_eq!(result.f_statistic, 0.0);
        assert!((result.p_value - 1.0).abs() < 1e-9);
        assert!(!result.significant);
        assert_eq!(result.interpretation, "not significant");
    }

    #[test]
    fn well_separated_groups_are_highly_significant() {
        let matrix = matrix_with_delays(&[
            ("a", &[10.0, 10.1, 9.9]),
            ("b", &[100.0, 100.1, 99.9]),
            ("c", &[200.0, 200.1, 199.9]),
        ]);
        let result = &anova(&matrix).unwrap()[&MetricName::AverageDelay];
        assert!(result.p_value < 0.001);
        assert!(result.significant);
        assert_eq!(result.interpretation, "highly significant");
        assert_eq!((result.df_between, result.df_within), (2, 6));
    }

    #[test]
    fn matches_hand_computed_f() {
        // group means 2, 4; grand 3; SSB = 3*1 + 3*1 = 6; SSW = 2 + 2 = 4; F = 6 / (4/4) = 6
        let groups = vec![vec![1.0, 2.0, 3.0], vec![3.0, 4.0, 5.0]];
        let result = one_way(&groups, 0.05).unwrap();
        assert!((result.f_statistic - 6.0).abs() < 1e-12);
        assert!(result.p_value > 0.05 && result.p_value < 0.1);
    }

    #[test]
    fn zero_within_variance_gives_infinite_f() {
        let groups = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        let result = one_way(&groups, 0.05).unwrap();
        assert!(result.f_statistic.is_infinite());
        assert_eq!(result.p_value, 0.0);
    }

    #[test]
    fn needs_two_policies() {
        let matrix = matrix_with_delays(&[("a", &[40.0, 41.0])]);
        assert_eq!(anova(&matrix), Err(AnalysisError::InsufficientGroups { found: 1 }));
    }

    #[test]
    fn needs_two_scenarios_per_policy() {
        let matrix = matrix_with_delays(&[("a", &[40.0]), ("b", &[50.0])]);
        assert!(matches!(
            anova(&matrix),
            Err(AnalysisError::InsufficientSamples { found: 1, .. })
        ));
    }

    #[test]
    fn mismatched_scenarios_are_incomplete() {
        let matrix = matrix_with_delays(&[("a", &[40.0, 41.0]), ("b", &[50.0, 52.0, 58.0])]);
        assert!(matches!(
            anova(&matrix),
            Err(AnalysisError::IncompleteMetrics { ref policy, .. }) if policy.as_str() == "a"
        ));
    }

    #[test]
    fn small_separation_on_large_values_is_not_rounded_away() {
        let groups = vec![vec![1000.0, 1000.0], vec![1000.001, 1000.001]];
        let result = one_way(&groups, 0.05).unwrap();
        assert!(result.f_statistic.is_infinite());
        assert_eq!(result.p_value, 0.0);
        assert!(result.significant);

        let groups = vec![vec![1000.0, 1000.002], vec![1000.010, 1000.012]];
        let result = one_way(&groups, 0.05).unwrap();
        assert!((result.f_statistic - 50.0).abs() < 1e-3);
        assert!(result.significant);
    }

    #[test]
    fn bands() {
        assert_eq!(interpret(0.0005), "highly significant");
        assert_eq!(interpret(0.005), "very significant");
        assert_eq!(interpret(0.03), "significant");
        assert_eq!(interpret(0.05), "not significant");
    }
}
