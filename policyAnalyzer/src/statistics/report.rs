use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::anova::{anova_with_threshold, AnovaResult};
use super::confidence::{confidence_intervals, PolicyIntervals};
use super::correlation::{correlation_matrix, CorrelationMatrix};
use crate::analysis::metrics::MetricName;
use crate::analysis::result_matrix::ResultMatrix;
use crate::config::analysis_config::AnalysisConfig;
use crate::error::AnalysisResult;

/// ANOVA, confidence intervals and correlations derived from one result matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalReport {
    pub anova: BTreeMap<MetricName, AnovaResult>,
    pub confidence_intervals: PolicyIntervals,
    pub correlation: CorrelationMatrix,
    pub confidence_level: f64,
}

impl StatisticalReport {
    #[instrument(skip_all, fields(policies = matrix.len()))]
    pub fn analyze(matrix: &ResultMatrix, config: &AnalysisConfig) -> AnalysisResult<Self> {
        let anova = anova_with_threshold(matrix, config.significance_threshold)?;
        let confidence_intervals = confidence_intervals(matrix, config.confidence_level)?;
        let correlation = correlation_matrix(matrix)?;

        let significant = anova.values().filter(|r| r.significant).count();
        info!(significant, metrics = anova.len(), "statistical analysis complete");

        Ok(Self {
            anova,
            confidence_intervals,
            correlation,
            confidence_level: config.confidence_level,
        })
    }

    pub fn significant_metrics(&self) -> Vec<MetricName> {
        self.anova
            .iter()
            .filter(|(_, r)| r.significant)
            .map(|(m, _)| *m)
            .collect()
    }

    pub fn strong_correlations(&self, threshold: f64) -> Vec<(MetricName, MetricName, f64)> {
        self.correlation.strong_correlations(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::MetricVector;

    #[test]
    fn bundles_all_three_analyses() {
        let mut builder = ResultMatrix::builder();
        for (policy, offset) in [("fixed", 0.0), ("adaptive", 30.0)] {
            for (i, scenario) in ["baseline", "moderate", "severe"].iter().enumerate() {
                let jitter = i as f64;
                builder.insert(
                    policy.into(),
                    (*scenario).into(),
                    MetricVector::new(80.0 - offset + jitter, 1100.0 + offset * 10.0 - jitter, 420.0 - offset + 2.0 * jitter, 28.0 + offset / 3.0, 90.0 - offset + jitter),
                );
            }
        }
        let report = StatisticalReport::analyze(&builder.build(), &AnalysisConfig::default()).unwrap();

        assert_eq!(report.anova.len(), 5);
        assert!(report.significant_metrics().contains(&MetricName::AverageDelay));
        assert_eq!(report.confidence_intervals.len(), 2);
        assert_eq!(report.confidence_intervals[0].0.as_str(), "fixed");
        assert_eq!(report.correlation.observations, 6);
        assert!(!report.strong_correlations(0.7).is_empty());
    }
}
