// Sensitivity of each metric to parameter perturbations
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::metrics::{MetricName, MetricVector};
use crate::utils::logging::{self, OperationCategory, StatisticsType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub parameter: String,
    /// Percent change against the base run; `None` where the base value is zero.
    pub percent_change: BTreeMap<MetricName, Option<f64>>,
}

impl SensitivityRow {
    /// Metric with the largest absolute defined change.
    pub fn most_affected(&self) -> Option<(MetricName, f64)> {
        self.percent_change
            .iter()
            .filter_map(|(m, c)| c.map(|c| (*m, c)))
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
    }
}

pub fn percent_change(base: f64, value: f64) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some((value - base) / base * 100.0)
    }
}

/// One row per variation, in the order given.
pub fn sensitivity(base: &MetricVector, variations: &[(String, MetricVector)]) -> Vec<SensitivityRow> {
    let _timing = logging::start_timing("sensitivity",
        OperationCategory::Statistics { subcategory: StatisticsType::Sensitivity });

    let rows: Vec<SensitivityRow> = variations
        .iter()
        .map(|(parameter, perturbed)| SensitivityRow {
            parameter: parameter.clone(),
            percent_change: MetricName::ALL
                .iter()
                .map(|&m| (m, percent_change(base.get(m), perturbed.get(m))))
                .collect(),
        })
        .collect();

    debug!(variations = rows.len(), "computed sensitivity table");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_changes_per_variation() {
        let base = MetricVector::new(50.0, 1000.0, 400.0, 30.0, 0.0);
        let rows = sensitivity(&base, &[
            ("green_split+10%".to_string(), MetricVector::new(45.0, 1100.0, 400.0, 33.0, 12.0)),
            ("cycle_length-10%".to_string(), MetricVector::new(60.0, 950.0, 420.0, 27.0, 0.0)),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].parameter, "green_split+10%");
        let first = &rows[0].percent_change;
        assert!((first[&MetricName::AverageDelay].unwrap() + 10.0).abs() < 1e-9);
        assert!((first[&MetricName::Throughput].unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(first[&MetricName::Co2Emissions], Some(0.0));
        assert_eq!(first[&MetricName::TotalTravelTime], None);

        assert_eq!(rows[1].most_affected().map(|(m, _)| m), Some(MetricName::AverageDelay));
    }

    #[test]
    fn no_variations_no_rows() {
        let base = MetricVector::new(50.0, 1000.0, 400.0, 30.0, 10.0);
        assert!(sensitivity(&base, &[]).is_empty());
    }
}
