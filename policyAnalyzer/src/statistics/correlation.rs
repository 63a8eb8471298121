// Pearson correlation between metrics over all (policy, scenario) observations
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::descriptive::{max_abs, mean, rounding_floor, sum_of_squares};
use crate::analysis::metrics::MetricName;
use crate::analysis::result_matrix::ResultMatrix;
use crate::error::{AnalysisError, AnalysisResult};
use crate::utils::logging::{self, OperationCategory, StatisticsType};

/// One matrix entry. A metric with zero variance has no defined correlation with anything,
/// itself included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationCell {
    Value(f64),
    Undefined,
}

impl CorrelationCell {
    pub fn value(&self) -> Option<f64> {
        match self {
            CorrelationCell::Value(v) => Some(*v),
            CorrelationCell::Undefined => None,
        }
    }
}

/// Symmetric metric x metric matrix, rows and columns in `MetricName::ALL` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub metrics: Vec<MetricName>,
    pub cells: Vec<Vec<CorrelationCell>>,
    pub observations: usize,
}

impl CorrelationMatrix {
    fn index(&self, metric: MetricName) -> usize {
        self.metrics.iter().position(|m| *m == metric).unwrap_or(0)
    }

    pub fn get(&self, left: MetricName, right: MetricName) -> CorrelationCell {
        self.cells[self.index(left)][self.index(right)]
    }

    pub fn correlation_coefficient(&self, left: MetricName, right: MetricName) -> AnalysisResult<f64> {
        self.get(left, right)
            .value()
            .ok_or(AnalysisError::UndefinedCorrelation { left, right })
    }

    /// Distinct metric pairs with |r| above `threshold`, strongest first.
    pub fn strong_correlations(&self, threshold: f64) -> Vec<(MetricName, MetricName, f64)> {
        let mut pairs = Vec::new();
        for i in 0..self.metrics.len() {
            for j in (i + 1)..self.metrics.len() {
                if let CorrelationCell::Value(r) = self.cells[i][j] {
                    if r.abs() > threshold {
                        pairs.push((self.metrics[i], self.metrics[j], r));
                    }
                }
            }
        }
        pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
        pairs
    }
}

/// Pearson r of two equally long series, `None` when either has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 || !has_variance(xs) || !has_variance(ys) {
        return None;
    }
    let (mx, my) = (mean(xs), mean(ys));
    let covariance: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let r = covariance / (sum_of_squares(xs) * sum_of_squares(ys)).sqrt();
    Some(r.clamp(-1.0, 1.0))
}

fn has_variance(values: &[f64]) -> bool {
    sum_of_squares(values) > rounding_floor(values.len(), max_abs(values))
}

#[instrument(skip(matrix), fields(policies = matrix.len()))]
pub fn correlation_matrix(matrix: &ResultMatrix) -> AnalysisResult<CorrelationMatrix> {
    let _timing = logging::start_timing("correlation_matrix",
        OperationCategory::Statistics { subcategory: StatisticsType::Correlation });

    matrix.ensure_complete()?;
    for row in matrix.rows() {
        for (_, metrics) in &row.cells {
            metrics.validate(&row.policy)?;
        }
    }

    let metrics = MetricName::ALL.to_vec();
    let columns: Vec<Vec<f64>> = metrics
        .iter()
        .map(|&metric| matrix.observations().map(|m| m.get(metric)).collect())
        .collect();
    let observations = columns.first().map_or(0, |c| c.len());

    let k = metrics.len();
    let mut cells = vec![vec![CorrelationCell::Undefined; k]; k];
    for i in 0..k {
        if observations >= 2 && has_variance(&columns[i]) {
            cells[i][i] = CorrelationCell::Value(1.0);
        }
        for j in (i + 1)..k {
            let cell = match pearson(&columns[i], &columns[j]) {
                Some(r) => CorrelationCell::Value(r),
                None => CorrelationCell::Undefined,
            };
            cells[i][j] = cell;
            cells[j][i] = cell;
        }
    }

    debug!(observations, "computed correlation matrix");
    Ok(CorrelationMatrix { metrics, cells, observations })
}
