use std::collections::HashMap;

use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::metrics::{MetricName, MetricVector};
use super::metrics_calculation::aggregate_with_units;
use crate::config::analysis_config::UnitScales;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::policy::{PolicyId, ScenarioId};
use crate::models::vehicle::VehicleRecord;
use crate::utils::logging::{self, OperationCategory};

/// All scenario results for one policy, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRow {
    pub policy: PolicyId,
    pub cells: Vec<(ScenarioId, MetricVector)>,
}

impl PolicyRow {
    /// Values of one metric across this policy's scenarios.
    pub fn samples(&self, metric: MetricName) -> Vec<f64> {
        self.cells.iter().map(|(_, m)| m.get(metric)).collect()
    }

    pub fn get(&self, scenario: &ScenarioId) -> Option<&MetricVector> {
        self.cells.iter().find(|(s, _)| s == scenario).map(|(_, m)| m)
    }
}

/// Immutable policy x scenario snapshot consumed by the Pareto and statistics passes.
/// Policies and scenarios keep the order in which they were first inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMatrix {
    rows: Vec<PolicyRow>,
}

/// Accumulates cells before the snapshot is frozen. Re-inserting a cell replaces its value.
#[derive(Debug, Default)]
pub struct ResultMatrixBuilder {
    rows: Vec<PolicyRow>,
    index: HashMap<PolicyId, usize>,
}

impl ResultMatrixBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, policy: PolicyId, scenario: ScenarioId, metrics: MetricVector) -> &mut Self {
        let row_index = match self.index.get(&policy) {
            Some(&i) => i,
            None => {
                self.rows.push(PolicyRow { policy: policy.clone(), cells: Vec::new() });
                self.index.insert(policy, self.rows.len() - 1);
                self.rows.len() - 1
            }
        };

        let row = &mut self.rows[row_index];
        match row.cells.iter_mut().find(|(s, _)| *s == scenario) {
            Some(cell) => cell.1 = metrics,
            None => row.cells.push((scenario, metrics)),
        }
        self
    }

    pub fn build(self) -> ResultMatrix {
        ResultMatrix { rows: self.rows }
    }
}

impl ResultMatrix {
    pub fn builder() -> ResultMatrixBuilder {
        ResultMatrixBuilder::new()
    }

    pub fn rows(&self) -> &[PolicyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn policies(&self) -> impl Iterator<Item = &PolicyId> {
        self.rows.iter().map(|r| &r.policy)
    }

    pub fn row(&self, policy: &PolicyId) -> Option<&PolicyRow> {
        self.rows.iter().find(|r| &r.policy == policy)
    }

    pub fn get(&self, policy: &PolicyId, scenario: &ScenarioId) -> Option<&MetricVector> {
        self.row(policy).and_then(|r| r.get(scenario))
    }

    /// Values of one metric for one policy across its scenarios; `None` for an unknown policy.
    pub fn samples(&self, policy: &PolicyId, metric: MetricName) -> Option<Vec<f64>> {
        self.row(policy).map(|r| r.samples(metric))
    }

    /// Union of scenarios across all policies, in first-seen order.
    pub fn scenarios(&self) -> Vec<ScenarioId> {
        let mut seen: Vec<ScenarioId> = Vec::new();
        for row in &self.rows {
            for (scenario, _) in &row.cells {
                if !seen.contains(scenario) {
                    seen.push(scenario.clone());
                }
            }
        }
        seen
    }

    /// Fails with `IncompleteMetrics` for the first policy lacking a scenario that another
    /// policy has. Analyses comparing policies across scenarios require a full grid.
    pub fn ensure_complete(&self) -> AnalysisResult<()> {
        let scenarios = self.scenarios();
        for row in &self.rows {
            if let Some(missing) = scenarios.iter().find(|s| row.get(s).is_none()) {
                return Err(AnalysisError::IncompleteMetrics {
                    policy: row.policy.clone(),
                    detail: format!("no result for scenario '{}'", missing),
                });
            }
        }
        Ok(())
    }

    /// Every recorded (policy, scenario) observation, row by row.
    pub fn observations(&self) -> impl Iterator<Item = &MetricVector> {
        self.rows.iter().flat_map(|r| r.cells.iter().map(|(_, m)| m))
    }

    /// Metric vectors of all policies for one scenario. Every policy must have the cell.
    pub fn scenario_view(&self, scenario: &ScenarioId) -> AnalysisResult<Vec<(PolicyId, MetricVector)>> {
        self.rows
            .iter()
            .map(|row| {
                row.get(scenario)
                    .map(|m| (row.policy.clone(), *m))
                    .ok_or_else(|| AnalysisError::IncompleteMetrics {
                        policy: row.policy.clone(),
                        detail: format!("no result for scenario '{}'", scenario),
                    })
            })
            .collect()
    }

    /// Per-policy mean across the scenarios. Every policy must cover every scenario.
    pub fn averaged_view(&self) -> AnalysisResult<Vec<(PolicyId, MetricVector)>> {
        self.ensure_complete()?;
        self.rows
            .iter()
            .map(|row| {
                MetricVector::mean_of(row.cells.iter().map(|(_, m)| m))
                    .map(|mean| (row.policy.clone(), mean))
                    .map_err(|_| AnalysisError::IncompleteMetrics {
                        policy: row.policy.clone(),
                        detail: "no scenario results recorded".to_string(),
                    })
            })
            .collect()
    }
}

/// One finished simulator invocation: the raw trace of a (policy, scenario) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub policy: PolicyId,
    pub scenario: ScenarioId,
    pub duration_seconds: f64,
    pub vehicles: Vec<VehicleRecord>,
}

/// Aggregates every run and freezes the results into a snapshot.
///
/// Runs are independent, so with `parallel` they are reduced on the rayon pool; the snapshot
/// is still assembled in input order, which keeps it identical to a sequential build.
pub fn build_from_traces(
    runs: &[SimulationRun],
    units: &UnitScales,
    parallel: bool,
    progress: Option<&ProgressBar>,
) -> AnalysisResult<ResultMatrix> {
    let _timing = logging::start_timing("build_from_traces", OperationCategory::Aggregation);

    let reduce = |run: &SimulationRun| -> AnalysisResult<MetricVector> {
        let result = aggregate_with_units(&run.vehicles, run.duration_seconds, units);
        if let Some(bar) = progress {
            bar.inc(1);
        }
        result.map_err(|err| {
            warn!(policy = %run.policy, scenario = %run.scenario, error = %err, "failed to aggregate run");
            err
        })
    };

    let metrics: Vec<MetricVector> = if parallel {
        runs.par_iter().map(reduce).collect::<AnalysisResult<Vec<_>>>()?
    } else {
        runs.iter().map(reduce).collect::<AnalysisResult<Vec<_>>>()?
    };

    let mut builder = ResultMatrixBuilder::new();
    for (run, m) in runs.iter().zip(metrics) {
        builder.insert(run.policy.clone(), run.scenario.clone(), m);
    }
    let matrix = builder.build();

    info!(
        runs = runs.len(),
        policies = matrix.len(),
        scenarios = matrix.scenarios().len(),
        "built result matrix"
    );

    Ok(matrix)
}
