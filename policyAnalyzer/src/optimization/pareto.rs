// Pareto module - dominance, frontier membership and dominance ranking across policies
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::hypervolume::hypervolume;
use crate::analysis::metrics::MetricVector;
use crate::config::constants::OBJECTIVE_DIMENSIONS;
use crate::error::AnalysisResult;
use crate::models::policy::PolicyId;
use crate::utils::logging::{self, OperationCategory, OptimizationType};

pub type ObjectiveVector = [f64; OBJECTIVE_DIMENSIONS];

/// Minimization-space view of a metric vector: [delay, -throughput, emissions, -speed].
pub fn objective_vector(metrics: &MetricVector) -> ObjectiveVector {
    [
        metrics.average_delay,
        -metrics.throughput,
        metrics.co2_emissions,
        -metrics.average_speed,
    ]
}

/// `a` dominates `b` when it is no worse on every objective and strictly better on one.
/// Equal vectors dominate nothing.
pub fn dominates(a: &ObjectiveVector, b: &ObjectiveVector) -> bool {
    let mut strictly_better = false;
    for (av, bv) in a.iter().zip(b.iter()) {
        if av > bv {
            return false;
        }
        if av < bv {
            strictly_better = true;
        }
    }
    strictly_better
}

fn validated_objectives(policies: &[(PolicyId, MetricVector)]) -> AnalysisResult<Vec<ObjectiveVector>> {
    policies
        .iter()
        .map(|(policy, metrics)| {
            metrics.validate(policy)?;
            Ok(objective_vector(metrics))
        })
        .collect()
}

fn dominator_counts(objectives: &[ObjectiveVector]) -> Vec<usize> {
    (0..objectives.len())
        .map(|i| {
            (0..objectives.len())
                .filter(|&j| j != i && dominates(&objectives[j], &objectives[i]))
                .count()
        })
        .collect()
}

/// Policies not dominated by any other policy, in input order. Mutually equal policies are
/// all kept.
pub fn pareto_frontier(policies: &[(PolicyId, MetricVector)]) -> AnalysisResult<Vec<PolicyId>> {
    let _timing = logging::start_timing("pareto_frontier",
        OperationCategory::Optimization { subcategory: OptimizationType::Frontier });

    let objectives = validated_objectives(policies)?;
    let frontier: Vec<PolicyId> = dominator_counts(&objectives)
        .into_iter()
        .zip(policies)
        .filter(|(count, _)| *count == 0)
        .map(|(_, (policy, _))| policy.clone())
        .collect();

    debug!(candidates = policies.len(), frontier = frontier.len(), "computed pareto frontier");
    Ok(frontier)
}

/// Number of policies dominating each policy (0 = frontier member), in input order.
/// Equal counts share a rank; this is not a strict total order.
pub fn rank_by_dominance(policies: &[(PolicyId, MetricVector)]) -> AnalysisResult<Vec<(PolicyId, usize)>> {
    let _timing = logging::start_timing("rank_by_dominance",
        OperationCategory::Optimization { subcategory: OptimizationType::Ranking });

    let objectives = validated_objectives(policies)?;
    Ok(dominator_counts(&objectives)
        .into_iter()
        .zip(policies)
        .map(|(count, (policy, _))| (policy.clone(), count))
        .collect())
}

/// Frontier, dominance ranks and hypervolume of one policy set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoResult {
    pub frontier: Vec<PolicyId>,
    pub ranks: Vec<(PolicyId, usize)>,
    pub hypervolume: f64,
}

impl ParetoResult {
    /// Ranks sorted best first; ties keep input order.
    pub fn ordered_ranks(&self) -> Vec<(PolicyId, usize)> {
        let mut ranks = self.ranks.clone();
        ranks.sort_by_key(|(_, rank)| *rank);
        ranks
    }

    pub fn is_on_frontier(&self, policy: &PolicyId) -> bool {
        self.frontier.contains(policy)
    }
}

#[instrument(skip_all, fields(policies = policies.len()))]
pub fn analyze_pareto(
    policies: &[(PolicyId, MetricVector)],
    reference_point: Option<ObjectiveVector>,
    margin: f64,
) -> AnalysisResult<ParetoResult> {
    let frontier = pareto_frontier(policies)?;
    let ranks = rank_by_dominance(policies)?;
    let hypervolume = hypervolume(policies, reference_point, margin)?;

    Ok(ParetoResult { frontier, ranks, hypervolume })
}
