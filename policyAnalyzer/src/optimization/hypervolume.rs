// Hypervolume module - volume of objective space dominated by the frontier
use tracing::debug;

use super::pareto::{objective_vector, pareto_frontier, ObjectiveVector};
use crate::analysis::metrics::MetricVector;
use crate::config::constants::{HYPERVOLUME_UNIT_MARGIN, OBJECTIVE_DIMENSIONS};
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::policy::PolicyId;
use crate::utils::logging::{self, OperationCategory, OptimizationType};

/// Reference point just beyond the componentwise worst observed objective.
///
/// Each coordinate is pushed out by `margin` times the larger of its magnitude and its spread,
/// falling back to a unit margin when both are zero, so every observed point lies strictly
/// inside the reference box.
pub fn derive_reference_point(objectives: &[ObjectiveVector], margin: f64) -> ObjectiveVector {
    let mut reference = [0.0; OBJECTIVE_DIMENSIONS];
    for (d, slot) in reference.iter_mut().enumerate() {
        let worst = objectives.iter().map(|o| o[d]).fold(f64::NEG_INFINITY, f64::max);
        let best = objectives.iter().map(|o| o[d]).fold(f64::INFINITY, f64::min);
        let offset = margin * worst.abs().max(worst - best);
        *slot = worst + if offset > 0.0 { offset } else { HYPERVOLUME_UNIT_MARGIN };
    }
    reference
}

/// Hypervolume of the Pareto frontier of `policies`, bounded by `reference_point`
/// (derived from the data when omitted).
///
/// Points that do not lie strictly inside the reference box contribute nothing.
pub fn hypervolume(
    policies: &[(PolicyId, MetricVector)],
    reference_point: Option<ObjectiveVector>,
    margin: f64,
) -> AnalysisResult<f64> {
    let _timing = logging::start_timing("hypervolume",
        OperationCategory::Optimization { subcategory: OptimizationType::Hypervolume });

    if policies.is_empty() {
        return Err(AnalysisError::EmptyFrontier);
    }
    if !(margin.is_finite() && margin >= 0.0) {
        return Err(AnalysisError::InvalidParameter { name: "hypervolume_margin", value: margin });
    }
    if let Some(reference) = &reference_point {
        if let Some(bad) = reference.iter().find(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidParameter { name: "reference_point", value: *bad });
        }
    }

    let frontier = pareto_frontier(policies)?;
    let points: Vec<ObjectiveVector> = policies
        .iter()
        .filter(|(policy, _)| frontier.contains(policy))
        .map(|(_, metrics)| objective_vector(metrics))
        .collect();

    let reference = match reference_point {
        Some(reference) => reference,
        None => derive_reference_point(&points, margin),
    };

    let inside: Vec<Vec<f64>> = points
        .iter()
        .filter(|p| p.iter().zip(reference.iter()).all(|(v, r)| v < r))
        .map(|p| p.to_vec())
        .collect();

    let volume = sweep_volume(&inside, &reference);
    debug!(frontier = points.len(), contributing = inside.len(), volume, "computed hypervolume");
    Ok(volume)
}

/// Exact dominated volume by slicing along the last objective and recursing on the rest.
/// Every point must be strictly below `reference` in all coordinates.
fn sweep_volume(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }

    let d = reference.len() - 1;
    if d == 0 {
        let best = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        return reference[0] - best;
    }

    let mut sorted: Vec<&Vec<f64>> = points.iter().collect();
    sorted.sort_by(|a, b| a[d].total_cmp(&b[d]));

    let mut volume = 0.0;
    for i in 0..sorted.len() {
        let lower = sorted[i][d];
        let upper = if i + 1 < sorted.len() { sorted[i + 1][d] } else { reference[d] };
        if upper <= lower {
            continue;
        }
        let slice: Vec<Vec<f64>> = sorted[..=i].iter().map(|p| p[..d].to_vec()).collect();
        volume += sweep_volume(&slice, &reference[..d]) * (upper - lower);
    }
    volume
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(name: &str, delay: f64, throughput: f64, emissions: f64, speed: f64) -> (PolicyId, MetricVector) {
        (PolicyId::new(name), MetricVector::new(delay, throughput, emissions, speed, 0.0))
    }

    #[test]
    fn single_point_volume_is_box_to_reference() {
        let policies = vec![policy("a", 1.0, 2.0, 1.0, 1.0)];
        // objectives [1, -2, 1, -1]
        let volume = hypervolume(&policies, Some([2.0, 0.0, 3.0, 0.0]), 0.1).unwrap();
        assert!((volume - 1.0 * 2.0 * 2.0 * 1.0).abs() < 1e-12);
    }

    #[test]
    fn overlapping_boxes_are_not_double_counted() {
        // objectives [0,0,0,1] and [1,0,0,0] against reference [2,1,1,2]
        let policies = vec![
            policy("a", 0.0, 0.0, 0.0, -1.0),
            policy("b", 1.0, 0.0, 0.0, 0.0),
        ];
        let volume = hypervolume(&policies, Some([2.0, 1.0, 1.0, 2.0]), 0.1).unwrap();
        // a: 2*1*1*1 = 2, b: 1*1*1*2 = 2, overlap 1*1*1*1 = 1
        assert!((volume - 3.0).abs() < 1e-12);
    }

    #[test]
    fn points_on_or_beyond_reference_contribute_zero() {
        let policies = vec![policy("edge", 2.0, 0.0, 0.0, 0.0)];
        let volume = hypervolume(&policies, Some([2.0, 1.0, 1.0, 1.0]), 0.1).unwrap();
        assert_eq!(volume, 0.0);

        let policies = vec![policy("outside", 5.0, 0.0, 0.0, 0.0)];
        let volume = hypervolume(&policies, Some([2.0, 1.0, 1.0, 1.0]), 0.1).unwrap();
        assert_eq!(volume, 0.0);
    }

    #[test]
    fn derived_reference_gives_positive_volume() {
        let zeros = vec![policy("flat", 0.0, 0.0, 0.0, 0.0)];
        assert!(hypervolume(&zeros, None, 0.1).unwrap() > 0.0);

        let policies = vec![
            policy("a", 40.0, 1200.0, 300.0, 40.0),
            policy("b", 50.0, 1500.0, 300.0, 40.0),
        ];
        assert!(hypervolume(&policies, None, 0.1).unwrap() > 0.0);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(hypervolume(&[], None, 0.1), Err(AnalysisError::EmptyFrontier));
    }

    #[test]
    fn adding_a_candidate_never_shrinks_volume() {
        let reference = Some([200.0, 0.0, 1000.0, 0.0]);
        let mut policies = vec![policy("a", 60.0, 1000.0, 400.0, 30.0)];
        let mut previous = hypervolume(&policies, reference, 0.1).unwrap();

        for (i, candidate) in [
            (50.0, 900.0, 500.0, 35.0),
            (80.0, 1400.0, 350.0, 25.0),
            (90.0, 800.0, 600.0, 20.0),
            (45.0, 1100.0, 380.0, 32.0),
        ]
        .iter()
        .enumerate()
        {
            policies.push(policy(&format!("c{i}"), candidate.0, candidate.1, candidate.2, candidate.3));
            let current = hypervolume(&policies, reference, 0.1).unwrap();
            assert!(current >= previous - 1e-9);
            previous = current;
        }
    }
}
