use tracing::debug;

use super::metrics::MetricVector;
use crate::config::analysis_config::UnitScales;
use crate::config::constants::SECONDS_PER_HOUR;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::vehicle::VehicleRecord;
use crate::utils::logging::{self, OperationCategory};

/// Reduces one simulation trace to its metric vector, assuming simulator-native SI units
/// (grams, m/s, seconds).
pub fn aggregate(vehicles: &[VehicleRecord], simulation_duration_seconds: f64) -> AnalysisResult<MetricVector> {
    aggregate_with_units(vehicles, simulation_duration_seconds, &UnitScales::default())
}

/// Reduces one simulation trace to its metric vector.
///
/// Fails with `EmptyRun` for a trace without vehicles: a mean over nothing is undefined and
/// a zero delay would read as a perfect policy.
pub fn aggregate_with_units(
    vehicles: &[VehicleRecord],
    simulation_duration_seconds: f64,
    units: &UnitScales,
) -> AnalysisResult<MetricVector> {
    let _timing = logging::start_timing("aggregate", OperationCategory::Aggregation);

    if vehicles.is_empty() {
        return Err(AnalysisError::EmptyRun);
    }
    if !(simulation_duration_seconds.is_finite() && simulation_duration_seconds > 0.0) {
        return Err(AnalysisError::InvalidParameter {
            name: "simulation_duration_seconds",
            value: simulation_duration_seconds,
        });
    }

    let count = vehicles.len() as f64;
    let mut total_delay = 0.0;
    let mut total_speed = 0.0;
    let mut total_emissions = 0.0;
    let mut total_travel_time = 0.0;
    let mut completed = 0usize;

    for vehicle in vehicles {
        total_delay += vehicle.delay;
        total_speed += vehicle.speed;
        total_emissions += vehicle.co2_emissions;
        total_travel_time += vehicle.travel_time;
        if vehicle.completed {
            completed += 1;
        }
    }

    let metrics = MetricVector {
        average_delay: total_delay / count,
        throughput: completed as f64 / simulation_duration_seconds * SECONDS_PER_HOUR,
        co2_emissions: total_emissions / units.emissions_per_kg,
        average_speed: total_speed / count * units.speed_to_kmh,
        total_travel_time: total_travel_time / units.travel_time_per_hour,
    };

    debug!(
        vehicles = vehicles.len(),
        completed,
        average_delay = metrics.average_delay,
        throughput = metrics.throughput,
        "aggregated simulation trace"
    );

    Ok(metrics)
}
