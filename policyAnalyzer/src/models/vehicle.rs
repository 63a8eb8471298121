use serde::{Deserialize, Serialize};

/// One simulated vehicle's trip outcome, as reported by the microsimulator.
/// Units are the simulator's native ones (seconds, m/s, metres, grams) unless
/// the caller aggregates with custom `UnitScales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: String,
    pub delay: f64,          // seconds
    pub speed: f64,          // m/s
    pub travel_time: f64,    // seconds
    pub distance: f64,       // metres
    pub co2_emissions: f64,  // grams
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

impl VehicleRecord {
    pub fn new(
        id: impl Into<String>,
        delay: f64,
        speed: f64,
        travel_time: f64,
        distance: f64,
        co2_emissions: f64,
        completed: bool,
    ) -> Self {
        Self {
            id: id.into(),
            delay,
            speed,
            travel_time,
            distance,
            co2_emissions,
            completed,
        }
    }
}
