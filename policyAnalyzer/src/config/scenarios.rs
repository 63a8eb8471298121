use serde::{Deserialize, Serialize};

use crate::models::policy::ScenarioId;

/// Climate stress applied to the road network during a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateScenario {
    pub id: ScenarioId,
    pub name: String,
    pub capacity_reduction: f64,  // fraction of road capacity lost (0.0-1.0)
    pub efficiency_loss: f64,     // fraction of vehicle speed lost (0.0-1.0)
    pub emission_factor: f64,     // multiplier on per-vehicle emissions
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown scenario '{requested}', available: {available:?}")]
pub struct UnknownScenario {
    pub requested: String,
    pub available: Vec<String>,
}

/// What a scenario does to a reference value of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressedQuantity {
    Capacity,
    Speed,
    Emissions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioImpact {
    pub scenario: ScenarioId,
    pub base_value: f64,
    pub adjusted_value: f64,
    pub change: f64,
    pub percent_change: Option<f64>,
}

/// Ordered catalog of the stress scenarios a policy is evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCatalog {
    scenarios: Vec<ClimateScenario>,
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self {
            scenarios: vec![
                scenario("baseline", "Baseline (No Climate Stress)", 0.0, 0.0, 1.0,
                    "No climate stress applied. Normal operating conditions."),
                scenario("moderate", "Moderate Climate Stress", 0.15, 0.10, 1.15,
                    "Reduced road capacity due to heat stress, minor efficiency losses."),
                scenario("severe", "Severe Climate Stress", 0.30, 0.20, 1.30,
                    "Significant capacity constraints, notable efficiency degradation."),
                scenario("extreme", "Extreme Climate Stress", 0.45, 0.35, 1.50,
                    "Major infrastructure stress, substantial performance degradation."),
            ],
        }
    }
}

fn scenario(
    id: &str,
    name: &str,
    capacity_reduction: f64,
    efficiency_loss: f64,
    emission_factor: f64,
    description: &str,
) -> ClimateScenario {
    ClimateScenario {
        id: ScenarioId::new(id),
        name: name.to_string(),
        capacity_reduction,
        efficiency_loss,
        emission_factor,
        description: description.to_string(),
    }
}

impl ScenarioCatalog {
    pub fn new(scenarios: Vec<ClimateScenario>) -> Self {
        Self { scenarios }
    }

    pub fn get(&self, id: &str) -> Result<&ClimateScenario, UnknownScenario> {
        self.scenarios
            .iter()
            .find(|s| s.id.as_str() == id)
            .ok_or_else(|| UnknownScenario {
                requested: id.to_string(),
                available: self.names(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.scenarios.iter().map(|s| s.id.0.clone()).collect()
    }

    pub fn all(&self) -> &[ClimateScenario] {
        &self.scenarios
    }

    pub fn apply_capacity_reduction(&self, base_capacity: f64, id: &str) -> Result<f64, UnknownScenario> {
        Ok(self.get(id)?.adjust(StressedQuantity::Capacity, base_capacity))
    }

    pub fn apply_efficiency_loss(&self, base_speed: f64, id: &str) -> Result<f64, UnknownScenario> {
        Ok(self.get(id)?.adjust(StressedQuantity::Speed, base_speed))
    }

    pub fn emission_factor(&self, id: &str) -> Result<f64, UnknownScenario> {
        Ok(self.get(id)?.emission_factor)
    }

    /// Impact of every scenario on one reference value, in catalog order.
    pub fn compare_scenarios(&self, base_value: f64, quantity: StressedQuantity) -> Vec<ScenarioImpact> {
        self.scenarios
            .iter()
            .map(|s| {
                let adjusted_value = s.adjust(quantity, base_value);
                let change = adjusted_value - base_value;
                ScenarioImpact {
                    scenario: s.id.clone(),
                    base_value,
                    adjusted_value,
                    change,
                    percent_change: if base_value != 0.0 {
                        Some(change / base_value * 100.0)
                    } else {
                        None
                    },
                }
            })
            .collect()
    }
}

impl ClimateScenario {
    pub fn adjust(&self, quantity: StressedQuantity, base_value: f64) -> f64 {
        match quantity {
            StressedQuantity::Capacity => base_value * (1.0 - self.capacity_reduction),
            StressedQuantity::Speed => base_value * (1.0 - self.efficiency_loss),
            StressedQuantity::Emissions => base_value * self.emission_factor,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "**{}**\n\n- **Capacity Reduction**: {:.0}%\n- **Efficiency Loss**: {:.0}%\n- **Emission Factor**: {:.2}x\n\n{}",
            self.name,
            self.capacity_reduction * 100.0,
            self.efficiency_loss * 100.0,
            self.emission_factor,
            self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severe_scenario_reduces_capacity_by_thirty_percent() {
        let catalog = ScenarioCatalog::default();
        let capacity = catalog.apply_capacity_reduction(2000.0, "severe").unwrap();
        assert!((capacity - 1400.0).abs() < 1e-9);
        assert!((catalog.apply_efficiency_loss(50.0, "extreme").unwrap() - 32.5).abs() < 1e-9);
        assert_eq!(catalog.emission_factor("moderate").unwrap(), 1.15);
    }

    #[test]
    fn unknown_scenario_lists_available_names() {
        let catalog = ScenarioCatalog::default();
        let err = catalog.get("apocalyptic").unwrap_err();
        assert_eq!(err.available, vec!["baseline", "moderate", "severe", "extreme"]);
    }

    #[test]
    fn compare_scenarios_marks_zero_base_as_undefined() {
        let catalog = ScenarioCatalog::default();
        let impacts = catalog.compare_scenarios(0.0, StressedQuantity::Emissions);
        assert_eq!(impacts.len(), 4);
        assert!(impacts.iter().all(|i| i.percent_change.is_none()));

        let impacts = catalog.compare_scenarios(100.0, StressedQuantity::Emissions);
        assert!((impacts[3].percent_change.unwrap() - 50.0).abs() < 1e-9);
    }
}
