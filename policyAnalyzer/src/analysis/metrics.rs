use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::policy::PolicyId;

/// The five aggregate performance metrics tracked for every (policy, scenario) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    AverageDelay,
    Throughput,
    Co2Emissions,
    AverageSpeed,
    TotalTravelTime,
}

impl MetricName {
    pub const ALL: [MetricName; 5] = [
        MetricName::AverageDelay,
        MetricName::Throughput,
        MetricName::Co2Emissions,
        MetricName::AverageSpeed,
        MetricName::TotalTravelTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::AverageDelay => "average_delay",
            MetricName::Throughput => "throughput",
            MetricName::Co2Emissions => "co2_emissions",
            MetricName::AverageSpeed => "average_speed",
            MetricName::TotalTravelTime => "total_travel_time",
        }
    }

    /// Human readable label with unit, used in reports and CSV headers.
    pub fn label(&self) -> &'static str {
        match self {
            MetricName::AverageDelay => "Average Delay (s)",
            MetricName::Throughput => "Throughput (veh/h)",
            MetricName::Co2Emissions => "CO2 Emissions (kg)",
            MetricName::AverageSpeed => "Average Speed (km/h)",
            MetricName::TotalTravelTime => "Total Travel Time (h)",
        }
    }

    pub fn higher_is_better(&self) -> bool {
        matches!(self, MetricName::Throughput | MetricName::AverageSpeed)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "average_delay" | "delay" => Ok(MetricName::AverageDelay),
            "throughput" => Ok(MetricName::Throughput),
            "co2_emissions" | "emissions" | "co2" => Ok(MetricName::Co2Emissions),
            "average_speed" | "speed" => Ok(MetricName::AverageSpeed),
            "total_travel_time" | "travel_time" => Ok(MetricName::TotalTravelTime),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

/// Aggregate performance of one (policy, scenario) run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricVector {
    pub average_delay: f64,      // seconds
    pub throughput: f64,         // vehicles/hour
    pub co2_emissions: f64,      // kg
    pub average_speed: f64,      // km/h
    pub total_travel_time: f64,  // hours
}

impl MetricVector {
    pub fn new(
        average_delay: f64,
        throughput: f64,
        co2_emissions: f64,
        average_speed: f64,
        total_travel_time: f64,
    ) -> Self {
        Self {
            average_delay,
            throughput,
            co2_emissions,
            average_speed,
            total_travel_time,
        }
    }

    pub fn get(&self, metric: MetricName) -> f64 {
        match metric {
            MetricName::AverageDelay => self.average_delay,
            MetricName::Throughput => self.throughput,
            MetricName::Co2Emissions => self.co2_emissions,
            MetricName::AverageSpeed => self.average_speed,
            MetricName::TotalTravelTime => self.total_travel_time,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, f64)> + '_ {
        MetricName::ALL.iter().map(move |&name| (name, self.get(name)))
    }

    /// Builds a vector from a loosely typed metric map such as one parsed from JSON.
    /// Every metric must be present and finite.
    pub fn from_map(policy: &PolicyId, values: &BTreeMap<MetricName, f64>) -> AnalysisResult<Self> {
        let lookup = |name: MetricName| -> AnalysisResult<f64> {
            match values.get(&name) {
                Some(value) if value.is_finite() => Ok(*value),
                Some(value) => Err(AnalysisError::IncompleteMetrics {
                    policy: policy.clone(),
                    detail: format!("{} is not finite ({})", name, value),
                }),
                None => Err(AnalysisError::IncompleteMetrics {
                    policy: policy.clone(),
                    detail: format!("missing {}", name),
                }),
            }
        };

        Ok(Self {
            average_delay: lookup(MetricName::AverageDelay)?,
            throughput: lookup(MetricName::Throughput)?,
            co2_emissions: lookup(MetricName::Co2Emissions)?,
            average_speed: lookup(MetricName::AverageSpeed)?,
            total_travel_time: lookup(MetricName::TotalTravelTime)?,
        })
    }

    pub fn to_map(&self) -> BTreeMap<MetricName, f64> {
        self.iter().collect()
    }

    /// Rejects vectors carrying NaN or infinite values before they reach a comparison.
    pub fn validate(&self, policy: &PolicyId) -> AnalysisResult<()> {
        for (name, value) in self.iter() {
            if !value.is_finite() {
                return Err(AnalysisError::IncompleteMetrics {
                    policy: policy.clone(),
                    detail: format!("{} is not finite ({})", name, value),
                });
            }
        }
        Ok(())
    }

    /// Componentwise mean, used for the scenario-averaged view of a policy.
    pub fn mean_of<'a, I>(vectors: I) -> AnalysisResult<Self>
    where
        I: IntoIterator<Item = &'a MetricVector>,
    {
        let mut sum = MetricVector::new(0.0, 0.0, 0.0, 0.0, 0.0);
        let mut count = 0usize;
        for v in vectors {
            sum.average_delay += v.average_delay;
            sum.throughput += v.throughput;
            sum.co2_emissions += v.co2_emissions;
            sum.average_speed += v.average_speed;
            sum.total_travel_time += v.total_travel_time;
            count += 1;
        }

        if count == 0 {
            return Err(AnalysisError::EmptyRun);
        }

        let n = count as f64;
        Ok(MetricVector::new(
            sum.average_delay / n,
            sum.throughput / n,
            sum.co2_emissions / n,
            sum.average_speed / n,
            sum.total_travel_time / n,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_round_trip_through_strings() {
        for name in MetricName::ALL {
            assert_eq!(name.as_str().parse::<MetricName>(), Ok(name));
        }
        assert!("latency".parse::<MetricName>().is_err());
    }

    #[test]
    fn from_map_reports_missing_metric() {
        let policy = PolicyId::new("signal-retime");
        let mut values = MetricVector::new(40.0, 1200.0, 300.0, 35.0, 80.0).to_map();
        values.remove(&MetricName::Throughput);

        let err = MetricVector::from_map(&policy, &values).unwrap_err();
        match err {
            AnalysisError::IncompleteMetrics { policy: p, detail } => {
                assert_eq!(p, policy);
                assert!(detail.contains("throughput"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn mean_of_empty_set_signals_empty_run() {
        let empty: Vec<MetricVector> = Vec::new();
        assert_eq!(MetricVector::mean_of(&empty), Err(AnalysisError::EmptyRun));
    }

    #[test]
    fn mean_of_averages_each_component() {
        let a = MetricVector::new(40.0, 1000.0, 200.0, 30.0, 10.0);
        let b = MetricVector::new(60.0, 1400.0, 400.0, 50.0, 30.0);
        let mean = MetricVector::mean_of([&a, &b]).unwrap();
        assert_eq!(mean, MetricVector::new(50.0, 1200.0, 300.0, 40.0, 20.0));
    }
}
