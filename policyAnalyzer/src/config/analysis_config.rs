use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::metrics::MetricName;
use crate::config::constants::*;
use crate::error::AnalysisResult;
use crate::optimization::scoring::{CompositeScorer, ScoreWeights};

/// Upper bound of the plausible range for each scored metric. The lower bound is always zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRanges {
    pub delay_max: f64,        // seconds
    pub throughput_max: f64,   // vehicles/hour
    pub emissions_max: f64,    // kg
    pub speed_max: f64,        // km/h
    pub travel_time_max: f64,  // hours
}

impl NormalizationRanges {
    pub fn max_for(&self, metric: MetricName) -> f64 {
        match metric {
            MetricName::AverageDelay => self.delay_max,
            MetricName::Throughput => self.throughput_max,
            MetricName::Co2Emissions => self.emissions_max,
            MetricName::AverageSpeed => self.speed_max,
            MetricName::TotalTravelTime => self.travel_time_max,
        }
    }
}

impl Default for NormalizationRanges {
    fn default() -> Self {
        Self {
            delay_max: DELAY_RANGE_MAX,
            throughput_max: THROUGHPUT_RANGE_MAX,
            emissions_max: EMISSIONS_RANGE_MAX,
            speed_max: SPEED_RANGE_MAX,
            travel_time_max: TRAVEL_TIME_RANGE_MAX,
        }
    }
}

/// Divisors/multipliers that turn simulator-native units into report units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitScales {
    pub emissions_per_kg: f64,     // source emission units per kilogram (1000 for grams)
    pub speed_to_kmh: f64,         // multiplier to km/h (3.6 for m/s)
    pub travel_time_per_hour: f64, // source time units per hour (3600 for seconds)
}

impl Default for UnitScales {
    fn default() -> Self {
        Self {
            emissions_per_kg: GRAMS_PER_KILOGRAM,
            speed_to_kmh: MPS_TO_KMH,
            travel_time_per_hour: SECONDS_PER_HOUR,
        }
    }
}

/// Explicit configuration for every analysis step. Never read from global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub normalization: NormalizationRanges,
    pub weights: ScoreWeights,
    pub units: UnitScales,
    pub confidence_level: f64,
    pub significance_threshold: f64,
    pub hypervolume_margin: f64,
    pub strong_correlation_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationRanges::default(),
            weights: ScoreWeights::default(),
            units: UnitScales::default(),
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            significance_threshold: SIGNIFICANCE_THRESHOLD,
            hypervolume_margin: HYPERVOLUME_REFERENCE_MARGIN,
            strong_correlation_threshold: STRONG_CORRELATION_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Composite scorer built from the configured weights and normalization ranges.
    pub fn scorer(&self) -> AnalysisResult<CompositeScorer> {
        CompositeScorer::new(self.weights.clone(), self.normalization.clone())
    }
}

/// Equal weights across delay, throughput, emissions and speed. Travel time is left out of the
/// default composite and only contributes through custom weight sets.
pub fn default_weights() -> BTreeMap<MetricName, f64> {
    let mut weights = BTreeMap::new();
    weights.insert(MetricName::AverageDelay, DEFAULT_DELAY_WEIGHT);
    weights.insert(MetricName::Throughput, DEFAULT_THROUGHPUT_WEIGHT);
    weights.insert(MetricName::Co2Emissions, DEFAULT_EMISSIONS_WEIGHT);
    weights.insert(MetricName::AverageSpeed, DEFAULT_SPEED_WEIGHT);
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "confidence_level": 0.9 }"#).expect("config parses");
        assert_eq!(config.confidence_level, 0.9);
        assert_eq!(config.normalization, NormalizationRanges::default());
        assert_eq!(config.weights.0.len(), 4);
        assert!(!config.weights.0.contains_key(&MetricName::TotalTravelTime));
    }

    #[test]
    fn configured_ranges_reach_the_scorer() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{ "normalization": { "delay_max": 300.0, "throughput_max": 2000.0,
                 "emissions_max": 1000.0, "speed_max": 30.0, "travel_time_max": 500.0 } }"#,
        )
        .expect("config parses");
        let scorer = config.scorer().expect("ranges are valid");
        assert_eq!(scorer.ranges().speed_max, 30.0);

        let broken = AnalysisConfig {
            normalization: NormalizationRanges { delay_max: f64::NAN, ..NormalizationRanges::default() },
            ..AnalysisConfig::default()
        };
        assert!(broken.scorer().is_err());
    }

    #[test]
    fn default_weights_sum_to_one() {
        let total: f64 = default_weights().values().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
