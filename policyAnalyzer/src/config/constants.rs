// Simulation Constants
pub const DEFAULT_SIMULATION_DURATION: f64 = 3600.0;   // seconds (1 hour)
pub const SECONDS_PER_HOUR: f64 = 3600.0;

// Unit Conversion Factors
pub const GRAMS_PER_KILOGRAM: f64 = 1000.0;
pub const MPS_TO_KMH: f64 = 3.6;

// Composite Score Normalization Ranges (literature-derived plausible bounds)
pub const DELAY_RANGE_MAX: f64 = 300.0;          // seconds, lower is better
pub const THROUGHPUT_RANGE_MAX: f64 = 2000.0;    // vehicles/hour, higher is better
pub const EMISSIONS_RANGE_MAX: f64 = 1000.0;     // kg, lower is better
pub const SPEED_RANGE_MAX: f64 = 60.0;           // km/h, higher is better
pub const TRAVEL_TIME_RANGE_MAX: f64 = 500.0;    // hours, lower is better
pub const MAX_SCORE: f64 = 100.0;

// Default Composite Weights
pub const DEFAULT_DELAY_WEIGHT: f64 = 0.25;
pub const DEFAULT_THROUGHPUT_WEIGHT: f64 = 0.25;
pub const DEFAULT_EMISSIONS_WEIGHT: f64 = 0.25;
pub const DEFAULT_SPEED_WEIGHT: f64 = 0.25;

// Pareto Analysis
pub const OBJECTIVE_DIMENSIONS: usize = 4;
pub const HYPERVOLUME_REFERENCE_MARGIN: f64 = 0.10;  // 10% beyond the worst observed value
pub const HYPERVOLUME_UNIT_MARGIN: f64 = 1.0;        // used when worst value and span are both zero

// Statistical Analysis
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;
pub const HIGHLY_SIGNIFICANT_P: f64 = 0.001;
pub const VERY_SIGNIFICANT_P: f64 = 0.01;
pub const SIGNIFICANT_P: f64 = 0.05;
pub const MIN_GROUPS: usize = 2;
pub const MIN_SAMPLES_PER_GROUP: usize = 2;
pub const STRONG_CORRELATION_THRESHOLD: f64 = 0.7;

// Reporting
pub const TOP_RANKED_POLICIES: usize = 5;
