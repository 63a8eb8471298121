// Main module declarations for the climate policy analyzer

pub mod error;

// Domain records handed over by the simulator and policy collaborators
pub mod models {
    pub mod policy;
    pub mod vehicle;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod analysis_config;
    pub mod scenarios;
}

// Trace reduction, result assembly and reporting
pub mod analysis {
    pub mod metrics;
    pub mod metrics_calculation;
    pub mod result_matrix;
    pub mod comparison;
    pub mod reporting;
}

// Multi-objective ranking
pub mod optimization {
    pub mod scoring;
    pub mod pareto;
    pub mod hypervolume;
}

// Inferential statistics over the result matrix
pub mod statistics {
    pub mod descriptive;
    pub mod distributions;
    pub mod anova;
    pub mod confidence;
    pub mod correlation;
    pub mod sensitivity;
    pub mod report;
}

// Data loaders
pub mod data {
    pub mod trace_loader;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used items
pub use crate::analysis::metrics::{MetricName, MetricVector};
pub use crate::analysis::metrics_calculation::{aggregate, aggregate_with_units};
pub use crate::analysis::result_matrix::{ResultMatrix, ResultMatrixBuilder};
pub use crate::config::analysis_config::AnalysisConfig;
pub use crate::error::{AnalysisError, AnalysisResult};
pub use crate::models::policy::{PolicyId, ScenarioId};
pub use crate::models::vehicle::VehicleRecord;
pub use crate::optimization::pareto::{
    analyze_pareto, dominates, pareto_frontier, rank_by_dominance, ParetoResult,
};
pub use crate::optimization::hypervolume::hypervolume;
pub use crate::optimization::scoring::{score, score_with_ranges, CompositeScorer, ScoreWeights};
pub use crate::statistics::anova::anova;
pub use crate::statistics::confidence::confidence_intervals;
pub use crate::statistics::correlation::correlation_matrix;
pub use crate::statistics::sensitivity::sensitivity;
pub use crate::statistics::report::StatisticalReport;
