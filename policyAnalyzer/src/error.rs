use crate::analysis::metrics::MetricName;
use crate::models::policy::PolicyId;

/// Failures raised by the analysis core. Every variant is surfaced at the point of
/// detection; nothing in the core substitutes a fallback value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("metrics requested over a run with zero vehicles")]
    EmptyRun,

    #[error("incomplete metrics for policy '{policy}': {detail}")]
    IncompleteMetrics { policy: PolicyId, detail: String },

    #[error("statistical test needs at least 2 policy groups, found {found}")]
    InsufficientGroups { found: usize },

    #[error("policy '{policy}' has {found} observation(s) of {metric}; at least 2 are required")]
    InsufficientSamples {
        policy: PolicyId,
        metric: MetricName,
        found: usize,
    },

    #[error("correlation between {left} and {right} is undefined (zero variance)")]
    UndefinedCorrelation { left: MetricName, right: MetricName },

    #[error("hypervolume requested with no candidate policies")]
    EmptyFrontier,

    #[error("invalid value {value} for parameter '{name}'")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("statistical distribution rejected its parameters: {0}")]
    Distribution(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
