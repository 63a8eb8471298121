use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{EnvFilter, prelude::*};
use tracing_subscriber::filter::ParseError;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_timing::{Builder, Histogram};
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use std::cell::RefCell;

// Histogram bounds: 1ns to 60s, 3 significant digits
const HISTOGRAM_LOW: u64 = 1;
const HISTOGRAM_HIGH: u64 = 60_000_000_000;
const HISTOGRAM_SIGFIG: u8 = 3;

// Define categories for different types of operations
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OperationCategory {
    Aggregation,
    Optimization {
        subcategory: OptimizationType,
    },
    Statistics {
        subcategory: StatisticsType,
    },
    FileIO {
        subcategory: FileIOType,
    },
    Other,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OptimizationType {
    Scoring,
    Frontier,
    Ranking,
    Hypervolume,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum StatisticsType {
    Anova,
    ConfidenceInterval,
    Correlation,
    Sensitivity,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum FileIOType {
    TraceLoad,
    ConfigLoad,
    ResultsSave,
}

impl OperationCategory {
    pub fn as_str(&self) -> String {
        match self {
            OperationCategory::Aggregation => "Aggregation".to_string(),
            OperationCategory::Optimization { subcategory } => {
                format!("Optimization - {}", match subcategory {
                    OptimizationType::Scoring => "Scoring",
                    OptimizationType::Frontier => "Frontier",
                    OptimizationType::Ranking => "Ranking",
                    OptimizationType::Hypervolume => "Hypervolume",
                })
            },
            OperationCategory::Statistics { subcategory } => {
                format!("Statistics - {}", match subcategory {
                    StatisticsType::Anova => "ANOVA",
                    StatisticsType::ConfidenceInterval => "Confidence Interval",
                    StatisticsType::Correlation => "Correlation",
                    StatisticsType::Sensitivity => "Sensitivity",
                })
            },
            OperationCategory::FileIO { subcategory } => {
                format!("File I/O - {}", match subcategory {
                    FileIOType::TraceLoad => "Trace Load",
                    FileIOType::ConfigLoad => "Config Load",
                    FileIOType::ResultsSave => "Results Save",
                })
            },
            OperationCategory::Other => "Other Operations".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter directive: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
    #[error("failed to create timing histogram: {0}")]
    Histogram(String),
}

thread_local! {
    static TIMING_STACK: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref FUNCTION_TIMINGS: Arc<RwLock<HashMap<String, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref CATEGORY_TIMINGS: Arc<RwLock<HashMap<OperationCategory, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref HIERARCHICAL_TIMINGS: Arc<RwLock<HashMap<String, (Duration, usize, Vec<String>)>>> = Arc::new(RwLock::new(HashMap::new()));
}

pub struct TimingGuard {
    function_name: &'static str,
    category: OperationCategory,
    start: Instant,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        record_timing_end(self.function_name, duration, &self.category);
    }
}

/// Starts a scoped timer; the measurement is recorded when the guard drops.
/// Recording is skipped entirely unless timing was enabled in `init_logging`.
pub fn start_timing(function_name: &'static str, category: OperationCategory) -> TimingGuard {
    if is_timing_enabled() {
        TIMING_STACK.with(|stack| {
            stack.borrow_mut().push(function_name.to_string());
        });
    }

    TimingGuard {
        function_name,
        category,
        start: Instant::now(),
    }
}

fn timing_histogram() -> Result<Histogram<u64>, LoggingError> {
    Histogram::<u64>::new_with_bounds(HISTOGRAM_LOW, HISTOGRAM_HIGH, HISTOGRAM_SIGFIG)
        .map_err(|e| LoggingError::Histogram(format!("{:?}", e)))
}

fn new_histogram() -> Option<Histogram<u64>> {
    timing_histogram().ok()
}

fn record_timing_end(function_name: &str, duration: Duration, category: &OperationCategory) {
    if !is_timing_enabled() {
        return;
    }

    let duration_ns = duration.as_nanos() as u64;

    // Pop from timing stack and attribute the call to its parent
    TIMING_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.pop().is_some() {
            let mut hierarchical = HIERARCHICAL_TIMINGS.write();
            let entry = hierarchical
                .entry(function_name.to_string())
                .or_insert((Duration::from_nanos(0), 0, Vec::new()));

            entry.0 += duration;
            entry.1 += 1;

            if let Some(parent_name) = stack.last() {
                if !entry.2.contains(parent_name) {
                    entry.2.push(parent_name.clone());
                }
            }
        }
    });

    {
        let mut timings = FUNCTION_TIMINGS.write();
        if !timings.contains_key(function_name) {
            if let Some(histogram) = new_histogram() {
                timings.insert(function_name.to_string(), histogram);
            }
        }
        if let Some(histogram) = timings.get_mut(function_name) {
            let _ = histogram.record(duration_ns.max(HISTOGRAM_LOW));
        }
    }

    {
        let mut category_timings = CATEGORY_TIMINGS.write();
        if !category_timings.contains_key(category) {
            if let Some(histogram) = new_histogram() {
                category_timings.insert(category.clone(), histogram);
            }
        }
        if let Some(histogram) = category_timings.get_mut(category) {
            let _ = histogram.record(duration_ns.max(HISTOGRAM_LOW));
        }
    }
}

pub fn init_logging(enable_timing: bool, debug_logging: bool) -> Result<(), LoggingError> {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let crate_level = if debug_logging { "debug" } else { "info" };
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("info,policy_lab={}", crate_level))?,
    };

    if enable_timing {
        // Each span/event pair gets a fresh copy of this empty histogram
        let template = timing_histogram()?;
        let timing_layer = Builder::default().layer(move || template.clone());

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .with(timing_layer.boxed());

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty());

        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }

    println!("\nDetailed Performance Report");
    println!("==========================");

    println!("\nHierarchical Timing Analysis:");
    println!("---------------------------");
    let hierarchical = HIERARCHICAL_TIMINGS.read();
    let mut entries: Vec<_> = hierarchical.iter().collect();
    entries.sort_by(|a, b| b.1.0.cmp(&a.1.0));

    for (function_name, (total_duration, count, parents)) in entries {
        let avg_duration = total_duration.div_f64(*count as f64);
        println!(
            "{}: total={:.3}s, count={}, avg={:.3}ms{}",
            function_name,
            total_duration.as_secs_f64(),
            count,
            avg_duration.as_secs_f64() * 1000.0,
            if !parents.is_empty() {
                format!("\n  Called by: {}", parents.join(", "))
            } else {
                String::new()
            }
        );
    }

    println!("\nPerformance by Category:");
    println!("------------------------");
    let category_timings = CATEGORY_TIMINGS.read();
    let mut category_vec: Vec<_> = category_timings.iter().collect();
    category_vec.sort_by(|a, b| {
        b.1.mean().partial_cmp(&a.1.mean()).unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_time: f64 = category_vec.iter()
        .map(|(_, hist)| hist.mean() * (hist.len() as f64))
        .sum();

    for (category, histogram) in category_vec {
        let category_total = histogram.mean() * (histogram.len() as f64);
        let percentage = if total_time > 0.0 { (category_total / total_time) * 100.0 } else { 0.0 };
        println!(
            "{}: {:.1}% of total time\n  mean={:.3}ms, p95={:.3}ms, p99={:.3}ms, count={}",
            category.as_str(),
            percentage,
            histogram.mean() / 1_000_000.0,
            histogram.value_at_quantile(0.95) as f64 / 1_000_000.0,
            histogram.value_at_quantile(0.99) as f64 / 1_000_000.0,
            histogram.len(),
        );
    }

    println!("==========================\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_include_subcategory() {
        let category = OperationCategory::Statistics { subcategory: StatisticsType::Anova };
        assert_eq!(category.as_str(), "Statistics - ANOVA");
        assert_eq!(OperationCategory::Aggregation.as_str(), "Aggregation");
    }

    #[test]
    fn timing_histograms_cover_a_minute_in_nanoseconds() {
        let mut histogram = timing_histogram().unwrap();
        assert_eq!(histogram.len(), 0);
        assert_eq!(histogram.high(), HISTOGRAM_HIGH);
        assert!(histogram.record(HISTOGRAM_HIGH).is_ok());
        assert!(histogram.record(u64::MAX / 2).is_err());

        let message = LoggingError::Histogram("BucketSizeTooLarge".to_string()).to_string();
        assert_eq!(message, "failed to create timing histogram: BucketSizeTooLarge");
    }

    #[test]
    fn guards_are_inert_while_timing_is_disabled() {
        assert!(!is_timing_enabled());
        {
            let _timing = start_timing("inert_guard", OperationCategory::Other);
        }
        assert!(!FUNCTION_TIMINGS.read().contains_key("inert_guard"));
    }
}
