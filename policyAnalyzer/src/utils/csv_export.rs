use std::path::{Path, PathBuf};

use chrono::Local;
use csv::Writer;
use tracing::info;

use crate::analysis::metrics::MetricName;
use crate::analysis::result_matrix::ResultMatrix;
use crate::optimization::pareto::ParetoResult;
use crate::optimization::scoring::CompositeScorer;
use crate::statistics::confidence::PolicyIntervals;
use crate::statistics::correlation::{CorrelationCell, CorrelationMatrix};
use crate::statistics::sensitivity::SensitivityRow;
use crate::utils::logging::{self, FileIOType, OperationCategory};

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

/// Writes analysis tables into a timestamped subdirectory of the output directory.
pub struct CsvExporter {
    output_dir: PathBuf,
    timestamp: String,
}

impl CsvExporter {
    pub fn new(output_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let full_path = output_dir.as_ref().join(&timestamp);
        std::fs::create_dir_all(&full_path)?;

        Ok(Self { output_dir: full_path, timestamp })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn writer(&self, file_name: &str) -> Result<(Writer<std::fs::File>, PathBuf), csv::Error> {
        let path = self.output_dir.join(file_name);
        Ok((Writer::from_path(&path)?, path))
    }

    /// One row per (policy, scenario) with every metric and the composite score.
    pub fn export_summary(&self, matrix: &ResultMatrix, scorer: &CompositeScorer) -> Result<PathBuf, csv::Error> {
        let _timing = logging::start_timing("export_summary",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let (mut wtr, path) = self.writer("summary.csv")?;
        let mut header = vec!["Policy".to_string(), "Scenario".to_string()];
        header.extend(MetricName::ALL.iter().map(|m| m.label().to_string()));
        header.push("Composite Score".to_string());
        wtr.write_record(&header)?;

        for row in matrix.rows() {
            for (scenario, metrics) in &row.cells {
                let mut record = vec![row.policy.to_string(), scenario.to_string()];
                record.extend(metrics.iter().map(|(_, v)| format!("{:.4}", v)));
                record.push(format!("{:.2}", scorer.score(metrics)));
                wtr.write_record(&record)?;
            }
        }
        wtr.flush()?;
        Ok(path)
    }

    pub fn export_pareto(&self, label: &str, result: &ParetoResult) -> Result<PathBuf, csv::Error> {
        let (mut wtr, path) = self.writer(&format!("pareto_{}.csv", label))?;
        wtr.write_record(["Policy", "Dominated By", "Pareto Optimal"])?;
        for (policy, rank) in &result.ranks {
            wtr.write_record([
                policy.to_string(),
                rank.to_string(),
                result.is_on_frontier(policy).to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(path)
    }

    pub fn export_confidence_intervals(&self, intervals: &PolicyIntervals) -> Result<PathBuf, csv::Error> {
        let (mut wtr, path) = self.writer("confidence_intervals.csv")?;
        wtr.write_record(["Policy", "Metric", "Mean", "Lower", "Upper", "Margin of Error", "Std Error", "DF"])?;
        for (policy, per_metric) in intervals {
            for (metric, ci) in per_metric {
                wtr.write_record([
                    policy.to_string(),
                    metric.to_string(),
                    format!("{:.4}", ci.mean),
                    format!("{:.4}", ci.lower),
                    format!("{:.4}", ci.upper),
                    format!("{:.4}", ci.margin_of_error),
                    format!("{:.4}", ci.std_error),
                    ci.degrees_of_freedom.to_string(),
                ])?;
            }
        }
        wtr.flush()?;
        Ok(path)
    }

    /// Square matrix; undefined cells are left empty.
    pub fn export_correlation(&self, matrix: &CorrelationMatrix) -> Result<PathBuf, csv::Error> {
        let (mut wtr, path) = self.writer("correlation_matrix.csv")?;
        let mut header = vec![String::new()];
        header.extend(matrix.metrics.iter().map(|m| m.to_string()));
        wtr.write_record(&header)?;

        for (i, metric) in matrix.metrics.iter().enumerate() {
            let mut record = vec![metric.to_string()];
            record.extend(matrix.cells[i].iter().map(|cell| match cell {
                CorrelationCell::Value(r) => format!("{:.4}", r),
                CorrelationCell::Undefined => String::new(),
            }));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(path)
    }

    pub fn export_sensitivity(&self, rows: &[SensitivityRow]) -> Result<PathBuf, csv::Error> {
        let (mut wtr, path) = self.writer("sensitivity.csv")?;
        let mut header = vec!["Parameter".to_string()];
        header.extend(MetricName::ALL.iter().map(|m| format!("{} change (%)", m)));
        wtr.write_record(&header)?;

        for row in rows {
            let mut record = vec![row.parameter.clone()];
            record.extend(
                MetricName::ALL
                    .iter()
                    .map(|m| optional(row.percent_change.get(m).copied().flatten())),
            );
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        info!(path = %path.display(), "exported sensitivity table");
        Ok(path)
    }
}
