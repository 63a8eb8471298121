use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::result_matrix::SimulationRun;
use crate::config::constants::DEFAULT_SIMULATION_DURATION;
use crate::models::policy::{PolicyId, ScenarioId};
use crate::models::vehicle::VehicleRecord;
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug, thiserror::Error)]
pub enum TraceLoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported trace format: {0}")]
    UnsupportedFormat(PathBuf),
}

fn open(path: &Path) -> Result<File, TraceLoadError> {
    File::open(path).map_err(|source| TraceLoadError::Io { path: path.to_path_buf(), source })
}

/// Reads vehicle records from a headed CSV file (`id,delay,speed,travel_time,distance,co2_emissions[,completed]`).
pub fn load_vehicle_records_csv(path: impl AsRef<Path>) -> Result<Vec<VehicleRecord>, TraceLoadError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(open(path)?);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: VehicleRecord = row?;
        records.push(record);
    }
    debug!(path = %path.display(), vehicles = records.len(), "loaded CSV trace");
    Ok(records)
}

/// Reads a JSON array of vehicle records.
pub fn load_vehicle_records_json(path: impl AsRef<Path>) -> Result<Vec<VehicleRecord>, TraceLoadError> {
    let path = path.as_ref();
    let records: Vec<VehicleRecord> = serde_json::from_reader(BufReader::new(open(path)?))?;
    debug!(path = %path.display(), vehicles = records.len(), "loaded JSON trace");
    Ok(records)
}

/// Dispatches on the file extension.
pub fn load_vehicle_records(path: impl AsRef<Path>) -> Result<Vec<VehicleRecord>, TraceLoadError> {
    let _timing = logging::start_timing("load_vehicle_records",
        OperationCategory::FileIO { subcategory: FileIOType::TraceLoad });

    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "csv" => load_vehicle_records_csv(path),
        Some(ext) if ext == "json" => load_vehicle_records_json(path),
        _ => Err(TraceLoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub policy: PolicyId,
    pub scenario: ScenarioId,
    pub trace: PathBuf,
    /// Overrides the manifest-wide duration for this run.
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

/// List of finished simulator runs to analyze. Relative trace paths resolve against the
/// manifest's own directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(default = "default_duration")]
    pub duration_seconds: f64,
    pub runs: Vec<ManifestEntry>,
}

fn default_duration() -> f64 {
    DEFAULT_SIMULATION_DURATION
}

impl RunManifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceLoadError> {
        let _timing = logging::start_timing("load_manifest",
            OperationCategory::FileIO { subcategory: FileIOType::ConfigLoad });

        let path = path.as_ref();
        let manifest: RunManifest = serde_json::from_reader(BufReader::new(open(path)?))?;
        Ok(manifest)
    }

    /// Loads every trace listed, in manifest order.
    pub fn load_runs(&self, base_dir: impl AsRef<Path>) -> Result<Vec<SimulationRun>, TraceLoadError> {
        let base_dir = base_dir.as_ref();
        let runs = self
            .runs
            .iter()
            .map(|entry| {
                let trace_path = if entry.trace.is_absolute() {
                    entry.trace.clone()
                } else {
                    base_dir.join(&entry.trace)
                };
                Ok(SimulationRun {
                    policy: entry.policy.clone(),
                    scenario: entry.scenario.clone(),
                    duration_seconds: entry.duration_seconds.unwrap_or(self.duration_seconds),
                    vehicles: load_vehicle_records(&trace_path)?,
                })
            })
            .collect::<Result<Vec<_>, TraceLoadError>>()?;

        info!(runs = runs.len(), "loaded simulation traces");
        Ok(runs)
    }
}

/// Reads a manifest and all of its traces.
pub fn load_runs_from_manifest(path: impl AsRef<Path>) -> Result<Vec<SimulationRun>, TraceLoadError> {
    let path = path.as_ref();
    let manifest = RunManifest::load(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    manifest.load_runs(base_dir)
}
