use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-objective evaluation of traffic policies under climate stress", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "JSON manifest listing (policy, scenario, trace) runs")]
    manifest: PathBuf,

    #[arg(short, long, help = "JSON analysis configuration; defaults are used when omitted")]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "results")]
    output_dir: PathBuf,

    #[arg(long, help = "Confidence level for intervals, overrides the config file")]
    confidence: Option<f64>,

    #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
    parallel: bool,

    #[arg(short, long, help = "Policy used as the baseline for per-metric comparisons")]
    baseline: Option<String>,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,

    #[arg(long, default_value_t = false)]
    no_csv_export: bool,
}

impl Args {
    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Explicit override of the configured confidence level.
    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn enable_csv_export(&self) -> bool {
        !self.no_csv_export
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["policy-lab", "--manifest", "runs.json"]);
        assert_eq!(args.manifest(), Path::new("runs.json"));
        assert!(args.parallel());
        assert!(args.enable_csv_export());
        assert_eq!(args.output_dir(), Path::new("results"));
        assert!(args.confidence().is_none());
    }

    #[test]
    fn overrides() {
        let args = Args::parse_from([
            "policy-lab", "-m", "runs.json", "--parallel", "false", "--confidence", "0.9",
            "--no-csv-export", "--baseline", "fixed-time",
        ]);
        assert!(!args.parallel());
        assert_eq!(args.confidence(), Some(0.9));
        assert!(!args.enable_csv_export());
        assert_eq!(args.baseline(), Some("fixed-time"));
    }
}
