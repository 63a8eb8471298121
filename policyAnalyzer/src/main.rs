use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use policy_lab::analysis::comparison::{compare_to_baseline, identify_best_policy, Objective};
use policy_lab::analysis::reporting::{
    print_baseline_comparison, print_policy_summary, render_optimization_report, render_statistical_report,
};
use policy_lab::analysis::result_matrix::{build_from_traces, ResultMatrix};
use policy_lab::cli::cli::Args;
use policy_lab::config::analysis_config::AnalysisConfig;
use policy_lab::config::scenarios::ScenarioCatalog;
use policy_lab::data::trace_loader::load_runs_from_manifest;
use policy_lab::optimization::pareto::analyze_pareto;
use policy_lab::statistics::report::StatisticalReport;
use policy_lab::statistics::sensitivity::{sensitivity, SensitivityRow};
use policy_lab::utils::csv_export::CsvExporter;
use policy_lab::utils::logging::{self, FileIOType, OperationCategory};
use policy_lab::{MetricVector, PolicyId};

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let _timing = logging::start_timing("load_config",
        OperationCategory::FileIO { subcategory: FileIOType::ConfigLoad });

    let mut config = match args.config() {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("failed to load analysis config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(confidence) = args.confidence() {
        config.confidence_level = confidence;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging())
        .context("failed to initialise logging")?;

    println!("Climate Policy Lab - multi-objective policy evaluation");
    println!("Parallel aggregation: {}, CSV export: {}",
             if args.parallel() { "enabled" } else { "disabled" },
             if args.enable_csv_export() { "enabled" } else { "disabled" });

    let config = load_config(&args)?;
    let scorer = config.scorer().context("invalid composite score configuration")?;
    let runs = load_runs_from_manifest(args.manifest())
        .with_context(|| format!("failed to load runs from {}", args.manifest().display()))?;

    let progress = ProgressBar::new(runs.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs")
            .context("invalid progress bar template")?
            .progress_chars("#>-"),
    );
    let matrix = build_from_traces(&runs, &config.units, args.parallel(), Some(&progress))
        .context("failed to aggregate simulation traces")?;
    progress.finish_with_message("aggregation complete");

    describe_scenarios(&matrix);

    // Scenario-averaged view across all policies
    let averaged = matrix.averaged_view()?;
    let pareto = analyze_pareto(&averaged, None, config.hypervolume_margin)?;
    let optimization_report = render_optimization_report(&pareto, &averaged, &scorer);
    println!("\n{}", optimization_report);

    for scenario in matrix.scenarios() {
        match matrix.scenario_view(&scenario).and_then(|view| analyze_pareto(&view, None, config.hypervolume_margin)) {
            Ok(result) => info!(%scenario, frontier = result.frontier.len(), hypervolume = result.hypervolume, "scenario frontier"),
            Err(err) => warn!(%scenario, error = %err, "skipping scenario frontier"),
        }
    }

    if let Some(best) = identify_best_policy(&averaged, &Objective::Composite(scorer.clone())) {
        if let Some((_, metrics)) = averaged.iter().find(|(p, _)| p == best) {
            print_policy_summary(best, metrics, &scorer);
        }
    }

    if let Some(baseline) = args.baseline() {
        let baseline_id = PolicyId::new(baseline);
        match averaged.iter().find(|(p, _)| *p == baseline_id) {
            Some((_, baseline_metrics)) => {
                for (policy, metrics) in averaged.iter().filter(|(p, _)| *p != baseline_id) {
                    print_baseline_comparison(&baseline_id, policy, &compare_to_baseline(baseline_metrics, metrics));
                }
            }
            None => warn!(baseline, "baseline policy not found in manifest"),
        }
    }

    let statistics = match StatisticalReport::analyze(&matrix, &config) {
        Ok(report) => {
            println!("\n{}", render_statistical_report(&report, config.strong_correlation_threshold));
            Some(report)
        }
        Err(err) => {
            warn!(error = %err, "statistical analysis skipped");
            None
        }
    };

    if args.enable_csv_export() {
        let exporter = CsvExporter::new(args.output_dir())
            .with_context(|| format!("failed to create output directory under {}", args.output_dir().display()))?;

        exporter.export_summary(&matrix, &scorer)?;
        exporter.export_pareto("averaged", &pareto)?;
        if let Some(report) = &statistics {
            exporter.export_confidence_intervals(&report.confidence_intervals)?;
            exporter.export_correlation(&report.correlation)?;
        }
        exporter.export_sensitivity(&scenario_sensitivity(&matrix))?;

        fs::write(exporter.output_dir().join("optimization_report.md"), &optimization_report)
            .context("failed to write optimization report")?;
        if let Some(report) = &statistics {
            fs::write(
                exporter.output_dir().join("statistical_report.md"),
                render_statistical_report(report, config.strong_correlation_threshold),
            )
            .context("failed to write statistical report")?;
        }
        println!("Results written to: {}", exporter.output_dir().display());
    }

    logging::print_timing_report();
    Ok(())
}

fn describe_scenarios(matrix: &ResultMatrix) {
    let catalog = ScenarioCatalog::default();
    for scenario in matrix.scenarios() {
        match catalog.get(scenario.as_str()) {
            Ok(known) => info!(scenario = %scenario, "{}", known.summary()),
            Err(_) => info!(scenario = %scenario, "custom scenario"),
        }
    }
}

/// Percent change of every policy's stressed scenarios against its first (reference) scenario.
fn scenario_sensitivity(matrix: &ResultMatrix) -> Vec<SensitivityRow> {
    let mut rows = Vec::new();
    for row in matrix.rows() {
        let Some(((_, base), rest)) = row.cells.split_first() else {
            continue;
        };
        let variations: Vec<(String, MetricVector)> = rest
            .iter()
            .map(|(scenario, metrics)| (format!("{}:{}", row.policy, scenario), *metrics))
            .collect();
        rows.extend(sensitivity(base, &variations));
    }
    rows
}
