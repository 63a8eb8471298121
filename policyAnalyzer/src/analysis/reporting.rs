use std::collections::BTreeMap;

use super::comparison::MetricComparison;
use super::metrics::{MetricName, MetricVector};
use crate::config::constants::TOP_RANKED_POLICIES;
use crate::models::policy::PolicyId;
use crate::optimization::pareto::ParetoResult;
use crate::optimization::scoring::CompositeScorer;
use crate::statistics::correlation::CorrelationCell;
use crate::statistics::report::StatisticalReport;

fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.1}%", v),
        None => "n/a".to_string(),
    }
}

/// Markdown summary of a Pareto analysis: frontier members with their metrics and the
/// best-ranked policies.
pub fn render_optimization_report(
    result: &ParetoResult,
    policies: &[(PolicyId, MetricVector)],
    scorer: &CompositeScorer,
) -> String {
    let mut out = String::new();
    out.push_str("# Multi-Objective Optimization Report\n\n");
    out.push_str("## Summary\n\n");
    out.push_str(&format!("- Policies evaluated: {}\n", policies.len()));
    out.push_str(&format!("- Pareto optimal policies: {}\n", result.frontier.len()));
    out.push_str(&format!("- Hypervolume: {:.4e}\n\n", result.hypervolume));

    out.push_str("## Pareto Frontier\n\n");
    for policy in &result.frontier {
        out.push_str(&format!("### {}\n", policy));
        if let Some((_, metrics)) = policies.iter().find(|(p, _)| p == policy) {
            for (metric, value) in metrics.iter() {
                out.push_str(&format!("- {}: {:.2}\n", metric.label(), value));
            }
            out.push_str(&format!("- Composite Score: {:.1}\n", scorer.score(metrics)));
        }
        out.push('\n');
    }

    out.push_str(&format!("## Top {} Policies by Dominance Rank\n\n", TOP_RANKED_POLICIES));
    out.push_str("| Rank | Policy | Dominated By | Composite Score |\n");
    out.push_str("|------|--------|--------------|-----------------|\n");
    for (position, (policy, rank)) in result.ordered_ranks().iter().take(TOP_RANKED_POLICIES).enumerate() {
        let composite = policies
            .iter()
            .find(|(p, _)| p == policy)
            .map(|(_, m)| format!("{:.1}", scorer.score(m)))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("| {} | {} | {} | {} |\n", position + 1, policy, rank, composite));
    }

    out
}

/// Markdown rendering of ANOVA results, confidence intervals and strong correlations.
pub fn render_statistical_report(report: &StatisticalReport, correlation_threshold: f64) -> String {
    let mut out = String::new();
    out.push_str("# Statistical Analysis Report\n\n");

    out.push_str("## Analysis of Variance\n\n");
    for (metric, result) in &report.anova {
        out.push_str(&format!("### {}\n", metric.label()));
        out.push_str(&format!("- F-statistic: {:.4}\n", result.f_statistic));
        out.push_str(&format!("- p-value: {:.6}\n", result.p_value));
        out.push_str(&format!("- df: ({}, {})\n", result.df_between, result.df_within));
        out.push_str(&format!("- Result: {}\n\n", result.interpretation));
    }

    out.push_str(&format!(
        "## Confidence Intervals ({:.0}%)\n\n",
        report.confidence_level * 100.0
    ));
    for (policy, intervals) in &report.confidence_intervals {
        out.push_str(&format!("### {}\n", policy));
        for (metric, ci) in intervals {
            out.push_str(&format!(
                "- {}: {:.2} [{:.2}, {:.2}] (±{:.2})\n",
                metric.label(),
                ci.mean,
                ci.lower,
                ci.upper,
                ci.margin_of_error
            ));
        }
        out.push('\n');
    }

    out.push_str("## Strong Correlations\n\n");
    let strong = report.strong_correlations(correlation_threshold);
    if strong.is_empty() {
        out.push_str(&format!("No metric pairs with |r| > {:.2}\n", correlation_threshold));
    }
    for (left, right, r) in strong {
        out.push_str(&format!("- {} vs {}: r = {:.3}\n", left, right, r));
    }

    let undefined: Vec<MetricName> = report
        .correlation
        .metrics
        .iter()
        .copied()
        .filter(|m| report.correlation.get(*m, *m) == CorrelationCell::Undefined)
        .collect();
    if !undefined.is_empty() {
        let names: Vec<&str> = undefined.iter().map(|m| m.as_str()).collect();
        out.push_str(&format!("\nUndefined (zero variance): {}\n", names.join(", ")));
    }

    out
}

pub fn print_policy_summary(policy: &PolicyId, metrics: &MetricVector, scorer: &CompositeScorer) {
    println!("\nPolicy {} Summary", policy);
    println!("----------------------------------------");
    println!("Traffic Metrics:");
    println!("  Average Delay: {:.2} s", metrics.average_delay);
    println!("  Throughput: {:.1} veh/h", metrics.throughput);
    println!("  Average Speed: {:.2} km/h", metrics.average_speed);
    println!("  Total Travel Time: {:.2} h", metrics.total_travel_time);
    println!("Environmental Metrics:");
    println!("  CO2 Emissions: {:.2} kg", metrics.co2_emissions);
    println!("Composite Score: {:.1}", scorer.score(metrics));
}

pub fn print_baseline_comparison(
    baseline: &PolicyId,
    policy: &PolicyId,
    comparison: &BTreeMap<MetricName, MetricComparison>,
) {
    println!("\n{} vs {}:", policy, baseline);
    println!("----------------------------------------");
    for (metric, c) in comparison {
        println!(
            "  {}: {:.2} -> {:.2} ({}){}",
            metric.label(),
            c.baseline,
            c.policy,
            format_percent(c.percent_change),
            if c.is_improvement { " improved" } else { "" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result_matrix::ResultMatrix;
    use crate::config::analysis_config::{AnalysisConfig, NormalizationRanges};
    use crate::optimization::scoring::ScoreWeights;
    use crate::optimization::pareto::analyze_pareto;

    #[test]
    fn optimization_report_lists_frontier_and_ranking() {
        let policies = vec![
            (PolicyId::new("fixed"), MetricVector::new(80.0, 1000.0, 450.0, 28.0, 90.0)),
            (PolicyId::new("adaptive"), MetricVector::new(50.0, 1300.0, 380.0, 36.0, 60.0)),
        ];
        let result = analyze_pareto(&policies, None, 0.1).unwrap();
        let text = render_optimization_report(&result, &policies, &CompositeScorer::default());

        assert!(text.contains("Pareto optimal policies: 1"));
        assert!(text.contains("### adaptive"));
        assert!(text.contains("| 1 | adaptive | 0 |"));
        assert!(text.contains("| 2 | fixed | 1 |"));
    }

    #[test]
    fn composite_column_follows_configured_ranges() {
        let policies = vec![(PolicyId::new("fast"), MetricVector::new(60.0, 1000.0, 500.0, 60.0, 0.0))];
        let result = analyze_pareto(&policies, None, 0.1).unwrap();

        // 80, 50, 50, 100 under the default 60 km/h speed range
        let default_text = render_optimization_report(&result, &policies, &CompositeScorer::default());
        assert!(default_text.contains("- Composite Score: 70.0"));

        let ranges = NormalizationRanges { speed_max: 120.0, ..NormalizationRanges::default() };
        let scorer = CompositeScorer::new(ScoreWeights::default(), ranges).unwrap();
        let text = render_optimization_report(&result, &policies, &scorer);
        assert!(text.contains("- Composite Score: 57.5"));
        assert!(text.contains("| 1 | fast | 0 | 57.5 |"));
    }

    #[test]
    fn statistical_report_has_every_section() {
        let mut builder = ResultMatrix::builder();
        for (policy, shift) in [("a", 0.0), ("b", 20.0)] {
            for (i, scenario) in ["baseline", "severe"].iter().enumerate() {
                let j = i as f64;
                builder.insert(policy.into(), (*scenario).into(),
                    MetricVector::new(40.0 + shift + j, 1200.0 - shift * 5.0 + j, 300.0 + shift, 35.0, 70.0 + j));
            }
        }
        let report = StatisticalReport::analyze(&builder.build(), &AnalysisConfig::default()).unwrap();
        let text = render_statistical_report(&report, 0.7);

        assert!(text.contains("## Analysis of Variance"));
        assert!(text.contains("## Confidence Intervals (95%)"));
        assert!(text.contains("### b"));
        assert!(text.contains("Undefined (zero variance): average_speed"));
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(Some(12.345)), "+12.3%");
        assert_eq!(format_percent(None), "n/a");
    }
}
