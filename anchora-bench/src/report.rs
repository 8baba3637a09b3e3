//! Report rendering and persistence.
//!
//! Two outputs per run: a machine-parsable JSON artifact (report plus
//! per-case results, for automated regression comparison) and a human
//! rendering for stdout. A report with zero critical misses is called out
//! distinctly; any critical miss is a release-blocking signal, not a number.

use crate::harness::{BenchmarkReport, ComparisonReport, EvaluationResult};
use crate::suite::Difficulty;
use chrono::Utc;
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// On-disk artifact: the aggregate report with its per-case detail.
#[derive(Debug, Serialize)]
struct ReportArtifact<'a> {
    report: &'a BenchmarkReport,
    results: &'a [EvaluationResult],
}

/// Persist a report and its results as JSON under `output_dir`, named
/// `benchmark_results_<system>_<unix_ts>.json`.
pub fn save_json(
    output_dir: &Path,
    report: &BenchmarkReport,
    results: &[EvaluationResult],
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let slug: String = report
        .system_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let path = output_dir.join(format!(
        "benchmark_results_{slug}_{}.json",
        Utc::now().timestamp()
    ));
    let artifact = ReportArtifact { report, results };
    let json = serde_json::to_string_pretty(&artifact)?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), "benchmark artifact written");
    Ok(path)
}

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

/// Render one report for stdout.
pub fn render_text(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(72));
    let _ = writeln!(out, "BENCHMARK REPORT - {}", report.system_name);
    let _ = writeln!(out, "{}", "=".repeat(72));
    let _ = writeln!(out, "Generated:  {}", report.generated_at.to_rfc3339());
    let _ = writeln!(out, "Scorer:     {}", report.scorer);
    let _ = writeln!(out, "Cases:      {}", report.total_cases);
    let _ = writeln!(
        out,
        "Accuracy:   {} ({}/{})",
        pct(report.overall_accuracy),
        report.correct,
        report.total_cases
    );
    let _ = writeln!(
        out,
        "Mean time:  {:.2}s",
        report.mean_response_time_secs
    );

    let _ = writeln!(out, "\nAccuracy by difficulty:");
    for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        match report.accuracy_by_difficulty.get(&d) {
            Some(acc) => {
                let time = report
                    .response_time_by_difficulty
                    .get(&d)
                    .copied()
                    .unwrap_or(0.0);
                let _ = writeln!(out, "  {d:6}  {:>6}  ({time:.2}s)", pct(*acc));
            }
            None => {
                let _ = writeln!(out, "  {d:6}  (no cases)");
            }
        }
    }

    let _ = writeln!(out, "\nAccuracy by category:");
    for (category, acc) in &report.accuracy_by_category {
        let _ = writeln!(out, "  {category:22}  {:>6}", pct(*acc));
    }

    if report.critical_misses.is_empty() {
        let _ = writeln!(out, "\nNO CRITICAL MISSES");
    } else {
        let _ = writeln!(
            out,
            "\nCRITICAL MISSES ({}) - release blocking:",
            report.critical_misses.len()
        );
        for miss in &report.critical_misses {
            let _ = writeln!(out, "  - {miss}");
        }
    }
    out
}

/// Render a side-by-side comparison against the baseline.
pub fn render_comparison(cmp: &ComparisonReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(72));
    let _ = writeln!(
        out,
        "COMPARISON: {} vs {}",
        cmp.system.system_name, cmp.baseline.system_name
    );
    let _ = writeln!(out, "{}", "=".repeat(72));
    let _ = writeln!(
        out,
        "{:<22} {:>10} {:>10} {:>12}",
        "Metric", "System", "Baseline", "Improvement"
    );

    let improvement = match cmp.relative_improvement() {
        Some(i) => format!("{:+.1}%", i * 100.0),
        None => "n/a".to_string(),
    };
    let _ = writeln!(
        out,
        "{:<22} {:>10} {:>10} {:>12}",
        "Overall accuracy",
        pct(cmp.system.overall_accuracy),
        pct(cmp.baseline.overall_accuracy),
        improvement
    );

    let by_difficulty = cmp.improvement_by_difficulty();
    for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        let (Some(sys), Some(base)) = (
            cmp.system.accuracy_by_difficulty.get(&d),
            cmp.baseline.accuracy_by_difficulty.get(&d),
        ) else {
            continue;
        };
        let improvement = match by_difficulty.get(&d).copied().flatten() {
            Some(i) => format!("{:+.1}%", i * 100.0),
            None => "n/a".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<22} {:>10} {:>10} {:>12}",
            format!("{d} accuracy"),
            pct(*sys),
            pct(*base),
            improvement
        );
    }

    let _ = writeln!(
        out,
        "{:<22} {:>9}s {:>9}s",
        "Mean response time",
        format!("{:.2}", cmp.system.mean_response_time_secs),
        format!("{:.2}", cmp.baseline.mean_response_time_secs),
    );
    let _ = writeln!(
        out,
        "{:<22} {:>10} {:>10}",
        "Critical misses",
        cmp.system.critical_misses.len(),
        cmp.baseline.critical_misses.len(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn report(name: &str, accuracy: f64, misses: Vec<String>) -> BenchmarkReport {
        let mut by_difficulty = BTreeMap::new();
        by_difficulty.insert(Difficulty::Easy, accuracy);
        BenchmarkReport {
            system_name: name.to_string(),
            total_cases: 4,
            correct: (accuracy * 4.0) as usize,
            overall_accuracy: accuracy,
            accuracy_by_difficulty: by_difficulty,
            accuracy_by_category: BTreeMap::new(),
            mean_response_time_secs: 1.5,
            response_time_by_difficulty: BTreeMap::new(),
            critical_misses: misses,
            scorer: "keyword-containment".to_string(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn clean_report_highlights_no_critical_misses() {
        let text = render_text(&report("sys", 0.75, vec![]));
        assert!(text.contains("NO CRITICAL MISSES"));
        assert!(text.contains("75.0%"));
    }

    #[test]
    fn misses_are_listed_as_release_blocking() {
        let text = render_text(&report("sys", 0.5, vec!["risky query".to_string()]));
        assert!(text.contains("release blocking"));
        assert!(text.contains("risky query"));
    }

    #[test]
    fn comparison_renders_relative_improvement() {
        let cmp = ComparisonReport {
            system: report("gated", 0.8, vec![]),
            baseline: report("baseline", 0.4, vec![]),
        };
        let text = render_comparison(&cmp);
        assert!(text.contains("+100.0%"));
    }

    #[test]
    fn artifact_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let r = report("My System", 0.5, vec![]);
        let path = save_json(dir.path(), &r, &[]).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("benchmark_results_My_System_"));
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["report"]["system_name"], "My System");
        assert_eq!(parsed["report"]["overall_accuracy"], 0.5);
    }
}
