//! Subcommand implementations.
//!
//! Exit semantics: a command fails (non-zero exit) only when the run itself
//! could not complete — unreachable collaborators at setup, unreadable suite
//! files. Measured accuracy, however low, is a report finding and never a
//! process failure.

use anchora_bench::{
    BenchmarkHarness, ComparisonReport, KeywordScorer, TestCase, builtin_suite, load_suite,
    render_comparison, render_text, save_json,
};
use anchora_core::config::{AnchoraConfig, VerifierMode};
use anchora_core::{
    AnswerVerifier, BaselinePipeline, ChromaRetriever, JudgeVerifier, LexicalVerifier,
    OllamaGenerator, QaPipeline, QaSystem,
};
use anyhow::Context;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Wire the gated pipeline from configuration.
fn build_pipeline(config: &AnchoraConfig) -> anyhow::Result<Arc<QaPipeline>> {
    let retriever = Arc::new(
        ChromaRetriever::new(&config.retrieval).context("failed to build vector index client")?,
    );
    let generator = Arc::new(
        OllamaGenerator::new(&config.generation).context("failed to build model client")?,
    );
    let verifier: Arc<dyn AnswerVerifier> = match config.verifier.mode {
        VerifierMode::Judge => Arc::new(JudgeVerifier::new(generator.clone())),
        VerifierMode::Lexical => {
            Arc::new(LexicalVerifier::new(config.verifier.lexical_overlap_floor))
        }
    };
    Ok(Arc::new(QaPipeline::new(
        retriever, generator, verifier, config,
    )))
}

fn build_baseline(config: &AnchoraConfig) -> anyhow::Result<Arc<BaselinePipeline>> {
    let retriever = Arc::new(
        ChromaRetriever::new(&config.retrieval).context("failed to build vector index client")?,
    );
    Ok(Arc::new(BaselinePipeline::new(retriever)))
}

fn harness(config: &AnchoraConfig) -> BenchmarkHarness {
    BenchmarkHarness::new(
        Arc::new(KeywordScorer::default()),
        config.bench.concurrency,
    )
}

fn load_cases(suite_path: Option<&Path>) -> anyhow::Result<Vec<TestCase>> {
    match suite_path {
        Some(path) => load_suite(path).with_context(|| format!("loading suite {}", path.display())),
        None => Ok(builtin_suite()),
    }
}

/// `anchora ask <question>`
pub async fn ask(config: &AnchoraConfig, question: &str) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let started = Instant::now();
    let record = pipeline.ask(question).await;
    let elapsed = started.elapsed();

    println!("{}", record.render());
    if !record.sources.is_empty() {
        println!("\nSources:");
        for source in &record.sources {
            match &source.url {
                Some(url) => println!("  - {} ({url})", source.title),
                None => println!("  - {}", source.title),
            }
        }
    }
    info!(
        confidence = %record.confidence,
        elapsed_secs = elapsed.as_secs_f64(),
        "question answered"
    );
    Ok(())
}

/// `anchora serve`
pub async fn serve(config: &AnchoraConfig) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    anchora_core::chat::run(pipeline, &config.server)
        .await
        .context("chat boundary failed")?;
    Ok(())
}

/// `anchora bench full`
pub async fn bench_full(config: &AnchoraConfig, suite_path: Option<&Path>) -> anyhow::Result<()> {
    let cases = load_cases(suite_path)?;
    let h = harness(config);

    let pipeline = build_pipeline(config)?;
    let (system_report, system_results) = h.evaluate(pipeline, &cases).await;
    print!("{}", render_text(&system_report));
    let path = save_json(&config.bench.output_dir, &system_report, &system_results)?;
    println!("Detailed results: {}", path.display());

    let baseline = build_baseline(config)?;
    let (baseline_report, baseline_results) = h.evaluate(baseline, &cases).await;
    print!("{}", render_text(&baseline_report));
    let path = save_json(&config.bench.output_dir, &baseline_report, &baseline_results)?;
    println!("Detailed results: {}", path.display());

    let cmp = ComparisonReport {
        system: system_report,
        baseline: baseline_report,
    };
    print!("{}", render_comparison(&cmp));
    Ok(())
}

/// `anchora bench quick`
pub async fn bench_quick(config: &AnchoraConfig, cases: Option<usize>) -> anyhow::Result<()> {
    let limit = cases.unwrap_or(config.bench.quick_cases);
    let mut suite = builtin_suite();
    suite.truncate(limit);

    let pipeline = build_pipeline(config)?;
    let (report, _) = harness(config).evaluate(pipeline, &suite).await;
    print!("{}", render_text(&report));
    Ok(())
}

/// `anchora bench interactive`
pub async fn bench_interactive(config: &AnchoraConfig) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    println!("Interactive query testing. Type 'quit' to exit.");
    loop {
        print!("\n> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() || query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
            break;
        }

        let started = Instant::now();
        let record = pipeline.ask(query).await;
        let elapsed = started.elapsed();
        println!(
            "[{} | {:.2}s]\n{}",
            record.confidence,
            elapsed.as_secs_f64(),
            record.render()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_suite_path_falls_back_to_builtin() {
        let cases = load_cases(None).unwrap();
        assert_eq!(cases.len(), builtin_suite().len());
    }

    #[test]
    fn missing_suite_file_is_a_setup_failure() {
        assert!(load_cases(Some(Path::new("/nonexistent/suite.json"))).is_err());
    }

    #[test]
    fn default_config_builds_collaborator_clients() {
        let config = AnchoraConfig::default();
        assert!(build_pipeline(&config).is_ok());
        assert!(build_baseline(&config).is_ok());
    }
}
