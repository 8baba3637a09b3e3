//! Anchora CLI — ask questions, serve the chat boundary, run benchmarks.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Anchora: confidence-gated answering over your team knowledge base
#[derive(Parser, Debug)]
#[command(name = "anchora", version, about, long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./anchora.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Ask a single question against the pipeline
    Ask {
        /// The question to answer
        question: String,
    },
    /// Serve the chat HTTP boundary
    Serve,
    /// Run the stratified accuracy benchmark
    Bench {
        #[command(subcommand)]
        mode: BenchMode,
    },
}

#[derive(clap::Subcommand, Debug)]
enum BenchMode {
    /// Full suite against the gated pipeline and the baseline, with comparison
    Full {
        /// JSON suite file (defaults to the builtin suite)
        #[arg(long)]
        suite: Option<PathBuf>,
    },
    /// Bounded subset against the gated pipeline only, for fast iteration
    Quick {
        /// Number of cases to run
        #[arg(long)]
        cases: Option<usize>,
    },
    /// Ad-hoc query loop against the pipeline, for debugging
    Interactive,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("anchora={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = anchora_core::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Ask { question } => commands::ask(&config, &question).await,
        Commands::Serve => commands::serve(&config).await,
        Commands::Bench { mode } => match mode {
            BenchMode::Full { suite } => commands::bench_full(&config, suite.as_deref()).await,
            BenchMode::Quick { cases } => commands::bench_quick(&config, cases).await,
            BenchMode::Interactive => commands::bench_interactive(&config).await,
        },
    }
}
