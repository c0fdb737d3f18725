//! Analyst CLI - analyse one chess position with a UCI engine.
//!
//! Prints one JSON report per incremental update to stdout, followed by the
//! final report. Logs go to stderr and are controlled by `RUST_LOG`.
//! Ctrl-C stops the running search.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chess_common::CozyRules;
use clap::Parser;
use engine::EngineOptions;
use orchestrator::{
    AnalysisReport, AnalysisService, EvaluationResult, OrchestratorConfig, ProcessFactory,
    ScoreSmoothing, UpdateCallback,
};

mod config;

#[derive(Parser)]
#[command(name = "analyst", about = "Stream chess engine analysis of a position as JSON")]
struct Cli {
    /// Position to analyse, in FEN.
    fen: String,

    /// Target search depth.
    #[arg(short, long, default_value_t = 18)]
    depth: u32,

    /// Engine binary. Overrides ANALYST_ENGINE_PATH.
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Wall-clock limit for the search. Overrides ANALYST_TIMEOUT_SECS.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Number of candidate lines to request (1-5).
    #[arg(long, default_value_t = 3)]
    multipv: u8,

    #[arg(long)]
    threads: Option<u32>,

    #[arg(long)]
    hash_mb: Option<u32>,

    /// Engine strength (0-20).
    #[arg(long)]
    skill_level: Option<u8>,

    /// Bound every search by this many milliseconds.
    #[arg(long)]
    movetime_ms: Option<u64>,

    /// Damp small evaluations before display.
    #[arg(long)]
    smoothing: bool,

    /// Use the long batch-analysis time limit.
    #[arg(long)]
    batch: bool,
}

impl Cli {
    fn orchestrator_config(&self) -> OrchestratorConfig {
        let base = if self.batch {
            OrchestratorConfig::batch()
        } else {
            OrchestratorConfig::default()
        };
        let defaults = EngineOptions::default();
        let request_timeout = match (self.timeout_secs, self.batch) {
            (None, true) => base.request_timeout,
            (flag, _) => config::get_timeout(flag),
        };

        OrchestratorConfig {
            engine: EngineOptions {
                threads: self.threads.or(defaults.threads),
                hash_mb: self.hash_mb.or(defaults.hash_mb),
                skill_level: self.skill_level,
                multipv: self.multipv,
            },
            request_timeout,
            movetime_cap: self.movetime_ms,
            smoothing: if self.smoothing {
                ScoreSmoothing::Damped
            } else {
                ScoreSmoothing::Off
            },
            ..base
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with span durations
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine_path = config::get_engine_path(cli.engine.clone());
    let orchestrator_config = cli.orchestrator_config();
    tracing::info!(
        engine = %engine_path.display(),
        depth = cli.depth,
        timeout = ?orchestrator_config.request_timeout,
        "Starting analysis"
    );

    let service = AnalysisService::new(
        orchestrator_config,
        Arc::new(ProcessFactory::new(engine_path)),
        Arc::new(CozyRules),
    );
    let session_id = service.create_session().await;

    let on_update: UpdateCallback = Box::new(|result: EvaluationResult| {
        if result.is_terminal {
            return;
        }
        match serde_json::to_string(&AnalysisReport::from(&result)) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("Failed to encode update: {}", e),
        }
    });

    let analysis = service.analyze(&session_id, &cli.fen, cli.depth, Some(on_update));
    tokio::pin!(analysis);

    let outcome = tokio::select! {
        result = &mut analysis => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping analysis");
            service.stop(&session_id).await;
            (&mut analysis).await
        }
    };

    service.shutdown().await;

    let report = match &outcome {
        Ok(result) => AnalysisReport::from(result),
        Err(_) => AnalysisReport::error(),
    };
    println!(
        "{}",
        serde_json::to_string(&report).context("Failed to encode report")?
    );

    outcome.context("Analysis failed")?;
    Ok(())
}
