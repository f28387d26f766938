use std::path::PathBuf;

use anyhow::{Context, Result};
use audit_orchestrator::{Orchestrator, OrchestratorConfig};
use clap::Parser;
use tracing::info;

/// Run the registered analyzers over a set of files and print the result
/// schema as JSON on stdout.
#[derive(Debug, Parser)]
#[command(name = "audit-orchestrator", version)]
struct Cli {
    /// TOML orchestrator config; defaults apply when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => OrchestratorConfig::load(path)?,
        None => OrchestratorConfig::default(),
    };

    let files = cli
        .files
        .iter()
        .map(|p| std::path::absolute(p).with_context(|| format!("bad path {}", p.display())))
        .collect::<Result<Vec<_>>>()?;

    info!(
        files = files.len(),
        max_concurrent = config.max_concurrent_plugins,
        timeout_ms = config.timeout_ms,
        "Audit orchestrator starting"
    );

    let mut orchestrator = Orchestrator::with_builtins(config);
    let result = orchestrator.run(&files).await?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");

    std::process::exit(result.summary.exit_code);
}
