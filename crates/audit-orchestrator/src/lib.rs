//! Runs a set of analyzer plugins over a file list and merges their findings
//! into one `AnalysisResultSchema`.
//!
//! ```no_run
//! # async fn demo() -> Result<(), audit_orchestrator::OrchestrationError> {
//! use std::path::PathBuf;
//! use audit_orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! let mut orchestrator = Orchestrator::with_builtins(OrchestratorConfig::default());
//! let result = orchestrator.run(&[PathBuf::from("/repo/src/app.ts")]).await?;
//! println!("{}", result.summary_line());
//! # Ok(())
//! # }
//! ```

pub mod orchestrator;

pub use orchestrator::{
    Orchestrator, OrchestratorConfig, OrchestratorPhase, OrchestrationError, PluginRegistry,
    PluginSettings,
};
