//! Analysis orchestration: plugin lifecycle, batched execution, scoring and
//! result assembly.
//!
//! ## Sub-modules
//!
//! | Module            | Purpose                                                |
//! |-------------------|--------------------------------------------------------|
//! | `config`          | Orchestrator and per-plugin settings (TOML loadable)   |
//! | `errors`          | Errors surfaced by a run                               |
//! | `registry`        | Plugin name → factory mapping                          |
//! | `scheduler`       | Batched, time-boxed plugin execution                   |
//! | `scoring`         | Quality, debt, security and exit-code derivation       |
//! | `recommendations` | Templates turning findings into recommendations        |
//! | `runner`          | `Orchestrator` driver and its phase machine            |

pub mod config;
pub mod errors;
pub mod recommendations;
pub mod registry;
pub mod runner;
pub(crate) mod scheduler;
pub mod scoring;

pub use config::{OrchestratorConfig, PluginSettings};
pub use errors::OrchestrationError;
pub use recommendations::{
    CodeQualityTemplate, RecommendationInput, RecommendationTemplate, SecurityTemplate,
};
pub use registry::{PluginFactory, PluginRegistry};
pub use runner::{Orchestrator, OrchestratorPhase};
