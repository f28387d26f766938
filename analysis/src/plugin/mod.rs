//! Plugin capability contract and error taxonomy.

pub mod contract;
pub mod errors;

pub use contract::{AnalysisContext, AnalyzerPlugin};
pub use errors::{FailureKind, PluginError};
