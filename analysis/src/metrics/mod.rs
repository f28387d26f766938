//! Metrics Engine: complexity, maintainability and duplication findings
//! computed directly from parsed source.
//!
//! # Pipeline
//!
//! ```text
//! read file → tree-sitter parse → single cursor walk (cyclomatic, cognitive, functions, classes)
//!           → line scan (code / comment / blank)
//!           → maintainability index
//!           → sliding-window duplicate hashing (per file, then across the file set)
//!           → threshold issues
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use audit_analysis::metrics::MetricsPlugin;
//! use audit_analysis::plugin::{AnalysisContext, AnalyzerPlugin};
//!
//! let mut plugin = MetricsPlugin::new(serde_json::Value::Null);
//! plugin.initialize().await?;
//! let issues = plugin.analyze(&AnalysisContext::detached("metrics"), &files).await?;
//! ```

pub mod complexity;
pub mod duplication;
pub mod language;
pub mod lines;
pub mod plugin;

pub use complexity::{
    analyze_source, maintainability_index, ClassMetrics, FileMetrics, FunctionMetrics,
};
pub use duplication::{
    find_cross_file_duplicates, find_intra_file_duplicates, window_hash, DuplicateLocation,
    DuplicatedBlock,
};
pub use language::SourceLanguage;
pub use plugin::{MetricsConfig, MetricsPlugin, METRICS_PLUGIN_NAME};
