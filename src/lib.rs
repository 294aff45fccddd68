//! drvgrade core library.
//!
//! Scores generated kernel-driver C sources. Structural metrics are derived
//! by line and brace scanning; external checkers (compilers, cppcheck,
//! checkpatch, sparse) are normalized into optional signals; a fixed rule
//! table reduces everything to one deterministic score.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `source`: Immutable source text.
//! - `metrics`: Lexical metrics extraction (brace-tracking state machine).
//! - `signals`: Normalization of raw tool output into checker records.
//! - `probe`: Functional-shape probe for driver entry points.
//! - `scoring`: Declarative rule table and score aggregation.
//! - `process`: External process capability with timeouts.
//! - `checkers`: Compiler and linter collaborators, run concurrently.
//! - `evaluate`: Pipeline entry points for text, files, and glob patterns.
//! - `generate`: Remote code generation collaborator.
//! - `models`: Data models for metrics, signals, and reports.
//! - `output`: Human/JSON printers.
//! - `error`: Typed failures.
pub mod checkers;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod generate;
pub mod metrics;
pub mod models;
pub mod output;
pub mod probe;
pub mod process;
pub mod scoring;
pub mod signals;
pub mod source;

pub use error::{EvalError, GenerateError, ToolUnavailable};
pub use evaluate::{evaluate_file, evaluate_patterns, evaluate_source};
pub use metrics::extract_metrics;
pub use models::{ScoreReport, Signal, Signals, StyleMetrics};
pub use scoring::aggregate;
pub use source::SourceText;
