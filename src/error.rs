//! Typed failures surfaced by the library.
//!
//! Data-shape problems (missing tools, unbalanced braces) never show up here;
//! they are folded into reports. Only conditions that make an evaluation
//! impossible are errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the evaluation of a source file.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", path.display())]
    InvalidEncoding { path: PathBuf },

    #[error("invalid file pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

/// Reasons an external tool could not produce output.
///
/// Every variant is converted into an "unavailable" signal by the
/// normalizer; none of them propagate out of a checker run.
#[derive(Error, Debug)]
pub enum ToolUnavailable {
    #[error("`{program}` not found")]
    NotFound { program: String },

    #[error("`{program}` timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },

    #[error("`{program}` failed to run: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the remote code generation collaborator.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("missing API key: {env_var} not set")]
    MissingApiKey { env_var: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse API response: {0}")]
    Parse(String),

    #[error("no code generated in API response")]
    EmptyResponse,
}
