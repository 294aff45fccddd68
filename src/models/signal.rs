//! Normalized records for each external checker category.
//!
//! A category that could not run carries `Signal::Unavailable` with a
//! human-readable reason. Normalization never invents numbers for it; the
//! aggregator decides what absence is worth.

use serde::Serialize;
use std::collections::BTreeMap;

/// Reason recorded for a category that was never requested.
pub const NOT_RUN: &str = "not run";

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
/// Output of one checker category, or the reason it is missing.
pub enum Signal<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Signal<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Signal::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Signal::Available(v) => Some(v),
            Signal::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Signal::Available(_))
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Signal::unavailable(NOT_RUN)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// Compiler run for one target architecture.
pub struct CompileResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub warning_count: usize,
    pub error_count: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// Generic static analyzer (cppcheck) diagnostics.
pub struct StaticAnalysisResult {
    pub raw_text: String,
    pub error_count: usize,
    /// Vulnerability keywords found in `raw_text`, in table order.
    pub vulnerability_hits: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// Kernel lint (checkpatch) or kernel static analyzer (sparse) findings.
pub struct LintResult {
    pub raw_text: String,
    pub warning_count: usize,
    pub error_count: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// Functional-shape probe: which entry-point categories exist.
pub struct ShapeResult {
    pub entry_points_found: BTreeMap<String, bool>,
    pub module_loadable: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
/// Every checker signal consumed by the aggregator.
pub struct Signals {
    /// Architecture whose compile result feeds the compile rules.
    pub primary_arch: String,
    pub compilation: BTreeMap<String, Signal<CompileResult>>,
    pub static_analysis: Signal<StaticAnalysisResult>,
    pub checkpatch: Signal<LintResult>,
    pub sparse: Signal<LintResult>,
    pub functional: Signal<ShapeResult>,
}

impl Default for Signals {
    fn default() -> Self {
        Signals {
            primary_arch: "x86_64".to_string(),
            compilation: BTreeMap::new(),
            static_analysis: Signal::default(),
            checkpatch: Signal::default(),
            sparse: Signal::default(),
            functional: Signal::default(),
        }
    }
}

impl Signals {
    /// Compile result of the primary architecture, if it ran.
    pub fn primary_compile(&self) -> Option<&CompileResult> {
        self.compilation
            .get(&self.primary_arch)
            .and_then(Signal::available)
    }

    pub fn compiled(&self) -> bool {
        self.primary_compile().map(|c| c.success).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_serializes_with_status_tag() {
        let ok: Signal<LintResult> = Signal::Available(LintResult {
            raw_text: String::new(),
            warning_count: 1,
            error_count: 0,
        });
        let v = serde_json::to_value(&ok).unwrap();
        assert_eq!(v["status"], "available");
        assert_eq!(v["warning_count"], 1);

        let missing: Signal<LintResult> = Signal::unavailable("`sparse` not found");
        let v = serde_json::to_value(&missing).unwrap();
        assert_eq!(v["status"], "unavailable");
        assert_eq!(v["reason"], "`sparse` not found");
    }

    #[test]
    fn test_primary_compile_missing_arch() {
        let mut s = Signals::default();
        s.compilation.insert(
            "arm64".into(),
            Signal::Available(CompileResult {
                success: true,
                stdout: String::new(),
                stderr: String::new(),
                warning_count: 0,
                error_count: 0,
            }),
        );
        assert!(s.primary_compile().is_none());
        assert!(!s.compiled());
    }
}
