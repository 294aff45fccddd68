//! Shared data models: structural metrics, checker signals, and reports.

pub mod signal;

use serde::Serialize;
use std::collections::BTreeMap;

pub use signal::{CompileResult, LintResult, ShapeResult, Signal, Signals, StaticAnalysisResult};

#[derive(Serialize, Debug, Clone, PartialEq)]
/// Structural metrics derived once per source file.
pub struct StyleMetrics {
    pub long_line_count: usize,
    pub has_comments: bool,
    pub doc_comment_count: usize,
    /// Mean function length in lines; exactly 0 when no function was closed.
    pub avg_function_length: f64,
    pub max_nesting_depth: usize,
    /// Lengths of every completed function, in file order.
    pub function_lengths: Vec<usize>,
}

impl Default for StyleMetrics {
    fn default() -> Self {
        Self {
            long_line_count: 0,
            has_comments: false,
            doc_comment_count: 0,
            avg_function_length: 0.0,
            max_nesting_depth: 0,
            function_lengths: Vec::new(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// Outcome of a single scoring rule.
pub struct RuleOutcome {
    pub id: &'static str,
    pub description: &'static str,
    pub points: u32,
    pub earned: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
/// Final report for one evaluation run. Embeds every input record unchanged.
pub struct ScoreReport {
    pub compilation: BTreeMap<String, Signal<CompileResult>>,
    pub primary_arch: String,
    pub style: StyleMetrics,
    pub static_analysis: Signal<StaticAnalysisResult>,
    pub checkpatch: Signal<LintResult>,
    pub sparse: Signal<LintResult>,
    pub functional: Signal<ShapeResult>,
    pub rules: Vec<RuleOutcome>,
    /// Unclamped sum of earned rule points.
    pub raw_score: u32,
    /// Sum of all rule points in the table.
    pub max_score: u32,
    /// `raw_score` clamped into 0..=100.
    pub overall_score: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
/// A scored file, as produced by batch evaluation.
pub struct Evaluation {
    pub file: String,
    pub report: ScoreReport,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// Aggregated batch summary used by printers.
pub struct Summary {
    pub files: usize,
    pub passed: usize,
    pub failed: usize,
    pub min_score: u32,
    /// Files that matched but could not be read.
    pub unreadable: usize,
}

impl Summary {
    /// Gate on `raw_score`: the clamp to 100 would otherwise hide up to 30
    /// lost points, e.g. a missing checkpatch still reading 100/100.
    pub fn from_evaluations(evals: &[Evaluation], min_score: u32) -> Self {
        let passed = evals.iter().filter(|e| e.report.raw_score >= min_score).count();
        Summary {
            files: evals.len(),
            passed,
            failed: evals.len() - passed,
            min_score,
            unreadable: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::aggregate;

    fn scored(file: &str, raw_score: u32) -> Evaluation {
        let mut report = aggregate(Signals::default(), StyleMetrics::default());
        report.raw_score = raw_score;
        report.overall_score = raw_score.min(100);
        Evaluation {
            file: file.into(),
            report,
        }
    }

    #[test]
    fn test_summary_gates_on_raw_score() {
        // both read 100/100; only the perfect one clears 120
        let evals = vec![scored("a.c", 130), scored("b.c", 105)];
        let summary = Summary::from_evaluations(&evals, 120);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(Summary::from_evaluations(&evals, 100).failed, 0);
    }
}
