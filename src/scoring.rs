//! Score aggregation over normalized checker signals and style metrics.
//!
//! The score is the sum of a fixed table of independent boolean rules. A rule
//! whose input signal is unavailable is simply not earned. The table sums to
//! 130; `overall_score` is clamped to 100 and the unclamped sum is kept as
//! `raw_score`.
//!
//! | Rule                                         | Points |
//! |----------------------------------------------|--------|
//! | compilation succeeded                        | 30     |
//! | zero compiler warnings                       | 10     |
//! | fewer than 5 long lines                      | 5      |
//! | file has comments                            | 5      |
//! | at least one documented function             | 5      |
//! | average function length < 50                 | 5      |
//! | max nesting depth <= 3                       | 5      |
//! | static analyzer reported no "error"          | 5      |
//! | no vulnerability keyword in static analyzer  | 10     |
//! | checkpatch zero errors                       | 10     |
//! | checkpatch zero warnings                     | 5      |
//! | sparse zero errors                           | 10     |
//! | sparse zero warnings                         | 5      |
//! | module loadable                              | 10     |
//! | every required entry point present           | 10     |

use crate::models::{RuleOutcome, ScoreReport, Signals, StyleMetrics};

/// Upper bound of `ScoreReport::overall_score`.
pub const SCORE_CEILING: u32 = 100;

/// One row of the scoring table.
pub struct ScoreRule {
    pub id: &'static str,
    pub description: &'static str,
    pub points: u32,
    pub check: fn(&Signals, &StyleMetrics) -> bool,
}

pub const RULES: &[ScoreRule] = &[
    ScoreRule {
        id: "compile.success",
        description: "compilation succeeded",
        points: 30,
        check: |s, _| s.primary_compile().map(|c| c.success).unwrap_or(false),
    },
    ScoreRule {
        id: "compile.no_warnings",
        description: "zero compiler warnings",
        points: 10,
        check: |s, _| {
            s.primary_compile()
                .map(|c| c.warning_count == 0)
                .unwrap_or(false)
        },
    },
    ScoreRule {
        id: "style.long_lines",
        description: "fewer than 5 long lines",
        points: 5,
        check: |_, m| m.long_line_count < 5,
    },
    ScoreRule {
        id: "style.comments",
        description: "file has comments",
        points: 5,
        check: |_, m| m.has_comments,
    },
    ScoreRule {
        id: "style.documented_function",
        description: "at least one documented function",
        points: 5,
        check: |_, m| m.doc_comment_count >= 1,
    },
    ScoreRule {
        id: "maintainability.function_length",
        description: "average function length below 50 lines",
        points: 5,
        check: |_, m| m.avg_function_length < 50.0,
    },
    ScoreRule {
        id: "maintainability.nesting",
        description: "max nesting depth at most 3",
        points: 5,
        check: |_, m| m.max_nesting_depth <= 3,
    },
    ScoreRule {
        id: "static.no_errors",
        description: "static analyzer reported no errors",
        points: 5,
        check: |s, _| {
            s.static_analysis
                .available()
                .map(|a| a.error_count == 0)
                .unwrap_or(false)
        },
    },
    ScoreRule {
        id: "static.no_vulnerabilities",
        description: "no vulnerability keywords in static analyzer output",
        points: 10,
        check: |s, _| {
            s.static_analysis
                .available()
                .map(|a| a.vulnerability_hits.is_empty())
                .unwrap_or(false)
        },
    },
    ScoreRule {
        id: "checkpatch.no_errors",
        description: "kernel lint reported zero errors",
        points: 10,
        check: |s, _| {
            s.checkpatch
                .available()
                .map(|l| l.error_count == 0)
                .unwrap_or(false)
        },
    },
    ScoreRule {
        id: "checkpatch.no_warnings",
        description: "kernel lint reported zero warnings",
        points: 5,
        check: |s, _| {
            s.checkpatch
                .available()
                .map(|l| l.warning_count == 0)
                .unwrap_or(false)
        },
    },
    ScoreRule {
        id: "sparse.no_errors",
        description: "kernel static analyzer reported zero errors",
        points: 10,
        check: |s, _| s.sparse.available().map(|l| l.error_count == 0).unwrap_or(false),
    },
    ScoreRule {
        id: "sparse.no_warnings",
        description: "kernel static analyzer reported zero warnings",
        points: 5,
        check: |s, _| {
            s.sparse
                .available()
                .map(|l| l.warning_count == 0)
                .unwrap_or(false)
        },
    },
    ScoreRule {
        id: "functional.loadable",
        description: "module loadable (compiled with init and exit)",
        points: 10,
        check: |s, _| {
            s.functional
                .available()
                .map(|f| f.module_loadable)
                .unwrap_or(false)
        },
    },
    ScoreRule {
        id: "functional.entry_points",
        description: "every required entry point present",
        points: 10,
        check: |s, _| {
            s.functional
                .available()
                .map(|f| f.entry_points_found.values().all(|found| *found))
                .unwrap_or(false)
        },
    },
];

/// Sum of every rule's points.
pub fn max_score() -> u32 {
    RULES.iter().map(|r| r.points).sum()
}

/// Evaluate every rule and assemble the report. Pure.
pub fn aggregate(signals: Signals, style: StyleMetrics) -> ScoreReport {
    let rules: Vec<RuleOutcome> = RULES
        .iter()
        .map(|rule| RuleOutcome {
            id: rule.id,
            description: rule.description,
            points: rule.points,
            earned: (rule.check)(&signals, &style),
        })
        .collect();
    let raw_score: u32 = rules.iter().filter(|r| r.earned).map(|r| r.points).sum();

    let Signals {
        primary_arch,
        compilation,
        static_analysis,
        checkpatch,
        sparse,
        functional,
    } = signals;

    ScoreReport {
        compilation,
        primary_arch,
        style,
        static_analysis,
        checkpatch,
        sparse,
        functional,
        rules,
        raw_score,
        max_score: max_score(),
        overall_score: raw_score.min(SCORE_CEILING),
    }
}
