//! Evaluation pipeline: source text plus checker signals in, report out.
//!
//! `evaluate_source` is the pure core entry point. `evaluate_file` and
//! `evaluate_patterns` add file I/O and checker execution around it.

use crate::checkers::{run_all, CheckerSettings};
use crate::error::EvalError;
use crate::metrics::extract_metrics;
use crate::models::{Evaluation, ScoreReport, Signal, Signals};
use crate::probe::probe_shape;
use crate::process::ToolRunner;
use crate::scoring::aggregate;
use crate::source::SourceText;
use glob::glob;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Score a source text against already-collected checker signals.
///
/// When `probe_entry_points` is given, the functional-shape probe runs and
/// replaces `signals.functional`; otherwise the supplied signal is kept.
pub fn evaluate_source(
    source: &SourceText,
    mut signals: Signals,
    probe_entry_points: Option<&[String]>,
) -> ScoreReport {
    let style = extract_metrics(source);
    if let Some(required) = probe_entry_points {
        let shape = probe_shape(source, signals.compiled(), required);
        signals.functional = Signal::Available(shape);
    }
    aggregate(signals, style)
}

/// Read, check, and score one file.
pub fn evaluate_file<R: ToolRunner + ?Sized>(
    path: &Path,
    settings: &CheckerSettings,
    runner: &R,
) -> Result<ScoreReport, EvalError> {
    let source = SourceText::read(path)?;
    let signals = run_all(runner, settings, path);
    let probe = settings
        .probe
        .then_some(settings.required_entry_points.as_slice());
    let report = evaluate_source(&source, signals, probe);
    info!(
        file = %path.display(),
        score = report.overall_score,
        raw = report.raw_score,
        "evaluated"
    );
    Ok(report)
}

/// Expand glob patterns relative to `root` into a sorted, de-duplicated list.
pub fn expand_patterns(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, EvalError> {
    let mut targets: Vec<PathBuf> = Vec::new();
    for pat in patterns {
        let abs = root.join(pat);
        let pattern = abs.to_string_lossy().to_string();
        let entries = glob(&pattern).map_err(|e| EvalError::Pattern {
            pattern: pat.clone(),
            message: e.to_string(),
        })?;
        for entry in entries.flatten() {
            if entry.is_file() {
                targets.push(entry);
            }
        }
    }
    targets.sort();
    targets.dedup();
    Ok(targets)
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct Batch {
    /// Scored files, ranked best first.
    pub evaluations: Vec<Evaluation>,
    /// Files that could not be read, in path order.
    pub failures: Vec<EvalError>,
}

/// Evaluate every file matched by `patterns`.
///
/// Files are processed in parallel; ties are ordered by path so the output
/// does not depend on scheduling. An unreadable file is reported in
/// `failures` and the rest of the batch is still scored. Only an invalid
/// pattern fails the whole call.
pub fn evaluate_patterns<R: ToolRunner + ?Sized>(
    root: &Path,
    patterns: &[String],
    settings: &CheckerSettings,
    runner: &R,
) -> Result<Batch, EvalError> {
    let targets = expand_patterns(root, patterns)?;
    let results: Vec<Result<Evaluation, EvalError>> = targets
        .par_iter()
        .map(|path| {
            evaluate_file(path, settings, runner).map(|report| Evaluation {
                file: display_path(root, path),
                report,
            })
        })
        .collect();

    let mut batch = Batch::default();
    for result in results {
        match result {
            Ok(eval) => batch.evaluations.push(eval),
            Err(e) => {
                warn!(error = %e, "skipping unreadable file");
                batch.failures.push(e);
            }
        }
    }
    rank(&mut batch.evaluations);
    Ok(batch)
}

/// Sort by score descending, then file path.
pub fn rank(evals: &mut [Evaluation]) {
    evals.sort_by(|a, b| {
        b.report
            .overall_score
            .cmp(&a.report.overall_score)
            .then(b.report.raw_score.cmp(&a.report.raw_score))
            .then(a.file.cmp(&b.file))
    });
}

/// Path relative to `root` when possible.
pub fn display_path(root: &Path, path: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::tests::FakeRunner;
    use crate::probe::DEFAULT_ENTRY_POINTS;
    use tempfile::tempdir;

    const GOOD_DRIVER: &str = "\
#include <linux/module.h>

// Load the module
static int __init chardev_init(void) {
  return 0;
}

// Unload the module
static void __exit chardev_exit(void) {
}

static ssize_t dev_read(struct file *f, char *b, size_t l, loff_t *o) {
  return 0;
}

static ssize_t dev_write(struct file *f, const char *b, size_t l, loff_t *o) {
  return l;
}

module_init(chardev_init);
module_exit(chardev_exit);
";

    fn required() -> Vec<String> {
        DEFAULT_ENTRY_POINTS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_evaluate_file_all_clean() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drv.c");
        std::fs::write(&path, GOOD_DRIVER).unwrap();
        let report =
            evaluate_file(&path, &CheckerSettings::default(), &FakeRunner::all_clean()).unwrap();
        assert_eq!(report.style.doc_comment_count, 2);
        assert_eq!(report.raw_score, 130);
        assert_eq!(report.overall_score, 100);
    }

    #[test]
    fn test_evaluate_file_with_no_tools_installed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drv.c");
        std::fs::write(&path, GOOD_DRIVER).unwrap();
        let report =
            evaluate_file(&path, &CheckerSettings::default(), &FakeRunner::default()).unwrap();
        // style 25; compile unavailable so the module cannot load, but the
        // entry points are all present
        assert_eq!(report.raw_score, 35);
        assert_eq!(
            report.compilation["x86_64"],
            Signal::unavailable("`gcc` not found")
        );
        let shape = report.functional.available().unwrap();
        assert!(!shape.module_loadable);
    }

    #[test]
    fn test_probe_disabled_leaves_functional_not_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drv.c");
        std::fs::write(&path, GOOD_DRIVER).unwrap();
        let settings = CheckerSettings {
            probe: false,
            ..CheckerSettings::default()
        };
        let report = evaluate_file(&path, &settings, &FakeRunner::all_clean()).unwrap();
        assert_eq!(report.functional, Signal::default());
        assert_eq!(report.raw_score, 110);
    }

    #[test]
    fn test_evaluate_source_without_checkers() {
        let src = SourceText::new("int add(int a, int b) {\n  return a + b;\n}\n");
        let report = evaluate_source(&src, Signals::default(), None);
        assert_eq!(report.style.avg_function_length, 3.0);
        assert_eq!(report.raw_score, 15);
    }

    #[test]
    fn test_evaluate_source_is_repeatable() {
        let src = SourceText::new(GOOD_DRIVER);
        let req = required();
        let a = evaluate_source(&src, Signals::default(), Some(&req));
        let b = evaluate_source(&src, Signals::default(), Some(&req));
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_invalid_encoding_fails_typed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.c");
        std::fs::write(&path, [0xffu8, 0xfe, 0x00]).unwrap();
        let err = evaluate_file(&path, &CheckerSettings::default(), &FakeRunner::all_clean())
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_evaluate_patterns_ranks_best_first() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("gen")).unwrap();
        std::fs::write(root.join("gen/b_good.c"), GOOD_DRIVER).unwrap();
        std::fs::write(root.join("gen/a_bare.c"), "int x;\n").unwrap();
        std::fs::write(root.join("gen/notes.txt"), "skip").unwrap();
        let batch = evaluate_patterns(
            root,
            &["gen/*.c".to_string()],
            &CheckerSettings::default(),
            &FakeRunner::all_clean(),
        )
        .unwrap();
        assert!(batch.failures.is_empty());
        let evals = &batch.evaluations;
        let files: Vec<_> = evals.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["gen/b_good.c", "gen/a_bare.c"]);
        // both clamp to 100; the raw score breaks the tie
        assert_eq!(evals[1].report.overall_score, 100);
        assert!(evals[0].report.raw_score > evals[1].report.raw_score);
    }

    #[test]
    fn test_unreadable_file_does_not_abort_batch() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("bad.c"), [0xffu8, 0xfe, 0x00]).unwrap();
        std::fs::write(root.join("good.c"), GOOD_DRIVER).unwrap();
        let batch = evaluate_patterns(
            root,
            &["*.c".to_string()],
            &CheckerSettings::default(),
            &FakeRunner::all_clean(),
        )
        .unwrap();
        assert_eq!(batch.evaluations.len(), 1);
        assert_eq!(batch.evaluations[0].file, "good.c");
        assert_eq!(batch.evaluations[0].report.raw_score, 130);
        assert_eq!(batch.failures.len(), 1);
        assert!(matches!(
            &batch.failures[0],
            EvalError::InvalidEncoding { path } if path.ends_with("bad.c")
        ));
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let dir = tempdir().unwrap();
        let err = expand_patterns(dir.path(), &["gen/[.c".to_string()]).unwrap_err();
        assert!(matches!(err, EvalError::Pattern { .. }));
    }
}
