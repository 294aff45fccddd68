//! Normalize raw tool output into fixed-shape checker records.
//!
//! Warning and error counts are case-insensitive substring counts of the
//! tool's own vocabulary (`warning`, `error:` ...). This is a heuristic:
//! gcc's `-Werror` note counts as an error and a cppcheck message about a
//! "trace" buffer matches the `race` keyword. Tests pin this behavior rather
//! than semantic accuracy.

use crate::error::ToolUnavailable;
use crate::models::{CompileResult, LintResult, Signal, StaticAnalysisResult};
use crate::process::ToolOutput;

/// Keywords that flag a potential vulnerability in static analyzer text.
pub const VULNERABILITY_KEYWORDS: &[&str] =
    &["buffer overflow", "leak", "race", "input validation"];

/// Case-insensitive, non-overlapping occurrences of `token` in `text`.
pub fn count_token(text: &str, token: &str) -> usize {
    if token.is_empty() {
        return 0;
    }
    text.to_lowercase().matches(&token.to_lowercase()).count()
}

/// Compiler diagnostics come from stderr.
pub fn normalize_compile(out: ToolOutput) -> CompileResult {
    let warning_count = count_token(&out.stderr, "warning");
    let error_count = count_token(&out.stderr, "error");
    CompileResult {
        success: out.success,
        stdout: out.stdout,
        stderr: out.stderr,
        warning_count,
        error_count,
    }
}

/// First non-empty line of stderr, falling back to stdout.
fn failure_detail(out: &ToolOutput) -> String {
    out.stderr
        .lines()
        .chain(out.stdout.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("exited without output")
        .to_string()
}

/// cppcheck reports findings on stderr and exits 0 once it has analyzed the
/// file; a non-zero exit means it never got that far.
pub fn normalize_static_analysis(out: ToolOutput) -> Result<StaticAnalysisResult, String> {
    if !out.success {
        return Err(format!("cppcheck failed: {}", failure_detail(&out)));
    }
    let raw_text = out.stderr;
    let lowered = raw_text.to_lowercase();
    let vulnerability_hits = VULNERABILITY_KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .map(|kw| kw.to_string())
        .collect();
    Ok(StaticAnalysisResult {
        error_count: count_token(&raw_text, "error"),
        vulnerability_hits,
        raw_text,
    })
}

/// checkpatch prints `WARNING:` / `ERROR:` lines on stdout and always ends a
/// completed run with a `total:` line. Without it the script did not run.
pub fn normalize_checkpatch(out: ToolOutput) -> Result<LintResult, String> {
    if !out.stdout.lines().any(|l| l.trim_start().starts_with("total:")) {
        return Err(format!("no checkpatch summary: {}", failure_detail(&out)));
    }
    Ok(lint_from_text(out.stdout))
}

/// sparse mixes diagnostics across both streams.
pub fn normalize_sparse(out: ToolOutput) -> LintResult {
    lint_from_text(out.stderr + &out.stdout)
}

fn lint_from_text(raw_text: String) -> LintResult {
    LintResult {
        warning_count: count_token(&raw_text, "warning:"),
        error_count: count_token(&raw_text, "error:"),
        raw_text,
    }
}

/// Wrap a runner result, mapping tool failures to an unavailable signal.
pub fn to_signal<T>(
    result: Result<ToolOutput, ToolUnavailable>,
    normalize: impl FnOnce(ToolOutput) -> T,
) -> Signal<T> {
    to_checked_signal(result, |out| Ok(normalize(out)))
}

/// Like `to_signal`, for normalizers that can reject output from a tool that
/// started but did not complete its check.
pub fn to_checked_signal<T>(
    result: Result<ToolOutput, ToolUnavailable>,
    normalize: impl FnOnce(ToolOutput) -> Result<T, String>,
) -> Signal<T> {
    match result.map_err(|e| e.to_string()).and_then(normalize) {
        Ok(record) => Signal::Available(record),
        Err(reason) => Signal::unavailable(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(success: bool, stdout: &str, stderr: &str) -> ToolOutput {
        ToolOutput {
            success,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    #[test]
    fn test_count_token_is_case_insensitive_and_non_overlapping() {
        assert_eq!(count_token("Warning: a\nWARNING: b\nwarning: c", "warning:"), 3);
        assert_eq!(count_token("aaaa", "aa"), 2);
        assert_eq!(count_token("anything", ""), 0);
    }

    #[test]
    fn test_checkpatch_two_warnings_no_errors() {
        let text = "WARNING: line over 80 characters\n#12: FILE: a.c:12:\n\
                    WARNING: Missing SPDX\ntotal: 0 errors, 2 warnings\n";
        let lint = normalize_checkpatch(out(false, text, "")).unwrap();
        assert_eq!(lint.warning_count, 2);
        // the summary line carries "errors," and "warnings" without colons
        assert_eq!(lint.error_count, 0);
    }

    #[test]
    fn test_checkpatch_reads_stdout_only() {
        let text = "total: 0 errors, 0 warnings, 4 lines checked\n";
        let lint = normalize_checkpatch(out(true, text, "ERROR: on stderr")).unwrap();
        assert_eq!(lint.error_count, 0);
        assert_eq!(lint.raw_text, text);
    }

    #[test]
    fn test_checkpatch_without_summary_did_not_run() {
        let stderr = "Can't open perl script \"checkpatch.pl\": No such file or directory\n";
        let reason = normalize_checkpatch(out(false, "", stderr)).unwrap_err();
        assert_eq!(
            reason,
            "no checkpatch summary: Can't open perl script \"checkpatch.pl\": No such file or directory"
        );
        assert!(normalize_checkpatch(out(true, "", "")).is_err());
    }

    #[test]
    fn test_sparse_reads_both_streams() {
        let lint = normalize_sparse(out(
            true,
            "a.c:3:1: warning: symbol not declared\n",
            "a.c:9:2: error: bad constant\n",
        ));
        assert_eq!(lint.warning_count, 1);
        assert_eq!(lint.error_count, 1);
        assert!(lint.raw_text.starts_with("a.c:9:2"));
    }

    #[test]
    fn test_compile_counts_stderr_tokens() {
        let stderr = "a.c:4:5: error: unused variable 'x' [-Werror=unused-variable]\n\
                      cc1: all warnings being treated as errors\n";
        let c = normalize_compile(out(false, "", stderr));
        assert!(!c.success);
        // "error:", "-Werror", "errors"
        assert_eq!(c.error_count, 3);
        assert_eq!(c.warning_count, 1);
    }

    #[test]
    fn test_static_analysis_keywords() {
        let s = normalize_static_analysis(out(
            true,
            "Checking a.c ...",
            "a.c:10:3: error: Memory leak: buf [memleak]\n",
        ))
        .unwrap();
        assert_eq!(s.error_count, 1);
        assert_eq!(s.vulnerability_hits, vec!["leak".to_string()]);
    }

    #[test]
    fn test_static_analysis_clean() {
        let s = normalize_static_analysis(out(true, "Checking a.c ...", "")).unwrap();
        assert_eq!(s.error_count, 0);
        assert!(s.vulnerability_hits.is_empty());
    }

    #[test]
    fn test_static_analysis_failed_launch_is_rejected() {
        let stdout = "cppcheck: error: could not find or open any of the paths given.\n";
        let sig = to_checked_signal(Ok(out(false, stdout, "")), normalize_static_analysis);
        assert_eq!(
            sig,
            Signal::unavailable(
                "cppcheck failed: cppcheck: error: could not find or open any of the paths given."
            )
        );
    }

    #[test]
    fn test_unavailable_tool_becomes_marked_signal() {
        let sig = to_signal(
            Err(ToolUnavailable::NotFound {
                program: "sparse".into(),
            }),
            normalize_sparse,
        );
        assert_eq!(sig, Signal::unavailable("`sparse` not found"));
    }
}
