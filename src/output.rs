//! Output rendering for evaluate and metrics commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! every report in rank order and a top-level summary.

use crate::models::{Evaluation, Signal, StyleMetrics, Summary};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn paint_score(score: u32, raw_score: u32, min_score: u32, color: bool) -> String {
    let text = format!("{:>3}/100", score);
    if !color {
        return text;
    }
    if raw_score < min_score {
        text.red().bold().to_string()
    } else if score >= 80 {
        text.green().bold().to_string()
    } else {
        text.yellow().bold().to_string()
    }
}

fn signal_line<T>(
    name: &str,
    signal: &Signal<T>,
    detail: impl Fn(&T) -> String,
    color: bool,
) -> String {
    match signal {
        Signal::Available(v) => format!("    {:<16} {}", name, detail(v)),
        Signal::Unavailable { reason } => {
            let msg = format!("unavailable ({})", reason);
            if color {
                format!("    {:<16} {}", name, msg.bright_black())
            } else {
                format!("    {:<16} {}", name, msg)
            }
        }
    }
}

/// Human-readable block for one evaluation.
pub fn render_evaluation(eval: &Evaluation, min_score: u32, color: bool) -> String {
    let r = &eval.report;
    let mut lines = Vec::new();
    let file = if color {
        eval.file.clone().bold().to_string()
    } else {
        eval.file.clone()
    };
    lines.push(format!(
        "{} {} (raw {}/{})",
        paint_score(r.overall_score, r.raw_score, min_score, color),
        file,
        r.raw_score,
        r.max_score
    ));
    for (arch, sig) in &r.compilation {
        let marker = if *arch == r.primary_arch { "*" } else { "" };
        lines.push(signal_line(
            &format!("compile:{}{}", arch, marker),
            sig,
            |c| {
                format!(
                    "{} warnings={} errors={}",
                    if c.success { "ok" } else { "failed" },
                    c.warning_count,
                    c.error_count
                )
            },
            color,
        ));
    }
    lines.push(signal_line(
        "cppcheck",
        &r.static_analysis,
        |s| {
            if s.vulnerability_hits.is_empty() {
                format!("errors={}", s.error_count)
            } else {
                format!(
                    "errors={} keywords=[{}]",
                    s.error_count,
                    s.vulnerability_hits.join(", ")
                )
            }
        },
        color,
    ));
    let lint = |l: &crate::models::LintResult| {
        format!("warnings={} errors={}", l.warning_count, l.error_count)
    };
    lines.push(signal_line("checkpatch", &r.checkpatch, lint, color));
    lines.push(signal_line("sparse", &r.sparse, lint, color));
    lines.push(signal_line(
        "functional",
        &r.functional,
        |f| {
            let missing: Vec<&str> = f
                .entry_points_found
                .iter()
                .filter(|(_, found)| !**found)
                .map(|(name, _)| name.as_str())
                .collect();
            if missing.is_empty() {
                format!("loadable={}", f.module_loadable)
            } else {
                format!("loadable={} missing=[{}]", f.module_loadable, missing.join(", "))
            }
        },
        color,
    ));
    lines.push(format!("    {:<16} {}", "style", describe_metrics(&r.style)));
    for rule in r.rules.iter().filter(|rule| !rule.earned) {
        let line = format!("    ✖ {} (-{})", rule.description, rule.points);
        if color {
            lines.push(line.red().to_string());
        } else {
            lines.push(line);
        }
    }
    lines.join("\n")
}

fn describe_metrics(m: &StyleMetrics) -> String {
    format!(
        "long_lines={} comments={} documented={} avg_fn_len={:.1} max_nesting={}",
        m.long_line_count,
        m.has_comments,
        m.doc_comment_count,
        m.avg_function_length,
        m.max_nesting_depth
    )
}

/// Print evaluation results in the requested format.
pub fn print_evaluations(evals: &[Evaluation], summary: &Summary, output: &str) {
    match output {
        "json" => println!("{:#}", compose_evaluations_json(evals, summary)),
        _ => {
            let color = use_colors(output);
            for e in evals {
                println!("{}\n", render_evaluation(e, summary.min_score, color));
            }
            let mut line = format!(
                "— Summary — files={} passed={} failed={} min_score={}",
                summary.files, summary.passed, summary.failed, summary.min_score
            );
            if summary.unreadable > 0 {
                line.push_str(&format!(" unreadable={}", summary.unreadable));
            }
            if color {
                println!("{}", line.bold());
            } else {
                println!("{}", line);
            }
        }
    }
}

/// Print metrics for each file.
pub fn print_metrics(items: &[(String, StyleMetrics)], output: &str) {
    match output {
        "json" => println!("{:#}", compose_metrics_json(items)),
        _ => {
            let color = use_colors(output);
            for (file, m) in items {
                if color {
                    println!("{} {}", file.bold(), describe_metrics(m));
                } else {
                    println!("{} {}", file, describe_metrics(m));
                }
            }
        }
    }
}

/// Compose evaluation JSON object (pure) for testing/snapshot purposes.
pub fn compose_evaluations_json(evals: &[Evaluation], summary: &Summary) -> JsonVal {
    json!({"results": evals, "summary": summary})
}

/// Compose metrics JSON object (pure).
pub fn compose_metrics_json(items: &[(String, StyleMetrics)]) -> JsonVal {
    let results: Vec<_> = items
        .iter()
        .map(|(file, m)| json!({"file": file, "metrics": m}))
        .collect();
    json!({"results": results})
}
