//! drvgrade CLI binary entry point.
//! Delegates to the library for evaluation, metrics, and generation and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use drvgrade::cli::{Cli, Commands};
use drvgrade::config::{self, Effective};
use drvgrade::evaluate::{display_path, evaluate_file, evaluate_patterns, expand_patterns};
use drvgrade::generate::{strip_markdown_fence, CodeGenerator, GeminiClient};
use drvgrade::models::{Evaluation, Summary};
use drvgrade::process::SystemRunner;
use drvgrade::{extract_metrics, output, SourceText};
use owo_colors::OwoColorize;
use std::fs;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn error_prefix() -> String {
    if std::env::var_os("NO_COLOR").is_some() {
        "error:".to_string()
    } else {
        "error:".red().bold().to_string()
    }
}

fn note_prefix() -> String {
    if std::env::var_os("NO_COLOR").is_some() {
        "note:".to_string()
    } else {
        "note:".cyan().bold().to_string()
    }
}

fn main() {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", error_prefix(), e);
            std::process::exit(2);
        }
    }
}

fn resolve(
    repo_root: Option<&str>,
    output: Option<&str>,
    min_score: Option<u32>,
    timeout: Option<u64>,
    archs: &[String],
) -> Result<Effective> {
    let eff = config::resolve_effective(repo_root, output, min_score, timeout, archs)
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;
    Ok(eff)
}

/// Print results and turn the gate into an exit code.
fn report(evals: &[Evaluation], unreadable: usize, eff: &Effective) -> i32 {
    let mut summary = Summary::from_evaluations(evals, eff.min_score);
    summary.unreadable = unreadable;
    output::print_evaluations(evals, &summary, &eff.output);
    if unreadable > 0 {
        2
    } else if summary.failed > 0 {
        1
    } else {
        0
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Evaluate {
            patterns,
            repo_root,
            output: output_mode,
            min_score,
            timeout,
            archs,
        } => {
            let eff = resolve(
                repo_root.as_deref(),
                output_mode.as_deref(),
                min_score,
                timeout,
                &archs,
            )?;
            let patterns = if patterns.is_empty() {
                eff.files.clone()
            } else {
                patterns
            };
            if patterns.is_empty() {
                bail!("no files given. Pass file patterns or set `files` in drvgrade.toml.");
            }
            let runner = SystemRunner::new(Duration::from_secs(eff.timeout_secs));
            let batch = evaluate_patterns(&eff.repo_root, &patterns, &eff.checkers, &runner)?;
            for failure in &batch.failures {
                eprintln!("{} {}", error_prefix(), failure);
            }
            if batch.evaluations.is_empty() && batch.failures.is_empty() {
                eprintln!(
                    "{} no files matched [{}]",
                    note_prefix(),
                    patterns.join(", ")
                );
            }
            Ok(report(&batch.evaluations, batch.failures.len(), &eff))
        }
        Commands::Metrics {
            patterns,
            repo_root,
            output: output_mode,
        } => {
            let eff = resolve(repo_root.as_deref(), output_mode.as_deref(), None, None, &[])?;
            let mut items = Vec::new();
            for path in expand_patterns(&eff.repo_root, &patterns)? {
                let source = SourceText::read(&path)?;
                items.push((display_path(&eff.repo_root, &path), extract_metrics(&source)));
            }
            output::print_metrics(&items, &eff.output);
            Ok(0)
        }
        Commands::Generate {
            prompt,
            out,
            repo_root,
            output: output_mode,
            evaluate,
        } => {
            let eff = resolve(repo_root.as_deref(), output_mode.as_deref(), None, None, &[])?;
            let prompt_text = fs::read_to_string(&prompt)
                .with_context(|| format!("failed to read prompt {}", prompt))?;
            let client = GeminiClient::from_env(eff.generate.clone())?;
            let code = strip_markdown_fence(&client.generate(&prompt_text)?);

            let out = out.unwrap_or_else(|| eff.generate_out.clone());
            let out_path = eff.repo_root.join(&out);
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&out_path, &code)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
            eprintln!("{} wrote {}", note_prefix(), out_path.display());

            if !evaluate {
                return Ok(0);
            }
            let runner = SystemRunner::new(Duration::from_secs(eff.timeout_secs));
            let report_data = evaluate_file(&out_path, &eff.checkers, &runner)?;
            let evals = vec![Evaluation {
                file: display_path(&eff.repo_root, &out_path),
                report: report_data,
            }];
            Ok(report(&evals, 0, &eff))
        }
    }
}
