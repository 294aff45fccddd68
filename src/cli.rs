//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "drvgrade",
    version,
    about = "Score generated kernel-driver C sources",
    long_about = "drvgrade: compile, lint, and measure generated kernel-driver C sources, then reduce every signal to one score.\n\nConfiguration precedence: CLI > drvgrade.toml > defaults.",
    after_help = "Examples:\n  drvgrade evaluate generated/driver.c\n  drvgrade evaluate 'generated/*.c' --output json --min-score 70\n  drvgrade metrics generated/driver.c\n  drvgrade generate --prompt prompts/char_driver.txt --evaluate",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current drvgrade version.")]
    Version,
    /// Evaluate sources with every configured checker
    #[command(
        about = "Evaluate and score sources",
        long_about = "Run compilers and linters on each matched file, extract structural metrics, and print the aggregated score. Files are ranked best first.",
        after_help = "Examples:\n  drvgrade evaluate driver.c --arch x86_64 --arch arm64\n  drvgrade evaluate 'gen/*.c' --min-score 110"
    )]
    Evaluate {
        #[arg(help = "Files or glob patterns (default: [files] from drvgrade.toml)")]
        patterns: Vec<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Exit non-zero if any file's raw score (0-130) is below this")]
        min_score: Option<u32>,
        #[arg(long, help = "Per-tool timeout in seconds (default: 60)")]
        timeout: Option<u64>,
        #[arg(long = "arch", help = "Target architecture to compile for (repeatable)")]
        archs: Vec<String>,
    },
    /// Print structural metrics only
    #[command(
        about = "Show structural metrics",
        long_about = "Extract line, comment, function-length, and nesting metrics without running external tools."
    )]
    Metrics {
        #[arg(required = true, help = "Files or glob patterns")]
        patterns: Vec<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Generate a driver from a prompt
    #[command(
        about = "Generate source from a prompt",
        long_about = "Send a prompt to the configured generation backend, strip markdown fences, and write the source. The API key is read from the environment.",
        after_help = "Examples:\n  GEMINI_API_KEY=... drvgrade generate --prompt prompts/char_driver.txt --out gen/driver.c"
    )]
    Generate {
        #[arg(long, help = "Prompt file")]
        prompt: String,
        #[arg(long, help = "Output path (default: [generate].out or generated/driver.c)")]
        out: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode for --evaluate: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Evaluate the generated file")]
        evaluate: bool,
    },
}
