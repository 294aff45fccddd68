//! External checker collaborators: compilers, cppcheck, checkpatch, sparse.
//!
//! Each checker builds an `Invocation`, hands it to a `ToolRunner`, and
//! normalizes the result. Checkers are independent and run concurrently;
//! the generated file is only ever read.

use crate::models::{CompileResult, LintResult, Signal, Signals, StaticAnalysisResult};
use crate::process::{Invocation, ToolRunner};
use crate::signals::{
    normalize_checkpatch, normalize_compile, normalize_sparse, normalize_static_analysis,
    to_checked_signal, to_signal,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, warn};

/// Default compiler flags; warnings are fatal like in a kernel build.
pub const DEFAULT_CFLAGS: &[&str] = &["-Wall", "-Wextra", "-Werror"];

/// How to invoke checkpatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpatchTool {
    pub perl: String,
    pub script: String,
}

/// Resolved checker configuration. `None` disables a checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerSettings {
    pub architectures: Vec<String>,
    pub primary_arch: String,
    /// Architecture -> compiler binary.
    pub compilers: BTreeMap<String, String>,
    pub cflags: Vec<String>,
    pub cppcheck: Option<String>,
    pub checkpatch: Option<CheckpatchTool>,
    pub sparse: Option<String>,
    pub probe: bool,
    pub required_entry_points: Vec<String>,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        CheckerSettings {
            architectures: vec!["x86_64".to_string()],
            primary_arch: "x86_64".to_string(),
            compilers: default_compilers(),
            cflags: DEFAULT_CFLAGS.iter().map(|s| s.to_string()).collect(),
            cppcheck: Some("cppcheck".to_string()),
            checkpatch: Some(CheckpatchTool {
                perl: "perl".to_string(),
                script: "checkpatch.pl".to_string(),
            }),
            sparse: Some("sparse".to_string()),
            probe: true,
            required_entry_points: crate::probe::DEFAULT_ENTRY_POINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Cross compilers for the architectures we know about.
pub fn default_compilers() -> BTreeMap<String, String> {
    [
        ("x86_64", "gcc"),
        ("arm64", "aarch64-linux-gnu-gcc"),
        ("arm", "arm-linux-gnueabi-gcc"),
        ("riscv64", "riscv64-linux-gnu-gcc"),
    ]
    .into_iter()
    .map(|(a, c)| (a.to_string(), c.to_string()))
    .collect()
}

/// Private scratch directory for one compile; removed on drop.
fn object_dir() -> std::io::Result<TempDir> {
    tempfile::Builder::new().prefix("drvgrade-").tempdir()
}

/// Compile `source` once for `arch`. The object file is discarded.
pub fn compile<R: ToolRunner + ?Sized>(
    runner: &R,
    compiler: &str,
    cflags: &[String],
    arch: &str,
    source: &str,
) -> Signal<CompileResult> {
    let scratch = match object_dir() {
        Ok(dir) => dir,
        Err(e) => return Signal::unavailable(format!("cannot create object directory: {}", e)),
    };
    let object = scratch.path().join(format!("{}.o", arch));
    let mut args: Vec<String> = cflags.to_vec();
    args.extend([
        "-c".to_string(),
        source.to_string(),
        "-o".to_string(),
        object.to_string_lossy().into_owned(),
    ]);
    to_signal(runner.run(&Invocation::new(compiler, args)), normalize_compile)
}

fn compile_arch<R: ToolRunner + ?Sized>(
    runner: &R,
    settings: &CheckerSettings,
    arch: &str,
    source: &str,
) -> Signal<CompileResult> {
    match settings.compilers.get(arch) {
        Some(compiler) => compile(runner, compiler, &settings.cflags, arch, source),
        None => Signal::unavailable(format!("no compiler configured for {}", arch)),
    }
}

pub fn run_cppcheck<R: ToolRunner + ?Sized>(
    runner: &R,
    program: &str,
    source: &str,
) -> Signal<StaticAnalysisResult> {
    to_checked_signal(
        runner.run(&Invocation::new(program, [source])),
        normalize_static_analysis,
    )
}

pub fn run_checkpatch<R: ToolRunner + ?Sized>(
    runner: &R,
    tool: &CheckpatchTool,
    source: &str,
) -> Signal<LintResult> {
    let args = [tool.script.as_str(), "--no-tree", "--file", source];
    to_checked_signal(
        runner.run(&Invocation::new(tool.perl.as_str(), args)),
        normalize_checkpatch,
    )
}

pub fn run_sparse<R: ToolRunner + ?Sized>(
    runner: &R,
    program: &str,
    source: &str,
) -> Signal<LintResult> {
    to_signal(runner.run(&Invocation::new(program, [source])), normalize_sparse)
}

fn log_unavailable<T>(category: &str, signal: &Signal<T>) {
    if let Signal::Unavailable { reason } = signal {
        warn!(category, reason = %reason, "checker unavailable");
    }
}

/// Run every enabled checker against `source` concurrently.
///
/// The functional-shape probe is not run here; it needs the source text and
/// the compile outcome and is filled in by the evaluation pipeline.
pub fn run_all<R: ToolRunner + ?Sized>(
    runner: &R,
    settings: &CheckerSettings,
    source: &Path,
) -> Signals {
    let src = source.to_string_lossy().into_owned();
    let src = src.as_str();
    debug!(source = src, archs = ?settings.architectures, "running checkers");

    let mut compilation = BTreeMap::new();
    let mut static_analysis = Signal::default();
    let mut checkpatch = Signal::default();
    let mut sparse = Signal::default();

    rayon::scope(|s| {
        let compilation = &mut compilation;
        s.spawn(move |_| {
            *compilation = settings
                .architectures
                .par_iter()
                .map(|arch| (arch.clone(), compile_arch(runner, settings, arch, src)))
                .collect();
        });
        if let Some(program) = settings.cppcheck.as_deref() {
            let slot = &mut static_analysis;
            s.spawn(move |_| *slot = run_cppcheck(runner, program, src));
        }
        if let Some(tool) = settings.checkpatch.as_ref() {
            let slot = &mut checkpatch;
            s.spawn(move |_| *slot = run_checkpatch(runner, tool, src));
        }
        if let Some(program) = settings.sparse.as_deref() {
            let slot = &mut sparse;
            s.spawn(move |_| *slot = run_sparse(runner, program, src));
        }
    });

    for (arch, signal) in &compilation {
        log_unavailable(&format!("compile:{}", arch), signal);
    }
    if settings.cppcheck.is_some() {
        log_unavailable("static_analysis", &static_analysis);
    }
    if settings.checkpatch.is_some() {
        log_unavailable("checkpatch", &checkpatch);
    }
    if settings.sparse.is_some() {
        log_unavailable("sparse", &sparse);
    }

    Signals {
        primary_arch: settings.primary_arch.clone(),
        compilation,
        static_analysis,
        checkpatch,
        sparse,
        functional: Signal::default(),
    }
}
