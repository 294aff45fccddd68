//! Configuration discovery and effective settings resolution.
//!
//! drvgrade reads `drvgrade.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `min_score`: 0
//! - `timeout_secs`: 60
//! - `compile.architectures`: `["x86_64"]`, `compile.primary_arch`: `x86_64`
//! - `compile.cflags`: `-Wall -Wextra -Werror`
//! - `tools`: `cppcheck`, `perl` + `checkpatch.pl`, `sparse`
//! - `functional.required`: `init exit read write`
//! - `generate.model`: `gemini-2.0-flash`, key from `GEMINI_API_KEY`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::checkers::{default_compilers, CheckerSettings, CheckpatchTool};
use crate::generate::GenerateSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Clone)]
/// Compilation section under `[compile]`.
pub struct CompileCfg {
    pub architectures: Option<Vec<String>>,
    pub primary_arch: Option<String>,
    pub cflags: Option<Vec<String>>,
    /// Extra or replacement arch -> compiler entries.
    pub compilers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Tool locations under `[tools]`.
pub struct ToolsCfg {
    pub cppcheck: Option<String>,
    pub perl: Option<String>,
    pub checkpatch: Option<String>,
    pub sparse: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Per-checker switches under `[checkers]`; all default to enabled.
pub struct CheckersCfg {
    pub static_analysis: Option<bool>,
    pub checkpatch: Option<bool>,
    pub sparse: Option<bool>,
    pub functional: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Functional-shape probe settings under `[functional]`.
pub struct FunctionalCfg {
    pub required: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Generation backend under `[generate]`.
pub struct GenerateCfg {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
    /// Where `drvgrade generate` writes the source by default.
    pub out: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `drvgrade.toml|yaml`.
pub struct DrvgradeConfig {
    pub output: Option<String>,
    pub min_score: Option<u32>,
    pub timeout_secs: Option<u64>,
    /// Default file patterns for `evaluate` when none are given.
    pub files: Option<Vec<String>>,
    pub compile: Option<CompileCfg>,
    pub tools: Option<ToolsCfg>,
    pub checkers: Option<CheckersCfg>,
    pub functional: Option<FunctionalCfg>,
    pub generate: Option<GenerateCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub output: String,
    pub min_score: u32,
    pub timeout_secs: u64,
    pub files: Vec<String>,
    pub checkers: CheckerSettings,
    pub generate: GenerateSettings,
    pub generate_out: String,
}

/// Absolute, normalized form of `start`, resolved against `cwd` when relative.
///
/// Walking up from a bare `.` stops immediately, so discovery always starts
/// from an absolute path.
pub fn anchor_start(start: &Path, cwd: &Path) -> PathBuf {
    let joined = if start.is_absolute() {
        start.to_path_buf()
    } else {
        cwd.join(start)
    };
    fs::canonicalize(&joined).unwrap_or(joined)
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `drvgrade.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("drvgrade.toml").exists()
            || cur.join("drvgrade.yaml").exists()
            || cur.join("drvgrade.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `DrvgradeConfig` from `drvgrade.toml` or `drvgrade.yaml|yml` if present.
///
/// A file that exists but does not parse is an error, so typos are not
/// silently replaced by defaults.
pub fn load_config(root: &Path) -> Result<Option<DrvgradeConfig>, String> {
    let toml_path = root.join("drvgrade.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path)
            .map_err(|e| format!("{}: {}", toml_path.display(), e))?;
        let cfg: DrvgradeConfig =
            toml::from_str(&s).map_err(|e| format!("{}: {}", toml_path.display(), e))?;
        return Ok(Some(cfg));
    }
    for yml in ["drvgrade.yaml", "drvgrade.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).map_err(|e| format!("{}: {}", p.display(), e))?;
            let cfg: DrvgradeConfig =
                serde_yaml::from_str(&s).map_err(|e| format!("{}: {}", p.display(), e))?;
            return Ok(Some(cfg));
        }
    }
    Ok(None)
}

/// Pick the architecture whose compile feeds the score. It is always one of
/// `architectures`.
fn select_primary_arch(
    configured: Option<String>,
    architectures: &[String],
    default: &str,
) -> Result<String, String> {
    let first = architectures
        .first()
        .ok_or_else(|| "no target architectures selected".to_string())?;
    match configured {
        Some(arch) if architectures.contains(&arch) => Ok(arch),
        Some(arch) => {
            warn!(
                primary_arch = %arch,
                architectures = ?architectures,
                "primary architecture is not compiled; scoring {} instead",
                first
            );
            Ok(first.clone())
        }
        None if architectures.iter().any(|a| a == default) => Ok(default.to_string()),
        None => Ok(first.clone()),
    }
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_min_score: Option<u32>,
    cli_timeout_secs: Option<u64>,
    cli_archs: &[String],
) -> Result<Effective, String> {
    let cwd = env::current_dir().map_err(|e| format!("current directory: {}", e))?;
    let start = anchor_start(Path::new(cli_repo_root.unwrap_or(".")), &cwd);
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root)?.unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    let min_score = cli_min_score.or(cfg.min_score).unwrap_or(0);
    let timeout_secs = cli_timeout_secs
        .or(cfg.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let files = cfg.files.unwrap_or_default();

    let defaults = CheckerSettings::default();
    let compile = cfg.compile.unwrap_or_default();
    let architectures = if cli_archs.is_empty() {
        compile.architectures.unwrap_or(defaults.architectures)
    } else {
        cli_archs.to_vec()
    };
    let primary_arch =
        select_primary_arch(compile.primary_arch, &architectures, &defaults.primary_arch)?;
    let mut compilers = default_compilers();
    compilers.extend(compile.compilers.unwrap_or_default());
    let cflags = compile.cflags.unwrap_or(defaults.cflags);

    let tools = cfg.tools.unwrap_or_default();
    let switches = cfg.checkers.unwrap_or_default();
    let cppcheck = switches
        .static_analysis
        .unwrap_or(true)
        .then(|| tools.cppcheck.clone().unwrap_or_else(|| "cppcheck".to_string()));
    let checkpatch = switches.checkpatch.unwrap_or(true).then(|| CheckpatchTool {
        perl: tools.perl.clone().unwrap_or_else(|| "perl".to_string()),
        script: tools
            .checkpatch
            .clone()
            .unwrap_or_else(|| "checkpatch.pl".to_string()),
    });
    let sparse = switches
        .sparse
        .unwrap_or(true)
        .then(|| tools.sparse.clone().unwrap_or_else(|| "sparse".to_string()));
    let required_entry_points = cfg
        .functional
        .and_then(|f| f.required)
        .unwrap_or(defaults.required_entry_points);

    let checkers = CheckerSettings {
        architectures,
        primary_arch,
        compilers,
        cflags,
        cppcheck,
        checkpatch,
        sparse,
        probe: switches.functional.unwrap_or(true),
        required_entry_points,
    };

    let gen_cfg = cfg.generate.unwrap_or_default();
    let gen_defaults = GenerateSettings::default();
    let generate = GenerateSettings {
        model: gen_cfg.model.unwrap_or(gen_defaults.model),
        endpoint: gen_cfg.endpoint.unwrap_or(gen_defaults.endpoint),
        api_key_env: gen_cfg.api_key_env.unwrap_or(gen_defaults.api_key_env),
        timeout_secs: gen_defaults.timeout_secs,
    };
    let generate_out = gen_cfg
        .out
        .unwrap_or_else(|| "generated/driver.c".to_string());

    Ok(Effective {
        repo_root,
        output,
        min_score,
        timeout_secs,
        files,
        checkers,
        generate,
        generate_out,
    })
}
