//! External process capability.
//!
//! Checkers never spawn processes directly; they go through a `ToolRunner`
//! so tests can substitute canned outputs.

use crate::error::ToolUnavailable;
use std::io::{ErrorKind, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A single command line to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Capability to run an external tool.
pub trait ToolRunner: Sync {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolUnavailable>;
}

/// Runs real processes, killing any that outlive `timeout`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    pub timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        SystemRunner { timeout }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut p) = pipe {
            let _ = p.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolUnavailable> {
        let program = invocation.program.clone();
        debug!(program = %program, args = ?invocation.args, "spawning tool");
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => ToolUnavailable::NotFound {
                    program: program.clone(),
                },
                _ => ToolUnavailable::Io {
                    program: program.clone(),
                    source,
                },
            })?;

        // Pipes are drained on their own threads so a chatty tool cannot
        // block on a full pipe while we poll for exit.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ToolUnavailable::Io { program, source });
                }
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolUnavailable::TimedOut {
                    program,
                    secs: self.timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let output = ToolOutput {
            success: status.success(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };
        debug!(
            program = %program,
            success = output.success,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool finished"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_not_found() {
        let runner = SystemRunner::new(Duration::from_secs(5));
        let err = runner
            .run(&Invocation::new("drvgrade-no-such-tool", Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, ToolUnavailable::NotFound { .. }));
        assert_eq!(err.to_string(), "`drvgrade-no-such-tool` not found");
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_stderr_and_status() {
        let runner = SystemRunner::new(Duration::from_secs(10));
        let out = runner
            .run(&Invocation::new("sh", ["-c", "echo out; echo err 1>&2; exit 3"]))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_process() {
        let runner = SystemRunner::new(Duration::from_millis(200));
        let started = Instant::now();
        let err = runner
            .run(&Invocation::new("sleep", ["5"]))
            .unwrap_err();
        assert!(matches!(err, ToolUnavailable::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
