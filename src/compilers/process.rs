//! The external process boundary every compiler goes through.

use anyhow::{Context, Result};
use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;

use crate::util::wait_with_timeout;

/// Where a child's standard output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutTarget {
    /// Shown to the operator.
    Inherit,
    /// Written verbatim to a file.
    File(PathBuf),
    /// Returned in [`RunOutcome::stdout`].
    Capture,
}

/// One external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub stdin: Option<PathBuf>,
    pub stdout: StdoutTarget,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            stdin: None,
            stdout: StdoutTarget::Inherit,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = StdoutTarget::File(path.into());
        self
    }

    pub fn capture(mut self) -> Self {
        self.stdout = StdoutTarget::Capture;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(stdin) = &self.stdin {
            write!(f, " < {}", display_name(stdin))?;
        }
        if let StdoutTarget::File(path) = &self.stdout {
            write!(f, " > {}", display_name(path))?;
        }
        Ok(())
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout; empty unless [`StdoutTarget::Capture`] was requested.
    pub stdout: Vec<u8>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands. `Err` means the command could not be run at all
/// (missing program, timeout); a nonzero exit is an `Ok` outcome.
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<RunOutcome>;
}

/// Spawns real processes. Standard error is always inherited.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<RunOutcome> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stderr(Stdio::inherit());

        match &invocation.stdin {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open input {}", path.display()))?;
                cmd.stdin(file);
            }
            None => {
                cmd.stdin(Stdio::null());
            }
        }

        if invocation.stdout == StdoutTarget::Capture {
            // Probes only; they are expected to return promptly.
            let output = cmd
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .output()
                .with_context(|| format!("Failed to run {}", invocation.program))?;
            return Ok(RunOutcome {
                code: output.status.code(),
                stdout: output.stdout,
            });
        }

        if let StdoutTarget::File(path) = &invocation.stdout {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?;
            cmd.stdout(file);
        } else {
            cmd.stdout(Stdio::inherit());
        }

        debug!("spawning {}", invocation);
        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", invocation.program))?;
        let status = wait_with_timeout(child, self.timeout)?;

        Ok(RunOutcome {
            code: status.code(),
            stdout: Vec::new(),
        })
    }
}
