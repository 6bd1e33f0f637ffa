//! Synchronous execution of external commands.
//!
//! All process spawning goes through the [`CommandRunner`] trait so the
//! pipeline can be driven by a scripted runner in tests. [`execute`] adds the
//! shared policy on top: precondition checks, the `>>> Running:` echo, and the
//! fatal / non-fatal split.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::error::{Result, RolloutError};

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

/// One external invocation: program, arguments, optional working directory,
/// and whether a failure must stop the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    pub fatal: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            fatal: true,
        }
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Mark the command as allowed to fail: errors are logged and swallowed.
    pub fn non_fatal(mut self) -> Self {
        self.fatal = false;
        self
    }

    /// The full argument vector joined by spaces, as echoed before running.
    pub fn display_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Check the preconditions shared by every runner.
    pub fn validate(&self) -> Result<()> {
        if self.program.as_os_str().is_empty() {
            return Err(RolloutError::EmptyCommand);
        }
        if let Some(dir) = &self.cwd {
            if !dir.is_dir() {
                return Err(RolloutError::MissingWorkingDir(dir.clone()));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_line())
    }
}

// ---------------------------------------------------------------------------
// CommandOutput
// ---------------------------------------------------------------------------

/// Captured result of a command run with piped output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

// ---------------------------------------------------------------------------
// CommandRunner
// ---------------------------------------------------------------------------

/// Where progress lines and streamed tool output are written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    #[default]
    Stdout,
    /// Keeps stdout free for a machine-readable document.
    Stderr,
}

pub trait CommandRunner {
    /// Show an operator-facing progress line.
    fn progress(&mut self, line: &str) {
        println!("{line}");
    }

    /// Run with stdout/stderr inherited so the operator sees tool output live.
    /// Returns the exit code, `None` if killed by a signal.
    fn stream(&mut self, spec: &CommandSpec) -> Result<Option<i32>>;

    /// Run with stdout/stderr captured.
    fn capture(&mut self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands on the host with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner {
    console: Console,
}

impl SystemRunner {
    pub fn new(console: Console) -> Self {
        Self { console }
    }

    fn stdout(&self) -> Stdio {
        match self.console {
            Console::Stdout => Stdio::inherit(),
            Console::Stderr => Stdio::from(std::io::stderr()),
        }
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn progress(&mut self, line: &str) {
        match self.console {
            Console::Stdout => println!("{line}"),
            Console::Stderr => eprintln!("{line}"),
        }
    }

    fn stream(&mut self, spec: &CommandSpec) -> Result<Option<i32>> {
        let status = Self::command(spec)
            .stdin(Stdio::inherit())
            .stdout(self.stdout())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| RolloutError::Spawn {
                command: spec.display_line(),
                source,
            })?;
        Ok(status.code())
    }

    fn capture(&mut self, spec: &CommandSpec) -> Result<CommandOutput> {
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RolloutError::Spawn {
                command: spec.display_line(),
                source,
            })?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

/// Echo and run `spec`, streaming its output.
///
/// A fatal spec turns a non-zero exit into [`RolloutError::CommandFailed`].
/// A non-fatal spec logs any failure, spawn errors included, and returns
/// `Ok(())`.
pub fn execute<R: CommandRunner + ?Sized>(runner: &mut R, spec: &CommandSpec) -> Result<()> {
    spec.validate()?;
    runner.progress(&format!("\n>>> Running: {}", spec.display_line()));

    let outcome = runner.stream(spec).and_then(|code| match code {
        Some(0) => Ok(()),
        code => Err(RolloutError::CommandFailed {
            command: spec.display_line(),
            code,
        }),
    });

    match outcome {
        Ok(()) => Ok(()),
        Err(e) if !spec.fatal => {
            tracing::warn!(command = %spec, error = %e, "non-fatal command failed, continuing");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
