//! External command execution.
//!
//! The inspection layer only needs "run a program, capture its output and exit
//! code". [`CommandRunner`] is that seam; [`TokioRunner`] implements it on top of
//! `tokio::process`.

use crate::error::{InspectError, Result};
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            working_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program name used in error messages.
    pub fn tool_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Whether the first argument equals `flag`, e.g. `--contents`.
    pub fn is_operation(&self, flag: &str) -> bool {
        self.args.first().map(|a| a == flag).unwrap_or(false)
    }
}

/// Captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Standard output decoded as UTF-8, replacing invalid sequences.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Turns a non-zero exit into [`InspectError::ToolFailed`].
    pub fn check(self, tool: &str) -> Result<Self> {
        if self.exit_code == Some(0) {
            Ok(self)
        } else {
            Err(InspectError::ToolFailed {
                tool: tool.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

/// Runs external programs to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `invocation` and captures its output.
    ///
    /// A non-zero exit is not an error at this level; callers use
    /// [`ProcessOutput::check`]. Timeouts and spawn failures are errors.
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
///
/// The child is killed if its timeout elapses.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

#[async_trait]
impl CommandRunner for TokioRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let tool = invocation.tool_name();

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        tracing::debug!("running {:?} {:?}", invocation.program, invocation.args);

        let child = command
            .spawn()
            .map_err(|source| InspectError::ToolSpawn {
                tool: tool.clone(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it
        let output = match invocation.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| InspectError::ToolTimeout {
                    tool: tool.clone(),
                    timeout,
                })?,
            None => child.wait_with_output().await,
        }?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
