//! Process execution abstraction for composed git command lines.
//!
//! Provides a trait-based seam over the shell so that:
//! - classification can be tested without a repository or a `git` binary
//! - command lines can be recorded and asserted on
//! - the real implementation stays a thin wrapper over `tokio::process`

use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::process::Command;
use tracing::debug;

use super::operation::Platform;

/// Captured result of running one command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// Failure message when the process exited non-zero or could not start.
    /// Shaped as `Command failed: <command>\n<stderr>` for non-zero exits.
    pub failure: Option<String>,
}

impl ExecOutput {
    /// Clean exit with the given stdout
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            failure: None,
        }
    }

    /// Non-zero exit of `command` with git's own explanation on stderr
    pub fn failed(command: &str, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        Self {
            stdout: String::new(),
            failure: Some(failure_message(command, &stderr)),
            stderr,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Failure text for a command that exited non-zero
pub fn failure_message(command: &str, stderr: &str) -> String {
    format!("Command failed: {}\n{}", command, stderr)
}

/// Runs a composed command line through the platform shell
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` and capture its output. Never returns an error: spawn
    /// failures are reported through `ExecOutput::failure`.
    async fn execute(&self, platform: Platform, command: &str) -> ExecOutput;
}

/// Hand the composed line to the shell untouched.
///
/// cmd.exe does its own quote parsing, so on Windows the line must not be
/// re-quoted with `\"` escapes the way `arg` would.
#[cfg(windows)]
fn push_command_line(cmd: &mut Command, command: &str) {
    cmd.raw_arg(command);
}

#[cfg(not(windows))]
fn push_command_line(cmd: &mut Command, command: &str) {
    cmd.arg(command);
}

/// Real implementation spawning `sh -c` or `cmd /C`
#[derive(Debug, Default, Clone)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, platform: Platform, command: &str) -> ExecOutput {
        let (shell, flag) = platform.shell();
        debug!(%shell, %command, "Running shell command");

        let mut cmd = Command::new(shell);
        cmd.arg(flag);
        push_command_line(&mut cmd, command);

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let failure = if output.status.success() {
                    None
                } else {
                    debug!(status = ?output.status.code(), "Shell command exited non-zero");
                    Some(failure_message(command, &stderr))
                };
                ExecOutput {
                    stdout,
                    stderr,
                    failure,
                }
            }
            Err(e) => {
                debug!(error = %e, "Failed to spawn shell");
                ExecOutput {
                    stdout: String::new(),
                    stderr: String::new(),
                    failure: Some(format!("Failed to spawn {}: {}", shell, e)),
                }
            }
        }
    }
}

/// Mock implementation for testing
///
/// Replays queued outputs in order and records every command line it is
/// asked to run. With nothing queued it answers with an empty success.
#[derive(Default, Clone)]
pub struct MockExecutor {
    responses: Arc<Mutex<VecDeque<ExecOutput>>>,
    /// Record of command lines executed
    pub command_log: Arc<Mutex<Vec<String>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output for the next call
    pub fn push_response(&self, output: ExecOutput) {
        self.responses.lock().unwrap().push_back(output);
    }

    /// Create a mock with a queue of outputs
    pub fn with_responses(outputs: impl IntoIterator<Item = ExecOutput>) -> Self {
        let mock = Self::new();
        for output in outputs {
            mock.push_response(output);
        }
        mock
    }

    /// Get the command log
    pub fn get_commands(&self) -> Vec<String> {
        self.command_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(&self, _platform: Platform, command: &str) -> ExecOutput {
        self.command_log.lock().unwrap().push(command.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default()
    }
}
