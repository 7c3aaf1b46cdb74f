//! Status reporting for git operations.
//!
//! Every operation ends in exactly one `SyncEvent`, which is dispatched to
//! all enabled reporters (console, tracing log, or a test collector).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::git::{parse_changes, parse_current_branch, CommandResult, ErrorKind, GitOperation};

/// Emit a tracing event at the level matching a `Severity`
macro_rules! event_at {
    ($severity:expr, $($arg:tt)+) => {
        match $severity {
            $crate::reporting::Severity::Info => ::tracing::info!($($arg)+),
            $crate::reporting::Severity::Warning => ::tracing::warn!($($arg)+),
            $crate::reporting::Severity::Fatal => ::tracing::error!($($arg)+),
        }
    };
}
pub(crate) use event_at;

mod console;
mod log_reporter;
mod reporter;
mod service;

pub use console::ConsoleReporter;
pub use log_reporter::LogReporter;
pub use reporter::{CollectingReporter, StatusReporter};
pub use service::ReporterSet;

/// Terminal outcome of one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Success { payload: String },
    Failure { error: ErrorKind },
}

/// How urgently an event needs the user's attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Fatal,
}

impl Severity {
    /// No-ops are informational, unusable paths are fatal, the rest need action
    pub fn of_error(kind: &ErrorKind) -> Self {
        if kind.is_benign() {
            Severity::Info
        } else if kind.is_fatal() {
            Severity::Fatal
        } else {
            Severity::Warning
        }
    }
}

/// Event delivered to reporters when an operation finishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub operation: GitOperation,
    pub working_dir: String,
    pub outcome: SyncOutcome,
    /// Short human-readable status line
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl SyncEvent {
    pub fn new(operation: GitOperation, working_dir: &str, result: &CommandResult) -> Self {
        let outcome = match result {
            Ok(payload) => SyncOutcome::Success {
                payload: payload.clone(),
            },
            Err(error) => SyncOutcome::Failure {
                error: error.clone(),
            },
        };
        Self {
            operation,
            working_dir: working_dir.to_string(),
            message: status_message(operation, result),
            outcome,
            timestamp: Utc::now(),
        }
    }

    /// `success` or the error kind name, used for per-reporter filtering
    pub fn event_type(&self) -> &'static str {
        match &self.outcome {
            SyncOutcome::Success { .. } => "success",
            SyncOutcome::Failure { error } => error.as_str(),
        }
    }

    pub fn severity(&self) -> Severity {
        match &self.outcome {
            SyncOutcome::Success { .. } => Severity::Info,
            SyncOutcome::Failure { error } => Severity::of_error(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Success { .. })
    }
}

/// Status line shown to the user for an operation's result
pub fn status_message(operation: GitOperation, result: &CommandResult) -> String {
    match result {
        Ok(payload) => success_message(operation, payload),
        Err(error) => failure_message(error),
    }
}

fn success_message(operation: GitOperation, payload: &str) -> String {
    match operation {
        GitOperation::Pull => match payload.lines().next().filter(|l| !l.trim().is_empty()) {
            Some(line) => format!("Pulled: {}", line.trim()),
            None => "Pulled".to_string(),
        },
        GitOperation::Commit => "Committed changes".to_string(),
        GitOperation::Push => "Pushed to remote".to_string(),
        GitOperation::CommitAndPush => "Committed and pushed changes".to_string(),
        GitOperation::Branch => match parse_current_branch(payload) {
            Some(branch) => format!("On branch {}", branch),
            None => "No branch checked out".to_string(),
        },
        GitOperation::ChangeCount => match payload.trim().parse::<u32>() {
            Ok(1) => "1 change".to_string(),
            Ok(n) => format!("{} changes", n),
            Err(_) => format!("Changes: {}", payload.trim()),
        },
        GitOperation::ChangesDetail => match parse_changes(payload).len() {
            0 => "No changes".to_string(),
            1 => "1 changed file".to_string(),
            n => format!("{} changed files", n),
        },
    }
}

fn failure_message(error: &ErrorKind) -> String {
    match error {
        ErrorKind::NoPushDestination => {
            "No push destination configured. Run `git remote add` first.".to_string()
        }
        ErrorKind::NoTrackingBranch => {
            "Current branch has no upstream tracking branch. Run `git push -u` or `git branch --set-upstream-to` first."
                .to_string()
        }
        ErrorKind::NothingChanged => "Nothing to commit.".to_string(),
        ErrorKind::AlreadyUpToDate => "Already up to date.".to_string(),
        ErrorKind::QueryFailed => "Could not read repository status.".to_string(),
        ErrorKind::PathParseFailure(dir) => {
            format!("Could not determine the drive letter of '{}'.", dir)
        }
        ErrorKind::Unclassified(detail) => format!("git failed: {}", detail),
    }
}
