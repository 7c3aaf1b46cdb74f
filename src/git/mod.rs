//! Git front end - command construction, execution and classification.
//!
//! - `operation`: the fixed set of operations and the command lines they expand to
//! - `executor`: process seam (real shell or mock)
//! - `classify`: rule table mapping process output to outcomes
//! - `runner`: ties them together for one working directory

mod classify;
mod executor;
mod operation;
mod runner;

pub use classify::{
    default_rules, strict_rules, Classifier, CommandResult, ErrorKind, Matcher, Rule,
};
pub use executor::{failure_message, CommandExecutor, ExecOutput, MockExecutor, ShellExecutor};
pub use operation::{command_prefix, has_drive_letter, CommandBuilder, GitOperation, Platform, DEFAULT_COMMIT_MESSAGE};
pub use runner::{
    parse_changes, parse_current_branch, ChangeEntry, GitCommandRunner, RunnerConfig, VaultStatus,
};
