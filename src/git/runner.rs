//! Runs git operations against a vault and classifies what happened.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};

use super::classify::{Classifier, CommandResult, ErrorKind};
use super::executor::{CommandExecutor, ShellExecutor};
use super::operation::{CommandBuilder, GitOperation, Platform, DEFAULT_COMMIT_MESSAGE};
use crate::reporting::{event_at, ReporterSet, Severity, SyncEvent};

// One lock per working directory so mutating commands never overlap
lazy_static! {
    static ref MUTATION_LOCKS: Mutex<HashMap<String, Arc<Mutex<()>>>> =
        Mutex::new(HashMap::new());
}

/// Get or create the mutation lock for a working directory
async fn get_dir_lock(working_dir: &str) -> Arc<Mutex<()>> {
    let mut locks = MUTATION_LOCKS.lock().await;
    locks
        .entry(working_dir.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Settings fixed for the lifetime of a runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Absolute path of the repository root
    pub working_dir: String,
    pub platform: Platform,
    pub commit_message: String,
    /// Report unmatched failures as `Unclassified` rather than `AlreadyUpToDate`
    pub strict_classification: bool,
    /// Run mutating operations one at a time per working directory
    pub serialize_mutations: bool,
}

impl RunnerConfig {
    pub fn new(working_dir: impl Into<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            platform: Platform::current(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            strict_classification: false,
            serialize_mutations: true,
        }
    }
}

/// One line of `git status -s`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Two-character status code (X = index, Y = worktree)
    pub code: String,
    pub path: String,
    pub orig_path: Option<String>,
}

impl ChangeEntry {
    /// Parse a short-format status line; returns None for blank or malformed lines
    pub fn parse(line: &str) -> Option<Self> {
        if line.len() < 4 || !line.is_char_boundary(2) || !line.is_char_boundary(3) {
            return None;
        }
        let code = line[..2].to_string();
        let rest = line[3..].trim();
        if rest.is_empty() {
            return None;
        }

        let (path, orig_path) = match rest.split_once(" -> ") {
            Some((from, to)) => (to.to_string(), Some(from.to_string())),
            None => (rest.to_string(), None),
        };

        Some(Self {
            code,
            path,
            orig_path,
        })
    }

    pub fn is_untracked(&self) -> bool {
        self.code == "??"
    }
}

/// Parse every entry out of `git status -s` output
pub fn parse_changes(output: &str) -> Vec<ChangeEntry> {
    output.lines().filter_map(ChangeEntry::parse).collect()
}

/// Name of the checked-out branch from `git branch` output
pub fn parse_current_branch(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("* "))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Branch and pending-change summary for a vault
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStatus {
    pub branch: Option<String>,
    pub changes: Option<u32>,
}

impl VaultStatus {
    /// One-line summary, e.g. `main: 3 changes`
    pub fn summary(&self) -> String {
        let branch = self.branch.as_deref().unwrap_or("unknown branch");
        match self.changes {
            Some(1) => format!("{}: 1 change", branch),
            Some(n) => format!("{}: {} changes", branch, n),
            None => format!("{}: changes unavailable", branch),
        }
    }
}

/// Front end to the git CLI for a single working directory
pub struct GitCommandRunner {
    builder: CommandBuilder,
    classifier: Classifier,
    executor: Arc<dyn CommandExecutor>,
    serialize_mutations: bool,
}

impl GitCommandRunner {
    /// Create a runner that spawns real shell processes
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_executor(config, Arc::new(ShellExecutor::new()))
    }

    /// Create a runner over any executor (used for tests)
    pub fn with_executor(config: RunnerConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let builder = CommandBuilder::new(config.platform, config.working_dir)
            .with_commit_message(config.commit_message);
        Self {
            builder,
            classifier: Classifier::new(config.strict_classification),
            executor,
            serialize_mutations: config.serialize_mutations,
        }
    }

    pub fn working_dir(&self) -> &str {
        self.builder.working_dir()
    }

    pub fn platform(&self) -> Platform {
        self.builder.platform()
    }

    /// The command line `op` would run
    pub fn command_for(&self, op: GitOperation) -> Result<String, ErrorKind> {
        self.builder.build(op)
    }

    /// Run `op` and classify the outcome
    #[instrument(skip(self), fields(dir = %self.working_dir()))]
    pub async fn run(&self, op: GitOperation) -> CommandResult {
        let command = match self.command_for(op) {
            Ok(command) => command,
            Err(kind) => {
                event_at!(Severity::of_error(&kind), error = %kind, "Cannot build git command");
                return Err(kind);
            }
        };

        let _guard = self.acquire_mutation_lock(op).await;

        debug!(%command, "Executing git operation");
        let output = self.executor.execute(self.platform(), &command).await;
        let result = self.classifier.classify(op, &command, &output);

        match &result {
            Ok(_) => info!("Git operation succeeded"),
            Err(kind) if kind.is_benign() => info!(outcome = %kind, "Git operation was a no-op"),
            Err(kind) => event_at!(
                Severity::of_error(kind),
                outcome = %kind,
                stderr = %output.stderr.trim(),
                "Git operation failed"
            ),
        }

        result
    }

    async fn acquire_mutation_lock(&self, op: GitOperation) -> Option<OwnedMutexGuard<()>> {
        if !(self.serialize_mutations && op.is_mutating()) {
            return None;
        }
        let lock = get_dir_lock(self.working_dir()).await;
        debug!("Waiting for mutation lock");
        Some(lock.lock_owned().await)
    }

    /// Run `op` and deliver exactly one event to `reporters`
    pub async fn run_and_report(&self, op: GitOperation, reporters: &ReporterSet) -> CommandResult {
        let result = self.run(op).await;
        reporters
            .report(&SyncEvent::new(op, self.working_dir(), &result))
            .await;
        result
    }

    pub async fn pull(&self) -> CommandResult {
        self.run(GitOperation::Pull).await
    }

    pub async fn commit(&self) -> CommandResult {
        self.run(GitOperation::Commit).await
    }

    pub async fn push(&self) -> CommandResult {
        self.run(GitOperation::Push).await
    }

    /// Commit everything and push in one shell invocation
    pub async fn sync(&self) -> CommandResult {
        self.run(GitOperation::CommitAndPush).await
    }

    /// Name of the checked-out branch
    pub async fn current_branch(&self) -> Result<String, ErrorKind> {
        let output = self.run(GitOperation::Branch).await?;
        parse_current_branch(&output).ok_or(ErrorKind::QueryFailed)
    }

    /// Number of entries `git status -s` reports
    pub async fn change_count(&self) -> Result<u32, ErrorKind> {
        let output = self.run(GitOperation::ChangeCount).await?;
        output.trim().parse().map_err(|_| {
            debug!(%output, "Change count is not a number");
            ErrorKind::QueryFailed
        })
    }

    /// Every pending change in the working tree
    pub async fn changes_detail(&self) -> Result<Vec<ChangeEntry>, ErrorKind> {
        let output = self.run(GitOperation::ChangesDetail).await?;
        Ok(parse_changes(&output))
    }

    /// Branch and change count, queried concurrently
    pub async fn status(&self) -> VaultStatus {
        let (branch, changes) = tokio::join!(self.current_branch(), self.change_count());
        VaultStatus {
            branch: branch.ok(),
            changes: changes.ok(),
        }
    }
}
