//! Git operations and the shell command lines they expand to.
//!
//! Command construction is pure: nothing here spawns a process, so every
//! template and platform prefix can be checked without a repository.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::classify::ErrorKind;

lazy_static! {
    static ref DRIVE_LETTER: Regex = Regex::new(r"^([A-Za-z]):").unwrap();
}

/// Commit message used when none is configured
pub const DEFAULT_COMMIT_MESSAGE: &str = "sync";

/// The fixed set of git actions the runner knows how to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitOperation {
    Pull,
    Commit,
    Push,
    CommitAndPush,
    Branch,
    ChangeCount,
    ChangesDetail,
}

impl GitOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitOperation::Pull => "pull",
            GitOperation::Commit => "commit",
            GitOperation::Push => "push",
            GitOperation::CommitAndPush => "commit_and_push",
            GitOperation::Branch => "branch",
            GitOperation::ChangeCount => "change_count",
            GitOperation::ChangesDetail => "changes_detail",
        }
    }

    /// Operations that change repository or remote state
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            GitOperation::Pull
                | GitOperation::Commit
                | GitOperation::Push
                | GitOperation::CommitAndPush
        )
    }

    /// Queries whose success additionally requires non-empty stdout and no stderr
    pub fn is_refined_query(&self) -> bool {
        matches!(self, GitOperation::Branch | GitOperation::ChangeCount)
    }

    pub fn all() -> &'static [GitOperation] {
        &[
            GitOperation::Pull,
            GitOperation::Commit,
            GitOperation::Push,
            GitOperation::CommitAndPush,
            GitOperation::Branch,
            GitOperation::ChangeCount,
            GitOperation::ChangesDetail,
        ]
    }
}

impl fmt::Display for GitOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shell conventions the command line is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    /// Platform of the running process
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Filter that turns `git status -s` output into a line count
    pub fn line_count_filter(&self) -> &'static str {
        match self {
            Platform::Windows => r#"find /c /v """#,
            // `egrep` warns on stderr in GNU grep 3.8+, which would fail the query
            Platform::Unix => r#"grep -E "" | wc -l"#,
        }
    }

    /// Shell program and flag used to run a composed command line
    pub fn shell(&self) -> (&'static str, &'static str) {
        match self {
            Platform::Windows => ("cmd", "/C"),
            Platform::Unix => ("sh", "-c"),
        }
    }
}

/// Everything that must precede `cd` for the shell to land in `working_dir`.
///
/// On Windows `cd` alone does not switch drives, so a path such as
/// `D:\notes` needs `d: && ` in front. A Windows path without a drive letter
/// cannot be reconciled and is rejected before anything runs.
pub fn command_prefix(platform: Platform, working_dir: &str) -> Result<String, ErrorKind> {
    match platform {
        Platform::Unix => Ok(String::new()),
        Platform::Windows => DRIVE_LETTER
            .captures(working_dir)
            .and_then(|caps| caps.get(1))
            .map(|letter| format!("{}: && ", letter.as_str().to_ascii_lowercase()))
            .ok_or_else(|| ErrorKind::PathParseFailure(working_dir.to_string())),
    }
}

/// True when `path` starts with a Windows drive letter such as `D:`
pub fn has_drive_letter(path: &str) -> bool {
    DRIVE_LETTER.is_match(path)
}

/// Double-quote a value so the platform shell passes it through literally.
///
/// `sh` still expands `$`, backticks and backslashes inside double quotes, so
/// those are escaped along with `"`. cmd.exe has no escape character inside
/// quotes; a doubled `""` keeps its quote state intact and reaches git as one
/// literal quote.
fn quote(platform: Platform, value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match (platform, c) {
            (Platform::Unix, '"' | '\\' | '$' | '`') => {
                quoted.push('\\');
                quoted.push(c);
            }
            (Platform::Windows, '"') => quoted.push_str("\"\""),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Composes command lines for one working directory on one platform
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    platform: Platform,
    working_dir: String,
    commit_message: String,
}

impl CommandBuilder {
    pub fn new(platform: Platform, working_dir: impl Into<String>) -> Self {
        Self {
            platform,
            working_dir: working_dir.into(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn working_dir(&self) -> &str {
        &self.working_dir
    }

    /// The full command line for `op`, starting with the directory change
    pub fn build(&self, op: GitOperation) -> Result<String, ErrorKind> {
        let prefix = command_prefix(self.platform, &self.working_dir)?;
        let commit = format!("git add . && git commit -m {}", quote(self.platform, &self.commit_message));

        let git = match op {
            GitOperation::Pull => "git pull".to_string(),
            GitOperation::Commit => commit,
            GitOperation::Push => "git push".to_string(),
            GitOperation::CommitAndPush => format!("{} && git push", commit),
            GitOperation::Branch => "git branch".to_string(),
            GitOperation::ChangeCount => {
                format!("git status -s | {}", self.platform.line_count_filter())
            }
            GitOperation::ChangesDetail => "git status -s".to_string(),
        };

        Ok(format!("{}cd {} && {}", prefix, quote(self.platform, &self.working_dir), git))
    }
}
