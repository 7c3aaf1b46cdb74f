//! Classification of git command outcomes.
//!
//! git reports most conditions only through its error text, so outcomes are
//! matched against a prioritized rule table. The first matching rule wins.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

use super::executor::ExecOutput;
use super::operation::GitOperation;

/// Classified failure of a git operation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("no push destination is configured")]
    NoPushDestination,

    #[error("current branch has no tracking information")]
    NoTrackingBranch,

    #[error("nothing changed")]
    NothingChanged,

    #[error("already up to date")]
    AlreadyUpToDate,

    #[error("repository query produced no usable output")]
    QueryFailed,

    #[error("could not find a drive letter in working directory '{0}'")]
    PathParseFailure(String),

    #[error("git failed: {0}")]
    Unclassified(String),
}

impl ErrorKind {
    /// Aborts the operation as a configuration problem
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::PathParseFailure(_))
    }

    /// A no-op outcome the user only needs to be told about
    pub fn is_benign(&self) -> bool {
        matches!(self, ErrorKind::NothingChanged | ErrorKind::AlreadyUpToDate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoPushDestination => "no_push_destination",
            ErrorKind::NoTrackingBranch => "no_tracking_branch",
            ErrorKind::NothingChanged => "nothing_changed",
            ErrorKind::AlreadyUpToDate => "already_up_to_date",
            ErrorKind::QueryFailed => "query_failed",
            ErrorKind::PathParseFailure(_) => "path_parse_failure",
            ErrorKind::Unclassified(_) => "unclassified",
        }
    }
}

/// Success payload (trimmed stdout) or a classified failure
pub type CommandResult = Result<String, ErrorKind>;

/// What a rule looks for in the failure message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Fixed text anywhere in the message
    Contains(&'static str),
    /// Any of several fixed texts
    AnyOf(&'static [&'static str]),
    /// `Command failed: <command>` for the exact command that ran
    CommandFailed,
}

impl Matcher {
    fn matches(&self, message: &str, command: &str) -> bool {
        match self {
            Matcher::Contains(text) => message.contains(text),
            Matcher::AnyOf(texts) => texts.iter().any(|text| message.contains(text)),
            Matcher::CommandFailed => message.contains(&format!("Command failed: {}", command)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub kind: ErrorKind,
}

/// Rules in priority order
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            matcher: Matcher::Contains("No configured push destination"),
            kind: ErrorKind::NoPushDestination,
        },
        Rule {
            matcher: Matcher::Contains("There is no tracking information for the current branch"),
            kind: ErrorKind::NoTrackingBranch,
        },
        Rule {
            matcher: Matcher::CommandFailed,
            kind: ErrorKind::NothingChanged,
        },
    ]
}

/// Rules that only recognise no-ops by git's own wording, so that anything
/// unrecognised can be reported instead of swallowed
pub fn strict_rules() -> Vec<Rule> {
    vec![
        Rule {
            matcher: Matcher::Contains("No configured push destination"),
            kind: ErrorKind::NoPushDestination,
        },
        Rule {
            matcher: Matcher::Contains("There is no tracking information for the current branch"),
            kind: ErrorKind::NoTrackingBranch,
        },
        Rule {
            matcher: Matcher::AnyOf(&[
                "nothing to commit",
                "nothing added to commit",
                "no changes added to commit",
            ]),
            kind: ErrorKind::NothingChanged,
        },
        Rule {
            matcher: Matcher::AnyOf(&[
                "Already up to date",
                "Already up-to-date",
                "Everything up-to-date",
            ]),
            kind: ErrorKind::AlreadyUpToDate,
        },
    ]
}

/// Maps raw process output to a `CommandResult`
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    strict: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Classifier {
    /// `strict` uses `strict_rules` and reports unmatched failures as
    /// `Unclassified` instead of folding them into `AlreadyUpToDate`.
    pub fn new(strict: bool) -> Self {
        let rules = if strict {
            strict_rules()
        } else {
            default_rules()
        };
        Self { rules, strict }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify the output of `command`, which was run for `op`
    pub fn classify(&self, op: GitOperation, command: &str, output: &ExecOutput) -> CommandResult {
        if op.is_refined_query() {
            return Self::classify_query(output);
        }

        let Some(message) = output.failure.as_deref() else {
            return Ok(trim_payload(&output.stdout));
        };

        // git explains some failures (e.g. "nothing to commit") on stdout
        let haystack = match output.stdout.trim() {
            "" => Cow::Borrowed(message),
            stdout => Cow::Owned(format!("{}\n{}", message, stdout)),
        };

        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.matcher.matches(&haystack, command))
        {
            return Err(rule.kind.clone());
        }

        if self.strict {
            Err(ErrorKind::Unclassified(first_line(message)))
        } else {
            Err(ErrorKind::AlreadyUpToDate)
        }
    }

    /// Branch and change-count queries only count output they can use
    fn classify_query(output: &ExecOutput) -> CommandResult {
        let stdout = output.stdout.trim();
        if stdout.is_empty() || !output.stderr.trim().is_empty() {
            return Err(ErrorKind::QueryFailed);
        }
        Ok(stdout.to_string())
    }
}

/// Strip surrounding blank lines but keep leading spaces, which carry the
/// index column in `git status -s` output.
fn trim_payload(stdout: &str) -> String {
    stdout
        .trim_end()
        .trim_start_matches(['\r', '\n'])
        .to_string()
}

/// The line of a failure message worth showing a user: skip the
/// `Command failed:` echo when git added its own explanation.
fn first_line(message: &str) -> String {
    let mut lines = message.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.next().unwrap_or_default();
    if first.starts_with("Command failed:") {
        lines.next().unwrap_or(first).to_string()
    } else {
        first.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMIT_AND_PUSH: &str =
        r#"cd "/repo" && git add . && git commit -m "sync" && git push"#;

    fn failed(command: &str, stderr: &str) -> ExecOutput {
        ExecOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            failure: Some(format!("Command failed: {}\n{}", command, stderr)),
        }
    }

    #[test]
    fn test_success_returns_trimmed_stdout() {
        let output = ExecOutput::success("Already up to date.\n");
        let result = Classifier::default().classify(GitOperation::Pull, "cmd", &output);
        assert_eq!(result, Ok("Already up to date.".to_string()));
    }

    #[test]
    fn test_nothing_to_commit_is_nothing_changed() {
        let output = failed(
            COMMIT_AND_PUSH,
            "nothing to commit, working tree clean",
        );
        let result =
            Classifier::default().classify(GitOperation::CommitAndPush, COMMIT_AND_PUSH, &output);
        assert_eq!(result, Err(ErrorKind::NothingChanged));
    }

    #[test]
    fn test_push_destination_wins_over_command_failed() {
        let output = failed(
            COMMIT_AND_PUSH,
            "fatal: No configured push destination.",
        );
        let result =
            Classifier::default().classify(GitOperation::CommitAndPush, COMMIT_AND_PUSH, &output);
        assert_eq!(result, Err(ErrorKind::NoPushDestination));
    }

    #[test]
    fn test_push_destination_without_exit_code_text() {
        let output = ExecOutput {
            stdout: String::new(),
            stderr: String::new(),
            failure: Some("fatal: No configured push destination.".to_string()),
        };
        let result = Classifier::default().classify(GitOperation::Push, "git push", &output);
        assert_eq!(result, Err(ErrorKind::NoPushDestination));
    }

    #[test]
    fn test_no_tracking_branch() {
        let command = r#"cd "/repo" && git pull"#;
        let output = failed(
            command,
            "There is no tracking information for the current branch.\nPlease specify which branch you want to merge with.",
        );
        let result = Classifier::default().classify(GitOperation::Pull, command, &output);
        assert_eq!(result, Err(ErrorKind::NoTrackingBranch));
    }

    #[test]
    fn test_command_failed_for_other_command_is_not_nothing_changed() {
        let output = failed(r#"cd "/other" && git pull"#, "error: boom");
        let result =
            Classifier::default().classify(GitOperation::Pull, r#"cd "/repo" && git pull"#, &output);
        assert_eq!(result, Err(ErrorKind::AlreadyUpToDate));
    }

    #[test]
    fn test_strict_mode_surfaces_unclassified() {
        let output = ExecOutput {
            stdout: String::new(),
            stderr: "CONFLICT (content): Merge conflict in note.md".to_string(),
            failure: Some(
                "Command failed: something else\nCONFLICT (content): Merge conflict in note.md"
                    .to_string(),
            ),
        };
        let result = Classifier::new(true).classify(GitOperation::Pull, "git pull", &output);
        assert_eq!(
            result,
            Err(ErrorKind::Unclassified(
                "CONFLICT (content): Merge conflict in note.md".to_string()
            ))
        );
    }

    #[test]
    fn test_strict_mode_recognises_git_wording() {
        let classifier = Classifier::new(true);

        let clean = failed(COMMIT_AND_PUSH, "nothing to commit, working tree clean");
        assert_eq!(
            classifier.classify(GitOperation::CommitAndPush, COMMIT_AND_PUSH, &clean),
            Err(ErrorKind::NothingChanged)
        );

        let rejected = failed(
            COMMIT_AND_PUSH,
            "! [rejected]        main -> main (fetch first)",
        );
        assert_eq!(
            classifier.classify(GitOperation::CommitAndPush, COMMIT_AND_PUSH, &rejected),
            Err(ErrorKind::Unclassified(
                "! [rejected]        main -> main (fetch first)".to_string()
            ))
        );
    }

    #[test]
    fn test_strict_mode_reads_stdout_explanation() {
        let output = ExecOutput {
            stdout: "On branch main\nnothing to commit, working tree clean\n".to_string(),
            stderr: String::new(),
            failure: Some(format!("Command failed: {}\n", COMMIT_AND_PUSH)),
        };
        assert_eq!(
            Classifier::new(true).classify(GitOperation::CommitAndPush, COMMIT_AND_PUSH, &output),
            Err(ErrorKind::NothingChanged)
        );
    }

    #[test]
    fn test_default_mode_folds_any_failure_of_the_command() {
        let rejected = failed(COMMIT_AND_PUSH, "error: failed to push some refs");
        assert_eq!(
            Classifier::default().classify(GitOperation::CommitAndPush, COMMIT_AND_PUSH, &rejected),
            Err(ErrorKind::NothingChanged)
        );
    }

    #[test]
    fn test_query_success_requires_stdout_and_no_stderr() {
        let classifier = Classifier::default();

        let ok = ExecOutput::success("3\n");
        assert_eq!(
            classifier.classify(GitOperation::ChangeCount, "cmd", &ok),
            Ok("3".to_string())
        );

        let empty = ExecOutput::success("");
        assert_eq!(
            classifier.classify(GitOperation::Branch, "cmd", &empty),
            Err(ErrorKind::QueryFailed)
        );

        let noisy = ExecOutput {
            stdout: "* main".to_string(),
            stderr: "warning: something".to_string(),
            failure: None,
        };
        assert_eq!(
            classifier.classify(GitOperation::Branch, "cmd", &noisy),
            Err(ErrorKind::QueryFailed)
        );
    }

    #[test]
    fn test_query_empty_stdout_fails_even_with_failure_signal() {
        let output = failed("cmd", "");
        assert_eq!(
            Classifier::default().classify(GitOperation::ChangeCount, "cmd", &output),
            Err(ErrorKind::QueryFailed)
        );
    }

    #[test]
    fn test_rule_priority_order() {
        let rules = default_rules();
        assert_eq!(rules[0].kind, ErrorKind::NoPushDestination);
        assert_eq!(rules[1].kind, ErrorKind::NoTrackingBranch);
        assert_eq!(rules[2].kind, ErrorKind::NothingChanged);
    }

    #[test]
    fn test_error_kind_flags() {
        assert!(ErrorKind::PathParseFailure("x".into()).is_fatal());
        assert!(!ErrorKind::QueryFailed.is_fatal());
        assert!(ErrorKind::NothingChanged.is_benign());
        assert!(ErrorKind::AlreadyUpToDate.is_benign());
        assert!(!ErrorKind::NoTrackingBranch.is_benign());
    }
}
