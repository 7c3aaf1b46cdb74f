//! Console reporter used by the CLI.

use anyhow::Result;
use async_trait::async_trait;

use super::reporter::StatusReporter;
use super::{Severity, SyncEvent};
use crate::config::ConsoleReportingConfig;

/// Prints one line per event: informational outcomes to stdout, anything
/// that needs attention to stderr.
pub struct ConsoleReporter {
    enabled: bool,
    subscribed_events: Vec<String>,
}

impl ConsoleReporter {
    pub fn new(config: &ConsoleReportingConfig) -> Self {
        Self {
            enabled: config.enabled,
            subscribed_events: config.events.clone(),
        }
    }

    /// Text printed for an event
    pub fn render(event: &SyncEvent) -> String {
        match event.severity() {
            Severity::Info => event.message.clone(),
            Severity::Warning => format!("warning: {}", event.message),
            Severity::Fatal => format!("error: {}", event.message),
        }
    }
}

#[async_trait]
impl StatusReporter for ConsoleReporter {
    fn name(&self) -> &str {
        "console"
    }

    fn handles_event(&self, event: &SyncEvent) -> bool {
        // Empty subscription list means handle all events
        self.subscribed_events.is_empty()
            || self
                .subscribed_events
                .iter()
                .any(|e| e == event.event_type())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn report(&self, event: &SyncEvent) -> Result<()> {
        let line = Self::render(event);
        if event.severity() == Severity::Info {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{ErrorKind, GitOperation};

    fn reporter(events: &[&str]) -> ConsoleReporter {
        ConsoleReporter::new(&ConsoleReportingConfig {
            enabled: true,
            events: events.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_empty_filter_handles_everything() {
        let event = SyncEvent::new(GitOperation::Commit, "/repo", &Err(ErrorKind::NothingChanged));
        assert!(reporter(&[]).handles_event(&event));
    }

    #[test]
    fn test_filter_by_outcome() {
        let console = reporter(&["no_push_destination"]);
        let benign = SyncEvent::new(GitOperation::Commit, "/repo", &Err(ErrorKind::NothingChanged));
        let actionable = SyncEvent::new(
            GitOperation::Push,
            "/repo",
            &Err(ErrorKind::NoPushDestination),
        );

        assert!(!console.handles_event(&benign));
        assert!(console.handles_event(&actionable));
    }

    #[test]
    fn test_render_prefixes_by_severity() {
        let ok = SyncEvent::new(GitOperation::Push, "/repo", &Ok(String::new()));
        assert_eq!(ConsoleReporter::render(&ok), "Pushed to remote");

        let warn = SyncEvent::new(GitOperation::Branch, "/repo", &Err(ErrorKind::QueryFailed));
        assert_eq!(
            ConsoleReporter::render(&warn),
            "warning: Could not read repository status."
        );
    }
}
