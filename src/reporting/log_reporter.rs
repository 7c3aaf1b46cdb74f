//! Reporter that writes events to the tracing log.
//!
//! Successes and no-ops go out at info, actionable failures at warn and
//! fatal ones at error.

use anyhow::Result;
use async_trait::async_trait;

use super::reporter::StatusReporter;
use super::{event_at, SyncEvent};

pub struct LogReporter {
    enabled: bool,
}

impl LogReporter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl StatusReporter for LogReporter {
    fn name(&self) -> &str {
        "log"
    }

    fn handles_event(&self, _event: &SyncEvent) -> bool {
        true
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn report(&self, event: &SyncEvent) -> Result<()> {
        let severity = event.severity();
        event_at!(
            severity,
            operation = %event.operation,
            outcome = %event.event_type(),
            dir = %event.working_dir,
            "{}",
            event.message
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{ErrorKind, GitOperation};
    use crate::logging::capture::CapturedLogs;

    async fn logged(result: crate::git::CommandResult) -> String {
        let logs = CapturedLogs::default();
        let _guard = logs.install();
        LogReporter::new(true)
            .report(&SyncEvent::new(GitOperation::Push, "/repo", &result))
            .await
            .unwrap();
        logs.contents()
    }

    #[tokio::test]
    async fn test_level_follows_severity() {
        let actionable = logged(Err(ErrorKind::NoPushDestination)).await;
        assert!(actionable.contains("WARN"), "{}", actionable);
        assert!(actionable.contains("no_push_destination"));

        let fatal = logged(Err(ErrorKind::PathParseFailure("vault".into()))).await;
        assert!(fatal.contains("ERROR"), "{}", fatal);

        let ok = logged(Ok(String::new())).await;
        assert!(ok.contains("INFO"), "{}", ok);
        assert!(!ok.contains("WARN"));
    }
}
