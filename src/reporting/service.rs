//! Dispatches events to every configured reporter.

use std::sync::Arc;

use super::console::ConsoleReporter;
use super::log_reporter::LogReporter;
use super::reporter::StatusReporter;
use super::SyncEvent;
use crate::config::ReportingConfig;

/// Set of reporters receiving operation events.
///
/// Delivery is awaited in registration order so that every event has been
/// handled before the operation returns.
#[derive(Default, Clone)]
pub struct ReporterSet {
    reporters: Vec<Arc<dyn StatusReporter>>,
}

impl ReporterSet {
    /// Create an empty set (events are dropped)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the reporters enabled in config
    pub fn from_config(config: &ReportingConfig) -> Self {
        let mut set = Self::new();
        set.add(Arc::new(LogReporter::new(config.log)));
        set.add(Arc::new(ConsoleReporter::new(&config.console)));
        set
    }

    pub fn add(&mut self, reporter: Arc<dyn StatusReporter>) {
        self.reporters.push(reporter);
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }

    /// Deliver `event` to every enabled reporter that handles it.
    ///
    /// Reporter failures are logged, never propagated.
    pub async fn report(&self, event: &SyncEvent) {
        for reporter in &self.reporters {
            if !(reporter.is_enabled() && reporter.handles_event(event)) {
                continue;
            }
            if let Err(e) = reporter.report(event).await {
                tracing::warn!(
                    reporter = %reporter.name(),
                    event = %event.event_type(),
                    error = %e,
                    "Status report delivery failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleReportingConfig;
    use crate::git::{ErrorKind, GitOperation};
    use crate::reporting::CollectingReporter;

    #[test]
    fn test_from_config_registers_log_and_console() {
        let set = ReporterSet::from_config(&ReportingConfig::default());
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_report_reaches_each_reporter_once() {
        let collector = CollectingReporter::new();
        let mut set = ReporterSet::new();
        set.add(Arc::new(collector.clone()));
        set.add(Arc::new(ConsoleReporter::new(&ConsoleReportingConfig {
            enabled: false,
            events: Vec::new(),
        })));

        let event = SyncEvent::new(GitOperation::Commit, "/repo", &Err(ErrorKind::NothingChanged));
        set.report(&event).await;

        assert_eq!(collector.events(), vec![event]);
    }
}
