//! Reporter trait definition.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::SyncEvent;

/// Trait for status reporters.
///
/// Each reporter (console, log, etc.) implements this trait to receive the
/// terminal event of every git operation.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    /// Reporter name (for logging and config identification)
    fn name(&self) -> &str;

    /// Check if this reporter handles the given event.
    ///
    /// Used for per-reporter filtering by outcome.
    fn handles_event(&self, event: &SyncEvent) -> bool;

    /// Check if this reporter is enabled.
    fn is_enabled(&self) -> bool;

    /// Deliver an event.
    ///
    /// Errors are logged by the caller and never change the operation's result.
    async fn report(&self, event: &SyncEvent) -> Result<()>;
}

/// Reporter that keeps every event in memory (for tests and embedding hosts)
#[derive(Default, Clone)]
pub struct CollectingReporter {
    events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusReporter for CollectingReporter {
    fn name(&self) -> &str {
        "collecting"
    }

    fn handles_event(&self, _event: &SyncEvent) -> bool {
        true
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn report(&self, event: &SyncEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
