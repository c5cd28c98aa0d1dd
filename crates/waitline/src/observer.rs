//! Observers receive pass/fail/info events from the poller for reporting.
//!
//! The poller works without one ([`NoopObserver`]). [`TracingObserver`]
//! forwards events to `tracing`; [`RecordingObserver`] keeps them for
//! report generation and assertions.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Outcome class of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Wait or action succeeded
    Pass,
    /// Wait or action failed or timed out
    Fail,
    /// Progress note
    Info,
}

impl EventStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

/// One structured event emitted by the poller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollEvent {
    /// Identifies the poll call or composed operation
    pub poll_id: Uuid,
    /// Pass / fail / info
    pub status: EventStatus,
    /// Operation name (e.g. `poll_until`, `click_with_retry`)
    pub operation: String,
    /// Target or subject description
    pub target: String,
    /// Human-readable message
    pub message: String,
    /// Milliseconds since the operation started
    pub elapsed_ms: u64,
}

/// Sink for poller events
pub trait Observer: Send + Sync + std::fmt::Debug {
    /// Receive one event
    fn on_event(&self, event: &PollEvent);
}

/// Observer that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&self, _event: &PollEvent) {}
}

/// Observer that forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: &PollEvent) {
        match event.status {
            EventStatus::Pass => tracing::info!(
                poll_id = %event.poll_id,
                operation = %event.operation,
                target = %event.target,
                elapsed_ms = event.elapsed_ms,
                "{}",
                event.message
            ),
            EventStatus::Fail => tracing::error!(
                poll_id = %event.poll_id,
                operation = %event.operation,
                target = %event.target,
                elapsed_ms = event.elapsed_ms,
                "{}",
                event.message
            ),
            EventStatus::Info => tracing::debug!(
                poll_id = %event.poll_id,
                operation = %event.operation,
                target = %event.target,
                elapsed_ms = event.elapsed_ms,
                "{}",
                event.message
            ),
        }
    }
}

/// Observer that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PollEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<PollEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of events with the given status
    #[must_use]
    pub fn count(&self, status: EventStatus) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.status == status)
            .count()
    }

    /// Drop recorded events
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Render events as JSON lines
    ///
    /// # Errors
    ///
    /// Returns error if an event fails to serialize
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for event in self.events() {
            out.push_str(&serde_json::to_string(&event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl Observer for RecordingObserver {
    fn on_event(&self, event: &PollEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event(status: EventStatus) -> PollEvent {
        PollEvent {
            poll_id: Uuid::new_v4(),
            status,
            operation: "poll_until".into(),
            target: "css=#submit".into(),
            message: "clickable".into(),
            elapsed_ms: 1500,
        }
    }

    #[test]
    fn test_status_predicates() {
        assert!(EventStatus::Pass.is_pass());
        assert!(EventStatus::Fail.is_fail());
        assert!(!EventStatus::Info.is_pass());
    }

    #[test]
    fn test_recording_observer_counts() {
        let rec = RecordingObserver::new();
        rec.on_event(&event(EventStatus::Pass));
        rec.on_event(&event(EventStatus::Fail));
        rec.on_event(&event(EventStatus::Pass));
        assert_eq!(rec.events().len(), 3);
        assert_eq!(rec.count(EventStatus::Pass), 2);
        rec.clear();
        assert!(rec.events().is_empty());
    }

    #[test]
    fn test_json_lines() {
        let rec = RecordingObserver::new();
        rec.on_event(&event(EventStatus::Info));
        let out = rec.to_json_lines().unwrap();
        assert_eq!(out.lines().count(), 1);
        let parsed: PollEvent = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed.status, EventStatus::Info);
        assert!(out.contains("\"status\":\"info\""));
    }

    #[test]
    fn test_noop_and_tracing_accept_events() {
        NoopObserver.on_event(&event(EventStatus::Fail));
        TracingObserver.on_event(&event(EventStatus::Pass));
    }
}
