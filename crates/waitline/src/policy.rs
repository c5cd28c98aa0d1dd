//! Poll policy: how long to wait, how often to look, which errors to shrug off.

use crate::result::{ErrorKind, WaitError, WaitResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default timeout for wait operations (15 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Default polling interval (500ms)
pub const DEFAULT_INTERVAL_MS: u64 = 500;

/// Timing and error tolerance for one poll call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Total time budget
    pub timeout: Duration,
    /// Spacing between ticks, measured from the start of the call
    pub interval: Duration,
    /// Error kinds treated as "not yet satisfied"
    pub ignored: BTreeSet<ErrorKind>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            ignored: BTreeSet::from([ErrorKind::StaleElement]),
        }
    }
}

impl PollPolicy {
    /// Policy with the given timing that ignores stale references
    #[must_use]
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            ..Self::default()
        }
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Also treat `kind` as transient
    #[must_use]
    pub fn ignoring(mut self, kind: ErrorKind) -> Self {
        let _ = self.ignored.insert(kind);
        self
    }

    /// Stop treating `kind` as transient
    #[must_use]
    pub fn not_ignoring(mut self, kind: ErrorKind) -> Self {
        let _ = self.ignored.remove(&kind);
        self
    }

    /// Treat every error as fatal
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.ignored.clear();
        self
    }

    /// Whether errors of `kind` are swallowed inside the poll loop
    #[must_use]
    pub fn is_ignored(&self, kind: ErrorKind) -> bool {
        self.ignored.contains(&kind)
    }

    /// Reject policies the poll loop cannot run
    pub fn validate(&self) -> WaitResult<()> {
        if self.interval.is_zero() {
            return Err(WaitError::InvalidPolicy {
                message: "interval must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
