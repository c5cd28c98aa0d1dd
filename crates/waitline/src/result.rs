//! Result and error types for Waitline.
//!
//! Every failure carries an [`ErrorKind`] so a [`PollPolicy`](crate::PollPolicy)
//! can decide which kinds are transient inside the poll loop.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for Waitline operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Coarse classification of a [`WaitError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Element reference invalidated by a DOM update
    StaleElement,
    /// Element lookup found nothing
    NoSuchElement,
    /// Another element received the click
    ClickIntercepted,
    /// Element refused the interaction
    NotInteractable,
    /// Underlying session is unusable
    SessionFault,
    /// Condition could not be evaluated
    ConditionEvaluation,
    /// Wait gave up
    Timeout,
    /// Click retries used up
    RetriesExhausted,
    /// Poll policy rejected
    InvalidPolicy,
    /// Bad argument to a helper
    InvalidArgument,
    /// Page object has no target under that name
    UnknownTarget,
    /// Configuration could not be loaded
    Config,
}

impl ErrorKind {
    /// Stable snake_case name used in config files and log fields
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StaleElement => "stale_element",
            Self::NoSuchElement => "no_such_element",
            Self::ClickIntercepted => "click_intercepted",
            Self::NotInteractable => "not_interactable",
            Self::SessionFault => "session_fault",
            Self::ConditionEvaluation => "condition_evaluation",
            Self::Timeout => "timeout",
            Self::RetriesExhausted => "retries_exhausted",
            Self::InvalidPolicy => "invalid_policy",
            Self::InvalidArgument => "invalid_argument",
            Self::UnknownTarget => "unknown_target",
            Self::Config => "config",
        }
    }

    /// Whether a failed click with this kind may be retried
    #[must_use]
    pub const fn is_retryable_action(&self) -> bool {
        matches!(
            self,
            Self::StaleElement | Self::ClickIntercepted | Self::NotInteractable
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in Waitline
#[derive(Debug, Error)]
pub enum WaitError {
    /// Element reference went stale
    #[error("Stale element reference: {target}")]
    StaleElement {
        /// Target description
        target: String,
    },

    /// No element matched
    #[error("No such element: {target}")]
    NoSuchElement {
        /// Target description
        target: String,
    },

    /// Click landed on another element
    #[error("Click on {target} intercepted: {message}")]
    ClickIntercepted {
        /// Target description
        target: String,
        /// Error message
        message: String,
    },

    /// Element not interactable
    #[error("Element not interactable: {target}")]
    NotInteractable {
        /// Target description
        target: String,
    },

    /// Session died or returned garbage
    #[error("Session fault: {message}")]
    SessionFault {
        /// Error message
        message: String,
    },

    /// Condition itself is broken
    #[error("Condition evaluation failed: {message}")]
    ConditionEvaluation {
        /// Error message
        message: String,
    },

    /// Wait timed out
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What was waited for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Retries used up
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last: Box<WaitError>,
    },

    /// Invalid poll policy
    #[error("Invalid poll policy: {message}")]
    InvalidPolicy {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Unknown page object target
    #[error("Page {page} has no target named {name}")]
    UnknownTarget {
        /// Page name
        page: String,
        /// Requested target name
        name: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl WaitError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::StaleElement { .. } => ErrorKind::StaleElement,
            Self::NoSuchElement { .. } => ErrorKind::NoSuchElement,
            Self::ClickIntercepted { .. } => ErrorKind::ClickIntercepted,
            Self::NotInteractable { .. } => ErrorKind::NotInteractable,
            Self::SessionFault { .. } => ErrorKind::SessionFault,
            Self::ConditionEvaluation { .. } => ErrorKind::ConditionEvaluation,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            Self::InvalidPolicy { .. } => ErrorKind::InvalidPolicy,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::UnknownTarget { .. } => ErrorKind::UnknownTarget,
            Self::Config { .. } | Self::Io(_) | Self::Yaml(_) => ErrorKind::Config,
        }
    }

    /// Create a stale element error
    #[must_use]
    pub fn stale(target: impl Into<String>) -> Self {
        Self::StaleElement {
            target: target.into(),
        }
    }

    /// Create a no-such-element error
    #[must_use]
    pub fn no_such_element(target: impl Into<String>) -> Self {
        Self::NoSuchElement {
            target: target.into(),
        }
    }

    /// Create a session fault
    #[must_use]
    pub fn session_fault(message: impl Into<String>) -> Self {
        Self::SessionFault {
            message: message.into(),
        }
    }

    /// Create a condition evaluation error
    #[must_use]
    pub fn condition(message: impl Into<String>) -> Self {
        Self::ConditionEvaluation {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
