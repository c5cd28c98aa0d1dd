//! Wait configuration
//!
//! Defaults, overridden by a YAML file, overridden by `WAITLINE_*`
//! environment variables.

use crate::poller::DEFAULT_CLICK_ATTEMPTS;
use crate::policy::{PollPolicy, DEFAULT_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{ErrorKind, WaitError, WaitResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Overrides `timeout_ms`
pub const ENV_TIMEOUT_MS: &str = "WAITLINE_TIMEOUT_MS";
/// Overrides `interval_ms`
pub const ENV_INTERVAL_MS: &str = "WAITLINE_INTERVAL_MS";
/// Overrides `click_attempts`
pub const ENV_CLICK_ATTEMPTS: &str = "WAITLINE_CLICK_ATTEMPTS";

/// Poller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Default wait timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub interval_ms: u64,
    /// Error kinds treated as transient
    pub ignored: Vec<ErrorKind>,
    /// Attempts for click retries
    pub click_attempts: u32,
    /// Timeout for existence checks in milliseconds
    pub exists_timeout_ms: u64,
    /// Default `tracing` filter directive
    pub log_filter: String,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            interval_ms: DEFAULT_INTERVAL_MS,
            ignored: vec![ErrorKind::StaleElement],
            click_attempts: DEFAULT_CLICK_ATTEMPTS,
            exists_timeout_ms: DEFAULT_TIMEOUT_MS,
            log_filter: "waitline=info".to_string(),
        }
    }
}

impl WaitConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> WaitResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn load(path: impl AsRef<Path>) -> WaitResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded wait config");
        Self::from_yaml_str(&text)
    }

    /// Apply `WAITLINE_*` overrides from the process environment
    pub fn apply_env(self) -> WaitResult<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps variable names to values
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> WaitResult<Self> {
        if let Some(v) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = parse_env(ENV_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_INTERVAL_MS) {
            self.interval_ms = parse_env(ENV_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_CLICK_ATTEMPTS) {
            self.click_attempts = parse_env(ENV_CLICK_ATTEMPTS, &v)?;
        }
        Ok(self)
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set interval
    #[must_use]
    pub const fn with_interval_ms(mut self, ms: u64) -> Self {
        self.interval_ms = ms;
        self
    }

    /// Set click attempts
    #[must_use]
    pub const fn with_click_attempts(mut self, attempts: u32) -> Self {
        self.click_attempts = attempts;
        self
    }

    /// Reject values the poller cannot run with
    pub fn validate(&self) -> WaitResult<()> {
        if self.interval_ms == 0 {
            return Err(WaitError::config("interval_ms must be greater than zero"));
        }
        if self.click_attempts == 0 {
            return Err(WaitError::config("click_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Default poll policy
    #[must_use]
    pub fn to_policy(&self) -> PollPolicy {
        PollPolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            interval: Duration::from_millis(self.interval_ms),
            ignored: self.ignored.iter().copied().collect(),
        }
    }

    /// Existence check timeout
    #[must_use]
    pub const fn exists_timeout(&self) -> Duration {
        Duration::from_millis(self.exists_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> WaitResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| WaitError::config(format!("{key}={value:?} is not a valid number")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = WaitConfig::new();
            assert_eq!(config.timeout_ms, 15_000);
            assert_eq!(config.interval_ms, 500);
            assert_eq!(config.click_attempts, 3);
            assert_eq!(config.exists_timeout(), Duration::from_secs(15));
            assert!(config.validate().is_ok());
            assert_eq!(config.to_policy(), PollPolicy::default());
        }

        #[test]
        fn test_builders() {
            let config = WaitConfig::new()
                .with_timeout_ms(3_000)
                .with_interval_ms(250)
                .with_click_attempts(5);
            let policy = config.to_policy();
            assert_eq!(policy.timeout, Duration::from_secs(3));
            assert_eq!(policy.interval, Duration::from_millis(250));
            assert_eq!(config.click_attempts, 5);
        }

        #[test]
        fn test_validate_rejects_zero_values() {
            let err = WaitConfig::new().with_interval_ms(0).validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config);
            let err = WaitConfig::new()
                .with_click_attempts(0)
                .validate()
                .unwrap_err();
            assert!(err.to_string().contains("click_attempts"));
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = WaitConfig::from_yaml_str(
                "timeout_ms: 5000\nignored: [stale_element, no_such_element]\n",
            )
            .unwrap();
            assert_eq!(config.timeout_ms, 5000);
            assert_eq!(config.interval_ms, 500);
            let policy = config.to_policy();
            assert!(policy.is_ignored(ErrorKind::NoSuchElement));
            assert!(policy.is_ignored(ErrorKind::StaleElement));
        }

        #[test]
        fn test_empty_ignored_list_is_strict() {
            let config = WaitConfig::from_yaml_str("ignored: []").unwrap();
            assert!(config.to_policy().ignored.is_empty());
        }

        #[test]
        fn test_bad_yaml_is_error() {
            let err = WaitConfig::from_yaml_str("timeout_ms: soon").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config);
        }

        #[test]
        fn test_load_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "interval_ms: 200").unwrap();
            writeln!(file, "click_attempts: 4").unwrap();
            writeln!(file, "log_filter: waitline=debug").unwrap();

            let config = WaitConfig::load(file.path()).unwrap();
            assert_eq!(config.interval_ms, 200);
            assert_eq!(config.click_attempts, 4);
            assert_eq!(config.log_filter, "waitline=debug");
        }

        #[test]
        fn test_load_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let err = WaitConfig::load(dir.path().join("absent.yaml")).unwrap_err();
            assert!(matches!(err, WaitError::Io(_)));
            assert_eq!(err.kind(), ErrorKind::Config);
        }
    }

    mod env_tests {
        use super::*;

        fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            move |key| map.get(key).cloned()
        }

        #[test]
        fn test_env_overrides_file_values() {
            let config = WaitConfig::from_yaml_str("timeout_ms: 5000")
                .unwrap()
                .apply_env_from(env(&[
                    (ENV_TIMEOUT_MS, "8000"),
                    (ENV_CLICK_ATTEMPTS, " 2 "),
                ]))
                .unwrap();
            assert_eq!(config.timeout_ms, 8000);
            assert_eq!(config.click_attempts, 2);
            assert_eq!(config.interval_ms, 500);
        }

        #[test]
        fn test_invalid_env_value() {
            let err = WaitConfig::new()
                .apply_env_from(env(&[(ENV_INTERVAL_MS, "fast")]))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config);
            assert!(err.to_string().contains(ENV_INTERVAL_MS));
        }

        #[test]
        fn test_no_env_is_identity() {
            let config = WaitConfig::new().apply_env_from(env(&[])).unwrap();
            assert_eq!(config, WaitConfig::new());
        }
    }
}
