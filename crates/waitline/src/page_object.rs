//! Page Object Model support.
//!
//! A page object names the targets of one page or component and a ready
//! marker whose visibility means the page is usable.

use crate::locator::{Resolution, Selector, Target};
use crate::poller::{PollOutcome, Poller};
use crate::policy::DEFAULT_TIMEOUT_MS;
use crate::result::{WaitError, WaitResult};
use std::collections::BTreeMap;
use std::time::Duration;

/// A page or component under test.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use waitline::{PageObject, Target};
///
/// struct LoginPage;
///
/// impl PageObject for LoginPage {
///     fn page_name(&self) -> &str {
///         "login"
///     }
///
///     fn ready_marker(&self) -> Target {
///         Target::css("form#login")
///     }
/// }
///
/// assert_eq!(LoginPage.load_timeout(), Duration::from_secs(15));
/// ```
pub trait PageObject {
    /// Page name for logs and errors
    fn page_name(&self) -> &str;

    /// Element whose visibility marks the page as loaded
    fn ready_marker(&self) -> Target;

    /// How long [`wait_until_loaded`] waits
    fn load_timeout(&self) -> Duration {
        Duration::from_millis(DEFAULT_TIMEOUT_MS)
    }
}

/// Wait for the page's ready marker to become visible within its load timeout
pub fn wait_until_loaded<P: PageObject + ?Sized>(
    poller: &Poller<'_>,
    page: &P,
) -> PollOutcome<Resolution> {
    tracing::debug!(page = page.page_name(), "waiting for page to load");
    poller.wait_for_visible_within(&page.ready_marker(), page.load_timeout())
}

/// Page object holding named targets
#[derive(Debug, Clone)]
pub struct SimplePage {
    name: String,
    ready_marker: Target,
    targets: BTreeMap<String, Target>,
    load_timeout: Duration,
}

impl SimplePage {
    /// Create a page whose ready marker is `ready_marker`
    #[must_use]
    pub fn new(name: impl Into<String>, ready_marker: impl Into<Target>) -> Self {
        Self {
            name: name.into(),
            ready_marker: ready_marker.into(),
            targets: BTreeMap::new(),
            load_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Register a named target
    #[must_use]
    pub fn with_target(mut self, name: impl Into<String>, selector: Selector) -> Self {
        let _ = self.targets.insert(name.into(), Target::Locator(selector));
        self
    }

    /// Set the load timeout
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Register a named target in place
    pub fn add_target(&mut self, name: impl Into<String>, selector: Selector) {
        let _ = self.targets.insert(name.into(), Target::Locator(selector));
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> WaitResult<&Target> {
        self.targets.get(name).ok_or_else(|| WaitError::UnknownTarget {
            page: self.name.clone(),
            name: name.to_string(),
        })
    }

    /// Registered target names, sorted
    #[must_use]
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }
}

impl PageObject for SimplePage {
    fn page_name(&self) -> &str {
        &self.name
    }

    fn ready_marker(&self) -> Target {
        self.ready_marker.clone()
    }

    fn load_timeout(&self) -> Duration {
        self.load_timeout
    }
}
