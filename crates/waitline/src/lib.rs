//! Waitline: condition polling for browser UI tests
//!
//! Page objects name their targets; a shared [`Poller`] waits for
//! conditions over those targets and composes actions on top of the waits.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────┐   ┌──────────────┐
//! │ Page objects │──►│ Poller                   │──►│ UiSession    │
//! │ + interact   │   │  tick loop, click retry, │   │ (WebDriver,  │
//! │   helpers    │   │  PollPolicy, Clock       │   │  CDP, mock)  │
//! └──────────────┘   └────────────┬─────────────┘   └──────────────┘
//!                                 │ PollEvent
//!                                 ▼
//!                          ┌─────────────┐
//!                          │ Observer    │
//!                          └─────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use waitline::mock::{ScriptedElement, ScriptedSession};
//! use waitline::{Clock, FakeClock, PollPolicy, Poller, Selector, Target};
//!
//! let clock = Arc::new(FakeClock::new());
//! let session = ScriptedSession::new().with_clock(clock.clone());
//! session.add(
//!     Selector::css("#submit"),
//!     ScriptedElement::new("submit", "button").clickable_after(Duration::from_millis(1200)),
//! );
//!
//! let poller = Poller::new(&session)
//!     .with_clock(clock.clone())
//!     .with_policy(PollPolicy::new(Duration::from_secs(5), Duration::from_millis(500)));
//!
//! let report = poller.click(&Target::css("#submit")).unwrap();
//! assert_eq!(report.attempts, 1);
//! assert_eq!(clock.now(), Duration::from_millis(1500));
//! ```

#![warn(missing_docs)]

mod clock;
mod condition;
mod config;
pub mod interact;
mod locator;
pub mod logging;
mod observer;
mod page_object;
mod poller;
mod policy;
mod result;
mod session;

pub use clock::{Clock, FakeClock, SystemClock};
pub use condition::{Condition, ElementCondition, FnCondition};
pub use config::{WaitConfig, ENV_CLICK_ATTEMPTS, ENV_INTERVAL_MS, ENV_TIMEOUT_MS};
pub use interact::TypeOptions;
pub use locator::{ElementHandle, Resolution, Selector, Target};
pub use observer::{
    EventStatus, NoopObserver, Observer, PollEvent, RecordingObserver, TracingObserver,
};
pub use page_object::{wait_until_loaded, PageObject, SimplePage};
pub use poller::{ActionReport, ClickReport, PollOutcome, Poller, DEFAULT_CLICK_ATTEMPTS};
pub use policy::{PollPolicy, DEFAULT_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
pub use result::{ErrorKind, WaitError, WaitResult};
pub use session::{mock, Action, ElementState, UiSession};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::interact::{
        click_item_containing, double_click, hover, property_of, scroll_into_view, select_option,
        set_checked, text_of, texts_of, type_text, verify_displayed, verify_not_displayed,
    };
    pub use super::mock::{ScriptedElement, ScriptedSession};
    pub use super::{
        wait_until_loaded, Action, ElementCondition, ErrorKind, FakeClock, PageObject,
        PollOutcome, PollPolicy, Poller, RecordingObserver, Selector, SimplePage, Target,
        TracingObserver, TypeOptions, UiSession, WaitConfig, WaitError, WaitResult,
    };
}
