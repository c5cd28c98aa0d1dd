//! Condition Poller
//!
//! Blocks the calling thread until a condition over a target holds, the
//! policy's timeout elapses, or a fatal error occurs, and always returns a
//! definite [`PollOutcome`].
//!
//! ## Tick schedule
//!
//! ```text
//!  start          start+I        start+2I               start+T
//!    |--tick 0-----|--tick 1-------|--tick 2--- ... -------|--final tick
//!    resolve+check  resolve+check   resolve+check           resolve+check
//! ```
//!
//! Ticks sit on multiples of the interval measured from the start of the
//! call. A tick that overruns its slot skips the missed slots instead of
//! pushing the schedule back, and the last tick is clamped to the timeout,
//! so a condition that never holds returns after `T <= elapsed < T + I`.

use crate::clock::{Clock, SystemClock};
use crate::condition::{Condition, ElementCondition};
use crate::config::WaitConfig;
use crate::locator::{ElementHandle, Resolution, Target};
use crate::observer::{EventStatus, NoopObserver, Observer, PollEvent};
use crate::policy::{PollPolicy, DEFAULT_TIMEOUT_MS};
use crate::result::{WaitError, WaitResult};
use crate::session::{Action, UiSession};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default number of attempts for click retries
pub const DEFAULT_CLICK_ATTEMPTS: u32 = 3;

/// Terminal result of one poll call
#[must_use = "a poll outcome distinguishes success, timeout and failure"]
#[derive(Debug)]
pub enum PollOutcome<T> {
    /// Condition held; carries the value observed on the satisfying tick
    Satisfied(T),
    /// Condition never held within the timeout
    TimedOut {
        /// What was waited for
        waited_for: String,
        /// Time spent waiting
        elapsed: Duration,
    },
    /// A fatal error ended the wait early
    Failed(WaitError),
}

impl<T> PollOutcome<T> {
    /// Check if the condition was satisfied
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }

    /// Check if the wait timed out
    #[must_use]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Check if the wait failed
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The satisfied value, if any
    pub fn satisfied(self) -> Option<T> {
        match self {
            Self::Satisfied(value) => Some(value),
            Self::TimedOut { .. } | Self::Failed(_) => None,
        }
    }

    /// The failure, if any
    pub fn failure(&self) -> Option<&WaitError> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Satisfied(_) | Self::TimedOut { .. } => None,
        }
    }

    /// Transform the satisfied value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PollOutcome<U> {
        match self {
            Self::Satisfied(value) => PollOutcome::Satisfied(f(value)),
            Self::TimedOut {
                waited_for,
                elapsed,
            } => PollOutcome::TimedOut {
                waited_for,
                elapsed,
            },
            Self::Failed(e) => PollOutcome::Failed(e),
        }
    }

    /// Collapse into a `Result`, turning a timeout into [`WaitError::Timeout`]
    pub fn into_result(self) -> WaitResult<T> {
        match self {
            Self::Satisfied(value) => Ok(value),
            Self::TimedOut {
                waited_for,
                elapsed,
            } => Err(WaitError::Timeout {
                what: waited_for,
                ms: elapsed.as_millis() as u64,
            }),
            Self::Failed(e) => Err(e),
        }
    }
}

/// Summary of a retried action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionReport {
    /// Attempts made, including the successful one
    pub attempts: u32,
    /// Time from the first attempt to success
    pub elapsed: Duration,
}

/// Report returned by [`Poller::click_with_retry`]
pub type ClickReport = ActionReport;

/// Identity of one operation for events and logs
struct OpContext<'a> {
    poll_id: Uuid,
    operation: &'a str,
    subject: &'a str,
    start: Duration,
}

/// Condition poller bound to one UI session
pub struct Poller<'s> {
    session: &'s dyn UiSession,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn Observer>,
    policy: PollPolicy,
    click_attempts: u32,
    exists_timeout: Duration,
}

impl std::fmt::Debug for Poller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("clock", &self.clock)
            .field("observer", &self.observer)
            .field("policy", &self.policy)
            .field("click_attempts", &self.click_attempts)
            .field("exists_timeout", &self.exists_timeout)
            .finish_non_exhaustive()
    }
}

impl<'s> Poller<'s> {
    /// Poller with the system clock, no observer and the default policy
    #[must_use]
    pub fn new(session: &'s dyn UiSession) -> Self {
        Self {
            session,
            clock: Arc::new(SystemClock::new()),
            observer: Arc::new(NoopObserver),
            policy: PollPolicy::default(),
            click_attempts: DEFAULT_CLICK_ATTEMPTS,
            exists_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Poller configured from a validated [`WaitConfig`]
    pub fn from_config(session: &'s dyn UiSession, config: &WaitConfig) -> WaitResult<Self> {
        config.validate()?;
        Ok(Self::new(session)
            .with_policy(config.to_policy())
            .with_click_attempts(config.click_attempts)
            .with_exists_timeout(config.exists_timeout()))
    }

    /// Use a different clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Report events to `observer`
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the default policy
    #[must_use]
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the default click attempts
    #[must_use]
    pub const fn with_click_attempts(mut self, attempts: u32) -> Self {
        self.click_attempts = attempts;
        self
    }

    /// Set the default timeout for [`Poller::exists`]
    #[must_use]
    pub const fn with_exists_timeout(mut self, timeout: Duration) -> Self {
        self.exists_timeout = timeout;
        self
    }

    /// Session this poller drives
    #[must_use]
    pub fn session(&self) -> &'s dyn UiSession {
        self.session
    }

    /// Default policy
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Default click attempts
    #[must_use]
    pub const fn click_attempts(&self) -> u32 {
        self.click_attempts
    }

    fn elapsed_since(&self, start: Duration) -> Duration {
        self.clock.now().saturating_sub(start)
    }

    fn context<'a>(&self, operation: &'a str, subject: &'a str) -> OpContext<'a> {
        OpContext {
            poll_id: Uuid::new_v4(),
            operation,
            subject,
            start: self.clock.now(),
        }
    }

    fn emit(&self, ctx: &OpContext<'_>, status: EventStatus, message: impl Into<String>) {
        self.observer.on_event(&PollEvent {
            poll_id: ctx.poll_id,
            status,
            operation: ctx.operation.to_string(),
            target: ctx.subject.to_string(),
            message: message.into(),
            elapsed_ms: self.elapsed_since(ctx.start).as_millis() as u64,
        });
    }

    /// Report an action outcome through the observer
    pub(crate) fn note(&self, operation: &str, subject: &str, status: EventStatus, message: String) {
        let ctx = self.context(operation, subject);
        self.emit(&ctx, status, message);
    }

    /// Resolve `target` once; `Nth` targets resolve their query and keep one match
    fn resolve(&self, target: &Target) -> WaitResult<Resolution> {
        match target {
            Target::Nth { selector, index } => {
                let query = Target::Locator(selector.clone());
                Ok(Resolution::new(self.session.resolve(&query)?).nth(*index))
            }
            Target::Locator(_) | Target::Handle(_) => {
                Ok(Resolution::new(self.session.resolve(target)?))
            }
        }
    }

    /// Core loop shared by every wait.
    ///
    /// `step` runs once per tick and returns `Some` when satisfied.
    fn run<T>(
        &self,
        operation: &str,
        subject: &str,
        policy: &PollPolicy,
        mut step: impl FnMut() -> WaitResult<Option<T>>,
    ) -> PollOutcome<T> {
        let ctx = self.context(operation, subject);
        if let Err(e) = policy.validate() {
            self.emit(&ctx, EventStatus::Fail, e.to_string());
            return PollOutcome::Failed(e);
        }

        // `attempt` counts evaluations; `slot` is the schedule index, which
        // jumps ahead when an evaluation overruns its interval
        let interval = policy.interval.as_nanos();
        let mut attempt: u64 = 0;
        let mut slot: u128 = 0;
        loop {
            attempt += 1;
            match step() {
                Ok(Some(value)) => {
                    let elapsed = self.elapsed_since(ctx.start);
                    info!(
                        poll_id = %ctx.poll_id,
                        subject,
                        attempt,
                        slot = slot as u64,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "condition satisfied"
                    );
                    self.emit(&ctx, EventStatus::Pass, format!("{subject} satisfied"));
                    return PollOutcome::Satisfied(value);
                }
                Ok(None) => {
                    debug!(
                        poll_id = %ctx.poll_id,
                        subject,
                        attempt,
                        slot = slot as u64,
                        "not yet satisfied"
                    );
                }
                Err(e) if policy.is_ignored(e.kind()) => {
                    warn!(
                        poll_id = %ctx.poll_id,
                        subject,
                        attempt,
                        slot = slot as u64,
                        kind = %e.kind(),
                        error = %e,
                        "ignoring transient error"
                    );
                }
                Err(e) => {
                    warn!(poll_id = %ctx.poll_id, subject, attempt, error = %e, "poll failed");
                    self.emit(&ctx, EventStatus::Fail, e.to_string());
                    return PollOutcome::Failed(e);
                }
            }

            let elapsed = self.elapsed_since(ctx.start);
            if elapsed >= policy.timeout {
                info!(
                    poll_id = %ctx.poll_id,
                    subject,
                    attempts = attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "poll timed out"
                );
                self.emit(
                    &ctx,
                    EventStatus::Fail,
                    format!("timed out waiting for {subject}"),
                );
                return PollOutcome::TimedOut {
                    waited_for: subject.to_string(),
                    elapsed,
                };
            }

            slot = elapsed.as_nanos() / interval + 1;
            let next = nanos(slot * interval).min(policy.timeout);
            self.clock.sleep(next.saturating_sub(elapsed));
        }
    }

    /// Poll until `condition` holds for `target`.
    ///
    /// The target is resolved from scratch on every tick. Errors whose kind
    /// is in `policy.ignored` count as "not yet"; any other error ends the
    /// wait with [`PollOutcome::Failed`].
    pub fn poll_until(
        &self,
        target: &Target,
        condition: &dyn Condition,
        policy: &PollPolicy,
    ) -> PollOutcome<Resolution> {
        let subject = format!("{} {}", condition.description(), target);
        self.run("poll_until", &subject, policy, || {
            let resolution = self.resolve(target)?;
            Ok(condition
                .check(self.session, &resolution)?
                .then_some(resolution))
        })
    }

    /// Poll until `condition` holds and `extract` yields a value from the
    /// same tick's resolution. `extract` returning `None` counts as "not yet".
    pub fn poll_extract<T>(
        &self,
        target: &Target,
        condition: &dyn Condition,
        policy: &PollPolicy,
        mut extract: impl FnMut(&dyn UiSession, &Resolution) -> WaitResult<Option<T>>,
    ) -> PollOutcome<T> {
        let subject = format!("{} {}", condition.description(), target);
        self.run("poll_extract", &subject, policy, || {
            let resolution = self.resolve(target)?;
            if !condition.check(self.session, &resolution)? {
                return Ok(None);
            }
            extract(self.session, &resolution)
        })
    }

    /// Poll a session-level predicate with the default policy
    pub fn wait_for_fn(
        &self,
        description: &str,
        mut predicate: impl FnMut(&dyn UiSession) -> WaitResult<bool>,
    ) -> PollOutcome<()> {
        self.run("wait_for_fn", description, &self.policy, || {
            Ok(predicate(self.session)?.then_some(()))
        })
    }

    /// Wait for the document to report ready
    pub fn wait_for_page_ready(&self) -> PollOutcome<()> {
        self.wait_for_fn("document ready", |session| session.eval_ready())
    }

    fn wait(
        &self,
        target: &Target,
        condition: &ElementCondition,
        timeout: Option<Duration>,
    ) -> PollOutcome<Resolution> {
        match timeout {
            Some(timeout) => {
                let policy = self.policy.clone().with_timeout(timeout);
                self.poll_until(target, condition, &policy)
            }
            None => self.poll_until(target, condition, &self.policy),
        }
    }

    /// Wait for the first match to be visible
    pub fn wait_for_visible(&self, target: &Target) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::Visible, None)
    }

    /// Wait for the first match to be visible within `timeout`
    pub fn wait_for_visible_within(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::Visible, Some(timeout))
    }

    /// Wait for the first match to be clickable
    pub fn wait_for_clickable(&self, target: &Target) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::Clickable, None)
    }

    /// Wait for the first match to be clickable within `timeout`
    pub fn wait_for_clickable_within(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::Clickable, Some(timeout))
    }

    /// Wait for at least one match
    pub fn wait_for_present(&self, target: &Target) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::Present, None)
    }

    /// Wait for at least one match within `timeout`
    pub fn wait_for_present_within(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::Present, Some(timeout))
    }

    /// Wait for the target to disappear or become hidden
    pub fn wait_for_absent(&self, target: &Target) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::Absent, None)
    }

    /// Wait for the target to disappear or become hidden within `timeout`
    pub fn wait_for_absent_within(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::Absent, Some(timeout))
    }

    /// Wait for the first match's text to contain `needle`
    pub fn wait_for_text(&self, target: &Target, needle: &str) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::text_contains(needle), None)
    }

    /// Wait for at least `count` matches
    pub fn wait_for_count(&self, target: &Target, count: usize) -> PollOutcome<Resolution> {
        self.wait(target, &ElementCondition::PresentCount(count), None)
    }

    /// Whether `target` appears within `timeout`.
    ///
    /// A timeout is `Ok(false)`; fatal errors still propagate.
    pub fn exists_within(&self, target: &Target, timeout: Duration) -> WaitResult<bool> {
        match self.wait(target, &ElementCondition::Present, Some(timeout)) {
            PollOutcome::Satisfied(_) => Ok(true),
            PollOutcome::TimedOut { .. } => Ok(false),
            PollOutcome::Failed(e) => Err(e),
        }
    }

    /// [`Poller::exists_within`] with the configured existence timeout
    pub fn exists(&self, target: &Target) -> WaitResult<bool> {
        self.exists_within(target, self.exists_timeout)
    }

    /// Wait for `target` to be clickable and click it, retrying the whole
    /// wait-then-click sequence when the click hits a stale, intercepted or
    /// non-interactable element.
    pub fn click_with_retry(&self, target: &Target, max_attempts: u32) -> PollOutcome<ClickReport> {
        self.retry_action(
            "click_with_retry",
            target,
            &ElementCondition::Clickable,
            &Action::Click,
            max_attempts,
        )
    }

    /// Click with the configured number of attempts
    pub fn click(&self, target: &Target) -> WaitResult<ClickReport> {
        self.click_with_retry(target, self.click_attempts)
            .into_result()
    }

    /// [`Poller::click_with_retry`] for an arbitrary action
    pub fn act_with_retry(
        &self,
        target: &Target,
        action: &Action,
        max_attempts: u32,
    ) -> PollOutcome<ActionReport> {
        self.retry_action(
            "act_with_retry",
            target,
            &ElementCondition::Clickable,
            action,
            max_attempts,
        )
    }

    /// First element of `target` once `ready` holds for it
    pub(crate) fn locate_first(
        &self,
        target: &Target,
        ready: &ElementCondition,
    ) -> PollOutcome<ElementHandle> {
        self.poll_extract(target, ready, &self.policy, |_, resolution| {
            Ok(resolution.first().cloned())
        })
    }

    pub(crate) fn retry_action(
        &self,
        operation: &str,
        target: &Target,
        ready: &ElementCondition,
        action: &Action,
        max_attempts: u32,
    ) -> PollOutcome<ActionReport> {
        let subject = format!("{} {}", action.name(), target);
        self.retry_with(
            operation,
            &subject,
            max_attempts,
            || self.locate_first(target, ready),
            |session, element| session.act(element, action),
        )
        .map(|((), report)| report)
    }

    /// Locate an element, then run `step` against it, repeating both when
    /// `step` hits a stale, intercepted or non-interactable element.
    pub(crate) fn retry_with<R>(
        &self,
        operation: &str,
        subject: &str,
        max_attempts: u32,
        mut locate: impl FnMut() -> PollOutcome<ElementHandle>,
        mut step: impl FnMut(&dyn UiSession, &ElementHandle) -> WaitResult<R>,
    ) -> PollOutcome<(R, ActionReport)> {
        let ctx = self.context(operation, subject);
        if max_attempts == 0 {
            let e = WaitError::invalid_argument("max_attempts must be at least 1");
            self.emit(&ctx, EventStatus::Fail, e.to_string());
            return PollOutcome::Failed(e);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let element = match locate() {
                PollOutcome::Satisfied(element) => element,
                PollOutcome::TimedOut { waited_for, .. } => {
                    self.emit(
                        &ctx,
                        EventStatus::Fail,
                        format!("timed out waiting for {waited_for}"),
                    );
                    return PollOutcome::TimedOut {
                        waited_for,
                        elapsed: self.elapsed_since(ctx.start),
                    };
                }
                PollOutcome::Failed(e) => {
                    self.emit(&ctx, EventStatus::Fail, e.to_string());
                    return PollOutcome::Failed(e);
                }
            };

            match step(self.session, &element) {
                Ok(value) => {
                    self.emit(
                        &ctx,
                        EventStatus::Pass,
                        format!("{subject} succeeded on attempt {attempt}"),
                    );
                    let report = ActionReport {
                        attempts: attempt,
                        elapsed: self.elapsed_since(ctx.start),
                    };
                    return PollOutcome::Satisfied((value, report));
                }
                Err(e) if e.kind().is_retryable_action() && attempt < max_attempts => {
                    warn!(
                        poll_id = %ctx.poll_id,
                        subject,
                        attempt,
                        max_attempts,
                        error = %e,
                        "action failed, retrying"
                    );
                    self.emit(
                        &ctx,
                        EventStatus::Info,
                        format!("attempt {attempt} failed: {e}"),
                    );
                    self.clock.sleep(self.policy.interval);
                }
                Err(e) if e.kind().is_retryable_action() => {
                    let e = WaitError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    };
                    self.emit(&ctx, EventStatus::Fail, e.to_string());
                    return PollOutcome::Failed(e);
                }
                Err(e) => {
                    self.emit(&ctx, EventStatus::Fail, e.to_string());
                    return PollOutcome::Failed(e);
                }
            }
        }
    }
}

fn nanos(n: u128) -> Duration {
    Duration::from_nanos(u64::try_from(n).unwrap_or(u64::MAX))
}
