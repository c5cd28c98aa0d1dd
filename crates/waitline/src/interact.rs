//! Composed interaction helpers.
//!
//! Each helper waits for the element to be ready through the [`Poller`],
//! acts on the first match, and reports pass/fail to the poller's observer.
//! Actions re-resolve and retry when the element goes stale mid-action.

use crate::condition::{Condition, ElementCondition};
use crate::locator::{ElementHandle, Target};
use crate::observer::EventStatus;
use crate::poller::{PollOutcome, Poller};
use crate::result::{WaitError, WaitResult};
use crate::session::{Action, UiSession};
use std::time::Duration;

/// How [`type_text`] treats existing content and submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeOptions {
    /// Clear the field before typing
    pub clear: bool,
    /// Press Enter after typing
    pub press_enter: bool,
}

impl Default for TypeOptions {
    fn default() -> Self {
        Self {
            clear: true,
            press_enter: false,
        }
    }
}

impl TypeOptions {
    /// Clear, type and press Enter
    #[must_use]
    pub const fn submit() -> Self {
        Self {
            clear: true,
            press_enter: true,
        }
    }

    /// Type after the existing content
    #[must_use]
    pub const fn append() -> Self {
        Self {
            clear: false,
            press_enter: false,
        }
    }
}

fn type_into(
    session: &dyn UiSession,
    element: &ElementHandle,
    text: &str,
    options: TypeOptions,
) -> WaitResult<()> {
    if options.clear {
        session.act(element, &Action::Clear)?;
    }
    session.act(element, &Action::Type(text.to_string()))?;
    if options.press_enter {
        session.act(element, &Action::PressEnter)?;
    }
    Ok(())
}

/// Wait for `target` to be clickable, then type `text` into it.
///
/// A stale or non-interactable field is re-resolved and typed into again,
/// up to the poller's click attempts. With `clear` set every attempt starts
/// from an empty field.
pub fn type_text(
    poller: &Poller<'_>,
    target: &Target,
    text: &str,
    options: TypeOptions,
) -> WaitResult<()> {
    let subject = format!("type {target}");
    poller
        .retry_with(
            "type_text",
            &subject,
            poller.click_attempts(),
            || poller.locate_first(target, &ElementCondition::Clickable),
            |session, element| type_into(session, element, text, options),
        )
        .into_result()
        .map(|((), _)| ())
}

/// Wait for `target` to be clickable, then select `value`
pub fn select_option(poller: &Poller<'_>, target: &Target, value: &str) -> WaitResult<()> {
    poller
        .retry_action(
            "select_option",
            target,
            &ElementCondition::Clickable,
            &Action::Select(value.to_string()),
            poller.click_attempts(),
        )
        .into_result()
        .map(|_| ())
}

/// Wait for `target` to be visible, then hover over it
pub fn hover(poller: &Poller<'_>, target: &Target) -> WaitResult<()> {
    poller
        .retry_action(
            "hover",
            target,
            &ElementCondition::Visible,
            &Action::Hover,
            poller.click_attempts(),
        )
        .into_result()
        .map(|_| ())
}

/// Wait for `target` to be clickable, then double-click it
pub fn double_click(poller: &Poller<'_>, target: &Target) -> WaitResult<()> {
    poller
        .retry_action(
            "double_click",
            target,
            &ElementCondition::Clickable,
            &Action::DoubleClick,
            poller.click_attempts(),
        )
        .into_result()
        .map(|_| ())
}

/// Wait for `target` to be attached, then scroll it into the viewport
pub fn scroll_into_view(poller: &Poller<'_>, target: &Target) -> WaitResult<()> {
    poller
        .retry_action(
            "scroll_into_view",
            target,
            &ElementCondition::Present,
            &Action::ScrollIntoView,
            poller.click_attempts(),
        )
        .into_result()
        .map(|_| ())
}

/// Bring a checkbox to `checked`, clicking only if its state differs.
///
/// The state is re-read on every attempt, so a retry after a stale click
/// never toggles the box twice. Returns whether a click was made.
pub fn set_checked(poller: &Poller<'_>, target: &Target, checked: bool) -> WaitResult<bool> {
    let subject = format!("check={checked} {target}");
    poller
        .retry_with(
            "set_checked",
            &subject,
            poller.click_attempts(),
            || poller.locate_first(target, &ElementCondition::Clickable),
            |session, element| {
                if session.state(element)?.selected == checked {
                    return Ok(false);
                }
                session.act(element, &Action::Click)?;
                Ok(true)
            },
        )
        .into_result()
        .map(|(clicked, _)| clicked)
}

/// Check `target` once, without waiting: is it displayed right now?
///
/// Returns `Ok(false)` for a hidden or missing element and reports the
/// verdict to the observer. Only fatal session errors surface as `Err`.
pub fn verify_displayed(poller: &Poller<'_>, target: &Target) -> WaitResult<bool> {
    verify(poller, "verify_displayed", target, &ElementCondition::Visible)
}

/// Check `target` once, without waiting: is it hidden or gone right now?
pub fn verify_not_displayed(poller: &Poller<'_>, target: &Target) -> WaitResult<bool> {
    verify(poller, "verify_not_displayed", target, &ElementCondition::Absent)
}

fn verify(
    poller: &Poller<'_>,
    operation: &str,
    target: &Target,
    condition: &ElementCondition,
) -> WaitResult<bool> {
    // a zero timeout runs exactly one tick
    let policy = poller.policy().clone().with_timeout(Duration::ZERO);
    let subject = format!("{} {target}", condition.description());
    match poller.poll_until(target, condition, &policy) {
        PollOutcome::Satisfied(_) => {
            poller.note(operation, &subject, EventStatus::Pass, format!("{subject} holds"));
            Ok(true)
        }
        PollOutcome::TimedOut { .. } => {
            poller.note(
                operation,
                &subject,
                EventStatus::Fail,
                format!("{subject} does not hold"),
            );
            Ok(false)
        }
        PollOutcome::Failed(e) => {
            poller.note(operation, &subject, EventStatus::Fail, e.to_string());
            Err(e)
        }
    }
}

/// Wait for `target` to be present and read the first element's text
pub fn text_of(poller: &Poller<'_>, target: &Target) -> WaitResult<String> {
    poller
        .poll_extract(
            target,
            &ElementCondition::Present,
            poller.policy(),
            |session, resolution| match resolution.first() {
                Some(element) => Ok(Some(session.state(element)?.text)),
                None => Ok(None),
            },
        )
        .into_result()
}

/// Wait for `target` to be present and read every element's text
pub fn texts_of(poller: &Poller<'_>, target: &Target) -> WaitResult<Vec<String>> {
    poller
        .poll_extract(
            target,
            &ElementCondition::Present,
            poller.policy(),
            |session, resolution| {
                resolution
                    .iter()
                    .map(|element| session.state(element).map(|s| s.text))
                    .collect::<WaitResult<Vec<_>>>()
                    .map(Some)
            },
        )
        .into_result()
}

/// Wait for `target` to be present and read property `name` of the first
/// element. An unset property is `Ok(None)`, not a timeout.
pub fn property_of(
    poller: &Poller<'_>,
    target: &Target,
    name: &str,
) -> WaitResult<Option<String>> {
    poller
        .poll_extract(
            target,
            &ElementCondition::Present,
            poller.policy(),
            |session, resolution| match resolution.first() {
                Some(element) => session.property(element, name).map(Some),
                None => Ok(None),
            },
        )
        .into_result()
}

/// Click the first element of `list` whose text contains `needle`.
///
/// Waits until such an element exists; a timeout becomes
/// [`WaitError::NoSuchElement`]. A stale match is looked up again.
/// Returns the clicked handle.
pub fn click_item_containing(
    poller: &Poller<'_>,
    list: &Target,
    needle: &str,
) -> WaitResult<ElementHandle> {
    let subject = format!("{list} item containing {needle:?}");
    let locate = || {
        poller.poll_extract(
            list,
            &ElementCondition::Present,
            poller.policy(),
            |session, resolution| {
                for element in resolution {
                    if session.state(element)?.text.contains(needle) {
                        return Ok(Some(element.clone()));
                    }
                }
                Ok(None)
            },
        )
    };
    let outcome = poller.retry_with(
        "click_item_containing",
        &subject,
        poller.click_attempts(),
        locate,
        |session, element| session.act(element, &Action::Click).map(|()| element.clone()),
    );
    match outcome {
        PollOutcome::Satisfied((element, _)) => Ok(element),
        PollOutcome::TimedOut { .. } => Err(WaitError::no_such_element(subject)),
        PollOutcome::Failed(e) => Err(e),
    }
}
