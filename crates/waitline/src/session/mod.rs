//! UiSession - the seam to the browser automation driver.
//!
//! The poller never talks to a browser directly. Anything that can resolve
//! a [`Target`], report an element's [`ElementState`] and perform an
//! [`Action`] can be driven by Waitline: a WebDriver client, a CDP client,
//! or the in-memory [`mock::ScriptedSession`].
//!
//! Implementations must return [`WaitError::StaleElement`](crate::WaitError::StaleElement)
//! when a handle no longer refers to a live element, since that kind is
//! the one the default poll policy treats as transient.

pub mod mock;

use crate::locator::{ElementHandle, Target};
use crate::result::WaitResult;
use serde::{Deserialize, Serialize};

/// Observable state of one element at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Attached to the document
    pub present: bool,
    /// Rendered and not hidden
    pub visible: bool,
    /// Accepts input
    pub enabled: bool,
    /// Checked / selected (checkboxes, radios, options)
    pub selected: bool,
    /// Visible text
    pub text: String,
}

impl ElementState {
    /// Present, visible and enabled
    #[must_use]
    pub const fn is_clickable(&self) -> bool {
        self.present && self.visible && self.enabled
    }
}

/// Interaction performed on a resolved element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum Action {
    /// Click the element
    Click,
    /// Type text into the element
    Type(String),
    /// Clear the element's value
    Clear,
    /// Press the Enter key while focused on the element
    PressEnter,
    /// Select an option by value
    Select(String),
    /// Move the pointer over the element
    Hover,
    /// Double-click the element
    DoubleClick,
    /// Scroll the element into the viewport
    ScrollIntoView,
}

impl Action {
    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Type(_) => "type",
            Self::Clear => "clear",
            Self::PressEnter => "press_enter",
            Self::Select(_) => "select",
            Self::Hover => "hover",
            Self::DoubleClick => "double_click",
            Self::ScrollIntoView => "scroll_into_view",
        }
    }

    /// Whether the element must be visible and enabled to accept it
    #[must_use]
    pub const fn needs_input(&self) -> bool {
        !matches!(self, Self::Hover | Self::ScrollIntoView)
    }
}

/// Live UI session driven by the poller
///
/// One session belongs to one calling thread at a time; the poller adds no
/// synchronisation over it.
pub trait UiSession: Send + Sync {
    /// Resolve a target to zero or more elements
    fn resolve(&self, target: &Target) -> WaitResult<Vec<ElementHandle>>;

    /// Read the current state of an element
    fn state(&self, element: &ElementHandle) -> WaitResult<ElementState>;

    /// Read a named DOM property or attribute; `None` when unset
    fn property(&self, element: &ElementHandle, name: &str) -> WaitResult<Option<String>>;

    /// Perform an action on an element
    fn act(&self, element: &ElementHandle, action: &Action) -> WaitResult<()>;

    /// Whether the document has finished loading
    fn eval_ready(&self) -> WaitResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clickable_needs_all_three() {
        let mut state = ElementState {
            present: true,
            visible: true,
            enabled: true,
            ..Default::default()
        };
        assert!(state.is_clickable());
        state.enabled = false;
        assert!(!state.is_clickable());
        state.enabled = true;
        state.visible = false;
        assert!(!state.is_clickable());
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Click.name(), "click");
        assert_eq!(Action::Type("x".into()).name(), "type");
        assert_eq!(Action::Select("TR".into()).name(), "select");
        assert_eq!(Action::DoubleClick.name(), "double_click");
        assert_eq!(Action::ScrollIntoView.name(), "scroll_into_view");
    }

    #[test]
    fn test_pointer_only_actions_skip_input_checks() {
        assert!(Action::Click.needs_input());
        assert!(Action::DoubleClick.needs_input());
        assert!(!Action::Hover.needs_input());
        assert!(!Action::ScrollIntoView.needs_input());
    }
}
