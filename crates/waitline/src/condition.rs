//! Conditions evaluated against a target's resolution on each poll tick.
//!
//! A condition only reads. Returning `Ok(false)` means "not yet"; returning
//! an error hands the decision to the poll policy.

use crate::locator::Resolution;
use crate::result::{ErrorKind, WaitError, WaitResult};
use crate::session::UiSession;
use regex::Regex;

/// Predicate over the current resolution of a target
pub trait Condition: Send + Sync {
    /// Check if the condition holds for this resolution
    fn check(&self, session: &dyn UiSession, resolution: &Resolution) -> WaitResult<bool>;

    /// Get description for logs and timeout messages
    fn description(&self) -> String;
}

/// Built-in element conditions
#[derive(Debug, Clone)]
pub enum ElementCondition {
    /// At least one element is attached
    Present,
    /// At least `n` elements are attached
    PresentCount(usize),
    /// First element is visible
    Visible,
    /// First element is visible and enabled
    Clickable,
    /// Nothing matches, or every match is hidden or already detached
    Absent,
    /// First element's text contains the needle
    TextContains(String),
    /// First element's text matches the pattern
    TextMatches(Regex),
}

impl ElementCondition {
    /// Text containment condition
    #[must_use]
    pub fn text_contains(needle: impl Into<String>) -> Self {
        Self::TextContains(needle.into())
    }

    /// Regex text condition
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::ConditionEvaluation`] if the pattern does not compile
    pub fn text_matches(pattern: &str) -> WaitResult<Self> {
        Regex::new(pattern)
            .map(Self::TextMatches)
            .map_err(|e| WaitError::condition(format!("invalid pattern {pattern:?}: {e}")))
    }
}

fn first_text(session: &dyn UiSession, resolution: &Resolution) -> WaitResult<Option<String>> {
    match resolution.first() {
        Some(element) => Ok(Some(session.state(element)?.text)),
        None => Ok(None),
    }
}

impl Condition for ElementCondition {
    fn check(&self, session: &dyn UiSession, resolution: &Resolution) -> WaitResult<bool> {
        match self {
            Self::Present => Ok(!resolution.is_empty()),
            Self::PresentCount(n) => Ok(resolution.len() >= *n),
            Self::Visible => match resolution.first() {
                Some(element) => Ok(session.state(element)?.visible),
                None => Ok(false),
            },
            Self::Clickable => match resolution.first() {
                Some(element) => Ok(session.state(element)?.is_clickable()),
                None => Ok(false),
            },
            Self::Absent => {
                for element in resolution {
                    match session.state(element) {
                        Ok(state) if state.visible => return Ok(false),
                        Ok(_) => {}
                        // Detached between resolve and read: gone is absent
                        Err(e) if e.kind() == ErrorKind::StaleElement => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(true)
            }
            Self::TextContains(needle) => {
                Ok(first_text(session, resolution)?.is_some_and(|t| t.contains(needle.as_str())))
            }
            Self::TextMatches(re) => {
                Ok(first_text(session, resolution)?.is_some_and(|t| re.is_match(&t)))
            }
        }
    }

    fn description(&self) -> String {
        match self {
            Self::Present => "present".to_string(),
            Self::PresentCount(n) => format!("at least {n} present"),
            Self::Visible => "visible".to_string(),
            Self::Clickable => "clickable".to_string(),
            Self::Absent => "absent".to_string(),
            Self::TextContains(needle) => format!("text containing {needle:?}"),
            Self::TextMatches(re) => format!("text matching /{}/", re.as_str()),
        }
    }
}

/// A closure-based condition
pub struct FnCondition<F>
where
    F: Fn(&dyn UiSession, &Resolution) -> WaitResult<bool> + Send + Sync,
{
    func: F,
    description: String,
}

impl<F> std::fmt::Debug for FnCondition<F>
where
    F: Fn(&dyn UiSession, &Resolution) -> WaitResult<bool> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCondition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> FnCondition<F>
where
    F: Fn(&dyn UiSession, &Resolution) -> WaitResult<bool> + Send + Sync,
{
    /// Create a new function condition
    pub fn new(func: F, description: impl Into<String>) -> Self {
        Self {
            func,
            description: description.into(),
        }
    }
}

impl<F> Condition for FnCondition<F>
where
    F: Fn(&dyn UiSession, &Resolution) -> WaitResult<bool> + Send + Sync,
{
    fn check(&self, session: &dyn UiSession, resolution: &Resolution) -> WaitResult<bool> {
        (self.func)(session, resolution)
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}
