//! Scripted in-memory session for unit tests and demos.
//!
//! Elements are registered under a selector with a timeline (when they
//! appear, become visible, become enabled, get removed) measured on an
//! optional [`Clock`]. Failures can be queued per target or per element to
//! simulate stale references, intercepted clicks or a dead session.

use super::{Action, ElementState, UiSession};
use crate::clock::Clock;
use crate::locator::{ElementHandle, Selector, Target};
use crate::result::{WaitError, WaitResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// An element and its scripted timeline
#[derive(Debug, Clone)]
pub struct ScriptedElement {
    handle: ElementHandle,
    appears_at: Duration,
    removed_at: Option<Duration>,
    visible_at: Option<Duration>,
    enabled_at: Option<Duration>,
    checkable: bool,
    selected: bool,
    text: String,
    properties: HashMap<String, String>,
}

impl ScriptedElement {
    /// Element present, visible and enabled from time zero
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            handle: ElementHandle::new(id, tag_name),
            appears_at: Duration::ZERO,
            removed_at: None,
            visible_at: Some(Duration::ZERO),
            enabled_at: Some(Duration::ZERO),
            checkable: false,
            selected: false,
            text: String::new(),
            properties: HashMap::new(),
        }
    }

    /// Set visible text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Never visible
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible_at = None;
        self
    }

    /// Never enabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled_at = None;
        self
    }

    /// Attach to the document after `delay`
    #[must_use]
    pub const fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_at = delay;
        self
    }

    /// Become visible after `delay`
    #[must_use]
    pub const fn visible_after(mut self, delay: Duration) -> Self {
        self.visible_at = Some(delay);
        self
    }

    /// Become enabled after `delay`
    #[must_use]
    pub const fn enabled_after(mut self, delay: Duration) -> Self {
        self.enabled_at = Some(delay);
        self
    }

    /// Become visible and enabled after `delay`
    #[must_use]
    pub const fn clickable_after(self, delay: Duration) -> Self {
        self.visible_after(delay).enabled_after(delay)
    }

    /// Detach from the document after `delay`
    #[must_use]
    pub const fn removed_after(mut self, delay: Duration) -> Self {
        self.removed_at = Some(delay);
        self
    }

    /// Checkbox whose selected state toggles on click
    #[must_use]
    pub const fn checkbox(mut self, checked: bool) -> Self {
        self.checkable = true;
        self.selected = checked;
        self
    }

    /// Set a DOM property such as `href` or `value`
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.properties.insert(name.into(), value.into());
        self
    }

    /// Handle the session hands out for this element
    #[must_use]
    pub const fn handle(&self) -> &ElementHandle {
        &self.handle
    }

    fn is_live(&self, now: Duration) -> bool {
        self.appears_at <= now && self.removed_at.map_or(true, |r| now < r)
    }

    fn state_at(&self, now: Duration) -> ElementState {
        ElementState {
            present: true,
            visible: self.visible_at.is_some_and(|t| now >= t),
            enabled: self.enabled_at.is_some_and(|t| now >= t),
            selected: self.selected,
            text: self.text.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    elements: Vec<(Selector, ScriptedElement)>,
    resolve_failures: HashMap<String, VecDeque<WaitError>>,
    state_failures: HashMap<String, VecDeque<WaitError>>,
    act_failures: HashMap<String, VecDeque<WaitError>>,
    resolve_calls: HashMap<String, u32>,
    resolve_latency: Duration,
    ready_at: Duration,
    history: Vec<String>,
}

impl Inner {
    fn element(&self, id: &str) -> Option<&ScriptedElement> {
        self.elements
            .iter()
            .map(|(_, e)| e)
            .find(|e| e.handle.id == id)
    }

    fn element_mut(&mut self, id: &str) -> Option<&mut ScriptedElement> {
        self.elements
            .iter_mut()
            .map(|(_, e)| e)
            .find(|e| e.handle.id == id)
    }
}

/// In-memory [`UiSession`] driven by a script
#[derive(Debug, Default)]
pub struct ScriptedSession {
    clock: Option<Arc<dyn Clock>>,
    inner: Mutex<Inner>,
}

impl ScriptedSession {
    /// Session where every timeline is evaluated at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate timelines against `clock`
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> Duration {
        self.clock.as_ref().map_or(Duration::ZERO, |c| c.now())
    }

    /// Register an element under a selector
    pub fn add(&self, selector: Selector, element: ScriptedElement) {
        self.lock().elements.push((selector, element));
    }

    /// Detach an element immediately; held handles go stale
    pub fn remove(&self, id: &str) {
        let now = self.now();
        if let Some(e) = self.lock().element_mut(id) {
            e.removed_at = Some(now);
        }
    }

    /// Replace an element's text
    pub fn set_text(&self, id: &str, text: impl Into<String>) {
        if let Some(e) = self.lock().element_mut(id) {
            e.text = text.into();
        }
    }

    /// Current text of an element, whether or not it is live
    #[must_use]
    pub fn text_of(&self, id: &str) -> Option<String> {
        self.lock().element(id).map(|e| e.text.clone())
    }

    /// Current selected flag of an element
    #[must_use]
    pub fn is_selected(&self, id: &str) -> Option<bool> {
        self.lock().element(id).map(|e| e.selected)
    }

    /// Queue an error for the next resolve of `target`
    pub fn fail_resolve(&self, target: &Target, error: WaitError) {
        self.lock()
            .resolve_failures
            .entry(target.describe())
            .or_default()
            .push_back(error);
    }

    /// Queue an error for the next state or property read of element `id`
    pub fn fail_state(&self, id: &str, error: WaitError) {
        self.lock()
            .state_failures
            .entry(id.to_string())
            .or_default()
            .push_back(error);
    }

    /// Queue an error for the next action on element `id`
    pub fn fail_act(&self, id: &str, error: WaitError) {
        self.lock()
            .act_failures
            .entry(id.to_string())
            .or_default()
            .push_back(error);
    }

    /// Make every resolve call take `latency` on the session clock
    pub fn set_resolve_latency(&self, latency: Duration) {
        self.lock().resolve_latency = latency;
    }

    /// Report the document ready only after `delay`
    pub fn ready_after(&self, delay: Duration) {
        self.lock().ready_at = delay;
    }

    /// How many times `target` was resolved
    #[must_use]
    pub fn resolve_count(&self, target: &Target) -> u32 {
        self.lock()
            .resolve_calls
            .get(&target.describe())
            .copied()
            .unwrap_or(0)
    }

    /// Call history, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Whether any recorded call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(prefix))
    }

    /// Number of recorded calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock()
            .history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

impl UiSession for ScriptedSession {
    fn resolve(&self, target: &Target) -> WaitResult<Vec<ElementHandle>> {
        let latency = self.lock().resolve_latency;
        if let Some(clock) = &self.clock {
            clock.sleep(latency);
        }
        let now = self.now();
        let key = target.describe();

        let mut inner = self.lock();
        *inner.resolve_calls.entry(key.clone()).or_insert(0) += 1;
        inner.history.push(format!("resolve:{key}"));
        if let Some(err) = inner
            .resolve_failures
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }

        match target {
            Target::Locator(selector) => Ok(inner
                .elements
                .iter()
                .filter(|(s, e)| s == selector && e.is_live(now))
                .map(|(_, e)| e.handle.clone())
                .collect()),
            Target::Handle(handle) => match inner.element(&handle.id) {
                Some(e) if e.is_live(now) => Ok(vec![e.handle.clone()]),
                _ => Err(WaitError::stale(key)),
            },
            Target::Nth { selector, index } => Ok(inner
                .elements
                .iter()
                .filter(|(s, e)| s == selector && e.is_live(now))
                .map(|(_, e)| e.handle.clone())
                .nth(*index)
                .into_iter()
                .collect()),
        }
    }

    fn state(&self, element: &ElementHandle) -> WaitResult<ElementState> {
        let now = self.now();
        let mut inner = self.lock();
        if let Some(err) = inner
            .state_failures
            .get_mut(&element.id)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        match inner.element(&element.id) {
            Some(e) if e.is_live(now) => Ok(e.state_at(now)),
            _ => Err(WaitError::stale(element.to_string())),
        }
    }

    fn property(&self, element: &ElementHandle, name: &str) -> WaitResult<Option<String>> {
        let now = self.now();
        let mut inner = self.lock();
        inner.history.push(format!("property:{}:{name}", element.id));
        if let Some(err) = inner
            .state_failures
            .get_mut(&element.id)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        match inner.element(&element.id) {
            Some(e) if e.is_live(now) => Ok(e.properties.get(name).cloned()),
            _ => Err(WaitError::stale(element.to_string())),
        }
    }

    fn act(&self, element: &ElementHandle, action: &Action) -> WaitResult<()> {
        let now = self.now();
        let mut inner = self.lock();
        let record = match action {
            Action::Type(text) | Action::Select(text) => {
                format!("{}:{}:{text}", action.name(), element.id)
            }
            _ => format!("{}:{}", action.name(), element.id),
        };
        inner.history.push(record);
        if let Some(err) = inner
            .act_failures
            .get_mut(&element.id)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }

        let Some(e) = inner.element_mut(&element.id) else {
            return Err(WaitError::stale(element.to_string()));
        };
        if !e.is_live(now) {
            return Err(WaitError::stale(element.to_string()));
        }
        let state = e.state_at(now);
        if action.needs_input() && !(state.visible && state.enabled) {
            return Err(WaitError::NotInteractable {
                target: element.to_string(),
            });
        }

        match action {
            Action::Click if e.checkable => e.selected = !e.selected,
            Action::Type(text) => e.text.push_str(text),
            Action::Clear => e.text.clear(),
            Action::Select(value) => e.text.clone_from(value),
            Action::Click
            | Action::DoubleClick
            | Action::PressEnter
            | Action::Hover
            | Action::ScrollIntoView => {}
        }
        Ok(())
    }

    fn eval_ready(&self) -> WaitResult<bool> {
        let now = self.now();
        let mut inner = self.lock();
        inner.history.push("eval_ready".to_string());
        Ok(now >= inner.ready_at)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    fn session_with_clock() -> (Arc<FakeClock>, ScriptedSession) {
        let clock = Arc::new(FakeClock::new());
        let session = ScriptedSession::new().with_clock(clock.clone());
        (clock, session)
    }

    #[test]
    fn test_resolve_matches_selector() {
        let session = ScriptedSession::new();
        session.add(Selector::css("li"), ScriptedElement::new("a", "li"));
        session.add(Selector::css("li"), ScriptedElement::new("b", "li"));
        session.add(Selector::css("p"), ScriptedElement::new("c", "p"));

        let found = session.resolve(&Target::css("li")).unwrap();
        let ids: Vec<_> = found.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(session.resolve_count(&Target::css("li")), 1);
    }

    #[test]
    fn test_element_appears_on_schedule() {
        let (clock, session) = session_with_clock();
        session.add(
            Selector::id("late"),
            ScriptedElement::new("late", "div").appears_after(Duration::from_secs(1)),
        );
        assert!(session.resolve(&Target::id("late")).unwrap().is_empty());
        clock.advance_ms(1000);
        assert_eq!(session.resolve(&Target::id("late")).unwrap().len(), 1);
    }

    #[test]
    fn test_removed_handle_is_stale() {
        let session = ScriptedSession::new();
        session.add(Selector::id("x"), ScriptedElement::new("x", "div"));
        let handle = session.resolve(&Target::id("x")).unwrap().remove(0);
        session.remove("x");

        let err = session.resolve(&Target::Handle(handle.clone())).unwrap_err();
        assert!(matches!(err, WaitError::StaleElement { .. }));
        let err = session.state(&handle).unwrap_err();
        assert!(matches!(err, WaitError::StaleElement { .. }));
    }

    #[test]
    fn test_queued_resolve_failures_pop_in_order() {
        let session = ScriptedSession::new();
        let target = Target::css("#btn");
        session.fail_resolve(&target, WaitError::stale("#btn"));
        session.fail_resolve(&target, WaitError::session_fault("boom"));

        assert!(matches!(
            session.resolve(&target),
            Err(WaitError::StaleElement { .. })
        ));
        assert!(matches!(
            session.resolve(&target),
            Err(WaitError::SessionFault { .. })
        ));
        assert!(session.resolve(&target).unwrap().is_empty());
    }

    #[test]
    fn test_visibility_and_enablement_timeline() {
        let (clock, session) = session_with_clock();
        session.add(
            Selector::id("submit"),
            ScriptedElement::new("submit", "button").clickable_after(Duration::from_millis(1200)),
        );
        let handle = ElementHandle::new("submit", "button");
        assert!(!session.state(&handle).unwrap().is_clickable());
        clock.advance_ms(1200);
        assert!(session.state(&handle).unwrap().is_clickable());
    }

    #[test]
    fn test_act_applies_and_records() {
        let session = ScriptedSession::new();
        session.add(Selector::id("q"), ScriptedElement::new("q", "input").text("old"));
        session.add(Selector::id("c"), ScriptedElement::new("c", "input").checkbox(false));
        let q = ElementHandle::new("q", "input");
        let c = ElementHandle::new("c", "input");

        session.act(&q, &Action::Clear).unwrap();
        session.act(&q, &Action::Type("istanbul".into())).unwrap();
        session.act(&c, &Action::Click).unwrap();

        assert_eq!(session.text_of("q").unwrap(), "istanbul");
        assert_eq!(session.is_selected("c"), Some(true));
        assert!(session.was_called("type:q:istanbul"));
        assert_eq!(session.call_count("clear:"), 1);
    }

    #[test]
    fn test_act_on_hidden_is_not_interactable() {
        let session = ScriptedSession::new();
        session.add(Selector::id("h"), ScriptedElement::new("h", "button").hidden());
        let err = session
            .act(&ElementHandle::new("h", "button"), &Action::Click)
            .unwrap_err();
        assert!(matches!(err, WaitError::NotInteractable { .. }));
    }

    #[test]
    fn test_resolve_nth_match() {
        let session = ScriptedSession::new();
        session.add(Selector::css("li"), ScriptedElement::new("a", "li"));
        session.add(Selector::css("li"), ScriptedElement::new("b", "li"));

        let found = session.resolve(&Target::nth(Selector::css("li"), 1)).unwrap();
        assert_eq!(found, [ElementHandle::new("b", "li")]);
        assert!(session
            .resolve(&Target::nth(Selector::css("li"), 2))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_property_reads_and_goes_stale() {
        let session = ScriptedSession::new();
        session.add(
            Selector::id("home"),
            ScriptedElement::new("home", "a").property("href", "/home"),
        );
        let link = ElementHandle::new("home", "a");

        assert_eq!(session.property(&link, "href").unwrap().as_deref(), Some("/home"));
        assert_eq!(session.property(&link, "target").unwrap(), None);
        session.remove("home");
        assert!(matches!(
            session.property(&link, "href"),
            Err(WaitError::StaleElement { .. })
        ));
    }

    #[test]
    fn test_scroll_into_view_ignores_visibility() {
        let session = ScriptedSession::new();
        session.add(Selector::id("f"), ScriptedElement::new("f", "footer").hidden());
        let footer = ElementHandle::new("f", "footer");

        session.act(&footer, &Action::ScrollIntoView).unwrap();
        assert!(session.act(&footer, &Action::DoubleClick).is_err());
        assert!(session.was_called("scroll_into_view:f"));
    }

    #[test]
    fn test_resolve_latency_uses_clock() {
        let (clock, session) = session_with_clock();
        session.set_resolve_latency(Duration::from_millis(30));
        let _ = session.resolve(&Target::css("x")).unwrap();
        assert_eq!(clock.now(), Duration::from_millis(30));
    }

    #[test]
    fn test_ready_after() {
        let (clock, session) = session_with_clock();
        session.ready_after(Duration::from_millis(300));
        assert!(!session.eval_ready().unwrap());
        clock.advance_ms(300);
        assert!(session.eval_ready().unwrap());
    }
}
