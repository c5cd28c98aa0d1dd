//! Targets: selectors, resolved element handles, and resolutions.
//!
//! A [`Target`] is what a page object hands to the poller. It is resolved
//! again on every poll tick, so a [`Target::Handle`] only stays useful while
//! the session still recognises the handle.

use serde::{Deserialize, Serialize};

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Element id attribute
    Id(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Text content selector
    Text(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create an id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// JavaScript expression that evaluates to an array of every match.
    ///
    /// Sessions backed by a script-evaluating driver can use this directly.
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({s:?}))"),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({s:?}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 return Array.from({{length: r.snapshotLength}}, (_, i) => r.snapshotItem(i)); }})()"
            ),
            Self::Id(id) => format!("[document.getElementById({id:?})].filter(Boolean)"),
            Self::TestId(id) => {
                format!("Array.from(document.querySelectorAll('[data-testid={id:?}]'))")
            }
            Self::Text(t) => format!(
                "Array.from(document.querySelectorAll('*')).filter(el => \
                 el.childElementCount === 0 && el.textContent.includes({t:?}))"
            ),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Id(s) => write!(f, "id={s}"),
            Self::TestId(s) => write!(f, "testid={s}"),
            Self::Text(s) => write!(f, "text={s}"),
        }
    }
}

/// Opaque handle to a concrete element in a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Session-assigned identifier
    pub id: String,
    /// Element tag name
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}#{}>", self.tag_name, self.id)
    }
}

/// Something the poller can resolve to elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Query re-run against the live page on every tick
    Locator(Selector),
    /// Handle obtained earlier; the session may report it stale
    Handle(ElementHandle),
    /// Zero-based `index`-th match of a query, re-run on every tick
    Nth {
        /// Query whose matches are indexed
        selector: Selector,
        /// Position in document order
        index: usize,
    },
}

impl Target {
    /// Shorthand for a CSS target
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Locator(Selector::css(selector))
    }

    /// Shorthand for an XPath target
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::Locator(Selector::xpath(expr))
    }

    /// Shorthand for an id target
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Locator(Selector::id(id))
    }

    /// The `index`-th match of `selector`, counting from zero
    #[must_use]
    pub const fn nth(selector: Selector, index: usize) -> Self {
        Self::Nth { selector, index }
    }

    /// Human-readable description for logs and errors
    #[must_use]
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locator(selector) => selector.fmt(f),
            Self::Handle(handle) => handle.fmt(f),
            Self::Nth { selector, index } => write!(f, "{selector} >> nth={index}"),
        }
    }
}

impl From<Selector> for Target {
    fn from(selector: Selector) -> Self {
        Self::Locator(selector)
    }
}

impl From<ElementHandle> for Target {
    fn from(handle: ElementHandle) -> Self {
        Self::Handle(handle)
    }
}

/// Elements a target resolved to on one tick, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    elements: Vec<ElementHandle>,
}

impl Resolution {
    /// Wrap resolved elements
    #[must_use]
    pub fn new(elements: Vec<ElementHandle>) -> Self {
        Self { elements }
    }

    /// First element, if any
    #[must_use]
    pub fn first(&self) -> Option<&ElementHandle> {
        self.elements.first()
    }

    /// Keep only the `index`-th element; empty when out of range
    #[must_use]
    pub fn nth(self, index: usize) -> Self {
        Self {
            elements: self.elements.into_iter().nth(index).into_iter().collect(),
        }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the elements
    pub fn iter(&self) -> std::slice::Iter<'_, ElementHandle> {
        self.elements.iter()
    }

    /// Borrow as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[ElementHandle] {
        &self.elements
    }

    /// Take ownership of the elements
    #[must_use]
    pub fn into_vec(self) -> Vec<ElementHandle> {
        self.elements
    }
}

impl From<Vec<ElementHandle>> for Resolution {
    fn from(elements: Vec<ElementHandle>) -> Self {
        Self::new(elements)
    }
}

impl<'a> IntoIterator for &'a Resolution {
    type Item = &'a ElementHandle;
    type IntoIter = std::slice::Iter<'a, ElementHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
