//! Resilient element location with ordered fallback candidates.
//!
//! Production pages change markup between renders; a single selector is a
//! single point of failure. A [`Candidates`] list declares every known way
//! of finding an element in priority order, and [`locate`] probes them one
//! by one, swallowing per-candidate failures, until one yields a usable
//! result. Exhausting the list is an expected outcome (`None`), not a
//! fault: callers decide whether the feature being absent matters.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::driver::PageDriver;

/// Default per-candidate wait (30 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Embed a Rust string into generated JavaScript as a quoted literal
pub(crate) fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

/// One way of locating an element, tried as part of an ordered fallback list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g. `[data-component-type="s-search-result"]`)
    Css(String),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text the element's content must include
        text: String,
    },
    /// Whole-subtree scan for an element containing the given text
    Text(String),
    /// XPath expression
    XPath(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text-content selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Filter this selector by text content (CSS selectors only; other
    /// variants already match on text)
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        match self {
            Self::Css(css) => Self::CssWithText {
                css,
                text: text.into(),
            },
            other => other,
        }
    }

    /// JavaScript expression resolving the first match under `root`
    /// (`document` or a previously resolved element expression)
    #[must_use]
    pub fn to_query_on(&self, root: &str) -> String {
        match self {
            Self::Css(s) => format!("{root}.querySelector({})", js_string(s)),
            Self::CssWithText { css, text } => format!(
                "Array.from({root}.querySelectorAll({})).find(el => el.textContent.includes({}))",
                js_string(css),
                js_string(text)
            ),
            Self::Text(t) => format!(
                "Array.from({root}.querySelectorAll('*')).find(el => el.textContent.includes({}))",
                js_string(t)
            ),
            Self::XPath(x) => format!(
                "document.evaluate({}, {root}, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(x)
            ),
        }
    }

    /// JavaScript expression resolving all matches under `root` as an
    /// array, in document order
    #[must_use]
    pub fn to_query_all_on(&self, root: &str) -> String {
        match self {
            Self::Css(s) => format!("Array.from({root}.querySelectorAll({}))", js_string(s)),
            Self::CssWithText { css, text } => format!(
                "Array.from({root}.querySelectorAll({})).filter(el => el.textContent.includes({}))",
                js_string(css),
                js_string(text)
            ),
            Self::Text(t) => format!(
                "Array.from({root}.querySelectorAll('*')).filter(el => el.textContent.includes({}))",
                js_string(t)
            ),
            Self::XPath(x) => format!(
                "(function() {{ const r = document.evaluate({}, {root}, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); return out; }})()",
                js_string(x)
            ),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::CssWithText { css, text } => write!(f, "css={css} text={text}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::XPath(x) => write!(f, "xpath={x}"),
        }
    }
}

/// A non-empty ordered list of selector candidates, first-match-wins.
///
/// Evaluation stops at the first success, so declared order is the only
/// ranking. Emptiness is a caller programming error, rejected at
/// construction rather than surfacing later as a spurious "not found".
#[derive(Debug, Clone)]
pub struct Candidates(Vec<Selector>);

impl Candidates {
    /// Create a candidate list from selectors in priority order.
    ///
    /// # Panics
    ///
    /// Panics if `selectors` is empty.
    #[must_use]
    pub fn new<I: IntoIterator<Item = Selector>>(selectors: I) -> Self {
        let list: Vec<Selector> = selectors.into_iter().collect();
        assert!(
            !list.is_empty(),
            "candidate list must not be empty: declare at least one selector"
        );
        Self(list)
    }

    /// Create a single-candidate list
    #[must_use]
    pub fn single(selector: Selector) -> Self {
        Self(vec![selector])
    }

    /// Create a candidate list of CSS selectors in priority order.
    ///
    /// # Panics
    ///
    /// Panics if `selectors` is empty.
    #[must_use]
    pub fn css<I>(selectors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(selectors.into_iter().map(|s| Selector::Css(s.into())))
    }

    /// Append a lower-priority fallback
    #[must_use]
    pub fn or(mut self, selector: Selector) -> Self {
        self.0.push(selector);
        self
    }

    /// Iterate candidates in priority order
    pub fn iter(&self) -> std::slice::Iter<'_, Selector> {
        self.0.iter()
    }

    /// Number of candidates (always at least 1)
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API completeness
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Candidates {
    type Item = &'a Selector;
    type IntoIter = std::slice::Iter<'a, Selector>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Options controlling how each candidate is probed
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Wait budget per candidate (not aggregate across the list)
    pub timeout: Duration,
    /// Polling interval while waiting for a candidate
    pub poll_interval: Duration,
    /// Require the element to be visible, not merely attached
    pub require_visible: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            require_visible: true,
        }
    }
}

impl LocatorOptions {
    /// Set the per-candidate timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set whether the element must be visible
    #[must_use]
    pub const fn with_require_visible(mut self, required: bool) -> Self {
        self.require_visible = required;
        self
    }

    /// Single-shot probing: no waiting, no visibility requirement.
    /// Useful in tests and for best-effort lookups.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(10),
            require_visible: false,
        }
    }

    /// Total budget across an entire candidate list, in milliseconds
    #[must_use]
    pub fn total_budget_ms(&self, candidates: &Candidates) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX) * candidates.len() as u64
    }
}

/// A successfully resolved element plus the identity of the winning
/// candidate, useful for diagnostics
#[derive(Debug, Clone)]
pub struct Located<H> {
    /// The resolved element handle
    pub handle: H,
    /// Index of the winning candidate within the list
    pub winner: usize,
    /// The winning selector itself
    pub selector: Selector,
}

/// Probe `candidates` in declared order against `scope` (or the whole
/// page when `None`), returning the first usable match.
///
/// Each candidate gets its own `options.timeout` of polling. Resolution
/// errors and timeouts are transient probe failures: they are logged at
/// debug level and the next candidate is tried. `None` means every
/// candidate failed; treat it as "feature absent on this render", not as
/// a fault.
pub async fn locate<D: PageDriver>(
    driver: &D,
    scope: Option<&D::Handle>,
    candidates: &Candidates,
    options: &LocatorOptions,
) -> Option<Located<D::Handle>> {
    for (index, selector) in candidates.iter().enumerate() {
        let deadline = Instant::now() + options.timeout;
        loop {
            match driver.resolve(scope, selector).await {
                Ok(Some(handle)) => {
                    let usable = if options.require_visible {
                        driver.is_visible(&handle).await.unwrap_or(false)
                    } else {
                        true
                    };
                    if usable {
                        debug!(candidate = index, selector = %selector, "locator candidate resolved");
                        return Some(Located {
                            handle,
                            winner: index,
                            selector: selector.clone(),
                        });
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    // Transient probe failure: swallow and fall through
                    // to the next candidate.
                    debug!(candidate = index, selector = %selector, error = %err, "locator candidate errored");
                    break;
                }
            }
            if Instant::now() >= deadline {
                debug!(candidate = index, selector = %selector, "locator candidate timed out");
                break;
            }
            tokio::time::sleep(options.poll_interval).await;
        }
    }
    None
}

/// Probe `candidates` in declared order, returning all matches of the
/// first candidate that yields a non-empty set, in document order.
/// An empty vec means no candidate matched anything.
pub async fn locate_all<D: PageDriver>(
    driver: &D,
    scope: Option<&D::Handle>,
    candidates: &Candidates,
    options: &LocatorOptions,
) -> Vec<D::Handle> {
    for (index, selector) in candidates.iter().enumerate() {
        let deadline = Instant::now() + options.timeout;
        loop {
            match driver.resolve_all(scope, selector).await {
                Ok(handles) if !handles.is_empty() => {
                    debug!(candidate = index, selector = %selector, count = handles.len(), "locator candidate matched");
                    return handles;
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(candidate = index, selector = %selector, error = %err, "locator candidate errored");
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(options.poll_interval).await;
        }
    }
    Vec::new()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockNode};

    mod selector_queries {
        use super::*;

        #[test]
        fn test_css_query_scoped_to_document() {
            let sel = Selector::css("#twotabsearchtextbox");
            assert_eq!(
                sel.to_query_on("document"),
                "document.querySelector(\"#twotabsearchtextbox\")"
            );
        }

        #[test]
        fn test_css_query_scoped_to_element_expression() {
            let sel = Selector::css(".a-price-whole");
            let query = sel.to_query_on("(document.querySelector(\".s-result-item\"))");
            assert!(query.starts_with("(document.querySelector"));
            assert!(query.ends_with(".querySelector(\".a-price-whole\")"));
        }

        #[test]
        fn test_css_with_text_filters_on_content() {
            let sel = Selector::css("h2").with_text("MacBook");
            let query = sel.to_query_on("document");
            assert!(query.contains("querySelectorAll(\"h2\")"));
            assert!(query.contains("textContent.includes(\"MacBook\")"));
        }

        #[test]
        fn test_quotes_are_escaped() {
            let sel = Selector::css("[data-component-type=\"s-search-result\"]");
            let query = sel.to_query_on("document");
            assert!(query.contains("\\\"s-search-result\\\""));
        }

        #[test]
        fn test_query_all_preserves_document_order() {
            let sel = Selector::css("h2 span");
            assert_eq!(
                sel.to_query_all_on("document"),
                "Array.from(document.querySelectorAll(\"h2 span\"))"
            );
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("#x").to_string(), "css=#x");
            assert_eq!(Selector::text("Add to cart").to_string(), "text=Add to cart");
        }
    }

    mod candidates {
        use super::*;

        #[test]
        fn test_declared_order_is_preserved() {
            let candidates = Candidates::css(["a", "b"]).or(Selector::css("c"));
            let listed: Vec<String> = candidates.iter().map(ToString::to_string).collect();
            assert_eq!(listed, vec!["css=a", "css=b", "css=c"]);
        }

        #[test]
        #[should_panic(expected = "candidate list must not be empty")]
        fn test_empty_list_is_a_programming_error() {
            let _ = Candidates::new(Vec::new());
        }

        #[test]
        fn test_single() {
            let candidates = Candidates::single(Selector::css("#only"));
            assert_eq!(candidates.len(), 1);
            assert!(!candidates.is_empty());
        }
    }

    mod locate_fallback {
        use super::*;

        fn immediate() -> LocatorOptions {
            LocatorOptions::immediate()
        }

        #[tokio::test]
        async fn test_first_success_wins_and_later_candidates_are_never_probed() {
            let driver = MockDriver::new();
            driver.add("a", MockNode::with_text("from a"));
            driver.add("b", MockNode::with_text("from b"));

            let found = locate(&driver, None, &Candidates::css(["a", "b"]), &immediate())
                .await
                .unwrap();

            assert_eq!(found.winner, 0);
            assert_eq!(found.selector, Selector::css("a"));
            assert_eq!(driver.text(&found.handle).await.unwrap().unwrap(), "from a");
            assert!(!driver.was_probed("b"));
        }

        #[tokio::test]
        async fn test_falls_through_to_second_candidate() {
            let driver = MockDriver::new();
            driver.add("b", MockNode::with_text("fallback"));

            let found = locate(&driver, None, &Candidates::css(["a", "b"]), &immediate())
                .await
                .unwrap();

            assert_eq!(found.winner, 1);
            assert!(driver.was_probed("a"));
        }

        #[tokio::test]
        async fn test_all_candidates_failing_returns_none_without_raising() {
            let driver = MockDriver::new();
            let missing = locate(
                &driver,
                None,
                &Candidates::css(["a", "b", "c"]),
                &immediate(),
            )
            .await;
            assert!(missing.is_none());
        }

        #[tokio::test]
        async fn test_resolution_errors_are_swallowed() {
            let driver = MockDriver::new();
            driver.fail_on("a");
            driver.add("b", MockNode::with_text("survivor"));

            let found = locate(&driver, None, &Candidates::css(["a", "b"]), &immediate())
                .await
                .unwrap();
            assert_eq!(found.winner, 1);
        }

        #[tokio::test]
        async fn test_hidden_element_is_skipped_when_visibility_required() {
            let driver = MockDriver::new();
            driver.add("a", MockNode::with_text("hidden").hidden());
            driver.add("b", MockNode::with_text("shown"));

            let options = immediate().with_require_visible(true);
            let found = locate(&driver, None, &Candidates::css(["a", "b"]), &options)
                .await
                .unwrap();
            assert_eq!(found.winner, 1);
        }

        #[tokio::test]
        async fn test_scoped_lookup_searches_within_the_scope_only() {
            let driver = MockDriver::new();
            let container =
                MockNode::with_text("result").with_child(".price", MockNode::with_text("₹999"));
            driver.add(".result", container);
            driver.add(".price", MockNode::with_text("unscoped price"));

            let scope = locate(
                &driver,
                None,
                &Candidates::css([".result"]),
                &immediate(),
            )
            .await
            .unwrap();
            let price = locate(
                &driver,
                Some(&scope.handle),
                &Candidates::css([".price"]),
                &immediate(),
            )
            .await
            .unwrap();

            assert_eq!(driver.text(&price.handle).await.unwrap().unwrap(), "₹999");
        }
    }

    mod locate_all_fallback {
        use super::*;

        #[tokio::test]
        async fn test_first_non_empty_candidate_wins() {
            let driver = MockDriver::new();
            driver.add_many(
                "h2",
                vec![MockNode::with_text("one"), MockNode::with_text("two")],
            );

            let handles = locate_all(
                &driver,
                None,
                &Candidates::css([".missing", "h2"]),
                &LocatorOptions::immediate(),
            )
            .await;
            assert_eq!(handles.len(), 2);
        }

        #[tokio::test]
        async fn test_nothing_matching_yields_empty_vec() {
            let driver = MockDriver::new();
            let handles = locate_all(
                &driver,
                None,
                &Candidates::css(["x"]),
                &LocatorOptions::immediate(),
            )
            .await;
            assert!(handles.is_empty());
        }
    }
}
