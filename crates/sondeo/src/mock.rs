//! Scripted in-memory page driver for testing without a browser.
//!
//! [`MockDriver`] implements [`PageDriver`] over a flat map of selector
//! keys to element nodes. It records every probe and input action, can
//! inject resolution failures and navigation failures, and can reveal
//! additional elements only after a search submission, which is enough to
//! exercise the locator fallback order, the facade retry loop, and whole
//! scenarios end to end.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::{SondeoError, SondeoResult};

/// A scripted element node
#[derive(Debug, Clone, Default)]
pub struct MockNode {
    text: Option<String>,
    hidden: bool,
    children: HashMap<String, Vec<MockNode>>,
}

impl MockNode {
    /// Create an empty node
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with the given text content
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Mark the node as not visible
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Attach a child reachable by a scoped query for `selector`
    #[must_use]
    pub fn with_child(mut self, selector: impl Into<String>, child: Self) -> Self {
        self.children.entry(selector.into()).or_default().push(child);
        self
    }

    /// Attach several children under one scoped selector
    #[must_use]
    pub fn with_children(mut self, selector: impl Into<String>, children: Vec<Self>) -> Self {
        self.children.entry(selector.into()).or_default().extend(children);
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    dom: HashMap<String, Vec<MockNode>>,
    revealed_on_submit: HashMap<String, Vec<MockNode>>,
    failing: HashSet<String>,
    title: String,
    goto_failures: usize,
    goto_hangs: bool,
    goto_log: Vec<String>,
    fill_log: Vec<String>,
    probe_log: Vec<String>,
    clicks: usize,
    submits: usize,
}

/// In-memory [`PageDriver`] with scripted contents and failure injection
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create an empty driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single element reachable by `selector`
    pub fn add(&self, selector: impl Into<String>, node: MockNode) {
        self.add_many(selector, vec![node]);
    }

    /// Add several elements reachable by `selector`, in document order
    pub fn add_many(&self, selector: impl Into<String>, nodes: Vec<MockNode>) {
        let mut state = self.state.lock().unwrap();
        state.dom.entry(selector.into()).or_default().extend(nodes);
    }

    /// Make resolution of `selector` fail with a driver error
    pub fn fail_on(&self, selector: impl Into<String>) {
        self.state.lock().unwrap().failing.insert(selector.into());
    }

    /// Make the next `count` navigations fail
    pub fn fail_goto_times(&self, count: usize) {
        self.state.lock().unwrap().goto_failures = count;
    }

    /// Make every navigation hang forever (callers must bound the wait)
    pub fn hang_goto(&self) {
        self.state.lock().unwrap().goto_hangs = true;
    }

    /// Script the document title
    pub fn set_title(&self, title: impl Into<String>) {
        self.state.lock().unwrap().title = title.into();
    }

    /// Script elements that appear only after a search submission
    /// (Enter press or click), simulating a results page render
    pub fn reveal_on_submit(&self, selector: impl Into<String>, nodes: Vec<MockNode>) {
        let mut state = self.state.lock().unwrap();
        state
            .revealed_on_submit
            .entry(selector.into())
            .or_default()
            .extend(nodes);
    }

    /// Whether any probe for `selector` was ever attempted
    #[must_use]
    pub fn was_probed(&self, selector: &str) -> bool {
        self.probe_count(selector) > 0
    }

    /// Number of probes attempted for `selector`
    #[must_use]
    pub fn probe_count(&self, selector: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .probe_log
            .iter()
            .filter(|probed| probed.as_str() == selector)
            .count()
    }

    /// URLs navigated to, including failed attempts
    #[must_use]
    pub fn goto_log(&self) -> Vec<String> {
        self.state.lock().unwrap().goto_log.clone()
    }

    /// Values filled into inputs, in order
    #[must_use]
    pub fn fill_log(&self) -> Vec<String> {
        self.state.lock().unwrap().fill_log.clone()
    }

    /// Number of clicks dispatched
    #[must_use]
    pub fn click_count(&self) -> usize {
        self.state.lock().unwrap().clicks
    }

    /// Number of search submissions (clicks plus Enter presses)
    #[must_use]
    pub fn submit_count(&self) -> usize {
        self.state.lock().unwrap().submits
    }

    fn primary_key(selector: &Selector) -> String {
        match selector {
            Selector::Css(s) | Selector::XPath(s) => s.clone(),
            Selector::CssWithText { css, .. } => css.clone(),
            Selector::Text(t) => t.clone(),
        }
    }

    fn lookup_in(map: &HashMap<String, Vec<MockNode>>, selector: &Selector) -> Vec<MockNode> {
        match selector {
            Selector::Css(s) | Selector::XPath(s) => map.get(s).cloned().unwrap_or_default(),
            Selector::CssWithText { css, text } => map
                .get(css)
                .map(|nodes| {
                    nodes
                        .iter()
                        .filter(|n| n.text.as_deref().is_some_and(|t| t.contains(text.as_str())))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            Selector::Text(text) => map
                .values()
                .flatten()
                .filter(|n| n.text.as_deref().is_some_and(|t| t.contains(text.as_str())))
                .cloned()
                .collect(),
        }
    }

    fn resolve_nodes(
        &self,
        scope: Option<&MockNode>,
        selector: &Selector,
    ) -> SondeoResult<Vec<MockNode>> {
        let mut state = self.state.lock().unwrap();
        let key = Self::primary_key(selector);
        state.probe_log.push(key.clone());
        if state.failing.contains(&key) {
            return Err(SondeoError::Page {
                message: format!("injected probe failure for '{key}'"),
            });
        }
        Ok(match scope {
            Some(node) => Self::lookup_in(&node.children, selector),
            None => Self::lookup_in(&state.dom, selector),
        })
    }

    fn apply_submission(state: &mut MockState) {
        state.submits += 1;
        let revealed = std::mem::take(&mut state.revealed_on_submit);
        for (selector, nodes) in revealed {
            state.dom.entry(selector).or_default().extend(nodes);
        }
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    type Handle = MockNode;

    async fn goto(&self, url: &str) -> SondeoResult<()> {
        let hangs = {
            let mut state = self.state.lock().unwrap();
            state.goto_log.push(url.to_owned());
            if state.goto_failures > 0 {
                state.goto_failures -= 1;
                return Err(SondeoError::Page {
                    message: format!("connection reset during navigation to {url}"),
                });
            }
            state.goto_hangs
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn title(&self) -> SondeoResult<String> {
        Ok(self.state.lock().unwrap().title.clone())
    }

    async fn resolve(
        &self,
        scope: Option<&MockNode>,
        selector: &Selector,
    ) -> SondeoResult<Option<MockNode>> {
        Ok(self.resolve_nodes(scope, selector)?.into_iter().next())
    }

    async fn resolve_all(
        &self,
        scope: Option<&MockNode>,
        selector: &Selector,
    ) -> SondeoResult<Vec<MockNode>> {
        self.resolve_nodes(scope, selector)
    }

    async fn is_visible(&self, handle: &MockNode) -> SondeoResult<bool> {
        Ok(!handle.hidden)
    }

    async fn text(&self, handle: &MockNode) -> SondeoResult<Option<String>> {
        Ok(handle.text.clone())
    }

    async fn fill(&self, _handle: &MockNode, value: &str) -> SondeoResult<()> {
        self.state.lock().unwrap().fill_log.push(value.to_owned());
        Ok(())
    }

    async fn click(&self, _handle: &MockNode) -> SondeoResult<()> {
        let mut state = self.state.lock().unwrap();
        state.clicks += 1;
        Self::apply_submission(&mut state);
        Ok(())
    }

    async fn press_enter(&self, _handle: &MockNode) -> SondeoResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::apply_submission(&mut state);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revealed_elements_appear_only_after_submission() {
        let driver = MockDriver::new();
        let input = MockNode::with_text("");
        driver.add("#search", input.clone());
        driver.reveal_on_submit(".result", vec![MockNode::with_text("hit")]);

        let before = driver.resolve(None, &Selector::css(".result")).await.unwrap();
        assert!(before.is_none());

        driver.press_enter(&input).await.unwrap();

        let after = driver.resolve(None, &Selector::css(".result")).await.unwrap();
        assert_eq!(after.unwrap().text, Some("hit".to_owned()));
    }

    #[tokio::test]
    async fn test_goto_failure_injection_is_consumed() {
        let driver = MockDriver::new();
        driver.fail_goto_times(1);
        assert!(driver.goto("https://example.com").await.is_err());
        assert!(driver.goto("https://example.com").await.is_ok());
        assert_eq!(driver.goto_log().len(), 2);
    }

    #[tokio::test]
    async fn test_text_filter_matches_content() {
        let driver = MockDriver::new();
        driver.add_many(
            "h2",
            vec![MockNode::with_text("iPhone 15"), MockNode::with_text("case")],
        );
        let sel = Selector::css("h2").with_text("iPhone");
        let found = driver.resolve(None, &sel).await.unwrap().unwrap();
        assert_eq!(found.text, Some("iPhone 15".to_owned()));
    }
}
