//! The page driver seam.
//!
//! Everything the harness needs from a browser runtime is collected into
//! one trait: navigation, scoped DOM query, visibility checks, text
//! extraction, and input simulation. The facade and the resilient locator
//! are written against this trait only, so scenarios run unchanged over
//! the real CDP backend (`browser` feature) or the scripted
//! [`MockDriver`](crate::mock::MockDriver).

use async_trait::async_trait;

use crate::locator::Selector;
use crate::result::SondeoResult;

/// The external browser-automation collaborator.
///
/// `Handle` is an opaque reference to a located element. Handles may be
/// re-resolved lazily by the backend; callers must not assume they stay
/// valid across navigations.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Opaque element handle produced by queries
    type Handle: Clone + Send + Sync;

    /// Navigate the page to `url` and wait for the load to settle
    async fn goto(&self, url: &str) -> SondeoResult<()>;

    /// Current document title, empty if the page has none
    async fn title(&self) -> SondeoResult<String>;

    /// Resolve `selector` to the first matching element, scoped to
    /// `scope` when given (otherwise the whole document). `Ok(None)`
    /// means zero matches; `Err` means the probe itself failed.
    async fn resolve(
        &self,
        scope: Option<&Self::Handle>,
        selector: &Selector,
    ) -> SondeoResult<Option<Self::Handle>>;

    /// Resolve `selector` to all matching elements in document order
    async fn resolve_all(
        &self,
        scope: Option<&Self::Handle>,
        selector: &Selector,
    ) -> SondeoResult<Vec<Self::Handle>>;

    /// Whether the element is currently rendered and visible
    async fn is_visible(&self, handle: &Self::Handle) -> SondeoResult<bool>;

    /// Text content of the element, `None` if the element is gone
    async fn text(&self, handle: &Self::Handle) -> SondeoResult<Option<String>>;

    /// Replace the element's value with `value` (clears first)
    async fn fill(&self, handle: &Self::Handle, value: &str) -> SondeoResult<()>;

    /// Click the element
    async fn click(&self, handle: &Self::Handle) -> SondeoResult<()>;

    /// Press Enter with the element focused (submits its form if any)
    async fn press_enter(&self, handle: &Self::Handle) -> SondeoResult<()>;
}
