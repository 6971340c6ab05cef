//! Search page facade.
//!
//! [`SearchPage`] translates test intents (open, search, read titles,
//! price, rating) into resilient locator calls over an explicitly owned
//! driver session. One page drives one scenario at a time; scenarios
//! running in parallel each own their own instance.
//!
//! Selector-level lookups degrade to empty/`None` rather than
//! propagating; only navigation exhaustion and a missing results
//! container surface as errors.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::driver::PageDriver;
use crate::locator::{locate, locate_all, Candidates, LocatorOptions};
use crate::product::{parse_price, ProductSnapshot};
use crate::result::{SondeoError, SondeoResult};

/// Candidate selector table for a retail search page.
///
/// Defaults target the Amazon storefront markup this harness was built
/// against; override any list for other storefronts.
#[derive(Debug, Clone)]
pub struct SearchSelectors {
    /// Element whose presence means the page is ready for interaction
    pub ready_marker: Candidates,
    /// Overlay/consent dismiss buttons, each probed best-effort
    pub overlays: Vec<Candidates>,
    /// The search input field
    pub search_box: Candidates,
    /// The search submit button (falls back to pressing Enter)
    pub search_submit: Candidates,
    /// A rendered search result container
    pub results_container: Candidates,
    /// Result title elements, page-wide
    pub titles: Candidates,
    /// Title element scoped to a single result container
    pub title_in_result: Candidates,
    /// Price element scoped to a single result container
    pub price_in_result: Candidates,
    /// Rating element scoped to a single result container
    pub rating_in_result: Candidates,
}

impl Default for SearchSelectors {
    fn default() -> Self {
        Self {
            ready_marker: Candidates::css(["#twotabsearchtextbox", "#nav-search-submit-button"]),
            overlays: vec![
                Candidates::css(["#sp-cc-accept"]),
                Candidates::css([".a-button-close"]),
            ],
            search_box: Candidates::css([
                "input#twotabsearchtextbox",
                "input[name='field-keywords']",
            ]),
            search_submit: Candidates::css([
                "input#nav-search-submit-button",
                ".nav-search-submit input[type='submit']",
            ]),
            results_container: Candidates::css([
                "[data-component-type=\"s-search-result\"]",
                ".s-result-item",
                ".sg-col-4-of-24",
            ]),
            titles: Candidates::css([
                "[data-component-type=\"s-search-result\"] h2 span",
                ".a-size-medium.a-color-base.a-text-normal",
                ".a-size-base-plus.a-color-base.a-text-normal",
            ]),
            title_in_result: Candidates::css(["h2 span", "h2", ".a-size-medium"]),
            price_in_result: Candidates::css([
                ".a-price .a-offscreen",
                ".a-price-whole",
                "[data-a-color=\"price\"] .a-offscreen",
            ]),
            rating_in_result: Candidates::css([
                ".a-icon-star-small span.a-icon-alt",
                ".a-icon-star span.a-icon-alt",
                ".a-icon-alt",
            ]),
        }
    }
}

/// Wait budgets and retry policy for one page session
#[derive(Debug, Clone)]
pub struct PageTiming {
    /// Options for required lookups (ready marker, search box, results)
    pub locator: LocatorOptions,
    /// Short-budget options for best-effort overlay probes
    pub overlay: LocatorOptions,
    /// Upper bound on a single navigation attempt
    pub nav_timeout: Duration,
    /// Navigation attempts before giving up
    pub retry_limit: u32,
    /// Fixed delay between navigation attempts
    pub retry_backoff: Duration,
}

impl Default for PageTiming {
    fn default() -> Self {
        Self::from_config(&HarnessConfig::default())
    }
}

impl PageTiming {
    /// Derive timing from a harness config
    #[must_use]
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            locator: config.locator_options(),
            overlay: config.overlay_options(),
            nav_timeout: config.nav_timeout(),
            retry_limit: config.retry_limit,
            retry_backoff: config.retry_backoff(),
        }
    }

    /// Single-shot budgets with no backoff, for tests and smoke probes
    #[must_use]
    pub fn fast() -> Self {
        Self {
            locator: LocatorOptions::immediate(),
            overlay: LocatorOptions::immediate(),
            nav_timeout: Duration::from_secs(5),
            retry_limit: 3,
            retry_backoff: Duration::ZERO,
        }
    }
}

/// Thin interaction facade over one exclusively owned page session
#[derive(Debug)]
pub struct SearchPage<D: PageDriver> {
    driver: D,
    selectors: SearchSelectors,
    timing: PageTiming,
}

impl<D: PageDriver> SearchPage<D> {
    /// Create a facade over `driver` with default selectors and timing
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            selectors: SearchSelectors::default(),
            timing: PageTiming::default(),
        }
    }

    /// Create a facade with timing derived from `config`
    #[must_use]
    pub fn from_config(driver: D, config: &HarnessConfig) -> Self {
        Self::new(driver).with_timing(PageTiming::from_config(config))
    }

    /// Replace the selector table
    #[must_use]
    pub fn with_selectors(mut self, selectors: SearchSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Replace the timing policy
    #[must_use]
    pub fn with_timing(mut self, timing: PageTiming) -> Self {
        self.timing = timing;
        self
    }

    /// The underlying driver session
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Load `url` and wait for the ready marker, retrying up to the
    /// configured limit with a fixed backoff between attempts.
    /// Overlay dismissal is opportunistic and never fails the call.
    pub async fn open(&self, url: &str) -> SondeoResult<()> {
        let attempts = self.timing.retry_limit.max(1);
        let mut last_failure = String::from("ready marker never appeared");
        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.timing.retry_backoff).await;
            }
            let nav = tokio::time::timeout(self.timing.nav_timeout, self.driver.goto(url)).await;
            match nav {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(url, attempt, error = %err, "navigation attempt failed");
                    last_failure = err.to_string();
                    continue;
                }
                Err(_) => {
                    let err = SondeoError::Timeout {
                        ms: u64::try_from(self.timing.nav_timeout.as_millis())
                            .unwrap_or(u64::MAX),
                    };
                    warn!(url, attempt, error = %err, "navigation attempt timed out");
                    last_failure = err.to_string();
                    continue;
                }
            }
            if let Some(marker) = locate(
                &self.driver,
                None,
                &self.selectors.ready_marker,
                &self.timing.locator,
            )
            .await
            {
                info!(url, attempt, marker = %marker.selector, "page ready");
                self.dismiss_overlays().await;
                return Ok(());
            }
            warn!(url, attempt, "ready marker not found, retrying");
            last_failure = String::from("ready marker never appeared");
        }
        Err(SondeoError::Navigation {
            url: url.to_owned(),
            attempts,
            message: last_failure,
        })
    }

    /// Fire-and-forget dismissal of known consent/overlay dialogs.
    /// Absence of a dialog is the common case and never an error.
    pub async fn dismiss_overlays(&self) {
        for overlay in &self.selectors.overlays {
            if let Some(found) = locate(&self.driver, None, overlay, &self.timing.overlay).await {
                match self.driver.click(&found.handle).await {
                    Ok(()) => debug!(overlay = %found.selector, "dismissed overlay"),
                    Err(err) => debug!(overlay = %found.selector, error = %err, "overlay dismissal failed"),
                }
            }
        }
    }

    /// Current document title, empty if the page has none
    pub async fn title(&self) -> SondeoResult<String> {
        self.driver.title().await
    }

    /// Fill the search field with `term`, submit, and confirm that a
    /// results container appeared
    pub async fn search(&self, term: &str) -> SondeoResult<()> {
        let search_box = locate(
            &self.driver,
            None,
            &self.selectors.search_box,
            &self.timing.locator,
        )
        .await
        .ok_or_else(|| SondeoError::Page {
            message: String::from("search box not found"),
        })?;

        self.driver.fill(&search_box.handle, term).await?;

        // Prefer the submit button; fall back to pressing Enter when the
        // markup variant has none.
        if let Some(submit) = locate(
            &self.driver,
            None,
            &self.selectors.search_submit,
            &self.timing.overlay,
        )
        .await
        {
            self.driver.click(&submit.handle).await?;
        } else {
            self.driver.press_enter(&search_box.handle).await?;
        }

        let confirmed = locate(
            &self.driver,
            None,
            &self.selectors.results_container,
            &self.timing.locator,
        )
        .await;
        match confirmed {
            Some(container) => {
                info!(term, container = %container.selector, "search results confirmed");
                Ok(())
            }
            None => Err(SondeoError::ResultsNotFound {
                term: term.to_owned(),
                waited_ms: self
                    .timing
                    .locator
                    .total_budget_ms(&self.selectors.results_container),
            }),
        }
    }

    /// Collect up to `max` result titles in document order. Empty text
    /// is skipped; nothing matching yields an empty vec, never an error.
    pub async fn collect_titles(&self, max: usize) -> Vec<String> {
        let handles = locate_all(
            &self.driver,
            None,
            &self.selectors.titles,
            &self.timing.locator,
        )
        .await;
        let mut titles = Vec::new();
        for handle in &handles {
            if titles.len() == max {
                break;
            }
            if let Ok(Some(text)) = self.driver.text(handle).await {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    titles.push(trimmed.to_owned());
                }
            }
        }
        debug!(collected = titles.len(), available = handles.len(), "collected titles");
        titles
    }

    /// Price of the first result in the smallest currency unit.
    /// `None` when no result, no price selector, or no digits matched.
    pub async fn first_price(&self) -> Option<u64> {
        let container = self.first_result().await?;
        self.price_in(&container).await
    }

    /// Raw rating text of the first result, if present
    pub async fn first_rating(&self) -> Option<String> {
        let container = self.first_result().await?;
        self.rating_in(&container).await
    }

    /// Title, price, and rating of the first result in one capture.
    /// `None` when no result container or no title resolved.
    ///
    /// The container is resolved once and every field is read from that
    /// same handle, so a re-rendering results list cannot mix fields
    /// from different results.
    pub async fn first_product(&self) -> Option<ProductSnapshot> {
        let container = self.first_result().await?;
        let title = locate(
            &self.driver,
            Some(&container),
            &self.selectors.title_in_result,
            &self.timing.locator,
        )
        .await?;
        let title = self.driver.text(&title.handle).await.ok().flatten()?;
        Some(ProductSnapshot {
            title: title.trim().to_owned(),
            price: self.price_in(&container).await,
            rating: self.rating_in(&container).await,
        })
    }

    async fn price_in(&self, container: &D::Handle) -> Option<u64> {
        let price = locate(
            &self.driver,
            Some(container),
            &self.selectors.price_in_result,
            &self.timing.locator,
        )
        .await?;
        let text = self.driver.text(&price.handle).await.ok().flatten()?;
        parse_price(&text)
    }

    async fn rating_in(&self, container: &D::Handle) -> Option<String> {
        let rating = locate(
            &self.driver,
            Some(container),
            &self.selectors.rating_in_result,
            &self.timing.locator,
        )
        .await?;
        let text = self.driver.text(&rating.handle).await.ok().flatten()?;
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }

    async fn first_result(&self) -> Option<D::Handle> {
        locate(
            &self.driver,
            None,
            &self.selectors.results_container,
            &self.timing.locator,
        )
        .await
        .map(|found| found.handle)
    }
}
