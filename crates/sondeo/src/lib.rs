//! Sondeo: resilient browser checks for retail search pages.
//!
//! Sondeo (Spanish: "probe/survey") drives a real Chromium session over
//! the Chrome DevTools Protocol and runs scripted product searches
//! against a storefront, asserting business rules (relevance, price
//! ceilings, result counts) over what actually rendered.
//!
//! The pieces compose in three layers:
//!
//! ```text
//! ┌────────────┐    ┌─────────────┐    ┌──────────────┐
//! │ Scenario   │───►│ SearchPage  │───►│ PageDriver   │
//! │ (intents + │    │ (facade +   │    │ (CDP browser │
//! │ assertions)│    │  locators)  │    │  or mock)    │
//! └────────────┘    └─────────────┘    └──────────────┘
//! ```
//!
//! Markup drift is absorbed by ordered selector fallback ([`Candidates`]
//! and [`locate`]); environment flakiness is absorbed by navigation
//! retries and is reported separately from assertion violations.
//!
//! Real browser control requires the `browser` feature; without it the
//! crate still builds and every scenario can run against [`MockDriver`].

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertion;
#[cfg(feature = "browser")]
mod browser;
mod config;
mod driver;
mod locator;
pub mod mock;
mod page;
mod product;
mod reporter;
mod result;
mod scenario;

pub use assertion::{any_keyword, min_results, price_below, AssertionResult};
#[cfg(feature = "browser")]
pub use browser::{Browser, BrowserPage, NodeRef};
pub use config::{CapturePolicy, Engine, HarnessConfig, ReportFormat};
pub use driver::PageDriver;
pub use locator::{
    locate, locate_all, Candidates, Located, LocatorOptions, Selector, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_TIMEOUT_MS,
};
pub use mock::{MockDriver, MockNode};
pub use page::{PageTiming, SearchPage, SearchSelectors};
pub use product::{parse_price, ProductSnapshot, SearchQuery};
pub use reporter::{RunReport, ScenarioRecord, ScenarioStatus};
pub use result::{SondeoError, SondeoResult};
pub use scenario::{
    catalog, run_product_check, run_rating_check, run_result_count_check, run_title_check,
    ProductExpectation, ScenarioOutcome,
};
