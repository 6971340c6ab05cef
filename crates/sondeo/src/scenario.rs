//! Scripted search scenarios over a [`SearchPage`].
//!
//! Each scenario is a search intent plus the business rules asserted over
//! its results. Runners return `Ok(())` on a pass and classify every
//! failure as either a business-rule violation or an infrastructure
//! failure via [`ScenarioOutcome::classify`]; the distinction drives
//! separate tallies in the run report.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assertion::{any_keyword, min_results, price_below};
use crate::driver::PageDriver;
use crate::page::SearchPage;
use crate::result::{SondeoError, SondeoResult};

/// A product to search for plus its price ceiling and relevance keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductExpectation {
    /// Search term typed into the search box
    pub term: String,
    /// Strict upper bound on the first result's price
    pub max_price: u64,
    /// Keywords at least one title must contain (case-insensitive)
    pub keywords: Vec<String>,
}

impl ProductExpectation {
    /// Create an expectation
    #[must_use]
    pub fn new(term: impl Into<String>, max_price: u64, keywords: &[&str]) -> Self {
        Self {
            term: term.into(),
            max_price,
            keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
        }
    }
}

/// The stock catalog of product checks this harness ships with
#[must_use]
pub fn catalog() -> Vec<ProductExpectation> {
    vec![
        ProductExpectation::new("MacBook Air", 100_000, &["macbook", "air"]),
        ProductExpectation::new("iPhone 15", 80_000, &["iphone", "15"]),
        ProductExpectation::new("AirPods", 20_000, &["airpods"]),
        ProductExpectation::new("Samsung Galaxy S24", 90_000, &["samsung", "galaxy"]),
        ProductExpectation::new("Sony WH-1000XM5", 35_000, &["sony", "wh-1000xm5"]),
    ]
}

/// How a scenario run ended
#[derive(Debug)]
pub enum ScenarioOutcome {
    /// All assertions held
    Passed,
    /// A business rule was violated; the page behaved
    Violation(String),
    /// The environment failed before assertions could be judged
    Infrastructure(SondeoError),
}

impl ScenarioOutcome {
    /// Classify a runner result into pass, violation, or infrastructure
    #[must_use]
    pub fn classify(result: SondeoResult<()>) -> Self {
        match result {
            Ok(()) => Self::Passed,
            Err(SondeoError::Assertion { message }) => Self::Violation(message),
            Err(err) => Self::Infrastructure(err),
        }
    }

    /// Whether the scenario passed
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Search for the expected product, then assert that results exist, that
/// at least one title is relevant, and that the first price is under the
/// ceiling. Assumes the page is already open.
pub async fn run_product_check<D: PageDriver>(
    page: &SearchPage<D>,
    expectation: &ProductExpectation,
) -> SondeoResult<()> {
    info!(term = %expectation.term, "running product check");
    page.search(&expectation.term).await?;

    let titles = page.collect_titles(10).await;
    min_results(&titles, 1).into_result()?;
    any_keyword(&titles, &expectation.keywords).into_result()?;

    let price = page.first_price().await;
    price_below(price, expectation.max_price).into_result()?;
    info!(term = %expectation.term, ?price, "product check passed");
    Ok(())
}

/// Search for `term` and assert at least `min` results render
pub async fn run_result_count_check<D: PageDriver>(
    page: &SearchPage<D>,
    term: &str,
    min: usize,
) -> SondeoResult<()> {
    page.search(term).await?;
    let titles = page.collect_titles(min.max(10)).await;
    min_results(&titles, min).into_result()
}

/// Assert that the document title contains `expected`,
/// case-insensitively. Assumes the page is already open; a storefront
/// serving an interstitial (captcha, error page) fails here before any
/// search is attempted.
pub async fn run_title_check<D: PageDriver>(
    page: &SearchPage<D>,
    expected: &str,
) -> SondeoResult<()> {
    let title = page.title().await?;
    if title.to_lowercase().contains(&expected.to_lowercase()) {
        info!(title = %title, "title check passed");
        Ok(())
    } else {
        Err(SondeoError::Assertion {
            message: format!("page title '{title}' does not contain '{expected}'"),
        })
    }
}

/// Search for `term` and assert the first result exposes a rating
pub async fn run_rating_check<D: PageDriver>(
    page: &SearchPage<D>,
    term: &str,
) -> SondeoResult<()> {
    page.search(term).await?;
    match page.first_rating().await {
        Some(rating) => {
            info!(term, rating = %rating, "rating captured");
            Ok(())
        }
        None => Err(SondeoError::Assertion {
            message: format!("first result for '{term}' exposes no rating"),
        }),
    }
}
