//! Example: Price Check
//!
//! Searches for a single product, prints the first result's snapshot,
//! and asserts its price against a ceiling.
//!
//! Run with: `cargo run --example price_check --features browser -- "MacBook Air" 100000`

use sondeo::{
    price_below, Browser, HarnessConfig, ScenarioOutcome, SearchPage, SondeoError, SondeoResult,
};

#[tokio::main]
async fn main() -> SondeoResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sondeo=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let term = args.next().unwrap_or_else(|| "MacBook Air".to_owned());
    let ceiling: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(100_000);

    let config = HarnessConfig::default();
    let browser = Browser::launch(config.clone()).await?;
    let page = SearchPage::from_config(browser.new_page().await?, &config);

    page.open("https://www.amazon.in").await?;
    page.search(&term).await?;

    match page.first_product().await {
        Some(product) => {
            println!("first result: {product:?}");
            let outcome =
                ScenarioOutcome::classify(price_below(product.price, ceiling).into_result());
            println!("price check for '{term}' below {ceiling}: {outcome:?}");
        }
        None => {
            return Err(SondeoError::Assertion {
                message: format!("no product snapshot captured for '{term}'"),
            });
        }
    }

    browser.close().await
}
