//! Example: Product Search
//!
//! Runs the stock product catalog against a live storefront and prints
//! the run report.
//!
//! Run with: `cargo run --example product_search --features browser`
//!
//! Requires a local Chromium install; set `SONDEO_CONFIG` to point at a
//! JSON config file to override defaults (headless mode, timeouts, ...).

use std::time::Instant;

use sondeo::{
    catalog, run_product_check, run_title_check, Browser, CapturePolicy, HarnessConfig,
    RunReport, ScenarioOutcome, SearchPage, SondeoResult,
};

#[tokio::main]
async fn main() -> SondeoResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sondeo=info".into()),
        )
        .init();

    let config = match std::env::var("SONDEO_CONFIG") {
        Ok(path) => HarnessConfig::from_json_file(path)?,
        Err(_) => HarnessConfig::default(),
    };

    let browser = Browser::launch(config.clone()).await?;
    let mut report = RunReport::new();

    for expectation in catalog() {
        // Fresh page per scenario so state never leaks between checks.
        let page = SearchPage::from_config(browser.new_page().await?, &config);
        let started = Instant::now();
        let outcome = match page.open("https://www.amazon.in").await {
            Ok(()) => {
                let checked = match run_title_check(&page, "Amazon").await {
                    Ok(()) => run_product_check(&page, &expectation).await,
                    Err(err) => Err(err),
                };
                ScenarioOutcome::classify(checked)
            }
            Err(err) => ScenarioOutcome::Infrastructure(err),
        };

        let capture = match config.capture {
            CapturePolicy::Always => true,
            CapturePolicy::OnFailure => !outcome.is_pass(),
            CapturePolicy::Off => false,
        };
        if capture {
            let png = page.driver().screenshot().await?;
            let file = format!("{}.png", expectation.term.replace(' ', "_"));
            std::fs::write(&file, png)?;
            eprintln!("captured {file}");
        }

        report.record(&expectation.term, &outcome, started.elapsed());
    }

    browser.close().await?;
    print!("{}", report.render(config.report_format)?);
    Ok(())
}
