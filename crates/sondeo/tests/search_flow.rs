//! End-to-end scenario flows over the public API with a scripted driver.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use sondeo::{
    catalog, run_product_check, run_rating_check, run_result_count_check, MockDriver, MockNode,
    PageTiming, ProductExpectation, RunReport, ScenarioOutcome, SearchPage,
};

const READY: &str = "#twotabsearchtextbox";
const SEARCH_BOX: &str = "input#twotabsearchtextbox";
const RESULT: &str = "[data-component-type=\"s-search-result\"]";
const TITLES: &str = "[data-component-type=\"s-search-result\"] h2 span";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sondeo=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

struct Listing {
    title: String,
    price: Option<String>,
    rating: Option<String>,
}

impl Listing {
    fn new(title: &str, price: Option<&str>, rating: Option<&str>) -> Self {
        Self {
            title: title.to_owned(),
            price: price.map(str::to_owned),
            rating: rating.map(str::to_owned),
        }
    }
}

fn storefront(listings: &[Listing]) -> SearchPage<MockDriver> {
    let driver = MockDriver::new();
    driver.add(READY, MockNode::new());
    driver.add(SEARCH_BOX, MockNode::new());
    let mut containers = Vec::new();
    let mut titles = Vec::new();
    for listing in listings {
        let mut node = MockNode::with_text("result")
            .with_child("h2 span", MockNode::with_text(listing.title.as_str()));
        if let Some(ref price) = listing.price {
            node = node.with_child(".a-price .a-offscreen", MockNode::with_text(price.as_str()));
        }
        if let Some(ref rating) = listing.rating {
            node = node.with_child(
                ".a-icon-star-small span.a-icon-alt",
                MockNode::with_text(rating.as_str()),
            );
        }
        containers.push(node);
        titles.push(MockNode::with_text(listing.title.as_str()));
    }
    driver.reveal_on_submit(RESULT, containers);
    driver.reveal_on_submit(TITLES, titles);
    SearchPage::new(driver).with_timing(PageTiming::fast())
}

#[tokio::test]
async fn catalog_run_aggregates_mixed_outcomes() {
    init_tracing();

    let mut report = RunReport::new();
    for (index, expectation) in catalog().into_iter().enumerate() {
        // First listing is relevant and priced just under the ceiling,
        // except the third product, which comes back overpriced.
        let price_text = if index == 2 {
            format!("₹{}", expectation.max_price + 1)
        } else {
            format!("₹{}", expectation.max_price - 1)
        };
        let listing = Listing::new(
            &format!("{} (2024 model)", expectation.term),
            Some(&price_text),
            Some("4.5 out of 5 stars"),
        );
        let page = storefront(&[listing]);
        page.open("https://www.amazon.in").await.unwrap();
        let outcome = ScenarioOutcome::classify(run_product_check(&page, &expectation).await);
        report.record(&expectation.term, &outcome, Duration::from_millis(1));
    }

    assert_eq!(report.records().len(), 5);
    assert_eq!(report.passed(), 4);
    assert_eq!(report.violations(), 1);
    assert_eq!(report.infrastructure_failures(), 0);

    let text = report.render_text();
    assert!(text.contains("4 passed, 1 violation(s), 0 infrastructure failure(s)"));
}

#[tokio::test]
async fn irrelevant_results_are_a_violation_not_an_error() {
    init_tracing();
    let page = storefront(&[Listing::new("Laptop cooling pad", Some("₹1,499"), None)]);
    page.open("https://www.amazon.in").await.unwrap();

    let expectation = ProductExpectation::new("MacBook Air", 100_000, &["macbook", "air"]);
    match ScenarioOutcome::classify(run_product_check(&page, &expectation).await) {
        ScenarioOutcome::Violation(message) => assert!(message.contains("keywords")),
        other => panic!("expected Violation, got {other:?}"),
    }
}

#[tokio::test]
async fn vanished_results_container_is_infrastructure() {
    init_tracing();
    // Ready page, but nothing ever renders after submit.
    let driver = MockDriver::new();
    driver.add(READY, MockNode::new());
    driver.add(SEARCH_BOX, MockNode::new());
    let page = SearchPage::new(driver).with_timing(PageTiming::fast());
    page.open("https://www.amazon.in").await.unwrap();

    let expectation = ProductExpectation::new("AirPods", 20_000, &["airpods"]);
    match ScenarioOutcome::classify(run_product_check(&page, &expectation).await) {
        ScenarioOutcome::Infrastructure(err) => assert!(err.is_infrastructure()),
        other => panic!("expected Infrastructure, got {other:?}"),
    }
}

#[tokio::test]
async fn result_count_and_rating_scenarios() {
    init_tracing();
    let listings = vec![
        Listing::new("HP Pavilion 15", Some("₹62,990"), Some("4.2 out of 5 stars")),
        Listing::new("Lenovo IdeaPad Slim 3", Some("₹38,990"), None),
        Listing::new("ASUS VivoBook 16", Some("₹45,990"), None),
        Listing::new("Dell Inspiron 14", Some("₹54,490"), None),
        Listing::new("Acer Aspire 5", Some("₹41,990"), None),
    ];
    let page = storefront(&listings);
    page.open("https://www.amazon.in").await.unwrap();
    run_result_count_check(&page, "laptop", 5).await.unwrap();

    let page = storefront(&listings);
    page.open("https://www.amazon.in").await.unwrap();
    run_rating_check(&page, "laptop").await.unwrap();
}
