//! Point-in-time product data captured from a results page.

use serde::{Deserialize, Serialize};

/// Read-only record of the first matching product, captured at a point
/// in time and discarded at assertion time. Missing price or rating means
/// the page render did not expose them, never that capture crashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product title text
    pub title: String,
    /// Price in the smallest currency unit, if a price selector matched
    pub price: Option<u64>,
    /// Raw rating text (e.g. "4.5 out of 5 stars"), if present
    pub rating: Option<String>,
}

/// A search intent plus the expectations asserted over its results.
/// Assertion input only; nothing here is stored state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text search term
    pub term: String,
    /// Maximum number of result titles to collect
    pub max_results: usize,
    /// Keywords used for relevance assertion (case-insensitive)
    pub keywords: Vec<String>,
}

impl SearchQuery {
    /// Create a query with expectations
    #[must_use]
    pub fn new(term: impl Into<String>, max_results: usize, keywords: &[&str]) -> Self {
        Self {
            term: term.into(),
            max_results,
            keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
        }
    }
}

/// Parse a locale-formatted price string into the smallest currency unit
/// by stripping every non-digit character. `"₹1,19,900"` parses to
/// `119900`; text without digits yields `None`. Never panics.
#[must_use]
pub fn parse_price(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parse_price {
        use super::*;

        #[test]
        fn test_indian_grouping_with_currency_sign() {
            assert_eq!(parse_price("₹1,19,900"), Some(119_900));
        }

        #[test]
        fn test_western_grouping() {
            assert_eq!(parse_price("$1,299"), Some(1299));
        }

        #[test]
        fn test_surrounding_markup_noise() {
            assert_eq!(parse_price("  ₹ 999  \n"), Some(999));
        }

        #[test]
        fn test_no_digits_is_none() {
            assert_eq!(parse_price("Currently unavailable"), None);
            assert_eq!(parse_price(""), None);
        }

        #[test]
        fn test_absurdly_long_digit_runs_do_not_panic() {
            assert_eq!(parse_price(&"9".repeat(40)), None);
        }
    }

    #[test]
    fn test_search_query_owns_its_keywords() {
        let query = SearchQuery::new("MacBook Pro", 10, &["macbook", "pro"]);
        assert_eq!(query.keywords, vec!["macbook", "pro"]);
        assert_eq!(query.max_results, 10);
    }
}
