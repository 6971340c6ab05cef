//! Result and error types for Sondeo.
//!
//! The taxonomy separates infrastructure failures (navigation, required
//! containers missing) from business-rule violations so that reports can
//! tell environment flakiness apart from genuine regressions. Transient
//! per-candidate probe failures never appear here at all; the locator
//! swallows them locally.

use thiserror::Error;

/// Result type for Sondeo operations
pub type SondeoResult<T> = Result<T, SondeoError>;

/// Errors that can occur in Sondeo
#[derive(Debug, Error)]
pub enum SondeoError {
    /// Browser launch or connection error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page-level driver failure (evaluation error, required element gone)
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Initial page load failed after exhausting the retry budget.
    /// Terminal: aborts the scenario.
    #[error("Navigation to {url} failed after {attempts} attempt(s): {message}")]
    Navigation {
        /// URL that failed to load
        url: String,
        /// Number of attempts made before giving up
        attempts: u32,
        /// Last failure observed
        message: String,
    },

    /// No candidate selector for a required results container resolved
    /// within the wait budget
    #[error("No search results found for '{term}' within {waited_ms}ms")]
    ResultsNotFound {
        /// Search term whose results never appeared
        term: String,
        /// Total wait budget that elapsed
        waited_ms: u64,
    },

    /// A bounded wait elapsed
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A collected value did not satisfy a business expectation
    /// (keyword relevance, price ceiling, result count)
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Description of the violated expectation
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SondeoError {
    /// Whether this error indicates environment or site flakiness rather
    /// than a genuine regression. Assertion violations are the only
    /// non-infrastructure variant.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        !matches!(self, Self::Assertion { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_display_names_url_and_attempts() {
        let err = SondeoError::Navigation {
            url: "https://www.amazon.in".into(),
            attempts: 3,
            message: "ready marker never appeared".into(),
        };
        let display = format!("{err}");
        assert!(display.contains("amazon.in"));
        assert!(display.contains("3 attempt(s)"));
    }

    #[test]
    fn test_assertion_is_not_infrastructure() {
        let err = SondeoError::Assertion {
            message: "price too high".into(),
        };
        assert!(!err.is_infrastructure());
    }

    #[test]
    fn test_results_not_found_is_infrastructure() {
        let err = SondeoError::ResultsNotFound {
            term: "laptop".into(),
            waited_ms: 90_000,
        };
        assert!(err.is_infrastructure());
        assert!(format!("{err}").contains("laptop"));
    }
}
