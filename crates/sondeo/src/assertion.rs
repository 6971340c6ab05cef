//! Business-rule checks over collected page values.
//!
//! Checks return an [`AssertionResult`] rather than raising, so callers
//! can aggregate or convert into [`SondeoError::Assertion`] with
//! [`AssertionResult::into_result`]. Assertion violations are reported
//! separately from infrastructure failures: a failing keyword check means
//! a regression, not a flaky environment.

use crate::result::{SondeoError, SondeoResult};

/// Result of a single business-rule check
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// Whether the check passed
    pub passed: bool,
    /// Human-readable message describing the violation
    pub message: String,
}

impl AssertionResult {
    /// Create a passing result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Convert into a `SondeoResult`, mapping a failed check to
    /// [`SondeoError::Assertion`]
    pub fn into_result(self) -> SondeoResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(SondeoError::Assertion {
                message: self.message,
            })
        }
    }
}

/// Check that at least `min` result titles were collected
#[must_use]
pub fn min_results(titles: &[String], min: usize) -> AssertionResult {
    if titles.len() >= min {
        AssertionResult::pass()
    } else {
        AssertionResult::fail(format!(
            "expected at least {min} result(s), got {}",
            titles.len()
        ))
    }
}

/// Check that at least one title contains at least one keyword,
/// case-insensitively
#[must_use]
pub fn any_keyword(titles: &[String], keywords: &[String]) -> AssertionResult {
    let relevant = titles.iter().any(|title| {
        let title = title.to_lowercase();
        keywords
            .iter()
            .any(|keyword| title.contains(&keyword.to_lowercase()))
    });
    if relevant {
        AssertionResult::pass()
    } else {
        AssertionResult::fail(format!(
            "no title out of {} matched any of the keywords {keywords:?}",
            titles.len()
        ))
    }
}

/// Check that the captured price is strictly below `ceiling`.
///
/// A missing price fails the check: the caller asked for a price bound,
/// so "no price captured" cannot satisfy it.
#[must_use]
pub fn price_below(price: Option<u64>, ceiling: u64) -> AssertionResult {
    match price {
        Some(value) if value < ceiling => AssertionResult::pass(),
        Some(value) => AssertionResult::fail(format!(
            "expected price below {ceiling}, got {value}"
        )),
        None => AssertionResult::fail(format!(
            "expected price below {ceiling}, but no price was captured"
        )),
    }
}
