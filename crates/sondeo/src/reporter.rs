//! Run report aggregation and rendering.
//!
//! Violations and infrastructure failures are tallied separately so a
//! flaky environment never masquerades as a product regression.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ReportFormat;
use crate::result::SondeoResult;
use crate::scenario::ScenarioOutcome;

/// Terminal status of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioStatus {
    /// All assertions held
    Passed,
    /// A business rule was violated
    Violation,
    /// The environment failed before assertions could be judged
    Infrastructure,
}

/// One scenario's row in the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Scenario name
    pub name: String,
    /// Terminal status
    pub status: ScenarioStatus,
    /// Violation or failure detail; empty on a pass
    pub detail: String,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Aggregated results of one harness run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    records: Vec<ScenarioRecord>,
}

impl RunReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scenario outcome
    pub fn record(&mut self, name: impl Into<String>, outcome: &ScenarioOutcome, elapsed: Duration) {
        let (status, detail) = match outcome {
            ScenarioOutcome::Passed => (ScenarioStatus::Passed, String::new()),
            ScenarioOutcome::Violation(message) => (ScenarioStatus::Violation, message.clone()),
            ScenarioOutcome::Infrastructure(err) => {
                (ScenarioStatus::Infrastructure, err.to_string())
            }
        };
        self.records.push(ScenarioRecord {
            name: name.into(),
            status,
            detail,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
    }

    /// All recorded scenarios, in run order
    #[must_use]
    pub fn records(&self) -> &[ScenarioRecord] {
        &self.records
    }

    /// Number of passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    /// Number of business-rule violations
    #[must_use]
    pub fn violations(&self) -> usize {
        self.count(ScenarioStatus::Violation)
    }

    /// Number of infrastructure failures
    #[must_use]
    pub fn infrastructure_failures(&self) -> usize {
        self.count(ScenarioStatus::Infrastructure)
    }

    /// Whether every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed() == self.records.len()
    }

    fn count(&self, status: ScenarioStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Render in the requested format
    pub fn render(&self, format: ReportFormat) -> SondeoResult<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Human-readable summary, one line per scenario plus totals
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            let marker = match record.status {
                ScenarioStatus::Passed => "PASS",
                ScenarioStatus::Violation => "FAIL",
                ScenarioStatus::Infrastructure => "ERROR",
            };
            out.push_str(&format!(
                "{marker:>5}  {} ({}ms)",
                record.name, record.duration_ms
            ));
            if !record.detail.is_empty() {
                out.push_str(&format!("\n       {}", record.detail));
            }
            out.push('\n');
        }
        out.push_str(&format!(
            "\n{} passed, {} violation(s), {} infrastructure failure(s)\n",
            self.passed(),
            self.violations(),
            self.infrastructure_failures()
        ));
        out
    }

    /// Machine-readable JSON rendering
    pub fn to_json(&self) -> SondeoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
