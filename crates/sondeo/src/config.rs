//! Harness configuration with documented defaults.
//!
//! Everything here is plain pass-through configuration: the locator and
//! facade never branch on these values beyond consuming them as budgets.
//! A config file is JSON with every field optional.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::locator::LocatorOptions;
use crate::result::SondeoResult;

/// Browser engine selection. Only Chromium-family engines speak CDP, so
/// this is currently a single-variant enum kept for config compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Chromium / Chrome via the DevTools Protocol
    #[default]
    Chromium,
}

/// When to capture screenshots during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapturePolicy {
    /// Never capture
    Off,
    /// Capture only when a scenario fails
    #[default]
    OnFailure,
    /// Capture after every scenario
    Always,
}

/// Output format for the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable text summary
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Complete harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Browser engine (default: chromium)
    pub engine: Engine,
    /// Run the browser headless (default: true)
    pub headless: bool,
    /// Viewport width in pixels (default: 1280)
    pub viewport_width: u32,
    /// Viewport height in pixels (default: 720)
    pub viewport_height: u32,
    /// Path to the chromium binary (default: auto-detect)
    pub chromium_path: Option<String>,
    /// Chromium sandbox (default: true; disable in containers)
    pub sandbox: bool,
    /// Custom user agent (default: engine default)
    pub user_agent: Option<String>,
    /// Extra HTTP headers sent with every request
    pub extra_headers: HashMap<String, String>,
    /// Navigation timeout in milliseconds (default: 60000)
    pub nav_timeout_ms: u64,
    /// Per-candidate locator wait in milliseconds (default: 30000)
    pub locator_timeout_ms: u64,
    /// Best-effort overlay dismissal wait in milliseconds (default: 5000)
    pub overlay_timeout_ms: u64,
    /// Locator polling interval in milliseconds (default: 250)
    pub poll_interval_ms: u64,
    /// Navigation attempts before giving up (default: 3)
    pub retry_limit: u32,
    /// Fixed delay between navigation attempts in ms (default: 2000)
    pub retry_backoff_ms: u64,
    /// Screenshot capture policy (default: on-failure)
    pub capture: CapturePolicy,
    /// Report output format (default: text)
    pub report_format: ReportFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
            user_agent: None,
            extra_headers: HashMap::new(),
            nav_timeout_ms: 60_000,
            locator_timeout_ms: 30_000,
            overlay_timeout_ms: 5_000,
            poll_interval_ms: 250,
            retry_limit: 3,
            retry_backoff_ms: 2_000,
            capture: CapturePolicy::OnFailure,
            report_format: ReportFormat::Text,
        }
    }
}

impl HarnessConfig {
    /// Load a config from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> SondeoResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Locator options for required lookups (search box, results)
    #[must_use]
    pub fn locator_options(&self) -> LocatorOptions {
        LocatorOptions::default()
            .with_timeout(Duration::from_millis(self.locator_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }

    /// Short-budget options for best-effort overlay probes
    #[must_use]
    pub fn overlay_options(&self) -> LocatorOptions {
        LocatorOptions::default()
            .with_timeout(Duration::from_millis(self.overlay_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_require_visible(true)
    }

    /// Upper bound on a single navigation attempt
    #[must_use]
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.nav_timeout_ms)
    }

    /// Fixed delay between navigation retries
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_documented_defaults() {
        let config = HarnessConfig::default();
        assert!(config.headless);
        assert_eq!(config.viewport_width, 1280);
        assert_eq!(config.viewport_height, 720);
        assert_eq!(config.nav_timeout_ms, 60_000);
        assert_eq!(config.locator_timeout_ms, 30_000);
        assert_eq!(config.retry_limit, 3);
        assert_eq!(config.capture, CapturePolicy::OnFailure);
        assert_eq!(config.report_format, ReportFormat::Text);
    }

    #[test]
    fn test_partial_json_fills_in_defaults() {
        let config: HarnessConfig =
            serde_json::from_str(r#"{"headless": false, "retry_limit": 5}"#).unwrap();
        assert!(!config.headless);
        assert_eq!(config.retry_limit, 5);
        assert_eq!(config.poll_interval_ms, 250);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = HarnessConfig::default();
        config.user_agent = Some("Mozilla/5.0".into());
        config.extra_headers.insert("accept-language".into(), "en-US,en;q=0.9".into());
        let json = serde_json::to_string(&config).unwrap();
        let back: HarnessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(back.extra_headers.len(), 1);
    }

    #[test]
    fn test_capture_policy_kebab_case() {
        let policy: CapturePolicy = serde_json::from_str("\"on-failure\"").unwrap();
        assert_eq!(policy, CapturePolicy::OnFailure);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"viewport_width": 1920, "viewport_height": 1080}}"#).unwrap();
        let config = HarnessConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.viewport_width, 1920);
        assert_eq!(config.viewport_height, 1080);
    }

    #[test]
    fn test_locator_options_carry_budgets() {
        let mut config = HarnessConfig::default();
        config.locator_timeout_ms = 1_000;
        config.poll_interval_ms = 50;
        let options = config.locator_options();
        assert_eq!(options.timeout, Duration::from_millis(1_000));
        assert_eq!(options.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_nav_timeout_reaches_page_timing() {
        let mut config = HarnessConfig::default();
        config.nav_timeout_ms = 1_500;
        assert_eq!(config.nav_timeout(), Duration::from_millis(1_500));
        let timing = crate::page::PageTiming::from_config(&config);
        assert_eq!(timing.nav_timeout, Duration::from_millis(1_500));
    }
}
