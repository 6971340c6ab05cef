//! Real browser control over the Chrome DevTools Protocol.
//!
//! Compiled only with the `browser` feature. Element handles are
//! JavaScript lookup expressions re-evaluated on every use, so a handle
//! stays valid across re-renders as long as something still matches its
//! selector chain.

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::HarnessConfig;
use crate::driver::PageDriver;
use crate::locator::{js_string, Selector};
use crate::result::{SondeoError, SondeoResult};

fn launch_err(err: impl std::fmt::Display) -> SondeoError {
    SondeoError::BrowserLaunch {
        message: err.to_string(),
    }
}

fn page_err(err: impl std::fmt::Display) -> SondeoError {
    SondeoError::Page {
        message: err.to_string(),
    }
}

/// A running Chromium instance
#[derive(Debug)]
pub struct Browser {
    config: HarnessConfig,
    inner: Arc<Mutex<CdpBrowser>>,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch Chromium per `config`
    pub async fn launch(config: HarnessConfig) -> SondeoResult<Self> {
        let mut builder =
            CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(launch_err)?;
        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(launch_err)?;

        // The handler stream must be drained for the CDP connection to
        // make progress.
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            "browser launched"
        );
        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a fresh page with the configured user agent and headers
    pub async fn new_page(&self) -> SondeoResult<BrowserPage> {
        let browser = self.inner.lock().await;
        let page = browser.new_page("about:blank").await.map_err(page_err)?;

        if let Some(ref agent) = self.config.user_agent {
            page.set_user_agent(SetUserAgentOverrideParams::new(agent.clone()))
                .await
                .map_err(page_err)?;
        }
        if !self.config.extra_headers.is_empty() {
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(
                serde_json::json!(self.config.extra_headers),
            )))
            .await
            .map_err(page_err)?;
        }

        Ok(BrowserPage { inner: page })
    }

    /// The launch configuration
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Close the browser process
    pub async fn close(self) -> SondeoResult<()> {
        let mut browser = self.inner.lock().await;
        browser.close().await.map_err(launch_err)?;
        Ok(())
    }
}

/// A JavaScript expression that re-resolves an element on every use
#[derive(Debug, Clone)]
pub struct NodeRef(String);

impl NodeRef {
    fn scoped(scope: Option<&Self>, selector: &Selector) -> String {
        let root = scope.map_or("document", |node| node.0.as_str());
        selector.to_query_on(root)
    }
}

/// One CDP page session implementing [`PageDriver`]
#[derive(Debug)]
pub struct BrowserPage {
    inner: CdpPage,
}

impl BrowserPage {
    async fn eval<T: serde::de::DeserializeOwned>(&self, expr: &str) -> SondeoResult<T> {
        let result = self.inner.evaluate(expr).await.map_err(page_err)?;
        result.into_value().map_err(page_err)
    }

    /// Capture the current viewport as PNG bytes
    pub async fn screenshot(&self) -> SondeoResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.inner.execute(params).await.map_err(page_err)?;
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(page_err)
    }
}

#[async_trait]
impl PageDriver for BrowserPage {
    type Handle = NodeRef;

    async fn goto(&self, url: &str) -> SondeoResult<()> {
        self.inner.goto(url).await.map_err(page_err)?;
        self.inner.wait_for_navigation().await.map_err(page_err)?;
        debug!(url, "navigation settled");
        Ok(())
    }

    async fn title(&self) -> SondeoResult<String> {
        Ok(self
            .inner
            .get_title()
            .await
            .map_err(page_err)?
            .unwrap_or_default())
    }

    async fn resolve(
        &self,
        scope: Option<&NodeRef>,
        selector: &Selector,
    ) -> SondeoResult<Option<NodeRef>> {
        let expr = NodeRef::scoped(scope, selector);
        let exists: bool = self.eval(&format!("!!({expr})")).await?;
        Ok(exists.then(|| NodeRef(format!("({expr})"))))
    }

    async fn resolve_all(
        &self,
        scope: Option<&NodeRef>,
        selector: &Selector,
    ) -> SondeoResult<Vec<NodeRef>> {
        let root = scope.map_or("document", |node| node.0.as_str());
        let all = selector.to_query_all_on(root);
        let count: usize = self.eval(&format!("({all}).length")).await?;
        Ok((0..count)
            .map(|i| NodeRef(format!("(({all})[{i}])")))
            .collect())
    }

    async fn is_visible(&self, handle: &NodeRef) -> SondeoResult<bool> {
        let expr = format!(
            "(function() {{ const el = {}; if (!el) return false; \
             const rect = el.getBoundingClientRect(); \
             const style = window.getComputedStyle(el); \
             return rect.width > 0 && rect.height > 0 \
                 && style.visibility !== 'hidden' && style.display !== 'none'; }})()",
            handle.0
        );
        self.eval(&expr).await
    }

    async fn text(&self, handle: &NodeRef) -> SondeoResult<Option<String>> {
        let expr = format!(
            "(function() {{ const el = {}; return el ? el.textContent : null; }})()",
            handle.0
        );
        self.eval(&expr).await
    }

    async fn fill(&self, handle: &NodeRef, value: &str) -> SondeoResult<()> {
        let expr = format!(
            "(function() {{ const el = {}; if (!el) return false; \
             el.focus(); el.value = {}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true; }})()",
            handle.0,
            js_string(value)
        );
        let filled: bool = self.eval(&expr).await?;
        if filled {
            Ok(())
        } else {
            Err(page_err("element to fill no longer resolves"))
        }
    }

    async fn click(&self, handle: &NodeRef) -> SondeoResult<()> {
        let expr = format!(
            "(function() {{ const el = {}; if (!el) return false; el.click(); return true; }})()",
            handle.0
        );
        let clicked: bool = self.eval(&expr).await?;
        if clicked {
            Ok(())
        } else {
            Err(page_err("element to click no longer resolves"))
        }
    }

    async fn press_enter(&self, handle: &NodeRef) -> SondeoResult<()> {
        let expr = format!(
            "(function() {{ const el = {}; if (!el) return false; \
             const opts = {{ key: 'Enter', code: 'Enter', keyCode: 13, bubbles: true }}; \
             el.dispatchEvent(new KeyboardEvent('keydown', opts)); \
             el.dispatchEvent(new KeyboardEvent('keyup', opts)); \
             if (el.form) el.form.submit(); \
             return true; }})()",
            handle.0
        );
        let pressed: bool = self.eval(&expr).await?;
        if pressed {
            Ok(())
        } else {
            Err(page_err("element to press Enter on no longer resolves"))
        }
    }
}
