//! Browser session management.
//!
//! Owns one `CdpDriver` (one Chrome tab) and one page-map engine
//! invocation path per session. Sessions are spawned lazily on first
//! browser action and torn down when dropped.
//!
//! ```text
//! BrowserSession
//! ├── CdpDriver (owns the Chrome child process + one Page)
//! ├── EngineConfig / MapType (from DriverConfig's env resolution)
//! ├── ReqwestFetcher (API-response re-fetch for the apiText block)
//! ├── DebugDumper (optional, PAGE_MAP_DEBUG_DIR)
//! └── call_lock: tokio::sync::Mutex<()> — serializes the engine-facing
//!     entry point: a single mutex, not an actor mailbox or event loop.
//! ```
//!
//! Every action that changes the page (navigate, back, forward, click,
//! type, scroll) regenerates the page map afterward and returns its text
//! blocks alongside the action's own result — auto-injected, with no
//! separate agent-visible "read page" tool.

use crate::config::{DriverConfig, EngineConfig};
use crate::driver::BrowserDriver;
use crate::driver::cdp::CdpDriver;
use crate::engine::formatter::MapType;
use crate::engine::{PageMap, generate_page_map, resolve_or_fail};
use crate::error::ToolError;
use crate::api_fetcher::ReqwestFetcher;
use crate::debug_dump::DebugDumper;

/// Manages one Chrome tab plus the page-map engine path for one session.
pub struct BrowserSession {
    driver: CdpDriver,
    engine_cfg: EngineConfig,
    map_type: MapType,
    include_api: bool,
    fetcher: ReqwestFetcher,
    dumper: DebugDumper,
    call_lock: tokio::sync::Mutex<()>,
}

impl BrowserSession {
    /// Launch a new Chrome browser session for the given session id.
    pub async fn launch(session_id: &str) -> Result<Self, ToolError> {
        let driver_cfg = DriverConfig::resolve()
            .map_err(|e| ToolError::InvalidParameters(format!("invalid driver config: {e}")))?;
        let engine_cfg = EngineConfig::resolve()
            .map_err(|e| ToolError::InvalidParameters(format!("invalid engine config: {e}")))?;

        let driver = CdpDriver::launch(driver_cfg.chrome_path.as_deref())
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("failed to launch Chrome: {e}")))?;

        let map_type = engine_cfg.map_type;
        let dumper = DebugDumper::new(driver_cfg.debug_dir.as_deref(), session_id);

        Ok(Self {
            driver,
            engine_cfg,
            map_type,
            include_api: true,
            fetcher: ReqwestFetcher::new(),
            dumper,
            call_lock: tokio::sync::Mutex::new(()),
        })
    }

    async fn refresh_page_map(&self) -> PageMap {
        let map = generate_page_map(
            &self.driver,
            Some(&self.fetcher),
            &self.engine_cfg,
            self.map_type,
            self.include_api,
        )
        .await;
        self.dumper.dump(&map);
        map
    }

    // --- Navigation ---

    pub async fn navigate(&self, url: &str) -> Result<(String, PageMap), ToolError> {
        let _guard = self.call_lock.lock().await;
        self.driver.navigate(url).await?;
        let title = self.driver.get_title().await?;
        let map = self.refresh_page_map().await;
        Ok((title, map))
    }

    pub async fn go_back(&self) -> Result<PageMap, ToolError> {
        let _guard = self.call_lock.lock().await;
        self.driver.eval_in_page("window.history.back()").await?;
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        Ok(self.refresh_page_map().await)
    }

    pub async fn go_forward(&self) -> Result<PageMap, ToolError> {
        let _guard = self.call_lock.lock().await;
        self.driver.eval_in_page("window.history.forward()").await?;
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        Ok(self.refresh_page_map().await)
    }

    pub async fn current_url(&self) -> Result<String, ToolError> {
        Ok(self.driver.get_url().await?)
    }

    // --- Page reading ---

    /// Regenerate the page map without taking any other action — the
    /// CLI binary's inspection entry point; a developer affordance, not
    /// part of the agent-facing tool surface.
    pub async fn read_page_map(&self) -> Result<PageMap, ToolError> {
        let _guard = self.call_lock.lock().await;
        Ok(self.refresh_page_map().await)
    }

    /// Extract text content from the page or a CSS selector.
    pub async fn extract_text(&self, selector: Option<&str>) -> Result<String, ToolError> {
        let js = match selector {
            Some(sel) => {
                let escaped = serde_json::to_string(sel)
                    .map_err(|e| ToolError::InvalidParameters(format!("invalid selector: {e}")))?;
                format!(
                    "(() => {{ const el = document.querySelector({escaped}); return el ? el.innerText : null; }})()"
                )
            }
            None => "document.body.innerText".to_string(),
        };

        let value = self.driver.eval_in_page(&js).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    // --- Interaction ---

    /// Click an element by `ref` (preferred) or raw CSS selector.
    pub async fn click_element(
        &self,
        selector: Option<&str>,
        r#ref: Option<&str>,
    ) -> Result<PageMap, ToolError> {
        let _guard = self.call_lock.lock().await;
        let target = resolve_or_fail(selector, r#ref)?;
        self.driver.click(&target).await?;
        Ok(self.refresh_page_map().await)
    }

    /// Type text into an element by `ref` or raw CSS selector.
    pub async fn type_text(
        &self,
        selector: Option<&str>,
        r#ref: Option<&str>,
        text: &str,
        clear_first: bool,
    ) -> Result<PageMap, ToolError> {
        let _guard = self.call_lock.lock().await;
        let target = resolve_or_fail(selector, r#ref)?;
        self.driver.type_text(&target, text, clear_first).await?;
        Ok(self.refresh_page_map().await)
    }

    /// Scroll the page by a fixed number of 100px steps. `scrollToElement`
    /// targets one element; plain directional scroll stays a JS one-liner
    /// since the driver boundary has no "scroll by pixels" verb.
    pub async fn scroll(&self, direction: &str, amount: u32) -> Result<PageMap, ToolError> {
        let _guard = self.call_lock.lock().await;
        let (dx, dy) = match direction {
            "up" => (0, -(amount as i32 * 100)),
            "down" => (0, amount as i32 * 100),
            "left" => (-(amount as i32 * 100), 0),
            "right" => (amount as i32 * 100, 0),
            other => {
                return Err(ToolError::InvalidParameters(format!(
                    "invalid scroll direction '{other}'. use: up, down, left, right"
                )));
            }
        };
        let js = format!("window.scrollBy({dx}, {dy})");
        self.driver.eval_in_page(&js).await?;
        Ok(self.refresh_page_map().await)
    }

    /// Wait for a `ref`/selector to appear, or a fixed delay.
    pub async fn wait(
        &self,
        selector: Option<&str>,
        r#ref: Option<&str>,
        timeout_ms: u64,
    ) -> Result<bool, ToolError> {
        if selector.is_none() && r#ref.is_none() {
            tokio::time::sleep(std::time::Duration::from_millis(timeout_ms)).await;
            return Ok(true);
        }
        let target = resolve_or_fail(selector, r#ref)?;
        Ok(self
            .driver
            .wait_for_element(&target, std::time::Duration::from_millis(timeout_ms))
            .await?)
    }

    // --- Screenshots ---

    /// Capture a screenshot as base64-encoded PNG.
    pub async fn screenshot(&self) -> Result<String, ToolError> {
        let bytes = self.driver.screenshot_png().await?;
        use base64::Engine;
        Ok(base64::engine::general_purpose::STANDARD.encode(&bytes))
    }

    // --- JavaScript ---

    /// Execute arbitrary JavaScript and return the result (requires
    /// approval at the `Tool` layer — this session does not gate it).
    pub async fn eval_js(&self, expression: &str) -> Result<serde_json::Value, ToolError> {
        Ok(self.driver.eval_in_page(expression).await?)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        tracing::debug!("browser session dropping, Chrome process will be cleaned up");
    }
}
