//! `CdpDriver`: the one concrete `BrowserDriver`, backed by `chromiumoxide`.
//!
//! Launch sequence, stealth injection, click-by-coordinate via
//! `DOM.getBoxModel` + `Input.dispatchMouseEvent`, and Chrome discovery
//! all live here behind one `BrowserDriver` implementation rather than
//! one method per tool action.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::{GetBoxModelParams, ScrollIntoViewIfNeededParams};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams, DispatchMouseEventType,
    InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::driver::{BrowserDriver, Cookie, ResourceTimingEntry};
use crate::error::DriverError;
use crate::stealth;

pub struct CdpDriver {
    #[allow(dead_code)]
    browser: Browser,
    _handler_task: JoinHandle<()>,
    page: Page,
}

impl CdpDriver {
    /// Launch a new Chrome instance and open a blank starting tab.
    pub async fn launch(chrome_path: Option<&str>) -> Result<Self, DriverError> {
        let resolved_path = match chrome_path {
            Some(p) => PathBuf::from(p),
            None => find_chrome().ok_or(DriverError::NotReady)?,
        };

        let profile_dir = browser_profile_dir();
        std::fs::create_dir_all(&profile_dir)
            .map_err(|e| DriverError::Transport(format!("failed to create browser profile dir: {e}")))?;

        let mut config_builder = BrowserConfig::builder()
            .chrome_executable(&resolved_path)
            .user_data_dir(&profile_dir)
            .window_size(1920, 1080)
            .no_sandbox();

        for arg in stealth::stealth_args() {
            config_builder = config_builder.arg(arg);
        }

        let config = config_builder
            .build()
            .map_err(|e| DriverError::Transport(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Transport(format!("failed to launch chrome: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("browser handler error: {:?}", event);
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Transport(format!("failed to open initial tab: {e}")))?;

        page.evaluate_on_new_document(stealth::stealth_js())
            .await
            .map_err(|e| DriverError::Transport(format!("failed to inject stealth js: {e}")))?;

        Ok(Self {
            browser,
            _handler_task: handler_task,
            page,
        })
    }

    pub async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Transport(format!("navigation failed: {e}")))?;
        Ok(())
    }

    async fn element_center(&self, selector: &str) -> Result<Option<(f64, f64)>, DriverError> {
        let Some(element) = self
            .page
            .find_element(selector)
            .await
            .ok()
        else {
            return Ok(None);
        };

        let backend_node_id = element
            .backend_node_id()
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;

        self.page
            .execute(
                ScrollIntoViewIfNeededParams::builder()
                    .backend_node_id(backend_node_id)
                    .build(),
            )
            .await
            .map_err(|e| DriverError::Transport(format!("failed to scroll element into view: {e}")))?;

        let box_result = self
            .page
            .execute(
                GetBoxModelParams::builder()
                    .backend_node_id(backend_node_id)
                    .build(),
            )
            .await
            .map_err(|e| DriverError::Transport(format!("failed to get box model: {e}")))?;

        let content = box_result.result.model.content.inner();
        if content.len() < 8 {
            return Ok(None);
        }

        let x = (content[0] + content[2] + content[4] + content[6]) / 4.0;
        let y = (content[1] + content[3] + content[5] + content[7]) / 4.0;
        Ok(Some((x, y)))
    }
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn eval_in_page(&self, script: &str) -> Result<Value, DriverError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Transport(format!("script evaluation failed: {e}")))?;
        Ok(result.into_value().unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<bool, DriverError> {
        let Some((x, y)) = self.element_center(selector).await? else {
            return Ok(false);
        };

        self.page
            .execute(
                DispatchMouseEventParams::builder()
                    .r#type(DispatchMouseEventType::MousePressed)
                    .x(x)
                    .y(y)
                    .button(MouseButton::Left)
                    .click_count(1)
                    .build()
                    .map_err(|e| DriverError::Transport(e.to_string()))?,
            )
            .await
            .map_err(|e| DriverError::Transport(format!("mouse press failed: {e}")))?;

        self.page
            .execute(
                DispatchMouseEventParams::builder()
                    .r#type(DispatchMouseEventType::MouseReleased)
                    .x(x)
                    .y(y)
                    .button(MouseButton::Left)
                    .click_count(1)
                    .build()
                    .map_err(|e| DriverError::Transport(e.to_string()))?,
            )
            .await
            .map_err(|e| DriverError::Transport(format!("mouse release failed: {e}")))?;

        Ok(true)
    }

    async fn type_text(&self, selector: &str, text: &str, clear_first: bool) -> Result<bool, DriverError> {
        if !self.click(selector).await? {
            return Ok(false);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        if clear_first {
            let escaped = serde_json::to_string(selector).unwrap_or_default();
            let js = format!(
                "(() => {{ const el = document.querySelector({escaped}); if (el && 'value' in el) el.value = ''; }})()"
            );
            let _ = self.page.evaluate(js.as_str()).await;
        }

        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(|e| DriverError::Transport(format!("failed to type text: {e}")))?;

        Ok(true)
    }

    async fn press_keys(&self, selector: Option<&str>, keys: &str) -> Result<bool, DriverError> {
        if let Some(sel) = selector {
            if !self.click(sel).await? {
                return Ok(false);
            }
        }

        self.page
            .execute(
                DispatchKeyEventParams::builder()
                    .r#type(DispatchKeyEventType::RawKeyDown)
                    .key(keys)
                    .build()
                    .map_err(|e| DriverError::Transport(e.to_string()))?,
            )
            .await
            .map_err(|e| DriverError::Transport(format!("key press failed: {e}")))?;

        Ok(true)
    }

    async fn scroll_to_element(&self, selector: &str) -> Result<bool, DriverError> {
        Ok(self.element_center(selector).await?.is_some())
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<bool, DriverError> {
        let start = Instant::now();
        loop {
            if self.exists(selector).await? {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn exists(&self, selector: &str) -> Result<bool, DriverError> {
        let escaped = serde_json::to_string(selector).unwrap_or_default();
        let js = format!("!!document.querySelector({escaped})");
        let value = self.eval_in_page(&js).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn wait_for_change(&self, selector: &str, timeout: Duration) -> Result<bool, DriverError> {
        let escaped = serde_json::to_string(selector).unwrap_or_default();
        let snapshot_js = format!(
            "(() => {{ const el = document.querySelector({escaped}); return el ? el.outerHTML : null; }})()"
        );
        let initial = self.eval_in_page(&snapshot_js).await?;

        let start = Instant::now();
        loop {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let current = self.eval_in_page(&snapshot_js).await?;
            if current != initial {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
        }
    }

    async fn get_url(&self) -> Result<String, DriverError> {
        self.page
            .url()
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?
            .ok_or_else(|| DriverError::Transport("no URL available".to_string()))
    }

    async fn get_title(&self) -> Result<String, DriverError> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?
            .unwrap_or_default())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, DriverError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(|e| DriverError::Transport(format!("screenshot failed: {e}")))
    }

    async fn resource_timing_entries(&self) -> Result<Vec<ResourceTimingEntry>, DriverError> {
        const SCRIPT: &str = r#"
            (() => {
                const resources = performance.getEntriesByType('resource');
                const out = [];
                for (const r of resources) {
                    if (r.initiatorType === 'xmlhttprequest' || r.initiatorType === 'fetch') {
                        out.push({
                            url: r.name,
                            initiatorType: r.initiatorType,
                            duration: r.duration,
                            size: r.transferSize || 0,
                            startTime: r.startTime,
                            responseEnd: r.responseEnd,
                        });
                    }
                }
                return out;
            })()
        "#;
        let value = self.eval_in_page(SCRIPT).await?;
        serde_json::from_value(value)
            .map_err(|e| DriverError::Transport(format!("malformed resource timing entries: {e}")))
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, DriverError> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| DriverError::Transport(format!("failed to read cookies: {e}")))?;
        Ok(cookies
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
            })
            .collect())
    }
}

fn browser_profile_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pagemapper")
        .join("browser")
        .join("profile")
}

/// Search common locations for a Chrome/Chromium binary. `CHROME_PATH`
/// takes precedence via the caller's `DriverConfig`.
pub fn find_chrome() -> Option<PathBuf> {
    let candidates: Vec<&str> = if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
    } else {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    };

    for candidate in candidates {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return Some(p);
        }
    }

    which_chrome_in_path()
}

fn which_chrome_in_path() -> Option<PathBuf> {
    let path_var = std::env::var("PATH").ok()?;
    let separator = if cfg!(windows) { ';' } else { ':' };
    for name in &["google-chrome", "chromium", "chromium-browser", "chrome"] {
        for dir in path_var.split(separator) {
            let candidate = PathBuf::from(dir).join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}
