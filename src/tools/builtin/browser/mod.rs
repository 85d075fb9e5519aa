//! Headless browser tool for web interaction.
//!
//! A single `BrowserTool` that dispatches actions via a tagged enum,
//! keeping the tool registry clean (one tool, not ten). The LLM sends
//! an `action` field to pick the operation:
//!
//! ```json
//! { "action": "navigate", "url": "https://example.com" }
//! { "action": "click", "ref": "3" }
//! { "action": "type", "ref": "1", "text": "hello" }
//! { "action": "screenshot" }
//! ```
//!
//! `generate_page_map` is never itself an agent-callable action.
//! Instead, every state-changing action (`navigate`, `back`, `forward`,
//! `click`, `type`, `scroll`) regenerates the page map afterward and
//! folds `interactiveText`/`contentText` into its own result so the
//! agent always sees an up-to-date map without asking for one.
//! Elements are addressed by the opaque `ref` the previous page map
//! assigned (`data-agent-ref`), or by a raw CSS `selector` — `ref`
//! shadows `selector` when both are given.

pub mod session;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::context::JobContext;
use crate::driver::cdp::find_chrome;
use crate::engine::PageMap;
use crate::tool::{Tool, ToolOutput};
use crate::tools::builtin::browser::session::BrowserSession;
use crate::error::ToolError;

pub use crate::driver::cdp::find_chrome as find_chrome_binary;

/// Actions the LLM can request from the browser tool.
///
/// Uses serde tagged enum: the JSON `"action"` field selects the variant,
/// remaining fields are variant-specific parameters.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum BrowserAction {
    /// Navigate to a URL.
    Navigate { url: String },
    /// Go back in browser history.
    Back,
    /// Go forward in browser history.
    Forward,
    /// Click an element by `ref` (preferred) or raw CSS `selector`.
    Click {
        r#ref: Option<String>,
        selector: Option<String>,
    },
    /// Type text into an element by `ref` or raw CSS `selector`.
    Type {
        r#ref: Option<String>,
        selector: Option<String>,
        text: String,
        /// Clear the field's existing value before typing (default false).
        clear_first: Option<bool>,
    },
    /// Scroll the page.
    Scroll {
        /// "up", "down", "left", "right"
        direction: String,
        /// Number of scroll steps (default 3).
        amount: Option<u32>,
    },
    /// Capture a full-page screenshot (returns base64 PNG).
    Screenshot,
    /// Extract text content from the page or a CSS selector.
    Extract {
        /// Optional CSS selector. If omitted, extracts all body text.
        selector: Option<String>,
    },
    /// Wait for a `ref`/selector to appear, or a fixed delay.
    Wait {
        r#ref: Option<String>,
        selector: Option<String>,
        /// Timeout in milliseconds (default 10000).
        timeout_ms: Option<u64>,
    },
    /// Execute JavaScript (requires user approval).
    EvalJs { expression: String },
}

fn page_map_json(map: &PageMap) -> serde_json::Value {
    serde_json::json!({
        "interactiveText": map.interactive_text,
        "contentText": map.content_text,
        "apiText": map.api_text,
    })
}

/// Headless browser tool for navigating web pages, interacting with
/// elements, and extracting content.
///
/// Uses Chrome/Chromium via the DevTools Protocol. The browser is
/// launched lazily on first use and includes basic anti-detection
/// patches (`crate::stealth`).
///
/// Every action that changes the page folds a freshly generated page
/// map into its result — there is no separate "read the page" action.
pub struct BrowserTool {
    /// Lazily initialized browser session. RwLock because `execute` takes `&self`.
    session: RwLock<Option<BrowserSession>>,
    session_id: String,
}

impl BrowserTool {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session: RwLock::new(None),
            session_id: session_id.into(),
        }
    }

    /// Ensure the browser session is initialized, launching Chrome if needed.
    async fn ensure_session(&self) -> Result<(), ToolError> {
        let needs_launch = self.session.read().await.is_none();
        if needs_launch {
            let new_session = BrowserSession::launch(&self.session_id).await?;
            let mut guard = self.session.write().await;
            if guard.is_none() {
                *guard = Some(new_session);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Tool for BrowserTool {
    fn name(&self) -> &str {
        "browser"
    }

    fn description(&self) -> &str {
        "Control a headless web browser. Navigate pages, click elements, type text, \
         scroll, and take screenshots. Every action that changes the page returns an \
         up-to-date map of its interactive and content elements — address elements by \
         the 'ref' that map assigns, or by a raw CSS 'selector'.\n\n\
         Actions: navigate, back, forward, click, type, scroll, screenshot, extract, \
         wait, eval_js"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": [
                        "navigate", "back", "forward", "click",
                        "type", "scroll", "screenshot", "extract", "wait", "eval_js"
                    ],
                    "description": "The browser action to perform"
                },
                "url": {
                    "type": "string",
                    "description": "URL to navigate to (for 'navigate' action)"
                },
                "ref": {
                    "type": "string",
                    "description": "Opaque element reference from the last page map (for 'click', 'type', 'wait')"
                },
                "selector": {
                    "type": "string",
                    "description": "Raw CSS selector, used when 'ref' is not given (for 'click', 'type', 'wait', 'extract')"
                },
                "text": {
                    "type": "string",
                    "description": "Text to type (for 'type' action)"
                },
                "clear_first": {
                    "type": "boolean",
                    "description": "Clear the field before typing (for 'type' action)"
                },
                "direction": {
                    "type": "string",
                    "enum": ["up", "down", "left", "right"],
                    "description": "Scroll direction (for 'scroll' action)"
                },
                "amount": {
                    "type": "integer",
                    "description": "Scroll steps, default 3 (for 'scroll' action)"
                },
                "timeout_ms": {
                    "type": "integer",
                    "description": "Timeout in milliseconds (for 'wait' action, default 10000)"
                },
                "expression": {
                    "type": "string",
                    "description": "JavaScript expression (for 'eval_js' action)"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &JobContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = std::time::Instant::now();

        let action: BrowserAction = serde_json::from_value(params)
            .map_err(|e| ToolError::InvalidParameters(format!("invalid browser action: {e}")))?;

        self.ensure_session().await?;

        let session = self.session.read().await;
        let session = session
            .as_ref()
            .ok_or_else(|| ToolError::ExecutionFailed("browser session not initialized".to_string()))?;

        match action {
            BrowserAction::Navigate { url } => {
                let (title, map) = session.navigate(&url).await?;
                let current_url = session.current_url().await?;
                let mut content = page_map_json(&map);
                content["url"] = serde_json::json!(current_url);
                content["title"] = serde_json::json!(title);
                content["status"] = serde_json::json!("navigated");
                Ok(ToolOutput::success(content, start.elapsed()))
            }

            BrowserAction::Back => {
                let map = session.go_back().await?;
                let url = session.current_url().await?;
                let mut content = page_map_json(&map);
                content["url"] = serde_json::json!(url);
                content["status"] = serde_json::json!("navigated_back");
                Ok(ToolOutput::success(content, start.elapsed()))
            }

            BrowserAction::Forward => {
                let map = session.go_forward().await?;
                let url = session.current_url().await?;
                let mut content = page_map_json(&map);
                content["url"] = serde_json::json!(url);
                content["status"] = serde_json::json!("navigated_forward");
                Ok(ToolOutput::success(content, start.elapsed()))
            }

            BrowserAction::Click { r#ref, selector } => {
                let map = session
                    .click_element(selector.as_deref(), r#ref.as_deref())
                    .await?;
                let mut content = page_map_json(&map);
                content["status"] = serde_json::json!("clicked");
                Ok(ToolOutput::success(content, start.elapsed()))
            }

            BrowserAction::Type {
                r#ref,
                selector,
                text,
                clear_first,
            } => {
                let map = session
                    .type_text(selector.as_deref(), r#ref.as_deref(), &text, clear_first.unwrap_or(false))
                    .await?;
                let mut content = page_map_json(&map);
                content["status"] = serde_json::json!("typed");
                Ok(ToolOutput::success(content, start.elapsed()))
            }

            BrowserAction::Scroll { direction, amount } => {
                let steps = amount.unwrap_or(3);
                let map = session.scroll(&direction, steps).await?;
                let mut content = page_map_json(&map);
                content["status"] = serde_json::json!("scrolled");
                content["direction"] = serde_json::json!(direction);
                Ok(ToolOutput::success(content, start.elapsed()))
            }

            BrowserAction::Screenshot => {
                let b64 = session.screenshot().await?;
                Ok(ToolOutput::success(
                    serde_json::json!({
                        "format": "png",
                        "encoding": "base64",
                        "data": b64,
                    }),
                    start.elapsed(),
                ))
            }

            BrowserAction::Extract { selector } => {
                let text = session.extract_text(selector.as_deref()).await?;

                // Truncate very long text to avoid blowing up context.
                let truncated = if text.len() > 32_000 {
                    format!("{}...\n\n[truncated, {} total chars]", &text[..32_000], text.len())
                } else {
                    text.clone()
                };

                Ok(ToolOutput::text(&truncated, start.elapsed()).with_raw(text))
            }

            BrowserAction::Wait {
                r#ref,
                selector,
                timeout_ms,
            } => {
                let timeout = timeout_ms.unwrap_or(crate::engine::DEFAULT_WAIT_TIMEOUT.as_millis() as u64);
                let found = session.wait(selector.as_deref(), r#ref.as_deref(), timeout).await?;
                Ok(ToolOutput::success(
                    serde_json::json!({ "found": found, "timeout_ms": timeout }),
                    start.elapsed(),
                ))
            }

            BrowserAction::EvalJs { expression } => {
                let result = session.eval_js(&expression).await?;
                Ok(ToolOutput::success(serde_json::json!({ "result": result }), start.elapsed()))
            }
        }
    }

    fn estimated_duration(&self, _params: &serde_json::Value) -> Option<Duration> {
        Some(Duration::from_secs(10))
    }

    fn requires_sanitization(&self) -> bool {
        true // Page content is untrusted external data
    }

    fn requires_approval(&self) -> bool {
        true // Browser navigates to external sites, executes JS
    }
}

/// Re-exported so the crate's integration test can skip when Chrome is
/// unavailable without reaching into the `driver` module directly.
pub fn chrome_available() -> bool {
    find_chrome().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::Tool;

    #[test]
    fn test_browser_tool_metadata() {
        let tool = BrowserTool::new("test-session");
        assert_eq!(tool.name(), "browser");
        assert!(tool.requires_approval());
        assert!(tool.requires_sanitization());
    }

    #[test]
    fn test_schema_has_action_enum() {
        let tool = BrowserTool::new("test-session");
        let schema = tool.parameters_schema();

        let action_prop = schema.get("properties").and_then(|p| p.get("action"));
        assert!(action_prop.is_some());

        let actions: Vec<&str> = action_prop
            .and_then(|a| a.get("enum"))
            .and_then(|e| e.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        assert!(actions.contains(&"navigate"));
        assert!(actions.contains(&"click"));
        assert!(actions.contains(&"type"));
        assert!(actions.contains(&"screenshot"));
        assert!(actions.contains(&"eval_js"));
        assert!(!actions.contains(&"read_page"), "generate_page_map is auto-injected, not its own action");
    }

    #[test]
    fn test_action_deserialization() {
        let action: BrowserAction = serde_json::from_value(
            serde_json::json!({"action": "navigate", "url": "https://x.com"}),
        )
        .unwrap();
        assert!(matches!(action, BrowserAction::Navigate { url } if url == "https://x.com"));

        let action: BrowserAction =
            serde_json::from_value(serde_json::json!({"action": "click", "ref": "3"})).unwrap();
        assert!(matches!(action, BrowserAction::Click { r#ref: Some(r), .. } if r == "3"));

        let action: BrowserAction = serde_json::from_value(
            serde_json::json!({"action": "type", "ref": "1", "text": "hello"}),
        )
        .unwrap();
        assert!(
            matches!(action, BrowserAction::Type { r#ref: Some(r), text, .. } if r == "1" && text == "hello")
        );

        let action: BrowserAction =
            serde_json::from_value(serde_json::json!({"action": "screenshot"})).unwrap();
        assert!(matches!(action, BrowserAction::Screenshot));

        let result: Result<BrowserAction, _> =
            serde_json::from_value(serde_json::json!({"action": "fly_to_moon"}));
        assert!(result.is_err());
    }
}
