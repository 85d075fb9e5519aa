//! The `Tool` trait boundary: the tool-wrapper / session layer the engine
//! is consumed by, implemented here as a thin binding so the crate runs
//! end-to-end.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::JobContext;
use crate::error::ToolError;

/// Result of a tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub content: Value,
    pub display_text: Option<String>,
    pub raw: Option<String>,
    pub duration: Duration,
}

impl ToolOutput {
    pub fn success(content: Value, duration: Duration) -> Self {
        Self {
            content,
            display_text: None,
            raw: None,
            duration,
        }
    }

    pub fn text(text: impl Into<String>, duration: Duration) -> Self {
        let text = text.into();
        Self {
            content: Value::String(text.clone()),
            display_text: Some(text),
            raw: None,
            duration,
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

/// A single callable operation exposed to the agent-facing layer.
///
/// A uniform shape — `name`, `description`, `parameters_schema`,
/// `execute` — so every tool in a registry looks and behaves the same.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> Value;

    async fn execute(&self, params: Value, ctx: &JobContext) -> Result<ToolOutput, ToolError>;

    fn estimated_duration(&self, _params: &Value) -> Option<Duration> {
        None
    }

    fn requires_sanitization(&self) -> bool {
        false
    }

    fn requires_approval(&self) -> bool {
        false
    }
}
