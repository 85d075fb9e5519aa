//! Crate-wide error types.
//!
//! Typed, programmatically matched errors (`thiserror`) at module
//! boundaries; `anyhow` at the CLI edge.

use thiserror::Error;

/// Errors surfaced by the tool-wrapper layer (the `Tool` trait boundary).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("external service error: {0}")]
    ExternalService(String),
}

impl From<DriverError> for ToolError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::NotReady => {
                ToolError::ExecutionFailed("browser driver not ready".to_string())
            }
            DriverError::SelectorMissing => {
                ToolError::InvalidParameters("either a selector or a ref is required".to_string())
            }
            other => ToolError::ExecutionFailed(other.to_string()),
        }
    }
}

impl From<EngineError> for ToolError {
    fn from(err: EngineError) -> Self {
        ToolError::ExecutionFailed(err.to_string())
    }
}

/// Errors from the page-map engine's own boundary.
///
/// Most failure kinds are deliberately *not* represented here: a script
/// evaluation error or a per-element processing error never escapes the
/// engine, it is logged and swallowed at the point it occurs. Only the
/// kinds that are allowed to propagate (`SelectorMissing`, `DriverNotReady`)
/// have variants.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("either a selector or a ref must be provided, and not neither")]
    SelectorMissing,

    #[error("driver not ready: {0}")]
    DriverNotReady(String),
}

/// Errors from the driver boundary (`BrowserDriver` trait + CDP binding).
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver not ready")]
    NotReady,

    #[error("either a selector or a ref must be provided")]
    SelectorMissing,

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors resolving engine/session configuration from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
