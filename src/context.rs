//! Minimal per-call context threaded through the `Tool` trait.
//!
//! Deliberately thin: this crate only needs enough to identify which
//! session a tool call belongs to, since the session manager (not the
//! context) owns the actual browser/engine state.

#[derive(Debug, Clone)]
pub struct JobContext {
    pub session_id: String,
}

impl JobContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}
