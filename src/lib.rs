//! `pagemapper`: turns a live Chrome tab into a compact, LLM-consumable
//! map of its interactive and content elements.
//!
//! ```text
//! driver::BrowserDriver  (CDP transport boundary, owns the Chrome tab)
//!         │
//!         ▼
//! engine::generate_page_map  (Collector → Dedup → Compressor → Formatter)
//!         │
//!         ▼
//! tools::builtin::BrowserTool  (agent-facing Tool, session-scoped)
//! ```
//!
//! `engine` never depends on `driver::cdp` or `tools` directly — it only
//! sees the `BrowserDriver` and `ResponseFetcher` traits, so the pure
//! parts of the pipeline (dedup, compression, formatting) are unit
//! tested without a real browser.

pub mod api_fetcher;
pub mod config;
pub mod context;
pub mod debug_dump;
pub mod driver;
pub mod engine;
pub mod error;
pub mod stealth;
pub mod tool;
pub mod tools;

pub use error::{ConfigError, DriverError, EngineError, ToolError};
pub use tool::{Tool, ToolOutput};
