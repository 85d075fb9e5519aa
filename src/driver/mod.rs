//! The `BrowserDriver` boundary: verb-only, transport-free operations
//! the engine consumes. The engine module never imports a CDP
//! type directly — it only ever sees this trait, so the Collector/
//! Deduplicator/Compressor/Formatter pipeline stays testable without a
//! real browser.

pub mod cdp;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DriverError;

/// One `performance.getEntriesByType('resource')` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTimingEntry {
    pub url: String,
    pub initiator_type: String,
    pub duration: f64,
    pub size: f64,
    pub start_time: f64,
    pub response_end: f64,
}

/// A browser cookie, re-attached to outbound response re-fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// The verb-only boundary the page-map engine consumes.
///
/// Action verbs return `Ok(false)` when the driver ran but the action did
/// not take effect (element not found, nothing to click) and reserve
/// `Err` for transport failures or a driver that isn't ready yet.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn eval_in_page(&self, script: &str) -> Result<Value, DriverError>;

    async fn click(&self, selector: &str) -> Result<bool, DriverError>;
    async fn type_text(&self, selector: &str, text: &str, clear_first: bool) -> Result<bool, DriverError>;
    async fn press_keys(&self, selector: Option<&str>, keys: &str) -> Result<bool, DriverError>;
    async fn scroll_to_element(&self, selector: &str) -> Result<bool, DriverError>;

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<bool, DriverError>;
    async fn exists(&self, selector: &str) -> Result<bool, DriverError>;
    async fn wait_for_change(&self, selector: &str, timeout: Duration) -> Result<bool, DriverError>;

    async fn get_url(&self) -> Result<String, DriverError>;
    async fn get_title(&self) -> Result<String, DriverError>;
    async fn screenshot_png(&self) -> Result<Vec<u8>, DriverError>;

    async fn resource_timing_entries(&self) -> Result<Vec<ResourceTimingEntry>, DriverError>;
    async fn cookies(&self) -> Result<Vec<Cookie>, DriverError>;
}
