//! The Page Map Engine: wires the Collector, Element
//! Model, Deduplicator, Pattern Compressor and Formatter into the single
//! `generate_page_map` entry point the tool-wrapper layer calls.
//!
//! Everything downstream of the Collector is pure, synchronous Rust and
//! is exercised directly by the unit tests in each submodule; this
//! module's own tests cover the glue (bucketing, the swallow-and-log
//! error path, domain filtering before re-fetch) rather than
//! re-testing the algorithms themselves.

pub mod api_capture;
pub mod collector;
pub mod compressor;
pub mod dedup;
pub mod formatter;
pub mod model;
pub mod resolver;

use std::time::Duration;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::driver::BrowserDriver;
use crate::error::EngineError;

pub use model::{ElementAttributes, PageElement, PageMap, TableCell};
pub use resolver::resolve;

use api_capture::ApiRequest;
use compressor::CompressionConfig;
use formatter::MapType;

/// Re-fetches a same-origin response body for the API-request block.
/// Kept as a trait so the engine's pure pipeline never depends
/// on `reqwest` directly and can be exercised with a stub in tests.
#[async_trait::async_trait]
pub trait ResponseFetcher: Send + Sync {
    async fn fetch_json(&self, url: &str, cookies: &[crate::driver::Cookie]) -> Option<Value>;
}

/// Generate a Page Map for the driver's current page.
///
/// Any failure evaluating the Collector script degrades to an empty map
/// rather than propagating — a script evaluation error is swallowed.
pub async fn generate_page_map(
    driver: &dyn BrowserDriver,
    fetcher: Option<&dyn ResponseFetcher>,
    cfg: &EngineConfig,
    map_type: MapType,
    include_api: bool,
) -> PageMap {
    let raw = match driver.eval_in_page(&collector::collector_script(cfg.content_cap)).await {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("page map collector script failed: {err}");
            return PageMap::default();
        }
    };

    let elements: Vec<PageElement> = match serde_json::from_value(raw) {
        Ok(elements) => elements,
        Err(err) => {
            tracing::warn!("page map collector returned malformed JSON: {err}");
            return PageMap::default();
        }
    };

    let (interactive, content): (Vec<PageElement>, Vec<PageElement>) =
        elements.iter().cloned().partition(|e| e.is_interactive);

    let interactive = dedup::deduplicate(interactive);

    let compression_cfg = CompressionConfig {
        threshold: cfg.compression_threshold,
        show_first: cfg.show_first,
        show_last: cfg.show_last,
    };
    let interactive_items = compressor::compress(interactive, compression_cfg);
    let content_items = compressor::compress(content, compression_cfg);

    let interactive_text = formatter::render_interactive(&interactive_items, map_type);
    let content_text = formatter::render_content(&content_items, map_type);

    let api_text = if include_api {
        render_api_text(driver, fetcher).await
    } else {
        String::new()
    };

    // The returned element list is every element the Collector marked with
    // `data-agent-ref` — dedup/compression only shape the text blocks, they
    // never prune what's returned (§3: a marker exists on every returned
    // element "and on no others"). `elements` is already interactive-then-
    // content in `index` order, straight from the Collector.
    PageMap {
        elements,
        interactive_text,
        content_text,
        api_text,
    }
}

async fn render_api_text(driver: &dyn BrowserDriver, fetcher: Option<&dyn ResponseFetcher>) -> String {
    let entries = match driver.resource_timing_entries().await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!("resource timing entries unavailable: {err}");
            return "No API requests captured.".to_string();
        }
    };

    let page_url = driver.get_url().await.unwrap_or_default();
    let cookies = driver.cookies().await.unwrap_or_default();

    let mut requests = Vec::with_capacity(entries.len());
    for entry in entries {
        if !page_url.is_empty() && !api_capture::same_registrable_domain(&page_url, &entry.url) {
            continue;
        }

        let response_body = if api_capture::looks_like_json_api(&entry.url) {
            match fetcher {
                Some(f) => f.fetch_json(&entry.url, &cookies).await,
                None => None,
            }
        } else {
            None
        };

        requests.push(ApiRequest {
            url: entry.url,
            method: "GET".to_string(),
            initiator_type: entry.initiator_type,
            response_body,
        });
    }

    api_capture::format_api_requests_for_llm(&requests)
}

/// Resolve a caller-supplied selector/ref into the selector the driver
/// boundary needs, and fail the call if neither was given.
/// `SelectorMissing` is the one engine error that always propagates.
pub fn resolve_or_fail(selector: Option<&str>, r#ref: Option<&str>) -> Result<String, EngineError> {
    resolver::resolve(selector, r#ref).map_err(|_| EngineError::SelectorMissing)
}

/// `wait_for_element` / `wait_for_element_to_change` default timeouts.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_WAIT_CHANGE_TIMEOUT: Duration = Duration::from_secs(15);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Cookie, ResourceTimingEntry};
    use crate::error::DriverError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubDriver {
        collector_json: Value,
        url: String,
    }

    #[async_trait]
    impl BrowserDriver for StubDriver {
        async fn eval_in_page(&self, _script: &str) -> Result<Value, DriverError> {
            Ok(self.collector_json.clone())
        }
        async fn click(&self, _selector: &str) -> Result<bool, DriverError> {
            Ok(true)
        }
        async fn type_text(&self, _selector: &str, _text: &str, _clear_first: bool) -> Result<bool, DriverError> {
            Ok(true)
        }
        async fn press_keys(&self, _selector: Option<&str>, _keys: &str) -> Result<bool, DriverError> {
            Ok(true)
        }
        async fn scroll_to_element(&self, _selector: &str) -> Result<bool, DriverError> {
            Ok(true)
        }
        async fn wait_for_element(&self, _selector: &str, _timeout: Duration) -> Result<bool, DriverError> {
            Ok(true)
        }
        async fn exists(&self, _selector: &str) -> Result<bool, DriverError> {
            Ok(true)
        }
        async fn wait_for_change(&self, _selector: &str, _timeout: Duration) -> Result<bool, DriverError> {
            Ok(true)
        }
        async fn get_url(&self) -> Result<String, DriverError> {
            Ok(self.url.clone())
        }
        async fn get_title(&self) -> Result<String, DriverError> {
            Ok("Title".to_string())
        }
        async fn screenshot_png(&self) -> Result<Vec<u8>, DriverError> {
            Ok(vec![])
        }
        async fn resource_timing_entries(&self) -> Result<Vec<ResourceTimingEntry>, DriverError> {
            Ok(vec![])
        }
        async fn cookies(&self) -> Result<Vec<Cookie>, DriverError> {
            Ok(vec![])
        }
    }

    fn failing_script_driver() -> StubDriver {
        StubDriver {
            collector_json: Value::Null,
            url: "https://example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn s1_simple_page_orders_interactive_before_content() {
        let elements = serde_json::json!([
            {
                "ref": "0", "tag": "a", "text": "Go", "childrenText": "",
                "attributes": {"href": "/x"}, "dataAttributes": {}, "tableCells": [],
                "isInteractive": true, "cssSelector": "body > a", "index": 0
            },
            {
                "ref": "1", "tag": "h1", "text": "Hi", "childrenText": "",
                "attributes": {}, "dataAttributes": {}, "tableCells": [],
                "isInteractive": false, "cssSelector": "body > h1", "index": 1
            }
        ]);
        let driver = StubDriver {
            collector_json: elements,
            url: "https://example.com".to_string(),
        };
        let cfg = EngineConfig::default();
        let map = generate_page_map(&driver, None, &cfg, MapType::Lean, false).await;

        assert_eq!(map.elements.len(), 2);
        assert!(map.interactive_text.contains("TEXT:\"Go\""));
        assert!(map.content_text.contains("TEXT:\"Hi\""));
    }

    #[tokio::test]
    async fn malformed_collector_output_degrades_to_empty_map() {
        let driver = failing_script_driver();
        let cfg = EngineConfig::default();
        let map = generate_page_map(&driver, None, &cfg, MapType::Lean, false).await;
        assert!(map.elements.is_empty());
        assert!(map.interactive_text.is_empty());
        assert!(map.content_text.is_empty());
    }

    #[tokio::test]
    async fn api_text_filters_by_registrable_domain() {
        struct Tracker(Mutex<Vec<String>>);
        #[async_trait]
        impl ResponseFetcher for Tracker {
            async fn fetch_json(&self, url: &str, _cookies: &[Cookie]) -> Option<Value> {
                self.0.lock().unwrap().push(url.to_string());
                None
            }
        }

        struct ApiDriver;
        #[async_trait]
        impl BrowserDriver for ApiDriver {
            async fn eval_in_page(&self, _s: &str) -> Result<Value, DriverError> {
                Ok(serde_json::json!([]))
            }
            async fn click(&self, _s: &str) -> Result<bool, DriverError> {
                Ok(true)
            }
            async fn type_text(&self, _s: &str, _t: &str, _c: bool) -> Result<bool, DriverError> {
                Ok(true)
            }
            async fn press_keys(&self, _s: Option<&str>, _k: &str) -> Result<bool, DriverError> {
                Ok(true)
            }
            async fn scroll_to_element(&self, _s: &str) -> Result<bool, DriverError> {
                Ok(true)
            }
            async fn wait_for_element(&self, _s: &str, _t: Duration) -> Result<bool, DriverError> {
                Ok(true)
            }
            async fn exists(&self, _s: &str) -> Result<bool, DriverError> {
                Ok(true)
            }
            async fn wait_for_change(&self, _s: &str, _t: Duration) -> Result<bool, DriverError> {
                Ok(true)
            }
            async fn get_url(&self) -> Result<String, DriverError> {
                Ok("https://example.com/page".to_string())
            }
            async fn get_title(&self) -> Result<String, DriverError> {
                Ok(String::new())
            }
            async fn screenshot_png(&self) -> Result<Vec<u8>, DriverError> {
                Ok(vec![])
            }
            async fn resource_timing_entries(&self) -> Result<Vec<ResourceTimingEntry>, DriverError> {
                Ok(vec![
                    ResourceTimingEntry {
                        url: "https://api.example.com/data".to_string(),
                        initiator_type: "fetch".to_string(),
                        duration: 1.0,
                        size: 10.0,
                        start_time: 0.0,
                        response_end: 1.0,
                    },
                    ResourceTimingEntry {
                        url: "https://other.org/data".to_string(),
                        initiator_type: "fetch".to_string(),
                        duration: 1.0,
                        size: 10.0,
                        start_time: 0.0,
                        response_end: 1.0,
                    },
                ])
            }
            async fn cookies(&self) -> Result<Vec<Cookie>, DriverError> {
                Ok(vec![])
            }
        }

        let tracker = Tracker(Mutex::new(Vec::new()));
        let driver = ApiDriver;
        let cfg = EngineConfig::default();
        let map = generate_page_map(&driver, Some(&tracker), &cfg, MapType::Lean, true).await;

        let fetched = tracker.0.lock().unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0], "https://api.example.com/data");
        assert!(map.api_text.contains("api.example.com"));
        assert!(!map.api_text.contains("other.org"));
    }
}
