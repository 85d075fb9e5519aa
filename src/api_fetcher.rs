//! `ReqwestFetcher`: the one concrete `engine::ResponseFetcher`, used to
//! re-fetch same-origin JSON-API bodies for the API-request text block.
//!
//! A failed re-fetch is swallowed here, not surfaced as an error — the
//! engine keeps the URL/metadata entry and simply omits the body.

use serde_json::Value;

use crate::driver::Cookie;
use crate::engine::ResponseFetcher;

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ResponseFetcher for ReqwestFetcher {
    async fn fetch_json(&self, url: &str, cookies: &[Cookie]) -> Option<Value> {
        let cookie_header = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        let mut request = self.client.get(url);
        if !cookie_header.is_empty() {
            request = request.header(reqwest::header::COOKIE, cookie_header);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(err) => {
                tracing::debug!("api re-fetch failed for {url}: {err}");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("api re-fetch for {url} returned {}", response.status());
            return None;
        }

        match response.json::<Value>().await {
            Ok(body) => Some(body),
            Err(err) => {
                tracing::debug!("api re-fetch body for {url} was not JSON: {err}");
                None
            }
        }
    }
}
