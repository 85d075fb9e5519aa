//! API-request rendering. Takes the driver's `resourceTimingEntries`
//! plus any response bodies the caller managed to re-fetch, and renders
//! them into the third text block the engine exposes.
//!
//! Condensation limits: 10 keys, 5 array items, depth 6, 200-char
//! strings, 50-key safety cap.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

const MAX_OBJECT_KEYS: usize = 10;
const MAX_ARRAY_ITEMS: usize = 5;
const MAX_DEPTH: usize = 6;
const MAX_STRING_LEN: usize = 200;
const MAX_KEY_NAMES_SHOWN: usize = 50;

/// One observed network request, optionally enriched with a re-fetched
/// response body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub url: String,
    pub method: String,
    pub initiator_type: String,
    pub response_body: Option<Value>,
}

/// Last-two-label domain match (`www.example.com` / `api.example.com`
/// both normalize to `example.com`), used by the caller to decide which
/// requests to keep before rendering.
pub fn same_registrable_domain(page_url: &str, request_url: &str) -> bool {
    match (url::Url::parse(page_url), url::Url::parse(request_url)) {
        (Ok(a), Ok(b)) => last_two_labels(a.host_str()) == last_two_labels(b.host_str()),
        _ => false,
    }
}

fn last_two_labels(host: Option<&str>) -> Option<String> {
    let host = host?;
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() >= 2 {
        Some(labels[labels.len() - 2..].join("."))
    } else {
        Some(host.to_string())
    }
}

/// Heuristic JSON-API endpoint detector: case-insensitive substring
/// match against the URL.
pub fn looks_like_json_api(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ["api", "graphql", "json", "data", "query"]
        .iter()
        .any(|kw| lower.contains(kw))
}

/// Recursively condense a JSON value: depth-capped, item-capped, with a
/// summarized tail for whatever got cut.
pub fn condense_json_data(data: &Value, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::String("<max_depth_reached>".to_string());
    }

    match data {
        Value::Object(map) => condense_object(map, depth),
        Value::Array(items) => condense_array(items, depth),
        Value::String(s) if s.chars().count() > MAX_STRING_LEN => {
            let total = s.chars().count();
            let head: String = s.chars().take(MAX_STRING_LEN).collect();
            Value::String(format!("{head}... <truncated, total: {total} chars>"))
        }
        other => other.clone(),
    }
}

fn condense_object(map: &Map<String, Value>, depth: usize) -> Value {
    if map.is_empty() {
        return Value::Object(Map::new());
    }

    let keys: Vec<&String> = map.keys().collect();
    let mut condensed = Map::new();
    for key in keys.iter().take(MAX_OBJECT_KEYS) {
        condensed.insert((*key).clone(), condense_json_data(&map[*key], depth + 1));
    }

    if keys.len() > MAX_OBJECT_KEYS {
        let remaining = &keys[MAX_OBJECT_KEYS..];
        let list = if remaining.len() > MAX_KEY_NAMES_SHOWN {
            let shown: Vec<&str> = remaining[..MAX_KEY_NAMES_SHOWN].iter().map(|s| s.as_str()).collect();
            format!(
                "{}... and {} more",
                shown.join(", "),
                remaining.len() - MAX_KEY_NAMES_SHOWN
            )
        } else {
            remaining.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        };
        condensed.insert(
            format!("__{}_more_keys__", keys.len() - MAX_OBJECT_KEYS),
            Value::String(format!("<{list}>")),
        );
    }

    Value::Object(condensed)
}

fn condense_array(items: &[Value], depth: usize) -> Value {
    if items.is_empty() {
        return Value::Array(Vec::new());
    }

    let mut condensed: Vec<Value> = items
        .iter()
        .take(MAX_ARRAY_ITEMS)
        .map(|item| condense_json_data(item, depth + 1))
        .collect();

    if items.len() > MAX_ARRAY_ITEMS {
        condensed.push(Value::String(format!(
            "... and {} more items (total: {})",
            items.len() - MAX_ARRAY_ITEMS,
            items.len()
        )));
    }

    Value::Array(condensed)
}

fn query_params(url_str: &str) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Ok(parsed) = url::Url::parse(url_str) {
        for (key, value) in parsed.query_pairs() {
            params.entry(key.into_owned()).or_default().push(value.into_owned());
        }
    }
    params
}

/// Render the full API-request block.
pub fn format_api_requests_for_llm(requests: &[ApiRequest]) -> String {
    if requests.is_empty() {
        return "No API requests captured.".to_string();
    }

    let mut sections = Vec::with_capacity(requests.len());

    for (i, req) in requests.iter().enumerate() {
        let mut section = format!("API Request #{}:\n", i + 1);
        section += &format!("  URL: {}\n", req.url);
        section += &format!("  Method: {}\n", req.method);
        section += &format!("  Type: {}\n", req.initiator_type);

        let params = query_params(&req.url);
        if !params.is_empty() {
            section += "  Query Parameters:\n";
            for (key, values) in &params {
                section += &format!("    - {key}: {}\n", values.join(", "));
            }
        }

        if let Some(body) = &req.response_body {
            match body {
                Value::Object(map) => {
                    section += &format!("  Response (JSON Object with {} keys):\n", map.len());
                    let condensed = condense_json_data(body, 0);
                    section += &format!("{}\n", serde_json::to_string_pretty(&condensed).unwrap_or_default());
                }
                Value::Array(items) => {
                    section += &format!("  Response (JSON Array with {} items):\n", items.len());
                    let condensed = condense_json_data(body, 0);
                    section += &format!("{}\n", serde_json::to_string_pretty(&condensed).unwrap_or_default());
                }
                Value::String(text) => {
                    let preview: String = text.chars().take(500).collect();
                    let suffix = if text.chars().count() > 500 { "... (truncated)" } else { "" };
                    section += &format!("  Response (Text):\n{preview}{suffix}\n");
                }
                other => {
                    section += &format!("  Response (Text):\n{other}\n");
                }
            }
        }

        sections.push(section);
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn condense_truncates_long_strings() {
        let value = json!("a".repeat(250));
        let condensed = condense_json_data(&value, 0);
        assert_eq!(
            condensed,
            json!(format!("{}... <truncated, total: 250 chars>", "a".repeat(200)))
        );
    }

    #[test]
    fn condense_summarizes_array_overflow() {
        let value = json!((0..9).collect::<Vec<_>>());
        let condensed = condense_json_data(&value, 0);
        let arr = condensed.as_array().unwrap();
        assert_eq!(arr.len(), 6);
        assert_eq!(arr[5], json!("... and 4 more items (total: 9)"));
    }

    #[test]
    fn condense_summarizes_key_overflow() {
        let mut map = Map::new();
        for i in 0..15 {
            map.insert(format!("k{i}"), json!(i));
        }
        let condensed = condense_json_data(&Value::Object(map), 0);
        let obj = condensed.as_object().unwrap();
        assert_eq!(obj.len(), MAX_OBJECT_KEYS + 1);
        assert!(obj.contains_key("__5_more_keys__"));
    }

    #[test]
    fn condense_returns_placeholder_past_max_depth() {
        let condensed = condense_json_data(&json!(1), MAX_DEPTH + 1);
        assert_eq!(condensed, json!("<max_depth_reached>"));
    }

    #[test]
    fn same_registrable_domain_matches_subdomains() {
        assert!(same_registrable_domain(
            "https://www.example.com/page",
            "https://api.example.com/v1/data"
        ));
        assert!(!same_registrable_domain(
            "https://www.example.com/page",
            "https://other.org/v1/data"
        ));
    }

    #[test]
    fn looks_like_json_api_matches_known_keywords() {
        assert!(looks_like_json_api("https://example.com/api/v1/users"));
        assert!(looks_like_json_api("https://example.com/graphql"));
        assert!(!looks_like_json_api("https://example.com/static/app.js"));
    }

    #[test]
    fn format_reports_no_requests_captured() {
        assert_eq!(format_api_requests_for_llm(&[]), "No API requests captured.");
    }
}
