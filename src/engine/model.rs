//! The Element Model: typed normalization of the In-Page Collector's raw
//! JSON records.
//!
//! The collector script assigns `ref`/`index` and writes `data-agent-ref`
//! onto the live DOM itself (it has to — that's an in-page side effect),
//! so by the time a record reaches Rust it already carries those fields.
//! This module's job is just to give that JSON a typed shape the rest of
//! the pipeline can work with without re-parsing `serde_json::Value`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The fixed attribute set read off every kept element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAttributes {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "ariaLabel")]
    pub aria_label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default, rename = "className")]
    pub class_name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub r#type: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub disabled: bool,
}

/// One `<td>`/`<th>` cell belonging to a kept `<tr>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "dataLabel")]
    pub data_label: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// One row in the Page Map — a normalized, kept DOM element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub r#ref: String,
    pub tag: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "childrenText")]
    pub children_text: String,
    #[serde(default)]
    pub attributes: ElementAttributes,
    #[serde(default, rename = "dataAttributes")]
    pub data_attributes: HashMap<String, String>,
    #[serde(default, rename = "tableCells")]
    pub table_cells: Vec<TableCell>,
    #[serde(default, rename = "isInteractive")]
    pub is_interactive: bool,
    #[serde(rename = "cssSelector")]
    pub css_selector: String,
    pub index: usize,
}

impl PageElement {
    /// `text` if non-empty, else `childrenText` — the element's "effective text".
    pub fn effective_text(&self) -> &str {
        if !self.text.is_empty() {
            &self.text
        } else {
            &self.children_text
        }
    }

    /// The fixed native-interactive tag set used throughout dedup.
    pub fn is_native_interactive(&self) -> bool {
        matches!(
            self.tag.as_str(),
            "a" | "button" | "input" | "select" | "textarea"
        )
    }

    /// `[data-agent-ref="<ref>"]`, the only selector the resolver ever
    /// needs to construct.
    pub fn ref_selector(&self) -> String {
        format!("[data-agent-ref=\"{}\"]", self.r#ref)
    }

    /// Per-element signature used by the Pattern Compressor's repeating-
    /// sequence detector: tag plus the sorted, `data-agent-ref`-excluded
    /// data attribute key set.
    pub fn structural_signature(&self) -> String {
        let mut keys: Vec<&str> = self
            .data_attributes
            .keys()
            .map(String::as_str)
            .filter(|k| *k != "data-agent-ref")
            .collect();
        keys.sort_unstable();
        format!("{}:{}", self.tag, keys.join(","))
    }
}

/// The engine's output: the kept element list plus the three rendered
/// text blocks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageMap {
    pub elements: Vec<PageElement>,
    pub interactive_text: String,
    pub content_text: String,
    pub api_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_text_prefers_text() {
        let mut e = PageElement {
            text: "Go".to_string(),
            children_text: "ignored".to_string(),
            ..Default::default()
        };
        assert_eq!(e.effective_text(), "Go");
        e.text.clear();
        assert_eq!(e.effective_text(), "ignored");
    }

    #[test]
    fn native_interactive_tags() {
        for tag in ["a", "button", "input", "select", "textarea"] {
            let e = PageElement {
                tag: tag.to_string(),
                ..Default::default()
            };
            assert!(e.is_native_interactive());
        }
        let e = PageElement {
            tag: "div".to_string(),
            ..Default::default()
        };
        assert!(!e.is_native_interactive());
    }

    #[test]
    fn deserializes_collector_json_shape() {
        let json = serde_json::json!({
            "ref": "0",
            "tag": "a",
            "text": "Go",
            "childrenText": "",
            "attributes": {"href": "/x"},
            "dataAttributes": {},
            "tableCells": [],
            "isInteractive": true,
            "cssSelector": "a:nth-child(2)",
            "index": 0
        });
        let elem: PageElement = serde_json::from_value(json).unwrap();
        assert_eq!(elem.r#ref, "0");
        assert_eq!(elem.attributes.href, "/x");
        assert!(elem.is_interactive);
    }
}
