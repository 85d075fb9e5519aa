//! The Formatter: renders the Compressor's ordered item stream into the
//! two plain-text blocks an LLM agent actually reads. An include-if-
//! non-empty field list per line rather than a templating layer.

use crate::engine::compressor::CompressedItem;
use crate::engine::model::PageElement;

/// Output verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapType {
    Lean,
    Rich,
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Href gets URL-aware truncation: keep `scheme://host`, then `...<tail>`
/// if the middle would otherwise be chopped mid-path.
fn truncate_href(href: &str, max: usize) -> String {
    if href.chars().count() <= max {
        return href.to_string();
    }
    if let Ok(url) = url::Url::parse(href) {
        let prefix = format!("{}://{}", url.scheme(), url.host_str().unwrap_or(""));
        if let Some(budget) = max.checked_sub(prefix.chars().count() + 3) {
            let tail: String = href.chars().rev().take(budget).collect::<Vec<_>>().into_iter().rev().collect();
            return format!("{prefix}...{tail}");
        }
    }
    truncate_chars(href, max)
}

fn prefix(mode: MapType, el: &PageElement) -> String {
    match mode {
        MapType::Lean => format!("ref=\"{}\"", el.r#ref),
        MapType::Rich => format!("CSS: {}", el.css_selector),
    }
}

/// One interactive-element line, or `None` if it has no discriminator
/// at all.
fn format_interactive_line(el: &PageElement, mode: MapType) -> Option<String> {
    let attrs = &el.attributes;
    let has_discriminator = !el.text.is_empty()
        || !el.children_text.is_empty()
        || !attrs.aria_label.is_empty()
        || !attrs.placeholder.is_empty()
        || !attrs.id.is_empty()
        || !attrs.value.is_empty()
        || !attrs.name.is_empty()
        || !attrs.r#type.is_empty()
        || !attrs.href.is_empty()
        || !attrs.title.is_empty()
        || attrs.disabled;
    if !has_discriminator {
        return None;
    }

    let mut fields = vec![format!("{}:", el.tag.to_uppercase())];

    if !el.text.is_empty() {
        fields.push(format!("TEXT:\"{}\"", truncate_chars(&el.text, 100)));
    } else if !el.children_text.is_empty() {
        fields.push(format!(
            "CHILDREN_TEXT:\"{}\"",
            truncate_chars(&el.children_text, 100)
        ));
    }
    if !attrs.aria_label.is_empty() {
        fields.push(format!("aria-label=\"{}\"", truncate_chars(&attrs.aria_label, 50)));
    }
    if !attrs.placeholder.is_empty() {
        fields.push(format!("placeholder=\"{}\"", truncate_chars(&attrs.placeholder, 50)));
    }
    if !attrs.id.is_empty() {
        fields.push(format!("id=\"{}\"", truncate_chars(&attrs.id, 50)));
    }
    if !attrs.value.is_empty() {
        fields.push(format!("value=\"{}\"", truncate_chars(&attrs.value, 50)));
    }
    if !attrs.name.is_empty() {
        fields.push(format!("name=\"{}\"", truncate_chars(&attrs.name, 50)));
    }
    if !attrs.r#type.is_empty() {
        fields.push(format!("type=\"{}\"", truncate_chars(&attrs.r#type, 50)));
    }
    if !attrs.href.is_empty() {
        fields.push(format!("href=\"{}\"", truncate_href(&attrs.href, 80)));
    }
    if !attrs.title.is_empty() {
        fields.push(format!("title=\"{}\"", truncate_chars(&attrs.title, 50)));
    }
    if attrs.disabled {
        fields.push("disabled=\"true\"".to_string());
    }

    Some(format!("{} | {}", prefix(mode, el), fields.join(" ")))
}

/// One content-element line, or `None` if neither text nor a meaningful
/// attribute is present.
fn format_content_line(el: &PageElement, mode: MapType) -> Option<String> {
    let attrs = &el.attributes;
    let meaningful_data = el
        .data_attributes
        .keys()
        .any(|k| k != "data-agent-ref");

    let has_row = el.tag == "tr" && !el.table_cells.is_empty();
    let has_text = !el.effective_text().is_empty();

    if !has_text && !has_row && attrs.id.is_empty() && attrs.title.is_empty() && !meaningful_data {
        return None;
    }

    let mut fields = vec![format!("{}:", el.tag.to_uppercase())];

    if !attrs.id.is_empty() {
        fields.push(format!("id=\"{}\"", attrs.id));
    }
    if !attrs.title.is_empty() {
        fields.push(format!("title=\"{}\"", truncate_chars(&attrs.title, 100)));
    }

    let mut data_keys: Vec<&String> = el.data_attributes.keys().filter(|k| k.as_str() != "data-agent-ref").collect();
    data_keys.sort();
    for key in data_keys {
        let value = &el.data_attributes[key];
        fields.push(format!("{key}=\"{}\"", truncate_chars(value, 100)));
    }

    if has_row {
        let row: Vec<String> = el
            .table_cells
            .iter()
            .map(|cell| {
                let key = cell.data_label.clone().unwrap_or_else(|| "cell".to_string());
                format!("{key}={}", cell.text)
            })
            .collect();
        fields.push(format!("ROW: {}", row.join(" | ")));
    } else if has_text {
        fields.push(format!("TEXT:\"{}\"", truncate_chars(el.effective_text(), 200)));
    }

    Some(format!("{} | {}", prefix(mode, el), fields.join(" ")))
}

fn marker_line(mode: MapType, pattern: &str, hidden: usize) -> String {
    match mode {
        MapType::Rich => format!("... [{hidden} more elements with pattern: {pattern}]"),
        MapType::Lean => format!("... [{hidden} more similar elements]"),
    }
}

fn render_items<F>(items: &[CompressedItem], mode: MapType, format_one: F) -> String
where
    F: Fn(&PageElement, MapType) -> Option<String>,
{
    let mut lines = Vec::new();
    for item in items {
        match item {
            CompressedItem::Element(el) => {
                if let Some(line) = format_one(el, mode) {
                    lines.push(line);
                }
            }
            CompressedItem::Compressed {
                pattern,
                count,
                shown,
                show_first,
                show_last,
            } => {
                let head = &shown[..(*show_first).min(shown.len())];
                let tail = &shown[(*show_first).min(shown.len())..];
                for el in head {
                    if let Some(line) = format_one(el, mode) {
                        lines.push(line);
                    }
                }
                let hidden = count.saturating_sub(shown.len());
                lines.push(marker_line(mode, pattern, hidden));
                for el in tail.iter().take(*show_last) {
                    if let Some(line) = format_one(el, mode) {
                        lines.push(line);
                    }
                }
            }
        }
    }
    lines.join("\n")
}

/// Render the interactive-element text block.
pub fn render_interactive(items: &[CompressedItem], mode: MapType) -> String {
    render_items(items, mode, format_interactive_line)
}

/// Render the content-element text block.
pub fn render_content(items: &[CompressedItem], mode: MapType) -> String {
    render_items(items, mode, format_content_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interactive(tag: &str, text: &str, r#ref: &str) -> PageElement {
        PageElement {
            r#ref: r#ref.to_string(),
            tag: tag.to_string(),
            text: text.to_string(),
            css_selector: format!("{tag}#{ref}"),
            is_interactive: true,
            ..Default::default()
        }
    }

    #[test]
    fn skips_interactive_element_with_no_discriminator() {
        let el = PageElement {
            r#ref: "0".to_string(),
            tag: "div".to_string(),
            is_interactive: true,
            ..Default::default()
        };
        assert!(format_interactive_line(&el, MapType::Lean).is_none());
    }

    #[test]
    fn lean_prefix_uses_ref_rich_prefix_uses_selector() {
        let el = interactive("button", "Go", "3");
        let lean = format_interactive_line(&el, MapType::Lean).unwrap();
        let rich = format_interactive_line(&el, MapType::Rich).unwrap();
        assert!(lean.starts_with("ref=\"3\""));
        assert!(rich.starts_with("CSS: button#3"));
        assert!(lean.contains("TEXT:\"Go\""));
    }

    #[test]
    fn disabled_only_renders_when_true() {
        let mut el = interactive("button", "Go", "1");
        el.attributes.disabled = true;
        let line = format_interactive_line(&el, MapType::Lean).unwrap();
        assert!(line.contains("disabled=\"true\""));
    }

    #[test]
    fn truncate_href_preserves_scheme_and_host() {
        let long = format!("https://example.com/{}", "a".repeat(200));
        let truncated = truncate_href(&long, 80);
        assert!(truncated.starts_with("https://example.com..."));
        assert!(truncated.chars().count() <= 83);
    }

    #[test]
    fn compression_marker_uses_pattern_phrasing_per_mode() {
        let shown = vec![interactive("a", "1", "0"), interactive("a", "2", "1")];
        let items = vec![CompressedItem::Compressed {
            pattern: "repeating sequence of 2 elements".to_string(),
            count: 40,
            shown,
            show_first: 2,
            show_last: 0,
        }];
        let rich = render_interactive(&items, MapType::Rich);
        assert!(rich.contains("more elements with pattern: repeating sequence of 2 elements"));
        let lean = render_interactive(&items, MapType::Lean);
        assert!(lean.contains("more similar elements"));
    }

    #[test]
    fn content_row_renders_table_cells_with_data_label_keys() {
        use crate::engine::model::TableCell;
        let el = PageElement {
            r#ref: "5".to_string(),
            tag: "tr".to_string(),
            css_selector: "table > tr:nth-child(1)".to_string(),
            table_cells: vec![
                TableCell {
                    text: "Alice".to_string(),
                    data_label: Some("name".to_string()),
                    title: None,
                },
                TableCell {
                    text: "30".to_string(),
                    data_label: Some("age".to_string()),
                    title: None,
                },
            ],
            ..Default::default()
        };
        let line = format_content_line(&el, MapType::Lean).unwrap();
        assert!(line.contains("ROW: name=Alice | age=30"));
    }
}
