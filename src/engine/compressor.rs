//! The Pattern Compressor: detects long runs of structurally identical
//! siblings and replaces the interior with a single compression marker,
//! keeping head and tail samples.
//!
//! Two detectors: a repeating-sequence detector tried first, falling
//! back to a consecutive-pattern-run walk over canonicalized selectors.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::engine::model::PageElement;

/// One item in the compressor's output stream.
#[derive(Debug, Clone)]
pub enum CompressedItem {
    Element(PageElement),
    Compressed {
        pattern: String,
        count: usize,
        shown: Vec<PageElement>,
        show_first: usize,
        show_last: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct CompressionConfig {
    pub threshold: usize,
    pub show_first: usize,
    pub show_last: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            threshold: 15,
            show_first: 10,
            show_last: 2,
        }
    }
}

/// Runs C1, falling back to C2 if C1 finds no qualifying repetition.
pub fn compress(elements: Vec<PageElement>, cfg: CompressionConfig) -> Vec<CompressedItem> {
    if let Some(items) = detect_repeating_sequences(&elements, cfg) {
        return items;
    }
    detect_pattern_runs(elements, cfg)
}

/// C1 — repeating multi-element sequences.
fn detect_repeating_sequences(
    elements: &[PageElement],
    cfg: CompressionConfig,
) -> Option<Vec<CompressedItem>> {
    if elements.len() < cfg.threshold {
        return None;
    }

    let signatures: Vec<String> = elements.iter().map(PageElement::structural_signature).collect();

    let max_l = (elements.len() / 3).min(10);
    if max_l < 2 {
        return None;
    }

    let mut best_l = None;
    let mut best_count = 0usize;

    for l in 2..=max_l {
        let mut counts: HashMap<&[String], usize> = HashMap::new();
        for chunk in signatures.chunks_exact(l) {
            *counts.entry(chunk).or_insert(0) += 1;
        }
        let max_count = counts.values().copied().max().unwrap_or(0);
        // ⌈threshold / l⌉, per §4.4 C1.
        let required = cfg.threshold.div_ceil(l);
        if max_count >= required && max_count > best_count {
            best_count = max_count;
            best_l = Some(l);
        }
    }

    let l = best_l?;
    if best_count < 3 {
        return None;
    }

    let mut items = Vec::new();
    let mut found_any = false;
    let mut i = 0usize;

    while i + l <= elements.len() {
        let window = &signatures[i..i + l];
        let mut instances = 1usize;
        let mut j = i + l;
        while j + l <= elements.len() && &signatures[j..j + l] == window {
            instances += 1;
            j += l;
        }

        if instances >= 3 {
            found_any = true;
            let total = instances * l;
            let chunks: Vec<&[PageElement]> = (0..instances)
                .map(|k| &elements[i + k * l..i + (k + 1) * l])
                .collect();

            let shown: Vec<PageElement> = if instances > cfg.show_first + cfg.show_last {
                chunks[..cfg.show_first]
                    .iter()
                    .chain(chunks[instances - cfg.show_last..].iter())
                    .flat_map(|c| c.iter().cloned())
                    .collect()
            } else {
                chunks.iter().flat_map(|c| c.iter().cloned()).collect()
            };

            items.push(CompressedItem::Compressed {
                pattern: format!("repeating sequence of {l} elements"),
                count: total,
                shown,
                show_first: cfg.show_first * l,
                show_last: cfg.show_last * l,
            });
            i += total;
        } else {
            for e in &elements[i..i + l] {
                items.push(CompressedItem::Element(e.clone()));
            }
            i += l;
        }
    }

    for e in &elements[i..] {
        items.push(CompressedItem::Element(e.clone()));
    }

    if found_any { Some(items) } else { None }
}

/// C2 — consecutive identical CSS-pattern runs (fallback detector).
fn detect_pattern_runs(elements: Vec<PageElement>, cfg: CompressionConfig) -> Vec<CompressedItem> {
    let mut items = Vec::new();
    let mut i = 0usize;

    while i < elements.len() {
        let pattern = extract_css_pattern(&elements[i].css_selector);
        let mut j = i + 1;
        while j < elements.len() && extract_css_pattern(&elements[j].css_selector) == pattern {
            j += 1;
        }
        let run_len = j - i;

        if run_len >= cfg.threshold {
            let run = &elements[i..j];
            let shown: Vec<PageElement> = if run_len > cfg.show_first + cfg.show_last {
                run[..cfg.show_first]
                    .iter()
                    .chain(run[run_len - cfg.show_last..].iter())
                    .cloned()
                    .collect()
            } else {
                run.to_vec()
            };
            items.push(CompressedItem::Compressed {
                pattern,
                count: run_len,
                shown,
                show_first: cfg.show_first,
                show_last: cfg.show_last,
            });
        } else {
            for e in &elements[i..j] {
                items.push(CompressedItem::Element(e.clone()));
            }
        }

        i = j;
    }

    items
}

fn id_underscore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#([\w-]+?)_[A-Za-z0-9]{6,}").unwrap())
}
fn id_hyphen_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#([\w-]+?)-[A-Za-z0-9]{6,}").unwrap())
}
fn id_standalone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#[A-Za-z0-9]{8,}(?:\s|>|$)").unwrap())
}
fn nth_child_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":nth-child\(\d+\)").unwrap())
}
fn trailing_numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([_-])\d+(?:\s|>|\.|\[|$)").unwrap())
}

/// Canonicalize a CSS selector's variable bits to `*`.
pub fn extract_css_pattern(selector: &str) -> String {
    let s = id_underscore_re().replace_all(selector, "#${1}_*");
    let s = id_hyphen_re().replace_all(&s, "#${1}-*");
    let s = id_standalone_re().replace_all(&s, |caps: &regex::Captures| {
        let whole = &caps[0];
        let trailer = &whole[whole.len() - 1..];
        if trailer == ">" || trailer.chars().next().is_some_and(char::is_whitespace) {
            format!("#*{trailer}")
        } else {
            "#*".to_string()
        }
    });
    let s = nth_child_re().replace_all(&s, ":nth-child(*)");
    let s = trailing_numeric_re().replace_all(&s, |caps: &regex::Captures| {
        let sep = &caps[1];
        let whole = &caps[0];
        let trailer = &whole[whole.len() - 1..];
        format!("{sep}*{trailer}")
    });
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(i: usize) -> PageElement {
        PageElement {
            r#ref: i.to_string(),
            tag: "li".to_string(),
            text: "x".to_string(),
            css_selector: format!("ul > li:nth-child({})", i + 1),
            data_attributes: Default::default(),
            ..Default::default()
        }
    }

    #[test]
    fn s5_compresses_40_identical_rows_to_head_and_tail_samples() {
        let elements: Vec<PageElement> = (0..40).map(row).collect();
        let cfg = CompressionConfig {
            threshold: 15,
            show_first: 10,
            show_last: 2,
        };
        let items = compress(elements, cfg);

        assert_eq!(items.len(), 1, "the whole run collapses to one marker");
        match &items[0] {
            CompressedItem::Compressed { count, shown, .. } => {
                assert_eq!(*count, 40);
                assert_eq!(shown.len(), 24, "10 head + 2 tail chunks of 2 elements each");
            }
            _ => panic!("expected a compression marker"),
        }
    }

    #[test]
    fn below_threshold_emits_individual_elements() {
        let elements: Vec<PageElement> = (0..5).map(row).collect();
        let cfg = CompressionConfig::default();
        let items = compress(elements, cfg);
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| matches!(i, CompressedItem::Element(_))));
    }

    #[test]
    fn extract_css_pattern_canonicalizes_underscored_hash_id() {
        let pattern = extract_css_pattern("div#item_ab12cd.row");
        assert_eq!(pattern, "div#item_*.row");
    }

    #[test]
    fn extract_css_pattern_canonicalizes_nth_child() {
        let pattern = extract_css_pattern("ul > li:nth-child(7)");
        assert_eq!(pattern, "ul > li:nth-child(*)");
    }

    #[test]
    fn extract_css_pattern_canonicalizes_trailing_numeric_segment() {
        let pattern = extract_css_pattern("div.row-42");
        assert_eq!(pattern, "div.row-*");
    }
}
