//! The Deduplicator: removes redundant parent/child interactive elements
//! that share the same effective text, keeping the most informative
//! survivor.
//!
//! Two passes: identical-text grouping with a quality-score tiebreak,
//! then a subset-text nesting pass with a pagination-link allowlist
//! (including the literal `"..."` token).

use std::collections::HashMap;

use crate::engine::model::PageElement;

const NATIVE_INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];

fn is_native_interactive(tag: &str) -> bool {
    NATIVE_INTERACTIVE_TAGS.contains(&tag)
}

/// Additive integer quality score. Higher wins; ties are resolved by
/// insertion order (stable) since the caller does not care.
pub fn quality_score(el: &PageElement) -> i32 {
    let mut score = 0;

    if !el.text.is_empty() {
        score += 100;
    } else if !el.children_text.is_empty() {
        score += 50;
    }

    score += match el.tag.as_str() {
        "a" => 50,
        "button" => 45,
        "input" => 40,
        "select" => 35,
        "textarea" => 30,
        "label" => 25,
        "p" => 20,
        "span" => 15,
        "div" => 10,
        _ => 5,
    };

    if !el.attributes.id.is_empty() {
        score += 20;
    }
    if !el.attributes.href.is_empty() {
        score += 15;
    }
    if !el.attributes.aria_label.is_empty() {
        score += 10;
    }
    if !el.attributes.r#type.is_empty() {
        score += 8;
    }
    if !el.attributes.name.is_empty() {
        score += 5;
    }
    if !el.attributes.value.is_empty() {
        score += 5;
    }

    let len = el.css_selector.len();
    if len > 100 {
        score -= 5;
    }
    if len > 200 {
        score -= 5;
    }

    score
}

/// `descendant` iff its selector nests inside `parent`'s selector (shared
/// nesting predicate used by both D1 and D2).
fn is_nested(parent_selector: &str, child_selector: &str) -> bool {
    if child_selector.starts_with(&format!("{parent_selector} "))
        || child_selector.starts_with(&format!("{parent_selector}>"))
    {
        return true;
    }
    child_selector.contains(parent_selector) && child_selector.len() > parent_selector.len()
}

fn is_likely_pagination(el: &PageElement) -> bool {
    if el.tag != "a" {
        return false;
    }
    let text = el.effective_text();
    if text.chars().count() > 3 {
        return false;
    }
    if text.chars().all(|c| c.is_ascii_digit()) && !text.is_empty() {
        return true;
    }
    matches!(text.to_ascii_lowercase().as_str(), "next" | "prev" | "previous" | "...")
}

/// Runs both passes over the interactive bucket. Content elements are
/// untouched — dedup applies to interactive elements only.
pub fn deduplicate(elements: Vec<PageElement>) -> Vec<PageElement> {
    let survivors = d1_identical_text_grouping(elements);
    d2_subset_text_nesting(survivors)
}

fn d1_identical_text_grouping(elements: Vec<PageElement>) -> Vec<PageElement> {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, el) in elements.iter().enumerate() {
        groups
            .entry(el.effective_text().to_string())
            .or_default()
            .push(idx);
    }

    let mut removed = vec![false; elements.len()];

    for (text, mut indices) in groups {
        if text.is_empty() || indices.len() < 2 {
            continue;
        }

        indices.sort_by_key(|&i| elements[i].css_selector.len());

        for pos_a in 0..indices.len() {
            let idx_a = indices[pos_a];
            if removed[idx_a] {
                continue;
            }
            let mut pos_b = pos_a + 1;
            'descendants: while pos_b < indices.len() {
                let idx_b = indices[pos_b];
                if removed[idx_b] {
                    pos_b += 1;
                    continue;
                }

                let (parent_idx, child_idx) = (idx_a, idx_b);
                let nested = is_nested(
                    &elements[parent_idx].css_selector,
                    &elements[child_idx].css_selector,
                );
                if !nested {
                    pos_b += 1;
                    continue;
                }

                let parent_native = is_native_interactive(&elements[parent_idx].tag);
                let child_native = is_native_interactive(&elements[child_idx].tag);

                if child_native && !parent_native {
                    removed[parent_idx] = true;
                    break 'descendants;
                } else if parent_native && !child_native {
                    removed[child_idx] = true;
                    pos_b += 1;
                } else {
                    let parent_score = quality_score(&elements[parent_idx]);
                    let child_score = quality_score(&elements[child_idx]);
                    if parent_score >= child_score {
                        removed[child_idx] = true;
                        pos_b += 1;
                    } else {
                        removed[parent_idx] = true;
                        break 'descendants;
                    }
                }
            }
        }

        let remaining: Vec<usize> = indices.iter().copied().filter(|i| !removed[*i]).collect();
        if remaining.len() > 1 {
            let best = *remaining
                .iter()
                .max_by_key(|&&i| quality_score(&elements[i]))
                .expect("remaining is non-empty");
            for &i in &remaining {
                if i != best {
                    removed[i] = true;
                }
            }
        }
    }

    elements
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !removed[*i])
        .map(|(_, e)| e)
        .collect()
}

fn d2_subset_text_nesting(elements: Vec<PageElement>) -> Vec<PageElement> {
    let mut order: Vec<usize> = (0..elements.len()).collect();
    order.sort_by_key(|&i| elements[i].css_selector.len());

    let mut removed = vec![false; elements.len()];

    for &parent_idx in &order {
        if removed[parent_idx] {
            continue;
        }
        for &child_idx in &order {
            if child_idx == parent_idx || removed[child_idx] {
                continue;
            }
            if !is_nested(
                &elements[parent_idx].css_selector,
                &elements[child_idx].css_selector,
            ) {
                continue;
            }

            let parent_text = elements[parent_idx].effective_text();
            let child_text = elements[child_idx].effective_text();
            if child_text.is_empty() || child_text == parent_text {
                continue;
            }
            if !parent_text.contains(child_text) {
                continue;
            }
            if is_likely_pagination(&elements[child_idx]) {
                continue;
            }

            removed[child_idx] = true;
        }
    }

    elements
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !removed[*i])
        .map(|(_, e)| e)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::ElementAttributes;

    fn el(tag: &str, text: &str, selector: &str) -> PageElement {
        PageElement {
            r#ref: selector.to_string(),
            tag: tag.to_string(),
            text: text.to_string(),
            css_selector: selector.to_string(),
            is_interactive: true,
            ..Default::default()
        }
    }

    #[test]
    fn s3_native_interactive_wins_over_div_onclick() {
        let div = el("div", "Submit", "div.wrapper");
        let button = el("button", "Submit", "div.wrapper > button");
        let result = deduplicate(vec![div, button]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tag, "button");
    }

    #[test]
    fn s4_pagination_links_survive_substring_check() {
        let mut nav = el("div", "", "nav");
        nav.children_text = "1 2 3 Next".to_string();
        nav.is_interactive = true;
        let one = el("a", "1", "nav > a:nth-child(1)");
        let two = el("a", "2", "nav > a:nth-child(2)");
        let three = el("a", "3", "nav > a:nth-child(3)");
        let next = el("a", "Next", "nav > a:nth-child(4)");

        let result = deduplicate(vec![nav, one, two, three, next]);
        let texts: Vec<&str> = result.iter().map(|e| e.effective_text()).collect();
        assert!(texts.contains(&"1"));
        assert!(texts.contains(&"2"));
        assert!(texts.contains(&"3"));
        assert!(texts.contains(&"Next"));
    }

    #[test]
    fn quality_score_penalizes_long_selectors_additively() {
        let short = el("a", "x", &"a".repeat(50));
        let long = el("a", "x", &"a".repeat(150));
        let very_long = el("a", "x", &"a".repeat(250));
        assert_eq!(quality_score(&short) - quality_score(&long), 5);
        assert_eq!(quality_score(&long) - quality_score(&very_long), 5);
    }

    #[test]
    fn d1_keeps_single_highest_quality_survivor_in_group() {
        let a = el("a", "Same", "body > a");
        let b = el("span", "Same", "body > span");
        let c = el("div", "Same", "body > div");
        let result = deduplicate(vec![a, b, c]);
        // Same effective text collapses the whole group down to its single
        // highest-quality member, regardless of nesting — `a` outscores
        // `span`/`div` on the tag bonus alone.
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tag, "a");
    }
}
