//! The In-Page Collector: a single self-contained script evaluated
//! inside the page via the driver's `evalInPage`. This is the one
//! stage of the pipeline that cannot run as plain Rust — it needs live
//! `getComputedStyle`/`getBoundingClientRect` access — so it ships as a
//! JS string constant, the same way `stealth.rs` ships its
//! anti-detection patches.
//!
//! Three phases: marker cleanup, candidate scan (tag/visibility/
//! interactivity gates), and selector synthesis.

/// Build the collector script, substituting the configured content cap
/// into the otherwise-static script body.
pub fn collector_script(content_cap: usize) -> String {
    COLLECTOR_JS_TEMPLATE.replace("__CONTENT_CAP__", &content_cap.to_string())
}

const COLLECTOR_JS_TEMPLATE: &str = r#"
(() => {
    const STATIC_TAGS = new Set([
        'p','h1','h2','h3','h4','h5','h6','li','th','td','tr','table','label',
        'caption','span','strong','b','em','i','u','small','mark','dl','dt','dd',
        'img','div',
    ]);
    const INTERACTIVE_TAGS = new Set(['a','button','input','select','textarea']);
    const GENERIC_TAGS = new Set(['div','span','strong','b','em','i','u','small','mark','p']);

    const HIDDEN_INTERACTIVE_CLASSES = [
        'multiselect__option','multiselect__element','dropdown-item','option','select-option',
    ];
    const HIDDEN_INTERACTIVE_ROLES = new Set(['option','menuitem']);
    const HIDDEN_INTERACTIVE_ANCESTOR_CLASSES = [
        'multiselect__content','multiselect__content-wrapper','dropdown-menu','select-dropdown',
    ];
    const HIDDEN_INTERACTIVE_ANCESTOR_ROLES = new Set(['listbox','menu']);
    const HIDDEN_INTERACTIVE_DATA_ATTRS = ['data-select','data-option','data-value'];

    const INTERACTIVE_ROLES = new Set(['button','link','checkbox','tab']);
    const INTERACTIVE_DATA_ATTRS = [
        'data-select','data-click','data-toggle','data-action','data-selected',
        'data-deselect','data-option','data-value',
    ];
    const INTERACTIVE_CLASS_SUBSTRINGS = [
        'multiselect','dropdown','select','picker','chooser','toggle','switch','slider',
        'accordion','tab','menu','popup','modal','dialog','overlay','clickable','selectable',
        'interactive','control','widget','component',
    ];
    const FRAMEWORK_HASH_RE = /^[a-zA-Z0-9]{5,8}$/;

    const SELECTOR_CLASS_EXCLUDE_RES = [
        /[\[\]/:]/,
        /^(v-theme--|v-btn--density|v-btn--size|v-btn--variant)/,
        /^(text-|bg-|border-|shadow-|opacity-)/,
        /^(p-\d|m-\d|pt-|pb-|pl-|pr-|px-|py-|mt-|mb-|ml-|mr-|mx-|my-)/,
        /^(w-\d|h-\d|min-|max-)/,
        /^(gap-\d|space-)/,
    ];

    const PAGINATION_TOKENS = new Set(['next', 'prev', 'previous', '...']);
    const CONTENT_CAP = __CONTENT_CAP__;

    function cleanupMarkers() {
        document.querySelectorAll('[data-agent-ref]').forEach((el) => {
            el.removeAttribute('data-agent-ref');
        });
    }

    function hasAncestorWithin(el, levels, classNames, roles) {
        let node = el.parentElement;
        for (let depth = 0; node && depth < levels; depth += 1) {
            const cls = node.className && typeof node.className === 'string' ? node.className : '';
            if (classNames.some((name) => cls.includes(name))) return true;
            const role = node.getAttribute && node.getAttribute('role');
            if (role && roles.has(role)) return true;
            node = node.parentElement;
        }
        return false;
    }

    function isHiddenInteractiveCandidate(el) {
        const cls = el.className && typeof el.className === 'string' ? el.className : '';
        if (HIDDEN_INTERACTIVE_CLASSES.some((name) => cls.includes(name))) return true;
        const role = el.getAttribute('role');
        if (role && HIDDEN_INTERACTIVE_ROLES.has(role)) return true;
        if (HIDDEN_INTERACTIVE_DATA_ATTRS.some((attr) => el.hasAttribute(attr))) return true;
        if (hasAncestorWithin(el, 3, HIDDEN_INTERACTIVE_ANCESTOR_CLASSES, HIDDEN_INTERACTIVE_ANCESTOR_ROLES)) {
            return true;
        }
        return false;
    }

    function isVisible(el) {
        const style = window.getComputedStyle(el);
        const rect = el.getBoundingClientRect();
        const boxNonZero = rect.width > 0 || rect.height > 0 || el.offsetWidth > 0 || el.offsetHeight > 0;

        if (isHiddenInteractiveCandidate(el)) {
            const hasText = (el.textContent || '').trim().length > 0;
            return style.display !== 'none' || boxNonZero || hasText;
        }

        return style.display !== 'none' && style.visibility !== 'hidden' && boxNonZero;
    }

    function isInteractive(el) {
        const tag = el.tagName.toLowerCase();
        if (INTERACTIVE_TAGS.has(tag)) return true;
        if (el.hasAttribute('onclick')) return true;
        if (el.getAttribute('contenteditable') === 'true') return true;
        const role = el.getAttribute('role');
        if (role && INTERACTIVE_ROLES.has(role)) return true;
        if (el.getAttribute('tabindex') === '0') return true;
        if (INTERACTIVE_DATA_ATTRS.some((attr) => el.hasAttribute(attr))) return true;

        const cls = (el.className && typeof el.className === 'string' ? el.className : '').toLowerCase();
        if (INTERACTIVE_CLASS_SUBSTRINGS.some((name) => cls.includes(name))) return true;

        const style = window.getComputedStyle(el);
        if (style.cursor === 'pointer' && !GENERIC_TAGS.has(tag)) {
            const text = (el.textContent || '').trim();
            const id = el.id || '';
            const ariaLabel = el.getAttribute('aria-label') || '';
            const title = el.getAttribute('title') || '';
            const meaningfulClass = el.className && typeof el.className === 'string'
                ? el.className.split(/\s+/).find((c) => (
                    c.length > 3 && !FRAMEWORK_HASH_RE.test(c)
                    && !c.startsWith('css-') && !c.startsWith('sc-') && !c.startsWith('_')
                ))
                : undefined;
            if (text || id || ariaLabel || title || meaningfulClass) return true;
        }

        return false;
    }

    function getDirectTextOnly(el) {
        let out = '';
        for (const node of el.childNodes) {
            if (node.nodeType === Node.TEXT_NODE) {
                out += node.textContent;
            }
        }
        out = out.replace(/\s+/g, ' ').trim();
        if (!out && el.tagName.toLowerCase() === 'img') {
            out = el.getAttribute('alt') || '';
        }
        return out;
    }

    function truncate(s, max) {
        return s.length > max ? s.slice(0, max) : s;
    }

    function collectChildrenText(el) {
        const parts = [];
        for (const child of el.children) {
            const tag = child.tagName.toLowerCase();
            if (tag === 'script' || tag === 'style') continue;
            const t = getDirectTextOnly(child);
            if (t) parts.push(t);
        }
        return truncate(parts.join(' ').replace(/\s+/g, ' ').trim(), 200);
    }

    function hasMeaningfulAttributes(el, tag) {
        if (el.id) return true;
        if (tag === 'tr' || tag === 'img') return true;
        for (const attr of el.attributes) {
            if (attr.name.startsWith('data-') && attr.name !== 'data-agent-ref') return true;
        }
        return false;
    }

    function filterSelectorClass(name) {
        if (!name) return false;
        if (SELECTOR_CLASS_EXCLUDE_RES.some((re) => re.test(name))) return false;
        return name.length > 2;
    }

    function buildSelector(el) {
        const steps = [];
        let node = el;
        let depth = 0;
        while (node && node.nodeType === Node.ELEMENT_NODE && node !== document.documentElement && depth < 5) {
            const tag = node.tagName.toLowerCase();
            let step = tag;
            if (node.id) step += `#${node.id}`;

            const classes = node.className && typeof node.className === 'string'
                ? node.className.split(/\s+/).filter(filterSelectorClass).slice(0, 3)
                : [];
            if (classes.length) step += '.' + classes.join('.');

            const parent = node.parentElement;
            if (parent) {
                const siblings = Array.from(parent.children).filter((c) => c.tagName === node.tagName);
                if (siblings.length > 1) {
                    const idx = Array.from(parent.children).indexOf(node) + 1;
                    step += `:nth-child(${idx})`;
                }
            }

            steps.unshift(step);
            node = node.parentElement;
            depth += 1;
        }
        return steps.join(' > ');
    }

    function collectTableCells(el) {
        const cells = [];
        el.querySelectorAll(':scope td, :scope th').forEach((cell) => {
            cells.push({
                text: truncate(getDirectTextOnly(cell), 300),
                dataLabel: cell.getAttribute('data-label') || null,
                title: cell.getAttribute('title') || null,
            });
        });
        return cells;
    }

    function readAttributes(el) {
        return {
            id: el.id || '',
            ariaLabel: el.getAttribute('aria-label') || '',
            placeholder: el.getAttribute('placeholder') || '',
            className: el.className && typeof el.className === 'string' ? el.className : '',
            value: el.value !== undefined ? String(el.value) : '',
            name: el.getAttribute('name') || '',
            type: el.getAttribute('type') || '',
            href: el.getAttribute('href') || '',
            title: el.getAttribute('title') || '',
            disabled: el.disabled === true || el.getAttribute('aria-disabled') === 'true',
        };
    }

    function readDataAttributes(el) {
        const out = {};
        for (const attr of el.attributes) {
            if (attr.name.startsWith('data-') && attr.name !== 'data-agent-ref') {
                out[attr.name] = attr.value;
            }
        }
        return out;
    }

    cleanupMarkers();

    const interactiveElements = [];
    const contentElements = [];

    const allElements = document.querySelectorAll(
        Array.from(STATIC_TAGS).concat(Array.from(INTERACTIVE_TAGS)).join(',')
    );

    for (const el of allElements) {
        try {
            const tag = el.tagName.toLowerCase();
            if (!STATIC_TAGS.has(tag) && !INTERACTIVE_TAGS.has(tag)) continue;
            if (!isVisible(el)) continue;

            const interactive = isInteractive(el);
            let text = truncate(getDirectTextOnly(el), 300);
            let childrenText = '';
            if (interactive && !text) {
                childrenText = collectChildrenText(el);
            }

            const meaningfulAttrs = hasMeaningfulAttributes(el, tag);
            if (!text && !childrenText && !interactive && !meaningfulAttrs) continue;

            if (!interactive && contentElements.length >= CONTENT_CAP) continue;

            const record = {
                tag,
                text,
                childrenText,
                attributes: readAttributes(el),
                dataAttributes: readDataAttributes(el),
                tableCells: tag === 'tr' ? collectTableCells(el) : [],
                isInteractive: interactive,
                cssSelector: buildSelector(el),
                _node: el,
            };

            if (interactive) {
                interactiveElements.push(record);
            } else {
                contentElements.push(record);
            }
        } catch (err) {
            continue;
        }
    }

    const ordered = interactiveElements.concat(contentElements);
    ordered.forEach((record, idx) => {
        const ref = String(idx);
        record._node.setAttribute('data-agent-ref', ref);
        record.ref = ref;
        record.index = idx;
        delete record._node;
    });

    return ordered;
})()
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_content_cap() {
        let script = collector_script(500);
        assert!(script.contains("CONTENT_CAP = 500"));
        assert!(!script.contains("__CONTENT_CAP__"));
    }

    #[test]
    fn keeps_img_in_static_tag_set() {
        // `img` belongs in the tag gate, not just the attribute/text
        // special cases.
        let script = collector_script(500);
        assert!(script.contains("'img','div'"));
    }
}
