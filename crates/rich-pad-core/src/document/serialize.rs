/// Canonical HTML output for document nodes.
use super::{Document, NodeId, NodeKind};

/// Elements that never have content or an end tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is written without escaping.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

pub(crate) fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

enum Visit {
    Open(NodeId),
    Close(NodeId),
}

/// Writes `id` and its subtree. Uses an explicit stack, so nesting depth is
/// bounded by memory rather than the call stack.
pub(super) fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    let mut stack = vec![Visit::Open(id)];
    while let Some(visit) = stack.pop() {
        let id = match visit {
            Visit::Open(id) => id,
            Visit::Close(id) => {
                if let Some(el) = doc.element(id) {
                    out.push_str("</");
                    out.push_str(&el.tag);
                    out.push('>');
                }
                continue;
            }
        };
        match doc.kind(id) {
            None => {}
            Some(NodeKind::Root) => {
                stack.extend(doc.children(id).iter().rev().map(|&c| Visit::Open(c)));
            }
            Some(NodeKind::Text(text)) => {
                let raw = doc
                    .parent(id)
                    .and_then(|p| doc.element(p))
                    .is_some_and(|el| is_raw_text(&el.tag));
                if raw {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            Some(NodeKind::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeKind::Element(el)) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attr(value, out);
                    out.push('"');
                }
                out.push('>');
                if is_void(&el.tag) {
                    continue;
                }
                stack.push(Visit::Close(id));
                stack.extend(doc.children(id).iter().rev().map(|&c| Visit::Open(c)));
            }
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
