/// Capability interface over the editable surface.
///
/// The session never calls a concrete editing API. It goes through
/// [`EditingHost`], which a browser binding or the in-memory [`TreeHost`]
/// implements.
use serde::{Deserialize, Serialize};

use crate::document::{Document, Element, NodeId};

/// Visual formatting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    OrderedList,
    UnorderedList,
    Paragraph,
    /// Heading level, clamped to `1..=6`.
    Heading(u8),
    Blockquote,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    /// Removes inline formatting around the selection.
    RemoveFormat,
}

impl FormatKind {
    fn inline_tag(self) -> Option<&'static str> {
        match self {
            FormatKind::Bold => Some("b"),
            FormatKind::Italic => Some("i"),
            FormatKind::Underline => Some("u"),
            FormatKind::StrikeThrough => Some("strike"),
            _ => None,
        }
    }

    fn block_tag(self) -> Option<String> {
        match self {
            FormatKind::Paragraph => Some("p".to_string()),
            FormatKind::Heading(level) => Some(format!("h{}", level.clamp(1, 6))),
            FormatKind::Blockquote => Some("blockquote".to_string()),
            _ => None,
        }
    }
}

/// Inline tags undone by [`FormatKind::RemoveFormat`].
const INLINE_FORMAT_TAGS: &[&str] = &["b", "strong", "i", "em", "u", "s", "strike", "font"];

/// Tags treated as blocks for block-level formatting.
const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
    "li",
];

/// The editable surface as seen by the session.
pub trait EditingHost {
    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    /// Serialized markup of the whole surface.
    fn content(&self) -> String {
        self.document().to_html()
    }

    /// Replaces the whole surface (undo/redo restore).
    fn replace_content(&mut self, html: &str);

    /// Replaces the current selection with `html`, or inserts it at the
    /// caret. Returns the inserted top-level nodes.
    fn insert_fragment(&mut self, html: &str) -> Vec<NodeId>;

    /// Applies a formatting command. Returns `false` if nothing changed.
    fn apply_format(&mut self, kind: FormatKind) -> bool;

    /// Text of the current selection, empty when collapsed.
    fn selection_text(&self) -> String;

    /// Selects a node, or collapses the selection with `None`.
    fn set_selection(&mut self, node: Option<NodeId>);
}

/// In-memory host over a [`Document`].
///
/// The selection is a single node. After an insertion the selection
/// collapses to a caret placed after the inserted content.
#[derive(Debug, Clone, Default)]
pub struct TreeHost {
    doc: Document,
    selection: Option<NodeId>,
    caret: Option<NodeId>,
}

impl TreeHost {
    pub fn new(html: &str) -> Self {
        Self {
            doc: Document::parse(html),
            selection: None,
            caret: None,
        }
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection.filter(|&n| self.doc.is_attached(n))
    }

    fn caret(&self) -> Option<NodeId> {
        self.caret.filter(|&n| self.doc.is_attached(n))
    }

    fn closest_block(&self, node: NodeId) -> Option<NodeId> {
        self.doc
            .closest(node, |e| BLOCK_TAGS.iter().any(|t| e.is(t)))
    }

    /// Wraps the selected node in a new element.
    fn wrap_selection(&mut self, tag: &str) -> bool {
        let Some(node) = self.selection() else {
            return false;
        };
        let wrapper = self.doc.create_element(Element::new(tag));
        self.doc.wrap(node, wrapper);
        true
    }

    /// Renames the block holding the selection, or wraps a top-level node.
    fn format_block(&mut self, tag: &str) -> bool {
        let Some(node) = self.selection() else {
            return false;
        };
        match self.closest_block(node) {
            Some(block) => match self.doc.element_mut(block) {
                Some(el) if el.tag != tag => {
                    el.tag = tag.to_string();
                    true
                }
                _ => false,
            },
            None => self.wrap_selection(tag),
        }
    }

    fn make_list(&mut self, list_tag: &str) -> bool {
        let Some(node) = self.selection() else {
            return false;
        };
        let target = self.closest_block(node).unwrap_or(node);
        let list = self.doc.create_element(Element::new(list_tag));
        let item = self.doc.create_element(Element::new("li"));
        self.doc.wrap(target, list);
        self.doc.append_child(list, item);
        // A paragraph inside the item is dropped in favour of the item itself.
        if self.doc.is_element(target, "p") {
            self.doc.append_child(item, target);
            self.doc.unwrap(target);
        } else {
            self.doc.append_child(item, target);
        }
        true
    }

    fn justify(&mut self, align: &str) -> bool {
        let Some(node) = self.selection() else {
            return false;
        };
        let Some(block) = self.closest_block(node) else {
            return false;
        };
        match self.doc.element_mut(block) {
            Some(el) => {
                el.set_style_property("text-align", align);
                true
            }
            None => false,
        }
    }

    fn remove_format(&mut self) -> bool {
        let Some(node) = self.selection() else {
            return false;
        };
        let mut changed = false;
        let mut current = self.doc.parent(node);
        while let Some(parent) = current {
            let next = self.doc.parent(parent);
            let is_format = self
                .doc
                .element(parent)
                .is_some_and(|e| INLINE_FORMAT_TAGS.iter().any(|t| e.is(t)));
            if !is_format {
                break;
            }
            self.doc.unwrap(parent);
            changed = true;
            current = next;
        }
        changed
    }
}

impl EditingHost for TreeHost {
    fn document(&self) -> &Document {
        &self.doc
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn replace_content(&mut self, html: &str) {
        self.doc.replace_with_html(html);
        self.selection = None;
        self.caret = None;
    }

    fn insert_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let root = self.doc.root();
        let inserted = match (self.selection(), self.caret()) {
            (Some(selected), _) => {
                let ids = self.doc.insert_html(root, Some(selected), html);
                self.doc.detach(selected);
                ids
            }
            (None, Some(caret)) => {
                let parent = self.doc.parent(caret).unwrap_or(root);
                let next = self
                    .doc
                    .children(parent)
                    .iter()
                    .skip_while(|&&c| c != caret)
                    .nth(1)
                    .copied();
                self.doc.insert_html(parent, next, html)
            }
            (None, None) => self.doc.insert_html(root, None, html),
        };
        self.selection = None;
        if let Some(&last) = inserted.last() {
            self.caret = Some(last);
        }
        inserted
    }

    fn apply_format(&mut self, kind: FormatKind) -> bool {
        if let Some(tag) = kind.inline_tag() {
            return self.wrap_selection(tag);
        }
        if let Some(tag) = kind.block_tag() {
            return self.format_block(&tag);
        }
        match kind {
            FormatKind::OrderedList => self.make_list("ol"),
            FormatKind::UnorderedList => self.make_list("ul"),
            FormatKind::JustifyLeft => self.justify("left"),
            FormatKind::JustifyCenter => self.justify("center"),
            FormatKind::JustifyRight => self.justify("right"),
            FormatKind::RemoveFormat => self.remove_format(),
            _ => false,
        }
    }

    fn selection_text(&self) -> String {
        self.selection()
            .map(|n| self.doc.text_content(n))
            .unwrap_or_default()
    }

    fn set_selection(&mut self, node: Option<NodeId>) {
        self.selection = node;
        if node.is_some() {
            self.caret = None;
        }
    }
}
