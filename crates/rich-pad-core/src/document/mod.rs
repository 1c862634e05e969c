//! Editable document tree.
//!
//! A `Document` is an arena of nodes addressed by stable [`NodeId`]s. A
//! synthetic root node holds the top-level fragment, so the tree can model
//! the inner markup of the editing surface directly. Parsing lives in the
//! `parse` submodule and markup output in `serialize`.

mod parse;
mod serialize;

use std::sync::atomic::{AtomicU32, Ordering};

use crate::style;

/// Source of per-document generations.
static NEXT_GENERATION: AtomicU32 = AtomicU32::new(0);

/// Handle to a node inside a [`Document`].
///
/// Ids stay valid for the lifetime of the document, including after the
/// node is detached. A cloned document keeps the same ids. Ids from another
/// document, or from before [`Document::replace_with_html`], resolve to
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    generation: u32,
    index: usize,
}

/// An element: lower-case tag name plus attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Whether this element has the given tag (case-insensitive).
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_ascii_lowercase(), value)),
        }
    }

    /// Removes an attribute. Returns its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<&str> = self.classes().collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set_attr("class", joined);
    }

    /// Removes a class. Drops the `class` attribute once it is empty.
    pub fn remove_class(&mut self, class: &str) {
        if self.attr("class").is_none() {
            return;
        }
        let remaining: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attr("class");
        } else {
            let joined = remaining.join(" ");
            self.set_attr("class", joined);
        }
    }

    /// Value of one inline style property, e.g. `width` from `style="width: 10px"`.
    pub fn style_property(&self, name: &str) -> Option<String> {
        style::get(self.attr("style")?, name)
    }

    pub fn set_style_property(&mut self, name: &str, value: &str) {
        let updated = style::set(self.attr("style").unwrap_or(""), name, value);
        self.set_attr("style", updated);
    }

    /// Removes one inline style property. Drops `style` once it is empty.
    pub fn remove_style_property(&mut self, name: &str) {
        let Some(current) = self.attr("style") else {
            return;
        };
        let updated = style::remove(current, name);
        if updated.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", updated);
        }
    }
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic fragment root.
    Root,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed HTML fragment tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    generation: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document containing only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Parses an HTML fragment. Never fails; malformed markup is repaired.
    pub fn parse(html: &str) -> Self {
        parse::parse_fragment(html)
    }

    pub fn root(&self) -> NodeId {
        self.id(0)
    }

    fn id(&self, index: usize) -> NodeId {
        NodeId {
            generation: self.generation,
            index,
        }
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get(id.index)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get_mut(id.index)
    }

    /// Whether `id` belongs to this document (attached or not).
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Serializes the whole fragment (the root's inner markup).
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    /// Serializes the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            serialize::write_node(self, child, &mut out);
        }
        out
    }

    /// Serializes `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_node(self, id, &mut out);
        out
    }

    /// Replaces the whole content with a freshly parsed fragment.
    ///
    /// Every id handed out before the call stops resolving.
    pub fn replace_with_html(&mut self, html: &str) {
        *self = Self::parse(html);
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Whether `id` is an element with the given tag.
    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.element(id).is_some_and(|el| el.is(tag))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of `id`; empty for ids that do not resolve.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Element children only.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = self.id(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    ///
    /// Does nothing if either id does not resolve.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let pos = self.children(parent).len();
        self.attach_at(parent, pos, child);
    }

    /// Inserts `node` immediately before `reference` in its parent.
    ///
    /// Does nothing if `reference` is detached or is `node` itself.
    pub fn insert_before(&mut self, node: NodeId, reference: NodeId) {
        if node == reference {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.detach(node);
        let pos = self.position_in_parent(parent, reference);
        self.attach_at(parent, pos, node);
    }

    /// Inserts `node` immediately after `reference` in its parent.
    pub fn insert_after(&mut self, node: NodeId, reference: NodeId) {
        if node == reference {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.detach(node);
        let pos = self.position_in_parent(parent, reference) + 1;
        self.attach_at(parent, pos, node);
    }

    /// Detaches `child` and inserts it into `parent` at `pos` (clamped).
    fn attach_at(&mut self, parent: NodeId, pos: usize, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            let pos = pos.min(node.children.len());
            node.children.insert(pos, child);
        }
    }

    fn position_in_parent(&self, parent: NodeId, child: NodeId) -> usize {
        let children = self.children(parent);
        children
            .iter()
            .position(|&c| c == child)
            .unwrap_or(children.len())
    }

    /// Removes `id` from its parent. The subtree stays intact but unreachable.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != id);
        }
    }

    /// Replaces `id` with its children, in place.
    pub fn unwrap(&mut self, id: NodeId) {
        if self.parent(id).is_none() {
            return;
        }
        let children = self.children(id).to_vec();
        for child in children {
            self.insert_before(child, id);
        }
        self.detach(id);
    }

    /// Wraps `id` in `wrapper`, putting the wrapper where `id` was.
    pub fn wrap(&mut self, id: NodeId, wrapper: NodeId) {
        if self.parent(id).is_none() {
            return;
        }
        self.insert_before(wrapper, id);
        self.append_child(wrapper, id);
    }

    /// All nodes below `id` in document order (pre-order), excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `id` matching `pred`, in document order.
    pub fn find_all<F>(&self, id: NodeId, pred: F) -> Vec<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(&pred))
            .collect()
    }

    /// First descendant element of `id` matching `pred`.
    pub fn find_first<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .find(|&n| self.element(n).is_some_and(&pred))
    }

    /// Nearest element at or above `id` matching `pred`.
    pub fn closest<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).is_some_and(&pred) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Concatenated text of all text nodes below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Replaces the children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    /// Parses `html` and inserts the resulting nodes before `reference`,
    /// or appends them to `parent` when `reference` is `None`.
    /// Returns the inserted top-level nodes.
    pub fn insert_html(
        &mut self,
        parent: NodeId,
        reference: Option<NodeId>,
        html: &str,
    ) -> Vec<NodeId> {
        let fragment = Self::parse(html);
        let mut inserted = Vec::new();
        for &child in fragment.children(fragment.root()) {
            let Some(id) = self.import(&fragment, child) else {
                continue;
            };
            match reference {
                Some(r) => self.insert_before(id, r),
                None => self.append_child(parent, id),
            }
            inserted.push(id);
        }
        inserted
    }

    /// Deep-copies `id` from another document into this one (detached).
    fn import(&mut self, other: &Document, id: NodeId) -> Option<NodeId> {
        let top = self.push(other.kind(id)?.clone());
        let mut pending = vec![(id, top)];
        while let Some((source, copy)) = pending.pop() {
            for &child in other.children(source) {
                let Some(kind) = other.kind(child) else {
                    continue;
                };
                let child_copy = self.push(kind.clone());
                self.append_child(copy, child_copy);
                pending.push((child, child_copy));
            }
        }
        Some(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_helpers() {
        let mut el = Element::new("IMG");
        assert_eq!(el.tag, "img");
        el.add_class("selected");
        el.add_class("float-left");
        el.add_class("selected");
        assert_eq!(el.attr("class"), Some("selected float-left"));
        el.remove_class("selected");
        assert_eq!(el.attr("class"), Some("float-left"));
        el.remove_class("float-left");
        assert_eq!(el.attr("class"), None);
    }

    #[test]
    fn test_set_attr_keeps_position() {
        let mut el = Element::new("img");
        el.set_attr("src", "a.png");
        el.set_attr("width", "10");
        el.set_attr("SRC", "b.png");
        assert_eq!(
            el.attrs,
            vec![
                ("src".to_string(), "b.png".to_string()),
                ("width".to_string(), "10".to_string())
            ]
        );
        assert_eq!(el.remove_attr("width"), Some("10".to_string()));
        assert_eq!(el.remove_attr("width"), None);
    }

    #[test]
    fn test_style_property_helpers() {
        let mut el = Element::new("img");
        el.set_style_property("width", "200px");
        el.set_style_property("height", "100px");
        assert_eq!(el.style_property("width").as_deref(), Some("200px"));
        el.remove_style_property("width");
        el.remove_style_property("height");
        assert_eq!(el.attr("style"), None);
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let mut doc = Document::parse("<p>a<img src=\"x\">b</p>");
        let img = doc.find_first(doc.root(), |e| e.is("img")).unwrap();
        let span = doc.create_element(Element::new("span"));
        doc.wrap(img, span);
        assert_eq!(doc.to_html(), "<p>a<span><img src=\"x\"></span>b</p>");
        doc.unwrap(span);
        assert_eq!(doc.to_html(), "<p>a<img src=\"x\">b</p>");
        assert!(!doc.is_attached(span));
        assert!(doc.is_attached(img));
    }

    #[test]
    fn test_closest_and_descendants_order() {
        let doc = Document::parse("<figure><img src=\"x\"><figcaption>c</figcaption></figure>");
        let img = doc.find_first(doc.root(), |e| e.is("img")).unwrap();
        let figure = doc.closest(img, |e| e.is("figure")).unwrap();
        assert!(doc.is_element(figure, "figure"));
        let tags: Vec<String> = doc
            .descendants(doc.root())
            .into_iter()
            .filter_map(|n| doc.element(n).map(|e| e.tag.clone()))
            .collect();
        assert_eq!(tags, vec!["figure", "img", "figcaption"]);
    }

    #[test]
    fn test_text_content() {
        let doc = Document::parse("<p>Hello <b>big</b> world</p>");
        assert_eq!(doc.text_content(doc.root()), "Hello big world");
    }

    #[test]
    fn test_insert_html_before_reference() {
        let mut doc = Document::parse("<p>a</p><p>c</p>");
        let second = doc.children(doc.root())[1];
        let inserted = doc.insert_html(doc.root(), Some(second), "<p>b</p>");
        assert_eq!(inserted.len(), 1);
        assert_eq!(doc.to_html(), "<p>a</p><p>b</p><p>c</p>");
    }

    #[test]
    fn test_ids_do_not_survive_replacement() {
        let mut doc = Document::parse("<p>a</p><p>b</p><p><img src=\"x\"></p>");
        let img = doc.find_first(doc.root(), |e| e.is("img")).unwrap();
        doc.replace_with_html("<p>z</p>");

        assert!(!doc.contains(img));
        assert!(!doc.is_attached(img));
        assert_eq!(doc.element(img), None);
        assert_eq!(doc.kind(img), None);
        assert!(doc.children(img).is_empty());
        doc.detach(img);
        doc.append_child(doc.root(), img);
        assert_eq!(doc.to_html(), "<p>z</p>");
    }

    #[test]
    fn test_ids_from_another_document_do_not_resolve() {
        let a = Document::parse("<p>a</p>");
        let b = Document::parse("<p>b</p>");
        let p = a.children(a.root())[0];
        assert!(a.contains(p));
        assert!(!b.contains(p));
        assert_eq!(b.text_content(p), "");
        assert!(b.clone().contains(b.children(b.root())[0]));
    }

    #[test]
    fn test_deep_nesting_serializes_and_imports() {
        let depth = 100_000;
        let doc = Document::parse(&"<b>".repeat(depth));
        let html = doc.to_html();
        assert_eq!(html.len(), depth * "<b></b>".len());
        assert!(html.starts_with("<b><b>"));
        assert!(html.ends_with("</b></b>"));

        let mut host = Document::parse("<p>x</p>");
        let inserted = host.insert_html(host.root(), None, &"<i>".repeat(depth));
        assert_eq!(inserted.len(), 1);
        assert_eq!(host.descendants(host.root()).len(), 2 + depth);
    }

    #[test]
    fn test_clone_is_detached_copy() {
        let doc = Document::parse("<p style=\"color: red\">a</p>");
        let mut copy = doc.clone();
        let p = copy.children(copy.root())[0];
        copy.element_mut(p).unwrap().remove_attr("style");
        assert_eq!(doc.to_html(), "<p style=\"color: red\">a</p>");
        assert_eq!(copy.to_html(), "<p>a</p>");
    }
}
