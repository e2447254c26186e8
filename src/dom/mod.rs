// SPDX-License-Identifier: MPL-2.0
//! In-memory page document.
//!
//! An arena-backed element tree standing in for the browser DOM: element and
//! text nodes, ordered attributes, text content, subtree traversal and
//! synchronous mutation observation. Every structural, attribute or text change
//! made through the mutating methods is reported to the observers whose target
//! subtree contains the changed node.
//!
//! Node ids are only meaningful for the document that created them. Slots of
//! released nodes are recycled under a new generation, so a stale id never
//! aliases a newer node. Passing a foreign or stale id to a mutating method is
//! a no-op.

mod mutation;
mod serialize;

pub use mutation::{MutationKind, MutationRecord, ObserverCallback, ObserverId};

use crate::error::{Error, Result};
use mutation::Observer;

/// Handle to a node owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// An element: tag name plus attributes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            generation: 0,
            parent: None,
            children: Vec::new(),
            kind,
        }
    }
}

/// A page: `#document > html > (head > title, body)`.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: NodeId,
    html: NodeId,
    title: NodeId,
    body: NodeId,
    observers: Vec<Observer>,
    next_observer: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty page skeleton with no observers.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId {
            index: 0,
            generation: 0,
        };
        let mut doc = Self {
            nodes: vec![Node::new(NodeKind::Document)],
            free: Vec::new(),
            root,
            html: root,
            title: root,
            body: root,
            observers: Vec::new(),
            next_observer: 0,
        };
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let title = doc.create_element("title");
        let body = doc.create_element("body");
        doc.link(doc.root, html);
        doc.link(html, head);
        doc.link(head, title);
        doc.link(html, body);
        doc.html = html;
        doc.title = title;
        doc.body = body;
        doc
    }

    /// The `#document` node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<html>` element.
    #[must_use]
    pub fn document_element(&self) -> NodeId {
        self.html
    }

    #[must_use]
    pub fn body(&self) -> NodeId {
        self.body
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.text_content(self.title)
    }

    pub fn set_title(&mut self, title: &str) {
        self.set_text_content(self.title, title);
    }

    // =========================================================================
    // Node creation and tree structure
    // =========================================================================

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Appends `child` as the last child of `parent`, detaching it from its
    /// previous parent first.
    ///
    /// # Errors
    ///
    /// Fails when either id is unknown, when `parent` is a text node, when
    /// `child` is the document node, or when `child` is an inclusive ancestor
    /// of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let (Some(parent_node), Some(child_node)) = (self.node(parent), self.node(child)) else {
            return Err(Error::Dom("unknown node".to_string()));
        };
        if matches!(parent_node.kind, NodeKind::Text(_)) {
            return Err(Error::Dom("text nodes cannot have children".to_string()));
        }
        if matches!(child_node.kind, NodeKind::Document) {
            return Err(Error::Dom("the document node cannot be inserted".to_string()));
        }
        let old_parent = child_node.parent;
        if self.contains(child, parent) {
            return Err(Error::Dom("a node cannot be inserted into itself".to_string()));
        }

        if let Some(old_parent) = old_parent {
            self.unlink(old_parent, child);
            self.notify(MutationRecord {
                target: old_parent,
                kind: MutationKind::ChildList {
                    added: Vec::new(),
                    removed: vec![child],
                },
            });
        }
        self.link(parent, child);
        self.notify(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: vec![child],
                removed: Vec::new(),
            },
        });
        Ok(())
    }

    /// Detaches `child` from `parent`. The node stays valid and can be reinserted.
    ///
    /// # Errors
    ///
    /// Fails when `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::Dom("node is not a child of the given parent".to_string()));
        }
        self.unlink(parent, child);
        self.notify(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: Vec::new(),
                removed: vec![child],
            },
        });
        Ok(())
    }

    /// Detaches `id` if it has a parent, then releases it with its subtree.
    ///
    /// # Errors
    ///
    /// Fails for unknown ids and for the page skeleton (document, `html`,
    /// `head`, `title`, `body`).
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let subtree = self.releasable(id)?;
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id)?;
        }
        self.free_nodes(&subtree);
        Ok(())
    }

    /// Releases a detached node and its subtree. Their ids become stale and
    /// their slots are reused by later nodes.
    ///
    /// # Errors
    ///
    /// Fails when the node is unknown, still attached, or part of the page
    /// skeleton.
    pub fn release(&mut self, id: NodeId) -> Result<()> {
        let subtree = self.releasable(id)?;
        if self.parent(id).is_some() {
            return Err(Error::Dom("only detached nodes can be released".to_string()));
        }
        self.free_nodes(&subtree);
        Ok(())
    }

    /// Node slots currently allocated, live or free.
    #[must_use]
    pub fn allocated_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element(_)))
    }

    /// Whether `id` can contain other nodes (the document or an element).
    #[must_use]
    pub fn is_container(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element(_) | NodeKind::Document))
    }

    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::tag)
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Descendants of `root` in document order, excluding `root` itself.
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(root).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[must_use]
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attribute(name))
    }

    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id)
            .map(Element::attributes)
            .unwrap_or_default()
    }

    /// Sets an attribute on an element. Non-elements are left untouched.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let old_value = match element.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value.to_string())),
            None => {
                element.attributes.push((name.to_string(), value.to_string()));
                None
            }
        };
        self.notify(MutationRecord {
            target: id,
            kind: MutationKind::Attributes {
                name: name.to_string(),
                old_value,
            },
        });
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let Some(index) = element.attributes.iter().position(|(key, _)| key == name) else {
            return;
        };
        let (_, old_value) = element.attributes.remove(index);
        self.notify(MutationRecord {
            target: id,
            kind: MutationKind::Attributes {
                name: name.to_string(),
                old_value: Some(old_value),
            },
        });
    }

    /// The element's `data-*` attributes keyed by their dataset name
    /// (`data-total-pages` becomes `totalPages`), in attribute order.
    #[must_use]
    pub fn dataset(&self, id: NodeId) -> Vec<(String, String)> {
        self.attributes(id)
            .iter()
            .filter_map(|(name, value)| {
                name.strip_prefix("data-")
                    .map(|suffix| (dataset_key(suffix), value.clone()))
            })
            .collect()
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Concatenated text of all descendant text nodes, or the data of a text node.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(_) => self
                .descendants(id)
                .filter_map(|node| match self.kind(node) {
                    Some(NodeKind::Text(text)) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    /// Replaces all children of a container with a single text node (none for
    /// an empty string), or replaces the data of a text node.
    ///
    /// A container whose only child is a text node keeps that node and has its
    /// data updated. Otherwise the previous children are released and their ids
    /// become stale.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        let Some(node) = self.node(id) else {
            return;
        };
        let text_node = match (&node.kind, node.children.as_slice()) {
            (NodeKind::Text(_), _) => Some(id),
            (_, [only]) if !text.is_empty() && matches!(self.kind(*only), Some(NodeKind::Text(_))) => {
                Some(*only)
            }
            _ => None,
        };
        if let Some(text_node) = text_node {
            if let Some(NodeKind::Text(data)) = self.node_mut(text_node).map(|node| &mut node.kind) {
                let old_value = std::mem::replace(data, text.to_string());
                self.notify(MutationRecord {
                    target: text_node,
                    kind: MutationKind::CharacterData { old_value },
                });
            }
            return;
        }

        let removed = std::mem::take(&mut self.nodes[id.index].children);
        for child in &removed {
            self.nodes[child.index].parent = None;
        }
        let mut added = Vec::new();
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.link(id, text_node);
            added.push(text_node);
        }
        if removed.is_empty() && added.is_empty() {
            return;
        }
        self.notify(MutationRecord {
            target: id,
            kind: MutationKind::ChildList {
                added,
                removed: removed.clone(),
            },
        });
        for child in removed {
            // Skeleton nodes are only detached.
            if let Ok(subtree) = self.releasable(child) {
                self.free_nodes(&subtree);
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn push(&mut self, kind: NodeKind) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.nodes[index];
            slot.kind = kind;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.nodes.push(Node::new(kind));
        NodeId {
            index: self.nodes.len() - 1,
            generation: 0,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|node| node.generation == id.generation)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|node| node.generation == id.generation)
    }

    /// `id` and its descendants, when none of them belongs to the page skeleton.
    fn releasable(&self, id: NodeId) -> Result<Vec<NodeId>> {
        if self.node(id).is_none() {
            return Err(Error::Dom("unknown node".to_string()));
        }
        let skeleton = [self.root, self.html, self.title, self.body];
        let subtree: Vec<NodeId> = std::iter::once(id).chain(self.descendants(id)).collect();
        if subtree.iter().any(|node| skeleton.contains(node)) {
            return Err(Error::Dom("the page skeleton cannot be released".to_string()));
        }
        Ok(subtree)
    }

    fn free_nodes(&mut self, subtree: &[NodeId]) {
        for id in subtree {
            let slot = &mut self.nodes[id.index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.parent = None;
            slot.children = Vec::new();
            slot.kind = NodeKind::Text(String::new());
            self.free.push(id.index);
        }
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.node_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index].parent = Some(parent);
        self.nodes[parent.index].children.push(child);
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index].children.retain(|id| *id != child);
        self.nodes[child.index].parent = None;
    }
}

/// Pre-order iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

/// `total-pages` -> `totalPages`: a dash followed by an ASCII lowercase letter
/// becomes that letter uppercased.
#[must_use]
pub fn dataset_key(suffix: &str) -> String {
    let mut key = String::with_capacity(suffix.len());
    let mut chars = suffix.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(next) if c == '-' && next.is_ascii_lowercase() => {
                key.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => key.push(c),
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_page_skeleton() {
        let doc = Document::new();
        let html = doc.document_element();
        assert_eq!(doc.tag_name(html), Some("html"));
        assert_eq!(doc.parent(html), Some(doc.root()));
        assert_eq!(doc.tag_name(doc.body()), Some("body"));
        assert_eq!(doc.parent(doc.body()), Some(html));
        assert_eq!(doc.title(), "");
    }

    #[test]
    fn set_title_updates_title_element() {
        let mut doc = Document::new();
        doc.set_title("DietPi Dashboard");
        assert_eq!(doc.title(), "DietPi Dashboard");
        assert!(doc.outer_html(doc.root()).contains("<title>DietPi Dashboard</title>"));
    }

    #[test]
    fn descendants_are_in_document_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.create_element("div");
        let b = doc.create_element("span");
        let c = doc.create_element("p");
        doc.append_child(body, a).unwrap();
        doc.append_child(a, b).unwrap();
        doc.append_child(body, c).unwrap();

        let order: Vec<NodeId> = doc.descendants(body).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn append_child_moves_node_between_parents() {
        let mut doc = Document::new();
        let body = doc.body();
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        let item = doc.create_element("span");
        doc.append_child(body, first).unwrap();
        doc.append_child(body, second).unwrap();
        doc.append_child(first, item).unwrap();

        doc.append_child(second, item).unwrap();

        assert!(doc.children(first).is_empty());
        assert_eq!(doc.children(second), &[item]);
        assert_eq!(doc.parent(item), Some(second));
    }

    #[test]
    fn append_child_rejects_cycles_and_text_parents() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        let text = doc.create_text("x");
        doc.append_child(outer, inner).unwrap();

        assert!(doc.append_child(inner, outer).is_err());
        assert!(doc.append_child(outer, outer).is_err());
        assert!(doc.append_child(text, inner).is_err());
        let root = doc.root();
        assert!(doc.append_child(outer, root).is_err());
    }

    #[test]
    fn remove_child_detaches_node() {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.create_element("div");
        doc.append_child(body, div).unwrap();

        doc.remove_child(body, div).unwrap();

        assert_eq!(doc.parent(div), None);
        assert!(doc.remove_child(body, div).is_err());
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let hello = doc.create_text("Hello, ");
        let strong = doc.create_element("strong");
        doc.append_child(p, hello).unwrap();
        doc.append_child(p, strong).unwrap();
        doc.set_text_content(strong, "world");

        assert_eq!(doc.text_content(p), "Hello, world");
    }

    #[test]
    fn set_text_content_replaces_children() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let span = doc.create_element("span");
        doc.append_child(p, span).unwrap();

        doc.set_text_content(p, "plain");

        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.parent(span), None);
        assert!(doc.kind(span).is_none());
        assert_eq!(doc.text_content(p), "plain");

        doc.set_text_content(p, "");
        assert!(doc.children(p).is_empty());
    }

    #[test]
    fn set_text_content_updates_single_text_child_in_place() {
        let mut doc = Document::new();
        let body = doc.body();
        let label = doc.create_element("span");
        doc.append_child(body, label).unwrap();
        doc.set_text_content(label, "Save");
        let text = doc.children(label)[0];
        let allocated = doc.allocated_nodes();

        for round in 0..1_000 {
            doc.set_text_content(label, if round % 2 == 0 { "保存" } else { "Save" });
        }

        assert_eq!(doc.children(label), &[text]);
        assert_eq!(doc.text_content(label), "Save");
        assert_eq!(doc.allocated_nodes(), allocated);
    }

    #[test]
    fn removed_subtrees_free_their_slots() {
        let mut doc = Document::new();
        let body = doc.body();
        let row = doc.create_element("tr");
        let cell = doc.create_element("td");
        doc.append_child(body, row).unwrap();
        doc.append_child(row, cell).unwrap();
        doc.set_text_content(cell, "412");
        let allocated = doc.allocated_nodes();

        doc.remove(row).unwrap();
        assert!(doc.children(body).is_empty());
        assert!(doc.kind(row).is_none());
        assert!(doc.kind(cell).is_none());

        let fresh_row = doc.create_element("tr");
        let fresh_cell = doc.create_element("td");
        let fresh_text = doc.create_text("977");
        assert_eq!(doc.allocated_nodes(), allocated);
        assert!(![row, cell].contains(&fresh_row));
        assert!(![row, cell].contains(&fresh_cell));
        assert_eq!(doc.text_content(fresh_text), "977");

        // Stale ids never reach the node now occupying their slot.
        doc.set_attribute(row, "class", "stale");
        doc.set_attribute(cell, "class", "stale");
        assert!(!doc.has_attribute(fresh_row, "class"));
        assert!(!doc.has_attribute(fresh_cell, "class"));
    }

    #[test]
    fn release_requires_detached_non_skeleton_nodes() {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.create_element("div");
        doc.append_child(body, div).unwrap();

        assert!(doc.release(div).is_err());
        doc.remove_child(body, div).unwrap();
        doc.release(div).unwrap();
        assert!(doc.release(div).is_err());

        assert!(doc.remove(body).is_err());
        let html = doc.document_element();
        assert!(doc.remove(html).is_err());
        assert_eq!(doc.parent(body), Some(html));
    }

    #[test]
    fn attributes_keep_insertion_order() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        doc.set_attribute(input, "type", "text");
        doc.set_attribute(input, "placeholder", "Filter");
        doc.set_attribute(input, "type", "search");

        assert_eq!(
            doc.attributes(input),
            &[
                ("type".to_string(), "search".to_string()),
                ("placeholder".to_string(), "Filter".to_string()),
            ]
        );
        doc.remove_attribute(input, "type");
        assert!(!doc.has_attribute(input, "type"));
    }

    #[test]
    fn attribute_writes_on_text_nodes_are_ignored() {
        let mut doc = Document::new();
        let text = doc.create_text("x");
        doc.set_attribute(text, "title", "ignored");
        assert_eq!(doc.get_attribute(text, "title"), None);
    }

    #[test]
    fn dataset_converts_names_to_camel_case() {
        let mut doc = Document::new();
        let span = doc.create_element("span");
        doc.set_attribute(span, "data-page", "3");
        doc.set_attribute(span, "data-total-pages", "10");
        doc.set_attribute(span, "class", "pager");

        assert_eq!(
            doc.dataset(span),
            vec![
                ("page".to_string(), "3".to_string()),
                ("totalPages".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn dataset_key_only_uppercases_after_dash() {
        assert_eq!(dataset_key("total-pages"), "totalPages");
        assert_eq!(dataset_key("a-b-c"), "aBC");
        assert_eq!(dataset_key("x-1"), "x-1");
        assert_eq!(dataset_key("plain"), "plain");
    }

    #[test]
    fn unknown_node_ids_are_tolerated() {
        let mut other = Document::new();
        for _ in 0..32 {
            other.create_element("div");
        }
        let foreign = other.create_element("div");

        let mut doc = Document::new();
        doc.set_attribute(foreign, "title", "x");
        doc.set_text_content(foreign, "x");
        assert_eq!(doc.text_content(foreign), "");
        assert!(doc.children(foreign).is_empty());
        let body = doc.body();
        assert!(doc.append_child(body, foreign).is_err());
    }
}
