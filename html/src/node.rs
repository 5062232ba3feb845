//! Arena-based DOM node storage (§4.11: "`Document` owns all nodes via an
//! arena/slab; Node-to-Node links are indices ... into that arena").

use std::collections::HashMap;

/// An opaque handle into a [`Document`]'s node arena. Indices are stable for
/// the lifetime of the document (removed nodes leave a tombstone rather than
/// shifting other handles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// What kind of node this is, and the data specific to that kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// The document root.
    Document,
    /// A `<!DOCTYPE ...>` node.
    Doctype {
        /// The doctype name.
        name: String,
        /// The `PUBLIC` identifier, if present.
        public_id: String,
        /// The `SYSTEM` identifier, if present.
        system_id: String,
    },
    /// An element node.
    Element {
        /// The tag name, lowercased.
        tag_name: String,
        /// Attributes, in source order, one entry per distinct name.
        attributes: Vec<(String, String)>,
    },
    /// A text node.
    Text(String),
    /// A comment node.
    Comment(String),
}

impl NodeData {
    /// This node's element tag name, if it is an element.
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            NodeData::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }
}

/// One node in the arena: its data plus its tree-structure links.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Whether this slot has been removed and should be skipped by
    /// traversal. Tombstoned rather than physically removed so sibling
    /// `NodeId`s already held by callers never dangle into a reused slot.
    pub(crate) removed: bool,
}

impl Node {
    /// This node's data.
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// This node's parent, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// This node's children, in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The document: an arena of [`Node`]s plus the root handle.
#[derive(Debug, Clone)]
pub struct Document {
    arena: Vec<Node>,
    root: NodeId,
    /// Whether the document is in quirks mode, limited-quirks mode, or
    /// standards mode, derived from the doctype the tree constructor saw.
    pub(crate) quirks_mode: QuirksMode,
}

/// Document compatibility mode, derived from the doctype (or its absence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuirksMode {
    /// No (or an unrecognized) doctype.
    Quirks,
    /// A doctype whose public/system identifiers trigger limited quirks.
    LimitedQuirks,
    /// A standards-conforming `<!DOCTYPE html>`.
    #[default]
    NoQuirks,
}

impl Document {
    /// A fresh document containing only its root node.
    pub fn new() -> Self {
        let root = Node { data: NodeData::Document, parent: None, children: Vec::new(), removed: false };
        Self { arena: vec![root], root: NodeId::new(0), quirks_mode: QuirksMode::NoQuirks }
    }

    /// The document root's handle.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// This document's compatibility mode.
    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    /// Look up a node by handle.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.arena[id.index()]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.arena[id.index()]
    }

    /// Create a new node holding `data`, detached from the tree, and return
    /// its handle.
    pub fn create_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.arena.len());
        self.arena.push(Node { data, parent: None, children: Vec::new(), removed: false });
        id
    }

    /// Append `child` as `parent`'s last child, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.get_mut(child).parent = Some(parent);
        self.get_mut(parent).children.push(child);
    }

    /// Insert `child` immediately before `reference` under `parent`,
    /// detaching it from any previous parent first. If `reference` is not
    /// actually a child of `parent`, behaves like `append_child`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        self.get_mut(child).parent = Some(parent);
        let siblings = &mut self.get_mut(parent).children;
        let position = siblings.iter().position(|&id| id == reference).unwrap_or(siblings.len());
        siblings.insert(position, child);
    }

    /// Detach `child` from its current parent, if any. Leaves `child`'s own
    /// subtree intact so it can be reattached elsewhere (per the Adoption
    /// Agency Algorithm's reparenting steps).
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.get(child).parent {
            self.get_mut(parent).children.retain(|&id| id != child);
        }
        self.get_mut(child).parent = None;
    }

    /// Remove `child` from the tree entirely, tombstoning it and every
    /// descendant so already-held handles become inert rather than
    /// dangling.
    pub fn remove_child(&mut self, child: NodeId) {
        self.detach(child);
        let mut stack = vec![child];
        while let Some(id) = stack.pop() {
            stack.extend(self.get(id).children.iter().copied());
            let node = self.get_mut(id);
            node.removed = true;
            node.children.clear();
        }
    }

    /// Clone `node`: shallow copies only the node itself; deep also clones
    /// and reattaches its whole subtree. The clone starts detached from the
    /// tree.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId {
        let data = self.get(node).data.clone();
        let clone = self.create_node(data);
        if deep {
            let children: Vec<NodeId> = self.get(node).children.clone();
            for child in children {
                let child_clone = self.clone_node(child, true);
                self.append_child(clone, child_clone);
            }
        }
        clone
    }

    /// Set (or replace) an attribute on an element node. No-op on non-element
    /// nodes.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.get_mut(node).data {
            if let Some(existing) = attributes.iter_mut().find(|(n, _)| n == name) {
                existing.1 = value.to_string();
            } else {
                attributes.push((name.to_string(), value.to_string()));
            }
        }
    }

    /// Read an attribute value off an element node.
    pub fn get_attribute<'a>(&'a self, node: NodeId, name: &str) -> Option<&'a str> {
        match &self.get(node).data {
            NodeData::Element { attributes, .. } => {
                attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
            }
            _ => None,
        }
    }

    /// Append text to a text node, or create one as `parent`'s last child if
    /// its current last child isn't already a text node (the tree
    /// constructor's "insert a character" operation coalesces runs).
    pub fn insert_character(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.get(parent).children.last() {
            if let NodeData::Text(existing) = &mut self.get_mut(last).data {
                existing.push_str(text);
                return;
            }
        }
        let node = self.create_node(NodeData::Text(text.to_string()));
        self.append_child(parent, node);
    }

    /// Iterate every live descendant of `root` (not including `root` itself)
    /// in document order, depth-first pre-order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.get(root).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.get(id).removed {
                continue;
            }
            out.push(id);
            for &child in self.get(id).children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Map of attribute name → value for `node`, empty for non-elements.
    pub fn attributes(&self, node: NodeId) -> HashMap<String, String> {
        match &self.get(node).data {
            NodeData::Element { attributes, .. } => attributes.iter().cloned().collect(),
            _ => HashMap::new(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_read_back_a_child() {
        let mut doc = Document::new();
        let p = doc.create_node(NodeData::Element { tag_name: "p".to_string(), attributes: vec![] });
        doc.append_child(doc.root(), p);
        assert_eq!(doc.get(doc.root()).children(), &[p]);
        assert_eq!(doc.get(p).parent(), Some(doc.root()));
    }

    #[test]
    fn insert_before_places_child_at_the_right_position() {
        let mut doc = Document::new();
        let a = doc.create_node(NodeData::Text("a".to_string()));
        let b = doc.create_node(NodeData::Text("b".to_string()));
        let c = doc.create_node(NodeData::Text("c".to_string()));
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), c);
        doc.insert_before(doc.root(), b, c);
        assert_eq!(doc.get(doc.root()).children(), &[a, b, c]);
    }

    #[test]
    fn consecutive_character_insertions_coalesce() {
        let mut doc = Document::new();
        doc.insert_character(doc.root(), "hel");
        doc.insert_character(doc.root(), "lo");
        assert_eq!(doc.get(doc.root()).children().len(), 1);
        let text_node = doc.get(doc.root()).children()[0];
        assert_eq!(doc.get(text_node).data(), &NodeData::Text("hello".to_string()));
    }

    #[test]
    fn deep_clone_copies_the_whole_subtree() {
        let mut doc = Document::new();
        let div = doc.create_node(NodeData::Element { tag_name: "div".to_string(), attributes: vec![] });
        doc.append_child(doc.root(), div);
        doc.insert_character(div, "text");
        let clone = doc.clone_node(div, true);
        assert_eq!(doc.get(clone).children().len(), 1);
        assert_ne!(doc.get(clone).children()[0], doc.get(div).children()[0]);
    }

    #[test]
    fn set_and_get_attribute_roundtrip() {
        let mut doc = Document::new();
        let el = doc.create_node(NodeData::Element { tag_name: "a".to_string(), attributes: vec![] });
        doc.set_attribute(el, "href", "/x");
        assert_eq!(doc.get_attribute(el, "href"), Some("/x"));
        doc.set_attribute(el, "href", "/y");
        assert_eq!(doc.get_attribute(el, "href"), Some("/y"));
    }

    #[test]
    fn remove_child_tombstones_descendants() {
        let mut doc = Document::new();
        let div = doc.create_node(NodeData::Element { tag_name: "div".to_string(), attributes: vec![] });
        doc.append_child(doc.root(), div);
        let span = doc.create_node(NodeData::Element { tag_name: "span".to_string(), attributes: vec![] });
        doc.append_child(div, span);
        doc.remove_child(div);
        assert!(doc.get(doc.root()).children().is_empty());
        assert!(doc.descendants(doc.root()).is_empty());
    }
}
