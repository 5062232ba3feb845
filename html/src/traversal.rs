//! DOM traversal (§4.11: "`NodeFilter`: a callback returning Accept / Reject
//! / Skip; iterators (`NodeIterator`, `TreeWalker`) prefilter by a
//! `whatToShow` bitmask before invoking the callback").

use crate::node::{Document, NodeData, NodeId};

/// `whatToShow` bitmask constants, as in DOM Traversal.
pub mod what_to_show {
    /// Show element nodes.
    pub const SHOW_ELEMENT: u32 = 0x1;
    /// Show text nodes.
    pub const SHOW_TEXT: u32 = 0x4;
    /// Show comment nodes.
    pub const SHOW_COMMENT: u32 = 0x80;
    /// Show document nodes.
    pub const SHOW_DOCUMENT: u32 = 0x100;
    /// Show every node kind.
    pub const SHOW_ALL: u32 = 0xFFFF_FFFF;
}

/// What a [`NodeFilter`] callback decides about a candidate node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// Include this node in the traversal.
    Accept,
    /// Exclude this node, but still visit its descendants.
    Skip,
    /// Exclude this node and its entire subtree (only meaningful for
    /// `TreeWalker`; `NodeIterator` treats it the same as `Skip`).
    Reject,
}

/// A node-acceptance callback, applied after the `whatToShow` bitmask has
/// already excluded non-matching node kinds.
pub type NodeFilter<'a> = dyn Fn(&Document, NodeId) -> FilterResult + 'a;

fn node_mask(doc: &Document, node: NodeId) -> u32 {
    match doc.get(node).data() {
        NodeData::Document => what_to_show::SHOW_DOCUMENT,
        NodeData::Doctype { .. } => 0, // no SHOW_DOCUMENT_TYPE constant wired up (subset)
        NodeData::Element { .. } => what_to_show::SHOW_ELEMENT,
        NodeData::Text(_) => what_to_show::SHOW_TEXT,
        NodeData::Comment(_) => what_to_show::SHOW_COMMENT,
    }
}

fn passes_mask(doc: &Document, node: NodeId, what_to_show: u32) -> bool {
    node_mask(doc, node) & what_to_show != 0
}

/// A flat, forward-order iterator over a subtree, applying a `whatToShow`
/// mask and an optional [`NodeFilter`].
pub struct NodeIterator<'a> {
    doc: &'a Document,
    queue: Vec<NodeId>,
    what_to_show: u32,
    filter: Option<&'a NodeFilter<'a>>,
}

impl<'a> NodeIterator<'a> {
    /// Build an iterator over `root`'s descendants (document order,
    /// excluding `root` itself).
    pub fn new(doc: &'a Document, root: NodeId, what_to_show: u32, filter: Option<&'a NodeFilter<'a>>) -> Self {
        let mut descendants = doc.descendants(root);
        descendants.reverse();
        Self { doc, queue: descendants, what_to_show, filter }
    }
}

impl<'a> Iterator for NodeIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(node) = self.queue.pop() {
            if !passes_mask(self.doc, node, self.what_to_show) {
                continue;
            }
            let verdict = self.filter.map(|f| f(self.doc, node)).unwrap_or(FilterResult::Accept);
            if verdict == FilterResult::Accept {
                return Some(node);
            }
        }
        None
    }
}

/// A cursor over a subtree supporting sibling/parent/child stepping, the
/// same shape as `TreeWalker` (unlike `NodeIterator`, a `Reject` verdict here
/// prunes the whole subtree rather than just the node).
pub struct TreeWalker<'a> {
    doc: &'a Document,
    root: NodeId,
    current: NodeId,
    what_to_show: u32,
    filter: Option<&'a NodeFilter<'a>>,
}

impl<'a> TreeWalker<'a> {
    /// Build a walker rooted at `root`, initially positioned on `root`
    /// itself.
    pub fn new(doc: &'a Document, root: NodeId, what_to_show: u32, filter: Option<&'a NodeFilter<'a>>) -> Self {
        Self { doc, root, current: root, what_to_show, filter }
    }

    /// The walker's current position.
    pub fn current(&self) -> NodeId {
        self.current
    }

    fn accepts(&self, node: NodeId) -> FilterResult {
        if !passes_mask(self.doc, node, self.what_to_show) {
            return FilterResult::Skip;
        }
        self.filter.map(|f| f(self.doc, node)).unwrap_or(FilterResult::Accept)
    }

    /// Move to the next node in document order within `root`'s subtree,
    /// honoring filter verdicts (`Reject` skips the whole subtree). Updates
    /// and returns the new position, or `None` (leaving position unchanged)
    /// if there is no next matching node.
    pub fn next_node(&mut self) -> Option<NodeId> {
        let mut candidates = self.doc.descendants(self.root);
        let current_pos = candidates.iter().position(|&id| id == self.current);
        let search_from = match current_pos {
            Some(pos) => pos + 1,
            None if self.current == self.root => 0,
            None => candidates.len(),
        };
        let mut i = search_from;
        while i < candidates.len() {
            let node = candidates[i];
            match self.accepts(node) {
                FilterResult::Accept => {
                    self.current = node;
                    return Some(node);
                }
                FilterResult::Reject => {
                    let subtree_len = self.doc.descendants(node).len();
                    i += subtree_len + 1;
                    continue;
                }
                FilterResult::Skip => {}
            }
            i += 1;
        }
        None
    }

    /// Move to the parent of the current position, if it is within `root`'s
    /// subtree and passes the filter.
    pub fn parent_node(&mut self) -> Option<NodeId> {
        let mut node = self.doc.get(self.current).parent()?;
        loop {
            if node == self.root {
                return None;
            }
            if self.accepts(node) == FilterResult::Accept {
                self.current = node;
                return Some(node);
            }
            node = self.doc.get(node).parent()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;

    fn fixture() -> (Document, NodeId) {
        let mut doc = Document::new();
        let div = doc.create_node(NodeData::Element { tag_name: "div".to_string(), attributes: vec![] });
        doc.append_child(doc.root(), div);
        doc.insert_character(div, "hello");
        let span = doc.create_node(NodeData::Element { tag_name: "span".to_string(), attributes: vec![] });
        doc.append_child(div, span);
        (doc, div)
    }

    #[test]
    fn node_iterator_respects_what_to_show() {
        let (doc, div) = fixture();
        let elements: Vec<NodeId> =
            NodeIterator::new(&doc, div, what_to_show::SHOW_ELEMENT, None).collect();
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn node_iterator_applies_a_custom_filter() {
        let (doc, div) = fixture();
        let filter: &NodeFilter = &|_, _| FilterResult::Reject;
        let accepted: Vec<NodeId> = NodeIterator::new(&doc, div, what_to_show::SHOW_ALL, Some(filter)).collect();
        assert!(accepted.is_empty());
    }

    #[test]
    fn tree_walker_steps_through_document_order() {
        let (doc, div) = fixture();
        let mut walker = TreeWalker::new(&doc, div, what_to_show::SHOW_ALL, None);
        let first = walker.next_node().unwrap();
        assert_eq!(doc.get(first).data(), &NodeData::Text("hello".to_string()));
        let second = walker.next_node().unwrap();
        assert_eq!(doc.get(second).data().tag_name(), Some("span"));
        assert_eq!(walker.next_node(), None);
    }

    #[test]
    fn tree_walker_parent_node_stays_within_root() {
        let (doc, div) = fixture();
        let mut walker = TreeWalker::new(&doc, div, what_to_show::SHOW_ALL, None);
        walker.next_node();
        assert_eq!(walker.parent_node(), None);
    }
}
