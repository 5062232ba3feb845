//! A CSS selector subset (§4.11: "type, id, class, descendant, child,
//! attribute-presence, attribute-equals") and its matcher.

use crate::error::{Error, Result};
use crate::node::{Document, NodeData, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Presence(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CompoundSelector {
    type_name: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        self.type_name.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    /// A plain space: match any ancestor.
    Descendant,
    /// `>`: match only the immediate parent.
    Child,
}

/// A parsed selector: a chain of compound selectors joined by combinators,
/// rightmost-first (matches how matching walks from the candidate node
/// upward through its ancestors).
#[derive(Debug, Clone)]
pub struct Selector {
    /// `steps[0]` is the rightmost (the compound the candidate node itself
    /// must match); each subsequent step is joined to the previous by
    /// `combinators[i - 1]`.
    steps: Vec<CompoundSelector>,
    combinators: Vec<Combinator>,
}

impl Selector {
    /// Parse a selector string. Supports one compound selector per
    /// combinator-joined segment: an optional type name, `#id`, any number
    /// of `.class`es, and any number of `[attr]`/`[attr=value]` tests, with
    /// segments joined by whitespace (descendant) or `>` (child).
    pub fn parse(input: &str) -> Result<Self> {
        let normalized = input.trim();
        if normalized.is_empty() {
            return Err(Error::UnsupportedSelector(input.to_string()));
        }

        let mut steps = Vec::new();
        let mut combinators = Vec::new();
        let mut chars = normalized.chars().peekable();
        let mut pending_combinator: Option<Combinator> = None;

        loop {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
                pending_combinator.get_or_insert(Combinator::Descendant);
            }
            if chars.peek() == Some(&'>') {
                chars.next();
                pending_combinator = Some(Combinator::Child);
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
            }
            if chars.peek().is_none() {
                break;
            }

            let mut compound = CompoundSelector::default();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '>' {
                    break;
                }
                match c {
                    '#' => {
                        chars.next();
                        compound.id = Some(take_ident(&mut chars));
                    }
                    '.' => {
                        chars.next();
                        compound.classes.push(take_ident(&mut chars));
                    }
                    '[' => {
                        chars.next();
                        let attr = take_until(&mut chars, ']');
                        compound.attrs.push(parse_attr_test(&attr));
                    }
                    _ if c.is_ascii_alphabetic() || c == '*' => {
                        compound.type_name = Some(take_ident(&mut chars));
                    }
                    _ => return Err(Error::UnsupportedSelector(input.to_string())),
                }
            }
            if compound.is_empty() {
                return Err(Error::UnsupportedSelector(input.to_string()));
            }
            if !steps.is_empty() {
                combinators.push(pending_combinator.take().unwrap_or(Combinator::Descendant));
            }
            steps.push(compound);
        }

        if steps.is_empty() {
            return Err(Error::UnsupportedSelector(input.to_string()));
        }
        steps.reverse();
        combinators.reverse();
        Ok(Self { steps, combinators })
    }

    fn matches_compound(&self, doc: &Document, node: NodeId, compound: &CompoundSelector) -> bool {
        let (tag_name, attributes) = match doc.get(node).data() {
            NodeData::Element { tag_name, attributes } => (tag_name, attributes),
            _ => return false,
        };
        if let Some(type_name) = &compound.type_name {
            if type_name != "*" && type_name != tag_name {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if attributes.iter().find(|(n, _)| n == "id").map(|(_, v)| v.as_str()) != Some(id.as_str()) {
                return false;
            }
        }
        for class in &compound.classes {
            let has_class = attributes
                .iter()
                .find(|(n, _)| n == "class")
                .map(|(_, v)| v.split_ascii_whitespace().any(|c| c == class))
                .unwrap_or(false);
            if !has_class {
                return false;
            }
        }
        for attr in &compound.attrs {
            let matched = match attr {
                AttrTest::Presence(name) => attributes.iter().any(|(n, _)| n == name),
                AttrTest::Equals(name, value) => {
                    attributes.iter().any(|(n, v)| n == name && v == value)
                }
            };
            if !matched {
                return false;
            }
        }
        true
    }

    /// Whether `node` matches this selector, considering its ancestor chain
    /// for descendant/child combinators.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if !self.matches_compound(doc, node, &self.steps[0]) {
            return false;
        }
        let mut current = node;
        for (i, combinator) in self.combinators.iter().enumerate() {
            let next_step = &self.steps[i + 1];
            match combinator {
                Combinator::Child => match doc.get(current).parent() {
                    Some(parent) if self.matches_compound(doc, parent, next_step) => current = parent,
                    _ => return false,
                },
                Combinator::Descendant => {
                    let mut ancestor = doc.get(current).parent();
                    let mut found = None;
                    while let Some(candidate) = ancestor {
                        if self.matches_compound(doc, candidate, next_step) {
                            found = Some(candidate);
                            break;
                        }
                        ancestor = doc.get(candidate).parent();
                    }
                    match found {
                        Some(candidate) => current = candidate,
                        None => return false,
                    }
                }
            }
        }
        true
    }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    out
}

fn take_until(chars: &mut std::iter::Peekable<std::str::Chars>, terminator: char) -> String {
    let mut out = String::new();
    for c in chars.by_ref() {
        if c == terminator {
            break;
        }
        out.push(c);
    }
    out
}

fn parse_attr_test(raw: &str) -> AttrTest {
    if let Some(eq) = raw.find('=') {
        let name = raw[..eq].trim().to_string();
        let value = raw[eq + 1..].trim().trim_matches('"').trim_matches('\'').to_string();
        AttrTest::Equals(name, value)
    } else {
        AttrTest::Presence(raw.trim().to_string())
    }
}

/// Find the first descendant of `root` matching `selector_str`, in document
/// order.
pub fn query_selector(doc: &Document, root: NodeId, selector_str: &str) -> Result<Option<NodeId>> {
    let selector = Selector::parse(selector_str)?;
    Ok(doc.descendants(root).into_iter().find(|&id| selector.matches(doc, id)))
}

/// Find every descendant of `root` matching `selector_str`, in document
/// order.
pub fn query_selector_all(doc: &Document, root: NodeId, selector_str: &str) -> Result<Vec<NodeId>> {
    let selector = Selector::parse(selector_str)?;
    Ok(doc.descendants(root).into_iter().filter(|&id| selector.matches(doc, id)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;

    fn build_fixture() -> (Document, NodeId) {
        let mut doc = Document::new();
        let div = doc.create_node(NodeData::Element {
            tag_name: "div".to_string(),
            attributes: vec![("id".to_string(), "main".to_string()), ("class".to_string(), "box highlighted".to_string())],
        });
        doc.append_child(doc.root(), div);
        let a = doc.create_node(NodeData::Element {
            tag_name: "a".to_string(),
            attributes: vec![("href".to_string(), "/x".to_string())],
        });
        doc.append_child(div, a);
        let span = doc.create_node(NodeData::Element { tag_name: "span".to_string(), attributes: vec![] });
        doc.append_child(a, span);
        (doc, div)
    }

    #[test]
    fn matches_by_type() {
        let (doc, _) = build_fixture();
        assert_eq!(query_selector_all(&doc, doc.root(), "a").unwrap().len(), 1);
    }

    #[test]
    fn matches_by_id() {
        let (doc, div) = build_fixture();
        assert_eq!(query_selector(&doc, doc.root(), "#main").unwrap(), Some(div));
    }

    #[test]
    fn matches_by_class() {
        let (doc, div) = build_fixture();
        assert_eq!(query_selector(&doc, doc.root(), ".highlighted").unwrap(), Some(div));
        assert_eq!(query_selector(&doc, doc.root(), ".missing").unwrap(), None);
    }

    #[test]
    fn matches_attribute_presence_and_equality() {
        let (doc, _) = build_fixture();
        assert_eq!(query_selector_all(&doc, doc.root(), "[href]").unwrap().len(), 1);
        assert_eq!(query_selector_all(&doc, doc.root(), "[href=\"/x\"]").unwrap().len(), 1);
        assert!(query_selector_all(&doc, doc.root(), "[href=\"/y\"]").unwrap().is_empty());
    }

    #[test]
    fn descendant_combinator_requires_an_ancestor_match() {
        let (doc, _) = build_fixture();
        assert_eq!(query_selector_all(&doc, doc.root(), "div span").unwrap().len(), 1);
        assert!(query_selector_all(&doc, doc.root(), "p span").unwrap().is_empty());
    }

    #[test]
    fn child_combinator_requires_an_immediate_parent_match() {
        let (doc, _) = build_fixture();
        assert_eq!(query_selector_all(&doc, doc.root(), "div > a").unwrap().len(), 1);
        assert!(query_selector_all(&doc, doc.root(), "div > span").unwrap().is_empty());
    }

    #[test]
    fn unsupported_selector_syntax_errors() {
        assert!(Selector::parse("div:hover").is_err());
    }
}
