//! Boundary scenario: Adoption Agency Algorithm correctness (§4.10/§8) —
//! `<p>1<b>2<i>3</b>4</i>5</p>` (misnested `<b>`/`<i>`) must parse to a tree
//! equivalent to `<p>1<b>2<i>3</i></b><i>4</i>5</p>`.
//!
//! The open-elements-stack-empty-at-EOF condition the boundary scenario also
//! names isn't independently observable through `aperture_html`'s public API
//! (the stack is internal to the tree constructor); that half is covered by
//! `tree_builder.rs`'s own `#[cfg(test)]` suite instead. This integration
//! test covers the externally-visible half: the resulting DOM shape.

use aperture_html::{parse_html, Document, NodeData, NodeId};

/// A structural expectation for one node, checked recursively against the
/// live tree — `Elem` for elements (by tag, ignoring attributes) and `Text`
/// for text nodes (exact content).
enum Expect {
    Elem(&'static str, Vec<Expect>),
    Text(&'static str),
}

fn assert_matches(doc: &Document, id: NodeId, expected: &Expect) {
    match (doc.get(id).data(), expected) {
        (NodeData::Element { tag_name, .. }, Expect::Elem(expected_tag, expected_children)) => {
            assert_eq!(tag_name.as_str(), *expected_tag, "tag name mismatch");
            let children = doc.get(id).children();
            assert_eq!(
                children.len(),
                expected_children.len(),
                "child count mismatch under <{expected_tag}>: got {} children",
                children.len()
            );
            for (&child, expected_child) in children.iter().zip(expected_children) {
                assert_matches(doc, child, expected_child);
            }
        }
        (NodeData::Text(text), Expect::Text(expected_text)) => {
            assert_eq!(text.as_str(), *expected_text, "text content mismatch");
        }
        _ => panic!("node kind mismatch: expected {expected_tag_or_text}", expected_tag_or_text = describe(expected)),
    }
}

fn describe(expected: &Expect) -> &'static str {
    match expected {
        Expect::Elem(tag, _) => tag,
        Expect::Text(_) => "#text",
    }
}

fn find_tag(doc: &Document, tag: &str) -> Option<NodeId> {
    doc.descendants(doc.root()).into_iter().find(|&id| doc.get(id).data().tag_name() == Some(tag))
}

#[test]
fn misnested_formatting_elements_reparent_per_the_adoption_agency_algorithm() {
    let (doc, _errors) = parse_html(b"<p>1<b>2<i>3</b>4</i>5</p>", None);

    let p = find_tag(&doc, "p").expect("a <p> element");

    // <p>1<b>2<i>3</i></b><i>4</i>5</p>
    let expected = Expect::Elem(
        "p",
        vec![
            Expect::Text("1"),
            Expect::Elem("b", vec![Expect::Text("2"), Expect::Elem("i", vec![Expect::Text("3")])]),
            Expect::Elem("i", vec![Expect::Text("4")]),
            Expect::Text("5"),
        ],
    );

    assert_matches(&doc, p, &expected);
}
