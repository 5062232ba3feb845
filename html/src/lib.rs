//! HTML tokenization, tree construction, and an arena-based DOM (§4.9–§4.11).
//!
//! [`parse_html`] is the crate's single entry point: it sniffs an encoding,
//! decodes the input bytes, and drives the tokenizer and tree constructor to
//! completion, returning the resulting [`Document`] plus every parse error
//! recorded along the way.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod char_ref;
mod encoding;
mod error;
mod insertion_mode;
mod node;
mod selector;
mod token;
mod tokenizer;
mod traversal;
mod tree_builder;

pub use error::{Error, Result};
pub use insertion_mode::InsertionMode;
pub use node::{Document, Node, NodeData, NodeId, QuirksMode};
pub use selector::{query_selector, query_selector_all, Selector};
pub use token::{Attribute, Token};
pub use tokenizer::{ParseError, Tokenizer};
pub use traversal::{what_to_show, FilterResult, NodeFilter, NodeIterator, TreeWalker};
pub use tree_builder::TreeBuilder;

/// Parse `bytes` into a [`Document`], sniffing its encoding (BOM → `<meta
/// charset>` → `content_type_hint` → UTF-8) before tokenizing and running
/// tree construction to completion.
///
/// `content_type_hint` is the charset parameter off an HTTP `Content-Type`
/// response header, if the caller has one (see `aperture-http`'s header
/// store).
pub fn parse_html(bytes: &[u8], content_type_hint: Option<&str>) -> (Document, Vec<ParseError>) {
    let encoding = encoding::sniff(bytes, content_type_hint);
    let (text, had_decode_errors) = encoding::decode(bytes, encoding);
    if had_decode_errors {
        log::warn!("HTML input had malformed bytes for encoding {}; replaced with U+FFFD", encoding.name());
    }

    let mut tokenizer = Tokenizer::new(&text);
    let mut builder = TreeBuilder::new();
    loop {
        let token = tokenizer.next_token();
        let is_eof = token == Token::Eof;
        builder.process_token(token, &mut tokenizer);
        if is_eof {
            break;
        }
    }

    let (document, mut errors) = builder.finish();
    let mut all_errors = tokenizer.errors().to_vec();
    all_errors.append(&mut errors);
    (document, all_errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_document() {
        let (doc, errors) = parse_html(b"<!DOCTYPE html><html><head><title>Hi</title></head><body><p>hello</p></body></html>", None);
        assert!(errors.is_empty());
        let title = doc.descendants(doc.root()).into_iter().find(|&id| doc.get(id).data().tag_name() == Some("title"));
        assert!(title.is_some());
    }

    #[test]
    fn recovers_from_missing_doctype_and_tags() {
        let (doc, _errors) = parse_html(b"<p>no doctype, no html/body wrapper", None);
        let html = doc.descendants(doc.root()).into_iter().find(|&id| doc.get(id).data().tag_name() == Some("html"));
        assert!(html.is_some());
    }

    #[test]
    fn query_selector_works_on_a_parsed_document() {
        let (doc, _) = parse_html(br#"<div id="app"><p class="msg">hi</p></div>"#, None);
        let found = query_selector(&doc, doc.root(), "#app .msg").unwrap();
        assert!(found.is_some());
    }
}
