//! The HTML tree constructor (§4.10): drives the 23-insertion-mode state
//! machine, the open-elements stack, the active-formatting-elements list,
//! and the Adoption Agency Algorithm.

use crate::insertion_mode::InsertionMode;
use crate::node::{Document, NodeData, NodeId, QuirksMode};
use crate::token::{Attribute, Token};
use crate::tokenizer::{ParseError, Tokenizer};

const SPECIAL_ELEMENTS: &[&str] = &[
    "address", "applet", "area", "article", "aside", "base", "basefont", "bgsound", "blockquote", "body", "br",
    "button", "caption", "center", "col", "colgroup", "dd", "details", "dir", "div", "dl", "dt", "embed",
    "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hgroup", "hr", "html", "iframe", "img", "input", "isindex", "li", "link", "listing", "main",
    "marquee", "menu", "meta", "nav", "noembed", "noframes", "noscript", "object", "ol", "p", "param", "plaintext",
    "pre", "script", "section", "select", "source", "style", "summary", "table", "tbody", "td", "template",
    "textarea", "tfoot", "th", "thead", "title", "tr", "track", "ul", "wbr",
];

const FORMATTING_ELEMENTS: &[&str] =
    &["a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt", "u"];

/// Tag names whose content is RCDATA/RAWTEXT/script-data/plaintext once
/// started, per §4.9's "mode transitions ... driven externally by the tree
/// constructor".
fn text_switch_for(tag_name: &str) -> Option<TextSwitch> {
    match tag_name {
        "title" | "textarea" => Some(TextSwitch::Rcdata),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(TextSwitch::Rawtext),
        "script" => Some(TextSwitch::ScriptData),
        "plaintext" => Some(TextSwitch::Plaintext),
        _ => None,
    }
}

enum TextSwitch {
    Rcdata,
    Rawtext,
    ScriptData,
    Plaintext,
}

#[derive(Debug, Clone)]
enum ActiveFormattingEntry {
    Marker,
    Element { node: NodeId, tag_name: String, attributes: Vec<Attribute> },
}

/// Drives tree construction token-by-token.
pub struct TreeBuilder {
    doc: Document,
    open_elements: Vec<NodeId>,
    active_formatting: Vec<ActiveFormattingEntry>,
    mode: InsertionMode,
    original_mode: InsertionMode,
    head_element: Option<NodeId>,
    frameset_ok: bool,
    seen_doctype: bool,
    errors: Vec<ParseError>,
    /// Set once the `<html>` root element has been created.
    html_element: Option<NodeId>,
    done: bool,
}

impl TreeBuilder {
    /// A builder ready to receive tokens, starting in `Initial` mode over a
    /// fresh document.
    pub fn new() -> Self {
        Self {
            doc: Document::new(),
            open_elements: Vec::new(),
            active_formatting: Vec::new(),
            mode: InsertionMode::Initial,
            original_mode: InsertionMode::Initial,
            head_element: None,
            frameset_ok: true,
            seen_doctype: false,
            errors: Vec::new(),
            html_element: None,
            done: false,
        }
    }

    /// Consume `token`, mutating the document and possibly switching the
    /// tokenizer's text mode (for RCDATA/RAWTEXT/script-data/plaintext
    /// elements).
    pub fn process_token(&mut self, token: Token, tokenizer: &mut Tokenizer) {
        if self.done {
            return;
        }
        if token == Token::Eof {
            self.done = true;
        }
        match self.mode {
            InsertionMode::Initial => self.initial(token),
            InsertionMode::BeforeHtml => self.before_html(token),
            InsertionMode::BeforeHead => self.before_head(token),
            InsertionMode::InHead => self.in_head(token, tokenizer),
            InsertionMode::InHeadNoscript => self.in_head_noscript(token),
            InsertionMode::AfterHead => self.after_head(token, tokenizer),
            InsertionMode::InBody | InsertionMode::InTemplate => self.in_body(token, tokenizer),
            InsertionMode::Text => self.text_mode(token),
            InsertionMode::InTable
            | InsertionMode::InTableText
            | InsertionMode::InCaption
            | InsertionMode::InColumnGroup
            | InsertionMode::InTableBody
            | InsertionMode::InRow
            | InsertionMode::InCell => self.in_table_family(token, tokenizer),
            InsertionMode::InSelect | InsertionMode::InSelectInTable => self.in_select(token),
            InsertionMode::AfterBody => self.after_body(token),
            InsertionMode::InFrameset | InsertionMode::AfterFrameset => self.in_frameset(token),
            InsertionMode::AfterAfterBody => self.after_after_body(token),
            InsertionMode::AfterAfterFrameset => {}
        }
    }

    /// Finish parsing and return the constructed document plus every parse
    /// error recorded along the way (tokenizer errors should be merged in by
    /// the caller, e.g. `lib.rs`'s `parse_html`).
    pub fn finish(self) -> (Document, Vec<ParseError>) {
        (self.doc, self.errors)
    }

    fn error(&mut self, message: &str) {
        self.errors.push(ParseError { line: 0, column: 0, message: message.to_string() });
    }

    fn current_node(&self) -> Option<NodeId> {
        self.open_elements.last().copied()
    }

    fn current_tag_name(&self) -> Option<String> {
        self.current_node().and_then(|id| self.doc.get(id).data().tag_name().map(str::to_string))
    }

    fn adjusted_insertion_location(&self) -> NodeId {
        let current = self.current_node().unwrap_or(self.doc.root());
        let current_tag = self.doc.get(current).data().tag_name().map(str::to_string);
        if matches!(current_tag.as_deref(), Some("table" | "tbody" | "tfoot" | "thead" | "tr")) {
            // Foster parenting: insert before the table itself if a table
            // ancestor exists, else fall through to the ordinary location.
            if let Some(&table) = self.open_elements.iter().rev().find(|&&id| {
                self.doc.get(id).data().tag_name() == Some("table")
            }) {
                return self.doc.get(table).parent().unwrap_or(self.doc.root());
            }
        }
        current
    }

    fn insert_element(&mut self, name: &str, attributes: Vec<Attribute>) -> NodeId {
        let parent = self.adjusted_insertion_location();
        let node = self.doc.create_node(NodeData::Element {
            tag_name: name.to_string(),
            attributes: attributes.into_iter().map(|a| (a.name, a.value)).collect(),
        });
        self.doc.append_child(parent, node);
        self.open_elements.push(node);
        node
    }

    fn insert_character(&mut self, text: &str) {
        let parent = self.adjusted_insertion_location();
        self.doc.insert_character(parent, text);
    }

    fn insert_comment(&mut self, text: &str) {
        let parent = self.current_node().unwrap_or(self.doc.root());
        let node = self.doc.create_node(NodeData::Comment(text.to_string()));
        self.doc.append_child(parent, node);
    }

    fn pop_current(&mut self) -> Option<NodeId> {
        self.open_elements.pop()
    }

    fn pop_until_and_including(&mut self, tag_name: &str) {
        while let Some(id) = self.pop_current() {
            if self.doc.get(id).data().tag_name() == Some(tag_name) {
                break;
            }
        }
    }

    fn has_element_in_specific_scope(&self, target: &str, boundary: &[&str]) -> bool {
        for &id in self.open_elements.iter().rev() {
            let Some(tag) = self.doc.get(id).data().tag_name() else { continue };
            if tag == target {
                return true;
            }
            if boundary.contains(&tag) {
                return false;
            }
        }
        false
    }

    const DEFAULT_SCOPE_BOUNDARY: &'static [&'static str] =
        &["applet", "caption", "html", "table", "td", "th", "marquee", "object", "template"];

    fn has_element_in_scope(&self, target: &str) -> bool {
        self.has_element_in_specific_scope(target, Self::DEFAULT_SCOPE_BOUNDARY)
    }

    fn has_element_in_button_scope(&self, target: &str) -> bool {
        let mut boundary: Vec<&str> = Self::DEFAULT_SCOPE_BOUNDARY.to_vec();
        boundary.push("button");
        self.has_element_in_specific_scope(target, &boundary)
    }

    fn has_element_in_list_item_scope(&self, target: &str) -> bool {
        let mut boundary: Vec<&str> = Self::DEFAULT_SCOPE_BOUNDARY.to_vec();
        boundary.push("ol");
        boundary.push("ul");
        self.has_element_in_specific_scope(target, &boundary)
    }

    fn has_element_in_table_scope(&self, target: &str) -> bool {
        self.has_element_in_specific_scope(target, &["html", "table", "template"])
    }

    fn generate_implied_end_tags(&mut self, exclude: Option<&str>) {
        const IMPLIED: &[&str] =
            &["dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc"];
        while let Some(tag) = self.current_tag_name() {
            if Some(tag.as_str()) == exclude {
                break;
            }
            if IMPLIED.contains(&tag.as_str()) {
                self.pop_current();
            } else {
                break;
            }
        }
    }

    fn close_p_element(&mut self) {
        self.generate_implied_end_tags(Some("p"));
        if self.current_tag_name().as_deref() != Some("p") {
            self.error("unexpected-close-p-with-open-elements");
        }
        self.pop_until_and_including("p");
    }

    fn reconstruct_active_formatting_elements(&mut self) {
        if self.active_formatting.is_empty() {
            return;
        }
        let mut index = self.active_formatting.len() - 1;
        if let ActiveFormattingEntry::Marker = self.active_formatting[index] {
            return;
        }
        if let ActiveFormattingEntry::Element { node, .. } = &self.active_formatting[index] {
            if self.open_elements.contains(node) {
                return;
            }
        }
        while index > 0 {
            index -= 1;
            let is_marker_or_on_stack = match &self.active_formatting[index] {
                ActiveFormattingEntry::Marker => true,
                ActiveFormattingEntry::Element { node, .. } => self.open_elements.contains(node),
            };
            if is_marker_or_on_stack {
                index += 1;
                break;
            }
        }
        for i in index..self.active_formatting.len() {
            if let ActiveFormattingEntry::Element { tag_name, attributes, .. } = self.active_formatting[i].clone() {
                let new_node = self.insert_element(&tag_name, attributes.clone());
                self.active_formatting[i] = ActiveFormattingEntry::Element { node: new_node, tag_name, attributes };
            }
        }
    }

    fn push_formatting_element(&mut self, node: NodeId, tag_name: &str, attributes: Vec<Attribute>) {
        // Noah's Ark clause: if 3 matching entries already exist since the
        // last marker, drop the earliest.
        let mut matches = 0;
        let mut earliest = None;
        for (i, entry) in self.active_formatting.iter().enumerate().rev() {
            match entry {
                ActiveFormattingEntry::Marker => break,
                ActiveFormattingEntry::Element { tag_name: t, attributes: a, .. } => {
                    if t == tag_name && a == &attributes {
                        matches += 1;
                        earliest = Some(i);
                    }
                }
            }
        }
        if matches >= 3 {
            if let Some(i) = earliest {
                self.active_formatting.remove(i);
            }
        }
        self.active_formatting.push(ActiveFormattingEntry::Element {
            node,
            tag_name: tag_name.to_string(),
            attributes,
        });
    }

    fn clear_active_formatting_to_last_marker(&mut self) {
        while let Some(entry) = self.active_formatting.pop() {
            if let ActiveFormattingEntry::Marker = entry {
                break;
            }
        }
    }

    /// The Adoption Agency Algorithm (§4.10), run for end tag `tag_name`.
    fn adoption_agency(&mut self, tag_name: &str) {
        for _ in 0..8 {
            let formatting_index = self.active_formatting.iter().rposition(|e| {
                matches!(e, ActiveFormattingEntry::Element { tag_name: t, .. } if t == tag_name)
            });
            let Some(formatting_index) = formatting_index else {
                self.any_other_end_tag_in_body(tag_name);
                return;
            };
            // Stop at the nearest marker above it, or it never entered the
            // list post-marker (already the default since `rposition` finds
            // nearest to tail).
            let ActiveFormattingEntry::Element { node: formatting_node, .. } =
                self.active_formatting[formatting_index].clone()
            else {
                unreachable!()
            };

            if !self.open_elements.contains(&formatting_node) {
                self.error("adoption-agency-formatting-element-not-in-open-elements");
                self.active_formatting.remove(formatting_index);
                return;
            }
            if !self.has_element_in_scope(tag_name) {
                self.error("adoption-agency-formatting-element-not-in-scope");
                return;
            }
            if self.current_node() != Some(formatting_node) {
                self.error("adoption-agency-not-current-node");
            }

            let formatting_stack_index = self.open_elements.iter().position(|&id| id == formatting_node).unwrap();
            let furthest_block = self.open_elements[formatting_stack_index + 1..]
                .iter()
                .copied()
                .find(|&id| {
                    self.doc.get(id).data().tag_name().map(|t| SPECIAL_ELEMENTS.contains(&t)).unwrap_or(false)
                });

            let Some(furthest_block) = furthest_block else {
                while self.open_elements.len() > formatting_stack_index {
                    self.pop_current();
                }
                self.active_formatting.remove(formatting_index);
                return;
            };

            let common_ancestor = self.open_elements[formatting_stack_index - 1];
            let mut bookmark = formatting_index;

            let mut node = furthest_block;
            let mut node_stack_index = self.open_elements.iter().position(|&id| id == node).unwrap();
            let mut last_node = furthest_block;

            for _ in 0..3 {
                if node_stack_index == 0 {
                    break;
                }
                node_stack_index -= 1;
                node = self.open_elements[node_stack_index];
                if node == formatting_node {
                    break;
                }

                let node_formatting_index = self.active_formatting.iter().position(|e| {
                    matches!(e, ActiveFormattingEntry::Element { node: n, .. } if *n == node)
                });
                let Some(node_formatting_index) = node_formatting_index else {
                    self.open_elements.remove(node_stack_index);
                    continue;
                };

                let (tag_name_clone, attrs_clone) = match &self.active_formatting[node_formatting_index] {
                    ActiveFormattingEntry::Element { tag_name, attributes, .. } => {
                        (tag_name.clone(), attributes.clone())
                    }
                    _ => unreachable!(),
                };
                let clone = self.doc.create_node(NodeData::Element {
                    tag_name: tag_name_clone.clone(),
                    attributes: attrs_clone.iter().map(|a| (a.name.clone(), a.value.clone())).collect(),
                });
                self.active_formatting[node_formatting_index] =
                    ActiveFormattingEntry::Element { node: clone, tag_name: tag_name_clone, attributes: attrs_clone };
                self.open_elements[node_stack_index] = clone;
                if node_formatting_index <= bookmark {
                    // bookmark tracks the formatting element's index; clones
                    // inserted before it shift it right.
                    bookmark += 1;
                }
                node = clone;

                self.doc.detach(last_node);
                self.doc.append_child(clone, last_node);
                last_node = clone;
            }

            self.doc.detach(last_node);
            if matches!(self.doc.get(common_ancestor).data().tag_name(), Some("table" | "tbody" | "tfoot" | "thead" | "tr"))
            {
                let foster_parent = self.doc.get(common_ancestor).parent().unwrap_or(self.doc.root());
                self.doc.append_child(foster_parent, last_node);
            } else {
                self.doc.append_child(common_ancestor, last_node);
            }

            let (formatting_tag, formatting_attrs) = match &self.active_formatting[formatting_index] {
                ActiveFormattingEntry::Element { tag_name, attributes, .. } => (tag_name.clone(), attributes.clone()),
                _ => unreachable!(),
            };
            let formatting_clone = self.doc.create_node(NodeData::Element {
                tag_name: formatting_tag.clone(),
                attributes: formatting_attrs.iter().map(|a| (a.name.clone(), a.value.clone())).collect(),
            });
            let children: Vec<NodeId> = self.doc.get(furthest_block).children().to_vec();
            for child in children {
                self.doc.detach(child);
                self.doc.append_child(formatting_clone, child);
            }
            self.doc.append_child(furthest_block, formatting_clone);

            self.active_formatting.remove(formatting_index);
            let bookmark = bookmark.min(self.active_formatting.len());
            self.active_formatting.insert(
                bookmark,
                ActiveFormattingEntry::Element { node: formatting_clone, tag_name: formatting_tag, attributes: formatting_attrs },
            );

            self.open_elements.retain(|&id| id != formatting_node);
            let furthest_block_index = self.open_elements.iter().position(|&id| id == furthest_block).unwrap();
            self.open_elements.insert(furthest_block_index + 1, formatting_clone);
        }
    }

    fn any_other_end_tag_in_body(&mut self, tag_name: &str) {
        for i in (0..self.open_elements.len()).rev() {
            let id = self.open_elements[i];
            let Some(tag) = self.doc.get(id).data().tag_name().map(str::to_string) else { continue };
            if tag == tag_name {
                self.generate_implied_end_tags(Some(tag_name));
                self.open_elements.truncate(i);
                return;
            }
            if SPECIAL_ELEMENTS.contains(&tag.as_str()) {
                self.error("unexpected-end-tag");
                return;
            }
        }
    }

    // ---- Initial ----

    fn initial(&mut self, token: Token) {
        match token {
            Token::Character(text) if text.chars().all(char::is_whitespace) => {}
            Token::Comment(text) => self.insert_comment(&text),
            Token::Doctype { name, public_id, system_id, force_quirks } => {
                self.seen_doctype = true;
                self.doc.quirks_mode = if force_quirks || name.as_deref() != Some("html") {
                    QuirksMode::Quirks
                } else {
                    QuirksMode::NoQuirks
                };
                let node = self.doc.create_node(NodeData::Doctype {
                    name: name.unwrap_or_default(),
                    public_id: public_id.unwrap_or_default(),
                    system_id: system_id.unwrap_or_default(),
                });
                let root = self.doc.root();
                self.doc.append_child(root, node);
                self.mode = InsertionMode::BeforeHtml;
            }
            other => {
                if !self.seen_doctype {
                    self.error("missing-doctype");
                }
                self.mode = InsertionMode::BeforeHtml;
                self.before_html(other);
            }
        }
    }

    // ---- BeforeHtml ----

    fn before_html(&mut self, token: Token) {
        match token {
            Token::Character(text) if text.chars().all(char::is_whitespace) => {}
            Token::Comment(text) => self.insert_comment(&text),
            Token::StartTag { name, attributes, .. } if name == "html" => {
                let root = self.doc.root();
                let node = self.doc.create_node(NodeData::Element {
                    tag_name: "html".to_string(),
                    attributes: attributes.into_iter().map(|a| (a.name, a.value)).collect(),
                });
                self.doc.append_child(root, node);
                self.open_elements.push(node);
                self.html_element = Some(node);
                self.mode = InsertionMode::BeforeHead;
            }
            Token::EndTag { name } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.error("unexpected-end-tag-before-html");
            }
            other => {
                let root = self.doc.root();
                let node = self.doc.create_node(NodeData::Element { tag_name: "html".to_string(), attributes: vec![] });
                self.doc.append_child(root, node);
                self.open_elements.push(node);
                self.html_element = Some(node);
                self.mode = InsertionMode::BeforeHead;
                self.before_head(other);
            }
        }
    }

    // ---- BeforeHead ----

    fn before_head(&mut self, token: Token) {
        match token {
            Token::Character(text) if text.chars().all(char::is_whitespace) => {}
            Token::Comment(text) => self.insert_comment(&text),
            Token::StartTag { name, attributes, .. } if name == "head" => {
                let node = self.insert_element(&name, attributes);
                self.head_element = Some(node);
                self.mode = InsertionMode::InHead;
            }
            Token::EndTag { name } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.error("unexpected-end-tag-before-head");
            }
            other => {
                let node = self.insert_element("head", vec![]);
                self.head_element = Some(node);
                self.mode = InsertionMode::InHead;
                self.in_head_no_switch(other);
            }
        }
    }

    // ---- InHead ----

    fn in_head(&mut self, token: Token, tokenizer: &mut Tokenizer) {
        match &token {
            Token::StartTag { name, .. } if name == "title" => {
                self.insert_element("title", attrs_of(&token));
                tokenizer.switch_to_rcdata("title");
                self.original_mode = InsertionMode::InHead;
                self.mode = InsertionMode::Text;
                return;
            }
            Token::StartTag { name, .. } if matches!(name.as_str(), "noframes" | "style") => {
                self.insert_element(name, attrs_of(&token));
                tokenizer.switch_to_rawtext(name);
                self.original_mode = InsertionMode::InHead;
                self.mode = InsertionMode::Text;
                return;
            }
            Token::StartTag { name, .. } if name == "script" => {
                self.insert_element("script", attrs_of(&token));
                tokenizer.switch_to_script_data();
                self.original_mode = InsertionMode::InHead;
                self.mode = InsertionMode::Text;
                return;
            }
            Token::StartTag { name, .. } if name == "noscript" => {
                self.insert_element("noscript", attrs_of(&token));
                self.mode = InsertionMode::InHeadNoscript;
                return;
            }
            _ => {}
        }
        self.in_head_no_switch(token);
    }

    fn in_head_no_switch(&mut self, token: Token) {
        match token {
            Token::Character(text) if text.chars().all(char::is_whitespace) => self.insert_character(&text),
            Token::Comment(text) => self.insert_comment(&text),
            Token::Doctype { .. } => self.error("unexpected-doctype"),
            Token::StartTag { name, attributes, self_closing } if matches!(name.as_str(), "base" | "basefont" | "bgsound" | "link") => {
                self.insert_element(&name, attributes);
                self.pop_current();
                let _ = self_closing;
            }
            Token::StartTag { name, attributes, .. } if name == "meta" => {
                self.insert_element(&name, attributes);
                self.pop_current();
            }
            Token::StartTag { name, attributes, .. } if name == "head" => {
                self.insert_element(&name, attributes);
                self.error("unexpected-start-tag-head");
            }
            Token::EndTag { name } if name == "head" => {
                self.pop_current();
                self.mode = InsertionMode::AfterHead;
            }
            Token::EndTag { name } if matches!(name.as_str(), "body" | "html" | "br") => {
                self.pop_current();
                self.mode = InsertionMode::AfterHead;
                self.after_head_no_switch(Token::EndTag { name });
            }
            other => {
                self.pop_current();
                self.mode = InsertionMode::AfterHead;
                self.after_head_no_switch(other);
            }
        }
    }

    // ---- InHeadNoscript (scripting disabled: content is ordinary head content) ----

    fn in_head_noscript(&mut self, token: Token) {
        match token {
            Token::EndTag { name } if name == "noscript" => {
                self.pop_current();
                self.mode = InsertionMode::InHead;
            }
            Token::Character(text) if text.chars().all(char::is_whitespace) => self.insert_character(&text),
            Token::Comment(text) => self.insert_comment(&text),
            other => {
                self.pop_current();
                self.mode = InsertionMode::InHead;
                self.in_head_no_switch(other);
            }
        }
    }

    // ---- AfterHead ----

    fn after_head(&mut self, token: Token, tokenizer: &mut Tokenizer) {
        if let Token::StartTag { name, .. } = &token {
            if name == "body" {
                self.insert_element(name, attrs_of(&token));
                self.frameset_ok = false;
                self.mode = InsertionMode::InBody;
                return;
            }
            if name == "frameset" {
                self.insert_element(name, attrs_of(&token));
                self.mode = InsertionMode::InFrameset;
                return;
            }
            if let Some(head) = self.head_element {
                if matches!(name.as_str(), "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style" | "template" | "title") {
                    self.open_elements.push(head);
                    self.in_head(token, tokenizer);
                    self.open_elements.retain(|&id| id != head);
                    return;
                }
            }
        }
        self.after_head_no_switch(token);
    }

    fn after_head_no_switch(&mut self, token: Token) {
        match token {
            Token::Character(text) if text.chars().all(char::is_whitespace) => self.insert_character(&text),
            Token::Comment(text) => self.insert_comment(&text),
            Token::Doctype { .. } => self.error("unexpected-doctype"),
            other => {
                self.insert_element("body", vec![]);
                self.mode = InsertionMode::InBody;
                // `tokenizer` switches aren't needed on this fallback path
                // since nothing here triggers RCDATA/RAWTEXT/script-data.
                self.in_body_no_switch(other);
            }
        }
    }

    // ---- InBody ----

    fn in_body(&mut self, token: Token, tokenizer: &mut Tokenizer) {
        if let Token::StartTag { name, .. } = &token {
            if let Some(switch) = text_switch_for(name) {
                let node = self.insert_element(name, attrs_of(&token));
                let _ = node;
                match switch {
                    TextSwitch::Rcdata => tokenizer.switch_to_rcdata(name),
                    TextSwitch::Rawtext => tokenizer.switch_to_rawtext(name),
                    TextSwitch::ScriptData => tokenizer.switch_to_script_data(),
                    TextSwitch::Plaintext => tokenizer.switch_to_plaintext(),
                }
                if !matches!(name.as_str(), "plaintext") {
                    self.original_mode = InsertionMode::InBody;
                    self.mode = InsertionMode::Text;
                }
                return;
            }
            if matches!(name.as_str(), "table") {
                self.insert_element(name, attrs_of(&token));
                self.frameset_ok = false;
                self.mode = InsertionMode::InTable;
                return;
            }
        }
        self.in_body_no_switch(token);
    }

    fn in_body_no_switch(&mut self, token: Token) {
        match token {
            Token::Character(text) => {
                self.reconstruct_active_formatting_elements();
                if !text.chars().all(char::is_whitespace) {
                    self.frameset_ok = false;
                }
                self.insert_character(&text);
            }
            Token::Comment(text) => self.insert_comment(&text),
            Token::Doctype { .. } => self.error("unexpected-doctype"),
            Token::StartTag { name, attributes, .. } => self.in_body_start_tag(&name, attributes),
            Token::EndTag { name } => self.in_body_end_tag(&name),
            Token::Eof => {}
        }
    }

    fn in_body_start_tag(&mut self, name: &str, attributes: Vec<Attribute>) {
        match name {
            "html" => self.error("unexpected-start-tag-html-in-body"),
            "p" => {
                if self.has_element_in_button_scope("p") {
                    self.close_p_element();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_element(name, attributes);
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if self.has_element_in_button_scope("p") {
                    self.close_p_element();
                }
                if matches!(self.current_tag_name().as_deref(), Some("h1" | "h2" | "h3" | "h4" | "h5" | "h6")) {
                    self.error("nested-heading-in-body");
                    self.pop_current();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_element(name, attributes);
            }
            "div" | "section" | "article" | "aside" | "header" | "footer" | "nav" | "main" | "figure"
            | "figcaption" | "address" | "blockquote" | "fieldset" | "details" | "summary" | "dialog" | "ul"
            | "ol" | "dl" | "center" => {
                if self.has_element_in_button_scope("p") {
                    self.close_p_element();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_element(name, attributes);
            }
            "li" => {
                self.frameset_ok = false;
                if self.has_element_in_list_item_scope("li") {
                    self.generate_implied_end_tags(Some("li"));
                    self.pop_until_and_including("li");
                }
                self.reconstruct_active_formatting_elements();
                self.insert_element(name, attributes);
            }
            "dd" | "dt" => {
                self.frameset_ok = false;
                if self.has_element_in_button_scope(name) {
                    self.generate_implied_end_tags(Some(name));
                    self.pop_until_and_including(name);
                }
                self.reconstruct_active_formatting_elements();
                self.insert_element(name, attributes);
            }
            "a" | "b" | "big" | "code" | "em" | "font" | "i" | "nobr" | "s" | "small" | "strike" | "strong"
            | "tt" | "u" => {
                self.reconstruct_active_formatting_elements();
                let node = self.insert_element(name, attributes.clone());
                self.push_formatting_element(node, name, attributes);
            }
            "br" | "img" | "embed" | "area" | "wbr" | "input" | "keygen" => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(name, attributes);
                self.pop_current();
                self.frameset_ok = false;
            }
            "hr" => {
                if self.has_element_in_button_scope("p") {
                    self.close_p_element();
                }
                self.insert_element(name, attributes);
                self.pop_current();
                self.frameset_ok = false;
            }
            "form" => {
                self.insert_element(name, attributes);
            }
            _ => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(name, attributes);
            }
        }
    }

    fn in_body_end_tag(&mut self, name: &str) {
        match name {
            "body" => {
                if !self.has_element_in_scope("body") {
                    self.error("unexpected-end-tag-body");
                    return;
                }
                self.mode = InsertionMode::AfterBody;
            }
            "html" => {
                if !self.has_element_in_scope("body") {
                    self.error("unexpected-end-tag-html");
                    return;
                }
                self.mode = InsertionMode::AfterBody;
                self.after_body(Token::EndTag { name: name.to_string() });
            }
            "p" => {
                if !self.has_element_in_button_scope("p") {
                    self.error("unexpected-end-tag-p");
                    self.insert_element("p", vec![]);
                }
                self.close_p_element();
            }
            "li" => {
                if self.has_element_in_list_item_scope("li") {
                    self.generate_implied_end_tags(Some("li"));
                    self.pop_until_and_including("li");
                } else {
                    self.error("unexpected-end-tag-li");
                }
            }
            "dd" | "dt" => {
                if self.has_element_in_button_scope(name) {
                    self.generate_implied_end_tags(Some(name));
                    self.pop_until_and_including(name);
                } else {
                    self.error("unexpected-end-tag");
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let any_open = ["h1", "h2", "h3", "h4", "h5", "h6"].iter().any(|h| self.has_element_in_scope(h));
                if any_open {
                    self.generate_implied_end_tags(None);
                    while let Some(tag) = self.current_tag_name() {
                        let is_heading = matches!(tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6");
                        self.pop_current();
                        if is_heading {
                            break;
                        }
                    }
                } else {
                    self.error("unexpected-end-tag-heading");
                }
            }
            "a" | "b" | "big" | "code" | "em" | "font" | "i" | "nobr" | "s" | "small" | "strike" | "strong"
            | "tt" | "u" => {
                self.adoption_agency(name);
            }
            _ if SPECIAL_ELEMENTS.contains(&name) || FORMATTING_ELEMENTS.contains(&name) => {
                self.any_other_end_tag_in_body(name);
            }
            _ => self.any_other_end_tag_in_body(name),
        }
    }

    // ---- Text ----

    fn text_mode(&mut self, token: Token) {
        match token {
            Token::Character(text) => self.insert_character(&text),
            Token::EndTag { .. } => {
                self.pop_current();
                self.mode = self.original_mode;
            }
            Token::Eof => {
                self.error("eof-in-text-mode");
                self.pop_current();
                self.mode = self.original_mode;
            }
            _ => {}
        }
    }

    // ---- Table family (InTable / InTableText / InCaption / InColumnGroup / InTableBody / InRow / InCell) ----

    fn in_table_family(&mut self, token: Token, tokenizer: &mut Tokenizer) {
        if let Token::StartTag { name, attributes, .. } = &token {
            match name.as_str() {
                "caption" => {
                    self.clear_stack_to_table_context();
                    self.active_formatting.push(ActiveFormattingEntry::Marker);
                    self.insert_element(name, attributes.clone());
                    self.mode = InsertionMode::InCaption;
                    return;
                }
                "colgroup" => {
                    self.clear_stack_to_table_context();
                    self.insert_element(name, attributes.clone());
                    self.mode = InsertionMode::InColumnGroup;
                    return;
                }
                "tbody" | "tfoot" | "thead" => {
                    self.clear_stack_to_table_context();
                    self.insert_element(name, attributes.clone());
                    self.mode = InsertionMode::InTableBody;
                    return;
                }
                "tr" => {
                    self.clear_stack_to_table_body_context();
                    self.insert_element(name, attributes.clone());
                    self.mode = InsertionMode::InRow;
                    return;
                }
                "td" | "th" => {
                    self.clear_stack_to_row_context();
                    self.insert_element(name, attributes.clone());
                    self.active_formatting.push(ActiveFormattingEntry::Marker);
                    self.mode = InsertionMode::InCell;
                    return;
                }
                "table" => {
                    self.error("nested-table-start-tag");
                    if self.has_element_in_table_scope("table") {
                        self.pop_until_and_including("table");
                        self.reset_insertion_mode();
                        self.in_table_family(token, tokenizer);
                    }
                    return;
                }
                _ => {}
            }
        }
        if let Token::EndTag { name } = &token {
            match name.as_str() {
                "table" => {
                    if self.has_element_in_table_scope("table") {
                        self.pop_until_and_including("table");
                        self.reset_insertion_mode();
                    } else {
                        self.error("unexpected-end-tag-table");
                    }
                    return;
                }
                "tbody" | "tfoot" | "thead" => {
                    if self.has_element_in_table_scope(name) {
                        self.pop_until_and_including(name);
                        self.mode = InsertionMode::InTable;
                    }
                    return;
                }
                "tr" => {
                    if self.has_element_in_table_scope("tr") {
                        self.pop_until_and_including("tr");
                        self.mode = InsertionMode::InTableBody;
                    }
                    return;
                }
                "td" | "th" => {
                    if self.has_element_in_table_scope(name) {
                        self.generate_implied_end_tags(None);
                        self.pop_until_and_including(name);
                        self.clear_active_formatting_to_last_marker();
                        self.mode = InsertionMode::InRow;
                    }
                    return;
                }
                "caption" => {
                    if self.has_element_in_table_scope("caption") {
                        self.pop_until_and_including("caption");
                        self.clear_active_formatting_to_last_marker();
                        self.mode = InsertionMode::InTable;
                    }
                    return;
                }
                "colgroup" => {
                    if self.current_tag_name().as_deref() == Some("colgroup") {
                        self.pop_current();
                        self.mode = InsertionMode::InTable;
                    }
                    return;
                }
                _ => {}
            }
        }
        match &token {
            Token::Character(text) if self.mode == InsertionMode::InTable => {
                if !self.open_elements.is_empty()
                    && matches!(self.current_tag_name().as_deref(), Some("table" | "tbody" | "tfoot" | "thead" | "tr"))
                {
                    // Foster-parented character data (§4.10's "insert the
                    // character, foster parenting applies"): `insert_character`
                    // already foster-parents via `adjusted_insertion_location`.
                    self.insert_character(text);
                    return;
                }
            }
            _ => {}
        }
        // Anything else: process using the in-body rules (§4.10's fallback
        // for most non-table-structural tokens while inside a table).
        self.in_body(token, tokenizer);
    }

    fn clear_stack_to_table_context(&mut self) {
        while let Some(tag) = self.current_tag_name() {
            if matches!(tag.as_str(), "table" | "html" | "template") {
                break;
            }
            self.pop_current();
        }
    }

    fn clear_stack_to_table_body_context(&mut self) {
        while let Some(tag) = self.current_tag_name() {
            if matches!(tag.as_str(), "tbody" | "tfoot" | "thead" | "html" | "template") {
                break;
            }
            self.pop_current();
        }
    }

    fn clear_stack_to_row_context(&mut self) {
        while let Some(tag) = self.current_tag_name() {
            if matches!(tag.as_str(), "tr" | "html" | "template") {
                break;
            }
            self.pop_current();
        }
    }

    fn reset_insertion_mode(&mut self) {
        self.mode = match self.current_tag_name().as_deref() {
            Some("select") => InsertionMode::InSelect,
            Some("td") | Some("th") => InsertionMode::InCell,
            Some("tr") => InsertionMode::InRow,
            Some("tbody") | Some("thead") | Some("tfoot") => InsertionMode::InTableBody,
            Some("caption") => InsertionMode::InCaption,
            Some("colgroup") => InsertionMode::InColumnGroup,
            Some("table") => InsertionMode::InTable,
            Some("head") => InsertionMode::InHead,
            Some("body") => InsertionMode::InBody,
            Some("frameset") => InsertionMode::InFrameset,
            Some("html") => InsertionMode::BeforeHead,
            _ => InsertionMode::InBody,
        };
    }

    // ---- InSelect / InSelectInTable (simplified: options/optgroups plus
    // the selects-close-on-nested-select rule; everything else falls back
    // to the same handling the spec gives "in body" for unrecognized tokens
    // in this mode) ----

    fn in_select(&mut self, token: Token) {
        match &token {
            Token::Character(text) => self.insert_character(text),
            Token::StartTag { name, attributes, .. } if name == "option" => {
                if self.current_tag_name().as_deref() == Some("option") {
                    self.pop_current();
                }
                self.insert_element(name, attributes.clone());
            }
            Token::StartTag { name, attributes, .. } if name == "optgroup" => {
                if self.current_tag_name().as_deref() == Some("option") {
                    self.pop_current();
                }
                if self.current_tag_name().as_deref() == Some("optgroup") {
                    self.pop_current();
                }
                self.insert_element(name, attributes.clone());
            }
            Token::StartTag { name, .. } if name == "select" => {
                self.error("nested-select-start-tag");
                if self.has_element_in_table_scope("select") {
                    self.pop_until_and_including("select");
                    self.reset_insertion_mode();
                }
            }
            Token::EndTag { name } if name == "optgroup" => {
                if self.current_tag_name().as_deref() == Some("option")
                    && self.open_elements.len() >= 2
                    && self.doc.get(self.open_elements[self.open_elements.len() - 2]).data().tag_name()
                        == Some("optgroup")
                {
                    self.pop_current();
                }
                if self.current_tag_name().as_deref() == Some("optgroup") {
                    self.pop_current();
                }
            }
            Token::EndTag { name } if name == "option" => {
                if self.current_tag_name().as_deref() == Some("option") {
                    self.pop_current();
                }
            }
            Token::EndTag { name } if name == "select" => {
                if self.has_element_in_table_scope("select") {
                    self.pop_until_and_including("select");
                    self.reset_insertion_mode();
                }
            }
            Token::Comment(text) => self.insert_comment(text),
            Token::Eof => {}
            _ => {}
        }
    }

    // ---- AfterBody ----

    fn after_body(&mut self, token: Token) {
        match token {
            Token::Character(text) if text.chars().all(char::is_whitespace) => self.insert_character(&text),
            Token::Comment(text) => {
                let html = self.html_element;
                if let Some(html) = html {
                    let node = self.doc.create_node(NodeData::Comment(text));
                    self.doc.append_child(html, node);
                }
            }
            Token::Doctype { .. } => self.error("unexpected-doctype"),
            Token::EndTag { name } if name == "html" => {
                self.mode = InsertionMode::AfterAfterBody;
            }
            Token::Eof => {}
            _ => {
                self.error("unexpected-token-after-body");
                self.mode = InsertionMode::InBody;
                self.in_body_no_switch(token);
            }
        }
    }

    // ---- InFrameset / AfterFrameset (minimal: frame documents carry no
    // content this engine renders, so only structural bookkeeping matters) ----

    fn in_frameset(&mut self, token: Token) {
        match token {
            Token::StartTag { name, attributes, .. } if name == "frameset" => {
                self.insert_element(&name, attributes);
            }
            Token::StartTag { name, attributes, .. } if name == "frame" => {
                self.insert_element(&name, attributes);
                self.pop_current();
            }
            Token::EndTag { name } if name == "frameset" => {
                self.pop_current();
                if self.current_tag_name().as_deref() != Some("frameset") {
                    self.mode = InsertionMode::AfterFrameset;
                }
            }
            Token::Comment(text) => self.insert_comment(&text),
            Token::Character(text) if text.chars().all(char::is_whitespace) => self.insert_character(&text),
            _ => {}
        }
    }

    // ---- AfterAfterBody ----

    fn after_after_body(&mut self, token: Token) {
        match token {
            Token::Comment(text) => {
                let root = self.doc.root();
                let node = self.doc.create_node(NodeData::Comment(text));
                self.doc.append_child(root, node);
            }
            Token::Doctype { .. } => {}
            Token::Character(text) if text.chars().all(char::is_whitespace) => self.insert_character(&text),
            Token::Eof => {}
            other => {
                self.error("unexpected-token-after-after-body");
                self.mode = InsertionMode::InBody;
                self.in_body_no_switch(other);
            }
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn attrs_of(token: &Token) -> Vec<Attribute> {
    match token {
        Token::StartTag { attributes, .. } => attributes.clone(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;

    fn build(html: &str) -> Document {
        let mut tokenizer = Tokenizer::new(html);
        let mut builder = TreeBuilder::new();
        loop {
            let token = tokenizer.next_token();
            let is_eof = token == Token::Eof;
            builder.process_token(token, &mut tokenizer);
            if is_eof {
                break;
            }
        }
        builder.finish().0
    }

    fn find_tag<'a>(doc: &'a Document, tag: &str) -> Option<NodeId> {
        doc.descendants(doc.root()).into_iter().find(|&id| doc.get(id).data().tag_name() == Some(tag))
    }

    #[test]
    fn builds_a_minimal_document_skeleton() {
        let doc = build("<!DOCTYPE html><html><head></head><body><p>hi</p></body></html>");
        assert!(find_tag(&doc, "html").is_some());
        assert!(find_tag(&doc, "head").is_some());
        assert!(find_tag(&doc, "body").is_some());
        assert!(find_tag(&doc, "p").is_some());
    }

    #[test]
    fn implies_html_head_and_body_when_absent() {
        let doc = build("<p>hi</p>");
        assert!(find_tag(&doc, "html").is_some());
        assert!(find_tag(&doc, "body").is_some());
    }

    #[test]
    fn a_second_p_implicitly_closes_the_first() {
        let doc = build("<p>one<p>two");
        let body = find_tag(&doc, "body").unwrap();
        let paragraphs: Vec<NodeId> =
            doc.descendants(body).into_iter().filter(|&id| doc.get(id).data().tag_name() == Some("p")).collect();
        assert_eq!(paragraphs.len(), 2);
        for &p in &paragraphs {
            assert_eq!(doc.get(p).parent(), Some(body));
        }
    }

    #[test]
    fn formatting_element_wraps_text_via_reconstruction() {
        let doc = build("<p><b>bold<i>both</b>italic</i></p>");
        // The adoption agency algorithm should leave both a <b> and an <i>
        // somewhere in the tree rather than dropping either.
        assert!(find_tag(&doc, "b").is_some());
        assert!(find_tag(&doc, "i").is_some());
    }

    #[test]
    fn table_structure_is_built_with_foster_parenting_for_stray_text() {
        let doc = build("<table><tr><td>cell</td></tr></table>");
        assert!(find_tag(&doc, "table").is_some());
        assert!(find_tag(&doc, "tr").is_some());
        assert!(find_tag(&doc, "td").is_some());
    }

    #[test]
    fn doctype_without_html_name_triggers_quirks_mode() {
        let doc = build("<!DOCTYPE foo><html></html>");
        assert_eq!(doc.quirks_mode(), QuirksMode::Quirks);
    }

    #[test]
    fn void_elements_do_not_remain_on_the_open_elements_stack() {
        let doc = build("<body><br><p>after</p></body>");
        let body = find_tag(&doc, "body").unwrap();
        let p = find_tag(&doc, "p").unwrap();
        // `<br>` must not have become `<p>`'s parent.
        assert_eq!(doc.get(p).parent(), Some(body));
    }
}
