//! The HTML tokenizer (§4.9): byte stream → token stream per the HTML Living
//! Standard's tokenization chapter. Operates over already-decoded text (see
//! `encoding.rs`); the tree constructor drives RCDATA/RAWTEXT/script-data
//! mode switches externally (§4.9: "mode transitions ... are driven
//! externally by the tree constructor").
//!
//! Scope note: script-data's escaped/double-escaped sub-states (for a
//! `<script>` body containing a literal `<!--` comment that itself contains
//! a nested `<script>` tag) are not modeled; ordinary and RCDATA/RAWTEXT-style
//! script bodies are. This is a narrow, rarely-hit corner of §12.2.5's
//! `script data` state group, not a different module.

use crate::char_ref::{resolve_named, resolve_numeric};
use crate::token::{Attribute, Token};
use std::collections::VecDeque;

/// Which "foreign text" submachine governs character data right now. The
/// tree constructor selects this after seeing a start tag it knows should
/// suppress ordinary tag recognition inside its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Ordinary markup recognition, character references active.
    Data,
    /// `<title>`, `<textarea>`: character references active, tags ignored
    /// except the matching end tag.
    Rcdata,
    /// `<style>`, `<xmp>`, `<iframe>`, `<noembed>`, `<noframes>`: no
    /// character references, tags ignored except the matching end tag.
    Rawtext,
    /// `<script>`: same shape as `Rawtext`, modeled identically here (see
    /// module-level scope note on the escaped sub-states).
    ScriptData,
    /// `<plaintext>`: everything until EOF is character data, no end tag
    /// recognized at all (there is no way back to `Data`).
    Plaintext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValueQuoted,
    SelfClosingStartTag,
    BogusComment,
    MarkupDeclarationOpen,
    CommentStart,
    CommentStartDash,
    Comment,
    CommentEndDash,
    CommentEnd,
    Doctype,
    BeforeDoctypeName,
    DoctypeName,
    AfterDoctypeName,
    BeforeDoctypePublicIdentifier,
    DoctypePublicIdentifierDoubleQuoted,
    DoctypePublicIdentifierSingleQuoted,
    AfterDoctypePublicIdentifier,
    BeforeDoctypeSystemIdentifier,
    DoctypeSystemIdentifierDoubleQuoted,
    DoctypeSystemIdentifierSingleQuoted,
    AfterDoctypeSystemIdentifier,
    BogusDoctype,
    TextData,
    TextLessThanSign,
    TextEndTagOpen,
    TextEndTagName,
    CdataSection,
}

#[derive(Debug, Default, Clone)]
struct TagBuilder {
    name: String,
    attributes: Vec<Attribute>,
    self_closing: bool,
    is_end_tag: bool,
}

#[derive(Debug, Default, Clone)]
struct DoctypeBuilder {
    name: Option<String>,
    public_id: Option<String>,
    system_id: Option<String>,
    force_quirks: bool,
}

/// A parse error recorded during tokenization or tree construction (§4.10's
/// "failure semantics": recorded, never fatal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// A short machine-readable description (e.g. `unexpected-null-character`).
    pub message: String,
}

/// Pull-based HTML tokenizer.
pub struct Tokenizer {
    input: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    state: State,
    text_mode: TextMode,
    /// The end-tag name that returns `text_mode` to `Data`, for RCDATA/
    /// RAWTEXT/script-data/plaintext content.
    appropriate_end_tag: Option<String>,
    current_tag: Option<TagBuilder>,
    current_attr: Option<(String, String)>,
    current_doctype: Option<DoctypeBuilder>,
    current_comment: String,
    text_buffer: String,
    tag_name_buffer: String,
    pending: VecDeque<Token>,
    errors: Vec<ParseError>,
    eof_emitted: bool,
}

impl Tokenizer {
    /// Build a tokenizer over already-decoded `input`, starting in `Data`
    /// mode.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            state: State::Data,
            text_mode: TextMode::Data,
            appropriate_end_tag: None,
            current_tag: None,
            current_attr: None,
            current_doctype: None,
            current_comment: String::new(),
            text_buffer: String::new(),
            tag_name_buffer: String::new(),
            pending: VecDeque::new(),
            errors: Vec::new(),
            eof_emitted: false,
        }
    }

    /// Parse errors recorded so far.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Switch to RCDATA mode; `end_tag_name` is the tag name (e.g. `title`)
    /// whose matching end tag returns to `Data`.
    pub fn switch_to_rcdata(&mut self, end_tag_name: &str) {
        self.text_mode = TextMode::Rcdata;
        self.appropriate_end_tag = Some(end_tag_name.to_ascii_lowercase());
        self.state = State::TextData;
    }

    /// Switch to RAWTEXT mode (`style`, `xmp`, `iframe`, `noembed`, `noframes`).
    pub fn switch_to_rawtext(&mut self, end_tag_name: &str) {
        self.text_mode = TextMode::Rawtext;
        self.appropriate_end_tag = Some(end_tag_name.to_ascii_lowercase());
        self.state = State::TextData;
    }

    /// Switch to script-data mode.
    pub fn switch_to_script_data(&mut self) {
        self.text_mode = TextMode::ScriptData;
        self.appropriate_end_tag = Some("script".to_string());
        self.state = State::TextData;
    }

    /// Switch to PLAINTEXT mode (no way back to `Data`).
    pub fn switch_to_plaintext(&mut self) {
        self.text_mode = TextMode::Plaintext;
        self.appropriate_end_tag = None;
        self.state = State::TextData;
    }

    fn error(&mut self, message: &str) {
        self.errors.push(ParseError { line: self.line, column: self.column, message: message.to_string() });
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.input.get(self.pos).copied();
        if let Some(ch) = c {
            self.pos += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn starts_with_ci(&self, s: &str) -> bool {
        let needle: Vec<char> = s.chars().collect();
        if self.pos + needle.len() > self.input.len() {
            return false;
        }
        self.input[self.pos..self.pos + needle.len()]
            .iter()
            .zip(needle.iter())
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    fn push_char_token(&mut self, c: char) {
        self.text_buffer.push(c);
    }

    fn flush_text_buffer(&mut self) {
        if !self.text_buffer.is_empty() {
            let text = std::mem::take(&mut self.text_buffer);
            self.pending.push_back(Token::Character(text));
        }
    }

    /// Pull the next token. Once EOF has been emitted once, returns `Eof`
    /// forever (callers should stop after seeing it).
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return token;
            }
            if self.eof_emitted {
                return Token::Eof;
            }
            self.step();
        }
    }

    fn step(&mut self) {
        match self.state {
            State::Data => self.step_data(),
            State::TagOpen => self.step_tag_open(),
            State::EndTagOpen => self.step_end_tag_open(),
            State::TagName => self.step_tag_name(),
            State::BeforeAttributeName => self.step_before_attribute_name(),
            State::AttributeName => self.step_attribute_name(),
            State::AfterAttributeName => self.step_after_attribute_name(),
            State::BeforeAttributeValue => self.step_before_attribute_value(),
            State::AttributeValueDoubleQuoted => self.step_attribute_value_quoted('"'),
            State::AttributeValueSingleQuoted => self.step_attribute_value_quoted('\''),
            State::AttributeValueUnquoted => self.step_attribute_value_unquoted(),
            State::AfterAttributeValueQuoted => self.step_after_attribute_value_quoted(),
            State::SelfClosingStartTag => self.step_self_closing_start_tag(),
            State::BogusComment => self.step_bogus_comment(),
            State::MarkupDeclarationOpen => self.step_markup_declaration_open(),
            State::CommentStart => self.step_comment_start(),
            State::CommentStartDash => self.step_comment_start_dash(),
            State::Comment => self.step_comment(),
            State::CommentEndDash => self.step_comment_end_dash(),
            State::CommentEnd => self.step_comment_end(),
            State::Doctype => self.step_doctype(),
            State::BeforeDoctypeName => self.step_before_doctype_name(),
            State::DoctypeName => self.step_doctype_name(),
            State::AfterDoctypeName => self.step_after_doctype_name(),
            State::BeforeDoctypePublicIdentifier => self.step_before_doctype_public_identifier(),
            State::DoctypePublicIdentifierDoubleQuoted => self.step_doctype_public_identifier_quoted('"'),
            State::DoctypePublicIdentifierSingleQuoted => self.step_doctype_public_identifier_quoted('\''),
            State::AfterDoctypePublicIdentifier => self.step_after_doctype_public_identifier(),
            State::BeforeDoctypeSystemIdentifier => self.step_before_doctype_system_identifier(),
            State::DoctypeSystemIdentifierDoubleQuoted => self.step_doctype_system_identifier_quoted('"'),
            State::DoctypeSystemIdentifierSingleQuoted => self.step_doctype_system_identifier_quoted('\''),
            State::AfterDoctypeSystemIdentifier => self.step_after_doctype_system_identifier(),
            State::BogusDoctype => self.step_bogus_doctype(),
            State::TextData => self.step_text_data(),
            State::TextLessThanSign => self.step_text_less_than_sign(),
            State::TextEndTagOpen => self.step_text_end_tag_open(),
            State::TextEndTagName => self.step_text_end_tag_name(),
            State::CdataSection => self.step_cdata_section(),
        }
    }

    fn step_data(&mut self) {
        match self.advance() {
            Some('&') => {
                let resolved = self.consume_character_reference(None);
                self.text_buffer.push_str(&resolved);
            }
            Some('<') => {
                self.flush_text_buffer();
                self.state = State::TagOpen;
            }
            Some('\0') => {
                self.error("unexpected-null-character");
                self.push_char_token('\u{FFFD}');
            }
            Some(c) => self.push_char_token(c),
            None => {
                self.flush_text_buffer();
                self.pending.push_back(Token::Eof);
                self.eof_emitted = true;
            }
        }
    }

    fn step_text_data(&mut self) {
        match self.text_mode {
            TextMode::Plaintext => match self.advance() {
                Some('\0') => self.push_char_token('\u{FFFD}'),
                Some(c) => self.push_char_token(c),
                None => {
                    self.flush_text_buffer();
                    self.pending.push_back(Token::Eof);
                    self.eof_emitted = true;
                }
            },
            _ => match self.advance() {
                Some('&') if self.text_mode == TextMode::Rcdata => {
                    let resolved = self.consume_character_reference(None);
                    self.text_buffer.push_str(&resolved);
                }
                Some('<') => {
                    self.flush_text_buffer();
                    self.state = State::TextLessThanSign;
                }
                Some('\0') => {
                    self.error("unexpected-null-character");
                    self.push_char_token('\u{FFFD}');
                }
                Some(c) => self.push_char_token(c),
                None => {
                    self.flush_text_buffer();
                    self.pending.push_back(Token::Eof);
                    self.eof_emitted = true;
                }
            },
        }
    }

    fn step_text_less_than_sign(&mut self) {
        if self.peek() == Some('/') {
            self.advance();
            self.tag_name_buffer.clear();
            self.state = State::TextEndTagOpen;
        } else {
            self.text_buffer.push('<');
            self.state = State::TextData;
        }
    }

    fn step_text_end_tag_open(&mut self) {
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.current_tag = Some(TagBuilder::default());
            self.state = State::TextEndTagName;
        } else {
            self.text_buffer.push_str("</");
            self.state = State::TextData;
        }
    }

    fn step_text_end_tag_name(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.advance();
                self.tag_name_buffer.push(c.to_ascii_lowercase());
            }
            _ => {
                let is_appropriate = self.appropriate_end_tag.as_deref() == Some(self.tag_name_buffer.as_str());
                if is_appropriate
                    && matches!(self.peek(), Some(c) if c.is_ascii_whitespace() || c == '/' || c == '>')
                {
                    self.flush_text_buffer();
                    let name = std::mem::take(&mut self.tag_name_buffer);
                    self.text_mode = TextMode::Data;
                    // Re-enter as an ordinary end tag so attributes (illegal
                    // here but tolerated) and `>` are consumed uniformly.
                    self.current_tag = Some(TagBuilder { name, is_end_tag: true, ..Default::default() });
                    self.state = State::BeforeAttributeName;
                } else {
                    self.text_buffer.push_str("</");
                    self.text_buffer.push_str(&self.tag_name_buffer.clone());
                    self.tag_name_buffer.clear();
                    self.state = State::TextData;
                }
            }
        }
    }

    fn step_tag_open(&mut self) {
        match self.peek() {
            Some('!') => {
                self.advance();
                self.state = State::MarkupDeclarationOpen;
            }
            Some('/') => {
                self.advance();
                self.state = State::EndTagOpen;
            }
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_tag = Some(TagBuilder::default());
                self.state = State::TagName;
            }
            Some('?') => {
                self.error("unexpected-question-mark-instead-of-tag-name");
                self.current_comment.clear();
                self.state = State::BogusComment;
            }
            _ => {
                self.error("invalid-first-character-of-tag-name");
                self.text_buffer.push('<');
                self.state = State::Data;
            }
        }
    }

    fn step_end_tag_open(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_tag = Some(TagBuilder { is_end_tag: true, ..Default::default() });
                self.state = State::TagName;
            }
            Some('>') => {
                self.advance();
                self.error("missing-end-tag-name");
                self.state = State::Data;
            }
            None => {
                self.error("eof-before-tag-name");
                self.text_buffer.push_str("</");
                self.state = State::Data;
            }
            _ => {
                self.error("invalid-first-character-of-tag-name");
                self.current_comment.clear();
                self.state = State::BogusComment;
            }
        }
    }

    fn step_tag_name(&mut self) {
        match self.advance() {
            Some(c) if c.is_ascii_whitespace() => self.state = State::BeforeAttributeName,
            Some('/') => self.state = State::SelfClosingStartTag,
            Some('>') => self.emit_current_tag(),
            Some('\0') => {
                self.error("unexpected-null-character");
                self.current_tag.as_mut().unwrap().name.push('\u{FFFD}');
            }
            Some(c) => self.current_tag.as_mut().unwrap().name.push(c.to_ascii_lowercase()),
            None => self.eof_in_tag(),
        }
    }

    fn step_before_attribute_name(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
            }
            Some('/') | Some('>') | None => self.state = State::AfterAttributeName,
            Some('=') => {
                self.advance();
                self.error("unexpected-equals-sign-before-attribute-name");
                self.current_attr = Some(("=".to_string(), String::new()));
                self.state = State::AttributeName;
            }
            _ => {
                self.current_attr = Some((String::new(), String::new()));
                self.state = State::AttributeName;
            }
        }
    }

    fn step_attribute_name(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() || c == '/' || c == '>' => {
                self.finish_attribute_name();
                self.state = State::AfterAttributeName;
            }
            Some('=') => {
                self.advance();
                self.finish_attribute_name();
                self.state = State::BeforeAttributeValue;
            }
            None => {
                self.finish_attribute_name();
                self.state = State::AfterAttributeName;
            }
            Some('\0') => {
                self.advance();
                self.error("unexpected-null-character");
                self.current_attr.as_mut().unwrap().0.push('\u{FFFD}');
            }
            Some(c) => {
                self.advance();
                self.current_attr.as_mut().unwrap().0.push(c.to_ascii_lowercase());
            }
        }
    }

    fn finish_attribute_name(&mut self) {
        if let Some((name, value)) = self.current_attr.take() {
            let tag = self.current_tag.as_mut().unwrap();
            if tag.attributes.iter().any(|a| a.name == name) {
                self.error("duplicate-attribute");
            } else {
                tag.attributes.push(Attribute { name, value });
            }
        }
    }

    fn step_after_attribute_name(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
            }
            Some('/') => {
                self.advance();
                self.state = State::SelfClosingStartTag;
            }
            Some('=') => {
                self.advance();
                self.current_attr = Some((String::new(), String::new()));
                self.state = State::BeforeAttributeValue;
            }
            Some('>') => self.emit_current_tag(),
            None => self.eof_in_tag(),
            _ => {
                self.current_attr = Some((String::new(), String::new()));
                self.state = State::AttributeName;
            }
        }
    }

    fn step_before_attribute_value(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
            }
            Some('"') => {
                self.advance();
                self.state = State::AttributeValueDoubleQuoted;
            }
            Some('\'') => {
                self.advance();
                self.state = State::AttributeValueSingleQuoted;
            }
            Some('>') => {
                self.error("missing-attribute-value");
                self.emit_current_tag();
            }
            _ => self.state = State::AttributeValueUnquoted,
        }
    }

    fn step_attribute_value_quoted(&mut self, quote: char) {
        match self.advance() {
            Some('&') => {
                let resolved = self.consume_character_reference(Some(quote));
                if let Some(attr) = self.current_attr.as_mut() {
                    attr.1.push_str(&resolved);
                }
            }
            Some(c) if c == quote => self.state = State::AfterAttributeValueQuoted,
            Some('\0') => {
                self.error("unexpected-null-character");
                self.current_attr.as_mut().unwrap().1.push('\u{FFFD}');
            }
            Some(c) => self.current_attr.as_mut().unwrap().1.push(c),
            None => self.eof_in_tag(),
        }
    }

    fn step_attribute_value_unquoted(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
                self.finish_attribute_name();
                self.state = State::BeforeAttributeName;
            }
            Some('&') => {
                self.advance();
                let resolved = self.consume_character_reference(Some('>'));
                self.current_attr.as_mut().unwrap().1.push_str(&resolved);
            }
            Some('>') => {
                self.finish_attribute_name();
                self.emit_current_tag();
            }
            Some('\0') => {
                self.advance();
                self.error("unexpected-null-character");
                self.current_attr.as_mut().unwrap().1.push('\u{FFFD}');
            }
            Some(c) => {
                self.advance();
                self.current_attr.as_mut().unwrap().1.push(c);
            }
            None => self.eof_in_tag(),
        }
    }

    fn step_after_attribute_value_quoted(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
                self.finish_attribute_name();
                self.state = State::BeforeAttributeName;
            }
            Some('/') => {
                self.advance();
                self.finish_attribute_name();
                self.state = State::SelfClosingStartTag;
            }
            Some('>') => {
                self.finish_attribute_name();
                self.emit_current_tag();
            }
            None => self.eof_in_tag(),
            _ => {
                self.error("missing-whitespace-between-attributes");
                self.finish_attribute_name();
                self.state = State::BeforeAttributeName;
            }
        }
    }

    fn step_self_closing_start_tag(&mut self) {
        match self.advance() {
            Some('>') => {
                self.current_tag.as_mut().unwrap().self_closing = true;
                self.emit_current_tag();
            }
            None => self.eof_in_tag(),
            _ => {
                self.error("unexpected-solidus-in-tag");
                self.state = State::BeforeAttributeName;
            }
        }
    }

    fn emit_current_tag(&mut self) {
        self.advance_if_gt();
        let tag = self.current_tag.take().unwrap();
        if tag.is_end_tag {
            if !tag.attributes.is_empty() {
                self.error("end-tag-with-attributes");
            }
            if tag.self_closing {
                self.error("end-tag-with-trailing-solidus");
            }
            self.pending.push_back(Token::EndTag { name: tag.name });
        } else {
            self.pending.push_back(Token::StartTag {
                name: tag.name,
                attributes: tag.attributes,
                self_closing: tag.self_closing,
            });
        }
        self.state = State::Data;
    }

    fn advance_if_gt(&mut self) {
        if self.peek() == Some('>') {
            self.advance();
        }
    }

    fn eof_in_tag(&mut self) {
        self.error("eof-in-tag");
        self.current_tag = None;
        self.current_attr = None;
        self.pending.push_back(Token::Eof);
        self.eof_emitted = true;
    }

    fn step_bogus_comment(&mut self) {
        match self.advance() {
            Some('>') | None => {
                let comment = std::mem::take(&mut self.current_comment);
                self.pending.push_back(Token::Comment(comment));
                if self.pos >= self.input.len() {
                    self.pending.push_back(Token::Eof);
                    self.eof_emitted = true;
                }
                self.state = State::Data;
            }
            Some('\0') => self.current_comment.push('\u{FFFD}'),
            Some(c) => self.current_comment.push(c),
        }
    }

    fn step_markup_declaration_open(&mut self) {
        if self.starts_with_ci("--") {
            self.pos += 2;
            self.current_comment.clear();
            self.state = State::CommentStart;
        } else if self.starts_with_ci("doctype") {
            self.pos += 7;
            self.state = State::Doctype;
        } else if self.starts_with_ci("[CDATA[") {
            self.pos += 7;
            self.state = State::CdataSection;
        } else {
            self.error("incorrectly-opened-comment");
            self.current_comment.clear();
            self.state = State::BogusComment;
        }
    }

    fn step_comment_start(&mut self) {
        match self.peek() {
            Some('-') => {
                self.advance();
                self.state = State::CommentStartDash;
            }
            Some('>') => {
                self.advance();
                self.error("abrupt-closing-of-empty-comment");
                let comment = std::mem::take(&mut self.current_comment);
                self.pending.push_back(Token::Comment(comment));
                self.state = State::Data;
            }
            _ => self.state = State::Comment,
        }
    }

    fn step_comment_start_dash(&mut self) {
        match self.peek() {
            Some('-') => {
                self.advance();
                self.state = State::CommentEnd;
            }
            Some('>') => {
                self.advance();
                self.error("abrupt-closing-of-empty-comment");
                let comment = std::mem::take(&mut self.current_comment);
                self.pending.push_back(Token::Comment(comment));
                self.state = State::Data;
            }
            None => self.eof_in_comment(),
            _ => {
                self.current_comment.push('-');
                self.state = State::Comment;
            }
        }
    }

    fn step_comment(&mut self) {
        match self.advance() {
            Some('-') => self.state = State::CommentEndDash,
            Some('\0') => {
                self.error("unexpected-null-character");
                self.current_comment.push('\u{FFFD}');
            }
            Some(c) => self.current_comment.push(c),
            None => self.eof_in_comment(),
        }
    }

    fn step_comment_end_dash(&mut self) {
        match self.advance() {
            Some('-') => self.state = State::CommentEnd,
            None => self.eof_in_comment(),
            Some(c) => {
                self.current_comment.push('-');
                self.current_comment.push(c);
                self.state = State::Comment;
            }
        }
    }

    fn step_comment_end(&mut self) {
        match self.peek() {
            Some('>') => {
                self.advance();
                let comment = std::mem::take(&mut self.current_comment);
                self.pending.push_back(Token::Comment(comment));
                self.state = State::Data;
            }
            Some('!') => {
                self.advance();
                self.error("incorrectly-closed-comment");
                self.current_comment.push_str("--!");
                self.state = State::Comment;
            }
            Some('-') => {
                self.advance();
                self.current_comment.push('-');
            }
            None => self.eof_in_comment(),
            _ => {
                self.current_comment.push_str("--");
                self.state = State::Comment;
            }
        }
    }

    fn eof_in_comment(&mut self) {
        self.error("eof-in-comment");
        let comment = std::mem::take(&mut self.current_comment);
        self.pending.push_back(Token::Comment(comment));
        self.pending.push_back(Token::Eof);
        self.eof_emitted = true;
    }

    fn step_doctype(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
                self.state = State::BeforeDoctypeName;
            }
            _ => self.state = State::BeforeDoctypeName,
        }
    }

    fn step_before_doctype_name(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
            }
            Some('>') => {
                self.advance();
                self.error("missing-doctype-name");
                self.emit_doctype(true);
            }
            None => {
                self.error("eof-in-doctype");
                self.current_doctype = Some(DoctypeBuilder { force_quirks: true, ..Default::default() });
                self.emit_doctype(false);
                self.pending.push_back(Token::Eof);
                self.eof_emitted = true;
            }
            Some(_) => {
                self.current_doctype = Some(DoctypeBuilder::default());
                self.state = State::DoctypeName;
            }
        }
    }

    fn step_doctype_name(&mut self) {
        match self.advance() {
            Some(c) if c.is_ascii_whitespace() => self.state = State::AfterDoctypeName,
            Some('>') => self.emit_doctype(false),
            Some('\0') => {
                self.error("unexpected-null-character");
                self.doctype_name_push('\u{FFFD}');
            }
            Some(c) => self.doctype_name_push(c.to_ascii_lowercase()),
            None => self.eof_in_doctype(),
        }
    }

    fn doctype_name_push(&mut self, c: char) {
        let doctype = self.current_doctype.as_mut().unwrap();
        doctype.name.get_or_insert_with(String::new).push(c);
    }

    fn step_after_doctype_name(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
            }
            Some('>') => {
                self.advance();
                self.emit_doctype(false);
            }
            None => self.eof_in_doctype(),
            _ if self.starts_with_ci("public") => {
                self.pos += 6;
                self.state = State::BeforeDoctypePublicIdentifier;
            }
            _ if self.starts_with_ci("system") => {
                self.pos += 6;
                self.state = State::BeforeDoctypeSystemIdentifier;
            }
            _ => {
                self.error("invalid-character-sequence-after-doctype-name");
                self.current_doctype.as_mut().unwrap().force_quirks = true;
                self.state = State::BogusDoctype;
            }
        }
    }

    fn step_before_doctype_public_identifier(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
            }
            Some('"') => {
                self.advance();
                self.current_doctype.as_mut().unwrap().public_id = Some(String::new());
                self.state = State::DoctypePublicIdentifierDoubleQuoted;
            }
            Some('\'') => {
                self.advance();
                self.current_doctype.as_mut().unwrap().public_id = Some(String::new());
                self.state = State::DoctypePublicIdentifierSingleQuoted;
            }
            Some('>') => {
                self.advance();
                self.error("missing-doctype-public-identifier");
                self.emit_doctype(true);
            }
            None => self.eof_in_doctype(),
            _ => {
                self.error("missing-quote-before-doctype-public-identifier");
                self.current_doctype.as_mut().unwrap().force_quirks = true;
                self.state = State::BogusDoctype;
            }
        }
    }

    fn step_doctype_public_identifier_quoted(&mut self, quote: char) {
        match self.advance() {
            Some(c) if c == quote => self.state = State::AfterDoctypePublicIdentifier,
            Some('\0') => {
                self.error("unexpected-null-character");
                self.current_doctype.as_mut().unwrap().public_id.as_mut().unwrap().push('\u{FFFD}');
            }
            Some('>') => {
                self.error("abrupt-doctype-public-identifier");
                self.current_doctype.as_mut().unwrap().force_quirks = true;
                self.emit_doctype(true);
            }
            Some(c) => self.current_doctype.as_mut().unwrap().public_id.as_mut().unwrap().push(c),
            None => self.eof_in_doctype(),
        }
    }

    fn step_after_doctype_public_identifier(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
                self.state = State::BeforeDoctypeSystemIdentifier;
            }
            Some('>') => {
                self.advance();
                self.emit_doctype(false);
            }
            Some('"') => {
                self.advance();
                self.error("missing-whitespace-between-doctype-public-and-system-identifiers");
                self.current_doctype.as_mut().unwrap().system_id = Some(String::new());
                self.state = State::DoctypeSystemIdentifierDoubleQuoted;
            }
            Some('\'') => {
                self.advance();
                self.current_doctype.as_mut().unwrap().system_id = Some(String::new());
                self.state = State::DoctypeSystemIdentifierSingleQuoted;
            }
            None => self.eof_in_doctype(),
            _ => {
                self.error("invalid-character-sequence-after-doctype-public-identifier");
                self.current_doctype.as_mut().unwrap().force_quirks = true;
                self.state = State::BogusDoctype;
            }
        }
    }

    fn step_before_doctype_system_identifier(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
            }
            Some('"') => {
                self.advance();
                self.current_doctype.as_mut().unwrap().system_id = Some(String::new());
                self.state = State::DoctypeSystemIdentifierDoubleQuoted;
            }
            Some('\'') => {
                self.advance();
                self.current_doctype.as_mut().unwrap().system_id = Some(String::new());
                self.state = State::DoctypeSystemIdentifierSingleQuoted;
            }
            Some('>') => {
                self.advance();
                self.error("missing-doctype-system-identifier");
                self.emit_doctype(true);
            }
            None => self.eof_in_doctype(),
            _ => {
                self.error("missing-quote-before-doctype-system-identifier");
                self.current_doctype.as_mut().unwrap().force_quirks = true;
                self.state = State::BogusDoctype;
            }
        }
    }

    fn step_doctype_system_identifier_quoted(&mut self, quote: char) {
        match self.advance() {
            Some(c) if c == quote => self.state = State::AfterDoctypeSystemIdentifier,
            Some('\0') => {
                self.error("unexpected-null-character");
                self.current_doctype.as_mut().unwrap().system_id.as_mut().unwrap().push('\u{FFFD}');
            }
            Some('>') => {
                self.error("abrupt-doctype-system-identifier");
                self.current_doctype.as_mut().unwrap().force_quirks = true;
                self.emit_doctype(true);
            }
            Some(c) => self.current_doctype.as_mut().unwrap().system_id.as_mut().unwrap().push(c),
            None => self.eof_in_doctype(),
        }
    }

    fn step_after_doctype_system_identifier(&mut self) {
        match self.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                self.advance();
            }
            Some('>') => {
                self.advance();
                self.emit_doctype(false);
            }
            None => self.eof_in_doctype(),
            _ => {
                self.error("unexpected-character-after-doctype-system-identifier");
                self.state = State::BogusDoctype;
            }
        }
    }

    fn step_bogus_doctype(&mut self) {
        match self.advance() {
            Some('>') => self.emit_doctype(false),
            None => self.eof_in_doctype(),
            _ => {}
        }
    }

    fn emit_doctype(&mut self, force_quirks: bool) {
        let mut doctype = self.current_doctype.take().unwrap_or_default();
        if force_quirks {
            doctype.force_quirks = true;
        }
        self.pending.push_back(Token::Doctype {
            name: doctype.name,
            public_id: doctype.public_id,
            system_id: doctype.system_id,
            force_quirks: doctype.force_quirks,
        });
        self.state = State::Data;
    }

    fn eof_in_doctype(&mut self) {
        self.error("eof-in-doctype");
        let mut doctype = self.current_doctype.take().unwrap_or_default();
        doctype.force_quirks = true;
        self.pending.push_back(Token::Doctype {
            name: doctype.name,
            public_id: doctype.public_id,
            system_id: doctype.system_id,
            force_quirks: true,
        });
        self.pending.push_back(Token::Eof);
        self.eof_emitted = true;
        self.state = State::Data;
    }

    fn step_cdata_section(&mut self) {
        if self.starts_with_ci("]]>") {
            self.pos += 3;
            self.flush_text_buffer();
            self.state = State::Data;
            return;
        }
        match self.advance() {
            Some(c) => self.push_char_token(c),
            None => {
                self.error("eof-in-cdata");
                self.flush_text_buffer();
                self.pending.push_back(Token::Eof);
                self.eof_emitted = true;
            }
        }
    }

    /// Consume a character reference starting just after the `&`. `in_attribute`
    /// is `Some(terminator)` when called from an attribute value context (an
    /// unterminated ambiguous ampersand there is left as a literal `&` rather
    /// than erroring, per spec).
    fn consume_character_reference(&mut self, in_attribute: Option<char>) -> String {
        if self.peek() == Some('#') {
            self.advance();
            let hex = matches!(self.peek(), Some('x') | Some('X'));
            if hex {
                self.advance();
            }
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                let ok = if hex { c.is_ascii_hexdigit() } else { c.is_ascii_digit() };
                if !ok {
                    break;
                }
                digits.push(c);
                self.advance();
            }
            if self.peek() == Some(';') {
                self.advance();
            } else {
                self.error("missing-semicolon-after-character-reference");
            }
            if digits.is_empty() {
                self.error("absence-of-digits-in-numeric-character-reference");
                return "&#".to_string();
            }
            let radix = if hex { 16 } else { 10 };
            let code_point = u32::from_str_radix(&digits, radix).unwrap_or(0xFFFD);
            return resolve_numeric(code_point);
        }

        let start = self.pos;
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let had_semicolon = self.peek() == Some(';');
        if had_semicolon {
            self.advance();
        }
        if !name.is_empty() {
            if let Some(resolved) = resolve_named(&name) {
                if !had_semicolon {
                    self.error("missing-semicolon-after-character-reference");
                    if let Some(terminator) = in_attribute {
                        if self.peek() == Some('=') || self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
                            self.pos = start;
                            return "&".to_string();
                        }
                        let _ = terminator;
                    }
                }
                return resolved.to_string();
            }
        }
        self.pos = start;
        "&".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_all(html: &str) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new(html);
        let mut tokens = Vec::new();
        loop {
            let token = tokenizer.next_token();
            let is_eof = token == Token::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    #[test]
    fn tokenizes_a_simple_start_and_end_tag() {
        let tokens = tokenize_all("<p>hi</p>");
        assert_eq!(
            tokens,
            vec![
                Token::StartTag { name: "p".to_string(), attributes: vec![], self_closing: false },
                Token::Character("hi".to_string()),
                Token::EndTag { name: "p".to_string() },
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_attributes() {
        let tokens = tokenize_all(r#"<a href="https://example.com" target=_blank>"#);
        match &tokens[0] {
            Token::StartTag { name, attributes, .. } => {
                assert_eq!(name, "a");
                assert_eq!(attributes[0], Attribute { name: "href".to_string(), value: "https://example.com".to_string() });
                assert_eq!(attributes[1], Attribute { name: "target".to_string(), value: "_blank".to_string() });
            }
            other => panic!("expected StartTag, got {other:?}"),
        }
    }

    #[test]
    fn resolves_named_and_numeric_character_references() {
        let tokens = tokenize_all("a &amp; b &#65; &#x42;");
        assert_eq!(tokens[0], Token::Character("a & b A B".to_string()));
    }

    #[test]
    fn script_data_ignores_tags_until_matching_end_tag() {
        let mut tokenizer = Tokenizer::new("<script>if (1 < 2) {}</script>after");
        assert_eq!(tokenizer.next_token(), Token::StartTag { name: "script".to_string(), attributes: vec![], self_closing: false });
        tokenizer.switch_to_script_data();
        assert_eq!(tokenizer.next_token(), Token::Character("if (1 < 2) {}".to_string()));
        assert_eq!(tokenizer.next_token(), Token::EndTag { name: "script".to_string() });
        assert_eq!(tokenizer.next_token(), Token::Character("after".to_string()));
    }

    #[test]
    fn tokenizes_a_comment() {
        let tokens = tokenize_all("<!-- hello -->");
        assert_eq!(tokens[0], Token::Comment(" hello ".to_string()));
    }

    #[test]
    fn tokenizes_a_doctype() {
        let tokens = tokenize_all("<!DOCTYPE html>");
        assert_eq!(tokens[0], Token::Doctype { name: Some("html".to_string()), public_id: None, system_id: None, force_quirks: false });
    }

    #[test]
    fn null_bytes_are_replaced_and_recorded_as_errors() {
        let mut tokenizer = Tokenizer::new("a\0b");
        let _ = tokenizer.next_token();
        assert!(tokenizer.errors().iter().any(|e| e.message == "unexpected-null-character"));
    }
}
