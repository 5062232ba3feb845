//! Token types produced by the tokenizer (§4.9: "Tokens: DOCTYPE, StartTag,
//! EndTag, Comment, Character, EOF").

/// A single attribute on a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute's name, lowercased per the tokenizer's ASCII
    /// lowercasing rule for tag/attribute names.
    pub name: String,
    /// The attribute's value (empty string if it had none).
    pub value: String,
}

/// One token off the tokenizer's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A `<!DOCTYPE ...>` declaration.
    Doctype {
        /// The DOCTYPE name, lowercased (`html` for a standards-mode doctype).
        name: Option<String>,
        /// The `PUBLIC` identifier, if present.
        public_id: Option<String>,
        /// The `SYSTEM` identifier, if present.
        system_id: Option<String>,
        /// Whether the doctype's combination of name/ids forces quirks mode.
        force_quirks: bool,
    },
    /// A `<tag ...>` start tag.
    StartTag {
        /// The tag name, lowercased.
        name: String,
        /// Attributes in source order; per the tokenizer's "ignore a
        /// duplicate attribute" rule, only the first occurrence of a given
        /// name is kept.
        attributes: Vec<Attribute>,
        /// Whether the tag was self-closed (`<br/>`); meaningful only for
        /// foreign (SVG/MathML) content, ignored for HTML elements.
        self_closing: bool,
    },
    /// A `</tag>` end tag.
    EndTag {
        /// The tag name, lowercased.
        name: String,
    },
    /// A `<!-- ... -->` comment.
    Comment(String),
    /// A single run of character data (the tokenizer coalesces adjacent
    /// character tokens so the tree constructor sees one text run per
    /// uninterrupted span).
    Character(String),
    /// End of input.
    Eof,
}

impl Token {
    /// The tag name, for `StartTag`/`EndTag` tokens.
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Token::StartTag { name, .. } | Token::EndTag { name } => Some(name),
            _ => None,
        }
    }
}
