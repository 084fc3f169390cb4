//! Semantic tokens produced by the parser
//!
//! Token kinds are distinct bits so formatting code can ask "is this one
//! of {A, B, C}" with a single mask test.

use std::fmt;
use std::ops::BitOr;

/// Kind of a semantic token. Each kind is an independent bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TokenKind {
    /// `<name` of an opening tag
    TagOpening = 1 << 0,
    /// `>` ending an opening tag
    TagOpeningEnd = 1 << 1,
    /// `</name` of a closing tag
    TagClosing = 1 << 2,
    /// `>` ending a closing tag
    TagClosingEnd = 1 << 3,
    /// `/>`
    TagSelfClosingEnd = 1 << 4,
    AttrName = 1 << 5,
    Equal = 1 << 6,
    /// Quoted attribute value, quotes included
    AttrValue = 1 << 7,
    Text = 1 << 8,
    Whitespace = 1 << 9,
    LineBreak = 1 << 10,
    Comment = 1 << 11,
    CData = 1 << 12,
    /// `<!DOCTYPE name [`
    DeclarationBeg = 1 << 13,
    /// `]>`
    DeclarationEnd = 1 << 14,
    /// A complete `<!...>` declaration
    DeclarationSelfClosing = 1 << 15,
    /// `<?...?>`
    Instruction = 1 << 16,
    Undefined = 1 << 17,
    EndOfFile = 1 << 18,
}

impl TokenKind {
    /// The kind's bit
    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Set membership test
    #[inline]
    pub const fn is_in(self, set: TokenSet) -> bool {
        set.contains(self)
    }

    /// Stable name used by the token dump
    pub const fn name(self) -> &'static str {
        match self {
            TokenKind::TagOpening => "TagOpening",
            TokenKind::TagOpeningEnd => "TagOpeningEnd",
            TokenKind::TagClosing => "TagClosing",
            TokenKind::TagClosingEnd => "TagClosingEnd",
            TokenKind::TagSelfClosingEnd => "TagSelfClosingEnd",
            TokenKind::AttrName => "AttrName",
            TokenKind::Equal => "Equal",
            TokenKind::AttrValue => "AttrValue",
            TokenKind::Text => "Text",
            TokenKind::Whitespace => "Whitespace",
            TokenKind::LineBreak => "LineBreak",
            TokenKind::Comment => "Comment",
            TokenKind::CData => "CDATA",
            TokenKind::DeclarationBeg => "DeclarationBeg",
            TokenKind::DeclarationEnd => "DeclarationEnd",
            TokenKind::DeclarationSelfClosing => "DeclarationSelfClosing",
            TokenKind::Instruction => "Instruction",
            TokenKind::Undefined => "Undefined",
            TokenKind::EndOfFile => "EndOfFile",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TokenSet(u32);

impl TokenSet {
    /// Build a set from a list of kinds (usable in `const` items)
    pub const fn of(kinds: &[TokenKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bits();
            i += 1;
        }
        TokenSet(bits)
    }

    #[inline]
    pub const fn contains(self, kind: TokenKind) -> bool {
        self.0 & kind.bits() != 0
    }

    #[inline]
    pub const fn with(self, kind: TokenKind) -> Self {
        TokenSet(self.0 | kind.bits())
    }
}

impl From<TokenKind> for TokenSet {
    fn from(kind: TokenKind) -> Self {
        TokenSet(kind.bits())
    }
}

impl BitOr for TokenKind {
    type Output = TokenSet;

    fn bitor(self, rhs: TokenKind) -> TokenSet {
        TokenSet(self.bits() | rhs.bits())
    }
}

impl BitOr<TokenKind> for TokenSet {
    type Output = TokenSet;

    fn bitor(self, rhs: TokenKind) -> TokenSet {
        self.with(rhs)
    }
}

/// Where a token sits relative to the surrounding markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenContext {
    /// Produced between `<name` and the `>` or `/>` closing that opening tag
    pub in_opening_tag: bool,
}

/// A semantic token borrowing its text from the input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Absolute offset of the token's first byte in the input
    pub offset: usize,
    pub context: TokenContext,
}

impl<'a> Token<'a> {
    pub(crate) fn new(kind: TokenKind, text: &'a str, offset: usize, in_opening_tag: bool) -> Self {
        Token {
            kind,
            text,
            offset,
            context: TokenContext { in_opening_tag },
        }
    }

    /// End-of-file sentinel positioned at `offset`
    pub fn end_of_file(offset: usize) -> Self {
        Token::new(TokenKind::EndOfFile, "", offset, false)
    }

    /// Offset just past the token
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// Qualified element name of a `TagOpening`/`TagClosing` token (without `<` or `</`)
    pub fn name(&self) -> &'a str {
        let text = self.text;
        match self.kind {
            TokenKind::TagOpening => text.strip_prefix('<').unwrap_or(text),
            TokenKind::TagClosing => text.strip_prefix("</").unwrap_or(text),
            _ => text,
        }
    }

    /// Attribute value without its surrounding quotes
    pub fn unquoted(&self) -> &'a str {
        unquote(self.text)
    }
}

/// Strip one pair of matching single or double quotes
pub fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(&q @ (b'"' | b'\'')) => {
            let inner = &text[1..];
            if text.len() >= 2 && bytes[bytes.len() - 1] == q {
                &inner[..inner.len() - 1]
            } else {
                inner
            }
        }
        _ => text,
    }
}
