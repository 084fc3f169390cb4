//! Formatting passes over the parser's token stream
//!
//! Each pass rewinds the parser and walks the whole input once, writing into
//! a fresh output buffer:
//! - linearize: drop layout whitespace, keep everything else byte for byte
//! - pretty_print: re-indent (or, in indent-only mode, re-align existing lines)
//! - current_path: describe the element/attribute context at an offset
//! - debug_tokens: token kind dump for diagnostics

mod debug;
mod linearize;
mod params;
mod path;
mod pretty;

pub use params::{FormatterParams, PathMode};

use crate::core::token::{TokenKind, TokenSet};
use crate::core::{Diagnostic, Parser};

/// Formatter over a borrowed input buffer
pub struct XmlFormatter<'a> {
    parser: Parser<'a>,
    params: FormatterParams,
}

impl<'a> XmlFormatter<'a> {
    /// Create a formatter with default parameters
    pub fn new(input: &'a str) -> Self {
        Self::with_params(input, FormatterParams::default())
    }

    pub fn with_params(input: &'a str, params: FormatterParams) -> Self {
        XmlFormatter {
            parser: Parser::new(input),
            params,
        }
    }

    /// Re-serialize on one line with layout whitespace removed
    pub fn linearize(&mut self) -> String {
        tracing::debug!(len = self.parser.input().len(), "linearize");
        linearize::linearize(&mut self.parser, &self.params)
    }

    /// Re-serialize with indentation
    pub fn pretty_print(&mut self) -> String {
        tracing::debug!(
            len = self.parser.input().len(),
            indent_only = self.params.indent_only,
            "pretty_print"
        );
        pretty::pretty_print(&mut self.parser, &self.params)
    }

    /// Path of the element (and attribute) enclosing `offset`
    pub fn current_path(&mut self, offset: usize, mode: PathMode) -> String {
        tracing::debug!(len = self.parser.input().len(), offset, mode = mode.bits(), "current_path");
        path::current_path(&mut self.parser, &self.params, offset, mode)
    }

    /// Token kind names joined by `separator`, each followed by `: text` when `detailed`
    pub fn debug_tokens(&mut self, separator: &str, detailed: bool) -> String {
        debug::debug_tokens(&mut self.parser, separator, detailed)
    }

    /// Malformed-input observations from the last pass
    pub fn warnings(&self) -> &[Diagnostic] {
        self.parser.diagnostics()
    }
}

/// Kinds after which a blank text run still carries meaning
const SIGNIFICANT_FOLLOWERS: TokenSet =
    TokenSet::of(&[TokenKind::TagOpening, TokenKind::Comment, TokenKind::DeclarationBeg]);

/// Whether a (trimmed) text run must be written.
///
/// Blank text is dropped before markup, except when it is the only
/// content of an element (`<a> </a>`).
pub(crate) fn keeps_text(trimmed: &str, next: TokenKind, last_applied: TokenKind) -> bool {
    !trimmed.is_empty()
        || (!next.is_in(SIGNIFICANT_FOLLOWERS)
            && (next != TokenKind::TagClosing || last_applied == TokenKind::TagOpeningEnd))
}

/// Trim spaces, tabs and linebreaks
pub(crate) fn trim_layout(text: &str) -> &str {
    text.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

/// Trim spaces and tabs only
pub(crate) fn trim_blanks(text: &str) -> &str {
    text.trim_matches(|c| matches!(c, ' ' | '\t'))
}

/// Output buffer with clamped indentation
pub(crate) struct Output<'p> {
    buf: String,
    params: &'p FormatterParams,
    depth: usize,
}

impl<'p> Output<'p> {
    pub(crate) fn with_capacity(params: &'p FormatterParams, capacity: usize) -> Self {
        Output {
            buf: String::with_capacity(capacity),
            params,
            depth: 0,
        }
    }

    #[inline]
    pub(crate) fn push_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub(crate) fn write_eol(&mut self) {
        self.buf.push_str(&self.params.eol);
    }

    pub(crate) fn write_indentation(&mut self) {
        for _ in 0..self.indent_level() {
            self.buf.push_str(&self.params.indent);
        }
    }

    pub(crate) fn write_repeated(&mut self, c: char, count: usize) {
        self.buf.extend(std::iter::repeat(c).take(count));
    }

    pub(crate) fn indent(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn outdent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Rendered level: nesting depth, clamped to `max_indent_level` unless that is 0
    pub(crate) fn indent_level(&self) -> usize {
        match self.params.max_indent_level {
            0 => self.depth,
            max => self.depth.min(max),
        }
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}
