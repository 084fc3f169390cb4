//! Indented re-serialization
//!
//! Reformat mode drops layout whitespace and starts a new line before every
//! tag, comment and declaration that is not inline with text. Indent-only
//! mode keeps the document's own line structure and only re-indents lines
//! that already started in the source; it never adds a line break.

use super::linearize::closes;
use super::{keeps_text, trim_blanks, trim_layout, FormatterParams, Output};
use crate::core::token::{Token, TokenKind, TokenSet};
use crate::core::Parser;

/// Last written kinds after which markup stays on the same line
const INLINE: TokenSet = TokenSet::of(&[TokenKind::Text, TokenKind::CData, TokenKind::Undefined]);
/// Same, for closing tags: an empty element also stays on one line
const INLINE_OR_OPENED: TokenSet = INLINE.with(TokenKind::TagOpeningEnd);

pub(crate) fn pretty_print(parser: &mut Parser<'_>, params: &FormatterParams) -> String {
    parser.set_register_linebreaks(true);
    let capacity = parser.input().len() + parser.input().len() / 2;
    PrettyPrinter::new(params, capacity).run(parser)
}

struct PrettyPrinter<'a, 'p> {
    params: &'p FormatterParams,
    out: Output<'p>,
    indent_only: bool,
    indent_attributes: bool,
    last_applied: TokenKind,
    /// In indent-only mode: the last thing written ended a source line
    line_broken: bool,
    auto_closed: bool,
    attr_count: usize,
    open_name: &'a str,
    /// Width in chars of `<name` for the tag being opened
    tag_width: usize,
}

impl<'a, 'p> PrettyPrinter<'a, 'p> {
    fn new(params: &'p FormatterParams, capacity: usize) -> Self {
        PrettyPrinter {
            params,
            out: Output::with_capacity(params, capacity),
            indent_only: params.indent_only,
            indent_attributes: params.indent_attributes || params.indent_only,
            last_applied: TokenKind::Undefined,
            line_broken: false,
            auto_closed: false,
            attr_count: 0,
            open_name: "",
            tag_width: 0,
        }
    }

    fn run(mut self, parser: &mut Parser<'a>) -> String {
        loop {
            let token = parser.parse_next();
            if token.kind == TokenKind::EndOfFile {
                break;
            }
            let preserve = self.params.apply_space_preserve && parser.is_space_preserve();
            self.apply(token, parser, preserve);
        }
        self.out.finish()
    }

    fn apply(&mut self, token: Token<'a>, parser: &mut Parser<'a>, preserve: bool) {
        match token.kind {
            TokenKind::TagOpening => {
                self.open_name = token.name();
                self.tag_width = token.text.chars().count();
                self.attr_count = 0;
                self.start_line(INLINE);
                self.emit(token);
            }
            TokenKind::TagOpeningEnd => {
                self.attr_count = 0;
                self.auto_closed =
                    self.params.auto_close_tags && closes(&parser.get_next_token(), self.open_name);
                if self.auto_closed {
                    tracing::trace!(element = self.open_name, "auto-closing empty element");
                    self.write(TokenKind::TagSelfClosingEnd, "/>");
                } else {
                    self.write(TokenKind::TagOpeningEnd, ">");
                    self.out.indent();
                }
            }
            TokenKind::TagClosing => {
                if !self.auto_closed {
                    self.out.outdent();
                    self.start_line(INLINE_OR_OPENED);
                    self.emit(token);
                }
                self.line_broken = false;
            }
            TokenKind::TagClosingEnd => {
                if !self.auto_closed {
                    self.write(TokenKind::TagClosingEnd, ">");
                }
                self.auto_closed = false;
                self.line_broken = false;
            }
            TokenKind::TagSelfClosingEnd => {
                self.attr_count = 0;
                self.auto_closed = false;
                self.write(TokenKind::TagSelfClosingEnd, "/>");
            }
            TokenKind::AttrName => {
                self.attribute(token);
            }
            TokenKind::Text => {
                if preserve {
                    self.out.push_str(token.text);
                    self.last_applied = TokenKind::Text;
                } else {
                    self.text(token, parser);
                }
            }
            TokenKind::LineBreak => {
                if preserve || self.indent_only {
                    self.out.push_str(token.text);
                    self.last_applied = TokenKind::LineBreak;
                    self.line_broken = self.indent_only;
                }
            }
            TokenKind::Whitespace => {
                // Attribute separators are written by `attribute`.
                if preserve && !token.context.in_opening_tag {
                    self.out.push_str(token.text);
                    self.last_applied = TokenKind::Whitespace;
                }
            }
            TokenKind::DeclarationBeg | TokenKind::DeclarationSelfClosing => {
                self.start_line(INLINE);
                self.emit(token);
                if token.kind == TokenKind::DeclarationBeg {
                    self.out.indent();
                }
            }
            TokenKind::DeclarationEnd => {
                self.out.outdent();
                if self.indent_only {
                    if self.line_broken {
                        self.out.write_indentation();
                    }
                } else {
                    self.out.write_eol();
                    self.out.write_indentation();
                }
                self.emit(token);
            }
            TokenKind::Comment => {
                self.start_line(INLINE);
                self.emit(token);
            }
            _ => self.emit(token),
        }
    }

    /// Start a new line before markup, unless the previous output keeps it inline.
    /// Indent-only mode only indents lines the source already broke.
    fn start_line(&mut self, inline: TokenSet) {
        if self.indent_only {
            if self.line_broken {
                self.out.write_indentation();
            }
        } else if !self.last_applied.is_in(inline) {
            self.out.write_eol();
            self.out.write_indentation();
        }
    }

    fn attribute(&mut self, token: Token<'a>) {
        let realign = if self.indent_only {
            self.line_broken
        } else {
            self.indent_attributes && self.attr_count > 0
        };
        if realign {
            if !self.indent_only {
                self.out.write_eol();
            }
            self.out.write_indentation();
            self.out.write_repeated(' ', self.tag_width);
        }
        self.attr_count += 1;
        self.out.push_str(" ");
        self.emit(token);
    }

    fn text(&mut self, token: Token<'a>, parser: &mut Parser<'a>) {
        let text = if self.indent_only {
            trim_blanks(token.text)
        } else {
            trim_layout(token.text)
        };
        let keep = !self.params.ensure_conformity
            || keeps_text(text, parser.get_next_token().kind, self.last_applied);
        if keep {
            self.out.push_str(text);
            self.last_applied = TokenKind::Text;
            self.line_broken = self.indent_only && text.ends_with(['\r', '\n']);
        }
    }

    fn emit(&mut self, token: Token<'a>) {
        self.write(token.kind, token.text);
    }

    fn write(&mut self, kind: TokenKind, text: &str) {
        self.out.push_str(text);
        self.last_applied = kind;
        self.line_broken = false;
    }
}
