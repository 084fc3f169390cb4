//! Single-line re-serialization

use super::{keeps_text, trim_layout, FormatterParams, Output};
use crate::core::token::{Token, TokenKind};
use crate::core::Parser;

pub(crate) fn linearize(parser: &mut Parser<'_>, params: &FormatterParams) -> String {
    parser.set_register_linebreaks(false);

    let mut out = Output::with_capacity(params, parser.input().len());
    let mut last_applied = TokenKind::Undefined;
    let mut auto_closed = false;
    let mut open_name = "";

    loop {
        let token = parser.parse_next();
        let preserve = params.apply_space_preserve && parser.is_space_preserve();

        match token.kind {
            TokenKind::EndOfFile => break,
            TokenKind::LineBreak => {}
            TokenKind::Whitespace => {
                if token.context.in_opening_tag {
                    out.push_str(" ");
                    last_applied = TokenKind::Whitespace;
                } else if preserve {
                    out.push_str(token.text);
                    last_applied = TokenKind::Whitespace;
                }
            }
            TokenKind::Text => {
                if preserve {
                    out.push_str(token.text);
                    last_applied = TokenKind::Text;
                } else {
                    let text = trim_layout(token.text);
                    if !params.ensure_conformity || keeps_text(text, parser.get_next_token().kind, last_applied) {
                        out.push_str(text);
                        last_applied = TokenKind::Text;
                    }
                }
            }
            TokenKind::TagOpening => {
                open_name = token.name();
                out.push_str(token.text);
                last_applied = TokenKind::TagOpening;
            }
            TokenKind::TagOpeningEnd => {
                auto_closed = params.auto_close_tags && closes(&parser.get_next_token(), open_name);
                if auto_closed {
                    tracing::trace!(element = open_name, "auto-closing empty element");
                    out.push_str("/>");
                    last_applied = TokenKind::TagSelfClosingEnd;
                } else {
                    out.push_str(">");
                    last_applied = TokenKind::TagOpeningEnd;
                }
            }
            TokenKind::TagClosing => {
                if !auto_closed {
                    out.push_str(token.text);
                    last_applied = TokenKind::TagClosing;
                }
            }
            TokenKind::TagClosingEnd => {
                if !auto_closed {
                    out.push_str(">");
                    last_applied = TokenKind::TagClosingEnd;
                }
                auto_closed = false;
            }
            TokenKind::TagSelfClosingEnd => {
                out.push_str("/>");
                last_applied = TokenKind::TagSelfClosingEnd;
                auto_closed = false;
            }
            kind => {
                out.push_str(token.text);
                last_applied = kind;
            }
        }
    }

    out.finish()
}

/// `next` is the closing tag of the element named `open_name`
pub(crate) fn closes(next: &Token<'_>, open_name: &str) -> bool {
    next.kind == TokenKind::TagClosing && next.name() == open_name
}
