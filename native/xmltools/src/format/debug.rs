//! Token kind dump

use crate::core::token::TokenKind;
use crate::core::Parser;

pub(crate) fn debug_tokens(parser: &mut Parser<'_>, separator: &str, detailed: bool) -> String {
    parser.set_register_linebreaks(true);

    let mut out = String::new();
    let mut first = true;
    loop {
        let token = parser.parse_next();
        if token.kind == TokenKind::EndOfFile {
            break;
        }
        if !first {
            out.push_str(separator);
        }
        first = false;
        out.push_str(parser.token_name());
        if detailed {
            out.push_str(": ");
            out.push_str(token.text);
        }
    }
    out
}
