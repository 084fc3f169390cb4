//! XML Parser - groups lexemes into semantic tokens
//!
//! Pull-parser over [`Lexer`]: `<` + name becomes one `TagOpening` token,
//! attributes come out as name / equal / value, and comments, CDATA,
//! processing instructions and declarations come out whole. The parser
//! never fails: malformed input degrades to `Undefined` tokens, an early
//! `EndOfFile`, and a [`Diagnostic`] describing what was odd.
//!
//! One token of lookahead is kept in a single slot. Tokens only take effect
//! on the parser's context (nesting depth, `xml:space`) when `parse_next`
//! hands them out, so peeking never disturbs [`Parser::is_space_preserve`].

use super::lexer::{Lexeme, LexemeKind, Lexer};
use super::token::{Token, TokenKind, TokenSet};
use thiserror::Error;

/// Non-fatal observation about malformed input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {position}")]
pub struct Diagnostic {
    pub message: String,
    pub position: usize,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Diagnostic {
            message: message.into(),
            position,
        }
    }
}

/// Which kind of tag the cursor is inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagState {
    Outside,
    Opening,
    Closing,
}

const LAYOUT: TokenSet = TokenSet::of(&[TokenKind::Whitespace, TokenKind::LineBreak]);

/// Streaming XML parser with one-token lookahead
pub struct Parser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    register_linebreaks: bool,
    tag: TagState,
    finished: bool,
    /// Pending token fetched by `get_next_token`/`get_next_structure_token`
    peeked: Option<Token<'a>>,
    /// Kind of the token last returned by `parse_next`
    current: TokenKind,
    /// One entry per open element: is `xml:space="preserve"` in effect
    space_preserve: Vec<bool>,
    /// Value the element whose opening tag is being read will push
    pending_preserve: Option<bool>,
    /// Last attribute name seen was `xml:space`
    xml_space_attr: bool,
    diagnostics: Vec<Diagnostic>,
    eof_reported: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser that reports linebreaks as `LineBreak` tokens
    pub fn new(input: &'a str) -> Self {
        Parser {
            input,
            lexer: Lexer::new(input),
            register_linebreaks: true,
            tag: TagState::Outside,
            finished: false,
            peeked: None,
            current: TokenKind::Undefined,
            space_preserve: Vec::new(),
            pending_preserve: None,
            xml_space_attr: false,
            diagnostics: Vec::new(),
            eof_reported: false,
        }
    }

    /// Choose whether linebreaks are separate tokens or folded into whitespace.
    /// Rewinds the parser to the start of input.
    pub fn set_register_linebreaks(&mut self, register: bool) {
        self.register_linebreaks = register;
        self.reset();
    }

    /// Rewind to the start of input, clearing lookahead, context and diagnostics
    pub fn reset(&mut self) {
        self.lexer = Lexer::new(self.input).with_linebreaks(self.register_linebreaks);
        self.tag = TagState::Outside;
        self.finished = false;
        self.peeked = None;
        self.current = TokenKind::Undefined;
        self.space_preserve.clear();
        self.pending_preserve = None;
        self.xml_space_attr = false;
        self.diagnostics.clear();
        self.eof_reported = false;
    }

    /// The input being parsed
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Consume and return the next token. Returns `EndOfFile` forever once input is exhausted.
    pub fn parse_next(&mut self) -> Token<'a> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.produce(),
        };
        self.apply(&token);
        token
    }

    /// Look at the next token; the following `parse_next` returns it again
    pub fn get_next_token(&mut self) -> Token<'a> {
        if let Some(token) = self.peeked {
            return token;
        }
        let token = self.produce();
        self.peeked = Some(token);
        token
    }

    /// Look at the next token that is not whitespace or a linebreak.
    ///
    /// Whitespace and linebreak tokens skipped to reach it are discarded;
    /// the following `parse_next` returns the structural token.
    pub fn get_next_structure_token(&mut self) -> Token<'a> {
        let mut token = self.get_next_token();
        while token.kind.is_in(LAYOUT) {
            self.peeked = None;
            token = self.get_next_token();
        }
        token
    }

    /// True when the innermost open element has `xml:space="preserve"` in effect
    pub fn is_space_preserve(&self) -> bool {
        self.space_preserve.last().copied().unwrap_or(false)
    }

    /// Number of currently open elements
    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.space_preserve.len()
    }

    /// Name of the kind of the token last returned by `parse_next`
    pub fn token_name(&self) -> &'static str {
        self.current.name()
    }

    /// Observations about malformed input collected since the last reset
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Apply a delivered token's effect on the element context
    fn apply(&mut self, token: &Token<'a>) {
        self.current = token.kind;
        match token.kind {
            TokenKind::TagOpening => {
                self.pending_preserve = Some(self.is_space_preserve());
                self.xml_space_attr = false;
            }
            TokenKind::AttrName => {
                self.xml_space_attr = token.text == "xml:space";
            }
            TokenKind::AttrValue => {
                if self.xml_space_attr {
                    match token.unquoted() {
                        "preserve" => self.pending_preserve = Some(true),
                        "default" => self.pending_preserve = Some(false),
                        _ => {}
                    }
                }
                self.xml_space_attr = false;
            }
            TokenKind::TagOpeningEnd => {
                let inherited = self.is_space_preserve();
                let preserve = self.pending_preserve.take().unwrap_or(inherited);
                self.space_preserve.push(preserve);
                self.xml_space_attr = false;
            }
            TokenKind::TagSelfClosingEnd => {
                self.pending_preserve = None;
                self.xml_space_attr = false;
            }
            TokenKind::TagClosing => {
                if self.space_preserve.pop().is_none() {
                    self.warn("closing tag without a matching opening tag", token.offset);
                }
            }
            TokenKind::EndOfFile => {
                if !self.space_preserve.is_empty() && !self.eof_reported {
                    self.eof_reported = true;
                    let open = self.space_preserve.len();
                    self.warn(format!("{} element(s) still open at end of input", open), token.offset);
                }
            }
            _ => {}
        }
    }

    fn warn(&mut self, message: impl Into<String>, position: usize) {
        let diagnostic = Diagnostic::new(message, position);
        tracing::debug!(%diagnostic, "malformed input");
        self.diagnostics.push(diagnostic);
    }

    /// Produce the next raw token from the lexer
    fn produce(&mut self) -> Token<'a> {
        let token = self.lex_token();
        if !self.lexer.in_tag() {
            self.tag = TagState::Outside;
        }
        token
    }

    fn lex_token(&mut self) -> Token<'a> {
        if self.finished {
            return Token::end_of_file(self.input.len());
        }

        let in_opening_tag = self.tag == TagState::Opening;
        let lexeme = self.lexer.next_lexeme();

        match lexeme.kind {
            LexemeKind::InputEnd => {
                if self.tag != TagState::Outside {
                    self.warn("unexpected end of input inside a tag", lexeme.offset);
                }
                self.tag = TagState::Outside;
                self.finished = true;
                Token::end_of_file(self.input.len())
            }
            LexemeKind::TagStart => self.tag_start(lexeme, TokenKind::TagOpening, TagState::Opening),
            LexemeKind::ClosingTagStart => self.tag_start(lexeme, TokenKind::TagClosing, TagState::Closing),
            LexemeKind::DeclarationStart => self.declaration(lexeme),
            LexemeKind::PiStart => self.instruction(lexeme),
            LexemeKind::SubsetEnd => {
                self.tag = TagState::Outside;
                self.token(TokenKind::DeclarationEnd, lexeme, false)
            }
            LexemeKind::Comment => {
                self.tag = TagState::Outside;
                if !lexeme.terminated {
                    self.warn("unterminated comment", lexeme.offset);
                }
                self.token(TokenKind::Comment, lexeme, false)
            }
            LexemeKind::CData => {
                self.tag = TagState::Outside;
                if !lexeme.terminated {
                    self.warn("unterminated CDATA section", lexeme.offset);
                }
                self.token(TokenKind::CData, lexeme, false)
            }
            LexemeKind::Whitespace => self.token(TokenKind::Whitespace, lexeme, in_opening_tag),
            LexemeKind::Linebreak => self.token(TokenKind::LineBreak, lexeme, in_opening_tag),
            LexemeKind::Name | LexemeKind::NmToken if in_opening_tag => {
                self.token(TokenKind::AttrName, lexeme, true)
            }
            LexemeKind::Eq if in_opening_tag => self.token(TokenKind::Equal, lexeme, true),
            LexemeKind::Literal if in_opening_tag => {
                if !lexeme.terminated {
                    self.warn("unterminated attribute value", lexeme.offset);
                }
                self.token(TokenKind::AttrValue, lexeme, true)
            }
            LexemeKind::TagEnd | LexemeKind::SelfClosingTagEnd => {
                let kind = match (self.tag, lexeme.kind) {
                    (TagState::Opening, LexemeKind::TagEnd) => TokenKind::TagOpeningEnd,
                    (TagState::Opening, _) => TokenKind::TagSelfClosingEnd,
                    (TagState::Closing, _) => TokenKind::TagClosingEnd,
                    (TagState::Outside, _) => TokenKind::Undefined,
                };
                self.tag = TagState::Outside;
                self.token(kind, lexeme, in_opening_tag)
            }
            LexemeKind::Text if self.tag == TagState::Outside => self.token(TokenKind::Text, lexeme, false),
            _ => self.token(TokenKind::Undefined, lexeme, in_opening_tag),
        }
    }

    /// `<` or `</`, merged with the element name that follows it
    fn tag_start(&mut self, start: Lexeme<'a>, kind: TokenKind, state: TagState) -> Token<'a> {
        self.tag = state;
        let mut end = start.end();
        if matches!(self.lexer.peek().kind, LexemeKind::Name | LexemeKind::NmToken) {
            end = self.lexer.next_lexeme().end();
        }
        Token::new(kind, &self.input[start.offset..end], start.offset, false)
    }

    /// `<!...>` or `<!...[`
    fn declaration(&mut self, start: Lexeme<'a>) -> Token<'a> {
        self.tag = TagState::Outside;
        let mut end = start.end();
        loop {
            let next = self.lexer.peek();
            match next.kind {
                LexemeKind::TagEnd | LexemeKind::SelfClosingTagEnd => {
                    end = self.lexer.next_lexeme().end();
                    return self.span(TokenKind::DeclarationSelfClosing, start.offset, end);
                }
                LexemeKind::SubsetStart => {
                    end = self.lexer.next_lexeme().end();
                    return self.span(TokenKind::DeclarationBeg, start.offset, end);
                }
                LexemeKind::InputEnd
                | LexemeKind::TagStart
                | LexemeKind::ClosingTagStart
                | LexemeKind::DeclarationStart
                | LexemeKind::PiStart
                | LexemeKind::Comment
                | LexemeKind::CData => {
                    self.warn("unterminated declaration", start.offset);
                    return self.span(TokenKind::DeclarationSelfClosing, start.offset, end);
                }
                _ => {
                    end = self.lexer.next_lexeme().end();
                }
            }
        }
    }

    /// `<?...?>`, read as one unit
    fn instruction(&mut self, start: Lexeme<'a>) -> Token<'a> {
        self.tag = TagState::Outside;
        let body = self.lexer.read_until("?>");
        if !body.terminated {
            self.warn("unterminated processing instruction", start.offset);
        }
        let end = body.offset + body.text.len();
        self.span(TokenKind::Instruction, start.offset, end)
    }

    #[inline]
    fn token(&self, kind: TokenKind, lexeme: Lexeme<'a>, in_opening_tag: bool) -> Token<'a> {
        Token::new(kind, lexeme.text, lexeme.offset, in_opening_tag)
    }

    #[inline]
    fn span(&self, kind: TokenKind, start: usize, end: usize) -> Token<'a> {
        Token::new(kind, &self.input[start..end], start, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut parser = Parser::new(input);
        let mut out = Vec::new();
        loop {
            let token = parser.parse_next();
            if token.kind == EndOfFile {
                return out;
            }
            out.push(token.kind);
        }
    }

    fn texts(input: &str) -> Vec<&str> {
        let mut parser = Parser::new(input);
        let mut out = Vec::new();
        loop {
            let token = parser.parse_next();
            if token.kind == EndOfFile {
                return out;
            }
            out.push(token.text);
        }
    }

    #[test]
    fn test_element_with_attribute() {
        assert_eq!(
            kinds("<a x=\"1\">t</a>"),
            vec![TagOpening, Whitespace, AttrName, Equal, AttrValue, TagOpeningEnd, Text, TagClosing, TagClosingEnd]
        );
        assert_eq!(
            texts("<a x=\"1\">t</a>"),
            vec!["<a", " ", "x", "=", "\"1\"", ">", "t", "</a", ">"]
        );
    }

    #[test]
    fn test_self_closing() {
        assert_eq!(kinds("<a/>"), vec![TagOpening, TagSelfClosingEnd]);
        assert_eq!(kinds("<a />"), vec![TagOpening, Whitespace, TagSelfClosingEnd]);
    }

    #[test]
    fn test_opening_tag_context() {
        let mut parser = Parser::new("<a b='1'> </a >");
        let mut flags = Vec::new();
        loop {
            let token = parser.parse_next();
            if token.kind == EndOfFile {
                break;
            }
            if token.kind == Whitespace {
                flags.push(token.context.in_opening_tag);
            }
        }
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_atomic_constructs() {
        assert_eq!(
            texts("<?xml version=\"1.0\"?><!-- c --><r><![CDATA[<x>]]></r>"),
            vec!["<?xml version=\"1.0\"?>", "<!-- c -->", "<r", ">", "<![CDATA[<x>]]>", "</r", ">"]
        );
        assert_eq!(kinds("<?pi?>"), vec![Instruction]);
    }

    #[test]
    fn test_doctype_with_internal_subset() {
        let input = "<!DOCTYPE r [\n<!ELEMENT r ANY>\n]>\n<r/>";
        assert_eq!(
            kinds(input),
            vec![DeclarationBeg, LineBreak, DeclarationSelfClosing, LineBreak, DeclarationEnd, LineBreak, TagOpening, TagSelfClosingEnd]
        );
        assert_eq!(texts(input)[0], "<!DOCTYPE r [");
        assert_eq!(texts(input)[2], "<!ELEMENT r ANY>");
        assert_eq!(texts(input)[4], "]>");
    }

    #[test]
    fn test_doctype_without_subset() {
        assert_eq!(texts("<!DOCTYPE html><html/>")[0], "<!DOCTYPE html>");
    }

    #[test]
    fn test_end_of_file_is_idempotent() {
        let mut parser = Parser::new("<a>");
        while parser.parse_next().kind != EndOfFile {}
        for _ in 0..3 {
            let token = parser.parse_next();
            assert_eq!(token.kind, EndOfFile);
            assert_eq!(token.offset, 3);
        }
    }

    #[test]
    fn test_lookahead_returns_same_token() {
        let mut parser = Parser::new("<a>text</a>");
        assert_eq!(parser.parse_next().kind, TagOpening);
        assert_eq!(parser.parse_next().kind, TagOpeningEnd);
        let peeked = parser.get_next_token();
        assert_eq!(parser.get_next_token(), peeked);
        assert_eq!(parser.parse_next(), peeked);
        assert_eq!(parser.parse_next().kind, TagClosing);
    }

    #[test]
    fn test_structure_lookahead_skips_layout() {
        let mut parser = Parser::new("<a>\n  </a>");
        parser.parse_next();
        parser.parse_next();
        let next = parser.get_next_structure_token();
        assert_eq!(next.kind, TagClosing);
        assert_eq!(parser.parse_next().kind, TagClosing);
    }

    #[test]
    fn test_space_preserve_inheritance() {
        let input = "<r><p xml:space=\"preserve\"><c><d xml:space='default'><e>x</e></d><f>y</f></c></p><g>z</g></r>";
        let mut parser = Parser::new(input);
        let mut seen = Vec::new();
        loop {
            let token = parser.parse_next();
            match token.kind {
                EndOfFile => break,
                Text => seen.push((token.text, parser.is_space_preserve())),
                _ => {}
            }
        }
        assert_eq!(seen, vec![("x", false), ("y", true), ("z", false)]);
    }

    #[test]
    fn test_peek_does_not_apply_context() {
        let mut parser = Parser::new("<p xml:space=\"preserve\">x</p>");
        while parser.parse_next().kind != Text {}
        assert!(parser.is_space_preserve());
        assert_eq!(parser.get_next_token().kind, TagClosing);
        assert!(parser.is_space_preserve());
        parser.parse_next();
        assert!(!parser.is_space_preserve());
        assert_eq!(parser.depth(), 0);
    }

    #[test]
    fn test_reset_rewinds() {
        let mut parser = Parser::new("<a>x</a>");
        let first: Vec<_> = std::iter::from_fn(|| {
            let t = parser.parse_next();
            (t.kind != EndOfFile).then_some(t)
        })
        .collect();
        parser.reset();
        assert_eq!(parser.depth(), 0);
        let second: Vec<_> = std::iter::from_fn(|| {
            let t = parser.parse_next();
            (t.kind != EndOfFile).then_some(t)
        })
        .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_folded_linebreaks() {
        let mut parser = Parser::new("<a>\n  <b/>\n</a>");
        parser.set_register_linebreaks(false);
        let mut out = Vec::new();
        loop {
            let token = parser.parse_next();
            if token.kind == EndOfFile {
                break;
            }
            out.push(token.kind);
        }
        assert_eq!(
            out,
            vec![TagOpening, TagOpeningEnd, Whitespace, TagOpening, TagSelfClosingEnd, Whitespace, TagClosing, TagClosingEnd]
        );
    }

    #[test]
    fn test_token_name() {
        let mut parser = Parser::new("<a/>");
        parser.parse_next();
        assert_eq!(parser.token_name(), "TagOpening");
        parser.parse_next();
        assert_eq!(parser.token_name(), "TagSelfClosingEnd");
    }

    #[test]
    fn test_malformed_input_diagnostics() {
        let mut parser = Parser::new("</x><a attr=\"open");
        while parser.parse_next().kind != EndOfFile {}
        let messages: Vec<_> = parser.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "closing tag without a matching opening tag",
                "unterminated attribute value",
                "unexpected end of input inside a tag",
            ]
        );
        assert_eq!(parser.depth(), 0);
    }

    #[test]
    fn test_unclosed_elements_reported_once() {
        let mut parser = Parser::new("<a><b>");
        for _ in 0..6 {
            parser.parse_next();
        }
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(parser.diagnostics()[0].to_string(), "2 element(s) still open at end of input at offset 6");
    }

    #[test]
    fn test_unterminated_tag_before_next_tag() {
        assert_eq!(kinds("<a <b/>"), vec![TagOpening, Whitespace, TagOpening, TagSelfClosingEnd]);
    }

    #[test]
    fn test_stray_bytes_in_tag_are_undefined() {
        assert_eq!(kinds("<a %x;>"), vec![TagOpening, Whitespace, Undefined, TagOpeningEnd]);
    }

    #[test]
    fn test_stray_pi_end_closes_tag() {
        assert_eq!(kinds("<a ?>t"), vec![TagOpening, Whitespace, Undefined, Text]);
        assert_eq!(texts("<a ?>t"), vec!["<a", " ", "?>", "t"]);
    }
}
