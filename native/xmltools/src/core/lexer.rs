//! XML Lexer - atomic lexemes over a borrowed buffer
//!
//! The lexer knows nothing about elements or attributes. It splits the
//! input into delimiters, names, literals, whitespace and text, tracking
//! only whether the cursor currently sits inside a tag and whether it is
//! inside a DTD internal subset. Comments and CDATA sections come out as
//! single lexemes. Lexemes borrow from the input; nothing is copied.

use super::scanner::{self, Scanner};

/// Kind of an atomic lexeme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexemeKind {
    /// `<`
    TagStart,
    /// `</`
    ClosingTagStart,
    /// `>`
    TagEnd,
    /// `/>`
    SelfClosingTagEnd,
    /// `<?`
    PiStart,
    /// `?>`
    PiEnd,
    /// `<!`
    DeclarationStart,
    /// `[` opening a DTD internal subset
    SubsetStart,
    /// `]>` closing a DTD internal subset
    SubsetEnd,
    /// `<!--...-->`
    Comment,
    /// `<![CDATA[...]]>`
    CData,
    /// `=`
    Eq,
    /// Single- or double-quoted literal, quotes included
    Literal,
    /// XML name
    Name,
    /// Name token that is not a valid name (e.g. starts with a digit)
    NmToken,
    /// Run of spaces and tabs (linebreaks too when they are folded)
    Whitespace,
    /// CR, LF or CRLF
    Linebreak,
    /// Anything else
    Text,
    /// End of input
    InputEnd,
}

/// A lexeme: kind plus a view into the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub kind: LexemeKind,
    pub text: &'a str,
    /// Absolute offset of the first byte
    pub offset: usize,
    /// False when an atomic construct (comment, CDATA, literal) ran to end of input
    pub terminated: bool,
}

impl<'a> Lexeme<'a> {
    /// Offset just past the lexeme
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Result of [`Lexer::read_until`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanned<'a> {
    /// Text from the cursor through the marker (or through end of input)
    pub text: &'a str,
    pub offset: usize,
    /// Whether the marker was found
    pub terminated: bool,
}

/// Hand-written XML lexer
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
    in_tag: bool,
    in_declaration: bool,
    subset_depth: usize,
    register_linebreaks: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer that reports linebreaks as their own lexemes
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            scanner: Scanner::new(input.as_bytes()),
            in_tag: false,
            in_declaration: false,
            subset_depth: 0,
            register_linebreaks: true,
        }
    }

    /// Choose whether linebreaks are reported separately or folded into whitespace
    pub fn with_linebreaks(mut self, register: bool) -> Self {
        self.register_linebreaks = register;
        self
    }

    /// True when the last lexeme left the cursor inside a tag
    pub fn in_tag(&self) -> bool {
        self.in_tag
    }

    /// True once the whole input has been consumed
    #[cfg(test)]
    pub fn is_done(&self) -> bool {
        self.scanner.is_eof()
    }

    /// Look at the next lexeme without consuming it
    pub fn peek(&self) -> Lexeme<'a> {
        self.clone().next_lexeme()
    }

    /// Consume and return the next lexeme
    pub fn next_lexeme(&mut self) -> Lexeme<'a> {
        let start = self.scanner.position();
        let b = match self.scanner.peek() {
            Some(b) => b,
            None => return self.lexeme(LexemeKind::InputEnd, start),
        };

        if b == b'<' {
            return self.markup(start);
        }

        if b == b'?' && self.scanner.peek_at(1) == Some(b'>') {
            self.scanner.advance(2);
            self.leave_tag();
            return self.lexeme(LexemeKind::PiEnd, start);
        }

        if self.in_tag {
            self.tag_content(start, b)
        } else {
            self.content(start, b)
        }
    }

    /// Advance through the next occurrence of `marker`.
    ///
    /// Used for atomic constructs whose body is not lexed (processing
    /// instructions). On failure the cursor moves to end of input and the
    /// returned text covers everything that remained. Either way the cursor
    /// ends up outside any tag.
    pub fn read_until(&mut self, marker: &str) -> Scanned<'a> {
        let offset = self.scanner.position();
        let terminated = self.consume_past(marker.as_bytes());
        self.leave_tag();
        Scanned {
            text: &self.input[offset..self.scanner.position()],
            offset,
            terminated,
        }
    }

    fn markup(&mut self, start: usize) -> Lexeme<'a> {
        if self.scanner.starts_with(b"<!--") {
            self.scanner.advance(4);
            let terminated = self.consume_past(b"-->");
            self.leave_tag();
            return self.atomic(LexemeKind::Comment, start, terminated);
        }

        if self.scanner.starts_with(b"<![CDATA[") {
            self.scanner.advance(9);
            let terminated = self.consume_past(b"]]>");
            self.leave_tag();
            return self.atomic(LexemeKind::CData, start, terminated);
        }

        self.in_tag = true;
        self.in_declaration = false;

        let kind = match self.scanner.peek_at(1) {
            Some(b'!') => {
                self.in_declaration = true;
                LexemeKind::DeclarationStart
            }
            Some(b'?') => LexemeKind::PiStart,
            Some(b'/') => LexemeKind::ClosingTagStart,
            _ => LexemeKind::TagStart,
        };

        self.scanner.advance(if kind == LexemeKind::TagStart { 1 } else { 2 });
        self.lexeme(kind, start)
    }

    fn tag_content(&mut self, start: usize, b: u8) -> Lexeme<'a> {
        match b {
            b'>' => {
                self.scanner.advance(1);
                self.leave_tag();
                self.lexeme(LexemeKind::TagEnd, start)
            }
            b'/' if self.scanner.peek_at(1) == Some(b'>') => {
                self.scanner.advance(2);
                self.leave_tag();
                self.lexeme(LexemeKind::SelfClosingTagEnd, start)
            }
            b'=' => {
                self.scanner.advance(1);
                self.lexeme(LexemeKind::Eq, start)
            }
            b'"' | b'\'' => {
                self.scanner.advance(1);
                let terminated = self.consume_past(&[b]);
                self.atomic(LexemeKind::Literal, start, terminated)
            }
            b'[' if self.in_declaration => {
                self.scanner.advance(1);
                self.leave_tag();
                self.subset_depth += 1;
                self.lexeme(LexemeKind::SubsetStart, start)
            }
            _ if scanner::is_whitespace(b) => self.whitespace(start, b),
            _ if scanner::is_name_start_char(b) => {
                self.scanner.skip_while(scanner::is_name_char);
                self.lexeme(LexemeKind::Name, start)
            }
            _ if scanner::is_name_char(b) => {
                self.scanner.skip_while(scanner::is_name_char);
                self.lexeme(LexemeKind::NmToken, start)
            }
            _ => {
                // Stray bytes inside a tag: one run up to the next delimiter.
                self.scanner.advance(1);
                self.scanner.skip_while(|b| {
                    !scanner::is_whitespace(b)
                        && !matches!(b, b'<' | b'>' | b'/' | b'=' | b'?' | b'"' | b'\'' | b'[' | b']')
                });
                self.lexeme(LexemeKind::Text, start)
            }
        }
    }

    fn content(&mut self, start: usize, b: u8) -> Lexeme<'a> {
        if b == b']' && self.subset_depth > 0 {
            let mut ahead = self.scanner;
            ahead.advance(1);
            ahead.skip_while(scanner::is_whitespace);
            if ahead.peek() == Some(b'>') {
                self.scanner.set_position(ahead.position() + 1);
                self.subset_depth -= 1;
                return self.lexeme(LexemeKind::SubsetEnd, start);
            }
        }

        // Whitespace is only whitespace when nothing but markup (or the end) follows it;
        // otherwise it belongs to the text run.
        if scanner::is_whitespace(b) {
            let run_end = self.scanner.run_end(scanner::is_whitespace);
            let markup_follows = match self.scanner.byte_at(run_end) {
                None | Some(b'<') => true,
                Some(b']') => self.subset_depth > 0,
                Some(_) => false,
            };
            if markup_follows {
                return self.whitespace(start, b);
            }
        }

        self.scanner.advance(1);
        let end = if self.subset_depth > 0 {
            self.scanner.find_markup_or_subset_end()
        } else {
            self.scanner.find_markup_start()
        };
        self.scanner.set_position(end.unwrap_or(self.scanner.end()));
        self.lexeme(LexemeKind::Text, start)
    }

    fn whitespace(&mut self, start: usize, b: u8) -> Lexeme<'a> {
        if !self.register_linebreaks {
            self.scanner.skip_while(scanner::is_whitespace);
            return self.lexeme(LexemeKind::Whitespace, start);
        }

        match b {
            b'\r' => {
                self.scanner.advance(1);
                if self.scanner.peek() == Some(b'\n') {
                    self.scanner.advance(1);
                }
                self.lexeme(LexemeKind::Linebreak, start)
            }
            b'\n' => {
                self.scanner.advance(1);
                self.lexeme(LexemeKind::Linebreak, start)
            }
            _ => {
                self.scanner.skip_while(scanner::is_blank);
                self.lexeme(LexemeKind::Whitespace, start)
            }
        }
    }

    fn consume_past(&mut self, needle: &[u8]) -> bool {
        match self.scanner.find_past(needle) {
            Some(end) => {
                self.scanner.set_position(end);
                true
            }
            None => {
                self.scanner.set_position(self.scanner.end());
                false
            }
        }
    }

    fn leave_tag(&mut self) {
        self.in_tag = false;
        self.in_declaration = false;
    }

    #[inline]
    fn lexeme(&self, kind: LexemeKind, start: usize) -> Lexeme<'a> {
        self.atomic(kind, start, true)
    }

    #[inline]
    fn atomic(&self, kind: LexemeKind, start: usize, terminated: bool) -> Lexeme<'a> {
        Lexeme {
            kind,
            text: &self.input[start..self.scanner.position()],
            offset: start,
            terminated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use LexemeKind::*;

    fn assert_lexes(expected: &[(LexemeKind, &str)], register_linebreaks: bool) {
        let input: String = expected.iter().map(|(_, text)| *text).collect();
        let mut lexer = Lexer::new(&input).with_linebreaks(register_linebreaks);

        for (kind, text) in expected {
            let lexeme = lexer.next_lexeme();
            assert_eq!((lexeme.kind, lexeme.text), (*kind, *text), "input {:?}", input);
        }
        assert!(lexer.is_done());
    }

    #[rstest]
    #[case::input_end(&[(InputEnd, "")])]
    #[case::tag_space(&[(TagStart, "<"), (Whitespace, " ")])]
    #[case::tag_double_space(&[(TagStart, "<"), (Whitespace, " \t")])]
    #[case::linebreak(&[(Linebreak, "\r\n")])]
    #[case::space_break(&[(Whitespace, "  "), (Linebreak, "\r\n"), (Whitespace, "  ")])]
    #[case::tag_space_break(&[(TagStart, "<"), (Whitespace, "  "), (Linebreak, "\r\n"), (Whitespace, "  ")])]
    #[case::pi_start(&[(PiStart, "<?")])]
    #[case::pi_end(&[(PiStart, "<?"), (PiEnd, "?>")])]
    #[case::cdata(&[(CData, "<![CDATA[ some < > text ]]>")])]
    #[case::tag_name(&[(TagStart, "<"), (Name, "TEXT")])]
    #[case::tag_nmtoken(&[(TagStart, "<"), (NmToken, "0TEXT")])]
    #[case::text(&[(Text, "This is the end")])]
    #[case::text_leading_ws(&[(Text, "    This is the end")])]
    #[case::text_trailing_ws(&[(Text, "This is the end    ")])]
    #[case::tag_start(&[(TagStart, "<")])]
    #[case::comment(&[(Comment, "<!-- Comment <> -->")])]
    #[case::eq(&[(TagStart, "<"), (Eq, "=")])]
    #[case::tag_end(&[(TagStart, "<"), (TagEnd, ">")])]
    #[case::closing_tag(&[(ClosingTagStart, "</")])]
    #[case::self_closing(&[(TagStart, "<"), (Name, "tagname"), (SelfClosingTagEnd, "/>")])]
    #[case::single_quote(&[(TagStart, "<"), (Literal, "'some'")])]
    #[case::double_quote(&[(TagStart, "<"), (Literal, "\"some\""), (TagEnd, ">")])]
    #[case::literal_markup_chars(&[(TagStart, "<"), (Literal, "\"<>&\""), (TagEnd, ">")])]
    #[case::element_text(&[
        (TagStart, "<"), (Name, "test"), (TagEnd, ">"), (Text, "."),
        (ClosingTagStart, "</"), (Name, "test"), (TagEnd, ">"),
    ])]
    fn test_lexemes(#[case] expected: &[(LexemeKind, &str)]) {
        assert_lexes(expected, true);
    }

    #[rstest]
    #[case::whitespace(&[(Whitespace, "  \r\n  ")])]
    #[case::tag_whitespace(&[(TagStart, "<"), (Whitespace, "  \r\n")])]
    fn test_folded_linebreaks(#[case] expected: &[(LexemeKind, &str)]) {
        assert_lexes(expected, false);
    }

    #[test]
    fn test_internal_subset() {
        assert_lexes(
            &[
                (DeclarationStart, "<!"),
                (Name, "DOCTYPE"),
                (Whitespace, " "),
                (Name, "a"),
                (Whitespace, " "),
                (SubsetStart, "["),
                (DeclarationStart, "<!"),
                (Name, "ELEMENT"),
                (Whitespace, " "),
                (Name, "a"),
                (Whitespace, " "),
                (Name, "ANY"),
                (TagEnd, ">"),
                (SubsetEnd, "]>"),
            ],
            true,
        );
    }

    #[test]
    fn test_bracket_outside_subset_is_text() {
        assert_lexes(&[(TagStart, "<"), (Name, "a"), (TagEnd, ">"), (Text, "x]>y")], true);
    }

    #[test]
    fn test_in_tag_after_openers() {
        for input in ["<", "<!ATTR", "<?", "</ATTR"] {
            let mut lexer = Lexer::new(input);
            lexer.next_lexeme();
            assert!(lexer.in_tag(), "{}", input);
        }
    }

    #[test]
    fn test_in_tag_false_after_tag_end() {
        let mut lexer = Lexer::new("<>");
        lexer.next_lexeme();
        lexer.next_lexeme();
        assert!(!lexer.in_tag());
    }

    #[test]
    fn test_in_tag_false_after_self_closing() {
        let mut lexer = Lexer::new("<ATTR/>");
        lexer.next_lexeme();
        lexer.next_lexeme();
        lexer.next_lexeme();
        assert!(!lexer.in_tag());
    }

    #[test]
    fn test_read_until() {
        let mut lexer = Lexer::new("abcd");
        let scanned = lexer.read_until("d");
        assert!(scanned.terminated);
        assert_eq!(scanned.text, "abcd");
    }

    #[test]
    fn test_read_until_end_of_file() {
        let mut lexer = Lexer::new("<ATTR/>");
        let scanned = lexer.read_until("g");
        assert!(!scanned.terminated);
        assert_eq!(scanned.text, "<ATTR/>");
        assert!(lexer.is_done());
    }

    #[test]
    fn test_unterminated_comment() {
        let mut lexer = Lexer::new("<!-- open");
        let lexeme = lexer.next_lexeme();
        assert_eq!(lexeme.kind, Comment);
        assert_eq!(lexeme.text, "<!-- open");
        assert!(!lexeme.terminated);
        assert_eq!(lexer.next_lexeme().kind, InputEnd);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("<a>");
        assert_eq!(lexer.peek().kind, TagStart);
        assert_eq!(lexer.next_lexeme().kind, TagStart);
        assert_eq!(lexer.peek().text, "a");
    }

    #[test]
    fn test_multibyte_text_and_names() {
        let mut lexer = Lexer::new("<ünï>héllo</ünï>");
        assert_eq!(lexer.next_lexeme().kind, TagStart);
        assert_eq!(lexer.next_lexeme().text, "ünï");
        assert_eq!(lexer.next_lexeme().kind, TagEnd);
        let text = lexer.next_lexeme();
        assert_eq!((text.kind, text.text, text.offset), (Text, "héllo", 7));
    }
}
