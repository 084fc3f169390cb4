//! SIMD-accelerated byte cursor using memchr
//!
//! The scanner only moves forward. Every split point it reports sits on an
//! ASCII delimiter or on a run of name bytes, so slicing the original `&str`
//! at those offsets always lands on a char boundary.

use memchr::{memchr, memchr2, memmem};

/// Forward-only cursor over the raw input bytes
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Set the current position, clamped to the input length
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// Offset just past the last byte
    #[inline]
    pub fn end(&self) -> usize {
        self.input.len()
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at byte at offset from current position
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advance by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.set_position(self.pos + n);
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Position just past the next occurrence of `needle`, searching from the cursor
    #[inline]
    pub fn find_past(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|i| self.pos + i + needle.len())
    }

    /// Find next '<' (markup start) using SIMD
    #[inline]
    pub fn find_markup_start(&self) -> Option<usize> {
        memchr(b'<', &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find next '<' or ']' (markup start or end of a DTD internal subset)
    #[inline]
    pub fn find_markup_or_subset_end(&self) -> Option<usize> {
        memchr2(b'<', b']', &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// End of the run of bytes matching `pred`, starting at the cursor
    #[inline]
    pub fn run_end(&self, pred: impl Fn(u8) -> bool) -> usize {
        self.input[self.pos..]
            .iter()
            .position(|&b| !pred(b))
            .map_or(self.input.len(), |i| self.pos + i)
    }

    /// Advance over the run of bytes matching `pred`, returning the run's end
    #[inline]
    pub fn skip_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        self.pos = self.run_end(pred);
        self.pos
    }

    /// Byte at an absolute position
    #[inline]
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        self.input.get(pos).copied()
    }
}

/// Space or tab
#[inline]
pub fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t')
}

/// Space, tab, carriage return or line feed
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
/// Allows ASCII alphanumeric, punctuation, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}
