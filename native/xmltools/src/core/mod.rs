//! Core XML lexing and parsing primitives
//!
//! This module contains the building blocks the formatters sit on:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Lexer: atomic lexemes (delimiters, names, literals, text)
//! - Token: semantic token kinds as bit flags
//! - Parser: pull-parser grouping lexemes into tokens, with lookahead

pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod token;

pub use parser::{Diagnostic, Parser};
pub use token::{Token, TokenKind, TokenSet};
