//! Errors raised at the NIF boundary
//!
//! Formatting itself never fails; these cover input and option decoding.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("input is not valid UTF-8 (first invalid byte at offset {offset})")]
    InvalidUtf8 { offset: usize },

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("invalid value for option {option}: expected {expected}")]
    InvalidOption { option: String, expected: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8 {
            offset: err.valid_up_to(),
        }
    }
}

/// Borrow `bytes` as text, rejecting invalid UTF-8
pub fn decode(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}
