//! Parallel batch formatting
//!
//! Uses Rayon to format many independent documents at once. Every document
//! gets its own parser and output buffer.

use rayon::prelude::*;

use crate::error::{decode, Result};
use crate::format::{FormatterParams, XmlFormatter};

/// Formatting pass applied to every document of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Linearize,
    PrettyPrint,
}

/// Output of one document plus its warnings, rendered as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub output: String,
    pub warnings: Vec<String>,
}

/// Format `inputs` in parallel; results are in input order
pub fn format_parallel(inputs: &[&str], action: BatchAction, params: &FormatterParams) -> Vec<Formatted> {
    inputs
        .par_iter()
        .map(|input| format_one(input, action, params))
        .collect()
}

/// Same as [`format_parallel`] over raw buffers; invalid UTF-8 fails only its own document
pub fn format_parallel_bytes(
    inputs: &[&[u8]],
    action: BatchAction,
    params: &FormatterParams,
) -> Vec<Result<Formatted>> {
    inputs
        .par_iter()
        .map(|bytes| decode(bytes).map(|input| format_one(input, action, params)))
        .collect()
}

fn format_one(input: &str, action: BatchAction, params: &FormatterParams) -> Formatted {
    let mut formatter = XmlFormatter::with_params(input, params.clone());
    let output = match action {
        BatchAction::Linearize => formatter.linearize(),
        BatchAction::PrettyPrint => formatter.pretty_print(),
    };
    Formatted {
        output,
        warnings: formatter.warnings().iter().map(ToString::to_string).collect(),
    }
}
