//! XmlTools - streaming XML formatting
//!
//! Operations:
//! - linearize: collapse a document onto one line
//! - pretty_print: indent a document (or only re-align its existing lines)
//! - current_path: element/attribute path at a byte offset
//! - debug_tokens: token dump for diagnostics
//! - format_many: batch linearize / pretty_print across cores

use rustler::{Atom, Binary, Env, NifResult, Term};

pub mod core;
pub mod error;
pub mod format;
pub mod parallel;
mod term;

pub use error::Error;
pub use format::{FormatterParams, PathMode, XmlFormatter};
use parallel::Formatted;

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Decode input and options, run one pass, collect its warnings
fn run_pass<'a>(
    env: Env<'a>,
    input: Binary<'a>,
    options: Vec<(Term<'a>, Term<'a>)>,
    pass: impl FnOnce(&mut XmlFormatter<'_>) -> String,
) -> Term<'a> {
    let result = error::decode(input.as_slice()).and_then(|text| {
        let params = term::decode_params(options)?;
        let mut formatter = XmlFormatter::with_params(text, params);
        let output = pass(&mut formatter);
        Ok(Formatted {
            output,
            warnings: formatter.warnings().iter().map(ToString::to_string).collect(),
        })
    });
    term::result_to_term(env, result)
}

// ============================================================================
// Formatting
// ============================================================================

/// Collapse inter-tag whitespace: {:ok, output, warnings} | {:error, reason}
#[rustler::nif]
fn linearize<'a>(env: Env<'a>, input: Binary<'a>, options: Vec<(Term<'a>, Term<'a>)>) -> NifResult<Term<'a>> {
    Ok(run_pass(env, input, options, |formatter| formatter.linearize()))
}

/// Indent the document: {:ok, output, warnings} | {:error, reason}
#[rustler::nif]
fn pretty_print<'a>(env: Env<'a>, input: Binary<'a>, options: Vec<(Term<'a>, Term<'a>)>) -> NifResult<Term<'a>> {
    Ok(run_pass(env, input, options, |formatter| formatter.pretty_print()))
}

/// Path of the element enclosing byte `offset`; `mode` is a PathMode bit set
#[rustler::nif]
fn current_path<'a>(
    env: Env<'a>,
    input: Binary<'a>,
    offset: usize,
    mode: u32,
    options: Vec<(Term<'a>, Term<'a>)>,
) -> NifResult<Term<'a>> {
    let mode = PathMode::from_bits(mode);
    Ok(run_pass(env, input, options, |formatter| formatter.current_path(offset, mode)))
}

/// Token kind dump, e.g. "TagOpening/TagSelfClosingEnd"
#[rustler::nif]
fn debug_tokens<'a>(env: Env<'a>, input: Binary<'a>, separator: String, detailed: bool) -> NifResult<Term<'a>> {
    Ok(run_pass(env, input, Vec::new(), |formatter| {
        formatter.debug_tokens(&separator, detailed)
    }))
}

// ============================================================================
// Batch Formatting
// ============================================================================

/// Format many documents in parallel; returns one result tuple per input, in order
#[rustler::nif(schedule = "DirtyCpu")]
fn format_many<'a>(
    env: Env<'a>,
    inputs: Vec<Binary<'a>>,
    action: Atom,
    options: Vec<(Term<'a>, Term<'a>)>,
) -> NifResult<Term<'a>> {
    let setup = term::decode_action(action).and_then(|action| Ok((action, term::decode_params(options)?)));
    let (action, params) = match setup {
        Ok(setup) => setup,
        Err(err) => return Ok(term::error_to_term(env, &err)),
    };

    let buffers: Vec<&[u8]> = inputs.iter().map(|input| input.as_slice()).collect();
    let results = parallel::format_parallel_bytes(&buffers, action, &params);

    let mut list = Term::list_new_empty(env);
    for result in results.into_iter().rev() {
        list = list.list_prepend(term::result_to_term(env, result));
    }
    Ok(list)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.XmlTools.Native");
