//! Elixir Term Conversion Utilities
//!
//! Decodes keyword-list options into formatter parameters and encodes
//! formatting results as `{:ok, output, warnings}` / `{:error, reason}`.

use rustler::types::atom::{error, ok};
use rustler::{Atom, Encoder, Env, NewBinary, Term};

use crate::error::{Error, Result};
use crate::format::FormatterParams;
use crate::parallel::{BatchAction, Formatted};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    linearize,
    pretty_print,
}

/// Build `FormatterParams` from an Elixir keyword list, starting from the defaults
pub fn decode_params(options: Vec<(Term<'_>, Term<'_>)>) -> Result<FormatterParams> {
    let mut params = FormatterParams::default();

    for (key, value) in options {
        let name = key
            .atom_to_string()
            .map_err(|_| Error::UnknownOption("(non-atom key)".to_string()))?;

        match name.as_str() {
            "indent" => params.indent = string(&name, value)?,
            "eol" => params.eol = string(&name, value)?,
            "max_indent_level" => {
                params.max_indent_level = value
                    .decode::<usize>()
                    .map_err(|_| invalid(&name, "a non-negative integer"))?
            }
            "ensure_conformity" => params.ensure_conformity = boolean(&name, value)?,
            "auto_close_tags" => params.auto_close_tags = boolean(&name, value)?,
            "indent_attributes" => params.indent_attributes = boolean(&name, value)?,
            "indent_only" => params.indent_only = boolean(&name, value)?,
            "apply_space_preserve" => params.apply_space_preserve = boolean(&name, value)?,
            "dump_id_attribute_values" => params.dump_id_attribute_values = boolean(&name, value)?,
            "identity_attributes" => {
                params.identity_attributes = value
                    .decode::<Vec<String>>()
                    .map_err(|_| invalid(&name, "a list of strings"))?
            }
            _ => return Err(Error::UnknownOption(name)),
        }
    }

    Ok(params)
}

/// Map the `action` atom of a batch call
pub fn decode_action(action: Atom) -> Result<BatchAction> {
    if action == linearize() {
        Ok(BatchAction::Linearize)
    } else if action == pretty_print() {
        Ok(BatchAction::PrettyPrint)
    } else {
        Err(invalid("action", ":linearize or :pretty_print"))
    }
}

fn string(option: &str, value: Term<'_>) -> Result<String> {
    value.decode::<String>().map_err(|_| invalid(option, "a string"))
}

fn boolean(option: &str, value: Term<'_>) -> Result<bool> {
    value.decode::<bool>().map_err(|_| invalid(option, "a boolean"))
}

fn invalid(option: &str, expected: &'static str) -> Error {
    Error::InvalidOption {
        option: option.to_string(),
        expected,
    }
}

/// `{:ok, output, warnings}` or `{:error, reason}`
pub fn result_to_term<'a>(env: Env<'a>, result: Result<Formatted>) -> Term<'a> {
    match result {
        Ok(formatted) => (ok(), str_to_binary(env, &formatted.output), formatted.warnings).encode(env),
        Err(err) => error_to_term(env, &err),
    }
}

/// `{:error, reason}`
pub fn error_to_term<'a>(env: Env<'a>, err: &Error) -> Term<'a> {
    (error(), err.to_string()).encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
