extern crate proc_macro;
mod macro_utils;
mod record;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;
use syn::{parse_macro_input, DeriveInput};

/// Derives `Record` (and `TableRecord` for `#[record(table)]`) plus accessors for every `#[data]` member.
#[proc_macro_derive(Record, attributes(record, data))]
#[proc_macro_error]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let stream = match record::expand(&input) {
        Ok(stream) => stream,
        Err(e) => return e.to_compile_error().into(),
    };
    macro_utils::submit_record_stream(stream, "record", &input.ident, "_derive.rs")
}
