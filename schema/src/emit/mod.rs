//! Renders [`GeneratedMembers`] and a [`RecordSchema`] into the items a derived record gains.

mod accessors;
mod record;
pub mod tokens;

use crate::generate::GeneratedMembers;
use crate::model::RecordSchema;
use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

pub struct Emitter {
    krate: TokenStream,
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter { krate: quote!(::sheetbake) }
    }
}

impl Emitter {
    /// Emits against a runtime crate reachable at `krate` instead of `::sheetbake`.
    pub fn with_crate(krate: TokenStream) -> Self {
        Emitter { krate }
    }

    pub fn emit(&self, record: &Ident, schema: &RecordSchema, members: &GeneratedMembers) -> syn::Result<TokenStream> {
        let k = &self.krate;
        let accessors = accessors::emit_accessors(record, &members.accessors)?;
        let record_impl = record::emit_record_impl(record, schema, k)?;
        let table_impl = match &members.id_extractor {
            Some(id) => record::emit_table_impl(record, id, k)?,
            None => quote!(),
        };
        let converter_checks = record::emit_converter_checks(schema, k)?;
        let registration = record::emit_registration(record, schema, k);
        Ok(quote! {
            #accessors
            #record_impl
            #table_impl
            #converter_checks
            #registration
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl;
    use crate::extract::extract;
    use crate::generate::generate;
    use syn::{parse_quote, DeriveInput};

    fn expand(input: DeriveInput) -> String {
        let decl = decl::parse(&input).unwrap();
        let schema = extract(&decl).unwrap();
        let members = generate(&schema).unwrap();
        let tokens = Emitter::default().emit(&input.ident, &schema, &members).unwrap();
        let file: syn::File = syn::parse2(tokens).unwrap();
        prettyplease::unparse(&file)
    }

    /// Substring check that ignores the formatter's spacing, line breaks and trailing commas.
    fn contains(out: &str, needle: &str) -> bool {
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>().replace(",>", ">").replace(",)", ")");
        strip(out).contains(&strip(needle))
    }

    #[test]
    fn expands_a_table_record() {
        let out = expand(parse_quote! {
            #[record(table)]
            struct Hero {
                #[data(id)]
                id: u32,
                #[data(mutable)]
                _name: String,
                #[data(vertical)]
                multipliers: Vec<Multiplier>,
                #[data]
                weapon: Option<SheetRef<Item>>,
                cache: Vec<u8>,
            }
        });
        assert!(contains(&out, "impl ::sheetbake::Record for Hero"));
        assert!(contains(&out, "impl ::sheetbake::Cell for Hero"));
        assert!(contains(&out, "impl ::sheetbake::TableRecord for Hero"));
        assert!(contains(&out, "type Id = u32;"));
        assert!(contains(&out, "pub fn set_name(&mut self, value: String)"));
        assert!(contains(&out, "vertical::<Multiplier>"));
        assert!(contains(&out, "cache: ::std::default::Default::default()"));
        assert!(contains(&out, "inventory::submit!"));
    }

    #[test]
    fn converters_are_checked_and_used() {
        let out = expand(parse_quote! {
            struct Item {
                #[data(convert(with = HexColor, input = String, output = Color))]
                color: Color,
            }
        });
        assert!(contains(&out, "assert_converter::<HexColor, String, Color>()"));
        assert!(contains(&out, "<HexColor as ::sheetbake::Converter>::convert"));
        assert!(!contains(&out, "TableRecord"));
    }

    #[test]
    fn a_custom_crate_path_is_honored() {
        let input: DeriveInput = parse_quote!(struct Stats { #[data] hp: f32 });
        let decl = decl::parse(&input).unwrap();
        let schema = extract(&decl).unwrap();
        let members = generate(&schema).unwrap();
        let tokens = Emitter::with_crate(quote!(crate)).emit(&input.ident, &schema, &members).unwrap();
        assert!(tokens.to_string().contains("impl crate :: Record for Stats"));
    }
}
