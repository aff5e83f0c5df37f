use proc_macro2::{Span, TokenStream};
use sheetbake_schema::emit::Emitter;
use sheetbake_schema::{decl, extract, generate, SchemaError};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields};

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let record_decl = decl::parse(input)?;
    let schema = extract(&record_decl).map_err(|e| schema_error(input, e))?;
    let members = generate(&schema).map_err(|e| schema_error(input, e))?;
    Emitter::default().emit(&input.ident, &schema, &members)
}

fn schema_error(input: &DeriveInput, error: SchemaError) -> syn::Error {
    let span = error.member().and_then(|member| member_span(input, member)).unwrap_or_else(|| input.ident.span());
    syn::Error::new(span, error)
}

fn member_span(input: &DeriveInput, member: &str) -> Option<Span> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .find(|f| f.ident.as_ref().is_some_and(|i| syn::ext::IdentExt::unraw(i) == member))
                .map(|f| f.span()),
            _ => None,
        },
        _ => None,
    }
}
