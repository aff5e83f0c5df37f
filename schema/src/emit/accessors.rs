use super::tokens::{ident, parse_type};
use crate::generate::{AccessorSpec, Marshaling};
use proc_macro2::TokenStream;
use quote::quote;

pub fn emit_accessor(spec: &AccessorSpec) -> syn::Result<TokenStream> {
    let field = ident(&spec.field);
    let getter = ident(&spec.getter);
    let ty = parse_type(&spec.ty)?;
    let get = match spec.marshaling {
        Marshaling::Copy => quote! {
            pub fn #getter(&self) -> #ty {
                self.#field
            }
        },
        Marshaling::Borrow | Marshaling::CopyIn => quote! {
            pub fn #getter(&self) -> &#ty {
                &self.#field
            }
        },
        Marshaling::Share => quote! {
            pub fn #getter(&self) -> #ty {
                ::std::clone::Clone::clone(&self.#field)
            }
        },
    };
    let set = match (&spec.setter, spec.marshaling, &spec.item) {
        (None, _, _) => quote!(),
        (Some(setter), Marshaling::CopyIn, Some(item)) => {
            let setter = ident(setter);
            let item = parse_type(item)?;
            quote! {
                pub fn #setter<I: ::std::iter::IntoIterator<Item = #item>>(&mut self, items: I) {
                    self.#field = ::std::iter::Iterator::collect(::std::iter::IntoIterator::into_iter(items));
                }
            }
        }
        (Some(setter), _, _) => {
            let setter = ident(setter);
            quote! {
                pub fn #setter(&mut self, value: #ty) {
                    self.#field = value;
                }
            }
        }
    };
    Ok(quote! {
        #get
        #set
    })
}

pub fn emit_accessors(record: &syn::Ident, accessors: &[AccessorSpec]) -> syn::Result<TokenStream> {
    if accessors.is_empty() {
        return Ok(quote!());
    }
    let methods = accessors.iter().map(emit_accessor).collect::<syn::Result<Vec<_>>>()?;
    Ok(quote! {
        #[allow(dead_code)]
        impl #record {
            #(#methods)*
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(marshaling: Marshaling, ty: &str, setter: Option<&str>, item: Option<&str>) -> AccessorSpec {
        AccessorSpec {
            field: "_stats".into(),
            property: "Stats".into(),
            getter: "stats".into(),
            setter: setter.map(str::to_string),
            marshaling,
            ty: ty.into(),
            item: item.map(str::to_string),
        }
    }

    fn render(spec: &AccessorSpec) -> String {
        let tokens = emit_accessor(spec).unwrap();
        let file: syn::File = syn::parse2(quote!(impl Row { #tokens })).unwrap();
        prettyplease::unparse(&file)
    }

    #[test]
    fn copy_getters_return_by_value() {
        let out = render(&spec(Marshaling::Copy, "u32", Some("set_stats"), None));
        assert!(out.contains("pub fn stats(&self) -> u32"));
        assert!(out.contains("pub fn set_stats(&mut self, value: u32)"));
    }

    #[test]
    fn copy_in_setters_collect_items() {
        let out = render(&spec(Marshaling::CopyIn, "HashMap<String, u8>", Some("set_stats"), Some("(String, u8)")));
        assert!(out.contains("pub fn stats(&self) -> &HashMap<String, u8>"));
        assert!(out.contains("I: ::std::iter::IntoIterator<Item = (String, u8)>"));
    }

    #[test]
    fn read_only_views_are_shared() {
        let out = render(&spec(Marshaling::Share, "Arc<[f32]>", None, None));
        assert!(out.contains("pub fn stats(&self) -> Arc<[f32]>"));
        assert!(!out.contains("set_stats"));
    }
}
