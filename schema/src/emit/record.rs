use super::tokens::{ident, parse_type, schema_expr};
use crate::generate::IdExtractorSpec;
use crate::model::{FieldDescriptor, RecordSchema};
use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

fn converter_types(field: &FieldDescriptor) -> syn::Result<Option<(syn::Type, syn::Type, syn::Type)>> {
    match &field.converter {
        Some(c) => Ok(Some((parse_type(&c.path)?, parse_type(&c.input)?, parse_type(&c.output)?))),
        None => Ok(None),
    }
}

fn property_node(index: usize, field: &FieldDescriptor, k: &TokenStream) -> syn::Result<TokenStream> {
    let member = ident(&field.declared_name);
    if field.is_vertical {
        let element = match &field.element {
            Some(element) => parse_type(&element.declared_type)?,
            None => return Err(syn::Error::new(member.span(), format!("vertical member `{}` has no element type", field.declared_name))),
        };
        return Ok(quote! {
            #k::PropertyNode::<Self>::vertical::<#element>(&schema.fields[#index], |row| &row.#member[..], |row| &mut row.#member[..])
        });
    }
    let ty = parse_type(&field.declared_type)?;
    Ok(match converter_types(field)? {
        Some((converter, input, _)) => quote! {
            #k::PropertyNode::<Self>::leaf(
                &schema.fields[#index],
                |row| #k::Cell::to_value(&<#converter as #k::Converter>::revert(&row.#member)),
                |row, value| {
                    row.#member = <#converter as #k::Converter>::convert(<#input as #k::Cell>::from_value(value)?)?;
                    ::std::result::Result::Ok(())
                },
            )
        },
        None => quote! {
            #k::PropertyNode::<Self>::leaf(
                &schema.fields[#index],
                |row| #k::Cell::to_value(&row.#member),
                |row, value| {
                    row.#member = <#ty as #k::Cell>::from_value(value)?;
                    ::std::result::Result::Ok(())
                },
            )
        },
    })
}

fn read_field(field: &FieldDescriptor, k: &TokenStream) -> syn::Result<TokenStream> {
    let member = ident(&field.declared_name);
    let name = &field.declared_name;
    let ty = parse_type(&field.declared_type)?;
    Ok(match converter_types(field)? {
        Some((converter, input, _)) => quote! {
            #member: <#converter as #k::Converter>::convert(
                raw.cell_named::<#input>(&naming.wire_name(#name), naming).map_err(|e| e.at(#name))?
            ).map_err(|e| e.at(#name))?
        },
        None => quote! {
            #member: raw.cell_named::<#ty>(&naming.wire_name(#name), naming).map_err(|e| e.at(#name))?
        },
    })
}

fn write_field(field: &FieldDescriptor, k: &TokenStream) -> syn::Result<TokenStream> {
    let member = ident(&field.declared_name);
    let name = &field.declared_name;
    Ok(match converter_types(field)? {
        Some((converter, _, _)) => quote! {
            raw.insert(naming.wire_name(#name), #k::Cell::to_value_named(&<#converter as #k::Converter>::revert(&self.#member), naming));
        },
        None => quote! {
            raw.insert(naming.wire_name(#name), #k::Cell::to_value_named(&self.#member, naming));
        },
    })
}

/// `impl Record` and `impl Cell` for the record type.
pub fn emit_record_impl(record: &Ident, schema: &RecordSchema, k: &TokenStream) -> syn::Result<TokenStream> {
    let schema_value = schema_expr(schema, k);
    let nodes = schema.fields.iter().enumerate().map(|(i, f)| property_node(i, f, k)).collect::<syn::Result<Vec<_>>>()?;
    let reads = schema.fields.iter().map(|f| read_field(f, k)).collect::<syn::Result<Vec<_>>>()?;
    let defaults = schema.ignored.iter().map(|name| {
        let member = ident(name);
        quote!(#member: ::std::default::Default::default())
    });
    let writes = schema.fields.iter().map(|f| write_field(f, k)).collect::<syn::Result<Vec<_>>>()?;
    let name = &schema.name;

    Ok(quote! {
        impl #k::Record for #record {
            fn schema() -> &'static #k::schema::RecordSchema {
                static SCHEMA: ::std::sync::OnceLock<#k::schema::RecordSchema> = ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| #schema_value)
            }

            fn property_nodes() -> ::std::vec::Vec<#k::PropertyNode<Self>> {
                let schema = <Self as #k::Record>::schema();
                ::std::vec![#(#nodes),*]
            }

            fn from_raw(raw: &#k::RawRow, naming: #k::schema::NamingStrategy) -> ::std::result::Result<Self, #k::CellError> {
                let naming = <Self as #k::Record>::schema().effective_naming(naming);
                ::std::result::Result::Ok(Self {
                    #(#reads,)*
                    #(#defaults,)*
                })
            }

            fn to_raw(&self, naming: #k::schema::NamingStrategy) -> #k::RawRow {
                let naming = <Self as #k::Record>::schema().effective_naming(naming);
                let mut raw = #k::RawRow::new();
                #(#writes)*
                raw
            }
        }

        impl #k::Cell for #record {
            fn to_value(&self) -> #k::Value {
                #k::Cell::to_value_named(self, ::std::default::Default::default())
            }

            fn from_value(value: #k::Value) -> ::std::result::Result<Self, #k::CellError> {
                <Self as #k::Cell>::from_value_named(value, ::std::default::Default::default())
            }

            fn to_value_named(&self, naming: #k::schema::NamingStrategy) -> #k::Value {
                #k::Value::Record(#k::Record::to_raw(self, naming))
            }

            fn from_value_named(value: #k::Value, naming: #k::schema::NamingStrategy) -> ::std::result::Result<Self, #k::CellError> {
                match value {
                    #k::Value::Record(raw) => <Self as #k::Record>::from_raw(&raw, naming),
                    #k::Value::Null => <Self as #k::Record>::from_raw(&#k::RawRow::new(), naming),
                    other => ::std::result::Result::Err(#k::CellError::mismatch(#name, &other)),
                }
            }
        }
    })
}

pub fn emit_table_impl(record: &Ident, id: &IdExtractorSpec, k: &TokenStream) -> syn::Result<TokenStream> {
    let member = ident(&id.field);
    let id_type = parse_type(&id.id_type)?;
    Ok(quote! {
        impl #k::TableRecord for #record {
            type Id = #id_type;

            fn get_id(&self) -> Self::Id {
                ::std::clone::Clone::clone(&self.#member)
            }
        }
    })
}

/// Compile-time check that each converter's associated types match the declaration.
pub fn emit_converter_checks(schema: &RecordSchema, k: &TokenStream) -> syn::Result<TokenStream> {
    let mut checks = Vec::new();
    for field in &schema.fields {
        if let Some((converter, input, output)) = converter_types(field)? {
            checks.push(quote!(assert_converter::<#converter, #input, #output>();));
        }
    }
    if checks.is_empty() {
        return Ok(quote!());
    }
    Ok(quote! {
        const _: fn() = || {
            fn assert_converter<C: #k::Converter<Input = I, Output = O>, I, O>() {}
            #(#checks)*
        };
    })
}

pub fn emit_registration(record: &Ident, schema: &RecordSchema, k: &TokenStream) -> TokenStream {
    let name = &schema.name;
    quote! {
        #k::inventory::submit! {
            #k::RecordInfo {
                name: #name,
                schema: <#record as #k::Record>::schema,
            }
        }
    }
}
