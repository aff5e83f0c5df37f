use crate::model::{CollectionKind, ConverterSpec, FieldDescriptor, MemberKind, RecordSchema, SemanticType, VerticalRelation};
use crate::naming::NamingStrategy;
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::Type;

/// Identifier for a member name, raw when the name is a keyword.
pub fn ident(name: &str) -> Ident {
    if syn::parse_str::<Ident>(name).is_ok() {
        Ident::new(name, Span::call_site())
    } else {
        Ident::new_raw(name, Span::call_site())
    }
}

pub fn parse_type(src: &str) -> syn::Result<Type> {
    syn::parse_str::<Type>(src)
}

fn string(value: &str) -> TokenStream {
    quote!(::std::string::String::from(#value))
}

fn strings(values: &[String]) -> TokenStream {
    let values = values.iter().map(|v| string(v));
    quote!(::std::vec![#(#values),*])
}

fn option(value: Option<TokenStream>) -> TokenStream {
    match value {
        Some(value) => quote!(::std::option::Option::Some(#value)),
        None => quote!(::std::option::Option::None),
    }
}

fn boxed(value: Option<&FieldDescriptor>, krate: &TokenStream) -> TokenStream {
    option(value.map(|d| {
        let inner = field_expr(d, krate);
        quote!(::std::boxed::Box::new(#inner))
    }))
}

fn semantic_expr(semantic: &SemanticType, s: &TokenStream) -> TokenStream {
    match semantic {
        SemanticType::Bool => quote!(#s::SemanticType::Bool),
        SemanticType::Int => quote!(#s::SemanticType::Int),
        SemanticType::Float => quote!(#s::SemanticType::Float),
        SemanticType::Str => quote!(#s::SemanticType::Str),
        SemanticType::AssetRef => quote!(#s::SemanticType::AssetRef),
        SemanticType::SheetRef { target } => {
            let target = string(target);
            quote!(#s::SemanticType::SheetRef { target: #target })
        }
        SemanticType::Record { name } => {
            let name = string(name);
            quote!(#s::SemanticType::Record { name: #name })
        }
        SemanticType::Other { name } => {
            let name = string(name);
            quote!(#s::SemanticType::Other { name: #name })
        }
    }
}

fn collection_kind_expr(kind: CollectionKind, s: &TokenStream) -> TokenStream {
    let variant = match kind {
        CollectionKind::Scalar => quote!(Scalar),
        CollectionKind::Array => quote!(Array),
        CollectionKind::List => quote!(List),
        CollectionKind::Dictionary => quote!(Dictionary),
        CollectionKind::Set => quote!(Set),
        CollectionKind::Queue => quote!(Queue),
        CollectionKind::Stack => quote!(Stack),
        CollectionKind::ReadOnlyMemoryView => quote!(ReadOnlyMemoryView),
        CollectionKind::MemoryView => quote!(MemoryView),
        CollectionKind::ReadOnlySpanView => quote!(ReadOnlySpanView),
        CollectionKind::SpanView => quote!(SpanView),
        CollectionKind::ReadOnlyList => quote!(ReadOnlyList),
        CollectionKind::ReadOnlyDictionary => quote!(ReadOnlyDictionary),
    };
    quote!(#s::CollectionKind::#variant)
}

fn member_kind_expr(kind: MemberKind, s: &TokenStream) -> TokenStream {
    match kind {
        MemberKind::Field => quote!(#s::MemberKind::Field),
        MemberKind::Property => quote!(#s::MemberKind::Property),
    }
}

fn naming_expr(naming: NamingStrategy, s: &TokenStream) -> TokenStream {
    match naming {
        NamingStrategy::PascalCase => quote!(#s::NamingStrategy::PascalCase),
        NamingStrategy::CamelCase => quote!(#s::NamingStrategy::CamelCase),
        NamingStrategy::SnakeCase => quote!(#s::NamingStrategy::SnakeCase),
        NamingStrategy::KebabCase => quote!(#s::NamingStrategy::KebabCase),
    }
}

fn converter_expr(converter: &ConverterSpec, s: &TokenStream) -> TokenStream {
    let (path, input, output) = (string(&converter.path), string(&converter.input), string(&converter.output));
    quote!(#s::ConverterSpec { path: #path, input: #input, output: #output })
}

pub fn field_expr(field: &FieldDescriptor, krate: &TokenStream) -> TokenStream {
    let s = quote!(#krate::schema);
    let declared_name = string(&field.declared_name);
    let property_name = string(&field.property_name);
    let declared_type = string(&field.declared_type);
    let semantic_type = semantic_expr(&field.semantic_type, &s);
    let collection_kind = collection_kind_expr(field.collection_kind, &s);
    let wire_name = string(&field.wire_name);
    let (is_mutable, is_id, is_vertical) = (field.is_mutable, field.is_id, field.is_vertical);
    let member_kind = member_kind_expr(field.member_kind, &s);
    let converter = option(field.converter.as_ref().map(|c| converter_expr(c, &s)));
    let key = boxed(field.key.as_deref(), krate);
    let element = boxed(field.element.as_deref(), krate);
    quote! {
        #s::FieldDescriptor {
            declared_name: #declared_name,
            property_name: #property_name,
            declared_type: #declared_type,
            semantic_type: #semantic_type,
            collection_kind: #collection_kind,
            wire_name: #wire_name,
            is_mutable: #is_mutable,
            is_id: #is_id,
            is_vertical: #is_vertical,
            member_kind: #member_kind,
            converter: #converter,
            key: #key,
            element: #element,
        }
    }
}

fn vertical_expr(relation: &VerticalRelation, s: &TokenStream) -> TokenStream {
    let (target_type, property) = (string(&relation.target_type), string(&relation.property));
    quote!(#s::VerticalRelation { target_type: #target_type, property: #property })
}

/// Expression rebuilding `schema` at runtime.
pub fn schema_expr(schema: &RecordSchema, krate: &TokenStream) -> TokenStream {
    let s = quote!(#krate::schema);
    let name = string(&schema.name);
    let fields = schema.fields.iter().map(|f| field_expr(f, krate));
    let naming = option(schema.naming.map(|n| naming_expr(n, &s)));
    let (is_mutable, is_table) = (schema.is_mutable, schema.is_table);
    let id_field = option(schema.id_field.as_deref().map(string));
    let vertical = schema.vertical.iter().map(|v| vertical_expr(v, &s));
    let closed_reason = option(schema.closed_reason.as_deref().map(string));
    let user_impls = strings(&schema.user_impls);
    let ignored = strings(&schema.ignored);
    quote! {
        #s::RecordSchema {
            name: #name,
            fields: ::std::vec![#(#fields),*],
            naming: #naming,
            is_mutable: #is_mutable,
            is_table: #is_table,
            id_field: #id_field,
            vertical: ::std::vec![#(#vertical),*],
            closed_reason: #closed_reason,
            user_impls: #user_impls,
            ignored: #ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::model::{MemberDecl, RecordDecl};
    use crate::shape::TypeShape;

    #[test]
    fn keywords_become_raw_identifiers() {
        assert_eq!(ident("name").to_string(), "name");
        assert_eq!(ident("type").to_string(), "r#type");
    }

    fn last_segment(expr: TokenStream) -> String {
        let path: syn::ExprPath = syn::parse2(expr).unwrap();
        path.path.segments.last().unwrap().ident.to_string()
    }

    #[test]
    fn every_enum_variant_renders_as_a_path() {
        let s = quote!(::sheetbake::schema);
        for kind in CollectionKind::ALL {
            assert_eq!(last_segment(collection_kind_expr(kind, &s)), format!("{kind:?}"));
        }
        for naming in NamingStrategy::ALL {
            assert_eq!(last_segment(naming_expr(naming, &s)), format!("{naming:?}"));
        }
        assert_eq!(last_segment(member_kind_expr(MemberKind::Field, &s)), "Field");
        assert_eq!(last_segment(member_kind_expr(MemberKind::Property, &s)), "Property");
    }

    #[test]
    fn schema_expression_is_a_valid_struct_literal() {
        let decl = RecordDecl::new("Shop")
            .table()
            .member(MemberDecl::data("id", TypeShape::named("u32")).id())
            .member(MemberDecl::data("prices", TypeShape::parse("HashMap<String, SheetRef<Item>>").unwrap()));
        let schema = extract(&decl).unwrap();
        let expr = schema_expr(&schema, &quote!(::sheetbake));
        let parsed: syn::ExprStruct = syn::parse2(expr).unwrap();
        assert_eq!(parsed.fields.len(), 10);
        assert!(parsed.path.segments.last().is_some_and(|s| s.ident == "RecordSchema"));
    }
}
