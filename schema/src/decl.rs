use crate::model::{ConverterDecl, MemberDecl, RecordDecl};
use crate::naming::NamingStrategy;
use crate::shape::TypeShape;
use quote::ToTokens;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Path, Type};

pub const RECORD_ATTR: &str = "record";
pub const DATA_ATTR: &str = "data";

/// Reads `#[record(..)]` and `#[data(..)]` attributes of a derive input.
/// Inputs the generated members cannot attach to come back closed rather than failing.
pub fn parse(input: &DeriveInput) -> syn::Result<RecordDecl> {
    let mut decl = RecordDecl::new(&input.ident.unraw().to_string());
    for attr in input.attrs.iter().filter(|a| a.path().is_ident(RECORD_ATTR)) {
        parse_record_attr(attr, &mut decl)?;
    }
    if !input.generics.params.is_empty() {
        return Ok(decl.closed("records cannot have generic parameters"));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            Fields::Unnamed(_) => return Ok(decl.closed("tuple structs have no named members")),
            Fields::Unit => return Ok(decl.closed("unit structs have no members")),
        },
        Data::Enum(_) => return Ok(decl.closed("only structs can be records, found an enum")),
        Data::Union(_) => return Ok(decl.closed("only structs can be records, found a union")),
    };
    for field in fields {
        let name = match &field.ident {
            Some(ident) => ident.unraw().to_string(),
            None => return Err(syn::Error::new(field.span(), "unnamed fields are not supported")),
        };
        let ty = TypeShape::from_syn(&field.ty);
        let member = match field.attrs.iter().find(|a| a.path().is_ident(DATA_ATTR)) {
            Some(attr) => parse_data_attr(attr, MemberDecl::data(&name, ty))?,
            None => MemberDecl::ignored(&name, ty),
        };
        decl.members.push(member);
    }
    Ok(decl)
}

fn parse_record_attr(attr: &Attribute, decl: &mut RecordDecl) -> syn::Result<()> {
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("table") {
            decl.is_table = true;
        } else if meta.path.is_ident("mutable") {
            decl.is_mutable = true;
        } else if meta.path.is_ident("naming") {
            let lit: LitStr = meta.value()?.parse()?;
            let naming = lit.value().parse::<NamingStrategy>().map_err(|e| syn::Error::new(lit.span(), e))?;
            decl.naming = Some(naming);
        } else if meta.path.is_ident("user_impl") {
            meta.parse_nested_meta(|member| {
                match member.path.get_ident() {
                    Some(ident) => decl.user_impls.push(ident.unraw().to_string()),
                    None => return Err(member.error("expected a member name")),
                }
                Ok(())
            })?;
        } else {
            return Err(meta.error("expected `table`, `mutable`, `naming = \"..\"` or `user_impl(..)`"));
        }
        Ok(())
    })
}

fn parse_data_attr(attr: &Attribute, mut member: MemberDecl) -> syn::Result<MemberDecl> {
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(member);
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("id") {
            member.is_id = true;
        } else if meta.path.is_ident("mutable") {
            member.is_mutable = true;
        } else if meta.path.is_ident("vertical") {
            member.is_vertical = true;
        } else if meta.path.is_ident("convert") {
            let mut with: Option<Path> = None;
            let mut input: Option<Type> = None;
            let mut output: Option<Type> = None;
            meta.parse_nested_meta(|nested| {
                if nested.path.is_ident("with") {
                    with = Some(nested.value()?.parse()?);
                } else if nested.path.is_ident("input") {
                    input = Some(nested.value()?.parse()?);
                } else if nested.path.is_ident("output") {
                    output = Some(nested.value()?.parse()?);
                } else {
                    return Err(nested.error("expected `with`, `input` or `output`"));
                }
                Ok(())
            })?;
            match (with, input, output) {
                (Some(with), Some(input), Some(output)) => {
                    let path = with.to_token_stream().to_string().replace(' ', "");
                    member.converter = Some(ConverterDecl::new(&path, TypeShape::from_syn(&input), TypeShape::from_syn(&output)));
                }
                _ => return Err(meta.error("converter needs `with = Path, input = Type, output = Type`")),
            }
        } else {
            return Err(meta.error("expected `id`, `mutable`, `vertical` or `convert(..)`"));
        }
        Ok(())
    })?;
    Ok(member)
}
