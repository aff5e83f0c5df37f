use quote::ToTokens;
use std::fmt;
use syn::{GenericArgument, PathArguments, Type};

/// Declared type of a member, reduced to the parts classification cares about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// `a::b::Name<Args..>`, generic arguments of the last segment only.
    Path { segments: Vec<String>, args: Vec<TypeShape> },
    Array { elem: Box<TypeShape>, len: String },
    Slice { elem: Box<TypeShape> },
    Reference { mutable: bool, inner: Box<TypeShape> },
    Tuple(Vec<TypeShape>),
    Other(String),
}

impl TypeShape {
    pub fn named(path: &str) -> Self {
        Self::generic(path, Vec::new())
    }

    pub fn generic(path: &str, args: Vec<TypeShape>) -> Self {
        let segments = path.split("::").map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
        TypeShape::Path { segments, args }
    }

    pub fn array(elem: TypeShape, len: usize) -> Self {
        TypeShape::Array { elem: Box::new(elem), len: len.to_string() }
    }

    pub fn slice(elem: TypeShape) -> Self {
        TypeShape::Slice { elem: Box::new(elem) }
    }

    pub fn reference(inner: TypeShape, mutable: bool) -> Self {
        TypeShape::Reference { mutable, inner: Box::new(inner) }
    }

    pub fn parse(src: &str) -> syn::Result<Self> {
        syn::parse_str::<Type>(src).map(|ty| Self::from_syn(&ty))
    }

    pub fn from_syn(ty: &Type) -> Self {
        match ty {
            Type::Path(tp) if tp.qself.is_none() => {
                let segments = tp.path.segments.iter().map(|s| s.ident.to_string()).collect();
                let args = match tp.path.segments.last().map(|s| &s.arguments) {
                    Some(PathArguments::AngleBracketed(angle)) => angle
                        .args
                        .iter()
                        .filter_map(|arg| match arg {
                            GenericArgument::Type(inner) => Some(Self::from_syn(inner)),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                TypeShape::Path { segments, args }
            }
            Type::Array(arr) => TypeShape::Array { elem: Box::new(Self::from_syn(&arr.elem)), len: arr.len.to_token_stream().to_string() },
            Type::Slice(slice) => TypeShape::slice(Self::from_syn(&slice.elem)),
            Type::Reference(r) => TypeShape::reference(Self::from_syn(&r.elem), r.mutability.is_some()),
            Type::Tuple(t) => TypeShape::Tuple(t.elems.iter().map(Self::from_syn).collect()),
            Type::Paren(p) => Self::from_syn(&p.elem),
            Type::Group(g) => Self::from_syn(&g.elem),
            other => TypeShape::Other(other.to_token_stream().to_string()),
        }
    }

    /// Last path segment, e.g. `HashMap` for `std::collections::HashMap<K, V>`.
    pub fn ident(&self) -> Option<&str> {
        match self {
            TypeShape::Path { segments, .. } => segments.last().map(String::as_str),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeShape] {
        match self {
            TypeShape::Path { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, TypeShape::Slice { .. })
    }

    /// `Option<T>` unwraps to `T`, anything else is returned as is.
    pub fn unwrap_option(&self) -> &TypeShape {
        match (self.ident(), self.args()) {
            (Some("Option"), [inner]) => inner.unwrap_option(),
            _ => self,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Path { segments, args } => {
                write!(f, "{}", segments.join("::"))?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            TypeShape::Array { elem, len } => write!(f, "[{elem}; {len}]"),
            TypeShape::Slice { elem } => write!(f, "[{elem}]"),
            TypeShape::Reference { mutable: true, inner } => write!(f, "&mut {inner}"),
            TypeShape::Reference { mutable: false, inner } => write!(f, "&{inner}"),
            TypeShape::Tuple(elems) => {
                let elems: Vec<String> = elems.iter().map(ToString::to_string).collect();
                write!(f, "({})", elems.join(", "))
            }
            TypeShape::Other(raw) => f.write_str(raw),
        }
    }
}
