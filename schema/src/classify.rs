use crate::model::{CollectionKind, SemanticType};
use crate::shape::TypeShape;

/// Total over every type shape, anything unknown is `Scalar`.
pub fn classify(shape: &TypeShape) -> CollectionKind {
    exact(shape).or_else(|| structural(shape)).unwrap_or(CollectionKind::Scalar)
}

fn exact(shape: &TypeShape) -> Option<CollectionKind> {
    match shape {
        TypeShape::Array { .. } => Some(CollectionKind::Array),
        TypeShape::Reference { mutable: false, inner } if inner.is_slice() => Some(CollectionKind::ReadOnlySpanView),
        TypeShape::Reference { mutable: true, inner } if inner.is_slice() => Some(CollectionKind::SpanView),
        TypeShape::Path { .. } => match (shape.ident()?, shape.args()) {
            ("Vec", [_]) => Some(CollectionKind::List),
            ("HashMap" | "BTreeMap", [_, _, ..]) => Some(CollectionKind::Dictionary),
            ("HashSet" | "BTreeSet", [_, ..]) => Some(CollectionKind::Set),
            ("VecDeque", [_]) => Some(CollectionKind::Queue),
            ("Stack", [_]) => Some(CollectionKind::Stack),
            ("Box", [inner]) if inner.is_slice() => Some(CollectionKind::MemoryView),
            ("Arc" | "Rc", [inner]) if inner.is_slice() => Some(CollectionKind::ReadOnlyMemoryView),
            ("Arc" | "Rc", [inner]) => match exact(inner) {
                Some(CollectionKind::List) => Some(CollectionKind::ReadOnlyList),
                Some(CollectionKind::Dictionary) => Some(CollectionKind::ReadOnlyDictionary),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

fn structural(shape: &TypeShape) -> Option<CollectionKind> {
    let ident = shape.ident()?;
    match shape.args().len() {
        2 if ident.ends_with("Map") => Some(CollectionKind::Dictionary),
        1 if ident.ends_with("Set") => Some(CollectionKind::Set),
        1 if ident.ends_with("List") || ident.ends_with("Vec") => Some(CollectionKind::List),
        1 if ident.ends_with("Queue") || ident.ends_with("Deque") => Some(CollectionKind::Queue),
        1 if ident.ends_with("Stack") => Some(CollectionKind::Stack),
        _ => None,
    }
}

/// `(key, element)` shapes of a collection; maps yield both, sequences only the element.
pub fn element_shapes(shape: &TypeShape, kind: CollectionKind) -> (Option<&TypeShape>, Option<&TypeShape>) {
    fn slice_elem(shape: &TypeShape) -> Option<&TypeShape> {
        match shape {
            TypeShape::Slice { elem } => Some(elem.as_ref()),
            _ => None,
        }
    }
    match (kind, shape) {
        (CollectionKind::Scalar, _) => (None, None),
        (CollectionKind::Array, TypeShape::Array { elem, .. }) => (None, Some(elem.as_ref())),
        (CollectionKind::ReadOnlySpanView | CollectionKind::SpanView, TypeShape::Reference { inner, .. }) => (None, slice_elem(inner)),
        (CollectionKind::MemoryView | CollectionKind::ReadOnlyMemoryView, _) => (None, shape.args().first().and_then(slice_elem)),
        (CollectionKind::ReadOnlyList | CollectionKind::ReadOnlyDictionary, _) => match shape.args().first() {
            Some(inner) => element_shapes(inner, if kind.is_keyed() { CollectionKind::Dictionary } else { CollectionKind::List }),
            None => (None, None),
        },
        (CollectionKind::Dictionary, _) => match shape.args() {
            [key, value, ..] => (Some(key), Some(value)),
            _ => (None, None),
        },
        (_, _) => (None, shape.args().first()),
    }
}

pub fn semantic_type(shape: &TypeShape) -> SemanticType {
    let shape = shape.unwrap_option();
    match shape {
        TypeShape::Path { .. } => match (shape.ident().unwrap_or_default(), shape.args()) {
            ("bool", []) => SemanticType::Bool,
            ("i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize", []) => SemanticType::Int,
            ("f32" | "f64", []) => SemanticType::Float,
            ("String" | "str", []) => SemanticType::Str,
            ("SheetRef", [target]) => SemanticType::SheetRef { target: target.ident().map(str::to_string).unwrap_or_else(|| target.to_string()) },
            ("AssetRef", []) => SemanticType::AssetRef,
            _ => SemanticType::Other { name: shape.to_string() },
        },
        TypeShape::Reference { inner, .. } if inner.ident() == Some("str") => SemanticType::Str,
        other => SemanticType::Other { name: other.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(src: &str) -> CollectionKind {
        classify(&TypeShape::parse(src).unwrap())
    }

    #[test]
    fn exact_shapes() {
        assert_eq!(kind("[u8; 16]"), CollectionKind::Array);
        assert_eq!(kind("Vec<i32>"), CollectionKind::List);
        assert_eq!(kind("std::collections::HashMap<String, f32>"), CollectionKind::Dictionary);
        assert_eq!(kind("BTreeSet<u32>"), CollectionKind::Set);
        assert_eq!(kind("VecDeque<String>"), CollectionKind::Queue);
        assert_eq!(kind("Stack<u8>"), CollectionKind::Stack);
        assert_eq!(kind("Box<[f32]>"), CollectionKind::MemoryView);
        assert_eq!(kind("Arc<[f32]>"), CollectionKind::ReadOnlyMemoryView);
        assert_eq!(kind("&[u8]"), CollectionKind::ReadOnlySpanView);
        assert_eq!(kind("&mut [u8]"), CollectionKind::SpanView);
        assert_eq!(kind("Arc<Vec<u8>>"), CollectionKind::ReadOnlyList);
        assert_eq!(kind("Rc<BTreeMap<u8, u8>>"), CollectionKind::ReadOnlyDictionary);
    }

    #[test]
    fn structural_fallback_and_scalars() {
        assert_eq!(kind("IndexMap<String, u32>"), CollectionKind::Dictionary);
        assert_eq!(kind("SmallVec<u32>"), CollectionKind::List);
        assert_eq!(kind("LinkedList<u32>"), CollectionKind::List);
        assert_eq!(kind("ArrayDeque<u32>"), CollectionKind::Queue);
        assert_eq!(kind("Map"), CollectionKind::Scalar);
        assert_eq!(kind("Option<Vec<u32>>"), CollectionKind::Scalar);
        assert_eq!(kind("Multiplier"), CollectionKind::Scalar);
        assert_eq!(kind("Box<Stats>"), CollectionKind::Scalar);
        assert_eq!(kind("(u8, u8)"), CollectionKind::Scalar);
    }

    #[test]
    fn read_only_views_differ_from_their_mutable_counterparts() {
        assert_ne!(kind("Arc<Vec<u8>>"), kind("Vec<u8>"));
        assert_ne!(kind("Arc<[u8]>"), kind("Box<[u8]>"));
        assert!(kind("&[u8]").is_read_only());
        assert!(!kind("&mut [u8]").is_read_only());
    }

    #[test]
    fn classification_is_stable() {
        for src in ["Vec<u8>", "HashMap<u8, u8>", "[u8; 2]", "Hero", "Arc<[u8]>"] {
            assert_eq!(kind(src), kind(src));
        }
    }

    #[test]
    fn element_shapes_of_collections() {
        let map = TypeShape::parse("Arc<HashMap<String, SheetRef<Item>>>").unwrap();
        let (key, value) = element_shapes(&map, classify(&map));
        assert_eq!(key.map(ToString::to_string).as_deref(), Some("String"));
        assert_eq!(value.map(ToString::to_string).as_deref(), Some("SheetRef<Item>"));
        let boxed = TypeShape::parse("Box<[u8]>").unwrap();
        assert_eq!(element_shapes(&boxed, classify(&boxed)).1.map(ToString::to_string).as_deref(), Some("u8"));
    }

    #[test]
    fn semantic_types() {
        let sem = |src: &str| semantic_type(&TypeShape::parse(src).unwrap());
        assert_eq!(sem("Option<u32>"), SemanticType::Int);
        assert_eq!(sem("f64"), SemanticType::Float);
        assert_eq!(sem("&str"), SemanticType::Str);
        assert_eq!(sem("SheetRef<crate::Item>"), SemanticType::SheetRef { target: "Item".into() });
        assert_eq!(sem("sheetbake::AssetRef"), SemanticType::AssetRef);
        assert_eq!(sem("Stats"), SemanticType::Other { name: "Stats".into() });
    }
}
