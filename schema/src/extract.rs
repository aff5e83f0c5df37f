use crate::classify::{classify, element_shapes, semantic_type};
use crate::error::SchemaError;
use crate::model::*;
use crate::naming::{self, NamingStrategy};
use crate::shape::TypeShape;
use std::collections::HashMap;

/// Builds the canonical field model of a record. Only explicit data members are considered.
pub fn extract(decl: &RecordDecl) -> Result<RecordSchema, SchemaError> {
    let naming = decl.naming.unwrap_or_default();
    let mut claimed: HashMap<String, &str> = HashMap::new();
    let mut fields = Vec::new();
    let mut vertical = Vec::new();
    let mut id_field: Option<String> = None;

    for member in decl.members.iter().filter(|m| m.is_data_member) {
        let property = naming::property_name(&member.name);
        if let Some(first) = claimed.insert(property.clone(), &member.name) {
            return Err(SchemaError::AmbiguousAccessor {
                record: decl.name.clone(),
                property,
                first: first.to_string(),
                second: member.name.clone(),
            });
        }
        if member.is_id {
            if let Some(first) = &id_field {
                return Err(SchemaError::MultipleIdMembers { record: decl.name.clone(), first: first.clone(), second: member.name.clone() });
            }
            id_field = Some(member.name.clone());
        }
        if let Some(converter) = &member.converter {
            check_converter(decl, member, converter)?;
        }

        let mut field = describe(&member.name, &member.ty, naming);
        field.is_mutable = member.is_mutable || decl.is_mutable;
        field.is_id = member.is_id;
        field.converter = member.converter.as_ref().map(|c| ConverterSpec { path: c.path.clone(), input: c.input.to_string(), output: c.output.to_string() });

        if member.is_vertical {
            let target = vertical_target(decl, member, field.collection_kind)?;
            field.is_vertical = true;
            field.semantic_type = SemanticType::Record { name: target.clone() };
            if let Some(element) = field.element.as_mut() {
                element.semantic_type = SemanticType::Record { name: target.clone() };
            }
            vertical.push(VerticalRelation { target_type: target, property: field.property_name.clone() });
        }
        fields.push(field);
    }

    Ok(RecordSchema {
        name: decl.name.clone(),
        fields,
        naming: decl.naming,
        is_mutable: decl.is_mutable,
        is_table: decl.is_table,
        id_field,
        vertical,
        closed_reason: decl.closed_reason.clone(),
        user_impls: decl.user_impls.clone(),
        ignored: decl.members.iter().filter(|m| !m.is_data_member).map(|m| m.name.clone()).collect(),
    })
}

fn describe(declared_name: &str, ty: &TypeShape, naming: NamingStrategy) -> FieldDescriptor {
    let kind = classify(ty);
    let (key, element) = element_shapes(ty, kind);
    let key = key.map(|k| Box::new(describe(declared_name, k, naming)));
    let element = element.map(|e| Box::new(describe(declared_name, e, naming)));
    let semantic_type = match &element {
        Some(e) => e.semantic_type.clone(),
        None => semantic_type(ty),
    };
    FieldDescriptor {
        declared_name: declared_name.to_string(),
        property_name: naming::property_name(declared_name),
        declared_type: ty.to_string(),
        semantic_type,
        collection_kind: kind,
        wire_name: naming.wire_name(declared_name),
        is_mutable: false,
        is_id: false,
        is_vertical: false,
        member_kind: MemberKind::of(declared_name),
        converter: None,
        key,
        element,
    }
}

fn check_converter(decl: &RecordDecl, member: &MemberDecl, converter: &ConverterDecl) -> Result<(), SchemaError> {
    let invalid = |expected: String, found: String| SchemaError::InvalidConverter {
        record: decl.name.clone(),
        member: member.name.clone(),
        converter: converter.path.clone(),
        expected,
        found,
    };
    if normalized(&converter.output) != normalized(&member.ty) {
        return Err(invalid(format!("output `{}`", member.ty), format!("`{}`", converter.output)));
    }
    let input_semantic = semantic_type(&converter.input);
    if classify(&converter.input) != CollectionKind::Scalar || !input_semantic.is_primitive() {
        return Err(invalid("a primitive input (bool, integer, float or string)".to_string(), format!("`{}`", converter.input)));
    }
    Ok(())
}

/// Same shape with every path reduced to its last segment, so `std::vec::Vec<T>` equals `Vec<T>`.
fn normalized(shape: &TypeShape) -> TypeShape {
    match shape {
        TypeShape::Path { segments, args } => TypeShape::Path {
            segments: segments.last().cloned().into_iter().collect(),
            args: args.iter().map(normalized).collect(),
        },
        TypeShape::Array { elem, len } => TypeShape::Array { elem: Box::new(normalized(elem)), len: len.clone() },
        TypeShape::Slice { elem } => TypeShape::slice(normalized(elem)),
        TypeShape::Reference { mutable, inner } => TypeShape::reference(normalized(inner), *mutable),
        TypeShape::Tuple(elems) => TypeShape::Tuple(elems.iter().map(normalized).collect()),
        TypeShape::Other(raw) => TypeShape::Other(raw.clone()),
    }
}

fn vertical_target(decl: &RecordDecl, member: &MemberDecl, kind: CollectionKind) -> Result<String, SchemaError> {
    let invalid = || SchemaError::InvalidVerticalList { record: decl.name.clone(), member: member.name.clone(), found: format!("{kind} `{}`", member.ty) };
    if !kind.is_sequence() {
        return Err(invalid());
    }
    match element_shapes(&member.ty, kind).1.and_then(TypeShape::ident) {
        Some(target) => Ok(target.to_string()),
        None => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(src: &str) -> TypeShape {
        TypeShape::parse(src).unwrap()
    }

    fn hero() -> RecordDecl {
        RecordDecl::new("Hero")
            .table()
            .member(MemberDecl::data("id", ty("u32")).id())
            .member(MemberDecl::data("_name", ty("String")))
            .member(MemberDecl::data("m_multipliers", ty("Vec<Multiplier>")).vertical())
            .member(MemberDecl::data("weapon", ty("Option<SheetRef<Item>>")).mutable())
            .member(MemberDecl::ignored("cache", ty("Vec<u8>")))
    }

    #[test]
    fn describes_only_data_members() {
        let schema = extract(&hero()).unwrap();
        let names: Vec<&str> = schema.fields.iter().map(|f| f.declared_name.as_str()).collect();
        assert_eq!(names, ["id", "_name", "m_multipliers", "weapon"]);
        assert_eq!(schema.ignored, ["cache"]);
        assert_eq!(schema.id_field.as_deref(), Some("id"));
    }

    #[test]
    fn descriptors_carry_kind_semantics_and_wire_names() {
        let schema = extract(&hero().naming(NamingStrategy::SnakeCase)).unwrap();
        let name = schema.field("_name").unwrap();
        assert_eq!(name.wire_name, "name");
        assert_eq!(name.property_name, "Name");
        assert_eq!(name.member_kind, MemberKind::Field);
        assert_eq!(name.semantic_type, SemanticType::Str);

        let weapon = schema.field("weapon").unwrap();
        assert_eq!(weapon.collection_kind, CollectionKind::Scalar);
        assert_eq!(weapon.semantic_type, SemanticType::SheetRef { target: "Item".into() });
        assert!(weapon.is_mutable);
        assert!(weapon.may_hold_references());
        assert!(!schema.field("id").unwrap().may_hold_references());
    }

    #[test]
    fn vertical_members_point_at_their_record() {
        let schema = extract(&hero()).unwrap();
        let multipliers = schema.field("m_multipliers").unwrap();
        assert!(multipliers.is_vertical);
        assert_eq!(multipliers.collection_kind, CollectionKind::List);
        assert_eq!(multipliers.element.as_ref().unwrap().semantic_type, SemanticType::Record { name: "Multiplier".into() });
        assert_eq!(schema.vertical, vec![VerticalRelation { target_type: "Multiplier".into(), property: "Multipliers".into() }]);
    }

    #[test]
    fn maps_carry_key_and_value_descriptors() {
        let decl = RecordDecl::new("Shop").member(MemberDecl::data("prices", ty("HashMap<String, f32>")));
        let schema = extract(&decl).unwrap();
        let prices = &schema.fields[0];
        assert_eq!(prices.key.as_ref().unwrap().semantic_type, SemanticType::Str);
        assert_eq!(prices.element.as_ref().unwrap().semantic_type, SemanticType::Float);
        assert_eq!(prices.semantic_type, SemanticType::Float);
    }

    #[test]
    fn record_mutability_applies_to_every_member() {
        let schema = extract(&hero().mutable()).unwrap();
        assert!(schema.fields.iter().all(|f| f.is_mutable));
    }

    #[test]
    fn rejects_two_members_claiming_one_accessor() {
        let decl = RecordDecl::new("Hero").member(MemberDecl::data("_hp", ty("u32"))).member(MemberDecl::data("hp", ty("u32")));
        assert_eq!(
            extract(&decl),
            Err(SchemaError::AmbiguousAccessor { record: "Hero".into(), property: "Hp".into(), first: "_hp".into(), second: "hp".into() })
        );
        let ignored_twin = RecordDecl::new("Hero").member(MemberDecl::data("_hp", ty("u32"))).member(MemberDecl::ignored("hp", ty("u32")));
        assert!(extract(&ignored_twin).is_ok());
    }

    #[test]
    fn validates_converters() {
        let ok = RecordDecl::new("Item").member(
            MemberDecl::data("color", ty("Color")).converted(ConverterDecl::new("HexColor", ty("String"), ty("crate::Color"))),
        );
        let schema = extract(&ok).unwrap();
        assert_eq!(schema.fields[0].converter.as_ref().map(|c| c.input.as_str()), Some("String"));

        let wrong_output = RecordDecl::new("Item").member(MemberDecl::data("color", ty("Color")).converted(ConverterDecl::new("HexColor", ty("String"), ty("u32"))));
        assert!(matches!(extract(&wrong_output), Err(SchemaError::InvalidConverter { member, .. }) if member == "color"));

        let wrong_input = RecordDecl::new("Item").member(MemberDecl::data("color", ty("Color")).converted(ConverterDecl::new("HexColor", ty("Vec<u8>"), ty("Color"))));
        assert!(matches!(extract(&wrong_input), Err(SchemaError::InvalidConverter { .. })));
    }

    #[test]
    fn rejects_second_id_and_scalar_vertical_lists() {
        let two_ids = RecordDecl::new("Hero").member(MemberDecl::data("a", ty("u32")).id()).member(MemberDecl::data("b", ty("u32")).id());
        assert!(matches!(extract(&two_ids), Err(SchemaError::MultipleIdMembers { .. })));
        let scalar = RecordDecl::new("Hero").member(MemberDecl::data("stats", ty("Stats")).vertical());
        assert!(matches!(extract(&scalar), Err(SchemaError::InvalidVerticalList { .. })));
        let set = RecordDecl::new("Hero").member(MemberDecl::data("stats", ty("HashSet<Stats>")).vertical());
        assert!(matches!(extract(&set), Err(SchemaError::InvalidVerticalList { .. })));
    }
}
