use crate::error::SchemaError;
use crate::model::{CollectionKind, FieldDescriptor, RecordSchema};
use crate::naming;

/// How an accessor moves a value in and out of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marshaling {
    /// getter returns by value
    Copy,
    /// getter returns `&T`, setter takes `T`
    Borrow,
    /// getter returns `&T`, setter collects any iterator of items
    CopyIn,
    /// getter returns a shared clone, setter takes the shared view as is
    Share,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorSpec {
    pub field: String,
    pub property: String,
    pub getter: String,
    pub setter: Option<String>,
    pub marshaling: Marshaling,
    pub ty: String,
    /// Item type collected by a `CopyIn` setter.
    pub item: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdExtractorSpec {
    pub field: String,
    pub id_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMembers {
    pub record: String,
    pub accessors: Vec<AccessorSpec>,
    pub id_extractor: Option<IdExtractorSpec>,
    /// Members left out because the record implements them by hand.
    pub skipped: Vec<String>,
}

pub const GET_ID: &str = "get_id";

pub fn generate(schema: &RecordSchema) -> Result<GeneratedMembers, SchemaError> {
    if let Some(reason) = &schema.closed_reason {
        return Err(SchemaError::NotOpenForExtension { record: schema.name.clone(), reason: reason.clone() });
    }
    let mut skipped = Vec::new();
    let mut accessors = Vec::new();
    for field in &schema.fields {
        let getter = naming::getter_name(&field.declared_name);
        if schema.is_user_implemented(&getter) {
            skipped.push(getter);
            continue;
        }
        let setter = if field.is_mutable || schema.is_mutable {
            let setter = naming::setter_name(&field.declared_name);
            if schema.is_user_implemented(&setter) {
                skipped.push(setter);
                None
            } else {
                Some(setter)
            }
        } else {
            None
        };
        let marshaling = marshaling(field);
        accessors.push(AccessorSpec {
            field: field.declared_name.clone(),
            property: field.property_name.clone(),
            getter,
            setter,
            marshaling,
            ty: field.declared_type.clone(),
            item: (marshaling == Marshaling::CopyIn).then(|| item_type(field)).flatten(),
        });
    }

    let id_extractor = if !schema.is_table {
        None
    } else if schema.is_user_implemented(GET_ID) {
        skipped.push(GET_ID.to_string());
        None
    } else {
        let id = schema.id().ok_or_else(|| SchemaError::MissingIdMember { record: schema.name.clone() })?;
        Some(IdExtractorSpec { field: id.declared_name.clone(), id_type: id.declared_type.clone() })
    };

    Ok(GeneratedMembers { record: schema.name.clone(), accessors, id_extractor, skipped })
}

pub fn marshaling(field: &FieldDescriptor) -> Marshaling {
    if field.converter.is_some() {
        return Marshaling::Borrow;
    }
    match field.collection_kind {
        CollectionKind::Scalar if field.semantic_type.is_copy() => Marshaling::Copy,
        CollectionKind::Scalar | CollectionKind::Array | CollectionKind::ReadOnlySpanView | CollectionKind::SpanView => Marshaling::Borrow,
        CollectionKind::List | CollectionKind::Dictionary | CollectionKind::Set | CollectionKind::Queue | CollectionKind::Stack | CollectionKind::MemoryView => {
            Marshaling::CopyIn
        }
        CollectionKind::ReadOnlyMemoryView | CollectionKind::ReadOnlyList | CollectionKind::ReadOnlyDictionary => Marshaling::Share,
    }
}

fn item_type(field: &FieldDescriptor) -> Option<String> {
    let element = field.element.as_ref()?;
    match &field.key {
        Some(key) => Some(format!("({}, {})", key.declared_type, element.declared_type)),
        None => Some(element.declared_type.clone()),
    }
}
