use crate::naming::{self, NamingStrategy};
use crate::shape::TypeShape;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Scalar,
    Array,
    List,
    Dictionary,
    Set,
    Queue,
    Stack,
    ReadOnlyMemoryView,
    MemoryView,
    ReadOnlySpanView,
    SpanView,
    ReadOnlyList,
    ReadOnlyDictionary,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 13] = [
        CollectionKind::Scalar,
        CollectionKind::Array,
        CollectionKind::List,
        CollectionKind::Dictionary,
        CollectionKind::Set,
        CollectionKind::Queue,
        CollectionKind::Stack,
        CollectionKind::ReadOnlyMemoryView,
        CollectionKind::MemoryView,
        CollectionKind::ReadOnlySpanView,
        CollectionKind::SpanView,
        CollectionKind::ReadOnlyList,
        CollectionKind::ReadOnlyDictionary,
    ];

    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            CollectionKind::ReadOnlyMemoryView | CollectionKind::ReadOnlySpanView | CollectionKind::ReadOnlyList | CollectionKind::ReadOnlyDictionary
        )
    }

    pub fn is_keyed(self) -> bool {
        matches!(self, CollectionKind::Dictionary | CollectionKind::ReadOnlyDictionary)
    }

    /// Positionally indexed and resizable or fixed, the kinds a vertical list may use.
    pub fn is_sequence(self) -> bool {
        matches!(self, CollectionKind::Array | CollectionKind::List | CollectionKind::MemoryView)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Scalar => "Scalar",
            CollectionKind::Array => "Array",
            CollectionKind::List => "List",
            CollectionKind::Dictionary => "Dictionary",
            CollectionKind::Set => "Set",
            CollectionKind::Queue => "Queue",
            CollectionKind::Stack => "Stack",
            CollectionKind::ReadOnlyMemoryView => "ReadOnlyMemoryView",
            CollectionKind::MemoryView => "MemoryView",
            CollectionKind::ReadOnlySpanView => "ReadOnlySpanView",
            CollectionKind::SpanView => "SpanView",
            CollectionKind::ReadOnlyList => "ReadOnlyList",
            CollectionKind::ReadOnlyDictionary => "ReadOnlyDictionary",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a value means, independent of how it is collected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Bool,
    Int,
    Float,
    Str,
    SheetRef { target: String },
    AssetRef,
    Record { name: String },
    Other { name: String },
}

impl SemanticType {
    pub fn is_primitive(&self) -> bool {
        matches!(self, SemanticType::Bool | SemanticType::Int | SemanticType::Float | SemanticType::Str)
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, SemanticType::Bool | SemanticType::Int | SemanticType::Float)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, SemanticType::SheetRef { .. } | SemanticType::AssetRef)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Bool => f.write_str("bool"),
            SemanticType::Int => f.write_str("int"),
            SemanticType::Float => f.write_str("float"),
            SemanticType::Str => f.write_str("string"),
            SemanticType::SheetRef { target } => write!(f, "sheet reference to {target}"),
            SemanticType::AssetRef => f.write_str("asset reference"),
            SemanticType::Record { name } => write!(f, "record {name}"),
            SemanticType::Other { name } => f.write_str(name),
        }
    }
}

/// A member with a recognized private prefix is a field, any other is a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
}

impl MemberKind {
    pub fn of(declared_name: &str) -> Self {
        if naming::strip_field_prefix(declared_name).is_some() {
            MemberKind::Field
        } else {
            MemberKind::Property
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterDecl {
    pub path: String,
    pub input: TypeShape,
    pub output: TypeShape,
}

impl ConverterDecl {
    pub fn new(path: &str, input: TypeShape, output: TypeShape) -> Self {
        ConverterDecl { path: path.to_string(), input, output }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConverterSpec {
    pub path: String,
    pub input: String,
    pub output: String,
}

/// One member as declared on a record, before analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    pub name: String,
    pub ty: TypeShape,
    pub is_data_member: bool,
    pub converter: Option<ConverterDecl>,
    pub is_id: bool,
    pub is_mutable: bool,
    pub is_vertical: bool,
}

impl MemberDecl {
    pub fn data(name: &str, ty: TypeShape) -> Self {
        MemberDecl { name: name.to_string(), ty, is_data_member: true, converter: None, is_id: false, is_mutable: false, is_vertical: false }
    }

    pub fn ignored(name: &str, ty: TypeShape) -> Self {
        MemberDecl { is_data_member: false, ..Self::data(name, ty) }
    }

    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    pub fn mutable(mut self) -> Self {
        self.is_mutable = true;
        self
    }

    pub fn vertical(mut self) -> Self {
        self.is_vertical = true;
        self
    }

    pub fn converted(mut self, converter: ConverterDecl) -> Self {
        self.converter = Some(converter);
        self
    }
}

/// A record declaration with its member list in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordDecl {
    pub name: String,
    pub members: Vec<MemberDecl>,
    /// Set when generated members cannot be attached to the type.
    pub closed_reason: Option<String>,
    pub is_table: bool,
    pub naming: Option<NamingStrategy>,
    pub is_mutable: bool,
    pub user_impls: Vec<String>,
}

impl RecordDecl {
    pub fn new(name: &str) -> Self {
        RecordDecl { name: name.to_string(), ..Default::default() }
    }

    pub fn table(mut self) -> Self {
        self.is_table = true;
        self
    }

    pub fn mutable(mut self) -> Self {
        self.is_mutable = true;
        self
    }

    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = Some(naming);
        self
    }

    pub fn member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn user_impl(mut self, name: &str) -> Self {
        self.user_impls.push(name.to_string());
        self
    }

    pub fn closed(mut self, reason: &str) -> Self {
        self.closed_reason = Some(reason.to_string());
        self
    }
}

/// Canonical description of one data member. Created once per member, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub declared_name: String,
    pub property_name: String,
    pub declared_type: String,
    /// Semantic type of the value; for collections that of the element (or map value).
    pub semantic_type: SemanticType,
    pub collection_kind: CollectionKind,
    pub wire_name: String,
    pub is_mutable: bool,
    pub is_id: bool,
    pub is_vertical: bool,
    pub member_kind: MemberKind,
    pub converter: Option<ConverterSpec>,
    pub key: Option<Box<FieldDescriptor>>,
    pub element: Option<Box<FieldDescriptor>>,
}

impl FieldDescriptor {
    pub fn wire_name_for(&self, naming: NamingStrategy) -> String {
        naming.wire_name(&self.declared_name)
    }

    /// False only for members that provably hold primitives all the way down.
    pub fn may_hold_references(&self) -> bool {
        let own = !self.semantic_type.is_primitive();
        let key = self.key.as_ref().is_some_and(|k| k.may_hold_references());
        let element = self.element.as_ref().is_some_and(|e| e.may_hold_references());
        own || key || element
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerticalRelation {
    pub target_type: String,
    pub property: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    /// Record level override, `None` inherits the container strategy.
    pub naming: Option<NamingStrategy>,
    pub is_mutable: bool,
    pub is_table: bool,
    pub id_field: Option<String>,
    pub vertical: Vec<VerticalRelation>,
    pub closed_reason: Option<String>,
    pub user_impls: Vec<String>,
    /// Declared members without the data marker.
    pub ignored: Vec<String>,
}

impl RecordSchema {
    pub fn field(&self, declared_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.declared_name == declared_name)
    }

    pub fn field_by_wire_name(&self, wire_name: &str, naming: NamingStrategy) -> Option<&FieldDescriptor> {
        let naming = self.effective_naming(naming);
        self.fields.iter().find(|f| f.wire_name_for(naming) == wire_name)
    }

    pub fn id(&self) -> Option<&FieldDescriptor> {
        self.id_field.as_deref().and_then(|name| self.field(name))
    }

    pub fn effective_naming(&self, inherited: NamingStrategy) -> NamingStrategy {
        self.naming.unwrap_or(inherited)
    }

    pub fn is_user_implemented(&self, member: &str) -> bool {
        self.user_impls.iter().any(|m| m == member)
    }
}
