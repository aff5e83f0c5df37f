use thiserror::Error;

/// Compile-time failures. Each one is fatal to the generation of a single record type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("record `{record}`: members `{first}` and `{second}` both claim the accessor `{property}`")]
    AmbiguousAccessor { record: String, property: String, first: String, second: String },

    #[error("record `{record}`: converter `{converter}` on member `{member}` expects {expected}, found {found}")]
    InvalidConverter { record: String, member: String, converter: String, expected: String, found: String },

    #[error("record `{record}` is not open for extension: {reason}")]
    NotOpenForExtension { record: String, reason: String },

    #[error("table record `{record}` has no id member, mark one field with #[data(id)]")]
    MissingIdMember { record: String },

    #[error("record `{record}`: members `{first}` and `{second}` are both marked as id")]
    MultipleIdMembers { record: String, first: String, second: String },

    #[error("record `{record}`: vertical member `{member}` must be an array, list or boxed slice of records, found {found}")]
    InvalidVerticalList { record: String, member: String, found: String },
}

impl SchemaError {
    pub fn record(&self) -> &str {
        match self {
            SchemaError::AmbiguousAccessor { record, .. }
            | SchemaError::InvalidConverter { record, .. }
            | SchemaError::NotOpenForExtension { record, .. }
            | SchemaError::MissingIdMember { record }
            | SchemaError::MultipleIdMembers { record, .. }
            | SchemaError::InvalidVerticalList { record, .. } => record,
        }
    }

    /// Declared member the error points at, if any.
    pub fn member(&self) -> Option<&str> {
        match self {
            SchemaError::AmbiguousAccessor { second, .. } => Some(second),
            SchemaError::InvalidConverter { member, .. } => Some(member),
            SchemaError::MultipleIdMembers { second, .. } => Some(second),
            SchemaError::InvalidVerticalList { member, .. } => Some(member),
            SchemaError::NotOpenForExtension { .. } | SchemaError::MissingIdMember { .. } => None,
        }
    }
}
