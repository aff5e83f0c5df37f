use crate::error::CellError;
use crate::id::RowId;
use crate::property::PropertyNode;
use crate::value::RawRow;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sheetbake_schema::{NamingStrategy, RecordSchema};

/// A declared data record. Implemented by `#[derive(Record)]`.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    fn schema() -> &'static RecordSchema;

    /// One node per data member, vertical members carrying their sub-record's nodes.
    fn property_nodes() -> Vec<PropertyNode<Self>>;

    /// Builds a record from wire-name keyed cells. The record's own naming wins over `naming`.
    fn from_raw(raw: &RawRow, naming: NamingStrategy) -> Result<Self, CellError>;

    fn to_raw(&self, naming: NamingStrategy) -> RawRow;
}

/// A record that backs a table and has a row id.
pub trait TableRecord: Record {
    type Id: RowId;

    fn get_id(&self) -> Self::Id;
}

pub struct RecordInfo {
    pub name: &'static str,
    pub schema: fn() -> &'static RecordSchema,
}

inventory::collect!(RecordInfo);

/// Schemas of every record compiled into the binary, sorted by name.
pub fn registered_records() -> Vec<&'static RecordSchema> {
    let mut schemas: Vec<&'static RecordSchema> = inventory::iter::<RecordInfo>.into_iter().map(|info| (info.schema)()).collect();
    schemas.sort_by(|a, b| a.name.cmp(&b.name));
    schemas
}
