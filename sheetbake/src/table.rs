use crate::bake::link::{LinkSite, Linker};
use crate::bake::report::RowIssue;
use crate::error::{BakeError, ReferenceError, RuntimeError};
use crate::id::{is_valid_key, RowId};
use crate::property::PropertyNode;
use crate::record::TableRecord;
use crate::store::DataTableAsset;
use crate::value::RawRow;
use sheetbake_schema::{NamingStrategy, RecordSchema};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// A sheet of typed rows as seen by the container, the bake engine and the artifact store.
pub trait ErasedTable: Any + Send + Sync {
    fn name(&self) -> &str;
    fn record_type(&self) -> TypeId;
    fn schema(&self) -> &'static RecordSchema;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Id keys in row order.
    fn keys(&self) -> Vec<String>;
    fn position(&self, key: &str) -> Option<usize>;
    fn map_references(&mut self, linker: &Linker<'_>) -> Vec<ReferenceError>;
    fn encode_rows(&self) -> Result<Vec<(String, Vec<u8>)>, BakeError>;
    /// Moves the rows into a runtime `DataTableAsset` of the same record type.
    fn into_asset(self: Box<Self>) -> Result<Box<dyn Any + Send + Sync>, RuntimeError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Ordered rows of one sheet with an id key index. Ids are unique within a table.
pub struct Table<R: TableRecord> {
    name: String,
    rows: Vec<R>,
    index: HashMap<String, usize>,
    root: OnceLock<Arc<PropertyNode<R>>>,
}

impl<R: TableRecord> Table<R> {
    pub fn new(name: &str) -> Self {
        Table { name: name.to_string(), rows: Vec::new(), index: HashMap::new(), root: OnceLock::new() }
    }

    pub fn from_rows(name: &str, rows: impl IntoIterator<Item = R>) -> Result<Self, RuntimeError> {
        let mut table = Table::new(name);
        for row in rows {
            table.push(row)?;
        }
        Ok(table)
    }

    /// Appends a row, returning its position.
    pub fn push(&mut self, row: R) -> Result<usize, RuntimeError> {
        let key = row.get_id().to_key();
        if self.index.contains_key(&key) {
            return Err(RuntimeError::DuplicateId { sheet: self.name.clone(), id: key });
        }
        let position = self.rows.len();
        self.index.insert(key, position);
        self.rows.push(row);
        Ok(position)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn get(&self, position: usize) -> Option<&R> {
        self.rows.get(position)
    }

    pub fn find(&self, id: &R::Id) -> Option<&R> {
        self.index.get(&id.to_key()).map(|&position| &self.rows[position])
    }

    /// Property tree of the record type, built on first use and kept for the table's lifetime.
    pub fn property_root(&self) -> Arc<PropertyNode<R>> {
        self.root.get_or_init(|| Arc::new(PropertyNode::build())).clone()
    }
}

impl<R: TableRecord> ErasedTable for Table<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn record_type(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn schema(&self) -> &'static RecordSchema {
        R::schema()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn keys(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.get_id().to_key()).collect()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn map_references(&mut self, linker: &Linker<'_>) -> Vec<ReferenceError> {
        let mut errors = Vec::new();
        let root = self.property_root();
        for row in self.rows.iter_mut() {
            let id = row.get_id().to_key();
            let sites: Vec<(&PropertyNode<R>, Vec<usize>)> =
                root.traverse_leaf(&*row).filter(|(node, _)| node.descriptor().is_some_and(|d| d.may_hold_references())).collect();
            for (node, indexes) in sites {
                let site = LinkSite { sheet: &self.name, row: &id, path: node.path(), indexes: &indexes };
                let mut value = match node.try_get_value(row, &indexes) {
                    Ok(value) => value,
                    Err(error) => {
                        warn!(sheet = %self.name, row = %id, path = node.path(), %error, "cannot read reference field");
                        continue;
                    }
                };
                if linker.link(&mut value, &site, &mut errors) {
                    if let Err(error) = node.set_value(row, &indexes, value) {
                        warn!(sheet = %self.name, row = %id, path = node.path(), %error, "cannot write resolved reference back");
                    }
                }
            }
        }
        errors
    }

    fn encode_rows(&self) -> Result<Vec<(String, Vec<u8>)>, BakeError> {
        self.rows
            .iter()
            .map(|row| Ok((row.get_id().to_key(), bincode::serde::encode_to_vec(row, bincode::config::standard())?)))
            .collect()
    }

    fn into_asset(self: Box<Self>) -> Result<Box<dyn Any + Send + Sync>, RuntimeError> {
        let table = *self;
        let asset = DataTableAsset::<R>::from_rows(&table.name, table.rows)?;
        Ok(Box::new(asset))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Converts raw rows into a table. Rows that fail conversion, have a blank id or repeat an id are skipped.
pub(crate) fn ingest_rows<R: TableRecord>(name: &str, raw_rows: &[RawRow], naming: NamingStrategy, issues: &mut Vec<RowIssue>) -> Box<dyn ErasedTable> {
    let mut table = Table::<R>::new(name);
    for (position, raw) in raw_rows.iter().enumerate() {
        let row = match R::from_raw(raw, naming) {
            Ok(row) => row,
            Err(error) => {
                warn!(sheet = name, position, %error, "row skipped");
                issues.push(RowIssue { position, id: None, reason: error.to_string() });
                continue;
            }
        };
        let key = row.get_id().to_key();
        if !is_valid_key(&key) {
            warn!(sheet = name, position, "row with blank id skipped");
            issues.push(RowIssue { position, id: None, reason: "blank row id".to_string() });
            continue;
        }
        if let Err(error) = table.push(row) {
            warn!(sheet = name, position, id = %key, "duplicate row skipped");
            issues.push(RowIssue { position, id: Some(key), reason: error.to_string() });
        }
    }
    debug!(sheet = name, rows = table.len(), "sheet ingested");
    Box::new(table)
}

/// Rebuilds a table from persisted row artifacts in their recorded order.
pub(crate) fn restore_rows<R: TableRecord>(name: &str, artifacts: Vec<(String, Vec<u8>)>) -> Result<Box<dyn ErasedTable>, BakeError> {
    let mut table = Table::<R>::new(name);
    for (key, bytes) in artifacts {
        let (row, _): (R, usize) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        let id = row.get_id().to_key();
        if id != key {
            return Err(BakeError::Corrupt(format!("sheet `{name}` row `{key}` holds id `{id}`")));
        }
        table.push(row).map_err(|e| BakeError::Corrupt(e.to_string()))?;
    }
    Ok(Box::new(table))
}
