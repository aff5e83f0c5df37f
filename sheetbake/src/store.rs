//! Read side of baked data. Tables are built once at load time and only read afterwards; `initialize` and
//! `deinitialize` must not race with queries, which `&mut self` enforces.

use crate::container::Container;
use crate::error::RuntimeError;
use crate::id::RowId;
use crate::record::TableRecord;
use crate::reference::{short_type_name, SheetRef};
use std::any::Any;
use std::collections::HashMap;
use tracing::{debug, info};

/// Read-only, non-copying access to one row. Dereferencing an invalid handle fails instead of yielding defaults.
#[derive(Debug)]
pub struct RowHandle<'a, R> {
    row: Option<&'a R>,
}

impl<'a, R> RowHandle<'a, R> {
    fn invalid() -> Self {
        RowHandle { row: None }
    }

    pub fn is_valid(&self) -> bool {
        self.row.is_some()
    }

    pub fn value_ref(&self) -> Result<&'a R, RuntimeError> {
        self.row.ok_or(RuntimeError::InvalidHandle)
    }

    pub fn into_option(self) -> Option<&'a R> {
        self.row
    }
}

impl<R> Clone for RowHandle<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for RowHandle<'_, R> {}

/// Rows of one sheet with an id index, built in one pass.
#[derive(Debug)]
pub struct DataTableAsset<R: TableRecord> {
    name: String,
    rows: Vec<R>,
    index: HashMap<String, usize>,
}

impl<R: TableRecord> DataTableAsset<R> {
    /// Copies the named table out of a baked container.
    pub fn initialize(container: &Container, name: &str) -> Result<Self, RuntimeError> {
        let table = container.table::<R>(name)?;
        Self::from_rows(name, table.rows().to_vec())
    }

    pub fn from_rows(name: &str, rows: Vec<R>) -> Result<Self, RuntimeError> {
        let mut index = HashMap::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            let key = row.get_id().to_key();
            if index.insert(key.clone(), position).is_some() {
                return Err(RuntimeError::DuplicateId { sheet: name.to_string(), id: key });
            }
        }
        debug!(sheet = name, rows = rows.len(), "table initialized");
        Ok(DataTableAsset { name: name.to_string(), rows, index })
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

    pub fn get_by_id_ref(&self, id: &R::Id) -> RowHandle<'_, R> {
        self.get_by_key(&id.to_key())
    }

    pub fn get_by_key(&self, key: &str) -> RowHandle<'_, R> {
        RowHandle { row: self.index.get(key).map(|&position| &self.rows[position]) }
    }

    fn get_by_position(&self, position: usize) -> RowHandle<'_, R> {
        RowHandle { row: self.rows.get(position) }
    }

    /// Drops the rows and the index. Every later lookup yields an invalid handle.
    pub fn deinitialize(&mut self) {
        self.rows = Vec::new();
        self.index = HashMap::new();
    }
}

/// Write access to a table whose record type is marked mutable.
pub struct MutableDataTable<'a, R: TableRecord> {
    asset: &'a mut DataTableAsset<R>,
}

impl<'a, R: TableRecord> MutableDataTable<'a, R> {
    pub fn new(asset: &'a mut DataTableAsset<R>) -> Result<Self, RuntimeError> {
        if !R::schema().is_mutable {
            return Err(RuntimeError::Immutable(asset.name.clone()));
        }
        Ok(MutableDataTable { asset })
    }

    /// Replaces the row stored under `id`. The new value must carry the same id.
    pub fn try_set(&mut self, id: &R::Id, value: R) -> Result<(), RuntimeError> {
        let key = id.to_key();
        let position = *self.asset.index.get(&key).ok_or_else(|| RuntimeError::NotFound { sheet: self.asset.name.clone(), id: key.clone() })?;
        let found = value.get_id().to_key();
        if found != key {
            return Err(RuntimeError::IdMismatch { expected: key, found });
        }
        self.asset.rows[position] = value;
        Ok(())
    }

    pub fn get_by_id_ref(&self, id: &R::Id) -> RowHandle<'_, R> {
        self.asset.get_by_id_ref(id)
    }
}

struct Loaded {
    /// One `DataTableAsset` per baked sheet, in sheet ordinal order.
    assets: Vec<Box<dyn Any + Send + Sync>>,
    names: HashMap<String, usize>,
    record_names: Vec<String>,
}

/// All tables of a baked container, looked up by record type or sheet name.
#[derive(Default)]
pub struct DataStore {
    loaded: Option<Loaded>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes over a container. On failure the store stays uninitialized.
    pub fn initialize(&mut self, container: Container) -> Result<(), RuntimeError> {
        self.loaded = None;
        let tables = container.into_tables();
        let mut loaded = Loaded { assets: Vec::with_capacity(tables.len()), names: HashMap::new(), record_names: Vec::new() };
        for table in tables {
            loaded.names.insert(table.name().to_string(), loaded.assets.len());
            loaded.record_names.push(table.schema().name.clone());
            loaded.assets.push(table.into_asset()?);
        }
        info!(tables = loaded.assets.len(), "data store initialized");
        self.loaded = Some(loaded);
        Ok(())
    }

    pub fn deinitialize(&mut self) {
        if self.loaded.take().is_some() {
            info!("data store deinitialized");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.loaded.is_some()
    }

    fn loaded(&self) -> Result<&Loaded, RuntimeError> {
        self.loaded.as_ref().ok_or(RuntimeError::NotInitialized)
    }

    /// First table holding `R` records, `None` when absent or not initialized.
    pub fn try_get_table<R: TableRecord>(&self) -> Option<&DataTableAsset<R>> {
        self.loaded.as_ref()?.assets.iter().find_map(|asset| asset.downcast_ref::<DataTableAsset<R>>())
    }

    pub fn table<R: TableRecord>(&self, name: &str) -> Result<&DataTableAsset<R>, RuntimeError> {
        let loaded = self.loaded()?;
        let &ordinal = loaded.names.get(name).ok_or_else(|| RuntimeError::SheetMissing(name.to_string()))?;
        loaded.assets[ordinal].downcast_ref::<DataTableAsset<R>>().ok_or_else(|| RuntimeError::TypeMismatch {
            sheet: name.to_string(),
            expected: short_type_name::<R>().to_string(),
            found: loaded.record_names[ordinal].clone(),
        })
    }

    pub fn table_mut<R: TableRecord>(&mut self, name: &str) -> Result<MutableDataTable<'_, R>, RuntimeError> {
        let loaded = self.loaded.as_mut().ok_or(RuntimeError::NotInitialized)?;
        let &ordinal = loaded.names.get(name).ok_or_else(|| RuntimeError::SheetMissing(name.to_string()))?;
        let found = loaded.record_names[ordinal].clone();
        let asset = loaded.assets[ordinal].downcast_mut::<DataTableAsset<R>>().ok_or_else(|| RuntimeError::TypeMismatch {
            sheet: name.to_string(),
            expected: short_type_name::<R>().to_string(),
            found,
        })?;
        MutableDataTable::new(asset)
    }

    /// The row a baked reference points at. Unresolved references give an invalid handle.
    pub fn resolve<T: TableRecord>(&self, reference: &SheetRef<T>) -> RowHandle<'_, T> {
        let (Some(loaded), Some(key)) = (self.loaded.as_ref(), reference.resolved()) else {
            return RowHandle::invalid();
        };
        match loaded.assets.get(key.sheet() as usize).and_then(|asset| asset.downcast_ref::<DataTableAsset<T>>()) {
            Some(asset) => asset.get_by_position(key.row() as usize),
            None => RowHandle::invalid(),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use crate::Record;
    use serde::{Deserialize, Serialize};
    use sheetbake_schema::NamingStrategy;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
    #[record(table)]
    struct Item {
        #[data(id)]
        id: u32,
        #[data]
        name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
    #[record(table, mutable)]
    struct Counter {
        #[data(id)]
        id: u32,
        #[data]
        value: i64,
    }

    fn item(id: u32) -> Item {
        Item { id, name: format!("item {id}") }
    }

    #[test]
    fn lookup_by_id_returns_handles() {
        let asset = DataTableAsset::from_rows("Items", vec![item(1), item(2), item(3)]).unwrap();
        let handle = asset.get_by_id_ref(&2);
        assert!(handle.is_valid());
        assert_eq!(handle.value_ref().unwrap().id, 2);
        let missing = asset.get_by_id_ref(&4);
        assert!(!missing.is_valid());
        assert_eq!(missing.value_ref().err(), Some(RuntimeError::InvalidHandle));
    }

    #[test]
    fn duplicate_ids_fail_to_load() {
        let err = DataTableAsset::from_rows("Items", vec![item(5), item(5)]).err();
        assert_eq!(err, Some(RuntimeError::DuplicateId { sheet: "Items".into(), id: "5".into() }));
    }

    #[test]
    fn deinitialized_tables_hand_out_invalid_handles() {
        let mut asset = DataTableAsset::from_rows("Items", vec![item(1)]).unwrap();
        asset.deinitialize();
        assert!(!asset.get_by_id_ref(&1).is_valid());
        assert!(asset.is_empty());
    }

    #[test]
    fn only_mutable_records_can_be_set() {
        let mut items = DataTableAsset::from_rows("Items", vec![item(1)]).unwrap();
        assert!(matches!(MutableDataTable::new(&mut items), Err(RuntimeError::Immutable(_))));

        let mut counters = DataTableAsset::from_rows("Counters", vec![Counter { id: 1, value: 0 }]).unwrap();
        let mut table = MutableDataTable::new(&mut counters).unwrap();
        table.try_set(&1, Counter { id: 1, value: 10 }).unwrap();
        assert_eq!(table.get_by_id_ref(&1).value_ref().unwrap().value, 10);
        assert!(matches!(table.try_set(&2, Counter { id: 2, value: 1 }), Err(RuntimeError::NotFound { .. })));
        assert!(matches!(table.try_set(&1, Counter { id: 3, value: 1 }), Err(RuntimeError::IdMismatch { .. })));
    }

    #[test]
    fn data_store_serves_typed_tables() {
        let mut container = Container::new(NamingStrategy::default());
        container.insert(Box::new(Table::from_rows("Items", vec![item(1), item(2)]).unwrap())).unwrap();
        container.insert(Box::new(Table::from_rows("Counters", vec![Counter { id: 1, value: 0 }]).unwrap())).unwrap();

        let mut store = DataStore::new();
        assert!(store.try_get_table::<Item>().is_none());
        assert_eq!(store.table::<Item>("Items").err(), Some(RuntimeError::NotInitialized));

        store.initialize(container).unwrap();
        assert_eq!(store.try_get_table::<Item>().map(|t| t.len()), Some(2));
        assert!(matches!(store.table::<Counter>("Items"), Err(RuntimeError::TypeMismatch { .. })));
        store.table_mut::<Counter>("Counters").unwrap().try_set(&1, Counter { id: 1, value: 4 }).unwrap();
        assert_eq!(store.table::<Counter>("Counters").unwrap().get_by_id_ref(&1).value_ref().unwrap().value, 4);

        store.deinitialize();
        assert!(!store.is_initialized());
        assert!(store.try_get_table::<Item>().is_none());
    }
}
