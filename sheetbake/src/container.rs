use crate::bake::report::RowIssue;
use crate::error::{BakeError, RuntimeError};
use crate::id::RowKey;
use crate::record::TableRecord;
use crate::reference::short_type_name;
use crate::table::{ingest_rows, restore_rows, ErasedTable, Table};
use crate::value::RawRow;
use sheetbake_schema::{NamingStrategy, RecordSchema};
use std::any::TypeId;
use std::collections::HashMap;

type Ingest = fn(&str, &[RawRow], NamingStrategy, &mut Vec<RowIssue>) -> Box<dyn ErasedTable>;
type Restore = fn(&str, Vec<(String, Vec<u8>)>) -> Result<Box<dyn ErasedTable>, BakeError>;

/// One declared sheet: its name and the record type its rows hold.
#[derive(Clone)]
pub struct SheetDecl {
    name: String,
    record_type: TypeId,
    record_name: &'static str,
    schema: fn() -> &'static RecordSchema,
    pub(crate) ingest: Ingest,
    pub(crate) restore: Restore,
}

impl SheetDecl {
    pub fn of<R: TableRecord>(name: &str) -> Self {
        SheetDecl {
            name: name.to_string(),
            record_type: TypeId::of::<R>(),
            record_name: short_type_name::<R>(),
            schema: R::schema,
            ingest: ingest_rows::<R>,
            restore: restore_rows::<R>,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> TypeId {
        self.record_type
    }

    pub fn record_name(&self) -> &'static str {
        self.record_name
    }

    pub fn schema(&self) -> &'static RecordSchema {
        (self.schema)()
    }
}

impl std::fmt::Debug for SheetDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetDecl").field("name", &self.name).field("record", &self.record_name).finish()
    }
}

/// Declared sheets in processing order plus database-wide settings.
#[derive(Debug, Clone, Default)]
pub struct ContainerSchema {
    sheets: Vec<SheetDecl>,
    naming: NamingStrategy,
    allow_pseudo: bool,
}

impl ContainerSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet<R: TableRecord>(mut self, name: &str) -> Self {
        self.sheets.push(SheetDecl::of::<R>(name));
        self
    }

    /// Naming strategy for records that do not pick their own.
    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Bake `$name` and `<name>` sheets instead of skipping them.
    pub fn allow_pseudo(mut self, allow: bool) -> Self {
        self.allow_pseudo = allow;
        self
    }

    pub fn sheets(&self) -> &[SheetDecl] {
        &self.sheets
    }

    pub fn naming_strategy(&self) -> NamingStrategy {
        self.naming
    }

    pub fn allows_pseudo(&self) -> bool {
        self.allow_pseudo
    }

    pub fn find(&self, name: &str) -> Option<&SheetDecl> {
        self.sheets.iter().find(|decl| decl.name == name)
    }
}

/// Baked tables by sheet name. A table's position is the sheet ordinal of its `RowKey`s.
#[derive(Default)]
pub struct Container {
    naming: NamingStrategy,
    tables: Vec<Box<dyn ErasedTable>>,
    by_name: HashMap<String, usize>,
}

impl Container {
    pub fn new(naming: NamingStrategy) -> Self {
        Container { naming, tables: Vec::new(), by_name: HashMap::new() }
    }

    /// Appends a table and returns its sheet ordinal.
    pub fn insert(&mut self, table: Box<dyn ErasedTable>) -> Result<u16, BakeError> {
        if self.by_name.contains_key(table.name()) {
            return Err(BakeError::DuplicateSheet(table.name().to_string()));
        }
        let ordinal = u16::try_from(self.tables.len()).map_err(|_| BakeError::Capacity(format!("more than {} sheets", u16::MAX as usize + 1)))?;
        if table.len() as u64 > RowKey::MAX_ROW + 1 {
            return Err(BakeError::Capacity(format!("sheet `{}` has {} rows", table.name(), table.len())));
        }
        self.by_name.insert(table.name().to_string(), self.tables.len());
        self.tables.push(table);
        Ok(ordinal)
    }

    pub fn naming(&self) -> NamingStrategy {
        self.naming
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|table| table.name())
    }

    pub fn tables(&self) -> impl Iterator<Item = &dyn ErasedTable> {
        self.tables.iter().map(|table| table.as_ref())
    }

    pub(crate) fn tables_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn ErasedTable>> {
        self.tables.iter_mut()
    }

    pub(crate) fn into_tables(self) -> Vec<Box<dyn ErasedTable>> {
        self.tables
    }

    pub fn sheet(&self, name: &str) -> Option<&dyn ErasedTable> {
        self.by_name.get(name).map(|&ordinal| self.tables[ordinal].as_ref())
    }

    pub fn ordinal(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).map(|&ordinal| ordinal as u16)
    }

    pub fn table<R: TableRecord>(&self, name: &str) -> Result<&Table<R>, RuntimeError> {
        let table = self.sheet(name).ok_or_else(|| RuntimeError::SheetMissing(name.to_string()))?;
        table.as_any().downcast_ref::<Table<R>>().ok_or_else(|| RuntimeError::TypeMismatch {
            sheet: name.to_string(),
            expected: short_type_name::<R>().to_string(),
            found: table.schema().name.clone(),
        })
    }

    /// First declared table holding `R` records.
    pub fn first_table<R: TableRecord>(&self) -> Option<&Table<R>> {
        self.tables.iter().find_map(|table| table.as_any().downcast_ref::<Table<R>>())
    }

    /// The row a resolved reference points at.
    pub fn get<R: TableRecord>(&self, key: RowKey) -> Option<&R> {
        let table = self.tables.get(key.sheet() as usize)?.as_any().downcast_ref::<Table<R>>()?;
        table.get(key.row() as usize)
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.tables.iter().map(|t| (t.name(), t.len()))).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
    #[record(table)]
    struct Item {
        #[data(id)]
        id: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
    #[record(table)]
    struct Skill {
        #[data(id)]
        id: u32,
    }

    fn container() -> Container {
        let mut container = Container::new(NamingStrategy::default());
        container.insert(Box::new(Table::from_rows("Items", vec![Item { id: 1 }, Item { id: 2 }]).unwrap())).unwrap();
        container.insert(Box::new(Table::from_rows("Skills", vec![Skill { id: 7 }]).unwrap())).unwrap();
        container
    }

    #[test]
    fn tables_are_typed_by_name() {
        let container = container();
        assert_eq!(container.table::<Item>("Items").unwrap().len(), 2);
        assert!(matches!(container.table::<Skill>("Items"), Err(RuntimeError::TypeMismatch { .. })));
        assert!(matches!(container.table::<Item>("Quests"), Err(RuntimeError::SheetMissing(_))));
        assert_eq!(container.sheet_names().collect::<Vec<_>>(), vec!["Items", "Skills"]);
    }

    #[test]
    fn row_keys_address_rows() {
        let container = container();
        assert_eq!(container.get::<Skill>(RowKey::new(1, 0).unwrap()), Some(&Skill { id: 7 }));
        assert_eq!(container.get::<Item>(RowKey::new(1, 0).unwrap()), None);
        assert_eq!(container.get::<Item>(RowKey::new(0, 1).unwrap()), Some(&Item { id: 2 }));
    }

    #[test]
    fn sheet_names_are_unique() {
        let mut container = container();
        let again = Table::<Item>::new("Items");
        assert!(matches!(container.insert(Box::new(again)), Err(BakeError::DuplicateSheet(name)) if name == "Items"));
    }

    #[test]
    fn schema_keeps_declaration_order() {
        let schema = ContainerSchema::new().sheet::<Item>("Items").sheet::<Skill>("Skills").naming(NamingStrategy::SnakeCase);
        assert_eq!(schema.sheets().iter().map(|s| s.name()).collect::<Vec<_>>(), vec!["Items", "Skills"]);
        assert_eq!(schema.find("Skills").map(|s| s.record_name()), Some("Skill"));
        assert_eq!(schema.naming_strategy(), NamingStrategy::SnakeCase);
    }
}
