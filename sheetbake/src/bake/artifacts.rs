use crate::container::{Container, ContainerSchema};
use crate::error::BakeError;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition, TableError, TableHandle};
use serde::{Deserialize, Serialize};
use sheetbake_schema::NamingStrategy;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const CONTAINER: TableDefinition<&str, &[u8]> = TableDefinition::new("container");
const MANIFEST_KEY: &str = "manifest";
pub const ROWS_PREFIX: &str = "rows/";

/// Persisted description of one sheet; `keys` keeps row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetArtifact {
    pub name: String,
    pub file_name: String,
    pub record: String,
    pub keys: Vec<String>,
}

/// The container artifact, parent of every sheet artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerArtifact {
    pub naming: NamingStrategy,
    pub baked_at: DateTime<Utc>,
    pub sheets: Vec<SheetArtifact>,
}

/// What `Save` does for one sheet beyond writing its current rows.
#[derive(Debug, Clone)]
pub(crate) struct SheetPlan {
    pub file_name: String,
    pub removed: Vec<String>,
}

/// Baked artifacts in a redb database: one `container` table for the manifest and one `rows/<file name>`
/// table per sheet with a bincode artifact per row keyed by row id.
#[derive(Clone)]
pub struct ArtifactStore {
    db: Arc<Database>,
}

impl ArtifactStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BakeError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Ok(ArtifactStore { db: Arc::new(db) })
    }

    pub fn from_database(db: Arc<Database>) -> Self {
        ArtifactStore { db }
    }

    fn rows_table(file_name: &str) -> String {
        format!("{ROWS_PREFIX}{file_name}")
    }

    pub fn manifest(&self) -> Result<Option<ContainerArtifact>, BakeError> {
        let tx = self.db.begin_read()?;
        let table = match tx.open_table(CONTAINER) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let manifest = match table.get(MANIFEST_KEY)? {
            Some(guard) => {
                let (manifest, _): (ContainerArtifact, usize) = bincode::serde::decode_from_slice(guard.value(), bincode::config::standard())?;
                Some(manifest)
            }
            None => None,
        };
        Ok(manifest)
    }

    /// Keys of every row artifact persisted for a sheet.
    pub fn row_keys(&self, file_name: &str) -> Result<BTreeSet<String>, BakeError> {
        let tx = self.db.begin_read()?;
        let name = Self::rows_table(file_name);
        let table = match tx.open_table(TableDefinition::<&str, &[u8]>::new(&name)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };
        let mut keys = BTreeSet::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            keys.insert(key.value().to_string());
        }
        Ok(keys)
    }

    pub fn row(&self, file_name: &str, key: &str) -> Result<Option<Vec<u8>>, BakeError> {
        let tx = self.db.begin_read()?;
        let name = Self::rows_table(file_name);
        let table = match tx.open_table(TableDefinition::<&str, &[u8]>::new(&name)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let bytes = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(bytes)
    }

    fn rows(&self, file_name: &str, keys: &[String]) -> Result<Vec<(String, Vec<u8>)>, BakeError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let tx = self.db.begin_read()?;
        let name = Self::rows_table(file_name);
        let table = tx.open_table(TableDefinition::<&str, &[u8]>::new(&name))?;
        let mut rows = Vec::with_capacity(keys.len());
        for key in keys {
            let guard = table.get(key.as_str())?.ok_or_else(|| BakeError::Corrupt(format!("`{name}` has no row `{key}`")))?;
            rows.push((key.clone(), guard.value().to_vec()));
        }
        Ok(rows)
    }

    /// Writes every table of `container` in one transaction. `plans` line up with the container's tables.
    /// Removed rows are deleted and row tables of sheets that are gone are dropped.
    pub(crate) fn save(&self, container: &Container, plans: &[SheetPlan]) -> Result<ContainerArtifact, BakeError> {
        if plans.len() != container.len() {
            return Err(BakeError::Corrupt(format!("{} save plans for {} sheets", plans.len(), container.len())));
        }
        let tx = self.db.begin_write()?;
        let mut sheets = Vec::with_capacity(plans.len());
        for (table, plan) in container.tables().zip(plans) {
            let rows = table.encode_rows()?;
            let name = Self::rows_table(&plan.file_name);
            {
                let mut persisted = tx.open_table(TableDefinition::<&str, &[u8]>::new(&name))?;
                for key in &plan.removed {
                    persisted.remove(key.as_str())?;
                }
                for (key, bytes) in &rows {
                    persisted.insert(key.as_str(), bytes.as_slice())?;
                }
            }
            debug!(sheet = table.name(), table = %name, rows = rows.len(), removed = plan.removed.len(), "sheet saved");
            sheets.push(SheetArtifact {
                name: table.name().to_string(),
                file_name: plan.file_name.clone(),
                record: table.schema().name.clone(),
                keys: rows.into_iter().map(|(key, _)| key).collect(),
            });
        }

        let live: HashSet<String> = sheets.iter().map(|sheet| Self::rows_table(&sheet.file_name)).collect();
        let obsolete: Vec<String> =
            tx.list_tables()?.map(|handle| handle.name().to_string()).filter(|name| name.starts_with(ROWS_PREFIX) && !live.contains(name)).collect();
        for name in &obsolete {
            tx.delete_table(TableDefinition::<&str, &[u8]>::new(name))?;
            info!(table = %name, "dropped artifacts of removed sheet");
        }

        let manifest = ContainerArtifact { naming: container.naming(), baked_at: Utc::now(), sheets };
        {
            let bytes = bincode::serde::encode_to_vec(&manifest, bincode::config::standard())?;
            let mut table = tx.open_table(CONTAINER)?;
            table.insert(MANIFEST_KEY, bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(manifest)
    }

    /// Rebuilds the container of the last bake. Sheets keep their persisted order so resolved row keys stay valid.
    pub fn load(&self, schema: &ContainerSchema) -> Result<Container, BakeError> {
        let Some(manifest) = self.manifest()? else {
            return Ok(Container::new(schema.naming_strategy()));
        };
        let mut container = Container::new(manifest.naming);
        for sheet in &manifest.sheets {
            let decl = schema.find(&sheet.name).ok_or_else(|| BakeError::Corrupt(format!("persisted sheet `{}` is not declared", sheet.name)))?;
            if decl.schema().name != sheet.record {
                return Err(BakeError::Corrupt(format!("sheet `{}` was baked with `{}` records, now declared with `{}`", sheet.name, sheet.record, decl.schema().name)));
            }
            let rows = self.rows(&sheet.file_name, &sheet.keys)?;
            container.insert((decl.restore)(&sheet.name, rows)?)?;
        }
        info!(sheets = container.len(), baked_at = %manifest.baked_at, "container loaded");
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use crate::Record;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
    #[record(table)]
    struct Quest {
        #[data(id)]
        id: u32,
        #[data]
        title: String,
    }

    fn random_store() -> ArtifactStore {
        let path = std::env::temp_dir().join("sheetbake").join(format!("artifacts_{}.redb", rand::random::<u64>()));
        ArtifactStore::open(path).unwrap()
    }

    fn quests(ids: &[u32]) -> Container {
        let mut container = Container::new(NamingStrategy::default());
        let rows = ids.iter().map(|&id| Quest { id, title: format!("quest {id}") });
        container.insert(Box::new(Table::from_rows("Quests", rows).unwrap())).unwrap();
        container
    }

    #[test]
    fn empty_store_has_no_manifest() {
        let store = random_store();
        assert_eq!(store.manifest().unwrap(), None);
        assert!(store.row_keys("Quests").unwrap().is_empty());
        assert_eq!(store.row("Quests", "1").unwrap(), None);
    }

    #[test]
    fn save_then_load_keeps_row_order() {
        let store = random_store();
        let plan = SheetPlan { file_name: "Quests".into(), removed: vec![] };
        let manifest = store.save(&quests(&[3, 1, 2]), &[plan]).unwrap();
        assert_eq!(manifest.sheets[0].keys, vec!["3", "1", "2"]);

        let schema = ContainerSchema::new().sheet::<Quest>("Quests");
        let loaded = store.load(&schema).unwrap();
        let ids: Vec<u32> = loaded.table::<Quest>("Quests").unwrap().rows().iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn removed_rows_and_sheets_are_deleted() {
        let store = random_store();
        store.save(&quests(&[1, 2]), &[SheetPlan { file_name: "Quests".into(), removed: vec![] }]).unwrap();
        store.save(&quests(&[1]), &[SheetPlan { file_name: "Quests".into(), removed: vec!["2".into()] }]).unwrap();
        assert_eq!(store.row_keys("Quests").unwrap().into_iter().collect::<Vec<_>>(), vec!["1".to_string()]);

        store.save(&Container::new(NamingStrategy::default()), &[]).unwrap();
        assert!(store.row_keys("Quests").unwrap().is_empty());
    }

    #[test]
    fn undeclared_sheets_fail_to_load() {
        let store = random_store();
        store.save(&quests(&[1]), &[SheetPlan { file_name: "Quests".into(), removed: vec![] }]).unwrap();
        assert!(matches!(store.load(&ContainerSchema::new()), Err(BakeError::Corrupt(_))));
    }
}
