use crate::assets::AssetResolver;
use crate::container::Container;
use crate::error::ReferenceError;
use crate::id::RowKey;
use crate::value::Value;
use std::any::TypeId;
use std::collections::HashMap;
use tracing::warn;

/// Every row of a container by record type and id key. Built once all sheets are written.
#[derive(Debug, Default)]
pub struct RowIndex {
    by_type: HashMap<TypeId, Vec<HashMap<String, RowKey>>>,
    rows: usize,
}

impl RowIndex {
    pub fn build(container: &Container) -> Self {
        let mut index = RowIndex::default();
        for (ordinal, table) in container.tables().enumerate() {
            let mut keys = HashMap::with_capacity(table.len());
            for (row, key) in table.keys().into_iter().enumerate() {
                if let Some(row_key) = RowKey::new(ordinal as u16, row as u64) {
                    keys.insert(key, row_key);
                }
            }
            index.rows += keys.len();
            index.by_type.entry(table.record_type()).or_default().push(keys);
        }
        index
    }

    /// First declared sheet of the target type holding `key` wins.
    pub fn lookup(&self, target: TypeId, key: &str) -> Option<RowKey> {
        self.by_type.get(&target)?.iter().find_map(|sheet| sheet.get(key).copied())
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Where a reference was found, for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct LinkSite<'a> {
    pub sheet: &'a str,
    pub row: &'a str,
    pub path: &'a str,
    pub indexes: &'a [usize],
}

pub struct Linker<'a> {
    index: &'a RowIndex,
    assets: &'a dyn AssetResolver,
}

impl<'a> Linker<'a> {
    pub fn new(index: &'a RowIndex, assets: &'a dyn AssetResolver) -> Self {
        Linker { index, assets }
    }

    /// Resolves every sheet and asset reference inside `value`. Failures are pushed to `errors` and the
    /// reference is left unresolved. Returns whether anything changed.
    pub fn link(&self, value: &mut Value, site: &LinkSite<'_>, errors: &mut Vec<ReferenceError>) -> bool {
        match value {
            Value::SheetRef(reference) => {
                if reference.key.is_empty() {
                    let changed = reference.resolved.is_some();
                    reference.resolved = None;
                    return changed;
                }
                let found = self.index.lookup(reference.target, &reference.key);
                if found.is_none() {
                    warn!(sheet = site.sheet, row = site.row, path = site.path, indexes = ?site.indexes, target = reference.target_name, key = %reference.key, "sheet reference not found");
                    errors.push(ReferenceError::NotFound {
                        sheet: site.sheet.to_string(),
                        row: site.row.to_string(),
                        path: site.path.to_string(),
                        indexes: site.indexes.to_vec(),
                        target: reference.target_name.to_string(),
                        key: reference.key.clone(),
                    });
                }
                let changed = reference.resolved != found;
                reference.resolved = found;
                changed
            }
            Value::AssetRef(asset) => {
                if asset.is_empty() {
                    return false;
                }
                let handle = self.assets.resolve(asset.path(), asset.sub_name());
                if handle.is_none() {
                    warn!(sheet = site.sheet, row = site.row, path = site.path, indexes = ?site.indexes, asset = %asset, "asset not found");
                    errors.push(ReferenceError::AssetMissing {
                        sheet: site.sheet.to_string(),
                        row: site.row.to_string(),
                        path: site.path.to_string(),
                        indexes: site.indexes.to_vec(),
                        asset: asset.to_string(),
                    });
                }
                let changed = asset.handle() != handle.as_ref();
                asset.set_handle(handle);
                changed
            }
            Value::List(items) => items.iter_mut().fold(false, |changed, item| self.link(item, site, errors) | changed),
            Value::Map(entries) => entries.iter_mut().fold(false, |changed, (key, item)| {
                let key_changed = self.link(key, site, errors);
                self.link(item, site, errors) | key_changed | changed
            }),
            Value::Record(raw) => raw.values_mut().fold(false, |changed, item| self.link(item, site, errors) | changed),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::reference::{AssetRef, SheetRef};
    use crate::Cell;

    struct Item;

    fn site() -> LinkSite<'static> {
        LinkSite { sheet: "Heroes", row: "1", path: "Weapon", indexes: &[] }
    }

    fn index_with(key: &str) -> RowIndex {
        let mut index = RowIndex::default();
        let mut keys = HashMap::new();
        keys.insert(key.to_string(), RowKey::new(2, 0).unwrap());
        index.by_type.insert(TypeId::of::<Item>(), vec![keys]);
        index.rows = 1;
        index
    }

    #[test]
    fn resolves_nested_references() {
        let index = index_with("sword");
        let assets = MemoryAssets::new().with("icons.png", &["sword"]);
        let linker = Linker::new(&index, &assets);
        let mut value = Value::List(vec![SheetRef::<Item>::from_key("sword").to_value(), AssetRef::parse("icons.png[sword]").to_value()]);
        let mut errors = Vec::new();
        assert!(linker.link(&mut value, &site(), &mut errors));
        assert!(errors.is_empty());
        let Value::List(items) = value else { panic!("list expected") };
        assert_eq!(SheetRef::<Item>::from_value(items[0].clone()).unwrap().resolved(), RowKey::new(2, 0));
        assert!(AssetRef::from_value(items[1].clone()).unwrap().is_resolved());
    }

    #[test]
    fn missing_targets_are_reported_and_left_unresolved() {
        let index = index_with("sword");
        let linker = Linker::new(&index, &crate::assets::NoAssets);
        let mut value = SheetRef::<Item>::from_key("bow").to_value();
        let mut errors = Vec::new();
        assert!(!linker.link(&mut value, &site(), &mut errors));
        assert!(matches!(&errors[..], [ReferenceError::NotFound { key, target, .. }] if key == "bow" && target == "Item"));

        let mut asset = AssetRef::parse("missing.png").to_value();
        linker.link(&mut asset, &site(), &mut errors);
        assert!(matches!(errors.last(), Some(ReferenceError::AssetMissing { asset, .. }) if asset == "missing.png"));
    }

    #[test]
    fn empty_references_are_skipped() {
        let index = RowIndex::default();
        let linker = Linker::new(&index, &crate::assets::NoAssets);
        let mut errors = Vec::new();
        let mut value = SheetRef::<Item>::default().to_value();
        assert!(!linker.link(&mut value, &site(), &mut errors));
        assert!(errors.is_empty());
    }
}
