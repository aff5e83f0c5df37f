use crate::error::SourceError;
use crate::sheet_name;
use crate::value::RawRow;
use std::collections::HashMap;
use std::path::PathBuf;

/// Supplies raw rows per sheet. `Ok(None)` means the source has no such sheet.
pub trait SheetSource: Send + Sync {
    fn read(&self, sheet: &str) -> Result<Option<Vec<RawRow>>, SourceError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: HashMap<String, Vec<RawRow>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sheet: &str, rows: Vec<RawRow>) -> Self {
        self.insert(sheet, rows);
        self
    }

    pub fn insert(&mut self, sheet: &str, rows: Vec<RawRow>) -> Option<Vec<RawRow>> {
        self.sheets.insert(sheet.to_string(), rows)
    }

    pub fn remove(&mut self, sheet: &str) -> Option<Vec<RawRow>> {
        self.sheets.remove(sheet)
    }

    pub fn rows_mut(&mut self, sheet: &str) -> Option<&mut Vec<RawRow>> {
        self.sheets.get_mut(sheet)
    }

    /// Reads `{"Sheet": [{..row..}, ..], ..}`.
    pub fn from_json(json: serde_json::Value) -> Result<Self, SourceError> {
        let serde_json::Value::Object(sheets) = json else {
            return Err(SourceError::Unreadable { sheet: String::new(), reason: "expected an object of sheets".to_string() });
        };
        let mut source = MemorySource::new();
        for (sheet, rows) in sheets {
            let rows = json_rows(&sheet, rows)?;
            source.insert(&sheet, rows);
        }
        Ok(source)
    }
}

impl SheetSource for MemorySource {
    fn read(&self, sheet: &str) -> Result<Option<Vec<RawRow>>, SourceError> {
        Ok(self.sheets.get(sheet).cloned())
    }
}

fn json_rows(sheet: &str, json: serde_json::Value) -> Result<Vec<RawRow>, SourceError> {
    let serde_json::Value::Array(items) = json else {
        return Err(SourceError::Unreadable { sheet: sheet.to_string(), reason: "expected an array of rows".to_string() });
    };
    items
        .into_iter()
        .map(|item| RawRow::from_json(item).map_err(|e| SourceError::Unreadable { sheet: sheet.to_string(), reason: e.to_string() }))
        .collect()
}

/// One `<file name>.json` array of row objects per sheet under a directory.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonDirSource { root: root.into() }
    }

    pub fn path_of(&self, sheet: &str) -> Option<PathBuf> {
        sheet_name::file_name(sheet, None).map(|file| self.root.join(format!("{file}.json")))
    }
}

impl SheetSource for JsonDirSource {
    fn read(&self, sheet: &str) -> Result<Option<Vec<RawRow>>, SourceError> {
        let Some(path) = self.path_of(sheet) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        let json: serde_json::Value = serde_json::from_str(&text)?;
        json_rows(sheet, json).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn memory_source_reads_json_sheets() {
        let source = MemorySource::from_json(json!({"Heroes": [{"Id": 1}, {"Id": 2}], "Items": []})).unwrap();
        assert_eq!(source.read("Heroes").unwrap().map(|rows| rows.len()), Some(2));
        assert_eq!(source.read("Items").unwrap().map(|rows| rows.len()), Some(0));
        assert!(source.read("Quests").unwrap().is_none());
        assert!(MemorySource::from_json(json!({"Heroes": {"Id": 1}})).is_err());
    }

    #[test]
    fn directory_source_maps_sheet_names_to_files() {
        let root = std::env::temp_dir().join("sheetbake").join(format!("sheets_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("Heroes.json"), r#"[{"Id": 1, "Name": "Arthas"}]"#).unwrap();
        std::fs::write(root.join("$Notes.json"), r#"[]"#).unwrap();
        std::fs::write(root.join("Broken.json"), r#"{"Id": 1}"#).unwrap();
        let source = JsonDirSource::new(&root);

        let heroes = source.read("Heroes").unwrap().unwrap();
        assert_eq!(heroes[0].get("Name"), Some(&Value::from("Arthas")));
        assert_eq!(source.read("<Notes>").unwrap(), Some(vec![]));
        assert!(source.read("Items").unwrap().is_none());
        assert!(source.read("Broken").is_err());
        std::fs::remove_dir_all(root).unwrap();
    }
}
