use crate::cell::Cell;
use crate::error::CellError;
use crate::id::RowKey;
use crate::reference::AssetRef;
use sheetbake_schema::NamingStrategy;
use std::any::TypeId;
use std::collections::BTreeMap;

/// Dynamic cell value, the common currency between sheet sources, records and the reference resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Record(RawRow),
    SheetRef(SheetRefValue),
    AssetRef(AssetRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRefValue {
    pub target: TypeId,
    pub target_name: &'static str,
    pub key: String,
    pub resolved: Option<RowKey>,
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::SheetRef(_) => "sheet reference",
            Value::AssetRef(_) => "asset reference",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical string form of a scalar, as used for row id keys.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Some((*f as i64).to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) => Some(s.trim().to_string()),
            Value::SheetRef(r) => Some(r.key.clone()),
            _ => None,
        }
    }

    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Int(i),
                // wider than i64, kept exact the way integer cells write it
                (None, Some(u)) => Value::Str(u.to_string()),
                (None, None) => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            serde_json::Value::Object(fields) => Value::Record(fields.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<RawRow> for Value {
    fn from(value: RawRow) -> Self {
        Value::Record(value)
    }
}

/// One raw row: cells keyed by wire name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: BTreeMap<String, Value>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: String, value: Value) -> Option<Value> {
        self.cells.insert(name, value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.cells.remove(name)
    }

    /// Converts the named cell; a missing cell converts from `Null`.
    pub fn cell<T: Cell>(&self, name: &str) -> Result<T, CellError> {
        self.cell_named(name, NamingStrategy::default())
    }

    /// [`RawRow::cell`] for members that may hold nested records keyed by `naming`.
    pub fn cell_named<T: Cell>(&self, name: &str, naming: NamingStrategy) -> Result<T, CellError> {
        T::from_value_named(self.cells.get(name).cloned().unwrap_or(Value::Null), naming)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.cells.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.cells.values_mut()
    }

    /// Builds a row from a JSON object, anything else is rejected.
    pub fn from_json(json: serde_json::Value) -> Result<RawRow, CellError> {
        match Value::from_json(json) {
            Value::Record(row) => Ok(row),
            other => Err(CellError::mismatch("object", &other)),
        }
    }
}

impl IntoIterator for RawRow {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl FromIterator<(String, Value)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        RawRow { cells: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_json_objects() {
        let row = RawRow::from_json(json!({"Id": 1, "Name": "Arthas", "Speed": 1.5, "Tags": ["a", "b"], "Stats": {"Hp": 10}})).unwrap();
        assert_eq!(row.get("Id"), Some(&Value::Int(1)));
        assert_eq!(row.get("Speed"), Some(&Value::Float(1.5)));
        assert_eq!(row.get("Tags"), Some(&Value::List(vec!["a".into(), "b".into()])));
        assert!(matches!(row.get("Stats"), Some(Value::Record(stats)) if stats.get("Hp") == Some(&Value::Int(10))));
        assert!(RawRow::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn large_unsigned_json_numbers_stay_exact() {
        let row = RawRow::from_json(json!({"Seed": u64::MAX})).unwrap();
        assert_eq!(row.get("Seed"), Some(&Value::Str(u64::MAX.to_string())));
        assert_eq!(row.cell::<u64>("Seed"), Ok(u64::MAX));
    }

    #[test]
    fn keys_are_canonical() {
        assert_eq!(Value::Int(7).as_key().as_deref(), Some("7"));
        assert_eq!(Value::Float(7.0).as_key().as_deref(), Some("7"));
        assert_eq!(Value::from(" hero_1 ").as_key().as_deref(), Some("hero_1"));
        assert_eq!(Value::List(vec![]).as_key(), None);
    }

    #[test]
    fn missing_cells_read_as_null() {
        let row = RawRow::new().with("Hp", 3);
        assert_eq!(row.cell::<u32>("Hp"), Ok(3));
        assert_eq!(row.cell::<u32>("Mp"), Ok(0));
        assert_eq!(row.cell::<Option<String>>("Name"), Ok(None));
    }
}
