use crate::cell::Cell;
use crate::error::CellError;
use crate::id::{RowId, RowKey};
use crate::value::{SheetRefValue, Value};
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Reference by id to a row of the sheet holding `T` records. Unresolved until baked.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SheetRef<T> {
    key: String,
    resolved: Option<RowKey>,
    #[serde(skip)]
    target: PhantomData<fn() -> T>,
}

impl<T> SheetRef<T> {
    pub fn new(id: impl RowId) -> Self {
        Self::from_key(&id.to_key())
    }

    pub fn from_key(key: &str) -> Self {
        SheetRef { key: key.trim().to_string(), resolved: None, target: PhantomData }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// Row the reference points at, set once a bake linked it.
    pub fn resolved(&self) -> Option<RowKey> {
        self.resolved
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl<T> Clone for SheetRef<T> {
    fn clone(&self) -> Self {
        SheetRef { key: self.key.clone(), resolved: self.resolved, target: PhantomData }
    }
}

impl<T> Default for SheetRef<T> {
    fn default() -> Self {
        SheetRef { key: String::new(), resolved: None, target: PhantomData }
    }
}

impl<T> PartialEq for SheetRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.resolved == other.resolved
    }
}

impl<T> Eq for SheetRef<T> {}

impl<T> Hash for SheetRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.resolved.hash(state);
    }
}

impl<T> fmt::Debug for SheetRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetRef").field("target", &short_type_name::<T>()).field("key", &self.key).field("resolved", &self.resolved).finish()
    }
}

impl<T: 'static> Cell for SheetRef<T> {
    fn to_value(&self) -> Value {
        Value::SheetRef(SheetRefValue { target: TypeId::of::<T>(), target_name: short_type_name::<T>(), key: self.key.clone(), resolved: self.resolved })
    }

    fn from_value(value: Value) -> Result<Self, CellError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::SheetRef(r) if r.target == TypeId::of::<T>() => Ok(SheetRef { key: r.key, resolved: r.resolved, target: PhantomData }),
            Value::SheetRef(r) => Err(CellError::Mismatch { expected: format!("reference to {}", short_type_name::<T>()), found: format!("reference to {}", r.target_name) }),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => match value.as_key() {
                Some(key) => Ok(Self::from_key(&key)),
                None => Err(CellError::mismatch("row id", &value)),
            },
            other => Err(CellError::mismatch("row id", &other)),
        }
    }
}

/// Resolved location of an external asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle {
    pub path: String,
    pub sub_name: Option<String>,
    pub location: String,
}

/// Reference to an external asset by path, optionally to a named item inside it (`path[sub]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    path: String,
    sub_name: Option<String>,
    resolved: Option<AssetHandle>,
}

impl AssetRef {
    pub fn new(path: &str, sub_name: Option<&str>) -> Self {
        AssetRef { path: path.trim().to_string(), sub_name: sub_name.map(|s| s.trim().to_string()), resolved: None }
    }

    /// Reads `path` or `path[sub]`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_suffix(']').and_then(|rest| rest.rsplit_once('[')) {
            Some((path, sub)) if !sub.trim().is_empty() => Self::new(path, Some(sub)),
            _ => Self::new(raw, None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn sub_name(&self) -> Option<&str> {
        self.sub_name.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn handle(&self) -> Option<&AssetHandle> {
        self.resolved.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub(crate) fn set_handle(&mut self, handle: Option<AssetHandle>) {
        self.resolved = handle;
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_name {
            Some(sub) => write!(f, "{}[{}]", self.path, sub),
            None => f.write_str(&self.path),
        }
    }
}

impl Cell for AssetRef {
    fn to_value(&self) -> Value {
        Value::AssetRef(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CellError> {
        match value {
            Value::Null => Ok(AssetRef::default()),
            Value::AssetRef(asset) => Ok(asset),
            Value::Str(raw) => Ok(AssetRef::parse(&raw)),
            other => Err(CellError::mismatch("asset path", &other)),
        }
    }
}
