use crate::value::Value;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },

    #[error("cannot parse `{input}` as {expected}")]
    Parse { input: String, expected: String },

    #[error("{value} is out of range for {expected}")]
    OutOfRange { value: String, expected: String },

    #[error("{field}: {source}")]
    Field { field: String, source: Box<CellError> },

    #[error("{0}")]
    Custom(String),
}

impl CellError {
    pub fn mismatch(expected: &str, found: &Value) -> Self {
        CellError::Mismatch { expected: expected.to_string(), found: found.kind().to_string() }
    }

    pub fn parse(input: &str, expected: &str) -> Self {
        CellError::Parse { input: input.to_string(), expected: expected.to_string() }
    }

    pub fn custom(message: impl Display) -> Self {
        CellError::Custom(message.to_string())
    }

    /// Prefixes the error with the member it happened in.
    pub fn at(self, field: &str) -> Self {
        CellError::Field { field: field.to_string(), source: Box::new(self) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("`{path}` needs {expected} indexes, got {found}")]
    IndexDepth { path: String, expected: usize, found: usize },

    #[error("`{path}` has no element {index}, it holds {len}")]
    OutOfRange { path: String, index: usize, len: usize },

    #[error("`{path}` is not a collection")]
    NotACollection { path: String },

    #[error("`{path}` is not a leaf")]
    NotALeaf { path: String },

    #[error("`{path}`: {source}")]
    Cell { path: String, source: CellError },
}

impl AccessError {
    /// The same error reported against `path`, used when a node is re-rooted under a parent.
    pub fn with_path(self, path: &str) -> Self {
        let path = path.to_string();
        match self {
            AccessError::IndexDepth { expected, found, .. } => AccessError::IndexDepth { path, expected, found },
            AccessError::OutOfRange { index, len, .. } => AccessError::OutOfRange { path, index, len },
            AccessError::NotACollection { .. } => AccessError::NotACollection { path },
            AccessError::NotALeaf { .. } => AccessError::NotALeaf { path },
            AccessError::Cell { source, .. } => AccessError::Cell { path, source },
        }
    }
}

/// Per-field link failures. Logged and kept in the bake report, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("sheet `{sheet}` row `{row}` field `{path}` at {indexes:?}: no `{target}` row with id `{key}`")]
    NotFound { sheet: String, row: String, path: String, indexes: Vec<usize>, target: String, key: String },

    #[error("sheet `{sheet}` row `{row}` field `{path}` at {indexes:?}: asset `{asset}` is missing")]
    AssetMissing { sheet: String, row: String, path: String, indexes: Vec<usize>, asset: String },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("sheet `{sheet}` is unreadable: {reason}")]
    Unreadable { sheet: String, reason: String },

    #[error("serde error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal to a whole bake. Nothing is committed when one of these is returned before `Save`.
#[derive(Debug, Error)]
pub enum BakeError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("invalid sheet name `{0}`")]
    InvalidSheetName(String),

    #[error("sheet `{0}` is declared twice")]
    DuplicateSheet(String),

    #[error("artifact store is inconsistent: {0}")]
    Corrupt(String),

    #[error("container capacity exceeded: {0}")]
    Capacity(String),

    #[error("bake cancelled before save")]
    Cancelled,

    #[error("bake task failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("sheet `{sheet}` has two rows with id `{id}`")]
    DuplicateId { sheet: String, id: String },

    #[error("row handle is invalid")]
    InvalidHandle,

    #[error("sheet `{sheet}` has no row with id `{id}`")]
    NotFound { sheet: String, id: String },

    #[error("container has no sheet `{0}`")]
    SheetMissing(String),

    #[error("sheet `{sheet}` holds `{found}` records, not `{expected}`")]
    TypeMismatch { sheet: String, expected: String, found: String },

    #[error("sheet `{0}` holds records that are not mutable")]
    Immutable(String),

    #[error("data store is not initialized")]
    NotInitialized,

    #[error("row id `{found}` does not match the id `{expected}` it is stored under")]
    IdMismatch { expected: String, found: String },
}
