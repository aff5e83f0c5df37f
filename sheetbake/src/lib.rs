//! sheetbake turns tabular game data into typed, cross-referenced tables.
//!
//! Records are plain structs with `#[derive(Record)]`. The derive compiles each struct into a static
//! [`RecordSchema`](schema::RecordSchema), accessors and a row id extractor. A [`Baker`] reads raw rows per
//! sheet, converts them into [`Table`]s, resolves [`SheetRef`] and [`AssetRef`] fields through the
//! [`PropertyNode`] tree and persists everything into [redb](https://github.com/cberner/redb) using `bincode`.
//! At runtime a [`DataStore`] loads the baked [`Container`] and serves rows by id without copying.
//!

extern crate self as sheetbake;

pub mod assets;
pub mod bake;
pub mod cell;
pub mod collections;
pub mod config;
pub mod container;
pub mod error;
pub mod id;
pub mod property;
pub mod record;
pub mod reference;
pub mod sheet_name;
pub mod source;
pub mod store;
pub mod table;
pub mod value;

pub use assets::{AssetResolver, DirectoryAssets, MemoryAssets, NoAssets};
pub use bake::artifacts::{ArtifactStore, ContainerArtifact, SheetArtifact};
pub use bake::report::{BakeReport, RowIssue, SheetReport};
pub use bake::{BakeOutput, BakePhase, Baker, CancelToken};
pub use cell::{Cell, Converter};
pub use chrono;
pub use collections::Stack;
pub use config::{BakeConfig, BakeSettings};
pub use container::{Container, ContainerSchema, SheetDecl};
pub use error::{AccessError, BakeError, CellError, ReferenceError, RuntimeError, SourceError};
pub use id::{RowId, RowKey};
pub use inventory;
pub use property::PropertyNode;
pub use record::{registered_records, Record, RecordInfo, TableRecord};
pub use redb;
pub use reference::{AssetHandle, AssetRef, SheetRef};
pub use serde;
pub use sheetbake_macros::Record;
pub use sheetbake_schema as schema;
pub use sheetbake_schema::NamingStrategy;
pub use source::{JsonDirSource, MemorySource, SheetSource};
pub use store::{DataStore, DataTableAsset, MutableDataTable, RowHandle};
pub use table::{ErasedTable, Table};
pub use value::{RawRow, Value};
