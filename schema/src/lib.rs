//! sheetbake-schema compiles record declarations into a canonical field model and turns that model
//! into the members a record gains: accessors, the row-id extractor and the runtime schema tables.
//!
//! The crate is pure: [`decl`] reads a `syn` struct into a [`RecordDecl`], [`extract`] classifies every
//! data member into a [`FieldDescriptor`], [`generate`] maps a [`RecordSchema`] to [`GeneratedMembers`]
//! and [`emit`] renders those into tokens. Only the last step knows about the runtime crate.
//!

pub mod classify;
pub mod decl;
pub mod emit;
pub mod error;
pub mod extract;
pub mod generate;
pub mod model;
pub mod naming;
pub mod shape;

pub use classify::{classify, element_shapes, semantic_type};
pub use error::SchemaError;
pub use extract::extract;
pub use generate::{generate, AccessorSpec, GeneratedMembers, IdExtractorSpec, Marshaling};
pub use model::*;
pub use naming::NamingStrategy;
pub use shape::TypeShape;
