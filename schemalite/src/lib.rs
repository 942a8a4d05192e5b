// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! # Schemalite
//!
//! Versioned schema catalog for a database emulator.
//!
//! A schema is an immutable [`SchemaGraph`]: tables, columns, indexes,
//! constraints, change streams, locality groups, sequences and functions
//! linked by typed handles. DDL never edits a published graph. A batch of
//! [`SchemaStatement`]s is applied through a [`SchemaGraphEditor`], which
//! clones everything the change touches into a candidate graph; the
//! candidate is validated node by node and either replaces the published
//! graph or is discarded whole.
//!
//! ```ignore
//! use schemalite::{CatalogConfig, CatalogManager};
//! use schemalite::schema::operations::{ColumnDefinition, CreateTable, KeyPart};
//! use schemalite::schema::types::ColumnType;
//!
//! let catalog = CatalogManager::new(CatalogConfig::default());
//! let create = CreateTable::new("Singers")
//!     .column(ColumnDefinition::new("SingerId", ColumnType::Int64).not_null())
//!     .column(ColumnDefinition::new("Name", ColumnType::String))
//!     .primary_key(vec![KeyPart::asc("SingerId")]);
//! let schema = catalog.apply(&create)?;
//! assert!(schema.find_table("singers").is_some());
//! ```

pub mod catalog;
pub mod query;
pub mod schema;
pub mod txn;

pub use catalog::{CatalogConfig, CatalogError, CatalogManager, CatalogResult, ErrorKind, SchemaLimits};
pub use query::{QueryCatalogAccess, StatementDependencies};
pub use schema::{
    BatchState, ColumnType, Handle, NodeKind, NodeRef, SchemaGraph, SchemaGraphEditor, SchemaStatement,
    SchemaUpdater, Value, View,
};
pub use txn::{CommitTimestampTracker, RowWrite, WriteOp};

/// Initialise `env_logger` from `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init();
}
