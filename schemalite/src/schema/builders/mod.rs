// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Builders and editors
//!
//! A builder owns one new node and is consumed by `build()`. An editor
//! borrows the pending copy of an existing node from a
//! [`SchemaGraphEditor`](crate::schema::graph::SchemaGraphEditor) and only
//! exposes the changes that are legal on a live object. Neither validates.

pub mod column_builder;
pub mod constraint_builder;
pub mod index_builder;
pub mod object_builder;
pub mod table_builder;

pub use column_builder::{ColumnBuilder, ColumnEditor, KeyColumnBuilder};
pub use constraint_builder::{CheckConstraintBuilder, ForeignKeyBuilder};
pub use index_builder::{IndexBuilder, IndexEditor};
pub use object_builder::{
    ChangeStreamBuilder, ChangeStreamEditor, LocalityGroupBuilder, LocalityGroupEditor,
    SequenceBuilder, SequenceEditor, UdfBuilder, UdfEditor,
};
pub use table_builder::{TableBuilder, TableEditor};
