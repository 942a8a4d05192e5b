// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Schema management: the versioned object graph, its builders and editors,
//! per-object validation and the DDL batch that ties them together.

pub mod builders;
pub mod catalog;
pub mod graph;
pub mod operations;
pub mod types;
pub mod updater;
pub mod validators;

pub use graph::{Handle, NodeKind, NodeRef, SchemaGraph, SchemaGraphEditor, View};
pub use types::{ColumnType, Value};
pub use updater::{BatchState, SchemaStatement, SchemaUpdater};
