// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog object variants
//!
//! Each module defines one node type, how it rewrites its handles when a
//! graph version is cloned, and the read-only navigation available on a
//! [`View`](crate::schema::graph::View) of it.

pub mod change_stream;
pub mod check_constraint;
pub mod column;
pub mod foreign_key;
pub mod index;
pub mod locality_group;
pub mod sequence;
pub mod table;
pub mod udf;

pub use change_stream::ChangeStream;
pub use check_constraint::CheckConstraint;
pub use column::{Column, KeyColumn};
pub use foreign_key::{ForeignKey, ReferentialAction};
pub use index::{Index, IndexKind};
pub use locality_group::{LocalityGroup, StorageKind, DEFAULT_LOCALITY_GROUP};
pub use sequence::{Sequence, SequenceKind};
pub use table::{OnDeleteAction, RowDeletionPolicy, Table};
pub use udf::Udf;
