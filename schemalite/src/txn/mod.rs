// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction-side catalog support

pub mod commit_timestamp;

pub use commit_timestamp::{
    has_pending_commit_timestamp_in_key, is_pending_commit_timestamp, maybe_set_commit_timestamp,
    maybe_set_commit_timestamp_in_key, maybe_set_commit_timestamp_sentinel,
    maybe_set_commit_timestamp_sentinel_in_key, validate_commit_timestamp_key_set_for_delete,
    validate_commit_timestamp_value_not_in_future,
    CommitTimestampTracker, COMMIT_TIMESTAMP_LITERAL,
};

use crate::catalog::ids::{ColumnId, TableId};
use crate::schema::types::Value;

/// Row written by an insert or update. `columns` and `values` are parallel.
#[derive(Debug, Clone, PartialEq)]
pub struct RowWrite {
    pub table: TableId,
    pub key: Vec<Value>,
    pub columns: Vec<ColumnId>,
    pub values: Vec<Value>,
}

/// One mutation computed for a committing transaction
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Insert(RowWrite),
    Update(RowWrite),
    Delete { table: TableId, key: Vec<Value> },
}

impl WriteOp {
    pub fn table(&self) -> TableId {
        match self {
            WriteOp::Insert(row) | WriteOp::Update(row) => row.table,
            WriteOp::Delete { table, .. } => *table,
        }
    }
}
