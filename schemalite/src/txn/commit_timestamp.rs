// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pending commit timestamps
//!
//! A write may ask for the commit timestamp of its own transaction. Until
//! that transaction commits the value is the [`Value::PendingCommitTimestamp`]
//! sentinel, and reads from the same transaction that would observe it must
//! be refused. [`CommitTimestampTracker`] remembers which tables and columns
//! hold sentinels.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::Mutex;

use super::{RowWrite, WriteOp};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::ids::{ColumnId, TableId};
use crate::schema::catalog::{Column, KeyColumn, Table};
use crate::schema::graph::{SchemaGraph, View};
use crate::schema::types::Value;

/// Literal a client writes to request the commit timestamp
pub const COMMIT_TIMESTAMP_LITERAL: &str = "spanner.commit_timestamp()";

/// True when `value` is a sentinel written to a column that allows one
pub fn is_pending_commit_timestamp(column: &Column, value: &Value) -> bool {
    column.allows_commit_timestamp() && matches!(value, Value::PendingCommitTimestamp)
}

/// True when any key part of `key` is a pending commit timestamp
pub fn has_pending_commit_timestamp_in_key(table: View<'_, Table>, key: &[Value]) -> bool {
    table
        .primary_key()
        .iter()
        .zip(key)
        .any(|(part, value)| {
            part.column()
                .map(|column| is_pending_commit_timestamp(&column, value))
                .unwrap_or(false)
        })
}

fn requests_commit_timestamp(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.eq_ignore_ascii_case(COMMIT_TIMESTAMP_LITERAL))
}

fn sentinel_for(column: &Column, value: &Value) -> CatalogResult<Value> {
    if !requests_commit_timestamp(value) {
        return Ok(value.clone());
    }
    if !column.allows_commit_timestamp() {
        return Err(CatalogError::Policy(format!(
            "Cannot write commit timestamp because the allow_commit_timestamp column option \
             is not set to true for column {}",
            column.name()
        )));
    }
    Ok(Value::PendingCommitTimestamp)
}

/// Replace commit timestamp requests in `row` with the sentinel. `columns`
/// and `row` are parallel.
pub fn maybe_set_commit_timestamp_sentinel(
    columns: &[View<'_, Column>],
    row: &[Value],
) -> CatalogResult<Vec<Value>> {
    columns
        .iter()
        .zip(row)
        .map(|(column, value)| sentinel_for(column, value))
        .collect()
}

/// Key variant of [`maybe_set_commit_timestamp_sentinel`]
pub fn maybe_set_commit_timestamp_sentinel_in_key(
    primary_key: &[View<'_, KeyColumn>],
    key: &[Value],
) -> CatalogResult<Vec<Value>> {
    let mut resolved = Vec::with_capacity(key.len());
    for (index, value) in key.iter().enumerate() {
        match primary_key.get(index).and_then(|part| part.column()) {
            Some(column) => resolved.push(sentinel_for(&column, value)?),
            None => resolved.push(value.clone()),
        }
    }
    Ok(resolved)
}

/// Swap a sentinel for the transaction's commit timestamp
pub fn maybe_set_commit_timestamp(column: &Column, value: &Value, commit_timestamp: DateTime<Utc>) -> Value {
    if is_pending_commit_timestamp(column, value) {
        Value::Timestamp(commit_timestamp)
    } else {
        value.clone()
    }
}

/// Key variant of [`maybe_set_commit_timestamp`]
pub fn maybe_set_commit_timestamp_in_key(
    primary_key: &[View<'_, KeyColumn>],
    key: &[Value],
    commit_timestamp: DateTime<Utc>,
) -> Vec<Value> {
    key.iter()
        .enumerate()
        .map(|(index, value)| match primary_key.get(index).and_then(|part| part.column()) {
            Some(column) => maybe_set_commit_timestamp(&column, value, commit_timestamp),
            None => value.clone(),
        })
        .collect()
}

/// A client-supplied timestamp for a commit timestamp column may not be
/// later than `now`
pub fn validate_commit_timestamp_value_not_in_future(value: &Value, now: DateTime<Utc>) -> CatalogResult<()> {
    match value {
        Value::Timestamp(ts) if *ts > now => Err(CatalogError::Policy(format!(
            "Cannot write timestamps in the future {} for commit timestamp column, \
             the current time is {}",
            ts.to_rfc3339(),
            now.to_rfc3339()
        ))),
        _ => Ok(()),
    }
}

/// Keys named by a delete may not carry a commit timestamp request or a
/// pending sentinel, and timestamps in commit timestamp key columns may not
/// be later than `now`
pub fn validate_commit_timestamp_key_set_for_delete(
    table: View<'_, Table>,
    keys: &[Vec<Value>],
    now: DateTime<Utc>,
) -> CatalogResult<()> {
    let primary_key = table.primary_key();
    for key in keys {
        for (part, value) in primary_key.iter().zip(key) {
            let Some(column) = part.column() else {
                continue;
            };
            if !column.allows_commit_timestamp() {
                continue;
            }
            if requests_commit_timestamp(value) || matches!(value, Value::PendingCommitTimestamp) {
                return Err(CatalogError::Policy(format!(
                    "Cannot delete a key with a pending commit timestamp in column {} of table {}",
                    column.name(),
                    table.name()
                )));
            }
            validate_commit_timestamp_value_not_in_future(value, now)?;
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct PendingSets {
    /// Tables with a sentinel in some key, plus the data tables of their indexes
    tables: HashSet<TableId>,
    /// Non-key columns with a sentinel in some value
    columns: HashSet<ColumnId>,
}

/// Tables and columns holding unresolved commit timestamps
///
/// Tracking is cumulative for the lifetime of the tracker; a transaction
/// owns one and drops it on commit or rollback.
#[derive(Debug, Default)]
pub struct CommitTimestampTracker {
    pending: Mutex<PendingSets>,
}

impl CommitTimestampTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record sentinels in `writes`. Objects are resolved in `graph`; writes
    /// against objects it does not know are ignored.
    pub fn track(&self, graph: &SchemaGraph, writes: &[WriteOp]) {
        let mut touched = PendingSets::default();
        for write in writes {
            match write {
                WriteOp::Insert(row) | WriteOp::Update(row) => {
                    Self::track_table(&mut touched, graph, row.table, &row.key);
                    Self::track_columns(&mut touched, graph, row);
                }
                WriteOp::Delete { table, key } => {
                    Self::track_table(&mut touched, graph, *table, key);
                }
            }
        }
        if touched.tables.is_empty() && touched.columns.is_empty() {
            return;
        }
        let mut pending = self.pending.lock();
        pending.tables.extend(touched.tables);
        pending.columns.extend(touched.columns);
    }

    fn track_table(touched: &mut PendingSets, graph: &SchemaGraph, table: TableId, key: &[Value]) {
        let Some(table) = graph.table_by_id(table) else {
            return;
        };
        if !has_pending_commit_timestamp_in_key(table, key) {
            return;
        }
        touched.tables.insert(table.id());
        for index in table.indexes() {
            if let Some(data) = index.index_data_table() {
                touched.tables.insert(data.id());
            }
        }
        debug!("Table {} has a pending commit timestamp in its key", table.name());
    }

    fn track_columns(touched: &mut PendingSets, graph: &SchemaGraph, row: &RowWrite) {
        for (id, value) in row.columns.iter().zip(&row.values) {
            if let Some(column) = graph.column_by_id(*id) {
                if is_pending_commit_timestamp(&column, value) {
                    touched.columns.insert(column.id());
                }
            }
        }
    }

    /// Refuse a read of `columns` from `table` if it would see a sentinel
    pub fn check_read(&self, table: View<'_, Table>, columns: &[View<'_, Column>]) -> CatalogResult<()> {
        let pending = self.pending.lock();
        if pending.tables.contains(&table.id()) {
            return Err(CatalogError::PendingCommitTimestamp(format!(
                "{} cannot be read after a commit timestamp was written to its key \
                 in the same transaction",
                table.owning_object_name()
            )));
        }
        if let Some(column) = columns.iter().find(|c| pending.columns.contains(&c.id())) {
            return Err(CatalogError::PendingCommitTimestamp(format!(
                "Column {} cannot be read after a commit timestamp was written to it \
                 in the same transaction",
                column.full_name()
            )));
        }
        Ok(())
    }

    /// True once nothing pending has been tracked
    pub fn is_empty(&self) -> bool {
        let pending = self.pending.lock();
        pending.tables.is_empty() && pending.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_future_timestamps_are_rejected() {
        let now = Utc::now();
        assert!(validate_commit_timestamp_value_not_in_future(&Value::Timestamp(now), now).is_ok());
        assert!(validate_commit_timestamp_value_not_in_future(&Value::Null, now).is_ok());
        let later = now + Duration::seconds(5);
        let err = validate_commit_timestamp_value_not_in_future(&Value::Timestamp(later), now).unwrap_err();
        assert!(matches!(err, CatalogError::Policy(_)));
    }

    #[test]
    fn test_literal_is_recognised_case_insensitively() {
        assert!(requests_commit_timestamp(&Value::String("SPANNER.COMMIT_TIMESTAMP()".into())));
        assert!(!requests_commit_timestamp(&Value::String("now()".into())));
        assert!(!requests_commit_timestamp(&Value::Null));
    }

    #[test]
    fn test_empty_tracker() {
        assert!(CommitTimestampTracker::new().is_empty());
    }
}
