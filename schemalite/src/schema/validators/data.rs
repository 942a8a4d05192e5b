// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Checks against committed row data
//!
//! The catalog does not store rows. Schema changes that depend on existing
//! data (unique index backfill, NOT NULL, shorter max length) ask a
//! [`RowDataSource`] supplied by the storage layer.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::ids::{ColumnId, TableId};
use crate::schema::catalog::{Column, Index, Table};
use crate::schema::graph::{SchemaObject, View};
use crate::schema::types::Value;

/// Read access to committed rows
pub trait RowDataSource: Send + Sync {
    /// Every row of `table`, projected onto `columns` in order. A column the
    /// row has no value for reads as NULL.
    fn scan(&self, table: TableId, columns: &[ColumnId]) -> CatalogResult<Vec<Vec<Value>>>;
}

/// Row store for tests and embedders without a storage engine
#[derive(Debug, Default)]
pub struct InMemoryRows {
    tables: RwLock<HashMap<TableId, Vec<HashMap<ColumnId, Value>>>>,
}

impl InMemoryRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: TableId, row: impl IntoIterator<Item = (ColumnId, Value)>) {
        self.tables
            .write()
            .entry(table)
            .or_default()
            .push(row.into_iter().collect());
    }

    pub fn row_count(&self, table: TableId) -> usize {
        self.tables.read().get(&table).map_or(0, Vec::len)
    }

    pub fn clear_table(&self, table: TableId) {
        self.tables.write().remove(&table);
    }
}

impl RowDataSource for InMemoryRows {
    fn scan(&self, table: TableId, columns: &[ColumnId]) -> CatalogResult<Vec<Vec<Value>>> {
        let tables = self.tables.read();
        let rows = match tables.get(&table) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };
        Ok(rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect())
    }
}

fn format_key(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Backfill check for a new unique index
pub fn check_unique_index(rows: &dyn RowDataSource, index: View<'_, Index>) -> CatalogResult<()> {
    let table = index
        .indexed_table()
        .ok_or_else(|| CatalogError::dangling_reference(&index.debug_label(), "indexed table"))?;
    let mut key_ids = Vec::new();
    for key in index.key_columns() {
        let column = key
            .column()
            .and_then(|c| c.source_column())
            .ok_or_else(|| CatalogError::dangling_reference(&index.debug_label(), "key column"))?;
        key_ids.push(column.id());
    }

    let mut seen = HashSet::new();
    for row in rows.scan(table.id(), &key_ids)? {
        if index.is_null_filtered() && row.iter().any(Value::is_null) {
            continue;
        }
        if !seen.insert(row.clone()) {
            return Err(CatalogError::Duplicate(format!(
                "Found uniqueness violation on index {}, duplicate key value: ({})",
                index.name(),
                format_key(&row)
            )));
        }
    }
    Ok(())
}

/// Tightening a column to NOT NULL requires that no row holds NULL
pub fn check_not_null(
    rows: &dyn RowDataSource,
    table: &Table,
    column: &Column,
) -> CatalogResult<()> {
    let has_null = rows
        .scan(table.id(), &[column.id()])?
        .iter()
        .any(|row| row.first().map_or(true, Value::is_null));
    if has_null {
        return Err(CatalogError::Incompatible(format!(
            "Adding a NOT NULL constraint on column {}.{} is not allowed because it has a NULL value",
            table.name(),
            column.name()
        )));
    }
    Ok(())
}

fn exceeds(len: usize, max_length: i64) -> bool {
    i64::try_from(len).map_or(true, |len| len > max_length)
}

/// Shrinking a max length requires every stored value to fit
pub fn check_max_length(
    rows: &dyn RowDataSource,
    table: &Table,
    column: &Column,
    max_length: i64,
) -> CatalogResult<()> {
    for row in rows.scan(table.id(), &[column.id()])? {
        let too_long = match row.first() {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::length)
                .any(|len| exceeds(len, max_length)),
            Some(value) => value.length().is_some_and(|len| exceeds(len, max_length)),
            None => false,
        };
        if too_long {
            return Err(CatalogError::Incompatible(format!(
                "Cannot reduce the max length of column {}.{} to {}: existing values are longer",
                table.name(),
                column.name(),
                max_length
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_projects_missing_columns_as_null() {
        let rows = InMemoryRows::new();
        rows.insert(TableId(1), vec![(ColumnId(1), Value::Int64(7))]);
        let scanned = rows.scan(TableId(1), &[ColumnId(1), ColumnId(2)]).unwrap();
        assert_eq!(scanned, vec![vec![Value::Int64(7), Value::Null]]);
        assert!(rows.scan(TableId(9), &[ColumnId(1)]).unwrap().is_empty());
        assert_eq!(rows.row_count(TableId(1)), 1);
    }

    #[test]
    fn test_length_limit_comparison() {
        assert!(!exceeds(64, 64));
        assert!(exceeds(65, 64));
        #[cfg(target_pointer_width = "64")]
        assert!(exceeds(usize::MAX, i64::MAX));
    }
}
