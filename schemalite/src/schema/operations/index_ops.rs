// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Index statements
//!
//! An index stores its rows in a data table named after the index. Every
//! data table column derives from an indexed table column. The data table
//! key is the index key followed by whatever indexed table key columns the
//! index key does not already name.

use log::debug;

use super::{lookup_table, KeyPart};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::builders::{ColumnBuilder, IndexBuilder, KeyColumnBuilder, TableBuilder};
use crate::schema::catalog::{Column, Index, IndexKind, KeyColumn, Table};
use crate::schema::graph::{Handle, NodeRef, SchemaGraphEditor, View};
use crate::schema::updater::SchemaStatement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndex {
    pub name: String,
    pub table: String,
    pub key: Vec<KeyPart>,
    pub storing: Vec<String>,
    pub unique: bool,
    pub null_filtered: bool,
    /// Columns named in a `WHERE c IS NOT NULL` filter
    pub not_null_filter: Vec<String>,
    pub kind: IndexKind,
    pub partition_by: Vec<String>,
    pub order_by: Vec<KeyPart>,
    pub locality_group: Option<String>,
}

impl CreateIndex {
    pub fn new(name: impl Into<String>, table: impl Into<String>, key: Vec<KeyPart>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            key,
            storing: Vec::new(),
            unique: false,
            null_filtered: false,
            not_null_filter: Vec::new(),
            kind: IndexKind::Index,
            partition_by: Vec::new(),
            order_by: Vec::new(),
            locality_group: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn null_filtered(mut self) -> Self {
        self.null_filtered = true;
        self
    }

    pub fn storing(mut self, column: impl Into<String>) -> Self {
        self.storing.push(column.into());
        self
    }

    pub fn where_not_null(mut self, column: impl Into<String>) -> Self {
        self.not_null_filter.push(column.into());
        self
    }

    pub fn kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn partition_by(mut self, column: impl Into<String>) -> Self {
        self.partition_by.push(column.into());
        self
    }

    pub fn order_by(mut self, part: KeyPart) -> Self {
        self.order_by.push(part);
        self
    }

    pub fn locality_group(mut self, name: impl Into<String>) -> Self {
        self.locality_group = Some(name.into());
        self
    }
}

impl SchemaStatement for CreateIndex {
    fn describe(&self) -> String {
        format!("CREATE INDEX {} ON {}", self.name, self.table)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        build_index(editor, self, None)?;
        Ok(())
    }
}

/// Indexed table key parts the index key does not already cover, in order
pub(crate) fn key_suffix<'k>(index_key: &[KeyPart], table_key: &'k [KeyPart]) -> Vec<&'k KeyPart> {
    table_key
        .iter()
        .filter(|part| {
            !index_key
                .iter()
                .any(|k| k.column.eq_ignore_ascii_case(&part.column))
        })
        .collect()
}

/// New data table column copying `source`
pub(crate) fn derive_column(
    editor: &mut SchemaGraphEditor<'_>,
    data_table: Handle<Table>,
    source: View<'_, Column>,
) -> CatalogResult<Handle<Column>> {
    let id = editor.ids().next_column_id();
    let column = ColumnBuilder::new(source.name(), id, source.column_type().clone(), data_table)
        .set_nullable(source.is_nullable())
        .set_declared_max_length(source.declared_max_length())
        .set_vector_length(source.vector_length())
        .set_source_column(source.handle())
        .build();
    editor.add_node(column)
}

/// Data table columns under construction, deduplicated by name
struct DataColumns<'g> {
    table: Handle<Table>,
    base: View<'g, Table>,
    columns: Vec<(String, Handle<Column>)>,
}

impl<'g> DataColumns<'g> {
    fn find(&self, name: &str) -> Option<Handle<Column>> {
        self.columns
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, handle)| *handle)
    }

    fn derive(&mut self, editor: &mut SchemaGraphEditor<'_>, name: &str) -> CatalogResult<Handle<Column>> {
        if let Some(existing) = self.find(name) {
            return Ok(existing);
        }
        let source = self
            .base
            .find_column(name)
            .ok_or_else(|| CatalogError::column_not_found(self.base.name(), name))?;
        let column = derive_column(editor, self.table, source)?;
        self.columns.push((source.name().to_string(), column));
        Ok(column)
    }
}

fn add_key(
    editor: &mut SchemaGraphEditor<'_>,
    column: Handle<Column>,
    part: &KeyPart,
) -> CatalogResult<Handle<KeyColumn>> {
    let key = KeyColumnBuilder::new(column)
        .set_descending(part.descending)
        .set_nulls_last(part.nulls_last)
        .build();
    editor.add_node(key)
}

/// Build an index, its data table and their columns. `manager` keeps the
/// index alive on behalf of another node, such as a foreign key.
pub(crate) fn build_index(
    editor: &mut SchemaGraphEditor<'_>,
    statement: &CreateIndex,
    manager: Option<NodeRef>,
) -> CatalogResult<Handle<Index>> {
    let source = editor.source();
    let base = source
        .find_table(&statement.table)
        .ok_or_else(|| CatalogError::table_not_found(&statement.table))?;
    let base_key: Vec<KeyPart> = base
        .primary_key()
        .iter()
        .filter_map(|key| {
            key.column().map(|column| KeyPart {
                column: column.name().to_string(),
                descending: key.is_descending(),
                nulls_last: key.is_nulls_last(),
            })
        })
        .collect();
    for stored in &statement.storing {
        if base_key.iter().any(|k| k.column.eq_ignore_ascii_case(stored)) {
            return Err(CatalogError::Structural(format!(
                "Index {} cannot store primary key column {}",
                statement.name, stored
            )));
        }
    }

    let index = editor.allocate::<Index>()?;
    let data_table = editor.allocate::<Table>()?;
    let data_table_id = editor.ids().next_table_id();
    let mut data = DataColumns {
        table: data_table,
        base,
        columns: Vec::new(),
    };
    let mut index_builder = IndexBuilder::new(&statement.name, base.handle(), data_table)
        .set_unique(statement.unique)
        .set_null_filtered(statement.null_filtered)
        .set_kind(statement.kind);
    let mut table_builder = TableBuilder::new(&statement.name, data_table_id).set_owner_index(index);

    for part in &statement.key {
        let column = data.derive(editor, &part.column)?;
        let key = add_key(editor, column, part)?;
        index_builder = index_builder.add_key_column(key);
        table_builder = table_builder.add_key_column(key);
    }
    for part in key_suffix(&statement.key, &base_key) {
        let column = data.derive(editor, &part.column)?;
        table_builder = table_builder.add_key_column(add_key(editor, column, part)?);
    }
    for name in &statement.storing {
        index_builder = index_builder.add_stored_column(data.derive(editor, name)?);
    }
    for name in &statement.not_null_filter {
        let column = data.find(name).ok_or_else(|| {
            CatalogError::Structural(format!(
                "Index {} filters on column {} which it neither indexes nor stores",
                statement.name, name
            ))
        })?;
        index_builder = index_builder.add_null_filtered_column(column);
    }
    for name in &statement.partition_by {
        index_builder = index_builder.add_partition_by(data.derive(editor, name)?);
    }
    for part in &statement.order_by {
        let column = data.derive(editor, &part.column)?;
        index_builder = index_builder.add_order_by(add_key(editor, column, part)?);
    }
    if let Some(group_name) = &statement.locality_group {
        let group = source
            .find_locality_group(group_name)
            .map(|g| g.handle())
            .ok_or_else(|| CatalogError::NotFound(format!("Locality group not found: {}", group_name)))?;
        index_builder = index_builder.set_locality_group(group);
    }
    if let Some(manager) = manager {
        index_builder = index_builder.add_managing_node(manager);
    }

    for (name, column) in &data.columns {
        table_builder = table_builder.add_column(*column, name);
    }
    editor.insert(data_table, table_builder.build())?;
    editor.insert(index, index_builder.build())?;
    editor.edit(base.handle())?.add_index(index);
    debug!(
        "Built index {} on {} with {} data columns",
        statement.name,
        statement.table,
        data.columns.len()
    );
    Ok(index)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndex {
    pub name: String,
}

impl DropIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SchemaStatement for DropIndex {
    fn describe(&self) -> String {
        format!("DROP INDEX {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let index = editor
            .source()
            .find_index(&self.name)
            .map(|i| i.handle())
            .ok_or_else(|| CatalogError::index_not_found(&self.name))?;
        editor.delete(index)?;
        Ok(())
    }
}

/// ALTER INDEX ... ADD STORED COLUMN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddIndexStoredColumn {
    pub index: String,
    pub column: String,
}

impl AddIndexStoredColumn {
    pub fn new(index: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            column: column.into(),
        }
    }
}

impl SchemaStatement for AddIndexStoredColumn {
    fn describe(&self) -> String {
        format!("ALTER INDEX {} ADD STORED COLUMN {}", self.index, self.column)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let source = editor.source();
        let index = source
            .find_index(&self.index)
            .ok_or_else(|| CatalogError::index_not_found(&self.index))?;
        let base = index
            .indexed_table()
            .ok_or_else(|| CatalogError::dangling_reference(&self.index, "indexed table"))?;
        let data_table = index
            .index_data_table()
            .ok_or_else(|| CatalogError::dangling_reference(&self.index, "data table"))?;
        if data_table.find_column(&self.column).is_some() {
            return Err(CatalogError::Structural(format!(
                "Column {} is already part of index {}",
                self.column, self.index
            )));
        }
        let column = base
            .find_column(&self.column)
            .ok_or_else(|| CatalogError::column_not_found(base.name(), &self.column))?;

        let derived = derive_column(editor, data_table.handle(), column)?;
        editor.edit(data_table.handle())?.add_column(derived, column.name());
        editor.edit(index.handle())?.add_stored_column(derived);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(parts: Vec<&KeyPart>) -> Vec<&str> {
        parts.into_iter().map(|p| p.column.as_str()).collect()
    }

    #[test]
    fn test_key_suffix_skips_columns_already_in_index_key() {
        let table_key = vec![KeyPart::asc("a"), KeyPart::asc("b")];
        assert_eq!(names(key_suffix(&[KeyPart::asc("c")], &table_key)), vec!["a", "b"]);
        assert_eq!(names(key_suffix(&[KeyPart::desc("B")], &table_key)), vec!["a"]);
        assert!(key_suffix(&[KeyPart::asc("b"), KeyPart::asc("a")], &table_key).is_empty());
    }
}
