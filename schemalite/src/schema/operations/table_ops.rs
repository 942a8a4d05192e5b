// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CREATE TABLE and DROP TABLE

use log::debug;

use super::{build_column, drop_identity_sequence, lookup_table, ColumnDefinition, KeyPart};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::builders::{KeyColumnBuilder, TableBuilder};
use crate::schema::catalog::{OnDeleteAction, RowDeletionPolicy, Table};
use crate::schema::graph::SchemaGraphEditor;
use crate::schema::updater::SchemaStatement;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<KeyPart>,
    /// Parent table and what happens to child rows when a parent row goes
    pub interleave_in: Option<(String, OnDeleteAction)>,
    pub row_deletion_policy: Option<RowDeletionPolicy>,
    pub locality_group: Option<String>,
    pub synonym: Option<String>,
}

impl CreateTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            interleave_in: None,
            row_deletion_policy: None,
            locality_group: None,
            synonym: None,
        }
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, parts: Vec<KeyPart>) -> Self {
        self.primary_key = parts;
        self
    }

    pub fn interleave_in(mut self, parent: impl Into<String>, on_delete: OnDeleteAction) -> Self {
        self.interleave_in = Some((parent.into(), on_delete));
        self
    }

    pub fn row_deletion_policy(mut self, column: impl Into<String>, older_than_days: i64) -> Self {
        self.row_deletion_policy = Some(RowDeletionPolicy {
            column: column.into(),
            older_than_days,
        });
        self
    }

    pub fn locality_group(mut self, name: impl Into<String>) -> Self {
        self.locality_group = Some(name.into());
        self
    }

    pub fn synonym(mut self, name: impl Into<String>) -> Self {
        self.synonym = Some(name.into());
        self
    }
}

impl SchemaStatement for CreateTable {
    fn describe(&self) -> String {
        format!("CREATE TABLE {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let table = editor.allocate::<Table>()?;
        let table_id = editor.ids().next_table_id();
        let mut builder = TableBuilder::new(&self.name, table_id);

        let mut columns = Vec::with_capacity(self.columns.len());
        for definition in &self.columns {
            let column = build_column(editor, table, &self.name, definition)?;
            builder = builder.add_column(column, &definition.name);
            columns.push((definition.name.as_str(), column));
        }

        for part in &self.primary_key {
            let column = columns
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&part.column))
                .map(|(_, handle)| *handle)
                .ok_or_else(|| CatalogError::column_not_found(&self.name, &part.column))?;
            let key = KeyColumnBuilder::new(column)
                .set_descending(part.descending)
                .set_nulls_last(part.nulls_last)
                .build();
            builder = builder.add_key_column(editor.add_node(key)?);
        }

        let parent = match &self.interleave_in {
            Some((parent_name, on_delete)) => {
                let parent = lookup_table(editor, parent_name)?;
                builder = builder.set_parent(parent, *on_delete);
                Some(parent)
            }
            None => None,
        };
        if let Some(policy) = &self.row_deletion_policy {
            builder = builder.set_row_deletion_policy(policy.clone());
        }
        if let Some(group_name) = &self.locality_group {
            let group = editor
                .source()
                .find_locality_group(group_name)
                .map(|g| g.handle())
                .ok_or_else(|| CatalogError::NotFound(format!("Locality group not found: {}", group_name)))?;
            builder = builder.set_locality_group(group);
        }
        if let Some(synonym) = &self.synonym {
            builder = builder.set_synonym(synonym);
        }

        editor.insert(table, builder.build())?;
        if let Some(parent) = parent {
            editor.edit(parent)?.add_child(table);
        }
        debug!("Built table {} with {} columns", self.name, self.columns.len());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    pub name: String,
}

impl DropTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SchemaStatement for DropTable {
    fn describe(&self) -> String {
        format!("DROP TABLE {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let table = lookup_table(editor, &self.name)?;
        // Cascading children go with the table, so do their identity sequences
        let mut pending: Vec<_> = editor.source().get(table).into_iter().collect();
        while let Some(view) = pending.pop() {
            for column in view.column_handles() {
                drop_identity_sequence(editor, *column)?;
            }
            pending.extend(
                view.children()
                    .into_iter()
                    .filter(|child| child.on_delete() == OnDeleteAction::Cascade),
            );
        }
        editor.delete(table)?;
        Ok(())
    }
}
