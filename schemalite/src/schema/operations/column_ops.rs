// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! ALTER TABLE column statements

use super::{build_column, drop_identity_sequence, lookup_column, lookup_table, ColumnDefinition};
use crate::catalog::error::CatalogResult;
use crate::schema::graph::SchemaGraphEditor;
use crate::schema::updater::SchemaStatement;

#[derive(Debug, Clone, PartialEq)]
pub struct AddColumn {
    pub table: String,
    pub column: ColumnDefinition,
}

impl AddColumn {
    pub fn new(table: impl Into<String>, column: ColumnDefinition) -> Self {
        Self {
            table: table.into(),
            column,
        }
    }
}

impl SchemaStatement for AddColumn {
    fn describe(&self) -> String {
        format!("ALTER TABLE {} ADD COLUMN {}", self.table, self.column.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let table = lookup_table(editor, &self.table)?;
        let column = build_column(editor, table, &self.table, &self.column)?;
        editor.edit(table)?.add_column(column, &self.column.name);
        Ok(())
    }
}

/// ALTER COLUMN with a full replacement definition. The name selects the
/// column; type, nullability, lengths, commit timestamp option and default
/// are replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterColumn {
    pub table: String,
    pub column: ColumnDefinition,
}

impl AlterColumn {
    pub fn new(table: impl Into<String>, column: ColumnDefinition) -> Self {
        Self {
            table: table.into(),
            column,
        }
    }
}

impl SchemaStatement for AlterColumn {
    fn describe(&self) -> String {
        format!("ALTER TABLE {} ALTER COLUMN {}", self.table, self.column.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let handle = lookup_column(editor, &self.table, &self.column.name)?;
        let definition = &self.column;
        editor
            .edit(handle)?
            .set_type(definition.column_type.clone())
            .set_nullable(definition.nullable)
            .set_declared_max_length(definition.max_length)
            .set_vector_length(definition.vector_length)
            .set_allow_commit_timestamp(definition.allow_commit_timestamp)
            .set_default_value(definition.default_value.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropColumn {
    pub table: String,
    pub column: String,
}

impl DropColumn {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl SchemaStatement for DropColumn {
    fn describe(&self) -> String {
        format!("ALTER TABLE {} DROP COLUMN {}", self.table, self.column)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let column = lookup_column(editor, &self.table, &self.column)?;
        drop_identity_sequence(editor, column)?;
        editor.delete(column)?;
        Ok(())
    }
}
