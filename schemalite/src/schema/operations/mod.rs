// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Typed DDL statements
//!
//! Each statement arrives already parsed and name-resolved by the DDL front
//! end. Applying one looks names up in the editor's source version, builds
//! or edits nodes, and leaves every check to the validators.

pub mod column_ops;
pub mod constraint_ops;
pub mod index_ops;
pub mod object_ops;
pub mod table_ops;

pub use column_ops::{AddColumn, AlterColumn, DropColumn};
pub use constraint_ops::{AddCheckConstraint, AddForeignKey, DropConstraint};
pub use index_ops::{AddIndexStoredColumn, CreateIndex, DropIndex};
pub use object_ops::{
    CreateChangeStream, CreateFunction, CreateLocalityGroup, CreateSequence, DropChangeStream,
    DropFunction, DropLocalityGroup, DropSequence, TrackedTable,
};
pub use table_ops::{CreateTable, DropTable};

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::builders::{ColumnBuilder, SequenceBuilder};
use crate::schema::catalog::{Column, Sequence, Table};
use crate::schema::graph::{Handle, SchemaGraphEditor};
use crate::schema::types::ColumnType;

/// Generated column expression as resolved by the front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedExpression {
    pub expression: String,
    pub stored: bool,
    /// Names of the same-table columns the expression reads
    pub dependent_columns: Vec<String>,
}

/// Column as written in CREATE TABLE, ADD COLUMN or ALTER COLUMN
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub max_length: Option<i64>,
    pub vector_length: Option<u32>,
    pub allow_commit_timestamp: bool,
    pub generated: Option<GeneratedExpression>,
    pub default_value: Option<String>,
    pub identity: bool,
    pub hidden: bool,
    /// Sequences named by the default or generated expression
    pub sequences: Vec<String>,
    /// Functions named by the default or generated expression
    pub functions: Vec<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            max_length: None,
            vector_length: None,
            allow_commit_timestamp: false,
            generated: None,
            default_value: None,
            identity: false,
            hidden: false,
            sequences: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn max_length(mut self, length: i64) -> Self {
        self.max_length = Some(length);
        self
    }

    pub fn vector_length(mut self, length: u32) -> Self {
        self.vector_length = Some(length);
        self
    }

    pub fn allow_commit_timestamp(mut self) -> Self {
        self.allow_commit_timestamp = true;
        self
    }

    pub fn generated_as(mut self, expression: impl Into<String>, stored: bool, dependent_columns: &[&str]) -> Self {
        self.generated = Some(GeneratedExpression {
            expression: expression.into(),
            stored,
            dependent_columns: dependent_columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn default_value(mut self, expression: impl Into<String>) -> Self {
        self.default_value = Some(expression.into());
        self
    }

    /// Values come from an internal sequence created with the column
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn uses_sequence(mut self, name: impl Into<String>) -> Self {
        self.sequences.push(name.into());
        self
    }

    pub fn uses_function(mut self, name: impl Into<String>) -> Self {
        self.functions.push(name.into());
        self
    }
}

/// One part of a primary or index key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPart {
    pub column: String,
    pub descending: bool,
    pub nulls_last: bool,
}

impl KeyPart {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
            nulls_last: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
            nulls_last: true,
        }
    }
}

pub(crate) fn lookup_table(editor: &SchemaGraphEditor<'_>, name: &str) -> CatalogResult<Handle<Table>> {
    editor
        .source()
        .find_table(name)
        .map(|table| table.handle())
        .ok_or_else(|| CatalogError::table_not_found(name))
}

pub(crate) fn lookup_column(
    editor: &SchemaGraphEditor<'_>,
    table: &str,
    column: &str,
) -> CatalogResult<Handle<Column>> {
    editor
        .source()
        .find_table(table)
        .ok_or_else(|| CatalogError::table_not_found(table))?
        .find_column(column)
        .map(|c| c.handle())
        .ok_or_else(|| CatalogError::column_not_found(table, column))
}

pub(crate) fn lookup_sequence(editor: &SchemaGraphEditor<'_>, name: &str) -> CatalogResult<Handle<Sequence>> {
    editor
        .source()
        .find_sequence(name, true)
        .map(|s| s.handle())
        .ok_or_else(|| CatalogError::sequence_not_found(name))
}

/// Delete the internal sequence an identity column owns
pub(crate) fn drop_identity_sequence(editor: &mut SchemaGraphEditor<'_>, column: Handle<Column>) -> CatalogResult<()> {
    let Some(column) = editor.source().get(column) else {
        return Ok(());
    };
    if !column.is_identity_column() {
        return Ok(());
    }
    for sequence in column.sequences_used().into_iter().filter(|s| s.is_internal()) {
        editor.delete(sequence.handle())?;
    }
    Ok(())
}

/// Build a column of `table` from its definition and add it to the editor.
/// The caller links it into the table.
pub(crate) fn build_column(
    editor: &mut SchemaGraphEditor<'_>,
    table: Handle<Table>,
    table_name: &str,
    definition: &ColumnDefinition,
) -> CatalogResult<Handle<Column>> {
    let id = editor.ids().next_column_id();
    let mut builder = ColumnBuilder::new(&definition.name, id, definition.column_type.clone(), table)
        .set_nullable(definition.nullable)
        .set_declared_max_length(definition.max_length)
        .set_vector_length(definition.vector_length)
        .set_allow_commit_timestamp(definition.allow_commit_timestamp)
        .set_hidden(definition.hidden);

    if let Some(generated) = &definition.generated {
        builder = builder
            .set_expression(&generated.expression, generated.stored)
            .set_original_expression(&generated.expression)
            .set_dependent_column_names(generated.dependent_columns.clone());
    }
    if let Some(default) = &definition.default_value {
        builder = builder.set_default_value(default);
    }
    for name in &definition.sequences {
        builder = builder.add_sequence(lookup_sequence(editor, name)?);
    }
    for name in &definition.functions {
        let udf = editor
            .source()
            .find_function(name)
            .map(|f| f.handle())
            .ok_or_else(|| CatalogError::NotFound(format!("Function not found: {}", name)))?;
        builder = builder.add_udf_dependency(udf);
    }
    if definition.identity {
        let sequence_id = editor.ids().next_sequence_id();
        let sequence = SequenceBuilder::new(
            format!("_identity_seq_{}_{}", table_name, definition.name),
            sequence_id,
        )
        .set_internal(true)
        .build();
        let sequence = editor.add_node(sequence)?;
        builder = builder.set_identity_column(true).add_sequence(sequence);
    }
    editor.add_node(builder.build())
}
