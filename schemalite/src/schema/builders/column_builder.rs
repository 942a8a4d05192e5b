// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Column and key column builders, and the column editor

use crate::catalog::ids::ColumnId;
use crate::schema::catalog::{ChangeStream, Column, KeyColumn, LocalityGroup, Sequence, Table, Udf};
use crate::schema::graph::{Editable, Handle};
use crate::schema::types::ColumnType;

#[derive(Debug)]
pub struct ColumnBuilder {
    column: Column,
}

impl ColumnBuilder {
    /// A nullable column of `column_type` owned by `table`
    pub fn new(
        name: impl Into<String>,
        id: ColumnId,
        column_type: ColumnType,
        table: Handle<Table>,
    ) -> Self {
        Self {
            column: Column {
                name: name.into(),
                id,
                column_type,
                nullable: true,
                table,
                expression: None,
                original_expression: None,
                is_stored: false,
                has_default_value: false,
                is_identity_column: false,
                hidden: false,
                declared_max_length: None,
                vector_length: None,
                allows_commit_timestamp: false,
                dependent_column_names: Vec::new(),
                dependent_columns: Vec::new(),
                sequences_used: Vec::new(),
                udf_dependencies: Vec::new(),
                change_streams: Vec::new(),
                change_streams_explicitly_tracking: Vec::new(),
                source_column: None,
                locality_group: None,
            },
        }
    }

    pub fn set_nullable(mut self, nullable: bool) -> Self {
        self.column.nullable = nullable;
        self
    }

    /// Generated column expression
    pub fn set_expression(mut self, expression: impl Into<String>, stored: bool) -> Self {
        self.column.expression = Some(expression.into());
        self.column.is_stored = stored;
        self
    }

    pub fn set_original_expression(mut self, text: impl Into<String>) -> Self {
        self.column.original_expression = Some(text.into());
        self
    }

    pub fn set_default_value(mut self, expression: impl Into<String>) -> Self {
        self.column.expression = Some(expression.into());
        self.column.has_default_value = true;
        self
    }

    pub fn set_identity_column(mut self, identity: bool) -> Self {
        self.column.is_identity_column = identity;
        self
    }

    pub fn set_hidden(mut self, hidden: bool) -> Self {
        self.column.hidden = hidden;
        self
    }

    pub fn set_declared_max_length(mut self, length: Option<i64>) -> Self {
        self.column.declared_max_length = length;
        self
    }

    pub fn set_vector_length(mut self, length: Option<u32>) -> Self {
        self.column.vector_length = length;
        self
    }

    pub fn set_allow_commit_timestamp(mut self, allow: bool) -> Self {
        self.column.allows_commit_timestamp = allow;
        self
    }

    pub fn set_dependent_column_names(mut self, names: Vec<String>) -> Self {
        self.column.dependent_column_names = names;
        self
    }

    pub fn add_sequence(mut self, sequence: Handle<Sequence>) -> Self {
        self.column.sequences_used.push(sequence);
        self
    }

    pub fn add_udf_dependency(mut self, udf: Handle<Udf>) -> Self {
        self.column.udf_dependencies.push(udf);
        self
    }

    /// Derive from `source`; type and length follow it on every clone
    pub fn set_source_column(mut self, source: Handle<Column>) -> Self {
        self.column.source_column = Some(source);
        self
    }

    pub fn set_locality_group(mut self, group: Handle<LocalityGroup>) -> Self {
        self.column.locality_group = Some(group);
        self
    }

    pub fn build(self) -> Column {
        self.column
    }
}

pub struct ColumnEditor<'a> {
    column: &'a mut Column,
}

impl Editable for Column {
    type Editor<'a> = ColumnEditor<'a>;

    fn editor(&mut self) -> ColumnEditor<'_> {
        ColumnEditor { column: self }
    }
}

impl ColumnEditor<'_> {
    pub fn set_type(&mut self, column_type: ColumnType) -> &mut Self {
        self.column.column_type = column_type;
        self
    }

    pub fn set_nullable(&mut self, nullable: bool) -> &mut Self {
        self.column.nullable = nullable;
        self
    }

    pub fn set_declared_max_length(&mut self, length: Option<i64>) -> &mut Self {
        self.column.declared_max_length = length;
        self
    }

    pub fn set_vector_length(&mut self, length: Option<u32>) -> &mut Self {
        self.column.vector_length = length;
        self
    }

    pub fn set_allow_commit_timestamp(&mut self, allow: bool) -> &mut Self {
        self.column.allows_commit_timestamp = allow;
        self
    }

    /// Replace or clear the default value
    pub fn set_default_value(&mut self, expression: Option<String>) -> &mut Self {
        if !self.column.has_default_value && self.column.expression.is_some() {
            // Generated columns keep their expression.
            return self;
        }
        self.column.has_default_value = expression.is_some();
        self.column.expression = expression;
        self
    }

    pub fn set_hidden(&mut self, hidden: bool) -> &mut Self {
        self.column.hidden = hidden;
        self
    }

    pub fn add_sequence(&mut self, sequence: Handle<Sequence>) -> &mut Self {
        self.column.sequences_used.push(sequence);
        self
    }

    pub fn add_change_stream(&mut self, stream: Handle<ChangeStream>, explicit: bool) -> &mut Self {
        self.column.change_streams.push(stream);
        if explicit {
            self.column.change_streams_explicitly_tracking.push(stream);
        }
        self
    }

    pub fn set_locality_group(&mut self, group: Option<Handle<LocalityGroup>>) -> &mut Self {
        self.column.locality_group = group;
        self
    }
}

#[derive(Debug)]
pub struct KeyColumnBuilder {
    key: KeyColumn,
}

impl KeyColumnBuilder {
    /// Ascending, nulls first
    pub fn new(column: Handle<Column>) -> Self {
        Self {
            key: KeyColumn {
                column,
                descending: false,
                nulls_last: false,
            },
        }
    }

    pub fn set_descending(mut self, descending: bool) -> Self {
        self.key.descending = descending;
        self
    }

    pub fn set_nulls_last(mut self, nulls_last: bool) -> Self {
        self.key.nulls_last = nulls_last;
        self
    }

    pub fn build(self) -> KeyColumn {
        self.key
    }
}
