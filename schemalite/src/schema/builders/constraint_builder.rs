// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Foreign key and check constraint builders

use crate::schema::catalog::{CheckConstraint, Column, ForeignKey, Index, ReferentialAction, Table};
use crate::schema::graph::Handle;

#[derive(Debug)]
pub struct ForeignKeyBuilder {
    fk: ForeignKey,
}

impl ForeignKeyBuilder {
    pub fn new(
        name: impl Into<String>,
        referencing_table: Handle<Table>,
        referenced_table: Handle<Table>,
    ) -> Self {
        Self {
            fk: ForeignKey {
                name: name.into(),
                referencing_table,
                referencing_columns: Vec::new(),
                referencing_index: None,
                referenced_table,
                referenced_columns: Vec::new(),
                referenced_index: None,
                on_delete: ReferentialAction::NoAction,
                enforced: true,
            },
        }
    }

    pub fn add_referencing_column(mut self, column: Handle<Column>) -> Self {
        self.fk.referencing_columns.push(column);
        self
    }

    pub fn add_referenced_column(mut self, column: Handle<Column>) -> Self {
        self.fk.referenced_columns.push(column);
        self
    }

    pub fn set_referencing_index(mut self, index: Handle<Index>) -> Self {
        self.fk.referencing_index = Some(index);
        self
    }

    pub fn set_referenced_index(mut self, index: Handle<Index>) -> Self {
        self.fk.referenced_index = Some(index);
        self
    }

    pub fn set_on_delete(mut self, action: ReferentialAction) -> Self {
        self.fk.on_delete = action;
        self
    }

    pub fn set_enforced(mut self, enforced: bool) -> Self {
        self.fk.enforced = enforced;
        self
    }

    pub fn build(self) -> ForeignKey {
        self.fk
    }
}

#[derive(Debug)]
pub struct CheckConstraintBuilder {
    check: CheckConstraint,
}

impl CheckConstraintBuilder {
    pub fn new(name: impl Into<String>, table: Handle<Table>, expression: impl Into<String>) -> Self {
        Self {
            check: CheckConstraint {
                name: name.into(),
                table,
                expression: expression.into(),
                original_expression: None,
                has_generated_name: false,
                dependent_columns: Vec::new(),
            },
        }
    }

    pub fn set_original_expression(mut self, text: impl Into<String>) -> Self {
        self.check.original_expression = Some(text.into());
        self
    }

    pub fn set_generated_name(mut self, generated: bool) -> Self {
        self.check.has_generated_name = generated;
        self
    }

    pub fn add_dependent_column(mut self, column: Handle<Column>) -> Self {
        self.check.dependent_columns.push(column);
        self
    }

    pub fn build(self) -> CheckConstraint {
        self.check
    }
}
