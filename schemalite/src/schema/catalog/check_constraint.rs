// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Check constraint nodes

use super::{Column, Table};
use crate::catalog::error::CatalogResult;
use crate::schema::graph::{
    CloneScope, Handle, NameSpace, NodeRef, SchemaNameInfo, SchemaObject, View,
};
use crate::schema::validators::{constraint_validator, ValidationContext};

#[derive(Debug, Clone)]
pub struct CheckConstraint {
    pub(crate) name: String,
    pub(crate) table: Handle<Table>,
    pub(crate) expression: String,
    pub(crate) original_expression: Option<String>,
    /// Set when the DDL named the constraint rather than the catalog
    pub(crate) has_generated_name: bool,
    pub(crate) dependent_columns: Vec<Handle<Column>>,
}

impl CheckConstraint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn original_expression(&self) -> Option<&str> {
        self.original_expression.as_deref()
    }

    pub fn has_generated_name(&self) -> bool {
        self.has_generated_name
    }

    pub fn table_handle(&self) -> Handle<Table> {
        self.table
    }
}

impl SchemaObject for CheckConstraint {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        Some(SchemaNameInfo::new(&self.name, "Check Constraint", NameSpace::Constraint))
    }

    fn debug_label(&self) -> String {
        format!("CK:{}", self.name)
    }

    fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        scope.clone_in_place(&mut self.table)?;
        if scope.is_deleted(self.table) {
            scope.mark_deleted();
        }
        scope.clone_each(&mut self.dependent_columns)
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        constraint_validator::validate_check(self, me, ctx)
    }

    fn validate_update(
        &self,
        _me: Handle<Self>,
        _prior: &Self,
        _ctx: &mut ValidationContext<'_>,
    ) -> CatalogResult<()> {
        Ok(())
    }

    fn for_each_ref(&self, f: &mut dyn FnMut(NodeRef)) {
        f(self.table.erase());
        self.dependent_columns.iter().for_each(|h| f(h.erase()));
    }
}

impl<'g> View<'g, CheckConstraint> {
    pub fn table(&self) -> Option<View<'g, Table>> {
        self.follow(self.node().table)
    }

    pub fn dependent_columns(&self) -> Vec<View<'g, Column>> {
        self.follow_all(&self.node().dependent_columns)
    }
}
