// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Foreign key nodes

use serde::{Deserialize, Serialize};

use super::{Column, Index, Table};
use crate::catalog::error::CatalogResult;
use crate::schema::graph::{
    CloneScope, Handle, NameSpace, NodeRef, SchemaNameInfo, SchemaObject, View,
};
use crate::schema::validators::{constraint_validator, ValidationContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Cascade,
}

#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub(crate) name: String,
    pub(crate) referencing_table: Handle<Table>,
    pub(crate) referencing_columns: Vec<Handle<Column>>,
    pub(crate) referencing_index: Option<Handle<Index>>,
    pub(crate) referenced_table: Handle<Table>,
    pub(crate) referenced_columns: Vec<Handle<Column>>,
    pub(crate) referenced_index: Option<Handle<Index>>,
    pub(crate) on_delete: ReferentialAction,
    pub(crate) enforced: bool,
}

impl ForeignKey {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn on_delete(&self) -> ReferentialAction {
        self.on_delete
    }

    pub fn is_enforced(&self) -> bool {
        self.enforced
    }

    pub fn referencing_table_handle(&self) -> Handle<Table> {
        self.referencing_table
    }

    pub fn referenced_table_handle(&self) -> Handle<Table> {
        self.referenced_table
    }

    pub fn referencing_index_handle(&self) -> Option<Handle<Index>> {
        self.referencing_index
    }
}

impl SchemaObject for ForeignKey {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        Some(SchemaNameInfo::new(&self.name, "Foreign Key", NameSpace::Constraint))
    }

    fn debug_label(&self) -> String {
        format!("FK:{}", self.name)
    }

    fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        scope.clone_in_place(&mut self.referencing_table)?;
        if scope.is_deleted(self.referencing_table) {
            scope.mark_deleted();
        }
        scope.clone_each(&mut self.referencing_columns)?;
        scope.clone_opt(&mut self.referencing_index)?;
        scope.clone_in_place(&mut self.referenced_table)?;
        scope.clone_each(&mut self.referenced_columns)?;
        scope.clone_opt(&mut self.referenced_index)?;
        Ok(())
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        constraint_validator::validate_foreign_key(self, me, ctx)
    }

    fn validate_update(
        &self,
        me: Handle<Self>,
        prior: &Self,
        ctx: &mut ValidationContext<'_>,
    ) -> CatalogResult<()> {
        constraint_validator::validate_foreign_key_update(self, me, prior, ctx)
    }

    fn for_each_ref(&self, f: &mut dyn FnMut(NodeRef)) {
        f(self.referencing_table.erase());
        self.referencing_columns.iter().for_each(|h| f(h.erase()));
        self.referencing_index.iter().for_each(|h| f(h.erase()));
        f(self.referenced_table.erase());
        self.referenced_columns.iter().for_each(|h| f(h.erase()));
        self.referenced_index.iter().for_each(|h| f(h.erase()));
    }
}

impl<'g> View<'g, ForeignKey> {
    pub fn referencing_table(&self) -> Option<View<'g, Table>> {
        self.follow(self.node().referencing_table)
    }

    pub fn referencing_columns(&self) -> Vec<View<'g, Column>> {
        self.follow_all(&self.node().referencing_columns)
    }

    pub fn referencing_index(&self) -> Option<View<'g, Index>> {
        self.node().referencing_index.and_then(|h| self.follow(h))
    }

    pub fn referenced_table(&self) -> Option<View<'g, Table>> {
        self.follow(self.node().referenced_table)
    }

    pub fn referenced_columns(&self) -> Vec<View<'g, Column>> {
        self.follow_all(&self.node().referenced_columns)
    }

    pub fn referenced_index(&self) -> Option<View<'g, Index>> {
        self.node().referenced_index.and_then(|h| self.follow(h))
    }
}
