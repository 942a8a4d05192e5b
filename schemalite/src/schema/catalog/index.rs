// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Index nodes

use serde::{Deserialize, Serialize};

use super::{Column, KeyColumn, LocalityGroup, Table};
use crate::catalog::error::CatalogResult;
use crate::schema::graph::{
    CloneScope, Handle, NameSpace, NodeRef, SchemaNameInfo, SchemaObject, View,
};
use crate::schema::validators::null_filter::{self, NullFilterFacts, NullFilterReason};
use crate::schema::validators::{index_validator, ValidationContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexKind {
    #[default]
    Index,
    SearchIndex,
    VectorIndex,
}

/// A secondary index. Its rows live in a non-public data table whose primary
/// key is the index key followed by the indexed table's key.
#[derive(Debug, Clone)]
pub struct Index {
    pub(crate) name: String,
    pub(crate) indexed_table: Handle<Table>,
    pub(crate) index_data_table: Handle<Table>,
    /// Key parts over data table columns; a prefix of the data table's key
    pub(crate) key_columns: Vec<Handle<KeyColumn>>,
    pub(crate) stored_columns: Vec<Handle<Column>>,
    pub(crate) unique: bool,
    pub(crate) null_filtered: bool,
    pub(crate) null_filtered_columns: Vec<Handle<Column>>,
    pub(crate) partition_by: Vec<Handle<Column>>,
    pub(crate) order_by: Vec<Handle<KeyColumn>>,
    pub(crate) kind: IndexKind,
    /// Nodes that keep this index alive, such as foreign keys
    pub(crate) managing_nodes: Vec<NodeRef>,
    pub(crate) locality_group: Option<Handle<LocalityGroup>>,
}

impl Index {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_null_filtered(&self) -> bool {
        self.null_filtered
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn is_managed(&self) -> bool {
        !self.managing_nodes.is_empty()
    }

    pub fn managing_nodes(&self) -> &[NodeRef] {
        &self.managing_nodes
    }

    pub fn indexed_table_handle(&self) -> Handle<Table> {
        self.indexed_table
    }

    pub fn index_data_table_handle(&self) -> Handle<Table> {
        self.index_data_table
    }

    pub fn key_column_handles(&self) -> &[Handle<KeyColumn>] {
        &self.key_columns
    }
}

impl SchemaObject for Index {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        Some(SchemaNameInfo::new(&self.name, "Index", NameSpace::Global))
    }

    fn debug_label(&self) -> String {
        format!("I:{}", self.name)
    }

    fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        scope.clone_in_place(&mut self.indexed_table)?;
        if scope.is_deleted(self.indexed_table) {
            scope.mark_deleted();
        }
        scope.clone_in_place(&mut self.index_data_table)?;
        scope.clone_vec(&mut self.key_columns)?;
        scope.clone_vec(&mut self.stored_columns)?;
        scope.clone_vec(&mut self.null_filtered_columns)?;
        scope.clone_vec(&mut self.partition_by)?;
        scope.clone_vec(&mut self.order_by)?;
        scope.clone_refs(&mut self.managing_nodes)?;
        scope.clone_opt(&mut self.locality_group)?;
        Ok(())
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        index_validator::validate(self, me, ctx)
    }

    fn validate_update(
        &self,
        me: Handle<Self>,
        prior: &Self,
        ctx: &mut ValidationContext<'_>,
    ) -> CatalogResult<()> {
        index_validator::validate_update(self, me, prior, ctx)
    }

    fn for_each_ref(&self, f: &mut dyn FnMut(NodeRef)) {
        f(self.indexed_table.erase());
        f(self.index_data_table.erase());
        self.key_columns.iter().for_each(|h| f(h.erase()));
        self.stored_columns.iter().for_each(|h| f(h.erase()));
        self.null_filtered_columns.iter().for_each(|h| f(h.erase()));
        self.partition_by.iter().for_each(|h| f(h.erase()));
        self.order_by.iter().for_each(|h| f(h.erase()));
        self.managing_nodes.iter().for_each(|n| f(*n));
        self.locality_group.iter().for_each(|h| f(h.erase()));
    }
}

impl<'g> View<'g, Index> {
    pub fn indexed_table(&self) -> Option<View<'g, Table>> {
        self.follow(self.node().indexed_table)
    }

    pub fn index_data_table(&self) -> Option<View<'g, Table>> {
        self.follow(self.node().index_data_table)
    }

    pub fn key_columns(&self) -> Vec<View<'g, KeyColumn>> {
        self.follow_all(&self.node().key_columns)
    }

    pub fn stored_columns(&self) -> Vec<View<'g, Column>> {
        self.follow_all(&self.node().stored_columns)
    }

    pub fn null_filtered_columns(&self) -> Vec<View<'g, Column>> {
        self.follow_all(&self.node().null_filtered_columns)
    }

    pub fn partition_by(&self) -> Vec<View<'g, Column>> {
        self.follow_all(&self.node().partition_by)
    }

    pub fn order_by(&self) -> Vec<View<'g, KeyColumn>> {
        self.follow_all(&self.node().order_by)
    }

    pub fn locality_group(&self) -> Option<View<'g, LocalityGroup>> {
        self.node().locality_group.and_then(|h| self.follow(h))
    }

    /// Data table column derived from the named indexed table column
    pub fn find_key_column(&self, name: &str) -> Option<View<'g, KeyColumn>> {
        self.key_columns().into_iter().find(|key| {
            key.column()
                .is_some_and(|c| c.node().name().eq_ignore_ascii_case(name))
        })
    }

    /// Why `column` is null-filtered by this index, if it is. `column` may
    /// be a column of the indexed table or of the data table.
    pub fn null_filter_reason(&self, column: &Column) -> Option<NullFilterReason> {
        let matches = |candidate: &View<'g, Column>| {
            candidate.node().id() == column.id()
                || candidate
                    .source_column()
                    .is_some_and(|source| source.node().id() == column.id())
        };
        let is_index_key = self
            .key_columns()
            .iter()
            .filter_map(|key| key.column())
            .any(|c| matches(&c));
        let explicitly_filtered = self.null_filtered_columns().iter().any(matches);
        null_filter::null_filter_reason(NullFilterFacts {
            null_filtered_index: self.node().null_filtered,
            is_index_key,
            explicitly_filtered,
        })
    }

    pub fn is_null_filtered_column(&self, column: &Column) -> bool {
        self.null_filter_reason(column).is_some()
    }
}
