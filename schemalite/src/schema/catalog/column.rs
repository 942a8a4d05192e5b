// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Column and key column nodes

use super::{ChangeStream, Index, LocalityGroup, Sequence, Table, Udf};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::ids::ColumnId;
use crate::schema::graph::{CloneScope, Handle, NodeRef, SchemaNameInfo, SchemaObject, View};
use crate::schema::types::ColumnType;
use crate::schema::validators::null_filter::{self, NullFilterFacts};
use crate::schema::validators::{column_validator, ValidationContext};

#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) name: String,
    pub(crate) id: ColumnId,
    pub(crate) column_type: ColumnType,
    pub(crate) nullable: bool,
    pub(crate) table: Handle<Table>,
    pub(crate) expression: Option<String>,
    pub(crate) original_expression: Option<String>,
    pub(crate) is_stored: bool,
    pub(crate) has_default_value: bool,
    pub(crate) is_identity_column: bool,
    pub(crate) hidden: bool,
    pub(crate) declared_max_length: Option<i64>,
    pub(crate) vector_length: Option<u32>,
    pub(crate) allows_commit_timestamp: bool,
    pub(crate) dependent_column_names: Vec<String>,
    pub(crate) dependent_columns: Vec<Handle<Column>>,
    pub(crate) sequences_used: Vec<Handle<Sequence>>,
    pub(crate) udf_dependencies: Vec<Handle<Udf>>,
    pub(crate) change_streams: Vec<Handle<ChangeStream>>,
    pub(crate) change_streams_explicitly_tracking: Vec<Handle<ChangeStream>>,
    pub(crate) source_column: Option<Handle<Column>>,
    pub(crate) locality_group: Option<Handle<LocalityGroup>>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_generated(&self) -> bool {
        self.expression.is_some() && !self.has_default_value
    }

    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    pub fn original_expression(&self) -> Option<&str> {
        self.original_expression.as_deref()
    }

    pub fn is_stored(&self) -> bool {
        self.is_stored
    }

    pub fn has_default_value(&self) -> bool {
        self.has_default_value
    }

    pub fn is_identity_column(&self) -> bool {
        self.is_identity_column
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn declared_max_length(&self) -> Option<i64> {
        self.declared_max_length
    }

    pub fn vector_length(&self) -> Option<u32> {
        self.vector_length
    }

    pub fn allows_commit_timestamp(&self) -> bool {
        self.allows_commit_timestamp
    }

    pub fn dependent_column_names(&self) -> &[String] {
        &self.dependent_column_names
    }

    pub fn table_handle(&self) -> Handle<Table> {
        self.table
    }

    pub fn source_column_handle(&self) -> Option<Handle<Column>> {
        self.source_column
    }

    /// Null-filter facts for a derived column of an index data table, read
    /// through the clone scope so either graph version resolves
    fn null_filter_facts(
        &self,
        scope: &CloneScope<'_, '_>,
        index: &Index,
    ) -> CatalogResult<NullFilterFacts> {
        let mut is_index_key = false;
        for key in &index.key_columns {
            let key = scope.get(*key)?;
            if scope.get(key.column)?.id == self.id {
                is_index_key = true;
                break;
            }
        }
        let mut explicitly_filtered = false;
        for column in &index.null_filtered_columns {
            if scope.get(*column)?.id == self.id {
                explicitly_filtered = true;
                break;
            }
        }
        Ok(NullFilterFacts {
            null_filtered_index: index.null_filtered,
            is_index_key,
            explicitly_filtered,
        })
    }
}

impl SchemaObject for Column {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        // Column names are unique per table; the table validator checks that.
        None
    }

    fn debug_label(&self) -> String {
        format!("C:{}[{}]", self.name, self.id)
    }

    fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        scope.clone_in_place(&mut self.table)?;
        if scope.is_deleted(self.table) {
            scope.mark_deleted();
        }
        scope.clone_vec(&mut self.change_streams)?;
        scope.clone_vec(&mut self.change_streams_explicitly_tracking)?;
        scope.clone_opt(&mut self.locality_group)?;
        scope.clone_each(&mut self.dependent_columns)?;
        scope.clone_each(&mut self.sequences_used)?;
        scope.clone_each(&mut self.udf_dependencies)?;

        if let Some(source) = self.source_column.as_mut() {
            scope.clone_in_place(source)?;
            let source = scope.get(*source)?;
            self.column_type = source.column_type.clone();
            self.declared_max_length = source.declared_max_length;
            self.vector_length = source.vector_length;
            let source_nullable = source.nullable;

            let table = scope.get(self.table)?;
            if table.is_public() {
                return Err(CatalogError::Internal(format!(
                    "{} has a source column but belongs to public table {}",
                    self.debug_label(),
                    table.name
                )));
            }
            let filter = match table.owner_index {
                Some(index) => {
                    let index = scope.get(index)?;
                    null_filter::null_filter_reason(self.null_filter_facts(scope, index)?)
                }
                None => None,
            };
            self.nullable = filter.is_none() && source_nullable;
        }
        Ok(())
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        column_validator::validate(self, me, ctx)
    }

    fn validate_update(
        &self,
        me: Handle<Self>,
        prior: &Self,
        ctx: &mut ValidationContext<'_>,
    ) -> CatalogResult<()> {
        column_validator::validate_update(self, me, prior, ctx)
    }

    fn for_each_ref(&self, f: &mut dyn FnMut(NodeRef)) {
        f(self.table.erase());
        self.dependent_columns.iter().for_each(|h| f(h.erase()));
        self.sequences_used.iter().for_each(|h| f(h.erase()));
        self.udf_dependencies.iter().for_each(|h| f(h.erase()));
        self.change_streams.iter().for_each(|h| f(h.erase()));
        self.change_streams_explicitly_tracking
            .iter()
            .for_each(|h| f(h.erase()));
        self.source_column.iter().for_each(|h| f(h.erase()));
        self.locality_group.iter().for_each(|h| f(h.erase()));
    }
}

impl<'g> View<'g, Column> {
    pub fn table(&self) -> Option<View<'g, Table>> {
        self.follow(self.node().table)
    }

    /// `Table.column`
    pub fn full_name(&self) -> String {
        match self.table() {
            Some(table) => format!("{}.{}", table.owning_object_name(), self.node().name()),
            None => self.node().name().to_string(),
        }
    }

    pub fn source_column(&self) -> Option<View<'g, Column>> {
        self.node().source_column.and_then(|h| self.follow(h))
    }

    pub fn dependent_columns(&self) -> Vec<View<'g, Column>> {
        self.follow_all(&self.node().dependent_columns)
    }

    pub fn sequences_used(&self) -> Vec<View<'g, Sequence>> {
        self.follow_all(&self.node().sequences_used)
    }

    pub fn udf_dependencies(&self) -> Vec<View<'g, Udf>> {
        self.follow_all(&self.node().udf_dependencies)
    }

    pub fn change_streams(&self) -> Vec<View<'g, ChangeStream>> {
        self.follow_all(&self.node().change_streams)
    }

    pub fn change_streams_explicitly_tracking(&self) -> Vec<View<'g, ChangeStream>> {
        self.follow_all(&self.node().change_streams_explicitly_tracking)
    }

    pub fn locality_group(&self) -> Option<View<'g, LocalityGroup>> {
        self.node().locality_group.and_then(|h| self.follow(h))
    }

    /// Whether the column is part of its table's primary key
    pub fn is_key_column(&self) -> bool {
        self.table().is_some_and(|table| {
            table
                .primary_key()
                .iter()
                .any(|key| key.node().column == self.handle())
        })
    }
}

/// One part of an ordered key
#[derive(Debug, Clone)]
pub struct KeyColumn {
    pub(crate) column: Handle<Column>,
    pub(crate) descending: bool,
    pub(crate) nulls_last: bool,
}

impl KeyColumn {
    pub fn column_handle(&self) -> Handle<Column> {
        self.column
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn is_nulls_last(&self) -> bool {
        self.nulls_last
    }
}

impl SchemaObject for KeyColumn {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        None
    }

    fn debug_label(&self) -> String {
        let order = if self.descending { "DESC" } else { "ASC" };
        format!("K:{}:{}", self.column.slot(), order)
    }

    fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        scope.clone_in_place(&mut self.column)?;
        if scope.is_deleted(self.column) {
            scope.mark_deleted();
        }
        Ok(())
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        column_validator::validate_key_column(self, me, ctx)
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
        f(self.column.erase());
    }
}

impl<'g> View<'g, KeyColumn> {
    pub fn column(&self) -> Option<View<'g, Column>> {
        self.follow(self.node().column)
    }
}
