// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Change stream nodes

use super::{Column, Table};
use crate::catalog::error::CatalogResult;
use crate::catalog::ids::ChangeStreamId;
use crate::schema::graph::{
    CloneScope, Handle, NameSpace, NodeRef, SchemaNameInfo, SchemaObject, View,
};
use crate::schema::validators::{object_validator, ValidationContext};

#[derive(Debug, Clone)]
pub struct ChangeStream {
    pub(crate) name: String,
    pub(crate) id: ChangeStreamId,
    pub(crate) track_all: bool,
    pub(crate) tracked_tables: Vec<Handle<Table>>,
    pub(crate) tracked_columns: Vec<Handle<Column>>,
    pub(crate) change_stream_data_table: Option<Handle<Table>>,
    pub(crate) retention_period: Option<String>,
    pub(crate) value_capture_type: Option<String>,
}

impl ChangeStream {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ChangeStreamId {
        self.id
    }

    pub fn tracks_all(&self) -> bool {
        self.track_all
    }

    pub fn retention_period(&self) -> Option<&str> {
        self.retention_period.as_deref()
    }

    pub fn value_capture_type(&self) -> Option<&str> {
        self.value_capture_type.as_deref()
    }
}

impl SchemaObject for ChangeStream {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        Some(SchemaNameInfo::new(&self.name, "Change Stream", NameSpace::ChangeStream))
    }

    fn debug_label(&self) -> String {
        format!("CS:{}[{}]", self.name, self.id)
    }

    fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        scope.clone_vec(&mut self.tracked_tables)?;
        scope.clone_vec(&mut self.tracked_columns)?;
        scope.clone_opt(&mut self.change_stream_data_table)
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        object_validator::validate_change_stream(self, me, ctx)
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
        self.tracked_tables.iter().for_each(|h| f(h.erase()));
        self.tracked_columns.iter().for_each(|h| f(h.erase()));
        self.change_stream_data_table.iter().for_each(|h| f(h.erase()));
    }
}

impl<'g> View<'g, ChangeStream> {
    pub fn tracked_tables(&self) -> Vec<View<'g, Table>> {
        self.follow_all(&self.node().tracked_tables)
    }

    pub fn tracked_columns(&self) -> Vec<View<'g, Column>> {
        self.follow_all(&self.node().tracked_columns)
    }

    pub fn change_stream_data_table(&self) -> Option<View<'g, Table>> {
        self.node().change_stream_data_table.and_then(|h| self.follow(h))
    }
}
