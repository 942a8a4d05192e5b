// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Table nodes

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ChangeStream, CheckConstraint, Column, ForeignKey, Index, KeyColumn, LocalityGroup};
use crate::catalog::error::CatalogResult;
use crate::catalog::ids::TableId;
use crate::schema::graph::{
    CloneScope, Handle, NameSpace, NodeRef, NodeVariant, SchemaNameInfo, SchemaObject, View,
};
use crate::schema::validators::{table_validator, ValidationContext};

/// What happens to interleaved child rows when a parent row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OnDeleteAction {
    #[default]
    NoAction,
    Cascade,
}

/// Row expiry policy: rows older than `older_than_days` by `column` are purged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDeletionPolicy {
    pub column: String,
    pub older_than_days: i64,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub(crate) name: String,
    pub(crate) id: TableId,
    pub(crate) columns: Vec<Handle<Column>>,
    /// Lowercased column name to column
    pub(crate) columns_by_name: HashMap<String, Handle<Column>>,
    pub(crate) primary_key: Vec<Handle<KeyColumn>>,
    pub(crate) parent: Option<Handle<Table>>,
    pub(crate) children: Vec<Handle<Table>>,
    pub(crate) on_delete: OnDeleteAction,
    pub(crate) row_deletion_policy: Option<RowDeletionPolicy>,
    pub(crate) foreign_keys: Vec<Handle<ForeignKey>>,
    pub(crate) referencing_foreign_keys: Vec<Handle<ForeignKey>>,
    pub(crate) check_constraints: Vec<Handle<CheckConstraint>>,
    pub(crate) indexes: Vec<Handle<Index>>,
    pub(crate) change_streams: Vec<Handle<ChangeStream>>,
    pub(crate) explicit_change_streams: Vec<Handle<ChangeStream>>,
    pub(crate) owner_index: Option<Handle<Index>>,
    pub(crate) owner_change_stream: Option<Handle<ChangeStream>>,
    pub(crate) locality_group: Option<Handle<LocalityGroup>>,
    pub(crate) synonym: Option<String>,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn synonym(&self) -> Option<&str> {
        self.synonym.as_deref()
    }

    pub fn on_delete(&self) -> OnDeleteAction {
        self.on_delete
    }

    pub fn row_deletion_policy(&self) -> Option<&RowDeletionPolicy> {
        self.row_deletion_policy.as_ref()
    }

    /// A table is public unless it stores data for an index or change stream
    pub fn is_public(&self) -> bool {
        self.owner_index.is_none() && self.owner_change_stream.is_none()
    }

    pub fn column_handle(&self, name: &str) -> Option<Handle<Column>> {
        self.columns_by_name.get(&name.to_lowercase()).copied()
    }

    pub fn column_handles(&self) -> &[Handle<Column>] {
        &self.columns
    }

    pub fn primary_key_handles(&self) -> &[Handle<KeyColumn>] {
        &self.primary_key
    }

    pub fn index_handles(&self) -> &[Handle<Index>] {
        &self.indexes
    }

    pub fn owner_index_handle(&self) -> Option<Handle<Index>> {
        self.owner_index
    }

    pub fn parent_handle(&self) -> Option<Handle<Table>> {
        self.parent
    }

    pub(crate) fn rebuild_column_map(&mut self, names: Vec<(String, Handle<Column>)>) {
        self.columns_by_name = names
            .into_iter()
            .map(|(name, handle)| (name.to_lowercase(), handle))
            .collect();
    }
}

impl SchemaObject for Table {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        // Data tables share their owner's name; only the owner claims it.
        self.is_public()
            .then(|| SchemaNameInfo::new(&self.name, "Table", NameSpace::Global))
    }

    fn debug_label(&self) -> String {
        format!("T:{}[{}]", self.name, self.id)
    }

    fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        if let Some(parent) = self.parent.as_mut() {
            scope.clone_in_place(parent)?;
            if scope.is_deleted(*parent) && self.on_delete == OnDeleteAction::Cascade {
                scope.mark_deleted();
            }
        }
        // Owner status first, so columns cloned below see a dropped table.
        scope.clone_opt(&mut self.owner_index)?;
        if let Some(index) = self.owner_index {
            if scope.is_deleted(index) {
                scope.mark_deleted();
            }
        }
        scope.clone_opt(&mut self.owner_change_stream)?;
        if let Some(stream) = self.owner_change_stream {
            if scope.is_deleted(stream) {
                scope.mark_deleted();
            }
        }

        scope.clone_vec(&mut self.columns)?;
        let mut names = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            names.push((scope.get(*column)?.name.clone(), *column));
        }
        self.rebuild_column_map(names);

        scope.clone_vec(&mut self.primary_key)?;
        scope.clone_vec(&mut self.children)?;
        scope.clone_vec(&mut self.indexes)?;
        scope.clone_vec(&mut self.foreign_keys)?;
        scope.clone_vec(&mut self.referencing_foreign_keys)?;
        scope.clone_vec(&mut self.check_constraints)?;
        scope.clone_vec(&mut self.change_streams)?;
        scope.clone_vec(&mut self.explicit_change_streams)?;

        scope.clone_opt(&mut self.locality_group)?;
        Ok(())
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        table_validator::validate(self, me, ctx)
    }

    fn validate_update(
        &self,
        me: Handle<Self>,
        prior: &Self,
        ctx: &mut ValidationContext<'_>,
    ) -> CatalogResult<()> {
        table_validator::validate_update(self, me, prior, ctx)
    }

    fn for_each_ref(&self, f: &mut dyn FnMut(NodeRef)) {
        self.columns.iter().for_each(|h| f(h.erase()));
        self.columns_by_name.values().for_each(|h| f(h.erase()));
        self.primary_key.iter().for_each(|h| f(h.erase()));
        self.parent.iter().for_each(|h| f(h.erase()));
        self.children.iter().for_each(|h| f(h.erase()));
        self.foreign_keys.iter().for_each(|h| f(h.erase()));
        self.referencing_foreign_keys.iter().for_each(|h| f(h.erase()));
        self.check_constraints.iter().for_each(|h| f(h.erase()));
        self.indexes.iter().for_each(|h| f(h.erase()));
        self.change_streams.iter().for_each(|h| f(h.erase()));
        self.explicit_change_streams.iter().for_each(|h| f(h.erase()));
        self.owner_index.iter().for_each(|h| f(h.erase()));
        self.owner_change_stream.iter().for_each(|h| f(h.erase()));
        self.locality_group.iter().for_each(|h| f(h.erase()));
    }
}

fn find_by_name<'g, T, F>(items: Vec<View<'g, T>>, name: &str, name_of: F) -> Option<View<'g, T>>
where
    F: Fn(&T) -> &str,
{
    items
        .into_iter()
        .find(|item| name_of(item.node()).eq_ignore_ascii_case(name))
}

impl<'g> View<'g, Table> {
    pub fn columns(&self) -> Vec<View<'g, Column>> {
        self.follow_all(&self.node().columns)
    }

    /// Case-insensitive column lookup
    pub fn find_column(&self, name: &str) -> Option<View<'g, Column>> {
        self.node().column_handle(name).and_then(|h| self.follow(h))
    }

    pub fn find_column_case_sensitive(&self, name: &str) -> Option<View<'g, Column>> {
        self.find_column(name).filter(|c| c.name() == name)
    }

    pub fn primary_key(&self) -> Vec<View<'g, KeyColumn>> {
        self.follow_all(&self.node().primary_key)
    }

    /// The primary key part over the named column
    pub fn find_key_column(&self, name: &str) -> Option<View<'g, KeyColumn>> {
        self.primary_key()
            .into_iter()
            .find(|key| key.column().is_some_and(|c| c.name().eq_ignore_ascii_case(name)))
    }

    /// Key column names as `<a>, <b>`
    pub fn primary_key_debug_string(&self) -> String {
        self.primary_key()
            .iter()
            .filter_map(|key| key.column())
            .map(|c| format!("<{}>", c.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn parent(&self) -> Option<View<'g, Table>> {
        self.node().parent.and_then(|h| self.follow(h))
    }

    pub fn children(&self) -> Vec<View<'g, Table>> {
        self.follow_all(&self.node().children)
    }

    pub fn indexes(&self) -> Vec<View<'g, Index>> {
        self.follow_all(&self.node().indexes)
    }

    pub fn find_index(&self, name: &str) -> Option<View<'g, Index>> {
        find_by_name(self.indexes(), name, |i| i.name())
    }

    pub fn foreign_keys(&self) -> Vec<View<'g, ForeignKey>> {
        self.follow_all(&self.node().foreign_keys)
    }

    pub fn find_foreign_key(&self, name: &str) -> Option<View<'g, ForeignKey>> {
        find_by_name(self.foreign_keys(), name, |fk| fk.name())
    }

    pub fn referencing_foreign_keys(&self) -> Vec<View<'g, ForeignKey>> {
        self.follow_all(&self.node().referencing_foreign_keys)
    }

    pub fn find_referencing_foreign_key(&self, name: &str) -> Option<View<'g, ForeignKey>> {
        find_by_name(self.referencing_foreign_keys(), name, |fk| fk.name())
    }

    pub fn check_constraints(&self) -> Vec<View<'g, CheckConstraint>> {
        self.follow_all(&self.node().check_constraints)
    }

    pub fn find_check_constraint(&self, name: &str) -> Option<View<'g, CheckConstraint>> {
        find_by_name(self.check_constraints(), name, |ck| ck.name())
    }

    pub fn change_streams(&self) -> Vec<View<'g, ChangeStream>> {
        self.follow_all(&self.node().change_streams)
    }

    pub fn find_change_stream(&self, name: &str) -> Option<View<'g, ChangeStream>> {
        find_by_name(self.change_streams(), name, |cs| cs.name())
    }

    pub fn owner_index(&self) -> Option<View<'g, Index>> {
        self.node().owner_index.and_then(|h| self.follow(h))
    }

    pub fn owner_change_stream(&self) -> Option<View<'g, ChangeStream>> {
        self.node().owner_change_stream.and_then(|h| self.follow(h))
    }

    pub fn locality_group(&self) -> Option<View<'g, LocalityGroup>> {
        self.node().locality_group.and_then(|h| self.follow(h))
    }

    /// Name of the object this table stores data for, or its own name
    pub fn owning_object_name(&self) -> &'g str {
        if let Some(index) = self.owner_index() {
            return index.node().name();
        }
        if let Some(stream) = self.owner_change_stream() {
            return stream.node().name();
        }
        self.node().name()
    }

    pub fn owning_object_type(&self) -> &'static str {
        if self.node().owner_index.is_some() {
            Index::KIND.as_str()
        } else if self.node().owner_change_stream.is_some() {
            ChangeStream::KIND.as_str()
        } else {
            Table::KIND.as_str()
        }
    }

    /// Interleave depth, 1 for a top-level table
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.parent();
        while let Some(parent) = current {
            depth += 1;
            current = parent.parent();
        }
        depth
    }
}
