// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Index validation

use std::collections::HashSet;

use super::{data, ValidationContext};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::catalog::{Column, Index, IndexKind, Table};
use crate::schema::graph::{Handle, NodeStatus, SchemaObject, View};

pub fn validate(index: &Index, me: Handle<Index>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    ctx.limits().check_identifier("Index", &index.name)?;

    let base = view
        .indexed_table()
        .filter(|t| !t.is_deleted())
        .ok_or_else(|| CatalogError::dangling_reference(&index.debug_label(), index.indexed_table.erase()))?;
    if !base.is_public() {
        return Err(CatalogError::Structural(format!(
            "Index {} cannot be created on internal table {}",
            index.name,
            base.owning_object_name()
        )));
    }
    if !base.node().indexes.contains(&me) {
        return Err(CatalogError::Internal(format!(
            "{} is missing from the indexes of {}",
            index.debug_label(),
            base.debug_label()
        )));
    }
    let data_table = view
        .index_data_table()
        .ok_or_else(|| CatalogError::dangling_reference(&index.debug_label(), index.index_data_table.erase()))?;
    if data_table.owner_index_handle() != Some(me) {
        return Err(CatalogError::Internal(format!(
            "{} does not own its data table {}",
            index.debug_label(),
            data_table.debug_label()
        )));
    }

    if index.kind == IndexKind::Index && index.key_columns.is_empty() {
        return Err(CatalogError::Structural(format!(
            "Index {} must have at least one key column",
            index.name
        )));
    }
    if index.key_columns.len() > ctx.limits().max_key_columns {
        return Err(CatalogError::Policy(format!(
            "Index {} has too many key columns; the limit is {}",
            index.name,
            ctx.limits().max_key_columns
        )));
    }
    if index.kind == IndexKind::Index && !(index.partition_by.is_empty() && index.order_by.is_empty()) {
        return Err(CatalogError::Structural(format!(
            "PARTITION BY and ORDER BY are only supported on search and vector indexes, not on {}",
            index.name
        )));
    }

    let mut seen = HashSet::new();
    for key in view.key_columns() {
        let column = key
            .column()
            .ok_or_else(|| CatalogError::dangling_reference(&index.debug_label(), key.column_handle().erase()))?;
        let source = check_data_column(index, column, data_table, base)?;
        if !seen.insert(source.id()) {
            return Err(CatalogError::Structural(format!(
                "Index {} references column {} more than once",
                index.name,
                source.name()
            )));
        }
        if index.kind == IndexKind::Index && !column.column_type().is_key_type() {
            return Err(CatalogError::Structural(format!(
                "Index {} cannot use column {} of type {} as a key",
                index.name,
                source.name(),
                column.column_type()
            )));
        }
    }
    for column in view.stored_columns() {
        let source = check_data_column(index, column, data_table, base)?;
        if !seen.insert(source.id()) {
            return Err(CatalogError::Structural(format!(
                "Column {} is part of the key of index {} and cannot be stored",
                source.name(),
                index.name
            )));
        }
    }
    for column in view.null_filtered_columns().into_iter().chain(view.partition_by()) {
        if column.table_handle() != data_table.handle() {
            return Err(CatalogError::Internal(format!(
                "{} filters on column {} outside its data table",
                index.debug_label(),
                column.name()
            )));
        }
    }

    if let Some(group) = index.locality_group {
        ctx.note_locality_group_use(group, format!("index {}", index.name));
    }

    let is_new = ctx.prior_of(me).is_none();
    if is_new && index.unique {
        if let Some(rows) = ctx.rows() {
            data::check_unique_index(rows, view)?;
        }
    }
    Ok(())
}

/// A data table column must derive from a live column of the indexed table.
/// Returns that source column.
fn check_data_column<'g>(
    index: &Index,
    column: View<'g, Column>,
    data_table: View<'g, Table>,
    base: View<'g, Table>,
) -> CatalogResult<View<'g, Column>> {
    if column.table_handle() != data_table.handle() {
        return Err(CatalogError::Internal(format!(
            "{} uses column {} outside its data table",
            index.debug_label(),
            column.name()
        )));
    }
    let source = column.source_column().ok_or_else(|| {
        CatalogError::Internal(format!(
            "{} column {} has no source column",
            index.debug_label(),
            column.name()
        ))
    })?;
    if source.is_deleted() {
        return Err(CatalogError::column_in_use_by_index(base.name(), source.name(), &index.name));
    }
    if source.table_handle() != base.handle() {
        return Err(CatalogError::Structural(format!(
            "Index {} references column {} which is not in table {}",
            index.name,
            source.name(),
            base.name()
        )));
    }
    Ok(source)
}

pub fn validate_update(
    index: &Index,
    me: Handle<Index>,
    prior: &Index,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    let graph = ctx.graph();
    if view.is_deleted() {
        if !ctx.was_dropped(me.slot()) {
            return Ok(());
        }
        let users: Vec<String> = prior
            .managing_nodes
            .iter()
            .filter_map(|m| {
                let current = m.retag(graph.version());
                (graph.status(current) == Some(NodeStatus::Live))
                    .then(|| graph.resolve_any(current).map(|n| n.debug_label()))
                    .flatten()
            })
            .collect();
        if !users.is_empty() {
            return Err(CatalogError::Policy(format!(
                "Cannot drop index {}. It is in use by: {}",
                index.name,
                users.join(", ")
            )));
        }
        return Ok(());
    }

    let source_ids = |v: View<'_, Index>| -> Vec<_> {
        v.key_columns()
            .iter()
            .filter_map(|k| k.column().and_then(|c| c.source_column()).map(|c| c.id()))
            .collect()
    };
    if let Some(prior_view) = ctx.prior_of(me) {
        if source_ids(prior_view) != source_ids(view) {
            return Err(CatalogError::Policy(format!(
                "Cannot change the key columns of index {}",
                index.name
            )));
        }
    }
    if index.unique != prior.unique || index.null_filtered != prior.null_filtered {
        return Err(CatalogError::Policy(format!(
            "Cannot change UNIQUE or NULL_FILTERED on existing index {}",
            index.name
        )));
    }
    Ok(())
}
