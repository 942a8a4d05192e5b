// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Table validation

use std::collections::HashSet;

use super::ValidationContext;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::ids::ColumnId;
use crate::schema::catalog::{OnDeleteAction, Table};
use crate::schema::graph::{Handle, NodeStatus, SchemaObject, View};
use crate::schema::types::ColumnType;

pub fn validate(table: &Table, me: Handle<Table>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    let limits = ctx.limits();

    if table.is_public() {
        limits.check_identifier("Table", &table.name)?;
    }
    if table.owner_index.is_some() && table.owner_change_stream.is_some() {
        return Err(CatalogError::Structural(format!(
            "Table {} cannot belong to both an index and a change stream",
            table.name
        )));
    }
    if table.columns.len() > limits.max_columns_per_table {
        return Err(CatalogError::Policy(format!(
            "Table {} has too many columns; the limit is {}",
            table.name, limits.max_columns_per_table
        )));
    }

    let mut seen = HashSet::new();
    for column in view.columns() {
        if column.table_handle() != me {
            return Err(CatalogError::Internal(format!(
                "{} lists column {} owned by another table",
                table.debug_label(),
                column.name()
            )));
        }
        if !seen.insert(column.name().to_lowercase()) {
            return Err(CatalogError::Duplicate(format!(
                "Duplicate column name {}.{}",
                table.name,
                column.name()
            )));
        }
    }

    validate_primary_key(table, view, ctx)?;
    validate_interleaving(table, view, ctx)?;

    if let Some(index) = view.owner_index() {
        if index.index_data_table_handle() != me {
            return Err(CatalogError::Internal(format!(
                "{} is owned by index {} which stores its data elsewhere",
                table.debug_label(),
                index.name()
            )));
        }
        // The data table key starts with the index key.
        let index_keys = index.key_column_handles();
        if table.primary_key.len() < index_keys.len() || table.primary_key[..index_keys.len()] != *index_keys {
            return Err(CatalogError::Internal(format!(
                "Key of {} does not start with the key of index {}",
                table.debug_label(),
                index.name()
            )));
        }
    }

    if table.is_public() && table.indexes.len() > limits.max_indexes_per_table {
        return Err(CatalogError::Policy(format!(
            "Table {} has too many indexes; the limit is {}",
            table.name, limits.max_indexes_per_table
        )));
    }
    for index in view.indexes() {
        if index.indexed_table_handle() != me {
            return Err(CatalogError::Internal(format!(
                "{} lists index {} of another table",
                table.debug_label(),
                index.name()
            )));
        }
    }

    if let Some(policy) = &table.row_deletion_policy {
        let column = view.find_column(&policy.column).ok_or_else(|| {
            CatalogError::Structural(format!(
                "Row deletion policy of table {} references unknown column {}",
                table.name, policy.column
            ))
        })?;
        if *column.column_type() != ColumnType::Timestamp {
            return Err(CatalogError::Structural(format!(
                "Row deletion policy column {}.{} must be of type TIMESTAMP",
                table.name,
                column.name()
            )));
        }
        if policy.older_than_days < 0 {
            return Err(CatalogError::Structural(format!(
                "Row deletion policy of table {} must use a non-negative interval",
                table.name
            )));
        }
    }

    if let Some(group) = table.locality_group {
        ctx.note_locality_group_use(group, format!("table {}", table.name));
    }
    Ok(())
}

fn validate_primary_key(table: &Table, view: View<'_, Table>, ctx: &ValidationContext<'_>) -> CatalogResult<()> {
    let max_keys = ctx.limits().max_key_columns;
    if table.is_public() && table.primary_key.len() > max_keys {
        return Err(CatalogError::Policy(format!(
            "Table {} has too many key columns; the limit is {}",
            table.name, max_keys
        )));
    }
    let mut seen = HashSet::new();
    for key in view.primary_key() {
        let column = key.column().ok_or_else(|| {
            CatalogError::dangling_reference(&table.debug_label(), key.column_handle().erase())
        })?;
        if column.table_handle() != view.handle() {
            return Err(CatalogError::Structural(format!(
                "Primary key of table {} references column {} of another table",
                table.name,
                column.name()
            )));
        }
        if !seen.insert(column.id()) {
            return Err(CatalogError::Structural(format!(
                "Table {} references column {} more than once in its primary key",
                table.name,
                column.name()
            )));
        }
        if table.is_public() && !column.column_type().is_key_type() {
            return Err(CatalogError::Structural(format!(
                "Column {}.{} has type {}, which is not supported in a primary key",
                table.name,
                column.name(),
                column.column_type()
            )));
        }
    }
    Ok(())
}

fn validate_interleaving(table: &Table, view: View<'_, Table>, ctx: &ValidationContext<'_>) -> CatalogResult<()> {
    let parent = match view.parent() {
        Some(parent) => parent,
        None => {
            if table.on_delete == OnDeleteAction::Cascade {
                return Err(CatalogError::Structural(format!(
                    "ON DELETE CASCADE on table {} requires an INTERLEAVE IN PARENT clause",
                    table.name
                )));
            }
            return Ok(());
        }
    };
    if parent.is_deleted() {
        return Err(CatalogError::Structural(format!(
            "Table {} is interleaved in dropped table {}",
            table.name,
            parent.name()
        )));
    }
    if !parent.node().children.contains(&view.handle()) {
        return Err(CatalogError::Internal(format!(
            "{} is missing from the children of {}",
            table.debug_label(),
            parent.debug_label()
        )));
    }
    if view.depth() > ctx.limits().max_interleave_depth {
        return Err(CatalogError::Policy(format!(
            "Table {} is interleaved too deeply; the limit is {}",
            table.name,
            ctx.limits().max_interleave_depth
        )));
    }

    // The parent key must be a prefix of the child key.
    let parent_key = parent.primary_key();
    let child_key = view.primary_key();
    for (i, parent_part) in parent_key.iter().enumerate() {
        let parent_column = match parent_part.column() {
            Some(column) => column,
            None => continue,
        };
        let child_column = child_key.get(i).and_then(|k| k.column());
        let matches = child_column.is_some_and(|c| {
            c.name().eq_ignore_ascii_case(parent_column.name())
                && c.column_type() == parent_column.column_type()
        });
        if !matches {
            return Err(CatalogError::Structural(format!(
                "Table {} does not reference parent key column {} of table {} at position {}",
                table.name,
                parent_column.name(),
                parent.name(),
                i + 1
            )));
        }
    }
    Ok(())
}

pub fn validate_update(
    table: &Table,
    me: Handle<Table>,
    prior: &Table,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    if view.is_deleted() {
        return validate_drop(table, me, ctx);
    }

    let prior_view = ctx
        .prior_of(me)
        .ok_or_else(|| CatalogError::Internal(format!("{} has no prior version", table.debug_label())))?;
    let prior_key = key_column_ids(prior_view);
    let new_key = key_column_ids(view);
    if prior_key != new_key {
        for (id, name) in &prior_key {
            if !new_key.iter().any(|(new_id, _)| new_id == id) {
                return Err(CatalogError::Policy(format!(
                    "Cannot drop key column `{}` from table `{}`",
                    name, table.name
                )));
            }
        }
        return Err(CatalogError::Policy(format!(
            "Cannot change the primary key of table {}",
            table.name
        )));
    }

    let parent_slot = |t: &Table| t.parent.map(|p| p.slot());
    if parent_slot(table) != parent_slot(prior) {
        return Err(CatalogError::Policy(format!(
            "Cannot change the interleaving of table {}",
            table.name
        )));
    }
    if table.is_public() != prior.is_public() {
        return Err(CatalogError::Internal(format!(
            "{} changed visibility",
            table.debug_label()
        )));
    }
    Ok(())
}

fn key_column_ids(table: View<'_, Table>) -> Vec<(ColumnId, String)> {
    table
        .primary_key()
        .iter()
        .filter_map(|key| key.column())
        .map(|column| (column.id(), column.name().to_string()))
        .collect()
}

fn validate_drop(table: &Table, me: Handle<Table>, ctx: &ValidationContext<'_>) -> CatalogResult<()> {
    let prior = match ctx.prior_of(me) {
        Some(prior) => prior,
        None => return Ok(()),
    };
    let graph = ctx.graph();

    let live_children: Vec<String> = prior
        .children()
        .iter()
        .filter(|child| ctx.current_of(child.handle()).is_some_and(|c| !c.is_deleted()))
        .map(|child| child.name().to_string())
        .collect();
    if !live_children.is_empty() {
        return Err(CatalogError::Policy(format!(
            "Cannot drop table {} with interleaved tables: {}",
            table.name,
            live_children.join(", ")
        )));
    }

    if ctx.was_dropped(me.slot()) {
        let blocking: Vec<String> = prior
            .indexes()
            .iter()
            .filter(|index| {
                // Indexes kept alive only by constraints dropped with the
                // table go away with it.
                !index.is_managed()
                    || index
                        .managing_nodes()
                        .iter()
                        .any(|m| graph.status(m.retag(graph.version())) == Some(NodeStatus::Live))
            })
            .map(|index| index.name().to_string())
            .collect();
        if !blocking.is_empty() {
            return Err(CatalogError::Policy(format!(
                "Cannot drop table {} with indices: {}",
                table.name,
                blocking.join(", ")
            )));
        }
    }

    for fk in prior.referencing_foreign_keys() {
        if ctx.current_of(fk.handle()).is_some_and(|f| !f.is_deleted()) {
            return Err(CatalogError::Policy(format!(
                "Cannot drop table {}: it is referenced by foreign key {}",
                table.name,
                fk.name()
            )));
        }
    }

    let tracked_by: Vec<String> = prior
        .follow_all(&prior.node().explicit_change_streams)
        .iter()
        .filter(|cs| ctx.current_of(cs.handle()).is_some_and(|c| !c.is_deleted()))
        .map(|cs| cs.name().to_string())
        .collect();
    if !tracked_by.is_empty() {
        return Err(CatalogError::Policy(format!(
            "Cannot drop table {}: it is tracked by change streams: {}",
            table.name,
            tracked_by.join(", ")
        )));
    }
    Ok(())
}
