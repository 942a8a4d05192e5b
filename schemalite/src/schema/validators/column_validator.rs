// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Column and key column validation

use super::{data, ValidationContext};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::catalog::{Column, KeyColumn, Table};
use crate::schema::graph::{Handle, SchemaObject, View};
use crate::schema::types::ColumnType;

pub fn validate(column: &Column, me: Handle<Column>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    let table = view
        .table()
        .filter(|t| !t.is_deleted())
        .ok_or_else(|| CatalogError::dangling_reference(&column.debug_label(), column.table.erase()))?;
    if !table.node().columns.contains(&me) {
        return Err(CatalogError::Internal(format!(
            "{} is missing from the columns of {}",
            column.debug_label(),
            table.debug_label()
        )));
    }
    let full_name = view.full_name();

    if table.is_public() {
        ctx.limits().check_identifier("Column", &column.name)?;
    }
    validate_type_options(column, &full_name)?;

    if column.dependent_columns.len() != column.dependent_column_names.len() {
        let missing = column
            .dependent_column_names
            .iter()
            .find(|name| {
                !name.eq_ignore_ascii_case(&column.name) && table.find_column(name).is_none()
            })
            .cloned()
            .unwrap_or_default();
        return Err(CatalogError::Structural(format!(
            "Column {} references unknown column {}",
            full_name, missing
        )));
    }

    for sequence in &column.sequences_used {
        ctx.note_sequence_use(*sequence, format!("column {}", full_name));
    }
    for udf in &column.udf_dependencies {
        ctx.note_udf_use(*udf, format!("column {}", full_name));
    }
    if let Some(group) = column.locality_group {
        ctx.note_locality_group_use(group, format!("column {}", full_name));
    }

    let max_streams = ctx.limits().max_change_streams_per_column;
    if column.change_streams_explicitly_tracking.len() > max_streams {
        return Err(CatalogError::Policy(format!(
            "Column {} is tracked by too many change streams; the limit is {}",
            full_name, max_streams
        )));
    }

    if let Some(source) = view.source_column() {
        validate_derived(column, view, source, table)?;
    }
    Ok(())
}

fn validate_type_options(column: &Column, full_name: &str) -> CatalogResult<()> {
    if let Some(length) = column.declared_max_length {
        if !column.column_type.supports_max_length() {
            return Err(CatalogError::Structural(format!(
                "Column {} of type {} cannot declare a max length",
                full_name, column.column_type
            )));
        }
        if length <= 0 {
            return Err(CatalogError::Structural(format!(
                "Max length of column {} must be positive, got {}",
                full_name, length
            )));
        }
    }
    if column.vector_length.is_some() && !column.column_type.supports_vector_length() {
        return Err(CatalogError::Structural(format!(
            "vector_length is only allowed on ARRAY<FLOAT32> or ARRAY<FLOAT64> columns; {} is {}",
            full_name, column.column_type
        )));
    }
    if column.allows_commit_timestamp && column.column_type != ColumnType::Timestamp {
        return Err(CatalogError::Structural(format!(
            "Column {} has option allow_commit_timestamp but is not of type TIMESTAMP",
            full_name
        )));
    }
    Ok(())
}

fn validate_derived(
    column: &Column,
    view: View<'_, Column>,
    source: View<'_, Column>,
    table: View<'_, Table>,
) -> CatalogResult<()> {
    let index = table.owner_index().ok_or_else(|| {
        CatalogError::Internal(format!(
            "{} is derived but {} is not an index data table",
            column.debug_label(),
            table.debug_label()
        ))
    })?;
    let base_table = index.indexed_table();
    if source.is_deleted() {
        let base_name = base_table.map(|t| t.name().to_string()).unwrap_or_default();
        return Err(CatalogError::column_in_use_by_index(
            &base_name,
            source.name(),
            index.name(),
        ));
    }
    if base_table.map(|t| t.handle()) != Some(source.table_handle()) {
        return Err(CatalogError::Internal(format!(
            "{} derives from a column outside the indexed table",
            column.debug_label()
        )));
    }
    if column.column_type != source.node().column_type {
        return Err(CatalogError::Internal(format!(
            "{} did not pick up the type of {}",
            column.debug_label(),
            source.debug_label()
        )));
    }
    if column.nullable && index.null_filter_reason(view.node()).is_some() {
        return Err(CatalogError::Internal(format!(
            "{} is null-filtered by index {} but nullable",
            column.debug_label(),
            index.name()
        )));
    }
    Ok(())
}

pub fn validate_update(
    column: &Column,
    me: Handle<Column>,
    prior: &Column,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    let table = match view.table() {
        Some(table) => table,
        None => return Ok(()),
    };
    if view.is_deleted() {
        if table.is_deleted() {
            return Ok(());
        }
        return validate_drop(column, view, table);
    }
    if !table.is_public() {
        // Data table columns follow their source.
        return Ok(());
    }
    let full_name = view.full_name();

    if column.column_type != prior.column_type {
        if view.is_key_column() {
            return Err(CatalogError::Policy(format!(
                "Cannot change the type of key column {}",
                full_name
            )));
        }
        if !prior.column_type.can_alter_to(&column.column_type) {
            return Err(CatalogError::Incompatible(format!(
                "Cannot change type of column {} from {} to {}",
                full_name, prior.column_type, column.column_type
            )));
        }
    }
    if column.is_generated() != prior.is_generated() {
        return Err(CatalogError::Policy(format!(
            "Cannot convert column {} to or from a generated column",
            full_name
        )));
    }

    let rows = match ctx.rows() {
        Some(rows) => rows,
        None => return Ok(()),
    };
    if prior.nullable && !column.nullable {
        data::check_not_null(rows, table.node(), column)?;
    }
    if let Some(new_length) = column.declared_max_length {
        let shrinks = prior.declared_max_length.map_or(true, |old| new_length < old);
        if shrinks {
            data::check_max_length(rows, table.node(), column, new_length)?;
        }
    }
    Ok(())
}

fn validate_drop(column: &Column, view: View<'_, Column>, table: View<'_, Table>) -> CatalogResult<()> {
    for index in table.indexes() {
        let data_table = match index.index_data_table() {
            Some(data_table) => data_table,
            None => continue,
        };
        let uses_column = data_table
            .columns()
            .iter()
            .any(|c| c.source_column_handle() == Some(view.handle()));
        if uses_column {
            return Err(CatalogError::column_in_use_by_index(
                table.name(),
                &column.name,
                index.name(),
            ));
        }
    }
    for other in table.columns() {
        let depends = other
            .dependent_column_names()
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&column.name));
        if depends {
            return Err(CatalogError::Policy(format!(
                "Cannot drop column `{}` from table `{}` because it is referenced by generated column `{}`",
                column.name,
                table.name(),
                other.name()
            )));
        }
    }
    for check in table.check_constraints() {
        if check.node().dependent_columns.contains(&view.handle()) {
            return Err(CatalogError::Policy(format!(
                "Cannot drop column `{}` from table `{}` because it is referenced by check constraint `{}`",
                column.name,
                table.name(),
                check.name()
            )));
        }
    }
    let streams: Vec<String> = view
        .change_streams_explicitly_tracking()
        .into_iter()
        .filter(|stream| !stream.is_deleted())
        .map(|stream| stream.name().to_string())
        .collect();
    if !streams.is_empty() {
        return Err(CatalogError::Policy(format!(
            "Cannot drop column `{}` from table `{}` because it is tracked by change streams: {}",
            column.name,
            table.name(),
            streams.join(", ")
        )));
    }
    for fk in table.foreign_keys().into_iter().chain(table.referencing_foreign_keys()) {
        let node = fk.node();
        if node.referencing_columns.contains(&view.handle()) || node.referenced_columns.contains(&view.handle()) {
            return Err(CatalogError::Policy(format!(
                "Cannot drop column `{}` from table `{}` because it is referenced by foreign key `{}`",
                column.name,
                table.name(),
                fk.name()
            )));
        }
    }
    Ok(())
}

pub fn validate_key_column(
    key: &KeyColumn,
    _me: Handle<KeyColumn>,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    let column = ctx.view(key.column)?;
    if column.is_deleted() {
        return Err(CatalogError::Internal(format!(
            "{} is live but its column {} is deleted",
            key.debug_label(),
            column.debug_label()
        )));
    }
    Ok(())
}
