// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Foreign key and check constraint validation

use super::ValidationContext;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::catalog::{CheckConstraint, Column, ForeignKey, Table};
use crate::schema::graph::{Handle, SchemaObject, View};

pub fn validate_foreign_key(
    fk: &ForeignKey,
    me: Handle<ForeignKey>,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    ctx.limits().check_identifier("Foreign Key", &fk.name)?;

    let referencing = live_public_table(fk, view.referencing_table(), fk.referencing_table)?;
    let referenced = live_public_table(fk, view.referenced_table(), fk.referenced_table)?;

    if fk.referencing_columns.is_empty() {
        return Err(CatalogError::Structural(format!(
            "Foreign key {} must reference at least one column",
            fk.name
        )));
    }
    if fk.referencing_columns.len() != fk.referenced_columns.len() {
        return Err(CatalogError::Structural(format!(
            "Foreign key {} has {} referencing columns but {} referenced columns",
            fk.name,
            fk.referencing_columns.len(),
            fk.referenced_columns.len()
        )));
    }

    let referencing_columns = view.referencing_columns();
    let referenced_columns = view.referenced_columns();
    check_columns_owned(fk, &referencing_columns, referencing)?;
    check_columns_owned(fk, &referenced_columns, referenced)?;
    for (from, to) in referencing_columns.iter().zip(&referenced_columns) {
        if from.column_type() != to.column_type() {
            return Err(CatalogError::Structural(format!(
                "Foreign key {} column {}.{} of type {} does not match referenced column {}.{} of type {}",
                fk.name,
                referencing.name(),
                from.name(),
                from.column_type(),
                referenced.name(),
                to.name(),
                to.column_type()
            )));
        }
    }

    if !referencing.node().foreign_keys.contains(&me) {
        return Err(CatalogError::Internal(format!(
            "{} is missing from the foreign keys of {}",
            fk.debug_label(),
            referencing.debug_label()
        )));
    }
    if !referenced.node().referencing_foreign_keys.contains(&me) {
        return Err(CatalogError::Internal(format!(
            "{} is missing from the referencing foreign keys of {}",
            fk.debug_label(),
            referenced.debug_label()
        )));
    }
    for index in [view.referencing_index(), view.referenced_index()].into_iter().flatten() {
        if index.is_deleted() {
            return Err(CatalogError::Internal(format!(
                "{} is backed by dropped index {}",
                fk.debug_label(),
                index.name()
            )));
        }
    }
    Ok(())
}

fn live_public_table<'g>(
    fk: &ForeignKey,
    table: Option<View<'g, Table>>,
    handle: Handle<Table>,
) -> CatalogResult<View<'g, Table>> {
    let table = table
        .filter(|t| !t.is_deleted())
        .ok_or_else(|| CatalogError::dangling_reference(&fk.debug_label(), handle.erase()))?;
    if !table.is_public() {
        return Err(CatalogError::Structural(format!(
            "Foreign key {} cannot reference internal table {}",
            fk.name,
            table.owning_object_name()
        )));
    }
    Ok(table)
}

fn check_columns_owned(fk: &ForeignKey, columns: &[View<'_, Column>], table: View<'_, Table>) -> CatalogResult<()> {
    for column in columns {
        if column.is_deleted() || column.table_handle() != table.handle() {
            return Err(CatalogError::Structural(format!(
                "Foreign key {} references column {} which is not in table {}",
                fk.name,
                column.name(),
                table.name()
            )));
        }
    }
    Ok(())
}

pub fn validate_foreign_key_update(
    fk: &ForeignKey,
    me: Handle<ForeignKey>,
    _prior: &ForeignKey,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    let prior_view = match ctx.prior_of(me) {
        Some(prior_view) => prior_view,
        None => return Ok(()),
    };
    if view.is_deleted() {
        return Ok(());
    }
    let ids = |columns: Vec<View<'_, Column>>| columns.iter().map(|c| c.id()).collect::<Vec<_>>();
    if ids(view.referencing_columns()) != ids(prior_view.referencing_columns())
        || ids(view.referenced_columns()) != ids(prior_view.referenced_columns())
    {
        return Err(CatalogError::Policy(format!(
            "Cannot change the columns of foreign key {}",
            fk.name
        )));
    }
    Ok(())
}

pub fn validate_check(
    check: &CheckConstraint,
    me: Handle<CheckConstraint>,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    ctx.limits().check_identifier("Check Constraint", &check.name)?;
    let table = view
        .table()
        .filter(|t| !t.is_deleted())
        .ok_or_else(|| CatalogError::dangling_reference(&check.debug_label(), check.table.erase()))?;
    if !table.node().check_constraints.contains(&me) {
        return Err(CatalogError::Internal(format!(
            "{} is missing from the check constraints of {}",
            check.debug_label(),
            table.debug_label()
        )));
    }
    if check.expression.trim().is_empty() {
        return Err(CatalogError::Structural(format!(
            "Check constraint {} has an empty expression",
            check.name
        )));
    }
    for column in view.dependent_columns() {
        if column.is_deleted() || column.table_handle() != table.handle() {
            return Err(CatalogError::Structural(format!(
                "Check constraint {} references column {} which is not in table {}",
                check.name,
                column.name(),
                table.name()
            )));
        }
    }
    Ok(())
}
