// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Validation for standalone schema objects: change streams, locality
//! groups, sequences and functions

use super::ValidationContext;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::catalog::{
    ChangeStream, Column, LocalityGroup, Sequence, StorageKind, Udf, DEFAULT_LOCALITY_GROUP,
};
use crate::schema::graph::{Handle, SchemaObject};

pub fn validate_change_stream(
    stream: &ChangeStream,
    me: Handle<ChangeStream>,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    let view = ctx.view(me)?;
    ctx.limits().check_identifier("Change Stream", &stream.name)?;

    if stream.track_all && !stream.tracked_tables.is_empty() {
        return Err(CatalogError::Structural(format!(
            "Change stream {} tracks ALL and cannot also list tables",
            stream.name
        )));
    }
    let tracked_tables = view.tracked_tables();
    for table in &tracked_tables {
        if table.is_deleted() || !table.is_public() {
            return Err(CatalogError::Structural(format!(
                "Change stream {} cannot track table {}",
                stream.name,
                table.name()
            )));
        }
    }
    for column in view.tracked_columns() {
        let tracked = tracked_tables.iter().any(|t| t.handle() == column.table_handle());
        if !tracked {
            return Err(CatalogError::Structural(format!(
                "Change stream {} tracks column {} without tracking its table",
                stream.name,
                column.full_name()
            )));
        }
        if column.is_key_column() {
            return Err(CatalogError::Structural(format!(
                "Change stream {} cannot explicitly track key column {}",
                stream.name,
                column.full_name()
            )));
        }
    }
    if let Some(data_table) = view.change_stream_data_table() {
        if data_table.node().owner_change_stream != Some(me) {
            return Err(CatalogError::Internal(format!(
                "{} does not own its data table {}",
                stream.debug_label(),
                data_table.debug_label()
            )));
        }
    }
    Ok(())
}

pub fn validate_locality_group(
    group: &LocalityGroup,
    _me: Handle<LocalityGroup>,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    ctx.limits().check_identifier("Locality Group", &group.name)?;
    if group.storage == StorageKind::Hdd && group.ssd_to_hdd_spill_timespan.is_some() {
        return Err(CatalogError::Structural(format!(
            "Locality group {} stores data on HDD and cannot set ssd_to_hdd_spill_timespan",
            group.name
        )));
    }
    Ok(())
}

pub fn validate_locality_group_update(
    group: &LocalityGroup,
    me: Handle<LocalityGroup>,
    _prior: &LocalityGroup,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    if !ctx.view(me)?.is_deleted() {
        return Ok(());
    }
    if group.name.eq_ignore_ascii_case(DEFAULT_LOCALITY_GROUP) {
        return Err(CatalogError::Policy(
            "Cannot drop the default locality group".to_string(),
        ));
    }
    // Tables, columns and indexes are validated before locality groups.
    let users = ctx.locality_group_users(me);
    if !users.is_empty() {
        return Err(CatalogError::Policy(format!(
            "Cannot drop locality group {}; it is in use by: {}",
            group.name,
            users.join(", ")
        )));
    }
    Ok(())
}

pub fn validate_sequence(
    sequence: &Sequence,
    _me: Handle<Sequence>,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    if !sequence.internal {
        ctx.limits().check_identifier("Sequence", &sequence.name)?;
    }
    if let Some((min, max)) = sequence.skip_range {
        if min > max {
            return Err(CatalogError::Structural(format!(
                "Sequence {} has an invalid skip range: {} is greater than {}",
                sequence.name, min, max
            )));
        }
    }
    if let Some(start) = sequence.start_with_counter {
        if start < 1 {
            return Err(CatalogError::Structural(format!(
                "Sequence {} must start with a positive counter, got {}",
                sequence.name, start
            )));
        }
    }
    Ok(())
}

pub fn validate_sequence_update(
    sequence: &Sequence,
    me: Handle<Sequence>,
    prior: &Sequence,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    if !ctx.view(me)?.is_deleted() {
        if sequence.kind != prior.kind {
            return Err(CatalogError::Policy(format!(
                "Cannot change the kind of sequence {}",
                sequence.name
            )));
        }
        return Ok(());
    }
    let mut users = ctx.sequence_users(me).to_vec();
    // Functions are validated after sequences, so they are scanned here.
    for udf in ctx.graph().functions() {
        if udf.node().sequences_used.contains(&me) {
            users.push(format!("function {}", udf.name()));
        }
    }
    if !users.is_empty() {
        return Err(CatalogError::Policy(format!(
            "Cannot drop SEQUENCE `{}`; it is in use by: {}",
            sequence.name,
            users.join(", ")
        )));
    }
    Ok(())
}

pub fn validate_udf(udf: &Udf, me: Handle<Udf>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
    ctx.limits().check_identifier("Function", &udf.name)?;
    if udf.definition.trim().is_empty() {
        return Err(CatalogError::Structural(format!(
            "Function {} has an empty definition",
            udf.name
        )));
    }
    if udf.udf_dependencies.contains(&me) {
        return Err(CatalogError::Structural(format!(
            "Function {} cannot depend on itself",
            udf.name
        )));
    }
    for sequence in &udf.sequences_used {
        ctx.note_sequence_use(*sequence, format!("function {}", udf.name));
    }
    for dependency in &udf.udf_dependencies {
        ctx.note_udf_use(*dependency, format!("function {}", udf.name));
    }
    Ok(())
}

pub fn validate_udf_update(
    udf: &Udf,
    me: Handle<Udf>,
    _prior: &Udf,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    if !ctx.view(me)?.is_deleted() {
        return Ok(());
    }
    let mut users = ctx.udf_users(me).to_vec();
    for other in ctx.graph().functions() {
        let user = format!("function {}", other.name());
        if other.node().udf_dependencies.contains(&me) && !users.contains(&user) {
            users.push(user);
        }
    }
    for column in ctx.graph().live::<Column>() {
        let user = format!("column {}", column.full_name());
        if column.node().udf_dependencies.contains(&me) && !users.contains(&user) {
            users.push(user);
        }
    }
    if !users.is_empty() {
        return Err(CatalogError::Policy(format!(
            "Cannot drop FUNCTION `{}`; it is in use by: {}",
            udf.name,
            users.join(", ")
        )));
    }
    Ok(())
}
