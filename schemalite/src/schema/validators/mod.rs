// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Candidate graph validation
//!
//! Every live node of a candidate is validated on its own, then compared
//! against its counterpart in the prior version when one exists. Deleted
//! nodes only get the comparison, which is where drop restrictions live.
//! Nodes are visited in [`NodeKind::validation_rank`] order.

pub mod column_validator;
pub mod constraint_validator;
pub mod context;
pub mod data;
pub mod index_validator;
pub mod null_filter;
pub mod object_validator;
pub mod table_validator;

pub use context::ValidationContext;
pub use data::{InMemoryRows, RowDataSource};
pub use null_filter::{NullFilterFacts, NullFilterReason};

use std::collections::BTreeSet;

use log::{debug, warn};

use crate::catalog::config::CatalogConfig;
use crate::catalog::error::CatalogResult;
use crate::schema::graph::{NodeId, NodeStatus, SchemaGraph};

/// Validate `candidate` as the successor of `prior`. `dropped` holds the
/// slots deleted explicitly by the statement that produced the candidate.
pub fn validate_graph(
    candidate: &SchemaGraph,
    prior: &SchemaGraph,
    dropped: &BTreeSet<NodeId>,
    config: &CatalogConfig,
    rows: Option<&dyn RowDataSource>,
) -> CatalogResult<()> {
    let mut ctx = ValidationContext::new(candidate, prior, dropped, config, rows);

    let mut order: Vec<_> = candidate
        .entries()
        .map(|(slot, entry)| (entry.node.kind().validation_rank(), slot))
        .collect();
    order.sort_unstable();

    let mut first_error = None;
    let mut error_count = 0usize;
    for (_, slot) in order {
        let Some(entry) = candidate.entry(slot) else {
            continue;
        };
        let result = validate_entry(slot, candidate, prior, &mut ctx);
        if let Err(err) = result {
            error_count += 1;
            if !config.collect_all_errors {
                return Err(err);
            }
            if first_error.is_none() {
                first_error = Some(err);
            } else {
                warn!("Additional schema violation at {}: {}", entry.node.debug_label(), err);
            }
        }
    }

    match first_error {
        Some(err) => {
            debug!("Validation of {} found {} violations", candidate.version(), error_count);
            Err(err)
        }
        None => {
            debug!("Validated {} ({} live nodes)", candidate.version(), candidate.live_count());
            Ok(())
        }
    }
}

fn validate_entry(
    slot: NodeId,
    candidate: &SchemaGraph,
    prior: &SchemaGraph,
    ctx: &mut ValidationContext<'_>,
) -> CatalogResult<()> {
    let Some(entry) = candidate.entry(slot) else {
        return Ok(());
    };
    if entry.status == NodeStatus::Live {
        if let Some(info) = entry.node.name_info() {
            ctx.claim_name(&info)?;
        }
        entry.node.validate(slot, ctx)?;
    }
    // Slots are stable across versions, so the prior node sits at the same
    // index. Nodes added by this change have no prior.
    if let Some(old) = prior.entry(slot) {
        if old.status == NodeStatus::Live && old.node.kind() == entry.node.kind() {
            entry.node.validate_update(slot, &old.node, ctx)?;
        }
    }
    Ok(())
}
