// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared validation state for one candidate graph

use std::collections::{BTreeSet, HashMap};

use super::data::RowDataSource;
use crate::catalog::config::{CatalogConfig, SchemaLimits};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::catalog::{LocalityGroup, Sequence, Udf};
use crate::schema::graph::{Handle, NameSpace, NodeId, NodeVariant, SchemaGraph, SchemaNameInfo, View};

/// Accumulator passed to every validator while one candidate is checked.
/// Borrowed graphs are immutable; only the context's own sets grow.
pub struct ValidationContext<'a> {
    graph: &'a SchemaGraph,
    prior: &'a SchemaGraph,
    config: &'a CatalogConfig,
    rows: Option<&'a dyn RowDataSource>,
    dropped: &'a BTreeSet<NodeId>,
    names: HashMap<(NameSpace, String), String>,
    sequence_users: HashMap<NodeId, Vec<String>>,
    locality_group_users: HashMap<NodeId, Vec<String>>,
    udf_users: HashMap<NodeId, Vec<String>>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        graph: &'a SchemaGraph,
        prior: &'a SchemaGraph,
        dropped: &'a BTreeSet<NodeId>,
        config: &'a CatalogConfig,
        rows: Option<&'a dyn RowDataSource>,
    ) -> Self {
        Self {
            graph,
            prior,
            config,
            rows,
            dropped,
            names: HashMap::new(),
            sequence_users: HashMap::new(),
            locality_group_users: HashMap::new(),
            udf_users: HashMap::new(),
        }
    }

    /// The candidate being validated
    pub fn graph(&self) -> &'a SchemaGraph {
        self.graph
    }

    /// The version the candidate was cloned from
    pub fn prior(&self) -> &'a SchemaGraph {
        self.prior
    }

    pub fn limits(&self) -> &'a SchemaLimits {
        &self.config.limits
    }

    /// Committed rows, when data checks are enabled
    pub fn rows(&self) -> Option<&'a dyn RowDataSource> {
        if self.config.verify_existing_data {
            self.rows
        } else {
            None
        }
    }

    /// Whether the statement deleted this slot itself, not by propagation
    pub fn was_dropped(&self, slot: NodeId) -> bool {
        self.dropped.contains(&slot)
    }

    /// The same node in the prior version, if it was live there
    pub fn prior_of<T: NodeVariant>(&self, handle: Handle<T>) -> Option<View<'a, T>> {
        self.prior
            .get(handle.retag(self.prior.version()))
            .filter(|view| !view.is_deleted())
    }

    /// Candidate-version counterpart of a prior-version handle
    pub fn current_of<T: NodeVariant>(&self, handle: Handle<T>) -> Option<View<'a, T>> {
        self.graph.get(handle.retag(self.graph.version()))
    }

    pub fn view<T: NodeVariant>(&self, handle: Handle<T>) -> CatalogResult<View<'a, T>> {
        self.graph.expect_view(handle)
    }

    pub(crate) fn claim_name(&mut self, info: &SchemaNameInfo) -> CatalogResult<()> {
        let key = (info.namespace, info.name.to_lowercase());
        if self.names.contains_key(&key) {
            return Err(CatalogError::duplicate_name(info.kind, &info.name));
        }
        self.names.insert(key, info.name.clone());
        Ok(())
    }

    pub fn note_sequence_use(&mut self, sequence: Handle<Sequence>, user: String) {
        self.sequence_users
            .entry(sequence.slot())
            .or_default()
            .push(user);
    }

    pub fn note_locality_group_use(&mut self, group: Handle<LocalityGroup>, user: String) {
        self.locality_group_users
            .entry(group.slot())
            .or_default()
            .push(user);
    }

    pub fn note_udf_use(&mut self, udf: Handle<Udf>, user: String) {
        self.udf_users.entry(udf.slot()).or_default().push(user);
    }

    pub fn sequence_users(&self, sequence: Handle<Sequence>) -> &[String] {
        self.sequence_users
            .get(&sequence.slot())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn locality_group_users(&self, group: Handle<LocalityGroup>) -> &[String] {
        self.locality_group_users
            .get(&group.slot())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn udf_users(&self, udf: Handle<Udf>) -> &[String] {
        self.udf_users
            .get(&udf.slot())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
