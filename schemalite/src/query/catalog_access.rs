// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lookups a query validator performs against one published schema version,
//! and the per-statement dependencies they accumulate.

use std::collections::BTreeSet;

use log::debug;

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::graph::SchemaGraph;
use crate::txn::CommitTimestampTracker;

/// FORCE_INDEX value that selects the base table instead of an index
pub const BASE_TABLE_HINT: &str = "_BASE_TABLE";

/// Catalog objects one statement depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementDependencies {
    pub indexes: BTreeSet<String>,
    pub sequences: BTreeSet<String>,
}

pub struct QueryCatalogAccess<'g> {
    graph: &'g SchemaGraph,
    tracker: Option<&'g CommitTimestampTracker>,
    dependencies: StatementDependencies,
}

impl<'g> QueryCatalogAccess<'g> {
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self {
            graph,
            tracker: None,
            dependencies: StatementDependencies::default(),
        }
    }

    /// Check reads against the pending commit timestamps of a
    /// read-your-writes transaction
    pub fn with_tracker(mut self, tracker: &'g CommitTimestampTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn graph(&self) -> &'g SchemaGraph {
        self.graph
    }

    /// Resolve a FORCE_INDEX hint. Every index whose name, or last dotted
    /// segment, matches is recorded as used.
    pub fn force_index(&mut self, name: &str) -> CatalogResult<()> {
        if name.eq_ignore_ascii_case(BASE_TABLE_HINT) {
            return Ok(());
        }
        let indexes = self.graph.find_indexes_under_name(name);
        if indexes.is_empty() {
            return Err(CatalogError::index_not_found(name));
        }
        for index in indexes {
            self.dependencies.indexes.insert(index.name().to_string());
        }
        Ok(())
    }

    /// Record a sequence referenced by name, for example as the argument of
    /// GET_NEXT_SEQUENCE_VALUE. Internal sequences are not addressable.
    pub fn sequence_dependency(&mut self, name: &str) -> CatalogResult<()> {
        let sequence = self
            .graph
            .find_sequence(name, true)
            .ok_or_else(|| CatalogError::sequence_not_found(name))?;
        self.dependencies.sequences.insert(sequence.name().to_string());
        Ok(())
    }

    /// Resolve a scan of `columns` from `table` and check that none of them
    /// holds a pending commit timestamp
    pub fn check_table_scan(&self, table: &str, columns: &[&str]) -> CatalogResult<()> {
        let table_view = self
            .graph
            .find_table(table)
            .ok_or_else(|| CatalogError::table_not_found(table))?;
        let mut read = Vec::with_capacity(columns.len());
        for name in columns {
            let column = table_view
                .find_column(name)
                .ok_or_else(|| CatalogError::column_not_found(table, name))?;
            read.push(column);
        }
        match self.tracker {
            Some(tracker) => tracker.check_read(table_view, &read),
            None => Ok(()),
        }
    }

    /// Dependencies accumulated for the statement
    pub fn finish(self) -> StatementDependencies {
        debug!(
            "Statement depends on {} indexes and {} sequences",
            self.dependencies.indexes.len(),
            self.dependencies.sequences.len()
        );
        self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_lookups() {
        let graph = SchemaGraph::new();
        let mut access = QueryCatalogAccess::new(&graph);
        assert!(access.force_index("_base_table").is_ok());
        assert!(matches!(access.force_index("Missing"), Err(CatalogError::NotFound(_))));
        assert!(matches!(access.sequence_dependency("Seq"), Err(CatalogError::NotFound(_))));
        assert!(matches!(access.check_table_scan("T", &[]), Err(CatalogError::NotFound(_))));
        assert_eq!(access.finish(), StatementDependencies::default());
    }
}
