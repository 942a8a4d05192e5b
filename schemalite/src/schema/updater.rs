// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! DDL batch execution
//!
//! A batch runs its statements one at a time. Each statement edits the
//! newest candidate, which is then canonicalized and validated against the
//! version it came from. The batch yields the last candidate only when every
//! statement succeeded; on any failure all candidates are discarded.

use std::fmt;

use log::{debug, warn};

use crate::catalog::config::CatalogConfig;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::graph::{SchemaGraph, SchemaGraphEditor};
use crate::schema::validators::{self, RowDataSource};

/// Lifecycle of one DDL batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Statements are assembling nodes through builders and editors
    Building,
    /// The clone engine is producing the candidate version
    Cloning,
    /// Validators are running against the candidate
    Validating,
    Committed,
    Rejected,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchState::Building => "building",
            BatchState::Cloning => "cloning",
            BatchState::Validating => "validating",
            BatchState::Committed => "committed",
            BatchState::Rejected => "rejected",
        };
        write!(f, "{}", name)
    }
}

/// One resolved DDL statement
pub trait SchemaStatement {
    /// Short text for logs, e.g. `CREATE TABLE Users`
    fn describe(&self) -> String;

    /// Record the statement's changes in `editor`
    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()>;
}

impl<F> SchemaStatement for F
where
    F: Fn(&mut SchemaGraphEditor<'_>) -> CatalogResult<()>,
{
    fn describe(&self) -> String {
        "custom statement".to_string()
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        self(editor)
    }
}

pub struct SchemaUpdater<'a> {
    config: &'a CatalogConfig,
    rows: Option<&'a dyn RowDataSource>,
    state: BatchState,
}

impl<'a> SchemaUpdater<'a> {
    pub fn new(config: &'a CatalogConfig, rows: Option<&'a dyn RowDataSource>) -> Self {
        Self {
            config,
            rows,
            state: BatchState::Building,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    fn transition(&mut self, next: BatchState) {
        debug!("DDL batch {} -> {}", self.state, next);
        self.state = next;
    }

    /// Apply `statements` in order on top of `base` and return the final
    /// candidate. `base` is never modified.
    pub fn apply_batch(
        &mut self,
        base: &SchemaGraph,
        statements: &[&dyn SchemaStatement],
    ) -> CatalogResult<SchemaGraph> {
        if statements.is_empty() {
            return Err(CatalogError::Internal("empty DDL batch".to_string()));
        }
        match self.run(base, statements) {
            Ok(graph) => {
                self.transition(BatchState::Committed);
                Ok(graph)
            }
            Err(err) => {
                self.transition(BatchState::Rejected);
                warn!("DDL batch rejected: {}", err);
                Err(err)
            }
        }
    }

    fn run(&mut self, base: &SchemaGraph, statements: &[&dyn SchemaStatement]) -> CatalogResult<SchemaGraph> {
        let mut latest: Option<SchemaGraph> = None;
        for statement in statements {
            let next = {
                let source = latest.as_ref().unwrap_or(base);
                self.transition(BatchState::Building);
                debug!("Applying {} on {}", statement.describe(), source.version());
                let mut editor = SchemaGraphEditor::new(source);
                statement.apply(&mut editor)?;

                self.transition(BatchState::Cloning);
                let candidate = editor.canonicalize()?;

                self.transition(BatchState::Validating);
                validators::validate_graph(
                    &candidate.graph,
                    source,
                    &candidate.dropped,
                    self.config,
                    self.rows,
                )?;
                candidate.graph
            };
            latest = Some(next);
        }
        latest.ok_or_else(|| CatalogError::Internal("DDL batch produced no version".to_string()))
    }
}
