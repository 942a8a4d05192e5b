// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Published schema versions
//!
//! The manager owns the current graph version. Readers take an `Arc`
//! snapshot and keep it for as long as they need it; a successful DDL batch
//! swaps the pointer, so readers already in flight are never disturbed.

use std::sync::Arc;

use log::info;
use parking_lot::{Mutex, RwLock};

use super::config::CatalogConfig;
use super::error::CatalogResult;
use crate::schema::graph::SchemaGraph;
use crate::schema::updater::{SchemaStatement, SchemaUpdater};
use crate::schema::validators::RowDataSource;

pub struct CatalogManager {
    current: RwLock<Arc<SchemaGraph>>,
    /// Serialises DDL batches; readers never take it
    ddl_lock: Mutex<()>,
    config: CatalogConfig,
    rows: Option<Arc<dyn RowDataSource>>,
}

impl CatalogManager {
    /// A manager holding an empty schema
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(SchemaGraph::new())),
            ddl_lock: Mutex::new(()),
            config,
            rows: None,
        }
    }

    /// Attach committed row data for validations that inspect it
    pub fn with_row_source(mut self, rows: Arc<dyn RowDataSource>) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// The current published version
    pub fn snapshot(&self) -> Arc<SchemaGraph> {
        Arc::clone(&self.current.read())
    }

    /// Run a batch against the current version and publish the result.
    /// On failure nothing is published and the error of the first failing
    /// statement is returned.
    pub fn apply_batch(&self, statements: &[&dyn SchemaStatement]) -> CatalogResult<Arc<SchemaGraph>> {
        let _guard = self.ddl_lock.lock();
        let base = self.snapshot();
        if statements.is_empty() {
            return Ok(base);
        }

        let mut updater = SchemaUpdater::new(&self.config, self.rows.as_deref());
        let next = Arc::new(updater.apply_batch(&base, statements)?);
        *self.current.write() = Arc::clone(&next);
        info!(
            "Published schema {} ({} statements, {} live nodes)",
            next.version(),
            statements.len(),
            next.live_count()
        );
        Ok(next)
    }

    pub fn apply(&self, statement: &dyn SchemaStatement) -> CatalogResult<Arc<SchemaGraph>> {
        self.apply_batch(&[statement])
    }
}
