// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog plumbing shared by every schema module
//!
//! Errors, configuration, stable object ids and the holder of the published
//! schema version.

pub mod config;
pub mod error;
pub mod ids;
pub mod manager;

pub use config::{CatalogConfig, SchemaLimits};
pub use error::{CatalogError, CatalogResult, ErrorKind};
pub use ids::{ChangeStreamId, ColumnId, IdAllocator, SequenceId, TableId};
pub use manager::CatalogManager;
