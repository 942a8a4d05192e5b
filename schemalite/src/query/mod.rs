// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Read-only catalog access for query validation

pub mod catalog_access;

pub use catalog_access::{QueryCatalogAccess, StatementDependencies, BASE_TABLE_HINT};
