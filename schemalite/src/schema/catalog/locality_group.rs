// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Locality group nodes

use serde::{Deserialize, Serialize};

use crate::catalog::error::CatalogResult;
use crate::schema::graph::{CloneScope, Handle, NameSpace, NodeRef, SchemaNameInfo, SchemaObject};
use crate::schema::validators::{object_validator, ValidationContext};

/// Name of the locality group every database starts with
pub const DEFAULT_LOCALITY_GROUP: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageKind {
    #[default]
    Ssd,
    Hdd,
}

#[derive(Debug, Clone)]
pub struct LocalityGroup {
    pub(crate) name: String,
    pub(crate) storage: StorageKind,
    pub(crate) ssd_to_hdd_spill_timespan: Option<String>,
}

impl LocalityGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> StorageKind {
        self.storage
    }

    pub fn ssd_to_hdd_spill_timespan(&self) -> Option<&str> {
        self.ssd_to_hdd_spill_timespan.as_deref()
    }
}

impl SchemaObject for LocalityGroup {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        Some(SchemaNameInfo::new(&self.name, "Locality Group", NameSpace::LocalityGroup))
    }

    fn debug_label(&self) -> String {
        format!("LG:{}", self.name)
    }

    fn deep_clone(&mut self, _scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        Ok(())
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        object_validator::validate_locality_group(self, me, ctx)
    }

    fn validate_update(
        &self,
        me: Handle<Self>,
        prior: &Self,
        ctx: &mut ValidationContext<'_>,
    ) -> CatalogResult<()> {
        object_validator::validate_locality_group_update(self, me, prior, ctx)
    }

    fn for_each_ref(&self, _f: &mut dyn FnMut(NodeRef)) {}
}
