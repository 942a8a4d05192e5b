// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sequence nodes
//!
//! The catalog records sequences and who depends on them. Generating values
//! belongs to the transaction layer.

use serde::{Deserialize, Serialize};

use crate::catalog::error::CatalogResult;
use crate::catalog::ids::SequenceId;
use crate::schema::graph::{CloneScope, Handle, NameSpace, NodeRef, SchemaNameInfo, SchemaObject};
use crate::schema::validators::{object_validator, ValidationContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SequenceKind {
    #[default]
    BitReversedPositive,
}

#[derive(Debug, Clone)]
pub struct Sequence {
    pub(crate) name: String,
    pub(crate) id: SequenceId,
    pub(crate) kind: SequenceKind,
    pub(crate) start_with_counter: Option<i64>,
    pub(crate) skip_range: Option<(i64, i64)>,
    /// Backs an identity column; hidden from name lookups by queries
    pub(crate) internal: bool,
}

impl Sequence {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> SequenceId {
        self.id
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn start_with_counter(&self) -> Option<i64> {
        self.start_with_counter
    }

    pub fn skip_range(&self) -> Option<(i64, i64)> {
        self.skip_range
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }
}

impl SchemaObject for Sequence {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        Some(SchemaNameInfo::new(&self.name, "Sequence", NameSpace::Sequence))
    }

    fn debug_label(&self) -> String {
        format!("S:{}[{}]", self.name, self.id)
    }

    fn deep_clone(&mut self, _scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        Ok(())
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        object_validator::validate_sequence(self, me, ctx)
    }

    fn validate_update(
        &self,
        me: Handle<Self>,
        prior: &Self,
        ctx: &mut ValidationContext<'_>,
    ) -> CatalogResult<()> {
        object_validator::validate_sequence_update(self, me, prior, ctx)
    }

    fn for_each_ref(&self, _f: &mut dyn FnMut(NodeRef)) {}
}
