// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! User-defined function nodes

use super::Sequence;
use crate::catalog::error::CatalogResult;
use crate::schema::graph::{
    CloneScope, Handle, NameSpace, NodeRef, SchemaNameInfo, SchemaObject, View,
};
use crate::schema::validators::{object_validator, ValidationContext};

#[derive(Debug, Clone)]
pub struct Udf {
    pub(crate) name: String,
    pub(crate) signature: String,
    pub(crate) definition: String,
    pub(crate) deterministic: bool,
    pub(crate) sequences_used: Vec<Handle<Sequence>>,
    pub(crate) udf_dependencies: Vec<Handle<Udf>>,
}

impl Udf {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }
}

impl SchemaObject for Udf {
    fn name_info(&self) -> Option<SchemaNameInfo> {
        Some(SchemaNameInfo::new(&self.name, "Function", NameSpace::Function))
    }

    fn debug_label(&self) -> String {
        format!("F:{}", self.name)
    }

    fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
        scope.clone_each(&mut self.sequences_used)?;
        scope.clone_each(&mut self.udf_dependencies)
    }

    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
        object_validator::validate_udf(self, me, ctx)
    }

    fn validate_update(
        &self,
        me: Handle<Self>,
        prior: &Self,
        ctx: &mut ValidationContext<'_>,
    ) -> CatalogResult<()> {
        object_validator::validate_udf_update(self, me, prior, ctx)
    }

    fn for_each_ref(&self, f: &mut dyn FnMut(NodeRef)) {
        self.sequences_used.iter().for_each(|h| f(h.erase()));
        self.udf_dependencies.iter().for_each(|h| f(h.erase()));
    }
}

impl<'g> View<'g, Udf> {
    pub fn sequences_used(&self) -> Vec<View<'g, Sequence>> {
        self.follow_all(&self.node().sequences_used)
    }

    pub fn udf_dependencies(&self) -> Vec<View<'g, Udf>> {
        self.follow_all(&self.node().udf_dependencies)
    }
}
