// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Polymorphic schema nodes
//!
//! Every catalog object is one variant of [`SchemaNode`]. Variant-specific
//! behaviour (naming, cloning, validation) lives behind [`SchemaObject`]; the
//! enum only dispatches.

use std::fmt;

use super::editor::CloneScope;
use super::handle::{Handle, NodeId, NodeRef};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::catalog::{
    ChangeStream, CheckConstraint, Column, ForeignKey, Index, KeyColumn, LocalityGroup, Sequence,
    Table, Udf,
};
use crate::schema::validators::ValidationContext;

/// Soft-delete marker carried by every arena entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Live,
    Deleted,
}

/// Name scopes in which object names must be unique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameSpace {
    /// Tables and indexes
    Global,
    Constraint,
    ChangeStream,
    LocalityGroup,
    Sequence,
    Function,
}

/// Name of a node as the uniqueness check sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNameInfo {
    pub name: String,
    pub kind: &'static str,
    pub namespace: NameSpace,
}

impl SchemaNameInfo {
    pub fn new(name: impl Into<String>, kind: &'static str, namespace: NameSpace) -> Self {
        Self {
            name: name.into(),
            kind,
            namespace,
        }
    }
}

/// Downcasting plumbing shared by every variant; generated by `schema_nodes!`
pub trait NodeVariant: Sized + 'static {
    const KIND: NodeKind;

    fn from_node(node: &SchemaNode) -> Option<&Self>;
    fn from_node_mut(node: &mut SchemaNode) -> Option<&mut Self>;
    fn into_node(self) -> SchemaNode;
}

/// Behaviour every catalog object implements
pub trait SchemaObject: NodeVariant + Clone + fmt::Debug {
    /// Name to register for uniqueness checks, if the node is named
    fn name_info(&self) -> Option<SchemaNameInfo>;

    fn debug_label(&self) -> String;

    /// Replace every handle field with the handle of its clone.
    /// Called on a shallow copy; may mark the copy deleted.
    fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()>;

    /// Standalone checks, run for live nodes only
    fn validate(&self, me: Handle<Self>, ctx: &mut ValidationContext<'_>) -> CatalogResult<()>;

    /// Checks against the same node in the prior version
    fn validate_update(
        &self,
        me: Handle<Self>,
        prior: &Self,
        ctx: &mut ValidationContext<'_>,
    ) -> CatalogResult<()>;

    /// Visit every outgoing handle
    fn for_each_ref(&self, f: &mut dyn FnMut(NodeRef));
}

macro_rules! schema_nodes {
    ($($variant:ident),* $(,)?) => {
        /// Discriminant of a [`SchemaNode`]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $($variant),*
        }

        #[derive(Debug, Clone)]
        pub enum SchemaNode {
            $($variant($variant)),*
        }

        impl SchemaNode {
            pub fn kind(&self) -> NodeKind {
                match self {
                    $(SchemaNode::$variant(_) => NodeKind::$variant),*
                }
            }

            pub fn name_info(&self) -> Option<SchemaNameInfo> {
                match self {
                    $(SchemaNode::$variant(node) => node.name_info()),*
                }
            }

            pub fn debug_label(&self) -> String {
                match self {
                    $(SchemaNode::$variant(node) => node.debug_label()),*
                }
            }

            pub(crate) fn deep_clone(&mut self, scope: &mut CloneScope<'_, '_>) -> CatalogResult<()> {
                match self {
                    $(SchemaNode::$variant(node) => node.deep_clone(scope)),*
                }
            }

            pub(crate) fn for_each_ref(&self, f: &mut dyn FnMut(NodeRef)) {
                match self {
                    $(SchemaNode::$variant(node) => node.for_each_ref(f)),*
                }
            }

            pub(crate) fn validate(&self, slot: NodeId, ctx: &mut ValidationContext<'_>) -> CatalogResult<()> {
                let version = ctx.graph().version();
                match self {
                    $(SchemaNode::$variant(node) => node.validate(Handle::new(slot, version), ctx)),*
                }
            }

            pub(crate) fn validate_update(
                &self,
                slot: NodeId,
                prior: &SchemaNode,
                ctx: &mut ValidationContext<'_>,
            ) -> CatalogResult<()> {
                let version = ctx.graph().version();
                match (self, prior) {
                    $((SchemaNode::$variant(node), SchemaNode::$variant(old)) => {
                        node.validate_update(Handle::new(slot, version), old, ctx)
                    })*
                    _ => Err(CatalogError::Internal(format!(
                        "{} changed kind from {:?} to {:?} between versions",
                        self.debug_label(),
                        prior.kind(),
                        self.kind()
                    ))),
                }
            }
        }

        $(
            impl NodeVariant for $variant {
                const KIND: NodeKind = NodeKind::$variant;

                fn from_node(node: &SchemaNode) -> Option<&Self> {
                    match node {
                        SchemaNode::$variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn from_node_mut(node: &mut SchemaNode) -> Option<&mut Self> {
                    match node {
                        SchemaNode::$variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn into_node(self) -> SchemaNode {
                    SchemaNode::$variant(self)
                }
            }
        )*
    };
}

schema_nodes!(
    Table,
    Column,
    KeyColumn,
    Index,
    ForeignKey,
    CheckConstraint,
    ChangeStream,
    LocalityGroup,
    Sequence,
    Udf,
);

impl NodeKind {
    /// Validation order. A kind's checks may read state that lower-ranked
    /// kinds have already validated or recorded in the context: column
    /// nullability depends on index null-filtering, and the referenced kinds
    /// (locality groups, sequences, functions) need the usage sets collected
    /// while validating tables and columns.
    pub fn validation_rank(self) -> u8 {
        match self {
            NodeKind::Table => 0,
            NodeKind::Index => 1,
            NodeKind::Column => 2,
            NodeKind::KeyColumn => 3,
            NodeKind::ForeignKey | NodeKind::CheckConstraint => 4,
            NodeKind::ChangeStream => 5,
            NodeKind::LocalityGroup => 6,
            NodeKind::Sequence => 7,
            NodeKind::Udf => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Table => "Table",
            NodeKind::Column => "Column",
            NodeKind::KeyColumn => "KeyColumn",
            NodeKind::Index => "Index",
            NodeKind::ForeignKey => "ForeignKey",
            NodeKind::CheckConstraint => "CheckConstraint",
            NodeKind::ChangeStream => "ChangeStream",
            NodeKind::LocalityGroup => "LocalityGroup",
            NodeKind::Sequence => "Sequence",
            NodeKind::Udf => "Function",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_validates_before_column() {
        assert!(NodeKind::Table.validation_rank() < NodeKind::Index.validation_rank());
        assert!(NodeKind::Index.validation_rank() < NodeKind::Column.validation_rank());
        assert!(NodeKind::Column.validation_rank() < NodeKind::Sequence.validation_rank());
        assert_eq!(
            NodeKind::ForeignKey.validation_rank(),
            NodeKind::CheckConstraint.validation_rank()
        );
    }
}
