// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Versioned schema graph: arena, handles and the clone engine

pub mod editor;
pub mod handle;
pub mod node;
pub mod schema_graph;

pub use editor::{Candidate, CloneScope, Editable, SchemaGraphEditor};
pub use handle::{GraphVersion, Handle, NodeId, NodeRef};
pub use node::{NameSpace, NodeKind, NodeStatus, NodeVariant, SchemaNameInfo, SchemaNode, SchemaObject};
pub use schema_graph::{SchemaGraph, View};
