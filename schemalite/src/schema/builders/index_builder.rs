// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Index builder and editor

use crate::schema::catalog::{Column, Index, IndexKind, KeyColumn, LocalityGroup, Table};
use crate::schema::graph::{Editable, Handle, NodeRef};

#[derive(Debug)]
pub struct IndexBuilder {
    index: Index,
}

impl IndexBuilder {
    pub fn new(name: impl Into<String>, indexed_table: Handle<Table>, data_table: Handle<Table>) -> Self {
        Self {
            index: Index {
                name: name.into(),
                indexed_table,
                index_data_table: data_table,
                key_columns: Vec::new(),
                stored_columns: Vec::new(),
                unique: false,
                null_filtered: false,
                null_filtered_columns: Vec::new(),
                partition_by: Vec::new(),
                order_by: Vec::new(),
                kind: IndexKind::Index,
                managing_nodes: Vec::new(),
                locality_group: None,
            },
        }
    }

    pub fn set_unique(mut self, unique: bool) -> Self {
        self.index.unique = unique;
        self
    }

    pub fn set_null_filtered(mut self, null_filtered: bool) -> Self {
        self.index.null_filtered = null_filtered;
        self
    }

    pub fn set_kind(mut self, kind: IndexKind) -> Self {
        self.index.kind = kind;
        self
    }

    pub fn add_key_column(mut self, key: Handle<KeyColumn>) -> Self {
        self.index.key_columns.push(key);
        self
    }

    pub fn add_stored_column(mut self, column: Handle<Column>) -> Self {
        self.index.stored_columns.push(column);
        self
    }

    pub fn add_null_filtered_column(mut self, column: Handle<Column>) -> Self {
        self.index.null_filtered_columns.push(column);
        self
    }

    pub fn add_partition_by(mut self, column: Handle<Column>) -> Self {
        self.index.partition_by.push(column);
        self
    }

    pub fn add_order_by(mut self, key: Handle<KeyColumn>) -> Self {
        self.index.order_by.push(key);
        self
    }

    pub fn add_managing_node(mut self, node: NodeRef) -> Self {
        self.index.managing_nodes.push(node);
        self
    }

    pub fn set_locality_group(mut self, group: Handle<LocalityGroup>) -> Self {
        self.index.locality_group = Some(group);
        self
    }

    pub fn build(self) -> Index {
        self.index
    }
}

pub struct IndexEditor<'a> {
    index: &'a mut Index,
}

impl Editable for Index {
    type Editor<'a> = IndexEditor<'a>;

    fn editor(&mut self) -> IndexEditor<'_> {
        IndexEditor { index: self }
    }
}

impl IndexEditor<'_> {
    pub fn add_managing_node(&mut self, node: NodeRef) -> &mut Self {
        self.index.managing_nodes.push(node);
        self
    }

    /// Remove a manager, matched by slot so either version's handle works
    pub fn remove_managing_node(&mut self, node: NodeRef) -> &mut Self {
        self.index
            .managing_nodes
            .retain(|n| !(n.slot() == node.slot() && n.kind() == node.kind()));
        self
    }

    pub fn add_stored_column(&mut self, column: Handle<Column>) -> &mut Self {
        self.index.stored_columns.push(column);
        self
    }

    pub fn set_locality_group(&mut self, group: Handle<LocalityGroup>) -> &mut Self {
        self.index.locality_group = Some(group);
        self
    }

    pub fn clear_locality_group(&mut self) -> &mut Self {
        self.index.locality_group = None;
        self
    }

    pub fn managing_node_count(&self) -> usize {
        self.index.managing_nodes.len()
    }
}
