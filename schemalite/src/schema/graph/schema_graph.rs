// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! One immutable graph version
//!
//! A `SchemaGraph` is an arena of nodes. Handles into it carry the graph's
//! version tag; a handle from any other version does not resolve. Published
//! graphs are shared behind `Arc` and never mutated.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

use super::handle::{GraphVersion, Handle, NodeId, NodeRef};
use super::node::{NodeKind, NodeStatus, NodeVariant, SchemaNode};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::ids::{ColumnId, IdAllocator, TableId};
use crate::schema::catalog::{
    ChangeStream, Column, Index, LocalityGroup, Sequence, Table, Udf,
};

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) status: NodeStatus,
    pub(crate) node: SchemaNode,
}

#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Vacant,
    Occupied(Entry),
}

impl Slot {
    pub(crate) fn entry(&self) -> Option<&Entry> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            Slot::Vacant => None,
        }
    }

    pub(crate) fn entry_mut(&mut self) -> Option<&mut Entry> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            Slot::Vacant => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaGraph {
    version: GraphVersion,
    pub(crate) slots: Vec<Slot>,
    pub(crate) ids: IdAllocator,
    names: HashMap<(NodeKind, String), NodeId>,
}

impl Default for SchemaGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaGraph {
    /// An empty schema
    pub fn new() -> Self {
        Self::with_slots(GraphVersion::next(), Vec::new(), IdAllocator::new())
    }

    pub(crate) fn with_slots(version: GraphVersion, slots: Vec<Slot>, ids: IdAllocator) -> Self {
        Self {
            version,
            slots,
            ids,
            names: HashMap::new(),
        }
    }

    pub fn version(&self) -> GraphVersion {
        self.version
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn entry(&self, slot: NodeId) -> Option<&Entry> {
        self.slots.get(slot.index()).and_then(Slot::entry)
    }

    pub(crate) fn entry_mut(&mut self, slot: NodeId) -> Option<&mut Entry> {
        self.slots.get_mut(slot.index()).and_then(Slot::entry_mut)
    }

    /// Number of nodes, live or deleted
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.entry().is_some()).count()
    }

    pub fn live_count(&self) -> usize {
        self.entries()
            .filter(|(_, entry)| entry.status == NodeStatus::Live)
            .count()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (NodeId, &Entry)> + '_ {
        self.slots
            .iter()
            .enumerate()
            // Slots only ever come from allocations that fit a NodeId
            .filter_map(|(i, slot)| Some((NodeId::from_index(i).ok()?, slot.entry()?)))
    }

    /// Resolve a handle issued by this version
    pub fn resolve<T: NodeVariant>(&self, handle: Handle<T>) -> Option<&T> {
        if handle.version() != self.version {
            return None;
        }
        self.entry(handle.slot()).and_then(|entry| T::from_node(&entry.node))
    }

    pub fn resolve_any(&self, node: NodeRef) -> Option<&SchemaNode> {
        if node.version() != self.version {
            return None;
        }
        self.entry(node.slot())
            .map(|entry| &entry.node)
            .filter(|n| n.kind() == node.kind())
    }

    pub fn status(&self, node: NodeRef) -> Option<NodeStatus> {
        self.resolve_any(node)?;
        self.entry(node.slot()).map(|entry| entry.status)
    }

    pub fn is_deleted(&self, node: NodeRef) -> bool {
        self.status(node) == Some(NodeStatus::Deleted)
    }

    pub fn get<T: NodeVariant>(&self, handle: Handle<T>) -> Option<View<'_, T>> {
        let node = self.resolve(handle)?;
        let status = self.entry(handle.slot())?.status;
        Some(View {
            graph: self,
            handle,
            node,
            status,
        })
    }

    /// Like [`get`](Self::get) but a miss is an internal error
    pub fn expect_view<T: NodeVariant>(&self, handle: Handle<T>) -> CatalogResult<View<'_, T>> {
        self.get(handle)
            .ok_or_else(|| CatalogError::dangling_reference(&format!("graph {}", self.version), handle.erase()))
    }

    /// Live nodes of one kind in slot order
    pub fn live<T: NodeVariant>(&self) -> impl Iterator<Item = View<'_, T>> + '_ {
        self.entries().filter_map(move |(slot, entry)| {
            if entry.status != NodeStatus::Live {
                return None;
            }
            let node = T::from_node(&entry.node)?;
            Some(View {
                graph: self,
                handle: Handle::new(slot, self.version),
                node,
                status: entry.status,
            })
        })
    }

    /// User-visible tables
    pub fn tables(&self) -> impl Iterator<Item = View<'_, Table>> + '_ {
        self.live::<Table>().filter(|t| t.is_public())
    }

    pub fn indexes(&self) -> impl Iterator<Item = View<'_, Index>> + '_ {
        self.live::<Index>()
    }

    pub fn sequences(&self) -> impl Iterator<Item = View<'_, Sequence>> + '_ {
        self.live::<Sequence>()
    }

    pub fn change_streams(&self) -> impl Iterator<Item = View<'_, ChangeStream>> + '_ {
        self.live::<ChangeStream>()
    }

    pub fn locality_groups(&self) -> impl Iterator<Item = View<'_, LocalityGroup>> + '_ {
        self.live::<LocalityGroup>()
    }

    pub fn functions(&self) -> impl Iterator<Item = View<'_, Udf>> + '_ {
        self.live::<Udf>()
    }

    fn find_named<T: NodeVariant>(&self, name: &str) -> Option<View<'_, T>> {
        let slot = self.names.get(&(T::KIND, name.to_lowercase()))?;
        self.get(Handle::new(*slot, self.version))
    }

    /// Case-insensitive lookup of a user-visible table
    pub fn find_table(&self, name: &str) -> Option<View<'_, Table>> {
        self.find_named(name)
    }

    pub fn find_index(&self, name: &str) -> Option<View<'_, Index>> {
        self.find_named(name)
    }

    /// Indexes whose name, or whose last dotted name segment, matches
    pub fn find_indexes_under_name(&self, name: &str) -> Vec<View<'_, Index>> {
        let wanted = name.to_lowercase();
        self.indexes()
            .filter(|index| {
                let own = index.name().to_lowercase();
                own == wanted || own.rsplit('.').next() == Some(wanted.as_str())
            })
            .collect()
    }

    pub fn find_sequence(&self, name: &str, exclude_internal: bool) -> Option<View<'_, Sequence>> {
        self.find_named::<Sequence>(name)
            .filter(|seq| !(exclude_internal && seq.is_internal()))
    }

    pub fn find_change_stream(&self, name: &str) -> Option<View<'_, ChangeStream>> {
        self.find_named(name)
    }

    pub fn find_locality_group(&self, name: &str) -> Option<View<'_, LocalityGroup>> {
        self.find_named(name)
    }

    pub fn find_function(&self, name: &str) -> Option<View<'_, Udf>> {
        self.find_named(name)
    }

    /// Table by stable id, internal tables included
    pub fn table_by_id(&self, id: TableId) -> Option<View<'_, Table>> {
        self.live::<Table>().find(|t| t.id() == id)
    }

    pub fn column_by_id(&self, id: ColumnId) -> Option<View<'_, Column>> {
        self.live::<Column>().find(|c| c.id() == id)
    }

    pub(crate) fn rebuild_name_index(&mut self) {
        let mut names = HashMap::new();
        for (slot, entry) in self.entries() {
            if entry.status != NodeStatus::Live {
                continue;
            }
            if let SchemaNode::Table(table) = &entry.node {
                if !table.is_public() {
                    continue;
                }
            }
            if let Some(info) = entry.node.name_info() {
                names.insert((entry.node.kind(), info.name.to_lowercase()), slot);
            }
        }
        self.names = names;
    }

    /// Every handle held by any node must carry this version's tag and land
    /// on an occupied slot of the right kind.
    pub(crate) fn check_integrity(&self) -> CatalogResult<()> {
        let mut first_error = None;
        for (_, entry) in self.entries() {
            entry.node.for_each_ref(&mut |target| {
                if first_error.is_some() {
                    return;
                }
                if self.resolve_any(target).is_none() {
                    first_error = Some(CatalogError::dangling_reference(
                        &entry.node.debug_label(),
                        target,
                    ));
                }
            });
            if let Some(err) = first_error {
                return Err(err);
            }
        }
        Ok(())
    }
}

impl fmt::Display for SchemaGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "schema graph {}", self.version)?;
        for (slot, entry) in self.entries() {
            let marker = match entry.status {
                NodeStatus::Live => "",
                NodeStatus::Deleted => " (deleted)",
            };
            writeln!(f, "  {} {}{}", slot, entry.node.debug_label(), marker)?;
        }
        Ok(())
    }
}

/// A node bound to the graph version it lives in
pub struct View<'g, T> {
    graph: &'g SchemaGraph,
    handle: Handle<T>,
    node: &'g T,
    status: NodeStatus,
}

impl<'g, T> View<'g, T> {
    pub fn handle(&self) -> Handle<T> {
        self.handle
    }

    pub fn graph(&self) -> &'g SchemaGraph {
        self.graph
    }

    pub fn node(&self) -> &'g T {
        self.node
    }

    pub fn is_deleted(&self) -> bool {
        self.status == NodeStatus::Deleted
    }

    /// Follow a handle held by this node
    pub(crate) fn follow<U: NodeVariant>(&self, handle: Handle<U>) -> Option<View<'g, U>> {
        self.graph.get(handle)
    }

    pub(crate) fn follow_all<U: NodeVariant>(&self, handles: &'g [Handle<U>]) -> Vec<View<'g, U>> {
        let graph = self.graph;
        handles.iter().filter_map(|h| graph.get(*h)).collect()
    }
}

impl<T> Clone for View<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for View<'_, T> {}

impl<T> Deref for View<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.node
    }
}

impl<T: fmt::Debug> fmt::Debug for View<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("slot", &self.handle.slot())
            .field("status", &self.status)
            .field("node", self.node)
            .finish()
    }
}
