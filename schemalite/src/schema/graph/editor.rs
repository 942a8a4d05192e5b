// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Copy-on-write graph editing
//!
//! A [`SchemaGraphEditor`] builds the next graph version from a source
//! version. Statements add, edit and delete nodes through it; then
//! [`SchemaGraphEditor::canonicalize`] deep-clones everything so that no
//! handle in the result points into the source.
//!
//! The clone of source slot `i` is target slot `i`, so the target slot table
//! is the clone cache. A node is copied into its slot before its handles are
//! rewritten, which is what lets cycles (table -> index -> data table ->
//! index) terminate: the second visit finds the slot occupied.

use std::collections::BTreeSet;

use log::debug;

use super::handle::{GraphVersion, Handle, NodeId, NodeRef};
use super::node::{NodeStatus, NodeVariant, SchemaNode, SchemaObject};
use super::schema_graph::{Entry, SchemaGraph, Slot};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::ids::IdAllocator;
use crate::schema::catalog::{Column, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloneState {
    /// Allocated by a statement, node not inserted yet
    Reserved,
    /// Copied into the target, handles still point at the source
    Shallow,
    InProgress,
    Done,
}

/// Nodes that carry a typed editor
pub trait Editable: SchemaObject {
    type Editor<'a>
    where
        Self: 'a;

    fn editor(&mut self) -> Self::Editor<'_>;
}

/// Output of a successful canonicalize: the candidate version plus the set
/// of nodes the statement deleted explicitly (as opposed to by propagation)
#[derive(Debug)]
pub struct Candidate {
    pub graph: SchemaGraph,
    pub dropped: BTreeSet<NodeId>,
}

pub struct SchemaGraphEditor<'g> {
    source: &'g SchemaGraph,
    target: SchemaGraph,
    states: Vec<Option<CloneState>>,
    dropped: BTreeSet<NodeId>,
}

impl<'g> SchemaGraphEditor<'g> {
    pub fn new(source: &'g SchemaGraph) -> Self {
        let slot_count = source.slot_count();
        let target = SchemaGraph::with_slots(
            GraphVersion::next(),
            vec![Slot::Vacant; slot_count],
            source.ids.clone(),
        );
        Self {
            source,
            target,
            states: vec![None; slot_count],
            dropped: BTreeSet::new(),
        }
    }

    pub fn source(&self) -> &'g SchemaGraph {
        self.source
    }

    /// Version tag of the graph being built
    pub fn version(&self) -> GraphVersion {
        self.target.version()
    }

    pub fn ids(&mut self) -> &mut IdAllocator {
        &mut self.target.ids
    }

    /// Reserve a slot so other new nodes can point at a node that is not
    /// built yet. The slot must be filled with [`insert`](Self::insert).
    pub fn allocate<T: SchemaObject>(&mut self) -> CatalogResult<Handle<T>> {
        let slot = NodeId::from_index(self.target.slots.len())?;
        self.target.slots.push(Slot::Vacant);
        self.states.push(Some(CloneState::Reserved));
        Ok(Handle::new(slot, self.target.version()))
    }

    pub fn insert<T: SchemaObject>(&mut self, handle: Handle<T>, node: T) -> CatalogResult<()> {
        let slot = handle.slot();
        if handle.version() != self.target.version()
            || self.states.get(slot.index()) != Some(&Some(CloneState::Reserved))
        {
            return Err(CatalogError::Internal(format!(
                "insert into slot {} that was not reserved",
                slot
            )));
        }
        self.target.slots[slot.index()] = Slot::Occupied(Entry {
            status: NodeStatus::Live,
            node: node.into_node(),
        });
        self.states[slot.index()] = Some(CloneState::Shallow);
        Ok(())
    }

    pub fn add_node<T: SchemaObject>(&mut self, node: T) -> CatalogResult<Handle<T>> {
        let handle = self.allocate::<T>()?;
        let slot = handle.slot().index();
        self.target.slots[slot] = Slot::Occupied(Entry {
            status: NodeStatus::Live,
            node: node.into_node(),
        });
        self.states[slot] = Some(CloneState::Shallow);
        Ok(handle)
    }

    /// Read a node as the statement currently sees it: the pending copy if
    /// the statement touched it, else the source version.
    pub fn get<T: NodeVariant>(&self, handle: Handle<T>) -> CatalogResult<&T> {
        read_either(self.source, &self.target, handle)
    }

    /// Edit a node. Source nodes are first copied into the target version;
    /// the source is never modified.
    pub fn edit<T: Editable>(&mut self, handle: Handle<T>) -> CatalogResult<T::Editor<'_>> {
        let slot = self.stage(handle.erase())?;
        let entry = self
            .target
            .entry_mut(slot)
            .ok_or_else(|| CatalogError::dangling_reference("editor", handle.erase()))?;
        let node = T::from_node_mut(&mut entry.node)
            .ok_or_else(|| CatalogError::dangling_reference("editor", handle.erase()))?;
        Ok(node.editor())
    }

    /// Mark a node deleted in the target version. Returns the target handle.
    pub fn delete<T: SchemaObject>(&mut self, handle: Handle<T>) -> CatalogResult<Handle<T>> {
        let slot = self.stage(handle.erase())?;
        if let Some(entry) = self.target.entry_mut(slot) {
            entry.status = NodeStatus::Deleted;
        }
        self.dropped.insert(slot);
        debug!("Marked {} deleted in {}", self.label(slot), self.target.version());
        Ok(handle.retag(self.target.version()))
    }

    /// Slot of `node` in the target, copying it over shallowly if needed
    fn stage(&mut self, node: NodeRef) -> CatalogResult<NodeId> {
        let slot = node.slot();
        let state = self.states.get(slot.index()).copied().flatten();
        if node.version() == self.target.version() {
            return match state {
                Some(CloneState::Shallow) => Ok(slot),
                _ => Err(CatalogError::dangling_reference("editor", node)),
            };
        }
        if node.version() != self.source.version() {
            return Err(CatalogError::dangling_reference("editor", node));
        }
        match state {
            Some(CloneState::Shallow) => Ok(slot),
            None => {
                self.copy_from_source(node)?;
                Ok(slot)
            }
            Some(_) => Err(CatalogError::dangling_reference("editor", node)),
        }
    }

    fn copy_from_source(&mut self, node: NodeRef) -> CatalogResult<()> {
        let slot = node.slot();
        let entry = self
            .source
            .entry(slot)
            .filter(|e| e.status == NodeStatus::Live && e.node.kind() == node.kind())
            .ok_or_else(|| CatalogError::dangling_reference("clone", node))?;
        self.target.slots[slot.index()] = Slot::Occupied(entry.clone());
        self.states[slot.index()] = Some(CloneState::Shallow);
        Ok(())
    }

    fn label(&self, slot: NodeId) -> String {
        self.target
            .entry(slot)
            .map(|e| e.node.debug_label())
            .unwrap_or_else(|| slot.to_string())
    }

    /// Clone `node` into the target version, returning the target handle
    fn clone_any(&mut self, node: NodeRef) -> CatalogResult<NodeRef> {
        let slot = node.slot();
        let target_ref = node.retag(self.target.version());
        let state = self.states.get(slot.index()).copied().flatten();

        if node.version() == self.target.version() {
            return match state {
                Some(CloneState::Shallow) => {
                    self.deep_clone_slot(slot)?;
                    Ok(target_ref)
                }
                Some(CloneState::InProgress) | Some(CloneState::Done) => Ok(target_ref),
                _ => Err(CatalogError::dangling_reference("clone", node)),
            };
        }
        if node.version() != self.source.version() {
            return Err(CatalogError::dangling_reference("clone", node));
        }
        match state {
            Some(CloneState::Shallow) => self.deep_clone_slot(slot)?,
            Some(CloneState::InProgress) | Some(CloneState::Done) => {}
            Some(CloneState::Reserved) => {
                return Err(CatalogError::dangling_reference("clone", node));
            }
            None => {
                self.copy_from_source(node)?;
                self.deep_clone_slot(slot)?;
            }
        }
        Ok(target_ref)
    }

    fn deep_clone_slot(&mut self, slot: NodeId) -> CatalogResult<()> {
        self.states[slot.index()] = Some(CloneState::InProgress);
        let mut working: SchemaNode = self
            .target
            .entry(slot)
            .map(|e| e.node.clone())
            .ok_or_else(|| CatalogError::Internal(format!("slot {} vanished while cloning", slot)))?;
        {
            let mut scope = CloneScope { editor: self, me: slot };
            working.deep_clone(&mut scope)?;
        }
        // Status stays whatever the arena holds; deep_clone may have flipped it.
        if let Some(entry) = self.target.entry_mut(slot) {
            entry.node = working;
        }
        self.states[slot.index()] = Some(CloneState::Done);
        Ok(())
    }

    /// Finish the edit: clone every live source node, resolve dependent
    /// columns and check that the result is self-contained.
    pub fn canonicalize(mut self) -> CatalogResult<Candidate> {
        if let Some(slot) = self
            .states
            .iter()
            .position(|s| *s == Some(CloneState::Reserved))
        {
            return Err(CatalogError::Internal(format!(
                "slot #{} was allocated but never filled",
                slot
            )));
        }

        for i in 0..self.target.slots.len() {
            if self.states[i] == Some(CloneState::Shallow) {
                self.deep_clone_slot(NodeId::from_index(i)?)?;
            }
        }
        let source = self.source;
        for (slot, entry) in source.entries() {
            if entry.status == NodeStatus::Live && self.states[slot.index()].is_none() {
                let node = NodeRef {
                    slot,
                    version: source.version(),
                    kind: entry.node.kind(),
                };
                self.clone_any(node)?;
            }
        }

        self.resolve_dependent_columns();
        self.target.check_integrity()?;
        self.target.rebuild_name_index();
        debug!(
            "Canonicalized {} from {}: {} nodes, {} dropped",
            self.target.version(),
            source.version(),
            self.target.node_count(),
            self.dropped.len()
        );
        Ok(Candidate {
            graph: self.target,
            dropped: self.dropped,
        })
    }

    /// Resolve each column's dependent-column names against its table.
    /// Unknown names are left unresolved for the column validator to report.
    fn resolve_dependent_columns(&mut self) {
        let mut resolved = Vec::new();
        for (slot, entry) in self.target.entries() {
            let SchemaNode::Column(column) = &entry.node else {
                continue;
            };
            if column.dependent_column_names.is_empty() {
                continue;
            }
            let me: Handle<Column> = Handle::new(slot, self.target.version());
            let table = self.target.resolve::<Table>(column.table);
            let handles = column
                .dependent_column_names
                .iter()
                .filter_map(|name| {
                    if name.eq_ignore_ascii_case(&column.name) {
                        return Some(me);
                    }
                    table.and_then(|t| t.column_handle(name))
                })
                .collect::<Vec<_>>();
            resolved.push((slot, handles));
        }
        for (slot, handles) in resolved {
            if let Some(SchemaNode::Column(column)) = self.target.entry_mut(slot).map(|e| &mut e.node) {
                column.dependent_columns = handles;
            }
        }
    }
}

fn read_either<'a, T: NodeVariant>(
    source: &'a SchemaGraph,
    target: &'a SchemaGraph,
    handle: Handle<T>,
) -> CatalogResult<&'a T> {
    let graph = if handle.version() == target.version() {
        target
    } else if handle.version() == source.version() {
        match target.entry(handle.slot()) {
            Some(_) => target,
            None => source,
        }
    } else {
        return Err(CatalogError::dangling_reference("lookup", handle.erase()));
    };
    graph
        .entry(handle.slot())
        .and_then(|e| T::from_node(&e.node))
        .ok_or_else(|| CatalogError::dangling_reference("lookup", handle.erase()))
}

/// What a node sees while it rewrites its own handles
pub struct CloneScope<'e, 'g> {
    editor: &'e mut SchemaGraphEditor<'g>,
    me: NodeId,
}

impl CloneScope<'_, '_> {
    pub fn clone_ref<T: NodeVariant>(&mut self, handle: Handle<T>) -> CatalogResult<Handle<T>> {
        let cloned = self.editor.clone_any(handle.erase())?;
        Ok(Handle::new(cloned.slot(), cloned.version()))
    }

    pub fn clone_in_place<T: NodeVariant>(&mut self, handle: &mut Handle<T>) -> CatalogResult<()> {
        *handle = self.clone_ref(*handle)?;
        Ok(())
    }

    pub fn clone_opt<T: NodeVariant>(&mut self, handle: &mut Option<Handle<T>>) -> CatalogResult<()> {
        if let Some(h) = handle {
            *h = self.clone_ref(*h)?;
        }
        Ok(())
    }

    /// Clone a handle list, dropping elements that are or become deleted
    pub fn clone_vec<T: NodeVariant>(&mut self, handles: &mut Vec<Handle<T>>) -> CatalogResult<()> {
        let mut kept = Vec::with_capacity(handles.len());
        for handle in handles.iter() {
            if self.deleted_in_source(handle.erase()) {
                continue;
            }
            let cloned = self.clone_ref(*handle)?;
            if !self.is_deleted(cloned) {
                kept.push(cloned);
            }
        }
        *handles = kept;
        Ok(())
    }

    /// Clone a handle list element-wise, keeping deleted elements
    pub fn clone_each<T: NodeVariant>(&mut self, handles: &mut [Handle<T>]) -> CatalogResult<()> {
        for handle in handles.iter_mut() {
            *handle = self.clone_ref(*handle)?;
        }
        Ok(())
    }

    /// Untyped variant of [`clone_vec`](Self::clone_vec)
    pub fn clone_refs(&mut self, nodes: &mut Vec<NodeRef>) -> CatalogResult<()> {
        let mut kept = Vec::with_capacity(nodes.len());
        for node in nodes.iter() {
            if self.deleted_in_source(*node) {
                continue;
            }
            let cloned = self.editor.clone_any(*node)?;
            if self.editor.target.status(cloned) != Some(NodeStatus::Deleted) {
                kept.push(cloned);
            }
        }
        *nodes = kept;
        Ok(())
    }

    fn deleted_in_source(&self, node: NodeRef) -> bool {
        node.version() == self.editor.source.version()
            && self.editor.source.status(node) == Some(NodeStatus::Deleted)
            && self.editor.states.get(node.slot().index()).copied().flatten().is_none()
    }

    /// Deletion status as currently known. Cloned nodes report their target
    /// status, which may have been set a moment ago by propagation.
    pub fn is_deleted<T: NodeVariant>(&self, handle: Handle<T>) -> bool {
        let node = handle.erase();
        if node.version() == self.editor.target.version() {
            return self.editor.target.status(node) == Some(NodeStatus::Deleted);
        }
        match self.editor.target.entry(node.slot()) {
            Some(entry) => entry.status == NodeStatus::Deleted,
            None => self.editor.source.status(node) == Some(NodeStatus::Deleted),
        }
    }

    /// Read a node's fields. Only stable data (names, ids, flags, types)
    /// should be read this way: handles held by a node still being cloned
    /// may belong to either version.
    pub fn get<T: NodeVariant>(&self, handle: Handle<T>) -> CatalogResult<&T> {
        read_either(self.editor.source, &self.editor.target, handle)
    }

    /// Mark the node being cloned as deleted
    pub fn mark_deleted(&mut self) {
        if let Some(entry) = self.editor.target.entry_mut(self.me) {
            if entry.status != NodeStatus::Deleted {
                debug!("Deleting {} by propagation", entry.node.debug_label());
                entry.status = NodeStatus::Deleted;
            }
        }
    }

    pub fn me(&self) -> NodeId {
        self.me
    }
}
