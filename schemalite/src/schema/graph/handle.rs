// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Node handles
//!
//! A handle is an arena slot plus the tag of the graph version it was issued
//! by. Slots are stable across versions (the clone of slot 7 is slot 7 in the
//! next version), so the version tag is what tells an old reference from a
//! new one.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use super::node::{NodeKind, NodeVariant};
use crate::catalog::error::{CatalogError, CatalogResult};

static NEXT_GRAPH_VERSION: AtomicU64 = AtomicU64::new(1);

/// Tag identifying one graph version. Unique per process and increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphVersion(u64);

impl GraphVersion {
    pub(crate) fn next() -> Self {
        GraphVersion(NEXT_GRAPH_VERSION.fetch_add(1, AtomicOrdering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GraphVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Arena slot index, the node's numeric id within a graph version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> CatalogResult<Self> {
        u32::try_from(index)
            .map(NodeId)
            .map_err(|_| CatalogError::Internal(format!("Schema graph slot {} is out of range", index)))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Typed, non-owning reference to a node of kind `T` in one graph version
pub struct Handle<T> {
    slot: NodeId,
    version: GraphVersion,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(slot: NodeId, version: GraphVersion) -> Self {
        Self {
            slot,
            version,
            _kind: PhantomData,
        }
    }

    pub fn slot(&self) -> NodeId {
        self.slot
    }

    pub fn version(&self) -> GraphVersion {
        self.version
    }

    /// The same slot as seen from another graph version
    pub(crate) fn retag(self, version: GraphVersion) -> Self {
        Handle::new(self.slot, version)
    }
}

impl<T: NodeVariant> Handle<T> {
    pub fn erase(self) -> NodeRef {
        NodeRef {
            slot: self.slot,
            version: self.version,
            kind: T::KIND,
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.version == other.version
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
        self.version.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.version, self.slot).cmp(&(other.version, other.slot))
    }
}

impl<T: NodeVariant> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}@{}", T::KIND, self.slot, self.version)
    }
}

/// Untyped handle, used where a field may point at several node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub(crate) slot: NodeId,
    pub(crate) version: GraphVersion,
    pub(crate) kind: NodeKind,
}

impl NodeRef {
    pub fn slot(&self) -> NodeId {
        self.slot
    }

    pub fn version(&self) -> GraphVersion {
        self.version
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn downcast<T: NodeVariant>(self) -> Option<Handle<T>> {
        (self.kind == T::KIND).then(|| Handle::new(self.slot, self.version))
    }

    pub(crate) fn retag(self, version: GraphVersion) -> Self {
        NodeRef { version, ..self }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}@{}", self.kind, self.slot, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::{Index, Table};

    #[test]
    fn test_versions_increase() {
        let a = GraphVersion::next();
        let b = GraphVersion::next();
        assert!(b > a);
    }

    #[test]
    fn test_handles_differ_by_version() {
        let v1 = GraphVersion::next();
        let v2 = GraphVersion::next();
        let old: Handle<Table> = Handle::new(NodeId(3), v1);
        let new = old.retag(v2);
        assert_ne!(old, new);
        assert_eq!(old.slot(), new.slot());
    }

    #[test]
    fn test_downcast_checks_kind() {
        let v = GraphVersion::next();
        let table: Handle<Table> = Handle::new(NodeId(1), v);
        let erased = table.erase();
        assert_eq!(erased.downcast::<Table>(), Some(table));
        assert!(erased.downcast::<Index>().is_none());
    }

    #[test]
    fn test_slot_index_must_fit() {
        assert_eq!(NodeId::from_index(7).unwrap(), NodeId(7));
        assert_eq!(NodeId::from_index(u32::MAX as usize).unwrap(), NodeId(u32::MAX));
        #[cfg(target_pointer_width = "64")]
        {
            let err = NodeId::from_index(u32::MAX as usize + 1).unwrap_err();
            assert!(matches!(err, CatalogError::Internal(_)));
        }
    }
}
