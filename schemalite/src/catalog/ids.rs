// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Stable object identifiers
//!
//! Handles change every time a graph version is cloned; these ids do not.
//! They identify the same logical object across versions and are what
//! cross-version bookkeeping (commit timestamp tracking, null-filter
//! membership) compares.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! object_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

object_id!(TableId, "_t");
object_id!(ColumnId, "_c");
object_id!(ChangeStreamId, "_cs");
object_id!(SequenceId, "_s");

/// Monotonic id counters carried by every graph version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next_table: u64,
    next_column: u64,
    next_change_stream: u64,
    next_sequence: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_table_id(&mut self) -> TableId {
        self.next_table += 1;
        TableId(self.next_table)
    }

    pub fn next_column_id(&mut self) -> ColumnId {
        self.next_column += 1;
        ColumnId(self.next_column)
    }

    pub fn next_change_stream_id(&mut self) -> ChangeStreamId {
        self.next_change_stream += 1;
        ChangeStreamId(self.next_change_stream)
    }

    pub fn next_sequence_id(&mut self) -> SequenceId {
        self.next_sequence += 1;
        SequenceId(self.next_sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_per_kind() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_table_id(), TableId(1));
        assert_eq!(ids.next_table_id(), TableId(2));
        assert_eq!(ids.next_column_id(), ColumnId(1));
        assert_eq!(ids.next_table_id().to_string(), "_t3");
    }
}
