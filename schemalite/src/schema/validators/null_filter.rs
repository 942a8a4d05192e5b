// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Null-filter policy
//!
//! A column of an index data table does not inherit nullability from its
//! source column when the index filters out NULLs for it. Two facts can
//! cause that; both force NOT NULL, so they never disagree. When both hold
//! the index key membership is reported.
//!
//! | null-filtered index | index key | explicit filter | result            |
//! |---------------------|-----------|-----------------|-------------------|
//! | yes                 | yes       | any             | `IndexKey`        |
//! | any                 | no        | yes             | `ExplicitFilter`  |
//! | yes                 | yes       | yes             | `IndexKey`        |
//! | no                  | any       | no              | inherit           |
//! | yes                 | no        | no              | inherit           |

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullFilterReason {
    /// Key column of a NULL_FILTERED index
    IndexKey,
    /// Named in the index's explicit not-null filter
    ExplicitFilter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullFilterFacts {
    pub null_filtered_index: bool,
    pub is_index_key: bool,
    pub explicitly_filtered: bool,
}

pub fn null_filter_reason(facts: NullFilterFacts) -> Option<NullFilterReason> {
    if facts.null_filtered_index && facts.is_index_key {
        Some(NullFilterReason::IndexKey)
    } else if facts.explicitly_filtered {
        Some(NullFilterReason::ExplicitFilter)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(null_filtered_index: bool, is_index_key: bool, explicitly_filtered: bool) -> NullFilterFacts {
        NullFilterFacts {
            null_filtered_index,
            is_index_key,
            explicitly_filtered,
        }
    }

    #[test]
    fn test_policy_table() {
        assert_eq!(null_filter_reason(facts(true, true, false)), Some(NullFilterReason::IndexKey));
        assert_eq!(null_filter_reason(facts(true, true, true)), Some(NullFilterReason::IndexKey));
        assert_eq!(
            null_filter_reason(facts(false, true, true)),
            Some(NullFilterReason::ExplicitFilter)
        );
        assert_eq!(
            null_filter_reason(facts(true, false, true)),
            Some(NullFilterReason::ExplicitFilter)
        );
        assert_eq!(null_filter_reason(facts(true, false, false)), None);
        assert_eq!(null_filter_reason(facts(false, true, false)), None);
    }
}
