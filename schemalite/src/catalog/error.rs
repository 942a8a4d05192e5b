// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog error types
//!
//! Every failure raised while building, cloning, validating or reading a
//! schema graph is a [`CatalogError`]. The variant tells the caller which
//! class of problem occurred; [`CatalogError::is_internal`] separates bugs in
//! the catalog itself from errors caused by the submitted DDL.

use std::fmt;
use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Broad classification of a [`CatalogError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Structural,
    Uniqueness,
    Compatibility,
    Policy,
    Internal,
    NotFound,
    PendingCommitTimestamp,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Structural => "structural",
            ErrorKind::Uniqueness => "uniqueness",
            ErrorKind::Compatibility => "compatibility",
            ErrorKind::Policy => "policy",
            ErrorKind::Internal => "internal",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PendingCommitTimestamp => "pending_commit_timestamp",
            ErrorKind::Config => "config",
        };
        write!(f, "{}", name)
    }
}

/// Errors produced by the schema catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// A required relationship is missing or malformed
    #[error("{0}")]
    Structural(String),

    /// Duplicate name, or duplicate key value found while backfilling an index
    #[error("{0}")]
    Duplicate(String),

    /// The update would narrow a type or break a dependent object
    #[error("{0}")]
    Incompatible(String),

    /// The change is well-formed but not allowed
    #[error("{0}")]
    Policy(String),

    /// A reference could not be resolved; always a catalog bug
    #[error("internal consistency error: {0}")]
    Internal(String),

    /// Lookup by name failed
    #[error("{0}")]
    NotFound(String),

    /// A read would observe an unresolved commit timestamp
    #[error("{0}")]
    PendingCommitTimestamp(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Structural(_) => ErrorKind::Structural,
            CatalogError::Duplicate(_) => ErrorKind::Uniqueness,
            CatalogError::Incompatible(_) => ErrorKind::Compatibility,
            CatalogError::Policy(_) => ErrorKind::Policy,
            CatalogError::Internal(_) => ErrorKind::Internal,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::PendingCommitTimestamp(_) => ErrorKind::PendingCommitTimestamp,
            CatalogError::InvalidConfig(_) | CatalogError::Serialization(_) => ErrorKind::Config,
        }
    }

    /// True for errors that indicate a bug in the catalog rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(self, CatalogError::Internal(_))
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    // Constructors for messages that are raised from more than one place.

    pub fn table_not_found(name: &str) -> Self {
        CatalogError::NotFound(format!("Table not found: {}", name))
    }

    pub fn column_not_found(table: &str, column: &str) -> Self {
        CatalogError::NotFound(format!("Column not found in table {}: {}", table, column))
    }

    pub fn index_not_found(name: &str) -> Self {
        CatalogError::NotFound(format!("Index not found: {}", name))
    }

    pub fn sequence_not_found(name: &str) -> Self {
        CatalogError::NotFound(format!("Sequence not found: {}", name))
    }

    pub fn duplicate_name(kind: &str, name: &str) -> Self {
        CatalogError::Duplicate(format!("Duplicate name in schema: {} {}", kind, name))
    }

    pub fn invalid_identifier(kind: &str, name: &str) -> Self {
        CatalogError::Structural(format!("{} name not valid: {}", kind, name))
    }

    pub fn column_in_use_by_index(table: &str, column: &str, index: &str) -> Self {
        CatalogError::Policy(format!(
            "Cannot drop column `{}` from table `{}` because it is referenced by index `{}`",
            column, table, index
        ))
    }

    pub fn dangling_reference(from: &str, target: impl fmt::Display) -> Self {
        CatalogError::Internal(format!("{} references {} which cannot be resolved", from, target))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_distinguished() {
        let err = CatalogError::dangling_reference("T:Users[1]", "slot 4@7");
        assert!(err.is_internal());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().starts_with("internal consistency error"));

        let user = CatalogError::column_in_use_by_index("T", "b", "I");
        assert!(!user.is_internal());
        assert_eq!(user.kind(), ErrorKind::Policy);
    }

    #[test]
    fn test_duplicate_maps_to_uniqueness() {
        let err = CatalogError::duplicate_name("Table", "Users");
        assert_eq!(err.kind(), ErrorKind::Uniqueness);
        assert_eq!(err.to_string(), "Duplicate name in schema: Table Users");
    }
}
