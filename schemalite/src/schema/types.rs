// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Column types and values
//!
//! The catalog stores column types verbatim from the DDL front end and only
//! needs a handful of rules about them: which types may be keys, which may be
//! altered into which, and which accept commit timestamps.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Semantic type of a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Bool,
    Int64,
    Float32,
    Float64,
    Numeric,
    String,
    Bytes,
    Json,
    Date,
    Timestamp,
    Tokenlist,
    Array(Box<ColumnType>),
}

impl ColumnType {
    pub fn array_of(element: ColumnType) -> Self {
        ColumnType::Array(Box::new(element))
    }

    pub fn element_type(&self) -> Option<&ColumnType> {
        match self {
            ColumnType::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Whether values of this type can be stored in a key column
    pub fn is_key_type(&self) -> bool {
        !matches!(
            self,
            ColumnType::Array(_) | ColumnType::Json | ColumnType::Tokenlist
        )
    }

    /// Whether a declared max length applies to this type
    pub fn supports_max_length(&self) -> bool {
        match self {
            ColumnType::String | ColumnType::Bytes => true,
            ColumnType::Array(element) => element.supports_max_length(),
            _ => false,
        }
    }

    pub fn supports_vector_length(&self) -> bool {
        matches!(
            self.element_type(),
            Some(ColumnType::Float32) | Some(ColumnType::Float64)
        )
    }

    /// Whether an existing column of type `self` may be altered to `new_type`
    pub fn can_alter_to(&self, new_type: &ColumnType) -> bool {
        match (self, new_type) {
            (a, b) if a == b => true,
            (ColumnType::String, ColumnType::Bytes) | (ColumnType::Bytes, ColumnType::String) => {
                true
            }
            (ColumnType::Array(a), ColumnType::Array(b)) => a.can_alter_to(b),
            _ => false,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Bool => write!(f, "BOOL"),
            ColumnType::Int64 => write!(f, "INT64"),
            ColumnType::Float32 => write!(f, "FLOAT32"),
            ColumnType::Float64 => write!(f, "FLOAT64"),
            ColumnType::Numeric => write!(f, "NUMERIC"),
            ColumnType::String => write!(f, "STRING"),
            ColumnType::Bytes => write!(f, "BYTES"),
            ColumnType::Json => write!(f, "JSON"),
            ColumnType::Date => write!(f, "DATE"),
            ColumnType::Timestamp => write!(f, "TIMESTAMP"),
            ColumnType::Tokenlist => write!(f, "TOKENLIST"),
            ColumnType::Array(element) => write!(f, "ARRAY<{}>", element),
        }
    }
}

/// A single cell value as seen by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    /// Placeholder for a commit timestamp not yet assigned
    PendingCommitTimestamp,
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Length in characters (strings) or bytes (bytes) for max-length checks
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            _ => None,
        }
    }
}

// Floats compare and hash by bit pattern so values can key a HashSet during
// uniqueness scans.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::PendingCommitTimestamp, Value::PendingCommitTimestamp) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null | Value::PendingCommitTimestamp => {}
            Value::Bool(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::Bytes(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
            Value::Timestamp(v) => v.hash(state),
            Value::Array(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Bytes(v) => write!(f, "b\"{}\"", String::from_utf8_lossy(v)),
            Value::Date(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::PendingCommitTimestamp => write!(f, "PENDING_COMMIT_TIMESTAMP()"),
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_alter_compatibility() {
        assert!(ColumnType::String.can_alter_to(&ColumnType::Bytes));
        assert!(ColumnType::Bytes.can_alter_to(&ColumnType::String));
        assert!(ColumnType::array_of(ColumnType::String)
            .can_alter_to(&ColumnType::array_of(ColumnType::Bytes)));
        assert!(!ColumnType::Int64.can_alter_to(&ColumnType::String));
        assert!(!ColumnType::Int64.can_alter_to(&ColumnType::Float64));
    }

    #[test]
    fn test_key_types() {
        assert!(ColumnType::Timestamp.is_key_type());
        assert!(!ColumnType::Json.is_key_type());
        assert!(!ColumnType::array_of(ColumnType::Int64).is_key_type());
    }

    #[test]
    fn test_float_values_hash_by_bits() {
        let mut seen = HashSet::new();
        assert!(seen.insert(Value::Float64(1.5)));
        assert!(!seen.insert(Value::Float64(1.5)));
        assert!(seen.insert(Value::Float64(f64::NAN)));
        assert!(!seen.insert(Value::Float64(f64::NAN)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ColumnType::array_of(ColumnType::Float32).to_string(), "ARRAY<FLOAT32>");
        assert_eq!(
            Value::Array(vec![Value::Int64(1), Value::String("x".into())]).to_string(),
            "[1, \"x\"]"
        );
    }
}
