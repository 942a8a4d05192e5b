// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog configuration
//!
//! Schema limits and validator behaviour. Configuration is plain serde data so
//! it can be embedded in a host's own config file or loaded standalone.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{CatalogError, CatalogResult};

static IDENTIFIER: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$"));

/// Hard limits enforced by the validators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaLimits {
    pub max_columns_per_table: usize,
    pub max_indexes_per_table: usize,
    pub max_key_columns: usize,
    pub max_interleave_depth: usize,
    pub max_identifier_length: usize,
    pub max_change_streams_per_column: usize,
}

impl Default for SchemaLimits {
    fn default() -> Self {
        Self {
            max_columns_per_table: 1024,
            max_indexes_per_table: 128,
            max_key_columns: 16,
            max_interleave_depth: 7,
            max_identifier_length: 128,
            max_change_streams_per_column: 3,
        }
    }
}

impl SchemaLimits {
    /// Check a user-supplied object name against the identifier rules
    pub fn check_identifier(&self, kind: &str, name: &str) -> CatalogResult<()> {
        let pattern = IDENTIFIER
            .as_ref()
            .map_err(|e| CatalogError::Internal(format!("Identifier pattern does not compile: {}", e)))?;
        if name.len() > self.max_identifier_length || !pattern.is_match(name) {
            return Err(CatalogError::invalid_identifier(kind, name));
        }
        Ok(())
    }
}

/// Top-level catalog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub limits: SchemaLimits,
    /// Keep validating after the first violation so every problem is logged.
    /// The first violation is still the one returned to the caller.
    pub collect_all_errors: bool,
    /// Scan committed rows when a change needs data checks
    pub verify_existing_data: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            limits: SchemaLimits::default(),
            collect_all_errors: false,
            verify_existing_data: true,
        }
    }
}

impl CatalogConfig {
    /// Production-like settings
    pub fn strict() -> Self {
        Self::default()
    }

    /// Generous limits and full error collection, for tests and tooling
    pub fn permissive() -> Self {
        Self {
            limits: SchemaLimits {
                max_columns_per_table: usize::MAX,
                max_indexes_per_table: usize::MAX,
                max_key_columns: usize::MAX,
                max_interleave_depth: usize::MAX,
                max_identifier_length: usize::MAX,
                max_change_streams_per_column: usize::MAX,
            },
            collect_all_errors: true,
            verify_existing_data: false,
        }
    }

    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        let config: CatalogConfig = serde_json::from_str(json)
            .map_err(|e| CatalogError::InvalidConfig(format!("Failed to parse catalog config: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    fn check(&self) -> CatalogResult<()> {
        let limits = &self.limits;
        if limits.max_key_columns == 0 {
            return Err(CatalogError::InvalidConfig(
                "max_key_columns must be at least 1".to_string(),
            ));
        }
        if limits.max_identifier_length == 0 {
            return Err(CatalogError::InvalidConfig(
                "max_identifier_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_identifier_rules() {
        let limits = SchemaLimits::default();
        assert!(limits.check_identifier("Table", "Users").is_ok());
        assert!(limits.check_identifier("Table", "user_events2").is_ok());
        assert!(limits.check_identifier("Table", "2users").is_err());
        assert!(limits.check_identifier("Table", "_hidden").is_err());
        assert!(limits.check_identifier("Table", "").is_err());

        let long = "a".repeat(129);
        assert!(limits.check_identifier("Table", &long).is_err());
    }

    #[test]
    fn test_bad_identifiers_are_structural_errors() {
        assert!(IDENTIFIER.is_ok());
        let err = SchemaLimits::default().check_identifier("Column", "bad-name").unwrap_err();
        assert!(matches!(err, CatalogError::Structural(_)));
        assert!(err.to_string().contains("Column name not valid: bad-name"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CatalogConfig::from_json_str(r#"{"limits": {"max_key_columns": 4}}"#).unwrap();
        assert_eq!(config.limits.max_key_columns, 4);
        assert_eq!(config.limits.max_columns_per_table, 1024);
        assert!(config.verify_existing_data);
    }

    #[test]
    fn test_rejects_zero_key_columns() {
        let err = CatalogConfig::from_json_str(r#"{"limits": {"max_key_columns": 0}}"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"collect_all_errors": true}}"#).unwrap();
        let config = CatalogConfig::from_file(file.path()).unwrap();
        assert!(config.collect_all_errors);
        assert_eq!(config.limits, SchemaLimits::default());
    }
}
