// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Table constraint statements

use log::debug;

use super::index_ops::{build_index, CreateIndex};
use super::{lookup_table, KeyPart};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::builders::{CheckConstraintBuilder, ForeignKeyBuilder};
use crate::schema::catalog::{ForeignKey, ReferentialAction};
use crate::schema::graph::SchemaGraphEditor;
use crate::schema::updater::SchemaStatement;

fn name_hash(parts: &[&str]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Name given to a check constraint declared without one
pub fn generated_check_name(table: &str, expression: &str) -> String {
    format!("CK_{}_{:08X}", table, name_hash(&[table, expression]))
}

/// Name given to a foreign key declared without one
pub fn generated_foreign_key_name(table: &str, referenced_table: &str, columns: &[String]) -> String {
    let mut parts = vec![table, referenced_table];
    parts.extend(columns.iter().map(String::as_str));
    format!("FK_{}_{}_{:08X}", table, referenced_table, name_hash(&parts))
}

/// Name of the index created to back a foreign key
pub fn backing_index_name(table: &str, columns: &[String], foreign_key: &str) -> String {
    format!(
        "IDX_{}_{}_{:08X}",
        table,
        columns.join("_"),
        name_hash(&[table, foreign_key])
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCheckConstraint {
    pub table: String,
    pub name: Option<String>,
    pub expression: String,
    /// Columns the expression reads
    pub columns: Vec<String>,
}

impl AddCheckConstraint {
    pub fn new(table: impl Into<String>, expression: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            table: table.into(),
            name: None,
            expression: expression.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl SchemaStatement for AddCheckConstraint {
    fn describe(&self) -> String {
        format!("ALTER TABLE {} ADD CHECK ({})", self.table, self.expression)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let table = editor
            .source()
            .find_table(&self.table)
            .ok_or_else(|| CatalogError::table_not_found(&self.table))?;
        let (name, generated) = match &self.name {
            Some(name) => (name.clone(), false),
            None => (generated_check_name(table.name(), &self.expression), true),
        };
        let mut builder = CheckConstraintBuilder::new(&name, table.handle(), &self.expression)
            .set_original_expression(&self.expression)
            .set_generated_name(generated);
        for column in &self.columns {
            let column = table
                .find_column(column)
                .ok_or_else(|| CatalogError::column_not_found(&self.table, column))?;
            builder = builder.add_dependent_column(column.handle());
        }
        let check = editor.add_node(builder.build())?;
        editor.edit(table.handle())?.add_check_constraint(check);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddForeignKey {
    pub table: String,
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_delete: ReferentialAction,
    pub enforced: bool,
}

impl AddForeignKey {
    pub fn new(
        table: impl Into<String>,
        columns: &[&str],
        referenced_table: impl Into<String>,
        referenced_columns: &[&str],
    ) -> Self {
        Self {
            table: table.into(),
            name: None,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_table: referenced_table.into(),
            referenced_columns: referenced_columns.iter().map(|c| c.to_string()).collect(),
            on_delete: ReferentialAction::NoAction,
            enforced: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn not_enforced(mut self) -> Self {
        self.enforced = false;
        self
    }
}

impl SchemaStatement for AddForeignKey {
    fn describe(&self) -> String {
        format!(
            "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {} ({})",
            self.table,
            self.columns.join(", "),
            self.referenced_table,
            self.referenced_columns.join(", ")
        )
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let source = editor.source();
        let referencing = source
            .find_table(&self.table)
            .ok_or_else(|| CatalogError::table_not_found(&self.table))?;
        let referenced = source
            .find_table(&self.referenced_table)
            .ok_or_else(|| CatalogError::table_not_found(&self.referenced_table))?;
        let name = self.name.clone().unwrap_or_else(|| {
            generated_foreign_key_name(referencing.name(), referenced.name(), &self.columns)
        });

        let fk = editor.allocate::<ForeignKey>()?;
        let mut builder = ForeignKeyBuilder::new(&name, referencing.handle(), referenced.handle())
            .set_on_delete(self.on_delete)
            .set_enforced(self.enforced);
        for column in &self.columns {
            let column = referencing
                .find_column(column)
                .ok_or_else(|| CatalogError::column_not_found(&self.table, column))?;
            builder = builder.add_referencing_column(column.handle());
        }
        for column in &self.referenced_columns {
            let column = referenced
                .find_column(column)
                .ok_or_else(|| CatalogError::column_not_found(&self.referenced_table, column))?;
            builder = builder.add_referenced_column(column.handle());
        }

        let backing = CreateIndex::new(
            backing_index_name(referencing.name(), &self.columns, &name),
            referencing.name(),
            self.columns.iter().map(|c| KeyPart::asc(c.as_str())).collect(),
        );
        let index = build_index(editor, &backing, Some(fk.erase()))?;
        builder = builder.set_referencing_index(index);

        editor.insert(fk, builder.build())?;
        editor.edit(referencing.handle())?.add_foreign_key(fk);
        editor.edit(referenced.handle())?.add_referencing_foreign_key(fk);
        debug!("Foreign key {} is backed by index {}", name, backing.name);
        Ok(())
    }
}

/// ALTER TABLE ... DROP CONSTRAINT, for foreign keys and check constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropConstraint {
    pub table: String,
    pub name: String,
}

impl DropConstraint {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
        }
    }
}

impl SchemaStatement for DropConstraint {
    fn describe(&self) -> String {
        format!("ALTER TABLE {} DROP CONSTRAINT {}", self.table, self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let table_handle = lookup_table(editor, &self.table)?;
        let table = editor.source().expect_view(table_handle)?;

        if let Some(fk) = table.find_foreign_key(&self.name) {
            editor.delete(fk.handle())?;
            if let Some(index) = fk.referencing_index() {
                let remaining = editor
                    .edit(index.handle())?
                    .remove_managing_node(fk.handle().erase())
                    .managing_node_count();
                if remaining == 0 {
                    editor.delete(index.handle())?;
                }
            }
            return Ok(());
        }
        if let Some(check) = table.find_check_constraint(&self.name) {
            editor.delete(check.handle())?;
            return Ok(());
        }
        Err(CatalogError::NotFound(format!(
            "Constraint not found on table {}: {}",
            self.table, self.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names_are_stable_and_distinct() {
        let a = generated_check_name("T", "a > 0");
        assert_eq!(a, generated_check_name("T", "a > 0"));
        assert_ne!(a, generated_check_name("T", "a > 1"));
        assert!(a.starts_with("CK_T_"));
        assert_eq!(a.len(), "CK_T_".len() + 8);

        let columns = vec!["a".to_string(), "b".to_string()];
        let index = backing_index_name("T", &columns, "FK_1");
        assert!(index.starts_with("IDX_T_a_b_"));
        assert_ne!(index, backing_index_name("T", &columns, "FK_2"));
    }
}
