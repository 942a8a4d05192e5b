// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Table builder and editor

use std::collections::HashMap;

use crate::catalog::ids::TableId;
use crate::schema::catalog::{
    ChangeStream, CheckConstraint, Column, ForeignKey, Index, KeyColumn, LocalityGroup,
    OnDeleteAction, RowDeletionPolicy, Table,
};
use crate::schema::graph::{Editable, Handle};

/// Assembles a new [`Table`]
#[derive(Debug)]
pub struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>, id: TableId) -> Self {
        Self {
            table: Table {
                name: name.into(),
                id,
                columns: Vec::new(),
                columns_by_name: HashMap::new(),
                primary_key: Vec::new(),
                parent: None,
                children: Vec::new(),
                on_delete: OnDeleteAction::NoAction,
                row_deletion_policy: None,
                foreign_keys: Vec::new(),
                referencing_foreign_keys: Vec::new(),
                check_constraints: Vec::new(),
                indexes: Vec::new(),
                change_streams: Vec::new(),
                explicit_change_streams: Vec::new(),
                owner_index: None,
                owner_change_stream: None,
                locality_group: None,
                synonym: None,
            },
        }
    }

    pub fn add_column(mut self, column: Handle<Column>, name: &str) -> Self {
        self.table.columns.push(column);
        self.table.columns_by_name.insert(name.to_lowercase(), column);
        self
    }

    pub fn add_key_column(mut self, key: Handle<KeyColumn>) -> Self {
        self.table.primary_key.push(key);
        self
    }

    pub fn set_parent(mut self, parent: Handle<Table>, on_delete: OnDeleteAction) -> Self {
        self.table.parent = Some(parent);
        self.table.on_delete = on_delete;
        self
    }

    pub fn set_row_deletion_policy(mut self, policy: RowDeletionPolicy) -> Self {
        self.table.row_deletion_policy = Some(policy);
        self
    }

    pub fn set_owner_index(mut self, index: Handle<Index>) -> Self {
        self.table.owner_index = Some(index);
        self
    }

    pub fn set_owner_change_stream(mut self, stream: Handle<ChangeStream>) -> Self {
        self.table.owner_change_stream = Some(stream);
        self
    }

    pub fn set_locality_group(mut self, group: Handle<LocalityGroup>) -> Self {
        self.table.locality_group = Some(group);
        self
    }

    pub fn set_synonym(mut self, synonym: impl Into<String>) -> Self {
        self.table.synonym = Some(synonym.into());
        self
    }

    pub fn build(self) -> Table {
        self.table
    }
}

/// Changes allowed on an existing table
pub struct TableEditor<'a> {
    table: &'a mut Table,
}

impl Editable for Table {
    type Editor<'a> = TableEditor<'a>;

    fn editor(&mut self) -> TableEditor<'_> {
        TableEditor { table: self }
    }
}

impl TableEditor<'_> {
    pub fn add_column(&mut self, column: Handle<Column>, name: &str) -> &mut Self {
        self.table.columns.push(column);
        self.table.columns_by_name.insert(name.to_lowercase(), column);
        self
    }

    pub fn add_child(&mut self, child: Handle<Table>) -> &mut Self {
        self.table.children.push(child);
        self
    }

    pub fn add_index(&mut self, index: Handle<Index>) -> &mut Self {
        self.table.indexes.push(index);
        self
    }

    pub fn add_foreign_key(&mut self, fk: Handle<ForeignKey>) -> &mut Self {
        self.table.foreign_keys.push(fk);
        self
    }

    pub fn add_referencing_foreign_key(&mut self, fk: Handle<ForeignKey>) -> &mut Self {
        self.table.referencing_foreign_keys.push(fk);
        self
    }

    pub fn add_check_constraint(&mut self, check: Handle<CheckConstraint>) -> &mut Self {
        self.table.check_constraints.push(check);
        self
    }

    pub fn add_change_stream(&mut self, stream: Handle<ChangeStream>, explicit: bool) -> &mut Self {
        self.table.change_streams.push(stream);
        if explicit {
            self.table.explicit_change_streams.push(stream);
        }
        self
    }

    pub fn set_on_delete(&mut self, on_delete: OnDeleteAction) -> &mut Self {
        self.table.on_delete = on_delete;
        self
    }

    pub fn set_row_deletion_policy(&mut self, policy: Option<RowDeletionPolicy>) -> &mut Self {
        self.table.row_deletion_policy = policy;
        self
    }

    pub fn set_locality_group(&mut self, group: Option<Handle<LocalityGroup>>) -> &mut Self {
        self.table.locality_group = group;
        self
    }

    pub fn set_synonym(&mut self, synonym: Option<String>) -> &mut Self {
        self.table.synonym = synonym;
        self
    }
}
