// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statements for sequences, locality groups, change streams and functions

use super::lookup_sequence;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::schema::builders::{
    ChangeStreamBuilder, ColumnBuilder, KeyColumnBuilder, LocalityGroupBuilder, SequenceBuilder,
    TableBuilder, UdfBuilder,
};
use crate::schema::catalog::{ChangeStream, StorageKind, Table};
use crate::schema::graph::SchemaGraphEditor;
use crate::schema::types::ColumnType;
use crate::schema::updater::SchemaStatement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSequence {
    pub name: String,
    pub start_with_counter: Option<i64>,
    pub skip_range: Option<(i64, i64)>,
}

impl CreateSequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_with_counter: None,
            skip_range: None,
        }
    }

    pub fn start_with_counter(mut self, start: i64) -> Self {
        self.start_with_counter = Some(start);
        self
    }

    pub fn skip_range(mut self, min: i64, max: i64) -> Self {
        self.skip_range = Some((min, max));
        self
    }
}

impl SchemaStatement for CreateSequence {
    fn describe(&self) -> String {
        format!("CREATE SEQUENCE {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let id = editor.ids().next_sequence_id();
        let mut builder = SequenceBuilder::new(&self.name, id);
        if let Some(start) = self.start_with_counter {
            builder = builder.set_start_with_counter(start);
        }
        if let Some((min, max)) = self.skip_range {
            builder = builder.set_skip_range(min, max);
        }
        editor.add_node(builder.build())?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropSequence {
    pub name: String,
}

impl DropSequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SchemaStatement for DropSequence {
    fn describe(&self) -> String {
        format!("DROP SEQUENCE {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let sequence = lookup_sequence(editor, &self.name)?;
        editor.delete(sequence)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLocalityGroup {
    pub name: String,
    pub storage: StorageKind,
    pub ssd_to_hdd_spill_timespan: Option<String>,
}

impl CreateLocalityGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage: StorageKind::Ssd,
            ssd_to_hdd_spill_timespan: None,
        }
    }

    pub fn storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    pub fn spill_after(mut self, timespan: impl Into<String>) -> Self {
        self.ssd_to_hdd_spill_timespan = Some(timespan.into());
        self
    }
}

impl SchemaStatement for CreateLocalityGroup {
    fn describe(&self) -> String {
        format!("CREATE LOCALITY GROUP {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let mut builder = LocalityGroupBuilder::new(&self.name).set_storage(self.storage);
        if let Some(timespan) = &self.ssd_to_hdd_spill_timespan {
            builder = builder.set_ssd_to_hdd_spill_timespan(timespan);
        }
        editor.add_node(builder.build())?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropLocalityGroup {
    pub name: String,
}

impl DropLocalityGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SchemaStatement for DropLocalityGroup {
    fn describe(&self) -> String {
        format!("DROP LOCALITY GROUP {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let group = editor
            .source()
            .find_locality_group(&self.name)
            .map(|g| g.handle())
            .ok_or_else(|| CatalogError::NotFound(format!("Locality group not found: {}", self.name)))?;
        editor.delete(group)?;
        Ok(())
    }
}

/// A table in a change stream's FOR clause. No columns means every non-key
/// column is tracked implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTable {
    pub table: String,
    pub columns: Vec<String>,
}

impl TrackedTable {
    pub fn all_columns(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn columns(table: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            table: table.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChangeStream {
    pub name: String,
    /// FOR ALL
    pub track_all: bool,
    pub tables: Vec<TrackedTable>,
    pub retention_period: Option<String>,
    pub value_capture_type: Option<String>,
}

impl CreateChangeStream {
    pub fn for_all(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            track_all: true,
            tables: Vec::new(),
            retention_period: None,
            value_capture_type: None,
        }
    }

    pub fn for_tables(name: impl Into<String>, tables: Vec<TrackedTable>) -> Self {
        Self {
            name: name.into(),
            track_all: false,
            tables,
            retention_period: None,
            value_capture_type: None,
        }
    }

    pub fn retention_period(mut self, period: impl Into<String>) -> Self {
        self.retention_period = Some(period.into());
        self
    }

    pub fn value_capture_type(mut self, capture: impl Into<String>) -> Self {
        self.value_capture_type = Some(capture.into());
        self
    }
}

impl SchemaStatement for CreateChangeStream {
    fn describe(&self) -> String {
        format!("CREATE CHANGE STREAM {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let source = editor.source();
        let stream = editor.allocate::<ChangeStream>()?;
        let stream_id = editor.ids().next_change_stream_id();

        // Internal table holding the stream's partitions
        let data_table = editor.allocate::<Table>()?;
        let data_table_id = editor.ids().next_table_id();
        let partition_id = editor.ids().next_column_id();
        let partition = editor.add_node(
            ColumnBuilder::new("partition_token", partition_id, ColumnType::String, data_table)
                .set_nullable(false)
                .build(),
        )?;
        let partition_key = editor.add_node(KeyColumnBuilder::new(partition).build())?;
        let data = TableBuilder::new(format!("_change_stream_partition_{}", self.name), data_table_id)
            .add_column(partition, "partition_token")
            .add_key_column(partition_key)
            .set_owner_change_stream(stream)
            .build();
        editor.insert(data_table, data)?;

        let mut builder = ChangeStreamBuilder::new(&self.name, stream_id)
            .set_track_all(self.track_all)
            .set_data_table(data_table);
        if let Some(period) = &self.retention_period {
            builder = builder.set_retention_period(period);
        }
        if let Some(capture) = &self.value_capture_type {
            builder = builder.set_value_capture_type(capture);
        }

        if self.track_all {
            for table in source.tables() {
                editor.edit(table.handle())?.add_change_stream(stream, false);
                for column in table.columns() {
                    editor.edit(column.handle())?.add_change_stream(stream, false);
                }
            }
        }
        for tracked in &self.tables {
            let table = source
                .find_table(&tracked.table)
                .ok_or_else(|| CatalogError::table_not_found(&tracked.table))?;
            builder = builder.add_tracked_table(table.handle());
            editor.edit(table.handle())?.add_change_stream(stream, true);
            if tracked.columns.is_empty() {
                for column in table.columns().into_iter().filter(|c| !c.is_key_column()) {
                    editor.edit(column.handle())?.add_change_stream(stream, false);
                }
            }
            for name in &tracked.columns {
                let column = table
                    .find_column(name)
                    .ok_or_else(|| CatalogError::column_not_found(&tracked.table, name))?;
                builder = builder.add_tracked_column(column.handle());
                editor.edit(column.handle())?.add_change_stream(stream, true);
            }
        }

        editor.insert(stream, builder.build())?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropChangeStream {
    pub name: String,
}

impl DropChangeStream {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SchemaStatement for DropChangeStream {
    fn describe(&self) -> String {
        format!("DROP CHANGE STREAM {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let stream = editor
            .source()
            .find_change_stream(&self.name)
            .map(|s| s.handle())
            .ok_or_else(|| CatalogError::NotFound(format!("Change stream not found: {}", self.name)))?;
        editor.delete(stream)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFunction {
    pub name: String,
    pub signature: String,
    pub definition: String,
    pub deterministic: bool,
    pub or_replace: bool,
    pub sequences: Vec<String>,
    pub functions: Vec<String>,
}

impl CreateFunction {
    pub fn new(name: impl Into<String>, signature: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            definition: definition.into(),
            deterministic: true,
            or_replace: false,
            sequences: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn or_replace(mut self) -> Self {
        self.or_replace = true;
        self
    }

    pub fn non_deterministic(mut self) -> Self {
        self.deterministic = false;
        self
    }

    pub fn uses_sequence(mut self, name: impl Into<String>) -> Self {
        self.sequences.push(name.into());
        self
    }

    pub fn uses_function(mut self, name: impl Into<String>) -> Self {
        self.functions.push(name.into());
        self
    }
}

impl SchemaStatement for CreateFunction {
    fn describe(&self) -> String {
        let verb = if self.or_replace { "CREATE OR REPLACE" } else { "CREATE" };
        format!("{} FUNCTION {}", verb, self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let source = editor.source();
        let mut sequences = Vec::with_capacity(self.sequences.len());
        for name in &self.sequences {
            sequences.push(lookup_sequence(editor, name)?);
        }
        let mut functions = Vec::with_capacity(self.functions.len());
        for name in &self.functions {
            let udf = source
                .find_function(name)
                .ok_or_else(|| CatalogError::NotFound(format!("Function not found: {}", name)))?;
            functions.push(udf.handle());
        }

        if let Some(existing) = source.find_function(&self.name) {
            if !self.or_replace {
                return Err(CatalogError::duplicate_name("Function", &self.name));
            }
            let mut udf = editor.edit(existing.handle())?;
            udf.replace_definition(self.signature.clone(), self.definition.clone(), self.deterministic);
            for sequence in sequences {
                udf.add_sequence(sequence);
            }
            for dependency in functions {
                udf.add_udf_dependency(dependency);
            }
            return Ok(());
        }

        let mut builder = UdfBuilder::new(&self.name, &self.signature, &self.definition)
            .set_deterministic(self.deterministic);
        for sequence in sequences {
            builder = builder.add_sequence(sequence);
        }
        for dependency in functions {
            builder = builder.add_udf_dependency(dependency);
        }
        editor.add_node(builder.build())?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropFunction {
    pub name: String,
}

impl DropFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SchemaStatement for DropFunction {
    fn describe(&self) -> String {
        format!("DROP FUNCTION {}", self.name)
    }

    fn apply(&self, editor: &mut SchemaGraphEditor<'_>) -> CatalogResult<()> {
        let udf = editor
            .source()
            .find_function(&self.name)
            .map(|f| f.handle())
            .ok_or_else(|| CatalogError::NotFound(format!("Function not found: {}", self.name)))?;
        editor.delete(udf)?;
        Ok(())
    }
}
