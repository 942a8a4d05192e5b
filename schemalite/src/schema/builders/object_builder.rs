// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Builders and editors for change streams, locality groups, sequences and
//! functions

use crate::catalog::ids::{ChangeStreamId, SequenceId};
use crate::schema::catalog::{
    ChangeStream, Column, LocalityGroup, Sequence, SequenceKind, StorageKind, Table, Udf,
};
use crate::schema::graph::{Editable, Handle};

#[derive(Debug)]
pub struct ChangeStreamBuilder {
    stream: ChangeStream,
}

impl ChangeStreamBuilder {
    pub fn new(name: impl Into<String>, id: ChangeStreamId) -> Self {
        Self {
            stream: ChangeStream {
                name: name.into(),
                id,
                track_all: false,
                tracked_tables: Vec::new(),
                tracked_columns: Vec::new(),
                change_stream_data_table: None,
                retention_period: None,
                value_capture_type: None,
            },
        }
    }

    pub fn set_track_all(mut self, all: bool) -> Self {
        self.stream.track_all = all;
        self
    }

    pub fn add_tracked_table(mut self, table: Handle<Table>) -> Self {
        self.stream.tracked_tables.push(table);
        self
    }

    pub fn add_tracked_column(mut self, column: Handle<Column>) -> Self {
        self.stream.tracked_columns.push(column);
        self
    }

    pub fn set_data_table(mut self, table: Handle<Table>) -> Self {
        self.stream.change_stream_data_table = Some(table);
        self
    }

    pub fn set_retention_period(mut self, period: impl Into<String>) -> Self {
        self.stream.retention_period = Some(period.into());
        self
    }

    pub fn set_value_capture_type(mut self, capture: impl Into<String>) -> Self {
        self.stream.value_capture_type = Some(capture.into());
        self
    }

    pub fn build(self) -> ChangeStream {
        self.stream
    }
}

pub struct ChangeStreamEditor<'a> {
    stream: &'a mut ChangeStream,
}

impl Editable for ChangeStream {
    type Editor<'a> = ChangeStreamEditor<'a>;

    fn editor(&mut self) -> ChangeStreamEditor<'_> {
        ChangeStreamEditor { stream: self }
    }
}

impl ChangeStreamEditor<'_> {
    pub fn set_retention_period(&mut self, period: Option<String>) -> &mut Self {
        self.stream.retention_period = period;
        self
    }

    pub fn set_value_capture_type(&mut self, capture: Option<String>) -> &mut Self {
        self.stream.value_capture_type = capture;
        self
    }
}

#[derive(Debug)]
pub struct LocalityGroupBuilder {
    group: LocalityGroup,
}

impl LocalityGroupBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            group: LocalityGroup {
                name: name.into(),
                storage: StorageKind::Ssd,
                ssd_to_hdd_spill_timespan: None,
            },
        }
    }

    pub fn set_storage(mut self, storage: StorageKind) -> Self {
        self.group.storage = storage;
        self
    }

    pub fn set_ssd_to_hdd_spill_timespan(mut self, timespan: impl Into<String>) -> Self {
        self.group.ssd_to_hdd_spill_timespan = Some(timespan.into());
        self
    }

    pub fn build(self) -> LocalityGroup {
        self.group
    }
}

pub struct LocalityGroupEditor<'a> {
    group: &'a mut LocalityGroup,
}

impl Editable for LocalityGroup {
    type Editor<'a> = LocalityGroupEditor<'a>;

    fn editor(&mut self) -> LocalityGroupEditor<'_> {
        LocalityGroupEditor { group: self }
    }
}

impl LocalityGroupEditor<'_> {
    pub fn set_storage(&mut self, storage: StorageKind) -> &mut Self {
        self.group.storage = storage;
        self
    }

    pub fn set_ssd_to_hdd_spill_timespan(&mut self, timespan: Option<String>) -> &mut Self {
        self.group.ssd_to_hdd_spill_timespan = timespan;
        self
    }
}

#[derive(Debug)]
pub struct SequenceBuilder {
    sequence: Sequence,
}

impl SequenceBuilder {
    pub fn new(name: impl Into<String>, id: SequenceId) -> Self {
        Self {
            sequence: Sequence {
                name: name.into(),
                id,
                kind: SequenceKind::BitReversedPositive,
                start_with_counter: None,
                skip_range: None,
                internal: false,
            },
        }
    }

    pub fn set_start_with_counter(mut self, start: i64) -> Self {
        self.sequence.start_with_counter = Some(start);
        self
    }

    pub fn set_skip_range(mut self, min: i64, max: i64) -> Self {
        self.sequence.skip_range = Some((min, max));
        self
    }

    pub fn set_internal(mut self, internal: bool) -> Self {
        self.sequence.internal = internal;
        self
    }

    pub fn build(self) -> Sequence {
        self.sequence
    }
}

pub struct SequenceEditor<'a> {
    sequence: &'a mut Sequence,
}

impl Editable for Sequence {
    type Editor<'a> = SequenceEditor<'a>;

    fn editor(&mut self) -> SequenceEditor<'_> {
        SequenceEditor { sequence: self }
    }
}

impl SequenceEditor<'_> {
    pub fn set_start_with_counter(&mut self, start: Option<i64>) -> &mut Self {
        self.sequence.start_with_counter = start;
        self
    }

    pub fn set_skip_range(&mut self, range: Option<(i64, i64)>) -> &mut Self {
        self.sequence.skip_range = range;
        self
    }
}

#[derive(Debug)]
pub struct UdfBuilder {
    udf: Udf,
}

impl UdfBuilder {
    pub fn new(name: impl Into<String>, signature: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            udf: Udf {
                name: name.into(),
                signature: signature.into(),
                definition: definition.into(),
                deterministic: true,
                sequences_used: Vec::new(),
                udf_dependencies: Vec::new(),
            },
        }
    }

    pub fn set_deterministic(mut self, deterministic: bool) -> Self {
        self.udf.deterministic = deterministic;
        self
    }

    pub fn add_sequence(mut self, sequence: Handle<Sequence>) -> Self {
        self.udf.sequences_used.push(sequence);
        self
    }

    pub fn add_udf_dependency(mut self, udf: Handle<Udf>) -> Self {
        self.udf.udf_dependencies.push(udf);
        self
    }

    pub fn build(self) -> Udf {
        self.udf
    }
}

/// `CREATE OR REPLACE FUNCTION` rewrites an existing function in place
pub struct UdfEditor<'a> {
    udf: &'a mut Udf,
}

impl Editable for Udf {
    type Editor<'a> = UdfEditor<'a>;

    fn editor(&mut self) -> UdfEditor<'_> {
        UdfEditor { udf: self }
    }
}

impl UdfEditor<'_> {
    pub fn replace_definition(
        &mut self,
        signature: String,
        definition: String,
        deterministic: bool,
    ) -> &mut Self {
        self.udf.signature = signature;
        self.udf.definition = definition;
        self.udf.deterministic = deterministic;
        self.udf.sequences_used.clear();
        self.udf.udf_dependencies.clear();
        self
    }

    pub fn add_sequence(&mut self, sequence: Handle<Sequence>) -> &mut Self {
        self.udf.sequences_used.push(sequence);
        self
    }

    pub fn add_udf_dependency(&mut self, udf: Handle<Udf>) -> &mut Self {
        self.udf.udf_dependencies.push(udf);
        self
    }
}
