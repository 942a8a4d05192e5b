// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Commit timestamp handling in transactions and query reads

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use schemalite::schema::operations::{ColumnDefinition, CreateIndex, CreateSequence, CreateTable, KeyPart};
use schemalite::txn::{
    maybe_set_commit_timestamp, maybe_set_commit_timestamp_in_key, maybe_set_commit_timestamp_sentinel,
    maybe_set_commit_timestamp_sentinel_in_key, validate_commit_timestamp_key_set_for_delete,
    COMMIT_TIMESTAMP_LITERAL,
};
use schemalite::{
    CatalogConfig, CatalogError, CatalogManager, ColumnType, CommitTimestampTracker, ErrorKind,
    QueryCatalogAccess, RowWrite, SchemaGraph, Value, WriteOp,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Events(Ts commit-timestamp, Id) keyed on both, with a commit timestamp
/// value column and an index on Id. Logs has two commit timestamp value
/// columns.
fn events_schema() -> Arc<SchemaGraph> {
    let catalog = CatalogManager::new(CatalogConfig::default());
    let events = CreateTable::new("Events")
        .column(ColumnDefinition::new("Ts", ColumnType::Timestamp).not_null().allow_commit_timestamp())
        .column(ColumnDefinition::new("Id", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("Payload", ColumnType::String))
        .column(ColumnDefinition::new("Updated", ColumnType::Timestamp).allow_commit_timestamp())
        .column(ColumnDefinition::new("Seen", ColumnType::Timestamp))
        .primary_key(vec![KeyPart::desc("Ts"), KeyPart::asc("Id")]);
    let audit = CreateTable::new("Audit")
        .column(ColumnDefinition::new("Id", ColumnType::Int64).not_null())
        .primary_key(vec![KeyPart::asc("Id")]);
    let logs = CreateTable::new("Logs")
        .column(ColumnDefinition::new("Id", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("Created", ColumnType::Timestamp).allow_commit_timestamp())
        .column(ColumnDefinition::new("Modified", ColumnType::Timestamp).allow_commit_timestamp())
        .primary_key(vec![KeyPart::asc("Id")]);
    catalog
        .apply_batch(&[
            &events,
            &audit,
            &logs,
            &CreateIndex::new("EventsById", "Events", vec![KeyPart::asc("Id")]),
            &CreateSequence::new("EventSeq"),
        ])
        .expect("create schema")
}

fn literal() -> Value {
    Value::String(COMMIT_TIMESTAMP_LITERAL.to_uppercase())
}

#[test]
fn test_sentinels_replace_requests() {
    init();
    let schema = events_schema();
    let events = schema.find_table("Events").unwrap();
    let columns = vec![
        events.find_column("Payload").unwrap(),
        events.find_column("Updated").unwrap(),
    ];
    let row = maybe_set_commit_timestamp_sentinel(&columns, &[Value::String("x".into()), literal()])
        .expect("sentinel");
    assert_eq!(row, vec![Value::String("x".into()), Value::PendingCommitTimestamp]);

    let seen = vec![events.find_column("Seen").unwrap()];
    let err = maybe_set_commit_timestamp_sentinel(&seen, &[literal()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Policy);
    assert!(err.to_string().contains("column Seen"));

    let key = maybe_set_commit_timestamp_sentinel_in_key(&events.primary_key(), &[literal(), Value::Int64(7)])
        .expect("key sentinel");
    assert_eq!(key, vec![Value::PendingCommitTimestamp, Value::Int64(7)]);
}

#[test]
fn test_sentinels_resolve_at_commit() {
    init();
    let schema = events_schema();
    let events = schema.find_table("Events").unwrap();
    let commit = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let updated = events.find_column("Updated").unwrap();
    assert_eq!(
        maybe_set_commit_timestamp(&updated, &Value::PendingCommitTimestamp, commit),
        Value::Timestamp(commit)
    );
    assert_eq!(
        maybe_set_commit_timestamp(&updated, &Value::Null, commit),
        Value::Null
    );

    let key = maybe_set_commit_timestamp_in_key(
        &events.primary_key(),
        &[Value::PendingCommitTimestamp, Value::Int64(1)],
        commit,
    );
    assert_eq!(key, vec![Value::Timestamp(commit), Value::Int64(1)]);
}

#[test]
fn test_pending_key_blocks_table_and_index_reads() {
    init();
    let schema = events_schema();
    let events = schema.find_table("Events").unwrap();
    let audit = schema.find_table("Audit").unwrap();
    let tracker = CommitTimestampTracker::new();
    assert!(tracker.is_empty());

    tracker.track(
        &schema,
        &[
            WriteOp::Insert(RowWrite {
                table: events.id(),
                key: vec![Value::PendingCommitTimestamp, Value::Int64(1)],
                columns: vec![events.find_column("Payload").unwrap().id()],
                values: vec![Value::String("hello".into())],
            }),
            WriteOp::Delete {
                table: audit.id(),
                key: vec![Value::Int64(1)],
            },
        ],
    );
    assert!(!tracker.is_empty());

    let err = tracker.check_read(events, &[]).unwrap_err();
    assert!(matches!(err, CatalogError::PendingCommitTimestamp(_)));
    assert!(tracker.check_read(audit, &[]).is_ok());

    let index = schema.find_index("EventsById").unwrap();
    let data = index.index_data_table().unwrap();
    let err = tracker.check_read(data, &[]).unwrap_err();
    assert!(err.to_string().contains("EventsById"));
}

#[test]
fn test_pending_value_blocks_column_reads() {
    init();
    let schema = events_schema();
    let events = schema.find_table("Events").unwrap();
    let updated = events.find_column("Updated").unwrap();
    let payload = events.find_column("Payload").unwrap();
    let commit = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let tracker = CommitTimestampTracker::new();
    tracker.track(
        &schema,
        &[WriteOp::Update(RowWrite {
            table: events.id(),
            key: vec![Value::Timestamp(commit), Value::Int64(1)],
            columns: vec![payload.id(), updated.id()],
            values: vec![Value::String("v".into()), Value::PendingCommitTimestamp],
        })],
    );

    assert!(tracker.check_read(events, &[payload]).is_ok());
    let err = tracker.check_read(events, &[payload, updated]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PendingCommitTimestamp);
    assert!(err.to_string().contains("Events.Updated"));

    // Another transaction's tracker never saw the write
    let other = CommitTimestampTracker::new();
    assert!(other.check_read(events, &[payload, updated]).is_ok());

    // The same checks through query catalog access
    let access = QueryCatalogAccess::new(&schema).with_tracker(&tracker);
    assert!(access.check_table_scan("events", &["Id", "Payload"]).is_ok());
    assert!(access.check_table_scan("Events", &["Updated"]).is_err());
    assert!(matches!(
        access.check_table_scan("Events", &["Missing"]),
        Err(CatalogError::NotFound(_))
    ));
}

#[test]
fn test_query_dependencies() {
    init();
    let schema = events_schema();
    let mut access = QueryCatalogAccess::new(&schema);
    access.force_index("eventsbyid").expect("index hint");
    access.force_index("_BASE_TABLE").expect("base table hint");
    access.sequence_dependency("EventSeq").expect("sequence");
    assert!(access.force_index("Nope").is_err());

    let deps = access.finish();
    assert_eq!(deps.indexes.iter().map(String::as_str).collect::<Vec<_>>(), vec!["EventsById"]);
    assert_eq!(deps.sequences.iter().map(String::as_str).collect::<Vec<_>>(), vec!["EventSeq"]);
}

#[test]
fn test_concurrent_tracking_merges_every_write() {
    init();
    let schema = events_schema();
    let tracker = Arc::new(CommitTimestampTracker::new());
    let logs = schema.find_table("Logs").unwrap();
    let events = schema.find_table("Events").unwrap();

    let writes = vec![
        // Pending value in Logs.Created
        WriteOp::Insert(RowWrite {
            table: logs.id(),
            key: vec![Value::Int64(1)],
            columns: vec![logs.find_column("Created").unwrap().id()],
            values: vec![Value::PendingCommitTimestamp],
        }),
        // Pending value in Logs.Modified
        WriteOp::Update(RowWrite {
            table: logs.id(),
            key: vec![Value::Int64(2)],
            columns: vec![logs.find_column("Modified").unwrap().id()],
            values: vec![Value::PendingCommitTimestamp],
        }),
        // Pending key in Events
        WriteOp::Insert(RowWrite {
            table: events.id(),
            key: vec![Value::PendingCommitTimestamp, Value::Int64(3)],
            columns: vec![],
            values: vec![],
        }),
        // Nothing pending
        WriteOp::Delete {
            table: schema.find_table("Audit").unwrap().id(),
            key: vec![Value::Int64(4)],
        },
    ];

    let barrier = Arc::new(Barrier::new(writes.len()));
    let workers: Vec<_> = writes
        .into_iter()
        .map(|write| {
            let schema = Arc::clone(&schema);
            let tracker = Arc::clone(&tracker);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    tracker.track(&schema, std::slice::from_ref(&write));
                    let table = schema.find_table("Audit").unwrap();
                    assert!(tracker.check_read(table, &[]).is_ok());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    let created = logs.find_column("Created").unwrap();
    let modified = logs.find_column("Modified").unwrap();
    let id = logs.find_column("Id").unwrap();
    assert!(tracker.check_read(logs, &[id]).is_ok());
    assert!(tracker.check_read(logs, &[created]).is_err());
    assert!(tracker.check_read(logs, &[modified]).is_err());
    assert!(tracker.check_read(events, &[]).is_err());
    let data = schema.find_index("EventsById").unwrap().index_data_table().unwrap();
    assert!(tracker.check_read(data, &[]).is_err());
    assert!(tracker.check_read(schema.find_table("Audit").unwrap(), &[]).is_ok());
}

#[test]
fn test_writes_without_sentinels_leave_tracker_empty() {
    init();
    let schema = events_schema();
    let logs = schema.find_table("Logs").unwrap();
    let tracker = CommitTimestampTracker::new();
    tracker.track(
        &schema,
        &[WriteOp::Update(RowWrite {
            table: logs.id(),
            key: vec![Value::Int64(1)],
            columns: vec![logs.find_column("Created").unwrap().id()],
            values: vec![Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())],
        })],
    );
    assert!(tracker.is_empty());
}

#[test]
fn test_delete_key_set_rejects_commit_timestamps() {
    init();
    let schema = events_schema();
    let events = schema.find_table("Events").unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let past = Value::Timestamp(now - Duration::hours(1));

    assert!(validate_commit_timestamp_key_set_for_delete(
        events,
        &[vec![past.clone(), Value::Int64(1)], vec![Value::Timestamp(now), Value::Int64(2)]],
        now,
    )
    .is_ok());

    let err = validate_commit_timestamp_key_set_for_delete(
        events,
        &[vec![past.clone(), Value::Int64(1)], vec![literal(), Value::Int64(2)]],
        now,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Policy);
    assert!(err.to_string().contains("column Ts"));

    let err = validate_commit_timestamp_key_set_for_delete(
        events,
        &[vec![Value::PendingCommitTimestamp, Value::Int64(1)]],
        now,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Policy);

    let future = Value::Timestamp(now + Duration::seconds(30));
    let err = validate_commit_timestamp_key_set_for_delete(events, &[vec![future, Value::Int64(1)]], now)
        .unwrap_err();
    assert!(err.to_string().contains("in the future"));

    // Keys of tables without commit timestamp key columns are never checked
    let audit = schema.find_table("Audit").unwrap();
    assert!(validate_commit_timestamp_key_set_for_delete(audit, &[vec![literal()]], now).is_ok());
}
