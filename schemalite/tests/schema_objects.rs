// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sequences, functions, locality groups and change streams

use schemalite::schema::catalog::StorageKind;
use schemalite::schema::operations::{
    AddColumn, ColumnDefinition, CreateChangeStream, CreateFunction, CreateIndex, CreateLocalityGroup,
    CreateSequence, CreateTable, DropChangeStream, DropColumn, DropFunction, DropLocalityGroup,
    DropSequence, DropTable, KeyPart, TrackedTable,
};
use schemalite::{CatalogConfig, CatalogError, CatalogManager, ColumnType, QueryCatalogAccess};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog() -> CatalogManager {
    let catalog = CatalogManager::new(CatalogConfig::default());
    let users = CreateTable::new("Users")
        .column(ColumnDefinition::new("UserId", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("Name", ColumnType::String))
        .column(ColumnDefinition::new("Age", ColumnType::Int64))
        .primary_key(vec![KeyPart::asc("UserId")]);
    catalog.apply(&users).expect("create Users");
    catalog
}

#[test]
fn test_sequence_in_use_cannot_be_dropped() {
    init();
    let catalog = catalog();
    catalog
        .apply(&CreateSequence::new("OrderSeq").start_with_counter(100).skip_range(1, 10))
        .expect("create sequence");
    let schema = catalog
        .apply(&AddColumn::new(
            "Users",
            ColumnDefinition::new("Ticket", ColumnType::Int64)
                .default_value("GET_NEXT_SEQUENCE_VALUE(SEQUENCE OrderSeq)")
                .uses_sequence("OrderSeq"),
        ))
        .expect("add column using sequence");
    let ticket = schema.find_table("Users").unwrap().find_column("Ticket").unwrap();
    assert!(ticket.has_default_value());
    assert_eq!(ticket.sequences_used()[0].name(), "OrderSeq");

    let err = catalog.apply(&DropSequence::new("OrderSeq")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));
    assert!(err.to_string().contains("column Users.Ticket"));

    let schema = catalog
        .apply_batch(&[&DropColumn::new("Users", "Ticket"), &DropSequence::new("orderseq")])
        .expect("drop column then sequence");
    assert!(schema.find_sequence("OrderSeq", false).is_none());
}

#[test]
fn test_sequence_options_are_checked() {
    init();
    let catalog = catalog();
    let err = catalog
        .apply(&CreateSequence::new("Backwards").skip_range(10, 1))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Structural(_)));
    let err = catalog
        .apply(&CreateSequence::new("Zero").start_with_counter(0))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Structural(_)));

    catalog.apply(&CreateSequence::new("Seq")).unwrap();
    let err = catalog.apply(&CreateSequence::new("SEQ")).unwrap_err();
    assert!(matches!(err, CatalogError::Duplicate(_)));
    let err = catalog.apply(&DropSequence::new("Missing")).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
}

#[test]
fn test_identity_column_owns_internal_sequence() {
    init();
    let catalog = catalog();
    let schema = catalog
        .apply(&AddColumn::new(
            "Users",
            ColumnDefinition::new("Serial", ColumnType::Int64).identity(),
        ))
        .expect("add identity column");
    let serial = schema.find_table("Users").unwrap().find_column("Serial").unwrap();
    assert!(serial.is_identity_column());
    let sequence = serial.sequences_used()[0];
    assert!(sequence.is_internal());
    let name = sequence.name().to_string();

    // Internal sequences are invisible to users
    assert!(schema.find_sequence(&name, true).is_none());
    assert!(schema.find_sequence(&name, false).is_some());
    assert!(matches!(
        catalog.apply(&DropSequence::new(&name)).unwrap_err(),
        CatalogError::NotFound(_)
    ));
    let mut access = QueryCatalogAccess::new(&schema);
    assert!(matches!(access.sequence_dependency(&name), Err(CatalogError::NotFound(_))));

    let schema = catalog.apply(&DropColumn::new("Users", "Serial")).unwrap();
    assert!(schema.find_sequence(&name, false).is_none());
}

#[test]
fn test_functions() {
    init();
    let catalog = catalog();
    catalog
        .apply(&CreateFunction::new("Double", "(x INT64) -> INT64", "x * 2"))
        .expect("create function");

    let err = catalog
        .apply(&CreateFunction::new("double", "(x INT64) -> INT64", "x + x"))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Duplicate(_)));

    let schema = catalog
        .apply(&CreateFunction::new("Double", "(x INT64) -> INT64", "x + x").or_replace())
        .expect("replace function");
    assert_eq!(schema.find_function("Double").unwrap().definition(), "x + x");

    catalog
        .apply(&CreateFunction::new("Quad", "(x INT64) -> INT64", "Double(Double(x))").uses_function("Double"))
        .expect("create dependent function");
    let err = catalog.apply(&DropFunction::new("Double")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));
    assert!(err.to_string().contains("function Quad"));

    catalog
        .apply(&AddColumn::new(
            "Users",
            ColumnDefinition::new("DoubleAge", ColumnType::Int64)
                .generated_as("Quad(Age)", true, &["Age"])
                .uses_function("Quad"),
        ))
        .expect("column using function");
    let err = catalog.apply(&DropFunction::new("Quad")).unwrap_err();
    assert!(err.to_string().contains("column Users.DoubleAge"));

    let schema = catalog
        .apply_batch(&[
            &DropColumn::new("Users", "DoubleAge"),
            &DropFunction::new("Quad"),
            &DropFunction::new("Double"),
        ])
        .expect("drop users first");
    assert_eq!(schema.functions().count(), 0);

    let err = catalog
        .apply(&CreateFunction::new("Empty", "() -> INT64", "  "))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Structural(_)));
}

#[test]
fn test_replaced_function_drops_old_dependencies() {
    init();
    let catalog = catalog();
    catalog
        .apply_batch(&[
            &CreateSequence::new("Counter"),
            &CreateFunction::new("Base", "() -> INT64", "1"),
            &CreateFunction::new("Next", "() -> INT64", "GET_NEXT_SEQUENCE_VALUE(SEQUENCE Counter) + Base()")
                .uses_sequence("Counter")
                .uses_function("Base"),
        ])
        .expect("create function with dependencies");
    assert!(catalog.apply(&DropSequence::new("Counter")).is_err());
    assert!(catalog.apply(&DropFunction::new("Base")).is_err());

    let schema = catalog
        .apply(&CreateFunction::new("Next", "() -> INT64", "42").or_replace())
        .expect("replace without dependencies");
    let next = schema.find_function("Next").unwrap();
    assert!(next.sequences_used().is_empty());
    assert!(next.udf_dependencies().is_empty());

    let schema = catalog
        .apply_batch(&[&DropSequence::new("Counter"), &DropFunction::new("Base")])
        .expect("old dependencies are released");
    assert!(schema.find_sequence("Counter", false).is_none());
    assert!(schema.find_function("Base").is_none());
}

#[test]
fn test_locality_groups() {
    init();
    let catalog = catalog();
    catalog
        .apply(&CreateLocalityGroup::new("hot").storage(StorageKind::Ssd).spill_after("10d"))
        .expect("create locality group");
    let err = catalog
        .apply(&CreateLocalityGroup::new("cold").storage(StorageKind::Hdd).spill_after("1d"))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Structural(_)));

    let events = CreateTable::new("Events")
        .column(ColumnDefinition::new("Id", ColumnType::Int64).not_null())
        .primary_key(vec![KeyPart::asc("Id")])
        .locality_group("hot");
    let schema = catalog.apply(&events).unwrap();
    assert_eq!(
        schema.find_table("Events").unwrap().locality_group().map(|g| g.name().to_string()),
        Some("hot".to_string())
    );

    let err = catalog.apply(&DropLocalityGroup::new("hot")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));
    assert!(err.to_string().contains("table Events"));

    let schema = catalog
        .apply_batch(&[&DropTable::new("Events"), &DropLocalityGroup::new("hot")])
        .expect("drop table then group");
    assert!(schema.find_locality_group("hot").is_none());

    catalog.apply(&CreateLocalityGroup::new("default")).unwrap();
    let err = catalog.apply(&DropLocalityGroup::new("default")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));
}

#[test]
fn test_change_stream_for_listed_columns() {
    init();
    let catalog = catalog();
    let schema = catalog
        .apply(
            &CreateChangeStream::for_tables("UserNames", vec![TrackedTable::columns("Users", &["Name"])])
                .retention_period("7d"),
        )
        .expect("create change stream");

    let stream = schema.find_change_stream("UserNames").expect("stream");
    assert_eq!(stream.retention_period(), Some("7d"));
    assert_eq!(stream.tracked_tables().len(), 1);
    assert_eq!(stream.tracked_columns()[0].name(), "Name");
    let data = stream.change_stream_data_table().expect("data table");
    assert!(!data.is_public());
    assert_eq!(data.owning_object_name(), "UserNames");

    let users = schema.find_table("Users").unwrap();
    assert!(users.find_change_stream("usernames").is_some());
    assert_eq!(users.find_column("Name").unwrap().change_streams_explicitly_tracking().len(), 1);
    assert!(users.find_column("Age").unwrap().change_streams().is_empty());

    // Explicitly tracked tables cannot be dropped
    let err = catalog.apply(&DropTable::new("Users")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));

    let schema = catalog.apply(&DropChangeStream::new("UserNames")).unwrap();
    assert!(schema.find_change_stream("UserNames").is_none());
    let users = schema.find_table("Users").unwrap();
    assert!(users.change_streams().is_empty());
    assert!(users.find_column("Name").unwrap().change_streams().is_empty());
    assert_eq!(schema.tables().count(), 1);
}

#[test]
fn test_explicitly_tracked_column_cannot_be_dropped() {
    init();
    let catalog = catalog();
    catalog
        .apply_batch(&[
            &CreateChangeStream::for_tables("UserNames", vec![TrackedTable::columns("Users", &["Name"])]),
            &CreateChangeStream::for_tables("UserRows", vec![TrackedTable::all_columns("Users")]),
        ])
        .expect("create change streams");

    let err = catalog.apply(&DropColumn::new("Users", "Name")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));
    assert!(err.to_string().contains("tracked by change streams: UserNames"));
    let schema = catalog.snapshot();
    assert!(schema.find_table("Users").unwrap().find_column("Name").is_some());

    // Columns tracked only through their table can go
    let schema = catalog.apply(&DropColumn::new("Users", "Age")).expect("drop implicitly tracked column");
    assert!(schema.find_table("Users").unwrap().find_column("Age").is_none());

    let schema = catalog
        .apply_batch(&[&DropChangeStream::new("UserNames"), &DropColumn::new("Users", "Name")])
        .expect("drop the stream first");
    assert!(schema.find_table("Users").unwrap().find_column("Name").is_none());
}

#[test]
fn test_change_stream_for_all_and_key_columns() {
    init();
    let catalog = catalog();
    let err = catalog
        .apply(&CreateChangeStream::for_tables(
            "Keys",
            vec![TrackedTable::columns("Users", &["UserId"])],
        ))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Structural(_)));

    let schema = catalog.apply(&CreateChangeStream::for_all("Everything")).unwrap();
    let users = schema.find_table("Users").unwrap();
    assert_eq!(users.change_streams().len(), 1);
    assert!(users
        .columns()
        .iter()
        .all(|c| c.change_streams().len() == 1 && c.change_streams_explicitly_tracking().is_empty()));
    assert!(schema.find_change_stream("Everything").unwrap().tracks_all());

    // Implicit tracking does not block a drop
    catalog
        .apply(&CreateIndex::new("UsersByAge", "Users", vec![KeyPart::asc("Age")]))
        .unwrap();
    catalog
        .apply_batch(&[&schemalite::schema::operations::DropIndex::new("UsersByAge"), &DropTable::new("Users")])
        .expect("drop implicitly tracked table");
}
