// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! DDL batches against a catalog manager: tables, columns, indexes and
//! constraints

use schemalite::schema::catalog::{ForeignKey, OnDeleteAction, ReferentialAction};
use schemalite::schema::operations::{
    AddCheckConstraint, AddColumn, AddForeignKey, AddIndexStoredColumn, AlterColumn, ColumnDefinition,
    CreateIndex, CreateTable, DropColumn, DropConstraint, DropIndex, DropTable, KeyPart,
};
use schemalite::{CatalogConfig, CatalogError, CatalogManager, ColumnType, SchemaStatement};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn users_table() -> CreateTable {
    CreateTable::new("Users")
        .column(ColumnDefinition::new("UserId", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("Name", ColumnType::String).max_length(64))
        .column(ColumnDefinition::new("Age", ColumnType::Int64))
        .primary_key(vec![KeyPart::asc("UserId")])
}

fn catalog_with_users() -> CatalogManager {
    let catalog = CatalogManager::new(CatalogConfig::default());
    catalog.apply(&users_table()).expect("create Users");
    catalog
}

fn key_names(columns: Vec<schemalite::View<'_, schemalite::schema::catalog::KeyColumn>>) -> Vec<String> {
    columns
        .iter()
        .filter_map(|key| key.column())
        .map(|column| column.name().to_string())
        .collect()
}

#[test]
fn test_create_table_is_published() {
    init();
    let catalog = catalog_with_users();
    let schema = catalog.snapshot();

    let users = schema.find_table("users").expect("case-insensitive lookup");
    assert_eq!(users.name(), "Users");
    assert_eq!(users.columns().len(), 3);
    assert_eq!(key_names(users.primary_key()), vec!["UserId"]);
    assert!(users.find_column("NAME").is_some());
    assert!(users.find_column_case_sensitive("NAME").is_none());
    assert_eq!(users.find_column("Name").and_then(|c| c.declared_max_length()), Some(64));
}

#[test]
fn test_published_versions_are_isolated() {
    init();
    let catalog = catalog_with_users();
    let before = catalog.snapshot();

    let after = catalog
        .apply(&AddColumn::new("Users", ColumnDefinition::new("Email", ColumnType::String)))
        .expect("add column");

    assert_ne!(before.version(), after.version());
    let old_users = before.find_table("Users").unwrap();
    let new_users = after.find_table("Users").unwrap();
    assert_eq!(old_users.columns().len(), 3);
    assert!(old_users.find_column("Email").is_none());
    assert_eq!(new_users.columns().len(), 4);
    // Ids survive cloning, handles do not
    assert_eq!(old_users.id(), new_users.id());
    assert_eq!(
        old_users.find_column("Name").unwrap().id(),
        new_users.find_column("Name").unwrap().id()
    );
    assert!(after.get(old_users.handle()).is_none());
    assert!(before.get(new_users.handle()).is_none());
}

#[test]
fn test_cloning_an_indexed_table_visits_each_node_once() {
    init();
    let catalog = catalog_with_users();
    let indexed = catalog
        .apply(&CreateIndex::new("UsersByAge", "Users", vec![KeyPart::asc("Age")]))
        .unwrap();
    let after = catalog
        .apply(&AddColumn::new("Users", ColumnDefinition::new("Email", ColumnType::String)))
        .unwrap();

    // Table -> index -> data table -> index is a cycle; only the new column is added
    assert_eq!(after.live_count(), indexed.live_count() + 1);
    let index = after.find_index("UsersByAge").unwrap();
    let data = index.index_data_table().unwrap();
    assert_eq!(data.owner_index().map(|i| i.handle()), Some(index.handle()));
    assert_eq!(index.indexed_table().map(|t| t.handle()), after.find_table("Users").map(|t| t.handle()));
}

#[test]
fn test_index_data_table_key_is_index_key_then_table_key() {
    init();
    let catalog = catalog_with_users();
    let schema = catalog
        .apply(&CreateIndex::new("UsersByAge", "Users", vec![KeyPart::desc("Age")]).storing("Name"))
        .expect("create index");

    let index = schema.find_index("UsersByAge").expect("index");
    let data = index.index_data_table().expect("data table");
    assert!(!data.is_public());
    assert_eq!(data.owning_object_name(), "UsersByAge");
    assert_eq!(key_names(data.primary_key()), vec!["Age", "UserId"]);
    assert_eq!(key_names(index.key_columns()), vec!["Age"]);
    assert!(index.key_columns()[0].is_descending());
    assert_eq!(index.stored_columns().len(), 1);
    assert_eq!(data.columns().len(), 3);

    let users = schema.find_table("Users").unwrap();
    assert_eq!(users.indexes().len(), 1);
    let derived = data.find_column("Age").unwrap();
    assert_eq!(derived.source_column().map(|c| c.id()), users.find_column("Age").map(|c| c.id()));
    // Data tables are not visible by name
    assert!(schema.find_table("UsersByAge").is_none());
}

#[test]
fn test_null_filtered_index_columns_are_not_null() {
    init();
    let catalog = catalog_with_users();
    let schema = catalog
        .apply(
            &CreateIndex::new("UsersByName", "Users", vec![KeyPart::asc("Name")])
                .null_filtered()
                .storing("Age"),
        )
        .expect("create index");
    let data = schema.find_index("UsersByName").unwrap().index_data_table().unwrap();
    assert!(!data.find_column("Name").unwrap().is_nullable());
    // Stored columns keep the source nullability
    assert!(data.find_column("Age").unwrap().is_nullable());

    let schema = catalog
        .apply(&CreateIndex::new("UsersByAge", "Users", vec![KeyPart::asc("Age")]).where_not_null("Age"))
        .expect("create filtered index");
    let data = schema.find_index("UsersByAge").unwrap().index_data_table().unwrap();
    assert!(!data.find_column("Age").unwrap().is_nullable());
}

#[test]
fn test_drop_indexed_column_is_rejected() {
    init();
    let catalog = CatalogManager::new(CatalogConfig::default());
    let t = CreateTable::new("T")
        .column(ColumnDefinition::new("a", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("b", ColumnType::String))
        .primary_key(vec![KeyPart::asc("a")]);
    catalog.apply(&t).unwrap();
    let before = catalog
        .apply(&CreateIndex::new("I", "T", vec![KeyPart::asc("b")]).unique().null_filtered())
        .unwrap();
    let table = before.find_table("T").unwrap();
    let index = table.find_index("I").expect("index on T");
    assert!(index.is_unique());
    let b = table.find_column("b").unwrap();
    assert!(index.is_null_filtered_column(&b));

    let err = catalog.apply(&DropColumn::new("T", "b")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));
    assert_eq!(
        err.to_string(),
        "Cannot drop column `b` from table `T` because it is referenced by index `I`"
    );
    // Nothing was published and the old version is untouched
    assert_eq!(catalog.snapshot().version(), before.version());
    assert!(catalog.snapshot().find_table("T").unwrap().find_column("b").is_some());
    assert!(before.find_table("T").unwrap().find_column("b").is_some());
    assert!(before.find_index("I").is_some());

    // Dropping the index first makes the column droppable
    catalog
        .apply_batch(&[&DropIndex::new("I"), &DropColumn::new("T", "b")])
        .expect("drop index then column");
    let schema = catalog.snapshot();
    assert!(schema.find_index("I").is_none());
    assert!(schema.find_table("T").unwrap().find_column("b").is_none());
}

#[test]
fn test_batch_is_atomic() {
    init();
    let catalog = catalog_with_users();
    let before = catalog.snapshot();

    let orders = CreateTable::new("Orders")
        .column(ColumnDefinition::new("OrderId", ColumnType::Int64).not_null())
        .primary_key(vec![KeyPart::asc("OrderId")]);
    let email = AddColumn::new("Users", ColumnDefinition::new("Email", ColumnType::String));
    let users_again = users_table();
    let statements: [&dyn SchemaStatement; 3] = [&orders, &email, &users_again];
    let err = catalog.apply_batch(&statements).unwrap_err();
    assert!(matches!(err, CatalogError::Duplicate(_)));

    let after = catalog.snapshot();
    assert_eq!(after.version(), before.version());
    assert!(after.find_table("Orders").is_none());
    assert!(after.find_table("Users").unwrap().find_column("Email").is_none());
}

#[test]
fn test_key_columns_cannot_change() {
    init();
    let catalog = catalog_with_users();

    let err = catalog.apply(&DropColumn::new("Users", "UserId")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));

    let err = catalog
        .apply(&AlterColumn::new(
            "Users",
            ColumnDefinition::new("UserId", ColumnType::String).not_null(),
        ))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));
}

#[test]
fn test_alter_column_type_compatibility() {
    init();
    let catalog = catalog_with_users();

    let schema = catalog
        .apply(&AlterColumn::new("Users", ColumnDefinition::new("Name", ColumnType::Bytes)))
        .expect("STRING to BYTES");
    assert_eq!(
        *schema.find_table("Users").unwrap().find_column("Name").unwrap().column_type(),
        ColumnType::Bytes
    );

    let err = catalog
        .apply(&AlterColumn::new("Users", ColumnDefinition::new("Age", ColumnType::String)))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Incompatible(_)));
}

#[test]
fn test_index_columns_follow_altered_source() {
    init();
    let catalog = catalog_with_users();
    catalog
        .apply(&CreateIndex::new("UsersByAge", "Users", vec![KeyPart::asc("Age")]).storing("Name"))
        .unwrap();
    let schema = catalog
        .apply(&AlterColumn::new("Users", ColumnDefinition::new("Name", ColumnType::String).max_length(10)))
        .unwrap();
    let data = schema.find_index("UsersByAge").unwrap().index_data_table().unwrap();
    assert_eq!(data.find_column("Name").unwrap().declared_max_length(), Some(10));
}

#[test]
fn test_add_stored_column_to_index() {
    init();
    let catalog = catalog_with_users();
    catalog
        .apply(&CreateIndex::new("UsersByAge", "Users", vec![KeyPart::asc("Age")]))
        .unwrap();
    let schema = catalog.apply(&AddIndexStoredColumn::new("UsersByAge", "Name")).unwrap();
    let index = schema.find_index("UsersByAge").unwrap();
    assert_eq!(index.stored_columns().len(), 1);
    assert_eq!(index.stored_columns()[0].name(), "Name");

    let err = catalog.apply(&AddIndexStoredColumn::new("UsersByAge", "Age")).unwrap_err();
    assert!(matches!(err, CatalogError::Structural(_)));
}

#[test]
fn test_drop_table_with_index_is_rejected() {
    init();
    let catalog = catalog_with_users();
    catalog
        .apply(&CreateIndex::new("UsersByAge", "Users", vec![KeyPart::asc("Age")]))
        .unwrap();
    let err = catalog.apply(&DropTable::new("Users")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));

    let schema = catalog
        .apply_batch(&[&DropIndex::new("UsersByAge"), &DropTable::new("Users")])
        .expect("drop index then table");
    assert!(schema.find_table("Users").is_none());
    assert_eq!(schema.live_count(), 0);
}

#[test]
fn test_interleaved_children() {
    init();
    let catalog = catalog_with_users();
    let albums = |on_delete| {
        CreateTable::new("Albums")
            .column(ColumnDefinition::new("UserId", ColumnType::Int64).not_null())
            .column(ColumnDefinition::new("AlbumId", ColumnType::Int64).not_null())
            .primary_key(vec![KeyPart::asc("UserId"), KeyPart::asc("AlbumId")])
            .interleave_in("Users", on_delete)
    };

    let schema = catalog.apply(&albums(OnDeleteAction::NoAction)).unwrap();
    let child = schema.find_table("Albums").unwrap();
    assert_eq!(child.parent().map(|p| p.name().to_string()), Some("Users".to_string()));
    assert_eq!(schema.find_table("Users").unwrap().children().len(), 1);

    let err = catalog.apply(&DropTable::new("Users")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));

    // The child key must start with the parent key
    let bad = CreateTable::new("Photos")
        .column(ColumnDefinition::new("PhotoId", ColumnType::Int64).not_null())
        .primary_key(vec![KeyPart::asc("PhotoId")])
        .interleave_in("Users", OnDeleteAction::NoAction);
    assert!(matches!(catalog.apply(&bad).unwrap_err(), CatalogError::Structural(_)));

    // Cascading children go away with their parent
    catalog.apply(&DropTable::new("Albums")).unwrap();
    catalog.apply(&albums(OnDeleteAction::Cascade)).unwrap();
    let schema = catalog.apply(&DropTable::new("Users")).unwrap();
    assert!(schema.find_table("Users").is_none());
    assert!(schema.find_table("Albums").is_none());
}

#[test]
fn test_foreign_key_owns_backing_index() {
    init();
    let catalog = catalog_with_users();
    let orders = CreateTable::new("Orders")
        .column(ColumnDefinition::new("OrderId", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("Buyer", ColumnType::Int64))
        .primary_key(vec![KeyPart::asc("OrderId")]);
    catalog.apply(&orders).unwrap();

    let schema = catalog
        .apply(
            &AddForeignKey::new("Orders", &["Buyer"], "Users", &["UserId"])
                .named("FK_OrderBuyer")
                .on_delete(ReferentialAction::NoAction),
        )
        .expect("add foreign key");
    let orders = schema.find_table("Orders").unwrap();
    let fk = orders.find_foreign_key("FK_OrderBuyer").expect("fk");
    let backing = fk.referencing_index().expect("backing index");
    assert!(backing.is_managed());
    assert!(backing.name().starts_with("IDX_Orders_Buyer_"));
    assert_eq!(
        schema
            .find_table("Users")
            .unwrap()
            .find_referencing_foreign_key("fk_orderbuyer")
            .map(|f| f.name().to_string()),
        Some("FK_OrderBuyer".to_string())
    );
    let backing_name = backing.name().to_string();

    // The managed index cannot be dropped on its own
    let err = catalog.apply(&DropIndex::new(&backing_name)).unwrap_err();
    assert!(err.to_string().starts_with("Cannot drop index"));

    // The referenced table cannot be dropped while referenced
    let err = catalog.apply(&DropTable::new("Users")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));

    // Dropping the constraint drops its index
    let schema = catalog.apply(&DropConstraint::new("Orders", "FK_OrderBuyer")).unwrap();
    assert!(schema.find_index(&backing_name).is_none());
    assert!(schema.find_table("Orders").unwrap().foreign_keys().is_empty());
    assert!(schema.find_table("Users").unwrap().referencing_foreign_keys().is_empty());
}

#[test]
fn test_dropping_referencing_table_deletes_constraint_and_index() {
    init();
    let catalog = catalog_with_users();
    let users_only = catalog.snapshot().live_count();
    let orders = CreateTable::new("Orders")
        .column(ColumnDefinition::new("OrderId", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("Buyer", ColumnType::Int64))
        .primary_key(vec![KeyPart::asc("OrderId")]);
    let fk = AddForeignKey::new("Orders", &["Buyer"], "Users", &["UserId"]).named("FK_OrderBuyer");
    let before = catalog.apply_batch(&[&orders, &fk]).expect("create orders");
    let backing = before
        .find_table("Orders")
        .and_then(|orders| orders.find_foreign_key("FK_OrderBuyer"))
        .and_then(|fk| fk.referencing_index())
        .expect("backing index");
    let data_id = backing.index_data_table().unwrap().id();
    let buyer_id = before.find_table("Orders").unwrap().find_column("Buyer").unwrap().id();

    let after = catalog.apply(&DropTable::new("Orders")).expect("drop referencing table");
    // Every node of the old version is still there, live or deleted
    assert_eq!(after.node_count(), before.live_count());
    assert_eq!(after.live_count(), users_only);
    assert_eq!(after.indexes().count(), 0);
    assert_eq!(after.live::<ForeignKey>().count(), 0);
    assert!(after.find_table("Orders").is_none());
    assert!(after.table_by_id(data_id).is_none());
    assert!(after.column_by_id(buyer_id).is_none());
    let users = after.find_table("Users").unwrap();
    assert!(users.referencing_foreign_keys().is_empty());
    assert!(users.indexes().is_empty());
}

#[test]
fn test_dropping_cascade_parent_deletes_child_indexes() {
    init();
    let catalog = catalog_with_users();
    let albums = CreateTable::new("Albums")
        .column(ColumnDefinition::new("UserId", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("AlbumId", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("Title", ColumnType::String))
        .primary_key(vec![KeyPart::asc("UserId"), KeyPart::asc("AlbumId")])
        .interleave_in("Users", OnDeleteAction::Cascade);
    let before = catalog
        .apply_batch(&[
            &albums,
            &CreateIndex::new("AlbumsByTitle", "Albums", vec![KeyPart::asc("Title")]),
        ])
        .expect("create child and index");
    let data_id = before.find_index("AlbumsByTitle").unwrap().index_data_table().unwrap().id();
    let title_id = before.find_table("Albums").unwrap().find_column("Title").unwrap().id();

    let after = catalog.apply(&DropTable::new("Users")).expect("drop cascade parent");
    assert_eq!(after.node_count(), before.live_count());
    assert_eq!(after.live_count(), 0);
    assert_eq!(after.indexes().count(), 0);
    assert_eq!(after.tables().count(), 0);
    assert!(after.find_index("AlbumsByTitle").is_none());
    assert!(after.table_by_id(data_id).is_none());
    assert!(after.column_by_id(title_id).is_none());
}

#[test]
fn test_foreign_key_types_must_match() {
    init();
    let catalog = catalog_with_users();
    let orders = CreateTable::new("Orders")
        .column(ColumnDefinition::new("OrderId", ColumnType::Int64).not_null())
        .column(ColumnDefinition::new("Buyer", ColumnType::String))
        .primary_key(vec![KeyPart::asc("OrderId")]);
    catalog.apply(&orders).unwrap();
    let err = catalog
        .apply(&AddForeignKey::new("Orders", &["Buyer"], "Users", &["UserId"]))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Structural(_)));
}

#[test]
fn test_check_constraint_blocks_column_drop() {
    init();
    let catalog = catalog_with_users();
    let schema = catalog
        .apply(&AddCheckConstraint::new("Users", "Age >= 0", &["Age"]))
        .expect("add check");
    let users = schema.find_table("Users").unwrap();
    assert_eq!(users.check_constraints().len(), 1);
    let name = users.check_constraints()[0].name().to_string();
    assert!(name.starts_with("CK_Users_"));

    let err = catalog.apply(&DropColumn::new("Users", "Age")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));

    catalog
        .apply_batch(&[&DropConstraint::new("Users", &name), &DropColumn::new("Users", "Age")])
        .expect("drop check then column");

    let err = catalog.apply(&DropConstraint::new("Users", "Nope")).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
}

#[test]
fn test_generated_column_dependencies() {
    init();
    let catalog = catalog_with_users();
    let schema = catalog
        .apply(&AddColumn::new(
            "Users",
            ColumnDefinition::new("AgeNextYear", ColumnType::Int64).generated_as("Age + 1", true, &["Age"]),
        ))
        .expect("add generated column");
    let column = schema.find_table("Users").unwrap().find_column("AgeNextYear").unwrap();
    assert!(column.is_generated());
    assert_eq!(column.dependent_columns().len(), 1);
    assert_eq!(column.dependent_columns()[0].name(), "Age");

    let err = catalog.apply(&DropColumn::new("Users", "Age")).unwrap_err();
    assert!(matches!(err, CatalogError::Policy(_)));

    let err = catalog
        .apply(&AddColumn::new(
            "Users",
            ColumnDefinition::new("Broken", ColumnType::Int64).generated_as("Missing + 1", false, &["Missing"]),
        ))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Structural(_)));
}

#[test]
fn test_invalid_definitions() {
    init();
    let catalog = CatalogManager::new(CatalogConfig::default());

    let bad_name = CreateTable::new("1Users")
        .column(ColumnDefinition::new("Id", ColumnType::Int64))
        .primary_key(vec![KeyPart::asc("Id")]);
    assert!(matches!(catalog.apply(&bad_name).unwrap_err(), CatalogError::Structural(_)));

    let commit_ts_on_string = CreateTable::new("Events")
        .column(ColumnDefinition::new("Id", ColumnType::Int64))
        .column(ColumnDefinition::new("At", ColumnType::String).allow_commit_timestamp())
        .primary_key(vec![KeyPart::asc("Id")]);
    assert!(matches!(
        catalog.apply(&commit_ts_on_string).unwrap_err(),
        CatalogError::Structural(_)
    ));

    let missing_key = CreateTable::new("Events")
        .column(ColumnDefinition::new("Id", ColumnType::Int64))
        .primary_key(vec![KeyPart::asc("Nope")]);
    assert!(matches!(catalog.apply(&missing_key).unwrap_err(), CatalogError::NotFound(_)));

    assert_eq!(catalog.snapshot().live_count(), 0);
}
