//! Integration tests for entity-backed export sources.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, EntityTrait};

use brokerage_core::export::{
    Cell, DataSource, ExportError, ExportFormat, ExportOptions, ExportPipeline, FilterValue,
    OrderBy, RecordSourceRegistry, RowMapper,
};
use brokerage_db::entities::customers;
use brokerage_db::export_source::{EntityRegistry, Exportable, records_of};

fn pipeline(db: &DatabaseConnection) -> ExportPipeline {
    ExportPipeline::new(Arc::new(EntityRegistry::with_defaults(db.clone())))
}

fn csv_options() -> ExportOptions {
    ExportOptions::new().format(ExportFormat::Csv)
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).expect("CSV output is UTF-8")
}

/// Broker with one branch and three customers across March 2026.
async fn seed(db: &DatabaseConnection) {
    let broker = common::insert_broker(db, "ACME", "Acme Brokers").await;
    let branch = common::insert_branch(db, broker.id, "ACME-N", "North").await;
    common::insert_customer(
        db,
        broker.id,
        Some(branch.id),
        "Alice",
        "active",
        "2026-03-01T09:30:00+00:00",
    )
    .await;
    common::insert_customer(
        db,
        broker.id,
        None,
        "Bob",
        "inactive",
        "2026-03-05T23:59:00+00:00",
    )
    .await;
    common::insert_customer(
        db,
        broker.id,
        Some(branch.id),
        "Carol",
        "active",
        "2026-03-06T00:00:00+00:00",
    )
    .await;
}

#[tokio::test]
async fn test_registry_lists_every_entity() {
    let db = common::setup().await;
    let registry = EntityRegistry::with_defaults(db);

    let types = registry.record_types();

    assert_eq!(types.len(), 9);
    assert!(types.contains(&"customers".to_string()));
    assert!(types.contains(&"premium_types".to_string()));
    assert!(registry.query("policies").is_none());
}

#[tokio::test]
async fn test_export_type_selects_ordered_columns() {
    let db = common::setup().await;
    seed(&db).await;

    let artifact = pipeline(&db)
        .export(
            DataSource::Type("customers".into()),
            csv_options()
                .columns(["name", "status"])
                .order_by(OrderBy::asc("name")),
        )
        .await
        .expect("Export should succeed");

    assert_eq!(artifact.row_count, 3);
    assert_eq!(
        text(&artifact.bytes),
        "Name,Status\nAlice,active\nBob,inactive\nCarol,active\n"
    );
    assert!(artifact.filename.starts_with("export_"));
    assert!(artifact.filename.ends_with(".csv"));
}

#[tokio::test]
async fn test_export_joins_relations() {
    let db = common::setup().await;
    seed(&db).await;

    let artifact = pipeline(&db)
        .export(
            DataSource::Type("customers".into()),
            csv_options()
                .relations(["branch", "broker"])
                .columns(["name", "branch.name", "broker.code"])
                .order_by(OrderBy::asc("name")),
        )
        .await
        .expect("Export should succeed");

    assert_eq!(
        text(&artifact.bytes),
        "Name,Branch Name,Broker Code\nAlice,North,ACME\nBob,,ACME\nCarol,North,ACME\n"
    );
}

#[tokio::test]
async fn test_export_limit_and_default_order() {
    let db = common::setup().await;
    seed(&db).await;

    let artifact = pipeline(&db)
        .export(
            DataSource::Type("customers".into()),
            csv_options()
                .columns(["name"])
                .limit(std::num::NonZeroU64::new(2).expect("non-zero")),
        )
        .await
        .expect("Export should succeed");

    // Newest first by default.
    assert_eq!(text(&artifact.bytes), "Name\nCarol\nBob\n");
}

#[tokio::test]
async fn test_export_unknown_relation_fails() {
    let db = common::setup().await;

    let err = pipeline(&db)
        .export(
            DataSource::Type("customers".into()),
            csv_options().relations(["policies"]),
        )
        .await
        .expect_err("Unknown relation");

    assert!(matches!(err, ExportError::UnknownRelation { .. }));
}

#[tokio::test]
async fn test_export_unknown_column_fails() {
    let db = common::setup().await;

    let err = pipeline(&db)
        .export(
            DataSource::Type("customers".into()),
            csv_options().columns(["name", "premium"]),
        )
        .await
        .expect_err("Unknown column");

    assert!(matches!(err, ExportError::UnknownColumn { .. }));
}

#[tokio::test]
async fn test_export_relation_column_requires_loaded_relation() {
    let db = common::setup().await;
    seed(&db).await;

    let err = pipeline(&db)
        .export(
            DataSource::Type("customers".into()),
            csv_options().columns(["name", "branch.name"]),
        )
        .await
        .expect_err("Relation was not loaded");

    assert!(
        matches!(err, ExportError::RelationNotLoaded { ref relation, .. } if relation == "branch")
    );
}

#[tokio::test]
async fn test_export_filtered_by_list_and_substring() {
    let db = common::setup().await;
    seed(&db).await;

    let mut filters = BTreeMap::new();
    filters.insert(
        "status".to_string(),
        FilterValue::List(vec![Cell::from("active")]),
    );
    filters.insert("name".to_string(), FilterValue::Scalar(Cell::from("aro")));
    filters.insert("email".to_string(), FilterValue::Scalar(Cell::Null));

    let artifact = pipeline(&db)
        .export_filtered("customers", &filters, csv_options().columns(["name"]))
        .await
        .expect("Export should succeed");

    assert_eq!(artifact.row_count, 1);
    assert!(text(&artifact.bytes).ends_with("Carol\n"));
}

#[tokio::test]
async fn test_export_date_range_is_inclusive_by_day() {
    let db = common::setup().await;
    seed(&db).await;

    let start = NaiveDate::from_ymd_opt(2026, 3, 1).expect("date");
    let end = NaiveDate::from_ymd_opt(2026, 3, 5).expect("date");
    let artifact = pipeline(&db)
        .export_date_range(
            "customers",
            "created_at",
            start,
            end,
            csv_options().columns(["name"]).order_by(OrderBy::asc("name")),
        )
        .await
        .expect("Export should succeed");

    assert_eq!(text(&artifact.bytes), "Name\nAlice\nBob\n");
    assert_eq!(artifact.filename, "export_2026_03_01_to_2026_03_05.csv");
}

#[tokio::test]
async fn test_export_preset_over_database() {
    let db = common::setup().await;
    seed(&db).await;

    let artifact = pipeline(&db)
        .export_preset(
            DataSource::Type("brokers".into()),
            "brokers",
            csv_options(),
        )
        .await
        .expect("Export should succeed");

    assert_eq!(artifact.row_count, 1);
    assert!(artifact.filename.starts_with("brokers_"));
    let body = text(&artifact.bytes);
    assert!(body.contains("ACME,Acme Brokers"));
}

#[tokio::test]
async fn test_export_loaded_models_as_records() {
    let db = common::setup().await;
    seed(&db).await;

    let models = customers::Entity::find()
        .all(&db)
        .await
        .expect("Failed to load customers");
    let set = records_of::<customers::Entity>(&models).expect("Models serialize");
    assert_eq!(set.schema, customers::Entity::schema());

    let artifact = pipeline(&db)
        .export_with_mapping(
            DataSource::Records(set),
            vec!["Customer".into(), "Status".into()],
            RowMapper::new(|record| {
                vec![record.get("name").clone(), record.get("status").clone()]
            }),
            csv_options(),
        )
        .await
        .expect("Export should succeed");

    // Records are exported in the order given.
    assert_eq!(
        text(&artifact.bytes),
        "Customer,Status\nAlice,active\nBob,inactive\nCarol,active\n"
    );
}

#[tokio::test]
async fn test_customers_preset_maps_joined_fields() {
    let db = common::setup().await;
    seed(&db).await;

    let artifact = pipeline(&db)
        .export_preset(
            DataSource::Type("customers".into()),
            "customers",
            csv_options(),
        )
        .await
        .expect("Export should succeed");

    let body = text(&artifact.bytes);
    let lines: Vec<_> = body.lines().collect();
    assert_eq!(lines[0], "ID,Name,Email,Phone,Status,Branch,Broker,Created At");
    assert_eq!(lines.len(), 4);
    // Newest first.
    assert!(lines[1].contains(",Carol,carol@example.com,,active,North,Acme Brokers,"));
    assert!(lines[2].contains(",Bob,bob@example.com,,inactive,,Acme Brokers,"));
}

#[tokio::test]
async fn test_customers_preset_ignores_columns_for_mapped_rows() {
    let db = common::setup().await;
    seed(&db).await;

    let artifact = pipeline(&db)
        .export_preset(
            DataSource::Type("customers".into()),
            "customers",
            csv_options().columns(["name"]),
        )
        .await
        .expect("Export should succeed");

    let body = text(&artifact.bytes);
    let lines: Vec<_> = body.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].contains(",Carol,carol@example.com,,active,North,Acme Brokers,2026-03-06"));
    assert!(!lines[1].starts_with(','));
}
