//! Pipeline tests over an in-memory record source.

use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;

use super::*;

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Filter(Filter),
    EagerLoad(Vec<String>),
    OrderBy(OrderBy),
    Limit(u64),
    Select(Vec<String>),
}

type OpLog = Arc<Mutex<Vec<Op>>>;

struct MemoryQuery {
    schema: RecordSchema,
    records: Vec<Record>,
    limit: Option<usize>,
    log: OpLog,
}

impl MemoryQuery {
    fn record(&self, op: Op) {
        self.log.lock().unwrap().push(op);
    }

    fn check_column(&self, column: &str) -> ExportResult<()> {
        if self.schema.default_columns().iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(ExportError::unknown_column(&self.schema.record_type, column))
        }
    }
}

#[async_trait]
impl RecordQuery for MemoryQuery {
    fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    fn filter(&mut self, filter: Filter) -> ExportResult<()> {
        self.check_column(filter.column())?;
        self.record(Op::Filter(filter));
        Ok(())
    }

    fn eager_load(&mut self, relations: &[String]) -> ExportResult<()> {
        if let Some(unknown) = relations.iter().find(|r| r.as_str() != "branch") {
            return Err(ExportError::unknown_relation(&self.schema.record_type, unknown));
        }
        self.record(Op::EagerLoad(relations.to_vec()));
        Ok(())
    }

    fn order_by(&mut self, order: &OrderBy) -> ExportResult<()> {
        self.check_column(&order.column)?;
        self.record(Op::OrderBy(order.clone()));
        Ok(())
    }

    fn limit(&mut self, limit: NonZeroU64) {
        self.limit = usize::try_from(limit.get()).ok();
        self.record(Op::Limit(limit.get()));
    }

    fn select(&mut self, columns: &[String]) -> ExportResult<()> {
        self.record(Op::Select(columns.to_vec()));
        Ok(())
    }

    async fn fetch(self: Box<Self>) -> ExportResult<Vec<Record>> {
        let mut records = self.records;
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }
        Ok(records)
    }
}

struct MemoryRegistry {
    records: Vec<Record>,
    log: OpLog,
}

impl RecordSourceRegistry for MemoryRegistry {
    fn query(&self, record_type: &str) -> Option<Box<dyn RecordQuery>> {
        (record_type == "customers").then(|| memory_query(self.records.clone(), &self.log))
    }

    fn record_types(&self) -> Vec<String> {
        vec!["customers".to_string()]
    }
}

fn schema() -> RecordSchema {
    RecordSchema::new("customers", ["name", "status"])
}

fn customers() -> Vec<Record> {
    vec![
        Record::new()
            .with("id", 1)
            .with("name", "Jane")
            .with("status", "active")
            .with("branch.name", "North"),
        Record::new()
            .with("id", 2)
            .with("name", "Bob")
            .with("status", "inactive")
            .with("branch.name", "South"),
    ]
}

fn memory_query(records: Vec<Record>, log: &OpLog) -> Box<dyn RecordQuery> {
    Box::new(MemoryQuery {
        schema: schema(),
        records,
        limit: None,
        log: Arc::clone(log),
    })
}

fn pipeline_over(records: Vec<Record>) -> (ExportPipeline, OpLog) {
    let log = OpLog::default();
    let registry = MemoryRegistry {
        records,
        log: Arc::clone(&log),
    };
    (ExportPipeline::new(Arc::new(registry)), log)
}

fn ops(log: &OpLog) -> Vec<Op> {
    log.lock().unwrap().clone()
}

fn csv_text(artifact: &ExportArtifact) -> String {
    String::from_utf8(artifact.bytes.clone()).unwrap()
}

fn csv() -> ExportOptions {
    ExportOptions::new().format(ExportFormat::Csv)
}

#[tokio::test]
async fn test_filename_from_base_and_suffix() {
    let (pipeline, _) = pipeline_over(vec![]);
    let artifact = pipeline
        .export(
            DataSource::Records(RecordSet::new(schema(), customers())),
            ExportOptions::new()
                .filename_base("customers")
                .filename_suffix("2024_01_01"),
        )
        .await
        .unwrap();

    assert_eq!(artifact.filename, "customers_2024_01_01.xlsx");
    assert_eq!(artifact.format, ExportFormat::Xlsx);
    assert_eq!(artifact.content_type, ExportFormat::Xlsx.content_type());
    assert_eq!(artifact.row_count, 2);
}

#[tokio::test]
async fn test_type_source_applies_order_limit_and_pushdown() {
    let (pipeline, log) = pipeline_over(customers());
    let artifact = pipeline
        .export(
            DataSource::Type("customers".into()),
            csv()
                .columns(["name"])
                .relations(["branch"])
                .limit(NonZeroU64::new(1).unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(
        ops(&log),
        vec![
            Op::EagerLoad(vec!["branch".into()]),
            Op::OrderBy(OrderBy::desc("created_at")),
            Op::Limit(1),
            Op::Select(vec!["name".into()]),
        ]
    );
    assert_eq!(csv_text(&artifact), "Name\nJane\n");
}

#[tokio::test]
async fn test_query_source_has_no_pushdown() {
    let (pipeline, _) = pipeline_over(vec![]);
    let log = OpLog::default();

    pipeline
        .export(
            DataSource::Query(memory_query(customers(), &log)),
            csv().columns(["name"]).relations(["branch"]).with_relations(false),
        )
        .await
        .unwrap();

    assert_eq!(ops(&log), vec![Op::OrderBy(OrderBy::desc("created_at"))]);
}

#[tokio::test]
async fn test_records_source_ignores_order_limit_and_relations() {
    let (pipeline, log) = pipeline_over(vec![]);
    let artifact = pipeline
        .export(
            DataSource::Records(RecordSet::new(schema(), customers())),
            csv()
                .columns(["name"])
                .order_by(OrderBy::asc("name"))
                .limit(NonZeroU64::new(1).unwrap())
                .relations(["branch"]),
        )
        .await
        .unwrap();

    assert!(ops(&log).is_empty());
    assert_eq!(csv_text(&artifact), "Name\nJane\nBob\n");
}

#[tokio::test]
async fn test_empty_sources_produce_empty_exports() {
    let (pipeline, _) = pipeline_over(vec![]);
    let options = || csv().columns(["name"]).with_headings(false);

    let from_records = pipeline
        .export(
            DataSource::Records(RecordSet::new(schema(), vec![])),
            options(),
        )
        .await
        .unwrap();
    let from_type = pipeline
        .export(DataSource::Type("customers".into()), options())
        .await
        .unwrap();
    let from_query = pipeline
        .export(
            DataSource::Query(memory_query(vec![], &OpLog::default())),
            options(),
        )
        .await
        .unwrap();

    for artifact in [from_records, from_type, from_query] {
        assert_eq!(artifact.row_count, 0);
        assert!(artifact.bytes.is_empty());
    }
}

#[tokio::test]
async fn test_unknown_type_is_invalid_source_kind() {
    let (pipeline, _) = pipeline_over(vec![]);
    let err = pipeline
        .export(DataSource::Type("invoices".into()), ExportOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidSourceKind(name) if name == "invoices"));

    let err = pipeline
        .export_filtered("invoices", &BTreeMap::new(), ExportOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidSourceKind(_)));
}

#[tokio::test]
async fn test_unknown_relation_and_order_column_are_rejected() {
    let (pipeline, _) = pipeline_over(customers());

    let err = pipeline
        .export(
            DataSource::Type("customers".into()),
            ExportOptions::new().relations(["owner"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::UnknownRelation { relation, .. } if relation == "owner"));

    let err = pipeline
        .export(
            DataSource::Type("customers".into()),
            ExportOptions::new().order_by(OrderBy::asc("rank")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::UnknownColumn { column, .. } if column == "rank"));
}

#[tokio::test]
async fn test_export_filtered_builds_pattern_and_membership_filters() {
    let (pipeline, log) = pipeline_over(customers());
    let filters: BTreeMap<String, FilterValue> = serde_json::from_value(serde_json::json!({
        "status": "active",
        "id": [1, 2, 3],
        "name": ""
    }))
    .unwrap();

    pipeline
        .export_filtered("customers", &filters, csv())
        .await
        .unwrap();

    let ops = ops(&log);
    assert!(ops.contains(&Op::Filter(Filter::Like {
        column: "status".into(),
        pattern: "%active%".into(),
    })));
    assert!(ops.contains(&Op::Filter(Filter::In {
        column: "id".into(),
        values: vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)],
    })));
    assert_eq!(
        ops.iter().filter(|op| matches!(op, Op::Filter(_))).count(),
        2
    );
}

#[tokio::test]
async fn test_export_filtered_rejects_unknown_filter_column() {
    let (pipeline, _) = pipeline_over(customers());
    let filters = BTreeMap::from([(
        "nickname".to_string(),
        FilterValue::Scalar(Cell::Text("x".into())),
    )]);
    let err = pipeline
        .export_filtered("customers", &filters, csv())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::UnknownColumn { .. }));
}

#[tokio::test]
async fn test_export_date_range_sets_suffix_and_filter() {
    let (pipeline, log) = pipeline_over(customers());
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

    let artifact = pipeline
        .export_date_range(
            "customers",
            "created_at",
            start,
            end,
            ExportOptions::new().filename_base("customers"),
        )
        .await
        .unwrap();

    assert_eq!(artifact.filename, "customers_2024_01_01_to_2024_01_31.xlsx");
    assert_eq!(
        ops(&log)[0],
        Op::Filter(Filter::DateRange {
            column: "created_at".into(),
            start,
            end,
        })
    );
}

#[tokio::test]
async fn test_export_date_range_keeps_explicit_suffix() {
    let (pipeline, _) = pipeline_over(customers());
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let artifact = pipeline
        .export_date_range(
            "customers",
            "created_at",
            day,
            day,
            csv().filename_suffix("january"),
        )
        .await
        .unwrap();

    assert_eq!(artifact.filename, "export_january.csv");
}

#[tokio::test]
async fn test_export_date_range_rejects_reversed_bounds() {
    let (pipeline, log) = pipeline_over(customers());
    let err = pipeline
        .export_date_range(
            "customers",
            "created_at",
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ExportOptions::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::InvalidDateRange { .. }));
    assert!(ops(&log).is_empty());
}

#[tokio::test]
async fn test_export_preset_uses_mapping_and_headings() {
    let (pipeline, log) = pipeline_over(customers());
    let artifact = pipeline
        .export_preset(
            DataSource::Type("customers".into()),
            "customers",
            csv().relations(["branch"]).filename_suffix("fixed"),
        )
        .await
        .unwrap();

    assert_eq!(artifact.filename, "customers_fixed.csv");
    assert_eq!(
        csv_text(&artifact),
        "ID,Name,Email,Phone,Status,Branch,Broker,Created At\n\
         1,Jane,,,active,North,,\n\
         2,Bob,,,inactive,South,,\n"
    );
    assert!(ops(&log).contains(&Op::EagerLoad(vec!["branch".into()])));

    let err = pipeline
        .export_preset(
            DataSource::Type("customers".into()),
            "invoices",
            ExportOptions::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::UnknownPreset(_)));
}

#[tokio::test]
async fn test_mapping_skips_column_pushdown() {
    let (pipeline, log) = pipeline_over(customers());
    let artifact = pipeline
        .export_preset(
            DataSource::Type("customers".into()),
            "customers",
            csv()
                .columns(["name"])
                .relations(["branch"])
                .filename_suffix("fixed"),
        )
        .await
        .unwrap();

    assert!(!ops(&log).iter().any(|op| matches!(op, Op::Select(_))));
    assert_eq!(
        csv_text(&artifact),
        "ID,Name,Email,Phone,Status,Branch,Broker,Created At\n\
         1,Jane,,,active,North,,\n\
         2,Bob,,,inactive,South,,\n"
    );
}

#[tokio::test]
async fn test_disabling_preset_mapping_uses_columns() {
    let (pipeline, log) = pipeline_over(customers());
    let options = ExportOptions {
        with_mapping: Some(false),
        ..csv()
            .columns(["name", "status"])
            .headings(["Name", "Status"])
            .relations(["branch"])
    };
    let artifact = pipeline
        .export_preset(DataSource::Type("customers".into()), "customers", options)
        .await
        .unwrap();

    assert!(ops(&log).contains(&Op::Select(vec!["name".into(), "status".into()])));
    assert_eq!(
        csv_text(&artifact),
        "Name,Status\nJane,active\nBob,inactive\n"
    );
}

#[tokio::test]
async fn test_export_with_mapping() {
    let (pipeline, _) = pipeline_over(vec![]);
    let artifact = pipeline
        .export_with_mapping(
            DataSource::Records(RecordSet::new(schema(), customers())),
            vec!["Customer".into(), "Branch".into()],
            RowMapper::new(|r| vec![r.get("name").clone(), r.get("branch.name").clone()]),
            csv().headings(["ignored"]),
        )
        .await
        .unwrap();

    assert_eq!(csv_text(&artifact), "Customer,Branch\nJane,North\nBob,South\n");
}

#[tokio::test]
async fn test_repeated_exports_are_identical() {
    let (pipeline, _) = pipeline_over(vec![]);
    let options = || csv().columns(["id", "name"]).filename_suffix("static");
    let records = RecordSet::new(schema(), customers());

    let first = pipeline
        .export(DataSource::Records(records.clone()), options())
        .await
        .unwrap();
    let second = pipeline
        .export(DataSource::Records(records), options())
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_pipeline_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ExportPipeline>();
}

fn arb_format() -> impl Strategy<Value = Option<ExportFormat>> {
    prop::option::of(prop_oneof![
        Just(ExportFormat::Xlsx),
        Just(ExportFormat::Csv),
        Just(ExportFormat::Tsv),
    ])
}

proptest! {
    /// Every resolved field equals the explicit value when given, else the default.
    #[test]
    fn test_resolver_output_is_complete(
        format in arb_format(),
        with_headings in any::<Option<bool>>(),
        strict in any::<Option<bool>>(),
        limit in prop::option::of(1u64..10_000),
        base in prop::option::of("[a-z]{1,12}"),
        suffix in prop::option::of("[a-z0-9_]{1,12}"),
        relations in prop::option::of(prop::collection::vec("[a-z]{1,8}", 0..3)),
    ) {
        let options = ExportOptions {
            format,
            with_headings,
            strict_null_comparison: strict,
            limit: limit.and_then(NonZeroU64::new),
            filename_base: base.clone(),
            filename_suffix: suffix.clone(),
            relations: relations.clone(),
            ..ExportOptions::default()
        };
        let resolver = ConfigResolver::default();
        let config = resolver.resolve(options, None, Utc::now()).unwrap();
        let defaults = resolver.defaults();

        prop_assert_eq!(config.format, format.unwrap_or(defaults.format));
        prop_assert_eq!(config.with_headings, with_headings.unwrap_or(defaults.with_headings));
        prop_assert_eq!(
            config.strict_null_comparison,
            strict.unwrap_or(defaults.strict_null_comparison)
        );
        prop_assert_eq!(config.limit.map(NonZeroU64::get), limit);
        prop_assert_eq!(&config.filename_base, base.as_ref().unwrap_or(&defaults.filename_base));
        prop_assert!(!config.filename_suffix.is_empty());
        if let Some(suffix) = &suffix {
            prop_assert_eq!(&config.filename_suffix, suffix);
        }
        let relations = relations.unwrap_or_default();
        prop_assert_eq!(config.with_relations, !relations.is_empty());
        prop_assert_eq!(config.relations, relations);
        prop_assert!(!config.with_mapping);
    }

    /// Without a mapping every row is exactly as wide as the header row.
    #[test]
    fn test_row_width_matches_header_width(
        columns in prop::collection::vec("[a-z_]{1,10}", 0..6),
        rows in prop::collection::vec(
            prop::collection::btree_map("[a-z_]{1,10}", any::<i64>(), 0..6),
            0..8,
        ),
    ) {
        let records = rows
            .into_iter()
            .map(|fields| {
                fields
                    .into_iter()
                    .fold(Record::new(), |record, (k, v)| record.with(k, v))
            })
            .collect();
        let set = RecordSet::new(RecordSchema::new("things", ["name"]), records);
        let config = ConfigResolver::default()
            .resolve(ExportOptions::new().columns(columns), None, Utc::now())
            .unwrap();

        let table = projection::project(&set, &config).unwrap();
        let width = table.headers.as_ref().map(Vec::len).unwrap();
        for row in &table.rows {
            prop_assert_eq!(row.len(), width);
        }
    }
}
