//! Record sources for the export pipeline backed by `SeaORM` entities.
//!
//! Any entity implementing [`Exportable`] can be exported by table name through
//! [`EntityRegistry`], or wrapped directly in an [`EntityQuery`].

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroU64;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use sea_orm::sea_query::{Alias, Expr, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, IdenStatic, Iterable, JoinType, Order,
    QueryFilter, QueryOrder, QuerySelect, RelationDef, Value,
};
use serde::Serialize;

use brokerage_core::export::{
    Cell, ExportError, ExportResult, Filter, OrderBy, Record, RecordQuery, RecordSchema,
    RecordSet, RecordSourceRegistry, SortDirection,
};

use crate::entities::{
    branches, brokers, customers, fuel_types, permissions, policy_types, premium_types, roles,
    users,
};

/// An entity the export pipeline can query.
pub trait Exportable: EntityTrait {
    /// Type identifier, the table name.
    const TYPE_NAME: &'static str;

    /// Columns callers may write, in declaration order.
    fn writable_columns() -> Vec<Self::Column>;

    /// Belongs-to relations available for eager loading.
    fn export_relations() -> Vec<BelongsTo> {
        Vec::new()
    }

    /// Export schema of the entity.
    fn schema() -> RecordSchema {
        RecordSchema::new(
            Self::TYPE_NAME,
            Self::writable_columns().iter().map(|c| c.as_str()),
        )
    }
}

/// A named belongs-to relation. Loaded with a left join; the parent's columns
/// land in the record as `{name}.{column}`.
#[derive(Clone, Copy)]
pub struct BelongsTo {
    name: &'static str,
    relation: fn() -> RelationDef,
    parent_columns: fn() -> Vec<String>,
}

impl BelongsTo {
    /// Relation `name` to parent entity `P`.
    #[must_use]
    pub fn new<P: EntityTrait>(name: &'static str, relation: fn() -> RelationDef) -> Self {
        Self {
            name,
            relation,
            parent_columns: column_names::<P>,
        }
    }

    /// Relation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for BelongsTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BelongsTo").field("name", &self.name).finish()
    }
}

fn column_names<E: EntityTrait>() -> Vec<String> {
    E::Column::iter().map(|c| c.as_str().to_string()).collect()
}

/// Lazily built query over one entity.
pub struct EntityQuery<E: Exportable> {
    db: DatabaseConnection,
    schema: RecordSchema,
    conditions: Vec<SimpleExpr>,
    relations: Vec<BelongsTo>,
    order: Option<(E::Column, Order)>,
    limit: Option<u64>,
    columns: Option<Vec<E::Column>>,
    _entity: PhantomData<E>,
}

impl<E: Exportable> EntityQuery<E> {
    /// Unfiltered query over all rows of `E`.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            schema: E::schema(),
            conditions: Vec::new(),
            relations: Vec::new(),
            order: None,
            limit: None,
            columns: None,
            _entity: PhantomData,
        }
    }

    fn column(name: &str) -> ExportResult<E::Column> {
        E::Column::iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| ExportError::unknown_column(E::TYPE_NAME, name))
    }

    fn relation(name: &str) -> ExportResult<BelongsTo> {
        E::export_relations()
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| ExportError::unknown_relation(E::TYPE_NAME, name))
    }
}

#[async_trait]
impl<E: Exportable> RecordQuery for EntityQuery<E> {
    fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    fn filter(&mut self, filter: Filter) -> ExportResult<()> {
        let column = Self::column(filter.column())?;
        match filter {
            Filter::In { values, .. } => {
                self.conditions
                    .push(column.is_in(values.into_iter().map(cell_value)));
            }
            Filter::Like { pattern, .. } => {
                self.conditions.push(column.like(pattern));
            }
            Filter::DateRange { start, end, .. } => {
                self.conditions.push(column.gte(day_start(start)));
                if let Some(next) = end.succ_opt() {
                    self.conditions.push(column.lt(day_start(next)));
                }
            }
        }
        Ok(())
    }

    fn eager_load(&mut self, relations: &[String]) -> ExportResult<()> {
        for name in relations {
            let relation = Self::relation(name)?;
            if !self.relations.iter().any(|r| r.name == relation.name) {
                self.relations.push(relation);
            }
        }
        Ok(())
    }

    fn order_by(&mut self, order: &OrderBy) -> ExportResult<()> {
        let column = Self::column(&order.column)?;
        let direction = match order.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        self.order = Some((column, direction));
        Ok(())
    }

    fn limit(&mut self, limit: NonZeroU64) {
        self.limit = Some(limit.get());
    }

    fn select(&mut self, columns: &[String]) -> ExportResult<()> {
        let mut own = Vec::new();
        for name in columns {
            match name.split_once('.') {
                Some((relation, column)) => {
                    let relation = Self::relation(relation)?;
                    if !(relation.parent_columns)().iter().any(|c| c == column) {
                        return Err(ExportError::unknown_column(E::TYPE_NAME, name));
                    }
                    if !self.relations.iter().any(|r| r.name == relation.name) {
                        return Err(ExportError::relation_not_loaded(
                            E::TYPE_NAME,
                            relation.name,
                        ));
                    }
                }
                None => own.push(Self::column(name)?),
            }
        }
        self.columns = Some(own);
        Ok(())
    }

    async fn fetch(self: Box<Self>) -> ExportResult<Vec<Record>> {
        let Self {
            db,
            conditions,
            relations,
            order,
            limit,
            columns,
            ..
        } = *self;

        let mut select = E::find();
        if let Some(columns) = columns {
            select = select.select_only().columns(columns);
        }
        for relation in &relations {
            select = select.join_as(
                JoinType::LeftJoin,
                (relation.relation)(),
                Alias::new(relation.name),
            );
            for column in (relation.parent_columns)() {
                select = select.expr_as(
                    Expr::col((Alias::new(relation.name), Alias::new(column.as_str()))),
                    format!("{}.{column}", relation.name),
                );
            }
        }
        for condition in conditions {
            select = select.filter(condition);
        }
        if let Some((column, direction)) = order {
            select = select.order_by(column, direction);
        }
        if let Some(limit) = limit {
            select = select.limit(limit);
        }

        let rows = select
            .into_json()
            .all(&db)
            .await
            .map_err(ExportError::source_failed)?;

        Ok(rows.iter().map(Record::from_json).collect())
    }
}

fn cell_value(cell: Cell) -> Value {
    match cell {
        Cell::Null => Value::String(None),
        Cell::Bool(b) => b.into(),
        Cell::Int(n) => n.into(),
        Cell::Float(x) => x.into(),
        Cell::Text(s) => s.into(),
    }
}

fn day_start(day: NaiveDate) -> DateTime<FixedOffset> {
    day.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset()
}

type QueryFactory = fn(DatabaseConnection) -> Box<dyn RecordQuery>;

fn open<E: Exportable>(db: DatabaseConnection) -> Box<dyn RecordQuery> {
    Box::new(EntityQuery::<E>::new(db))
}

/// Registry of exportable entities keyed by table name.
#[derive(Clone)]
pub struct EntityRegistry {
    db: DatabaseConnection,
    factories: BTreeMap<&'static str, QueryFactory>,
}

impl EntityRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            factories: BTreeMap::new(),
        }
    }

    /// Registry with every back-office entity.
    #[must_use]
    pub fn with_defaults(db: DatabaseConnection) -> Self {
        Self::new(db)
            .register::<brokers::Entity>()
            .register::<branches::Entity>()
            .register::<customers::Entity>()
            .register::<users::Entity>()
            .register::<roles::Entity>()
            .register::<permissions::Entity>()
            .register::<fuel_types::Entity>()
            .register::<policy_types::Entity>()
            .register::<premium_types::Entity>()
    }

    /// Registers `E` under its type name.
    #[must_use]
    pub fn register<E: Exportable>(mut self) -> Self {
        self.factories.insert(E::TYPE_NAME, open::<E>);
        self
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl RecordSourceRegistry for EntityRegistry {
    fn query(&self, record_type: &str) -> Option<Box<dyn RecordQuery>> {
        self.factories
            .get(record_type)
            .map(|factory| factory(self.db.clone()))
    }

    fn record_types(&self) -> Vec<String> {
        self.factories.keys().map(ToString::to_string).collect()
    }
}

/// Materializes already loaded models as a record set.
///
/// # Errors
///
/// Returns `Source` if a model fails to serialize.
pub fn records_of<E>(models: &[E::Model]) -> ExportResult<RecordSet>
where
    E: Exportable,
    E::Model: Serialize,
{
    let records = models
        .iter()
        .map(|model| {
            serde_json::to_value(model)
                .map(|value| Record::from_json(&value))
                .map_err(ExportError::source_failed)
        })
        .collect::<ExportResult<Vec<_>>>()?;
    Ok(RecordSet::new(E::schema(), records))
}
