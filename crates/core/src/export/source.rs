//! Data sources and their normalization into record sets.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ExportError, ExportResult};
use super::options::ExportConfig;
use super::types::{Cell, OrderBy, Record, RecordSchema, RecordSet};

/// A restriction applied to a record query.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column value is one of `values`.
    In {
        /// Column name.
        column: String,
        /// Accepted values.
        values: Vec<Cell>,
    },
    /// Column matches a SQL `LIKE` pattern.
    Like {
        /// Column name.
        column: String,
        /// Pattern including wildcards.
        pattern: String,
    },
    /// Column timestamp falls on a day between `start` and `end`, inclusive.
    DateRange {
        /// Column name.
        column: String,
        /// First day.
        start: NaiveDate,
        /// Last day.
        end: NaiveDate,
    },
}

/// Caller-supplied filter criterion, as received from a request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Membership criterion.
    List(Vec<Cell>),
    /// Substring criterion.
    Scalar(Cell),
}

impl Filter {
    /// Turns a criterion into a filter.
    ///
    /// Lists become membership filters and scalars become `%value%` pattern
    /// filters. Empty lists, nulls and empty strings yield `None`.
    #[must_use]
    pub fn from_criterion(column: &str, value: &FilterValue) -> Option<Self> {
        match value {
            FilterValue::List(values) if values.is_empty() => None,
            FilterValue::List(values) => Some(Self::In {
                column: column.to_string(),
                values: values.clone(),
            }),
            FilterValue::Scalar(Cell::Null) => None,
            FilterValue::Scalar(Cell::Text(text)) if text.is_empty() => None,
            FilterValue::Scalar(cell) => Some(Self::Like {
                column: column.to_string(),
                pattern: format!("%{cell}%"),
            }),
        }
    }

    /// Column the filter applies to.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::In { column, .. } | Self::Like { column, .. } | Self::DateRange { column, .. } => {
                column
            }
        }
    }
}

/// A lazily evaluated, refinable query over one record type.
///
/// Refinements validate their column and relation names immediately; nothing
/// touches storage until [`RecordQuery::fetch`].
#[async_trait]
pub trait RecordQuery: Send {
    /// Schema of the queried type.
    fn schema(&self) -> &RecordSchema;

    /// Adds a filter.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if the filter column does not exist.
    fn filter(&mut self, filter: Filter) -> ExportResult<()>;

    /// Eager-loads belongs-to relations by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRelation` for an unknown name.
    fn eager_load(&mut self, relations: &[String]) -> ExportResult<()>;

    /// Orders the results.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if the column does not exist.
    fn order_by(&mut self, order: &OrderBy) -> ExportResult<()>;

    /// Caps the number of results.
    fn limit(&mut self, limit: NonZeroU64);

    /// Restricts the fetched columns. Dotted names refer to loaded relations.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` or `UnknownRelation` for unknown names, and
    /// `RelationNotLoaded` for a dotted name whose relation was not eager-loaded.
    fn select(&mut self, columns: &[String]) -> ExportResult<()>;

    /// Runs the query.
    ///
    /// # Errors
    ///
    /// Returns `Source` when storage fails.
    async fn fetch(self: Box<Self>) -> ExportResult<Vec<Record>>;
}

/// Maps type identifiers to fresh, unfiltered queries.
pub trait RecordSourceRegistry: Send + Sync {
    /// New query over `record_type`, or `None` if the type is unknown.
    fn query(&self, record_type: &str) -> Option<Box<dyn RecordQuery>>;

    /// Registered type identifiers.
    fn record_types(&self) -> Vec<String>;
}

/// The thing being exported.
pub enum DataSource {
    /// Already materialized records. Exported as given.
    Records(RecordSet),
    /// A query the caller built and possibly filtered.
    Query(Box<dyn RecordQuery>),
    /// A record type identifier, resolved through the registry.
    Type(String),
}

impl DataSource {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Records(_) => "records",
            Self::Query(_) => "query",
            Self::Type(_) => "type",
        }
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Records(set) => f
                .debug_struct("Records")
                .field("record_type", &set.schema.record_type)
                .field("len", &set.len())
                .finish(),
            Self::Query(query) => f
                .debug_struct("Query")
                .field("record_type", &query.schema().record_type)
                .finish(),
            Self::Type(name) => f.debug_tuple("Type").field(name).finish(),
        }
    }
}

impl From<RecordSet> for DataSource {
    fn from(set: RecordSet) -> Self {
        Self::Records(set)
    }
}

impl From<Box<dyn RecordQuery>> for DataSource {
    fn from(query: Box<dyn RecordQuery>) -> Self {
        Self::Query(query)
    }
}

/// Normalizes any [`DataSource`] into one ordered record set.
#[derive(Clone)]
pub struct SourceResolver {
    registry: Arc<dyn RecordSourceRegistry>,
}

impl SourceResolver {
    /// Creates a resolver backed by `registry`.
    #[must_use]
    pub fn new(registry: Arc<dyn RecordSourceRegistry>) -> Self {
        Self { registry }
    }

    /// Opens a fresh query for a type identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSourceKind` if the type is not registered.
    pub fn open(&self, record_type: &str) -> ExportResult<Box<dyn RecordQuery>> {
        self.registry
            .query(record_type)
            .ok_or_else(|| ExportError::InvalidSourceKind(record_type.to_string()))
    }

    /// Materializes the source.
    ///
    /// `Records` come back unchanged: relations, ordering and limit are not
    /// applied to them. Queries get relations (when enabled), ordering and the
    /// limit. Type identifiers additionally get column pushdown, unless a
    /// mapping builds the rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSourceKind` for an unregistered type and propagates
    /// query building and fetch errors.
    pub async fn resolve(
        &self,
        source: DataSource,
        config: &ExportConfig,
    ) -> ExportResult<RecordSet> {
        match source {
            DataSource::Records(set) => Ok(set),
            DataSource::Query(query) => Self::run(query, config, false).await,
            DataSource::Type(record_type) => {
                let query = self.open(&record_type)?;
                Self::run(query, config, true).await
            }
        }
    }

    async fn run(
        mut query: Box<dyn RecordQuery>,
        config: &ExportConfig,
        pushdown: bool,
    ) -> ExportResult<RecordSet> {
        if config.with_relations && !config.relations.is_empty() {
            query.eager_load(&config.relations)?;
        }
        query.order_by(&config.order_by)?;
        if let Some(limit) = config.limit {
            query.limit(limit);
        }
        if pushdown && config.mapping.is_none() && !config.columns.is_empty() {
            query.select(&config.columns)?;
        }

        let schema = query.schema().clone();
        let records = query.fetch().await?;
        debug!(
            record_type = %schema.record_type,
            count = records.len(),
            "Fetched export records"
        );
        Ok(RecordSet::new(schema, records))
    }
}
