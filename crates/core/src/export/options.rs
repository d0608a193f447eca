//! Per-call export options and the resolved configuration.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use serde::Deserialize;

use brokerage_shared::ExportSettings;

use super::error::ExportError;
use super::types::{Cell, ExportFormat, OrderBy, Record};

type MapFn = dyn Fn(&Record) -> Vec<Cell> + Send + Sync;

/// Caller-supplied function turning one record into one output row.
#[derive(Clone)]
pub struct RowMapper(Arc<MapFn>);

impl RowMapper {
    /// Wraps a mapping function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Vec<Cell> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Produces the row for `record`.
    #[must_use]
    pub fn apply(&self, record: &Record) -> Vec<Cell> {
        (self.0)(record)
    }
}

impl fmt::Debug for RowMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RowMapper(..)")
    }
}

/// Partial export options. `None` means "not set here".
///
/// Deserializes from JSON or a query string; unknown keys are ignored.
/// The mapping can only be set from code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output format.
    pub format: Option<ExportFormat>,
    /// Emit a header row.
    pub with_headings: Option<bool>,
    /// Use the row mapper. Requires `mapping`.
    pub with_mapping: Option<bool>,
    /// Eager-load `relations` on queried sources.
    pub with_relations: Option<bool>,
    /// Treat only real nulls as empty cells.
    pub strict_null_comparison: Option<bool>,
    /// Size spreadsheet columns to their content.
    pub auto_size_columns: Option<bool>,
    /// Ordering for queried sources.
    pub order_by: Option<OrderBy>,
    /// Maximum number of records fetched.
    pub limit: Option<NonZeroU64>,
    /// Belongs-to relations to eager-load.
    pub relations: Option<Vec<String>>,
    /// Columns to export, in order.
    pub columns: Option<Vec<String>>,
    /// Header labels.
    pub headings: Option<Vec<String>>,
    /// Row mapper.
    #[serde(skip)]
    pub mapping: Option<RowMapper>,
    /// Filename base.
    pub filename_base: Option<String>,
    /// Filename suffix.
    pub filename_suffix: Option<String>,
}

impl ExportOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the format.
    #[must_use]
    pub fn format(mut self, format: ExportFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets whether a header row is written.
    #[must_use]
    pub fn with_headings(mut self, enabled: bool) -> Self {
        self.with_headings = Some(enabled);
        self
    }

    /// Sets whether relations are eager-loaded.
    #[must_use]
    pub fn with_relations(mut self, enabled: bool) -> Self {
        self.with_relations = Some(enabled);
        self
    }

    /// Sets the null comparison mode.
    #[must_use]
    pub fn strict_null_comparison(mut self, strict: bool) -> Self {
        self.strict_null_comparison = Some(strict);
        self
    }

    /// Sets column auto-sizing.
    #[must_use]
    pub fn auto_size_columns(mut self, enabled: bool) -> Self {
        self.auto_size_columns = Some(enabled);
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Sets the record limit.
    #[must_use]
    pub fn limit(mut self, limit: NonZeroU64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the relations to eager-load.
    #[must_use]
    pub fn relations<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations = Some(relations.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the exported columns.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the header labels.
    #[must_use]
    pub fn headings<I, S>(mut self, headings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headings = Some(headings.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the row mapper and enables it.
    #[must_use]
    pub fn mapping(mut self, mapper: RowMapper) -> Self {
        self.mapping = Some(mapper);
        self.with_mapping = Some(true);
        self
    }

    /// Sets the filename base.
    #[must_use]
    pub fn filename_base(mut self, base: impl Into<String>) -> Self {
        self.filename_base = Some(base.into());
        self
    }

    /// Sets the filename suffix.
    #[must_use]
    pub fn filename_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.filename_suffix = Some(suffix.into());
        self
    }

    /// Field-wise merge: values set on `self` win, gaps are filled from `lower`.
    #[must_use]
    pub fn merge(self, lower: Self) -> Self {
        Self {
            format: self.format.or(lower.format),
            with_headings: self.with_headings.or(lower.with_headings),
            with_mapping: self.with_mapping.or(lower.with_mapping),
            with_relations: self.with_relations.or(lower.with_relations),
            strict_null_comparison: self
                .strict_null_comparison
                .or(lower.strict_null_comparison),
            auto_size_columns: self.auto_size_columns.or(lower.auto_size_columns),
            order_by: self.order_by.or(lower.order_by),
            limit: self.limit.or(lower.limit),
            relations: self.relations.or(lower.relations),
            columns: self.columns.or(lower.columns),
            headings: self.headings.or(lower.headings),
            mapping: self.mapping.or(lower.mapping),
            filename_base: self.filename_base.or(lower.filename_base),
            filename_suffix: self.filename_suffix.or(lower.filename_suffix),
        }
    }
}

/// Fully resolved export configuration. Every field is populated.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output format.
    pub format: ExportFormat,
    /// Emit a header row.
    pub with_headings: bool,
    /// True exactly when `mapping` is set.
    pub with_mapping: bool,
    /// Eager-load `relations` on queried sources.
    pub with_relations: bool,
    /// Treat only real nulls as empty cells.
    pub strict_null_comparison: bool,
    /// Size spreadsheet columns to their content.
    pub auto_size_columns: bool,
    /// Ordering for queried sources.
    pub order_by: OrderBy,
    /// Maximum number of records fetched.
    pub limit: Option<NonZeroU64>,
    /// Relations to eager-load.
    pub relations: Vec<String>,
    /// Columns to export. Empty means derive from the record schema.
    pub columns: Vec<String>,
    /// Header labels. Empty means derive from the columns.
    pub headings: Vec<String>,
    /// Row mapper, takes precedence over `columns`.
    pub mapping: Option<RowMapper>,
    /// Filename base.
    pub filename_base: String,
    /// Filename suffix.
    pub filename_suffix: String,
}

/// System-wide defaults, the lowest precedence level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDefaults {
    /// Output format.
    pub format: ExportFormat,
    /// Emit a header row.
    pub with_headings: bool,
    /// Treat only real nulls as empty cells.
    pub strict_null_comparison: bool,
    /// Size spreadsheet columns to their content.
    pub auto_size_columns: bool,
    /// Ordering for queried sources.
    pub order_by: OrderBy,
    /// Filename base.
    pub filename_base: String,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            format: ExportFormat::Xlsx,
            with_headings: true,
            strict_null_comparison: true,
            auto_size_columns: true,
            order_by: OrderBy::default(),
            filename_base: "export".to_string(),
        }
    }
}

impl TryFrom<&ExportSettings> for ExportDefaults {
    type Error = ExportError;

    fn try_from(settings: &ExportSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            format: settings.format.parse()?,
            with_headings: settings.with_headings,
            strict_null_comparison: settings.strict_null_comparison,
            auto_size_columns: settings.auto_size_columns,
            order_by: OrderBy::default(),
            filename_base: settings.filename_base.clone(),
        })
    }
}
