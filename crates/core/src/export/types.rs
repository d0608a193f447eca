//! Export domain types.

use std::collections::BTreeMap;
use std::fmt;
use std::num::FpCategory;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::error::ExportError;

/// Identifier field appended to derived columns.
pub const ID_FIELD: &str = "id";
/// Creation timestamp field appended to derived columns.
pub const CREATED_AT_FIELD: &str = "created_at";
/// Update timestamp field appended to derived columns.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Tabular output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Office Open XML workbook with a single sheet.
    #[default]
    Xlsx,
    /// Comma separated values.
    Csv,
    /// Tab separated values.
    Tsv,
}

impl ExportFormat {
    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }

    /// MIME type for download responses.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv",
            Self::Tsv => "text/tab-separated-values",
        }
    }

    /// Field delimiter for the delimited text formats.
    #[must_use]
    pub const fn delimiter(self) -> Option<u8> {
        match self {
            Self::Xlsx => None,
            Self::Csv => Some(b','),
            Self::Tsv => Some(b'\t'),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            other => Err(ExportError::InvalidConfig(format!(
                "unsupported export format '{other}'"
            ))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl FromStr for SortDirection {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ExportError::InvalidConfig(format!(
                "unsupported sort direction '{other}'"
            ))),
        }
    }
}

/// Column ordering applied to queried sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column to sort by.
    pub column: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl OrderBy {
    /// Ascending order on `column`.
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending order on `column`.
    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl Default for OrderBy {
    /// Newest records first.
    fn default() -> Self {
        Self::desc(CREATED_AT_FIELD)
    }
}

/// A single scalar value in a record or an output row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
}

static NULL_CELL: Cell = Cell::Null;

impl Cell {
    /// Converts a JSON scalar. Arrays and objects become their JSON text.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::Text(n.to_string())),
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => Self::Text(value.to_string()),
        }
    }

    /// True for [`Cell::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the cell is written as an empty cell.
    ///
    /// Under strict comparison only `Null` is blank. Otherwise zero, `false`
    /// and the empty string count as blank too.
    #[must_use]
    pub fn is_blank(&self, strict: bool) -> bool {
        match self {
            Self::Null => true,
            _ if strict => false,
            Self::Bool(b) => !b,
            Self::Int(n) => *n == 0,
            Self::Float(f) => f.classify() == FpCategory::Zero,
            Self::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One record: field names mapped to scalar values.
///
/// Eager-loaded relations are stored under dotted keys such as `branch.name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Cell>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets a field.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Cell>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Field value, `Null` when the field is absent.
    #[must_use]
    pub fn get(&self, field: &str) -> &Cell {
        self.fields.get(field).unwrap_or(&NULL_CELL)
    }

    /// Whether the field is present (even if null).
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterates fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copies every field of `other` into this record under `prefix.`.
    pub fn attach(&mut self, prefix: &str, other: &Self) {
        for (field, value) in &other.fields {
            self.fields.insert(format!("{prefix}.{field}"), value.clone());
        }
    }

    /// Builds a record from a JSON object, flattening nested objects with dots.
    ///
    /// Non-object values produce an empty record.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Self {
        let mut record = Self::new();
        if let JsonValue::Object(map) = value {
            for (key, value) in map {
                record.flatten_into(key, value);
            }
        }
        record
    }

    fn flatten_into(&mut self, key: &str, value: &JsonValue) {
        match value {
            JsonValue::Object(map) => {
                for (child, value) in map {
                    self.flatten_into(&format!("{key}.{child}"), value);
                }
            }
            other => {
                self.fields.insert(key.to_string(), Cell::from_json(other));
            }
        }
    }
}

/// Shape of a record type as far as exporting is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Type identifier (table name).
    pub record_type: String,
    /// Fields callers may write, in declaration order.
    pub writable_fields: Vec<String>,
}

impl RecordSchema {
    /// Creates a schema.
    #[must_use]
    pub fn new<I, S>(record_type: impl Into<String>, writable_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            record_type: record_type.into(),
            writable_fields: writable_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Columns exported when none are configured: the writable fields, then
    /// `id`, `created_at` and `updated_at`.
    #[must_use]
    pub fn default_columns(&self) -> Vec<String> {
        let mut columns = self.writable_fields.clone();
        for field in [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD] {
            if !columns.iter().any(|c| c == field) {
                columns.push(field.to_string());
            }
        }
        columns
    }
}

/// Materialized, ordered records of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    /// Type of every record in the set.
    pub schema: RecordSchema,
    /// Records in output order.
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Creates a record set.
    #[must_use]
    pub fn new(schema: RecordSchema, records: Vec<Record>) -> Self {
        Self { schema, records }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Finished export, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Download filename, `{base}_{suffix}.{extension}`.
    pub filename: String,
    /// Output format.
    pub format: ExportFormat,
    /// MIME type derived from the format.
    pub content_type: &'static str,
    /// Rendered file contents.
    pub bytes: Vec<u8>,
    /// Data rows written, header excluded.
    pub row_count: usize,
}
