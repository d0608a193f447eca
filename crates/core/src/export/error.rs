//! Export error types.

use chrono::NaiveDate;
use thiserror::Error;

use brokerage_shared::AppError;

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while producing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The data source names no known record type.
    #[error("invalid export source: '{0}' is not a known record type")]
    InvalidSourceKind(String),

    /// The options contradict each other.
    #[error("invalid export configuration: {0}")]
    InvalidConfig(String),

    /// No preset with this name is registered.
    #[error("unknown export preset: {0}")]
    UnknownPreset(String),

    /// A filter, ordering or projection referenced a missing column.
    #[error("unknown column '{column}' on {record_type}")]
    UnknownColumn {
        /// Record type being queried.
        record_type: String,
        /// Column name as given by the caller.
        column: String,
    },

    /// Eager loading referenced a missing relation.
    #[error("unknown relation '{relation}' on {record_type}")]
    UnknownRelation {
        /// Record type being queried.
        record_type: String,
        /// Relation name as given by the caller.
        relation: String,
    },

    /// A `relation.column` field names a relation that was not loaded.
    #[error("relation '{relation}' on {record_type} is not loaded; add it to relations")]
    RelationNotLoaded {
        /// Record type being queried.
        record_type: String,
        /// Relation name as given by the caller.
        relation: String,
    },

    /// Date range with its bounds reversed.
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// The record source failed while fetching.
    #[error("record source failed: {0}")]
    Source(String),

    /// The tabular renderer failed.
    #[error("rendering failed: {0}")]
    Rendering(String),
}

impl ExportError {
    /// Create an unknown column error.
    #[must_use]
    pub fn unknown_column(record_type: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            record_type: record_type.into(),
            column: column.into(),
        }
    }

    /// Create an unknown relation error.
    #[must_use]
    pub fn unknown_relation(record_type: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::UnknownRelation {
            record_type: record_type.into(),
            relation: relation.into(),
        }
    }

    /// Create a relation-not-loaded error.
    #[must_use]
    pub fn relation_not_loaded(
        record_type: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self::RelationNotLoaded {
            record_type: record_type.into(),
            relation: relation.into(),
        }
    }

    /// Create a source error from any displayable failure.
    #[must_use]
    pub fn source_failed(err: impl std::fmt::Display) -> Self {
        Self::Source(err.to_string())
    }

    /// Create a rendering error from any displayable failure.
    #[must_use]
    pub fn rendering(err: impl std::fmt::Display) -> Self {
        Self::Rendering(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::rendering(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::rendering(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::InvalidSourceKind(_) | ExportError::UnknownPreset(_) => {
                Self::NotFound(err.to_string())
            }
            ExportError::InvalidConfig(_)
            | ExportError::UnknownColumn { .. }
            | ExportError::UnknownRelation { .. }
            | ExportError::RelationNotLoaded { .. }
            | ExportError::InvalidDateRange { .. } => Self::Validation(err.to_string()),
            ExportError::Source(msg) => Self::Database(msg),
            ExportError::Rendering(msg) => Self::Rendering(msg),
        }
    }
}
