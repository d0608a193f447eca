//! Export download routes.
//!
//! Every route answers with the rendered file as an attachment.

use std::collections::BTreeMap;
use std::num::NonZeroU64;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use brokerage_core::export::filename::sanitize_component;
use brokerage_core::export::{
    DataSource, ExportArtifact, ExportFormat, ExportOptions, FilterValue, OrderBy, SortDirection,
};
use brokerage_shared::AppError;

use crate::AppState;
use crate::error::ApiResult;

/// Creates the export routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exports/{record_type}", get(export_type))
        .route("/exports/{record_type}/filtered", post(export_filtered))
        .route("/exports/{record_type}/date-range", get(export_date_range))
}

/// Export options accepted in the query string.
///
/// List values (`columns`, `headings`, `relations`) are comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportQuery {
    /// `xlsx`, `csv` or `tsv`.
    pub format: Option<String>,
    /// Named preset applied between these options and the defaults.
    pub preset: Option<String>,
    /// Columns to export.
    pub columns: Option<String>,
    /// Header labels.
    pub headings: Option<String>,
    /// Relations to eager-load.
    pub relations: Option<String>,
    /// Column to order by.
    pub order_by: Option<String>,
    /// `asc` or `desc`; defaults to `asc` when `order_by` is given.
    pub direction: Option<String>,
    /// Maximum rows.
    pub limit: Option<u64>,
    /// Emit a header row.
    pub with_headings: Option<bool>,
    /// Filename base.
    pub filename: Option<String>,
    /// Filename suffix.
    pub suffix: Option<String>,
}

impl ExportQuery {
    /// Converts the query into export options.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unknown format or direction.
    pub fn into_options(self) -> Result<ExportOptions, AppError> {
        let mut options = ExportOptions::new();

        if let Some(format) = self.format {
            options.format = Some(
                format
                    .parse::<ExportFormat>()
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            );
        }
        options.columns = self.columns.as_deref().map(split_list);
        options.headings = self.headings.as_deref().map(split_list);
        if let Some(relations) = self.relations.as_deref().map(split_list) {
            options.with_relations = Some(!relations.is_empty());
            options.relations = Some(relations);
        }
        if let Some(column) = self.order_by {
            let direction = match self.direction {
                Some(direction) => direction
                    .parse::<SortDirection>()
                    .map_err(|e| AppError::Validation(e.to_string()))?,
                None => SortDirection::Asc,
            };
            options.order_by = Some(OrderBy { column, direction });
        }
        options.limit = self.limit.and_then(NonZeroU64::new);
        options.with_headings = self.with_headings;

        Ok(sanitized(options, self.filename, self.suffix))
    }
}

/// Sets filename parts after stripping anything unsafe; empty results are dropped.
fn sanitized(
    mut options: ExportOptions,
    base: Option<String>,
    suffix: Option<String>,
) -> ExportOptions {
    let clean = |raw: Option<String>| {
        raw.map(|raw| sanitize_component(&raw))
            .filter(|part| !part.is_empty())
    };
    options.filename_base = clean(base).or(options.filename_base);
    options.filename_suffix = clean(suffix).or(options.filename_suffix);
    options
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Body of a filtered export.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilteredExportRequest {
    /// Column criteria: lists filter by membership, scalars by substring.
    pub filters: BTreeMap<String, FilterValue>,
    /// Export options.
    pub options: ExportOptions,
}

/// Date bounds of a date-range export.
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    /// Date column; defaults to `created_at`.
    #[serde(default = "default_date_field")]
    pub field: String,
    /// First day, inclusive.
    pub start: NaiveDate,
    /// Last day, inclusive.
    pub end: NaiveDate,
}

fn default_date_field() -> String {
    "created_at".to_string()
}

/// GET `/exports/{record_type}` - Export a record type.
async fn export_type(
    State(state): State<AppState>,
    Path(record_type): Path<String>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let preset = query.preset.clone();
    let options = query.into_options()?;
    let source = DataSource::Type(record_type);

    let artifact = match preset {
        Some(preset) => state.exports.export_preset(source, &preset, options).await?,
        None => state.exports.export(source, options).await?,
    };
    Ok(attachment(artifact))
}

/// POST `/exports/{record_type}/filtered` - Export rows matching criteria.
async fn export_filtered(
    State(state): State<AppState>,
    Path(record_type): Path<String>,
    Json(request): Json<FilteredExportRequest>,
) -> ApiResult<Response> {
    let FilteredExportRequest { filters, options } = request;
    let base = options.filename_base.clone();
    let suffix = options.filename_suffix.clone();
    let options = sanitized(
        ExportOptions {
            filename_base: None,
            filename_suffix: None,
            ..options
        },
        base,
        suffix,
    );

    let artifact = state
        .exports
        .export_filtered(&record_type, &filters, options)
        .await?;
    Ok(attachment(artifact))
}

/// GET `/exports/{record_type}/date-range` - Export rows within a day range.
///
/// A `preset` is merged under the query options.
async fn export_date_range(
    State(state): State<AppState>,
    Path(record_type): Path<String>,
    Query(range): Query<DateRangeQuery>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let preset = query.preset.clone();
    let mut options = query.into_options()?;
    if let Some(preset) = preset {
        options = options.merge(state.exports.presets().get(&preset)?.clone());
    }

    let artifact = state
        .exports
        .export_date_range(&record_type, &range.field, range.start, range.end, options)
        .await?;
    Ok(attachment(artifact))
}

fn attachment(artifact: ExportArtifact) -> Response {
    info!(
        filename = %artifact.filename,
        rows = artifact.row_count,
        "Serving export"
    );
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    (
        [
            (CONTENT_TYPE, artifact.content_type.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response()
}
