//! Export orchestration.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use super::error::{ExportError, ExportResult};
use super::filename;
use super::options::{ExportDefaults, ExportOptions, RowMapper};
use super::presets::PresetCatalog;
use super::projection;
use super::render::{RenderOptions, SpreadsheetRenderer, TabularRenderer};
use super::resolver::ConfigResolver;
use super::source::{DataSource, Filter, FilterValue, RecordSourceRegistry, SourceResolver};
use super::types::ExportArtifact;

/// Resolves configuration and source, projects rows, renders and names the
/// file. Holds no per-call state and is shared behind an `Arc`.
pub struct ExportPipeline<R = SpreadsheetRenderer> {
    resolver: ConfigResolver,
    presets: PresetCatalog,
    sources: SourceResolver,
    renderer: R,
}

impl ExportPipeline<SpreadsheetRenderer> {
    /// Pipeline with the default renderer, built-in presets and defaults.
    #[must_use]
    pub fn new(registry: Arc<dyn RecordSourceRegistry>) -> Self {
        Self::with_renderer(registry, SpreadsheetRenderer)
    }
}

impl<R: TabularRenderer> ExportPipeline<R> {
    /// Pipeline with a custom renderer.
    pub fn with_renderer(registry: Arc<dyn RecordSourceRegistry>, renderer: R) -> Self {
        Self {
            resolver: ConfigResolver::default(),
            presets: PresetCatalog::builtin(),
            sources: SourceResolver::new(registry),
            renderer,
        }
    }

    /// Replaces the system defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ExportDefaults) -> Self {
        self.resolver = ConfigResolver::new(defaults);
        self
    }

    /// Replaces the preset catalog.
    #[must_use]
    pub fn with_presets(mut self, presets: PresetCatalog) -> Self {
        self.presets = presets;
        self
    }

    /// Registered presets.
    pub const fn presets(&self) -> &PresetCatalog {
        &self.presets
    }

    /// Exports `source` with per-call options over system defaults.
    pub async fn export(
        &self,
        source: DataSource,
        options: ExportOptions,
    ) -> ExportResult<ExportArtifact> {
        self.run(source, options, None).await
    }

    /// Exports `source` with a named preset between options and defaults.
    pub async fn export_preset(
        &self,
        source: DataSource,
        preset: &str,
        options: ExportOptions,
    ) -> ExportResult<ExportArtifact> {
        let preset = self.presets.get(preset)?;
        self.run(source, options, Some(preset)).await
    }

    /// Exports with explicit headings and a row mapper.
    ///
    /// `headings` and `mapper` override whatever `options` carries for them.
    pub async fn export_with_mapping(
        &self,
        source: DataSource,
        headings: Vec<String>,
        mapper: RowMapper,
        options: ExportOptions,
    ) -> ExportResult<ExportArtifact> {
        let options = ExportOptions::new()
            .headings(headings)
            .mapping(mapper)
            .merge(options);
        self.run(source, options, None).await
    }

    /// Exports a record type filtered by caller criteria.
    ///
    /// Lists filter by membership, other non-empty values by substring.
    pub async fn export_filtered(
        &self,
        record_type: &str,
        filters: &BTreeMap<String, FilterValue>,
        options: ExportOptions,
    ) -> ExportResult<ExportArtifact> {
        let mut query = self.sources.open(record_type)?;
        for (column, value) in filters {
            if let Some(filter) = Filter::from_criterion(column, value) {
                query.filter(filter)?;
            }
        }
        self.run(DataSource::Query(query), options, None).await
    }

    /// Exports a record type restricted to `field` between two days, inclusive.
    ///
    /// The filename suffix becomes `{start}_to_{end}` unless the caller set one.
    pub async fn export_date_range(
        &self,
        record_type: &str,
        field: &str,
        start: NaiveDate,
        end: NaiveDate,
        mut options: ExportOptions,
    ) -> ExportResult<ExportArtifact> {
        if start > end {
            return Err(ExportError::InvalidDateRange { start, end });
        }

        let mut query = self.sources.open(record_type)?;
        query.filter(Filter::DateRange {
            column: field.to_string(),
            start,
            end,
        })?;
        options
            .filename_suffix
            .get_or_insert_with(|| filename::date_range_suffix(start, end));

        self.run(DataSource::Query(query), options, None).await
    }

    async fn run(
        &self,
        source: DataSource,
        options: ExportOptions,
        preset: Option<&ExportOptions>,
    ) -> ExportResult<ExportArtifact> {
        let kind = source.kind();
        let config = self.resolver.resolve(options, preset, Utc::now())?;
        let set = self.sources.resolve(source, &config).await?;
        let table = projection::project(&set, &config)?;
        let bytes = self.renderer.render(
            config.format,
            &table,
            RenderOptions {
                auto_size_columns: config.auto_size_columns,
            },
        )?;
        let filename = filename::build(&config);

        info!(
            record_type = %set.schema.record_type,
            source = kind,
            format = %config.format,
            rows = table.row_count(),
            bytes = bytes.len(),
            filename = %filename,
            "Export rendered"
        );

        Ok(ExportArtifact {
            filename,
            format: config.format,
            content_type: config.format.content_type(),
            bytes,
            row_count: table.row_count(),
        })
    }
}
