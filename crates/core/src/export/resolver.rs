//! Export configuration resolution.

use chrono::{DateTime, Utc};

use super::error::{ExportError, ExportResult};
use super::filename;
use super::options::{ExportConfig, ExportDefaults, ExportOptions};

/// Merges per-call options, an optional preset and system defaults.
///
/// Precedence per field, highest first: explicit options, preset, defaults.
/// Each field resolves independently, so a preset may supply headings while
/// the caller overrides only the format.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    defaults: ExportDefaults,
}

impl ConfigResolver {
    /// Creates a resolver over the given defaults.
    #[must_use]
    pub const fn new(defaults: ExportDefaults) -> Self {
        Self { defaults }
    }

    /// The lowest precedence level.
    #[must_use]
    pub const fn defaults(&self) -> &ExportDefaults {
        &self.defaults
    }

    /// Resolves a complete configuration.
    ///
    /// `now` feeds the default filename suffix. A resolved `with_mapping` of
    /// `false` drops any mapping, including one inherited from the preset.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `with_mapping` is requested without a
    /// mapping.
    pub fn resolve(
        &self,
        options: ExportOptions,
        preset: Option<&ExportOptions>,
        now: DateTime<Utc>,
    ) -> ExportResult<ExportConfig> {
        let merged = match preset {
            Some(preset) => options.merge(preset.clone()),
            None => options,
        };

        if merged.with_mapping == Some(true) && merged.mapping.is_none() {
            return Err(ExportError::InvalidConfig(
                "with_mapping is set but no mapping was supplied".to_string(),
            ));
        }

        let mapping = match merged.with_mapping {
            Some(false) => None,
            _ => merged.mapping,
        };
        let relations = merged.relations.unwrap_or_default();
        let defaults = &self.defaults;

        Ok(ExportConfig {
            format: merged.format.unwrap_or(defaults.format),
            with_headings: merged.with_headings.unwrap_or(defaults.with_headings),
            with_mapping: mapping.is_some(),
            with_relations: merged.with_relations.unwrap_or(!relations.is_empty()),
            strict_null_comparison: merged
                .strict_null_comparison
                .unwrap_or(defaults.strict_null_comparison),
            auto_size_columns: merged
                .auto_size_columns
                .unwrap_or(defaults.auto_size_columns),
            order_by: merged
                .order_by
                .unwrap_or_else(|| defaults.order_by.clone()),
            limit: merged.limit,
            relations,
            columns: merged.columns.unwrap_or_default(),
            headings: merged.headings.unwrap_or_default(),
            mapping,
            filename_base: merged
                .filename_base
                .unwrap_or_else(|| defaults.filename_base.clone()),
            filename_suffix: merged
                .filename_suffix
                .unwrap_or_else(|| filename::timestamp_suffix(now)),
        })
    }
}
