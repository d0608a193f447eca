//! Download filename construction.

use chrono::{DateTime, NaiveDate, Utc};

use super::options::ExportConfig;
use super::types::ExportFormat;

/// `{filename_base}_{filename_suffix}.{extension}`. No sanitization here.
#[must_use]
pub fn build(config: &ExportConfig) -> String {
    compose(&config.filename_base, &config.filename_suffix, config.format)
}

/// Joins the filename parts.
#[must_use]
pub fn compose(base: &str, suffix: &str, format: ExportFormat) -> String {
    format!("{base}_{suffix}.{}", format.extension())
}

/// Default suffix: `YYYY_MM_DD_HH_MM_SS` in UTC.
#[must_use]
pub fn timestamp_suffix(now: DateTime<Utc>) -> String {
    now.format("%Y_%m_%d_%H_%M_%S").to_string()
}

/// Suffix for date-range exports: `YYYY_MM_DD_to_YYYY_MM_DD`.
#[must_use]
pub fn date_range_suffix(start: NaiveDate, end: NaiveDate) -> String {
    format!("{}_to_{}", start.format("%Y_%m_%d"), end.format("%Y_%m_%d"))
}

/// Strips everything but ASCII letters, digits, `_` and `-` from a
/// user-supplied filename part.
#[must_use]
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
