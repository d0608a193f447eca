//! Row and heading projection.

use super::error::{ExportError, ExportResult};
use super::options::ExportConfig;
use super::types::{Cell, RecordSet};

/// Rows ready for rendering, with an optional header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Header labels, `None` when no header row is written.
    pub headers: Option<Vec<String>>,
    /// Data rows.
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Number of data rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Projects records into rows and headings.
///
/// With a mapping, each row is the mapping's output and the header row is the
/// configured headings. Without one, rows extract `columns` (or the schema's
/// derived columns) in order and headings default to derived labels.
///
/// # Errors
///
/// Returns `InvalidConfig` when explicit headings and columns differ in length
/// on the column path.
pub fn project(set: &RecordSet, config: &ExportConfig) -> ExportResult<Table> {
    let strict = config.strict_null_comparison;

    if let Some(mapper) = &config.mapping {
        let headers = (config.with_headings && !config.headings.is_empty())
            .then(|| config.headings.clone());
        let rows = set
            .records
            .iter()
            .map(|record| {
                mapper
                    .apply(record)
                    .into_iter()
                    .map(|cell| normalize(cell, strict))
                    .collect()
            })
            .collect();
        return Ok(Table { headers, rows });
    }

    let columns = if config.columns.is_empty() {
        set.schema.default_columns()
    } else {
        config.columns.clone()
    };

    let headers = if !config.with_headings {
        None
    } else if config.headings.is_empty() {
        Some(columns.iter().map(|c| derive_heading(c)).collect())
    } else if config.headings.len() == columns.len() {
        Some(config.headings.clone())
    } else {
        return Err(ExportError::InvalidConfig(format!(
            "{} headings given for {} columns",
            config.headings.len(),
            columns.len()
        )));
    };

    let rows = set
        .records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| normalize(record.get(column).clone(), strict))
                .collect()
        })
        .collect();

    Ok(Table { headers, rows })
}

/// Human label for a column name.
///
/// Underscores and dots separate words, the word `id` becomes `ID`, every
/// other word is title-cased: `order_no` gives `Order No`.
#[must_use]
pub fn derive_heading(column: &str) -> String {
    column
        .split(['_', '.'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            if word.eq_ignore_ascii_case("id") {
                "ID".to_string()
            } else {
                title_case(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

fn normalize(cell: Cell, strict: bool) -> Cell {
    if cell.is_blank(strict) {
        Cell::Null
    } else {
        cell
    }
}
