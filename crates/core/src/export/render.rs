//! Tabular renderers.

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use super::error::{ExportError, ExportResult};
use super::projection::Table;
use super::types::{Cell, ExportFormat};

/// Presentation options passed to a renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Size spreadsheet columns to their content.
    pub auto_size_columns: bool,
}

/// Turns a projected table into file bytes.
pub trait TabularRenderer: Send + Sync {
    /// Renders `table` in `format`.
    ///
    /// # Errors
    ///
    /// Returns `Rendering` when the underlying writer fails.
    fn render(
        &self,
        format: ExportFormat,
        table: &Table,
        options: RenderOptions,
    ) -> ExportResult<Vec<u8>>;
}

/// Default renderer: one-sheet xlsx workbooks and delimited text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetRenderer;

impl TabularRenderer for SpreadsheetRenderer {
    fn render(
        &self,
        format: ExportFormat,
        table: &Table,
        options: RenderOptions,
    ) -> ExportResult<Vec<u8>> {
        match format.delimiter() {
            Some(delimiter) => render_delimited(table, delimiter),
            None => render_xlsx(table, options),
        }
    }
}

fn render_delimited(table: &Table, delimiter: u8) -> ExportResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(Vec::new());

    if let Some(headers) = &table.headers {
        writer.write_record(headers)?;
    }
    for row in &table.rows {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }

    writer.into_inner().map_err(ExportError::rendering)
}

fn render_xlsx(table: &Table, options: RenderOptions) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    let mut row_index: u32 = 0;
    if let Some(headers) = &table.headers {
        for (col, heading) in headers.iter().enumerate() {
            worksheet.write_string_with_format(row_index, column(col)?, heading, &header_format)?;
        }
        row_index += 1;
    }

    for row in &table.rows {
        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, row_index, column(col)?, cell)?;
        }
        row_index = row_index
            .checked_add(1)
            .ok_or_else(|| ExportError::rendering("row count exceeds sheet limits"))?;
    }

    if options.auto_size_columns {
        worksheet.autofit();
    }

    Ok(workbook.save_to_buffer()?)
}

fn column(index: usize) -> ExportResult<u16> {
    u16::try_from(index).map_err(|_| ExportError::rendering("column count exceeds sheet limits"))
}

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_EXACT_INT: i64 = (1 << 53) - 1;

/// Spreadsheet numbers are doubles; integers beyond that range are written
/// as text so no digit is lost.
fn exact_in_spreadsheet(n: i64) -> bool {
    (-MAX_EXACT_INT..=MAX_EXACT_INT).contains(&n)
}

#[allow(clippy::cast_precision_loss)]
fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> ExportResult<()> {
    match cell {
        Cell::Null => {}
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Cell::Int(n) if exact_in_spreadsheet(*n) => {
            worksheet.write_number(row, col, *n as f64)?;
        }
        Cell::Int(n) => {
            worksheet.write_string(row, col, n.to_string())?;
        }
        Cell::Float(x) => {
            worksheet.write_number(row, col, *x)?;
        }
        Cell::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table {
            headers: Some(vec!["Name".into(), "Active".into(), "Score".into()]),
            rows: vec![
                vec![Cell::Text("Jane, Doe".into()), Cell::Bool(true), Cell::Int(3)],
                vec![Cell::Text("Bob".into()), Cell::Null, Cell::Float(1.5)],
            ],
        }
    }

    #[test]
    fn test_csv_output() {
        let bytes = SpreadsheetRenderer
            .render(ExportFormat::Csv, &table(), RenderOptions::default())
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Name,Active,Score\n\"Jane, Doe\",TRUE,3\nBob,,1.5\n"
        );
    }

    #[test]
    fn test_tsv_output_without_headers() {
        let mut table = table();
        table.headers = None;
        let bytes = SpreadsheetRenderer
            .render(ExportFormat::Tsv, &table, RenderOptions::default())
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Jane, Doe\tTRUE\t3\nBob\t\t1.5\n"
        );
    }

    #[test]
    fn test_empty_table_renders_empty_text() {
        let bytes = SpreadsheetRenderer
            .render(ExportFormat::Csv, &Table::default(), RenderOptions::default())
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_xlsx_output_is_a_zip_container() {
        let bytes = SpreadsheetRenderer
            .render(
                ExportFormat::Xlsx,
                &table(),
                RenderOptions {
                    auto_size_columns: true,
                },
            )
            .unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_large_integers_fall_back_to_text() {
        assert!(exact_in_spreadsheet(9_007_199_254_740_991));
        assert!(exact_in_spreadsheet(-9_007_199_254_740_991));
        assert!(!exact_in_spreadsheet(9_007_199_254_740_993));
        assert!(!exact_in_spreadsheet(i64::MIN));

        let table = Table {
            headers: None,
            rows: vec![vec![Cell::Int(i64::MAX), Cell::Int(42)]],
        };
        let bytes = SpreadsheetRenderer
            .render(ExportFormat::Xlsx, &table, RenderOptions::default())
            .unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
