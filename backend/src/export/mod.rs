//! Export of a filtered view as an `.xlsx` workbook.
//!
//! One sheet, original headers in row 0, then the kept rows in dataset order.
//! Cells keep their type: numbers stay numbers and dates are written as
//! Excel dates, so the file can be loaded again with [`crate::parser`].

use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};
use std::borrow::Cow;

use crate::api::logs::log_warning;
use crate::error::{ExportError, ExportResult};
use crate::models::CellValue;
use crate::transform::filter::FilteredView;

/// Suggested download name.
pub const EXPORT_FILE_NAME: &str = "BBDD_filtrada.xlsx";

/// Name of the single worksheet.
pub const EXPORT_SHEET_NAME: &str = "Filtrado";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const MAX_COLUMNS: usize = 16_384;
// Excel allows 1,048,576 rows; one is taken by the header
const MAX_DATA_ROWS: usize = 1_048_575;
/// Longest text Excel stores in one cell, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Encode the view's rows as an `.xlsx` workbook in memory.
pub fn write_xlsx(view: &FilteredView<'_>) -> ExportResult<Vec<u8>> {
    let headers = view.dataset().headers();
    if headers.len() > MAX_COLUMNS {
        return Err(ExportError::TooManyColumns(headers.len()));
    }
    if view.len() > MAX_DATA_ROWS {
        return Err(ExportError::TooManyRows(view.len()));
    }

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, header) in headers.iter().enumerate() {
        let header = fit_cell_text(header, 0, col);
        sheet.write_string(0, col as u16, header.as_ref())?;
    }

    for (i, record) in view.records().enumerate() {
        let row = (i + 1) as u32;
        for (col, cell) in record.cells().iter().enumerate() {
            write_cell(sheet, row, col as u16, cell, &date_format)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    date_format: &Format,
) -> ExportResult<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            let text = fit_cell_text(s, row, col as usize);
            sheet.write_string(row, col, text.as_ref())?;
        }
        CellValue::Number(n) if n.is_finite() => {
            sheet.write_number(row, col, *n)?;
        }
        CellValue::Number(_) => {}
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        CellValue::Date(d) => match excel_date(*d) {
            Some(date) => {
                sheet.write_datetime_with_format(row, col, &date, date_format)?;
            }
            // Outside the range Excel can represent
            None => {
                sheet.write_string(row, col, d.format("%Y-%m-%d").to_string())?;
            }
        },
    }
    Ok(())
}

/// Cut text to the cell limit, warning about the cell that lost content.
fn fit_cell_text(text: &str, row: u32, col: usize) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        None => Cow::Borrowed(text),
        Some((end, _)) => {
            log_warning(format!(
                "Export: text in row {}, column {} truncated to {} characters",
                row + 1,
                col + 1,
                MAX_CELL_CHARS
            ));
            Cow::Borrowed(&text[..end])
        }
    }
}

fn excel_date(date: chrono::NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(date.year()).ok().filter(|y| (1900..=9999).contains(y))?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).ok()
}
