//! Workbook reader built on `calamine`.
//!
//! Only the first sheet is read. Its first row holds the headers.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use super::{parse_date_text, SourceFormat};
use crate::error::{LoadError, LoadResult};
use crate::models::{CellValue, Dataset, SourceInfo};

/// Read the first sheet of a workbook held in memory.
pub fn read_workbook(bytes: &[u8]) -> LoadResult<Dataset> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(LoadError::NoHeaders)?;
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| header_name(i, cell))
        .collect();

    let records: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(convert_value).collect::<Vec<_>>())
        .filter(|cells: &Vec<CellValue>| cells.iter().any(|c| !c.is_empty()))
        .collect();

    Ok(Dataset::new(headers, records).with_source(SourceInfo {
        format: SourceFormat::Workbook.as_str().to_string(),
        sheet_name: Some(sheet_name),
        encoding: None,
        delimiter: None,
    }))
}

fn header_name(index: usize, cell: &Data) -> String {
    convert_value(cell)
        .to_text()
        .unwrap_or_else(|| format!("Unnamed: {index}"))
}

fn convert_value(value: &Data) -> CellValue {
    match value {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Float(v) => CellValue::Number(*v),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::DateTime(v) if v.is_duration() => CellValue::Number(v.as_f64()),
        // Applies the workbook's 1900/1904 date system
        Data::DateTime(v) => v
            .as_datetime()
            .map(|dt| CellValue::Date(dt.date()))
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(s) => parse_date_text(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
