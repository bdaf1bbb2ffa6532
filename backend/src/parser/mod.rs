//! Dataset loading with format detection and load-time coercion.
//!
//! Workbooks (`.xlsx`, `.xls`, `.xlsb`, `.ods`) go through [`workbook`],
//! delimited text (`.csv`, `.tsv`, `.txt`) through [`delimited`] with
//! encoding and delimiter auto-detection. Both produce a [`Dataset`] whose
//! date and contribution columns are already typed.

pub mod delimited;
pub mod workbook;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use std::path::Path;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{LoadError, LoadResult};
use crate::models::{CellValue, Dataset, Field};

pub use delimited::{decode_content, detect_delimiter, detect_encoding};

/// Tabular source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Delimited,
}

impl SourceFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> LoadResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "ods" => Ok(SourceFormat::Workbook),
            "csv" | "tsv" | "txt" => Ok(SourceFormat::Delimited),
            _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Workbook => "workbook",
            SourceFormat::Delimited => "delimited",
        }
    }
}

/// Load a dataset from disk, choosing the reader by extension.
///
/// # Example
/// ```ignore
/// let dataset = buscador::load_dataset("BBDD.xlsx")?;
/// println!("{} projects", dataset.len());
/// ```
pub fn load_dataset<P: AsRef<Path>>(path: P) -> LoadResult<Dataset> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)?;

    log_info(format!("Reading dataset: {}", path.display()));
    let bytes = std::fs::read(path)?;
    load_dataset_bytes(&bytes, format)
}

/// Load a dataset from raw bytes of a known format.
pub fn load_dataset_bytes(bytes: &[u8], format: SourceFormat) -> LoadResult<Dataset> {
    let dataset = match format {
        SourceFormat::Workbook => workbook::read_workbook(bytes)?,
        SourceFormat::Delimited => delimited::read_delimited(bytes)?,
    };

    log_success(format!(
        "Loaded {} rows, {} columns",
        dataset.len(),
        dataset.headers().len()
    ));

    let missing = dataset.schema().missing_fields();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.column_name()).collect();
        log_warning(format!("Columns not present (steps skipped): {}", names.join(", ")));
    }

    Ok(dataset)
}

// =============================================================================
// Coercion
// =============================================================================

/// Coerce a raw cell to the type its field expects.
///
/// Dates and the contribution amount become typed values or
/// [`CellValue::Empty`]; every other field is left untouched.
pub fn coerce_cell(field: Field, cell: CellValue) -> CellValue {
    match field {
        Field::StartDate | Field::EndDate => coerce_date(cell),
        Field::Contribution => coerce_number(cell),
        _ => cell,
    }
}

fn coerce_date(cell: CellValue) -> CellValue {
    let date = match &cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => excel_serial_to_date(*n),
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Bool(_) | CellValue::Empty => None,
    };
    date.map(CellValue::Date).unwrap_or(CellValue::Empty)
}

fn coerce_number(cell: CellValue) -> CellValue {
    let number = match &cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_number_text(s),
        _ => None,
    };
    number.map(CellValue::Number).unwrap_or(CellValue::Empty)
}

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a textual date, keeping only the calendar day.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Convert an Excel 1900-system serial number to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }

    let mut days = serial.floor() as u64;
    // Serials before the phantom 1900-02-29 are one day ahead of the epoch
    if days < 60 {
        days += 1;
    }

    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days))
}

/// Parse an amount written as text: `1500`, `1,500.25`, `USD 1,500.25`, `$ 20`.
fn parse_number_text(text: &str) -> Option<f64> {
    let text = text.trim();
    let text = text.strip_prefix("USD").unwrap_or(text).trim_start();
    let text = text.strip_prefix('$').unwrap_or(text).trim_start();

    let cleaned: String = text.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("BBDD.xlsx")).unwrap(), SourceFormat::Workbook);
        assert_eq!(SourceFormat::from_path(Path::new("data.CSV")).unwrap(), SourceFormat::Delimited);
        assert!(matches!(
            SourceFormat::from_path(Path::new("notes.pdf")),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_date_text_formats() {
        assert_eq!(parse_date_text("2021-03-04"), Some(ymd(2021, 3, 4)));
        assert_eq!(parse_date_text("04/03/2021"), Some(ymd(2021, 3, 4)));
        assert_eq!(parse_date_text("2021-03-04 10:30:00"), Some(ymd(2021, 3, 4)));
        assert_eq!(parse_date_text("2021-03-04T00:00:00"), Some(ymd(2021, 3, 4)));
        assert_eq!(parse_date_text("sin fecha"), None);
        assert_eq!(parse_date_text("  "), None);
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial_to_date(44197.0), Some(ymd(2021, 1, 1)));
        assert_eq!(excel_serial_to_date(44197.75), Some(ymd(2021, 1, 1)));
        assert_eq!(excel_serial_to_date(1.0), Some(ymd(1900, 1, 1)));
        assert_eq!(excel_serial_to_date(-3.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_unparseable_date_becomes_empty() {
        let cell = coerce_cell(Field::EndDate, CellValue::text("pendiente"));
        assert_eq!(cell, CellValue::Empty);
        let cell = coerce_cell(Field::EndDate, CellValue::Bool(true));
        assert_eq!(cell, CellValue::Empty);
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(coerce_cell(Field::Contribution, CellValue::text("USD 1,234.50")), CellValue::Number(1234.5));
        assert_eq!(coerce_cell(Field::Contribution, CellValue::text("$ 20")), CellValue::Number(20.0));
        assert_eq!(coerce_cell(Field::Contribution, CellValue::text("n/d")), CellValue::Empty);
        assert_eq!(coerce_cell(Field::Contribution, CellValue::Number(7.0)), CellValue::Number(7.0));
    }

    #[test]
    fn test_other_fields_untouched() {
        let cell = CellValue::text("2021-03-04");
        assert_eq!(coerce_cell(Field::Department, cell.clone()), cell);
    }
}
