//! Domain models for the project search pipeline.
//!
//! - [`Field`] - The known dataset columns, matched by exact header name
//! - [`CellValue`] - A single typed cell
//! - [`Schema`] - Which known fields a loaded dataset actually carries
//! - [`Dataset`] - The immutable in-memory table
//! - [`SourceInfo`] - Where the dataset came from and how it was decoded

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parser::coerce_cell;

/// Reserved selection value meaning "do not constrain this dimension".
pub const ALL_MARKER: &str = "Todos";

// =============================================================================
// Fields
// =============================================================================

/// A column the pipeline knows how to use.
///
/// Column names are matched exactly (case-sensitive) against the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// `FECHA INICIAL`
    StartDate,
    /// `FECHA FINAL`
    EndDate,
    /// `DEPARTAMENTO`
    Department,
    /// `MUNICIPIO`
    Municipality,
    /// `NOMBRE INTERVENCION`
    InterventionName,
    /// `OBJETIVO GENERAL`
    GeneralObjective,
    /// `VALOR APORTE (USD)`
    Contribution,
    /// `ORIGEN DEL ACTOR`
    ActorOrigin,
    /// `SECTORES GOB`
    GovernmentSector,
    /// `ACTOR PRIMER NIVEL`
    ActorFirstLevel,
    /// `ACTOR SEGUNDO NIVEL`
    ActorSecondLevel,
    /// `NOMBRE ACTOR`
    ActorName,
    /// `ODS`
    Ods,
    /// `ESTADO DE INTERVENCION`
    InterventionStatus,
}

impl Field {
    pub const COUNT: usize = 14;

    pub const ALL: [Field; Field::COUNT] = [
        Field::StartDate,
        Field::EndDate,
        Field::Department,
        Field::Municipality,
        Field::InterventionName,
        Field::GeneralObjective,
        Field::Contribution,
        Field::ActorOrigin,
        Field::GovernmentSector,
        Field::ActorFirstLevel,
        Field::ActorSecondLevel,
        Field::ActorName,
        Field::Ods,
        Field::InterventionStatus,
    ];

    /// Header name of this field in the source dataset.
    pub const fn column_name(self) -> &'static str {
        match self {
            Field::StartDate => "FECHA INICIAL",
            Field::EndDate => "FECHA FINAL",
            Field::Department => "DEPARTAMENTO",
            Field::Municipality => "MUNICIPIO",
            Field::InterventionName => "NOMBRE INTERVENCION",
            Field::GeneralObjective => "OBJETIVO GENERAL",
            Field::Contribution => "VALOR APORTE (USD)",
            Field::ActorOrigin => "ORIGEN DEL ACTOR",
            Field::GovernmentSector => "SECTORES GOB",
            Field::ActorFirstLevel => "ACTOR PRIMER NIVEL",
            Field::ActorSecondLevel => "ACTOR SEGUNDO NIVEL",
            Field::ActorName => "NOMBRE ACTOR",
            Field::Ods => "ODS",
            Field::InterventionStatus => "ESTADO DE INTERVENCION",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.column_name() == name)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// =============================================================================
// Cells
// =============================================================================

/// A single cell value.
///
/// Serializes untagged: `null`, a string, a number, a boolean, or an
/// ISO `YYYY-MM-DD` date.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Text rendering used for matching, grouping and option lists.
    ///
    /// Returns `None` for empty cells.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Integral values print without a fractional part (`13`, not `13.0`).
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Schema descriptor
// =============================================================================

/// Which known fields are present in a dataset, and at which column.
///
/// Computed once when the dataset is built. Every pipeline step asks the
/// schema instead of probing headers itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: [Option<usize>; Field::COUNT],
}

impl Schema {
    pub fn from_headers(headers: &[String]) -> Self {
        let mut schema = Schema::default();
        for (i, header) in headers.iter().enumerate() {
            if let Some(field) = Field::from_column_name(header) {
                // First occurrence wins on duplicated headers
                schema.columns[field.index()].get_or_insert(i);
            }
        }
        schema
    }

    /// Column index of `field`, or `None` if the dataset lacks it.
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns[field.index()]
    }

    pub fn has(&self, field: Field) -> bool {
        self.column(field).is_some()
    }

    pub fn present_fields(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| self.has(*f)).collect()
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| !self.has(*f)).collect()
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// One row of the source table, aligned with [`Dataset::headers`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    cells: Vec<CellValue>,
}

impl Record {
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn get(&self, column: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(column).unwrap_or(&EMPTY)
    }
}

/// How the source was decoded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    /// `workbook` or `delimited`
    pub format: String,
    pub sheet_name: Option<String>,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
}

/// The immutable, in-memory projects table.
///
/// Built once per process and shared behind an `Arc`; every search derives
/// a fresh view and never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<Record>,
    schema: Schema,
    source: SourceInfo,
}

impl Dataset {
    /// Build a dataset from raw rows.
    ///
    /// Rows are padded or truncated to the header width. Date and
    /// contribution columns are coerced to their typed form; values that
    /// do not parse become [`CellValue::Empty`].
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let schema = Schema::from_headers(&headers);
        let width = headers.len();

        let typed: Vec<(usize, Field)> = Field::ALL
            .into_iter()
            .filter_map(|f| schema.column(f).map(|c| (c, f)))
            .collect();

        let records = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, CellValue::Empty);
                for &(col, field) in &typed {
                    let cell = std::mem::take(&mut cells[col]);
                    cells[col] = coerce_cell(field, cell);
                }
                Record { cells }
            })
            .collect();

        Self {
            headers,
            records,
            schema,
            source: SourceInfo::default(),
        }
    }

    pub fn with_source(mut self, source: SourceInfo) -> Self {
        self.source = source;
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of `field` in `record`, or `None` when the column is absent.
    pub fn value<'a>(&self, record: &'a Record, field: Field) -> Option<&'a CellValue> {
        self.schema.column(field).map(|c| record.get(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_schema_matches_exact_names() {
        let schema = Schema::from_headers(&headers(&["DEPARTAMENTO", "municipio", "ODS "]));
        assert_eq!(schema.column(Field::Department), Some(0));
        assert!(!schema.has(Field::Municipality));
        assert!(!schema.has(Field::Ods));
        assert_eq!(schema.present_fields(), vec![Field::Department]);
    }

    #[test]
    fn test_schema_first_duplicate_wins() {
        let schema = Schema::from_headers(&headers(&["ODS", "ODS"]));
        assert_eq!(schema.column(Field::Ods), Some(0));
    }

    #[test]
    fn test_rows_are_padded_and_coerced() {
        let dataset = Dataset::new(
            headers(&["FECHA INICIAL", "VALOR APORTE (USD)", "DEPARTAMENTO"]),
            vec![vec![CellValue::text("2021-03-04"), CellValue::text("1,500.25")]],
        );

        let record = &dataset.records()[0];
        assert_eq!(record.cells().len(), 3);
        assert_eq!(
            dataset.value(record, Field::StartDate),
            Some(&CellValue::Date(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()))
        );
        assert_eq!(
            dataset.value(record, Field::Contribution),
            Some(&CellValue::Number(1500.25))
        );
        assert_eq!(dataset.value(record, Field::Department), Some(&CellValue::Empty));
        assert_eq!(dataset.value(record, Field::Ods), None);
    }

    #[test]
    fn test_number_text_rendering() {
        assert_eq!(CellValue::Number(13.0).to_text().as_deref(), Some("13"));
        assert_eq!(CellValue::Number(2.5).to_text().as_deref(), Some("2.5"));
        assert_eq!(CellValue::Empty.to_text(), None);
    }

    #[test]
    fn test_cell_serialization() {
        let date = CellValue::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(serde_json::to_value(&date).unwrap(), "2020-01-02");
        assert!(serde_json::to_value(&CellValue::Empty).unwrap().is_null());
    }
}
