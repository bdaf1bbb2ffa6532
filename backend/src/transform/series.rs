//! Yearly contribution series for charting.

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

use super::filter::FilteredView;
use crate::models::Field;

/// Total contribution of projects starting in `year`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total: f64,
}

/// Contributions summed by start year, ascending.
///
/// Rows without a start date are left out. Empty when either the start date
/// or the contribution column is absent.
pub fn yearly_totals(view: &FilteredView<'_>) -> Vec<YearTotal> {
    let schema = view.dataset().schema();
    let (Some(date_col), Some(value_col)) = (
        schema.column(Field::StartDate),
        schema.column(Field::Contribution),
    ) else {
        return Vec::new();
    };

    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for record in view.records() {
        if let Some(date) = record.get(date_col).as_date() {
            let amount = record.get(value_col).as_number().unwrap_or(0.0);
            *totals.entry(date.year()).or_insert(0.0) += amount;
        }
    }

    totals
        .into_iter()
        .map(|(year, total)| YearTotal { year, total })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, Dataset};

    #[test]
    fn test_ascending_years_without_missing_dates() {
        let data = Dataset::new(
            vec!["FECHA INICIAL".into(), "VALOR APORTE (USD)".into()],
            vec![
                vec![CellValue::text("2022-05-01"), CellValue::Number(10.0)],
                vec![CellValue::text("2020-01-01"), CellValue::Number(5.0)],
                vec![CellValue::text("2022-11-30"), CellValue::Empty],
                vec![CellValue::Empty, CellValue::Number(99.0)],
                vec![CellValue::text("2022-02-02"), CellValue::Number(2.5)],
            ],
        );

        let series = yearly_totals(&FilteredView::all(&data));
        assert_eq!(
            series,
            vec![
                YearTotal { year: 2020, total: 5.0 },
                YearTotal { year: 2022, total: 12.5 },
            ]
        );
    }

    #[test]
    fn test_missing_columns() {
        let data = Dataset::new(vec!["FECHA INICIAL".into()], vec![vec![CellValue::text("2020-01-01")]]);
        assert!(yearly_totals(&FilteredView::all(&data)).is_empty());
    }
}
