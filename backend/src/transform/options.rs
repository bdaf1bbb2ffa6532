//! Candidate values for each search input.

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeSet;

use super::filter::{DateRange, Selection};
use crate::models::{Dataset, Field, ALL_MARKER};

/// Option lists for the search form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub all_marker: &'static str,
    pub years: Vec<i32>,
    pub departments: Vec<String>,
    /// Restricted to the selected departments.
    pub municipalities: Vec<String>,
    pub actor_first_level: Vec<String>,
    pub actor_second_level: Vec<String>,
    pub actor_names: Vec<String>,
    pub actor_origins: Vec<String>,
    pub ods: Vec<String>,
    pub statuses: Vec<String>,
    pub sectors: Vec<String>,
    /// Observed `FECHA FINAL` range, the default for the end-date picker.
    pub end_date_bounds: Option<DateRange>,
}

/// Build every option list, with municipalities narrowed to `departments`.
pub fn filter_options(dataset: &Dataset, departments: &Selection<String>) -> FilterOptions {
    FilterOptions {
        all_marker: ALL_MARKER,
        years: start_years(dataset),
        departments: distinct_values(dataset, Field::Department),
        municipalities: municipality_candidates(dataset, departments),
        actor_first_level: distinct_values(dataset, Field::ActorFirstLevel),
        actor_second_level: distinct_values(dataset, Field::ActorSecondLevel),
        actor_names: distinct_values(dataset, Field::ActorName),
        actor_origins: distinct_values(dataset, Field::ActorOrigin),
        ods: distinct_values(dataset, Field::Ods),
        statuses: distinct_values(dataset, Field::InterventionStatus),
        sectors: distinct_values(dataset, Field::GovernmentSector),
        end_date_bounds: end_date_bounds(dataset),
    }
}

/// Sorted distinct non-empty values of `field`; empty if the column is absent.
pub fn distinct_values(dataset: &Dataset, field: Field) -> Vec<String> {
    let Some(col) = dataset.schema().column(field) else {
        return Vec::new();
    };

    dataset
        .records()
        .iter()
        .filter_map(|r| r.get(col).to_text())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted distinct start years.
pub fn start_years(dataset: &Dataset) -> Vec<i32> {
    let Some(col) = dataset.schema().column(Field::StartDate) else {
        return Vec::new();
    };

    dataset
        .records()
        .iter()
        .filter_map(|r| r.get(col).as_date())
        .map(|d| d.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Earliest and latest end date, if any row has one.
pub fn end_date_bounds(dataset: &Dataset) -> Option<DateRange> {
    let col = dataset.schema().column(Field::EndDate)?;
    let mut dates = dataset.records().iter().filter_map(|r| r.get(col).as_date());

    let first = dates.next()?;
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(DateRange { min, max })
}

/// Municipalities observed in rows of the selected departments.
///
/// With no active department selection (or no department column) every
/// municipality is a candidate.
pub fn municipality_candidates(dataset: &Dataset, departments: &Selection<String>) -> Vec<String> {
    let schema = dataset.schema();
    let Some(muni_col) = schema.column(Field::Municipality) else {
        return Vec::new();
    };

    let (Some(selected), Some(dept_col)) = (departments.active_values(), schema.column(Field::Department))
    else {
        return distinct_values(dataset, Field::Municipality);
    };

    dataset
        .records()
        .iter()
        .filter(|r| {
            r.get(dept_col)
                .to_text()
                .is_some_and(|d| selected.contains(&d))
        })
        .filter_map(|r| r.get(muni_col).to_text())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;
    use chrono::NaiveDate;

    fn sample() -> Dataset {
        let row = |dept: &str, muni: &str, start: &str, end: CellValue| {
            vec![CellValue::text(dept), CellValue::text(muni), CellValue::text(start), end]
        };
        Dataset::new(
            vec!["DEPARTAMENTO".into(), "MUNICIPIO".into(), "FECHA INICIAL".into(), "FECHA FINAL".into()],
            vec![
                row("Cauca", "Popayán", "2019-02-01", CellValue::text("2022-01-01")),
                row("Cauca", "Silvia", "2021-01-10", CellValue::Empty),
                row("Nariño", "Pasto", "2021-06-15", CellValue::text("2020-03-01")),
                row("Huila", "Pitalito", "fecha?", CellValue::text("2025-12-31")),
                vec![CellValue::Empty, CellValue::text("Sin departamento")],
            ],
        )
    }

    #[test]
    fn test_municipalities_follow_departments() {
        let data = sample();
        let cauca = Selection::of(["Cauca".to_string()]);
        assert_eq!(municipality_candidates(&data, &cauca), vec!["Popayán", "Silvia"]);

        let two = Selection::of(["Cauca".to_string(), "Nariño".to_string()]);
        assert_eq!(municipality_candidates(&data, &two), vec!["Pasto", "Popayán", "Silvia"]);
    }

    #[test]
    fn test_municipalities_unrestricted() {
        let data = sample();
        let everything = distinct_values(&data, Field::Municipality);
        assert_eq!(everything.len(), 5);
        assert_eq!(municipality_candidates(&data, &Selection::none()), everything);
        assert_eq!(
            municipality_candidates(&data, &Selection::of(["Cauca".to_string()]).with_all()),
            everything
        );
    }

    #[test]
    fn test_years_sorted_and_distinct() {
        assert_eq!(start_years(&sample()), vec![2019, 2021]);
    }

    #[test]
    fn test_end_date_bounds() {
        let bounds = end_date_bounds(&sample()).unwrap();
        assert_eq!(bounds.min, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(bounds.max, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_absent_columns_give_empty_lists() {
        let data = sample();
        let options = filter_options(&data, &Selection::none());
        assert!(options.ods.is_empty());
        assert!(options.statuses.is_empty());
        assert!(options.sectors.is_empty());
        assert_eq!(options.departments, vec!["Cauca", "Huila", "Nariño"]);
        assert_eq!(options.all_marker, "Todos");
    }
}
