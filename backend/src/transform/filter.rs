//! Filter criteria and their evaluation over a dataset.
//!
//! A [`FilterCriteria`] is what a user submits with a search. It is turned
//! into a list of independent [`Constraint`]s, skipping every constraint that
//! is inactive or whose column is absent from the dataset's [`Schema`]. A
//! row is kept when it satisfies all constraints, so their order never
//! changes the result.

use chrono::{Datelike, NaiveDate};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

use super::keyword::KeywordMatcher;
use crate::error::{CriteriaError, CriteriaResult};
use crate::format::format_usd;
use crate::models::{CellValue, Dataset, Field, Record, Schema, ALL_MARKER};

// =============================================================================
// Selections
// =============================================================================

/// Values picked for one dimension, possibly including the match-all marker.
///
/// An empty selection and a selection containing the marker both leave the
/// dimension unconstrained; the marker wins over explicit values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<T> {
    match_all: bool,
    values: Vec<T>,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self {
            match_all: false,
            values: Vec::new(),
        }
    }
}

impl<T> Selection<T> {
    /// Nothing selected.
    pub fn none() -> Self {
        Self::default()
    }

    /// Only the match-all marker.
    pub fn all() -> Self {
        Self {
            match_all: true,
            values: Vec::new(),
        }
    }

    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            match_all: false,
            values: values.into_iter().collect(),
        }
    }

    /// Add the match-all marker to the current selection.
    pub fn with_all(mut self) -> Self {
        self.match_all = true;
        self
    }

    pub fn has_all_marker(&self) -> bool {
        self.match_all
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Whether this selection restricts rows at all.
    pub fn is_active(&self) -> bool {
        !self.match_all && !self.values.is_empty()
    }

    /// The explicit values when the selection is active.
    pub fn active_values(&self) -> Option<&[T]> {
        self.is_active().then_some(self.values.as_slice())
    }
}

impl<T: FromStr> Selection<T> {
    /// Parse raw tokens such as CLI arguments; `Todos` becomes the marker.
    ///
    /// On failure returns the offending token.
    pub fn parse<I, S>(tokens: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::default();
        for token in tokens {
            let token = token.as_ref().trim();
            if token == ALL_MARKER {
                selection.match_all = true;
            } else {
                let value = token.parse().map_err(|_| token.to_string())?;
                selection.values.push(value);
            }
        }
        Ok(selection)
    }
}

/// The literal match-all marker in JSON.
struct AllMarker;

impl Serialize for AllMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(ALL_MARKER)
    }
}

impl<'de> Deserialize<'de> for AllMarker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == ALL_MARKER {
            Ok(AllMarker)
        } else {
            Err(de::Error::custom("not the match-all marker"))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Token<T> {
    All(AllMarker),
    Value(T),
}

impl<T: Serialize> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.values.len() + usize::from(self.match_all);
        let mut seq = serializer.serialize_seq(Some(len))?;
        if self.match_all {
            seq.serialize_element(&AllMarker)?;
        }
        for value in &self.values {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Selection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tokens = Vec::<Token<T>>::deserialize(deserializer)?;
        let mut selection = Self::default();
        for token in tokens {
            match token {
                Token::All(_) => selection.match_all = true,
                Token::Value(v) => selection.values.push(v),
            }
        }
        Ok(selection)
    }
}

// =============================================================================
// Date range
// =============================================================================

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateRange {
    pub fn new(min: NaiveDate, max: NaiveDate) -> CriteriaResult<Self> {
        let range = Self { min, max };
        range.check()?;
        Ok(range)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date <= self.max
    }

    /// Reject ranges whose start is after their end.
    pub fn check(&self) -> CriteriaResult<()> {
        if self.min > self.max {
            return Err(CriteriaError::InvertedRange {
                min: self.min.to_string(),
                max: self.max.to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a `YYYY-MM-DD` date typed by a user.
pub fn parse_iso_date(text: &str) -> CriteriaResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| CriteriaError::InvalidDate(text.to_string()))
}

// =============================================================================
// Criteria
// =============================================================================

/// Everything a user can filter on in one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    /// Comma-separated keywords.
    pub keywords: String,
    pub start_years: Selection<i32>,
    /// Inclusive range on `FECHA FINAL`; `None` leaves it unconstrained.
    pub end_date_range: Option<DateRange>,
    pub departments: Selection<String>,
    pub municipalities: Selection<String>,
    pub actor_first_level: Selection<String>,
    pub actor_second_level: Selection<String>,
    pub actor_names: Selection<String>,
    pub actor_origins: Selection<String>,
    pub ods: Selection<String>,
    pub statuses: Selection<String>,
    pub sectors: Selection<String>,
}

impl FilterCriteria {
    /// Categorical selections paired with the field they constrain.
    pub fn categorical(&self) -> [(Field, &Selection<String>); 9] {
        [
            (Field::Department, &self.departments),
            (Field::Municipality, &self.municipalities),
            (Field::ActorFirstLevel, &self.actor_first_level),
            (Field::ActorSecondLevel, &self.actor_second_level),
            (Field::ActorName, &self.actor_names),
            (Field::ActorOrigin, &self.actor_origins),
            (Field::Ods, &self.ods),
            (Field::InterventionStatus, &self.statuses),
            (Field::GovernmentSector, &self.sectors),
        ]
    }

    /// Active constraints for a dataset with `schema`.
    ///
    /// Inactive selections and constraints on absent columns are dropped.
    pub fn constraints(&self, schema: &Schema) -> CriteriaResult<Vec<Constraint>> {
        let mut constraints = Vec::new();

        if let Some(matcher) = KeywordMatcher::new(&self.keywords, schema)? {
            constraints.push(Constraint::Keyword(matcher));
        }

        if let Some(years) = self.start_years.active_values() {
            if schema.has(Field::StartDate) {
                constraints.push(Constraint::StartYear(years.to_vec()));
            }
        }

        if let Some(range) = self.end_date_range {
            range.check()?;
            if schema.has(Field::EndDate) {
                constraints.push(Constraint::EndDateRange(range));
            }
        }

        for (field, selection) in self.categorical() {
            if let Some(values) = selection.active_values() {
                if schema.has(field) {
                    constraints.push(Constraint::Categorical {
                        field,
                        values: values.to_vec(),
                    });
                }
            }
        }

        Ok(constraints)
    }
}

// =============================================================================
// Constraints
// =============================================================================

/// One active, independently evaluated row predicate.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Any keyword in any searched column.
    Keyword(KeywordMatcher),
    /// Start date falls in one of these years.
    StartYear(Vec<i32>),
    /// End date inside the range. Rows without an end date fail.
    EndDateRange(DateRange),
    /// Field value equals one of these values.
    Categorical { field: Field, values: Vec<String> },
}

impl Constraint {
    pub fn matches(&self, dataset: &Dataset, record: &Record) -> bool {
        match self {
            Constraint::Keyword(matcher) => matcher.is_match(record),
            Constraint::StartYear(years) => date_of(dataset, record, Field::StartDate)
                .is_some_and(|d| years.contains(&d.year())),
            Constraint::EndDateRange(range) => date_of(dataset, record, Field::EndDate)
                .is_some_and(|d| range.contains(d)),
            Constraint::Categorical { field, values } => dataset
                .value(record, *field)
                .and_then(CellValue::to_text)
                .is_some_and(|text| values.contains(&text)),
        }
    }
}

fn date_of(dataset: &Dataset, record: &Record, field: Field) -> Option<NaiveDate> {
    dataset.value(record, field).and_then(CellValue::as_date)
}

// =============================================================================
// Filtered view
// =============================================================================

/// The rows of a dataset that passed a search, in source order.
///
/// Borrows the dataset; the dataset itself is never modified.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over every row.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Source row positions of the kept rows.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.dataset.records();
        self.indices.iter().map(move |&i| &records[i])
    }

    /// Values of one field over the kept rows, or `None` if the column is absent.
    pub fn column(&self, field: Field) -> Option<impl Iterator<Item = &'a CellValue> + '_> {
        let col = self.dataset.schema().column(field)?;
        Some(self.records().map(move |r| r.get(col)))
    }

    /// Sum of the contribution column; missing amounts count as zero.
    pub fn contribution_total(&self) -> f64 {
        self.column(Field::Contribution)
            .map(|values| values.filter_map(CellValue::as_number).sum())
            .unwrap_or(0.0)
    }

    /// Rows ready for display, aligned with the dataset headers.
    ///
    /// The contribution column is rendered as currency, blank when missing.
    pub fn display_rows(&self) -> Vec<Vec<Value>> {
        let contribution = self.dataset.schema().column(Field::Contribution);
        self.records()
            .map(|record| {
                record
                    .cells()
                    .iter()
                    .enumerate()
                    .map(|(col, cell)| {
                        if Some(col) == contribution {
                            Value::String(format_usd(cell.as_number()))
                        } else {
                            cell_json(cell)
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

fn cell_json(cell: &CellValue) -> Value {
    match cell {
        CellValue::Empty => Value::Null,
        CellValue::Text(s) => json!(s),
        CellValue::Number(n) => json!(n),
        CellValue::Bool(b) => json!(b),
        CellValue::Date(d) => json!(d.format("%Y-%m-%d").to_string()),
    }
}

/// Keep the rows satisfying every constraint.
pub fn apply_constraints<'a>(dataset: &'a Dataset, constraints: &[Constraint]) -> FilteredView<'a> {
    let indices = dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| constraints.iter().all(|c| c.matches(dataset, record)))
        .map(|(i, _)| i)
        .collect();

    FilteredView { dataset, indices }
}

/// Filter `dataset` with `criteria`.
pub fn filter_dataset<'a>(
    dataset: &'a Dataset,
    criteria: &FilterCriteria,
) -> CriteriaResult<FilteredView<'a>> {
    let constraints = criteria.constraints(dataset.schema())?;
    Ok(apply_constraints(dataset, &constraints))
}
