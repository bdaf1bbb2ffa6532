//! Group filtered rows and sum their contributions.
//!
//! # Architecture
//!
//! ```text
//! Filtered rows                        →  Summary table
//! ┌───────────────────────────────┐       ┌──────────────────────────┐
//! │ DEPARTAMENTO: Cauca, 100.00   │       │ Cauca   USD 175.50       │
//! │ DEPARTAMENTO: Nariño, 250.00  │  →    │ Nariño  USD 250.00       │
//! │ DEPARTAMENTO: Cauca, 75.50    │       └──────────────────────────┘
//! └───────────────────────────────┘       (sorted by total, descending)
//! ```
//!
//! Totals stay numeric; the currency string is produced only for display.

use serde::Serialize;
use std::collections::HashMap;

use super::filter::FilteredView;
use crate::format::format_usd;
use crate::models::Field;

/// Group label for rows whose grouping value is missing.
pub const MISSING_GROUP_LABEL: &str = "(sin dato)";

/// The fixed summary tables shown after every search.
pub const SUMMARY_GROUPINGS: [(Field, &str); 3] = [
    (Field::ActorOrigin, "Aportes por cooperante"),
    (Field::Department, "Aportes por departamento"),
    (Field::GovernmentSector, "Aportes por sector"),
];

/// Summed contribution of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotal {
    pub value: String,
    pub total: f64,
}

impl GroupTotal {
    pub fn formatted_total(&self) -> String {
        format_usd(Some(self.total))
    }
}

/// One summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub field: Field,
    pub title: &'static str,
    pub groups: Vec<GroupTotal>,
}

/// Sum `value` per distinct `group` over the view, largest total first.
///
/// Missing amounts count as zero. Returns `None` when either column is
/// absent from the dataset.
pub fn group_sum(view: &FilteredView<'_>, group: Field, value: Field) -> Option<Vec<GroupTotal>> {
    let schema = view.dataset().schema();
    let group_col = schema.column(group)?;
    let value_col = schema.column(value)?;

    let mut totals: HashMap<Option<String>, f64> = HashMap::new();
    for record in view.records() {
        let key = record.get(group_col).to_text();
        let amount = record.get(value_col).as_number().unwrap_or(0.0);
        *totals.entry(key).or_insert(0.0) += amount;
    }

    let mut totals: Vec<(Option<String>, f64)> = totals.into_iter().collect();
    // Ties fall back to the group key so output is deterministic
    totals.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let groups = totals
        .into_iter()
        .map(|(key, total)| GroupTotal {
            value: key.unwrap_or_else(|| MISSING_GROUP_LABEL.to_string()),
            total,
        })
        .collect();

    Some(groups)
}

/// Build the fixed summary tables, skipping those whose columns are absent.
pub fn summarize(view: &FilteredView<'_>) -> Vec<Aggregate> {
    SUMMARY_GROUPINGS
        .iter()
        .filter_map(|&(field, title)| {
            group_sum(view, field, Field::Contribution).map(|groups| Aggregate { field, title, groups })
        })
        .collect()
}
