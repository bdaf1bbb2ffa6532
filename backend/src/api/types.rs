//! REST API types for the search front end.
//!
//! Totals are sent both raw (for charts) and formatted as currency (for
//! tables), so clients never format money themselves.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::format::format_usd;
use crate::models::{Dataset, Field, SourceInfo};
use crate::transform::aggregate::{Aggregate, GroupTotal};
use crate::transform::filter::Selection;
use crate::transform::pipeline::SearchResults;
use crate::transform::series::YearTotal;

/// Response to `POST /api/search` (and the CLI `search` output).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub search_id: String,

    /// "ok" or "empty"
    pub status: String,

    /// "Registros encontrados"
    pub total_records: usize,

    pub total_contribution: String,

    /// Original headers, in order
    pub columns: Vec<String>,

    /// One array per kept row, aligned with `columns`
    pub rows: Vec<Vec<Value>>,

    pub aggregates: Vec<AggregateTable>,

    pub charts: Charts,
}

/// A summary table with display-ready totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateTable {
    pub field: Field,
    /// Header of the grouped column
    pub column: &'static str,
    pub title: &'static str,
    pub groups: Vec<AggregateRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub value: String,
    pub total: f64,
    pub formatted_total: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Charts {
    pub by_year: Vec<YearTotal>,
    pub by_department: Vec<GroupTotal>,
}

impl From<&Aggregate> for AggregateTable {
    fn from(aggregate: &Aggregate) -> Self {
        AggregateTable {
            field: aggregate.field,
            column: aggregate.field.column_name(),
            title: aggregate.title,
            groups: aggregate
                .groups
                .iter()
                .map(|g| AggregateRow {
                    value: g.value.clone(),
                    total: g.total,
                    formatted_total: g.formatted_total(),
                })
                .collect(),
        }
    }
}

impl From<&SearchResults<'_>> for SearchResponse {
    fn from(results: &SearchResults<'_>) -> Self {
        let total_records = results.total_records();

        SearchResponse {
            search_id: Uuid::new_v4().to_string(),
            status: if total_records == 0 { "empty" } else { "ok" }.to_string(),
            total_records,
            total_contribution: format_usd(Some(results.view.contribution_total())),
            columns: results.view.dataset().headers().to_vec(),
            rows: results.view.display_rows(),
            aggregates: results.aggregates.iter().map(AggregateTable::from).collect(),
            charts: Charts {
                by_year: results.yearly.clone(),
                by_department: results.department_totals().to_vec(),
            },
        }
    }
}

/// Body of `POST /api/options`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsRequest {
    /// Departments currently selected, used to narrow municipalities
    pub departments: Selection<String>,
}

/// Response to `GET /api/schema`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    pub row_count: usize,
    pub headers: Vec<String>,
    /// Recognised columns present in the dataset
    pub present: Vec<&'static str>,
    /// Recognised columns absent from the dataset
    pub missing: Vec<&'static str>,
    pub source: SourceInfo,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub criteria_schema: Value,
}

impl SchemaResponse {
    pub fn new(dataset: &Dataset, criteria_schema: &Value) -> Self {
        let schema = dataset.schema();
        SchemaResponse {
            row_count: dataset.len(),
            headers: dataset.headers().to_vec(),
            present: schema.present_fields().iter().map(|f| f.column_name()).collect(),
            missing: schema.missing_fields().iter().map(|f| f.column_name()).collect(),
            source: dataset.source().clone(),
            criteria_schema: criteria_schema.clone(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "searchId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "totalRecords": 0,
        "rows": []
    })
}

/// Error response listing every schema violation.
pub fn error_response_with_details(error: &str, details: &[String]) -> Value {
    let mut response = error_response(error);
    response["details"] = json!(details);
    response
}
