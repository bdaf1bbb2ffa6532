//! Search pipeline: filter, summarize and chart in one call.
//!
//! This module provides the request/response entry point used by both the
//! CLI and the HTTP API. Nothing is cached between calls: every search
//! recomputes everything from the shared, read-only dataset.
//!
//! # Example
//!
//! ```rust,ignore
//! use buscador::{compute_results, load_dataset, FilterCriteria};
//!
//! let dataset = load_dataset("BBDD.xlsx")?;
//! let criteria = FilterCriteria { keywords: "bonos verdes".into(), ..Default::default() };
//! let results = compute_results(&dataset, &criteria)?;
//! println!("Registros encontrados: {}", results.view.len());
//! ```

use super::aggregate::{summarize, Aggregate, GroupTotal};
use super::filter::{apply_constraints, FilterCriteria, FilteredView};
use super::series::{yearly_totals, YearTotal};
use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{CriteriaResult, PipelineResult};
use crate::export::write_xlsx;
use crate::models::{Dataset, Field};

/// Everything produced by one search.
#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    /// Rows that passed every active filter.
    pub view: FilteredView<'a>,
    /// Fixed summary tables (origin, department, sector).
    pub aggregates: Vec<Aggregate>,
    /// Contributions by start year.
    pub yearly: Vec<YearTotal>,
}

impl SearchResults<'_> {
    pub fn total_records(&self) -> usize {
        self.view.len()
    }

    /// Department totals for the bar chart; empty when not available.
    pub fn department_totals(&self) -> &[GroupTotal] {
        self.aggregates
            .iter()
            .find(|a| a.field == Field::Department)
            .map(|a| a.groups.as_slice())
            .unwrap_or(&[])
    }
}

/// Run a search over `dataset`.
pub fn compute_results<'a>(
    dataset: &'a Dataset,
    criteria: &FilterCriteria,
) -> CriteriaResult<SearchResults<'a>> {
    log_info("🔎 Processing search...");

    let constraints = criteria.constraints(dataset.schema())?;
    log_info(format!("{} active filter(s)", constraints.len()));

    let view = apply_constraints(dataset, &constraints);
    if view.is_empty() {
        log_warning("No records match the current filters");
    } else {
        log_success(format!("Registros encontrados: {}", view.len()));
    }

    let aggregates = summarize(&view);
    let yearly = yearly_totals(&view);

    Ok(SearchResults {
        view,
        aggregates,
        yearly,
    })
}

/// Run a search and encode its rows as an `.xlsx` workbook.
pub fn export_results(dataset: &Dataset, criteria: &FilterCriteria) -> PipelineResult<Vec<u8>> {
    let results = compute_results(dataset, criteria)?;
    let bytes = write_xlsx(&results.view)?;
    log_success(format!("Exported {} rows ({} bytes)", results.total_records(), bytes.len()));
    Ok(bytes)
}
