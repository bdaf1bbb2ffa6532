//! Search and summary module.
//!
//! - Keyword: accent-insensitive keyword matching
//! - Filter: criteria, constraints and the filtered view
//! - Options: candidate values for the search form
//! - Aggregate: grouped contribution totals
//! - Series: contributions by start year
//! - Pipeline: one-call search entry point

pub mod aggregate;
pub mod filter;
pub mod keyword;
pub mod options;
pub mod pipeline;
pub mod series;

pub use aggregate::{group_sum, summarize, Aggregate, GroupTotal, MISSING_GROUP_LABEL, SUMMARY_GROUPINGS};
pub use filter::{
    apply_constraints, filter_dataset, parse_iso_date, Constraint, DateRange, FilterCriteria, FilteredView,
    Selection,
};
pub use keyword::{split_keywords, KeywordMatcher, KEYWORD_FIELDS};
pub use options::{distinct_values, end_date_bounds, filter_options, municipality_candidates, start_years, FilterOptions};
pub use pipeline::{compute_results, export_results, SearchResults};
pub use series::{yearly_totals, YearTotal};
